use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use watermark_inpaint::classical::{DEFAULT_HEIGHT_PERCENT, DEFAULT_WIDTH_PERCENT};
use watermark_inpaint::inpaint::DEFAULT_RADIUS;
use watermark_inpaint::{
    default_output_path, process_directory, process_file, ClassicalRemover, InpaintMethod,
    ProcessOptions, ProcessResult, Region, Target, WatermarkRemover,
};

#[derive(Parser)]
#[command(
    name = "watermark-inpaint",
    about = "Remove corner watermarks via fast-marching or LaMa inpainting",
    version,
    after_help = "Simple usage: watermark-inpaint inpaint <image>  (writes {name}_cleaned.{ext})"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JPEG output quality (1-100)
    #[arg(long, default_value = "95", global = true)]
    quality: u8,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fill the watermark region with classical inpainting
    Inpaint {
        #[command(flatten)]
        io: IoArgs,

        /// Width of the bottom-right region, in percent of the image width
        #[arg(long, default_value_t = DEFAULT_WIDTH_PERCENT)]
        width_percent: u32,

        /// Height of the bottom-right region, in percent of the image height
        #[arg(long, default_value_t = DEFAULT_HEIGHT_PERCENT)]
        height_percent: u32,

        /// Explicit region as X,Y,WIDTH,HEIGHT (overrides the percentages)
        #[arg(long, value_parser = parse_region)]
        region: Option<Region>,

        /// Inpainting method: telea (fast) or ns (Navier-Stokes)
        #[arg(short, long, default_value = "telea")]
        method: String,

        /// Neighbourhood radius in pixels
        #[arg(long, default_value_t = DEFAULT_RADIUS)]
        radius: u32,
    },

    /// Inpaint the bottom-right corner with a LaMa ONNX model
    #[cfg(feature = "onnx")]
    Lama {
        #[command(flatten)]
        io: IoArgs,

        /// Path to the ONNX model (default: assets/lama_fp32.onnx)
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

#[derive(Args)]
struct IoArgs {
    /// Input image file or directory
    input: PathBuf,

    /// Output file or directory (default: {name}_cleaned.{ext})
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_region(s: &str) -> Result<Region, String> {
    let parts: Vec<u32> = s
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("expected X,Y,WIDTH,HEIGHT: {e}"))?;
    match parts.as_slice() {
        &[x, y, width, height] => Ok(Region::new(x, y, width, height)),
        _ => Err(format!("expected 4 comma-separated values, got {}", parts.len())),
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if !(1..=100).contains(&cli.quality) {
        eprintln!("Error: Quality must be between 1 and 100");
        process::exit(1);
    }

    let opts = ProcessOptions {
        jpeg_quality: cli.quality,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let results = match &cli.command {
        Command::Inpaint {
            io,
            width_percent,
            height_percent,
            region,
            method,
            radius,
        } => {
            let method: InpaintMethod = method.parse().unwrap_or_else(|e| fail(&e));
            let target = match region {
                Some(r) => Target::Custom(*r),
                None => Target::Corner {
                    width_percent: *width_percent,
                    height_percent: *height_percent,
                },
            };
            let remover = ClassicalRemover {
                target,
                method,
                radius: *radius,
            };
            if !opts.quiet {
                eprintln!("Classical inpainting ({method}, radius {radius})");
            }
            run(&remover, io, &opts)
        }
        #[cfg(feature = "onnx")]
        Command::Lama { io, model } => {
            use watermark_inpaint::neural::{LamaSession, NeuralRemover};

            let model_path = model.clone().unwrap_or_else(LamaSession::default_model_path);
            let session = LamaSession::load(&model_path).unwrap_or_else(|e| fail(&e));
            if !opts.quiet {
                eprintln!("LaMa inpainting ({})", session.path().display());
            }
            run(&NeuralRemover::new(&session), io, &opts)
        }
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.success() {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn run<R>(remover: &R, io: &IoArgs, opts: &ProcessOptions) -> Vec<ProcessResult>
where
    R: WatermarkRemover + Sync,
{
    let input = io.input.as_path();
    if !input.exists() {
        eprintln!("Error: Input path does not exist: {}", input.display());
        process::exit(1);
    }

    if input.is_dir() {
        let Some(output_dir) = &io.output else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: watermark-inpaint <command> <input_dir> -o <output_dir>");
            process::exit(1);
        };
        process_directory(remover, input, output_dir, opts)
    } else {
        let output = io
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(input));
        let error = process_file(remover, input, &output, opts).err();
        vec![ProcessResult {
            path: input.to_path_buf(),
            output: error.is_none().then_some(output),
            error,
        }]
    }
}

fn fail(err: &watermark_inpaint::Error) -> ! {
    eprintln!("Error: {err}");
    process::exit(1);
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    let filename = display_name(&result.path);

    match (&result.error, &result.output) {
        (None, Some(output)) => {
            if !opts.quiet {
                eprintln!("[OK] {filename}");
                if opts.verbose {
                    eprintln!("  -> {}", output.display());
                }
            }
        }
        (Some(err), _) => eprintln!("[FAIL] {filename}: {err}"),
        (None, None) => {}
    }
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    )
}
