//! File-level pipeline: decode, remove, encode.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};

use crate::error::{Error, Result};

/// A watermark removal strategy applied to one decoded image.
///
/// Implemented by [`ClassicalRemover`](crate::classical::ClassicalRemover) and
/// [`NeuralRemover`](crate::neural::NeuralRemover).
pub trait WatermarkRemover {
    /// Produce a cleaned copy of `image`.
    ///
    /// # Errors
    ///
    /// Any error of the underlying engine.
    fn remove(&self, image: &DynamicImage) -> Result<DynamicImage>;
}

/// Options controlling file processing.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// JPEG quality (1-100) for `.jpg`/`.jpeg` outputs.
    pub jpeg_quality: u8,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: 95,
            verbose: false,
            quiet: false,
        }
    }
}

/// Result of processing a single image file in a batch.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Where the result was written, if processing succeeded.
    pub output: Option<PathBuf>,
    /// The failure, if any.
    pub error: Option<Error>,
}

impl ProcessResult {
    /// Whether the file was processed and written.
    #[must_use]
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Decode an image file.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if `path` does not exist and [`Error::Decode`]
/// if it cannot be decoded.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    if !path.exists() {
        return Err(Error::NotFound {
            what: "input image",
            path: path.to_path_buf(),
        });
    }
    image::open(path).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Load `input`, apply `remover`, and write the result to `output`.
///
/// Nothing is written unless every step succeeds.
///
/// # Errors
///
/// Propagates decode, removal and encode errors.
pub fn process_file<R>(
    remover: &R,
    input: &Path,
    output: &Path,
    opts: &ProcessOptions,
) -> Result<()>
where
    R: WatermarkRemover + ?Sized,
{
    let image = load_image(input)?;
    log::debug!(
        "{}: {}x{} {:?}",
        input.display(),
        image.width(),
        image.height(),
        image.color()
    );

    let cleaned = remover.remove(&image)?;
    save_image(&cleaned, output, opts)?;
    log::info!("{} -> {}", input.display(), output.display());
    Ok(())
}

/// Process all supported images in a directory.
///
/// Uses parallel iteration when the `cli` feature is enabled (via rayon).
/// Returns a [`ProcessResult`] for each image found, or a single failed result
/// if the directory cannot be read or the output directory created.
#[must_use]
pub fn process_directory<R>(
    remover: &R,
    input_dir: &Path,
    output_dir: &Path,
    opts: &ProcessOptions,
) -> Vec<ProcessResult>
where
    R: WatermarkRemover + Sync + ?Sized,
{
    let failed = |path: &Path, error: Error| {
        vec![ProcessResult {
            path: path.to_path_buf(),
            output: None,
            error: Some(error),
        }]
    };

    let mut inputs: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
        Ok(rd) => rd
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_ok_and(|ft| ft.is_file()))
            .map(|e| e.path())
            .filter(|p| is_supported_image(p))
            .collect(),
        Err(e) => return failed(input_dir, Error::Io(e)),
    };
    inputs.sort();

    if let Err(e) = std::fs::create_dir_all(output_dir) {
        return failed(output_dir, Error::Io(e));
    }

    let run = |input: &PathBuf| {
        let result = match input.file_name() {
            Some(name) => {
                let output = output_dir.join(name);
                process_file(remover, input, &output, opts).map(|()| output)
            }
            None => Err(Error::invalid(format!(
                "{} has no file name",
                input.display()
            ))),
        };
        match result {
            Ok(output) => ProcessResult {
                path: input.clone(),
                output: Some(output),
                error: None,
            },
            Err(error) => ProcessResult {
                path: input.clone(),
                output: None,
                error: Some(error),
            },
        }
    };

    #[cfg(feature = "cli")]
    {
        use rayon::prelude::*;
        inputs.par_iter().map(run).collect()
    }

    #[cfg(not(feature = "cli"))]
    {
        inputs.iter().map(run).collect()
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Encode `img` to `path`, choosing the format from the extension.
///
/// Parent directories are created as needed. The image is encoded into a
/// temporary file next to `path` and renamed over it only once encoding has
/// succeeded, so a failed save never leaves a partial file behind. JPEG output
/// drops any alpha channel.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &DynamicImage, path: &Path, opts: &ProcessOptions) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;
    if !matches!(
        format,
        ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp
    ) {
        return Err(Error::UnsupportedFormat(format!("{format:?}")));
    }

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut builder = tempfile::Builder::new();
    builder.prefix(".watermark-inpaint-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // same mode a plain create would give; the umask still applies
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder.tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        if format == ImageFormat::Jpeg {
            let quality = opts.jpeg_quality.clamp(1, 100);
            let mut encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, quality);
            encoder.encode_image(&img.to_rgb8())?;
        } else {
            img.write_to(&mut writer, format)?;
        }
        writer.flush()?;
    }

    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_cleaned.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_cleaned.{ext}"))
}
