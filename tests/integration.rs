use std::path::Path;

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;
use watermark_inpaint::neural::InpaintModel;
use watermark_inpaint::{
    compute_region, process_file, ClassicalRemover, Error, InpaintMethod, NeuralRemover,
    ProcessOptions, Region, Target,
};

fn scenery(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        #[allow(clippy::cast_possible_truncation)]
        Rgb([(x / 4 % 256) as u8, (y / 3 % 256) as u8, ((x ^ y) % 256) as u8])
    })
}

/// Echoes the input image back, so only compositing changes pixels.
struct Echo;

impl InpaintModel for Echo {
    fn infer(
        &self,
        image: Array4<f32>,
        _mask: Array4<f32>,
    ) -> watermark_inpaint::Result<Array4<f32>> {
        Ok(image)
    }
}

fn assert_same_outside(a: &DynamicImage, b: &DynamicImage, region: &Region) {
    assert_eq!(a.dimensions(), b.dimensions());
    for (x, y, px) in a.pixels() {
        if !region.contains(x, y) {
            assert_eq!(px, b.get_pixel(x, y), "pixel ({x},{y}) differs");
        }
    }
}

#[test]
fn classical_file_pipeline_on_800x600() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    let output = dir.path().join("photo_cleaned.png");
    scenery(800, 600).save(&input).unwrap();

    process_file(
        &ClassicalRemover::default(),
        &input,
        &output,
        &ProcessOptions::default(),
    )
    .unwrap();

    let before = image::open(&input).unwrap();
    let after = image::open(&output).unwrap();
    assert_eq!(after.dimensions(), (800, 600));
    assert_same_outside(&before, &after, &Region::new(560, 510, 240, 90));
}

#[test]
fn ns_custom_region_file_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.bmp");
    let output = dir.path().join("out/photo.png");
    scenery(120, 90).save(&input).unwrap();

    let region = Region::new(5, 5, 30, 12);
    let remover = ClassicalRemover {
        target: Target::Custom(region),
        method: InpaintMethod::NavierStokes,
        radius: 4,
    };
    process_file(&remover, &input, &output, &ProcessOptions::default()).unwrap();

    let before = image::open(&input).unwrap();
    let after = image::open(&output).unwrap();
    assert_same_outside(&before, &after, &region);
}

#[test]
fn unknown_method_fails_before_anything_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    let output = dir.path().join("photo_cleaned.png");
    scenery(64, 48).save(&input).unwrap();

    let err = "bogus"
        .parse::<InpaintMethod>()
        .and_then(|method| {
            let remover = ClassicalRemover {
                method,
                ..ClassicalRemover::default()
            };
            process_file(&remover, &input, &output, &ProcessOptions::default())
        })
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(!output.exists());

    // the same input goes through once the method is valid
    let method = "ns".parse::<InpaintMethod>().unwrap();
    let remover = ClassicalRemover {
        method,
        ..ClassicalRemover::default()
    };
    process_file(&remover, &input, &output, &ProcessOptions::default()).unwrap();
    assert!(output.exists());
}

#[test]
fn out_of_bounds_region_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("small.png");
    let output = dir.path().join("small_cleaned.png");
    scenery(50, 50).save(&input).unwrap();

    let remover = ClassicalRemover {
        target: Target::Custom(Region::new(40, 40, 20, 20)),
        ..ClassicalRemover::default()
    };
    let err = process_file(&remover, &input, &output, &ProcessOptions::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(!output.exists());
}

#[test]
fn missing_input_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = process_file(
        &ClassicalRemover::default(),
        &dir.path().join("ghost.jpg"),
        Path::new("unused.png"),
        &ProcessOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn neural_file_pipeline_only_touches_extended_corner() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    let output = dir.path().join("photo_cleaned.png");
    scenery(1024, 768).save(&input).unwrap();

    process_file(
        &NeuralRemover::new(&Echo),
        &input,
        &output,
        &ProcessOptions::default(),
    )
    .unwrap();

    let before = image::open(&input).unwrap();
    let after = image::open(&output).unwrap();
    let corner = compute_region(1024, 768, 0.16, 0.16).unwrap();
    assert_same_outside(&before, &after, &corner);
}

#[cfg(feature = "onnx")]
#[test]
fn missing_model_fails_before_inference() {
    use watermark_inpaint::neural::LamaSession;

    let dir = tempfile::tempdir().unwrap();
    let err = LamaSession::load(dir.path().join("lama_fp32.onnx")).unwrap_err();
    assert!(matches!(err, Error::NotFound { what: "model file", .. }));
}
