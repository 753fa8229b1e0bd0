//! Remove corner watermarks by inpainting.
//!
//! Two engines share one region model: the watermark is assumed to sit in a
//! proportional bottom-right corner (or a caller-supplied rectangle), and that
//! area is reconstructed from its surroundings.
//!
//! - [`classical`]: fast-marching inpainting ("telea" or "ns") applied directly
//!   to the full-resolution pixels.
//! - [`neural`]: a LaMa-style network run on a 512x512 copy of the image, with
//!   only the inpainted corner scaled back and pasted over the original.
//!
//! # Quick Start
//!
//! ```no_run
//! use watermark_inpaint::{classical, InpaintMethod};
//!
//! let img = image::open("photo.jpg").unwrap();
//! let cleaned = classical::remove_corner_watermark(&img, 30, 15, InpaintMethod::Telea).unwrap();
//! cleaned.save("cleaned.jpg").unwrap();
//! ```
//!
//! # File pipeline
//!
//! [`process_file`] decodes, applies any [`WatermarkRemover`] and writes the
//! result atomically, so a failed run never leaves a partial output.
//!
//! ```no_run
//! use std::path::Path;
//! use watermark_inpaint::{process_file, ClassicalRemover, ProcessOptions};
//!
//! let remover = ClassicalRemover::default();
//! process_file(&remover, Path::new("in.png"), Path::new("out.png"), &ProcessOptions::default())
//!     .expect("watermark removed");
//! ```

#![deny(missing_docs)]

pub mod classical;
mod engine;
pub mod error;
pub mod inpaint;
pub mod mask;
pub mod neural;
pub mod region;

pub use classical::{ClassicalRemover, Target};
pub use engine::{
    default_output_path, is_supported_image, load_image, process_directory, process_file,
    save_image, ProcessOptions, ProcessResult, WatermarkRemover,
};
pub use error::{Error, Result};
pub use inpaint::InpaintMethod;
pub use neural::{NeuralOptions, NeuralRemover};
pub use region::{compute_region, Region};
