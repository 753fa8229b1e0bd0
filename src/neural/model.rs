//! Inference backends for the neural inpainting pipeline.

use ndarray::Array4;

use crate::error::Result;

/// An image+mask→image inpainting network.
///
/// Implementations receive a `(1, 3, S, S)` image tensor in `[0, 1]` and a
/// `(1, 1, S, S)` mask tensor, and return the `(1, 3, S, S)` inpainted image.
/// `infer` takes `&self`: a loaded model is shared read-only between pipeline
/// calls, and any synchronisation the backend needs is its own concern.
pub trait InpaintModel {
    /// Run the network on one image/mask pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Inference`](crate::Error::Inference) if the backend
    /// rejects the tensors or fails internally.
    fn infer(&self, image: Array4<f32>, mask: Array4<f32>) -> Result<Array4<f32>>;
}

#[cfg(feature = "onnx")]
pub use onnx::LamaSession;

#[cfg(feature = "onnx")]
mod onnx {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::time::Instant;

    use ndarray::{Array4, Ix4};
    use ort::session::{builder::GraphOptimizationLevel, Session};
    use ort::value::Value;

    use super::InpaintModel;
    use crate::error::{Error, Result};

    /// An ONNX Runtime session for a LaMa-style inpainting model.
    ///
    /// Input names are read from the model: exactly two inputs are expected,
    /// image first and mask second, in the order the model declares them. The
    /// first declared output is used.
    ///
    /// ONNX Runtime needs exclusive access to run a session, so calls to
    /// [`infer`](InpaintModel::infer) are serialized by an internal mutex. The
    /// session can be shared across threads by reference; only the inference
    /// step itself runs one at a time. Use one session per worker for parallel
    /// inference.
    #[derive(Debug)]
    pub struct LamaSession {
        session: Mutex<Session>,
        image_input: String,
        mask_input: String,
        output: String,
        path: PathBuf,
    }

    impl LamaSession {
        /// Conventional location of the model, relative to the working directory.
        #[must_use]
        pub fn default_model_path() -> PathBuf {
            Path::new("assets").join("lama_fp32.onnx")
        }

        /// Load a model file.
        ///
        /// # Errors
        ///
        /// Returns [`Error::NotFound`] if `path` does not exist (checked before
        /// ONNX Runtime is touched), and [`Error::Inference`] if the runtime
        /// cannot load it or its inputs/outputs do not match the image+mask
        /// contract.
        pub fn load(path: impl AsRef<Path>) -> Result<Self> {
            let path = path.as_ref();
            if !path.exists() {
                return Err(Error::NotFound {
                    what: "model file",
                    path: path.to_path_buf(),
                });
            }

            let started = Instant::now();
            let session = Session::builder()
                .map_err(|e| Error::inference(format!("failed to create session builder: {e}")))?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(|e| Error::inference(format!("failed to set optimization level: {e}")))?
                .commit_from_file(path)
                .map_err(|e| {
                    Error::inference(format!("failed to load model {}: {e}", path.display()))
                })?;

            let names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
            let [image_input, mask_input] = <[String; 2]>::try_from(names).map_err(|names| {
                Error::inference(format!(
                    "expected a model with two inputs (image, mask), found {names:?}"
                ))
            })?;
            let output = session
                .outputs
                .first()
                .map(|o| o.name.clone())
                .ok_or_else(|| Error::inference("model declares no outputs"))?;

            log::info!(
                "loaded {} in {:.0}ms (inputs: {image_input}, {mask_input}; output: {output})",
                path.display(),
                started.elapsed().as_secs_f64() * 1000.0
            );

            Ok(Self {
                session: Mutex::new(session),
                image_input,
                mask_input,
                output,
                path: path.to_path_buf(),
            })
        }

        /// Names of the image and mask inputs, as declared by the model.
        #[must_use]
        pub fn input_names(&self) -> (&str, &str) {
            (&self.image_input, &self.mask_input)
        }

        /// Path the model was loaded from.
        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl InpaintModel for LamaSession {
        fn infer(&self, image: Array4<f32>, mask: Array4<f32>) -> Result<Array4<f32>> {
            log::debug!(
                "running inference, image {:?}, mask {:?}",
                image.dim(),
                mask.dim()
            );
            let image = Value::from_array(image)
                .map_err(|e| Error::inference(format!("failed to convert image tensor: {e}")))?;
            let mask = Value::from_array(mask)
                .map_err(|e| Error::inference(format!("failed to convert mask tensor: {e}")))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| Error::internal("model session lock poisoned"))?;

            let started = Instant::now();
            let outputs = session
                .run(ort::inputs![
                    self.image_input.as_str() => image,
                    self.mask_input.as_str() => mask,
                ])
                .map_err(|e| Error::inference(e.to_string()))?;

            let output = outputs[self.output.as_str()]
                .try_extract_array::<f32>()
                .map_err(|e| Error::inference(format!("failed to extract output tensor: {e}")))?
                .to_owned()
                .into_dimensionality::<Ix4>()
                .map_err(|e| Error::inference(format!("expected a 4D output tensor: {e}")))?;

            log::debug!(
                "inference took {:.0}ms, output {:?}",
                started.elapsed().as_secs_f64() * 1000.0,
                output.dim()
            );
            Ok(output)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn missing_model_is_not_found() {
            let err = LamaSession::load("definitely/not/here/lama_fp32.onnx").unwrap_err();
            assert!(matches!(err, Error::NotFound { what: "model file", .. }));
        }

        #[test]
        fn default_model_path_points_into_assets() {
            let p = LamaSession::default_model_path();
            assert!(p.starts_with("assets"));
            assert_eq!(p.file_name().unwrap(), "lama_fp32.onnx");
        }
    }
}
