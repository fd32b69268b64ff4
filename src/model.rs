// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! YOLO model loading and inference.
//!
//! [`YoloModel`] owns an ONNX Runtime session. It is built once through an
//! explicit constructor and handed to [`crate::counter::run`] by the caller.

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use ndarray::Array4;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::tensor::PrimitiveTensorElementType;
use ort::value::TensorRef;

use crate::config::CounterConfig;
use crate::error::{CounterError, Result};
use crate::metadata::{METADATA_KEYS, ModelMetadata};
use crate::postprocessing::postprocess;
use crate::prediction::Prediction;
use crate::preprocessing::preprocess_image;
use crate::source::load_image;

/// Anything that can turn an image into a [`Prediction`].
///
/// [`YoloModel`] is the production implementation. Tests substitute fixed
/// predictions to exercise counting without a model artifact.
pub trait Detector {
    /// Run detection on one decoded image.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::InferenceError`] if the model cannot process the image.
    fn detect(&mut self, image: &DynamicImage) -> Result<Prediction>;
}

/// YOLO detection model backed by ONNX Runtime.
///
/// # Example
///
/// ```no_run
/// use detection_counter::YoloModel;
///
/// let mut model = YoloModel::load("strawberry.onnx")?;
/// let prediction = model.predict("field.jpg")?;
/// println!("Found {} detections", prediction.len());
/// # Ok::<(), detection_counter::CounterError>(())
/// ```
pub struct YoloModel {
    /// ONNX Runtime session.
    session: Session,
    /// Model metadata (names, input size, task).
    metadata: ModelMetadata,
    /// Input tensor name.
    input_name: String,
    /// Output tensor names.
    output_names: Vec<String>,
    /// Inference configuration.
    config: CounterConfig,
    /// Path the model was loaded from.
    path: PathBuf,
}

impl YoloModel {
    /// Load a YOLO model from an ONNX file with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::ModelLoadError`] if the file is missing, is not
    /// an ONNX model, or is not a detection model.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_config(path, CounterConfig::default())
    }

    /// Load a YOLO model with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::ConfigError`] for an invalid configuration and
    /// [`CounterError::ModelLoadError`] if the model cannot be loaded.
    pub fn load_with_config<P: AsRef<Path>>(path: P, config: CounterConfig) -> Result<Self> {
        let path = path.as_ref();
        config.validate()?;

        if !path.is_file() {
            return Err(CounterError::ModelLoadError(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pt") || ext.eq_ignore_ascii_case("pth"))
        {
            return Err(CounterError::ModelLoadError(format!(
                "{} is a PyTorch checkpoint; export it first with `yolo export model={} format=onnx`",
                path.display(),
                path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| CounterError::ModelLoadError(format!("Failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| CounterError::ModelLoadError(format!("Failed to set optimization level: {e}")))?
            .with_intra_threads(config.num_threads)
            .map_err(|e| CounterError::ModelLoadError(format!("Failed to set intra-thread count: {e}")))?
            .commit_from_file(path)
            .map_err(|e| {
                CounterError::ModelLoadError(format!("Failed to load model {}: {e}", path.display()))
            })?;

        let metadata = Self::extract_metadata(&session)?;
        if !metadata.is_detect() {
            return Err(CounterError::ModelLoadError(format!(
                "Model task is '{}', only detection models can be counted",
                metadata.task
            )));
        }

        let input_name = session
            .inputs
            .first()
            .map_or_else(|| "images".to_string(), |i| i.name.clone());
        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        if output_names.is_empty() {
            return Err(CounterError::ModelLoadError(
                "Model declares no outputs".to_string(),
            ));
        }

        let config = CounterConfig {
            imgsz: config.imgsz.or(Some(metadata.imgsz)),
            half: config.half || metadata.half,
            ..config
        };

        Ok(Self {
            session,
            metadata,
            input_name,
            output_names,
            config,
            path: path.to_path_buf(),
        })
    }

    /// Read the Ultralytics custom metadata properties from the session.
    fn extract_metadata(session: &Session) -> Result<ModelMetadata> {
        let model_metadata = session
            .metadata()
            .map_err(|e| CounterError::ModelLoadError(format!("Failed to get model metadata: {e}")))?;

        let mut props = HashMap::new();
        for key in METADATA_KEYS {
            if let Ok(Some(value)) = model_metadata.custom(key) {
                props.insert((*key).to_string(), value);
            }
        }

        ModelMetadata::from_properties(&props)
    }

    /// Decode an image file and run inference on it.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::ImageDecodeError`] if the image can't be read
    /// and [`CounterError::InferenceError`] if inference fails.
    pub fn predict<P: AsRef<Path>>(&mut self, path: P) -> Result<Prediction> {
        let image = load_image(path)?;
        self.predict_image(&image)
    }

    /// Run inference on a decoded image.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::InferenceError`] if the session fails or the
    /// output tensor is malformed.
    pub fn predict_image(&mut self, image: &DynamicImage) -> Result<Prediction> {
        let target_size = self.config.imgsz.unwrap_or(self.metadata.imgsz);
        let preprocessed = preprocess_image(image, target_size, self.config.half);

        let (output, shape) = match &preprocessed.tensor_f16 {
            Some(tensor) => self.run_inference(tensor)?,
            None => self.run_inference(&preprocessed.tensor)?,
        };

        let sets = postprocess(
            &output,
            &shape,
            &preprocessed,
            &self.config,
            self.metadata.num_classes(),
        )?;

        Ok(Prediction::new(sets, self.metadata.names.clone()))
    }

    /// Run the ONNX session and return the first output as `(data, shape)`.
    fn run_inference<T>(&mut self, input: &Array4<T>) -> Result<(Vec<f32>, Vec<usize>)>
    where
        T: PrimitiveTensorElementType + Debug + Clone + 'static,
    {
        let input_contiguous = input.as_standard_layout();
        let input_tensor = TensorRef::from_array_view(&input_contiguous)
            .map_err(|e| CounterError::InferenceError(format!("Failed to create input tensor: {e}")))?;

        let inputs = ort::inputs![&self.input_name => input_tensor];
        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| CounterError::InferenceError(format!("Inference failed: {e}")))?;

        let output_name = self.output_names[0].as_str();
        let output = outputs
            .get(output_name)
            .ok_or_else(|| CounterError::InferenceError(format!("Output '{output_name}' not found")))?;

        // FP16 exports may also emit FP16 outputs
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            return Ok((data.to_vec(), dims(shape)));
        }
        let (shape, data) = output
            .try_extract_tensor::<half::f16>()
            .map_err(|e| CounterError::InferenceError(format!("Failed to extract output: {e}")))?;

        Ok((data.iter().map(|v| v.to_f32()).collect(), dims(shape)))
    }

    /// Get the model's class names.
    #[must_use]
    pub const fn names(&self) -> &HashMap<usize, String> {
        &self.metadata.names
    }

    /// Get the number of classes.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.metadata.num_classes()
    }

    /// Get the input size used for inference as (height, width).
    #[must_use]
    pub fn imgsz(&self) -> (usize, usize) {
        self.config.imgsz.unwrap_or(self.metadata.imgsz)
    }

    /// Get the model's stride.
    #[must_use]
    pub const fn stride(&self) -> u32 {
        self.metadata.stride
    }

    /// Whether inputs are fed as FP16.
    #[must_use]
    pub const fn is_half(&self) -> bool {
        self.config.half
    }

    /// Get the model metadata.
    #[must_use]
    pub const fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Get the path the model was loaded from.
    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.path
    }
}

impl Detector for YoloModel {
    fn detect(&mut self, image: &DynamicImage) -> Result<Prediction> {
        self.predict_image(image)
    }
}

impl Debug for YoloModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloModel")
            .field("path", &self.path)
            .field("num_classes", &self.metadata.num_classes())
            .field("imgsz", &self.imgsz())
            .field("half", &self.config.half)
            .finish_non_exhaustive()
    }
}

fn dims(shape: &[i64]) -> Vec<usize> {
    shape
        .iter()
        .map(|&d| usize::try_from(d).unwrap_or(0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_not_found() {
        let result = YoloModel::load("nonexistent.onnx");
        assert!(matches!(result, Err(CounterError::ModelLoadError(_))));
    }

    #[test]
    fn test_pytorch_checkpoint_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strawberry.pt");
        std::fs::write(&path, b"not really a checkpoint").unwrap();

        let err = YoloModel::load(&path).unwrap_err();
        assert!(matches!(err, CounterError::ModelLoadError(ref msg) if msg.contains("format=onnx")));
    }

    #[test]
    fn test_invalid_config_rejected_before_loading() {
        let config = CounterConfig::new().with_confidence(2.0);
        let result = YoloModel::load_with_config("nonexistent.onnx", config);
        assert!(matches!(result, Err(CounterError::ConfigError(_))));
    }

    #[test]
    fn test_dims_clamps_dynamic_axes() {
        assert_eq!(dims(&[1, 6, 8400]), vec![1, 6, 8400]);
        assert_eq!(dims(&[-1, 6]), vec![0, 6]);
    }
}
