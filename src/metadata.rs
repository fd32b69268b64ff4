// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! ONNX model metadata parsing.
//!
//! Ultralytics exporters store the class-name table, input size, stride and
//! task as custom metadata properties on the ONNX graph. Each value is the
//! Python `str()` of the original object, so `names` looks like
//! `{0: 'strawberry', 1: 'flower'}` and `imgsz` like `[640, 640]`.

use std::collections::HashMap;

use crate::error::{CounterError, Result};

/// Metadata keys read from the ONNX model.
pub const METADATA_KEYS: &[&str] = &[
    "description",
    "author",
    "version",
    "task",
    "stride",
    "imgsz",
    "half",
    "names",
];

/// Metadata extracted from a YOLO ONNX model.
#[derive(Debug, Clone)]
pub struct ModelMetadata {
    /// Model description (e.g., "Ultralytics YOLO11n model trained on strawberry.yaml").
    pub description: String,
    /// Model author.
    pub author: String,
    /// Exporter version.
    pub version: String,
    /// Task the model was exported for. Only `detect` models can be counted.
    pub task: String,
    /// Model stride (typically 32).
    pub stride: u32,
    /// Input image size as (height, width).
    pub imgsz: (usize, usize),
    /// Whether the model expects FP16 input.
    pub half: bool,
    /// Class ID to class name mapping.
    pub names: HashMap<usize, String>,
}

impl ModelMetadata {
    /// Build metadata from ONNX custom properties.
    ///
    /// Unknown keys are ignored and missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::ModelLoadError`] if a present value is malformed.
    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self> {
        let mut metadata = Self::default();

        for (key, raw) in props {
            let value = unquote(raw.trim());
            match key.as_str() {
                "description" => metadata.description = value.to_string(),
                "author" => metadata.author = value.to_string(),
                "version" => metadata.version = value.to_string(),
                "task" => metadata.task = value.to_lowercase(),
                "stride" => {
                    metadata.stride = parse_stride(value)?;
                }
                "imgsz" => metadata.imgsz = parse_imgsz(value)?,
                "half" => metadata.half = value.eq_ignore_ascii_case("true"),
                "names" => metadata.names = parse_names(value)?,
                _ => {}
            }
        }

        Ok(metadata)
    }

    /// Whether the model was exported for object detection.
    #[must_use]
    pub fn is_detect(&self) -> bool {
        matches!(self.task.as_str(), "detect" | "detection")
    }

    /// Get the number of classes in this model.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.names.len()
    }

    /// Short model name taken from the description, e.g. `YOLO11n`.
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.description
            .split_whitespace()
            .find(|w| w.starts_with("YOLO"))
            .unwrap_or("Model")
    }
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            description: String::new(),
            author: String::new(),
            version: String::new(),
            task: "detect".to_string(),
            stride: 32,
            imgsz: (640, 640),
            half: false,
            names: HashMap::new(),
        }
    }
}

fn unquote(value: &str) -> &str {
    value.trim_matches('\'').trim_matches('"')
}

/// YOLOv5 exports write the stride as a float (`32.0`) or a list of strides.
fn parse_stride(value: &str) -> Result<u32> {
    let last = value
        .trim_matches(|c: char| c == '[' || c == ']')
        .split(',')
        .filter_map(|s| s.trim().parse::<f32>().ok())
        .last()
        .ok_or_else(|| CounterError::ModelLoadError(format!("Invalid stride value: {value}")))?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let stride = last as u32;
    Ok(stride)
}

/// Parse `[640, 640]`, `(640, 640)` or a single `640`.
fn parse_imgsz(value: &str) -> Result<(usize, usize)> {
    let values: Vec<usize> = value
        .trim_matches(|c: char| matches!(c, '[' | ']' | '(' | ')'))
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    match values.as_slice() {
        [size] => Ok((*size, *size)),
        [h, w, ..] => Ok((*h, *w)),
        [] => Err(CounterError::ModelLoadError(format!(
            "Invalid imgsz value: {value}"
        ))),
    }
}

/// Parse a class-name table from a Python dict (`{0: 'a', 1: 'b'}`),
/// a Python list (`['a', 'b']`) or YAML lines (`0: a`).
fn parse_names(value: &str) -> Result<HashMap<usize, String>> {
    let trimmed = value.trim();

    if let Some(inner) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        return Ok(split_top_level(inner)
            .into_iter()
            .map(|name| unquote(name.trim()).to_string())
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .collect());
    }

    let inner = trimmed
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(trimmed);

    let mut names = HashMap::new();
    for entry in split_top_level(inner) {
        let Some((key, name)) = entry.split_once(':') else {
            continue;
        };
        let class_id = key.trim().parse::<usize>().map_err(|_| {
            CounterError::ModelLoadError(format!("Invalid class id in names: {}", key.trim()))
        })?;
        names.insert(class_id, unquote(name.trim()).to_string());
    }

    Ok(names)
}

/// Split on commas and newlines that are not inside quotes, so class names
/// like `'traffic, light'` survive.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, ',' | '\n') => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);

    parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_ultralytics_properties() {
        let metadata = ModelMetadata::from_properties(&props(&[
            ("description", "Ultralytics YOLO11n model trained on strawberry.yaml"),
            ("task", "detect"),
            ("stride", "32"),
            ("imgsz", "[480, 640]"),
            ("half", "False"),
            ("names", "{0: 'strawberry', 1: 'flower', 2: 'unripe strawberry'}"),
        ]))
        .unwrap();

        assert!(metadata.is_detect());
        assert_eq!(metadata.stride, 32);
        assert_eq!(metadata.imgsz, (480, 640));
        assert!(!metadata.half);
        assert_eq!(metadata.num_classes(), 3);
        assert_eq!(metadata.names[&0], "strawberry");
        assert_eq!(metadata.names[&2], "unripe strawberry");
        assert_eq!(metadata.model_name(), "YOLO11n");
    }

    #[test]
    fn test_parse_yolov5_style_properties() {
        let metadata =
            ModelMetadata::from_properties(&props(&[("stride", "32.0"), ("names", "['ripe', 'unripe']")]))
                .unwrap();

        assert_eq!(metadata.stride, 32);
        assert_eq!(metadata.names[&0], "ripe");
        assert_eq!(metadata.names[&1], "unripe");
        // No task key: assume detection
        assert!(metadata.is_detect());
    }

    #[test]
    fn test_names_with_commas_and_yaml_lines() {
        let names = parse_names("{0: 'traffic, light', 1: \"stop sign\"}").unwrap();
        assert_eq!(names[&0], "traffic, light");
        assert_eq!(names[&1], "stop sign");

        let names = parse_names("0: person\n1: bicycle").unwrap();
        assert_eq!(names[&1], "bicycle");
    }

    #[test]
    fn test_list_names_keep_positions() {
        let names = parse_names("['ripe', '', 'unripe']").unwrap();
        assert_eq!(names.len(), 2);
        assert!(!names.contains_key(&1));
        assert_eq!(names[&2], "unripe");
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(ModelMetadata::from_properties(&props(&[("stride", "abc")])).is_err());
        assert!(ModelMetadata::from_properties(&props(&[("imgsz", "[]")])).is_err());
        assert!(ModelMetadata::from_properties(&props(&[("names", "{x: 'a'}")])).is_err());
    }

    #[test]
    fn test_non_detect_task() {
        let metadata = ModelMetadata::from_properties(&props(&[("task", "segment")])).unwrap();
        assert!(!metadata.is_detect());
    }

    #[test]
    fn test_default_metadata() {
        let metadata = ModelMetadata::default();
        assert!(metadata.is_detect());
        assert_eq!(metadata.stride, 32);
        assert_eq!(metadata.imgsz, (640, 640));
        assert_eq!(metadata.num_classes(), 0);
        assert_eq!(metadata.model_name(), "Model");
    }
}
