use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    Nchw,
    Nhwc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// `pixel / 255`
    UnitRange,
    /// `pixel / 127.5 - 1`
    SignedUnit,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// `http(s)://` URL or local directory holding the model files. When
    /// unset the fake classifier is used.
    pub base_url: Option<String>,
    pub model_file: String,
    pub metadata_file: String,
    /// (height, width)
    pub input_shape: (u32, u32),
    pub layout: TensorLayout,
    pub normalization: Normalization,
    pub apply_softmax: bool,
    pub fake_labels: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model_file: "model.onnx".to_string(),
            metadata_file: "metadata.json".to_string(),
            input_shape: (224, 224),
            layout: TensorLayout::Nhwc,
            normalization: Normalization::SignedUnit,
            apply_softmax: false,
            fake_labels: vec![
                "대통령_이승만".to_string(),
                "대통령_박정희".to_string(),
                "대통령_김대중".to_string(),
                "대통령_노무현".to_string(),
                "유명인_배우".to_string(),
                "유명인_가수".to_string(),
                "기타".to_string(),
            ],
        }
    }
}

impl ModelConfig {
    pub fn file_location(&self, base: &str, file: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), file)
    }
}
