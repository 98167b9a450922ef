use crate::error::ClassifierError;
use crate::image_classifier::interface::{
    ClassProbability, ClassificationVector, ClassifierModel, ImageClassifier,
};
use crate::image_classifier::models::model_config::{ModelConfig, TensorLayout};
use crate::image_classifier::tract::image::{resize_image_to_tensor, softmax};
use crate::image_decoder::interface::DecodedImage;
use crate::library::logger::interface::Logger;
use async_trait::async_trait;
use serde::Deserialize;
use std::io::Cursor;
use std::sync::Arc;
use tract_onnx::prelude::*;

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

/// Label metadata shipped next to the model, Teachable Machine style.
#[derive(Debug, Deserialize)]
struct ModelMetadata {
    labels: Vec<String>,
    #[serde(rename = "imageSize")]
    image_size: Option<u32>,
}

/// Fetches an ONNX model plus its metadata and runs it with tract.
pub struct ImageClassifierTractOnnx {
    logger: Arc<dyn Logger + Send + Sync>,
    config: ModelConfig,
    http: reqwest::Client,
}

impl ImageClassifierTractOnnx {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>, config: ModelConfig) -> Self {
        Self {
            logger: logger.with_namespace("classifier").with_namespace("tract"),
            config,
            http: reqwest::Client::new(),
        }
    }

    async fn fetch(&self, location: &str) -> Result<Vec<u8>, ClassifierError> {
        let _ = self.logger.info(&format!("Fetching {}", location));

        if location.starts_with("http://") || location.starts_with("https://") {
            let response = self
                .http
                .get(location)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| ClassifierError::ModelLoad(format!("{}: {}", location, e)))?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| ClassifierError::ModelLoad(format!("{}: {}", location, e)))?;
            Ok(bytes.to_vec())
        } else {
            tokio::fs::read(location)
                .await
                .map_err(|e| ClassifierError::ModelLoad(format!("{}: {}", location, e)))
        }
    }
}

fn build_plan(
    model_bytes: Vec<u8>,
    input_shape: (u32, u32),
    layout: TensorLayout,
) -> Result<Plan, Box<dyn std::error::Error + Send + Sync>> {
    let (h, w) = (input_shape.0 as usize, input_shape.1 as usize);
    let shape = match layout {
        TensorLayout::Nchw => [1, 3, h, w],
        TensorLayout::Nhwc => [1, h, w, 3],
    };

    let plan = tract_onnx::onnx()
        .model_for_read(&mut Cursor::new(model_bytes))?
        .with_input_fact(0, f32::fact(shape).into())?
        .into_optimized()?
        .into_runnable()?;

    Ok(plan)
}

#[async_trait]
impl ImageClassifier for ImageClassifierTractOnnx {
    async fn load(&self) -> Result<Arc<dyn ClassifierModel + Send + Sync>, ClassifierError> {
        let base = self
            .config
            .base_url
            .as_deref()
            .ok_or_else(|| ClassifierError::ModelLoad("no model location configured".into()))?;

        let metadata_bytes = self
            .fetch(&self.config.file_location(base, &self.config.metadata_file))
            .await?;
        let metadata: ModelMetadata = serde_json::from_slice(&metadata_bytes)
            .map_err(|e| ClassifierError::ModelLoad(format!("invalid metadata: {}", e)))?;
        if metadata.labels.is_empty() {
            return Err(ClassifierError::ModelLoad("metadata has no labels".into()));
        }

        let input_shape = match metadata.image_size {
            Some(size) => (size, size),
            None => self.config.input_shape,
        };

        let model_bytes = self
            .fetch(&self.config.file_location(base, &self.config.model_file))
            .await?;

        let layout = self.config.layout;
        let plan = tokio::task::spawn_blocking(move || build_plan(model_bytes, input_shape, layout))
            .await
            .map_err(|e| ClassifierError::ModelLoad(e.to_string()))?
            .map_err(|e| ClassifierError::ModelLoad(format!("invalid model: {}", e)))?;

        let _ = self.logger.info(&format!(
            "Model compiled: {} labels, input {}x{}",
            metadata.labels.len(),
            input_shape.1,
            input_shape.0
        ));

        Ok(Arc::new(TractModel {
            plan: Arc::new(plan),
            labels: metadata.labels,
            input_shape,
            config: self.config.clone(),
        }))
    }
}

struct TractModel {
    plan: Arc<Plan>,
    labels: Vec<String>,
    input_shape: (u32, u32),
    config: ModelConfig,
}

fn run_plan(
    plan: &Plan,
    image: &image::DynamicImage,
    input_shape: (u32, u32),
    config: &ModelConfig,
) -> Result<Vec<f64>, Box<dyn std::error::Error + Send + Sync>> {
    let input = resize_image_to_tensor(
        image,
        input_shape.1,
        input_shape.0,
        config.layout,
        config.normalization,
    );

    let outputs = plan.run(tvec!(input.into_tvalue()))?;
    let output = outputs
        .first()
        .ok_or("model produced no outputs")?
        .to_array_view::<f32>()?;
    let scores: Vec<f32> = output.iter().copied().collect();

    if config.apply_softmax {
        Ok(softmax(&scores))
    } else {
        Ok(scores.into_iter().map(f64::from).collect())
    }
}

#[async_trait]
impl ClassifierModel for TractModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    async fn predict(&self, image: &DecodedImage) -> Result<ClassificationVector, ClassifierError> {
        let plan = self.plan.clone();
        let pixels = image.shared();
        let input_shape = self.input_shape;
        let config = self.config.clone();

        let probabilities =
            tokio::task::spawn_blocking(move || run_plan(&plan, &pixels, input_shape, &config))
                .await
                .map_err(|e| ClassifierError::Inference(e.to_string()))?
                .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        if probabilities.len() != self.labels.len() {
            return Err(ClassifierError::Inference(format!(
                "model produced {} scores for {} labels",
                probabilities.len(),
                self.labels.len()
            )));
        }

        Ok(self
            .labels
            .iter()
            .zip(probabilities)
            .map(|(label, probability)| ClassProbability::new(label.clone(), probability))
            .collect())
    }
}
