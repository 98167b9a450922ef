use crate::error::ClassifierError;
use crate::image_classifier::interface::{ClassificationVector, ClassifierModel, ImageClassifier};
use crate::image_decoder::interface::DecodedImage;
use crate::library::logger::interface::Logger;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Owns the classifier handle. Built once at startup and shared by reference.
///
/// The handle goes from absent to present exactly once; a failed load leaves
/// it absent so `load()` can be retried.
pub struct ClassifierGateway {
    logger: Arc<dyn Logger + Send + Sync>,
    image_classifier: Arc<dyn ImageClassifier + Send + Sync>,
    model: OnceCell<Arc<dyn ClassifierModel + Send + Sync>>,
}

impl ClassifierGateway {
    pub fn new(
        logger: Arc<dyn Logger + Send + Sync>,
        image_classifier: Arc<dyn ImageClassifier + Send + Sync>,
    ) -> Self {
        Self {
            logger: logger.with_namespace("classifier"),
            image_classifier,
            model: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    pub async fn load(&self) -> Result<(), ClassifierError> {
        if self.is_loaded() {
            return Ok(());
        }

        let result = self
            .model
            .get_or_try_init(|| async {
                let _ = self.logger.info("Loading model...");
                self.image_classifier.load().await
            })
            .await;

        match result {
            Ok(model) => {
                let _ = self
                    .logger
                    .info(&format!("Model ready with {} classes", model.labels().len()));
                Ok(())
            }
            Err(e) => {
                let _ = self.logger.error(&format!("Model load failed: {}", e));
                Err(e)
            }
        }
    }

    pub async fn classify(
        &self,
        image: &DecodedImage,
    ) -> Result<ClassificationVector, ClassifierError> {
        let model = self.model.get().ok_or(ClassifierError::ModelNotLoaded)?;

        let vector = model.predict(image).await?;

        if vector.len() != model.labels().len() {
            return Err(ClassifierError::Inference(format!(
                "expected {} classes, model returned {}",
                model.labels().len(),
                vector.len()
            )));
        }

        Ok(vector)
    }
}
