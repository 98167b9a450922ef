use crate::error::ClassifierError;
use crate::image_classifier::interface::{
    ClassProbability, ClassificationVector, ClassifierModel, ImageClassifier,
};
use crate::image_decoder::interface::DecodedImage;
use crate::library::logger::interface::Logger;
use async_trait::async_trait;
use rand::distr::{Distribution, Uniform};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Clone)]
pub enum FakePrediction {
    /// Random probabilities over all labels, normalized to sum to 1.
    Random,
    /// Probabilities in label order.
    Fixed(Vec<f64>),
    Fail(String),
}

#[derive(Clone)]
struct Scripted {
    prediction: FakePrediction,
    gate: Option<Arc<Notify>>,
}

pub struct ImageClassifierFake {
    logger: Arc<dyn Logger + Send + Sync>,
    labels: Vec<String>,
    default_prediction: FakePrediction,
    by_width: HashMap<u32, Scripted>,
    failing_loads: AtomicUsize,
    pub load_calls: AtomicUsize,
    pub predict_calls: Arc<AtomicUsize>,
}

impl ImageClassifierFake {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>, labels: Vec<String>) -> Self {
        Self {
            logger: logger.with_namespace("classifier").with_namespace("fake"),
            labels,
            default_prediction: FakePrediction::Random,
            by_width: HashMap::new(),
            failing_loads: AtomicUsize::new(0),
            load_calls: AtomicUsize::new(0),
            predict_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[allow(dead_code)]
    pub fn with_prediction(mut self, prediction: FakePrediction) -> Self {
        self.default_prediction = prediction;
        self
    }

    /// Scripts the answer for images of the given width. When a gate is
    /// given, the prediction waits until the gate is notified.
    #[allow(dead_code)]
    pub fn with_prediction_for_width(
        mut self,
        width: u32,
        prediction: FakePrediction,
        gate: Option<Arc<Notify>>,
    ) -> Self {
        self.by_width.insert(width, Scripted { prediction, gate });
        self
    }

    #[allow(dead_code)]
    pub fn with_failing_loads(self, count: usize) -> Self {
        self.failing_loads.store(count, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl ImageClassifier for ImageClassifierFake {
    async fn load(&self) -> Result<Arc<dyn ClassifierModel + Send + Sync>, ClassifierError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        let _ = self.logger.info("Loading fake model...");

        let should_fail = self
            .failing_loads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(ClassifierError::ModelLoad(
                "fake model is configured to fail".to_string(),
            ));
        }

        Ok(Arc::new(FakeModel {
            logger: self.logger.clone(),
            labels: self.labels.clone(),
            default_prediction: self.default_prediction.clone(),
            by_width: self.by_width.clone(),
            predict_calls: self.predict_calls.clone(),
        }))
    }
}

struct FakeModel {
    logger: Arc<dyn Logger + Send + Sync>,
    labels: Vec<String>,
    default_prediction: FakePrediction,
    by_width: HashMap<u32, Scripted>,
    predict_calls: Arc<AtomicUsize>,
}

impl FakeModel {
    fn random_probabilities(&self) -> Result<Vec<f64>, ClassifierError> {
        let mut rng = rand::rng();
        let dist = Uniform::new(0.0, 1.0).map_err(|e| ClassifierError::Inference(e.to_string()))?;
        let weights: Vec<f64> = self.labels.iter().map(|_| dist.sample(&mut rng)).collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Ok(weights);
        }
        Ok(weights.into_iter().map(|w| w / total).collect())
    }
}

#[async_trait]
impl ClassifierModel for FakeModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    async fn predict(&self, image: &DecodedImage) -> Result<ClassificationVector, ClassifierError> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);

        let scripted = self.by_width.get(&image.width());
        if let Some(gate) = scripted.and_then(|s| s.gate.as_ref()) {
            gate.notified().await;
        }

        let prediction = scripted
            .map(|s| &s.prediction)
            .unwrap_or(&self.default_prediction);

        let probabilities = match prediction {
            FakePrediction::Random => self.random_probabilities()?,
            FakePrediction::Fixed(probabilities) => probabilities.clone(),
            FakePrediction::Fail(reason) => {
                let _ = self.logger.warn(&format!("Failing prediction: {}", reason));
                return Err(ClassifierError::Inference(reason.clone()));
            }
        };

        Ok(probabilities
            .into_iter()
            .enumerate()
            .map(|(i, probability)| {
                let label = self
                    .labels
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("class_{}", i));
                ClassProbability::new(label, probability)
            })
            .collect())
    }
}
