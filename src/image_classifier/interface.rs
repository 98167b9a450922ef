use crate::error::ClassifierError;
use crate::image_decoder::interface::DecodedImage;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassProbability {
    pub label: String,
    pub probability: f64,
}

impl ClassProbability {
    pub fn new(label: impl Into<String>, probability: f64) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }

    /// Rounded percentage for display, e.g. `0.915` -> `92`.
    pub fn percent(&self) -> i64 {
        (self.probability * 100.0).round() as i64
    }
}

/// One probability per class known to the model, in model order.
///
/// Immutable once built; clones share the same entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationVector(Arc<[ClassProbability]>);

impl ClassificationVector {
    pub fn entries(&self) -> &[ClassProbability] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassProbability> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<ClassProbability>> for ClassificationVector {
    fn from(entries: Vec<ClassProbability>) -> Self {
        Self(entries.into())
    }
}

impl FromIterator<ClassProbability> for ClassificationVector {
    fn from_iter<I: IntoIterator<Item = ClassProbability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Fetches and prepares a model. Called by the gateway at most once per
/// successful load.
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn ClassifierModel + Send + Sync>, ClassifierError>;
}

/// A loaded model. Its label set is fixed for its whole lifetime.
#[async_trait]
pub trait ClassifierModel: Send + Sync {
    fn labels(&self) -> &[String];

    async fn predict(&self, image: &DecodedImage) -> Result<ClassificationVector, ClassifierError>;
}
