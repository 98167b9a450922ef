use crate::acquisition::sequence::SequenceToken;
use crate::analysis::category::CategoryConfig;
use crate::analysis::summarize::{summarize, AnalysisResult};
use crate::commentary::table::{Commentary, CommentaryTable};
use crate::error::AcquisitionError;
use crate::image_classifier::gateway::ClassifierGateway;
use crate::image_decoder::interface::{ImageDecoder, ImageSource};
use crate::library::logger::interface::Logger;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Everything one successful acquisition produces.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedResult {
    pub token: SequenceToken,
    pub analysis: AnalysisResult,
    pub commentary: Commentary,
}

/// decode -> classify -> summarize -> comment.
///
/// Any stage failing ends that acquisition only; the pipeline stays usable.
/// Starting a newer acquisition makes older ones stop at the next stage
/// boundary; whatever they still deliver is stale and must be dropped by the
/// caller.
pub struct AcquisitionPipeline {
    logger: Arc<dyn Logger + Send + Sync>,
    decoder: Arc<dyn ImageDecoder + Send + Sync>,
    gateway: Arc<ClassifierGateway>,
    categories: CategoryConfig,
    commentary: CommentaryTable,
    rng: Mutex<StdRng>,
    newest: AtomicU64,
}

impl AcquisitionPipeline {
    pub fn new(
        logger: Arc<dyn Logger + Send + Sync>,
        decoder: Arc<dyn ImageDecoder + Send + Sync>,
        gateway: Arc<ClassifierGateway>,
        categories: CategoryConfig,
        commentary: CommentaryTable,
    ) -> Self {
        Self {
            logger: logger.with_namespace("pipeline"),
            decoder,
            gateway,
            categories,
            commentary,
            rng: Mutex::new(StdRng::from_os_rng()),
            newest: AtomicU64::new(0),
        }
    }

    #[allow(dead_code)]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn gateway(&self) -> &Arc<ClassifierGateway> {
        &self.gateway
    }

    fn ensure_current(&self, token: SequenceToken) -> Result<(), AcquisitionError> {
        if self.newest.load(Ordering::SeqCst) > token.value() {
            let _ = self
                .logger
                .info(&format!("Acquisition {} superseded, stopping", token));
            return Err(AcquisitionError::Superseded(token));
        }
        Ok(())
    }

    fn comment(&self, aggregate_probability: f64) -> Commentary {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.commentary.select(aggregate_probability, &mut *rng)
    }

    pub async fn run(
        &self,
        token: SequenceToken,
        source: &ImageSource,
    ) -> Result<AnnotatedResult, AcquisitionError> {
        self.newest.fetch_max(token.value(), Ordering::SeqCst);
        let _ = self
            .logger
            .info(&format!("Acquisition {} started with {:?}", token, source));

        let image = self.decoder.decode(source).await.inspect_err(|e| {
            let _ = self
                .logger
                .warn(&format!("Acquisition {} decode failed: {}", token, e));
        })?;
        self.ensure_current(token)?;

        let vector = self.gateway.classify(&image).await.inspect_err(|e| {
            let _ = self
                .logger
                .warn(&format!("Acquisition {} classify failed: {}", token, e));
        })?;
        self.ensure_current(token)?;

        let analysis = summarize(&vector, &self.categories);
        let commentary = self.comment(analysis.aggregate_probability);

        let _ = self.logger.info(&format!(
            "Acquisition {} done: aggregate {:.4}, bucket {}",
            token,
            analysis.aggregate_probability,
            commentary
                .bucket
                .map(|b| b.to_string())
                .unwrap_or_else(|| "fallback".to_string())
        ));

        Ok(AnnotatedResult {
            token,
            analysis,
            commentary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::category::Category;
    use crate::commentary::messages::{default_buckets, DEFAULT_FALLBACK};
    use crate::error::{ClassifierError, ImageDecodeError};
    use crate::image_classifier::impl_fake::{FakePrediction, ImageClassifierFake};
    use crate::image_decoder::impl_image::ImageDecoderImage;
    use crate::library::logger::impl_tracing::LoggerTracing;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn logger() -> Arc<dyn Logger + Send + Sync> {
        Arc::new(LoggerTracing::new())
    }

    fn png(width: u32) -> ImageSource {
        let mut bytes = Vec::new();
        DynamicImage::new_rgb8(width, width)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        ImageSource::from_bytes(bytes)
    }

    fn target(labels: &[&str]) -> CategoryConfig {
        CategoryConfig {
            target: Category::exact("target", labels.iter().map(|l| l.to_string()).collect()),
            secondary: vec![],
        }
    }

    struct Setup {
        pipeline: Arc<AcquisitionPipeline>,
        predict_calls: Arc<AtomicUsize>,
    }

    async fn setup(fake: ImageClassifierFake, categories: CategoryConfig, load: bool) -> Setup {
        let predict_calls = fake.predict_calls.clone();
        let gateway = Arc::new(ClassifierGateway::new(logger(), Arc::new(fake)));
        if load {
            gateway.load().await.unwrap();
        }
        let commentary =
            CommentaryTable::new(default_buckets(), DEFAULT_FALLBACK.to_string()).unwrap();
        let pipeline = AcquisitionPipeline::new(
            logger(),
            Arc::new(ImageDecoderImage::new()),
            gateway,
            categories,
            commentary,
        )
        .with_rng(StdRng::seed_from_u64(3));

        Setup {
            pipeline: Arc::new(pipeline),
            predict_calls,
        }
    }

    fn token(n: u64) -> SequenceToken {
        (0..n).fold(SequenceToken::default(), |t, _| t.next())
    }

    #[tokio::test]
    async fn test_strong_match_end_to_end() {
        let fake = ImageClassifierFake::new(logger(), vec!["이재명".into(), "기타".into()])
            .with_prediction(FakePrediction::Fixed(vec![0.92, 0.08]));
        let s = setup(fake, target(&["이재명"]), true).await;

        let result = s.pipeline.run(token(1), &png(4)).await.unwrap();

        assert_eq!(result.token, token(1));
        assert_eq!(result.analysis.aggregate_probability, 0.92);
        assert_eq!(
            result.commentary.bucket.map(|b| b.to_string()),
            Some("90-94".to_string())
        );
        let best = result.analysis.best_match("target").unwrap();
        assert_eq!((best.label.as_str(), best.percent()), ("이재명", 92));
    }

    #[tokio::test]
    async fn test_no_target_match_end_to_end() {
        let fake = ImageClassifierFake::new(logger(), vec!["고양이".into(), "강아지".into()])
            .with_prediction(FakePrediction::Fixed(vec![0.6, 0.4]));
        let s = setup(fake, target(&["이재명"]), true).await;

        let result = s.pipeline.run(token(1), &png(4)).await.unwrap();

        assert_eq!(result.analysis.aggregate_probability, 0.0);
        assert_eq!(
            result.commentary.bucket.map(|b| b.to_string()),
            Some("0-9".to_string())
        );
        assert!(result.analysis.ranked("target").is_empty());
        assert_eq!(result.analysis.full_vector.len(), 2);
    }

    #[tokio::test]
    async fn test_decode_failure_skips_classification() {
        let fake = ImageClassifierFake::new(logger(), vec!["a".into()]);
        let s = setup(fake, target(&["a"]), true).await;

        let result = s
            .pipeline
            .run(token(1), &ImageSource::from_bytes(vec![0, 1, 2, 3]))
            .await;

        assert!(matches!(
            result,
            Err(AcquisitionError::Decode(ImageDecodeError::Unsupported(_)))
        ));
        assert_eq!(s.predict_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pipeline_is_usable_after_inference_failure() {
        let fake = ImageClassifierFake::new(logger(), vec!["a".into(), "b".into()])
            .with_prediction_for_width(3, FakePrediction::Fail("bad tensor".into()), None)
            .with_prediction_for_width(4, FakePrediction::Fixed(vec![0.5, 0.5]), None);
        let s = setup(fake, target(&["a"]), true).await;

        let failed = s.pipeline.run(token(1), &png(3)).await;
        assert_eq!(
            failed,
            Err(AcquisitionError::Classifier(ClassifierError::Inference(
                "bad tensor".into()
            )))
        );

        let ok = s.pipeline.run(token(2), &png(4)).await.unwrap();
        assert_eq!(ok.analysis.aggregate_probability, 0.5);
    }

    #[tokio::test]
    async fn test_unloaded_model_is_reported() {
        let fake = ImageClassifierFake::new(logger(), vec!["a".into()]);
        let s = setup(fake, target(&["a"]), false).await;

        let result = s.pipeline.run(token(1), &png(4)).await;

        assert_eq!(
            result,
            Err(AcquisitionError::Classifier(ClassifierError::ModelNotLoaded))
        );
    }

    #[tokio::test]
    async fn test_older_acquisition_stops_after_newer_one_starts() {
        let gate = Arc::new(Notify::new());
        let fake = ImageClassifierFake::new(logger(), vec!["a".into(), "b".into()])
            .with_prediction_for_width(2, FakePrediction::Fixed(vec![0.1, 0.9]), Some(gate.clone()))
            .with_prediction_for_width(5, FakePrediction::Fixed(vec![0.8, 0.2]), None);
        let s = setup(fake, target(&["a"]), true).await;

        let older = tokio::spawn({
            let pipeline = s.pipeline.clone();
            async move { pipeline.run(token(1), &png(2)).await }
        });
        while s.predict_calls.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }

        let newer = s.pipeline.run(token(2), &png(5)).await.unwrap();
        gate.notify_one();
        let older = older.await.unwrap();

        assert_eq!(newer.analysis.aggregate_probability, 0.8);
        assert_eq!(older, Err(AcquisitionError::Superseded(token(1))));
    }
}
