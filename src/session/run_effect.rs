use crate::acquisition::pipeline::AcquisitionPipeline;
use crate::device_camera::interface::DeviceCamera;
use crate::library::logger::interface::Logger;
use crate::session::core::{Effect, Event};
use std::error::Error;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Clone)]
pub struct RunEffect {
    logger: Arc<dyn Logger + Send + Sync>,
    pipeline: Arc<AcquisitionPipeline>,
    device_camera: Arc<dyn DeviceCamera + Send + Sync>,
    event_sender: UnboundedSender<Event>,
}

impl RunEffect {
    pub fn new(
        logger: Arc<dyn Logger + Send + Sync>,
        pipeline: Arc<AcquisitionPipeline>,
        device_camera: Arc<dyn DeviceCamera + Send + Sync>,
        event_sender: UnboundedSender<Event>,
    ) -> Self {
        Self {
            logger,
            pipeline,
            device_camera,
            event_sender,
        }
    }

    fn send(&self, event: Event) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.event_sender.send(event).is_err() {
            self.logger.warn("Session stopped, dropping effect result")?;
        }
        Ok(())
    }

    pub async fn run_effect(&self, effect: Effect) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.logger.info(&format!("Running effect: {:?}", effect))?;

        match effect {
            Effect::LoadModel => {
                let loaded = self.pipeline.gateway().load().await;
                self.send(Event::ModelLoadDone(loaded))?;
            }
            Effect::StartCamera { camera } => {
                let result = self.device_camera.start().await;
                self.send(Event::CameraStartDone { camera, result })?;
            }
            Effect::StopCamera => {
                if let Err(e) = self.device_camera.stop().await {
                    self.logger.warn(&format!("Failed to stop camera: {}", e))?;
                }
            }
            Effect::CaptureStill { camera } => {
                let result = self.device_camera.capture_still().await;
                self.send(Event::CaptureDone { camera, result })?;
            }
            Effect::RunAcquisition { token, source } => {
                let outcome = self.pipeline.run(token, &source).await;
                self.send(Event::AcquisitionDone { token, outcome })?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::sequence::SequenceToken;
    use crate::analysis::category::CategoryConfig;
    use crate::commentary::messages::{default_buckets, DEFAULT_FALLBACK};
    use crate::commentary::table::CommentaryTable;
    use crate::device_camera::impl_fake::DeviceCameraFake;
    use crate::image_classifier::gateway::ClassifierGateway;
    use crate::image_classifier::impl_fake::ImageClassifierFake;
    use crate::image_decoder::impl_image::ImageDecoderImage;
    use crate::library::logger::impl_tracing::LoggerTracing;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    struct LoggerBroken;

    impl Logger for LoggerBroken {
        fn info(&self, _: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
            Err("log sink closed".into())
        }

        fn warn(&self, _: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
            Err("log sink closed".into())
        }

        fn error(&self, _: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
            Err("log sink closed".into())
        }

        fn with_namespace(&self, _: &str) -> Arc<dyn Logger + Send + Sync> {
            Arc::new(LoggerBroken)
        }
    }

    fn run_effect(logger: Arc<dyn Logger + Send + Sync>) -> (RunEffect, UnboundedReceiver<Event>) {
        let quiet: Arc<dyn Logger + Send + Sync> = Arc::new(LoggerTracing::new());
        let gateway = Arc::new(ClassifierGateway::new(
            quiet.clone(),
            Arc::new(ImageClassifierFake::new(quiet.clone(), vec!["a".into()])),
        ));
        let pipeline = Arc::new(AcquisitionPipeline::new(
            quiet.clone(),
            Arc::new(ImageDecoderImage::new()),
            gateway,
            CategoryConfig::default(),
            CommentaryTable::new(default_buckets(), DEFAULT_FALLBACK.to_string()).unwrap(),
        ));
        let (sender, receiver) = unbounded_channel();
        let run_effect = RunEffect::new(
            logger,
            pipeline,
            Arc::new(DeviceCameraFake::new(quiet)),
            sender,
        );
        (run_effect, receiver)
    }

    #[tokio::test]
    async fn test_camera_start_reports_its_identity() {
        let (run_effect, mut receiver) = run_effect(Arc::new(LoggerTracing::new()));
        let camera = SequenceToken::default().next();

        run_effect
            .run_effect(Effect::StartCamera { camera })
            .await
            .unwrap();

        match receiver.recv().await {
            Some(Event::CameraStartDone {
                camera: reported,
                result: Ok(()),
            }) => assert_eq!(reported, camera),
            other => panic!("Unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_logger_failure_is_returned() {
        let (run_effect, mut receiver) = run_effect(Arc::new(LoggerBroken));

        let result = run_effect.run_effect(Effect::StopCamera).await;

        assert!(result.is_err());
        assert!(receiver.try_recv().is_err());
    }
}
