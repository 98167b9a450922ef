use acquisition::pipeline::AcquisitionPipeline;
use command::{Command, HELP};
use config::Config;
use device_camera::impl_fake::DeviceCameraFake;
use device_display::impl_console::DeviceDisplayConsole;
use image_classifier::gateway::ClassifierGateway;
use image_classifier::impl_fake::ImageClassifierFake;
use image_classifier::impl_tract_onnx::ImageClassifierTractOnnx;
use image_classifier::interface::ImageClassifier;
use image_decoder::impl_image::ImageDecoderImage;
use image_decoder::interface::ImageSource;
use library::logger::impl_console::LoggerConsole;
use library::logger::impl_tracing::LoggerTracing;
use library::logger::interface::Logger;
use session::core::Event;
use session::main::{Session, SessionHandle};
use session::render::Render;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::Level;

mod acquisition;
mod analysis;
mod command;
mod commentary;
mod config;
mod device_camera;
mod device_display;
mod error;
mod image_classifier;
mod image_decoder;
mod library;
mod session;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PRESIDENT_FACE_CONFIG").ok());

    match path {
        Some(path) => Ok(Config::from_toml_file(&PathBuf::from(path))?),
        None => Ok(Config::default()),
    }
}

async fn dispatch_command(
    logger: &Arc<dyn Logger + Send + Sync>,
    handle: &SessionHandle,
    command: Command,
) -> bool {
    match command {
        Command::Quit => return false,
        Command::Upload(path) => match tokio::fs::read(&path).await {
            Ok(bytes) => {
                handle.dispatch(Event::FileSelected(ImageSource::from_bytes(bytes)));
            }
            Err(e) => {
                let _ = logger.warn(&format!("Could not read {}: {}", path.display(), e));
            }
        },
        other => {
            if let Some(event) = other.to_event() {
                handle.dispatch(event);
            }
        }
    }
    true
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let config = load_config()?;

    let logger: Arc<dyn Logger + Send + Sync> = match std::env::var("PRESIDENT_FACE_LOG") {
        Ok(kind) if kind == "tracing" => Arc::new(LoggerTracing::new()),
        _ => Arc::new(LoggerConsole::new(config.logger_timezone)),
    };

    let image_classifier: Arc<dyn ImageClassifier + Send + Sync> = match &config.model.base_url {
        Some(_) => Arc::new(ImageClassifierTractOnnx::new(
            logger.clone(),
            config.model.clone(),
        )),
        None => {
            let _ = logger.warn("No model base_url configured, using the fake classifier");
            Arc::new(ImageClassifierFake::new(
                logger.clone(),
                config.model.fake_labels.clone(),
            ))
        }
    };

    let gateway = Arc::new(ClassifierGateway::new(logger.clone(), image_classifier));
    let pipeline = Arc::new(AcquisitionPipeline::new(
        logger.clone(),
        Arc::new(ImageDecoderImage::new()),
        gateway,
        config.categories.clone(),
        config.commentary_table()?,
    ));
    let device_camera = Arc::new(DeviceCameraFake::new(logger.clone()));
    let device_display = Arc::new(Mutex::new(DeviceDisplayConsole::new()));
    let render = Render::new(device_display, config.categories.clone());

    let session = Session::new(logger.clone(), render, pipeline, device_camera);
    let handle = session.handle();
    let session_task = tokio::spawn(session.run());

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match Command::parse(&line) {
            Ok(command) => {
                if !dispatch_command(&logger, &handle, command).await {
                    break;
                }
            }
            Err(e) => println!("{}\n{}", e, HELP),
        }
    }

    handle.shutdown();
    session_task.await?;

    Ok(())
}
