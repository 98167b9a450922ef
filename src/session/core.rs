use crate::acquisition::pipeline::AnnotatedResult;
use crate::acquisition::sequence::SequenceToken;
use crate::error::{AcquisitionError, CameraError, ClassifierError, ImageDecodeError};
use crate::image_decoder::interface::ImageSource;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    ModelLoading,
    ModelLoadFailed {
        reason: String,
    },
    Idle {
        notice: Option<String>,
    },
    Capturing {
        /// Identifies one camera start. Camera completions for any other
        /// value are stale.
        camera: SequenceToken,
        camera_ready: bool,
        still: Option<ImageSource>,
    },
    Analyzing {
        token: SequenceToken,
        image: ImageSource,
    },
    Result {
        result: Arc<AnnotatedResult>,
        image: ImageSource,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::ModelLoading => "ModelLoading",
            SessionState::ModelLoadFailed { .. } => "ModelLoadFailed",
            SessionState::Idle { .. } => "Idle",
            SessionState::Capturing { .. } => "Capturing",
            SessionState::Analyzing { .. } => "Analyzing",
            SessionState::Result { .. } => "Result",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub state: SessionState,
    /// Last token handed to an acquisition.
    pub last_token: SequenceToken,
    /// Last token handed to a camera start.
    pub last_camera: SequenceToken,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            state: SessionState::ModelLoading,
            last_token: SequenceToken::default(),
            last_camera: SequenceToken::default(),
        }
    }
}

#[derive(Debug)]
pub enum Event {
    ModelLoadDone(Result<(), ClassifierError>),
    ModelLoadRetryRequested,
    FileSelected(ImageSource),
    CameraRequested,
    CameraStartDone {
        camera: SequenceToken,
        result: Result<(), CameraError>,
    },
    CaptureRequested,
    CaptureDone {
        camera: SequenceToken,
        result: Result<ImageSource, CameraError>,
    },
    CaptureRetakeRequested,
    CaptureConfirmed,
    CameraCancelled,
    AcquisitionDone {
        token: SequenceToken,
        outcome: Result<AnnotatedResult, AcquisitionError>,
    },
    RetryRequested,
}

impl Event {
    pub fn to_display_string(&self) -> String {
        match self {
            Event::AcquisitionDone {
                token,
                outcome: Ok(result),
            } => format!(
                "AcquisitionDone {{ token: {}, aggregate: {:.4} }}",
                token, result.analysis.aggregate_probability
            ),
            event => format!("{:?}", event),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadModel,
    StartCamera {
        camera: SequenceToken,
    },
    StopCamera,
    CaptureStill {
        camera: SequenceToken,
    },
    RunAcquisition {
        token: SequenceToken,
        source: ImageSource,
    },
}

pub fn init() -> (Model, Vec<Effect>) {
    (Model::default(), vec![Effect::LoadModel])
}

pub fn notice_for(error: &AcquisitionError) -> String {
    match error {
        AcquisitionError::Decode(ImageDecodeError::InvalidDataUrl(_))
        | AcquisitionError::Decode(ImageDecodeError::Unsupported(_)) => {
            "이미지를 불러올 수 없습니다. 유효한 이미지 파일인지 확인해주세요.".to_string()
        }
        AcquisitionError::Classifier(ClassifierError::ModelNotLoaded) => {
            "모델이 아직 로드되지 않았습니다. 잠시 후 다시 시도해주세요.".to_string()
        }
        AcquisitionError::Classifier(_) => "이미지 예측에 실패했습니다.".to_string(),
        AcquisitionError::Superseded(_) => "이전 분석이 취소되었습니다.".to_string(),
    }
}

fn start_acquisition(
    last_token: SequenceToken,
    last_camera: SequenceToken,
    source: ImageSource,
) -> (Model, Vec<Effect>) {
    let token = last_token.next();
    (
        Model {
            state: SessionState::Analyzing {
                token,
                image: source.clone(),
            },
            last_token: token,
            last_camera,
        },
        vec![Effect::RunAcquisition { token, source }],
    )
}

/// Every (re)start of the camera gets a fresh identity, so completions of an
/// earlier start or capture can never land in this one.
fn start_camera(last_camera: SequenceToken, last_token: SequenceToken) -> (Model, Vec<Effect>) {
    let camera = last_camera.next();
    (
        Model {
            state: SessionState::Capturing {
                camera,
                camera_ready: false,
                still: None,
            },
            last_token,
            last_camera: camera,
        },
        vec![Effect::StartCamera { camera }],
    )
}

/// Every (state, event) pair not listed here leaves the model untouched and
/// produces no effects. The one exception is a camera start landing outside
/// `Capturing`, which stops the camera again.
pub fn transition(model: Model, event: Event) -> (Model, Vec<Effect>) {
    let Model {
        state,
        last_token,
        last_camera,
    } = model;
    let with = |state: SessionState| Model {
        state,
        last_token,
        last_camera,
    };

    match (state, event) {
        // Model loading
        (SessionState::ModelLoading, Event::ModelLoadDone(Ok(()))) => {
            (with(SessionState::Idle { notice: None }), vec![])
        }
        (SessionState::ModelLoading, Event::ModelLoadDone(Err(e))) => (
            with(SessionState::ModelLoadFailed {
                reason: e.to_string(),
            }),
            vec![],
        ),
        (SessionState::ModelLoadFailed { .. }, Event::ModelLoadRetryRequested) => {
            (with(SessionState::ModelLoading), vec![Effect::LoadModel])
        }

        // Camera
        (SessionState::Idle { .. }, Event::CameraRequested) => {
            start_camera(last_camera, last_token)
        }
        (
            SessionState::Capturing {
                camera: active,
                still,
                ..
            },
            Event::CameraStartDone {
                camera,
                result: Ok(()),
            },
        ) if camera == active => (
            with(SessionState::Capturing {
                camera: active,
                camera_ready: true,
                still,
            }),
            vec![],
        ),
        (
            SessionState::Capturing { camera: active, .. },
            Event::CameraStartDone {
                camera,
                result: Err(e),
            },
        ) if camera == active => (
            with(SessionState::Idle {
                notice: Some(format!("카메라에 접근할 수 없습니다. 권한을 확인해주세요. ({})", e)),
            }),
            vec![],
        ),
        // A start that finished after the user left the camera screen.
        (
            state,
            Event::CameraStartDone {
                result: Ok(()), ..
            },
        ) if !matches!(state, SessionState::Capturing { .. }) => {
            (with(state), vec![Effect::StopCamera])
        }
        (
            SessionState::Capturing {
                camera,
                camera_ready: true,
                still: None,
            },
            Event::CaptureRequested,
        ) => (
            with(SessionState::Capturing {
                camera,
                camera_ready: true,
                still: None,
            }),
            vec![Effect::CaptureStill { camera }],
        ),
        (
            SessionState::Capturing {
                camera: active,
                camera_ready,
                still: None,
            },
            Event::CaptureDone {
                camera,
                result: Ok(image),
            },
        ) if camera == active => (
            with(SessionState::Capturing {
                camera: active,
                camera_ready,
                still: Some(image),
            }),
            vec![],
        ),
        (
            SessionState::Capturing {
                camera: active,
                still: None,
                ..
            },
            Event::CaptureDone {
                camera,
                result: Err(e),
            },
        ) if camera == active => (
            with(SessionState::Idle {
                notice: Some(format!("사진을 찍을 수 없습니다. ({})", e)),
            }),
            vec![Effect::StopCamera],
        ),
        (SessionState::Capturing { still: Some(_), .. }, Event::CaptureRetakeRequested) => {
            start_camera(last_camera, last_token)
        }
        (
            SessionState::Capturing {
                still: Some(image), ..
            },
            Event::CaptureConfirmed,
        ) => {
            let (model, mut effects) = start_acquisition(last_token, last_camera, image);
            effects.insert(0, Effect::StopCamera);
            (model, effects)
        }
        (SessionState::Capturing { .. }, Event::CameraCancelled) => (
            with(SessionState::Idle { notice: None }),
            vec![Effect::StopCamera],
        ),

        // Acquisition. A new file while analyzing supersedes the running one.
        (
            SessionState::Idle { .. } | SessionState::Analyzing { .. },
            Event::FileSelected(source),
        ) => start_acquisition(last_token, last_camera, source),
        (
            SessionState::Analyzing {
                token: active,
                image,
            },
            Event::AcquisitionDone { token, outcome },
        ) if token == active => match outcome {
            Ok(result) => (
                with(SessionState::Result {
                    result: Arc::new(result),
                    image,
                }),
                vec![],
            ),
            Err(e) => (
                with(SessionState::Idle {
                    notice: Some(notice_for(&e)),
                }),
                vec![],
            ),
        },

        // Result
        (SessionState::Result { .. }, Event::RetryRequested) => {
            (with(SessionState::Idle { notice: None }), vec![])
        }

        (state, _) => (with(state), vec![]),
    }
}
