use crate::analysis::category::CategoryConfig;
use crate::analysis::summarize::TOP_K;
use crate::device_display::interface::DeviceDisplay;
use crate::image_classifier::interface::ClassProbability;
use crate::session::core::{Model, SessionState};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct Render {
    device_display: Arc<Mutex<dyn DeviceDisplay + Send + Sync>>,
    categories: CategoryConfig,
}

impl Render {
    pub fn new(
        device_display: Arc<Mutex<dyn DeviceDisplay + Send + Sync>>,
        categories: CategoryConfig,
    ) -> Self {
        Self {
            device_display,
            categories,
        }
    }

    pub fn render(&self, model: &Model) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let lines = screen_lines(model, &self.categories);

        let mut device_display = self.device_display.lock().map_err(|e| e.to_string())?;
        device_display.clear()?;
        for line in &lines {
            device_display.write_line(line)?;
        }
        device_display.present()?;

        Ok(())
    }
}

fn percent_line(label: &str, entry: &ClassProbability) -> String {
    format!("- {}: {}%", label, entry.percent())
}

pub fn screen_lines(model: &Model, categories: &CategoryConfig) -> Vec<String> {
    let mut lines = Vec::new();

    match &model.state {
        SessionState::ModelLoading => {
            lines.push("모델 로딩 중... (잠시만 기다려주세요)".to_string());
        }
        SessionState::ModelLoadFailed { reason } => {
            lines.push("모델을 로드할 수 없습니다.".to_string());
            lines.push(reason.clone());
            lines.push("[reload] 다시 시도".to_string());
        }
        SessionState::Idle { notice } => {
            if let Some(notice) = notice {
                lines.push(format!("! {}", notice));
            }
            lines.push("대통령상 테스트".to_string());
            lines.push("[upload <파일>] 사진 업로드  [camera] 카메라 촬영".to_string());
        }
        SessionState::Capturing {
            camera_ready,
            still,
            ..
        } => match (camera_ready, still) {
            (false, _) => {
                lines.push("카메라 로딩 중...".to_string());
                lines.push("[cancel] 취소".to_string());
            }
            (true, None) => {
                lines.push("카메라 준비 완료".to_string());
                lines.push("[capture] 사진 찍기  [cancel] 취소".to_string());
            }
            (true, Some(still)) => {
                lines.push(format!("찍은 사진 ({} bytes)", still.byte_len()));
                lines.push("[confirm] 사용하기  [retake] 다시 찍기  [cancel] 취소".to_string());
            }
        },
        SessionState::Analyzing { .. } => {
            lines.push("사진 분석 중...".to_string());
        }
        SessionState::Result { result, .. } => {
            let analysis = &result.analysis;

            lines.push("예측 결과".to_string());
            lines.push(format!(
                "{} 관상: {}%",
                categories.target.name,
                analysis.aggregate_percent()
            ));
            lines.push(result.commentary.message.clone());

            for category in categories.all() {
                let ranked = analysis.ranked(&category.name);
                if ranked.is_empty() {
                    continue;
                }
                if ranked.len() > 1 {
                    lines.push(format!("가장 닮은 {} TOP {}:", category.name, TOP_K));
                } else {
                    lines.push(format!("가장 닮은 {}:", category.name));
                }
                for entry in ranked {
                    lines.push(percent_line(category.display_label(&entry.label), entry));
                }
            }

            if analysis.ranked(&categories.target.name).is_empty() {
                lines.push("전체 결과:".to_string());
                for entry in analysis.full_vector.iter() {
                    lines.push(percent_line(&entry.label, entry));
                }
            }

            lines.push("[retry] 다시 시도".to_string());
        }
    }

    lines
}
