use crate::commentary::table::CommentaryBucket;

pub const DEFAULT_FALLBACK: &str = "관상을 읽을 수 없었어요. 다른 사진으로 다시 시도해 주세요.";

fn bucket(low: u8, high: u8, messages: &[&str]) -> CommentaryBucket {
    CommentaryBucket {
        low,
        high,
        messages: messages.iter().map(|m| m.to_string()).collect(),
    }
}

pub fn default_buckets() -> Vec<CommentaryBucket> {
    vec![
        bucket(
            0,
            10,
            &[
                "대통령과는 거리가 먼 자유로운 영혼이시네요.",
                "청와대보다는 동네 뒷산이 잘 어울리는 얼굴입니다.",
            ],
        ),
        bucket(
            10,
            30,
            &[
                "반상회 회장 정도는 충분히 노려볼 만합니다.",
                "조금만 더 근엄하게 웃어 보세요.",
            ],
        ),
        bucket(
            30,
            40,
            &[
                "학급 반장 선거라면 당선 확정입니다.",
                "리더의 기운이 살짝 느껴집니다.",
            ],
        ),
        bucket(
            40,
            50,
            &[
                "구청장 후보로 손색이 없는 관상이에요.",
                "절반쯤 왔습니다. 넥타이를 매 보시죠.",
            ],
        ),
        bucket(
            50,
            60,
            &[
                "국회의원 배지가 어른거립니다.",
                "유세차에 올라가도 어색하지 않겠어요.",
            ],
        ),
        bucket(
            60,
            70,
            &[
                "장관 임명장이 곧 도착할 것 같습니다.",
                "기자회견장에 서 있는 모습이 그려집니다.",
            ],
        ),
        bucket(
            70,
            80,
            &[
                "대선 후보 여론조사에 이름이 오르겠는데요?",
                "카메라 플래시가 익숙해 보이는 얼굴입니다.",
            ],
        ),
        bucket(
            80,
            90,
            &[
                "경호원부터 알아보셔야겠습니다.",
                "취임사 초안을 미리 써 두셔도 좋겠어요.",
            ],
        ),
        bucket(
            90,
            95,
            &[
                "이 정도면 거의 현직입니다.",
                "국정 브리핑을 맡겨도 아무도 의심하지 않겠어요.",
            ],
        ),
        bucket(
            95,
            100,
            &[
                "혹시 본인 맞으신가요?",
                "관상으로는 이미 대통령입니다.",
            ],
        ),
    ]
}
