// author: kodeholic (powered by Claude)

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// [C→S] Janus REST 요청 봉투
// ----------------------------------------------------------------------------

/// 모든 Janus REST 요청의 최상위 구조체
/// janus 필드 값(create / attach / message / destroy)에 따라 나머지 필드가 채워집니다.
///
/// 예시:
///   { "janus": "attach", "plugin": "janus.plugin.echotest", "transaction": "a1B2c3D4e5F6" }
#[derive(Serialize, Debug)]
pub struct JanusRequest {
    pub janus:       &'static str,
    pub transaction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin:      Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body:        Option<ConfigureBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jsep:        Option<Jsep>,
}

impl JanusRequest {
    fn bare(janus: &'static str, transaction: String) -> Self {
        Self { janus, transaction, plugin: None, body: None, jsep: None }
    }

    /// POST /janus
    pub fn create(transaction: String) -> Self {
        Self::bare("create", transaction)
    }

    /// POST /janus/{session_id}
    pub fn attach(plugin: &str, transaction: String) -> Self {
        Self { plugin: Some(plugin.to_string()), ..Self::bare("attach", transaction) }
    }

    /// POST /janus/{session_id}/{handle_id} — configure + jsep offer
    pub fn offer(sdp: String, transaction: String) -> Self {
        Self {
            body: Some(ConfigureBody::audio_only()),
            jsep: Some(Jsep { kind: "offer".to_string(), sdp }),
            ..Self::bare("message", transaction)
        }
    }

    /// POST /janus/{session_id}
    pub fn destroy(transaction: String) -> Self {
        Self::bare("destroy", transaction)
    }
}

/// 플러그인 message body
#[derive(Serialize, Debug)]
pub struct ConfigureBody {
    pub request: &'static str,
    pub audio:   bool,
    pub video:   bool,
}

impl ConfigureBody {
    pub fn audio_only() -> Self {
        Self { request: "configure", audio: true, video: false }
    }
}

/// jsep { type, sdp } — 요청 / 응답 공통
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Jsep {
    #[serde(rename = "type")]
    pub kind: String,
    pub sdp:  String,
}

// ----------------------------------------------------------------------------
// [S→C] Janus REST 응답
// ----------------------------------------------------------------------------

/// 성공: { "janus": "success", "data": { "id": 123 } }
/// 실패: { "janus": "error", "error": { "code": 458, "reason": "..." } }
/// offer 응답: { "janus": "event" | "success", "jsep": { "type": "answer", "sdp": "..." } }
#[derive(Deserialize, Debug)]
pub struct JanusResponse {
    pub janus:       String,
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub data:        Option<IdData>,
    #[serde(default)]
    pub error:       Option<JanusErrorBody>,
    #[serde(default)]
    pub jsep:        Option<Jsep>,
}

#[derive(Deserialize, Debug)]
pub struct IdData {
    pub id: u64,
}

#[derive(Deserialize, Debug)]
pub struct JanusErrorBody {
    pub code:   i64,
    #[serde(default)]
    pub reason: String,
}

impl JanusResponse {
    pub fn is_success(&self) -> bool {
        self.janus == "success"
    }

    /// 게이트웨이가 알려준 에러 사유 (없으면 janus 필드 값)
    pub fn failure_reason(&self) -> String {
        match &self.error {
            Some(e) => format!("janus={} code={} reason={}", self.janus, e.code, e.reason),
            None    => format!("janus={}", self.janus),
        }
    }

    /// jsep.type == "answer" 인 경우에만 answer SDP 반환
    pub fn answer_sdp(&self) -> Option<&str> {
        self.jsep
            .as_ref()
            .filter(|j| j.kind == "answer")
            .map(|j| j.sdp.as_str())
    }
}
