// author: kodeholic (powered by Claude)
// Janus REST 시그널링 클라이언트
//
// 상태 전이 (각 단계는 직전 단계 완료가 전제):
//   Idle → SessionCreated → PluginAttached → OfferSent → Active
//
// 순서 위반 / non-success 응답 / answer 누락은 모두 RelayError::Signaling.
// 재시도는 하지 않음 — 호출자(supervisor)가 startup 실패로 처리.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::audio::CodecSpec;
use crate::config;
use crate::error::{RelayError, RelayResult};
use crate::media::srtp::SrtpContext;
use crate::protocol::message::{JanusRequest, JanusResponse};
use crate::protocol::sdp::{self, RemoteEndpoint};
use crate::utils::random_token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingState {
    Idle,
    SessionCreated,
    PluginAttached,
    OfferSent,
    Active,
}

/// create / attach 성공 후 teardown 전까지 유효
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalingSession {
    pub session_id: u64,
    pub handle_id:  u64,
}

/// 세션당 1회 생성되는 offer / answer 쌍
/// remote_ip / remote_media_port 는 answer에 적힌 값 그대로,
/// 실제 송신 대상(폴백 적용)은 send_target
#[derive(Debug, Clone)]
pub struct SdpNegotiation {
    pub local_offer:       String,
    pub remote_answer:     String,
    pub remote_media_port: u16,
    pub remote_ip:         String,
    pub send_target:       RemoteEndpoint,
}

impl SdpNegotiation {
    pub fn remote_endpoint(&self) -> RemoteEndpoint {
        self.send_target.clone()
    }
}

/// 게이트웨이 접속 설정 (CLI → RelayArgs → 여기)
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    pub gateway_url: String,
    /// 현재 요청에는 싣지 않음
    pub admin_key:   String,
    pub plugin:      String,
    pub device_port: u16,
    pub ssrc:        u32,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            gateway_url: config::DEFAULT_GATEWAY_URL.to_string(),
            admin_key:   config::DEFAULT_ADMIN_KEY.to_string(),
            plugin:      config::DEFAULT_PLUGIN.to_string(),
            device_port: config::DEVICE_FALLBACK_RTP_PORT,
            ssrc:        config::LOCAL_SSRC,
        }
    }
}

pub struct SignalingClient {
    http:         reqwest::Client,
    base_url:     String,
    gateway_host: String,
    cfg:          SignalingConfig,
    srtp:         Arc<SrtpContext>,
    codec:        CodecSpec,
    state:        SignalingState,
    session_id:   Option<u64>,
    handle_id:    Option<u64>,
}

impl SignalingClient {
    pub fn new(cfg: SignalingConfig, srtp: Arc<SrtpContext>, codec: CodecSpec) -> RelayResult<Self> {
        let gateway_host = sdp::gateway_host(&cfg.gateway_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config::HTTP_TIMEOUT_MS))
            .build()
            .map_err(|e| RelayError::Config(format!("http client: {}", e)))?;

        Ok(Self {
            http,
            base_url: cfg.gateway_url.trim_end_matches('/').to_string(),
            gateway_host,
            cfg,
            srtp,
            codec,
            state: SignalingState::Idle,
            session_id: None,
            handle_id: None,
        })
    }

    pub fn state(&self) -> SignalingState {
        self.state
    }

    pub fn session(&self) -> Option<SignalingSession> {
        match (self.session_id, self.handle_id) {
            (Some(session_id), Some(handle_id)) => Some(SignalingSession { session_id, handle_id }),
            _ => None,
        }
    }

    fn expect_state(&self, expected: SignalingState, step: &str) -> RelayResult<()> {
        if self.state != expected {
            return Err(RelayError::Signaling(format!(
                "{} requires state {:?}, current {:?}", step, expected, self.state
            )));
        }
        Ok(())
    }

    async fn post(&self, path: &str, req: &JanusRequest) -> RelayResult<JanusResponse> {
        let url = format!("{}{}", self.base_url, path);
        debug!("[signaling] POST {} janus={} tx={}", url, req.janus, req.transaction);

        let resp = self.http.post(&url).json(req).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RelayError::Signaling(format!("HTTP {} from {}", status, url)));
        }
        Ok(resp.json::<JanusResponse>().await?)
    }

    fn new_transaction() -> String {
        random_token(config::TRANSACTION_ID_LEN)
    }

    /// POST /janus {"janus":"create"} → session id
    pub async fn create_session(&mut self) -> RelayResult<u64> {
        self.expect_state(SignalingState::Idle, "create_session")?;

        let resp = self.post("/janus", &JanusRequest::create(Self::new_transaction())).await?;
        let id = success_id(&resp, "create")?;

        self.session_id = Some(id);
        self.state = SignalingState::SessionCreated;
        info!("[signaling] session created id={}", id);
        Ok(id)
    }

    /// POST /janus/{session_id} {"janus":"attach"} → handle id
    pub async fn attach_plugin(&mut self, session_id: u64) -> RelayResult<u64> {
        self.expect_state(SignalingState::SessionCreated, "attach_plugin")?;
        if self.session_id != Some(session_id) {
            return Err(RelayError::Signaling(format!("unknown session id {}", session_id)));
        }

        let req  = JanusRequest::attach(&self.cfg.plugin, Self::new_transaction());
        let resp = self.post(&format!("/janus/{}", session_id), &req).await?;
        let id   = success_id(&resp, "attach")?;

        self.handle_id = Some(id);
        self.state = SignalingState::PluginAttached;
        info!("[signaling] plugin attached plugin={} handle={}", self.cfg.plugin, id);
        Ok(id)
    }

    /// offer 전송 → answer 수신 / 파싱 → Active
    pub async fn send_offer(&mut self, handle_id: u64) -> RelayResult<SdpNegotiation> {
        self.expect_state(SignalingState::PluginAttached, "send_offer")?;
        if self.handle_id != Some(handle_id) {
            return Err(RelayError::Signaling(format!("unknown handle id {}", handle_id)));
        }
        let session_id = self
            .session_id
            .ok_or_else(|| RelayError::Signaling("no session".to_string()))?;

        let offer = sdp::build_sdp_offer(&self.srtp, self.cfg.ssrc, &self.codec);
        let req   = JanusRequest::offer(offer.clone(), Self::new_transaction());
        let resp  = self.post(&format!("/janus/{}/{}", session_id, handle_id), &req).await?;
        self.state = SignalingState::OfferSent;
        debug!("[signaling] offer response janus={}", resp.janus);

        let answer = match resp.answer_sdp() {
            Some(a) => a.to_string(),
            None    => {
                return Err(RelayError::Signaling(format!("no SDP answer in response ({})", resp.failure_reason())));
            }
        };

        let parsed = sdp::parse_sdp_answer(&answer, &self.gateway_host, self.cfg.device_port)?;
        self.state = SignalingState::Active;
        info!("[signaling] active answer={}:{} target={}:{}",
            parsed.conn_ip, parsed.media_port, parsed.target.ip, parsed.target.port);

        Ok(SdpNegotiation {
            local_offer:       offer,
            remote_answer:     answer,
            remote_media_port: parsed.media_port,
            remote_ip:         parsed.conn_ip,
            send_target:       parsed.target,
        })
    }

    /// create → attach → offer 일괄 수행
    pub async fn negotiate(&mut self) -> RelayResult<(SignalingSession, SdpNegotiation)> {
        let session_id = self.create_session().await?;
        let handle_id  = self.attach_plugin(session_id).await?;
        let negotiation = self.send_offer(handle_id).await?;
        Ok((SignalingSession { session_id, handle_id }, negotiation))
    }

    /// 세션 정리 — 실패해도 로그만 남기고 Idle 로 복귀
    pub async fn destroy_session(&mut self) {
        if let Some(session_id) = self.session_id.take() {
            let req = JanusRequest::destroy(Self::new_transaction());
            match self.post(&format!("/janus/{}", session_id), &req).await {
                Ok(resp) if resp.is_success() => info!("[signaling] session destroyed id={}", session_id),
                Ok(resp) => warn!("[signaling] destroy session={} refused: {}", session_id, resp.failure_reason()),
                Err(e)   => warn!("[signaling] destroy session={} failed: {}", session_id, e),
            }
        }
        self.handle_id = None;
        self.state = SignalingState::Idle;
    }
}

/// {"janus":"success","data":{"id":N}} 에서 id 추출
fn success_id(resp: &JanusResponse, step: &str) -> RelayResult<u64> {
    if !resp.is_success() {
        return Err(RelayError::Signaling(format!("{} failed: {}", step, resp.failure_reason())));
    }
    resp.data
        .as_ref()
        .map(|d| d.id)
        .ok_or_else(|| RelayError::Signaling(format!("{} response has no data.id", step)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SignalingClient {
        let srtp = Arc::new(SrtpContext::from_keying_material(&config::STATIC_SRTP_KEYING_MATERIAL).unwrap());
        SignalingClient::new(SignalingConfig::default(), srtp, CodecSpec::PCM).unwrap()
    }

    #[test]
    fn starts_idle_without_session() {
        let c = client();
        assert_eq!(c.state(), SignalingState::Idle);
        assert!(c.session().is_none());
        assert_eq!(c.base_url, "http://127.0.0.1:8088");
        assert_eq!(c.gateway_host, "127.0.0.1");
    }

    #[test]
    fn invalid_gateway_url_is_config_error() {
        let srtp = Arc::new(SrtpContext::from_keying_material(&config::STATIC_SRTP_KEYING_MATERIAL).unwrap());
        let cfg  = SignalingConfig { gateway_url: "nonsense".into(), ..SignalingConfig::default() };
        assert!(matches!(SignalingClient::new(cfg, srtp, CodecSpec::PCM), Err(RelayError::Config(_))));
    }

    #[tokio::test]
    async fn out_of_order_steps_rejected() {
        let mut c = client();
        assert!(matches!(c.attach_plugin(1).await, Err(RelayError::Signaling(_))));
        assert!(matches!(c.send_offer(1).await, Err(RelayError::Signaling(_))));
        assert_eq!(c.state(), SignalingState::Idle);
    }

    #[tokio::test]
    async fn destroy_without_session_is_noop() {
        let mut c = client();
        c.destroy_session().await;
        assert_eq!(c.state(), SignalingState::Idle);
    }

    #[test]
    fn success_id_requires_success_and_data() {
        let ok: JanusResponse = serde_json::from_str(r#"{"janus":"success","data":{"id":7}}"#).unwrap();
        assert_eq!(success_id(&ok, "create").unwrap(), 7);

        let no_data: JanusResponse = serde_json::from_str(r#"{"janus":"success"}"#).unwrap();
        assert!(success_id(&no_data, "create").is_err());

        let err: JanusResponse =
            serde_json::from_str(r#"{"janus":"error","error":{"code":403,"reason":"Unauthorized"}}"#).unwrap();
        let msg = success_id(&err, "create").unwrap_err().to_string();
        assert!(msg.contains("Unauthorized"));
    }
}
