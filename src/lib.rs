// author: kodeholic (powered by Claude)

pub mod audio;
pub mod config;
pub mod core;
pub mod error;
pub mod media;
pub mod protocol;
pub mod signaling;
pub mod supervisor;
pub mod utils;

use tracing::info;

use crate::audio::{AudioBackend, CodecKind};
use crate::error::RelayResult;
use crate::media::SrtpContext;
use crate::signaling::SignalingConfig;
use crate::supervisor::{RelayConfig, RelaySupervisor};

pub use crate::error::RelayError;

/// CLI에서 주입되는 런타임 설정
/// - 기본값은 config.rs 상수
/// - 비밀값(admin key, SRTP 키)은 환경변수로 별도 관리
pub struct RelayArgs {
    pub gateway:     String,
    pub admin_key:   String,
    pub plugin:      String,
    pub local_port:  u16,
    pub device_port: u16,
    pub srtp_key:    Option<String>, // None이면 정적 키 (config::STATIC_SRTP_KEYING_MATERIAL)
    pub codec:       CodecKind,
    pub audio:       AudioBackend,
}

impl RelayArgs {
    fn srtp_context(&self) -> RelayResult<SrtpContext> {
        match self.srtp_key.as_deref() {
            Some(inline) => SrtpContext::from_inline_key(inline),
            None         => SrtpContext::from_keying_material(&config::STATIC_SRTP_KEYING_MATERIAL),
        }
    }

    fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            signaling: SignalingConfig {
                gateway_url: self.gateway.clone(),
                admin_key:   self.admin_key.clone(),
                plugin:      self.plugin.clone(),
                device_port: self.device_port,
                ssrc:        config::LOCAL_SSRC,
            },
            local_port: self.local_port,
            codec:      self.codec,
        }
    }
}

/// 릴레이 시작 → Ctrl-C 또는 루프 자체 종료까지 대기 → 셧다운
pub async fn run_relay(args: RelayArgs) -> RelayResult<()> {
    let srtp = args.srtp_context()?;
    let mut supervisor = RelaySupervisor::new(args.relay_config(), srtp)?;

    info!("[janus-relay] gateway={} plugin={}", args.gateway, args.plugin);
    supervisor.start(args.audio).await?;

    tokio::select! {
        _ = supervisor.run_until_stopped() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("[janus-relay] Ctrl-C received");
            supervisor.stop();
        }
    }

    supervisor.shutdown().await;
    Ok(())
}
