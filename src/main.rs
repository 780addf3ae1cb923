// author: kodeholic (powered by Claude)

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use janus_relay::audio::{AudioBackend, CodecKind};
use janus_relay::{config, run_relay, RelayArgs};

#[derive(Parser)]
#[command(
    name  = "jrelay",
    about = "Janus 게이트웨이 ↔ 임베디드 디바이스 SRTP 오디오 릴레이",
    version,
)]
struct Cli {
    /// Janus REST base URL
    #[arg(long, env = "JANUS_URL", default_value = config::DEFAULT_GATEWAY_URL)]
    gateway: String,

    /// Janus admin key (현재 요청에는 사용되지 않음)
    #[arg(long, env = "JANUS_ADMIN_KEY", default_value = config::DEFAULT_ADMIN_KEY, hide_env_values = true)]
    admin_key: String,

    /// attach 할 플러그인
    #[arg(long, default_value = config::DEFAULT_PLUGIN)]
    plugin: String,

    /// 로컬 RTP 포트 (0 = 임의)
    #[arg(long, default_value_t = 0)]
    local_port: u16,

    /// answer가 0.0.0.0 일 때 사용하는 디바이스 RTP 포트
    #[arg(long, default_value_t = config::DEVICE_FALLBACK_RTP_PORT)]
    device_port: u16,

    /// SRTP 키 (base64 key‖salt, 40자). 미지정 시 디바이스 정적 키
    #[arg(long, env = "JRELAY_SRTP_KEY", hide_env_values = true)]
    srtp_key: Option<String>,

    /// payload 코덱
    #[arg(long, value_enum, default_value_t = CodecKind::default())]
    codec: CodecKind,

    /// 오디오 입출력
    #[arg(long, value_enum, default_value_t = AudioBackend::default())]
    audio: AudioBackend,
}

#[tokio::main]
async fn main() {
    // 환경 변수 기반 로깅 초기화 (기본값: info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let args = RelayArgs {
        gateway:     cli.gateway,
        admin_key:   cli.admin_key,
        plugin:      cli.plugin,
        local_port:  cli.local_port,
        device_port: cli.device_port,
        srtp_key:    cli.srtp_key,
        codec:       cli.codec,
        audio:       cli.audio,
    };

    if let Err(e) = run_relay(args).await {
        error!("[janus-relay] {}", e);
        std::process::exit(1);
    }
}
