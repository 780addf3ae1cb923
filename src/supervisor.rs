// author: kodeholic (powered by Claude)
// 릴레이 수명주기 관리
//
// start    : 장치 / 코덱 준비 → 시그널링(Active) → 소켓 bind → 송수신 루프 spawn
//            어느 단계든 실패하면 startup 중단 (이미 만든 게이트웨이 세션은 정리)
// stop     : running 플래그만 내림 (멱등, 시그널 핸들러 안전)
// shutdown : stop → 루프 join (3초 상한) → 장치 close → 소켓 해제 → 세션 destroy → 통계 로그

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::audio::{AudioBackend, AudioSink, AudioSource, CodecKind};
use crate::config;
use crate::core::RelayState;
use crate::error::{RelayError, RelayResult};
use crate::media::net::{bind_rtp_socket, AudioPipeline, PipelineContext};
use crate::media::rtp::RtpStreamState;
use crate::media::srtp::SrtpContext;
use crate::signaling::{SdpNegotiation, SignalingClient, SignalingConfig, SignalingSession};
use crate::utils::initial_rtp_timestamp;

/// 릴레이 1회 실행에 필요한 설정
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub signaling:  SignalingConfig,
    /// 0 = 임의 포트
    pub local_port: u16,
    pub codec:      CodecKind,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            signaling:  SignalingConfig::default(),
            local_port: 0,
            codec:      CodecKind::default(),
        }
    }
}

pub struct RelaySupervisor {
    cfg:         RelayConfig,
    state:       Arc<RelayState>,
    srtp:        Arc<SrtpContext>,
    signaling:   SignalingClient,
    pipeline:    Option<AudioPipeline>,
    session:     Option<SignalingSession>,
    negotiation: Option<SdpNegotiation>,
    local_addr:  Option<SocketAddr>,
}

impl RelaySupervisor {
    pub fn new(cfg: RelayConfig, srtp: SrtpContext) -> RelayResult<Self> {
        let srtp      = Arc::new(srtp);
        let signaling = SignalingClient::new(cfg.signaling.clone(), Arc::clone(&srtp), cfg.codec.spec())?;
        Ok(Self {
            cfg,
            state: Arc::new(RelayState::new()),
            srtp,
            signaling,
            pipeline: None,
            session: None,
            negotiation: None,
            local_addr: None,
        })
    }

    /// 시그널 핸들러 등 외부에서 stop 하기 위한 핸들
    pub fn state(&self) -> Arc<RelayState> {
        Arc::clone(&self.state)
    }

    pub fn session(&self) -> Option<SignalingSession> {
        self.session
    }

    pub fn negotiation(&self) -> Option<&SdpNegotiation> {
        self.negotiation.as_ref()
    }

    /// bind 된 로컬 RTP 주소 (start 이후)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub async fn start(&mut self, backend: AudioBackend) -> RelayResult<()> {
        let (source, sink) = backend.open()?;
        info!("[supervisor] audio backend={:?}", backend);
        self.start_with_devices(source, sink).await
    }

    /// 이미 열린 장치로 시작 (테스트 / 임베딩용)
    pub async fn start_with_devices(
        &mut self,
        mut source: Box<dyn AudioSource>,
        mut sink:   Box<dyn AudioSink>,
    ) -> RelayResult<()> {
        if self.pipeline.is_some() {
            return Err(RelayError::Config("relay already started".to_string()));
        }

        let (encoder, decoder) = match self.cfg.codec.build() {
            Ok(c)  => c,
            Err(e) => { source.close(); sink.close(); return Err(e); }
        };

        let result = self.establish().await;
        let (socket, remote) = match result {
            Ok(r)  => r,
            Err(e) => {
                error!("[supervisor] startup failed: {}", e);
                source.close();
                sink.close();
                self.signaling.destroy_session().await;
                return Err(e);
            }
        };

        let stream = RtpStreamState::new(
            self.cfg.signaling.ssrc,
            config::INITIAL_SEQUENCE,
            initial_rtp_timestamp(config::SAMPLE_RATE_HZ),
        );
        let ctx = PipelineContext {
            socket: Arc::new(socket),
            srtp:   Arc::clone(&self.srtp),
            state:  Arc::clone(&self.state),
            remote,
            codec:  self.cfg.codec.spec(),
        };

        match AudioPipeline::spawn(ctx, source, sink, encoder, decoder, stream) {
            Ok(p)  => self.pipeline = Some(p),
            Err(e) => {
                self.signaling.destroy_session().await;
                return Err(e);
            }
        }

        info!("[supervisor] relay running local={:?} remote={} codec={:?}",
            self.local_addr, remote, self.cfg.codec);
        Ok(())
    }

    /// 시그널링 → 원격 주소 결정 → 소켓 bind
    async fn establish(&mut self) -> RelayResult<(std::net::UdpSocket, SocketAddr)> {
        let (session, negotiation) = self.signaling.negotiate().await?;
        let remote = negotiation.remote_endpoint().socket_addr()?;
        self.session     = Some(session);
        self.negotiation = Some(negotiation);

        let socket = bind_rtp_socket(self.cfg.local_port)?;
        self.local_addr = Some(socket.local_addr()?);
        Ok((socket, remote))
    }

    /// 멱등
    pub fn stop(&self) {
        if self.state.stop() {
            info!("[supervisor] stop requested");
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// running 플래그가 내려가거나 두 루프가 모두 끝날 때까지 대기. 주기적으로 통계 로그.
    pub async fn run_until_stopped(&self) {
        let mut poll = tokio::time::interval(Duration::from_millis(config::SUPERVISOR_POLL_MS));
        let mut stats_timer = tokio::time::interval(Duration::from_millis(config::STATS_INTERVAL_MS));
        stats_timer.tick().await; // 첫 틱 skip

        loop {
            tokio::select! {
                _ = poll.tick() => {
                    if !self.state.is_running() {
                        break;
                    }
                    match &self.pipeline {
                        Some(p) if p.is_finished() => {
                            warn!("[supervisor] pipeline exited on its own");
                            self.state.request_shutdown("pipeline exited");
                            break;
                        }
                        Some(_) => {}
                        None => break,
                    }
                }
                _ = stats_timer.tick() => {
                    info!("[supervisor] stats {} uptime={}s",
                        self.state.stats.snapshot(), self.state.uptime_ms() / 1000);
                }
            }
        }
    }

    pub async fn shutdown(&mut self) {
        self.stop();

        if let Some(pipeline) = self.pipeline.take() {
            let timeout = Duration::from_millis(config::JOIN_TIMEOUT_MS);
            match tokio::task::spawn_blocking(move || pipeline.join(timeout)).await {
                Ok(devices) => {
                    if let Some(mut source) = devices.source { source.close(); }
                    if let Some(mut sink) = devices.sink { sink.close(); }
                }
                Err(e) => error!("[supervisor] join task failed: {}", e),
            }
        }
        // 소켓은 PipelineContext 와 함께 해제됨

        self.signaling.destroy_session().await;
        self.session = None;

        info!("[supervisor] shutdown complete: {} uptime={}s",
            self.state.stats.snapshot(), self.state.uptime_ms() / 1000);
    }
}
