// author: kodeholic (powered by Claude)
// UDP 오디오 파이프라인 모듈
//
// 방향당 전용 OS 스레드 1개 (블로킹 장치 / 소켓 호출을 그대로 사용):
//
//   [relay-send] read_frame → encode → packetize → SRTP encrypt → send_to(remote)
//   [relay-recv] recv_from(1s timeout) → 판별 → SRTP decrypt → decode → PT 확인
//                → 오디오 디코딩 → write_frame
//
// 공유 자원은 Arc<UdpSocket>, Arc<SrtpContext>(읽기 전용), Arc<RelayState>(atomic)뿐.
// RtpStreamState / 코덱 / 장치는 각 루프가 단독 소유 — 핫패스에 락 없음.
// 루프가 끝나면 장치를 반환하고, close 는 supervisor가 join 이후 수행합니다.
// 장치는 두 스레드가 모두 뜬 뒤에 채널로 넘깁니다 (spawn 실패 시 여기서 close).

use std::io::{self, ErrorKind};
use std::net::{SocketAddr, UdpSocket};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, trace, warn};

use crate::audio::{AudioDecoder, AudioEncoder, AudioSink, AudioSource, CodecSpec};
use crate::config;
use crate::core::{RelayState, RelayStats};
use crate::error::RelayResult;
use crate::media::rtp::{self, RtpStreamState, RTP_VERSION};
use crate::media::srtp::{SrtpContext, SRTP_MIN_LEN};

// ----------------------------------------------------------------------------
// [패킷 타입 판별]
//
// 디바이스 쪽 소켓으로는 RTP / RTCP만 와야 함:
//   version != 2            → Unknown (STUN 등, 무시)
//   PT(masked) 72~79        → RTCP (RFC 5761 §4, PT 200~207)
//   그 외                   → RTP
// ----------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum PacketKind {
    Rtp,
    Rtcp,
    Unknown,
}

#[inline]
fn classify(buf: &[u8]) -> PacketKind {
    match (buf.first(), buf.get(1)) {
        (Some(b0), Some(b1)) if b0 >> 6 == RTP_VERSION => {
            let pt = b1 & 0x7F;
            if (72..=79).contains(&pt) { PacketKind::Rtcp } else { PacketKind::Rtp }
        }
        _ => PacketKind::Unknown,
    }
}

/// 0.0.0.0:{local_port} bind + 수신 타임아웃 설정 (0 = 임의 포트)
pub fn bind_rtp_socket(local_port: u16) -> RelayResult<UdpSocket> {
    let socket = UdpSocket::bind(("0.0.0.0", local_port))?;
    socket.set_read_timeout(Some(Duration::from_millis(config::RECV_TIMEOUT_MS)))?;
    info!("[media] RTP socket bound on {}", socket.local_addr()?);
    Ok(socket)
}

// ----------------------------------------------------------------------------
// [PipelineContext] — 두 루프가 공유하는 읽기 전용 자원
// ----------------------------------------------------------------------------

#[derive(Clone)]
pub struct PipelineContext {
    pub socket: Arc<UdpSocket>,
    pub srtp:   Arc<SrtpContext>,
    pub state:  Arc<RelayState>,
    pub remote: SocketAddr,
    pub codec:  CodecSpec,
}

/// 연속 장치 실패 추적 — 한도 초과 시 셧다운 요청
struct FailureTracker {
    consecutive: u32,
    direction:   &'static str,
}

impl FailureTracker {
    fn new(direction: &'static str) -> Self {
        Self { consecutive: 0, direction }
    }

    fn reset(&mut self) {
        self.consecutive = 0;
    }

    /// 한도 도달 시 false (루프 종료)
    fn record(&mut self, state: &RelayState, err: &dyn std::fmt::Display) -> bool {
        RelayStats::incr(&state.stats.device_errors);
        self.consecutive += 1;
        if self.consecutive >= config::DEVICE_FAILURE_LIMIT {
            error!("[media] {} device failed {} times in a row, last: {}", self.direction, self.consecutive, err);
            state.request_shutdown(&format!("{} device failure", self.direction));
            return false;
        }
        debug!("[media] {} device error ({}): {}", self.direction, self.consecutive, err);
        thread::sleep(Duration::from_millis(config::ERROR_BACKOFF_MS));
        true
    }
}

// ----------------------------------------------------------------------------
// [송신 루프]
// ----------------------------------------------------------------------------

pub fn run_send_loop(
    ctx:         PipelineContext,
    mut source:  Box<dyn AudioSource>,
    mut encoder: Box<dyn AudioEncoder>,
    mut stream:  RtpStreamState,
) -> Box<dyn AudioSource> {
    let stats = &ctx.state.stats;
    let mut failures = FailureTracker::new("capture");
    info!("[media] send loop started ssrc=0x{:08x} remote={}", stream.ssrc, ctx.remote);

    while ctx.state.is_running() {
        let frame = match source.read_frame() {
            Ok(f)  => { failures.reset(); f }
            Err(e) => {
                if !failures.record(&ctx.state, &e) { break; }
                continue;
            }
        };

        let payload = match encoder.encode(&frame) {
            Ok(p)  => p,
            Err(e) => {
                RelayStats::incr(&stats.codec_errors);
                debug!("[media] encode failed, frame dropped: {}", e);
                continue;
            }
        };

        let (seq, ts) = (stream.sequence, stream.timestamp);
        let packet    = stream.packetize(&payload, ctx.codec.payload_type, config::SAMPLES_PER_FRAME as u32);
        let protected = ctx.srtp.encrypt(&packet);

        match ctx.socket.send_to(&protected, ctx.remote) {
            Ok(n) => {
                RelayStats::incr(&stats.packets_sent);
                trace!("[media] sent {} bytes seq={} ts={}", n, seq, ts);
            }
            Err(e) => {
                RelayStats::incr(&stats.transport_errors);
                warn!("[media] send_to {} failed, frame dropped: {}", ctx.remote, e);
            }
        }
    }

    info!("[media] send loop stopped");
    source
}

// ----------------------------------------------------------------------------
// [수신 루프]
// ----------------------------------------------------------------------------

pub fn run_recv_loop(
    ctx:         PipelineContext,
    mut sink:    Box<dyn AudioSink>,
    mut decoder: Box<dyn AudioDecoder>,
) -> Box<dyn AudioSink> {
    let stats = &ctx.state.stats;
    let mut failures = FailureTracker::new("playback");
    let mut buf = vec![0u8; config::RTP_RECV_BUF_SIZE];
    info!("[media] recv loop started pt={}", ctx.codec.payload_type);

    while ctx.state.is_running() {
        let (len, src_addr) = match ctx.socket.recv_from(&mut buf) {
            Ok(r) => r,
            // 타임아웃: stop 플래그 재확인
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => continue,
            Err(e) => {
                RelayStats::incr(&stats.transport_errors);
                warn!("[media] recv_from: {}", e);
                thread::sleep(Duration::from_millis(config::ERROR_BACKOFF_MS));
                continue;
            }
        };

        let packet = &buf[..len];
        match classify(packet) {
            PacketKind::Rtp => {}
            kind => {
                RelayStats::incr(&stats.discarded);
                trace!("[media] {:?} datagram from {} ignored len={}", kind, src_addr, len);
                continue;
            }
        }

        if len < SRTP_MIN_LEN {
            RelayStats::incr(&stats.discarded);
            trace!("[media] short datagram from {} len={}", src_addr, len);
            continue;
        }

        let plaintext = match ctx.srtp.decrypt(packet) {
            Some(p) => p,
            None    => {
                RelayStats::incr(&stats.auth_failures);
                trace!("[srtp] auth failed from {} len={}", src_addr, len);
                continue;
            }
        };

        let (header, payload) = match rtp::decode(&plaintext) {
            Some(r) => r,
            None    => { RelayStats::incr(&stats.discarded); continue; }
        };

        if header.payload_type != ctx.codec.payload_type {
            RelayStats::incr(&stats.discarded);
            trace!("[media] unexpected pt={} from {}, dropping", header.payload_type, src_addr);
            continue;
        }

        let frame = match decoder.decode(payload) {
            Ok(f)  => f,
            Err(e) => {
                RelayStats::incr(&stats.codec_errors);
                debug!("[media] decode failed seq={}: {}", header.sequence, e);
                continue;
            }
        };

        RelayStats::incr(&stats.packets_received);
        trace!("[media] recv seq={} ts={} ssrc=0x{:08x} samples={}",
            header.sequence, header.timestamp, header.ssrc, frame.len());

        match sink.write_frame(&frame) {
            Ok(()) => failures.reset(),
            Err(e) => {
                if !failures.record(&ctx.state, &e) { break; }
            }
        }
    }

    info!("[media] recv loop stopped");
    sink
}

// ----------------------------------------------------------------------------
// [AudioPipeline] — 두 루프 스레드 핸들
// ----------------------------------------------------------------------------

pub struct AudioPipeline {
    send: Option<JoinHandle<Option<Box<dyn AudioSource>>>>,
    recv: Option<JoinHandle<Option<Box<dyn AudioSink>>>>,
}

/// join 결과: 제한 시간 내 종료된 루프의 장치만 돌려받음
pub struct JoinedDevices {
    pub source: Option<Box<dyn AudioSource>>,
    pub sink:   Option<Box<dyn AudioSink>>,
}

fn loop_thread(name: &str) -> io::Result<thread::Builder> {
    Ok(thread::Builder::new().name(name.to_string()))
}

impl AudioPipeline {
    pub fn spawn(
        ctx:     PipelineContext,
        source:  Box<dyn AudioSource>,
        sink:    Box<dyn AudioSink>,
        encoder: Box<dyn AudioEncoder>,
        decoder: Box<dyn AudioDecoder>,
        stream:  RtpStreamState,
    ) -> RelayResult<Self> {
        Self::spawn_with(loop_thread, ctx, source, sink, encoder, decoder, stream)
    }

    fn spawn_with(
        builder:    fn(&str) -> io::Result<thread::Builder>,
        ctx:        PipelineContext,
        mut source: Box<dyn AudioSource>,
        mut sink:   Box<dyn AudioSink>,
        encoder:    Box<dyn AudioEncoder>,
        decoder:    Box<dyn AudioDecoder>,
        stream:     RtpStreamState,
    ) -> RelayResult<Self> {
        let state = Arc::clone(&ctx.state);
        let (source_tx, source_rx) = mpsc::channel::<Box<dyn AudioSource>>();
        let (sink_tx, sink_rx)     = mpsc::channel::<Box<dyn AudioSink>>();

        // 채널이 닫히면 (spawn 실패) 장치 없이 바로 종료
        let send_ctx = ctx.clone();
        let send = builder("relay-send").and_then(|b| b.spawn(move || {
            source_rx.recv().ok().map(|source| run_send_loop(send_ctx, source, encoder, stream))
        }));
        let recv = builder("relay-recv").and_then(|b| b.spawn(move || {
            sink_rx.recv().ok().map(|sink| run_recv_loop(ctx, sink, decoder))
        }));

        let (send, recv) = match send.and_then(|s| recv.map(|r| (s, r))) {
            Ok(handles) => handles,
            Err(e) => {
                warn!("[media] loop thread spawn failed: {}", e);
                state.stop();
                source.close();
                sink.close();
                return Err(e.into());
            }
        };

        if let Err(mpsc::SendError(mut source)) = source_tx.send(source) {
            source.close();
        }
        if let Err(mpsc::SendError(mut sink)) = sink_tx.send(sink) {
            sink.close();
        }

        Ok(Self { send: Some(send), recv: Some(recv) })
    }

    pub fn is_finished(&self) -> bool {
        self.send.as_ref().map_or(true, |h| h.is_finished())
            && self.recv.as_ref().map_or(true, |h| h.is_finished())
    }

    /// stop 플래그가 내려진 뒤 호출. 제한 시간을 넘긴 스레드는 detach.
    pub fn join(mut self, timeout: Duration) -> JoinedDevices {
        let deadline = Instant::now() + timeout;
        while !self.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }

        JoinedDevices {
            source: join_finished(self.send.take(), "relay-send"),
            sink:   join_finished(self.recv.take(), "relay-recv"),
        }
    }
}

fn join_finished<T>(handle: Option<JoinHandle<Option<T>>>, name: &str) -> Option<T> {
    let handle = handle?;
    if !handle.is_finished() {
        warn!("[media] {} did not stop in time, detaching", name);
        return None;
    }
    match handle.join() {
        Ok(v)  => v,
        Err(_) => { error!("[media] {} panicked", name); None }
    }
}

// ----------------------------------------------------------------------------
// [테스트]
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use crate::audio::codec::PcmCodec;
    use crate::audio::device::DiscardSink;
    use crate::audio::{AudioFrame, CodecKind};
    use crate::error::RelayError;

    #[test]
    fn classify_rtp_and_rtcp() {
        assert_eq!(classify(&[0x80, 0x6F]), PacketKind::Rtp);
        assert_eq!(classify(&[0x80, 0xE0]), PacketKind::Rtp); // marker + PT 96
        assert_eq!(classify(&[0x80, 0xC8]), PacketKind::Rtcp); // SR
        assert_eq!(classify(&[0x81, 0xC9]), PacketKind::Rtcp); // RR
    }

    #[test]
    fn classify_unknown() {
        assert_eq!(classify(&[0x00, 0x01]), PacketKind::Unknown); // STUN
        assert_eq!(classify(&[0x40, 0x6F]), PacketKind::Unknown); // version 1
        assert_eq!(classify(&[0x80]), PacketKind::Unknown);
        assert_eq!(classify(&[]), PacketKind::Unknown);
    }

    #[test]
    fn bind_ephemeral_port() {
        let s = bind_rtp_socket(0).unwrap();
        assert_ne!(s.local_addr().unwrap().port(), 0);
        assert_eq!(s.read_timeout().unwrap(), Some(Duration::from_millis(config::RECV_TIMEOUT_MS)));
    }

    struct FailingSource;

    impl AudioSource for FailingSource {
        fn read_frame(&mut self) -> RelayResult<AudioFrame> {
            Err(RelayError::Device("unplugged".into()))
        }
    }

    fn context(remote: SocketAddr) -> PipelineContext {
        PipelineContext {
            socket: Arc::new(bind_rtp_socket(0).unwrap()),
            srtp:   Arc::new(SrtpContext::from_keying_material(&config::STATIC_SRTP_KEYING_MATERIAL).unwrap()),
            state:  Arc::new(RelayState::new()),
            remote,
            codec:  CodecSpec::PCM,
        }
    }

    #[test]
    fn sustained_capture_failure_requests_shutdown() {
        let ctx   = context("127.0.0.1:9".parse().unwrap());
        let state = Arc::clone(&ctx.state);
        let stream = RtpStreamState::new(1, 0, 0);
        run_send_loop(ctx, Box::new(FailingSource), Box::new(PcmCodec::default()), stream);
        assert!(!state.is_running());
        assert_eq!(state.stats.snapshot().device_errors, config::DEVICE_FAILURE_LIMIT as u64);
    }

    #[test]
    fn recv_loop_exits_after_stop() {
        let ctx   = context("127.0.0.1:9".parse().unwrap());
        let state = Arc::clone(&ctx.state);
        let h = thread::spawn(move || run_recv_loop(ctx, Box::new(DiscardSink::default()), Box::new(PcmCodec::default())));
        state.stop();
        // 수신 타임아웃(1초) 안에 종료
        let started = Instant::now();
        while !h.is_finished() && started.elapsed() < Duration::from_secs(3) {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(h.is_finished());
    }

    // ----- 수신 루프 폐기 경로 / 장치 처리 -----

    #[derive(Default)]
    struct RecordingSink {
        frames: Arc<AtomicUsize>,
        closed: Arc<AtomicBool>,
    }

    impl AudioSink for RecordingSink {
        fn write_frame(&mut self, _frame: &AudioFrame) -> RelayResult<()> {
            self.frames.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    struct FailingSink;

    impl AudioSink for FailingSink {
        fn write_frame(&mut self, _frame: &AudioFrame) -> RelayResult<()> {
            Err(RelayError::Device("speaker gone".into()))
        }
    }

    #[derive(Default)]
    struct PacedSource {
        closed: Arc<AtomicBool>,
    }

    impl AudioSource for PacedSource {
        fn read_frame(&mut self) -> RelayResult<AudioFrame> {
            thread::sleep(Duration::from_millis(config::FRAME_DURATION_MS as u64));
            Ok(AudioFrame::silence(config::SAMPLES_PER_FRAME, config::SAMPLE_RATE_HZ))
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    fn wait_until(timeout: Duration, cond: impl Fn() -> bool) -> bool {
        let started = Instant::now();
        while !cond() && started.elapsed() < timeout {
            thread::sleep(Duration::from_millis(10));
        }
        cond()
    }

    /// 디바이스 역할 소켓 + 릴레이 수신 주소
    fn device_peer(ctx: &PipelineContext) -> (UdpSocket, SocketAddr) {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = ctx.socket.local_addr().unwrap().port();
        (peer, SocketAddr::from(([127, 0, 0, 1], port)))
    }

    fn protected(ctx: &PipelineContext, seq: u16, pt: u8) -> Vec<u8> {
        ctx.srtp.encrypt(&rtp::encode(&[0x01, 0x00, 0x02, 0x00], seq, 320, 0x1234_5678, pt, false))
    }

    fn spawn_recv(ctx: &PipelineContext, sink: Box<dyn AudioSink>) -> JoinHandle<Box<dyn AudioSink>> {
        let ctx = ctx.clone();
        thread::spawn(move || run_recv_loop(ctx, sink, Box::new(PcmCodec::default())))
    }

    #[test]
    fn recv_loop_discards_wrong_pt_short_and_non_rtp() {
        let ctx    = context("127.0.0.1:9".parse().unwrap());
        let sink   = RecordingSink::default();
        let frames = Arc::clone(&sink.frames);
        let h      = spawn_recv(&ctx, Box::new(sink));
        let (peer, target) = device_peer(&ctx);

        // 정상 SRTP지만 PT 111 (기대값 96)
        peer.send_to(&protected(&ctx, 1, 111), target).unwrap();
        // 21바이트 (SRTP 최소 길이 미만)
        peer.send_to(&[0x80; 21], target).unwrap();
        // STUN binding request 형태
        let mut stun = vec![0x00, 0x01, 0x00, 0x00, 0x21, 0x12, 0xA4, 0x42];
        stun.extend_from_slice(&[0u8; 12]);
        peer.send_to(&stun, target).unwrap();
        // 마지막 정상 패킷으로 처리 완료 확인
        peer.send_to(&protected(&ctx, 2, 96), target).unwrap();

        assert!(wait_until(Duration::from_secs(3), || frames.load(Ordering::SeqCst) == 1));
        ctx.state.stop();
        assert!(wait_until(Duration::from_secs(3), || h.is_finished()));

        let stats = ctx.state.stats.snapshot();
        assert_eq!(stats.discarded, 3);
        assert_eq!(stats.packets_received, 1);
        assert_eq!(stats.auth_failures, 0);
        assert_eq!(frames.load(Ordering::SeqCst), 1, "폐기 대상은 sink에 도달하면 안 됩니다.");
    }

    #[test]
    fn default_codec_plays_pt_111_only() {
        let mut ctx = context("127.0.0.1:9".parse().unwrap());
        ctx.codec   = CodecKind::default().spec();
        let sink    = RecordingSink::default();
        let frames  = Arc::clone(&sink.frames);
        let h       = spawn_recv(&ctx, Box::new(sink));
        let (peer, target) = device_peer(&ctx);

        peer.send_to(&protected(&ctx, 1, 96), target).unwrap();
        peer.send_to(&protected(&ctx, 2, 111), target).unwrap();

        assert!(wait_until(Duration::from_secs(3), || frames.load(Ordering::SeqCst) == 1));
        ctx.state.stop();
        assert!(wait_until(Duration::from_secs(3), || h.is_finished()));
        assert_eq!(ctx.state.stats.snapshot().discarded, 1);
    }

    #[test]
    fn sustained_playback_failure_requests_shutdown() {
        let ctx = context("127.0.0.1:9".parse().unwrap());
        let h   = spawn_recv(&ctx, Box::new(FailingSink));
        let (peer, target) = device_peer(&ctx);

        for seq in 0..config::DEVICE_FAILURE_LIMIT as u16 {
            peer.send_to(&protected(&ctx, seq, 96), target).unwrap();
        }

        // 실패마다 ERROR_BACKOFF_MS 대기
        assert!(wait_until(Duration::from_secs(15), || h.is_finished()));
        assert!(!ctx.state.is_running());
        assert_eq!(ctx.state.stats.snapshot().device_errors, config::DEVICE_FAILURE_LIMIT as u64);
    }

    // ----- AudioPipeline -----

    fn no_recv_thread(name: &str) -> io::Result<thread::Builder> {
        if name == "relay-recv" {
            return Err(io::Error::other("thread limit reached"));
        }
        loop_thread(name)
    }

    #[test]
    fn spawn_failure_closes_both_devices() {
        let ctx    = context("127.0.0.1:9".parse().unwrap());
        let state  = Arc::clone(&ctx.state);
        let source = PacedSource::default();
        let sink   = RecordingSink::default();
        let (source_closed, sink_closed) = (Arc::clone(&source.closed), Arc::clone(&sink.closed));

        let result = AudioPipeline::spawn_with(
            no_recv_thread,
            ctx,
            Box::new(source),
            Box::new(sink),
            Box::new(PcmCodec::default()),
            Box::new(PcmCodec::default()),
            RtpStreamState::new(1, 0, 0),
        );

        assert!(matches!(result, Err(RelayError::Transport(_))));
        assert!(!state.is_running());
        assert!(source_closed.load(Ordering::SeqCst));
        assert!(sink_closed.load(Ordering::SeqCst));
    }

    #[test]
    fn join_returns_devices_after_stop() {
        let ctx   = context("127.0.0.1:9".parse().unwrap());
        let state = Arc::clone(&ctx.state);
        let pipeline = AudioPipeline::spawn(
            ctx,
            Box::new(PacedSource::default()),
            Box::new(RecordingSink::default()),
            Box::new(PcmCodec::default()),
            Box::new(PcmCodec::default()),
            RtpStreamState::new(1, 0, 0),
        )
        .unwrap();

        assert!(wait_until(Duration::from_secs(3), || state.stats.snapshot().packets_sent > 0));
        state.stop();
        let joined = pipeline.join(Duration::from_millis(config::JOIN_TIMEOUT_MS));
        assert!(joined.source.is_some());
        assert!(joined.sink.is_some());
    }

    // ----- 송신 trace 로그 -----

    /// 첫 프레임을 내준 뒤 릴레이를 멈추는 소스
    struct OneShotSource {
        state: Arc<RelayState>,
    }

    impl AudioSource for OneShotSource {
        fn read_frame(&mut self) -> RelayResult<AudioFrame> {
            self.state.stop();
            Ok(AudioFrame::silence(config::SAMPLES_PER_FRAME, config::SAMPLE_RATE_HZ))
        }
    }

    #[derive(Clone, Default)]
    struct SharedLog(Arc<std::sync::Mutex<Vec<u8>>>);

    impl io::Write for SharedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if let Ok(mut log) = self.0.lock() {
                log.extend_from_slice(buf);
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn send_trace_logs_timestamp_of_sent_packet() {
        let ctx    = context("127.0.0.1:9".parse().unwrap());
        let source = OneShotSource { state: Arc::clone(&ctx.state) };
        let stream = RtpStreamState::new(1, 1000, 5_000_000);

        let log = SharedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            run_send_loop(ctx, Box::new(source), Box::new(PcmCodec::default()), stream);
        });

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("seq=1000 ts=5000000"), "log: {}", output);
    }
}
