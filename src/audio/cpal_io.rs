// author: kodeholic (powered by Claude)
// CPAL 기반 실제 사운드카드 입출력 (feature "cpal")
//
// cpal::Stream은 플랫폼에 따라 Send가 아니므로 스트림은 전용 스레드에서
// 생성 / 유지하고, 프레임만 std mpsc 채널로 건넵니다.
//
//   [cpal 콜백] → 320 샘플 단위로 잘라 tx → CpalSource::read_frame() (블로킹)
//   CpalSink::write_frame() → tx → [cpal 콜백] (비어 있으면 무음)

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, info, warn};

use crate::audio::device::{AudioSink, AudioSource};
use crate::audio::frame::AudioFrame;
use crate::config::{RECV_TIMEOUT_MS, SAMPLES_PER_FRAME, SAMPLE_RATE_HZ};
use crate::error::{RelayError, RelayResult};

/// 스트림 유지 스레드의 running 확인 주기
const KEEPALIVE_POLL_MS: u64 = 100;

fn stream_config() -> cpal::StreamConfig {
    cpal::StreamConfig {
        channels:    1,
        sample_rate: cpal::SampleRate(SAMPLE_RATE_HZ),
        buffer_size: cpal::BufferSize::Default,
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

fn to_f32(sample: i16) -> f32 {
    sample as f32 / i16::MAX as f32
}

/// 스트림 스레드를 띄우고 초기화 결과를 기다림
fn spawn_stream_thread<F>(name: &str, running: Arc<AtomicBool>, build: F) -> RelayResult<JoinHandle<()>>
where
    F: FnOnce() -> RelayResult<cpal::Stream> + Send + 'static,
{
    let (ready_tx, ready_rx) = mpsc::sync_channel::<RelayResult<()>>(1);
    let thread_name = name.to_string();

    let handle = thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || {
            let stream = match build() {
                Ok(s) => s,
                Err(e) => { let _ = ready_tx.send(Err(e)); return; }
            };
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(RelayError::Device(format!("stream play: {}", e))));
                return;
            }
            let _ = ready_tx.send(Ok(()));

            while running.load(Ordering::Acquire) {
                thread::sleep(Duration::from_millis(KEEPALIVE_POLL_MS));
            }
            debug!("[audio] {} stream released", thread_name);
        })
        .map_err(|e| RelayError::Device(format!("spawn {}: {}", name, e)))?;

    match ready_rx.recv() {
        Ok(Ok(()))  => Ok(handle),
        Ok(Err(e))  => { let _ = handle.join(); Err(e) }
        Err(_)      => Err(RelayError::Device(format!("{} thread exited during init", name))),
    }
}

// ----------------------------------------------------------------------------
// [CpalSource] — 마이크
// ----------------------------------------------------------------------------

pub struct CpalSource {
    rx:      Receiver<Vec<i16>>,
    running: Arc<AtomicBool>,
    handle:  Option<JoinHandle<()>>,
}

impl CpalSource {
    pub fn open() -> RelayResult<Self> {
        let (tx, rx) = mpsc::channel::<Vec<i16>>();
        let running  = Arc::new(AtomicBool::new(true));

        let handle = spawn_stream_thread("audio-capture", Arc::clone(&running), move || {
            let host   = cpal::default_host();
            let device = host
                .default_input_device()
                .ok_or_else(|| RelayError::Device("no default input device".to_string()))?;
            info!("[audio] capture device: {}", device.name().unwrap_or_default());

            let mut pending: Vec<i16> = Vec::with_capacity(SAMPLES_PER_FRAME * 2);
            device
                .build_input_stream(
                    &stream_config(),
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        pending.extend(data.iter().map(|s| to_i16(*s)));
                        while pending.len() >= SAMPLES_PER_FRAME {
                            let chunk: Vec<i16> = pending.drain(..SAMPLES_PER_FRAME).collect();
                            // 수신자가 닫혔으면 조용히 버림 (셧다운 중)
                            let _ = tx.send(chunk);
                        }
                    },
                    |err| warn!("[audio] capture stream error: {}", err),
                    None,
                )
                .map_err(|e| RelayError::Device(format!("build input stream: {}", e)))
        })?;

        Ok(Self { rx, running, handle: Some(handle) })
    }
}

impl AudioSource for CpalSource {
    fn read_frame(&mut self) -> RelayResult<AudioFrame> {
        match self.rx.recv_timeout(Duration::from_millis(RECV_TIMEOUT_MS)) {
            Ok(samples) => Ok(AudioFrame::new(samples, SAMPLE_RATE_HZ)),
            Err(RecvTimeoutError::Timeout) => Err(RelayError::Device("capture timed out".to_string())),
            Err(RecvTimeoutError::Disconnected) => Err(RelayError::Device("capture stream closed".to_string())),
        }
    }

    fn close(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

// ----------------------------------------------------------------------------
// [CpalSink] — 스피커
// ----------------------------------------------------------------------------

pub struct CpalSink {
    tx:      Sender<Vec<i16>>,
    running: Arc<AtomicBool>,
    handle:  Option<JoinHandle<()>>,
}

impl CpalSink {
    pub fn open() -> RelayResult<Self> {
        let (tx, rx) = mpsc::channel::<Vec<i16>>();
        let running  = Arc::new(AtomicBool::new(true));

        let handle = spawn_stream_thread("audio-playback", Arc::clone(&running), move || {
            let host   = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or_else(|| RelayError::Device("no default output device".to_string()))?;
            info!("[audio] playback device: {}", device.name().unwrap_or_default());

            let mut queued: VecDeque<i16> = VecDeque::with_capacity(SAMPLES_PER_FRAME * 4);
            device
                .build_output_stream(
                    &stream_config(),
                    move |output: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        while let Ok(chunk) = rx.try_recv() {
                            queued.extend(chunk);
                        }
                        // 재생할 프레임이 없으면 무음
                        for slot in output.iter_mut() {
                            *slot = queued.pop_front().map(to_f32).unwrap_or(0.0);
                        }
                    },
                    |err| warn!("[audio] playback stream error: {}", err),
                    None,
                )
                .map_err(|e| RelayError::Device(format!("build output stream: {}", e)))
        })?;

        Ok(Self { tx, running, handle: Some(handle) })
    }
}

impl AudioSink for CpalSink {
    fn write_frame(&mut self, frame: &AudioFrame) -> RelayResult<()> {
        self.tx
            .send(frame.samples.clone())
            .map_err(|_| RelayError::Device("playback stream closed".to_string()))
    }

    fn close(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}
