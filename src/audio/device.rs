// author: kodeholic (powered by Claude)
// 오디오 장치 추상화
//
// 캡처 / 재생은 서로 독립된 half-duplex 스트림.
// 송신 루프가 AudioSource를, 수신 루프가 AudioSink를 각각 단독 소유합니다.
//
// 구현체:
//   - CpalSource / CpalSink : 실제 사운드카드 (feature "cpal")
//   - SilenceSource         : 20ms 간격으로 무음 프레임 생성 (헤드리스 실행 / 테스트)
//   - DiscardSink           : 수신 프레임을 세기만 하고 버림

use std::time::{Duration, Instant};

use crate::audio::frame::AudioFrame;
use crate::config;
use crate::error::RelayResult;

pub trait AudioSource: Send {
    /// 프레임 1개가 준비될 때까지 블로킹
    fn read_frame(&mut self) -> RelayResult<AudioFrame>;

    fn close(&mut self) {}
}

pub trait AudioSink: Send {
    fn write_frame(&mut self, frame: &AudioFrame) -> RelayResult<()>;

    fn close(&mut self) {}
}

// ----------------------------------------------------------------------------
// [AudioBackend] — CLI에서 선택
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AudioBackend {
    /// 기본 입출력 장치 (feature "cpal")
    Device,
    /// 무음 캡처 + 재생 폐기
    Null,
}

impl Default for AudioBackend {
    fn default() -> Self {
        if cfg!(feature = "cpal") { AudioBackend::Device } else { AudioBackend::Null }
    }
}

impl AudioBackend {
    pub fn open(self) -> RelayResult<(Box<dyn AudioSource>, Box<dyn AudioSink>)> {
        match self {
            AudioBackend::Null => Ok((
                Box::new(SilenceSource::new(config::SAMPLES_PER_FRAME, config::FRAME_DURATION_MS)),
                Box::new(DiscardSink::default()),
            )),
            #[cfg(feature = "cpal")]
            AudioBackend::Device => Ok((
                Box::new(crate::audio::cpal_io::CpalSource::open()?),
                Box::new(crate::audio::cpal_io::CpalSink::open()?),
            )),
            #[cfg(not(feature = "cpal"))]
            AudioBackend::Device => Err(crate::error::RelayError::Config(
                "audio device support not compiled in (rebuild with --features cpal)".to_string(),
            )),
        }
    }
}

// ----------------------------------------------------------------------------
// [SilenceSource]
// ----------------------------------------------------------------------------

/// 실제 장치처럼 프레임 주기만큼 블로킹하며 무음 프레임을 내놓음
pub struct SilenceSource {
    samples_per_frame: usize,
    frame_duration:    Duration,
    next_deadline:     Option<Instant>,
}

impl SilenceSource {
    pub fn new(samples_per_frame: usize, frame_duration_ms: u32) -> Self {
        Self {
            samples_per_frame,
            frame_duration: Duration::from_millis(frame_duration_ms as u64),
            next_deadline:  None,
        }
    }
}

impl AudioSource for SilenceSource {
    fn read_frame(&mut self) -> RelayResult<AudioFrame> {
        let now = Instant::now();
        let deadline = self.next_deadline.unwrap_or(now);
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        // 밀린 경우 따라잡지 않고 현재 시각 기준으로 재정렬
        self.next_deadline = Some(deadline.max(now) + self.frame_duration);
        Ok(AudioFrame::silence(self.samples_per_frame, config::SAMPLE_RATE_HZ))
    }
}

// ----------------------------------------------------------------------------
// [DiscardSink]
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DiscardSink {
    pub frames: u64,
}

impl AudioSink for DiscardSink {
    fn write_frame(&mut self, _frame: &AudioFrame) -> RelayResult<()> {
        self.frames += 1;
        Ok(())
    }
}
