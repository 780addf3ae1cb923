// author: kodeholic (powered by Claude)
// 오디오 payload 코덱
//
// 파이프라인은 AudioEncoder / AudioDecoder 트레이트만 바라봅니다.
//   - Opus      : 기본 코덱, PT 111 (feature "opus", 기본 활성)
//   - PcmCodec  : L16 raw PCM (little-endian), PT 96 — --codec pcm 으로만 선택
//
// CodecSpec은 SDP offer의 m= / a=rtpmap / a=fmtp 라인과
// 수신 루프의 payload type 필터를 동시에 결정합니다.

use crate::audio::frame::AudioFrame;
use crate::config;
use crate::error::{RelayError, RelayResult};

/// SDP 수준 코덱 기술자
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecSpec {
    pub payload_type:  u8,
    pub encoding_name: &'static str,
    pub clock_rate:    u32,
    pub channels:      u8,
    pub fmtp:          Option<&'static str>,
}

impl CodecSpec {
    /// SDP의 RTP 클럭(48000/2)은 내부 캡처 레이트(16kHz)와 무관 — 인코더가 협상한 값
    pub const OPUS: CodecSpec = CodecSpec {
        payload_type:  config::OPUS_PAYLOAD_TYPE,
        encoding_name: "opus",
        clock_rate:    48_000,
        channels:      2,
        fmtp:          Some("minptime=10;useinbandfec=1"),
    };

    pub const PCM: CodecSpec = CodecSpec {
        payload_type:  config::PCM_PAYLOAD_TYPE,
        encoding_name: "L16",
        clock_rate:    config::SAMPLE_RATE_HZ,
        channels:      1,
        fmtp:          None,
    };

    /// "111 opus/48000/2" — a=rtpmap: 뒤에 붙는 값
    pub fn rtpmap(&self) -> String {
        format!("{} {}/{}/{}", self.payload_type, self.encoding_name, self.clock_rate, self.channels)
    }
}

pub trait AudioEncoder: Send {
    fn encode(&mut self, frame: &AudioFrame) -> RelayResult<Vec<u8>>;
}

pub trait AudioDecoder: Send {
    fn decode(&mut self, payload: &[u8]) -> RelayResult<AudioFrame>;
}

// ----------------------------------------------------------------------------
// [CodecKind] — CLI에서 선택
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CodecKind {
    Opus,
    Pcm,
}

impl Default for CodecKind {
    /// 디바이스는 Opus PT 111만 송신 — PCM은 명시적으로 골랐을 때만
    fn default() -> Self {
        CodecKind::Opus
    }
}

impl CodecKind {
    pub fn spec(self) -> CodecSpec {
        match self {
            CodecKind::Opus => CodecSpec::OPUS,
            CodecKind::Pcm  => CodecSpec::PCM,
        }
    }

    /// 방향별 인코더 / 디코더 생성 — 송신 / 수신 루프가 각각 단독 소유
    pub fn build(self) -> RelayResult<(Box<dyn AudioEncoder>, Box<dyn AudioDecoder>)> {
        match self {
            CodecKind::Pcm => Ok((Box::new(PcmCodec::default()), Box::new(PcmCodec::default()))),
            #[cfg(feature = "opus")]
            CodecKind::Opus => Ok((
                Box::new(opus_codec::OpusEncoder::new()?),
                Box::new(opus_codec::OpusDecoder::new()?),
            )),
            #[cfg(not(feature = "opus"))]
            CodecKind::Opus => Err(RelayError::Config(
                "opus codec not compiled in (rebuild with default features or pass --codec pcm)".to_string(),
            )),
        }
    }
}

// ----------------------------------------------------------------------------
// [PcmCodec] — L16 little-endian passthrough
// ----------------------------------------------------------------------------

#[derive(Debug)]
pub struct PcmCodec {
    sample_rate: u32,
}

impl Default for PcmCodec {
    fn default() -> Self {
        Self { sample_rate: config::SAMPLE_RATE_HZ }
    }
}

impl AudioEncoder for PcmCodec {
    fn encode(&mut self, frame: &AudioFrame) -> RelayResult<Vec<u8>> {
        Ok(frame.to_le_bytes())
    }
}

impl AudioDecoder for PcmCodec {
    fn decode(&mut self, payload: &[u8]) -> RelayResult<AudioFrame> {
        if payload.len() % 2 != 0 {
            return Err(RelayError::Codec(format!("odd L16 payload length {}", payload.len())));
        }
        Ok(AudioFrame::from_le_bytes(payload, self.sample_rate))
    }
}

// ----------------------------------------------------------------------------
// [Opus] — feature "opus"
// ----------------------------------------------------------------------------

#[cfg(feature = "opus")]
mod opus_codec {
    use super::{AudioDecoder, AudioEncoder};
    use crate::audio::frame::AudioFrame;
    use crate::config::{SAMPLES_PER_FRAME, SAMPLE_RATE_HZ};
    use crate::error::{RelayError, RelayResult};

    /// RFC 6716 권장 최대 패킷 크기
    const MAX_OPUS_PACKET: usize = 4000;
    /// 최대 프레임 120ms 분량
    const MAX_DECODED_SAMPLES: usize = SAMPLES_PER_FRAME * 6;

    pub struct OpusEncoder {
        inner: opus::Encoder,
        buf:   Vec<u8>,
    }

    impl OpusEncoder {
        pub fn new() -> RelayResult<Self> {
            let inner = opus::Encoder::new(SAMPLE_RATE_HZ, opus::Channels::Mono, opus::Application::Voip)
                .map_err(|e| RelayError::Codec(format!("opus encoder init: {}", e)))?;
            Ok(Self { inner, buf: vec![0u8; MAX_OPUS_PACKET] })
        }
    }

    impl AudioEncoder for OpusEncoder {
        fn encode(&mut self, frame: &AudioFrame) -> RelayResult<Vec<u8>> {
            // Opus는 정확히 20ms(320 샘플)를 요구
            let mut pcm = frame.clone();
            pcm.fit_to(SAMPLES_PER_FRAME);
            let n = self.inner
                .encode(&pcm.samples, &mut self.buf)
                .map_err(|e| RelayError::Codec(format!("opus encode: {}", e)))?;
            Ok(self.buf[..n].to_vec())
        }
    }

    pub struct OpusDecoder {
        inner: opus::Decoder,
        buf:   Vec<i16>,
    }

    impl OpusDecoder {
        pub fn new() -> RelayResult<Self> {
            let inner = opus::Decoder::new(SAMPLE_RATE_HZ, opus::Channels::Mono)
                .map_err(|e| RelayError::Codec(format!("opus decoder init: {}", e)))?;
            Ok(Self { inner, buf: vec![0i16; MAX_DECODED_SAMPLES] })
        }
    }

    impl AudioDecoder for OpusDecoder {
        fn decode(&mut self, payload: &[u8]) -> RelayResult<AudioFrame> {
            let n = self.inner
                .decode(payload, &mut self.buf, false)
                .map_err(|e| RelayError::Codec(format!("opus decode: {}", e)))?;
            Ok(AudioFrame::new(self.buf[..n].to_vec(), SAMPLE_RATE_HZ))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn opus_round_trip_keeps_frame_size() {
            let mut enc = OpusEncoder::new().unwrap();
            let mut dec = OpusDecoder::new().unwrap();
            let frame = AudioFrame::silence(SAMPLES_PER_FRAME, SAMPLE_RATE_HZ);
            let payload = enc.encode(&frame).unwrap();
            assert!(!payload.is_empty());
            assert_eq!(dec.decode(&payload).unwrap().len(), SAMPLES_PER_FRAME);
        }
    }
}
