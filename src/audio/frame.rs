// author: kodeholic (powered by Claude)

/// 고정 길이 PCM 프레임 (mono, i16)
/// 캡처 → 인코더, 디코더 → 재생 사이를 오가는 단위
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    pub samples:     Vec<i16>,
    pub sample_rate: u32,
}

impl AudioFrame {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    pub fn silence(samples_per_frame: usize, sample_rate: u32) -> Self {
        Self::new(vec![0; samples_per_frame], sample_rate)
    }

    /// little-endian i16 바이트열 (L16 payload / 디바이스 PCM 포맷)
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    /// 홀수 길이의 마지막 바이트는 버림
    pub fn from_le_bytes(bytes: &[u8], sample_rate: u32) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        Self::new(samples, sample_rate)
    }

    /// 부족한 샘플은 0으로 채우고 넘치는 샘플은 자름 (코덱 고정 프레임 크기 맞춤)
    pub fn fit_to(&mut self, samples_per_frame: usize) {
        self.samples.resize(samples_per_frame, 0);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
