// author: kodeholic (powered by Claude)

use std::fmt;

#[derive(Debug)]
pub enum RelayError {
    /// 게이트웨이 non-success 응답, answer 누락, 상태 머신 순서 위반
    Signaling(String),
    /// UDP bind / send / recv 실패
    Transport(std::io::Error),
    /// SRTP 인증 태그 불일치 — 루프 내부에서만 카운트되고 밖으로 나가지 않음
    Authentication,
    /// 오디오 인코딩 / 디코딩 실패
    Codec(String),
    /// 캡처 / 재생 장치 실패
    Device(String),
    /// 잘못된 설정값 (SRTP 키 길이, URL 등)
    Config(String),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Signaling(msg) => write!(f, "Signaling error: {}", msg),
            RelayError::Transport(err) => write!(f, "Network I/O error: {}", err),
            RelayError::Authentication => write!(f, "SRTP authentication tag mismatch"),
            RelayError::Codec(msg)     => write!(f, "Codec error: {}", msg),
            RelayError::Device(msg)    => write!(f, "Audio device error: {}", msg),
            RelayError::Config(msg)    => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelayError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        RelayError::Transport(err)
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::Signaling(format!("gateway request failed: {}", err))
    }
}

pub type RelayResult<T> = Result<T, RelayError>;
