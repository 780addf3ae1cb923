// author: kodeholic (powered by Gemini)

use std::time::{SystemTime, UNIX_EPOCH};

/// 현재 시간을 밀리초 단위의 Unix Timestamp로 반환합니다.
/// 에러 발생 시 시스템 패닉 대신 0(기본값)을 반환하여 장애를 방어합니다.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// 송신 RTP timestamp 시작값: unix 초 × 샘플레이트 (하위 32비트)
pub fn initial_rtp_timestamp(sample_rate: u32) -> u32 {
    let secs = current_timestamp() / 1000;
    secs.wrapping_mul(sample_rate as u64) as u32
}

/// Janus transaction id 용 랜덤 문자열 (alphanumeric)
pub fn random_token(len: usize) -> String {
    use rand::Rng;
    let charset: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| charset[rng.gen_range(0..charset.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_length_and_charset() {
        let s = random_token(12);
        assert_eq!(s.len(), 12);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(random_token(0).len(), 0);
    }

    #[test]
    fn token_unique() {
        // 62^12 공간에서 충돌할 확률 ~0
        assert_ne!(random_token(12), random_token(12));
    }

    #[test]
    fn timestamp_is_recent() {
        assert!(current_timestamp() > 1_600_000_000_000);
    }
}
