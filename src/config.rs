// author: kodeholic (powered by Claude)
// 매직 넘버를 배제하고 릴레이 전체의 동작과 한계를 제어하는 상수 모음입니다.

// ----------------------------------------------------------------------------
// Janus 게이트웨이
// ----------------------------------------------------------------------------

/// Janus REST 엔드포인트 기본 주소
/// 운영 환경에서는 환경변수 JANUS_URL 로 오버라이드 할 것
pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:8088";

/// Janus admin key — 현재 시그널링 요청에는 실리지 않음 (설정 호환용으로만 보관)
pub const DEFAULT_ADMIN_KEY: &str = "janusoverlord";

/// attach 대상 플러그인
pub const DEFAULT_PLUGIN: &str = "janus.plugin.echotest";

/// REST 요청 타임아웃 (10초)
pub const HTTP_TIMEOUT_MS: u64 = 10_000;

/// transaction id 길이 (alphanumeric)
pub const TRANSACTION_ID_LEN: usize = 12;

/// answer SDP가 0.0.0.0 을 돌려줄 때 사용하는 디바이스 고정 RTP 포트
/// 실제 협상값이 아님 — 배포 환경마다 다를 수 있으므로 --device-port 로 조정
pub const DEVICE_FALLBACK_RTP_PORT: u16 = 10000;

// ----------------------------------------------------------------------------
// RTP / SRTP
// ----------------------------------------------------------------------------

/// 송신 스트림 고정 SSRC (디바이스 쪽 SSRC와 달라야 함)
pub const LOCAL_SSRC: u32 = 0x8765_4321;

/// 송신 시작 시퀀스 번호
pub const INITIAL_SEQUENCE: u16 = 1000;

/// Opus 동적 payload type
pub const OPUS_PAYLOAD_TYPE: u8 = 111;

/// raw PCM(L16) 동적 payload type
pub const PCM_PAYLOAD_TYPE: u8 = 96;

/// 정적 SRTP 마스터 키(16) + 솔트(14) — 디바이스 펌웨어와 동일한 값이어야 함
pub const STATIC_SRTP_KEYING_MATERIAL: [u8; 30] = [
    // master key
    0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF,
    0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54, 0x32, 0x10,
    // master salt
    0x0F, 0x0E, 0x0D, 0x0C, 0x0B, 0x0A, 0x09, 0x08,
    0x07, 0x06, 0x05, 0x04, 0x03, 0x02,
];

// ----------------------------------------------------------------------------
// 오디오
// ----------------------------------------------------------------------------

/// 캡처 / 재생 샘플레이트 (mono, i16)
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// 프레임 길이 (20ms)
pub const FRAME_DURATION_MS: u32 = 20;

/// 프레임당 샘플 수 = 16000 * 20 / 1000 = 320
pub const SAMPLES_PER_FRAME: usize = (SAMPLE_RATE_HZ * FRAME_DURATION_MS / 1000) as usize;

// ----------------------------------------------------------------------------
// 파이프라인 / supervisor
// ----------------------------------------------------------------------------

/// UDP 수신 버퍼 (MTU 1개)
pub const RTP_RECV_BUF_SIZE: usize = 1500;

/// 수신 루프 블로킹 대기 상한 — stop 플래그 확인 주기를 겸함 (1초)
pub const RECV_TIMEOUT_MS: u64 = 1_000;

/// 소켓 수신 에러 / 장치 에러 후 재시도 전 대기 (100ms)
pub const ERROR_BACKOFF_MS: u64 = 100;

/// 연속 장치 실패 허용 횟수 — 초과 시 루프 종료 + supervisor 셧다운 요청
pub const DEVICE_FAILURE_LIMIT: u32 = 50;

/// 셧다운 시 루프 스레드 join 대기 상한 (3초)
pub const JOIN_TIMEOUT_MS: u64 = 3_000;

/// supervisor 통계 로그 주기 (10초)
pub const STATS_INTERVAL_MS: u64 = 10_000;

/// supervisor running 플래그 확인 주기
pub const SUPERVISOR_POLL_MS: u64 = 200;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_per_frame_matches_16k_20ms() {
        assert_eq!(SAMPLES_PER_FRAME, 320);
    }

    #[test]
    fn keying_material_is_key_plus_salt() {
        assert_eq!(STATIC_SRTP_KEYING_MATERIAL.len(), 16 + 14);
    }
}
