// author: kodeholic (powered by Claude)
// 정적 키 SRTP 암복호화 모듈
//
// 디바이스 펌웨어와 동일한 단순화 방식 — RFC 3711 세션 키 도출 없음:
//   IV  = master_salt[0..12] ‖ 00 00 00 00
//   암호 = AES-128-CTR(master_key, IV) — payload만 (헤더 12바이트는 평문 유지)
//   태그 = HMAC-SHA1(master_key, header ‖ ciphertext) 앞 10바이트
//
// 패킷별 nonce가 없으므로 같은 평문은 같은 암호문이 됩니다.
// 디바이스 상호운용을 위해 이 스킴을 그대로 유지합니다.
//
// 흐름:
//   송신: plaintext RTP → encrypt() → header ‖ ciphertext ‖ tag
//   수신: SRTP → decrypt() → 태그 검증 → header ‖ plaintext (실패 시 None)

use aes::cipher::{KeyIvInit, StreamCipher};
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::{RelayError, RelayResult};
use crate::media::rtp::RTP_HEADER_LEN;

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;
type HmacSha1  = Hmac<Sha1>;

pub const MASTER_KEY_LEN:  usize = 16;
pub const MASTER_SALT_LEN: usize = 14;
pub const KEYING_MATERIAL_LEN: usize = MASTER_KEY_LEN + MASTER_SALT_LEN;

/// HMAC-SHA1-80 태그 길이
pub const AUTH_TAG_LEN: usize = 10;

/// 유효한 SRTP 패킷 최소 길이 (헤더 12 + payload 0 + 태그 10)
pub const SRTP_MIN_LEN: usize = RTP_HEADER_LEN + AUTH_TAG_LEN;

/// SDP crypto suite 이름
pub const CRYPTO_SUITE: &str = "AES_CM_128_HMAC_SHA1_80";

/// 양쪽 엔드포인트가 공유하는 불변 키 컨텍스트
/// 두 루프가 Arc로 읽기 전용 공유 — 락 불필요
#[derive(Clone, PartialEq, Eq)]
pub struct SrtpContext {
    master_key:  [u8; MASTER_KEY_LEN],
    master_salt: [u8; MASTER_SALT_LEN],
}

impl SrtpContext {
    pub fn new(master_key: [u8; MASTER_KEY_LEN], master_salt: [u8; MASTER_SALT_LEN]) -> Self {
        Self { master_key, master_salt }
    }

    /// key(16) ‖ salt(14) 형태의 30바이트 키 머티리얼
    pub fn from_keying_material(material: &[u8]) -> RelayResult<Self> {
        if material.len() != KEYING_MATERIAL_LEN {
            return Err(RelayError::Config(format!(
                "SRTP keying material must be {} bytes, got {}",
                KEYING_MATERIAL_LEN,
                material.len()
            )));
        }
        let mut master_key  = [0u8; MASTER_KEY_LEN];
        let mut master_salt = [0u8; MASTER_SALT_LEN];
        master_key.copy_from_slice(&material[..MASTER_KEY_LEN]);
        master_salt.copy_from_slice(&material[MASTER_KEY_LEN..]);
        Ok(Self::new(master_key, master_salt))
    }

    /// SDP `inline:` 값(base64) 파싱. `|lifetime|mki` 꼬리는 무시
    pub fn from_inline_key(inline: &str) -> RelayResult<Self> {
        let b64 = inline.split('|').next().unwrap_or(inline).trim();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .map_err(|e| RelayError::Config(format!("SRTP key is not valid base64: {}", e)))?;
        Self::from_keying_material(&decoded)
    }

    /// SDP crypto 라인용 base64(key ‖ salt) — 30바이트 → 40자
    pub fn inline_key(&self) -> String {
        let mut material = Vec::with_capacity(KEYING_MATERIAL_LEN);
        material.extend_from_slice(&self.master_key);
        material.extend_from_slice(&self.master_salt);
        base64::engine::general_purpose::STANDARD.encode(material)
    }

    /// plaintext RTP → header ‖ AES-CTR(payload) ‖ tag
    pub fn encrypt(&self, rtp_packet: &[u8]) -> Vec<u8> {
        let split = rtp_packet.len().min(RTP_HEADER_LEN);

        let mut out = Vec::with_capacity(rtp_packet.len() + AUTH_TAG_LEN);
        out.extend_from_slice(rtp_packet);
        self.apply_keystream(&mut out[split..]);

        let tag = self.auth_tag(&out);
        out.extend_from_slice(&tag);
        out
    }

    /// 길이 부족 / 태그 불일치 시 None — 호출자는 조용히 drop
    pub fn decrypt(&self, srtp_packet: &[u8]) -> Option<Vec<u8>> {
        if srtp_packet.len() < SRTP_MIN_LEN {
            return None;
        }

        let tag_start = srtp_packet.len() - AUTH_TAG_LEN;
        let (authenticated, received_tag) = srtp_packet.split_at(tag_start);

        // 태그 검증이 복호화보다 먼저 — 상수 시간 비교
        let mut mac = self.mac();
        mac.update(authenticated);
        mac.verify_truncated_left(received_tag).ok()?;

        let mut out = authenticated.to_vec();
        self.apply_keystream(&mut out[RTP_HEADER_LEN..]);
        Some(out)
    }

    /// CTR은 자기 자신의 역연산 — 암호화 / 복호화 공용
    fn apply_keystream(&self, payload: &mut [u8]) {
        let mut iv = [0u8; 16];
        iv[..12].copy_from_slice(&self.master_salt[..12]);
        let mut cipher = Aes128Ctr::new(&self.master_key.into(), &iv.into());
        cipher.apply_keystream(payload);
    }

    /// SHA1 20바이트 중 앞 10바이트 (80비트 truncation)
    fn auth_tag(&self, authenticated: &[u8]) -> [u8; AUTH_TAG_LEN] {
        let mut mac = self.mac();
        mac.update(authenticated);
        let full = mac.finalize().into_bytes();
        let mut tag = [0u8; AUTH_TAG_LEN];
        tag.copy_from_slice(&full[..AUTH_TAG_LEN]);
        tag
    }

    fn mac(&self) -> HmacSha1 {
        // HMAC은 임의 길이 키를 허용 — 실패 불가
        <HmacSha1 as Mac>::new_from_slice(&self.master_key).expect("HMAC 키 오류")
    }
}

// 키 material이 로그에 새지 않도록 Debug 수동 구현
impl std::fmt::Debug for SrtpContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SrtpContext")
            .field("suite", &CRYPTO_SUITE)
            .finish_non_exhaustive()
    }
}
