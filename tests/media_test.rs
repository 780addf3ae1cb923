// author: kodeholic (powered by Claude)

use janus_relay::config;
use janus_relay::media::rtp::{self, RtpStreamState};
use janus_relay::media::srtp::{SrtpContext, AUTH_TAG_LEN, SRTP_MIN_LEN};

fn static_ctx() -> SrtpContext {
    SrtpContext::from_keying_material(&config::STATIC_SRTP_KEYING_MATERIAL).unwrap()
}

// ----------------------------------------------------------------------------
// [RTP]
// ----------------------------------------------------------------------------

#[test]
fn test_rtp_round_trip() {
    let cases: [(&[u8], u16, u32, u32, u8, bool); 4] = [
        (b"OPUSDATA", 1000, 5_000_000, 0x8765_4321, 111, false),
        (b"", 0, 0, 0, 0, false),
        (&[0xFF; 160], u16::MAX, u32::MAX, u32::MAX, 127, true),
        (&[0x00, 0x01], 42, 0x2C0, 0x1234_5678, 96, true),
    ];

    for (payload, seq, ts, ssrc, pt, marker) in cases {
        let packet = rtp::encode(payload, seq, ts, ssrc, pt, marker);
        let (hdr, body) = rtp::decode(&packet).expect("12바이트 이상이면 디코딩 성공해야 합니다.");
        assert_eq!(hdr.version, 2);
        assert_eq!((hdr.sequence, hdr.timestamp, hdr.ssrc), (seq, ts, ssrc));
        assert_eq!((hdr.payload_type, hdr.marker), (pt, marker));
        assert_eq!(body, payload);
    }
}

#[test]
fn test_rtp_header_first_bytes() {
    let packet = rtp::encode(b"OPUSDATA", 1000, 5_000_000, 0x8765_4321, 111, false);
    assert_eq!(&packet[..2], &[0x80, 0x6F]);
}

#[test]
fn test_sequence_wraps_after_65535() {
    let mut stream = RtpStreamState::new(config::LOCAL_SSRC, 0, 0);
    let mut seen = Vec::with_capacity(65_537);

    for _ in 0..65_537 {
        let packet = stream.packetize(b"x", 111, 320);
        seen.push(rtp::decode(&packet).unwrap().0.sequence);
    }

    assert_eq!(seen[0], 0);
    assert_eq!(seen[65_535], 65_535);
    assert_eq!(seen[65_536], 0, "65535 다음 시퀀스는 0 이어야 합니다.");
    assert!(seen.windows(2).all(|w| w[1] == w[0].wrapping_add(1)));
}

#[test]
fn test_timestamp_wraps_mod_2_32() {
    let mut stream = RtpStreamState::new(config::LOCAL_SSRC, 0, 0xFFFF_FFF0);
    stream.packetize(b"a", 111, 320);
    stream.packetize(b"b", 111, 320);
    assert_eq!(stream.timestamp, 0x2C0);
}

// ----------------------------------------------------------------------------
// [SRTP]
// ----------------------------------------------------------------------------

#[test]
fn test_srtp_round_trip() {
    let ctx    = static_ctx();
    let packet = rtp::encode(&[0x01, 0x02, 0x03, 0x04], 1000, 5_000_000, config::LOCAL_SSRC, 111, false);

    let protected = ctx.encrypt(&packet);
    assert_eq!(protected.len(), packet.len() + AUTH_TAG_LEN);
    assert_ne!(&protected[12..16], &packet[12..16], "payload는 암호화되어야 합니다.");

    assert_eq!(ctx.decrypt(&protected).unwrap(), packet);
}

#[test]
fn test_srtp_single_bit_tamper_rejected() {
    let ctx       = static_ctx();
    let packet    = rtp::encode(&[0x01, 0x02, 0x03, 0x04], 7, 640, config::LOCAL_SSRC, 111, false);
    let protected = ctx.encrypt(&packet);

    // 헤더 + 암호문 + 태그 전 구간
    for byte in 0..protected.len() {
        for bit in 0..8 {
            let mut tampered = protected.clone();
            tampered[byte] ^= 1 << bit;
            assert!(
                ctx.decrypt(&tampered).is_none(),
                "byte={} bit={} 변조가 검출되지 않았습니다.", byte, bit
            );
        }
    }
}

#[test]
fn test_srtp_short_input_rejected() {
    let ctx = static_ctx();
    for len in 0..SRTP_MIN_LEN {
        assert!(ctx.decrypt(&vec![0x80; len]).is_none(), "len={} 은 거부되어야 합니다.", len);
    }
}

#[test]
fn test_srtp_inline_key_shared_between_peers() {
    // offer 에 실린 inline 키로 만든 상대측 컨텍스트와 상호 복호화
    let local  = static_ctx();
    let remote = SrtpContext::from_inline_key(&local.inline_key()).unwrap();

    let packet = rtp::encode(b"hello device", 1, 2, 3, 111, false);
    assert_eq!(remote.decrypt(&local.encrypt(&packet)).unwrap(), packet);
    assert_eq!(local.decrypt(&remote.encrypt(&packet)).unwrap(), packet);
}
