// author: kodeholic (powered by Claude)
// RTP 패킷 인코딩 / 디코딩 모듈 (RFC 3550 고정 헤더 12바이트)
//
// 헤더 레이아웃:
//   byte0   : V(2) | P(1) | X(1) | CC(4)
//   byte1   : M(1) | PT(7)
//   byte2-3 : sequence  (BE u16)
//   byte4-7 : timestamp (BE u32)
//   byte8-11: SSRC      (BE u32)
//
// 디바이스와 주고받는 패킷은 CSRC / 확장 헤더를 쓰지 않으므로
// 항상 12바이트 고정 헤더만 다룹니다.

use bytes::BufMut;

pub const RTP_VERSION: u8 = 2;
pub const RTP_HEADER_LEN: usize = 12;

/// 파싱된 RTP 고정 헤더
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpHeader {
    pub version:      u8,
    pub padding:      bool,
    pub extension:    bool,
    pub csrc_count:   u8,
    pub marker:       bool,
    pub payload_type: u8,
    pub sequence:     u16,
    pub timestamp:    u32,
    pub ssrc:         u32,
}

/// 헤더 + payload 직렬화. 검증 없음, 실패하지 않음.
pub fn encode(
    payload:      &[u8],
    sequence:     u16,
    timestamp:    u32,
    ssrc:         u32,
    payload_type: u8,
    marker:       bool,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(RTP_HEADER_LEN + payload.len());
    // padding / extension / csrc_count 모두 0
    buf.put_u8(RTP_VERSION << 6);
    buf.put_u8(((marker as u8) << 7) | (payload_type & 0x7F));
    buf.put_u16(sequence);
    buf.put_u32(timestamp);
    buf.put_u32(ssrc);
    buf.put_slice(payload);
    buf
}

/// 12바이트 미만이면 None. version 검증은 호출자 책임.
pub fn decode(packet: &[u8]) -> Option<(RtpHeader, &[u8])> {
    if packet.len() < RTP_HEADER_LEN {
        return None;
    }

    let b0 = packet[0];
    let b1 = packet[1];
    let header = RtpHeader {
        version:      b0 >> 6,
        padding:      b0 & 0x20 != 0,
        extension:    b0 & 0x10 != 0,
        csrc_count:   b0 & 0x0F,
        marker:       b1 & 0x80 != 0,
        payload_type: b1 & 0x7F,
        sequence:     u16::from_be_bytes([packet[2], packet[3]]),
        timestamp:    u32::from_be_bytes([packet[4], packet[5], packet[6], packet[7]]),
        ssrc:         u32::from_be_bytes([packet[8], packet[9], packet[10], packet[11]]),
    };

    Some((header, &packet[RTP_HEADER_LEN..]))
}

// ----------------------------------------------------------------------------
// [RtpStreamState] — 방향당 1개, 송신 루프가 단독 소유
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RtpStreamState {
    pub ssrc:      u32,
    pub sequence:  u16,
    pub timestamp: u32,
}

impl RtpStreamState {
    pub fn new(ssrc: u32, sequence: u16, timestamp: u32) -> Self {
        Self { ssrc, sequence, timestamp }
    }

    /// 현재 상태로 패킷을 만든 뒤 sequence / timestamp 전진
    pub fn packetize(&mut self, payload: &[u8], payload_type: u8, samples_per_frame: u32) -> Vec<u8> {
        let packet = encode(payload, self.sequence, self.timestamp, self.ssrc, payload_type, false);
        self.advance(samples_per_frame);
        packet
    }

    /// sequence mod 2^16, timestamp mod 2^32
    pub fn advance(&mut self, samples_per_frame: u32) {
        self.sequence  = self.sequence.wrapping_add(1);
        self.timestamp = self.timestamp.wrapping_add(samples_per_frame);
    }
}
