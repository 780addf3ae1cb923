// author: kodeholic (powered by Claude)
// SDP offer 생성 / answer 파싱 모듈
//
// 디바이스와는 DTLS 없이 정적 SRTP 키(a=crypto, SDES 형식)로만 합의합니다.
// webrtc-sdp 크레이트 대신 직접 조립 — 필요한 라인이 고정돼 있음.
//
// offer 구조:
//   - audio m= 라인 1개 (port 9, RTP/SAVPF, 협상 코덱 PT)
//   - a=crypto:1 AES_CM_128_HMAC_SHA1_80 inline:<base64(key‖salt)>
//   - 송신 SSRC 고정값 (a=ssrc)
//
// answer에서는 c= / m=audio 라인만 읽어 원격 RTP 주소를 결정합니다.
// answer가 알려준 포트와 실제 송신 대상(폴백 적용 후)은 따로 보관합니다.

use std::net::{SocketAddr, ToSocketAddrs};

use tracing::{info, warn};

use crate::audio::CodecSpec;
use crate::error::{RelayError, RelayResult};
use crate::media::srtp::{SrtpContext, CRYPTO_SUITE};

const WILDCARD_IP: &str = "0.0.0.0";
const CNAME: &str = "janus-relay";

/// 원격 RTP 송신 대상
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    pub ip:   String,
    pub port: u16,
}

impl RemoteEndpoint {
    /// 호스트명이면 DNS 조회, 첫 번째 IPv4 주소 우선
    pub fn socket_addr(&self) -> RelayResult<SocketAddr> {
        let addrs: Vec<SocketAddr> = (self.ip.as_str(), self.port).to_socket_addrs()?.collect();
        addrs
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| RelayError::Config(format!("cannot resolve {}:{}", self.ip, self.port)))
    }
}

/// answer 파싱 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdpAnswer {
    /// answer의 m=audio 포트 (폴백과 무관)
    pub media_port: u16,
    /// answer의 c= 주소, 없으면 "0.0.0.0"
    pub conn_ip:    String,
    /// 실제 RTP 송신 대상
    pub target:     RemoteEndpoint,
}

/// SDP offer 조립 (CRLF 구분)
pub fn build_sdp_offer(ctx: &SrtpContext, ssrc: u32, codec: &CodecSpec) -> String {
    let session_id = crate::utils::current_timestamp();
    let pt         = codec.payload_type;

    let mut sdp = String::new();

    // 세션 헤더
    sdp.push_str("v=0\r\n");
    sdp.push_str(&format!("o=janus {} 2 IN IP4 127.0.0.1\r\n", session_id));
    sdp.push_str("s=Janus Relay\r\n");
    sdp.push_str("t=0 0\r\n");
    sdp.push_str("a=group:BUNDLE 0\r\n");
    sdp.push_str("a=msid-semantic: WMS janus\r\n");

    // audio 섹션
    sdp.push_str(&format!("m=audio 9 RTP/SAVPF {}\r\n", pt));
    sdp.push_str("c=IN IP4 0.0.0.0\r\n");
    sdp.push_str("a=rtcp:9 IN IP4 0.0.0.0\r\n");
    sdp.push_str("a=mid:0\r\n");
    sdp.push_str("a=sendrecv\r\n");
    sdp.push_str("a=rtcp-mux\r\n");
    sdp.push_str(&format!("a=rtpmap:{}\r\n", codec.rtpmap()));
    sdp.push_str(&format!("a=rtcp-fb:{} transport-cc\r\n", pt));
    if let Some(fmtp) = codec.fmtp {
        sdp.push_str(&format!("a=fmtp:{} {}\r\n", pt, fmtp));
    }
    sdp.push_str(&format!("a=crypto:1 {} inline:{}\r\n", CRYPTO_SUITE, ctx.inline_key()));
    sdp.push_str(&format!("a=ssrc:{} cname:{}\r\n", ssrc, CNAME));
    sdp.push_str(&format!("a=ssrc:{} msid:janus audio0\r\n", ssrc));
    sdp.push_str(&format!("a=ssrc:{} mslabel:janus\r\n", ssrc));
    sdp.push_str(&format!("a=ssrc:{} label:audio0\r\n", ssrc));

    sdp
}

/// answer SDP → 원격 RTP 주소
///
/// - c=IN IP4 가 실제 주소면 target = (c= IP, m=audio 포트)
/// - c= 가 0.0.0.0 이거나 없으면 target = (게이트웨이 호스트, device_port) 폴백
///   디바이스가 게이트웨이와 같은 호스트에서 고정 포트를 쓴다는 가정
pub fn parse_sdp_answer(answer: &str, gateway_host: &str, device_port: u16) -> RelayResult<SdpAnswer> {
    let mut conn_ip: Option<String> = None;
    let mut audio_port: Option<u16> = None;

    for line in answer.lines() {
        let line = line.trim_end_matches('\r');

        if let Some(rest) = line.strip_prefix("c=IN IP4 ") {
            // 세션 레벨 / 미디어 레벨 중 마지막 값 사용
            if let Some(ip) = rest.split_whitespace().next() {
                conn_ip = Some(ip.split('/').next().unwrap_or(ip).to_string());
            }
        } else if let Some(rest) = line.strip_prefix("m=audio ") {
            let port = rest
                .split_whitespace()
                .next()
                .and_then(|p| p.parse::<u16>().ok())
                .ok_or_else(|| RelayError::Signaling(format!("malformed audio line: {}", line)))?;
            audio_port = Some(port);
        }
    }

    let port = audio_port
        .ok_or_else(|| RelayError::Signaling("answer has no m=audio section".to_string()))?;
    info!("[sdp] answer audio port={} conn_ip={:?}", port, conn_ip);

    let conn_ip = conn_ip.unwrap_or_else(|| WILDCARD_IP.to_string());
    let target = if conn_ip != WILDCARD_IP {
        if port == 0 {
            return Err(RelayError::Signaling("gateway rejected the audio stream (port 0)".to_string()));
        }
        RemoteEndpoint { ip: conn_ip.clone(), port }
    } else {
        warn!("[sdp] answer has no routable address, assuming device at {}:{} (fixed port fallback)",
            gateway_host, device_port);
        RemoteEndpoint { ip: gateway_host.to_string(), port: device_port }
    };

    Ok(SdpAnswer { media_port: port, conn_ip, target })
}

/// 게이트웨이 base URL에서 호스트 부분만 추출
pub fn gateway_host(gateway_url: &str) -> RelayResult<String> {
    let url = reqwest::Url::parse(gateway_url)
        .map_err(|e| RelayError::Config(format!("invalid gateway url {}: {}", gateway_url, e)))?;
    url.host_str()
        .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_string())
        .ok_or_else(|| RelayError::Config(format!("gateway url has no host: {}", gateway_url)))
}
