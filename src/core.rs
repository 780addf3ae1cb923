// author: kodeholic (powered by Claude)
// 네트워크 / 장치 로직과 분리된 릴레이 공유 상태 모듈입니다.
//
// 두 루프와 supervisor가 Arc로 공유하며, 핫패스에서는 락 없이 atomic만 사용합니다.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{info, trace};

use crate::utils::current_timestamp;

// ----------------------------------------------------------------------------
// [RelayState] — 실행 플래그
// ----------------------------------------------------------------------------

pub struct RelayState {
    running:    AtomicBool,
    started_at: u64,
    pub stats:  RelayStats,
}

impl RelayState {
    pub fn new() -> Self {
        trace!("Initializing RelayState");
        Self {
            running:    AtomicBool::new(true),
            started_at: current_timestamp(),
            stats:      RelayStats::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// 멱등. 플래그만 내리므로 시그널 핸들러에서 호출해도 안전.
    /// 처음 내린 호출이면 true
    pub fn stop(&self) -> bool {
        self.running.swap(false, Ordering::AcqRel)
    }

    /// 루프가 지속 장애로 스스로 종료할 때 supervisor에 셧다운을 요청
    pub fn request_shutdown(&self, reason: &str) {
        if self.stop() {
            info!("[relay] shutdown requested: {}", reason);
        }
    }

    pub fn uptime_ms(&self) -> u64 {
        current_timestamp().saturating_sub(self.started_at)
    }
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------------
// [RelayStats] — 루프별 카운터
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RelayStats {
    pub packets_sent:     AtomicU64,
    pub packets_received: AtomicU64,
    pub auth_failures:    AtomicU64,
    pub codec_errors:     AtomicU64,
    pub transport_errors: AtomicU64,
    pub device_errors:    AtomicU64,
    pub discarded:        AtomicU64,
}

/// 특정 시점의 카운터 값
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub packets_sent:     u64,
    pub packets_received: u64,
    pub auth_failures:    u64,
    pub codec_errors:     u64,
    pub transport_errors: u64,
    pub device_errors:    u64,
    pub discarded:        u64,
}

impl RelayStats {
    #[inline]
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            packets_sent:     self.packets_sent.load(Ordering::Relaxed),
            packets_received: self.packets_received.load(Ordering::Relaxed),
            auth_failures:    self.auth_failures.load(Ordering::Relaxed),
            codec_errors:     self.codec_errors.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            device_errors:    self.device_errors.load(Ordering::Relaxed),
            discarded:        self.discarded.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "sent={} recv={} auth_fail={} codec_err={} transport_err={} device_err={} discarded={}",
            self.packets_sent, self.packets_received, self.auth_failures,
            self.codec_errors, self.transport_errors, self.device_errors, self.discarded,
        )
    }
}
