//! Best-effort screen wake lock for the duration of a workout.
//!
//! Platforms revoke wake locks when the app loses focus or the screen
//! locks, sometimes without telling anyone. The coordinator therefore
//! re-requests the lock whenever the app comes back to the foreground and
//! on a fixed refresh interval. Failure never reaches the session: it is
//! logged and the workout carries on without the guarantee.
//!
//! Everything registered by [`WakeLockCoordinator::engage`] is removed by
//! [`WakeLockCoordinator::disengage`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::storage::WakeLockConfig;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WakeLockError {
    #[error("wake lock is not supported on this platform")]
    Unsupported,

    #[error("wake lock request denied: {0}")]
    Denied(String),

    #[error("wake lock release failed: {0}")]
    ReleaseFailed(String),
}

/// Platform capability that keeps the display awake.
pub trait WakeLockProvider {
    /// Request (or re-request) the lock. Providers replace any lock they
    /// already hold.
    fn request(&mut self) -> Result<(), WakeLockError>;

    fn release(&mut self) -> Result<(), WakeLockError>;
}

/// Provider for environments without the capability.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopWakeLock;

impl WakeLockProvider for NoopWakeLock {
    fn request(&mut self) -> Result<(), WakeLockError> {
        Err(WakeLockError::Unsupported)
    }

    fn release(&mut self) -> Result<(), WakeLockError> {
        Ok(())
    }
}

/// Foreground/background notifications delivered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleSignal {
    Visible,
    Hidden,
    Focus,
    Blur,
    PageShow,
    OrientationChange,
    Resume,
}

impl LifecycleSignal {
    pub const ALL: [LifecycleSignal; 7] = [
        LifecycleSignal::Visible,
        LifecycleSignal::Hidden,
        LifecycleSignal::Focus,
        LifecycleSignal::Blur,
        LifecycleSignal::PageShow,
        LifecycleSignal::OrientationChange,
        LifecycleSignal::Resume,
    ];

    /// Settle time before re-requesting, `None` when the signal does not
    /// warrant a request. Losing focus keeps the lock; the platform decides.
    pub fn reacquire_delay_ms(self) -> Option<u64> {
        match self {
            LifecycleSignal::Visible | LifecycleSignal::PageShow => Some(100),
            LifecycleSignal::Focus => Some(200),
            LifecycleSignal::OrientationChange => Some(300),
            LifecycleSignal::Resume => Some(0),
            LifecycleSignal::Hidden | LifecycleSignal::Blur => None,
        }
    }
}

pub struct WakeLockCoordinator {
    provider: Box<dyn WakeLockProvider>,
    enabled: bool,
    refresh_interval_ms: u64,
    listeners: BTreeSet<LifecycleSignal>,
    next_refresh_ms: Option<u64>,
    pending_reacquire_ms: Option<u64>,
    held: bool,
    acquisitions: u32,
    failures: u32,
}

impl std::fmt::Debug for WakeLockCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WakeLockCoordinator")
            .field("enabled", &self.enabled)
            .field("listeners", &self.listeners)
            .field("held", &self.held)
            .field("acquisitions", &self.acquisitions)
            .field("failures", &self.failures)
            .finish()
    }
}

impl WakeLockCoordinator {
    pub fn new(provider: Box<dyn WakeLockProvider>, config: &WakeLockConfig) -> Self {
        Self {
            provider,
            enabled: config.enabled,
            refresh_interval_ms: config.refresh_interval_secs.max(1).saturating_mul(1000),
            listeners: BTreeSet::new(),
            next_refresh_ms: None,
            pending_reacquire_ms: None,
            held: false,
            acquisitions: 0,
            failures: 0,
        }
    }

    pub fn disabled() -> Self {
        let config = WakeLockConfig {
            enabled: false,
            ..WakeLockConfig::default()
        };
        Self::new(Box::new(NoopWakeLock), &config)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_engaged(&self) -> bool {
        !self.listeners.is_empty()
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// True while a periodic refresh or a delayed re-request is scheduled.
    pub fn has_scheduled_work(&self) -> bool {
        self.next_refresh_ms.is_some() || self.pending_reacquire_ms.is_some()
    }

    pub fn acquisitions(&self) -> u32 {
        self.acquisitions
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Session start: request the lock, subscribe to lifecycle signals and
    /// schedule the periodic refresh.
    pub fn engage(&mut self, now_ms: u64) {
        if !self.enabled {
            debug!("wake lock disabled by configuration");
            return;
        }
        if self.is_engaged() {
            return;
        }
        self.listeners.extend(LifecycleSignal::ALL);
        self.acquire();
        self.next_refresh_ms = Some(now_ms.saturating_add(self.refresh_interval_ms));
    }

    /// Session end: drop every listener and schedule, release the lock.
    pub fn disengage(&mut self) {
        self.listeners.clear();
        self.next_refresh_ms = None;
        self.pending_reacquire_ms = None;
        if self.held {
            if let Err(e) = self.provider.release() {
                warn!(error = %e, "wake lock release failed");
            }
            self.held = false;
        }
    }

    pub fn handle_signal(&mut self, signal: LifecycleSignal, now_ms: u64) {
        if !self.listeners.contains(&signal) {
            debug!(?signal, "lifecycle signal without listener ignored");
            return;
        }
        match signal.reacquire_delay_ms() {
            Some(0) => self.acquire(),
            Some(delay) => {
                let due = now_ms.saturating_add(delay);
                self.pending_reacquire_ms = Some(match self.pending_reacquire_ms {
                    Some(existing) => existing.min(due),
                    None => due,
                });
            }
            None => debug!(?signal, "keeping wake lock while in background"),
        }
    }

    /// The platform revoked the lock on its own.
    pub fn notify_released(&mut self) {
        if self.held {
            info!("wake lock released by the system");
        }
        self.held = false;
    }

    /// Run delayed re-requests and the periodic refresh that are due.
    pub fn tick(&mut self, now_ms: u64) {
        if !self.is_engaged() {
            return;
        }
        let reacquire_due = self.pending_reacquire_ms.is_some_and(|due| due <= now_ms);
        let refresh_due = self.next_refresh_ms.is_some_and(|due| due <= now_ms);
        if reacquire_due {
            self.pending_reacquire_ms = None;
        }
        if refresh_due {
            self.next_refresh_ms = Some(now_ms.saturating_add(self.refresh_interval_ms));
        }
        if reacquire_due || refresh_due {
            self.acquire();
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn acquire(&mut self) {
        match self.provider.request() {
            Ok(()) => {
                self.held = true;
                self.acquisitions += 1;
            }
            Err(WakeLockError::Unsupported) => {
                self.held = false;
                self.failures += 1;
                debug!("wake lock unsupported, continuing without it");
            }
            Err(e) => {
                self.held = false;
                self.failures += 1;
                warn!(error = %e, "wake lock request failed");
            }
        }
    }
}

impl Drop for WakeLockCoordinator {
    fn drop(&mut self) {
        self.disengage();
    }
}
