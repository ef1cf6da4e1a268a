//! Connectivity monitor.
//!
//! Tracks a single online/offline level and turns host events into edges.
//! The monitor never polls: the initial level comes from a
//! [`ConnectivityProbe`], every later change from an explicit event.

use std::sync::atomic::{AtomicBool, Ordering};

/// Present-state connectivity query provided by the host environment.
pub trait ConnectivityProbe: Send + Sync {
    /// Returns true if the host currently believes it is online.
    fn is_online(&self) -> bool;
}

impl<F> ConnectivityProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_online(&self) -> bool {
        self()
    }
}

/// A probe that always reports the same level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticProbe(pub bool);

impl StaticProbe {
    /// A probe reporting online.
    pub const ONLINE: StaticProbe = StaticProbe(true);
    /// A probe reporting offline.
    pub const OFFLINE: StaticProbe = StaticProbe(false);
}

impl ConnectivityProbe for StaticProbe {
    fn is_online(&self) -> bool {
        self.0
    }
}

/// Connectivity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// The remote store is believed reachable.
    Online,
    /// The remote store is believed unreachable.
    Offline,
}

impl Connectivity {
    fn from_online(online: bool) -> Self {
        if online {
            Connectivity::Online
        } else {
            Connectivity::Offline
        }
    }
}

/// A transition between connectivity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEdge {
    /// `Offline → Online`.
    WentOnline,
    /// `Online → Offline`.
    WentOffline,
}

/// Two-state connectivity machine.
///
/// Each real transition yields exactly one edge, even when events race:
/// the level is swapped atomically and only the caller that observed the
/// old level gets the edge.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    online: AtomicBool,
}

impl ConnectivityMonitor {
    /// Creates a monitor seeded from the host's present state.
    pub fn new<P: ConnectivityProbe + ?Sized>(probe: &P) -> Self {
        Self::with_state(probe.is_online())
    }

    /// Creates a monitor with a known initial level.
    pub fn with_state(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    /// Returns the current level.
    pub fn state(&self) -> Connectivity {
        Connectivity::from_online(self.is_online())
    }

    /// Returns true if online.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Applies a host event and returns the edge it caused, if any.
    ///
    /// Re-entrant events (`online` while already online) return `None`.
    pub fn observe(&self, online: bool) -> Option<ConnectivityEdge> {
        let was_online = self.online.swap(online, Ordering::SeqCst);
        match (was_online, online) {
            (false, true) => Some(ConnectivityEdge::WentOnline),
            (true, false) => Some(ConnectivityEdge::WentOffline),
            _ => None,
        }
    }
}
