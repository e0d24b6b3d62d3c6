/// Refresh coordinator state machine.
///
/// State transitions:
/// ```text
/// idle → hardware_pending ─(debounce fires: refresh endpoints)─┐
///   ↑                                                          ↓
///   └──── session_pending ←──────(session signal enqueued)─────┘
///             ↑ immediate / lazy session signals, periodic tick
/// ```
/// A pending hardware refresh takes precedence when both debouncers are armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    HardwarePending,
    SessionPending,
}

impl RefreshState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// How soon a requested session refresh should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionUrgency {
    /// Direct notification or manual request: short debounce.
    Immediate,
    /// Failure-driven or periodic resync: heavily throttled.
    Lazy,
}

/// Signals consumed by the refresh coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshSignal {
    Hardware,
    Sessions(SessionUrgency),
}

/// Commands coming from the user interface or the OS shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    RefreshConfig,
    RefreshDevices,
    RefreshSessions,
    Quit,
}

/// Liveness of a native audio session as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionActivity {
    Active,
    Inactive,
    Expired,
}

impl SessionActivity {
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }
}
