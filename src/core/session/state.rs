use std::fmt;

/// Lifecycle phase of the device session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No device selected
    Disconnected,
    /// Device selected; the port is opened per operation
    Connected,
    /// Console monitor task is pumping device output
    Monitoring,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Disconnected => write!(f, "Disconnected"),
            SessionPhase::Connected => write!(f, "Connected"),
            SessionPhase::Monitoring => write!(f, "Monitoring"),
        }
    }
}

/// What the front end may offer the user right now.
///
/// Derived from the phase plus the transient programming and
/// monitor-pending states, so every front end renders the same rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiAffordances {
    pub phase: SessionPhase,
    pub connect_enabled: bool,
    pub connect_label: &'static str,
    pub program_enabled: bool,
    pub monitor_enabled: bool,
    pub monitor_label: &'static str,
    pub monitor_active: bool,
}

impl UiAffordances {
    pub fn for_phase(phase: SessionPhase, programming: bool, monitor_pending: bool) -> Self {
        match phase {
            SessionPhase::Disconnected => Self {
                phase,
                connect_enabled: true,
                connect_label: "Connect",
                program_enabled: false,
                monitor_enabled: false,
                monitor_label: "Monitor",
                monitor_active: false,
            },
            SessionPhase::Connected => {
                let busy = programming || monitor_pending;
                Self {
                    phase,
                    connect_enabled: !busy,
                    connect_label: "Disconnect",
                    program_enabled: !busy,
                    monitor_enabled: !busy,
                    monitor_label: "Monitor",
                    monitor_active: false,
                }
            }
            SessionPhase::Monitoring => Self {
                phase,
                connect_enabled: true,
                connect_label: "Disconnect",
                program_enabled: false,
                monitor_enabled: true,
                monitor_label: "Stop monitor",
                monitor_active: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(SessionPhase::Disconnected.to_string(), "Disconnected");
        assert_eq!(SessionPhase::Connected.to_string(), "Connected");
        assert_eq!(SessionPhase::Monitoring.to_string(), "Monitoring");
    }

    #[test]
    fn test_disconnected_affordances() {
        let a = UiAffordances::for_phase(SessionPhase::Disconnected, false, false);
        assert!(a.connect_enabled);
        assert_eq!(a.connect_label, "Connect");
        assert!(!a.program_enabled);
        assert!(!a.monitor_enabled);
        assert!(!a.monitor_active);
    }

    #[test]
    fn test_connected_affordances() {
        let a = UiAffordances::for_phase(SessionPhase::Connected, false, false);
        assert!(a.connect_enabled);
        assert_eq!(a.connect_label, "Disconnect");
        assert!(a.program_enabled);
        assert!(a.monitor_enabled);
        assert_eq!(a.monitor_label, "Monitor");
        assert!(!a.monitor_active);
    }

    #[test]
    fn test_programming_disables_everything() {
        let a = UiAffordances::for_phase(SessionPhase::Connected, true, false);
        assert!(!a.connect_enabled);
        assert!(!a.program_enabled);
        assert!(!a.monitor_enabled);
    }

    #[test]
    fn test_monitor_pending_disables_everything() {
        let a = UiAffordances::for_phase(SessionPhase::Connected, false, true);
        assert!(!a.connect_enabled);
        assert!(!a.program_enabled);
        assert!(!a.monitor_enabled);
    }

    #[test]
    fn test_monitoring_affordances() {
        let a = UiAffordances::for_phase(SessionPhase::Monitoring, false, false);
        assert!(a.connect_enabled);
        assert_eq!(a.connect_label, "Disconnect");
        assert!(!a.program_enabled);
        assert!(a.monitor_enabled);
        assert_eq!(a.monitor_label, "Stop monitor");
        assert!(a.monitor_active);
    }
}
