pub const DEFAULT_REDIRECTS_TABLE: &str = "shunt_redirects";
pub const DEFAULT_STATISTICS_TABLE: &str = "shunt_statistics";

/// Per-packet knobs of the redirect engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Interface the loopback shortcut re-injects into.
    pub loopback_ifindex: u32,
    /// Placeholder written into both Ethernet addresses before loopback
    /// delivery; the receiving side does not care.
    pub loopback_mac: [u8; 6],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            loopback_ifindex: 1,
            loopback_mac: [0; 6],
        }
    }
}
