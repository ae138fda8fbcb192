//! Room configuration
//!
//! Bind address and channel capacities. The binary fills `addr` from the
//! command line; everything else uses the defaults.

/// Default room address
pub const DEFAULT_ADDR: &str = "0.0.0.0:6000";

/// Join queue capacity (acceptor → coordinator)
///
/// Kept at one so the acceptor stalls while the coordinator is busy.
pub const JOIN_CAPACITY: usize = 1;

/// Event queue capacity (sessions → coordinator)
pub const EVENT_CAPACITY: usize = 256;

/// Longest line a client may send, terminator included
///
/// A client exceeding it is disconnected.
pub const MAX_LINE_LEN: usize = 8 * 1024;

/// Settings used when starting a `ChatRoom`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomConfig {
    /// Address the listener binds to
    pub addr: String,
    /// Capacity of the join queue
    pub join_capacity: usize,
    /// Capacity of the session event queue
    pub event_capacity: usize,
}

impl RoomConfig {
    /// Default configuration bound to `addr`
    pub fn with_addr(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ..Self::default()
        }
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            join_capacity: JOIN_CAPACITY,
            event_capacity: EVENT_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RoomConfig::default();
        assert_eq!(config.addr, DEFAULT_ADDR);
        assert_eq!(config.join_capacity, JOIN_CAPACITY);
        assert_eq!(config.event_capacity, EVENT_CAPACITY);
    }

    #[test]
    fn test_with_addr() {
        let config = RoomConfig::with_addr("127.0.0.1:0");
        assert_eq!(config.addr, "127.0.0.1:0");
        assert_eq!(config.event_capacity, EVENT_CAPACITY);
    }
}
