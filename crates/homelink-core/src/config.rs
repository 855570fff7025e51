use std::time::Duration;

#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            read_timeout: Duration::from_millis(100),
        }
    }
}

/// Cadence and zone layout for the supervisor loop. Zone order defines the
/// wire zone-index digits.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    pub zones: Vec<String>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(800),
            settle_delay: Duration::from_secs(1),
            zones: vec!["zone1".to_string(), "zone2".to_string()],
        }
    }
}
