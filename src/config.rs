use std::time::Duration;

#[derive(Clone)]
pub struct AppConfig {
    /// TTL applied to records pushed into the zones.
    pub record_ttl: u32,
    /// Deadline for each interaction with an authoritative nameserver.
    /// Timing out is a normal outcome, never a crash.
    pub dns_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            record_ttl: 300,
            dns_timeout: Duration::from_secs(5),
        }
    }
}
