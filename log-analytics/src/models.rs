use std::fmt;

use crate::invariants::{ClientAddr, Endpoint, Timestamp, UserAgent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub ip: ClientAddr,
    pub timestamp: Timestamp,
    pub url: Endpoint,
    pub status: i32,
    pub user_agent: UserAgent,
}

/// Writes the record back in input column order.
impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.ip, self.timestamp, self.url, self.status, self.user_agent
        )
    }
}
