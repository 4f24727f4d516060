//! Running counters for one encoder stream
//!
//! With the `diagnostics` feature the counters serialize to JSON together
//! with the time the stream was created.

#[cfg(feature = "diagnostics")]
use serde::{Deserialize, Serialize};

/// Byte and call counters collected by a [`StreamEncoder`](crate::StreamEncoder)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "diagnostics", derive(Serialize, Deserialize))]
pub struct StreamStats {
    /// Bytes reported as accepted by `write`
    pub bytes_accepted: u64,
    /// Block-aligned bytes handed to the engine
    pub bytes_submitted: u64,
    /// Encoded bytes produced by encode and flush calls
    pub bytes_encoded: u64,
    /// Bytes the destination has accepted
    pub bytes_written: u64,
    /// Engine encode calls that succeeded
    pub encode_calls: u64,
    /// Engine flushes that produced output
    pub flushes: u64,
    /// Input bytes shorter than one sample block discarded at close
    pub dropped_bytes: u64,
    /// When the stream was created
    #[cfg(feature = "diagnostics")]
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl Default for StreamStats {
    fn default() -> Self {
        Self {
            bytes_accepted: 0,
            bytes_submitted: 0,
            bytes_encoded: 0,
            bytes_written: 0,
            encode_calls: 0,
            flushes: 0,
            dropped_bytes: 0,
            #[cfg(feature = "diagnostics")]
            started_at: chrono::Utc::now(),
        }
    }
}

impl StreamStats {
    /// Output bytes per accepted input byte, `None` before any input
    pub fn compression_ratio(&self) -> Option<f64> {
        if self.bytes_encoded == 0 {
            return None;
        }
        Some(self.bytes_accepted as f64 / self.bytes_encoded as f64)
    }

    /// Pretty-printed JSON snapshot
    #[cfg(feature = "diagnostics")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_ratio() {
        let mut stats = StreamStats::default();
        assert_eq!(stats.compression_ratio(), None);

        stats.bytes_accepted = 8192;
        stats.bytes_encoded = 512;
        assert_eq!(stats.compression_ratio(), Some(16.0));
    }

    #[cfg(feature = "diagnostics")]
    #[test]
    fn test_json_snapshot_contains_counters() {
        let stats = StreamStats {
            bytes_accepted: 42,
            ..StreamStats::default()
        };
        let json = stats.to_json().unwrap();
        assert!(json.contains("\"bytes_accepted\": 42"));
        assert!(json.contains("started_at"));
    }
}
