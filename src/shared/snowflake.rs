//! Snowflake ID Generator
//!
//! Twitter-style distributed unique ID generation. Room and message ids are
//! snowflakes, so ids minted by one generator sort by creation time.

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Default epoch (2024-01-01T00:00:00.000Z)
pub const DEFAULT_EPOCH: u64 = 1_704_067_200_000;

const SEQUENCE_MASK: u64 = 0xFFF;

/// Snowflake ID generator
pub struct SnowflakeGenerator {
    epoch: u64,
    machine_id: u64,
    /// (last timestamp, sequence within that millisecond)
    state: Mutex<(u64, u64)>,
}

impl SnowflakeGenerator {
    /// Create a new snowflake generator
    pub fn new(machine_id: u64, epoch: u64) -> Self {
        Self {
            epoch,
            machine_id: machine_id & 0x3FF, // 10 bits
            state: Mutex::new((0, 0)),
        }
    }

    /// Generate a new snowflake ID
    pub fn generate(&self) -> i64 {
        let mut state = self.state.lock();
        let mut timestamp = current_timestamp().max(state.0);

        if timestamp == state.0 {
            state.1 = (state.1 + 1) & SEQUENCE_MASK;
            if state.1 == 0 {
                // Sequence exhausted for this millisecond; borrow the next one.
                timestamp += 1;
            }
        } else {
            state.1 = 0;
        }
        state.0 = timestamp;

        let id = ((timestamp.saturating_sub(self.epoch)) << 22) | (self.machine_id << 12) | state.1;
        id as i64
    }

    /// Extract the millisecond timestamp from a snowflake ID
    pub fn extract_timestamp(&self, snowflake: i64) -> u64 {
        ((snowflake as u64) >> 22) + self.epoch
    }
}

impl Default for SnowflakeGenerator {
    fn default() -> Self {
        Self::new(1, DEFAULT_EPOCH)
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_generate_unique() {
        let gen = SnowflakeGenerator::default();
        let id1 = gen.generate();
        let id2 = gen.generate();
        assert_ne!(id1, id2);
        assert!(id2 > id1);
    }

    #[test]
    fn test_extract_timestamp() {
        let gen = SnowflakeGenerator::default();
        let id = gen.generate();
        let ts = gen.extract_timestamp(id);
        let now = current_timestamp();
        assert!(ts <= now + 5);
        assert!(ts > now - 1000); // Within 1 second
    }

    #[test]
    fn test_unique_across_threads() {
        let gen = Arc::new(SnowflakeGenerator::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gen = gen.clone();
                std::thread::spawn(move || (0..5000).map(|_| gen.generate()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate snowflake {}", id);
            }
        }
    }
}
