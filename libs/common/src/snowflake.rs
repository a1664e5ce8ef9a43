use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Custom epoch: 2025-10-01T00:00:00Z in milliseconds since Unix epoch.
const FORUM_EPOCH_MS: u64 = 1_759_276_800_000;

const WORKER_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

#[derive(Default)]
struct Clock {
    last_ms: u64,
    sequence: u64,
}

/// 64-bit post ID generator.
///
/// Layout (MSB → LSB): 42 bits of milliseconds since the forum epoch,
/// 10 bits of worker ID, 12 bits of per-millisecond sequence.
///
/// A wall clock that steps backwards is absorbed by reusing the last
/// observed millisecond, so IDs stay strictly increasing per generator.
pub struct SnowflakeGenerator {
    worker_id: u64,
    clock: Mutex<Clock>,
}

impl SnowflakeGenerator {
    pub fn new(worker_id: u16) -> Self {
        assert!(
            u64::from(worker_id) < (1 << WORKER_BITS),
            "worker_id must fit in {WORKER_BITS} bits"
        );
        Self {
            worker_id: u64::from(worker_id),
            clock: Mutex::new(Clock::default()),
        }
    }

    pub fn generate(&self) -> i64 {
        let mut clock = self.clock.lock().unwrap_or_else(|e| e.into_inner());

        let mut now_ms = current_ms().max(clock.last_ms);

        if now_ms == clock.last_ms {
            clock.sequence = (clock.sequence + 1) & SEQUENCE_MASK;
            if clock.sequence == 0 {
                while now_ms <= clock.last_ms {
                    now_ms = current_ms();
                }
            }
        } else {
            clock.sequence = 0;
        }
        clock.last_ms = now_ms;

        let ts = now_ms.saturating_sub(FORUM_EPOCH_MS);
        ((ts << (WORKER_BITS + SEQUENCE_BITS)) | (self.worker_id << SEQUENCE_BITS) | clock.sequence)
            as i64
    }
}

fn current_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(FORUM_EPOCH_MS)
}

/// Milliseconds since the Unix epoch at which a post ID was minted.
pub fn snowflake_timestamp_ms(id: i64) -> u64 {
    ((id as u64) >> (WORKER_BITS + SEQUENCE_BITS)) + FORUM_EPOCH_MS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_and_increasing() {
        let gen = SnowflakeGenerator::new(3);
        let mut seen = HashSet::new();
        let mut prev = 0i64;
        for _ in 0..5_000 {
            let id = gen.generate();
            assert!(id > prev, "not increasing: {prev} >= {id}");
            assert!(seen.insert(id));
            prev = id;
        }
    }

    #[test]
    fn timestamp_is_recoverable() {
        let gen = SnowflakeGenerator::new(0);
        let before = current_ms();
        let id = gen.generate();
        let after = current_ms();
        let ts = snowflake_timestamp_ms(id);
        assert!(ts >= before && ts <= after, "ts={ts} before={before} after={after}");
    }

    #[test]
    fn worker_id_is_embedded() {
        let gen = SnowflakeGenerator::new(0x2A);
        let id = gen.generate() as u64;
        assert_eq!((id >> SEQUENCE_BITS) & ((1 << WORKER_BITS) - 1), 0x2A);
    }
}
