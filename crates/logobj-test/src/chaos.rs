//! Corruption injection for record streams
//!
//! Simulates what a crashed or partially overwritten disk queue looks like:
//! - Garbage between records
//! - Records whose header was damaged
//! - Records cut off mid-way

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use logobj_wire::COOKIE_OBJLINE;

/// Corruption configuration
#[derive(Clone, Debug)]
pub struct ChaosConfig {
    /// Probability of garbage after a record (0.0 - 1.0)
    pub garbage_prob: f64,
    /// Garbage length range (inclusive)
    pub garbage_len: (usize, usize),
    /// Probability a record's header is damaged
    pub header_damage_prob: f64,
    /// Probability a record is cut short
    pub truncate_prob: f64,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        ChaosConfig {
            garbage_prob: 0.2,
            garbage_len: (1, 64),
            header_damage_prob: 0.0,
            truncate_prob: 0.0,
        }
    }
}

impl ChaosConfig {
    /// Clean image, nothing injected
    pub fn clean() -> Self {
        ChaosConfig {
            garbage_prob: 0.0,
            garbage_len: (1, 1),
            header_damage_prob: 0.0,
            truncate_prob: 0.0,
        }
    }

    /// Garbage only; every record survives
    pub fn noisy() -> Self {
        ChaosConfig {
            garbage_prob: 0.5,
            garbage_len: (1, 256),
            header_damage_prob: 0.0,
            truncate_prob: 0.0,
        }
    }

    /// Garbage plus damaged and truncated records
    pub fn hostile() -> Self {
        ChaosConfig {
            garbage_prob: 0.5,
            garbage_len: (1, 256),
            header_damage_prob: 0.1,
            truncate_prob: 0.1,
        }
    }
}

/// What happened to one record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordFate {
    Intact,
    HeaderDamaged,
    Truncated,
}

impl RecordFate {
    /// Whether a reader can get this record back
    pub fn readable(self) -> bool {
        self == RecordFate::Intact
    }
}

/// Injection statistics
#[derive(Clone, Debug, Default)]
pub struct ChaosStats {
    pub records: u64,
    pub garbage_runs: u64,
    pub garbage_bytes: u64,
    pub headers_damaged: u64,
    pub truncated: u64,
}

/// Builds corrupted stream images from clean records
pub struct ChaosInjector {
    config: ChaosConfig,
    rng: StdRng,
    stats: ChaosStats,
}

impl ChaosInjector {
    /// Create an injector with seed
    pub fn new(config: ChaosConfig, seed: u64) -> Self {
        ChaosInjector {
            config,
            rng: StdRng::seed_from_u64(seed),
            stats: ChaosStats::default(),
        }
    }

    /// Random bytes that never contain a header cookie and end with a
    /// newline, so the record following them stays findable
    pub fn garbage(&mut self, len: usize) -> Vec<u8> {
        let len = len.max(1);
        let mut out = Vec::with_capacity(len);
        for _ in 1..len {
            let b = loop {
                let b: u8 = self.rng.gen();
                if b != COOKIE_OBJLINE {
                    break b;
                }
            };
            out.push(b);
        }
        out.push(b'\n');
        out
    }

    /// Damage the header so it can no longer parse. Bytes 5 and 6 hold the
    /// serializer version and its delimiter.
    fn damage_header(&mut self, record: &mut [u8]) {
        let pos = self.rng.gen_range(1..=6).min(record.len().saturating_sub(1));
        record[pos] = match record[pos] {
            b'X' => b'Y',
            _ => b'X',
        };
    }

    /// Append `record` to `image`, possibly damaged, possibly followed by
    /// garbage
    pub fn push_record(&mut self, image: &mut Vec<u8>, record: &[u8]) -> RecordFate {
        self.stats.records += 1;
        let mut record = record.to_vec();

        // Truncation keeps the header line and cuts inside the body
        let header_end = record.iter().position(|&b| b == b'\n').map_or(0, |p| p + 1);
        let fate = if self.rng.gen::<f64>() < self.config.header_damage_prob {
            self.damage_header(&mut record);
            self.stats.headers_damaged += 1;
            RecordFate::HeaderDamaged
        } else if self.rng.gen::<f64>() < self.config.truncate_prob
            && header_end > 0
            && record.len() > header_end + 1
        {
            let cut = self.rng.gen_range(header_end..record.len() - 1);
            record.truncate(cut);
            // Whatever follows must start on a fresh line
            record.push(b'\n');
            self.stats.truncated += 1;
            RecordFate::Truncated
        } else {
            RecordFate::Intact
        };
        image.extend_from_slice(&record);

        if self.rng.gen::<f64>() < self.config.garbage_prob {
            let (min, max) = self.config.garbage_len;
            let len = self.rng.gen_range(min..=max);
            let garbage = self.garbage(len);
            self.stats.garbage_runs += 1;
            self.stats.garbage_bytes += garbage.len() as u64;
            image.extend_from_slice(&garbage);
        }

        fate
    }

    /// Get current statistics
    pub fn stats(&self) -> &ChaosStats {
        &self.stats
    }
}
