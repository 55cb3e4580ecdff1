//! End-to-end recovery scenarios
//!
//! Tests that verify the complete write/damage/read cycle:
//! - Clean images read back record for record
//! - Garbage between records is skipped without losing records
//! - Damaged and truncated records are dropped, their neighbours survive
//! - Recovered objects carry exactly the state that was written

use std::collections::HashMap;

use logobj_core::{ObjError, ObjResult, SyslogTime};
use logobj_runtime::{ObjConfig, ObjRuntime};
use logobj_wire::{DeserializeStats, MemStrm};

use crate::chaos::{ChaosConfig, ChaosInjector, ChaosStats, RecordFate};
use crate::classes::{sample_runtime, QueueState, QUEUE_CLASS};

// ============================================================================
// SAMPLE DATA
// ============================================================================

/// Deterministic queue state number `i`
pub fn sample_queue(i: usize) -> QueueState {
    let mut queue = QueueState::new(&format!("queue-{i}"));
    queue.size = i as i64 * 1000 - 500;
    queue.max_size = 10_000 + i as i32;
    queue.discard_severity = (i % 8) as i16;
    if i % 2 == 0 {
        queue.last_enqueue = Some(SyslogTime {
            time_type: 2,
            year: 2008,
            month: 1 + (i % 12) as i32,
            day: 1 + (i % 28) as i32,
            hour: (i % 24) as i32,
            minute: (i % 60) as i32,
            second: (i % 60) as i32,
            secfrac: i as i32,
            secfrac_precision: 6,
            offset_mode: if i % 4 == 0 { b'+' } else { b'-' },
            offset_hour: (i % 12) as i32,
            offset_minute: 30,
        });
    }
    if i % 3 == 0 {
        queue.spool_dir = Some(format!("/var/spool/q{i}").into());
    }
    queue
}

// ============================================================================
// SCENARIO
// ============================================================================

/// Recovery scenario configuration
#[derive(Clone, Debug)]
pub struct RecoveryScenario {
    /// Records written
    pub records: usize,
    pub chaos: ChaosConfig,
    pub seed: u64,
}

impl Default for RecoveryScenario {
    fn default() -> Self {
        Self {
            records: 100,
            chaos: ChaosConfig::default(),
            seed: 12345,
        }
    }
}

impl RecoveryScenario {
    pub fn clean() -> Self {
        Self {
            chaos: ChaosConfig::clean(),
            ..Self::default()
        }
    }

    pub fn noisy() -> Self {
        Self {
            chaos: ChaosConfig::noisy(),
            ..Self::default()
        }
    }

    pub fn hostile() -> Self {
        Self {
            records: 300,
            chaos: ChaosConfig::hostile(),
            ..Self::default()
        }
    }
}

/// Recovery scenario result
#[derive(Clone, Debug, Default)]
pub struct RecoveryResult {
    pub written: usize,
    /// Written records left intact by the injector
    pub readable: usize,
    pub truncated: usize,
    /// Objects read back whose state matches what was written
    pub recovered: usize,
    /// Objects read back with state that was never written
    pub mismatched: usize,
    /// Read calls that failed past the header
    pub failures: u64,
    pub reader: DeserializeStats,
    pub chaos: ChaosStats,
}

impl RecoveryResult {
    /// Every intact record came back, nothing else did
    pub fn lossless(&self) -> bool {
        self.mismatched == 0 && self.recovered == self.readable
    }

    /// A truncated record can take at most the record after it down too
    pub fn within_loss_bound(&self) -> bool {
        self.mismatched == 0
            && self.recovered <= self.readable
            && self.recovered + self.truncated >= self.readable
    }
}

/// Writes a corrupted image and reads it back
pub struct RecoveryHarness {
    runtime: ObjRuntime,
}

impl RecoveryHarness {
    pub fn new() -> ObjResult<Self> {
        Ok(Self {
            runtime: sample_runtime(ObjConfig::default())?,
        })
    }

    pub fn runtime(&self) -> &ObjRuntime {
        &self.runtime
    }

    /// Serialize `count` sample queues, each through the injector
    pub fn write_image(
        &self,
        scenario: &RecoveryScenario,
    ) -> ObjResult<(Vec<u8>, Vec<RecordFate>, ChaosStats)> {
        let mut injector = ChaosInjector::new(scenario.chaos.clone(), scenario.seed);
        let mut image = Vec::new();
        let mut fates = Vec::with_capacity(scenario.records);

        for i in 0..scenario.records {
            let queue = sample_queue(i);
            let mut strm = MemStrm::new();
            self.runtime.serialize(&mut strm, &queue)?;
            fates.push(injector.push_record(&mut image, strm.as_bytes()));
        }

        Ok((image, fates, injector.stats().clone()))
    }

    pub fn run(&self, scenario: &RecoveryScenario) -> ObjResult<RecoveryResult> {
        let (image, fates, chaos) = self.write_image(scenario)?;
        let expected: HashMap<String, QueueState> = (0..scenario.records)
            .map(|i| {
                let queue = sample_queue(i);
                (queue.name.clone(), queue)
            })
            .collect();

        let mut result = RecoveryResult {
            written: scenario.records,
            readable: fates.iter().filter(|f| f.readable()).count(),
            truncated: fates.iter().filter(|f| **f == RecordFate::Truncated).count(),
            chaos,
            ..RecoveryResult::default()
        };

        let mut strm = MemStrm::from_bytes(&image);
        let mut de = self.runtime.deserializer(&mut strm);
        while !de.is_exhausted()? {
            match de.deserialize(QUEUE_CLASS, None) {
                Ok(obj) => {
                    let matches = obj
                        .downcast_ref::<QueueState>()
                        .and_then(|queue| expected.get(&queue.name).map(|e| e.same_wire_state(queue)))
                        .unwrap_or(false);
                    if matches {
                        result.recovered += 1;
                    } else {
                        result.mismatched += 1;
                    }
                    self.runtime.destroy(obj)?;
                }
                Err(ObjError::EndOfStream) => break,
                Err(e) => {
                    tracing::debug!("record dropped: {}", e);
                    result.failures += 1;
                }
            }
        }
        result.reader = de.stats();

        Ok(result)
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

pub fn scenario_clean_stream() -> ObjResult<RecoveryResult> {
    RecoveryHarness::new()?.run(&RecoveryScenario::clean())
}

pub fn scenario_garbage_between_records() -> ObjResult<RecoveryResult> {
    RecoveryHarness::new()?.run(&RecoveryScenario::noisy())
}

pub fn scenario_hostile_stream() -> ObjResult<RecoveryResult> {
    RecoveryHarness::new()?.run(&RecoveryScenario::hostile())
}
