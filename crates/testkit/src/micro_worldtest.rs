//! Micro-worldtest harness for deterministic, tick-based replay checks.
//!
//! A micro-worldtest is intentionally small: it steps a tiny simulation for a
//! fixed number of ticks and snapshots selected state each tick. Running the
//! same scenario twice from the same seed must yield identical reports.

use crate::snapshot::{canonical_json, state_hash};
use anyhow::Result;
use serde::Serialize;
use tileworld_core::SimTick;

/// Configuration for a micro-worldtest.
#[derive(Debug, Clone)]
pub struct MicroWorldtestConfig {
    /// Human-readable name (written into the report).
    pub name: String,
    /// Number of ticks to step (report includes the initial snapshot at tick 0).
    pub ticks: u64,
}

/// Single snapshot frame captured at a given tick.
#[derive(Debug, Clone, Serialize)]
pub struct MicroWorldtestFrame<S> {
    /// Tick number.
    pub tick: u64,
    /// Snapshot payload.
    pub snapshot: S,
}

/// Every frame of one run.
#[derive(Debug, Clone, Serialize)]
pub struct MicroWorldtestReport<S> {
    /// Scenario name.
    pub name: String,
    /// Frames in tick order.
    pub frames: Vec<MicroWorldtestFrame<S>>,
}

impl<S: Serialize> MicroWorldtestReport<S> {
    /// Fingerprint of the whole report.
    pub fn hash(&self) -> Result<String> {
        state_hash(self)
    }
}

/// Run a micro-worldtest and return its report.
///
/// Captures the initial snapshot at tick 0, then steps `config.ticks` times,
/// capturing a snapshot after each step (so the report contains `ticks + 1` frames).
pub fn run_micro_worldtest<State, Snapshot, StepFn, SnapFn>(
    config: &MicroWorldtestConfig,
    mut state: State,
    mut step: StepFn,
    mut snapshot: SnapFn,
) -> MicroWorldtestReport<Snapshot>
where
    Snapshot: Serialize,
    StepFn: FnMut(SimTick, &mut State),
    SnapFn: FnMut(SimTick, &State) -> Snapshot,
{
    let mut frames = Vec::with_capacity(config.ticks as usize + 1);

    let mut tick = SimTick::ZERO;
    frames.push(MicroWorldtestFrame {
        tick: tick.0,
        snapshot: snapshot(tick, &state),
    });

    for _ in 0..config.ticks {
        step(tick, &mut state);
        tick = tick.advance(1);
        frames.push(MicroWorldtestFrame {
            tick: tick.0,
            snapshot: snapshot(tick, &state),
        });
    }

    MicroWorldtestReport {
        name: config.name.clone(),
        frames,
    }
}

/// Run the scenario twice from fresh state and fail on the first tick whose
/// snapshots differ.
pub fn assert_replay_matches<State, Snapshot, MakeFn, StepFn, SnapFn>(
    config: &MicroWorldtestConfig,
    mut make: MakeFn,
    mut step: StepFn,
    mut snapshot: SnapFn,
) -> Result<MicroWorldtestReport<Snapshot>>
where
    Snapshot: Serialize,
    MakeFn: FnMut() -> State,
    StepFn: FnMut(SimTick, &mut State),
    SnapFn: FnMut(SimTick, &State) -> Snapshot,
{
    let first = run_micro_worldtest(config, make(), &mut step, &mut snapshot);
    let second = run_micro_worldtest(config, make(), &mut step, &mut snapshot);

    for (a, b) in first.frames.iter().zip(&second.frames) {
        if canonical_json(&a.snapshot)? != canonical_json(&b.snapshot)? {
            anyhow::bail!("{}: replay diverged at tick {}", config.name, a.tick);
        }
    }
    Ok(first)
}
