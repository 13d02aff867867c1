use crate::scripted_input::{ScriptedAction, ScriptedInputPlayer};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Instant;
use tileworld_testkit::{
    state_hash, EventRecord, ExecutionMetrics, GameplayMetrics, JsonlSink, MetricsReportBuilder,
    MetricsSink, WorldMetrics,
};
use tileworld_world::{DayPhase, FixedStep, SaveStore, SimConfig, SimEvent, Simulation};
use tracing::{debug, info, warn};

pub struct HeadlessConfig {
    pub sim: SimConfig,
    pub ticks: u64,
    pub tick_secs: f64,
    /// Frame delta fed to the tick accumulator.
    pub frame_secs: f64,
    pub scripted_input: Option<PathBuf>,
    pub events: Option<PathBuf>,
    pub metrics: Option<PathBuf>,
    pub save_dir: PathBuf,
    pub profile: String,
    pub no_save: bool,
    pub fresh: bool,
}

/// What a finished run looked like.
#[derive(Debug)]
pub struct RunSummary {
    pub gameplay: GameplayMetrics,
    pub state_hash: String,
    pub save_path: Option<PathBuf>,
}

pub fn run(cfg: HeadlessConfig) -> Result<RunSummary> {
    let started = Instant::now();
    let store = if cfg.no_save {
        None
    } else {
        Some(SaveStore::new(&cfg.save_dir)?)
    };

    let mut sim = match store.as_ref() {
        Some(store) if !cfg.fresh && store.exists(&cfg.profile) => {
            match store.load(&cfg.profile) {
                Ok(profile) => {
                    info!(profile = %cfg.profile, "Resuming saved profile");
                    Simulation::with_profile(cfg.sim.clone(), profile)
                }
                Err(err) => {
                    warn!(%err, profile = %cfg.profile, "Save unreadable, starting a new profile");
                    Simulation::new(cfg.sim.clone())
                }
            }
        }
        _ => Simulation::new(cfg.sim.clone()),
    };

    let mut script = cfg
        .scripted_input
        .as_deref()
        .map(|path| {
            ScriptedInputPlayer::from_path(path)
                .with_context(|| format!("failed to load scripted input {}", path.display()))
        })
        .transpose()?;

    let mut sink = cfg
        .events
        .as_deref()
        .map(|path| {
            JsonlSink::create(path)
                .with_context(|| format!("failed to create event log {}", path.display()))
        })
        .transpose()?;

    info!(
        seed = cfg.sim.seed,
        ticks = cfg.ticks,
        chunks = sim.resident_chunks(),
        nodes = sim.nodes().len(),
        "Headless run starting"
    );

    let frame_secs = if cfg.frame_secs > 0.0 {
        cfg.frame_secs
    } else {
        warn!(frame_secs = cfg.frame_secs, "frame_secs must be positive; using tick_secs");
        cfg.tick_secs
    };
    let mut stepper = FixedStep::new(cfg.tick_secs);
    let mut frames = 0u64;
    let mut gameplay = GameplayMetrics::default();
    let mut phase = sim.clock().phase();
    while gameplay.ticks < cfg.ticks {
        frames += 1;
        let due = u64::from(stepper.push(frame_secs)).min(cfg.ticks - gameplay.ticks);
        for _ in 0..due {
            run_tick(
                &mut sim,
                &mut gameplay,
                &mut phase,
                stepper.step(),
                script.as_mut(),
                sink.as_mut(),
            )?;
        }
    }
    gameplay.sim_seconds = sim.now();
    debug!(frames, pending = stepper.pending(), "tick loop done");
    if script.as_ref().is_some_and(|script| !script.finished()) {
        debug!("ticks ran out before the script finished");
    }

    if let Some(sink) = sink.as_mut() {
        sink.flush()?;
        info!(events = sink.written(), "Event log written");
    }

    let state_hash = state_hash(&(sim.profile(), sim.entity_snapshots()))?;
    let save_path = match store.as_ref() {
        Some(store) => Some(store.save(&cfg.profile, sim.profile())?),
        None => None,
    };

    if let Some(path) = cfg.metrics.as_deref() {
        let report = MetricsReportBuilder::new("headless", cfg.sim.seed)
            .world(WorldMetrics {
                chunks_resident: sim.resident_chunks(),
                resource_nodes: sim.nodes().len(),
                entities: sim.entities().count(),
            })
            .gameplay(gameplay.clone())
            .execution(ExecutionMetrics {
                duration_seconds: started.elapsed().as_secs_f64(),
                state_hash: Some(state_hash.clone()),
            })
            .build();
        MetricsSink::create(path)?.write(&report)?;
        info!(path = %path.display(), "Metrics written");
    }

    info!(
        ticks = gameplay.ticks,
        gathers = gameplay.gathers,
        kills = gameplay.kills,
        deaths = gameplay.deaths,
        %state_hash,
        "Headless run finished"
    );

    Ok(RunSummary {
        gameplay,
        state_hash,
        save_path,
    })
}

/// One fixed-step tick: scripted input, simulation step, event fan-out.
fn run_tick(
    sim: &mut Simulation,
    gameplay: &mut GameplayMetrics,
    phase: &mut DayPhase,
    tick_secs: f64,
    script: Option<&mut ScriptedInputPlayer>,
    mut sink: Option<&mut JsonlSink>,
) -> Result<()> {
    let ScriptedAction { intent, craft } = match script {
        Some(script) => script.advance(tick_secs),
        None => ScriptedAction::default(),
    };
    if let Some(recipe) = craft {
        if let Err(err) = sim.craft(&recipe) {
            let craftable: Vec<&str> = sim
                .recipes()
                .craftable(sim.profile())
                .map(|r| r.id.as_str())
                .collect();
            debug!(%err, %recipe, ?craftable, "scripted craft failed");
        }
    }
    sim.tick(tick_secs, &intent);
    gameplay.ticks += 1;

    let now_phase = sim.clock().phase();
    if now_phase != *phase {
        info!(
            from = ?phase,
            to = ?now_phase,
            clock = %sim.clock().clock_string(),
            "Day phase changed"
        );
        *phase = now_phase;
    }

    for event in sim.drain_events() {
        count_event(gameplay, &event);
        if let Some(sink) = sink.as_deref_mut() {
            sink.write(&EventRecord {
                tick: sim.tick_count(),
                kind: event.kind(),
                payload: &event,
            })?;
        }
    }
    Ok(())
}

fn count_event(gameplay: &mut GameplayMetrics, event: &SimEvent) {
    match event {
        SimEvent::Gathered(_) => gameplay.gathers += 1,
        SimEvent::GatherFailed { .. } => gameplay.gather_failures += 1,
        SimEvent::CreatureKilled { .. } => gameplay.kills += 1,
        SimEvent::PlayerDied { .. } => gameplay.deaths += 1,
        SimEvent::Crafted(_) => gameplay.crafts += 1,
        SimEvent::QuestCompleted(_) => gameplay.quests_completed += 1,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("tileworld_headless_{tag}_{nanos}"))
    }

    fn config(dir: &Path) -> HeadlessConfig {
        HeadlessConfig {
            sim: SimConfig::default(),
            ticks: 100,
            tick_secs: 0.05,
            frame_secs: 1.0 / 60.0,
            scripted_input: None,
            events: Some(dir.join("events.jsonl")),
            metrics: Some(dir.join("metrics.json")),
            save_dir: dir.join("saves"),
            profile: "runner".to_string(),
            no_save: false,
            fresh: false,
        }
    }

    #[test]
    fn idle_run_is_reproducible_and_saves() {
        let dir = temp_dir("idle");
        let first = run(HeadlessConfig {
            fresh: true,
            ..config(&dir)
        })
        .unwrap();
        let second = run(HeadlessConfig {
            fresh: true,
            ..config(&dir)
        })
        .unwrap();
        assert_eq!(first.state_hash, second.state_hash);
        assert_eq!(first.gameplay.ticks, 100);

        let save = first.save_path.expect("profile saved");
        assert!(save.exists());
        assert!(dir.join("metrics.json").exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn scripted_walk_moves_and_resumes() {
        let dir = temp_dir("script");
        fs::create_dir_all(&dir).unwrap();
        let script = dir.join("walk.json");
        fs::write(
            &script,
            r#"{"steps": [{"duration": 1.0, "move_x": 1.0}, {"duration": 1.0}]}"#,
        )
        .unwrap();

        run(HeadlessConfig {
            scripted_input: Some(script),
            fresh: true,
            ..config(&dir)
        })
        .unwrap();
        let store = SaveStore::new(dir.join("saves")).unwrap();
        let walked = store.load("runner").unwrap();
        assert!(walked.x > 5.0);

        // A second run without --fresh picks the save back up.
        let resumed = run(HeadlessConfig {
            ticks: 1,
            events: None,
            metrics: None,
            ..config(&dir)
        })
        .unwrap();
        assert_eq!(resumed.gameplay.ticks, 1);
        let after = store.load("runner").unwrap();
        assert_eq!(after.x, walked.x);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn frame_rate_does_not_change_the_outcome() {
        let dir = temp_dir("frames");
        fs::create_dir_all(&dir).unwrap();
        let script = dir.join("walk.json");
        fs::write(
            &script,
            r#"{"steps": [{"duration": 1.5, "move_x": 1.0, "move_y": 0.5}]}"#,
        )
        .unwrap();

        let mut hashes = Vec::new();
        for frame_secs in [1.0 / 144.0, 1.0 / 60.0, 0.05, 0.2] {
            let summary = run(HeadlessConfig {
                frame_secs,
                scripted_input: Some(script.clone()),
                no_save: true,
                events: None,
                metrics: None,
                ..config(&dir)
            })
            .unwrap();
            assert_eq!(summary.gameplay.ticks, 100, "frame_secs {frame_secs}");
            assert!((summary.gameplay.sim_seconds - 5.0).abs() < 1e-6);
            hashes.push(summary.state_hash);
        }
        assert!(hashes.windows(2).all(|pair| pair[0] == pair[1]), "{hashes:?}");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn no_save_leaves_nothing_behind() {
        let dir = temp_dir("nosave");
        let summary = run(HeadlessConfig {
            no_save: true,
            ticks: 5,
            events: None,
            metrics: None,
            ..config(&dir)
        })
        .unwrap();
        assert!(summary.save_path.is_none());
        assert!(!dir.join("saves").exists());
    }
}
