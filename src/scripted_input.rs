use serde::Deserialize;
use std::{fs, path::Path};
use tileworld_world::{Intent, MoveTarget};

#[derive(Debug, Deserialize)]
struct ScriptedInputFile {
    steps: Vec<ScriptedStep>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct ScriptedStep {
    duration: f64,
    #[serde(default)]
    move_x: f64,
    #[serde(default)]
    move_y: f64,
    /// Issued once, on the first tick of the step.
    #[serde(default)]
    target: Option<MoveTarget>,
    #[serde(default)]
    harvest: bool,
    #[serde(default)]
    interact: bool,
    /// Recipe to craft once, on the first tick of the step.
    #[serde(default)]
    craft: Option<String>,
}

/// What the runner should do this tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptedAction {
    pub intent: Intent,
    pub craft: Option<String>,
}

pub struct ScriptedInputPlayer {
    steps: Vec<ScriptedStep>,
    index: usize,
    time_in_step: f64,
    entered: bool,
}

impl ScriptedInputPlayer {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> anyhow::Result<Self> {
        let file: ScriptedInputFile = serde_json::from_str(contents)?;
        if file.steps.is_empty() {
            anyhow::bail!("scripted input file contains no steps");
        }
        Ok(Self {
            steps: file.steps,
            index: 0,
            time_in_step: 0.0,
            entered: false,
        })
    }

    /// Whether the last step has been reached and run out.
    pub fn finished(&self) -> bool {
        self.index + 1 == self.steps.len()
            && self.time_in_step >= self.steps[self.index].duration
    }

    pub fn advance(&mut self, dt: f64) -> ScriptedAction {
        if self.steps.is_empty() {
            return ScriptedAction::default();
        }

        let first_tick = !self.entered;
        self.entered = true;
        let step = self.steps[self.index].clone();
        let action = step.into_action(first_tick);

        self.time_in_step += dt;
        while self.time_in_step >= self.steps[self.index].duration
            && self.index + 1 < self.steps.len()
        {
            self.time_in_step -= self.steps[self.index].duration;
            self.index += 1;
            self.entered = false;
        }

        action
    }
}

impl ScriptedStep {
    fn into_action(self, first_tick: bool) -> ScriptedAction {
        ScriptedAction {
            intent: Intent {
                dx: self.move_x,
                dy: self.move_y,
                target: self.target.filter(|_| first_tick),
                harvest_nearest: self.harvest,
                interact: self.interact && first_tick,
            },
            craft: self.craft.filter(|_| first_tick),
        }
    }
}
