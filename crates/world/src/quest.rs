//! Quests: objectives progressed by gameplay events, rewards on completion.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tileworld_core::item::ids;

use crate::{ItemStack, SkillKind};

/// Id of the quest the tutorial guide hands out.
pub const FIRST_STEPS: &str = "first_steps";

/// Gameplay event an objective listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveKind {
    Gather,
    Talk,
    Craft,
    Cook,
    Kill,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestObjective {
    pub id: String,
    pub description: String,
    pub kind: ObjectiveKind,
    /// Item id, NPC name or creature name the event must carry.
    pub target: String,
    pub current: u32,
    pub required: u32,
    pub completed: bool,
}

impl QuestObjective {
    pub fn new(
        id: &str,
        description: &str,
        kind: ObjectiveKind,
        target: &str,
        required: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            kind,
            target: target.to_string(),
            current: 0,
            required: required.max(1),
            completed: false,
        }
    }

    /// Add progress, saturating at `required`. Returns true when this call
    /// completed the objective.
    pub fn advance(&mut self, amount: u32) -> bool {
        if self.completed {
            return false;
        }
        self.current = self.current.saturating_add(amount).min(self.required);
        if self.current >= self.required {
            self.completed = true;
            return true;
        }
        false
    }

    fn matches(&self, kind: ObjectiveKind, target: &str) -> bool {
        self.kind == kind && self.target.eq_ignore_ascii_case(target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpReward {
    pub skill: SkillKind,
    pub amount: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestReward {
    pub xp: Vec<XpReward>,
    pub items: Vec<ItemStack>,
    pub gold: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestStatus {
    #[default]
    Available,
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub name: String,
    pub description: String,
    pub objectives: Vec<QuestObjective>,
    pub rewards: QuestReward,
    #[serde(default)]
    pub status: QuestStatus,
}

impl Quest {
    pub fn new(
        id: &str,
        name: &str,
        description: &str,
        objectives: Vec<QuestObjective>,
        rewards: QuestReward,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            objectives,
            rewards,
            status: QuestStatus::Available,
        }
    }

    /// All objectives done.
    pub fn is_complete(&self) -> bool {
        self.objectives.iter().all(|obj| obj.completed)
    }

    /// Completed objectives as a percentage.
    pub fn progress(&self) -> f64 {
        if self.objectives.is_empty() {
            return 100.0;
        }
        let done = self.objectives.iter().filter(|obj| obj.completed).count();
        done as f64 / self.objectives.len() as f64 * 100.0
    }

    /// Progress one objective by id. Returns true when it just completed.
    pub fn update_objective(&mut self, objective_id: &str, amount: u32) -> bool {
        self.objectives
            .iter_mut()
            .find(|obj| obj.id == objective_id)
            .is_some_and(|obj| obj.advance(amount))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestError {
    #[error("unknown quest '{0}'")]
    Unknown(String),
    #[error("quest '{0}' was already started")]
    AlreadyStarted(String),
    #[error("quest '{0}' is not active")]
    NotActive(String),
    #[error("quest '{0}' still has open objectives")]
    Incomplete(String),
}

/// An objective that moved because of a recorded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveProgress {
    pub quest: String,
    pub objective: String,
    pub current: u32,
    pub required: u32,
    pub completed: bool,
}

/// Every quest the player knows about, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestLog {
    quests: BTreeMap<String, Quest>,
}

impl QuestLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a quest definition. An existing quest with the same id keeps
    /// its progress.
    pub fn register(&mut self, quest: Quest) {
        self.quests.entry(quest.id.clone()).or_insert(quest);
    }

    pub fn get(&self, id: &str) -> Option<&Quest> {
        self.quests.get(id)
    }

    pub fn start(&mut self, id: &str) -> Result<(), QuestError> {
        let quest = self
            .quests
            .get_mut(id)
            .ok_or_else(|| QuestError::Unknown(id.to_string()))?;
        if quest.status != QuestStatus::Available {
            return Err(QuestError::AlreadyStarted(id.to_string()));
        }
        quest.status = QuestStatus::Active;
        Ok(())
    }

    pub fn update_objective(
        &mut self,
        quest_id: &str,
        objective_id: &str,
        amount: u32,
    ) -> Result<bool, QuestError> {
        let quest = self
            .quests
            .get_mut(quest_id)
            .ok_or_else(|| QuestError::Unknown(quest_id.to_string()))?;
        if quest.status != QuestStatus::Active {
            return Err(QuestError::NotActive(quest_id.to_string()));
        }
        Ok(quest.update_objective(objective_id, amount))
    }

    /// Feed a gameplay event to every active quest.
    pub fn record(
        &mut self,
        kind: ObjectiveKind,
        target: &str,
        amount: u32,
    ) -> Vec<ObjectiveProgress> {
        let mut moved = Vec::new();
        for quest in self.quests.values_mut() {
            if quest.status != QuestStatus::Active {
                continue;
            }
            for obj in quest.objectives.iter_mut() {
                if obj.completed || !obj.matches(kind, target) {
                    continue;
                }
                let completed = obj.advance(amount);
                moved.push(ObjectiveProgress {
                    quest: quest.id.clone(),
                    objective: obj.id.clone(),
                    current: obj.current,
                    required: obj.required,
                    completed,
                });
            }
        }
        moved
    }

    /// Active quests whose objectives are all done.
    pub fn ready_to_complete(&self) -> Vec<String> {
        self.active()
            .filter(|quest| quest.is_complete())
            .map(|quest| quest.id.clone())
            .collect()
    }

    /// Mark a finished quest completed and hand back its rewards.
    pub fn finish(&mut self, id: &str) -> Result<QuestReward, QuestError> {
        let quest = self
            .quests
            .get_mut(id)
            .ok_or_else(|| QuestError::Unknown(id.to_string()))?;
        if quest.status != QuestStatus::Active {
            return Err(QuestError::NotActive(id.to_string()));
        }
        if !quest.is_complete() {
            return Err(QuestError::Incomplete(id.to_string()));
        }
        quest.status = QuestStatus::Completed;
        Ok(quest.rewards.clone())
    }

    pub fn active(&self) -> impl Iterator<Item = &Quest> + '_ {
        self.quests
            .values()
            .filter(|quest| quest.status == QuestStatus::Active)
    }

    pub fn completed(&self) -> impl Iterator<Item = &Quest> + '_ {
        self.quests
            .values()
            .filter(|quest| quest.status == QuestStatus::Completed)
    }

    pub fn is_quest_complete(&self, id: &str) -> bool {
        self.quests.get(id).is_some_and(Quest::is_complete)
    }
}

/// Tutorial quest: meet the guide, cut timber, make a weapon, beat a goblin.
pub fn first_steps() -> Quest {
    Quest::new(
        FIRST_STEPS,
        "First Steps",
        "Learn the basics of survival from the Guide.",
        vec![
            QuestObjective::new(
                "talk_guide",
                "Speak with the Guide",
                ObjectiveKind::Talk,
                "Guide",
                1,
            ),
            QuestObjective::new(
                "gather_timber",
                "Chop 3 timber",
                ObjectiveKind::Gather,
                ids::TIMBER,
                3,
            ),
            QuestObjective::new(
                "craft_sword",
                "Craft a wooden sword",
                ObjectiveKind::Craft,
                ids::WOODEN_SWORD,
                1,
            ),
            QuestObjective::new("kill_goblin", "Defeat a goblin", ObjectiveKind::Kill, "Goblin", 1),
        ],
        QuestReward {
            xp: vec![
                XpReward {
                    skill: SkillKind::Woodcutting,
                    amount: 100,
                },
                XpReward {
                    skill: SkillKind::Combat,
                    amount: 100,
                },
            ],
            items: vec![ItemStack::of(ids::ARROWS, 10)],
            gold: 25,
        },
    )
}

/// Built-in quest definition by id.
pub fn quest_by_id(id: &str) -> Option<Quest> {
    match id {
        FIRST_STEPS => Some(first_steps()),
        _ => None,
    }
}
