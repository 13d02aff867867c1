//! Skill levels and the shared XP curve.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Highest reachable skill level.
pub const MAX_SKILL_LEVEL: u8 = 99;

/// Total XP needed to *be* at `level`.
///
/// `floor(sum_{i=1}^{level-1} floor(i + 300 * 2^(i/7)) / 4)`; levels 0 and 1
/// need nothing.
pub fn xp_for_level(level: u8) -> u64 {
    let mut total = 0u64;
    for i in 1..u32::from(level) {
        let i = f64::from(i);
        total += (i + 300.0 * 2f64.powf(i / 7.0)).floor() as u64;
    }
    total / 4
}

/// Disciplines tracked on every profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillKind {
    Woodcutting,
    Mining,
    Fishing,
    Combat,
    Cooking,
}

impl SkillKind {
    pub const ALL: [SkillKind; 5] = [
        SkillKind::Woodcutting,
        SkillKind::Mining,
        SkillKind::Fishing,
        SkillKind::Combat,
        SkillKind::Cooking,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SkillKind::Woodcutting => "woodcutting",
            SkillKind::Mining => "mining",
            SkillKind::Fishing => "fishing",
            SkillKind::Combat => "combat",
            SkillKind::Cooking => "cooking",
        }
    }
}

impl fmt::Display for SkillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkillKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown skill '{s}'"))
    }
}

/// One skill's level and lifetime XP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: SkillKind,
    pub level: u8,
    pub experience: u64,
}

impl Skill {
    pub fn new(name: SkillKind) -> Self {
        Self {
            name,
            level: 1,
            experience: 0,
        }
    }

    /// Add XP and apply every level-up it pays for. Returns levels gained.
    pub fn add_xp(&mut self, amount: u64) -> u8 {
        self.experience = self.experience.saturating_add(amount);
        let start = self.level;
        while self.level < MAX_SKILL_LEVEL && self.experience >= xp_for_level(self.level + 1) {
            self.level += 1;
        }
        self.level - start
    }

    /// XP still missing for the next level; zero at the cap.
    pub fn xp_to_next_level(&self) -> u64 {
        if self.level >= MAX_SKILL_LEVEL {
            return 0;
        }
        xp_for_level(self.level + 1).saturating_sub(self.experience)
    }

    /// Fraction of the way through the current level, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.level >= MAX_SKILL_LEVEL {
            return 1.0;
        }
        let current = xp_for_level(self.level);
        let next = xp_for_level(self.level + 1);
        let into = self.experience.saturating_sub(current) as f64;
        (into / (next - current) as f64).clamp(0.0, 1.0)
    }
}

/// The five skills every profile carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    pub woodcutting: Skill,
    pub mining: Skill,
    pub fishing: Skill,
    pub combat: Skill,
    pub cooking: Skill,
}

impl Default for Skills {
    fn default() -> Self {
        Self {
            woodcutting: Skill::new(SkillKind::Woodcutting),
            mining: Skill::new(SkillKind::Mining),
            fishing: Skill::new(SkillKind::Fishing),
            combat: Skill::new(SkillKind::Combat),
            cooking: Skill::new(SkillKind::Cooking),
        }
    }
}

impl Skills {
    pub fn get(&self, kind: SkillKind) -> &Skill {
        match kind {
            SkillKind::Woodcutting => &self.woodcutting,
            SkillKind::Mining => &self.mining,
            SkillKind::Fishing => &self.fishing,
            SkillKind::Combat => &self.combat,
            SkillKind::Cooking => &self.cooking,
        }
    }

    pub fn get_mut(&mut self, kind: SkillKind) -> &mut Skill {
        match kind {
            SkillKind::Woodcutting => &mut self.woodcutting,
            SkillKind::Mining => &mut self.mining,
            SkillKind::Fishing => &mut self.fishing,
            SkillKind::Combat => &mut self.combat,
            SkillKind::Cooking => &mut self.cooking,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Skill> + '_ {
        SkillKind::ALL.into_iter().map(|kind| self.get(kind))
    }

    /// Sum of all skill levels.
    pub fn total_level(&self) -> u32 {
        self.iter().map(|skill| u32::from(skill.level)).sum()
    }
}
