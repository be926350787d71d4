// src/engine/progression.rs

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use super::error::EngineError;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 6;

/// XP needed per level step.
pub const XP_PER_LEVEL: u32 = 200;

const BASE_XP: f64 = 10.0;

/// Progression tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    Snake,
    Lion,
    Prince,
    King,
}

impl Rank {
    pub const ALL: [Rank; 4] = [Rank::Snake, Rank::Lion, Rank::Prince, Rank::King];

    /// Minimum cumulative XP for this rank.
    pub fn threshold(self) -> u32 {
        match self {
            Rank::Snake => 0,
            Rank::Lion => 500,
            Rank::Prince => 2000,
            Rank::King => 5000,
        }
    }

    /// Highest rank whose threshold is at or below `xp`.
    pub fn from_xp(xp: u32) -> Self {
        Self::ALL
            .into_iter()
            .rev()
            .find(|rank| xp >= rank.threshold())
            .unwrap_or(Rank::Snake)
    }

    pub fn next(self) -> Option<Rank> {
        match self {
            Rank::Snake => Some(Rank::Lion),
            Rank::Lion => Some(Rank::Prince),
            Rank::Prince => Some(Rank::King),
            Rank::King => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rank::Snake => "Snake",
            Rank::Lion => "Lion",
            Rank::Prince => "Prince",
            Rank::King => "King",
        };
        f.write_str(name)
    }
}

/// XP awarded for one completed quiz.
///
/// `confidence_accuracy` is the share (0–100) of questions marked "know"
/// that were actually answered correctly.
pub fn compute_xp(
    score: u32,
    total_questions: u32,
    quiz_level: u8,
    confidence_accuracy: f64,
) -> Result<u32, EngineError> {
    if total_questions == 0 {
        return Err(EngineError::NoQuestions);
    }
    if !(MIN_LEVEL..=MAX_LEVEL).contains(&quiz_level) {
        return Err(EngineError::InvalidLevel(quiz_level));
    }
    if score > total_questions {
        return Err(EngineError::ScoreOutOfRange {
            score,
            total: total_questions,
        });
    }

    let score_percentage = score as f64 / total_questions as f64 * 100.0;
    let score_factor = score_percentage / 10.0;
    let level_multiplier = quiz_level as f64;
    let confidence_bonus = if confidence_accuracy >= 80.0 {
        1.2
    } else if confidence_accuracy >= 60.0 {
        1.1
    } else {
        1.0
    };

    let xp = (BASE_XP * score_factor * level_multiplier * confidence_bonus).round();
    Ok(xp.max(0.0) as u32)
}

/// `min(6, floor(xp / 200) + 1)`.
pub fn level_from_xp(xp: u32) -> u8 {
    let level = xp / XP_PER_LEVEL + 1;
    level.min(MAX_LEVEL as u32) as u8
}

/// Cumulative XP at which `level` unlocks.
pub fn xp_required_for_level(level: u8) -> u32 {
    (level.clamp(MIN_LEVEL, MAX_LEVEL) as u32 - 1) * XP_PER_LEVEL
}

/// Levels available to a user currently at `user_level`.
pub fn unlocked_levels(user_level: u8) -> BTreeSet<u8> {
    (MIN_LEVEL..=user_level.clamp(MIN_LEVEL, MAX_LEVEL)).collect()
}

/// Rank and level derived from a cumulative XP total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progression {
    pub xp: u32,
    pub rank: Rank,
    pub level: u8,
}

impl Progression {
    pub fn from_xp(xp: u32) -> Self {
        Self {
            xp,
            rank: Rank::from_xp(xp),
            level: level_from_xp(xp),
        }
    }

    /// XP still missing for the next level, `None` once capped.
    pub fn xp_to_next_level(&self) -> Option<u32> {
        if self.level >= MAX_LEVEL {
            return None;
        }
        Some(xp_required_for_level(self.level + 1) - self.xp)
    }

    pub fn xp_to_next_rank(&self) -> Option<u32> {
        self.rank.next().map(|next| next.threshold() - self.xp)
    }

    pub fn is_unlocked(&self, level: u8) -> bool {
        (MIN_LEVEL..=self.level).contains(&level)
    }

    /// Progression after adding `xp_earned`.
    pub fn award(&self, xp_earned: u32) -> ProgressionChange {
        let after = Progression::from_xp(self.xp.saturating_add(xp_earned));
        ProgressionChange {
            before: *self,
            after,
            xp_earned,
            leveled_up: after.level > self.level,
            ranked_up: after.rank > self.rank,
        }
    }
}

/// Before/after snapshot of one XP award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressionChange {
    pub before: Progression,
    pub after: Progression,
    pub xp_earned: u32,
    pub leveled_up: bool,
    pub ranked_up: bool,
}

impl ProgressionChange {
    /// A change that awards nothing.
    pub fn unchanged(current: Progression) -> Self {
        Self {
            before: current,
            after: current,
            xp_earned: 0,
            leveled_up: false,
            ranked_up: false,
        }
    }
}
