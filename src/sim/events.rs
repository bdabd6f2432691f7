//! Semantic UI events emitted by the simulation
//!
//! Presentation (text, language, animation) is resolved by the client from
//! these stable identifiers.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::director::{ThemeId, TimedEventKind};
use super::state::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AchievementId {
    FirstBlood,
    Centurion,
    BossSlayer,
    SurvivorWave5,
    SurvivorWave10,
    ArsenalCollector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueLine {
    AllyArrives,
    AllyLowHealth,
    AllyDeparts,
    BossTaunt,
    BossEnraged,
}

/// Flavor text attached to a wave announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlavorId {
    Ominous,
    Restless,
    Hungry,
    Silent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UiEventKind {
    AchievementUnlocked(AchievementId),
    Dialogue {
        speaker: EntityId,
        line: DialogueLine,
    },
    WaveAnnouncement {
        wave: u32,
        theme: ThemeId,
        flavor: Option<FlavorId>,
    },
    BossSpawned {
        wave: u32,
    },
    TimedEventStarted(TimedEventKind),
    LevelUp {
        level: u32,
    },
    DamagePopup {
        pos: Vec2,
        amount: f32,
        crit: bool,
    },
    HealPopup {
        pos: Vec2,
        amount: f32,
    },
    WeaponFound {
        name: String,
    },
}

/// A queued event with its display window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiEvent {
    pub id: EntityId,
    pub kind: UiEventKind,
    pub created_at: f64,
    pub lifespan_ms: f64,
}

impl UiEvent {
    pub fn is_expired(&self, now: f64) -> bool {
        now - self.created_at > self.lifespan_ms
    }
}
