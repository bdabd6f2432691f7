//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure and deterministic:
//! - One exclusively-borrowed `GameState` per tick
//! - Seeded RNG only (`SimRng`)
//! - Fixed subsystem order
//! - No rendering, text or storage dependencies

pub mod ai;
pub mod combat;
pub mod director;
pub mod events;
pub mod explosion;
pub mod geometry;
pub mod progression;
pub mod rng;
pub mod state;
pub mod tick;
pub mod weapon;

pub use events::{AchievementId, DialogueLine, UiEvent, UiEventKind};
pub use geometry::{
    Body, Rect, find_safe_teleport_location, line_of_sight_clear, sliding_move, toroidal_delta,
    wrap_around,
};
pub use progression::{UpgradeEffect, UpgradeId, choose_upgrade};
pub use rng::SimRng;
pub use state::{
    Ally, AllyBehavior, Bullet, EnemyBullet, EntityId, ExplosiveBarrel, GameState,
    HomingEnemyBullet, Monster, MonsterKind, Obstacle, Player,
};
pub use tick::{TickInput, step, tick};
pub use weapon::{Weapon, WeaponCategory, generate_weapon};
