//! Torus Arena - wrap-around arena survival simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, AI, combat, waves, progression)
//! - `session`: Load-at-start / save-at-end wrapper around the tick driver
//! - `persistence`: Storage port, player profile
//! - `highscores`: Top-10 leaderboard
//! - `settings`: Difficulty and presentation preferences

pub mod highscores;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use session::Session;
pub use settings::{DifficultyPreset, Settings};

use glam::Vec2;

/// Game configuration constants
///
/// Distances are pixels, speeds are pixels per tick, durations are
/// milliseconds of simulation time.
pub mod consts {
    /// Nominal tick length (60 Hz)
    pub const TICK_MS: f64 = 1000.0 / 60.0;

    /// World dimensions (toroidal)
    pub const WORLD_WIDTH: f32 = 4000.0;
    pub const WORLD_HEIGHT: f32 = 4000.0;

    /// Camera viewport
    pub const VIEWPORT_WIDTH: f32 = 1280.0;
    pub const VIEWPORT_HEIGHT: f32 = 720.0;

    /// Player defaults
    pub const PLAYER_SIZE: f32 = 32.0;
    pub const PLAYER_BASE_SPEED: f32 = 4.0;
    pub const PLAYER_MAX_HEALTH: f32 = 100.0;
    pub const PLAYER_GEM_MAGNET_RADIUS: f32 = 120.0;
    pub const PLAYER_XP_TO_FIRST_LEVEL: f32 = 10.0;
    /// Invincibility granted after a contact hit
    pub const CONTACT_INVINCIBILITY_MS: f64 = 500.0;
    /// Maximum number of weapon slots
    pub const MAX_WEAPON_SLOTS: usize = 3;
    /// Auto-target search range
    pub const AUTO_TARGET_RANGE: f32 = 700.0;

    /// Monster lifecycle
    pub const DEATH_ANIMATION_DURATION_MS: f64 = 2000.0;

    /// Projectile lifespans
    pub const BULLET_LIFESPAN_MS: f64 = 1500.0;
    pub const ENEMY_BULLET_LIFESPAN_MS: f64 = 4000.0;
    pub const HOMING_BULLET_LIFESPAN_MS: f64 = 6000.0;
    pub const BULLET_SIZE: f32 = 8.0;

    /// Damage zones tick at this cadence
    pub const ZONE_TICK_MS: f64 = 500.0;

    /// Wisp timings
    pub const WISP_TELEPORT_DURATION_MS: f64 = 400.0;
    pub const WISP_TELEPORT_COOLDOWN_MS: f64 = 5000.0;
    pub const WISP_ATTACK_CHARGE_MS: f64 = 1000.0;

    /// Barrels and explosions
    pub const BARREL_SIZE: f32 = 28.0;
    pub const BARREL_HEALTH: f32 = 30.0;
    pub const EXPLOSION_RADIUS: f32 = 120.0;
    pub const EXPLOSION_DAMAGE: f32 = 40.0;
    pub const EXPLOSION_LIFETIME_MS: f64 = 400.0;
    /// Thrown barrels ignore contact until armed
    pub const BARREL_ARM_DELAY_MS: f64 = 600.0;

    /// Safe-location search
    pub const SAFE_TELEPORT_ATTEMPTS: usize = 100;

    /// Spawn placement
    pub const SPAWN_MIN_DISTANCE: f32 = 300.0;
    pub const SPAWN_PLACEMENT_ATTEMPTS: usize = 50;

    /// Target-lock display bookkeeping
    pub const TARGET_LOCK_MS: f64 = 3000.0;
    pub const TARGET_LOCK_SLOTS: usize = 3;

    /// Allies
    pub const ALLY_INTERVAL_MS: f64 = 45_000.0;
    pub const ALLY_LIFETIME_MS: f64 = 30_000.0;

    /// Timed events
    pub const TIMED_EVENT_DURATION_MS: f64 = 15_000.0;
    pub const METEOR_INTERVAL_MS: f64 = 600.0;
    pub const TREASURE_CHEST_COUNT: usize = 5;
}

/// Center point of the world
#[inline]
pub fn world_center() -> Vec2 {
    Vec2::new(consts::WORLD_WIDTH / 2.0, consts::WORLD_HEIGHT / 2.0)
}

/// Unit vector for an angle in radians
#[inline]
pub fn direction_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Angle in radians of a direction vector
#[inline]
pub fn angle_of(dir: Vec2) -> f32 {
    dir.y.atan2(dir.x)
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU);
    // rem_euclid can round up to TAU itself
    if wrapped >= TAU { -PI } else { wrapped - PI }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_range() {
        for angle in [0.0, PI, -PI, 3.0 * PI, -7.5 * PI, 1.0e7, -1.0e-9] {
            let n = normalize_angle(angle);
            assert!((-PI..PI).contains(&n), "{angle} -> {n}");
        }
        assert!((normalize_angle(2.5 * PI) - 0.5 * PI).abs() < 1e-5);
    }

    #[test]
    fn test_normalize_angle_non_finite_returns() {
        assert!(normalize_angle(f32::INFINITY).is_nan());
        assert!(normalize_angle(f32::NAN).is_nan());
    }
}
