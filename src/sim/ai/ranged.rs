//! Kiting gunners (shooter, shotgun shooter)
//!
//! Keep between `RETREAT_RANGE` and `ADVANCE_RANGE` of the player, strafing
//! sideways in between, and only shoot with a clear line of sight.

use glam::Vec2;

use super::{AiContext, AiOutput, step};
use crate::sim::geometry::{Body, line_of_sight_clear, toroidal_delta};
use crate::sim::state::{AiState, EnemyBullet, IdAllocator, Monster};
use crate::sim::weapon::Weapon;
use crate::{angle_of, direction_from_angle};

pub const RETREAT_RANGE: f32 = 200.0;
pub const ADVANCE_RANGE: f32 = 400.0;
pub const STRAFE_FLIP_MS: f64 = 2000.0;

/// Whether the player is visible from `center`
fn sees_player(center: Vec2, ctx: &AiContext<'_>) -> bool {
    let to_player = toroidal_delta(center, ctx.player.center);
    line_of_sight_clear(center, center + to_player, ctx.obstacles)
}

/// Movement direction for one kiting step
pub fn kite_direction(to_player: Vec2, los: bool, strafe_direction: f32) -> Vec2 {
    let dist = to_player.length();
    let toward = to_player.normalize_or_zero();
    if !los || dist > ADVANCE_RANGE {
        toward
    } else if dist < RETREAT_RANGE {
        -toward
    } else {
        toward.perp() * strafe_direction
    }
}

pub fn kite(
    monster: &mut Monster,
    ctx: &AiContext<'_>,
    cooldown_ms: f64,
    ids: &mut IdAllocator,
    out: &mut AiOutput,
) {
    let now = ctx.now;
    let (mut strafe_direction, mut last_flip_at) = match monster.ai {
        AiState::Kiting {
            strafe_direction,
            last_flip_at,
        } => (strafe_direction, last_flip_at),
        _ => (1.0, now),
    };
    if now - last_flip_at >= STRAFE_FLIP_MS {
        strafe_direction = -strafe_direction;
        last_flip_at = now;
    }
    monster.ai = AiState::Kiting {
        strafe_direction,
        last_flip_at,
    };

    let center = monster.center();
    let to_player = toroidal_delta(center, ctx.player.center);
    let dir = kite_direction(to_player, sees_player(center, ctx), strafe_direction);
    step(monster, dir, 1.0, ctx);

    // Line of sight is re-checked from the new position
    let center = monster.center();
    if !sees_player(center, ctx) || now - monster.last_shot_at < cooldown_ms {
        return;
    }
    let weapon = monster.weapon.clone().unwrap_or_else(Weapon::enemy_rifle);
    let aim = angle_of(toroidal_delta(center, ctx.player.center));
    let damage = weapon.damage * (1.0 + 0.25 * monster.empowered_level as f32);
    for angle in weapon.pellet_angles(aim) {
        out.enemy_bullets.push(EnemyBullet::new(
            ids.next_id(),
            center,
            direction_from_angle(angle) * weapon.bullet_speed,
            damage,
            now,
        ));
    }
    monster.last_shot_at = now;
}
