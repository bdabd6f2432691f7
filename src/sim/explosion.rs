//! Explosive barrels and explosions
//!
//! Barrels that trigger in the same tick detonate as one batch. A barrel
//! caught in a blast only loses health here; it goes off on a later tick
//! once its own trigger check sees health at zero.

use glam::Vec2;

use super::geometry::{Body, Rect, toroidal_distance, wrap_around};
use super::state::{ExplosiveBarrel, Explosion, GameState};
use crate::consts::*;

/// Per-tick velocity decay for thrown barrels
pub const BARREL_VELOCITY_DECAY: f32 = 0.92;
/// Obstacles take this multiple of the blast damage
pub const OBSTACLE_BLAST_MULTIPLIER: f32 = 2.0;

fn is_triggered(barrel: &ExplosiveBarrel, state: &GameState, now: f64) -> bool {
    if barrel.health <= 0.0 {
        return true;
    }
    if !barrel.is_armed(now) {
        return false;
    }
    let rect = barrel.rect();
    rect.intersects(&state.player.rect())
        || state
            .monsters
            .iter()
            .any(|m| m.is_targetable() && rect.intersects(&m.rect()))
}

/// Move thrown barrels, then detonate every barrel whose trigger fired
pub fn process_barrels(state: &mut GameState, now: f64) {
    for barrel in state.barrels.iter_mut() {
        if barrel.vel == Vec2::ZERO {
            continue;
        }
        barrel.pos = wrap_around(barrel.pos + barrel.vel, barrel.size);
        barrel.vel *= BARREL_VELOCITY_DECAY;
        if barrel.vel.length_squared() < 0.01 {
            barrel.vel = Vec2::ZERO;
        }
    }

    let (triggered, idle): (Vec<ExplosiveBarrel>, Vec<ExplosiveBarrel>) =
        std::mem::take(&mut state.barrels)
            .into_iter()
            .partition(|b| is_triggered(b, state, now));
    state.barrels = idle;

    for barrel in triggered {
        detonate(state, barrel.center(), now);
    }
    state.obstacles.retain(|o| o.health > 0.0);
}

/// Apply one blast centered at `center`
pub fn detonate(state: &mut GameState, center: Vec2, now: f64) {
    let id = state.next_entity_id();
    state.explosions.push(Explosion {
        id,
        center,
        radius: EXPLOSION_RADIUS,
        damage: EXPLOSION_DAMAGE,
        created_at: now,
        expires_at: now + EXPLOSION_LIFETIME_MS,
    });

    let in_radius = |p: Vec2| toroidal_distance(p, center) <= EXPLOSION_RADIUS;

    if in_radius(state.player.center()) {
        state.player.take_damage(EXPLOSION_DAMAGE, now);
    }
    for monster in state.monsters.iter_mut() {
        if monster.is_targetable() && in_radius(monster.center()) {
            monster.take_damage(EXPLOSION_DAMAGE, now);
        }
    }
    for barrel in state.barrels.iter_mut() {
        if in_radius(barrel.center()) {
            barrel.health -= EXPLOSION_DAMAGE;
        }
    }

    // Obstacles are tested against the blast's bounding square, not the circle
    let blast = Rect::around(center, EXPLOSION_RADIUS);
    for obstacle in state.obstacles.iter_mut() {
        if blast.intersects(&obstacle.rect()) {
            obstacle.health -= EXPLOSION_DAMAGE * OBSTACLE_BLAST_MULTIPLIER;
        }
    }
    log::debug!("Barrel exploded at {center}");
}
