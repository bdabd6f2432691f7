//! Fixed timestep simulation tick
//!
//! Runs every subsystem in a fixed order against one `GameState`.

use glam::Vec2;

use super::ai;
use super::combat;
use super::director;
use super::explosion;
use super::geometry::{Body, toroidal_delta, toroidal_distance};
use super::progression;
use super::state::GameState;
use crate::consts::*;
use crate::direction_from_angle;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Desired movement direction; normalized by the simulation
    pub movement: Vec2,
    pub firing: bool,
    pub reload: bool,
    /// Equip the weapon in this slot
    pub switch_weapon: Option<usize>,
    /// Demo mode - the simulation steers and shoots for the player
    pub autopilot: bool,
}

/// Monsters closer than this make the autopilot back off
const AUTOPILOT_PANIC_RANGE: f32 = 250.0;

/// Input the autopilot would give this tick
pub fn autopilot_input(state: &GameState, now: f64) -> TickInput {
    let center = state.player.center();

    let threat = state
        .monsters
        .iter()
        .filter(|m| m.is_targetable())
        .map(|m| toroidal_delta(center, m.center()))
        .filter(|d| d.length() < AUTOPILOT_PANIC_RANGE)
        .min_by(|a, b| a.length().total_cmp(&b.length()));

    let movement = if let Some(toward) = threat {
        // Back off with a sideways drift so it doesn't run in straight lines
        -toward.normalize_or_zero() + toward.normalize_or_zero().perp() * 0.5
    } else if let Some(pickup) = state.pickups.iter().min_by(|a, b| {
        toroidal_distance(center, a.center()).total_cmp(&toroidal_distance(center, b.center()))
    }) {
        toroidal_delta(center, pickup.center())
    } else {
        direction_from_angle((now * 0.0005) as f32)
    };

    let best_slot = state
        .player
        .weapons
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.quality.total_cmp(&b.1.quality))
        .map(|(i, _)| i);

    let reload = state
        .player
        .equipped()
        .is_some_and(|w| w.ammo_in_clip == 0 && w.can_reload());

    TickInput {
        movement,
        firing: true,
        reload,
        switch_weapon: best_slot.filter(|&slot| slot != state.player.equipped_weapon),
        autopilot: true,
    }
}

/// Drop everything whose time is up
fn cleanup(state: &mut GameState, now: f64) {
    state
        .monsters
        .retain(|m| m.dies_at.is_none_or(|t| now - t < DEATH_ANIMATION_DURATION_MS));
    state.explosions.retain(|e| now < e.expires_at);
    state.effects.retain(|e| now < e.expires_at);
    state.events.retain(|e| !e.is_expired(now));
    for slot in state.targeted_monsters.iter_mut() {
        if slot.is_some_and(|lock| lock.expires_at <= now) {
            *slot = None;
        }
    }
    if state.targeted_obstacle.is_some_and(|lock| lock.expires_at <= now) {
        state.targeted_obstacle = None;
    }
    state.player.clamp_vitals();
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, now: f64) {
    // Paused, choosing an upgrade, or dead: nothing moves
    if state.is_paused || state.is_leveling_up || state.is_game_over {
        return;
    }
    state.time_ms = now;
    state.tick_count += 1;

    let input = if input.autopilot {
        autopilot_input(state, now)
    } else {
        input.clone()
    };

    // Player
    combat::update_player(state, &input, now);
    combat::update_orbital(state, now);

    // AI
    ai::update_monsters(state, now);
    ai::ally::update_allies(state, now);

    explosion::process_barrels(state, now);

    // Projectiles and collisions
    combat::update_bullets(state, now);
    combat::update_enemy_bullets(state, now);
    combat::update_homing_bullets(state, now);
    combat::apply_contact_damage(state, now);
    combat::update_damage_zones(state, now);
    combat::resolve_kills(state, now);

    if state.player.is_dead() {
        state.is_game_over = true;
        log::info!(
            "Game over on wave {} with score {} ({} kills)",
            state.wave.wave,
            state.score,
            state.total_kills
        );
        return;
    }

    // Pickups and leveling
    progression::expire_buffs(&mut state.player, now);
    progression::collect_pickups(state, now);
    if progression::check_level_up(state, now) {
        return;
    }

    director::run(state, now);

    // Camera follows the player
    let half_view = Vec2::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT) / 2.0;
    state.camera.pos = state.player.center() - half_view;

    cleanup(state, now);
    state.normalize_order();
}

/// Pure form of `tick`: the next snapshot from `state`, which is left untouched
pub fn step(state: &GameState, input: &TickInput, now: f64) -> GameState {
    let mut next = state.clone();
    tick(&mut next, input, now);
    next
}
