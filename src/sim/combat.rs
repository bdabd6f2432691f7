//! Player combat and damage resolution
//!
//! Everything that moves a projectile or changes a health bar lives here:
//! player movement and firing, the orbital shield, the three bullet kinds,
//! contact damage, damage zones, and finally kill resolution with its drops.

use std::f32::consts::TAU;

use glam::Vec2;

use super::director;
use super::events::{AchievementId, UiEventKind};
use super::geometry::{
    Body, Rect, line_of_sight_clear, sliding_move, toroidal_delta, toroidal_distance, wrap_around,
};
use super::state::{
    BuffSpec, Bullet, BulletOwner, DamageZone, EntityId, GameState, Monster, MonsterKind, Pickup,
    PickupKind, ReloadState, Stat, StatOp, TargetLock, ZoneSide,
};
use super::tick::TickInput;
use super::weapon::{ImpactEffect, Weapon, generate_weapon};
use crate::consts::*;
use crate::{angle_of, direction_from_angle, normalize_angle};

pub const ORB_HALF_EXTENT: f32 = 8.0;
pub const ORBITAL_HIT_COOLDOWN_MS: f64 = 500.0;
pub const HEALTH_DROP_CHANCE: f32 = 0.05;
pub const HEALTH_DROP_AMOUNT: f32 = 25.0;
pub const POWER_UP_DROP_CHANCE: f32 = 0.03;
pub const BLOATER_SPLIT_COUNT: usize = 3;
pub const CENTURION_KILLS: u32 = 100;

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

fn start_reload(state: &mut GameState, now: f64) {
    let player = &mut state.player;
    if player.reload.is_reloading {
        return;
    }
    let Some(weapon) = player.equipped() else {
        return;
    };
    if !weapon.can_reload() {
        return;
    }
    let reload_time = weapon.reload_time as f64;
    player.reload = ReloadState {
        is_reloading: true,
        reload_until: now + reload_time,
    };
}

/// Offset to the nearest visible monster within auto-target range
pub fn auto_target(state: &GameState) -> Option<Vec2> {
    let from = state.player.center();
    let obstacles = state.obstacle_rects();
    state
        .monsters
        .iter()
        .filter(|m| m.is_targetable())
        .map(|m| toroidal_delta(from, m.center()))
        .filter(|delta| delta.length() <= AUTO_TARGET_RANGE)
        .filter(|delta| line_of_sight_clear(from, from + *delta, &obstacles))
        .min_by(|a, b| a.length().total_cmp(&b.length()))
}

/// Throw away an exhausted found weapon and fall back to the first slot
fn drop_depleted(state: &mut GameState) {
    let player = &mut state.player;
    let index = player.equipped_weapon;
    let depleted = player
        .weapons
        .get(index)
        .is_some_and(|w| w.durability.is_some() && w.is_depleted());
    if !depleted || player.weapons.len() <= 1 {
        return;
    }
    let weapon = player.weapons.remove(index);
    player.equipped_weapon = 0;
    player.reload = ReloadState::default();
    log::debug!("{} is spent, switching to {:?}", weapon.name, player.equipped().map(|w| &w.name));
}

fn fire(state: &mut GameState, now: f64) {
    if state.player.reload.is_reloading {
        return;
    }
    let Some(weapon) = state.player.equipped().cloned() else {
        return;
    };
    if now - state.player.last_shot_at < weapon.fire_interval_ms() {
        return;
    }
    if weapon.ammo_in_clip == 0 {
        start_reload(state, now);
        drop_depleted(state);
        return;
    }

    let center = state.player.center();
    let aim = auto_target(state)
        .map(angle_of)
        .unwrap_or_else(|| angle_of(state.player.facing));
    let damage = state.player.bullet_damage(&weapon, now);
    for angle in weapon.pellet_angles(aim) {
        let id = state.next_entity_id();
        state.bullets.push(Bullet::from_weapon(
            id,
            BulletOwner::Player,
            center,
            angle,
            damage,
            &weapon,
            now,
        ));
    }
    state.player.last_shot_at = now;

    let empty = match state.player.equipped_mut() {
        Some(equipped) => {
            equipped.ammo_in_clip = equipped.ammo_in_clip.saturating_sub(1);
            equipped.ammo_in_clip == 0
        }
        None => false,
    };
    if empty {
        start_reload(state, now);
        drop_depleted(state);
    }
}

/// Weapon switching, reloads, movement and firing for one tick of input
pub fn update_player(state: &mut GameState, input: &TickInput, now: f64) {
    if let Some(slot) = input.switch_weapon {
        let player = &mut state.player;
        if slot < player.weapons.len() && slot != player.equipped_weapon {
            player.equipped_weapon = slot;
            player.reload = ReloadState::default();
        }
    }
    if input.reload {
        start_reload(state, now);
    }

    // Movement
    let obstacles = state.obstacle_rects();
    let player = &mut state.player;
    let dir = input.movement.normalize_or_zero();
    if dir != Vec2::ZERO {
        player.facing = dir;
    }
    let speed = player.effective(Stat::Speed, now).max(0.0);
    player.pos = sliding_move(player.rect(), dir, speed, &obstacles);
    player.pos = wrap_around(player.pos, player.size);

    // Reload completion
    if player.reload.is_reloading && now >= player.reload.reload_until {
        if let Some(weapon) = player.equipped_mut() {
            weapon.finish_reload();
        }
        player.reload = ReloadState::default();
    }

    if input.firing {
        fire(state, now);
    }
}

/// Spin the orbital shield and hit whatever the orbs touch
pub fn update_orbital(state: &mut GameState, now: f64) {
    let Some(mut orbital) = state.player.orbital else {
        return;
    };
    orbital.angle = normalize_angle(orbital.angle + orbital.speed);
    state.player.orbital = Some(orbital);
    if orbital.count == 0 {
        return;
    }

    let center = state.player.center();
    let orbs: Vec<Rect> = (0..orbital.count)
        .map(|i| {
            let angle = orbital.angle + TAU * i as f32 / orbital.count as f32;
            Rect::around(center + direction_from_angle(angle) * orbital.radius, ORB_HALF_EXTENT)
        })
        .collect();

    let mut popups = Vec::new();
    for monster in state.monsters.iter_mut() {
        if !monster.is_targetable() || now - monster.last_orbital_hit_at < ORBITAL_HIT_COOLDOWN_MS {
            continue;
        }
        let rect = monster.rect();
        if !orbs.iter().any(|orb| orb.intersects(&rect)) {
            continue;
        }
        monster.last_orbital_hit_at = now;
        let lost = monster.take_damage(orbital.damage, now);
        if lost > 0.0 {
            popups.push((monster.center(), lost));
        }
    }
    for (pos, amount) in popups {
        state.push_event(
            UiEventKind::DamagePopup {
                pos,
                amount,
                crit: false,
            },
            now,
        );
    }
}

// ---------------------------------------------------------------------------
// Projectiles
// ---------------------------------------------------------------------------

fn spawn_zone(state: &mut GameState, center: Vec2, effect: &ImpactEffect, side: ZoneSide, now: f64) {
    let id = state.next_entity_id();
    state
        .damage_zones
        .push(DamageZone::from_impact(id, center, effect, side, now));
}

/// Refresh or claim a monster lock slot (expired slots first, then the oldest)
fn lock_monster(state: &mut GameState, id: EntityId, now: f64) {
    let lock = TargetLock {
        id,
        expires_at: now + TARGET_LOCK_MS,
    };
    let slots = &mut state.targeted_monsters;
    if let Some(slot) = slots.iter_mut().find(|s| s.is_some_and(|l| l.id == id)) {
        *slot = Some(lock);
        return;
    }
    if let Some(slot) = slots
        .iter_mut()
        .find(|s| s.is_none_or(|l| l.expires_at <= now))
    {
        *slot = Some(lock);
        return;
    }
    if let Some(slot) = slots
        .iter_mut()
        .min_by(|a, b| {
            let expiry = |s: &Option<TargetLock>| s.map_or(f64::NEG_INFINITY, |l| l.expires_at);
            expiry(a).total_cmp(&expiry(b))
        })
    {
        *slot = Some(lock);
    }
}

/// Apply one bullet's hits for this tick against obstacles, barrels and monsters
fn resolve_bullet_hits(state: &mut GameState, bullet: &mut Bullet, now: f64) {
    let rect = bullet.rect();

    for obstacle in state.obstacles.iter_mut() {
        if bullet.piercing_left <= 0 {
            break;
        }
        if obstacle.health <= 0.0
            || bullet.hit_ids.contains(&obstacle.id)
            || !rect.intersects(&obstacle.rect())
        {
            continue;
        }
        obstacle.health -= bullet.damage;
        bullet.hit_ids.push(obstacle.id);
        bullet.piercing_left -= 1;
        state.targeted_obstacle = Some(TargetLock {
            id: obstacle.id,
            expires_at: now + TARGET_LOCK_MS,
        });
    }

    for barrel in state.barrels.iter_mut() {
        if bullet.piercing_left <= 0 {
            break;
        }
        if bullet.hit_ids.contains(&barrel.id) || !rect.intersects(&barrel.rect()) {
            continue;
        }
        barrel.health -= bullet.damage;
        bullet.hit_ids.push(barrel.id);
        bullet.piercing_left -= 1;
    }

    let mut popups = Vec::new();
    let mut locks = Vec::new();
    for monster in state.monsters.iter_mut() {
        if bullet.piercing_left <= 0 {
            break;
        }
        if !monster.is_targetable()
            || bullet.hit_ids.contains(&monster.id)
            || !rect.intersects(&monster.rect())
        {
            continue;
        }
        let crit = state.rng.chance(bullet.crit_chance);
        let amount = if crit {
            bullet.damage * bullet.crit_damage
        } else {
            bullet.damage
        };
        // Invincible monsters still soak up the hit
        let lost = monster.take_damage(amount, now);
        bullet.hit_ids.push(monster.id);
        bullet.piercing_left -= 1;
        if lost > 0.0 {
            popups.push((monster.center(), lost, crit));
        }
        locks.push(monster.id);
    }

    for (pos, amount, crit) in popups {
        state.push_event(UiEventKind::DamagePopup { pos, amount, crit }, now);
    }
    if bullet.owner == BulletOwner::Player {
        for id in locks {
            lock_monster(state, id, now);
        }
    }
}

/// Move player and ally bullets and resolve their hits
pub fn update_bullets(state: &mut GameState, now: f64) {
    let bullets = std::mem::take(&mut state.bullets);
    let mut kept = Vec::with_capacity(bullets.len());
    for mut bullet in bullets {
        bullet.pos = wrap_around(bullet.pos + bullet.vel, bullet.size);
        let expired = now - bullet.spawned_at > BULLET_LIFESPAN_MS;
        if !expired {
            resolve_bullet_hits(state, &mut bullet, now);
        }
        if expired || bullet.piercing_left <= 0 {
            if let Some(effect) = bullet.on_impact {
                spawn_zone(state, bullet.center(), &effect, ZoneSide::Player, now);
            }
            continue;
        }
        kept.push(bullet);
    }
    state.bullets = kept;
    state.obstacles.retain(|o| o.health > 0.0);
}

/// Damage the player or the first ally under `rect`; true if something was hit
fn strike_friendly(state: &mut GameState, rect: Rect, damage: f32, now: f64) -> bool {
    if rect.intersects(&state.player.rect()) {
        state.player.take_damage(damage, now);
        return true;
    }
    if let Some(ally) = state
        .allies
        .iter_mut()
        .find(|a| a.health > 0.0 && rect.intersects(&a.rect()))
    {
        ally.take_damage(damage);
        return true;
    }
    false
}

/// Move monster bullets and strike the player or allies
///
/// Enemy shots fly over obstacles; only player and ally bullets collide with
/// them (see `resolve_bullet_hits`).
pub fn update_enemy_bullets(state: &mut GameState, now: f64) {
    let bullets = std::mem::take(&mut state.enemy_bullets);
    let mut kept = Vec::with_capacity(bullets.len());
    for mut bullet in bullets {
        bullet.pos = wrap_around(bullet.pos + bullet.vel, bullet.size);
        let expired = now - bullet.spawned_at > bullet.lifespan_ms;
        let hit = !expired && strike_friendly(state, bullet.rect(), bullet.damage, now);
        if expired || hit {
            if let Some(effect) = bullet.on_impact {
                spawn_zone(state, bullet.center(), &effect, ZoneSide::Enemy, now);
            }
            continue;
        }
        kept.push(bullet);
    }
    state.enemy_bullets = kept;
}

/// Turn `vel` toward `desired` by at most `max_turn` radians, keeping `speed`
pub fn steer(vel: Vec2, desired: Vec2, max_turn: f32, speed: f32) -> Vec2 {
    if desired == Vec2::ZERO {
        return vel;
    }
    let current = angle_of(vel);
    let diff = normalize_angle(angle_of(desired) - current);
    direction_from_angle(current + diff.clamp(-max_turn, max_turn)) * speed
}

/// Steer homing orbs toward their target; like enemy bullets they ignore obstacles
pub fn update_homing_bullets(state: &mut GameState, now: f64) {
    let bullets = std::mem::take(&mut state.homing_bullets);
    let mut kept = Vec::with_capacity(bullets.len());
    for mut bullet in bullets {
        let target = if bullet.target_id == state.player.id {
            Some(state.player.center())
        } else {
            state
                .allies
                .iter()
                .find(|a| a.id == bullet.target_id)
                .map(|a| a.center())
        };
        if let Some(target) = target {
            let desired = toroidal_delta(bullet.center(), target);
            bullet.vel = steer(bullet.vel, desired, bullet.turn_speed, bullet.speed);
        }
        bullet.pos = wrap_around(bullet.pos + bullet.vel, bullet.size);

        let expired = now - bullet.spawned_at > HOMING_BULLET_LIFESPAN_MS;
        if expired || strike_friendly(state, bullet.rect(), bullet.damage, now) {
            continue;
        }
        kept.push(bullet);
    }
    state.homing_bullets = kept;
}

// ---------------------------------------------------------------------------
// Contact and zones
// ---------------------------------------------------------------------------

/// Monster bodies hurt the player (then a grace window) and allies
pub fn apply_contact_damage(state: &mut GameState, now: f64) {
    let player_rect = state.player.rect();
    let thorns = state.player.effective(Stat::Thorns, now);
    for monster in state.monsters.iter_mut() {
        if !monster.is_targetable() || !monster.rect().intersects(&player_rect) {
            continue;
        }
        if now < state.player.invincible_until {
            break;
        }
        state.player.take_damage(monster.damage, now);
        state.player.invincible_until = now + CONTACT_INVINCIBILITY_MS;
        if thorns > 0.0 {
            monster.take_damage(thorns, now);
        }
    }

    for ally in state.allies.iter_mut() {
        if now - ally.last_hurt_at < CONTACT_INVINCIBILITY_MS {
            continue;
        }
        let rect = ally.rect();
        if let Some(monster) = state
            .monsters
            .iter()
            .find(|m| m.is_targetable() && m.rect().intersects(&rect))
        {
            ally.take_damage(monster.damage);
            ally.last_hurt_at = now;
        }
    }
}

/// Expire zones, slow monsters standing in player zones, pulse damage
pub fn update_damage_zones(state: &mut GameState, now: f64) {
    state.damage_zones.retain(|z| now < z.expires_at);

    let GameState {
        damage_zones,
        monsters,
        player,
        allies,
        ..
    } = state;
    for zone in damage_zones.iter_mut() {
        let pulse = now - zone.last_tick_at >= ZONE_TICK_MS;
        if pulse {
            zone.last_tick_at = now;
        }
        let inside = |center: Vec2| toroidal_distance(center, zone.center) <= zone.radius;
        match zone.side {
            ZoneSide::Player => {
                for monster in monsters.iter_mut().filter(|m| m.is_targetable()) {
                    if !inside(monster.center()) {
                        continue;
                    }
                    if let Some(slow) = zone.slow {
                        monster.slowed_until = now + ZONE_TICK_MS;
                        monster.slow_factor = slow;
                    }
                    if pulse {
                        monster.take_damage(zone.damage, now);
                    }
                }
            }
            ZoneSide::Enemy => {
                if !pulse {
                    continue;
                }
                if inside(player.center()) {
                    player.take_damage(zone.damage, now);
                }
                for ally in allies.iter_mut().filter(|a| inside(a.center())) {
                    ally.take_damage(zone.damage);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Kills
// ---------------------------------------------------------------------------

const POWER_UPS: [BuffSpec; 3] = [
    BuffSpec {
        stat: Stat::Speed,
        op: StatOp::Multiply,
        value: 1.3,
        duration_ms: 8000.0,
    },
    BuffSpec {
        stat: Stat::DamageMultiplier,
        op: StatOp::Multiply,
        value: 1.5,
        duration_ms: 8000.0,
    },
    BuffSpec {
        stat: Stat::Thorns,
        op: StatOp::Add,
        value: 15.0,
        duration_ms: 8000.0,
    },
];

/// Score for killing a monster of `kind` worth `xp` on `wave`
pub fn kill_score(kind: MonsterKind, xp: f32, wave: u32) -> u64 {
    if kind.is_boss() {
        1000 * wave as u64
    } else {
        (xp * 10.0).round().max(0.0) as u64
    }
}

fn drop_loot(state: &mut GameState, kind: MonsterKind, center: Vec2, xp: f32, now: f64) {
    let id = state.next_entity_id();
    state
        .pickups
        .push(Pickup::new(id, center, PickupKind::Gem { xp }));

    if state.rng.chance(HEALTH_DROP_CHANCE) {
        let id = state.next_entity_id();
        let offset = direction_from_angle(state.rng.angle()) * 16.0;
        state.pickups.push(Pickup::new(
            id,
            center + offset,
            PickupKind::Health {
                amount: HEALTH_DROP_AMOUNT,
            },
        ));
    }
    if state.rng.chance(POWER_UP_DROP_CHANCE) {
        if let Some(&spec) = state.rng.pick(&POWER_UPS) {
            let id = state.next_entity_id();
            let offset = direction_from_angle(state.rng.angle()) * 16.0;
            state
                .pickups
                .push(Pickup::new(id, center + offset, PickupKind::PowerUp(spec)));
        }
    }

    if matches!(kind, MonsterKind::Elite | MonsterKind::Boss) {
        let baseline = state
            .player
            .equipped()
            .cloned()
            .unwrap_or_else(Weapon::starter_pistol);
        if let Some(weapon) = generate_weapon(&baseline, state.wave.wave, &mut state.rng) {
            log::debug!("{kind:?} dropped {} (quality {:.0})", weapon.name, weapon.quality);
            let id = state.next_entity_id();
            state
                .pickups
                .push(Pickup::new(id, center, PickupKind::Weapon(Box::new(weapon))));
        }
    }

    if kind == MonsterKind::Bloater {
        let wave = state.wave.wave;
        let health = (MonsterKind::Minion.stats().health + wave as f32 * 15.0)
            * state.difficulty_modifier;
        let half = Vec2::splat(MonsterKind::Minion.stats().size / 2.0);
        for _ in 0..BLOATER_SPLIT_COUNT {
            let offset = direction_from_angle(state.rng.angle()) * 30.0;
            let id = state.next_entity_id();
            state.monsters.push(Monster::new(
                id,
                MonsterKind::Minion,
                center + offset - half,
                health,
                now,
            ));
        }
    }
}

/// Mark freshly killed monsters as dying and pay out their rewards
pub fn resolve_kills(state: &mut GameState, now: f64) {
    let mut killed = Vec::new();
    for monster in state.monsters.iter_mut() {
        if monster.health <= 0.0 && !monster.is_dying() {
            monster.dies_at = Some(now);
            monster.hidden = false;
            killed.push((monster.id, monster.kind, monster.center(), monster.xp_value));
        }
    }

    for (id, kind, center, xp) in killed {
        state.total_kills += 1;
        state.score += kill_score(kind, xp, state.wave.wave);
        drop_loot(state, kind, center, xp, now);
        director::record_kill(state, kind);

        if state.total_kills >= 1 {
            state.unlock(AchievementId::FirstBlood, now);
        }
        if state.total_kills >= CENTURION_KILLS {
            state.unlock(AchievementId::Centurion, now);
        }
        if kind.is_boss() {
            log::info!("Boss {id} defeated on wave {}", state.wave.wave);
            state.unlock(AchievementId::BossSlayer, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Ally, AllyBehavior, EnemyBullet, Obstacle, OrbitalShield};

    fn add_monster(state: &mut GameState, kind: MonsterKind, offset: Vec2, health: f32) -> EntityId {
        let id = state.next_entity_id();
        let pos = state.player.pos + offset;
        state.monsters.push(Monster::new(id, kind, pos, health, 0.0));
        id
    }

    fn firing() -> TickInput {
        TickInput {
            firing: true,
            ..TickInput::default()
        }
    }

    #[test]
    fn test_fires_at_auto_target() {
        let mut state = GameState::empty(1);
        add_monster(&mut state, MonsterKind::Normal, Vec2::new(0.0, 300.0), 30.0);
        update_player(&mut state, &firing(), 100.0);
        assert_eq!(state.bullets.len(), 1);
        assert!(state.bullets[0].vel.y > 0.0);
        assert_eq!(state.player.equipped().unwrap().ammo_in_clip, 11);
    }

    #[test]
    fn test_fire_rate_limits_shots() {
        let mut state = GameState::empty(1);
        update_player(&mut state, &firing(), 100.0);
        update_player(&mut state, &firing(), 116.0);
        assert_eq!(state.bullets.len(), 1);
    }

    #[test]
    fn test_empty_clip_reloads() {
        let mut state = GameState::empty(1);
        if let Some(w) = state.player.equipped_mut() {
            w.ammo_in_clip = 1;
        }
        update_player(&mut state, &firing(), 100.0);
        assert!(state.player.reload.is_reloading);
        update_player(&mut state, &TickInput::default(), 100.0 + 1200.0);
        assert!(!state.player.reload.is_reloading);
        assert_eq!(state.player.equipped().unwrap().ammo_in_clip, 12);
    }

    #[test]
    fn test_piercing_bullet_hits_each_monster_once() {
        let mut state = GameState::empty(1);
        let a = add_monster(&mut state, MonsterKind::Normal, Vec2::new(200.0, 0.0), 100.0);
        let mut weapon = Weapon::starter_pistol();
        weapon.piercing = 1;
        weapon.crit_chance = 0.0;
        let center = state.monsters[0].center();
        let id = state.next_entity_id();
        state.bullets.push(Bullet::from_weapon(
            id,
            BulletOwner::Player,
            center,
            0.0,
            10.0,
            &weapon,
            0.0,
        ));
        update_bullets(&mut state, 16.0);
        update_bullets(&mut state, 32.0);
        assert_eq!(state.monsters[0].health, 90.0);
        assert_eq!(state.bullets[0].piercing_left, 1);
        assert_eq!(state.targeted_monsters[0].map(|l| l.id), Some(a));
    }

    #[test]
    fn test_invincible_monster_consumes_piercing() {
        let mut state = GameState::empty(1);
        add_monster(&mut state, MonsterKind::Normal, Vec2::new(200.0, 0.0), 100.0);
        state.monsters[0].invincible_until = 1000.0;
        let center = state.monsters[0].center();
        let id = state.next_entity_id();
        state.bullets.push(Bullet::from_weapon(
            id,
            BulletOwner::Player,
            center,
            0.0,
            10.0,
            &Weapon::starter_pistol(),
            0.0,
        ));
        update_bullets(&mut state, 16.0);
        assert!(state.bullets.is_empty());
        assert_eq!(state.monsters[0].health, 100.0);
    }

    #[test]
    fn test_bullets_chip_obstacles() {
        let mut state = GameState::empty(1);
        let pos = state.player.pos + Vec2::new(100.0, 0.0);
        let id = state.next_entity_id();
        state.obstacles.push(Obstacle {
            id,
            pos,
            size: Vec2::splat(50.0),
            health: 5.0,
            max_health: 5.0,
        });
        let bullet_id = state.next_entity_id();
        state.bullets.push(Bullet::from_weapon(
            bullet_id,
            BulletOwner::Player,
            pos + Vec2::splat(25.0),
            0.0,
            10.0,
            &Weapon::starter_pistol(),
            0.0,
        ));
        update_bullets(&mut state, 16.0);
        assert!(state.obstacles.is_empty());
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_impact_effect_leaves_zone() {
        let mut state = GameState::empty(1);
        let mut weapon = Weapon::starter_pistol();
        weapon.on_impact = Some(ImpactEffect::poison(4.0));
        let id = state.next_entity_id();
        let center = state.player.center();
        state.bullets.push(Bullet::from_weapon(
            id,
            BulletOwner::Player,
            center,
            0.0,
            10.0,
            &weapon,
            0.0,
        ));
        update_bullets(&mut state, BULLET_LIFESPAN_MS + 1.0);
        assert_eq!(state.damage_zones.len(), 1);
        assert_eq!(state.damage_zones[0].side, ZoneSide::Player);
    }

    #[test]
    fn test_enemy_bullet_respects_shield() {
        let mut state = GameState::empty(1);
        state.player.max_shield = 50.0;
        state.player.shield = 50.0;
        let id = state.next_entity_id();
        let center = state.player.center();
        state
            .enemy_bullets
            .push(EnemyBullet::new(id, center, Vec2::ZERO, 40.0, 0.0));
        update_enemy_bullets(&mut state, 16.0);
        assert!(state.enemy_bullets.is_empty());
        assert!((state.player.shield - 10.0).abs() < 1e-4);
        assert!((state.player.health - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_homing_turn_is_capped() {
        let vel = steer(Vec2::new(3.0, 0.0), Vec2::new(0.0, 100.0), 0.05, 3.0);
        assert!((angle_of(vel) - 0.05).abs() < 1e-5);
        assert!((vel.length() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_contact_damage_grants_grace_and_thorns() {
        let mut state = GameState::empty(1);
        state.player.thorns = 5.0;
        add_monster(&mut state, MonsterKind::Normal, Vec2::new(4.0, 0.0), 30.0);
        add_monster(&mut state, MonsterKind::Normal, Vec2::new(-4.0, 0.0), 30.0);
        apply_contact_damage(&mut state, 100.0);
        assert_eq!(state.player.health, PLAYER_MAX_HEALTH - 10.0);
        assert_eq!(state.player.invincible_until, 100.0 + CONTACT_INVINCIBILITY_MS);
        assert_eq!(state.monsters[0].health, 25.0);
        assert_eq!(state.monsters[1].health, 30.0);
    }

    #[test]
    fn test_allies_take_contact_damage_at_most_every_half_second() {
        let mut state = GameState::empty(1);
        let id = state.next_entity_id();
        let pos = state.player.pos + Vec2::new(400.0, 0.0);
        state
            .allies
            .push(Ally::new(id, pos, AllyBehavior::ResoluteRecruit, 0.0));
        add_monster(&mut state, MonsterKind::Normal, Vec2::new(404.0, 0.0), 30.0);
        apply_contact_damage(&mut state, 100.0);
        apply_contact_damage(&mut state, 200.0);
        assert_eq!(state.allies[0].health, 70.0);
    }

    #[test]
    fn test_orbital_shield_hits_with_cooldown() {
        let mut state = GameState::empty(1);
        state.player.orbital = Some(OrbitalShield {
            count: 1,
            damage: 7.0,
            speed: 0.0,
            radius: 60.0,
            angle: 0.0,
        });
        let center = state.player.center() + Vec2::new(60.0, 0.0);
        let id = state.next_entity_id();
        state.monsters.push(Monster::new(
            id,
            MonsterKind::Normal,
            center - Vec2::splat(14.0),
            30.0,
            0.0,
        ));
        update_orbital(&mut state, 100.0);
        update_orbital(&mut state, 200.0);
        assert_eq!(state.monsters[0].health, 23.0);
    }

    #[test]
    fn test_poison_zone_slows_and_pulses() {
        let mut state = GameState::empty(1);
        add_monster(&mut state, MonsterKind::Normal, Vec2::new(200.0, 0.0), 30.0);
        let center = state.monsters[0].center();
        let id = state.next_entity_id();
        state.damage_zones.push(DamageZone::from_impact(
            id,
            center,
            &ImpactEffect::poison(4.0),
            ZoneSide::Player,
            0.0,
        ));
        update_damage_zones(&mut state, 100.0);
        assert_eq!(state.monsters[0].health, 30.0);
        assert!(state.monsters[0].effective_speed(100.0) < state.monsters[0].speed);
        update_damage_zones(&mut state, 500.0);
        assert_eq!(state.monsters[0].health, 26.0);
    }

    #[test]
    fn test_kill_pays_out_once() {
        let mut state = GameState::empty(1);
        add_monster(&mut state, MonsterKind::Normal, Vec2::new(500.0, 0.0), 30.0);
        state.monsters[0].health = 0.0;
        resolve_kills(&mut state, 100.0);
        resolve_kills(&mut state, 116.0);
        assert_eq!(state.total_kills, 1);
        assert_eq!(state.score, 10);
        assert_eq!(state.wave.monsters_killed_this_wave, 1);
        assert_eq!(state.monsters[0].dies_at, Some(100.0));
        assert!(state.achievements.contains(&AchievementId::FirstBlood));
        assert!(
            state
                .pickups
                .iter()
                .any(|p| matches!(p.kind, PickupKind::Gem { xp } if xp == 1.0))
        );
    }

    #[test]
    fn test_bloater_splits_and_elite_drops_weapon() {
        let mut state = GameState::empty(1);
        add_monster(&mut state, MonsterKind::Bloater, Vec2::new(500.0, 0.0), 60.0);
        add_monster(&mut state, MonsterKind::Elite, Vec2::new(-500.0, 0.0), 120.0);
        state.monsters[0].health = 0.0;
        state.monsters[1].health = 0.0;
        resolve_kills(&mut state, 100.0);
        let minions = state
            .monsters
            .iter()
            .filter(|m| m.kind == MonsterKind::Minion)
            .count();
        assert_eq!(minions, BLOATER_SPLIT_COUNT);
        assert!(
            state
                .pickups
                .iter()
                .any(|p| matches!(p.kind, PickupKind::Weapon(_)))
        );
    }

    #[test]
    fn test_boss_kill_flags_wave_and_scores_by_wave() {
        let mut state = GameState::empty(1);
        state.wave.wave = 3;
        add_monster(&mut state, MonsterKind::Boss, Vec2::new(500.0, 0.0), 100.0);
        state.monsters[0].health = 0.0;
        resolve_kills(&mut state, 100.0);
        assert!(state.wave.boss_defeated);
        assert_eq!(state.score, 3000);
        assert!(state.achievements.contains(&AchievementId::BossSlayer));
    }

    #[test]
    fn test_enemy_bullets_fly_over_obstacles() {
        let mut state = GameState::empty(1);
        let pos = state.player.pos + Vec2::new(600.0, 0.0);
        let id = state.next_entity_id();
        state.obstacles.push(Obstacle {
            id,
            pos,
            size: Vec2::splat(50.0),
            health: 5.0,
            max_health: 5.0,
        });
        let id = state.next_entity_id();
        let center = pos + Vec2::splat(25.0);
        state
            .enemy_bullets
            .push(EnemyBullet::new(id, center, Vec2::new(1.0, 0.0), 10.0, 0.0));

        update_enemy_bullets(&mut state, 16.0);
        assert_eq!(state.enemy_bullets.len(), 1);
        assert_eq!(state.obstacles[0].health, 5.0);
    }
}
