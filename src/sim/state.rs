//! Game state and core simulation types
//!
//! One `GameState` value is the whole frame: every entity collection, the
//! wave director's counters, the RNG and the UI event queue.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::director::{self, TimedEvent, WaveState};
use super::events::{AchievementId, UiEvent, UiEventKind};
use super::geometry::{Body, Rect};
use super::progression::UpgradeId;
use super::rng::SimRng;
use super::weapon::{ImpactEffect, Weapon, ZoneKind};
use crate::consts::*;
use crate::settings::Settings;
use crate::world_center;

/// Opaque entity identifier, unique for the lifetime of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Monotonic id source; ids are never reused
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! impl_body {
    ($($ty:ty),* $(,)?) => {
        $(impl Body for $ty {
            fn pos(&self) -> Vec2 {
                self.pos
            }

            fn size(&self) -> Vec2 {
                self.size
            }
        })*
    };
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Player stats that upgrades and buffs can modify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stat {
    MaxHealth,
    MaxShield,
    ShieldAbsorption,
    Speed,
    BaseDamage,
    DamageMultiplier,
    GemMagnetRadius,
    Thorns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatOp {
    Add,
    Multiply,
}

impl StatOp {
    pub fn apply(self, base: f32, value: f32) -> f32 {
        match self {
            StatOp::Add => base + value,
            StatOp::Multiply => base * value,
        }
    }
}

/// Time-boxed stat modifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Buff {
    pub stat: Stat,
    pub op: StatOp,
    pub value: f32,
    pub expires_at: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReloadState {
    pub is_reloading: bool,
    pub reload_until: f64,
}

/// Orbs circling the player that damage monsters on contact
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalShield {
    pub count: u32,
    pub damage: f32,
    /// Radians per tick
    pub speed: f32,
    pub radius: f32,
    pub angle: f32,
}

/// Collectible artifacts granted by the artifact upgrade pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactId {
    ThornedMantle,
    LodestoneCharm,
    AegisCore,
    BerserkerSigil,
    WindrunnerBoots,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: EntityId,
    pub pos: Vec2,
    pub size: Vec2,
    /// Last non-zero movement direction (fallback aim)
    pub facing: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub shield: f32,
    pub max_shield: f32,
    /// Fraction of shield-covered damage that is absorbed
    pub shield_absorption: f32,
    pub speed: f32,
    pub base_damage: f32,
    pub damage_multiplier: f32,
    pub gem_magnet_radius: f32,
    /// Damage reflected onto monsters that touch the player
    pub thorns: f32,
    pub level: u32,
    pub xp: f32,
    pub xp_to_next_level: f32,
    pub artifacts: Vec<ArtifactId>,
    pub buffs: Vec<Buff>,
    pub invincible_until: f64,
    pub reload: ReloadState,
    pub weapons: Vec<Weapon>,
    pub equipped_weapon: usize,
    pub last_shot_at: f64,
    pub orbital: Option<OrbitalShield>,
}

impl_body!(Player);

impl Player {
    pub fn new(id: EntityId, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            size: Vec2::splat(PLAYER_SIZE),
            facing: Vec2::X,
            health: PLAYER_MAX_HEALTH,
            max_health: PLAYER_MAX_HEALTH,
            shield: 0.0,
            max_shield: 0.0,
            shield_absorption: 0.75,
            speed: PLAYER_BASE_SPEED,
            base_damage: 0.0,
            damage_multiplier: 1.0,
            gem_magnet_radius: PLAYER_GEM_MAGNET_RADIUS,
            thorns: 0.0,
            level: 1,
            xp: 0.0,
            xp_to_next_level: PLAYER_XP_TO_FIRST_LEVEL,
            artifacts: Vec::new(),
            buffs: Vec::new(),
            invincible_until: 0.0,
            reload: ReloadState::default(),
            weapons: vec![Weapon::starter_pistol()],
            equipped_weapon: 0,
            last_shot_at: f64::NEG_INFINITY,
            orbital: None,
        }
    }

    fn base_stat(&self, stat: Stat) -> f32 {
        match stat {
            Stat::MaxHealth => self.max_health,
            Stat::MaxShield => self.max_shield,
            Stat::ShieldAbsorption => self.shield_absorption,
            Stat::Speed => self.speed,
            Stat::BaseDamage => self.base_damage,
            Stat::DamageMultiplier => self.damage_multiplier,
            Stat::GemMagnetRadius => self.gem_magnet_radius,
            Stat::Thorns => self.thorns,
        }
    }

    pub fn stat_mut(&mut self, stat: Stat) -> &mut f32 {
        match stat {
            Stat::MaxHealth => &mut self.max_health,
            Stat::MaxShield => &mut self.max_shield,
            Stat::ShieldAbsorption => &mut self.shield_absorption,
            Stat::Speed => &mut self.speed,
            Stat::BaseDamage => &mut self.base_damage,
            Stat::DamageMultiplier => &mut self.damage_multiplier,
            Stat::GemMagnetRadius => &mut self.gem_magnet_radius,
            Stat::Thorns => &mut self.thorns,
        }
    }

    /// Stat value with active buffs folded in (adds first, then multipliers)
    pub fn effective(&self, stat: Stat, now: f64) -> f32 {
        let active = || self.buffs.iter().filter(move |b| b.stat == stat && b.expires_at > now);
        let added = active()
            .filter(|b| b.op == StatOp::Add)
            .fold(self.base_stat(stat), |acc, b| acc + b.value);
        active()
            .filter(|b| b.op == StatOp::Multiply)
            .fold(added, |acc, b| acc * b.value)
    }

    /// Per-pellet damage for a weapon hit before crits
    pub fn bullet_damage(&self, weapon: &Weapon, now: f64) -> f32 {
        (weapon.damage + self.effective(Stat::BaseDamage, now))
            * self.effective(Stat::DamageMultiplier, now).max(0.0)
    }

    pub fn equipped(&self) -> Option<&Weapon> {
        self.weapons.get(self.equipped_weapon)
    }

    pub fn equipped_mut(&mut self) -> Option<&mut Weapon> {
        self.weapons.get_mut(self.equipped_weapon)
    }

    /// Apply incoming damage through the shield; returns health lost
    ///
    /// `absorbed = min(shield, dmg) * shield_absorption` never reaches health;
    /// the shield itself is drained by `min(shield, dmg)`.
    pub fn take_damage(&mut self, amount: f32, now: f64) -> f32 {
        if amount <= 0.0 || now < self.invincible_until {
            return 0.0;
        }
        let covered = self.shield.min(amount);
        let absorbed = covered * self.shield_absorption.clamp(0.0, 1.0);
        self.shield = (self.shield - covered).max(0.0);
        let remaining = amount - absorbed;
        let before = self.health;
        self.health = (self.health - remaining).max(0.0);
        before - self.health
    }

    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.health;
        self.health = (self.health + amount.max(0.0)).min(self.max_health);
        self.health - before
    }

    /// Re-establish `0 <= health <= max_health`, `0 <= shield <= max_shield`
    pub fn clamp_vitals(&mut self) {
        self.max_health = self.max_health.max(1.0);
        self.max_shield = self.max_shield.max(0.0);
        self.health = self.health.clamp(0.0, self.max_health);
        self.shield = self.shield.clamp(0.0, self.max_shield);
    }

    /// Health as a display percentage in [0, 100]
    pub fn health_percent(&self) -> f32 {
        (self.health / self.max_health.max(1.0) * 100.0).clamp(0.0, 100.0)
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

// ---------------------------------------------------------------------------
// Allies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllyBehavior {
    /// Holds position beside the player and shoots
    ResoluteRecruit,
    /// Backs away from anything close before shooting
    EvasionFirst,
    /// Charges the nearest monster
    DaringBreakout,
}

impl AllyBehavior {
    pub const ALL: [AllyBehavior; 3] = [
        AllyBehavior::ResoluteRecruit,
        AllyBehavior::EvasionFirst,
        AllyBehavior::DaringBreakout,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ally {
    pub id: EntityId,
    pub pos: Vec2,
    pub size: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    pub weapon: Weapon,
    pub behavior: AllyBehavior,
    pub disappears_at: f64,
    pub dialogue: Option<super::events::DialogueLine>,
    pub last_shot_at: f64,
    pub last_hurt_at: f64,
}

impl_body!(Ally);

impl Ally {
    pub fn new(id: EntityId, pos: Vec2, behavior: AllyBehavior, now: f64) -> Self {
        Self {
            id,
            pos,
            size: Vec2::splat(PLAYER_SIZE),
            health: 80.0,
            max_health: 80.0,
            speed: PLAYER_BASE_SPEED * 0.9,
            weapon: Weapon::ally_carbine(),
            behavior,
            disappears_at: now + ALLY_LIFETIME_MS,
            dialogue: None,
            last_shot_at: f64::NEG_INFINITY,
            last_hurt_at: f64::NEG_INFINITY,
        }
    }

    pub fn is_gone(&self, now: f64) -> bool {
        self.health <= 0.0 || now > self.disappears_at
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount.max(0.0)).max(0.0);
    }
}

// ---------------------------------------------------------------------------
// Monsters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonsterKind {
    Normal,
    Elite,
    Shooter,
    ShotgunShooter,
    Healer,
    Summoner,
    Minion,
    Bloater,
    Wisp,
    LichGuard,
    Boss,
}

/// Unscaled archetype stats
#[derive(Debug, Clone, Copy)]
pub struct MonsterStats {
    pub health: f32,
    pub speed: f32,
    pub size: f32,
    pub damage: f32,
    pub xp: f32,
}

impl MonsterKind {
    /// Parse an external type tag; unknown tags fall back to `Normal`
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "normal" => MonsterKind::Normal,
            "elite" => MonsterKind::Elite,
            "shooter" => MonsterKind::Shooter,
            "shotgun_shooter" | "shotgunshooter" => MonsterKind::ShotgunShooter,
            "healer" => MonsterKind::Healer,
            "summoner" => MonsterKind::Summoner,
            "minion" => MonsterKind::Minion,
            "bloater" => MonsterKind::Bloater,
            "wisp" => MonsterKind::Wisp,
            "lich_guard" | "lichguard" => MonsterKind::LichGuard,
            "boss" => MonsterKind::Boss,
            other => {
                log::warn!("Unknown monster archetype {other:?}, using normal behavior");
                MonsterKind::Normal
            }
        }
    }

    pub fn stats(self) -> MonsterStats {
        let (health, speed, size, damage, xp) = match self {
            MonsterKind::Normal => (30.0, 2.0, 28.0, 10.0, 1.0),
            MonsterKind::Elite => (120.0, 1.8, 40.0, 20.0, 5.0),
            MonsterKind::Shooter => (25.0, 1.8, 28.0, 8.0, 2.0),
            MonsterKind::ShotgunShooter => (35.0, 1.6, 30.0, 8.0, 3.0),
            MonsterKind::Healer => (40.0, 1.7, 28.0, 5.0, 3.0),
            MonsterKind::Summoner => (50.0, 1.5, 32.0, 5.0, 4.0),
            MonsterKind::Minion => (10.0, 2.6, 18.0, 5.0, 0.5),
            MonsterKind::Bloater => (60.0, 1.2, 44.0, 15.0, 3.0),
            MonsterKind::Wisp => (30.0, 2.2, 24.0, 8.0, 4.0),
            MonsterKind::LichGuard => (150.0, 1.4, 38.0, 25.0, 6.0),
            MonsterKind::Boss => (800.0, 1.6, 96.0, 30.0, 50.0),
        };
        MonsterStats {
            health,
            speed,
            size,
            damage,
            xp,
        }
    }

    pub fn is_boss(self) -> bool {
        self == MonsterKind::Boss
    }
}

/// Phase of the wisp's teleport cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WispPhase {
    Idle,
    Teleporting { started_at: f64 },
    Charging { since: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WispState {
    pub phase: WispPhase,
    pub last_teleport_at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossMode {
    Hesitate,
    Barrage,
    Charging,
    Dashing,
    Throwing,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BossState {
    pub mode: BossMode,
    pub mode_started_at: f64,
    /// Health tier 1..=3; only ever rises
    pub phase: u8,
    pub barrage_angle: f32,
    pub dash_dir: Vec2,
    pub last_throw_at: f64,
    pub last_minion_spawn_at: f64,
}

impl BossState {
    pub fn new(now: f64) -> Self {
        Self {
            mode: BossMode::Hesitate,
            mode_started_at: now,
            phase: 1,
            barrage_angle: 0.0,
            dash_dir: Vec2::ZERO,
            last_throw_at: f64::NEG_INFINITY,
            last_minion_spawn_at: now,
        }
    }

    pub fn enter(&mut self, mode: BossMode, now: f64) {
        self.mode = mode;
        self.mode_started_at = now;
    }
}

/// Archetype-specific AI memory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AiState {
    None,
    Kiting {
        strafe_direction: f32,
        last_flip_at: f64,
    },
    Wisp(WispState),
    Boss(BossState),
}

impl AiState {
    pub fn initial(kind: MonsterKind, now: f64) -> Self {
        match kind {
            MonsterKind::Shooter | MonsterKind::ShotgunShooter => AiState::Kiting {
                strafe_direction: 1.0,
                last_flip_at: now,
            },
            MonsterKind::Wisp => AiState::Wisp(WispState {
                phase: WispPhase::Idle,
                last_teleport_at: now,
            }),
            MonsterKind::Boss => AiState::Boss(BossState::new(now)),
            _ => AiState::None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monster {
    pub id: EntityId,
    pub kind: MonsterKind,
    pub pos: Vec2,
    pub size: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    /// Contact damage
    pub damage: f32,
    pub xp_value: f32,
    pub ai: AiState,
    /// Set once health reaches zero; drives the death animation window
    pub dies_at: Option<f64>,
    pub empowered_level: u32,
    pub weapon: Option<Weapon>,
    pub invincible_until: f64,
    /// Untargetable and non-colliding (teleporting wisp)
    pub hidden: bool,
    pub last_shot_at: f64,
    /// Last heal or summon
    pub last_special_at: f64,
    pub slowed_until: f64,
    pub slow_factor: f32,
    pub last_orbital_hit_at: f64,
}

impl_body!(Monster);

impl Monster {
    pub fn new(id: EntityId, kind: MonsterKind, pos: Vec2, health: f32, now: f64) -> Self {
        let stats = kind.stats();
        let weapon = match kind {
            MonsterKind::Shooter => Some(Weapon::enemy_rifle()),
            MonsterKind::ShotgunShooter => Some(Weapon::enemy_shotgun()),
            _ => None,
        };
        Self {
            id,
            kind,
            pos,
            size: Vec2::splat(stats.size),
            health,
            max_health: health,
            speed: stats.speed,
            damage: stats.damage,
            xp_value: stats.xp,
            ai: AiState::initial(kind, now),
            dies_at: None,
            empowered_level: 0,
            weapon,
            invincible_until: 0.0,
            hidden: false,
            last_shot_at: now,
            last_special_at: now,
            slowed_until: 0.0,
            slow_factor: 1.0,
            last_orbital_hit_at: f64::NEG_INFINITY,
        }
    }

    /// Scale health, damage and xp by an empowerment tier
    pub fn empower(&mut self, level: u32) {
        if level == 0 {
            return;
        }
        let lvl = level as f32;
        self.empowered_level = level;
        self.max_health *= 1.0 + 0.5 * lvl;
        self.health = self.max_health;
        self.damage *= 1.0 + 0.25 * lvl;
        self.xp_value *= 1.0 + lvl;
    }

    pub fn is_dying(&self) -> bool {
        self.dies_at.is_some()
    }

    /// Can be hit by bullets and chosen as a target
    pub fn is_targetable(&self) -> bool {
        !self.is_dying() && !self.hidden
    }

    pub fn effective_speed(&self, now: f64) -> f32 {
        if now < self.slowed_until {
            self.speed * self.slow_factor
        } else {
            self.speed
        }
    }

    /// Apply damage unless invincible; returns health lost
    pub fn take_damage(&mut self, amount: f32, now: f64) -> f32 {
        if amount <= 0.0 || now < self.invincible_until || self.is_dying() {
            return 0.0;
        }
        let before = self.health;
        self.health = (self.health - amount).max(0.0);
        before - self.health
    }

    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.health;
        self.health = (self.health + amount.max(0.0)).min(self.max_health);
        self.health - before
    }

    pub fn boss_phase(&self) -> Option<u8> {
        match self.ai {
            AiState::Boss(boss) => Some(boss.phase),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Projectiles and zones
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletOwner {
    Player,
    Ally(EntityId),
}

/// Player- or ally-fired projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: EntityId,
    pub owner: BulletOwner,
    pub pos: Vec2,
    pub size: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    /// Hits left before the bullet is consumed
    pub piercing_left: i32,
    pub crit_chance: f32,
    pub crit_damage: f32,
    pub spawned_at: f64,
    pub on_impact: Option<ImpactEffect>,
    /// Monsters already struck (never hit twice)
    pub hit_ids: Vec<EntityId>,
}

impl_body!(Bullet);

impl Bullet {
    pub fn from_weapon(
        id: EntityId,
        owner: BulletOwner,
        center: Vec2,
        angle: f32,
        damage: f32,
        weapon: &Weapon,
        now: f64,
    ) -> Self {
        let size = Vec2::splat(BULLET_SIZE);
        Self {
            id,
            owner,
            pos: center - size / 2.0,
            size,
            vel: crate::direction_from_angle(angle) * weapon.bullet_speed,
            damage,
            piercing_left: weapon.piercing as i32 + 1,
            crit_chance: weapon.crit_chance,
            crit_damage: weapon.crit_damage,
            spawned_at: now,
            on_impact: weapon.on_impact,
            hit_ids: Vec::new(),
        }
    }
}

/// Monster-fired projectile with straight-line motion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyBullet {
    pub id: EntityId,
    pub pos: Vec2,
    pub size: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    pub spawned_at: f64,
    pub lifespan_ms: f64,
    pub on_impact: Option<ImpactEffect>,
}

impl_body!(EnemyBullet);

impl EnemyBullet {
    pub fn new(id: EntityId, center: Vec2, vel: Vec2, damage: f32, now: f64) -> Self {
        let size = Vec2::splat(BULLET_SIZE);
        Self {
            id,
            pos: center - size / 2.0,
            size,
            vel,
            damage,
            spawned_at: now,
            lifespan_ms: ENEMY_BULLET_LIFESPAN_MS,
            on_impact: None,
        }
    }
}

/// Projectile that steers toward a target by at most `turn_speed` per tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomingEnemyBullet {
    pub id: EntityId,
    pub pos: Vec2,
    pub size: Vec2,
    pub vel: Vec2,
    pub speed: f32,
    pub damage: f32,
    pub target_id: EntityId,
    pub turn_speed: f32,
    pub spawned_at: f64,
}

impl_body!(HomingEnemyBullet);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneSide {
    /// Hurts monsters
    Player,
    /// Hurts the player and allies
    Enemy,
}

/// Lingering circular hazard left by an impact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageZone {
    pub id: EntityId,
    pub center: Vec2,
    pub radius: f32,
    pub kind: ZoneKind,
    pub damage: f32,
    pub slow: Option<f32>,
    pub side: ZoneSide,
    pub created_at: f64,
    pub expires_at: f64,
    pub last_tick_at: f64,
}

impl DamageZone {
    pub fn from_impact(
        id: EntityId,
        center: Vec2,
        effect: &ImpactEffect,
        side: ZoneSide,
        now: f64,
    ) -> Self {
        Self {
            id,
            center,
            radius: effect.radius,
            kind: effect.kind,
            damage: effect.damage,
            slow: effect.slow,
            side,
            created_at: now,
            expires_at: now + effect.duration_ms,
            last_tick_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// World objects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: EntityId,
    pub pos: Vec2,
    pub size: Vec2,
    pub health: f32,
    pub max_health: f32,
}

impl_body!(Obstacle);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplosiveBarrel {
    pub id: EntityId,
    pub pos: Vec2,
    pub size: Vec2,
    pub health: f32,
    pub vel: Vec2,
    /// Contact triggers are ignored before this time
    pub armed_at: f64,
}

impl_body!(ExplosiveBarrel);

impl ExplosiveBarrel {
    pub fn new(id: EntityId, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            size: Vec2::splat(BARREL_SIZE),
            health: BARREL_HEALTH,
            vel: Vec2::ZERO,
            armed_at: 0.0,
        }
    }

    pub fn is_armed(&self, now: f64) -> bool {
        now >= self.armed_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosion {
    pub id: EntityId,
    pub center: Vec2,
    pub radius: f32,
    pub damage: f32,
    pub created_at: f64,
    pub expires_at: f64,
}

/// Temporary power-up carried by a pickup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuffSpec {
    pub stat: Stat,
    pub op: StatOp,
    pub value: f32,
    pub duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PickupKind {
    Gem { xp: f32 },
    Health { amount: f32 },
    Chest,
    Weapon(Box<Weapon>),
    PowerUp(BuffSpec),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: EntityId,
    pub pos: Vec2,
    pub size: Vec2,
    pub kind: PickupKind,
}

impl_body!(Pickup);

impl Pickup {
    pub fn new(id: EntityId, center: Vec2, kind: PickupKind) -> Self {
        let side = match kind {
            PickupKind::Gem { .. } => 12.0,
            PickupKind::Chest => 36.0,
            _ => 20.0,
        };
        let size = Vec2::splat(side);
        Self {
            id,
            pos: center - size / 2.0,
            size,
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    Afterimage,
    BossTelegraph,
    Heal,
    Summon,
}

/// Cosmetic marker for the renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualEffect {
    pub id: EntityId,
    pub kind: EffectKind,
    pub pos: Vec2,
    pub created_at: f64,
    pub expires_at: f64,
}

/// Display-only record of a recently hit target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetLock {
    pub id: EntityId,
    pub expires_at: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Camera {
    pub pos: Vec2,
}

// ---------------------------------------------------------------------------
// Aggregate root
// ---------------------------------------------------------------------------

/// Complete frame state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub rng: SimRng,
    pub ids: IdAllocator,
    /// Timestamp of the last processed tick
    pub time_ms: f64,
    pub tick_count: u64,
    pub score: u64,
    pub total_kills: u32,
    pub difficulty_modifier: f32,
    pub event_lifespan_ms: f64,

    pub player: Player,
    pub allies: Vec<Ally>,
    pub monsters: Vec<Monster>,
    pub bullets: Vec<Bullet>,
    pub enemy_bullets: Vec<EnemyBullet>,
    pub homing_bullets: Vec<HomingEnemyBullet>,
    pub damage_zones: Vec<DamageZone>,
    pub pickups: Vec<Pickup>,
    pub obstacles: Vec<Obstacle>,
    pub barrels: Vec<ExplosiveBarrel>,
    pub explosions: Vec<Explosion>,
    pub effects: Vec<VisualEffect>,
    pub events: Vec<UiEvent>,

    pub wave: WaveState,
    pub timed_event: Option<TimedEvent>,
    pub camera: Camera,
    pub last_spawn_at: f64,
    pub last_ally_at: f64,

    pub targeted_monsters: [Option<TargetLock>; TARGET_LOCK_SLOTS],
    pub targeted_obstacle: Option<TargetLock>,
    pub achievements: Vec<AchievementId>,

    pub is_paused: bool,
    pub is_leveling_up: bool,
    pub is_game_over: bool,
    pub pending_choices: Vec<UpgradeId>,
}

impl GameState {
    /// Create a new run with the given seed
    pub fn new(seed: u64, settings: &Settings) -> Self {
        let mut ids = IdAllocator::new();
        let player_size = Vec2::splat(PLAYER_SIZE);
        let player = Player::new(ids.next_id(), world_center() - player_size / 2.0);

        let mut state = Self {
            rng: SimRng::new(seed),
            ids,
            time_ms: 0.0,
            tick_count: 0,
            score: 0,
            total_kills: 0,
            difficulty_modifier: settings.difficulty.modifier(),
            event_lifespan_ms: settings.ui_event_lifespan_ms,
            player,
            allies: Vec::new(),
            monsters: Vec::new(),
            bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            homing_bullets: Vec::new(),
            damage_zones: Vec::new(),
            pickups: Vec::new(),
            obstacles: Vec::new(),
            barrels: Vec::new(),
            explosions: Vec::new(),
            effects: Vec::new(),
            events: Vec::new(),
            wave: WaveState::new(),
            timed_event: None,
            camera: Camera::default(),
            last_spawn_at: 0.0,
            last_ally_at: 0.0,
            targeted_monsters: [None; TARGET_LOCK_SLOTS],
            targeted_obstacle: None,
            achievements: Vec::new(),
            is_paused: false,
            is_leveling_up: false,
            is_game_over: false,
            pending_choices: Vec::new(),
        };

        director::regenerate_field(&mut state);
        director::announce_wave(&mut state, 0.0);
        state
    }

    /// An empty arena (no obstacles, no announcement) for focused scenarios
    pub fn empty(seed: u64) -> Self {
        let mut state = Self::new(seed, &Settings::default());
        state.obstacles.clear();
        state.barrels.clear();
        state.events.clear();
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        self.ids.next_id()
    }

    /// Queue a UI event stamped with the current time
    pub fn push_event(&mut self, kind: UiEventKind, now: f64) {
        let id = self.ids.next_id();
        self.events.push(UiEvent {
            id,
            kind,
            created_at: now,
            lifespan_ms: self.event_lifespan_ms,
        });
    }

    /// Record an achievement once; repeated unlocks are ignored
    pub fn unlock(&mut self, achievement: AchievementId, now: f64) {
        if self.achievements.contains(&achievement) {
            return;
        }
        log::info!("Achievement unlocked: {achievement:?}");
        self.achievements.push(achievement);
        self.push_event(UiEventKind::AchievementUnlocked(achievement), now);
    }

    pub fn obstacle_rects(&self) -> Vec<Rect> {
        self.obstacles.iter().map(Body::rect).collect()
    }

    /// Live (non-dying) monsters other than the boss
    pub fn live_non_boss_count(&self) -> usize {
        self.monsters
            .iter()
            .filter(|m| !m.is_dying() && !m.kind.is_boss())
            .count()
    }

    pub fn live_monster_count(&self) -> usize {
        self.monsters.iter().filter(|m| !m.is_dying()).count()
    }

    pub fn add_effect(&mut self, kind: EffectKind, pos: Vec2, duration_ms: f64, now: f64) {
        let id = self.ids.next_id();
        self.effects.push(VisualEffect {
            id,
            kind,
            pos,
            created_at: now,
            expires_at: now + duration_ms,
        });
    }

    /// Keep collections sorted by id for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.monsters.sort_by_key(|m| m.id);
        self.allies.sort_by_key(|a| a.id);
        self.bullets.sort_by_key(|b| b.id);
        self.enemy_bullets.sort_by_key(|b| b.id);
        self.homing_bullets.sort_by_key(|b| b.id);
        self.pickups.sort_by_key(|p| p.id);
        self.barrels.sort_by_key(|b| b.id);
    }
}
