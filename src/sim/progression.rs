//! Leveling, upgrades, pickups and profile cards

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::events::{AchievementId, UiEventKind};
use super::geometry::{Body, toroidal_delta};
use super::state::{ArtifactId, Buff, GameState, Pickup, PickupKind, Player, Stat, StatOp};
use super::weapon::{Weapon, WeaponModifier, generate_weapon};
use crate::consts::*;

/// Pixels per tick a magnetized gem travels toward the player
const GEM_PULL_SPEED: f32 = 8.0;
const CHEST_FALLBACK_HEAL: f32 = 25.0;
pub const CHOICES_PER_LEVEL: usize = 3;

/// A single effect an upgrade or card applies to the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UpgradeEffect {
    StatMod {
        stat: Stat,
        op: StatOp,
        value: f32,
    },
    /// Applies to every weapon slot
    WeaponMod {
        modifier: WeaponModifier,
        value: f32,
    },
    /// Fraction of max health
    Heal {
        percent: f32,
    },
    AddShield {
        amount: f32,
    },
    /// Merged field-wise (max) with an existing shield
    OrbitalShield {
        count: u32,
        damage: f32,
        speed: f32,
        radius: f32,
    },
    TimedBuff {
        stat: Stat,
        op: StatOp,
        value: f32,
        duration_ms: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradePool {
    Standard,
    Cursed,
    Artifact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeId {
    // Standard
    Vitality,
    Swiftness,
    HeavyRounds,
    RapidFire,
    Multishot,
    Penetrator,
    KeenEye,
    FieldMedic,
    Bulwark,
    Magnetism,
    OrbitalGuard,
    Adrenaline,
    // Cursed
    GlassCannon,
    BloodPact,
    Recklessness,
    // Artifacts
    ThornedMantle,
    LodestoneCharm,
    AegisCore,
    BerserkerSigil,
    WindrunnerBoots,
}

impl UpgradeId {
    pub const ALL: [UpgradeId; 20] = [
        UpgradeId::Vitality,
        UpgradeId::Swiftness,
        UpgradeId::HeavyRounds,
        UpgradeId::RapidFire,
        UpgradeId::Multishot,
        UpgradeId::Penetrator,
        UpgradeId::KeenEye,
        UpgradeId::FieldMedic,
        UpgradeId::Bulwark,
        UpgradeId::Magnetism,
        UpgradeId::OrbitalGuard,
        UpgradeId::Adrenaline,
        UpgradeId::GlassCannon,
        UpgradeId::BloodPact,
        UpgradeId::Recklessness,
        UpgradeId::ThornedMantle,
        UpgradeId::LodestoneCharm,
        UpgradeId::AegisCore,
        UpgradeId::BerserkerSigil,
        UpgradeId::WindrunnerBoots,
    ];

    pub fn pool(self) -> UpgradePool {
        match self {
            UpgradeId::GlassCannon | UpgradeId::BloodPact | UpgradeId::Recklessness => {
                UpgradePool::Cursed
            }
            _ if self.artifact().is_some() => UpgradePool::Artifact,
            _ => UpgradePool::Standard,
        }
    }

    pub fn artifact(self) -> Option<ArtifactId> {
        match self {
            UpgradeId::ThornedMantle => Some(ArtifactId::ThornedMantle),
            UpgradeId::LodestoneCharm => Some(ArtifactId::LodestoneCharm),
            UpgradeId::AegisCore => Some(ArtifactId::AegisCore),
            UpgradeId::BerserkerSigil => Some(ArtifactId::BerserkerSigil),
            UpgradeId::WindrunnerBoots => Some(ArtifactId::WindrunnerBoots),
            _ => None,
        }
    }

    pub fn effects(self) -> Vec<UpgradeEffect> {
        use UpgradeEffect::*;
        let stat = |stat, op, value| StatMod { stat, op, value };
        let weapon = |modifier, value| WeaponMod { modifier, value };
        match self {
            UpgradeId::Vitality => vec![stat(Stat::MaxHealth, StatOp::Add, 20.0), Heal { percent: 0.2 }],
            UpgradeId::Swiftness => vec![stat(Stat::Speed, StatOp::Multiply, 1.1)],
            UpgradeId::HeavyRounds => vec![weapon(WeaponModifier::Damage, 0.15)],
            UpgradeId::RapidFire => vec![weapon(WeaponModifier::FireRate, 0.15)],
            UpgradeId::Multishot => vec![weapon(WeaponModifier::BulletCount, 1.0)],
            UpgradeId::Penetrator => vec![weapon(WeaponModifier::Piercing, 1.0)],
            UpgradeId::KeenEye => vec![
                weapon(WeaponModifier::CritChance, 0.05),
                weapon(WeaponModifier::CritDamage, 0.25),
            ],
            UpgradeId::FieldMedic => vec![Heal { percent: 0.5 }],
            UpgradeId::Bulwark => vec![AddShield { amount: 25.0 }],
            UpgradeId::Magnetism => vec![stat(Stat::GemMagnetRadius, StatOp::Multiply, 1.3)],
            UpgradeId::OrbitalGuard => vec![OrbitalShield {
                count: 2,
                damage: 10.0,
                speed: 0.05,
                radius: 70.0,
            }],
            UpgradeId::Adrenaline => vec![TimedBuff {
                stat: Stat::Speed,
                op: StatOp::Multiply,
                value: 1.5,
                duration_ms: 10_000.0,
            }],
            UpgradeId::GlassCannon => vec![
                stat(Stat::DamageMultiplier, StatOp::Multiply, 1.5),
                stat(Stat::MaxHealth, StatOp::Multiply, 0.7),
            ],
            UpgradeId::BloodPact => vec![
                stat(Stat::BaseDamage, StatOp::Add, 6.0),
                stat(Stat::ShieldAbsorption, StatOp::Add, -0.25),
            ],
            UpgradeId::Recklessness => vec![
                weapon(WeaponModifier::FireRate, 0.35),
                weapon(WeaponModifier::ReloadTime, -0.3),
            ],
            UpgradeId::ThornedMantle => vec![stat(Stat::Thorns, StatOp::Add, 10.0)],
            UpgradeId::LodestoneCharm => vec![stat(Stat::GemMagnetRadius, StatOp::Multiply, 2.0)],
            UpgradeId::AegisCore => vec![
                AddShield { amount: 50.0 },
                stat(Stat::ShieldAbsorption, StatOp::Add, 0.1),
            ],
            UpgradeId::BerserkerSigil => vec![stat(Stat::DamageMultiplier, StatOp::Multiply, 1.25)],
            UpgradeId::WindrunnerBoots => vec![stat(Stat::Speed, StatOp::Add, 1.0)],
        }
    }
}

/// Apply one effect, then re-clamp vitals
pub fn apply_effect(player: &mut Player, effect: &UpgradeEffect, now: f64) {
    match *effect {
        UpgradeEffect::StatMod { stat, op, value } => {
            let before = *player.stat_mut(stat);
            let after = op.apply(before, value);
            *player.stat_mut(stat) = after;
            // Growing max health also grants the new headroom
            if stat == Stat::MaxHealth && after > before {
                player.health += after - before;
            }
            if stat == Stat::ShieldAbsorption {
                player.shield_absorption = player.shield_absorption.clamp(0.0, 1.0);
            }
        }
        UpgradeEffect::WeaponMod { modifier, value } => {
            for weapon in &mut player.weapons {
                weapon.apply_modifier(modifier, value);
            }
        }
        UpgradeEffect::Heal { percent } => {
            player.heal(player.max_health * percent);
        }
        UpgradeEffect::AddShield { amount } => {
            player.max_shield += amount;
            player.shield += amount;
        }
        UpgradeEffect::OrbitalShield {
            count,
            damage,
            speed,
            radius,
        } => {
            let merged = match player.orbital {
                Some(existing) => super::state::OrbitalShield {
                    count: existing.count.max(count),
                    damage: existing.damage.max(damage),
                    speed: existing.speed.max(speed),
                    radius: existing.radius.max(radius),
                    angle: existing.angle,
                },
                None => super::state::OrbitalShield {
                    count,
                    damage,
                    speed,
                    radius,
                    angle: 0.0,
                },
            };
            player.orbital = Some(merged);
        }
        UpgradeEffect::TimedBuff {
            stat,
            op,
            value,
            duration_ms,
        } => player.buffs.push(Buff {
            stat,
            op,
            value,
            expires_at: now + duration_ms,
        }),
    }
    player.clamp_vitals();
}

fn draw_pool(state: &mut GameState) -> UpgradePool {
    let roll = state.rng.unit();
    if roll < 0.7 {
        UpgradePool::Standard
    } else if roll < 0.85 {
        UpgradePool::Cursed
    } else {
        UpgradePool::Artifact
    }
}

/// Three distinct upgrades; owned artifacts are never offered
pub fn draw_choices(state: &mut GameState) -> Vec<UpgradeId> {
    let mut choices: Vec<UpgradeId> = Vec::with_capacity(CHOICES_PER_LEVEL);
    while choices.len() < CHOICES_PER_LEVEL {
        let pool = draw_pool(state);
        let available = |pool: UpgradePool, choices: &[UpgradeId]| -> Vec<UpgradeId> {
            UpgradeId::ALL
                .iter()
                .copied()
                .filter(|u| u.pool() == pool && !choices.contains(u))
                .filter(|u| u.artifact().is_none_or(|a| !state.player.artifacts.contains(&a)))
                .collect()
        };
        let mut candidates = available(pool, &choices);
        if candidates.is_empty() {
            candidates = available(UpgradePool::Standard, &choices);
        }
        let Some(&pick) = state.rng.pick(&candidates) else {
            break;
        };
        choices.push(pick);
    }
    choices
}

/// Enter the level-up gate when enough xp is banked; returns true if it did
pub fn check_level_up(state: &mut GameState, now: f64) -> bool {
    let player = &mut state.player;
    if player.xp < player.xp_to_next_level {
        return false;
    }
    player.xp -= player.xp_to_next_level;
    player.xp_to_next_level *= 1.5;
    player.level += 1;
    let level = player.level;

    state.pending_choices = draw_choices(state);
    state.is_leveling_up = true;
    log::info!("Level up to {level}, choices {:?}", state.pending_choices);
    state.push_event(UiEventKind::LevelUp { level }, now);
    true
}

/// Apply the upgrade at `index` of the pending choices and resume play
///
/// Returns `None` (and changes nothing) when no choice is pending or the
/// index is out of range.
pub fn choose_upgrade(state: &mut GameState, index: usize) -> Option<UpgradeId> {
    if !state.is_leveling_up {
        return None;
    }
    let upgrade = *state.pending_choices.get(index)?;
    let now = state.time_ms;
    for effect in upgrade.effects() {
        apply_effect(&mut state.player, &effect, now);
    }
    if let Some(artifact) = upgrade.artifact() {
        state.player.artifacts.push(artifact);
    }
    state.pending_choices.clear();
    state.is_leveling_up = false;
    log::info!("Chose upgrade {upgrade:?}");
    Some(upgrade)
}

pub fn expire_buffs(player: &mut Player, now: f64) {
    player.buffs.retain(|b| b.expires_at > now);
}

/// Put a found weapon into a free slot, or over the weakest one if better
fn grant_weapon(state: &mut GameState, weapon: Weapon, now: f64) {
    let name = weapon.name.clone();
    let weapons = &mut state.player.weapons;
    if weapons.len() < MAX_WEAPON_SLOTS {
        weapons.push(weapon);
    } else {
        let weakest = weapons
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != state.player.equipped_weapon)
            .min_by(|a, b| a.1.quality.total_cmp(&b.1.quality))
            .map(|(i, w)| (i, w.quality));
        match weakest {
            Some((i, quality)) if quality < weapon.quality => weapons[i] = weapon,
            _ => {
                log::debug!("Discarding {name}, no weaker slot to replace");
                return;
            }
        }
    }
    state.push_event(UiEventKind::WeaponFound { name }, now);
    if state.player.weapons.len() >= MAX_WEAPON_SLOTS {
        state.unlock(AchievementId::ArsenalCollector, now);
    }
}

fn open_chest(state: &mut GameState, center: Vec2, now: f64) {
    let baseline = state
        .player
        .equipped()
        .cloned()
        .unwrap_or_else(Weapon::starter_pistol);
    match generate_weapon(&baseline, state.wave.wave, &mut state.rng) {
        Some(weapon) => {
            let id = state.next_entity_id();
            state
                .pickups
                .push(Pickup::new(id, center, PickupKind::Weapon(Box::new(weapon))));
        }
        None => {
            let healed = state.player.heal(CHEST_FALLBACK_HEAL);
            state.push_event(UiEventKind::HealPopup { pos: center, amount: healed }, now);
        }
    }
}

/// Pull gems inside the magnet radius, then collect everything touching the player
pub fn collect_pickups(state: &mut GameState, now: f64) {
    let player_center = state.player.center();
    let magnet = state.player.effective(Stat::GemMagnetRadius, now);
    for pickup in &mut state.pickups {
        if !matches!(pickup.kind, PickupKind::Gem { .. }) {
            continue;
        }
        let delta = toroidal_delta(pickup.center(), player_center);
        let dist = delta.length();
        if dist <= magnet && dist > 0.0 {
            pickup.pos += delta / dist * GEM_PULL_SPEED.min(dist);
        }
    }

    let player_rect = state.player.rect();
    let (touched, kept): (Vec<Pickup>, Vec<Pickup>) = std::mem::take(&mut state.pickups)
        .into_iter()
        .partition(|p| p.rect().intersects(&player_rect));
    state.pickups = kept;

    for pickup in touched {
        let center = pickup.center();
        match pickup.kind {
            PickupKind::Gem { xp } => state.player.xp += xp,
            PickupKind::Health { amount } => {
                let healed = state.player.heal(amount);
                if healed > 0.0 {
                    state.push_event(UiEventKind::HealPopup { pos: center, amount: healed }, now);
                }
            }
            PickupKind::Chest => open_chest(state, center, now),
            PickupKind::Weapon(weapon) => grant_weapon(state, *weapon, now),
            PickupKind::PowerUp(spec) => state.player.buffs.push(Buff {
                stat: spec.stat,
                op: spec.op,
                value: spec.value,
                expires_at: now + spec.duration_ms,
            }),
        }
    }
}

/// Effects of a profile card, `None` for ids the catalog does not know
pub fn card_effects(card_id: &str) -> Option<Vec<UpgradeEffect>> {
    use UpgradeEffect::*;
    let effects = match card_id {
        "iron_hide" => vec![StatMod {
            stat: Stat::MaxHealth,
            op: StatOp::Add,
            value: 15.0,
        }],
        "quick_step" => vec![StatMod {
            stat: Stat::Speed,
            op: StatOp::Multiply,
            value: 1.05,
        }],
        "sharp_eye" => vec![WeaponMod {
            modifier: WeaponModifier::CritChance,
            value: 0.05,
        }],
        "deep_pockets" => vec![WeaponMod {
            modifier: WeaponModifier::ClipSize,
            value: 3.0,
        }],
        "spark_ward" => vec![AddShield { amount: 15.0 }],
        "lodestone" => vec![StatMod {
            stat: Stat::GemMagnetRadius,
            op: StatOp::Multiply,
            value: 1.25,
        }],
        _ => return None,
    };
    Some(effects)
}

/// Apply equipped profile cards at run start; returns how many applied
pub fn apply_cards<'a>(state: &mut GameState, card_ids: impl IntoIterator<Item = &'a str>) -> usize {
    let now = state.time_ms;
    let mut applied = 0;
    for card_id in card_ids {
        let Some(effects) = card_effects(card_id) else {
            log::warn!("Unknown card {card_id:?}, skipping");
            continue;
        };
        for effect in &effects {
            apply_effect(&mut state.player, effect, now);
        }
        applied += 1;
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::EntityId;

    fn player() -> Player {
        Player::new(EntityId(1), Vec2::ZERO)
    }

    #[test]
    fn test_stat_mods_reclamp() {
        let mut p = player();
        apply_effect(
            &mut p,
            &UpgradeEffect::StatMod {
                stat: Stat::MaxHealth,
                op: StatOp::Multiply,
                value: 0.5,
            },
            0.0,
        );
        assert_eq!(p.max_health, 50.0);
        assert_eq!(p.health, 50.0);
    }

    #[test]
    fn test_orbital_merges_fieldwise() {
        let mut p = player();
        let small = UpgradeEffect::OrbitalShield {
            count: 3,
            damage: 5.0,
            speed: 0.02,
            radius: 90.0,
        };
        let big = UpgradeEffect::OrbitalShield {
            count: 2,
            damage: 12.0,
            speed: 0.05,
            radius: 60.0,
        };
        apply_effect(&mut p, &small, 0.0);
        apply_effect(&mut p, &big, 0.0);
        let orbital = p.orbital.unwrap();
        assert_eq!(orbital.count, 3);
        assert_eq!(orbital.damage, 12.0);
        assert_eq!(orbital.speed, 0.05);
        assert_eq!(orbital.radius, 90.0);
    }

    #[test]
    fn test_level_up_carries_xp_and_gates() {
        let mut state = GameState::empty(3);
        state.player.xp = 12.0;
        assert!(check_level_up(&mut state, 0.0));
        assert_eq!(state.player.level, 2);
        assert_eq!(state.player.xp, 2.0);
        assert_eq!(state.player.xp_to_next_level, 15.0);
        assert!(state.is_leveling_up);
        assert_eq!(state.pending_choices.len(), CHOICES_PER_LEVEL);

        let unique: std::collections::HashSet<_> = state.pending_choices.iter().collect();
        assert_eq!(unique.len(), CHOICES_PER_LEVEL);
    }

    #[test]
    fn test_choose_upgrade_applies_and_resumes() {
        let mut state = GameState::empty(3);
        assert_eq!(choose_upgrade(&mut state, 0), None);

        state.is_leveling_up = true;
        state.pending_choices = vec![UpgradeId::ThornedMantle, UpgradeId::Bulwark];
        assert_eq!(choose_upgrade(&mut state, 5), None);
        assert!(state.is_leveling_up);

        assert_eq!(choose_upgrade(&mut state, 0), Some(UpgradeId::ThornedMantle));
        assert!(!state.is_leveling_up);
        assert_eq!(state.player.thorns, 10.0);
        assert!(state.player.artifacts.contains(&ArtifactId::ThornedMantle));
    }

    #[test]
    fn test_owned_artifacts_never_offered() {
        let mut state = GameState::empty(8);
        state.player.artifacts = vec![
            ArtifactId::ThornedMantle,
            ArtifactId::LodestoneCharm,
            ArtifactId::AegisCore,
            ArtifactId::BerserkerSigil,
        ];
        for _ in 0..50 {
            let choices = draw_choices(&mut state);
            assert!(choices.iter().all(|c| {
                c.artifact()
                    .is_none_or(|a| a == ArtifactId::WindrunnerBoots)
            }));
        }
    }

    #[test]
    fn test_gem_pickup_adds_xp() {
        let mut state = GameState::empty(3);
        let id = state.next_entity_id();
        let center = state.player.center();
        state
            .pickups
            .push(Pickup::new(id, center, PickupKind::Gem { xp: 3.0 }));
        collect_pickups(&mut state, 0.0);
        assert!(state.pickups.is_empty());
        assert_eq!(state.player.xp, 3.0);
    }

    #[test]
    fn test_magnet_pulls_gems() {
        let mut state = GameState::empty(3);
        let id = state.next_entity_id();
        let center = state.player.center() + Vec2::new(100.0, 0.0);
        state
            .pickups
            .push(Pickup::new(id, center, PickupKind::Gem { xp: 1.0 }));
        collect_pickups(&mut state, 0.0);
        assert!(state.pickups[0].center().x < center.x);
    }

    #[test]
    fn test_weapon_pickups_fill_slots() {
        let mut state = GameState::empty(3);
        for _ in 0..2 {
            let id = state.next_entity_id();
            let center = state.player.center();
            let weapon = generate_weapon(&Weapon::starter_pistol(), 1, &mut state.rng).unwrap();
            state
                .pickups
                .push(Pickup::new(id, center, PickupKind::Weapon(Box::new(weapon))));
        }
        collect_pickups(&mut state, 0.0);
        assert_eq!(state.player.weapons.len(), MAX_WEAPON_SLOTS);
        assert!(state.achievements.contains(&AchievementId::ArsenalCollector));
    }

    #[test]
    fn test_unknown_cards_are_skipped() {
        let mut state = GameState::empty(3);
        let applied = apply_cards(&mut state, ["iron_hide", "no_such_card"]);
        assert_eq!(applied, 1);
        assert_eq!(state.player.max_health, PLAYER_MAX_HEALTH + 15.0);
    }
}
