//! Weapons and procedural weapon generation
//!
//! Generated weapons always beat their baseline: at least +10% damage, +1%
//! fire rate and +10 quality, no matter how the random rolls land.

use serde::{Deserialize, Serialize};

use super::rng::SimRng;

/// Weapon families; gate which stats a generation roll may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponCategory {
    Pistol,
    Shotgun,
    Rifle,
    Smg,
    Launcher,
}

impl WeaponCategory {
    fn noun(self) -> &'static str {
        match self {
            WeaponCategory::Pistol => "Pistol",
            WeaponCategory::Shotgun => "Scattergun",
            WeaponCategory::Rifle => "Rifle",
            WeaponCategory::Smg => "Chopper",
            WeaponCategory::Launcher => "Launcher",
        }
    }
}

/// Lingering ground effect kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneKind {
    Fire,
    Poison,
}

/// Damage zone spawned where a projectile retires
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactEffect {
    pub kind: ZoneKind,
    pub radius: f32,
    /// Flat damage per zone tick
    pub damage: f32,
    pub duration_ms: f64,
    /// Movement multiplier applied to victims (e.g. 0.5 halves speed)
    pub slow: Option<f32>,
}

impl ImpactEffect {
    pub fn fire(damage: f32) -> Self {
        Self {
            kind: ZoneKind::Fire,
            radius: 60.0,
            damage,
            duration_ms: 2500.0,
            slow: None,
        }
    }

    pub fn poison(damage: f32) -> Self {
        Self {
            kind: ZoneKind::Poison,
            radius: 80.0,
            damage,
            duration_ms: 4000.0,
            slow: Some(0.6),
        }
    }
}

/// Stat an upgrade can modify on every equipped weapon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponModifier {
    Damage,
    FireRate,
    BulletSpeed,
    BulletCount,
    Piercing,
    CritChance,
    CritDamage,
    ClipSize,
    ReloadTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub category: WeaponCategory,
    pub damage: f32,
    /// Shots per second
    pub fire_rate: f32,
    /// Pixels per tick
    pub bullet_speed: f32,
    pub bullet_count: u32,
    /// Half-angle of the pellet fan (radians)
    pub spread: f32,
    pub piercing: u32,
    pub crit_chance: f32,
    /// Damage multiplier on a critical hit
    pub crit_damage: f32,
    pub clip_size: u32,
    pub ammo_in_clip: u32,
    /// Reserve ammunition; `None` means unlimited
    pub durability: Option<u32>,
    pub max_durability: Option<u32>,
    /// Milliseconds
    pub reload_time: f32,
    pub quality: f32,
    pub on_impact: Option<ImpactEffect>,
}

impl Weapon {
    #[allow(clippy::too_many_arguments)]
    fn base(
        name: &str,
        category: WeaponCategory,
        damage: f32,
        fire_rate: f32,
        bullet_speed: f32,
        bullet_count: u32,
        spread: f32,
        clip_size: u32,
        reload_time: f32,
    ) -> Self {
        let mut weapon = Self {
            name: name.to_string(),
            category,
            damage,
            fire_rate,
            bullet_speed,
            bullet_count,
            spread,
            piercing: 0,
            crit_chance: 0.05,
            crit_damage: 1.5,
            clip_size,
            ammo_in_clip: clip_size,
            durability: None,
            max_durability: None,
            reload_time,
            quality: 0.0,
            on_impact: None,
        };
        weapon.quality = weapon.computed_quality();
        weapon
    }

    /// The player's unlimited sidearm
    pub fn starter_pistol() -> Self {
        Self::base("Pistol", WeaponCategory::Pistol, 10.0, 3.0, 12.0, 1, 0.0, 12, 1200.0)
    }

    pub fn ally_carbine() -> Self {
        Self::base("Carbine", WeaponCategory::Rifle, 8.0, 2.0, 11.0, 1, 0.0, 30, 1500.0)
    }

    pub fn enemy_rifle() -> Self {
        Self::base("Enemy Rifle", WeaponCategory::Rifle, 10.0, 0.5, 5.0, 1, 0.0, 1, 0.0)
    }

    pub fn enemy_shotgun() -> Self {
        Self::base("Enemy Shotgun", WeaponCategory::Shotgun, 6.0, 0.67, 5.0, 5, 0.2, 1, 0.0)
    }

    /// Weighted-quality score used for progression guarantees
    pub fn computed_quality(&self) -> f32 {
        self.damage * self.fire_rate * self.bullet_count as f32
            * (1.0 + self.crit_chance * self.crit_damage)
            + self.piercing as f32 * 20.0
            + self.bullet_speed * 5.0
            - self.reload_time / 100.0
    }

    /// Minimum milliseconds between shots
    pub fn fire_interval_ms(&self) -> f64 {
        if self.fire_rate <= 0.0 {
            return f64::INFINITY;
        }
        1000.0 / self.fire_rate as f64
    }

    pub fn reserve_available(&self) -> bool {
        self.durability.is_none_or(|d| d > 0)
    }

    /// Clip not full and reserve ammo left
    pub fn can_reload(&self) -> bool {
        self.ammo_in_clip < self.clip_size && self.reserve_available()
    }

    /// Out of ammo in clip and reserve
    pub fn is_depleted(&self) -> bool {
        self.ammo_in_clip == 0 && !self.reserve_available()
    }

    /// Move reserve ammo into the clip
    pub fn finish_reload(&mut self) {
        let wanted = self.clip_size.saturating_sub(self.ammo_in_clip);
        let granted = match self.durability {
            None => wanted,
            Some(reserve) => {
                let granted = wanted.min(reserve);
                self.durability = Some(reserve - granted);
                granted
            }
        };
        self.ammo_in_clip += granted;
    }

    /// Pellet angles fanned evenly across ±spread around `base`
    pub fn pellet_angles(&self, base: f32) -> Vec<f32> {
        let count = self.bullet_count.max(1);
        if count == 1 {
            return vec![base];
        }
        let step = 2.0 * self.spread / (count - 1) as f32;
        (0..count)
            .map(|i| base - self.spread + step * i as f32)
            .collect()
    }

    /// Apply an upgrade modifier (`value` is a fraction for multiplicative stats)
    pub fn apply_modifier(&mut self, modifier: WeaponModifier, value: f32) {
        match modifier {
            WeaponModifier::Damage => self.damage *= 1.0 + value,
            WeaponModifier::FireRate => self.fire_rate *= 1.0 + value,
            WeaponModifier::BulletSpeed => self.bullet_speed *= 1.0 + value,
            WeaponModifier::BulletCount => {
                self.bullet_count = add_count(self.bullet_count, value).max(1);
                if self.spread == 0.0 && self.bullet_count > 1 {
                    self.spread = 0.15;
                }
            }
            WeaponModifier::Piercing => self.piercing = add_count(self.piercing, value),
            WeaponModifier::CritChance => {
                self.crit_chance = (self.crit_chance + value).clamp(0.0, 1.0);
            }
            WeaponModifier::CritDamage => self.crit_damage += value,
            WeaponModifier::ClipSize => self.clip_size = add_count(self.clip_size, value).max(1),
            WeaponModifier::ReloadTime => {
                self.reload_time = (self.reload_time * (1.0 - value)).max(100.0);
            }
        }
        self.quality = self.quality.max(self.computed_quality());
    }
}

fn add_count(current: u32, value: f32) -> u32 {
    (current as f32 + value.round()).max(0.0) as u32
}

/// Stats a generation roll may improve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RollStat {
    Damage,
    FireRate,
    ClipSize,
    ReloadTime,
    CritChance,
    CritDamage,
    Piercing,
    BulletCount,
}

fn rollable_stats(category: WeaponCategory) -> Vec<RollStat> {
    let mut stats = vec![
        RollStat::Damage,
        RollStat::FireRate,
        RollStat::ClipSize,
        RollStat::ReloadTime,
        RollStat::CritChance,
        RollStat::CritDamage,
    ];
    if matches!(category, WeaponCategory::Rifle | WeaponCategory::Pistol) {
        stats.push(RollStat::Piercing);
    }
    if matches!(category, WeaponCategory::Shotgun | WeaponCategory::Smg) {
        stats.push(RollStat::BulletCount);
    }
    stats
}

const NAME_PREFIXES: &[&str] = &[
    "Blazing", "Vicious", "Arcane", "Savage", "Gilded", "Storm", "Hollow", "Feral", "Cursed",
    "Radiant",
];

const NAME_SUFFIXES: &[&str] = &[
    "of Ruin",
    "of the Torus",
    "of Echoes",
    "of Embers",
    "of the Hunt",
    "of Last Light",
    "Mk II",
    "Prime",
];

/// `computed` raised to at least `baseline + 10` and always strictly above `baseline`
///
/// At large magnitudes `baseline + 10.0` rounds back to `baseline` in f32.
fn quality_over(computed: f32, baseline: f32) -> f32 {
    let quality = computed.max(baseline + 10.0);
    if quality > baseline {
        return quality;
    }
    // Next representable value above `baseline`
    if baseline == 0.0 {
        f32::from_bits(1)
    } else if baseline > 0.0 {
        f32::from_bits(baseline.to_bits() + 1)
    } else {
        f32::from_bits(baseline.to_bits() - 1)
    }
}

/// Build a stronger weapon from `baseline`
///
/// Returns `None` for a degenerate baseline; callers skip the drop.
pub fn generate_weapon(baseline: &Weapon, wave: u32, rng: &mut SimRng) -> Option<Weapon> {
    let sane = |v: f32| v.is_finite() && v > 0.0;
    if !sane(baseline.damage) || !sane(baseline.fire_rate) || !baseline.quality.is_finite() {
        log::warn!("Refusing to generate from degenerate weapon {:?}", baseline.name);
        return None;
    }

    let mut weapon = baseline.clone();
    let stats = rollable_stats(baseline.category);
    let rolls = 5 + wave / 3;
    for _ in 0..rolls {
        let Some(&stat) = rng.pick(&stats) else {
            break;
        };
        match stat {
            RollStat::Damage => weapon.damage *= 1.0 + rng.range(0.05, 0.12),
            RollStat::FireRate => weapon.fire_rate *= 1.0 + rng.range(0.03, 0.08),
            RollStat::ClipSize => weapon.clip_size += 1 + rng.index(3) as u32,
            RollStat::ReloadTime => weapon.reload_time = (weapon.reload_time * 0.95).max(300.0),
            RollStat::CritChance => weapon.crit_chance = (weapon.crit_chance + 0.03).min(0.75),
            RollStat::CritDamage => weapon.crit_damage += 0.15,
            RollStat::Piercing => weapon.piercing += 1,
            RollStat::BulletCount => {
                weapon.bullet_count += 1;
                if weapon.spread == 0.0 {
                    weapon.spread = 0.15;
                }
            }
        }
    }

    if weapon.on_impact.is_none() && rng.chance(0.15) {
        let zone_damage = (weapon.damage * 0.3).max(1.0);
        weapon.on_impact = Some(if rng.chance(0.5) {
            ImpactEffect::fire(zone_damage)
        } else {
            ImpactEffect::poison(zone_damage)
        });
    }

    // Progression guarantees hold regardless of the rolls
    weapon.damage = weapon.damage.max(baseline.damage * 1.1);
    weapon.fire_rate = weapon.fire_rate.max(baseline.fire_rate * 1.01);
    weapon.quality = quality_over(weapon.computed_quality(), baseline.quality);

    let durability = (weapon.quality * 2.5).max(100.0).round() as u32;
    weapon.durability = Some(durability);
    weapon.max_durability = Some(durability);
    weapon.ammo_in_clip = weapon.clip_size;

    let prefix = rng.pick(NAME_PREFIXES).copied().unwrap_or("Strange");
    let suffix = rng.pick(NAME_SUFFIXES).copied().unwrap_or("Relic");
    weapon.name = format!("{prefix} {} {suffix}", weapon.category.noun());

    log::debug!(
        "Generated {} (quality {:.1} over {:.1})",
        weapon.name,
        weapon.quality,
        baseline.quality
    );
    Some(weapon)
}
