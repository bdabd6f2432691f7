use glam::Vec2;
use proptest::prelude::*;

use torus_arena::consts::*;
use torus_arena::sim::ai::boss::phase_for;
use torus_arena::sim::combat::update_bullets;
use torus_arena::sim::state::BulletOwner;
use torus_arena::sim::{
    Bullet, EntityId, GameState, Monster, MonsterKind, Player, SimRng, Weapon, generate_weapon,
    toroidal_delta, wrap_around,
};

#[derive(Debug, Clone)]
enum VitalsOp {
    Damage(f32),
    Heal(f32),
    GrowMax(f32),
    Shield(f32),
}

fn vitals_op() -> impl Strategy<Value = VitalsOp> {
    prop_oneof![
        (0.0f32..500.0).prop_map(VitalsOp::Damage),
        (0.0f32..500.0).prop_map(VitalsOp::Heal),
        (-80.0f32..80.0).prop_map(VitalsOp::GrowMax),
        (0.0f32..100.0).prop_map(VitalsOp::Shield),
    ]
}

#[test]
fn test_wrap_past_right_edge_lands_once() {
    let size = Vec2::splat(32.0);
    let wrapped = wrap_around(Vec2::new(WORLD_WIDTH + 32.0, 100.0), size);
    assert_eq!(wrapped, Vec2::new(-32.0, 100.0));
    assert_eq!(wrap_around(wrapped, size), wrapped);
}

proptest! {
    #[test]
    fn player_vitals_stay_in_bounds(ops in prop::collection::vec(vitals_op(), 1..60)) {
        let mut player = Player::new(EntityId(1), Vec2::ZERO);
        player.shield_absorption = 0.5;
        for (i, op) in ops.into_iter().enumerate() {
            match op {
                VitalsOp::Damage(amount) => {
                    player.take_damage(amount, i as f64 * 1000.0);
                }
                VitalsOp::Heal(amount) => {
                    player.heal(amount);
                }
                VitalsOp::GrowMax(delta) => player.max_health += delta,
                VitalsOp::Shield(amount) => {
                    player.max_shield = amount;
                    player.shield = amount;
                }
            }
            player.clamp_vitals();
            prop_assert!(player.health >= 0.0 && player.health <= player.max_health);
            prop_assert!(player.shield >= 0.0 && player.shield <= player.max_shield);
        }
    }

    #[test]
    fn generated_weapons_always_improve(seed in any::<u64>(), wave in 1u32..60, generations in 1usize..5) {
        let mut rng = SimRng::new(seed);
        let mut baseline = Weapon::starter_pistol();
        for _ in 0..generations {
            let weapon = generate_weapon(&baseline, wave, &mut rng).unwrap();
            prop_assert!(weapon.damage >= baseline.damage * 1.1);
            prop_assert!(weapon.fire_rate >= baseline.fire_rate * 1.01);
            prop_assert!(weapon.quality >= baseline.quality + 10.0);
            prop_assert!(weapon.durability.is_some_and(|d| d >= 100));
            prop_assert_eq!(weapon.ammo_in_clip, weapon.clip_size);
            baseline = weapon;
        }
    }

    #[test]
    fn generated_quality_beats_any_baseline(
        seed in any::<u64>(),
        damage in 0.1f32..1.0e6,
        fire_rate in 0.1f32..100.0,
        quality in -1.0e6f32..1.0e15,
    ) {
        let mut baseline = Weapon::starter_pistol();
        baseline.damage = damage;
        baseline.fire_rate = fire_rate;
        baseline.quality = quality;
        let weapon = generate_weapon(&baseline, 1, &mut SimRng::new(seed)).unwrap();
        prop_assert!(weapon.quality > baseline.quality);
        prop_assert!(weapon.quality >= baseline.quality + 10.0);
        prop_assert!(weapon.damage >= baseline.damage * 1.1);
    }

    #[test]
    fn wrap_is_idempotent(
        x in -2.0 * WORLD_WIDTH..2.0 * WORLD_WIDTH,
        y in -2.0 * WORLD_HEIGHT..2.0 * WORLD_HEIGHT,
        size in 1.0f32..200.0,
    ) {
        let size = Vec2::splat(size);
        let once = wrap_around(Vec2::new(x, y), size);
        prop_assert_eq!(wrap_around(once, size), once);
    }

    #[test]
    fn toroidal_delta_takes_the_short_way(
        ax in 0.0f32..WORLD_WIDTH, ay in 0.0f32..WORLD_HEIGHT,
        bx in 0.0f32..WORLD_WIDTH, by in 0.0f32..WORLD_HEIGHT,
    ) {
        let d = toroidal_delta(Vec2::new(ax, ay), Vec2::new(bx, by));
        prop_assert!(d.x.abs() <= WORLD_WIDTH / 2.0);
        prop_assert!(d.y.abs() <= WORLD_HEIGHT / 2.0);
    }

    #[test]
    fn boss_phase_never_drops_as_health_falls(a in 0.0f32..=1.0, b in 0.0f32..=1.0) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(phase_for(low) >= phase_for(high));
        prop_assert!((1..=3).contains(&phase_for(low)));
    }

    #[test]
    fn piercing_caps_monsters_hit(seed in any::<u64>(), piercing in 0u32..5, stacked in 1usize..8) {
        let mut state = GameState::empty(seed);
        let spot = Vec2::new(500.0, 500.0);
        for _ in 0..stacked {
            let id = state.next_entity_id();
            state.monsters.push(Monster::new(id, MonsterKind::Normal, spot, 1000.0, 0.0));
        }

        let mut weapon = Weapon::starter_pistol();
        weapon.piercing = piercing;
        let id = state.next_entity_id();
        let center = spot + Vec2::splat(MonsterKind::Normal.stats().size / 2.0);
        let mut bullet = Bullet::from_weapon(id, BulletOwner::Player, center, 0.0, 1.0, &weapon, 0.0);
        bullet.vel = Vec2::ZERO;
        state.bullets.push(bullet);

        update_bullets(&mut state, 100.0);

        let hit = state.monsters.iter().filter(|m| m.health < 1000.0).count();
        let allowed = piercing as usize + 1;
        prop_assert_eq!(hit, stacked.min(allowed));
        prop_assert_eq!(state.bullets.is_empty(), stacked >= allowed);
        if let Some(bullet) = state.bullets.first() {
            prop_assert_eq!(bullet.piercing_left, (allowed - stacked) as i32);
        }
    }
}
