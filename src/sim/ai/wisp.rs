//! Wisp: drift, blink to a safe spot, charge, fire a homing orb

use glam::Vec2;

use super::{AiContext, AiOutput, step};
use crate::consts::*;
use crate::sim::geometry::{Body, find_safe_teleport_location, toroidal_delta};
use crate::sim::rng::SimRng;
use crate::sim::state::{
    AiState, EffectKind, HomingEnemyBullet, IdAllocator, Monster, WispPhase, WispState,
};
use crate::angle_of;

pub const HOMING_TURN_SPEED: f32 = 0.05;
pub const HOMING_SPEED: f32 = 3.0;
const DRIFT_SCALE: f32 = 0.6;

fn homing_orb(
    monster: &Monster,
    ctx: &AiContext<'_>,
    ids: &mut IdAllocator,
) -> HomingEnemyBullet {
    let center = monster.center();
    let size = Vec2::splat(BULLET_SIZE * 1.5);
    let aim = angle_of(toroidal_delta(center, ctx.player.center));
    HomingEnemyBullet {
        id: ids.next_id(),
        pos: center - size / 2.0,
        size,
        vel: crate::direction_from_angle(aim) * HOMING_SPEED,
        speed: HOMING_SPEED,
        damage: monster.damage,
        target_id: ctx.player.id,
        turn_speed: HOMING_TURN_SPEED,
        spawned_at: ctx.now,
    }
}

pub fn update(
    monster: &mut Monster,
    ctx: &AiContext<'_>,
    rng: &mut SimRng,
    ids: &mut IdAllocator,
    out: &mut AiOutput,
) {
    let now = ctx.now;
    let mut wisp = match monster.ai {
        AiState::Wisp(wisp) => wisp,
        _ => WispState {
            phase: WispPhase::Idle,
            last_teleport_at: now,
        },
    };

    match wisp.phase {
        WispPhase::Idle => {
            let to_player = toroidal_delta(monster.center(), ctx.player.center);
            step(monster, to_player, DRIFT_SCALE, ctx);
            if now - wisp.last_teleport_at >= WISP_TELEPORT_COOLDOWN_MS {
                out.effects.push((EffectKind::Afterimage, monster.center(), WISP_TELEPORT_DURATION_MS));
                monster.hidden = true;
                wisp.phase = WispPhase::Teleporting { started_at: now };
            }
        }
        WispPhase::Teleporting { started_at } => {
            if now - started_at >= WISP_TELEPORT_DURATION_MS {
                monster.pos = find_safe_teleport_location(monster.size, ctx.obstacles, rng);
                monster.hidden = false;
                wisp.last_teleport_at = now;
                wisp.phase = WispPhase::Charging { since: now };
            }
        }
        WispPhase::Charging { since } => {
            if now - since >= WISP_ATTACK_CHARGE_MS {
                out.homing_bullets.push(homing_orb(monster, ctx, ids));
                wisp.phase = WispPhase::Idle;
            }
        }
    }

    monster.ai = AiState::Wisp(wisp);
}

#[cfg(test)]
mod tests {
    use super::super::Target;
    use super::*;
    use crate::sim::geometry::Rect;
    use crate::sim::state::{EntityId, MonsterKind};

    fn context(targets: &[Target], now: f64) -> AiContext<'_> {
        AiContext {
            now,
            wave: 3,
            difficulty_modifier: 1.0,
            player: targets[0],
            player_rect: Rect::new(targets[0].center - Vec2::splat(16.0), Vec2::splat(32.0)),
            targets,
            obstacles: &[],
            monsters: &[],
        }
    }

    #[test]
    fn test_full_teleport_cycle() {
        let targets = [Target {
            id: EntityId(1),
            center: Vec2::new(2000.0, 2000.0),
        }];
        let mut rng = SimRng::new(11);
        let mut ids = IdAllocator::new();
        let mut out = AiOutput::default();
        let mut m = Monster::new(EntityId(4), MonsterKind::Wisp, Vec2::new(500.0, 500.0), 30.0, 0.0);

        update(&mut m, &context(&targets, 1000.0), &mut rng, &mut ids, &mut out);
        assert!(!m.hidden);

        update(&mut m, &context(&targets, 5000.0), &mut rng, &mut ids, &mut out);
        assert!(m.hidden);
        assert!(!m.is_targetable());
        assert_eq!(out.effects.len(), 1);

        update(&mut m, &context(&targets, 5400.0), &mut rng, &mut ids, &mut out);
        assert!(!m.hidden);
        assert!(matches!(
            m.ai,
            AiState::Wisp(WispState { phase: WispPhase::Charging { .. }, .. })
        ));

        update(&mut m, &context(&targets, 6400.0), &mut rng, &mut ids, &mut out);
        assert_eq!(out.homing_bullets.len(), 1);
        assert_eq!(out.homing_bullets[0].target_id, EntityId(1));
        assert_eq!(out.homing_bullets[0].turn_speed, HOMING_TURN_SPEED);
        assert!(matches!(
            m.ai,
            AiState::Wisp(WispState { phase: WispPhase::Idle, last_teleport_at }) if last_teleport_at == 5400.0
        ));
    }
}
