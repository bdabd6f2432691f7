//! Temporary ally behavior profiles

use glam::Vec2;

use crate::consts::*;
use crate::sim::events::{DialogueLine, UiEventKind};
use crate::sim::geometry::{
    Body, Rect, line_of_sight_clear, sliding_move, toroidal_delta, toroidal_distance, wrap_around,
};
use crate::sim::state::{Ally, AllyBehavior, Bullet, BulletOwner, GameState, Monster};
use crate::angle_of;

/// Allies below this health fraction call for help once
pub const LOW_HEALTH_FRACTION: f32 = 0.3;
/// Preferred distance from the player for the recruit profile
const ESCORT_DISTANCE: f32 = 120.0;
/// Evasive allies back off from monsters closer than this
const EVADE_DISTANCE: f32 = 180.0;
const FOLLOW_DISTANCE: f32 = 200.0;
/// Breakout allies stop charging at this range
const MELEE_DISTANCE: f32 = 60.0;

fn nearest_monster<'a>(from: Vec2, monsters: &'a [Monster]) -> Option<&'a Monster> {
    monsters.iter().filter(|m| m.is_targetable()).min_by(|a, b| {
        toroidal_distance(from, a.center()).total_cmp(&toroidal_distance(from, b.center()))
    })
}

/// Nearest visible monster within firing range
fn firing_target<'a>(from: Vec2, monsters: &'a [Monster], obstacles: &[Rect]) -> Option<&'a Monster> {
    monsters
        .iter()
        .filter(|m| m.is_targetable())
        .filter_map(|m| {
            let delta = toroidal_delta(from, m.center());
            let dist = delta.length();
            (dist <= AUTO_TARGET_RANGE && line_of_sight_clear(from, from + delta, obstacles))
                .then_some((m, dist))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(m, _)| m)
}

/// Direction an ally wants to move this tick
fn movement(ally: &Ally, player_center: Vec2, monsters: &[Monster]) -> Vec2 {
    let center = ally.center();
    let to_player = toroidal_delta(center, player_center);
    let follow = || {
        if to_player.length() > FOLLOW_DISTANCE {
            to_player
        } else {
            Vec2::ZERO
        }
    };
    match ally.behavior {
        AllyBehavior::ResoluteRecruit => {
            if to_player.length() > ESCORT_DISTANCE {
                to_player
            } else {
                Vec2::ZERO
            }
        }
        AllyBehavior::EvasionFirst => match nearest_monster(center, monsters) {
            Some(m) if toroidal_distance(center, m.center()) < EVADE_DISTANCE => {
                -toroidal_delta(center, m.center())
            }
            _ => follow(),
        },
        AllyBehavior::DaringBreakout => match nearest_monster(center, monsters) {
            Some(m) => {
                let to_monster = toroidal_delta(center, m.center());
                if to_monster.length() > MELEE_DISTANCE {
                    to_monster
                } else {
                    Vec2::ZERO
                }
            }
            None => follow(),
        },
    }
}

/// Drop departed allies, then move and shoot with the rest
pub fn update_allies(state: &mut GameState, now: f64) {
    // Timed-out allies say goodbye; fallen ones just vanish
    let departing: Vec<_> = state
        .allies
        .iter()
        .filter(|a| a.health > 0.0 && a.is_gone(now))
        .map(|a| a.id)
        .collect();
    for speaker in departing {
        state.push_event(
            UiEventKind::Dialogue {
                speaker,
                line: DialogueLine::AllyDeparts,
            },
            now,
        );
    }
    state.allies.retain(|a| !a.is_gone(now));

    let obstacles = state.obstacle_rects();
    let player_center = state.player.center();
    let mut lines = Vec::new();

    let GameState {
        allies,
        monsters,
        bullets,
        ids,
        ..
    } = state;
    for ally in allies.iter_mut() {
        let dir = movement(ally, player_center, monsters).normalize_or_zero();
        ally.pos = sliding_move(ally.rect(), dir, ally.speed, &obstacles);
        ally.pos = wrap_around(ally.pos, ally.size);

        let center = ally.center();
        let ready = now - ally.last_shot_at >= ally.weapon.fire_interval_ms();
        if let Some(target) = firing_target(center, monsters, &obstacles).filter(|_| ready) {
            let aim = angle_of(toroidal_delta(center, target.center()));
            for angle in ally.weapon.pellet_angles(aim) {
                bullets.push(Bullet::from_weapon(
                    ids.next_id(),
                    BulletOwner::Ally(ally.id),
                    center,
                    angle,
                    ally.weapon.damage,
                    &ally.weapon,
                    now,
                ));
            }
            ally.last_shot_at = now;
        }

        let low = ally.health < ally.max_health * LOW_HEALTH_FRACTION;
        if low && ally.dialogue != Some(DialogueLine::AllyLowHealth) {
            ally.dialogue = Some(DialogueLine::AllyLowHealth);
            lines.push(ally.id);
        }
    }

    for speaker in lines {
        state.push_event(
            UiEventKind::Dialogue {
                speaker,
                line: DialogueLine::AllyLowHealth,
            },
            now,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::MonsterKind;

    fn arena_with_ally(behavior: AllyBehavior) -> GameState {
        let mut state = GameState::empty(5);
        let id = state.next_entity_id();
        let pos = state.player.pos + Vec2::new(60.0, 0.0);
        state.allies.push(Ally::new(id, pos, behavior, 0.0));
        state
    }

    fn add_monster(state: &mut GameState, offset: Vec2) {
        let id = state.next_entity_id();
        let pos = state.player.pos + offset;
        state
            .monsters
            .push(Monster::new(id, MonsterKind::Normal, pos, 30.0, 0.0));
    }

    #[test]
    fn test_ally_shoots_visible_monster() {
        let mut state = arena_with_ally(AllyBehavior::ResoluteRecruit);
        add_monster(&mut state, Vec2::new(400.0, 0.0));
        update_allies(&mut state, 16.0);
        assert!(!state.bullets.is_empty());
        let ally_id = state.allies[0].id;
        assert!(state.bullets.iter().all(|b| b.owner == BulletOwner::Ally(ally_id)));
    }

    #[test]
    fn test_evasive_ally_backs_away() {
        let mut state = arena_with_ally(AllyBehavior::EvasionFirst);
        add_monster(&mut state, Vec2::new(160.0, 0.0));
        let before = state.allies[0].pos;
        update_allies(&mut state, 16.0);
        assert!(state.allies[0].pos.x < before.x);
    }

    #[test]
    fn test_breakout_ally_charges() {
        let mut state = arena_with_ally(AllyBehavior::DaringBreakout);
        add_monster(&mut state, Vec2::new(500.0, 0.0));
        let before = state.allies[0].pos;
        update_allies(&mut state, 16.0);
        assert!(state.allies[0].pos.x > before.x);
    }

    #[test]
    fn test_expired_ally_departs_with_dialogue() {
        let mut state = arena_with_ally(AllyBehavior::ResoluteRecruit);
        update_allies(&mut state, ALLY_LIFETIME_MS + 1.0);
        assert!(state.allies.is_empty());
        assert!(state.events.iter().any(|e| matches!(
            e.kind,
            UiEventKind::Dialogue {
                line: DialogueLine::AllyDeparts,
                ..
            }
        )));
    }

    #[test]
    fn test_low_health_line_fires_once() {
        let mut state = arena_with_ally(AllyBehavior::ResoluteRecruit);
        state.allies[0].health = 10.0;
        update_allies(&mut state, 16.0);
        update_allies(&mut state, 32.0);
        let count = state
            .events
            .iter()
            .filter(|e| matches!(e.kind, UiEventKind::Dialogue { line: DialogueLine::AllyLowHealth, .. }))
            .count();
        assert_eq!(count, 1);
    }
}
