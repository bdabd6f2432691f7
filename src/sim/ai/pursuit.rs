//! Straight-line chasers (normal, elite, minion, bloater, lich guard)

use super::{AiContext, nearest_target, step};
use crate::sim::geometry::{Body, toroidal_delta};
use crate::sim::state::Monster;

/// Walk the toroidal shortest path toward the nearest player or ally
pub fn pursue(monster: &mut Monster, ctx: &AiContext<'_>) {
    let center = monster.center();
    let Some(target) = nearest_target(center, ctx.targets) else {
        return;
    };
    let dir = toroidal_delta(center, target.center);
    step(monster, dir, 1.0, ctx);
}
