/// The step function: advances a level session by one tick.
///
/// Processing order:
///   1. Kinematic bodies (moving platforms, enemies) advance by velocity
///   2. Player physics, then motion state + intent recomputed
///   3. Patrol reversals (platforms, enemies)
///   4. Coin pickup
///   5. Hazard contact (tiles ∪ enemies)
///   6. Animation (enemies, then player); may request a respawn
///   7. Respawn application
///   8. Camera scroll
///   9. Level-end check
///
/// Nothing here fails: content errors are caught when the session is built.

use std::collections::BTreeSet;

use crate::domain::actor::Actor;
use crate::domain::animation::AnimationSignal;
use crate::domain::collision::{overlapping, HazardHandle};
use crate::domain::entity::CoinId;
use crate::domain::intent::{InputState, JumpLatch};
use crate::domain::patrol::apply_patrol;
use crate::domain::physics::Obstacles;
use super::event::GameEvent;
use super::session::LevelSession;

/// What a tick produced besides the session mutations.
#[derive(Debug, Default, PartialEq)]
pub struct TickOutcome {
    pub events: Vec<GameEvent>,
    /// The camera moved or was reset; the host must push a new viewport.
    pub viewport_changed: bool,
    /// The player reached the right edge of the map.
    pub level_complete: bool,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(session: &mut LevelSession, input: &InputState, latch: &mut JumpLatch) -> TickOutcome {
    let mut out = TickOutcome::default();

    resolve_kinematics(session);
    resolve_player_physics(session, input, latch);
    resolve_patrols(session);
    resolve_coins(session, &mut out.events);
    resolve_hazards(session, &mut out.events);
    if resolve_animation(session) {
        resolve_respawn(session, &mut out);
    }
    resolve_camera(session, &mut out);
    resolve_level_end(session, &mut out);

    out
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

fn resolve_kinematics(session: &mut LevelSession) {
    let first = session.first_moving;
    for platform in &mut session.platforms[first..] {
        platform.body.advance();
    }
    for enemy in &mut session.enemies {
        enemy.body.advance();
    }
}

fn resolve_player_physics(session: &mut LevelSession, input: &InputState, latch: &mut JumpLatch) {
    // Dead bodies stay where they fell.
    if !session.player.is_dead() {
        let obstacles = Obstacles { platforms: &session.platforms, ladders: &session.ladders };
        session.physics.step(&mut session.player.body, &obstacles);

        let on_ladder = session.physics.is_on_ladder(&session.player.body, &obstacles);
        let can_jump = session.physics.can_jump(&session.player.body, &obstacles);
        session.player.state = session.player.state.resolve(on_ladder, can_jump);
    }
    session.apply_intent(input, latch);
}

fn resolve_patrols(session: &mut LevelSession) {
    let first = session.first_moving;
    for platform in &mut session.platforms[first..] {
        if let Some(boundary) = platform.boundary {
            apply_patrol(&mut platform.body, &boundary);
        }
    }
    for enemy in &mut session.enemies {
        if let Some(boundary) = enemy.boundary {
            if apply_patrol(&mut enemy.body, &boundary).any() {
                tracing::trace!(mob = %enemy.mob_type, velocity = ?enemy.velocity(), "Enemy turned");
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Outcomes
// ══════════════════════════════════════════════════════════════

fn resolve_coins(session: &mut LevelSession, events: &mut Vec<GameEvent>) {
    let player = session.player.body().rect();
    let hits: BTreeSet<CoinId> =
        overlapping(&player, session.coins.iter().map(|c| (c.id, c.body.rect())));
    if hits.is_empty() { return; }

    let mut collected = Vec::with_capacity(hits.len());
    session.coins.retain(|coin| {
        let hit = hits.contains(&coin.id);
        if hit { collected.push((coin.id, coin.points)); }
        !hit
    });

    for (coin, points) in collected {
        let before = session.score;
        session.score = session.score.saturating_add(points);
        debug_assert!(session.score >= before);
        tracing::debug!(?coin, points, score = session.score, "Coin collected");
        events.push(GameEvent::CoinCollected { coin, points, score: session.score });
    }
}

fn resolve_hazards(session: &mut LevelSession, events: &mut Vec<GameEvent>) {
    if session.player.is_dead() {
        session.player.body.velocity = glam::Vec2::ZERO;
        return;
    }

    let player = session.player.body().rect();
    let tiles = session.hazards.iter().enumerate()
        .map(|(i, b)| (HazardHandle::Tile(i), b.body.rect()));
    let enemies = session.enemies.iter().enumerate()
        .map(|(i, e)| (HazardHandle::Enemy(i), e.body().rect()));
    let hits = overlapping(&player, tiles.chain(enemies));

    if let Some(first) = hits.first() {
        session.player.kill();
        tracing::info!(level = session.level, hazard = ?first, "Player killed");
        events.push(GameEvent::PlayerKilled);
    }
}

/// Returns whether the player asked to respawn.
fn resolve_animation(session: &mut LevelSession) -> bool {
    for enemy in &mut session.enemies {
        enemy.advance_animation();
    }
    session.player.advance_animation() == AnimationSignal::RespawnRequested
}

fn resolve_respawn(session: &mut LevelSession, out: &mut TickOutcome) {
    session.player.respawn(session.spawn);
    session.camera.reset();
    out.viewport_changed = true;
    tracing::info!(level = session.level, "Player respawned");
    out.events.push(GameEvent::PlayerRespawned);
}

// ══════════════════════════════════════════════════════════════
// View and progression
// ══════════════════════════════════════════════════════════════

fn resolve_camera(session: &mut LevelSession, out: &mut TickOutcome) {
    let player = session.player.body().rect();
    if session.camera.scroll(&player, session.map_width, session.map_height, &session.tuning) {
        out.viewport_changed = true;
    }
}

fn resolve_level_end(session: &mut LevelSession, out: &mut TickOutcome) {
    if session.player.position().x < session.map_width { return; }

    session.camera.reset();
    out.viewport_changed = true;
    out.level_complete = true;
    tracing::info!(level = session.level, score = session.score, "Level completed");
    out.events.push(GameEvent::LevelCompleted { level: session.level, score: session.score });
}
