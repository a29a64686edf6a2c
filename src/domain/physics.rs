/// Platformer physics.
///
/// ## Contract
///
/// The session owns every body; an engine only moves the player's body
/// against a borrowed view of the static geometry. Moving platforms are
/// advanced by the session before the player is stepped, so the engine sees
/// them already in their new place.
///
/// ## Resolution order (`PlatformerPhysics`)
///
///   1. Gravity: `vy -= gravity`, skipped while overlapping a ladder
///   2. Move along y, snap out of any platform, zero `vy`
///   3. Move along x, snap out of any platform, zero `vx`

use glam::Vec2;

use super::collision::any_overlap;
use super::entity::{Block, Body, Rect};

/// How far below the feet `can_jump` looks for ground.
pub const JUMP_PROBE_DEPTH: f32 = 5.0;

/// Borrowed geometry the player collides with.
#[derive(Clone, Copy)]
pub struct Obstacles<'a> {
    /// Static and moving platforms together.
    pub platforms: &'a [Block],
    pub ladders: &'a [Block],
}

impl<'a> Obstacles<'a> {
    fn platform_rects(&self) -> impl Iterator<Item = Rect> + 'a {
        let platforms: &'a [Block] = self.platforms;
        platforms.iter().map(|b| b.body.rect())
    }

    fn ladder_rects(&self) -> impl Iterator<Item = Rect> + 'a {
        let ladders: &'a [Block] = self.ladders;
        ladders.iter().map(|b| b.body.rect())
    }
}

pub trait PhysicsEngine {
    /// Apply gravity and move the player one tick, resolving platform contact.
    fn step(&mut self, player: &mut Body, obstacles: &Obstacles<'_>);
    /// Standing on a platform.
    fn can_jump(&self, player: &Body, obstacles: &Obstacles<'_>) -> bool;
    /// Overlapping a ladder.
    fn is_on_ladder(&self, player: &Body, obstacles: &Obstacles<'_>) -> bool;
}

// ══════════════════════════════════════════════════════════════
// Concrete engine
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug)]
pub struct PlatformerPhysics {
    pub gravity: f32,
}

impl PlatformerPhysics {
    pub fn new(gravity: f32) -> Self {
        PlatformerPhysics { gravity }
    }
}

impl PhysicsEngine for PlatformerPhysics {
    fn step(&mut self, player: &mut Body, obstacles: &Obstacles<'_>) {
        if !self.is_on_ladder(player, obstacles) {
            player.velocity.y -= self.gravity;
        }

        // ── Vertical ──
        player.position.y += player.velocity.y;
        let mut hit = false;
        for platform in obstacles.platforms {
            let rect = platform.body.rect();
            if !player.rect().intersects(&rect) {
                continue;
            }
            hit = true;
            if player.velocity.y > 0.0 {
                player.set_top(rect.bottom);
            } else {
                player.set_bottom(rect.top);
            }
        }
        if hit {
            player.velocity.y = 0.0;
        }

        // ── Horizontal ──
        player.position.x += player.velocity.x;
        let mut hit = false;
        for platform in obstacles.platforms {
            let rect = platform.body.rect();
            if !player.rect().intersects(&rect) {
                continue;
            }
            hit = true;
            let pushing_right = if player.velocity.x != 0.0 {
                player.velocity.x > 0.0
            } else {
                // A platform moved into a standing player: push away from it.
                player.position.x < platform.body.position.x
            };
            if pushing_right {
                player.set_right(rect.left);
            } else {
                player.set_left(rect.right);
            }
        }
        if hit {
            player.velocity.x = 0.0;
        }
    }

    fn can_jump(&self, player: &Body, obstacles: &Obstacles<'_>) -> bool {
        let probe = player.rect().offset(Vec2::new(0.0, -JUMP_PROBE_DEPTH));
        any_overlap(&probe, obstacles.platform_rects())
    }

    fn is_on_ladder(&self, player: &Body, obstacles: &Obstacles<'_>) -> bool {
        any_overlap(&player.rect(), obstacles.ladder_rects())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gfx::{Texture, TextureId};
    use pretty_assertions::assert_eq;

    fn tile(x: f32, y: f32) -> Block {
        Block::new(Vec2::new(x, y), Vec2::splat(32.0), Texture::new(TextureId(0), Vec2::splat(32.0)))
    }

    /// A floor of tiles whose top edge is y = 32.
    fn floor(cols: usize) -> Vec<Block> {
        (0..cols).map(|c| tile(16.0 + 32.0 * c as f32, 16.0)).collect()
    }

    fn player(x: f32, y: f32) -> Body {
        Body::new(Vec2::new(x, y), Vec2::new(30.0, 40.0))
    }

    #[test]
    fn falls_and_lands_on_floor() {
        let platforms = floor(20);
        let obstacles = Obstacles { platforms: &platforms, ladders: &[] };
        let mut engine = PlatformerPhysics::new(1.0);
        let mut body = player(100.0, 200.0);
        for _ in 0..60 {
            engine.step(&mut body, &obstacles);
        }
        assert_eq!(body.bottom(), 32.0);
        assert_eq!(body.velocity.y, 0.0);
        assert!(engine.can_jump(&body, &obstacles));
    }

    #[test]
    fn free_fall_accumulates_gravity() {
        let obstacles = Obstacles { platforms: &[], ladders: &[] };
        let mut engine = PlatformerPhysics::new(1.0);
        let mut body = player(100.0, 500.0);
        for _ in 0..3 {
            engine.step(&mut body, &obstacles);
        }
        // -1 -2 -3
        assert_eq!(body.position.y, 494.0);
        assert!(!engine.can_jump(&body, &obstacles));
    }

    #[test]
    fn walking_on_floor_moves_exactly_speed_per_tick() {
        let platforms = floor(40);
        let obstacles = Obstacles { platforms: &platforms, ladders: &[] };
        let mut engine = PlatformerPhysics::new(1.0);
        let mut body = player(100.0, 52.0);
        for _ in 0..10 {
            body.velocity.x = 7.0;
            engine.step(&mut body, &obstacles);
        }
        assert_eq!(body.position.x, 170.0);
        assert_eq!(body.bottom(), 32.0);
    }

    #[test]
    fn wall_stops_horizontal_motion() {
        let mut platforms = floor(20);
        platforms.push(tile(208.0, 48.0));
        let obstacles = Obstacles { platforms: &platforms, ladders: &[] };
        let mut engine = PlatformerPhysics::new(1.0);
        let mut body = player(160.0, 52.0);
        for _ in 0..5 {
            body.velocity.x = 7.0;
            engine.step(&mut body, &obstacles);
        }
        assert_eq!(body.right(), 192.0);
        assert_eq!(body.velocity.x, 0.0);
    }

    #[test]
    fn ladder_suspends_gravity() {
        let ladders = vec![tile(100.0, 300.0)];
        let obstacles = Obstacles { platforms: &[], ladders: &ladders };
        let mut engine = PlatformerPhysics::new(1.0);
        let mut body = player(100.0, 300.0);
        engine.step(&mut body, &obstacles);
        assert_eq!(body.position, Vec2::new(100.0, 300.0));
        assert!(engine.is_on_ladder(&body, &obstacles));
    }
}
