/// Animated actors: the player and patrolling enemies.
///
/// Both expose the same capability surface (`Actor`) but keep their own
/// flags and animation tables.

use glam::Vec2;

use super::animation::{
    AnimationSignal, EnemyAnimator, EnemyTextures, Kinematics, PlayerAnimator, PlayerTextures,
};
use super::entity::{Body, MotionState, PatrolBoundary};
use super::gfx::DrawCommand;

pub trait Actor {
    fn body(&self) -> &Body;

    fn position(&self) -> Vec2 {
        self.body().position
    }

    fn velocity(&self) -> Vec2 {
        self.body().velocity
    }

    /// Step the animation resolver one tick.
    fn advance_animation(&mut self) -> AnimationSignal;

    /// Sprite for the current frame and facing.
    fn sprite(&self) -> DrawCommand;
}

// ── Player ──

#[derive(Clone, Debug)]
pub struct PlayerActor {
    pub body: Body,
    pub state: MotionState,
    pub animator: PlayerAnimator,
    textures: PlayerTextures,
    scale: f32,
}

impl PlayerActor {
    pub fn new(position: Vec2, textures: PlayerTextures, scale: f32) -> Self {
        let size = textures.initial().size * scale;
        PlayerActor {
            body: Body::new(position, size),
            state: MotionState::default(),
            animator: PlayerAnimator::new(),
            textures,
            scale,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.state.is_dead()
    }

    pub fn kill(&mut self) {
        self.state = MotionState::Dead;
        self.body.velocity = Vec2::ZERO;
    }

    /// Back to `spawn`, alive. Facing and counters carry over.
    pub fn respawn(&mut self, spawn: Vec2) {
        self.body.position = spawn;
        self.body.velocity = Vec2::ZERO;
        self.state = MotionState::Airborne;
    }
}

impl Actor for PlayerActor {
    fn body(&self) -> &Body { &self.body }

    fn advance_animation(&mut self) -> AnimationSignal {
        self.animator.advance(Kinematics {
            velocity: self.body.velocity,
            on_ladder: self.state.on_ladder(),
            dead: self.state.is_dead(),
        })
    }

    fn sprite(&self) -> DrawCommand {
        let texture = self.textures.texture(self.animator.frame(), self.animator.facing());
        DrawCommand::new(texture, self.body.position, self.scale)
    }
}

// ── Enemy ──

#[derive(Clone, Debug)]
pub struct EnemyActor {
    pub mob_type: String,
    pub body: Body,
    pub boundary: Option<PatrolBoundary>,
    pub animator: EnemyAnimator,
    textures: EnemyTextures,
}

impl EnemyActor {
    pub fn new(
        mob_type: impl Into<String>,
        position: Vec2,
        velocity: Vec2,
        boundary: Option<PatrolBoundary>,
        textures: EnemyTextures,
    ) -> Self {
        let mut body = Body::new(position, textures.initial().size);
        body.velocity = velocity;
        EnemyActor {
            mob_type: mob_type.into(),
            body,
            boundary,
            animator: EnemyAnimator::new(),
            textures,
        }
    }
}

impl Actor for EnemyActor {
    fn body(&self) -> &Body { &self.body }

    fn advance_animation(&mut self) -> AnimationSignal {
        self.animator.advance(self.body.velocity);
        AnimationSignal::None
    }

    fn sprite(&self) -> DrawCommand {
        let texture = self.textures.texture(self.animator.frame(), self.animator.facing());
        DrawCommand::new(texture, self.body.position, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::animation::Frame;
    use crate::domain::entity::Facing;
    use crate::testing::StubAssets;

    #[test]
    fn player_body_is_scaled_texture() {
        let mut assets = StubAssets::new(Vec2::splat(64.0));
        let textures = PlayerTextures::load(&mut assets, "mob/lion/").unwrap();
        let player = PlayerActor::new(Vec2::new(200.0, 500.0), textures, 0.5);
        assert_eq!(player.body.size, Vec2::splat(32.0));
        assert_eq!(player.sprite().size, Vec2::splat(32.0));
    }

    #[test]
    fn kill_then_respawn() {
        let mut assets = StubAssets::new(Vec2::splat(64.0));
        let textures = PlayerTextures::load(&mut assets, "mob/lion/").unwrap();
        let mut player = PlayerActor::new(Vec2::new(200.0, 500.0), textures, 0.7);
        player.body.velocity = Vec2::new(7.0, -3.0);
        player.kill();
        assert!(player.is_dead());
        assert_eq!(player.velocity(), Vec2::ZERO);
        player.advance_animation();
        assert_eq!(player.animator.frame(), Frame::Death(0));

        player.respawn(Vec2::new(10.0, 20.0));
        assert!(!player.is_dead());
        assert_eq!(player.position(), Vec2::new(10.0, 20.0));
    }

    #[test]
    fn enemy_walking_right_draws_flipped() {
        let mut assets = StubAssets::new(Vec2::splat(48.0));
        let textures = EnemyTextures::load(&mut assets, "mob/monsters/slime/").unwrap();
        let mut enemy = EnemyActor::new("slime", Vec2::ZERO, Vec2::new(2.0, 0.0), None, textures);
        enemy.advance_animation();
        assert_eq!(enemy.animator.facing(), Facing::Left);
        assert!(enemy.sprite().flip);
    }
}
