/// Animation state resolver.
///
/// Maps an actor's kinematic state to a frame and facing once per tick.
/// Counters advance on fixed tick multiples, so the same velocity history
/// always produces the same frame sequence.

use glam::Vec2;

use super::entity::Facing;
use super::gfx::{AssetLoader, Texture, TexturePair};
use crate::error::AssetError;

// ── Cadence ──

/// Speeds beyond this (or non-finite ones) animate as if standing still.
pub const MAX_ANIMATED_SPEED: f32 = 10_000.0;

const DEATH_EVERY: u64 = 7;
const IDLE_EVERY: u64 = 7;
const PLAYER_WALK_EVERY: u64 = 3;
const ENEMY_WALK_EVERY: u64 = 5;

pub const PLAYER_IDLE_FRAMES: usize = 5;
pub const ENEMY_IDLE_FRAMES: usize = 4;
pub const WALK_FRAMES: usize = 6;
pub const DEATH_FRAMES: usize = 7;
pub const CLIMB_FRAMES: usize = 2;
/// The climb cycle shares the walk counter and wraps after this value.
const CLIMB_PHASE_MAX: usize = 7;
/// Vertical speed a climber must exceed for the climb cycle to advance.
const CLIMB_MIN_SPEED: f32 = 1.0;

/// Frame selected for the current tick. Indices are into the per-kind tables.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Frame {
    Idle(usize),
    Walk(usize),
    Jump,
    Fall,
    Climb(usize),
    Death(usize),
}

/// Raw inputs for one animation step.
#[derive(Clone, Copy, Debug, Default)]
pub struct Kinematics {
    pub velocity: Vec2,
    pub on_ladder: bool,
    pub dead: bool,
}

/// What the resolver asks of the session after stepping.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimationSignal {
    None,
    RespawnRequested,
}

fn sanitize(component: f32) -> f32 {
    if component.is_finite() && component.abs() <= MAX_ANIMATED_SPEED {
        component
    } else {
        0.0
    }
}

fn sanitized(velocity: Vec2) -> Vec2 {
    Vec2::new(sanitize(velocity.x), sanitize(velocity.y))
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct PlayerAnimator {
    phase: u64,
    facing: Facing,
    /// Shared by the run and climb cycles.
    walk_index: usize,
    idle_index: usize,
    death_index: usize,
    frame: Frame,
}

impl Default for PlayerAnimator {
    fn default() -> Self {
        PlayerAnimator {
            phase: 0,
            facing: Facing::Right,
            walk_index: 0,
            idle_index: 0,
            death_index: 0,
            frame: Frame::Idle(0),
        }
    }
}

impl PlayerAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> Frame { self.frame }
    pub fn facing(&self) -> Facing { self.facing }
    #[cfg(test)]
    pub fn phase(&self) -> u64 { self.phase }

    pub fn advance(&mut self, input: Kinematics) -> AnimationSignal {
        self.phase += 1;
        let velocity = sanitized(input.velocity);

        if input.dead {
            return self.advance_death();
        }

        if velocity.x < 0.0 && self.facing == Facing::Right {
            self.facing = Facing::Left;
        } else if velocity.x > 0.0 && self.facing == Facing::Left {
            self.facing = Facing::Right;
        }

        if input.on_ladder {
            if velocity.y.abs() > CLIMB_MIN_SPEED && self.phase % 2 == 1 {
                self.walk_index += 1;
            }
            if self.walk_index > CLIMB_PHASE_MAX {
                self.walk_index = 0;
            }
            self.frame = Frame::Climb(self.walk_index / 4);
            return AnimationSignal::None;
        }

        if velocity.y > 0.0 {
            self.frame = Frame::Jump;
        } else if velocity.y < 0.0 {
            self.frame = Frame::Fall;
        } else if velocity.x == 0.0 {
            if self.phase % IDLE_EVERY == 0 {
                self.idle_index = (self.idle_index + 1) % PLAYER_IDLE_FRAMES;
            }
            self.frame = Frame::Idle(self.idle_index);
        } else {
            if self.phase % PLAYER_WALK_EVERY == 0 {
                self.walk_index += 1;
            }
            if self.walk_index >= WALK_FRAMES {
                self.walk_index = 0;
            }
            self.frame = Frame::Walk(self.walk_index);
        }
        AnimationSignal::None
    }

    fn advance_death(&mut self) -> AnimationSignal {
        if self.phase % DEATH_EVERY == 0 {
            self.death_index += 1;
            if self.death_index >= DEATH_FRAMES {
                self.death_index = 0;
                return AnimationSignal::RespawnRequested;
            }
        }
        self.frame = Frame::Death(self.death_index);
        AnimationSignal::None
    }
}

// ══════════════════════════════════════════════════════════════
// Enemy
// ══════════════════════════════════════════════════════════════

/// Enemies only idle or walk. Their facing flag is the mirror of the
/// travel direction because monster art is drawn facing left.
#[derive(Clone, Debug)]
pub struct EnemyAnimator {
    phase: u64,
    facing: Facing,
    walk_index: usize,
    idle_index: usize,
    frame: Frame,
}

impl Default for EnemyAnimator {
    fn default() -> Self {
        EnemyAnimator {
            phase: 0,
            facing: Facing::Right,
            walk_index: 0,
            idle_index: 0,
            frame: Frame::Idle(0),
        }
    }
}

impl EnemyAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> Frame { self.frame }
    pub fn facing(&self) -> Facing { self.facing }

    pub fn advance(&mut self, velocity: Vec2) {
        self.phase += 1;
        let vx = sanitize(velocity.x);

        if vx < 0.0 && self.facing == Facing::Left {
            self.facing = Facing::Right;
        } else if vx > 0.0 && self.facing == Facing::Right {
            self.facing = Facing::Left;
        }

        if vx == 0.0 {
            if self.phase % IDLE_EVERY == 0 {
                self.idle_index = (self.idle_index + 1) % ENEMY_IDLE_FRAMES;
            }
            self.frame = Frame::Idle(self.idle_index);
        } else {
            if self.phase % ENEMY_WALK_EVERY == 0 {
                self.walk_index = (self.walk_index + 1) % WALK_FRAMES;
            }
            self.frame = Frame::Walk(self.walk_index);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Texture tables
// ══════════════════════════════════════════════════════════════

fn load_pairs(
    loader: &mut dyn AssetLoader,
    base: &str,
    stem: &str,
    count: usize,
) -> Result<Vec<TexturePair>, AssetError> {
    (0..count)
        .map(|i| loader.load_texture_pair(&format!("{base}{stem}{i}.png")))
        .collect()
}

/// Player art, loaded from `{base}idle0..4`, `run0..5`, `jump`, `fall`,
/// `death0..6` and `climb0..1`.
#[derive(Clone, Debug)]
pub struct PlayerTextures {
    idle: Vec<TexturePair>,
    walk: Vec<TexturePair>,
    jump: TexturePair,
    fall: TexturePair,
    death: Vec<TexturePair>,
    climb: Vec<Texture>,
}

impl PlayerTextures {
    pub fn load(loader: &mut dyn AssetLoader, base: &str) -> Result<Self, AssetError> {
        Ok(PlayerTextures {
            idle: load_pairs(loader, base, "idle", PLAYER_IDLE_FRAMES)?,
            walk: load_pairs(loader, base, "run", WALK_FRAMES)?,
            jump: loader.load_texture_pair(&format!("{base}jump.png"))?,
            fall: loader.load_texture_pair(&format!("{base}fall.png"))?,
            death: load_pairs(loader, base, "death", DEATH_FRAMES)?,
            climb: (0..CLIMB_FRAMES)
                .map(|i| loader.load_texture(&format!("{base}climb{i}.png")))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Standing texture, used to size the body.
    pub fn initial(&self) -> Texture {
        self.idle[0].normal
    }

    pub fn texture(&self, frame: Frame, facing: Facing) -> Texture {
        match frame {
            Frame::Idle(i) => self.idle[i % self.idle.len()].for_facing(facing),
            Frame::Walk(i) => self.walk[i % self.walk.len()].for_facing(facing),
            Frame::Jump => self.jump.for_facing(facing),
            Frame::Fall => self.fall.for_facing(facing),
            Frame::Death(i) => self.death[i % self.death.len()].for_facing(facing),
            Frame::Climb(i) => self.climb[i % self.climb.len()],
        }
    }
}

/// Monster art, loaded from `{base}idle0..3` and `run0..5`.
#[derive(Clone, Debug)]
pub struct EnemyTextures {
    idle: Vec<TexturePair>,
    walk: Vec<TexturePair>,
}

impl EnemyTextures {
    pub fn load(loader: &mut dyn AssetLoader, base: &str) -> Result<Self, AssetError> {
        Ok(EnemyTextures {
            idle: load_pairs(loader, base, "idle", ENEMY_IDLE_FRAMES)?,
            walk: load_pairs(loader, base, "run", WALK_FRAMES)?,
        })
    }

    pub fn initial(&self) -> Texture {
        self.idle[0].normal
    }

    pub fn texture(&self, frame: Frame, facing: Facing) -> Texture {
        match frame {
            Frame::Walk(i) => self.walk[i % self.walk.len()].for_facing(facing),
            Frame::Idle(i) | Frame::Climb(i) | Frame::Death(i) => {
                self.idle[i % self.idle.len()].for_facing(facing)
            }
            Frame::Jump | Frame::Fall => self.idle[0].for_facing(facing),
        }
    }
}
