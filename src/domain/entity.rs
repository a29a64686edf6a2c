/// Entities: bodies, blocks, coins, patrol limits, and the player motion
/// state machine. Animated actors (player, enemies) live in `actor.rs`.

use glam::Vec2;

use super::gfx::Texture;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// Axis-aligned box in world units, y pointing up.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl Rect {
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Rect {
            left: center.x - half.x,
            bottom: center.y - half.y,
            right: center.x + half.x,
            top: center.y + half.y,
        }
    }

    /// Strict overlap: boxes that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.bottom < other.top
            && self.top > other.bottom
    }

    pub fn offset(&self, delta: Vec2) -> Rect {
        Rect {
            left: self.left + delta.x,
            bottom: self.bottom + delta.y,
            right: self.right + delta.x,
            top: self.top + delta.y,
        }
    }
}

/// Kinematic state shared by everything that can move.
/// `position` is the centre of the box.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: Vec2,
}

impl Body {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Body { position, velocity: Vec2::ZERO, size }
    }

    pub fn left(&self) -> f32 { self.position.x - self.size.x * 0.5 }
    pub fn right(&self) -> f32 { self.position.x + self.size.x * 0.5 }
    pub fn bottom(&self) -> f32 { self.position.y - self.size.y * 0.5 }
    pub fn top(&self) -> f32 { self.position.y + self.size.y * 0.5 }

    pub fn set_left(&mut self, x: f32) { self.position.x = x + self.size.x * 0.5; }
    pub fn set_right(&mut self, x: f32) { self.position.x = x - self.size.x * 0.5; }
    pub fn set_bottom(&mut self, y: f32) { self.position.y = y + self.size.y * 0.5; }
    pub fn set_top(&mut self, y: f32) { self.position.y = y - self.size.y * 0.5; }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.position, self.size)
    }

    /// Integrate one tick of velocity.
    pub fn advance(&mut self) {
        self.position += self.velocity;
    }
}

/// Optional per-side patrol limits. A `None` side is never checked.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct PatrolBoundary {
    pub left: Option<f32>,
    pub right: Option<f32>,
    pub top: Option<f32>,
    pub bottom: Option<f32>,
}

impl PatrolBoundary {
    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none() && self.top.is_none() && self.bottom.is_none()
    }
}

/// A tile-map entity with a body: platforms, moving platforms, ladders,
/// hazard tiles and decoration.
#[derive(Clone, Debug)]
pub struct Block {
    pub body: Body,
    pub texture: Texture,
    pub boundary: Option<PatrolBoundary>,
}

impl Block {
    pub fn new(position: Vec2, size: Vec2, texture: Texture) -> Self {
        Block { body: Body::new(position, size), texture, boundary: None }
    }
}

/// Stable per-session coin handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct CoinId(pub u32);

#[derive(Clone, Debug)]
pub struct Coin {
    pub id: CoinId,
    pub body: Body,
    pub texture: Texture,
    pub points: u32,
}

/// Player motion state machine.
///
/// Transitions:
///   - any live state → `Dead` on hazard contact (`kill`)
///   - `Dead` → `Airborne` on respawn (the next physics step decides the rest)
///   - live states, after each physics step (`resolve`):
///       ladder contact while not standing on a platform → `Climbing`
///       standing on a platform → `Grounded`
///       otherwise → `Airborne`
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum MotionState {
    Grounded,
    #[default]
    Airborne,
    Climbing,
    Dead,
}

impl MotionState {
    pub fn resolve(self, ladder_contact: bool, can_jump: bool) -> MotionState {
        match self {
            MotionState::Dead => MotionState::Dead,
            _ if ladder_contact && !can_jump => MotionState::Climbing,
            _ if can_jump => MotionState::Grounded,
            _ => MotionState::Airborne,
        }
    }

    pub fn is_dead(self) -> bool {
        self == MotionState::Dead
    }

    pub fn on_ladder(self) -> bool {
        self == MotionState::Climbing
    }
}
