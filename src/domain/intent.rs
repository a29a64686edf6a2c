/// Input-to-intent mapping.
///
/// `InputState` is the only thing key events touch. `map_intent` turns it
/// into target velocities given what the physics engine reports about the
/// player this tick.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
}

/// Held directions. Releasing an unpressed key is a no-op.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl InputState {
    pub fn press(&mut self, key: Key) {
        self.set(key, true);
    }

    pub fn release(&mut self, key: Key) {
        self.set(key, false);
    }

    fn set(&mut self, key: Key, held: bool) {
        match key {
            Key::Up => self.up = held,
            Key::Down => self.down = held,
            Key::Left => self.left = held,
            Key::Right => self.right = held,
        }
    }
}

/// Set when a jump fires; cleared only by releasing Up.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct JumpLatch {
    latched: bool,
}

impl JumpLatch {
    pub fn is_latched(self) -> bool {
        self.latched
    }

    pub fn on_release(&mut self, key: Key) {
        if key == Key::Up {
            self.latched = false;
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct IntentContext {
    /// Raw ladder overlap, not the climbing state: standing at the foot of
    /// a ladder still lets Up climb.
    pub on_ladder: bool,
    pub can_jump: bool,
    pub player_left: f32,
    pub dead: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct IntentSpeeds {
    pub movement: f32,
    pub jump: f32,
}

/// Desired player velocity. `vy: None` leaves vertical motion to physics.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Intent {
    pub vx: f32,
    pub vy: Option<f32>,
}

impl Intent {
    pub const STILL: Intent = Intent { vx: 0.0, vy: Some(0.0) };
}

pub fn map_intent(
    input: &InputState,
    ctx: &IntentContext,
    latch: &mut JumpLatch,
    speeds: IntentSpeeds,
) -> Intent {
    if ctx.dead {
        return Intent::STILL;
    }

    let mut vy = None;
    match (input.up, input.down) {
        (true, false) => {
            if ctx.on_ladder {
                vy = Some(speeds.movement);
            } else if ctx.can_jump && !latch.is_latched() {
                vy = Some(speeds.jump);
                latch.latched = true;
            }
        }
        (false, true) if ctx.on_ladder => vy = Some(-speeds.movement),
        _ if ctx.on_ladder => vy = Some(0.0),
        _ => {}
    }

    let vx = match (input.left, input.right) {
        (false, true) => speeds.movement,
        (true, false) if ctx.player_left > 0.0 => -speeds.movement,
        _ => 0.0,
    };

    Intent { vx, vy }
}
