/// Gamepad front-end using gilrs (feature `gamepad`).
///
/// D-pad and left stick produce the same press/release edges as the arrow
/// keys; any of the configured begin buttons produces a click. Without the
/// feature the struct still exists but never reports anything.
///
/// Default mapping:
///   D-pad / Left Stick    →  Movement
///   Start / A             →  Begin (click)

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::intent::Key;
use super::input::HostEvent;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Held directions from one source (d-pad or stick).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
struct Directions {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

impl Directions {
    fn union(self, other: Directions) -> Directions {
        Directions {
            up: self.up || other.up,
            down: self.down || other.down,
            left: self.left || other.left,
            right: self.right || other.right,
        }
    }

    fn pairs(self) -> [(Key, bool); 4] {
        [(Key::Up, self.up), (Key::Down, self.down), (Key::Left, self.left), (Key::Right, self.right)]
    }

    /// Press/release edges going from `self` to `next`.
    fn edges(self, next: Directions, out: &mut Vec<HostEvent>) {
        for ((key, was), (_, now)) in self.pairs().into_iter().zip(next.pairs()) {
            match (was, now) {
                (false, true) => out.push(HostEvent::KeyPress(key)),
                (true, false) => out.push(HostEvent::KeyRelease(key)),
                _ => {}
            }
        }
    }

    fn from_stick(x: f32, y: f32) -> Directions {
        Directions {
            up: y > STICK_DEADZONE,
            down: y < -STICK_DEADZONE,
            left: x < -STICK_DEADZONE,
            right: x > STICK_DEADZONE,
        }
    }
}

pub struct GamepadInput {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    dpad: Directions,
    stick_x: f32,
    stick_y: f32,
    /// What was last reported, so only edges are emitted.
    reported: Directions,
    begin: Vec<Btn>,

    pub connected: bool,
}

impl GamepadInput {
    pub fn new(cfg: &GamepadConfig) -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(e) => {
                    tracing::warn!("Gamepad support unavailable: {e}");
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        let mut begin: Vec<Btn> = cfg.begin.iter().filter_map(|s| Btn::from_name(s)).collect();
        if begin.is_empty() {
            begin = vec![Btn::Start, Btn::A];
        }

        GamepadInput {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            dpad: Directions::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            reported: Directions::default(),
            begin,
            connected,
        }
    }

    /// Drain pending gamepad events into host events.
    pub fn drain_events(&mut self) -> Vec<HostEvent> {
        let mut out = Vec::new();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs(&mut out);

        self.emit_direction_edges(&mut out);
        out
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self, out: &mut Vec<HostEvent>) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true, out);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false, out);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    tracing::info!("Gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    tracing::info!("Gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool, out: &mut Vec<HostEvent>) {
        // D-pad handled separately (not in Btn enum)
        match gilrs_btn {
            Button::DPadUp    => { self.dpad.up = held; return; }
            Button::DPadDown  => { self.dpad.down = held; return; }
            Button::DPadLeft  => { self.dpad.left = held; return; }
            Button::DPadRight => { self.dpad.right = held; return; }
            _ => {}
        }
        if held {
            if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
                self.press_button(btn, out);
            }
        }
    }

    fn press_button(&self, btn: Btn, out: &mut Vec<HostEvent>) {
        if self.begin.contains(&btn) {
            out.push(HostEvent::Click);
        }
    }

    fn emit_direction_edges(&mut self, out: &mut Vec<HostEvent>) {
        let held = self.dpad.union(Directions::from_stick(self.stick_x, self.stick_y));
        self.reported.edges(held, out);
        self.reported = held;
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.dpad = Directions::default();
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}
