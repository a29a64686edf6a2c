/// Keyboard and mouse front-end.
///
/// Turns crossterm events into `HostEvent`s: press/release edges for the four
/// direction keys, a click for mouse-down / Enter / Space, and a quit for
/// Esc or Ctrl+C.
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't
/// support it.

use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, KeyboardEnhancementFlags, MouseButton, MouseEventKind,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};

use crate::domain::intent::Key;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// What the host loop acts on.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HostEvent {
    KeyPress(Key),
    KeyRelease(Key),
    Click,
    Quit,
}

fn direction(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Key::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Key::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Key::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Key::Right),
        _ => None,
    }
}

pub struct KeyboardInput {
    /// Timestamp of last Press/Repeat event for each held key.
    last_active: HashMap<Key, Instant>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl KeyboardInput {
    pub fn new(honor_release: bool) -> Self {
        KeyboardInput { last_active: HashMap::with_capacity(4), honor_release }
    }

    /// Turn on mouse capture, and release reporting where the terminal
    /// supports it. Call after the terminal is in raw mode.
    pub fn attach() -> io::Result<Self> {
        let mut stdout = io::stdout();
        execute!(stdout, EnableMouseCapture)?;
        let honor_release = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if honor_release {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        tracing::info!(honor_release, "Keyboard input attached");
        Ok(Self::new(honor_release))
    }

    pub fn detach(&self) -> io::Result<()> {
        let mut stdout = io::stdout();
        if self.honor_release {
            execute!(stdout, PopKeyboardEnhancementFlags)?;
        }
        execute!(stdout, DisableMouseCapture)
    }

    /// Drain all pending terminal events without blocking.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) -> Vec<HostEvent> {
        let mut out = Vec::new();
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(ev) => self.handle(ev, Instant::now(), &mut out),
                Err(e) => {
                    tracing::warn!("Terminal event read failed: {e}");
                    break;
                }
            }
        }
        if !self.honor_release {
            self.expire(Instant::now(), &mut out);
        }
        out
    }

    fn handle(&mut self, ev: Event, now: Instant, out: &mut Vec<HostEvent>) {
        match ev {
            Event::Key(key) => self.handle_key(key, now, out),
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                out.push(HostEvent::Click);
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant, out: &mut Vec<HostEvent>) {
        let pressed = key.kind != KeyEventKind::Release;

        if pressed {
            let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'));
            if ctrl_c || key.code == KeyCode::Esc {
                out.push(HostEvent::Quit);
                return;
            }
            if key.kind == KeyEventKind::Press
                && matches!(key.code, KeyCode::Enter | KeyCode::Char(' '))
            {
                out.push(HostEvent::Click);
                return;
            }
        }

        let Some(dir) = direction(key.code) else { return };
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                if self.last_active.remove(&dir).is_some() {
                    out.push(HostEvent::KeyRelease(dir));
                }
            }
            // Without enhancement, rely on timeout-based expiry instead.
            KeyEventKind::Release => {}
            _ => {
                if self.last_active.insert(dir, now).is_none() {
                    out.push(HostEvent::KeyPress(dir));
                }
            }
        }
    }

    /// Release keys whose last Press/Repeat is older than the hold timeout.
    fn expire(&mut self, now: Instant, out: &mut Vec<HostEvent>) {
        let mut expired: Vec<Key> = self
            .last_active
            .iter()
            .filter(|(_, t)| now.duration_since(**t) >= HOLD_TIMEOUT)
            .map(|(k, _)| *k)
            .collect();
        expired.sort_by_key(|k| *k as u8);
        for key in expired {
            self.last_active.remove(&key);
            out.push(HostEvent::KeyRelease(key));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseEvent};
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    fn feed(input: &mut KeyboardInput, events: Vec<Event>, now: Instant) -> Vec<HostEvent> {
        let mut out = vec![];
        for ev in events {
            input.handle(ev, now, &mut out);
        }
        out
    }

    #[test]
    fn repeats_collapse_into_one_press() {
        let mut input = KeyboardInput::new(true);
        let now = Instant::now();
        let out = feed(&mut input, vec![
            key(KeyCode::Right, KeyEventKind::Press),
            key(KeyCode::Right, KeyEventKind::Repeat),
            key(KeyCode::Char('d'), KeyEventKind::Repeat),
            key(KeyCode::Right, KeyEventKind::Release),
            key(KeyCode::Right, KeyEventKind::Release),
        ], now);
        assert_eq!(out, vec![HostEvent::KeyPress(Key::Right), HostEvent::KeyRelease(Key::Right)]);
    }

    #[test]
    fn release_ignored_without_enhancement_until_timeout() {
        let mut input = KeyboardInput::new(false);
        let now = Instant::now();
        let out = feed(&mut input, vec![
            key(KeyCode::Up, KeyEventKind::Press),
            key(KeyCode::Up, KeyEventKind::Release),
        ], now);
        assert_eq!(out, vec![HostEvent::KeyPress(Key::Up)]);

        let mut out = vec![];
        input.expire(now + Duration::from_millis(50), &mut out);
        assert!(out.is_empty());
        input.expire(now + HOLD_TIMEOUT, &mut out);
        assert_eq!(out, vec![HostEvent::KeyRelease(Key::Up)]);
    }

    #[test]
    fn quit_and_click_keys() {
        let mut input = KeyboardInput::new(true);
        let ctrl_c = Event::Key(KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        });
        let click = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 3,
            row: 4,
            modifiers: KeyModifiers::NONE,
        });
        let out = feed(&mut input, vec![
            key(KeyCode::Enter, KeyEventKind::Press),
            key(KeyCode::Enter, KeyEventKind::Release),
            click,
            key(KeyCode::Esc, KeyEventKind::Press),
            ctrl_c,
        ], Instant::now());
        assert_eq!(out, vec![HostEvent::Click, HostEvent::Click, HostEvent::Quit, HostEvent::Quit]);
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        let mut input = KeyboardInput::new(true);
        let out = feed(&mut input, vec![key(KeyCode::Char('z'), KeyEventKind::Press)], Instant::now());
        assert!(out.is_empty());
    }
}
