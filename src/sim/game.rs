/// Game: the screen state machine wrapped around level sessions.
///
/// ## Screens
///   Instructions ──click──▶ Playing(1) ──edge──▶ Playing(2) … ──edge──▶ GameOver
///   GameOver ──click──▶ Playing(1)
///
/// Key state and the jump latch belong to the game, not the session, so a
/// key held across a level load keeps acting on the new level.

use std::mem;

use glam::Vec2;

use crate::config::{GameConfig, Tuning};
use crate::domain::camera::{Camera, Viewport};
use crate::domain::gfx::{AssetLoader, RenderSurface, Texture};
use crate::domain::intent::{InputState, JumpLatch, Key};
use crate::error::GameResult;
use super::event::GameEvent;
use super::level::LevelSource;
use super::session::LevelSession;
use super::step::step;

pub const INSTRUCTIONS_TEXTURE: &str = "startscreen.png";
pub const GAME_OVER_TEXTURE: &str = "game_over.png";

pub enum Screen {
    Instructions,
    Playing(Box<LevelSession>),
    GameOver { final_score: u32 },
}

impl Screen {
    pub fn is_playing(&self) -> bool {
        matches!(self, Screen::Playing(_))
    }
}

/// Everything one `tick` produced for the host.
#[derive(Debug, Default, PartialEq)]
pub struct TickReport {
    pub events: Vec<GameEvent>,
    /// Push this to the rendering surface when set.
    pub viewport: Option<Viewport>,
}

pub struct Game {
    tuning: Tuning,
    assets: Box<dyn AssetLoader>,
    levels: Box<dyn LevelSource>,
    screen: Screen,
    input: InputState,
    latch: JumpLatch,
    /// Scores of completed levels in the current run.
    banked: u32,
    pending_events: Vec<GameEvent>,
    pending_viewport: Option<Viewport>,
    instructions: Texture,
    game_over: Texture,
}

impl Game {
    pub fn new(
        config: &GameConfig,
        mut assets: Box<dyn AssetLoader>,
        levels: Box<dyn LevelSource>,
    ) -> GameResult<Self> {
        let instructions = assets.load_texture(INSTRUCTIONS_TEXTURE)?;
        let game_over = assets.load_texture(GAME_OVER_TEXTURE)?;
        let tuning = config.tuning.clone();
        let origin = Camera::new().viewport(&tuning);

        Ok(Game {
            tuning,
            assets,
            levels,
            screen: Screen::Instructions,
            input: InputState::default(),
            latch: JumpLatch::default(),
            banked: 0,
            pending_events: vec![],
            pending_viewport: Some(origin),
            instructions,
            game_over,
        })
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn session(&self) -> Option<&LevelSession> {
        match &self.screen {
            Screen::Playing(session) => Some(session.as_ref()),
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn session_mut(&mut self) -> Option<&mut LevelSession> {
        match &mut self.screen {
            Screen::Playing(session) => Some(session.as_mut()),
            _ => None,
        }
    }

    /// Banked scores plus the running level's score.
    pub fn total_score(&self) -> u32 {
        let current = self.session().map_or(0, LevelSession::score);
        self.banked.saturating_add(current)
    }

    // ── Input ──

    pub fn key_press(&mut self, key: Key) {
        self.input.press(key);
        self.refresh_intent();
    }

    pub fn key_release(&mut self, key: Key) {
        self.input.release(key);
        self.latch.on_release(key);
        self.refresh_intent();
    }

    fn refresh_intent(&mut self) {
        if let Screen::Playing(session) = &mut self.screen {
            session.apply_intent(&self.input, &mut self.latch);
        }
    }

    /// Begin a run from level 1 on a static screen; ignored while playing.
    pub fn click(&mut self) -> GameResult<()> {
        if self.screen.is_playing() {
            return Ok(());
        }
        tracing::info!("Starting new game");
        self.banked = 0;
        self.load_level(1)
    }

    // ── Simulation ──

    pub fn tick(&mut self) -> GameResult<TickReport> {
        let mut report = TickReport {
            events: mem::take(&mut self.pending_events),
            viewport: self.pending_viewport.take(),
        };

        let Screen::Playing(session) = &mut self.screen else {
            return Ok(report);
        };

        let outcome = step(session, &self.input, &mut self.latch);
        report.events.extend(outcome.events);
        if outcome.viewport_changed {
            report.viewport = Some(session.viewport());
        }

        if outcome.level_complete {
            let next = session.level + 1;
            self.banked = self.banked.saturating_add(session.score());
            self.advance_to(next)?;
            report.events.append(&mut self.pending_events);
            if let Some(viewport) = self.pending_viewport.take() {
                report.viewport = Some(viewport);
            }
        }

        Ok(report)
    }

    fn advance_to(&mut self, level: u32) -> GameResult<()> {
        if level <= self.tuning.total_levels {
            return self.load_level(level);
        }
        let final_score = self.banked;
        tracing::info!(final_score, "Game over");
        self.screen = Screen::GameOver { final_score };
        self.pending_viewport = Some(Camera::new().viewport(&self.tuning));
        self.pending_events.push(GameEvent::GameOver { final_score });
        Ok(())
    }

    /// Full reload: a new session replaces whatever screen was up.
    fn load_level(&mut self, level: u32) -> GameResult<()> {
        let map = self.levels.load(level)?;
        let mut session = LevelSession::setup(level, &map, self.assets.as_mut(), &self.tuning)?;
        session.apply_intent(&self.input, &mut self.latch);

        self.pending_viewport = Some(session.viewport());
        self.pending_events.push(GameEvent::LevelLoaded { level });
        self.screen = Screen::Playing(Box::new(session));
        Ok(())
    }

    // ── Drawing ──

    pub fn render(&self, surface: &mut dyn RenderSurface) -> std::io::Result<()> {
        match &self.screen {
            Screen::Instructions => surface.draw_screen(self.instructions.id),
            Screen::GameOver { final_score } => {
                surface.draw_screen(self.game_over.id);
                surface.draw_text(&format!("Final score: {final_score}"), Vec2::new(10.0, 10.0), 30.0);
            }
            Screen::Playing(session) => {
                surface.draw_backdrop(session.backdrop.id);
                surface.draw_sprites(&session.draw_commands());
                let (text, position, size) = session.hud();
                surface.draw_text(&text, position, size);
            }
        }
        surface.present()
    }
}
