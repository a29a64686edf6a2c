/// Entry point and host loop.

mod config;
mod domain;
mod error;
mod logging;
mod sim;
mod ui;

#[cfg(test)]
mod testing;

use std::time::{Duration, Instant};

use anyhow::Context;

use config::GameConfig;
use domain::gfx::RenderSurface;
use sim::event::GameEvent;
use sim::game::{Game, Screen};
use sim::level::LevelDirectory;
use ui::assets::GlyphAtlas;
use ui::gamepad::GamepadInput;
use ui::input::{HostEvent, KeyboardInput};
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    if let Err(e) = logging::setup_logging(&config.logging) {
        eprintln!("Could not open log file {}: {e}", config.logging.file.display());
    }
    for warning in &config.warnings {
        tracing::warn!("config: {warning}");
    }

    match run(&config) {
        Ok(score) => {
            println!();
            println!("Thanks for playing Lion Run!");
            println!("Final Score: {score}");
        }
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("Game error: {e:#}");
            std::process::exit(1);
        }
    }
}

/// Build the game, own the terminal for the duration, and return the final
/// score. The terminal is restored even when the loop fails.
fn run(config: &GameConfig) -> anyhow::Result<u32> {
    let atlas = GlyphAtlas::load(&config.assets).context("loading glyph atlas")?;
    let levels = LevelDirectory::new(&config.levels, &config.tuning);
    let mut game = Game::new(config, Box::new(atlas.clone()), Box::new(levels))
        .context("loading screen textures")?;
    tracing::debug!(textures = atlas.loaded_count(), "Screen textures loaded");

    let mut renderer = Renderer::new(atlas);
    renderer.init().context("terminal init failed")?;

    let result = KeyboardInput::attach()
        .context("enabling terminal input")
        .and_then(|mut keyboard| {
            let looped = game_loop(&mut game, &mut renderer, &mut keyboard, config);
            if let Err(e) = keyboard.detach() {
                tracing::warn!("Restoring terminal input failed: {e}");
            }
            looped
        });

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    result?;
    let finished = matches!(game.screen(), Screen::GameOver { .. });
    tracing::info!(finished, score = game.total_score(), "Leaving game");
    Ok(game.total_score())
}

fn game_loop(
    game: &mut Game,
    renderer: &mut Renderer,
    keyboard: &mut KeyboardInput,
    config: &GameConfig,
) -> anyhow::Result<()> {
    let mut gamepad = GamepadInput::new(&config.gamepad);
    let tick_rate = Duration::from_millis(config.tick_rate_ms);
    let mut last_tick = Instant::now();

    loop {
        let mut events = keyboard.drain_events();
        events.extend(gamepad.drain_events());

        for event in events {
            match event {
                HostEvent::Quit => {
                    tracing::info!("Quit requested");
                    return Ok(());
                }
                HostEvent::KeyPress(key) => game.key_press(key),
                HostEvent::KeyRelease(key) => game.key_release(key),
                HostEvent::Click => game.click().context("starting a new game")?,
            }
        }

        if last_tick.elapsed() >= tick_rate {
            let report = game.tick().context("advancing the game")?;
            process_events(&report.events);
            if let Some(viewport) = report.viewport {
                renderer.set_viewport(viewport);
            }
            last_tick = Instant::now();
        }

        game.render(renderer).context("drawing frame")?;
        std::thread::sleep(FRAME_SLEEP);
    }
}

fn process_events(events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::LevelLoaded { level } => tracing::info!(level, "Level loaded"),
            GameEvent::GameOver { final_score } => tracing::info!(final_score, "Showing game over"),
            other => tracing::debug!(event = ?other, "Game event"),
        }
    }
}
