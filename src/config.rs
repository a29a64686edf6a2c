/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing or incomplete. Problems are
/// collected in `warnings` and logged once logging is up, since the log file
/// location itself comes from this config.

use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::Deserialize;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tuning: Tuning,
    pub levels: LevelsConfig,
    pub assets: AssetsConfig,
    pub tick_rate_ms: u64,
    pub gamepad: GamepadConfig,
    pub logging: LoggingConfig,
    pub warnings: Vec<String>,
}

/// Every number the simulation reads. Cloned into each level session.
#[derive(Clone, Debug, PartialEq)]
pub struct Tuning {
    pub screen_width: f32,
    pub screen_height: f32,

    pub left_margin: f32,
    pub right_margin: f32,
    pub bottom_margin: f32,
    pub top_margin: f32,
    /// Left scrolling stops once `view_left` is at or below this.
    pub left_scroll_epsilon: f32,
    /// Bottom scrolling stops once `view_bottom` is at or below this.
    pub bottom_scroll_epsilon: f32,

    pub gravity: f32,
    pub player_movement_speed: f32,
    pub player_jump_speed: f32,
    pub character_scaling: f32,
    pub tile_scaling: f32,
    pub sprite_pixel_size: f32,

    pub player_start: Vec2,
    pub total_levels: u32,
}

impl Tuning {
    /// World units per map tile.
    pub fn grid_pixel_size(&self) -> f32 {
        self.sprite_pixel_size * self.tile_scaling
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            screen_width: 1600.0,
            screen_height: 900.0,
            left_margin: 500.0,
            right_margin: 800.0,
            bottom_margin: 250.0,
            top_margin: 250.0,
            left_scroll_epsilon: 15.0,
            bottom_scroll_epsilon: 20.0,
            gravity: 1.0,
            player_movement_speed: 7.0,
            player_jump_speed: 20.0,
            character_scaling: 0.7,
            tile_scaling: 1.0,
            sprite_pixel_size: 32.0,
            player_start: Vec2::new(200.0, 500.0),
            total_levels: 3,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LevelsConfig {
    pub dir: PathBuf,
    /// File name with `{}` standing in for the 1-based level number.
    pub file_pattern: String,
}

impl LevelsConfig {
    pub fn file_name(&self, level: u32) -> String {
        self.file_pattern.replace("{}", &level.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct AssetsConfig {
    pub dir: PathBuf,
    pub manifest: String,
}

impl AssetsConfig {
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(&self.manifest)
    }
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub begin: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub file: PathBuf,
    pub filter: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    screen: TomlScreen,
    #[serde(default)]
    viewport: TomlViewport,
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    levels: TomlLevels,
    #[serde(default)]
    assets: TomlAssets,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    logging: TomlLogging,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
struct TomlScreen {
    width: f32,
    height: f32,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
struct TomlViewport {
    left_margin: f32,
    right_margin: f32,
    bottom_margin: f32,
    top_margin: f32,
    left_scroll_epsilon: f32,
    bottom_scroll_epsilon: f32,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
struct TomlPhysics {
    gravity: f32,
    player_movement_speed: f32,
    player_jump_speed: f32,
    character_scaling: f32,
    tile_scaling: f32,
    sprite_pixel_size: f32,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
struct TomlPlayer {
    start_x: f32,
    start_y: f32,
}

#[derive(Deserialize, Debug)]
struct TomlLevels {
    #[serde(default = "default_total_levels")]
    total: u32,
    #[serde(default = "default_levels_dir")]
    dir: String,
    #[serde(default = "default_level_pattern")]
    file_pattern: String,
}

#[derive(Deserialize, Debug)]
struct TomlAssets {
    #[serde(default = "default_assets_dir")]
    dir: String,
    #[serde(default = "default_manifest")]
    manifest: String,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_begin_buttons")]
    begin: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlLogging {
    #[serde(default = "default_log_file")]
    file: String,
    #[serde(default = "default_log_filter")]
    filter: String,
}

// ── Defaults ──

fn default_total_levels() -> u32 { 3 }
fn default_levels_dir() -> String { "maps".into() }
fn default_level_pattern() -> String { "map1_level_{}.toml".into() }
fn default_assets_dir() -> String { "assets".into() }
fn default_manifest() -> String { "glyphs.toml".into() }
fn default_tick_rate() -> u64 { 16 } // ~60 ticks per second
fn default_begin_buttons() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_log_file() -> String { "lionrun.log".into() }
fn default_log_filter() -> String { "info".into() }

impl Default for TomlScreen {
    fn default() -> Self {
        let t = Tuning::default();
        TomlScreen { width: t.screen_width, height: t.screen_height }
    }
}

impl Default for TomlViewport {
    fn default() -> Self {
        let t = Tuning::default();
        TomlViewport {
            left_margin: t.left_margin,
            right_margin: t.right_margin,
            bottom_margin: t.bottom_margin,
            top_margin: t.top_margin,
            left_scroll_epsilon: t.left_scroll_epsilon,
            bottom_scroll_epsilon: t.bottom_scroll_epsilon,
        }
    }
}

impl Default for TomlPhysics {
    fn default() -> Self {
        let t = Tuning::default();
        TomlPhysics {
            gravity: t.gravity,
            player_movement_speed: t.player_movement_speed,
            player_jump_speed: t.player_jump_speed,
            character_scaling: t.character_scaling,
            tile_scaling: t.tile_scaling,
            sprite_pixel_size: t.sprite_pixel_size,
        }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        let t = Tuning::default();
        TomlPlayer { start_x: t.player_start.x, start_y: t.player_start.y }
    }
}

impl Default for TomlLevels {
    fn default() -> Self {
        TomlLevels {
            total: default_total_levels(),
            dir: default_levels_dir(),
            file_pattern: default_level_pattern(),
        }
    }
}

impl Default for TomlAssets {
    fn default() -> Self {
        TomlAssets { dir: default_assets_dir(), manifest: default_manifest() }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad { begin: default_begin_buttons() }
    }
}

impl Default for TomlLogging {
    fn default() -> Self {
        TomlLogging { file: default_log_file(), filter: default_log_filter() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = vec![];
        let toml_cfg = load_toml(&search_dirs, &mut warnings);
        Self::from_toml(toml_cfg, &search_dirs, warnings)
    }

    /// Parse config text directly. Used for tests and for embedding.
    pub fn from_toml_str(text: &str) -> Self {
        let mut warnings = vec![];
        let toml_cfg = parse_toml(text, Path::new("config.toml"), &mut warnings);
        Self::from_toml(toml_cfg, &[], warnings)
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf], mut warnings: Vec<String>) -> Self {
        let mut total_levels = cfg.levels.total;
        if total_levels == 0 {
            warnings.push("levels.total must be at least 1; using 1".into());
            total_levels = 1;
        }

        let tuning = Tuning {
            screen_width: cfg.screen.width,
            screen_height: cfg.screen.height,
            left_margin: cfg.viewport.left_margin,
            right_margin: cfg.viewport.right_margin,
            bottom_margin: cfg.viewport.bottom_margin,
            top_margin: cfg.viewport.top_margin,
            left_scroll_epsilon: cfg.viewport.left_scroll_epsilon,
            bottom_scroll_epsilon: cfg.viewport.bottom_scroll_epsilon,
            gravity: cfg.physics.gravity,
            player_movement_speed: cfg.physics.player_movement_speed,
            player_jump_speed: cfg.physics.player_jump_speed,
            character_scaling: cfg.physics.character_scaling,
            tile_scaling: cfg.physics.tile_scaling,
            sprite_pixel_size: cfg.physics.sprite_pixel_size,
            player_start: Vec2::new(cfg.player.start_x, cfg.player.start_y),
            total_levels,
        };

        GameConfig {
            tuning,
            levels: LevelsConfig {
                dir: resolve_dir(&cfg.levels.dir, search_dirs),
                file_pattern: cfg.levels.file_pattern,
            },
            assets: AssetsConfig {
                dir: resolve_dir(&cfg.assets.dir, search_dirs),
                manifest: cfg.assets.manifest,
            },
            tick_rate_ms: cfg.timing.tick_rate_ms.max(1),
            gamepad: GamepadConfig { begin: cfg.gamepad.begin },
            logging: LoggingConfig {
                file: PathBuf::from(cfg.logging.file),
                filter: cfg.logging.filter,
            },
            warnings,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Absolute paths are kept; relative ones resolve to the first candidate dir
/// that has them, else stay relative to CWD.
fn resolve_dir(dir: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(dir);
    if path.is_absolute() {
        return path;
    }
    search_dirs
        .iter()
        .map(|d| d.join(dir))
        .find(|p| p.is_dir())
        .unwrap_or(path)
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return parse_toml(&text, &path, warnings),
                Err(e) => warnings.push(format!("could not read {}: {e}", path.display())),
            }
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str, path: &Path, warnings: &mut Vec<String>) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warnings.push(format!("{} parse error, using default settings: {e}", path.display()));
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = GameConfig::from_toml_str("");
        assert_eq!(cfg.tuning, Tuning::default());
        assert_eq!(cfg.tick_rate_ms, 16);
        assert_eq!(cfg.levels.file_name(2), "map1_level_2.toml");
        assert!(cfg.warnings.is_empty());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[viewport]\nleft_margin = 300.0\n\n[levels]\ntotal = 5\n",
        );
        assert_eq!(cfg.tuning.left_margin, 300.0);
        assert_eq!(cfg.tuning.right_margin, 800.0);
        assert_eq!(cfg.tuning.total_levels, 5);
        assert_eq!(cfg.levels.file_pattern, "map1_level_{}.toml");
    }

    #[test]
    fn parse_error_falls_back_with_warning() {
        let cfg = GameConfig::from_toml_str("[physics\ngravity = ");
        assert_eq!(cfg.tuning, Tuning::default());
        assert_eq!(cfg.warnings.len(), 1);
    }

    #[test]
    fn zero_levels_is_clamped() {
        let cfg = GameConfig::from_toml_str("[levels]\ntotal = 0\n");
        assert_eq!(cfg.tuning.total_levels, 1);
        assert_eq!(cfg.warnings.len(), 1);
    }

    #[test]
    fn grid_pixel_size_scales_tiles() {
        let t = Tuning { tile_scaling: 2.0, ..Tuning::default() };
        assert_eq!(t.grid_pixel_size(), 64.0);
    }
}
