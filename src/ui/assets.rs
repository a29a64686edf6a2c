/// Glyph atlas: the terminal's texture loader.
///
/// A TOML manifest maps texture paths to a glyph, colours and a world-unit
/// size. Each distinct path gets the next id the first time it is loaded, so
/// loading the same level twice yields the same ids. The atlas is a cheap
/// shared handle: the game loads through one clone, the renderer looks
/// glyphs up through another.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::rc::Rc;

use crossterm::style::Color;
use glam::Vec2;
use serde::Deserialize;

use crate::config::AssetsConfig;
use crate::domain::gfx::{AssetLoader, Texture, TextureId};
use crate::error::AssetError;

const EMBEDDED_MANIFEST: &str = include_str!("../../assets/glyphs.toml");

/// Resolved look of one texture.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphSprite {
    pub glyph: char,
    pub fg: Color,
    /// `None` keeps whatever background is already under the sprite.
    pub bg: Option<Color>,
    pub size: Vec2,
    /// Multi-line art for full-screen textures.
    pub art: Rc<Vec<String>>,
}

#[derive(Debug, Default)]
struct AtlasInner {
    exact: HashMap<String, GlyphSprite>,
    /// Prefix patterns, longest first.
    prefixes: Vec<(String, GlyphSprite)>,
    ids: HashMap<String, TextureId>,
    sprites: Vec<GlyphSprite>,
}

#[derive(Clone, Debug, Default)]
pub struct GlyphAtlas {
    inner: Rc<RefCell<AtlasInner>>,
}

// ── Manifest schema ──

#[derive(Deserialize, Debug)]
struct Manifest {
    #[serde(default)]
    textures: BTreeMap<String, ManifestEntry>,
}

#[derive(Deserialize, Debug)]
struct ManifestEntry {
    glyph: String,
    #[serde(default = "default_fg")]
    fg: String,
    bg: Option<String>,
    width: f32,
    height: f32,
    #[serde(default)]
    art: String,
}

fn default_fg() -> String { "white".into() }

impl GlyphAtlas {
    /// Manifest from `{assets.dir}/{assets.manifest}`, or the built-in one
    /// when that file does not exist.
    pub fn load(assets: &AssetsConfig) -> Result<Self, AssetError> {
        let path = assets.manifest_path();
        if path.is_file() {
            let text = std::fs::read_to_string(&path)
                .map_err(|source| AssetError::Io { path: path.clone(), source })?;
            tracing::info!(path = %path.display(), "Loaded glyph manifest");
            return Self::from_toml_str(&text, &path);
        }
        tracing::info!("Using built-in glyph manifest");
        Self::from_toml_str(EMBEDDED_MANIFEST, Path::new("<built-in>"))
    }

    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, AssetError> {
        let manifest: Manifest = toml::from_str(text)
            .map_err(|e| AssetError::Manifest(format!("{}: {e}", origin.display())))?;

        let mut inner = AtlasInner::default();
        for (key, entry) in manifest.textures {
            let sprite = entry_to_sprite(&key, entry)?;
            match key.strip_suffix('*') {
                Some(prefix) => inner.prefixes.push((prefix.to_string(), sprite)),
                None => {
                    inner.exact.insert(key, sprite);
                }
            }
        }
        inner.prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Ok(GlyphAtlas { inner: Rc::new(RefCell::new(inner)) })
    }

    /// Look up a loaded texture by id.
    pub fn sprite(&self, id: TextureId) -> Option<GlyphSprite> {
        self.inner.borrow().sprites.get(id.0 as usize).cloned()
    }

    pub fn loaded_count(&self) -> usize {
        self.inner.borrow().sprites.len()
    }
}

impl AtlasInner {
    fn resolve(&self, path: &str) -> Option<&GlyphSprite> {
        self.exact.get(path).or_else(|| {
            self.prefixes
                .iter()
                .find(|(prefix, _)| path.starts_with(prefix.as_str()))
                .map(|(_, sprite)| sprite)
        })
    }
}

impl AssetLoader for GlyphAtlas {
    fn load_texture(&mut self, path: &str) -> Result<Texture, AssetError> {
        let mut inner = self.inner.borrow_mut();
        if let Some(&id) = inner.ids.get(path) {
            let size = inner.sprites[id.0 as usize].size;
            return Ok(Texture::new(id, size));
        }

        let sprite = inner
            .resolve(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))?;
        let id = TextureId(inner.sprites.len() as u32);
        let size = sprite.size;
        inner.sprites.push(sprite);
        inner.ids.insert(path.to_string(), id);
        Ok(Texture::new(id, size))
    }
}

fn entry_to_sprite(key: &str, entry: ManifestEntry) -> Result<GlyphSprite, AssetError> {
    let mut chars = entry.glyph.chars();
    let glyph = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => return Err(AssetError::Manifest(format!("'{key}': glyph must be one character"))),
    };
    let fg = parse_color(&entry.fg)
        .ok_or_else(|| AssetError::Manifest(format!("'{key}': unknown colour '{}'", entry.fg)))?;
    let bg = match entry.bg {
        Some(name) => Some(
            parse_color(&name)
                .ok_or_else(|| AssetError::Manifest(format!("'{key}': unknown colour '{name}'")))?,
        ),
        None => None,
    };
    if !(entry.width > 0.0 && entry.height > 0.0) {
        return Err(AssetError::Manifest(format!("'{key}': size must be positive")));
    }
    let art = entry
        .art
        .lines()
        .map(str::to_string)
        .collect::<Vec<_>>();

    Ok(GlyphSprite {
        glyph,
        fg,
        bg,
        size: Vec2::new(entry.width, entry.height),
        art: Rc::new(art),
    })
}

pub fn parse_color(name: &str) -> Option<Color> {
    if let Some(hex) = name.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some(Color::Rgb { r: channel(0)?, g: channel(2)?, b: channel(4)? });
    }
    let color = match name.to_ascii_lowercase().as_str() {
        "black" => Color::Black,
        "dark_grey" | "dark_gray" => Color::DarkGrey,
        "red" => Color::Red,
        "dark_red" => Color::DarkRed,
        "green" => Color::Green,
        "dark_green" => Color::DarkGreen,
        "yellow" => Color::Yellow,
        "dark_yellow" => Color::DarkYellow,
        "blue" => Color::Blue,
        "dark_blue" => Color::DarkBlue,
        "magenta" => Color::Magenta,
        "dark_magenta" => Color::DarkMagenta,
        "cyan" => Color::Cyan,
        "dark_cyan" => Color::DarkCyan,
        "white" => Color::White,
        "grey" | "gray" => Color::Grey,
        _ => return None,
    };
    Some(color)
}

/// Mirror a direction-bearing glyph for a horizontally flipped texture.
pub fn mirror_glyph(c: char) -> char {
    match c {
        '<' => '>',
        '>' => '<',
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '{' => '}',
        '}' => '{',
        '/' => '\\',
        '\\' => '/',
        'b' => 'd',
        'd' => 'b',
        'p' => 'q',
        'q' => 'p',
        other => other,
    }
}
