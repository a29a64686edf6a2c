/// Tile-map loader.
///
/// ## Sources (priority order):
///   1. `{levels.dir}/{levels.file_pattern}` on disk
///   2. Built-in embedded levels (the default three)
///
/// ## Level format (TOML):
///   ```toml
///   name = "Savanna"
///   rows = [                 # top row first, all rows the same width
///     "......",
///     "##==##",
///   ]
///   [tiles."#"]              # legend: one char → layer, texture, properties
///   layer = "Platforms"
///   texture = "tiles/grass.png"
///
///   [[objects]]              # free-placed entities, centre in world units
///   layer = "Moving Enemies"
///   x = 900.0
///   y = 112.0
///   texture = "mob/monsters/slime/idle0.png"
///   [objects.properties]
///   mob_type = "slime"
///   boundary_left = 700.0
///   boundary_right = 1100.0
///   change_x = 2.0
///   ```
///
/// `.` and ` ` are empty cells and need no legend entry. Tile `(col, row)`
/// is centred at `(col + ½, height − row − ½) × grid`, so row 0 is the top
/// of the map and y grows upward.

use std::collections::BTreeMap;
use std::path::PathBuf;

use glam::Vec2;
use serde::Deserialize;

use crate::config::{LevelsConfig, Tuning};
use crate::error::LevelError;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum LayerName {
    Platforms,
    MovingPlatforms,
    Coins,
    Foreground,
    Background,
    DontTouch,
    MovingEnemies,
    Ladders,
}

impl LayerName {
    pub const ALL: [LayerName; 8] = [
        LayerName::Platforms,
        LayerName::MovingPlatforms,
        LayerName::Coins,
        LayerName::Foreground,
        LayerName::Background,
        LayerName::DontTouch,
        LayerName::MovingEnemies,
        LayerName::Ladders,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayerName::Platforms => "Platforms",
            LayerName::MovingPlatforms => "Moving Platforms",
            LayerName::Coins => "Coins",
            LayerName::Foreground => "Foreground",
            LayerName::Background => "Background",
            LayerName::DontTouch => "Don't Touch",
            LayerName::MovingEnemies => "Moving Enemies",
            LayerName::Ladders => "Ladders",
        }
    }

    pub fn from_name(name: &str) -> Option<LayerName> {
        LayerName::ALL.into_iter().find(|l| l.as_str() == name)
    }
}

// ── Properties ──

#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl PropertyValue {
    fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Int(_) => "an integer",
            PropertyValue::Float(_) => "a float",
            PropertyValue::Bool(_) => "a boolean",
            PropertyValue::Text(_) => "a string",
        }
    }
}

/// Key/value properties attached to a placed entity. Accessors return
/// `Ok(None)` when the key is absent and `Err(reason)` on a type mismatch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Properties(BTreeMap<String, PropertyValue>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: PropertyValue) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    /// Integers are accepted where a number is expected.
    pub fn number(&self, key: &str) -> Result<Option<f32>, String> {
        match self.get(key) {
            None => Ok(None),
            Some(PropertyValue::Int(i)) => Ok(Some(*i as f32)),
            Some(PropertyValue::Float(f)) => Ok(Some(*f as f32)),
            Some(other) => Err(format!("expected a number, found {}", other.kind())),
        }
    }

    pub fn integer(&self, key: &str) -> Result<Option<i64>, String> {
        match self.get(key) {
            None => Ok(None),
            Some(PropertyValue::Int(i)) => Ok(Some(*i)),
            Some(PropertyValue::Float(f)) if f.fract() == 0.0 => Ok(Some(*f as i64)),
            Some(other) => Err(format!("expected an integer, found {}", other.kind())),
        }
    }

    pub fn text(&self, key: &str) -> Result<Option<&str>, String> {
        match self.get(key) {
            None => Ok(None),
            Some(PropertyValue::Text(s)) => Ok(Some(s)),
            Some(other) => Err(format!("expected a string, found {}", other.kind())),
        }
    }

    fn from_table(table: toml::Table) -> Result<Self, String> {
        let mut props = BTreeMap::new();
        for (key, value) in table {
            let value = match value {
                toml::Value::Integer(i) => PropertyValue::Int(i),
                toml::Value::Float(f) => PropertyValue::Float(f),
                toml::Value::Boolean(b) => PropertyValue::Bool(b),
                toml::Value::String(s) => PropertyValue::Text(s),
                other => {
                    return Err(format!("property '{key}' has unsupported type {}", other.type_str()));
                }
            };
            props.insert(key, value);
        }
        Ok(Properties(props))
    }
}

// ── Map model ──

/// One entity from a map layer, in world units.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedEntity {
    pub center: Vec2,
    pub size: Vec2,
    pub texture: String,
    pub properties: Properties,
}

#[derive(Clone, Debug, Default)]
pub struct TileMap {
    pub name: String,
    /// In tiles.
    pub width: u32,
    pub height: u32,
    pub layers: BTreeMap<LayerName, Vec<PlacedEntity>>,
}

impl TileMap {
    /// Entities of a layer; an absent layer is empty.
    pub fn layer(&self, name: LayerName) -> &[PlacedEntity] {
        self.layers.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn entity_count(&self) -> usize {
        self.layers.values().map(Vec::len).sum()
    }
}

pub trait LevelSource {
    fn load(&mut self, level: u32) -> Result<TileMap, LevelError>;
}

// ══════════════════════════════════════════════════════════════
// Directory source with embedded fallback
// ══════════════════════════════════════════════════════════════

const EMBEDDED_LEVELS: [&str; 3] = [
    include_str!("../../maps/map1_level_1.toml"),
    include_str!("../../maps/map1_level_2.toml"),
    include_str!("../../maps/map1_level_3.toml"),
];

pub struct LevelDirectory {
    levels: LevelsConfig,
    grid: f32,
}

impl LevelDirectory {
    pub fn new(levels: &LevelsConfig, tuning: &Tuning) -> Self {
        LevelDirectory { levels: levels.clone(), grid: tuning.grid_pixel_size() }
    }

    fn path_for(&self, level: u32) -> PathBuf {
        self.levels.dir.join(self.levels.file_name(level))
    }
}

impl LevelSource for LevelDirectory {
    fn load(&mut self, level: u32) -> Result<TileMap, LevelError> {
        let path = self.path_for(level);
        if path.is_file() {
            let text = std::fs::read_to_string(&path)
                .map_err(|source| LevelError::Io { path: path.clone(), source })?;
            tracing::debug!(level, path = %path.display(), "Loading level from disk");
            return parse_level(&text, level, self.grid);
        }

        let text = level
            .checked_sub(1)
            .and_then(|i| EMBEDDED_LEVELS.get(i as usize))
            .ok_or(LevelError::NotFound { level })?;
        tracing::debug!(level, "Loading embedded level");
        parse_level(text, level, self.grid)
    }
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
struct TomlLevel {
    #[serde(default)]
    name: String,
    rows: Vec<String>,
    #[serde(default)]
    tiles: BTreeMap<String, TomlTile>,
    #[serde(default)]
    objects: Vec<TomlObject>,
}

#[derive(Deserialize, Debug)]
struct TomlTile {
    layer: String,
    texture: String,
    #[serde(default)]
    properties: toml::Table,
}

#[derive(Deserialize, Debug)]
struct TomlObject {
    layer: String,
    x: f32,
    y: f32,
    width: Option<f32>,
    height: Option<f32>,
    texture: String,
    #[serde(default)]
    properties: toml::Table,
}

struct LegendEntry {
    layer: LayerName,
    texture: String,
    properties: Properties,
}

fn is_empty_cell(c: char) -> bool {
    c == '.' || c == ' '
}

/// Parse level text. `grid` is the world size of one tile.
pub fn parse_level(text: &str, level: u32, grid: f32) -> Result<TileMap, LevelError> {
    let parsed: TomlLevel = toml::from_str(text)
        .map_err(|e| LevelError::Parse { level, message: e.to_string() })?;

    let layer_of = |name: &str| {
        LayerName::from_name(name)
            .ok_or_else(|| LevelError::UnknownLayer { level, layer: name.to_string() })
    };
    let props_of = |table: toml::Table| {
        Properties::from_table(table).map_err(|message| LevelError::Parse { level, message })
    };

    let mut legend: BTreeMap<char, LegendEntry> = BTreeMap::new();
    for (key, tile) in parsed.tiles {
        let mut chars = key.chars();
        let c = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(LevelError::Parse {
                    level,
                    message: format!("tile key '{key}' must be a single character"),
                });
            }
        };
        legend.insert(c, LegendEntry {
            layer: layer_of(&tile.layer)?,
            texture: tile.texture,
            properties: props_of(tile.properties)?,
        });
    }

    let height = parsed.rows.len();
    let width = parsed.rows.first().map(|r| r.chars().count()).unwrap_or(0);
    if height == 0 || width == 0 {
        return Err(LevelError::Parse { level, message: "map has no rows".into() });
    }

    let mut layers: BTreeMap<LayerName, Vec<PlacedEntity>> = BTreeMap::new();
    let tile_size = Vec2::splat(grid);

    for (row, line) in parsed.rows.iter().enumerate() {
        let found = line.chars().count();
        if found != width {
            return Err(LevelError::BadGrid { level, row, expected: width, found });
        }
        for (col, c) in line.chars().enumerate() {
            if is_empty_cell(c) {
                continue;
            }
            let entry = legend.get(&c).ok_or(LevelError::UnknownTile { level, tile: c })?;
            let center = Vec2::new(
                (col as f32 + 0.5) * grid,
                ((height - row) as f32 - 0.5) * grid,
            );
            layers.entry(entry.layer).or_default().push(PlacedEntity {
                center,
                size: tile_size,
                texture: entry.texture.clone(),
                properties: entry.properties.clone(),
            });
        }
    }

    for obj in parsed.objects {
        let layer = layer_of(&obj.layer)?;
        layers.entry(layer).or_default().push(PlacedEntity {
            center: Vec2::new(obj.x, obj.y),
            size: Vec2::new(obj.width.unwrap_or(grid), obj.height.unwrap_or(grid)),
            texture: obj.texture,
            properties: props_of(obj.properties)?,
        });
    }

    let map = TileMap {
        name: parsed.name,
        width: width as u32,
        height: height as u32,
        layers,
    };
    tracing::debug!(level, name = %map.name, entities = map.entity_count(), "Level parsed");
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SMALL: &str = r###"
name = "Test"
rows = [
  "..c",
  "##H",
]

[tiles."#"]
layer = "Platforms"
texture = "tiles/grass.png"

[tiles."H"]
layer = "Ladders"
texture = "tiles/ladder.png"

[tiles."c"]
layer = "Coins"
texture = "items/coin.png"
properties = { Points = 5 }

[[objects]]
layer = "Moving Enemies"
x = 40.0
y = 48.0
texture = "mob/monsters/slime/idle0.png"
[objects.properties]
mob_type = "slime"
change_x = 2
"###;

    #[test]
    fn parses_grid_and_objects() {
        let map = parse_level(SMALL, 1, 32.0).unwrap();
        assert_eq!((map.name.as_str(), map.width, map.height), ("Test", 3, 2));
        assert_eq!(map.layer(LayerName::Platforms).len(), 2);
        assert_eq!(map.layer(LayerName::Background).len(), 0);

        let coin = &map.layer(LayerName::Coins)[0];
        assert_eq!(coin.center, Vec2::new(80.0, 48.0));
        assert_eq!(coin.properties.integer("Points"), Ok(Some(5)));

        let ladder = &map.layer(LayerName::Ladders)[0];
        assert_eq!(ladder.center, Vec2::new(80.0, 16.0));

        let enemy = &map.layer(LayerName::MovingEnemies)[0];
        assert_eq!(enemy.size, Vec2::splat(32.0));
        assert_eq!(enemy.properties.text("mob_type"), Ok(Some("slime")));
        assert_eq!(enemy.properties.number("change_x"), Ok(Some(2.0)));
        assert_eq!(map.entity_count(), 5);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let text = "rows = [\"...\", \"..\"]\n";
        let err = parse_level(text, 2, 32.0).unwrap_err();
        assert!(matches!(err, LevelError::BadGrid { level: 2, row: 1, expected: 3, found: 2 }));
    }

    #[test]
    fn unknown_layer_and_tile() {
        let text = "rows = [\"x\"]\n[tiles.\"x\"]\nlayer = \"Lava\"\ntexture = \"a.png\"\n";
        assert!(matches!(parse_level(text, 1, 32.0), Err(LevelError::UnknownLayer { .. })));

        let text = "rows = [\"q\"]\n";
        assert!(matches!(parse_level(text, 1, 32.0), Err(LevelError::UnknownTile { tile: 'q', .. })));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = parse_level("rows = [", 3, 32.0).unwrap_err();
        assert!(err.to_string().starts_with("Level 3: parse failed"));
    }

    #[test]
    fn property_type_mismatch_reports_reason() {
        let props = Properties::new().with("Points", PropertyValue::Text("ten".into()));
        assert_eq!(props.integer("Points"), Err("expected an integer, found a string".into()));
        assert_eq!(props.number("missing"), Ok(None));
    }

    #[test]
    fn embedded_levels_all_parse() {
        for (i, text) in EMBEDDED_LEVELS.iter().enumerate() {
            let map = parse_level(text, i as u32 + 1, 32.0).unwrap();
            assert!(!map.layer(LayerName::Platforms).is_empty());
            assert!(!map.layer(LayerName::Coins).is_empty());
        }
    }

    #[test]
    fn directory_falls_back_to_embedded() {
        let levels = LevelsConfig {
            dir: PathBuf::from("/nonexistent/lionrun-maps"),
            file_pattern: "map1_level_{}.toml".into(),
        };
        let mut source = LevelDirectory::new(&levels, &Tuning::default());
        assert!(source.load(1).is_ok());
        assert!(matches!(source.load(4), Err(LevelError::NotFound { level: 4 })));
        assert!(matches!(source.load(0), Err(LevelError::NotFound { level: 0 })));
    }
}
