/// Test doubles shared by the unit tests.

use std::collections::{HashMap, HashSet};

use glam::Vec2;

use crate::domain::entity::Body;
use crate::domain::gfx::{AssetLoader, Texture, TextureId};
use crate::domain::physics::{Obstacles, PhysicsEngine};
use crate::error::{AssetError, LevelError};
use crate::sim::level::{LayerName, LevelSource, PlacedEntity, Properties, PropertyValue, TileMap};

/// Every path resolves to a texture of one fixed size, except those marked
/// missing. Ids are interned per path.
pub struct StubAssets {
    size: Vec2,
    ids: HashMap<String, TextureId>,
    missing: HashSet<String>,
}

impl StubAssets {
    pub fn new(size: Vec2) -> Self {
        StubAssets { size, ids: HashMap::new(), missing: HashSet::new() }
    }

    pub fn without(mut self, path: &str) -> Self {
        self.missing.insert(path.to_string());
        self
    }
}

impl AssetLoader for StubAssets {
    fn load_texture(&mut self, path: &str) -> Result<Texture, AssetError> {
        if self.missing.contains(path) {
            return Err(AssetError::NotFound(path.to_string()));
        }
        let next = TextureId(self.ids.len() as u32);
        let id = *self.ids.entry(path.to_string()).or_insert(next);
        Ok(Texture::new(id, self.size))
    }
}

/// Moves the body by its velocity and reports fixed contact flags.
/// No gravity, no collision.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScriptedPhysics {
    pub grounded: bool,
    pub on_ladder: bool,
}

impl PhysicsEngine for ScriptedPhysics {
    fn step(&mut self, player: &mut Body, _obstacles: &Obstacles<'_>) {
        player.advance();
    }

    fn can_jump(&self, _player: &Body, _obstacles: &Obstacles<'_>) -> bool {
        self.grounded
    }

    fn is_on_ladder(&self, _player: &Body, _obstacles: &Obstacles<'_>) -> bool {
        self.on_ladder
    }
}

/// Programmatic tile map, grid units of 32.
pub struct TileMapBuilder {
    map: TileMap,
    grid: f32,
}

impl TileMapBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        TileMapBuilder {
            map: TileMap { name: "test".into(), width, height, ..Default::default() },
            grid: 32.0,
        }
    }

    /// Tile at `(col, row_from_bottom)`.
    pub fn tile(self, layer: LayerName, col: u32, row: u32, texture: &str) -> Self {
        let center = Vec2::new((col as f32 + 0.5) * self.grid, (row as f32 + 0.5) * self.grid);
        self.entity(layer, center, texture, Properties::new())
    }

    /// A run of tiles along one row.
    pub fn row(mut self, layer: LayerName, cols: std::ops::Range<u32>, row: u32, texture: &str) -> Self {
        for col in cols {
            self = self.tile(layer, col, row, texture);
        }
        self
    }

    pub fn coin(self, center: Vec2, points: i64) -> Self {
        let props = Properties::new().with("Points", PropertyValue::Int(points));
        self.entity(LayerName::Coins, center, "items/coin.png", props)
    }

    pub fn enemy(self, mob: &str, center: Vec2, change_x: f32, left: f32, right: f32) -> Self {
        let props = Properties::new()
            .with("mob_type", PropertyValue::Text(mob.into()))
            .with("change_x", PropertyValue::Float(change_x as f64))
            .with("boundary_left", PropertyValue::Float(left as f64))
            .with("boundary_right", PropertyValue::Float(right as f64));
        let texture = format!("mob/monsters/{mob}/idle0.png");
        self.entity(LayerName::MovingEnemies, center, &texture, props)
    }

    pub fn entity(mut self, layer: LayerName, center: Vec2, texture: &str, properties: Properties) -> Self {
        self.map.layers.entry(layer).or_default().push(PlacedEntity {
            center,
            size: Vec2::splat(self.grid),
            texture: texture.to_string(),
            properties,
        });
        self
    }

    pub fn build(self) -> TileMap {
        self.map
    }
}

/// Serves prebuilt maps by level number.
pub struct StubLevels {
    pub maps: Vec<TileMap>,
}

impl LevelSource for StubLevels {
    fn load(&mut self, level: u32) -> Result<TileMap, LevelError> {
        level
            .checked_sub(1)
            .and_then(|i| self.maps.get(i as usize))
            .cloned()
            .ok_or(LevelError::NotFound { level })
    }
}
