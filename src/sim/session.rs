/// LevelSession: everything that lives for exactly one level.
///
/// Built wholesale by `setup` from a tile map and dropped on level advance
/// or restart. The session owns every actor, block and coin plus the camera
/// and the physics engine; the orchestrator never reaches inside except
/// through `step` and the draw/query methods here.
///
/// ## Draw order
///   backdrop → Background → platforms → coins → Foreground → ladders
///   → hazard tiles → enemies → player → HUD

use glam::Vec2;

use crate::config::Tuning;
use crate::domain::actor::{Actor, EnemyActor, PlayerActor};
use crate::domain::animation::{EnemyTextures, PlayerTextures};
use crate::domain::camera::{Camera, Viewport};
use crate::domain::entity::{Block, Coin, CoinId, PatrolBoundary};
use crate::domain::gfx::{AssetLoader, DrawCommand, Texture};
use crate::domain::intent::{map_intent, InputState, IntentContext, IntentSpeeds, JumpLatch};
use crate::domain::physics::{Obstacles, PhysicsEngine, PlatformerPhysics};
use crate::error::{GameResult, LevelError};
use crate::sim::level::{LayerName, PlacedEntity, Properties, TileMap};

pub const PLAYER_TEXTURE_BASE: &str = "mob/lion/";
pub const BACKDROP_TEXTURE: &str = "background.png";

const HUD_OFFSET: f32 = 10.0;
const HUD_TEXT_SIZE: f32 = 30.0;

pub struct LevelSession {
    pub level: u32,
    pub name: String,
    pub(crate) score: u32,
    pub map_width: f32,
    pub map_height: f32,
    pub spawn: Vec2,

    pub player: PlayerActor,
    pub enemies: Vec<EnemyActor>,
    /// Static platforms first, then moving ones from `first_moving` on.
    pub platforms: Vec<Block>,
    pub(crate) first_moving: usize,
    pub ladders: Vec<Block>,
    pub coins: Vec<Coin>,
    /// "Don't Touch" tiles.
    pub hazards: Vec<Block>,
    pub foreground: Vec<Block>,
    pub background: Vec<Block>,
    pub backdrop: Texture,

    pub camera: Camera,
    pub(crate) physics: Box<dyn PhysicsEngine>,
    pub tuning: Tuning,
}

impl LevelSession {
    /// Build a session for `level` from its map. Any missing texture or bad
    /// property aborts the whole build.
    pub fn setup(
        level: u32,
        map: &TileMap,
        assets: &mut dyn AssetLoader,
        tuning: &Tuning,
    ) -> GameResult<LevelSession> {
        let grid = tuning.grid_pixel_size();
        let layer = |name| LayerBuilder { level, name, map };

        let player_textures = PlayerTextures::load(assets, PLAYER_TEXTURE_BASE)?;
        let player = PlayerActor::new(tuning.player_start, player_textures, tuning.character_scaling);
        let backdrop = assets.load_texture(BACKDROP_TEXTURE)?;

        let mut platforms = layer(LayerName::Platforms).blocks(assets, false)?;
        let first_moving = platforms.len();
        platforms.extend(layer(LayerName::MovingPlatforms).blocks(assets, true)?);

        let session = LevelSession {
            level,
            name: map.name.clone(),
            score: 0,
            map_width: map.width as f32 * grid,
            map_height: map.height as f32 * grid,
            spawn: tuning.player_start,
            player,
            enemies: layer(LayerName::MovingEnemies).enemies(assets)?,
            platforms,
            first_moving,
            ladders: layer(LayerName::Ladders).blocks(assets, false)?,
            coins: layer(LayerName::Coins).coins(assets)?,
            hazards: layer(LayerName::DontTouch).blocks(assets, false)?,
            foreground: layer(LayerName::Foreground).blocks(assets, false)?,
            background: layer(LayerName::Background).blocks(assets, false)?,
            backdrop,
            camera: Camera::new(),
            physics: Box::new(PlatformerPhysics::new(tuning.gravity)),
            tuning: tuning.clone(),
        };

        tracing::info!(
            level,
            name = %session.name,
            platforms = session.platforms.len(),
            enemies = session.enemies.len(),
            coins = session.coins.len(),
            "Level session ready"
        );
        Ok(session)
    }

    /// Swap the physics engine for a scripted one.
    #[cfg(test)]
    pub fn with_physics(mut self, physics: Box<dyn PhysicsEngine>) -> Self {
        self.physics = physics;
        self
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn viewport(&self) -> Viewport {
        self.camera.viewport(&self.tuning)
    }

    fn obstacles(&self) -> Obstacles<'_> {
        Obstacles { platforms: &self.platforms, ladders: &self.ladders }
    }

    #[cfg(test)]
    pub fn moving_platforms(&self) -> &[Block] {
        &self.platforms[self.first_moving..]
    }

    /// Recompute the player's velocity from held keys and what physics
    /// reports right now. Called on every key event and once per tick.
    pub fn apply_intent(&mut self, input: &InputState, latch: &mut JumpLatch) {
        let obstacles = self.obstacles();
        let ctx = IntentContext {
            on_ladder: self.physics.is_on_ladder(&self.player.body, &obstacles),
            can_jump: self.physics.can_jump(&self.player.body, &obstacles),
            player_left: self.player.body.left(),
            dead: self.player.is_dead(),
        };
        let speeds = IntentSpeeds {
            movement: self.tuning.player_movement_speed,
            jump: self.tuning.player_jump_speed,
        };
        let intent = map_intent(input, &ctx, latch, speeds);
        self.player.body.velocity.x = intent.vx;
        if let Some(vy) = intent.vy {
            self.player.body.velocity.y = vy;
        }
    }

    // ── Drawing ──

    pub fn draw_commands(&self) -> Vec<DrawCommand> {
        let blocks = |list: &[Block]| -> Vec<DrawCommand> {
            list.iter()
                .map(|b| DrawCommand::sized(b.texture, b.body.position, b.body.size))
                .collect()
        };

        let mut out = Vec::with_capacity(
            self.background.len() + self.platforms.len() + self.coins.len()
                + self.foreground.len() + self.ladders.len() + self.hazards.len()
                + self.enemies.len() + 1,
        );
        out.extend(blocks(&self.background));
        out.extend(blocks(&self.platforms));
        out.extend(self.coins.iter().map(|c| DrawCommand::sized(c.texture, c.body.position, c.body.size)));
        out.extend(blocks(&self.foreground));
        out.extend(blocks(&self.ladders));
        out.extend(blocks(&self.hazards));
        out.extend(self.enemies.iter().map(|e| e.sprite()));
        out.push(self.player.sprite());
        out
    }

    /// HUD text, its bottom-left anchor in world units, and its size.
    pub fn hud(&self) -> (String, Vec2, f32) {
        let view = self.viewport();
        let anchor = Vec2::new(
            HUD_OFFSET + view.left as f32,
            HUD_OFFSET + view.bottom as f32,
        );
        (format!("Score: {}", self.score), anchor, HUD_TEXT_SIZE)
    }
}

// ══════════════════════════════════════════════════════════════
// Map → entities
// ══════════════════════════════════════════════════════════════

struct LayerBuilder<'a> {
    level: u32,
    name: LayerName,
    map: &'a TileMap,
}

impl<'a> LayerBuilder<'a> {
    fn entities(&self) -> &'a [PlacedEntity] {
        self.map.layer(self.name)
    }

    fn invalid(&self, property: &'static str) -> impl Fn(String) -> LevelError + '_ {
        move |reason| LevelError::InvalidProperty {
            level: self.level,
            layer: self.name.as_str(),
            property,
            reason,
        }
    }

    fn missing(&self, property: &'static str) -> LevelError {
        LevelError::MissingProperty { level: self.level, layer: self.name.as_str(), property }
    }

    fn number(&self, props: &Properties, key: &'static str) -> Result<Option<f32>, LevelError> {
        props.number(key).map_err(self.invalid(key))
    }

    fn velocity(&self, props: &Properties) -> Result<Vec2, LevelError> {
        Ok(Vec2::new(
            self.number(props, "change_x")?.unwrap_or(0.0),
            self.number(props, "change_y")?.unwrap_or(0.0),
        ))
    }

    fn boundary(&self, props: &Properties) -> Result<Option<PatrolBoundary>, LevelError> {
        let boundary = PatrolBoundary {
            left: self.number(props, "boundary_left")?,
            right: self.number(props, "boundary_right")?,
            top: self.number(props, "boundary_top")?,
            bottom: self.number(props, "boundary_bottom")?,
        };
        Ok((!boundary.is_empty()).then_some(boundary))
    }

    fn blocks(&self, assets: &mut dyn AssetLoader, moving: bool) -> GameResult<Vec<Block>> {
        let mut out = Vec::with_capacity(self.entities().len());
        for e in self.entities() {
            let texture = assets.load_texture(&e.texture)?;
            let mut block = Block::new(e.center, e.size, texture);
            if moving {
                block.body.velocity = self.velocity(&e.properties)?;
                block.boundary = self.boundary(&e.properties)?;
            }
            out.push(block);
        }
        Ok(out)
    }

    fn coins(&self, assets: &mut dyn AssetLoader) -> GameResult<Vec<Coin>> {
        let mut out = Vec::with_capacity(self.entities().len());
        for (i, e) in self.entities().iter().enumerate() {
            let points = e.properties
                .integer("Points")
                .map_err(self.invalid("Points"))?
                .ok_or_else(|| self.missing("Points"))?;
            let points = u32::try_from(points)
                .map_err(|_| self.invalid("Points")(format!("{points} is not a non-negative count")))?;
            let texture = assets.load_texture(&e.texture)?;
            let block = Block::new(e.center, e.size, texture);
            out.push(Coin { id: CoinId(i as u32), body: block.body, texture, points });
        }
        Ok(out)
    }

    fn enemies(&self, assets: &mut dyn AssetLoader) -> GameResult<Vec<EnemyActor>> {
        let mut out = Vec::with_capacity(self.entities().len());
        for e in self.entities() {
            let mob_type = e.properties
                .text("mob_type")
                .map_err(self.invalid("mob_type"))?
                .ok_or_else(|| self.missing("mob_type"))?;
            let textures = EnemyTextures::load(assets, &format!("mob/monsters/{mob_type}/"))?;
            out.push(EnemyActor::new(
                mob_type,
                e.center,
                self.velocity(&e.properties)?,
                self.boundary(&e.properties)?,
                textures,
            ));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AssetError, GameError};
    use crate::sim::level::PropertyValue;
    use crate::testing::{StubAssets, TileMapBuilder};
    use pretty_assertions::assert_eq;

    fn assets() -> StubAssets {
        StubAssets::new(Vec2::splat(32.0))
    }

    fn sample_map() -> TileMap {
        TileMapBuilder::new(50, 20)
            .row(LayerName::Platforms, 0..50, 0, "tiles/grass.png")
            .row(LayerName::DontTouch, 10..12, 1, "tiles/water.png")
            .tile(LayerName::Ladders, 5, 1, "tiles/ladder.png")
            .coin(Vec2::new(300.0, 48.0), 1)
            .coin(Vec2::new(400.0, 48.0), 5)
            .enemy("slime", Vec2::new(600.0, 48.0), 2.0, 500.0, 800.0)
            .entity(
                LayerName::MovingPlatforms,
                Vec2::new(900.0, 200.0),
                "tiles/crate.png",
                Properties::new()
                    .with("change_x", PropertyValue::Int(2))
                    .with("boundary_left", PropertyValue::Float(850.0))
                    .with("boundary_right", PropertyValue::Float(1000.0)),
            )
            .build()
    }

    #[test]
    fn setup_populates_every_layer() {
        let session = LevelSession::setup(1, &sample_map(), &mut assets(), &Tuning::default()).unwrap();
        assert_eq!(session.platforms.len(), 51);
        assert_eq!(session.moving_platforms().len(), 1);
        assert_eq!(session.moving_platforms()[0].body.velocity, Vec2::new(2.0, 0.0));
        assert_eq!(session.hazards.len(), 2);
        assert_eq!(session.ladders.len(), 1);
        assert_eq!(session.coins.iter().map(|c| c.points).collect::<Vec<_>>(), vec![1, 5]);
        assert_eq!(session.enemies[0].mob_type, "slime");
        assert_eq!(session.enemies[0].boundary.unwrap().right, Some(800.0));
        assert_eq!((session.map_width, session.map_height), (1600.0, 640.0));
        assert_eq!(session.player.position(), Vec2::new(200.0, 500.0));
        assert_eq!(session.score(), 0);
        assert_eq!(session.camera, Camera::default());
    }

    #[test]
    fn missing_points_names_layer() {
        let map = TileMapBuilder::new(10, 10)
            .entity(LayerName::Coins, Vec2::new(16.0, 16.0), "items/coin.png", Properties::new())
            .build();
        let err = LevelSession::setup(2, &map, &mut assets(), &Tuning::default()).err().unwrap();
        assert_eq!(err.to_string(), "Level error: Level 2: Coins entity is missing property 'Points'");
    }

    #[test]
    fn negative_points_rejected() {
        let map = TileMapBuilder::new(10, 10).coin(Vec2::new(16.0, 16.0), -3).build();
        let err = LevelSession::setup(1, &map, &mut assets(), &Tuning::default()).err().unwrap();
        assert!(matches!(
            err,
            GameError::Level(LevelError::InvalidProperty { property: "Points", .. })
        ));
    }

    #[test]
    fn enemy_without_mob_type_rejected() {
        let map = TileMapBuilder::new(10, 10)
            .entity(LayerName::MovingEnemies, Vec2::ZERO, "mob/monsters/x/idle0.png", Properties::new())
            .build();
        let err = LevelSession::setup(1, &map, &mut assets(), &Tuning::default()).err().unwrap();
        assert!(matches!(
            err,
            GameError::Level(LevelError::MissingProperty { layer: "Moving Enemies", property: "mob_type", .. })
        ));
    }

    #[test]
    fn missing_texture_aborts_setup() {
        let mut assets = assets().without("mob/lion/jump.png");
        let err = LevelSession::setup(1, &sample_map(), &mut assets, &Tuning::default()).err().unwrap();
        assert!(matches!(err, GameError::Asset(AssetError::NotFound(ref p)) if p == "mob/lion/jump.png"));
    }

    #[test]
    fn draw_order_ends_with_enemies_then_player() {
        let session = LevelSession::setup(1, &sample_map(), &mut assets(), &Tuning::default()).unwrap();
        let cmds = session.draw_commands();
        let n = cmds.len();
        assert_eq!(n, 51 + 2 + 2 + 1 + 1 + 1);
        assert_eq!(cmds[n - 1].position, session.player.position());
        assert_eq!(cmds[n - 2].position, session.enemies[0].position());
    }

    #[test]
    fn hud_follows_viewport() {
        let mut session = LevelSession::setup(1, &sample_map(), &mut assets(), &Tuning::default()).unwrap();
        session.camera.view_left = 120.7;
        session.score = 6;
        let (text, anchor, size) = session.hud();
        assert_eq!(text, "Score: 6");
        assert_eq!(anchor, Vec2::new(130.0, 10.0));
        assert_eq!(size, 30.0);
    }
}
