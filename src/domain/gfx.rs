/// Rendering and asset contracts the simulation consumes.
///
/// The core only ever sees opaque texture handles and emits draw commands;
/// the terminal front-end in `ui/` is one implementation of each trait.

use glam::Vec2;

use super::camera::Viewport;
use super::entity::Facing;
use crate::error::AssetError;

/// Opaque texture handle. Equal paths always yield equal ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct TextureId(pub u32);

/// A loaded texture: handle, native size in world units, and whether it is
/// the horizontally mirrored variant.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Texture {
    pub id: TextureId,
    pub size: Vec2,
    pub flipped: bool,
}

impl Texture {
    pub fn new(id: TextureId, size: Vec2) -> Self {
        Texture { id, size, flipped: false }
    }

    pub fn flipped_horizontally(self) -> Self {
        Texture { flipped: !self.flipped, ..self }
    }
}

/// Right-facing art plus its mirror, selected by facing.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TexturePair {
    pub normal: Texture,
    pub flipped: Texture,
}

impl TexturePair {
    pub fn for_facing(&self, facing: Facing) -> Texture {
        match facing {
            Facing::Right => self.normal,
            Facing::Left => self.flipped,
        }
    }
}

/// Texture source. Failing to resolve a path is fatal for the load that asked.
pub trait AssetLoader {
    fn load_texture(&mut self, path: &str) -> Result<Texture, AssetError>;

    fn load_texture_pair(&mut self, path: &str) -> Result<TexturePair, AssetError> {
        let normal = self.load_texture(path)?;
        Ok(TexturePair { normal, flipped: normal.flipped_horizontally() })
    }
}

/// One sprite to draw this frame, in world coordinates (centre).
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct DrawCommand {
    pub texture: TextureId,
    pub position: Vec2,
    /// Drawn extent in world units (texture size × scale).
    pub size: Vec2,
    pub scale: f32,
    pub flip: bool,
}

impl DrawCommand {
    pub fn new(texture: Texture, position: Vec2, scale: f32) -> Self {
        DrawCommand {
            texture: texture.id,
            position,
            size: texture.size * scale,
            scale,
            flip: texture.flipped,
        }
    }

    /// Stretch a texture over an explicit world extent (map tiles and
    /// platforms whose size comes from the level, not the art).
    pub fn sized(texture: Texture, position: Vec2, size: Vec2) -> Self {
        let scale = if texture.size.x > 0.0 { size.x / texture.size.x } else { 1.0 };
        DrawCommand { texture: texture.id, position, size, scale, flip: texture.flipped }
    }
}

/// Output surface. Viewport changes are sticky until the next `set_viewport`.
pub trait RenderSurface {
    fn set_viewport(&mut self, viewport: Viewport);
    /// Fill the whole viewport with a texture (drawn first).
    fn draw_backdrop(&mut self, texture: TextureId);
    fn draw_sprites(&mut self, commands: &[DrawCommand]);
    /// Text anchored at its bottom-left corner, in world coordinates.
    fn draw_text(&mut self, text: &str, position: Vec2, size: f32);
    /// A full-screen static image (instructions, game over).
    fn draw_screen(&mut self, texture: TextureId);
    fn present(&mut self) -> std::io::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl AssetLoader for Fixed {
        fn load_texture(&mut self, path: &str) -> Result<Texture, AssetError> {
            if path.is_empty() {
                return Err(AssetError::NotFound(path.into()));
            }
            Ok(Texture::new(TextureId(7), Vec2::new(64.0, 32.0)))
        }
    }

    #[test]
    fn pair_selects_mirror_for_left() {
        let pair = Fixed.load_texture_pair("mob/lion/jump.png").unwrap();
        assert!(!pair.for_facing(Facing::Right).flipped);
        assert!(pair.for_facing(Facing::Left).flipped);
        assert_eq!(pair.normal.id, pair.flipped.id);
    }

    #[test]
    fn pair_propagates_missing_texture() {
        assert!(matches!(Fixed.load_texture_pair(""), Err(AssetError::NotFound(_))));
    }

    #[test]
    fn draw_command_scales_extent() {
        let tex = Texture::new(TextureId(1), Vec2::new(64.0, 32.0)).flipped_horizontally();
        let cmd = DrawCommand::new(tex, Vec2::new(10.0, 20.0), 0.5);
        assert_eq!(cmd.size, Vec2::new(32.0, 16.0));
        assert!(cmd.flip);
    }
}
