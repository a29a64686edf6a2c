/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Draw calls compose the next frame into the `front` buffer (array of Cell)
///   2. `present` compares each cell with the `back` buffer (previous frame)
///   3. Only cells that changed emit terminal commands
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// World units map onto the terminal grid by `viewport / terminal` size, so
/// one cell covers `viewport.width / cols` by `viewport.height / rows`
/// world units. Row 0 is the top of the screen; world y grows upward.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use glam::Vec2;

use crate::domain::camera::Viewport;
use crate::domain::entity::Rect;
use crate::domain::gfx::{DrawCommand, RenderSurface, TextureId};
use super::assets::{mirror_glyph, GlyphAtlas, GlyphSprite};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// gap colour between rows matches the cells after a Clear.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y), keeping whatever background is underneath.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (cx, ch) in (x..self.width).zip(s.chars()) {
            let bg = self.get(cx, y).bg;
            self.set(cx, y, Cell { ch, fg, bg });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Canvas: world → cell composition (no terminal I/O)
// ══════════════════════════════════════════════════════════════

struct Canvas {
    buf: FrameBuffer,
    viewport: Viewport,
    atlas: GlyphAtlas,
}

/// Half-open cell ranges covered by a world rectangle, already clipped.
struct CellSpan {
    cols: std::ops::Range<usize>,
    rows: std::ops::Range<usize>,
}

impl Canvas {
    fn new(width: usize, height: usize, atlas: GlyphAtlas) -> Self {
        Canvas {
            buf: FrameBuffer::new(width, height),
            viewport: Viewport { left: 0, bottom: 0, width: 1, height: 1 },
            atlas,
        }
    }

    /// World units per cell along x and y.
    fn cell_size(&self) -> Vec2 {
        let cols = self.buf.width.max(1) as f32;
        let rows = self.buf.height.max(1) as f32;
        Vec2::new(
            self.viewport.width.max(1) as f32 / cols,
            self.viewport.height.max(1) as f32 / rows,
        )
    }

    /// Fractional (col, row) of a world point; may be off-screen.
    fn to_grid(&self, point: Vec2) -> Vec2 {
        let cell = self.cell_size();
        Vec2::new(
            (point.x - self.viewport.left as f32) / cell.x,
            (self.viewport.top() as f32 - point.y) / cell.y,
        )
    }

    fn span(&self, rect: &Rect) -> Option<CellSpan> {
        let top_left = self.to_grid(Vec2::new(rect.left, rect.top));
        let bottom_right = self.to_grid(Vec2::new(rect.right, rect.bottom));
        let clip = |lo: f32, hi: f32, max: usize| {
            let lo = lo.floor();
            // Anything narrower than a cell still covers the cell it starts in.
            let hi = hi.ceil().max(lo + 1.0).min(max as f32);
            let lo = lo.max(0.0);
            (lo < hi).then(|| lo as usize..hi as usize)
        };
        Some(CellSpan {
            cols: clip(top_left.x, bottom_right.x, self.buf.width)?,
            rows: clip(top_left.y, bottom_right.y, self.buf.height)?,
        })
    }

    fn fill(&mut self, span: CellSpan, sprite: &GlyphSprite, glyph: char) {
        for row in span.rows {
            for col in span.cols.clone() {
                let bg = sprite.bg.unwrap_or_else(|| self.buf.get(col, row).bg);
                self.buf.set(col, row, Cell { ch: glyph, fg: sprite.fg, bg });
            }
        }
    }

    fn backdrop(&mut self, texture: TextureId) {
        let Some(sprite) = self.atlas.sprite(texture) else { return };
        let bg = sprite.bg.unwrap_or(Cell::BASE_BG);
        self.buf.cells.fill(Cell { ch: sprite.glyph, fg: sprite.fg, bg });
    }

    fn sprite(&mut self, cmd: &DrawCommand) {
        let Some(sprite) = self.atlas.sprite(cmd.texture) else {
            tracing::trace!(texture = cmd.texture.0, "Draw of unloaded texture skipped");
            return;
        };
        let rect = Rect::from_center(cmd.position, cmd.size);
        let Some(span) = self.span(&rect) else { return };
        let glyph = if cmd.flip { mirror_glyph(sprite.glyph) } else { sprite.glyph };
        self.fill(span, &sprite, glyph);
    }

    /// `position` is the bottom-left corner of the text; the text sits on
    /// the row just above it.
    fn text(&mut self, text: &str, position: Vec2) {
        if self.buf.height == 0 {
            return;
        }
        let at = self.to_grid(position);
        let col = at.x.floor().max(0.0) as usize;
        let row = (at.y.ceil() - 1.0).clamp(0.0, (self.buf.height - 1) as f32) as usize;
        self.buf.put_str(col, row, text, Color::White);
    }

    /// Full-screen image: its background everywhere, art centred.
    fn screen(&mut self, texture: TextureId) {
        let Some(sprite) = self.atlas.sprite(texture) else { return };
        let bg = sprite.bg.unwrap_or(Cell::BASE_BG);
        self.buf.cells.fill(Cell { ch: ' ', fg: sprite.fg, bg });

        let art_h = sprite.art.len();
        let top = self.buf.height.saturating_sub(art_h) / 2;
        for (i, line) in sprite.art.iter().enumerate() {
            let art_w = line.chars().count();
            let left = self.buf.width.saturating_sub(art_w) / 2;
            self.buf.put_str(left, top + i, line, sprite.fg);
        }
        if art_h == 0 {
            let (col, row) = (self.buf.width / 2, self.buf.height / 2);
            self.buf.set(col, row, Cell { ch: sprite.glyph, fg: sprite.fg, bg });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Renderer
// ══════════════════════════════════════════════════════════════

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    canvas: Canvas,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new(atlas: GlyphAtlas) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            canvas: Canvas::new(0, 0, atlas),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        self.sync_size(false)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Match the buffers to the terminal. A changed size forces a full repaint.
    fn sync_size(&mut self, clear: bool) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let (tw, th) = (tw as usize, th as usize);
        if tw == self.term_w && th == self.term_h {
            return Ok(());
        }
        tracing::debug!(cols = tw, rows = th, "Terminal resized");
        self.term_w = tw;
        self.term_h = th;
        self.canvas.buf.resize(tw, th);
        self.back.resize(tw, th);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
        if clear {
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let front = &self.canvas.buf;
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colours: ResetColor would fall back to the terminal's
        // own default, which may differ from BASE_BG.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..front.height {
            for x in 0..front.width {
                let cell = front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

impl RenderSurface for Renderer {
    fn set_viewport(&mut self, viewport: Viewport) {
        self.canvas.viewport = viewport;
    }

    fn draw_backdrop(&mut self, texture: TextureId) {
        self.canvas.backdrop(texture);
    }

    fn draw_sprites(&mut self, commands: &[DrawCommand]) {
        for cmd in commands {
            self.canvas.sprite(cmd);
        }
    }

    fn draw_text(&mut self, text: &str, position: Vec2, _size: f32) {
        self.canvas.text(text, position);
    }

    fn draw_screen(&mut self, texture: TextureId) {
        self.canvas.screen(texture);
    }

    fn present(&mut self) -> io::Result<()> {
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.canvas.buf, &mut self.back);
        self.sync_size(true)?;
        self.canvas.buf.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gfx::{AssetLoader, Texture};
    use pretty_assertions::assert_eq;
    use std::path::Path;

    const MANIFEST: &str = r##"
[textures."tiles/grass.png"]
glyph = "#"
fg = "green"
bg = "dark_green"
width = 32
height = 32

[textures."mob/lion/run0.png"]
glyph = ">"
fg = "yellow"
width = 64
height = 64

[textures."background.png"]
glyph = "."
fg = "dark_grey"
bg = "black"
width = 32
height = 32

[textures."startscreen.png"]
glyph = " "
bg = "blue"
width = 1600
height = 900
art = """
AB
CDE
"""
"##;

    /// 16×9 cells over a 160×90 viewport: one cell is 10×10 world units.
    fn canvas() -> (Canvas, GlyphAtlas) {
        let atlas = GlyphAtlas::from_toml_str(MANIFEST, Path::new("test")).unwrap();
        let mut canvas = Canvas::new(16, 9, atlas.clone());
        canvas.viewport = Viewport { left: 0, bottom: 0, width: 160, height: 90 };
        (canvas, atlas)
    }

    fn load(atlas: &mut GlyphAtlas, path: &str) -> Texture {
        atlas.load_texture(path).unwrap()
    }

    fn row(canvas: &Canvas, y: usize) -> String {
        (0..canvas.buf.width).map(|x| canvas.buf.get(x, y).ch).collect()
    }

    #[test]
    fn sprite_covers_its_extent() {
        let (mut c, mut atlas) = canvas();
        let grass = load(&mut atlas, "tiles/grass.png");
        // 20×20 box centred at (30, 20): cols 2..4, rows 6..8
        c.sprite(&DrawCommand::sized(grass, Vec2::new(30.0, 20.0), Vec2::splat(20.0)));
        assert_eq!(row(&c, 5), " ".repeat(16));
        assert_eq!(row(&c, 6), "  ##            ");
        assert_eq!(row(&c, 7), "  ##            ");
        assert_eq!(c.buf.get(2, 6).bg, Color::DarkGreen);
    }

    #[test]
    fn viewport_scroll_shifts_sprites() {
        let (mut c, mut atlas) = canvas();
        let grass = load(&mut atlas, "tiles/grass.png");
        c.viewport.left = 20;
        c.sprite(&DrawCommand::sized(grass, Vec2::new(30.0, 20.0), Vec2::splat(20.0)));
        assert_eq!(row(&c, 6), "##              ");
    }

    #[test]
    fn off_screen_sprite_is_clipped() {
        let (mut c, mut atlas) = canvas();
        let grass = load(&mut atlas, "tiles/grass.png");
        c.sprite(&DrawCommand::sized(grass, Vec2::new(-50.0, 20.0), Vec2::splat(20.0)));
        c.sprite(&DrawCommand::sized(grass, Vec2::new(160.0, 90.0), Vec2::splat(20.0)));
        assert_eq!(row(&c, 0), "               #");
        assert_eq!(c.buf.cells.iter().filter(|cell| cell.ch == '#').count(), 1);
    }

    #[test]
    fn flipped_sprite_mirrors_glyph_and_keeps_background() {
        let (mut c, mut atlas) = canvas();
        let bg = load(&mut atlas, "background.png");
        let lion = load(&mut atlas, "mob/lion/run0.png").flipped_horizontally();
        c.backdrop(bg.id);
        c.sprite(&DrawCommand::new(lion, Vec2::new(55.0, 45.0), 0.1));
        let cell = c.buf.get(5, 4);
        assert_eq!(cell.ch, '<');
        assert_eq!(cell.bg, Color::Black);
    }

    #[test]
    fn text_sits_above_its_anchor() {
        let (mut c, _) = canvas();
        c.text("Score: 3", Vec2::new(10.0, 10.0));
        assert_eq!(row(&c, 7), " Score: 3       ");
    }

    #[test]
    fn screen_art_is_centred() {
        let (mut c, mut atlas) = canvas();
        let start = load(&mut atlas, "startscreen.png");
        c.screen(start.id);
        assert_eq!(row(&c, 3), "       AB       ");
        assert_eq!(row(&c, 4), "      CDE       ");
        assert_eq!(c.buf.get(0, 0).bg, Color::Blue);
    }
}
