/// Camera controller: margin-based scrolling over a bounded map.
///
/// World coordinates have y pointing up; `(view_left, view_bottom)` is the
/// world position of the bottom-left corner of the screen.

use super::entity::Rect;
use crate::config::Tuning;

/// Integer viewport handed to the rendering surface.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Viewport {
    pub left: i32,
    pub bottom: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn top(&self) -> i32 { self.bottom + self.height }
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Camera {
    pub view_left: f32,
    pub view_bottom: f32,
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Camera::default();
    }

    /// Shift the view by exactly how far the player crossed each margin.
    /// Returns whether the view moved.
    pub fn scroll(&mut self, player: &Rect, map_width: f32, map_height: f32, tuning: &Tuning) -> bool {
        let screen_w = tuning.screen_width;
        let screen_h = tuning.screen_height;
        let mut changed = false;

        // Left
        let left_boundary = self.view_left + tuning.left_margin;
        if player.left < left_boundary && self.view_left > tuning.left_scroll_epsilon {
            self.view_left -= left_boundary - player.left;
            changed = true;
        }
        // Right
        let right_boundary = self.view_left + screen_w - tuning.right_margin;
        if player.right > right_boundary && self.view_left < map_width - screen_w {
            self.view_left += player.right - right_boundary;
            changed = true;
        }
        // Up
        let top_boundary = self.view_bottom + screen_h - tuning.top_margin;
        if player.top > top_boundary && self.view_bottom < map_height - screen_h {
            self.view_bottom += player.top - top_boundary;
            changed = true;
        }
        // Down
        let bottom_boundary = self.view_bottom + tuning.bottom_margin;
        if player.bottom < bottom_boundary && self.view_bottom > tuning.bottom_scroll_epsilon {
            self.view_bottom -= bottom_boundary - player.bottom;
            changed = true;
        }

        if changed {
            self.clamp(map_width, map_height, tuning);
        }
        changed
    }

    fn clamp(&mut self, map_width: f32, map_height: f32, tuning: &Tuning) {
        let max_left = (map_width - tuning.screen_width).max(0.0);
        let max_bottom = (map_height - tuning.screen_height).max(0.0);
        self.view_left = self.view_left.clamp(0.0, max_left);
        self.view_bottom = self.view_bottom.clamp(0.0, max_bottom);
        debug_assert!(self.view_left >= 0.0 && self.view_bottom >= 0.0);
    }

    /// Offsets are truncated only here.
    pub fn viewport(&self, tuning: &Tuning) -> Viewport {
        Viewport {
            left: self.view_left as i32,
            bottom: self.view_bottom as i32,
            width: tuning.screen_width as i32,
            height: tuning.screen_height as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use pretty_assertions::assert_eq;

    const MAP_W: f32 = 4000.0;
    const MAP_H: f32 = 1200.0;

    fn player_at(x: f32, y: f32) -> Rect {
        Rect::from_center(Vec2::new(x, y), Vec2::splat(40.0))
    }

    #[test]
    fn scrolls_right_by_crossing_distance() {
        let tuning = Tuning::default();
        let mut cam = Camera::new();
        // right boundary = 0 + 1600 - 800 = 800; player right = 830
        assert!(cam.scroll(&player_at(810.0, 400.0), MAP_W, MAP_H, &tuning));
        assert_eq!(cam.view_left, 30.0);
        assert_eq!(cam.view_bottom, 0.0);
    }

    #[test]
    fn left_scroll_waits_for_epsilon() {
        let tuning = Tuning::default();
        let mut cam = Camera { view_left: 10.0, view_bottom: 0.0 };
        assert!(!cam.scroll(&player_at(100.0, 400.0), MAP_W, MAP_H, &tuning));
        assert_eq!(cam.view_left, 10.0);

        let mut cam = Camera { view_left: 100.0, view_bottom: 0.0 };
        // left boundary 600, player left 480 → shift 120, then clamp at 0
        assert!(cam.scroll(&player_at(500.0, 400.0), MAP_W, MAP_H, &tuning));
        assert_eq!(cam.view_left, 0.0);
    }

    #[test]
    fn never_leaves_map_bounds() {
        let tuning = Tuning::default();
        let mut cam = Camera::new();
        for step in 0..400 {
            let x = 200.0 + step as f32 * 11.0;
            let y = 500.0 + (step % 60) as f32 * 12.0;
            cam.scroll(&player_at(x, y), MAP_W, MAP_H, &tuning);
            assert!(cam.view_left >= 0.0 && cam.view_left <= MAP_W - tuning.screen_width);
            assert!(cam.view_bottom >= 0.0 && cam.view_bottom <= MAP_H - tuning.screen_height);
        }
    }

    #[test]
    fn small_map_pins_to_origin() {
        let tuning = Tuning::default();
        let mut cam = Camera::new();
        cam.scroll(&player_at(1500.0, 850.0), 1000.0, 600.0, &tuning);
        assert_eq!(cam, Camera::default());
    }

    #[test]
    fn viewport_truncates_offsets() {
        let tuning = Tuning::default();
        let cam = Camera { view_left: 30.9, view_bottom: 12.5 };
        assert_eq!(cam.viewport(&tuning), Viewport { left: 30, bottom: 12, width: 1600, height: 900 });
    }
}
