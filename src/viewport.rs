use glam::Vec2;

/// Screen-space rectangle the level is drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Canvas {
    pub start: Vec2,
    pub end: Vec2,
    pub size: Vec2,
}

impl Canvas {
    pub fn from_min_size(start: Vec2, size: Vec2) -> Self {
        Self { start, end: start + size, size }
    }

    pub fn center(&self) -> Vec2 {
        self.start + self.size * 0.5
    }
}

/// Pan-only 2D view. Three spaces are involved:
/// world (level coordinates), viewport (world relative to the camera) and
/// screen (pixels, with the camera at the canvas centre).
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    world_pos: Vec2,
    canvas: Canvas,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLine {
    pub from: Vec2,
    pub to: Vec2,
}

impl Viewport {
    pub fn new(canvas: Canvas) -> Self {
        Self { world_pos: Vec2::ZERO, canvas }
    }

    pub fn world_pos(&self) -> Vec2 {
        self.world_pos
    }

    pub fn set_world_pos(&mut self, world_pos: Vec2) {
        self.world_pos = world_pos;
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn set_canvas(&mut self, canvas: Canvas) {
        self.canvas = canvas;
    }

    pub fn viz_to_world(&self, viz: Vec2) -> Vec2 {
        viz + self.world_pos
    }

    pub fn world_to_viz(&self, world: Vec2) -> Vec2 {
        world - self.world_pos
    }

    pub fn viz_to_screen(&self, viz: Vec2) -> Vec2 {
        self.canvas.center() + viz
    }

    pub fn screen_to_viz(&self, screen: Vec2) -> Vec2 {
        screen - self.canvas.center()
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        self.viz_to_screen(self.world_to_viz(world))
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        self.viz_to_world(self.screen_to_viz(screen))
    }

    /// Screen-space lines of a world grid with `spacing` units between lines, clipped to the canvas.
    /// An axis whose lines would be denser than one per pixel is left out.
    pub fn grid_lines(&self, spacing: f32) -> Vec<GridLine> {
        if !spacing.is_finite() || spacing <= 0.0 || self.canvas.size.x <= 0.0 || self.canvas.size.y <= 0.0 {
            return Vec::new();
        }
        let world_start = self.screen_to_world(self.canvas.start);
        let world_end = self.screen_to_world(self.canvas.end);
        let first = (world_start / spacing).ceil() * spacing;

        let mut lines = Vec::new();
        for i in 0..line_count(first.x, world_end.x, spacing, self.canvas.size.x) {
            let x = first.x + i as f32 * spacing;
            let screen_x = self.world_to_screen(Vec2::new(x, 0.0)).x;
            lines.push(GridLine {
                from: Vec2::new(screen_x, self.canvas.start.y),
                to: Vec2::new(screen_x, self.canvas.end.y),
            });
        }
        for i in 0..line_count(first.y, world_end.y, spacing, self.canvas.size.y) {
            let y = first.y + i as f32 * spacing;
            let screen_y = self.world_to_screen(Vec2::new(0.0, y)).y;
            lines.push(GridLine {
                from: Vec2::new(self.canvas.start.x, screen_y),
                to: Vec2::new(self.canvas.end.x, screen_y),
            });
        }
        lines
    }
}

/// Number of grid lines from `first` to `end` inclusive, or 0 when they would outnumber `pixels`.
fn line_count(first: f32, end: f32, spacing: f32, pixels: f32) -> u32 {
    let steps = ((end - first) / spacing).floor();
    if !steps.is_finite() || steps < 0.0 || steps > pixels {
        return 0;
    }
    steps as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        let mut viewport = Viewport::new(Canvas::from_min_size(Vec2::new(100.0, 50.0), Vec2::new(800.0, 600.0)));
        viewport.set_world_pos(Vec2::new(1000.0, -200.0));
        viewport
    }

    #[test]
    fn canvas_centre_shows_the_camera_position() {
        let viewport = viewport();
        assert_eq!(viewport.world_to_screen(Vec2::new(1000.0, -200.0)), Vec2::new(500.0, 350.0));
        assert_eq!(viewport.screen_to_world(Vec2::new(500.0, 350.0)), Vec2::new(1000.0, -200.0));
    }

    #[test]
    fn conversions_are_inverse() {
        let viewport = viewport();
        for world in [Vec2::ZERO, Vec2::new(-35.5, 12.25), Vec2::new(1e4, -3e3)] {
            let back = viewport.screen_to_world(viewport.world_to_screen(world));
            assert!((back - world).length() < 1e-3, "{world} -> {back}");
            assert_eq!(viewport.viz_to_world(viewport.world_to_viz(world)), world);
        }
    }

    #[test]
    fn grid_lines_cover_the_canvas() {
        let viewport = viewport();
        let lines = viewport.grid_lines(100.0);
        // 800 px wide -> x in [600, 1400] -> 9 vertical lines; 600 px tall -> y in [-500, 100] -> 7 horizontal.
        assert_eq!(lines.len(), 16);
        assert!(lines.iter().all(|line| line.from.x >= 100.0 && line.to.x <= 900.0));
        assert!(viewport.grid_lines(0.0).is_empty());
        assert!(viewport.grid_lines(f32::NAN).is_empty());
    }

    #[test]
    fn grid_lines_stay_bounded_far_from_the_origin() {
        let mut viewport = viewport();
        viewport.set_world_pos(Vec2::new(1e8, 0.0));
        let lines = viewport.grid_lines(1.0);
        assert!(!lines.is_empty());
        assert!(lines.len() <= 801 + 601, "{} lines", lines.len());
        assert!(lines.iter().all(|line| line.from.x.is_finite() && line.from.y.is_finite()));
    }

    #[test]
    fn sub_pixel_spacing_draws_no_grid() {
        let viewport = viewport();
        assert!(viewport.grid_lines(1e-3).is_empty());
        assert_eq!(viewport.grid_lines(1.0).len(), 801 + 601);
    }
}
