//! Conversions between cartesian tile space, isometric world space and screen space.
//!
//! Cartesian coordinates count whole tiles along the grid axes. Isometric
//! coordinates place those tiles on a 2:1 diamond lattice measured in world
//! pixels. Screen coordinates apply the [`Camera`] translation and zoom and
//! centre the result inside the [`Viewport`].

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Width of a single tile sprite measured in world pixels.
pub const TILE_SIZE: f64 = 64.0;

/// Vertical distance between the ground plane and the first structure layer.
const CURSOR_LAYER_OFFSET: f64 = 16.0;

/// Divides the zoom target when applying a scroll step.
const ZOOM_STEP_DIVISOR: f64 = 7.0;

/// Fraction of the remaining zoom gap closed on every tick.
const ZOOM_SMOOTHING_DIVISOR: f64 = 10.0;

/// Projects a cartesian tile coordinate onto the isometric diamond lattice.
#[must_use]
pub fn cartesian_to_iso(cartesian: DVec2) -> DVec2 {
    DVec2::new(
        (cartesian.x - cartesian.y) * (TILE_SIZE / 2.0),
        (cartesian.x + cartesian.y) * (TILE_SIZE / 4.0),
    )
}

/// Inverts [`cartesian_to_iso`], shifting the result one tile along the x axis.
///
/// The shift aligns the inverse with where tile sprites are drawn: a sprite for
/// tile `(x, y)` occupies the image box whose top-left corner sits at
/// `cartesian_to_iso(x, y)`, so the pointer lands one tile further along x than
/// the pure algebraic inverse reports. Callers picking tiles from the screen
/// rely on the shifted value.
#[must_use]
pub fn iso_to_cartesian(iso: DVec2) -> DVec2 {
    let half = iso.x / (TILE_SIZE / 2.0);
    let quarter = iso.y / (TILE_SIZE / 4.0);
    DVec2::new((half + quarter) / 2.0 - 1.0, (quarter - half) / 2.0)
}

/// Pixel dimensions of the area the world is presented in.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    width: f64,
    height: f64,
}

impl Viewport {
    /// Creates a viewport with the provided pixel dimensions.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width of the viewport in pixels.
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Height of the viewport in pixels.
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }

    /// Centre of the viewport in pixels.
    #[must_use]
    pub fn centre(&self) -> DVec2 {
        DVec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Inclusive range the camera zoom is clamped to.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    /// Smallest permitted scale.
    pub min: f64,
    /// Largest permitted scale.
    pub max: f64,
}

impl ZoomLimits {
    /// Creates a new zoom range.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Camera translating isometric world space into screen space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    position: DVec2,
    scale: f64,
    target_scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(DVec2::ZERO, 1.0)
    }
}

impl Camera {
    /// Creates a camera looking at `position` with a settled zoom of `scale`.
    #[must_use]
    pub const fn new(position: DVec2, scale: f64) -> Self {
        Self {
            position,
            scale,
            target_scale: scale,
        }
    }

    /// Isometric world position at the centre of the viewport.
    #[must_use]
    pub const fn position(&self) -> DVec2 {
        self.position
    }

    /// Current zoom factor.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Zoom factor the camera is easing towards.
    #[must_use]
    pub const fn target_scale(&self) -> f64 {
        self.target_scale
    }

    /// Maps an isometric world position to screen pixels.
    #[must_use]
    pub fn iso_to_screen(&self, iso: DVec2, viewport: Viewport) -> DVec2 {
        (iso - self.position) * self.scale + viewport.centre()
    }

    /// Maps a screen position back into isometric world space.
    ///
    /// The pointer is first lowered by one structure layer so that it picks the
    /// tile whose raised sprite is drawn under it rather than the ground plane.
    #[must_use]
    pub fn screen_to_iso(&self, screen: DVec2, viewport: Viewport) -> DVec2 {
        let lowered = DVec2::new(screen.x, screen.y + CURSOR_LAYER_OFFSET * self.scale);
        (lowered - viewport.centre()) / self.scale + self.position
    }

    /// Maps a screen position to fractional cartesian tile coordinates.
    #[must_use]
    pub fn screen_to_cartesian(&self, screen: DVec2, viewport: Viewport) -> DVec2 {
        iso_to_cartesian(self.screen_to_iso(screen, viewport))
    }

    /// Moves the camera by `delta` world pixels.
    pub fn pan(&mut self, delta: DVec2) {
        self.position += delta;
    }

    /// Adjusts the zoom target by a scroll amount in the range `-1.0..=1.0`.
    pub fn zoom_by(&mut self, scroll: f64, limits: ZoomLimits) {
        let scroll = scroll.clamp(-1.0, 1.0);
        self.target_scale += scroll * (self.target_scale / ZOOM_STEP_DIVISOR);
        self.target_scale = self.target_scale.clamp(limits.min, limits.max);
    }

    /// Eases the current zoom one tick towards the target.
    pub fn step_zoom(&mut self) {
        self.scale += (self.target_scale - self.scale) / ZOOM_SMOOTHING_DIVISOR;
    }

    /// Keeps the camera inside the isometric bounds of a square grid.
    pub fn clamp_to_grid(&mut self, grid_size: u32) {
        let extent = f64::from(grid_size) * TILE_SIZE / 2.0;
        self.position.x = self.position.x.clamp(-extent, extent);
        self.position.y = self.position.y.clamp(0.0, extent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    fn assert_close(actual: DVec2, expected: DVec2) {
        assert!(
            (actual - expected).abs().max_element() < EPSILON,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn cartesian_to_iso_projects_onto_diamond() {
        assert_close(cartesian_to_iso(DVec2::new(0.0, 0.0)), DVec2::ZERO);
        assert_close(cartesian_to_iso(DVec2::new(1.0, 0.0)), DVec2::new(32.0, 16.0));
        assert_close(cartesian_to_iso(DVec2::new(0.0, 1.0)), DVec2::new(-32.0, 16.0));
        assert_close(cartesian_to_iso(DVec2::new(3.0, 3.0)), DVec2::new(0.0, 96.0));
    }

    #[test]
    fn iso_round_trip_restores_every_tile_after_correction() {
        for x in 0..256 {
            for y in 0..256 {
                let cartesian = DVec2::new(f64::from(x), f64::from(y));
                let restored = iso_to_cartesian(cartesian_to_iso(cartesian));
                assert_close(restored + DVec2::X, cartesian);
            }
        }
    }

    #[test]
    fn pointer_over_sprite_top_resolves_to_its_tile_at_any_zoom() {
        let viewport = Viewport::new(1280.0, 720.0);
        for scale in [0.4, 0.75, 1.0, 1.6, 4.0] {
            let camera = Camera::new(DVec2::new(-120.0, 340.0), scale);
            for (x, y) in [(0.0, 0.0), (10.0, 4.0), (37.0, 200.0), (255.0, 255.0)] {
                let tile = DVec2::new(x, y);
                let sprite_top = cartesian_to_iso(tile) + DVec2::new(TILE_SIZE / 2.0, 0.0);
                let screen = camera.iso_to_screen(sprite_top, viewport);
                let picked = camera.screen_to_cartesian(screen, viewport);
                assert_close(picked, tile);
            }
        }
    }

    #[test]
    fn screen_round_trip_accounts_for_layer_offset() {
        let viewport = Viewport::new(800.0, 600.0);
        let camera = Camera::new(DVec2::new(50.0, 75.0), 2.0);
        let iso = DVec2::new(120.0, -40.0);
        let screen = camera.iso_to_screen(iso, viewport);
        assert_close(camera.screen_to_iso(screen, viewport), iso + DVec2::new(0.0, 16.0));
    }

    #[test]
    fn zoom_is_clamped_and_eased() {
        let limits = ZoomLimits::new(0.4, 4.0);
        let mut camera = Camera::default();
        for _ in 0..100 {
            camera.zoom_by(5.0, limits);
        }
        assert!((camera.target_scale() - 4.0).abs() < EPSILON);

        camera.step_zoom();
        assert!((camera.scale() - 1.3).abs() < EPSILON);

        for _ in 0..200 {
            camera.zoom_by(-1.0, limits);
        }
        assert!((camera.target_scale() - 0.4).abs() < EPSILON);
    }

    #[test]
    fn clamp_to_grid_limits_position() {
        let mut camera = Camera::new(DVec2::new(-1.0e6, -5.0), 1.0);
        camera.clamp_to_grid(256);
        assert_close(camera.position(), DVec2::new(-8192.0, 0.0));

        camera.pan(DVec2::new(1.0e6, 1.0e6));
        camera.clamp_to_grid(256);
        assert_close(camera.position(), DVec2::new(8192.0, 8192.0));
    }
}
