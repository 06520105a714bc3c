use glam::DVec2;

const MIN_ZOOM: f64 = 0.5;
const MAX_ZOOM: f64 = 50.0;
const ZOOM_STEP: f64 = 1.5;

/// Equirectangular view onto the map, in Braille pixels.
#[derive(Clone, Debug)]
pub struct Viewport {
    /// (lon, lat) at the middle of the canvas
    pub center: DVec2,
    /// 1.0 fits 360° of longitude into the canvas width
    pub zoom: f64,
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center: DVec2::new(center_lon, center_lat),
            zoom,
            width,
            height,
        }
    }

    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 0.0, 1.0, width, height)
    }

    /// Pixels per degree.
    fn scale(&self) -> f64 {
        self.zoom * self.width.max(1) as f64 / 360.0
    }

    fn half_size(&self) -> DVec2 {
        DVec2::new(self.width as f64, self.height as f64) / 2.0
    }

    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let offset = (DVec2::new(lon, lat) - self.center) * self.scale();
        let half = self.half_size();
        ((half.x + offset.x).floor() as i32, (half.y - offset.y).floor() as i32)
    }

    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let half = self.half_size();
        let offset = DVec2::new(px as f64 - half.x, half.y - py as f64) / self.scale();
        let geo = self.center + offset;
        (geo.x, geo.y)
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.center += DVec2::new(dx as f64, -dy as f64) / self.scale();
        if self.center.x > 180.0 {
            self.center.x -= 360.0;
        } else if self.center.x < -180.0 {
            self.center.x += 360.0;
        }
        self.center.y = self.center.y.clamp(-90.0, 90.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / ZOOM_STEP);
    }

    /// Zoom keeping the geographic point under (px, py) in place.
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= 0 && px < self.width as i32 && py >= 0 && py < self.height as i32
    }

    /// Rough bounding-box test for a segment.
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        p1.0.max(p2.0) >= 0
            && p1.0.min(p2.0) < self.width as i32
            && p1.1.max(p2.1) >= 0
            && p1.1.min(p2.1) < self.height as i32
    }
}
