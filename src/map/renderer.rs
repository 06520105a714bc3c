use crate::braille::BrailleCanvas;
use crate::data::{CountryPolygon, Event};
use crate::map::geometry::{draw_disc, draw_line, marker_radius};
use crate::map::projection::Viewport;

/// A lon/lat polyline.
pub type Outline = Vec<(f64, f64)>;

/// Canvases drawn separately so the UI can colour them independently.
pub struct MapLayers {
    pub borders: BrailleCanvas,
    pub epicenters: BrailleCanvas,
}

/// Country outlines plus the epicenters of the selected year.
pub struct EpicenterMap {
    outlines: Vec<Outline>,
    pub show_borders: bool,
}

impl EpicenterMap {
    pub fn from_polygons(polygons: &[CountryPolygon]) -> Self {
        Self {
            outlines: polygons.iter().flat_map(|p| p.outlines()).collect(),
            show_borders: true,
        }
    }

    pub fn outline_count(&self) -> usize {
        self.outlines.len()
    }

    pub fn toggle_borders(&mut self) {
        self.show_borders = !self.show_borders;
    }

    /// Render onto fresh canvases of `width` x `height` cells.
    pub fn render<'a>(
        &self,
        width: usize,
        height: usize,
        viewport: &Viewport,
        epicenters: impl IntoIterator<Item = &'a Event>,
    ) -> MapLayers {
        let mut borders = BrailleCanvas::new(width, height);
        let mut quakes = BrailleCanvas::new(width, height);

        if self.show_borders {
            for outline in &self.outlines {
                draw_outline(&mut borders, outline, viewport);
            }
        }

        for event in epicenters {
            let (px, py) = viewport.project(event.longitude, event.latitude);
            if viewport.is_visible(px, py) {
                draw_disc(&mut quakes, px, py, marker_radius(event.magnitude));
            }
        }

        MapLayers {
            borders,
            epicenters: quakes,
        }
    }
}

/// Draw a polyline, skipping segments that are off screen or that jump
/// across most of the canvas (antimeridian wrap).
fn draw_outline(canvas: &mut BrailleCanvas, outline: &Outline, viewport: &Viewport) {
    let mut prev: Option<(i32, i32)> = None;
    for &(lon, lat) in outline {
        let p = viewport.project(lon, lat);
        if let Some(q) = prev {
            let jump = ((p.0 - q.0).abs() + (p.1 - q.1).abs()) as usize;
            if jump < viewport.width / 2 && viewport.line_might_be_visible(q, p) {
                draw_line(canvas, q.0, q.1, p.0, p.1);
            }
        }
        prev = Some(p);
    }
}
