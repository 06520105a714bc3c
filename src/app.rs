use quake_map::dashboard::{Dashboard, YearView};
use quake_map::map::{EpicenterMap, Viewport};

/// Interactive state on top of a loaded dashboard.
pub struct App {
    pub dashboard: Dashboard,
    pub map: EpicenterMap,
    pub viewport: Viewport,
    pub year: i32,
    /// View for `year`, refreshed whenever the year or the data changes
    pub view: YearView,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Outcome of the last reload, shown in the status bar
    pub message: Option<String>,
    default_year: i32,
}

impl App {
    pub fn new(dashboard: Dashboard, year: i32, width: usize, height: usize) -> Self {
        let map = EpicenterMap::from_polygons(&dashboard.snapshot().polygons);
        let year = dashboard.clamp_year(year);
        let view = dashboard.view(year);
        let (pw, ph) = map_pixels(width, height);
        Self {
            dashboard,
            map,
            viewport: Viewport::world(pw, ph),
            year,
            view,
            should_quit: false,
            last_mouse: None,
            message: None,
            default_year: year,
        }
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (pw, ph) = map_pixels(width, height);
        self.viewport.width = pw;
        self.viewport.height = ph;
    }

    fn refresh(&mut self) {
        self.view = self.dashboard.view(self.year);
    }

    pub fn step_year(&mut self, delta: i32) {
        let year = self.dashboard.step_year(self.year, delta);
        if year != self.year {
            self.year = year;
            self.refresh();
        }
    }

    pub fn first_year(&mut self) {
        if let Some((first, _)) = self.dashboard.snapshot().year_range() {
            self.year = first;
            self.refresh();
        }
    }

    pub fn last_year(&mut self) {
        if let Some((_, last)) = self.dashboard.snapshot().year_range() {
            self.year = last;
            self.refresh();
        }
    }

    pub fn toggle_tie_break(&mut self) {
        let next = self.dashboard.tie_break().toggled();
        self.dashboard.set_tie_break(next);
        self.message = Some(format!("ties: {next}"));
        self.refresh();
    }

    /// Re-fetch both inputs. A failure leaves the current data on screen.
    pub fn reload(&mut self) {
        match self.dashboard.reload() {
            Ok(()) => {
                self.map = EpicenterMap::from_polygons(&self.dashboard.snapshot().polygons);
                self.year = self.dashboard.clamp_year(self.year);
                self.message = Some(format!("reloaded, {} outlines", self.map.outline_count()));
                self.refresh();
            }
            Err(e) => {
                log::warn!("reload failed: {e}");
                let hint = if e.is_retryable() { ", press r to retry" } else { "" };
                self.message = Some(format!("reload failed: {e}{hint}"));
            }
        }
    }

    pub fn reset_view(&mut self) {
        self.viewport = Viewport::world(self.viewport.width, self.viewport.height);
        self.year = self.dashboard.clamp_year(self.default_year);
        self.refresh();
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom towards a terminal cell (one cell is 2x4 braille pixels; the map
    /// border shifts everything by one cell).
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.viewport.zoom_in_at(px, py);
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.viewport.zoom_out_at(px, py);
    }

    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = (last_x as i32 - x as i32) * 2;
            let dy = (last_y as i32 - y as i32) * 4;
            self.viewport.pan(dx, dy);
        }
        self.last_mouse = Some((x, y));
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }
}

fn cell_to_pixel(col: u16, row: u16) -> (i32, i32) {
    (col.saturating_sub(1) as i32 * 2, row.saturating_sub(1) as i32 * 4)
}

/// Braille pixel size of the map panel for a terminal of `width` x `height`
/// cells: map border takes 2 columns, and the rows below the map (panels and
/// status bar) plus the border take `crate::ui::RESERVED_ROWS`.
fn map_pixels(width: usize, height: usize) -> (usize, usize) {
    let inner_width = width.saturating_sub(2);
    let inner_height = height.saturating_sub(crate::ui::RESERVED_ROWS as usize + 2);
    (inner_width * 2, inner_height * 4)
}
