use crate::app::App;
use quake_map::braille::BrailleCanvas;
use quake_map::map::MapLayers;
use quake_map::stats::{class_peaks, peak_bin, trend_extremes, MagnitudeClass};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Sparkline, Widget},
    Frame,
};

/// Height of the leaderboard/trend row.
const PANEL_HEIGHT: u16 = 9;

/// Terminal rows not available to the map panel (panels + status bar).
pub const RESERVED_ROWS: u16 = PANEL_HEIGHT + 1;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),                // Map
            Constraint::Length(PANEL_HEIGHT),  // Leaderboard + trend
            Constraint::Length(1),             // Status bar
        ])
        .split(frame.area());

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    render_map(frame, app, chunks[0]);
    render_leaderboard(frame, app, panels[0]);
    render_trend(frame, app, panels[1]);
    render_status_bar(frame, app, chunks[2]);
}

fn panel(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel(format!(" Epicenters {} ", app.year));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app.map.render(
        inner.width as usize,
        inner.height as usize,
        &viewport,
        &app.view.epicenters,
    );
    frame.render_widget(MapWidget { layers }, inner);
}

/// Braille map: outlines underneath, epicenters on top.
struct MapWidget {
    layers: MapLayers,
}

impl MapWidget {
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        if canvas.is_blank() {
            return;
        }
        for row in 0..area.height {
            for col in 0..area.width {
                if let Some(ch) = canvas.glyph(col as usize, row as usize) {
                    buf[(area.x + col, area.y + row)].set_char(ch).set_fg(color);
                }
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Self::render_layer(&self.layers.borders, Color::DarkGray, area, buf);
        Self::render_layer(&self.layers.epicenters, Color::Red, area, buf);
    }
}

fn render_leaderboard(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel(format!(" Top countries {} ", app.year));
    let top = &app.view.top;

    if top.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            format!("no quakes attributed to a country in {}", app.year),
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let bars: Vec<Bar> = top
        .iter()
        .map(|c| {
            Bar::default()
                .value(c.count)
                .label(Line::from(c.country.clone()))
                .text_value(c.count.to_string())
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .bar_style(Style::default().fg(Color::Yellow))
        .value_style(Style::default().fg(Color::Black).bg(Color::Yellow))
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn render_trend(frame: &mut Frame, app: &App, area: Rect) {
    let snapshot = app.dashboard.snapshot();
    let trend = &snapshot.trend;

    let mut title = match snapshot.year_range() {
        Some((first, last)) => format!(" Quakes per year {first}-{last} "),
        None => " Quakes per year ".to_string(),
    };
    if let Some(ext) = trend_extremes(trend) {
        title.push_str(&format!(
            "· peak {} ({}) low {} ({}) ",
            ext.peak.0, ext.peak.1, ext.trough.0, ext.trough.1
        ));
    }
    if let Some(t) = trend.iter().find(|t| t.year == app.year) {
        title.push_str(&format!("· {}: {} (3-yr avg {:.1}) ", t.year, t.count, t.moving_avg));
    }

    let counts: Vec<u64> = trend.iter().map(|t| t.count).collect();
    let block = panel(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let sparkline = Sparkline::default()
        .data(&counts)
        .style(Style::default().fg(Color::Magenta));
    frame.render_widget(sparkline, rows[0]);

    let peak = match peak_bin(&snapshot.magnitudes) {
        Some(bin) => format!(
            "most common magnitude M{:.1}-{:.1} ({} quakes)",
            bin.start, bin.end, bin.count
        ),
        None => "no magnitudes in data".to_string(),
    };
    frame.render_widget(
        Paragraph::new(Span::styled(peak, Style::default().fg(Color::DarkGray))),
        rows[1],
    );
    frame.render_widget(Paragraph::new(class_line(app)), rows[2]);
}

/// Selected year's magnitude-class shares, with each class's peak year.
fn class_line(app: &App) -> Line<'static> {
    let snapshot = app.dashboard.snapshot();
    let dim = Style::default().fg(Color::DarkGray);
    let colors = [Color::Yellow, Color::LightRed, Color::Red];

    let current = snapshot.classes.iter().find(|c| c.year == app.year);
    let peaks = class_peaks(&snapshot.classes);
    let mut spans = Vec::new();
    for (class, color) in MagnitudeClass::ALL.into_iter().zip(colors) {
        let share = current.map_or(0.0, |c| c.share(class) * 100.0);
        spans.push(Span::styled(
            format!("M{} {:.0}%", class.label(), share),
            Style::default().fg(color),
        ));
        match peaks.iter().find(|p| p.class == class) {
            Some(peak) => spans.push(Span::styled(format!(" (peak {}) ", peak.year), dim)),
            None => spans.push(Span::styled(" ", dim)),
        }
    }
    Line::from(spans)
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let key = Style::default().fg(Color::Green);
    let dim = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled(" ◀ ", dim),
        Span::styled(
            app.year.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ▶ ", dim),
        Span::styled(format!("{} in countries / {} ", app.view.attributed, app.view.year_events), dim),
        Span::styled(" Zoom: ", dim),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(format!("  ties: {}  ", app.dashboard.tie_break()), dim),
        Span::styled("[←→]", key),
        Span::styled("year ", dim),
        Span::styled("[t]", key),
        Span::styled("ies ", dim),
        Span::styled(if app.map.show_borders { "[B]" } else { "[b]" }, key),
        Span::styled("orders ", dim),
        Span::styled("[r]", key),
        Span::styled("eload ", dim),
        Span::styled("[q]", key),
        Span::styled("uit ", dim),
    ];
    if let Some(msg) = &app.message {
        spans.push(Span::styled(format!(" {msg}"), Style::default().fg(Color::White)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
