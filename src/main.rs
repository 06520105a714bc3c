mod app;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use quake_map::config::DashboardConfig;
use quake_map::dashboard::{Dashboard, DashboardOptions, JsonSink, TextSink};
use quake_map::join::TieBreak;
use quake_map::source::source_for;
use ratatui::DefaultTerminal;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Earthquake epicenters and per-year country rankings in the terminal
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Event table (CSV/TSV path or URL)
    #[arg(long)]
    events: Option<String>,
    /// Country boundaries (TopoJSON/GeoJSON path or URL)
    #[arg(long)]
    countries: Option<String>,
    /// Year shown at startup
    #[arg(short, long)]
    year: Option<i32>,
    /// Number of countries in the ranking
    #[arg(short = 'n', long)]
    top: Option<usize>,
    /// Country never attributed (repeatable; replaces the configured list)
    #[arg(long)]
    exclude: Vec<String>,
    /// Order of tied countries: insertion or alphabetical
    #[arg(long)]
    tie_break: Option<TieBreak>,
    /// Print rankings for these years instead of starting the dashboard
    #[arg(long, num_args = 1..)]
    print: Vec<i32>,
    /// Print JSON lines instead of text tables
    #[arg(long, requires = "print")]
    json: bool,
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

fn resolve_config(args: &Args) -> Result<DashboardConfig> {
    let mut config = match &args.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };
    if let Some(events) = &args.events {
        config.events = events.clone();
    }
    if let Some(countries) = &args.countries {
        config.countries = countries.clone();
    }
    if let Some(year) = args.year {
        config.default_year = year;
    }
    if let Some(top) = args.top {
        config.top_n = top;
    }
    if !args.exclude.is_empty() {
        config.exclude = args.exclude.clone();
    }
    if let Some(tie_break) = args.tie_break {
        config.tie_break = tie_break;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    pretty_env_logger::formatted_timed_builder()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let config = resolve_config(&args)?;
    let timeout = config.fetch_timeout();
    let mut dashboard = Dashboard::new(
        source_for(&config.events, timeout),
        source_for(&config.countries, timeout),
        DashboardOptions::from(&config),
    );
    dashboard.reload().context("cannot load dashboard data")?;

    if !args.print.is_empty() {
        if args.json {
            dashboard.add_sink(Box::new(JsonSink::new(io::stdout().lock())));
        } else {
            dashboard.add_sink(Box::new(TextSink::new(io::stdout().lock())));
        }
        for &year in &args.print {
            dashboard.publish(year)?;
        }
        return Ok(());
    }

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, dashboard, config.default_year);

    let _ = execute!(io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, dashboard: Dashboard, year: i32) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(dashboard, year, size.width as usize, size.height as usize);

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                    // Year slider
                    KeyCode::Left | KeyCode::Char('h') => app.step_year(-1),
                    KeyCode::Right | KeyCode::Char('l') => app.step_year(1),
                    KeyCode::PageDown => app.step_year(-5),
                    KeyCode::PageUp => app.step_year(5),
                    KeyCode::Home => app.first_year(),
                    KeyCode::End => app.last_year(),

                    // Pan with wasd or HJKL
                    KeyCode::Char('a') | KeyCode::Char('H') => app.pan(-10, 0),
                    KeyCode::Char('d') | KeyCode::Char('L') => app.pan(10, 0),
                    KeyCode::Char('w') | KeyCode::Char('K') => app.pan(0, -6),
                    KeyCode::Char('s') | KeyCode::Char('J') => app.pan(0, 6),

                    KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                    KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                    KeyCode::Char('b') | KeyCode::Char('B') => app.map.toggle_borders(),
                    KeyCode::Char('t') | KeyCode::Char('T') => app.toggle_tie_break(),
                    KeyCode::Char('r') | KeyCode::Char('R') => app.reload(),
                    KeyCode::Char('0') => app.reset_view(),
                    _ => {}
                },
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width as usize, height as usize),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
