//! Frame rendering: globe canvas, side panels, and modal overlays

use crate::domain::format;
use crate::domain::types::LatLon;
use crate::services::interaction::Control;
use crate::ui::app::{App, InputMode, PinField};
use crate::ui::projection::{Globe, Viewport};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Graticule spacing in degrees
const GRID_STEP: i32 = 30;
/// Sample spacing along graticule lines in degrees
const GRID_SAMPLE: i32 = 5;

pub fn draw_ui(f: &mut Frame, app: &mut App) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Globe and panels
            Constraint::Length(1), // Key help
        ])
        .split(f.area());

    draw_header(f, main_chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(46)])
        .split(main_chunks[1]);

    draw_globe(f, body[0], app);
    draw_side_panel(f, body[1], app);
    draw_help(f, main_chunks[2], app);

    match &app.mode {
        InputMode::Normal => {}
        InputMode::EditingPin { lat, lon, field } => draw_pin_editor(f, lat, lon, *field),
        InputMode::EditingTle { text } => draw_tle_editor(f, text),
    }

    if let Some(notice) = app.viewer.interaction().notice() {
        draw_notice(f, notice);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let clock = app.viewer.clock();
    let (status_text, status_color) =
        if clock.is_playing() { ("PLAYING", Color::Green) } else { ("PAUSED", Color::Yellow) };
    let direction = match clock.direction() {
        crate::domain::clock::Direction::Forward => "▶ forward",
        crate::domain::clock::Direction::Reverse => "◀ reverse",
    };
    let session = app.viewer.session().id().simple().to_string();

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "Orbit Viewer ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(env!("GIT_HASH"), Style::default().fg(Color::DarkGray)),
        Span::raw(" | "),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw(" | "),
        Span::raw(direction),
        Span::raw(" | Speed: "),
        Span::styled(
            format::speed_label(clock.speed_multiplier()),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw(" | Session: "),
        Span::styled(session[..8].to_string(), Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(header, area);
}

/// Segments between consecutive visible points of a path
fn visible_segments(globe: &Globe, points: &[LatLon]) -> Vec<(f64, f64, f64, f64)> {
    let projected: Vec<Option<(f64, f64)>> = points.iter().map(|p| globe.project(*p)).collect();
    projected
        .windows(2)
        .filter_map(|pair| match (pair[0], pair[1]) {
            (Some((x1, y1)), Some((x2, y2))) => Some((x1, y1, x2, y2)),
            _ => None,
        })
        .collect()
}

fn paint_path(ctx: &mut Context, globe: &Globe, points: &[LatLon], color: Color) {
    for (x1, y1, x2, y2) in visible_segments(globe, points) {
        ctx.draw(&CanvasLine { x1, y1, x2, y2, color });
    }
}

fn paint_graticule(ctx: &mut Context, globe: &Globe, color: Color) {
    for lat in (-90 + GRID_STEP..90).step_by(GRID_STEP as usize) {
        let ring: Vec<LatLon> = (-180..=180)
            .step_by(GRID_SAMPLE as usize)
            .map(|lon| LatLon::new(f64::from(lat), f64::from(lon)))
            .collect();
        paint_path(ctx, globe, &ring, color);
    }
    for lon in (-180..180).step_by(GRID_STEP as usize) {
        let meridian: Vec<LatLon> = (-90..=90)
            .step_by(GRID_SAMPLE as usize)
            .map(|lat| LatLon::new(f64::from(lat), f64::from(lon)))
            .collect();
        paint_path(ctx, globe, &meridian, color);
    }
}

fn draw_globe(f: &mut Frame, area: Rect, app: &mut App) {
    let overlay = app.viewer.interaction().population_map_active();
    let title = if overlay { " Globe · population overlay " } else { " Globe " };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let viewport = Viewport::fit(inner);
    app.viewport = Some(viewport);

    let globe = app.globe();
    let scene = app.viewer.scene();
    let grid_color = if overlay { Color::Rgb(160, 90, 40) } else { Color::DarkGray };

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds(viewport.x_bounds)
        .y_bounds(viewport.y_bounds)
        .paint(|ctx| {
            ctx.draw(&Circle { x: 0.0, y: 0.0, radius: 1.0, color: Color::Blue });
            paint_graticule(ctx, &globe, grid_color);
            ctx.layer();

            if let Some(trail) = scene.trail_line() {
                paint_path(ctx, &globe, &trail.points, Color::White);
            }
            if let Some(spotbeam) = scene.spotbeam() {
                paint_path(ctx, &globe, &spotbeam.outline, Color::Yellow);
            }
            if let Some((x, y)) = scene.pin().and_then(|pin| globe.project(pin.at)) {
                ctx.print(x, y, Span::styled("✚", Style::default().fg(Color::Red)));
            }
            if let Some((x, y)) = scene.satellite().and_then(|sat| globe.project(sat)) {
                let marker = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
                ctx.print(x, y, Span::styled("●", marker));
            }
        });

    f.render_widget(canvas, inner);
}

fn control_span(app: &App, control: Control, key: char) -> Line<'static> {
    let busy = app.viewer.interaction().is_busy(control);
    let style = if busy {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };
    Line::from(vec![
        Span::styled(format!("[{}] ", key), Style::default().fg(Color::DarkGray)),
        Span::styled(app.viewer.interaction().label(control).to_string(), style),
    ])
}

fn draw_side_panel(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),  // Time
            Constraint::Length(6),  // Coverage
            Constraint::Min(8),     // Economics
            Constraint::Length(5),  // Population
        ])
        .split(area);

    let scene = app.viewer.scene();
    let time = Paragraph::new(vec![
        Line::from(Span::styled(
            scene.time_display().to_string(),
            Style::default().fg(Color::White),
        )),
        Line::from(Span::styled(
            scene.utc_display().to_string(),
            Style::default().fg(Color::Gray),
        )),
    ])
    .block(Block::default()
        .title(" Time ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green)));
    f.render_widget(time, chunks[0]);

    let interaction = app.viewer.interaction();
    let coverage = Paragraph::new(vec![
        control_span(app, Control::CoverageScore, 's'),
        control_span(app, Control::CoverageArea, 'a'),
        Line::from(""),
        Line::from(Span::styled(
            interaction.score_display().to_string(),
            Style::default().fg(Color::Yellow),
        )),
    ])
    .block(Block::default()
        .title(" Coverage ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow)));
    f.render_widget(coverage, chunks[1]);

    let mut economics = vec![
        Line::from(vec![
            Span::raw("Adoption rate [ ]: "),
            Span::styled(
                format!("{}%", interaction.adoption_rate_percent()),
                Style::default().fg(Color::Cyan),
            ),
        ]),
        Line::from(vec![
            Span::raw("ARPU { }:          "),
            Span::styled(
                format!("${}", interaction.arpu_monthly()),
                Style::default().fg(Color::Cyan),
            ),
        ]),
        control_span(app, Control::Economics, 'e'),
    ];
    economics.extend(interaction.economic_display().lines().map(|l| Line::from(l.to_string())));
    let economics = Paragraph::new(economics)
        .block(Block::default()
            .title(" Economics ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));
    f.render_widget(economics, chunks[2]);

    let mut population = vec![control_span(app, Control::PopulationMap, 'p')];
    match interaction.tooltip() {
        Some(tooltip) => {
            population.extend(tooltip.lines().into_iter().map(Line::from));
        }
        None if interaction.population_map_active() => {
            population.push(Line::from(Span::styled(
                "Hover or click the globe",
                Style::default().fg(Color::DarkGray),
            )));
        }
        None => {}
    }
    let population = Paragraph::new(population)
        .block(Block::default()
            .title(" Population ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));
    f.render_widget(population, chunks[3]);
}

fn draw_help(f: &mut Frame, area: Rect, app: &App) {
    let text = match app.mode {
        InputMode::Normal => {
            "space play/pause | r/f direction | +/- speed | arrows rotate | n pin | t TLE | q quit"
        }
        InputMode::EditingPin { .. } => "Tab switch field | Enter place pin | Esc cancel",
        InputMode::EditingTle { .. } => "Paste or type 3 lines | Ctrl+S load | Esc cancel",
    };
    f.render_widget(Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray))), area);
}

/// Rect of the given size centered in `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn draw_pin_editor(f: &mut Frame, lat: &str, lon: &str, field: PinField) {
    let area = centered(f.area(), 40, 5);
    let field_style = |active: bool| {
        if active {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        }
    };
    let editor = Paragraph::new(vec![
        Line::from(vec![
            Span::raw("Latitude:  "),
            Span::styled(format!("{}_", lat), field_style(field == PinField::Lat)),
        ]),
        Line::from(vec![
            Span::raw("Longitude: "),
            Span::styled(format!("{}_", lon), field_style(field == PinField::Lon)),
        ]),
    ])
    .block(Block::default()
        .title(" Pinpoint Location ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red)));
    f.render_widget(Clear, area);
    f.render_widget(editor, area);
}

fn draw_tle_editor(f: &mut Frame, text: &str) {
    let area = centered(f.area(), 76, 7);
    let lines: Vec<Line> = text.split('\n').map(|l| Line::from(l.to_string())).collect();
    let editor = Paragraph::new(lines)
        .block(Block::default()
            .title(" Load TLE (name, line 1, line 2) ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));
    f.render_widget(Clear, area);
    f.render_widget(editor, area);
}

fn draw_notice(f: &mut Frame, notice: &str) {
    let area = centered(f.area(), 60, 6);
    let body = Paragraph::new(vec![
        Line::from(notice.to_string()),
        Line::from(""),
        Line::from(Span::styled("Press Enter to continue", Style::default().fg(Color::DarkGray))),
    ])
    .wrap(Wrap { trim: true })
    .block(Block::default()
        .title(" Notice ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow)));
    f.render_widget(Clear, area);
    f.render_widget(body, area);
}
