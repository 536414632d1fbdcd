//! Terminal application state and input handling

use crate::domain::clock::Direction;
use crate::services::viewer::Viewer;
use crate::ui::projection::{Camera, Globe, Viewport};
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use std::time::Instant;

/// Speed steps offered by `+` and `-`
pub const SPEED_PRESETS: [f64; 9] = [1.0, 10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0];
/// Camera step per arrow key press (radians)
const CAMERA_STEP: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinField {
    Lat,
    Lon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    EditingPin { lat: String, lon: String, field: PinField },
    EditingTle { text: String },
}

pub struct App {
    pub viewer: Viewer,
    pub camera: Camera,
    pub mode: InputMode,
    /// Where the globe was last drawn, for mouse picking
    pub viewport: Option<Viewport>,
    pub should_quit: bool,
}

impl App {
    pub fn new(viewer: Viewer) -> Self {
        Self {
            viewer,
            camera: Camera::default(),
            mode: InputMode::Normal,
            viewport: None,
            should_quit: false,
        }
    }

    /// Per-frame update: camera easing and the simulation step
    pub fn on_frame(&mut self, now: Instant) {
        self.camera.update();
        self.viewer.on_frame(now);
    }

    pub fn globe(&self) -> Globe {
        Globe::new(&self.camera, self.viewer.scene().globe_rotation())
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Paste(text) => {
                if let InputMode::EditingTle { text: buffer } = &mut self.mode {
                    buffer.push_str(&text.replace("\r\n", "\n").replace('\r', "\n"));
                }
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        // A notice blocks everything else until dismissed
        if self.viewer.interaction().notice().is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.viewer.interaction_mut().dismiss_notice();
            }
            return;
        }

        match self.mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::EditingPin { .. } => self.handle_pin_key(key),
            InputMode::EditingTle { .. } => self.handle_tle_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(' ') => {
                self.viewer.toggle_play();
            }
            KeyCode::Char('r') => self.viewer.set_direction(Direction::Reverse),
            KeyCode::Char('f') => self.viewer.set_direction(Direction::Forward),
            KeyCode::Char('+') | KeyCode::Char('=') => self.step_speed(1),
            KeyCode::Char('-') => self.step_speed(-1),
            KeyCode::Char('p') => self.viewer.interaction_mut().toggle_population_map(),
            KeyCode::Char('s') => self.viewer.interaction_mut().request_coverage_score(),
            KeyCode::Char('a') => self.viewer.interaction_mut().request_coverage_area(),
            KeyCode::Char('e') => self.viewer.interaction_mut().request_economics(),
            KeyCode::Char('[') => self.viewer.interaction_mut().adjust_adoption_rate(-1),
            KeyCode::Char(']') => self.viewer.interaction_mut().adjust_adoption_rate(1),
            KeyCode::Char('{') => self.viewer.interaction_mut().adjust_arpu(-5),
            KeyCode::Char('}') => self.viewer.interaction_mut().adjust_arpu(5),
            KeyCode::Char('n') => {
                self.mode = InputMode::EditingPin {
                    lat: String::new(),
                    lon: String::new(),
                    field: PinField::Lat,
                }
            }
            KeyCode::Char('t') => self.mode = InputMode::EditingTle { text: String::new() },
            KeyCode::Left => self.camera.rotate(-CAMERA_STEP, 0.0),
            KeyCode::Right => self.camera.rotate(CAMERA_STEP, 0.0),
            KeyCode::Up => self.camera.rotate(0.0, CAMERA_STEP),
            KeyCode::Down => self.camera.rotate(0.0, -CAMERA_STEP),
            _ => {}
        }
    }

    fn handle_pin_key(&mut self, key: KeyEvent) {
        let InputMode::EditingPin { lat, lon, field } = &mut self.mode else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.mode = InputMode::Normal,
            KeyCode::Tab | KeyCode::BackTab => {
                *field = match field {
                    PinField::Lat => PinField::Lon,
                    PinField::Lon => PinField::Lat,
                }
            }
            KeyCode::Enter => {
                let (lat, lon) = (lat.clone(), lon.clone());
                if self.viewer.place_pin(&lat, &lon) {
                    self.mode = InputMode::Normal;
                }
            }
            KeyCode::Backspace => {
                match field {
                    PinField::Lat => lat.pop(),
                    PinField::Lon => lon.pop(),
                };
            }
            KeyCode::Char(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') => {
                match field {
                    PinField::Lat => lat.push(c),
                    PinField::Lon => lon.push(c),
                }
            }
            _ => {}
        }
    }

    fn handle_tle_key(&mut self, key: KeyEvent) {
        let InputMode::EditingTle { text } = &mut self.mode else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.mode = InputMode::Normal,
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                let text = text.clone();
                self.viewer.interaction_mut().submit_tle(&text);
                // Stay in the editor when the input was rejected
                if self.viewer.interaction().notice().is_none() {
                    self.mode = InputMode::Normal;
                }
            }
            KeyCode::Enter => text.push('\n'),
            KeyCode::Backspace => {
                text.pop();
            }
            KeyCode::Char(c) => text.push(c),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.mode != InputMode::Normal || self.viewer.interaction().notice().is_some() {
            return;
        }
        let Some(viewport) = self.viewport else {
            return;
        };
        let point = viewport.point_at(&self.globe(), mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Moved => self.viewer.interaction_mut().hover(point),
            MouseEventKind::Down(MouseButton::Left) => self.viewer.interaction_mut().click(point),
            _ => {}
        }
    }

    /// Move to the neighbouring speed preset
    fn step_speed(&mut self, step: isize) {
        let current = self.viewer.clock().speed_multiplier();
        let nearest = SPEED_PRESETS
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (*a - current).abs().total_cmp(&(*b - current).abs()))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let next = nearest.saturating_add_signed(step).min(SPEED_PRESETS.len() - 1);
        self.viewer.set_speed(SPEED_PRESETS[next]);
    }
}
