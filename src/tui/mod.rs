//! Ratatui-based terminal UI.
//!
//! Three panels of sliders (general, wind, advanced), a prediction area, and an
//! optional sensitivity chart for the selected input. Predictions only run when
//! the user asks for one.

use std::io;
use std::time::Duration;

use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::pipeline::{self, SweepPoint};
use crate::domain::{FieldGroup, FieldSpec, InputField, InputValues};
use crate::error::AppError;
use crate::models::Predictor;
use crate::report::format_result;

mod plotters_chart;

use plotters_chart::SweepChart;

/// Number of points in a sensitivity sweep.
const SWEEP_POINTS: usize = 121;

/// Slider increments moved by PgUp/PgDn.
const COARSE_STEPS: i32 = 10;

/// Start the TUI with the given model and starting values.
pub fn run(predictor: &dyn Predictor, inputs: InputValues) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(predictor, inputs);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Last prediction shown in the output area.
struct Outcome {
    message: String,
    ok: bool,
    at: String,
}

/// Predicted output across one input's range.
struct Sweep {
    field: InputField,
    points: Vec<SweepPoint>,
}

struct App<'a> {
    predictor: &'a dyn Predictor,
    model_desc: String,
    inputs: InputValues,
    selected: usize,
    /// Typed value while editing the selected field.
    edit_buffer: Option<String>,
    status: String,
    outcome: Option<Outcome>,
    sweep: Option<Sweep>,
}

impl<'a> App<'a> {
    fn new(predictor: &'a dyn Predictor, inputs: InputValues) -> Self {
        Self {
            model_desc: predictor.describe(),
            predictor,
            inputs,
            selected: 0,
            edit_buffer: None,
            status: "Adjust the inputs, then press Enter to predict.".to_string(),
            outcome: None,
            sweep: None,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn selected_field(&self) -> InputField {
        InputField::ALL[self.selected]
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.edit_buffer.is_some() {
            self.handle_edit(code);
            return false;
        }

        let field = self.selected_field();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < InputField::ALL.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Tab => self.jump_group(1),
            KeyCode::BackTab => self.jump_group(-1),
            KeyCode::Left => self.step_selected(-1),
            KeyCode::Right => self.step_selected(1),
            KeyCode::PageDown => self.step_selected(-COARSE_STEPS),
            KeyCode::PageUp => self.step_selected(COARSE_STEPS),
            KeyCode::Home => {
                self.inputs.set_to_min(field);
                self.input_changed(field);
            }
            KeyCode::End => {
                self.inputs.set_to_max(field);
                self.input_changed(field);
            }
            KeyCode::Char('0') => {
                self.inputs.reset(field);
                self.input_changed(field);
            }
            KeyCode::Char('R') => {
                self.inputs = InputValues::default();
                self.outcome = None;
                self.sweep = None;
                self.status = "All inputs reset to defaults.".to_string();
            }
            KeyCode::Char('e') => {
                self.edit_buffer = Some(String::new());
                self.status = format!(
                    "Editing {} [{} .. {}]. Enter to apply, Esc to cancel.",
                    field.key(),
                    field.spec().format_value(field.spec().min),
                    field.spec().format_value(field.spec().max),
                );
            }
            KeyCode::Enter | KeyCode::Char('p') => self.predict(),
            KeyCode::Char('s') => self.run_sweep(),
            _ => {}
        }

        false
    }

    fn handle_edit(&mut self, code: KeyCode) {
        let Some(buffer) = self.edit_buffer.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.edit_buffer = None;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                let raw = std::mem::take(buffer);
                self.edit_buffer = None;
                let field = self.selected_field();
                match self.inputs.set_from_str(field, &raw) {
                    Ok(()) => self.input_changed(field),
                    Err(err) => self.status = err.to_string(),
                }
            }
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => {
                if c.is_ascii_digit() || c == '.' || c == '-' {
                    buffer.push(c);
                }
            }
            _ => {}
        }
    }

    fn step_selected(&mut self, steps: i32) {
        let field = self.selected_field();
        self.inputs.step(field, steps);
        self.input_changed(field);
    }

    /// Move the selection to the first field of the next/previous panel.
    fn jump_group(&mut self, delta: isize) {
        let current = self.selected_field().spec().group;
        let idx = FieldGroup::ALL.iter().position(|g| *g == current).unwrap_or(0) as isize;
        let n = FieldGroup::ALL.len() as isize;
        let target = FieldGroup::ALL[(idx + delta).rem_euclid(n) as usize];
        if let Some(first) = target.fields().next() {
            self.selected = first.index();
        }
    }

    /// A shown prediction no longer matches the form once an input moves.
    fn input_changed(&mut self, field: InputField) {
        self.outcome = None;
        if self.sweep.as_ref().is_some_and(|s| s.field != field) {
            self.sweep = None;
        }
        let spec = field.spec();
        self.status = format!("{}: {}", spec.key, spec.format_value(self.inputs.get(field)));
    }

    fn predict(&mut self) {
        let result = pipeline::predict(self.predictor, &self.inputs);
        let at = Local::now().format("%H:%M:%S").to_string();
        self.status = match &result {
            Ok(_) => format!("Predicted at {at}."),
            Err(err) if err.is_retryable() => "Prediction failed; adjust inputs and retry.".to_string(),
            Err(_) => "Prediction failed; the loaded model does not match this form.".to_string(),
        };
        self.outcome = Some(Outcome {
            message: format_result(&result),
            ok: result.is_ok(),
            at,
        });
    }

    fn run_sweep(&mut self) {
        let field = self.selected_field();
        match pipeline::sweep(self.predictor, &self.inputs, field, SWEEP_POINTS) {
            Ok(points) => {
                self.status = format!("Sweep: {} across its range.", field.key());
                self.sweep = Some(Sweep { field, points });
            }
            Err(err) => {
                self.sweep = None;
                self.status = crate::report::format_prediction_error(&err);
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(7),
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_inputs(frame, chunks[1]);
        self.draw_outcome(frame, chunks[2]);
        self.draw_chart(frame, chunks[3]);
        self.draw_footer(frame, chunks[4]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let lines = vec![
            Line::from(Span::styled(
                "Solar Power Prediction",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("Predict solar power output (kW) from weather readings | model: {}", self.model_desc),
                Style::default().fg(Color::Gray),
            )),
        ];
        let p = Paragraph::new(Text::from(lines))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_inputs(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(area);

        let selected = self.selected_field();
        for (group, rect) in FieldGroup::ALL.into_iter().zip(columns.iter()) {
            let fields: Vec<InputField> = group.fields().collect();
            let inner_width = rect.width.saturating_sub(4) as usize;
            let items: Vec<ListItem> = fields
                .iter()
                .map(|&field| {
                    let editing = field == selected && self.edit_buffer.is_some();
                    ListItem::new(self.field_line(field, inner_width, editing))
                })
                .collect();

            let list = List::new(items)
                .block(Block::default().title(group.title()).borders(Borders::ALL))
                .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
                .highlight_symbol("» ");

            let mut state = ListState::default();
            state.select(fields.iter().position(|f| *f == selected));
            frame.render_stateful_widget(list, *rect, &mut state);
        }
    }

    fn field_line(&self, field: InputField, width: usize, editing: bool) -> String {
        let spec = field.spec();
        let value = if editing {
            format!("{}_", self.edit_buffer.as_deref().unwrap_or(""))
        } else {
            spec.format_value(self.inputs.get(field))
        };
        let bar = slider_bar(spec, self.inputs.get(field), 8);
        let label_width = width.saturating_sub(value.len() + bar.chars().count() + 2);
        let label: String = spec.label.chars().take(label_width).collect();
        format!("{label:<label_width$} {bar} {value}")
    }

    fn draw_outcome(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Prediction").borders(Borders::ALL);
        let line = match &self.outcome {
            Some(outcome) => {
                let color = if outcome.ok { Color::Green } else { Color::Red };
                Line::from(vec![
                    Span::styled(
                        outcome.message.clone(),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(format!("  ({})", outcome.at), Style::default().fg(Color::Gray)),
                ])
            }
            None => Line::from(Span::styled(
                "Press Enter to predict solar power.",
                Style::default().fg(Color::Gray),
            )),
        };
        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = match &self.sweep {
            Some(sweep) => format!("Sensitivity: {}", sweep.field.spec().display_label()),
            None => "Sensitivity".to_string(),
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(sweep) = &self.sweep else {
            let msg = Paragraph::new("Press s to sweep the selected input across its range.")
                .style(Style::default().fg(Color::Gray));
            frame.render_widget(msg, inner);
            return;
        };

        let spec = sweep.field.spec();
        let current = self.inputs.get(sweep.field);
        let widget = SweepChart {
            curve: &sweep.points,
            marker: interpolate(&sweep.points, current).map(|y| (current, y)),
            x_bounds: [spec.min, spec.max],
            y_bounds: y_bounds(&sweep.points),
            x_label: spec.display_label(),
            y_label: "kW",
        };
        frame.render_widget(widget, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  Tab panel  ←/→ adjust  PgUp/PgDn ×10  Home/End min/max  e edit  0 reset  R reset all  Enter predict  s sweep  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Text slider showing where `value` sits in the field's range.
fn slider_bar(spec: &FieldSpec, value: f64, width: usize) -> String {
    let width = width.max(2);
    let span = spec.max - spec.min;
    let u = if span > 0.0 {
        ((value - spec.min) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (u * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Linear interpolation on a sweep sorted by x.
fn interpolate(points: &[SweepPoint], x: f64) -> Option<f64> {
    let first = points.first()?;
    let last = points.last()?;
    if x < first.0 || x > last.0 {
        return None;
    }
    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        if x >= x0 && x <= x1 {
            if x1 == x0 {
                return Some(y0);
            }
            let u = (x - x0) / (x1 - x0);
            return Some(y0 + u * (y1 - y0));
        }
    }
    Some(first.1)
}

/// Padded y-range of a sweep; falls back to `[0, 1]` when degenerate.
fn y_bounds(points: &[SweepPoint]) -> [f64; 2] {
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in points {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if !y_min.is_finite() || !y_max.is_finite() {
        return [0.0, 1.0];
    }
    if y_max <= y_min {
        // Flat curve: give it some room around the constant value.
        let pad = (y_min.abs() * 0.05).max(1.0);
        return [y_min - pad, y_max + pad];
    }

    let pad = ((y_max - y_min) * 0.05).max(1e-12);
    [y_min - pad, y_max + pad]
}
