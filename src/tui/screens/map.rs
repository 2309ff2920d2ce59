//! Track Location screen: the user's position on a map.
//!
//! Mounting the screen starts the location flow. Nothing is drawn on
//! the canvas until the first fix arrives. Unmounting drops the tracker,
//! which abandons any request still in flight.

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::location::LocationTracker;
use crate::location::flow::FlowState;
use crate::map::MapRenderer;
use crate::model::Fix;
use crate::tui::app::Action;
use crate::tui::canvas::CanvasMap;
use crate::tui::widgets::{button, centered, highlight, muted, normal};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub struct MapScreen {
    tracker: LocationTracker,
    canvas: CanvasMap,
    latitude_delta: f64,
    longitude_delta: f64,
    /// Last non-blocking notice, cleared by the next refresh.
    status: Option<String>,
    ticks: usize,
}

impl MapScreen {
    /// Mount the screen and start asking for the user's position.
    pub fn new(mut tracker: LocationTracker, latitude_delta: f64, longitude_delta: f64) -> Self {
        tracker.start();
        Self {
            tracker,
            canvas: CanvasMap::new(),
            latitude_delta,
            longitude_delta,
            status: None,
            ticks: 0,
        }
    }

    pub fn state(&self) -> &FlowState {
        self.tracker.state()
    }

    /// Apply arrived results. Returns a blocking message the app must show.
    pub fn on_tick(&mut self) -> Option<String> {
        self.ticks = self.ticks.wrapping_add(1);
        if self.tracker.pump() {
            self.sync_canvas();
        }

        let mut blocking = None;
        while let Some(notice) = self.tracker.take_notice() {
            if notice.is_blocking() {
                blocking = Some(notice.message());
            } else {
                tracing::warn!(message = %notice.message(), "refresh failed");
                self.status = Some(notice.message());
            }
        }
        blocking
    }

    pub fn on_key(&mut self, code: KeyCode) -> Option<Action> {
        match code {
            KeyCode::Enter | KeyCode::Char('r') => {
                self.refresh();
                None
            }
            _ => None,
        }
    }

    /// Keys this screen handles, empty while it handles none.
    pub fn help(&self) -> &'static str {
        match self.state() {
            FlowState::Ready { .. } => "r refresh",
            FlowState::Unavailable(_) => "r retry",
            _ => "",
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        match self.state() {
            FlowState::Initializing | FlowState::Loading => self.render_loading(frame, area),
            FlowState::PermissionDenied => {
                let text = Paragraph::new(Line::from(Span::styled(
                    "Location access is off.",
                    muted(),
                )))
                .centered();
                frame.render_widget(text, centered(area, area.width, 1));
            }
            FlowState::Unavailable(error) => {
                let text = Paragraph::new(vec![
                    Line::from(Span::styled(
                        format!("Location unavailable: {error}"),
                        normal(),
                    )),
                    Line::default(),
                    button("Retry"),
                ])
                .centered();
                frame.render_widget(text, centered(area, area.width, 3));
            }
            FlowState::Ready { fix, refreshing } => {
                self.render_ready(frame, area, fix, *refreshing);
            }
        }
    }

    fn refresh(&mut self) {
        if matches!(
            self.state(),
            FlowState::Ready { .. } | FlowState::Unavailable(_)
        ) {
            self.status = None;
            self.tracker.refresh();
        }
    }

    fn sync_canvas(&mut self) {
        let Some(view) = self
            .tracker
            .flow()
            .map_view(self.latitude_delta, self.longitude_delta)
        else {
            return;
        };
        if self.canvas.view() == Some(&view) {
            return;
        }
        if let Err(e) = self.canvas.show(&view) {
            tracing::warn!(error = %e, "map render failed");
        }
    }

    fn spinner(&self) -> &'static str {
        SPINNER[self.ticks % SPINNER.len()]
    }

    fn render_loading(&self, frame: &mut Frame, area: Rect) {
        let text = Paragraph::new(Line::from(vec![
            Span::styled(self.spinner(), highlight()),
            Span::styled(" Loading map...", normal()),
        ]))
        .centered();
        frame.render_widget(text, centered(area, area.width, 1));
    }

    fn render_ready(&self, frame: &mut Frame, area: Rect, fix: &Fix, refreshing: bool) {
        let [map_area, info_area, status_area] = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(area);

        self.canvas.render(frame, map_area);

        let mut position = vec![Span::styled(fix.coordinate.to_string(), normal())];
        if let Some(accuracy) = fix.accuracy_m {
            position.push(Span::styled(format!("  ±{accuracy:.0} m"), muted()));
        }
        position.push(Span::styled(
            format!("  {}", fix.timestamp.strftime("%H:%M:%S UTC")),
            muted(),
        ));

        let mut action = button("Refresh Location");
        if refreshing {
            action.push_span(Span::styled(format!("  {}", self.spinner()), highlight()));
        }

        let info = Paragraph::new(vec![Line::from(position), Line::default(), action]).centered();
        frame.render_widget(info, info_area);

        if let Some(status) = &self.status {
            let line = Paragraph::new(Line::from(Span::styled(
                status.clone(),
                Style::default().fg(Color::Yellow),
            )))
            .centered();
            frame.render_widget(line, status_area);
        }
    }
}
