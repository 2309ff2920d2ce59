//! Application loop and screen routing.

use std::collections::VecDeque;
use std::io;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::layout::{Constraint, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Padding, Paragraph, Wrap};
use ratatui::{DefaultTerminal, Frame};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::config::{self, Config};
use crate::location::{LocationProvider, LocationTracker, PermissionPrompt, PermissionStatus};
use crate::navigator::{Navigator, Route};

use super::screens::{HelpRequestScreen, MapScreen, RegisterScreen, VerifyEmailScreen};
use super::widgets::{button, centered, highlight, muted, normal};

/// How long to wait for input before pumping location results.
const TICK: Duration = Duration::from_millis(100);

/// What a screen wants to happen after a key press.
pub enum Action {
    Navigate(Route),
}

/// The mounted screen. Replaced whenever the top route changes.
enum Screen {
    Register(RegisterScreen),
    VerifyEmail(VerifyEmailScreen),
    HelpRequest(HelpRequestScreen),
    Map(Box<MapScreen>),
}

/// Something on top of the screen that takes every key until answered.
enum Modal {
    Permission(PermissionPrompt),
    Alert(String),
}

/// Everything a screen may need to mount.
struct Session {
    provider: Arc<dyn LocationProvider>,
    runtime: Handle,
    timeout: Option<Duration>,
    latitude_delta: f64,
    longitude_delta: f64,
}

pub struct App {
    navigator: Navigator,
    screen: Screen,
    session: Session,
    prompts: mpsc::UnboundedReceiver<PermissionPrompt>,
    modal: Option<Modal>,
    alerts: VecDeque<String>,
}

/// Runs the TUI event loop until the user quits.
pub fn run(mut app: App) -> io::Result<()> {
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut app);
    ratatui::restore();
    tracing::info!(route = %app.route(), "quit");
    result
}

fn event_loop(terminal: &mut DefaultTerminal, app: &mut App) -> io::Result<()> {
    loop {
        app.on_tick();
        terminal.draw(|frame| app.render(frame))?;

        if event::poll(TICK)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && app.on_key(key.code).is_break()
        {
            return Ok(());
        }
    }
}

impl App {
    /// Build the session's provider and mount the configured first screen.
    pub fn new(config: &Config, runtime: Handle) -> config::Result<Self> {
        let (prompt_tx, prompts) = mpsc::unbounded_channel();
        let session = Session {
            provider: config.location.provider(Some(prompt_tx))?,
            runtime,
            timeout: config.location.timeout(),
            latitude_delta: config.map.latitude_delta,
            longitude_delta: config.map.longitude_delta,
        };
        let navigator = Navigator::new(config.initial_route);
        let screen = Screen::mount(navigator.current(), &session);

        Ok(Self {
            navigator,
            screen,
            session,
            prompts,
            modal: None,
            alerts: VecDeque::new(),
        })
    }

    pub fn route(&self) -> Route {
        self.navigator.current()
    }

    /// Pull in permission prompts and location results.
    pub fn on_tick(&mut self) {
        while self.modal.is_none()
            && let Ok(prompt) = self.prompts.try_recv()
        {
            // Raised by a map screen that has since been unmounted.
            if prompt.is_abandoned() {
                tracing::debug!("dropping abandoned permission prompt");
                continue;
            }
            self.modal = Some(Modal::Permission(prompt));
        }

        if let Screen::Map(map) = &mut self.screen
            && let Some(message) = map.on_tick()
        {
            self.alerts.push_back(message);
        }

        if self.modal.is_none()
            && let Some(message) = self.alerts.pop_front()
        {
            self.modal = Some(Modal::Alert(message));
        }
    }

    pub fn on_key(&mut self, code: KeyCode) -> ControlFlow<()> {
        if let Some(modal) = self.modal.take() {
            self.modal = modal.on_key(code);
            return ControlFlow::Continue(());
        }

        match code {
            KeyCode::Char('q') => return ControlFlow::Break(()),
            KeyCode::Esc => {
                if self.navigator.back() {
                    self.remount();
                }
            }
            _ => {
                if let Some(Action::Navigate(route)) = self.screen.on_key(code)
                    && self.navigator.navigate(route)
                {
                    self.remount();
                }
            }
        }
        ControlFlow::Continue(())
    }

    pub fn render(&self, frame: &mut Frame) {
        let title = self.navigator.current().title();
        let [header, body, help] = Layout::vertical([
            Constraint::Length(if title.is_some() { 3 } else { 0 }),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        if let Some(title) = title {
            let mut spans = Vec::new();
            if self.navigator.can_go_back() {
                spans.push(Span::styled("‹ ", muted()));
            }
            spans.push(Span::styled(title, highlight()));
            let header_text = Paragraph::new(Line::from(spans))
                .block(Block::default().padding(Padding::new(2, 0, 1, 0)));
            frame.render_widget(header_text, header);
        }

        self.screen.render(frame, body);

        let help_text = Paragraph::new(Line::from(Span::styled(self.help(), muted())));
        frame.render_widget(help_text, help);

        if let Some(modal) = &self.modal {
            modal.render(frame);
        }
    }

    /// The help line: the screen's keys, then back (when there is
    /// somewhere to go back to) and quit.
    fn help(&self) -> String {
        let mut keys = Vec::new();
        let screen = self.screen.help();
        if !screen.is_empty() {
            keys.push(screen);
        }
        if self.navigator.can_go_back() {
            keys.push("esc back");
        }
        keys.push("q quit");
        format!(" {}", keys.join("  "))
    }

    /// Mount the screen for the current route. The old screen is dropped,
    /// along with any location request it had in flight.
    fn remount(&mut self) {
        let route = self.navigator.current();
        tracing::info!(%route, stack = ?self.navigator.stack(), "screen mounted");
        self.screen = Screen::mount(route, &self.session);
    }
}

impl Screen {
    fn mount(route: Route, session: &Session) -> Self {
        match route {
            Route::Register => Self::Register(RegisterScreen),
            Route::VerifyEmail => Self::VerifyEmail(VerifyEmailScreen),
            Route::HelpRequest => Self::HelpRequest(HelpRequestScreen),
            Route::Map => {
                let tracker = LocationTracker::new(
                    Arc::clone(&session.provider),
                    session.runtime.clone(),
                    session.timeout,
                );
                Self::Map(Box::new(MapScreen::new(
                    tracker,
                    session.latitude_delta,
                    session.longitude_delta,
                )))
            }
        }
    }

    fn on_key(&mut self, code: KeyCode) -> Option<Action> {
        match self {
            Self::Register(s) => s.on_key(code),
            Self::VerifyEmail(s) => s.on_key(code),
            Self::HelpRequest(s) => s.on_key(code),
            Self::Map(s) => s.on_key(code),
        }
    }

    fn help(&self) -> &'static str {
        match self {
            Self::Register(s) => s.help(),
            Self::VerifyEmail(s) => s.help(),
            Self::HelpRequest(s) => s.help(),
            Self::Map(s) => s.help(),
        }
    }

    fn render(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        match self {
            Self::Register(s) => s.render(frame, area),
            Self::VerifyEmail(s) => s.render(frame, area),
            Self::HelpRequest(s) => s.render(frame, area),
            Self::Map(s) => s.render(frame, area),
        }
    }
}

impl Modal {
    /// Handle a key. Returns the modal if it is still open.
    fn on_key(self, code: KeyCode) -> Option<Self> {
        match (self, code) {
            (Self::Permission(prompt), KeyCode::Char('y')) => {
                prompt.answer(PermissionStatus::Granted);
                None
            }
            (Self::Permission(prompt), KeyCode::Char('n') | KeyCode::Esc) => {
                prompt.answer(PermissionStatus::Denied);
                None
            }
            (Self::Alert(_), KeyCode::Enter | KeyCode::Esc) => None,
            (modal, _) => Some(modal),
        }
    }

    fn render(&self, frame: &mut Frame) {
        let (title, lines) = match self {
            Self::Permission(_) => (
                " Location ",
                vec![
                    Line::from(Span::styled(
                        "Allow Helpline to access this device's location?",
                        normal(),
                    )),
                    Line::default(),
                    Line::from(vec![
                        Span::styled("y", highlight()),
                        Span::styled(" allow   ", muted()),
                        Span::styled("n", highlight()),
                        Span::styled(" don't allow", muted()),
                    ]),
                ],
            ),
            Self::Alert(message) => (
                " Notice ",
                vec![
                    Line::from(Span::styled(message.clone(), normal())),
                    Line::default(),
                    button("OK"),
                ],
            ),
        };

        let area = centered(frame.area(), 56, 7);
        let dialog = Paragraph::new(lines)
            .centered()
            .wrap(Wrap { trim: true })
            .block(
                Block::bordered()
                    .title(title)
                    .border_style(muted())
                    .padding(Padding::uniform(1)),
            );
        frame.render_widget(Clear, area);
        frame.render_widget(dialog, area);
    }
}
