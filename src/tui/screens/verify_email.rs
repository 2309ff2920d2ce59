//! Verify Email screen.

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::navigator::Route;
use crate::tui::app::Action;
use crate::tui::widgets::render_placeholder;

pub struct VerifyEmailScreen;

impl VerifyEmailScreen {
    pub fn on_key(&self, code: KeyCode) -> Option<Action> {
        match code {
            KeyCode::Enter => Route::VerifyEmail.next().map(Action::Navigate),
            _ => None,
        }
    }

    pub fn help(&self) -> &'static str {
        "⏎ continue"
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        render_placeholder(
            frame,
            area,
            None,
            &[
                "We sent a verification link to your email address.",
                "Open it, then continue.",
            ],
            "Continue",
        );
    }
}
