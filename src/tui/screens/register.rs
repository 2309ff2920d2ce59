//! Register screen. Headerless; the first thing a new user sees.

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::navigator::Route;
use crate::tui::app::Action;
use crate::tui::widgets::render_placeholder;

pub struct RegisterScreen;

impl RegisterScreen {
    pub fn on_key(&self, code: KeyCode) -> Option<Action> {
        match code {
            KeyCode::Enter => Route::Register.next().map(Action::Navigate),
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
            Some("Register"),
            &["Create an account to post and answer help requests."],
            "Continue",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_goes_to_verify_email() {
        assert!(matches!(
            RegisterScreen.on_key(KeyCode::Enter),
            Some(Action::Navigate(Route::VerifyEmail))
        ));
        assert!(RegisterScreen.on_key(KeyCode::Char('x')).is_none());
    }
}
