//! Post Help Request screen. Its one action opens the map.

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::navigator::Route;
use crate::tui::app::Action;
use crate::tui::widgets::render_placeholder;

pub struct HelpRequestScreen;

impl HelpRequestScreen {
    pub fn on_key(&self, code: KeyCode) -> Option<Action> {
        match code {
            KeyCode::Enter => Some(Action::Navigate(Route::Map)),
            _ => None,
        }
    }

    pub fn help(&self) -> &'static str {
        "⏎ track location"
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        render_placeholder(
            frame,
            area,
            Some("Post Help Request"),
            &[],
            "Track Location",
        );
    }
}
