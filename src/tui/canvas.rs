//! Map renderer drawn on a ratatui canvas.

use std::io;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::Block;
use ratatui::widgets::canvas::{Canvas, Map, MapResolution};

use crate::map::MapRenderer;
use crate::model::MapView;

use super::widgets::muted;

/// Holds the last view it was shown and draws it each frame.
#[derive(Debug, Default)]
pub struct CanvasMap {
    view: Option<MapView>,
}

impl CanvasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> Option<&MapView> {
        self.view.as_ref()
    }

    /// Draw the current view. Draws nothing before the first `show`.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(view) = &self.view else {
            return;
        };

        let canvas = Canvas::default()
            .block(Block::bordered().border_style(muted()))
            .marker(symbols::Marker::Braille)
            .x_bounds(view.region.x_bounds())
            .y_bounds(view.region.y_bounds())
            .paint(|ctx| {
                ctx.draw(&Map {
                    color: Color::DarkGray,
                    resolution: MapResolution::High,
                });
                ctx.layer();
                for marker in &view.markers {
                    if !view.region.contains(marker.coordinate) {
                        continue;
                    }
                    ctx.print(
                        marker.coordinate.longitude,
                        marker.coordinate.latitude,
                        Line::from(vec![
                            Span::styled("● ", Style::default().fg(Color::Red)),
                            Span::styled(marker.title.clone(), Style::default().fg(Color::White)),
                        ]),
                    );
                }
            });
        frame.render_widget(canvas, area);
    }
}

impl MapRenderer for CanvasMap {
    fn show(&mut self, view: &MapView) -> io::Result<()> {
        self.view = Some(view.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::model::{Coordinate, DEFAULT_DELTA};
    use crate::tui::screens::buffer_text;

    fn draw(map: &CanvasMap) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal
            .draw(|frame| map.render(frame, frame.area()))
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn blank_until_shown() {
        let map = CanvasMap::new();
        assert!(map.view().is_none());
        assert!(draw(&map).trim().is_empty());
    }

    #[test]
    fn draws_the_marker_title() {
        let mut map = CanvasMap::new();
        let view = MapView::user_location(
            Coordinate::new(37.0, -122.0).unwrap(),
            DEFAULT_DELTA,
            DEFAULT_DELTA,
        );
        map.show(&view).unwrap();

        assert_eq!(map.view(), Some(&view));
        assert!(draw(&map).contains("You are here"));
    }
}
