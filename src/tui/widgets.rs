//! Shared styles and small drawing helpers.

use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Padding, Paragraph, Wrap};

pub fn muted() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn normal() -> Style {
    Style::default().fg(Color::Gray)
}

pub fn highlight() -> Style {
    Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

/// A focused button: `[ label ]`.
pub fn button(label: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled("[ ", muted()),
        Span::styled(label.to_string(), highlight()),
        Span::styled(" ]", muted()),
    ])
}

/// A rectangle of at most `width` × `height`, centered in `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    cell
}

/// Heading, body text, and one button: the layout of every placeholder screen.
pub fn render_placeholder(
    frame: &mut Frame,
    area: Rect,
    heading: Option<&str>,
    body: &[&str],
    action: &str,
) {
    let mut lines = Vec::new();
    if let Some(heading) = heading {
        lines.push(Line::from(Span::styled(heading.to_string(), highlight())));
        lines.push(Line::default());
    }
    for text in body {
        lines.push(Line::from(Span::styled((*text).to_string(), normal())));
    }
    if !body.is_empty() {
        lines.push(Line::default());
    }
    lines.push(button(action));

    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let content = Paragraph::new(lines)
        .centered()
        .wrap(Wrap { trim: true })
        .block(Block::default().padding(Padding::horizontal(2)));
    frame.render_widget(content, centered(area, area.width, height));
}
