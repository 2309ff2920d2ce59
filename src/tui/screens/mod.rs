//! Screen rendering and input handling.

mod help_request;
mod map;
mod register;
mod verify_email;

pub use help_request::HelpRequestScreen;
pub use map::MapScreen;
pub use register::RegisterScreen;
pub use verify_email::VerifyEmailScreen;

/// The text of a test buffer, one line per row.
#[cfg(test)]
pub fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
    let width = usize::from(buffer.area.width);
    buffer
        .content()
        .chunks(width)
        .map(|row| row.iter().map(ratatui::buffer::Cell::symbol).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
