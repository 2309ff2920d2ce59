//! Terminal UI: one screen per route, driven by a crossterm event loop.

mod app;
mod canvas;
mod screens;
mod widgets;

pub use app::{App, run};
