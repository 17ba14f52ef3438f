mod app;
mod components;
mod tui;
mod util;

pub use app::App;
pub use crate::train::Update;
