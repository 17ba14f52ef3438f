pub mod help;
pub mod log;
pub mod plot;
pub mod policy;

use crossterm::event::Event;
use ratatui::widgets::WidgetRef;

pub use self::log::Logs;
pub use plot::Plots;
pub use policy::PolicyView;

/// A tab of the dashboard that can react to input
pub trait Component: WidgetRef {
    /// **Returns** whether the event was consumed
    fn handle_ui_event(&mut self, event: &Event) -> bool;
}
