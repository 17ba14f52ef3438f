use crossterm::event::Event;
use ratatui::{prelude::*, widgets::*};
use unicode_width::UnicodeWidthStr;

use crate::gym::GridWorld;

use super::Component;

/// The latest greedy policy drawn over the grid
pub struct PolicyView {
    grid: GridWorld,
    text: String,
    episode: u32,
}

impl PolicyView {
    pub fn new(grid: GridWorld) -> Self {
        let text = grid.render_policy(&[]);
        Self {
            grid,
            text,
            episode: 0,
        }
    }

    pub fn update(&mut self, episode: u32, policy: &[usize]) {
        self.episode = episode;
        self.text = self.grid.render_policy(policy);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Columns and rows the drawn grid occupies
    fn extent(&self) -> (u16, u16) {
        let width = self.text.lines().map(UnicodeWidthStr::width).max().unwrap_or(0);
        let height = self.text.lines().count();
        (width as u16, height as u16)
    }
}

impl WidgetRef for PolicyView {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let (width, height) = self.extent();
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(format!("Greedy policy after episode {}", self.episode));
        let inner = block.inner(area);
        block.render(area, buf);

        Paragraph::new(self.text.as_str())
            .light_green()
            .render(crate::viz::util::centered(inner, width, height), buf);
    }
}

impl Component for PolicyView {
    fn handle_ui_event(&mut self, _event: &Event) -> bool {
        false
    }
}
