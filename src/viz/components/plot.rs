use crossterm::event::{Event, KeyCode};
use ratatui::{prelude::*, widgets::*};

use crate::viz::util::event_keycode;

use super::Component;

/// Scatter plot of one metric against the episode number
pub struct Plot {
    title: &'static str,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    data: Vec<(f64, f64)>,
}

impl Plot {
    pub fn new(title: &'static str, episodes: u32) -> Self {
        Self {
            title,
            x_bounds: [0.0, episodes.max(1) as f64],
            y_bounds: [f64::MAX, f64::MIN],
            data: Vec::new(),
        }
    }

    /// Add a point, widening the axes to fit it
    pub fn push(&mut self, point: (f64, f64)) {
        let (x, y) = point;
        self.x_bounds = [self.x_bounds[0].min(x), self.x_bounds[1].max(x)];
        self.y_bounds = [self.y_bounds[0].min(y), self.y_bounds[1].max(y)];
        self.data.push(point);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        self.y_bounds
    }

    fn labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
        bounds.iter().map(|b| format!("{b:.2}").bold()).collect()
    }
}

impl WidgetRef for Plot {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let dataset = Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Scatter)
            .cyan()
            .data(&self.data);

        // No points yet, keep the y axis finite
        let y_bounds = if self.data.is_empty() {
            [0.0, 1.0]
        } else {
            self.y_bounds
        };

        let x_axis = Axis::default()
            .title("Episode")
            .dark_gray()
            .labels(Self::labels(self.x_bounds))
            .bounds(self.x_bounds);

        let y_axis = Axis::default()
            .title(self.title)
            .dark_gray()
            .labels(Self::labels(y_bounds))
            .bounds(y_bounds);

        Chart::new(vec![dataset])
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .title(self.title)
                    .padding(Padding::uniform(2)),
            )
            .x_axis(x_axis)
            .y_axis(y_axis)
            .render(area, buf);
    }
}

/// One [`Plot`] per training metric, with one shown at a time
pub struct Plots {
    plots: Vec<Plot>,
    selected: usize,
}

impl Plots {
    pub fn new(names: &[&'static str], episodes: u32) -> Self {
        Self {
            plots: names.iter().map(|&n| Plot::new(n, episodes)).collect(),
            selected: 0,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn next_plot(&mut self) {
        if !self.plots.is_empty() {
            self.selected = (self.selected + 1) % self.plots.len();
        }
    }

    pub fn prev_plot(&mut self) {
        let len = self.plots.len();
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    /// Append one episode's metrics, ignoring values without a plot
    pub fn push(&mut self, episode: u32, data: &[f64]) {
        for (plot, &value) in self.plots.iter_mut().zip(data) {
            plot.push((episode as f64, value));
        }
    }

    pub fn get(&self, i: usize) -> Option<&Plot> {
        self.plots.get(i)
    }
}

impl WidgetRef for Plots {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let [tabs_area, plot_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);

        Tabs::new(self.plots.iter().map(|p| p.title))
            .white()
            .highlight_style(Style::default().light_green())
            .select(self.selected)
            .render(tabs_area, buf);

        if let Some(plot) = self.plots.get(self.selected) {
            plot.render_ref(plot_area, buf);
        }
    }
}

impl Component for Plots {
    fn handle_ui_event(&mut self, event: &Event) -> bool {
        match event_keycode(event) {
            Some(KeyCode::Left) => self.prev_plot(),
            Some(KeyCode::Right) => self.next_plot(),
            _ => return false,
        }
        true
    }
}
