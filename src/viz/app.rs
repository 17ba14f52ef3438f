use std::{
    io,
    sync::mpsc::{Receiver, TryRecvError},
    time::Duration,
};

use crossterm::event::{self, Event, KeyCode};
use ratatui::{prelude::*, widgets::*};

use crate::gym::GridWorld;

use super::{
    components::{help::render_help, Component, Logs, Plots, PolicyView},
    tui,
    util::event_keycode,
    Update,
};

const TABS: [&str; 3] = ["Plots", "Policy", "Logs"];

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    #[default]
    Train,
    /// The trainer hung up, results stay on screen until quit
    Done,
    Quit,
}

/// The root TUI component which holds the dashboard state and runs the render loop
pub struct App {
    state: State,
    episode: u32,
    total_episodes: u32,
    selected_tab: usize,
    show_help: bool,
    plots: Plots,
    policy: PolicyView,
    logs: Logs,
}

impl App {
    /// `metrics` names the values of [`Update::data`], `grid` is used to draw the policy
    pub fn new(metrics: &[&'static str], episodes: u32, grid: GridWorld) -> Self {
        Self {
            state: State::default(),
            episode: 0,
            total_episodes: episodes,
            selected_tab: 0,
            show_help: false,
            plots: Plots::new(metrics, episodes),
            policy: PolicyView::new(grid),
            logs: Logs::new(log::LevelFilter::Debug),
        }
    }

    pub fn update(&mut self, update: Update) {
        self.episode = update.episode;
        self.plots.push(update.episode, &update.data);
        self.policy.update(update.episode, &update.policy);
    }

    fn drain(&mut self, rx: &Receiver<Update>) {
        loop {
            match rx.try_recv() {
                Ok(update) => self.update(update),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::info!("training finished after {} episodes", self.episode);
                    self.state = State::Done;
                    break;
                }
            }
        }
    }

    fn active(&mut self) -> &mut dyn Component {
        match self.selected_tab {
            0 => &mut self.plots,
            1 => &mut self.policy,
            _ => &mut self.logs,
        }
    }

    fn handle_event(&mut self, event: &Event) {
        match event_keycode(event) {
            Some(KeyCode::Char('q')) => self.state = State::Quit,
            Some(KeyCode::Char('h')) => self.show_help = !self.show_help,
            Some(KeyCode::Tab) => self.selected_tab = (self.selected_tab + 1) % TABS.len(),
            Some(_) => {
                self.active().handle_ui_event(event);
            }
            None => {}
        }
    }

    /// Initialize the terminal and run the main loop until `q` is pressed
    ///
    /// Restores the terminal on exit
    pub fn run(&mut self, rx: Receiver<Update>) -> io::Result<()> {
        let mut terminal = tui::init()?;

        while self.state != State::Quit {
            if self.state == State::Train {
                self.drain(&rx);
            }

            terminal.draw(|frame| frame.render_widget(&*self, frame.size()))?;

            if event::poll(Duration::from_millis(16))? {
                self.handle_event(&event::read()?);
            }
        }

        tui::restore()
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [menu_area, main_area, progress_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(3),
        ])
        .areas(area);

        Tabs::new(TABS)
            .block(Block::default().padding(Padding::uniform(1)))
            .white()
            .bold()
            .highlight_style(Style::default().light_green())
            .select(self.selected_tab)
            .render(menu_area, buf);

        match self.selected_tab {
            0 => self.plots.render_ref(main_area, buf),
            1 => self.policy.render_ref(main_area, buf),
            _ => self.logs.render_ref(main_area, buf),
        }

        let title = match self.state {
            State::Done => "Done (h: help, q: quit)",
            _ => "Progress (h: help, q: quit)",
        };
        let ratio = if self.total_episodes == 0 {
            1.0
        } else {
            (self.episode as f64 / self.total_episodes as f64).min(1.0)
        };
        Gauge::default()
            .block(Block::bordered().border_type(BorderType::Rounded).title(title))
            .gauge_style(Color::Cyan)
            .ratio(ratio)
            .label(format!("{}/{}", self.episode, self.total_episodes))
            .render(progress_area, buf);

        if self.show_help {
            render_help(area, buf, self.selected_tab);
        }
    }
}
