use ratatui::{prelude::*, widgets::*};

use crate::viz::util::centered;

fn key(k: &'static str, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::from(k).light_cyan().bold(),
        Span::raw(" : "),
        Span::raw(what),
    ])
}

/// Key bindings for the dashboard and for the tab at `selected_tab`
pub fn help_lines(selected_tab: usize) -> Vec<Line<'static>> {
    let mut lines = vec![
        key("  q  ", "Stop training and exit"),
        key("  h  ", "Toggle help popup"),
        key(" Tab ", "Switch tabs"),
    ];

    match selected_tab {
        0 => lines.push(key("⬅ / ➡", "Switch plots")),
        2 => lines.extend([
            key("  s  ", "Toggle target selector"),
            key("  f  ", "Focus on the selected target only"),
            key("⬆ / ⬇", "Switch log target"),
            key("⬅ / ➡", "Reduce/increase shown log messages by one level"),
            key("- / +", "Reduce/increase captured log messages by one level"),
            key("PgUp ", "Page mode, scroll up in log history"),
            key("PgDn ", "Page mode, scroll down in log history"),
            key(" Esc ", "Leave page mode"),
            key("Space", "Toggle targets with logging turned off"),
        ]),
        _ => {}
    }

    lines
}

pub fn render_help(area: Rect, buf: &mut Buffer, selected_tab: usize) {
    let lines = help_lines(selected_tab);
    let popup = centered(area, 70, lines.len() as u16 + 4);

    Clear.render(popup, buf);
    Paragraph::new(lines)
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .padding(Padding::proportional(1))
                .title("Help"),
        )
        .wrap(Wrap { trim: false })
        .render(popup, buf);
}
