use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::IssueListView;

pub fn render(f: &mut Frame, area: Rect, view: &IssueListView) {
    let narrow = area.width < crate::app::NARROW_WIDTH_THRESHOLD;

    let hints: &[(&str, &str)] = if narrow {
        &[
            ("j/k", "nav"),
            ("x", "resolve"),
            ("u", "undo"),
            ("q", "quit"),
        ]
    } else {
        &[
            ("↑↓/jk", "navigate"),
            ("space", "select"),
            ("x", "resolve"),
            ("i", "ignore"),
            ("m", "reviewed"),
            ("u", "undo"),
            ("n/p", "page"),
            ("tab", "tabs"),
            ("s", "sort"),
            ("t", "live"),
            ("q", "quit"),
        ]
    };

    let line = if let Some(notif) = view.notifications.last() {
        Line::from(vec![
            Span::styled("★ ", Style::default().fg(Color::Yellow)),
            Span::styled(&notif.message, Style::default().fg(Color::Yellow)),
        ])
    } else {
        let mut spans: Vec<Span> = vec![Span::styled(
            format!("{}  ", view.page_summary()),
            Style::default().fg(Color::White),
        )];
        for (i, (key, desc)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
            spans.push(Span::styled(
                format!(" {desc}"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    };

    let footer = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(footer, area);
}
