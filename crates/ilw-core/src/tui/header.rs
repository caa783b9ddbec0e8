use crate::app::IssueListView;
use crate::model::TABS;
use crate::tui::spinner;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub fn render(f: &mut Frame, area: Rect, view: &IssueListView) {
    let mut spans = vec![
        Span::styled(
            format!(" ilw v{} ", view.config.version_string),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
        Span::styled(
            &view.config.org,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" [{}]", view.params.sort.label()),
            Style::default().fg(Color::Magenta),
        ),
    ];

    if view.realtime_active {
        let style = if view.is_first_page() {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(" ● live", style));
    }

    if view.issues_loading {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!("{}", spinner::frame(view.spinner_frame)),
            Style::default().fg(Color::Yellow),
        ));
    }

    if view.error_message().is_some() || view.list_error.is_some() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            "!",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(vec![Line::from(spans), tab_line(view)]).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    f.render_widget(header, area);
}

fn tab_line(view: &IssueListView) -> Line<'static> {
    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in TABS.iter().enumerate() {
        let active = tab.query == view.params.query;
        let style = if active {
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("{} {}", i + 1, tab.name), style));
        if let Some(count) = view.query_counts.get(tab.query) {
            spans.push(Span::styled(
                format!(" ({})", count.label()),
                Style::default().fg(Color::Yellow),
            ));
        }
        spans.push(Span::raw("   "));
    }
    if !TABS.iter().any(|t| t.query == view.params.query) {
        spans.push(Span::styled(
            view.params.query.clone(),
            Style::default().fg(Color::Cyan),
        ));
    }
    Line::from(spans)
}
