use crate::app::IssueListView;
use crate::model::{Group, GroupStatus};
use chrono::{DateTime, Utc};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

const SPARK_CHARS: &[char] = &['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARK_WIDTH: usize = 12;

pub fn render(f: &mut Frame, area: Rect, view: &IssueListView) {
    let narrow = area.width < crate::app::NARROW_WIDTH_THRESHOLD;
    let inner_width = area.width.saturating_sub(2) as usize;
    let items = view.items();

    if items.is_empty() {
        let (msg, color) = if let Some(err) = &view.list_error {
            (format!("Failed to load issues: {err}  (r to retry)"), Color::Red)
        } else if view.issues_loading {
            ("Loading issues…".to_string(), Color::DarkGray)
        } else {
            ("No issues match your search".to_string(), Color::DarkGray)
        };
        let para = Paragraph::new(msg)
            .style(Style::default().fg(color))
            .block(Block::default().borders(Borders::NONE));
        f.render_widget(para, area);
        return;
    }

    let visible_height = area.height as usize;
    let scroll_offset = if view.cursor >= visible_height {
        view.cursor - visible_height + 1
    } else {
        0
    };
    let now = Utc::now();

    let lines: Vec<Line> = items
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_height)
        .map(|(i, group)| {
            render_issue_line(
                group,
                &view.params.group_stats_period,
                i == view.cursor,
                view.selected.contains(&group.id),
                narrow,
                inner_width,
                now,
            )
        })
        .collect();

    let list = Paragraph::new(lines).block(Block::default().borders(Borders::NONE));
    f.render_widget(list, area);
}

fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        s.to_string()
    } else {
        let mut result = String::new();
        let mut width = 0;
        for c in s.chars() {
            let cw = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
            if width + cw + 1 > max_width {
                result.push('…');
                break;
            }
            result.push(c);
            width += cw;
        }
        result
    }
}

fn format_age(then: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(then) = then else {
        return "-".to_string();
    };
    let secs = (now - then).num_seconds().max(0);
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86_400)
    }
}

/// Last `SPARK_WIDTH` buckets scaled to the busiest one.
fn sparkline(group: &Group, period: &str) -> String {
    let Some(buckets) = group.stats.as_ref().and_then(|s| s.get(period)) else {
        return String::new();
    };
    let tail = &buckets[buckets.len().saturating_sub(SPARK_WIDTH)..];
    let max = tail.iter().map(|(_, n)| *n).max().unwrap_or(0);
    tail.iter()
        .map(|(_, n)| {
            if max == 0 {
                SPARK_CHARS[0]
            } else {
                let idx = (*n * (SPARK_CHARS.len() as u64 - 1)) / max;
                SPARK_CHARS[idx as usize]
            }
        })
        .collect()
}

fn render_issue_line(
    group: &Group,
    stats_period: &str,
    is_cursor: bool,
    is_selected: bool,
    narrow: bool,
    max_width: usize,
    now: DateTime<Utc>,
) -> Line<'static> {
    let base = if is_cursor {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    let marker = if is_selected { "[x] " } else { "[ ] " };
    let inbox = if group.is_for_review() { "● " } else { "  " };
    let status_color = match group.status {
        GroupStatus::Resolved => Color::Green,
        GroupStatus::Ignored => Color::DarkGray,
        GroupStatus::Unresolved | GroupStatus::Unknown => Color::White,
    };

    let counts = format!(" {:>6} {:>5}", group.count, group.user_count);
    let age = format!(" {:>4}", format_age(group.last_seen, now));
    let spark = if narrow {
        String::new()
    } else {
        format!(" {:<width$}", sparkline(group, stats_period), width = SPARK_WIDTH)
    };
    let fixed = marker.width()
        + inbox.width()
        + group.short_id.width()
        + 1
        + counts.width()
        + age.width()
        + spark.width();
    let title_width = max_width.saturating_sub(fixed);
    let title = if narrow || group.culprit.is_empty() {
        group.title.clone()
    } else {
        format!("{}  {}", group.title, group.culprit)
    };

    Line::from(vec![
        Span::styled(marker, base.fg(Color::DarkGray)),
        Span::styled(inbox, base.fg(Color::Cyan)),
        Span::styled(
            format!("{} ", group.short_id),
            base.fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{:<title_width$}", truncate(&title, title_width)),
            base.fg(status_color),
        ),
        Span::styled(spark, base.fg(Color::Magenta)),
        Span::styled(counts, base.fg(Color::White)),
        Span::styled(age, base.fg(Color::DarkGray)),
    ])
}
