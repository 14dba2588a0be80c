use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};

use crate::app::App;
use crate::sink::SessionSink;
use crate::ui::format_duration;

/// Full-screen growth insights view, shown after a completed session.
pub fn render<S: SessionSink>(app: &App<S>, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(6), // Summary numbers
            Constraint::Min(0),    // Per-practice table
            Constraint::Length(3), // Instructions
        ])
        .split(area);

    let Some(ref view) = app.insights else {
        let no_data = Paragraph::new("No insights loaded.")
            .block(Block::default().borders(Borders::ALL).title("insights"))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        no_data.render(area, buf);
        return;
    };

    let title_text = if view.using_fallback {
        "growth insights — showing defaults (journal unavailable)"
    } else {
        "growth insights"
    };
    let title = Paragraph::new(title_text)
        .block(Block::default().borders(Borders::ALL).title("insights"))
        .style(
            Style::default()
                .fg(if view.using_fallback {
                    Color::Yellow
                } else {
                    Color::Cyan
                })
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    title.render(chunks[0], buf);

    let report = &view.report;
    let mean = report
        .mean_session_secs
        .map(|m| format_duration(m.round() as u32))
        .unwrap_or_else(|| "-".to_string());
    let summary_lines = vec![
        format!("sessions          {}", report.total_sessions),
        format!("last 7 days       {}", report.sessions_last_7_days),
        format!("minutes practiced {}", report.minutes_practiced),
        format!("typical length    {}", mean),
        format!("daily streak      {}", report.streak_days),
    ];
    let summary = Paragraph::new(summary_lines.join("\n"))
        .block(Block::default().borders(Borders::ALL).title("Totals"))
        .style(Style::default().fg(Color::Green));
    summary.render(chunks[1], buf);

    if report.kind_counts.is_empty() {
        let empty = Paragraph::new("Complete a practice to start building history.")
            .block(Block::default().borders(Borders::ALL).title("By Practice"))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        empty.render(chunks[2], buf);
    } else {
        let header = Row::new(vec![Cell::from("Practice"), Cell::from("Sessions")]).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
        let rows: Vec<Row> = report
            .kind_counts
            .iter()
            .map(|(kind, n)| Row::new(vec![Cell::from(kind.clone()), Cell::from(n.to_string())]))
            .collect();
        let table = Table::new(rows, &[Constraint::Length(24), Constraint::Length(10)])
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("By Practice"));
        table.render(chunks[2], buf);
    }

    let instructions = Paragraph::new("(b)ack  (esc) quit")
        .block(Block::default().borders(Borders::ALL))
        .style(
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )
        .alignment(Alignment::Center);
    instructions.render(chunks[3], buf);
}
