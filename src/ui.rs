pub mod insights;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;
use webbrowser::Browser;

use crate::app::{App, Screen};
use crate::breathing::BreathPhase;
use crate::sink::SessionSink;

const HORIZONTAL_MARGIN: u16 = 5;

pub fn format_duration(secs: u32) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}

fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn hint_style() -> Style {
    Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::ITALIC)
}

impl<S: SessionSink> Widget for &App<S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.screen() {
            Screen::Setup => render_setup(self, area, buf),
            Screen::Practice => render_practice(self, area, buf),
            Screen::Reflection => render_reflection(self, area, buf),
            Screen::Closed => render_closed(self, area, buf),
            Screen::Insights => insights::render(self, area, buf),
        }
    }
}

/// Vertical layout with the content block centered in the available height.
fn centered(area: Rect, content_height: u16) -> Rect {
    let pad = area.height.saturating_sub(content_height) / 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(pad),
            Constraint::Length(content_height),
            Constraint::Min(0),
        ])
        .split(area);
    chunks[1]
}

fn render_setup<S: SessionSink>(app: &App<S>, area: Rect, buf: &mut Buffer) {
    let kind = app.kind();
    let choices = kind.duration_choices();

    let mut duration_spans: Vec<Span> = vec![Span::styled("length  ", dim())];
    for (i, &d) in choices.iter().enumerate() {
        let label = format!(" {} ", format_duration(d));
        if i == app.duration_idx() {
            duration_spans.push(Span::styled(
                format!("[{}]", label.trim()),
                bold().fg(Color::Green),
            ));
        } else {
            duration_spans.push(Span::styled(label, dim().patch(bold())));
        }
        duration_spans.push(Span::raw("  "));
    }

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(app.content.name.clone(), bold().fg(Color::Cyan))),
        Line::default(),
        Line::from(duration_spans),
    ];

    let flag = if app.session.config.after_assignment {
        "[x] just finished a tough assignment"
    } else {
        "[ ] just finished a tough assignment"
    };
    lines.push(Line::from(Span::styled(flag, Style::default())));

    if let Some(technique) = app.session.config.technique {
        lines.push(Line::from(vec![
            Span::styled("pacing  ", dim()),
            Span::styled(technique.label(), bold().fg(Color::Magenta)),
        ]));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!("\u{201c}{}\u{201d}", app.affirmation),
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::ITALIC),
    )));
    lines.push(Line::default());

    let mut hints = String::from("(enter) begin  (←/→) length  (a) tough assignment");
    if app.session.config.technique.is_some() {
        hints.push_str("  (t) pacing");
    }
    hints.push_str("  (esc) quit");
    lines.push(Line::from(Span::styled(hints, hint_style())));

    // Slack for the affirmation wrapping onto a second row
    let height = lines.len() as u16 + 2;
    let widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    widget.render(centered(area, height), buf);
}

fn render_practice<S: SessionSink>(app: &App<S>, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let step = app.current_step_def();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(2)
        .constraints([
            Constraint::Length(2), // clock
            Constraint::Length(2), // step header
            Constraint::Min(4),    // instructions + tip
            Constraint::Length(2), // breath guide
            Constraint::Length(1), // progress
            Constraint::Length(1), // hints
        ])
        .split(area);

    let clock = Paragraph::new(Span::styled(
        format_clock(session.remaining_secs()),
        bold().fg(Color::Cyan),
    ))
    .alignment(Alignment::Center);
    clock.render(chunks[0], buf);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("step {}/{}  ", session.current_step() + 1, session.step_count()),
            dim(),
        ),
        Span::styled(step.title.clone(), bold()),
    ]))
    .alignment(Alignment::Center);
    header.render(chunks[1], buf);

    let mut body: Vec<Line> = app
        .current_instructions()
        .iter()
        .map(|line| Line::from(Span::raw(line.clone())))
        .collect();
    body.push(Line::default());
    body.push(Line::from(Span::styled(
        step.tip.clone(),
        dim().add_modifier(Modifier::ITALIC),
    )));

    // Centering only reads well while every line fits unwrapped
    let max_width = area.width.saturating_sub(HORIZONTAL_MARGIN * 2) as usize;
    let fits = app
        .current_instructions()
        .iter()
        .all(|line| line.width() <= max_width)
        && step.tip.width() <= max_width;
    let alignment = if fits {
        Alignment::Center
    } else {
        Alignment::Left
    };
    Paragraph::new(body)
        .alignment(alignment)
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    if let Some(ref breath) = app.breath {
        let (phase, progress) = breath.phase();
        let bar_width = 24usize;
        let filled = match phase {
            BreathPhase::Inhale => (progress * bar_width as f64) as usize,
            BreathPhase::Exhale => ((1.0 - progress) * bar_width as f64) as usize,
            BreathPhase::Hold => bar_width,
        };
        let bar: String = "▓".repeat(filled.min(bar_width)) + &"░".repeat(bar_width - filled.min(bar_width));
        let guide = Paragraph::new(Line::from(vec![
            Span::styled(format!("{:^12}", phase.label()), bold().fg(Color::Magenta)),
            Span::raw(" "),
            Span::styled(bar, Style::default().fg(Color::Magenta)),
        ]))
        .alignment(Alignment::Center);
        guide.render(chunks[3], buf);
    }

    let gauge = Gauge::default()
        .ratio(session.progress())
        .gauge_style(Style::default().fg(Color::Green))
        .label(Span::styled(
            format!("{}%", (session.progress() * 100.0).round() as u32),
            dim(),
        ));
    gauge.render(chunks[4], buf);

    let mut hints = String::new();
    if session.config.allow_manual_advance {
        hints.push_str("(space) next step  ");
    }
    hints.push_str("(esc) end early");
    Paragraph::new(Span::styled(hints, hint_style()))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);
}

fn render_reflection<S: SessionSink>(app: &App<S>, area: Rect, buf: &mut Buffer) {
    let form = &app.form;
    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled("how was that?", bold().fg(Color::Cyan))),
        Line::default(),
    ];

    for (qi, question) in form.questions().iter().enumerate() {
        let marker = if qi == form.cursor() { "❯ " } else { "  " };
        lines.push(Line::from(vec![
            Span::styled(marker, bold().fg(Color::Green)),
            Span::styled(question.prompt, bold()),
        ]));

        let mut option_spans: Vec<Span> = vec![Span::raw("    ")];
        for (oi, option) in question.options.iter().enumerate() {
            let selected = form.selection(qi) == Some(oi);
            let style = if selected {
                bold().fg(Color::Green)
            } else if qi == form.cursor() {
                Style::default()
            } else {
                dim()
            };
            let text = if selected {
                format!("[{}]", option)
            } else {
                format!(" {} ", option)
            };
            option_spans.push(Span::styled(text, style));
            option_spans.push(Span::raw(" "));
        }
        lines.push(Line::from(option_spans));
        lines.push(Line::default());
    }

    let submit_hint = if form.is_submittable() {
        "(enter) save reflection"
    } else {
        "pick at least one answer to save"
    };
    lines.push(Line::from(Span::styled(
        format!("(↑/↓) question  (←/→) choose  {}  (esc) discard", submit_hint),
        hint_style(),
    )));

    let height = lines.len() as u16;
    Paragraph::new(lines)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true })
        .render(centered(area, height), buf);
}

fn render_closed<S: SessionSink>(app: &App<S>, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let mut lines: Vec<Line> = Vec::new();

    if session.was_submitted() {
        lines.push(Line::from(Span::styled(
            "session complete",
            bold().fg(Color::Green),
        )));
        lines.push(Line::default());
        lines.push(Line::from(Span::raw(format!(
            "{} · {} practiced",
            app.content.name,
            format_duration(session.elapsed_secs()),
        ))));
        lines.push(Line::from(Span::raw(format!(
            "{} of {} questions answered",
            app.form.answered_count(),
            app.form.questions().len(),
        ))));
    } else {
        lines.push(Line::from(Span::styled(
            "session discarded",
            bold().fg(Color::Yellow),
        )));
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "nothing was saved",
            dim(),
        )));
    }

    if let Some(ref err) = app.save_error {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            err.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!("\u{201c}{}\u{201d}", app.affirmation),
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::ITALIC),
    )));
    lines.push(Line::default());

    let mut hints = String::from("(r) again  (s) insights");
    if Browser::is_available() {
        hints.push_str("  (g) research");
    }
    hints.push_str("  (esc) quit");
    lines.push(Line::from(Span::styled(hints, hint_style())));

    let height = lines.len() as u16 + 2;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(centered(area, height), buf);
}
