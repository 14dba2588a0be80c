use attune::{
    app::{App, Screen},
    breathing::BreathingTechnique,
    config::{Config, ConfigStore, FileConfigStore},
    insights,
    journal::JournalDb,
    practice::PracticeKind,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner, TICK_RATE_MS},
    session::SessionConfig,
    sink::JournalSink,
    ui::format_duration,
};
use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use time_humanize::{Accuracy, HumanTime, Tense};
use webbrowser::Browser;

const RESEARCH_URL: &str = "https://interpretreflect.com/research";

/// guided reset tui for interpreters: timed practices, paced breathing, and reflection tracking
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Short guided practices for professional interpreters: body check-ins, paced breathing, emotion mapping, and interoceptive scans, each closed by a reflection that is journaled locally."
)]
pub struct Cli {
    /// practice to run
    #[clap(short = 'p', long, value_enum)]
    practice: Option<PracticeKind>,

    /// session length in seconds (must be one of the practice's offered lengths)
    #[clap(short = 'd', long)]
    duration_secs: Option<u32>,

    /// start in debrief mode: step copy for right after a tough assignment
    #[clap(long)]
    after_assignment: bool,

    /// breath pacing for the breathing practice
    #[clap(short = 't', long, value_enum)]
    technique: Option<BreathingTechnique>,

    /// disable manual step navigation; steps follow the clock only
    #[clap(long)]
    no_manual_advance: bool,

    /// hide the inhale/hold/exhale indicator during breathing practice
    #[clap(long)]
    no_breath_guide: bool,

    /// print the most recent journal entries and exit
    #[clap(long, value_name = "N", num_args = 0..=1, default_missing_value = "10")]
    history: Option<usize>,

    /// print growth insights and exit
    #[clap(long)]
    insights: bool,

    /// export the whole journal as CSV and exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,
}

/// Merge stored preferences under CLI flags into a validated session config.
fn resolve_session(cli: &Cli, stored: &Config) -> (SessionConfig, bool) {
    let kind = cli
        .practice
        .or_else(|| PracticeKind::from_str(&stored.practice, true).ok())
        .unwrap_or(PracticeKind::BodyCheckIn);

    let mut config = SessionConfig::new(kind);

    let duration = cli.duration_secs.or(stored.duration_secs);
    if let Some(d) = duration {
        if !kind.duration_choices().contains(&d) {
            let mut cmd = Cli::command();
            cmd.error(
                ErrorKind::InvalidValue,
                format!(
                    "{} offers these lengths: {}",
                    kind,
                    kind.duration_choices()
                        .iter()
                        .map(|&d| format_duration(d))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )
            .exit();
        }
        config.duration_secs = d;
    }

    config.after_assignment = cli.after_assignment || stored.after_assignment;
    config.allow_manual_advance = !cli.no_manual_advance && stored.allow_manual_advance;
    if kind == PracticeKind::BreathingPractice {
        config.technique = cli
            .technique
            .or_else(|| BreathingTechnique::from_str(&stored.technique, true).ok())
            .or(config.technique);
    }

    let show_breath_guide = !cli.no_breath_guide && stored.show_breath_guide;
    (config, show_breath_guide)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(ref path) = cli.export {
        return run_export(path);
    }
    if cli.insights {
        return run_insights();
    }
    if let Some(n) = cli.history {
        return run_history(n);
    }

    let store = FileConfigStore::new();
    let stored = store.load();
    let (config, show_breath_guide) = resolve_session(&cli, &stored);

    // Remember the chosen practice for next time
    let _ = store.save(&Config {
        practice: config
            .kind
            .to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_else(|| stored.practice.clone()),
        duration_secs: Some(config.duration_secs),
        after_assignment: config.after_assignment,
        allow_manual_advance: config.allow_manual_advance,
        technique: config
            .technique
            .and_then(|t| t.to_possible_value())
            .map(|v| v.get_name().to_string())
            .unwrap_or_else(|| stored.technique.clone()),
        show_breath_guide,
    });

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, show_breath_guide, JournalSink::new());
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

// ── Headless modes ───────────────────────────────────────────────────

fn run_history(limit: usize) -> Result<(), Box<dyn Error>> {
    let db = JournalDb::new()?;
    let entries = db.recent(limit)?;

    if entries.is_empty() {
        println!("No reflections yet. Run `attune` to practice.");
        return Ok(());
    }

    for entry in entries {
        let ago = Local::now()
            .signed_duration_since(entry.completed_at)
            .num_seconds()
            .max(0) as u64;
        let when = HumanTime::from(Duration::from_secs(ago))
            .to_text_en(Accuracy::Rough, Tense::Past);
        let answered = entry
            .answers
            .values()
            .filter(|v| v.selected().is_some())
            .count();
        println!(
            "{:<20} {:>6}  {} ({} answers)",
            entry.kind,
            format_duration(entry.elapsed_secs),
            when,
            answered,
        );
    }
    Ok(())
}

fn run_insights() -> Result<(), Box<dyn Error>> {
    let db = JournalDb::new().ok();
    let view = insights::load_or_fallback(db.as_ref());
    let report = &view.report;

    if view.using_fallback {
        println!("(journal unavailable; showing defaults)");
    }
    println!("sessions:          {}", report.total_sessions);
    println!("last 7 days:       {}", report.sessions_last_7_days);
    println!("minutes practiced: {}", report.minutes_practiced);
    if let Some(mean) = report.mean_session_secs {
        println!("typical length:    {}", format_duration(mean.round() as u32));
    }
    println!("daily streak:      {}", report.streak_days);
    for (kind, n) in &report.kind_counts {
        println!("  {:<20} {}", kind, n);
    }
    Ok(())
}

fn run_export(path: &PathBuf) -> Result<(), Box<dyn Error>> {
    let db = JournalDb::new()?;
    let written = db.export_csv(path)?;
    println!("wrote {} reflections to {}", written, path.display());
    Ok(())
}

// ── TUI loop ─────────────────────────────────────────────────────────

#[derive(Debug)]
enum ExitType {
    Again,
    Quit,
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App<JournalSink>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        let mut exit_type = ExitType::Quit;
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        loop {
            match runner.step() {
                AppEvent::Tick => {
                    if app.screen() == Screen::Practice {
                        app.on_tick();
                        // Redraw every tick while the clock runs
                        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                    }
                }
                AppEvent::Resize => {
                    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                }
                AppEvent::Key(key) => {
                    match handle_key(app, key) {
                        KeyOutcome::Continue => {}
                        KeyOutcome::Again => {
                            exit_type = ExitType::Again;
                            break;
                        }
                        KeyOutcome::Quit => {
                            break;
                        }
                    }
                    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                }
            }
        }

        match exit_type {
            ExitType::Again => {
                app.reset();
            }
            ExitType::Quit => {
                // Leaving mid-session counts as a close
                app.close();
                break;
            }
        }
    }

    Ok(())
}

enum KeyOutcome {
    Continue,
    Again,
    Quit,
}

fn handle_key(app: &mut App<JournalSink>, key: KeyEvent) -> KeyOutcome {
    // ctrl+c quits from anywhere
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyOutcome::Quit;
    }

    match app.screen() {
        Screen::Setup => match key.code {
            KeyCode::Esc => return KeyOutcome::Quit,
            KeyCode::Left => app.select_duration(false),
            KeyCode::Right => app.select_duration(true),
            KeyCode::Char('a') => app.toggle_after_assignment(),
            KeyCode::Char('t') => app.cycle_technique(),
            KeyCode::Enter => {
                app.start();
            }
            _ => {}
        },
        Screen::Practice => match key.code {
            KeyCode::Esc => {
                // Discard: show the closed screen, nothing is saved
                app.close();
            }
            KeyCode::Char(' ') | KeyCode::Char('n') => {
                app.manual_advance();
            }
            _ => {}
        },
        Screen::Reflection => match key.code {
            KeyCode::Esc => {
                app.close();
            }
            KeyCode::Up => app.form.cursor_up(),
            KeyCode::Down => app.form.cursor_down(),
            KeyCode::Left => app.form.cycle(false),
            KeyCode::Right => app.form.cycle(true),
            KeyCode::Char(c @ '1'..='5') => {
                app.form.select(c as usize - '1' as usize);
            }
            KeyCode::Enter => {
                app.submit();
            }
            _ => {}
        },
        Screen::Closed => match key.code {
            KeyCode::Esc => return KeyOutcome::Quit,
            KeyCode::Char('r') => return KeyOutcome::Again,
            KeyCode::Char('s') => {
                let view = insights::load_or_fallback(app.sink.journal());
                app.open_insights(view);
            }
            KeyCode::Char('g') => {
                if Browser::is_available() {
                    webbrowser::open(RESEARCH_URL).unwrap_or_default();
                }
            }
            _ => {}
        },
        Screen::Insights => match key.code {
            KeyCode::Esc => return KeyOutcome::Quit,
            KeyCode::Char('b') | KeyCode::Backspace => app.close_insights(),
            KeyCode::Char('r') => return KeyOutcome::Again,
            _ => {}
        },
    }

    KeyOutcome::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["attune"]);

        assert_eq!(cli.practice, None);
        assert_eq!(cli.duration_secs, None);
        assert!(!cli.after_assignment);
        assert_eq!(cli.technique, None);
        assert!(!cli.no_manual_advance);
        assert_eq!(cli.history, None);
        assert!(!cli.insights);
        assert_eq!(cli.export, None);
    }

    #[test]
    fn test_cli_practice_values() {
        let cli = Cli::parse_from(["attune", "-p", "body-check-in"]);
        assert_eq!(cli.practice, Some(PracticeKind::BodyCheckIn));

        let cli = Cli::parse_from(["attune", "--practice", "emotion-mapping"]);
        assert_eq!(cli.practice, Some(PracticeKind::EmotionMapping));

        let cli = Cli::parse_from(["attune", "-p", "interoceptive-scan"]);
        assert_eq!(cli.practice, Some(PracticeKind::InteroceptiveScan));
    }

    #[test]
    fn test_cli_duration_and_technique() {
        let cli = Cli::parse_from([
            "attune",
            "-p",
            "breathing-practice",
            "-d",
            "120",
            "-t",
            "four-seven-eight",
        ]);
        assert_eq!(cli.duration_secs, Some(120));
        assert_eq!(cli.technique, Some(BreathingTechnique::FourSevenEight));
    }

    #[test]
    fn test_cli_history_default_missing_value() {
        let cli = Cli::parse_from(["attune", "--history"]);
        assert_eq!(cli.history, Some(10));

        let cli = Cli::parse_from(["attune", "--history", "3"]);
        assert_eq!(cli.history, Some(3));
    }

    #[test]
    fn test_resolve_session_prefers_cli_over_stored() {
        let cli = Cli::parse_from(["attune", "-p", "emotion-mapping", "-d", "300"]);
        let stored = Config {
            practice: "breathing-practice".into(),
            duration_secs: Some(60),
            after_assignment: true,
            allow_manual_advance: true,
            technique: "box".into(),
            show_breath_guide: true,
        };

        let (config, _) = resolve_session(&cli, &stored);
        assert_eq!(config.kind, PracticeKind::EmotionMapping);
        assert_eq!(config.duration_secs, 300);
        assert!(config.after_assignment); // stored flag still applies
        assert_eq!(config.technique, None);
    }

    #[test]
    fn test_resolve_session_falls_back_to_stored_practice() {
        let cli = Cli::parse_from(["attune"]);
        let stored = Config {
            practice: "interoceptive-scan".into(),
            ..Config::default()
        };

        let (config, _) = resolve_session(&cli, &stored);
        assert_eq!(config.kind, PracticeKind::InteroceptiveScan);
        assert_eq!(
            config.duration_secs,
            PracticeKind::InteroceptiveScan.default_duration()
        );
    }

    #[test]
    fn test_resolve_session_unknown_stored_practice_defaults() {
        let cli = Cli::parse_from(["attune"]);
        let stored = Config {
            practice: "not-a-practice".into(),
            ..Config::default()
        };

        let (config, _) = resolve_session(&cli, &stored);
        assert_eq!(config.kind, PracticeKind::BodyCheckIn);
    }

    #[test]
    fn test_resolve_session_manual_advance_flags() {
        let cli = Cli::parse_from(["attune", "--no-manual-advance"]);
        let (config, _) = resolve_session(&cli, &Config::default());
        assert!(!config.allow_manual_advance);

        let cli = Cli::parse_from(["attune"]);
        let stored = Config {
            allow_manual_advance: false,
            ..Config::default()
        };
        let (config, _) = resolve_session(&cli, &stored);
        assert!(!config.allow_manual_advance);
    }

    #[test]
    fn test_resolve_session_breath_guide_flag() {
        let cli = Cli::parse_from(["attune", "-p", "breathing-practice", "--no-breath-guide"]);
        let (config, show_guide) = resolve_session(&cli, &Config::default());
        assert_eq!(config.kind, PracticeKind::BreathingPractice);
        assert!(!show_guide);
    }

    #[test]
    fn test_resolve_session_stored_technique_applies_to_breathing() {
        let cli = Cli::parse_from(["attune", "-p", "breathing-practice"]);
        let stored = Config {
            technique: "cyclic-sighing".into(),
            ..Config::default()
        };
        let (config, _) = resolve_session(&cli, &stored);
        assert_eq!(config.technique, Some(BreathingTechnique::CyclicSighing));
    }
}
