use crate::affirmations::AffirmationLibrary;
use crate::breathing::BreathClock;
use crate::insights::InsightsView;
use crate::practice::{PracticeContent, PracticeKind, StepDefinition};
use crate::reflection::ReflectionForm;
use crate::runtime::TICK_RATE_MS;
use crate::session::{Session, SessionConfig, SessionPhase};
use crate::sink::SessionSink;

/// What the terminal is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Setup,
    Practice,
    Reflection,
    Closed,
    Insights,
}

/// One practice session plus everything the screens need around it.
///
/// The app owns the sink and guarantees its contract: for every session,
/// either `on_close` or `on_complete` fires, never both, never twice.
pub struct App<S: SessionSink> {
    pub session: Session,
    pub content: PracticeContent,
    pub form: ReflectionForm,
    pub breath: Option<BreathClock>,
    pub affirmation: String,
    pub sink: S,
    pub save_error: Option<String>,
    pub insights: Option<InsightsView>,
    insights_open: bool,
    duration_idx: usize,
    sink_notified: bool,
    show_breath_guide: bool,
}

impl<S: SessionSink> App<S> {
    pub fn new(config: SessionConfig, show_breath_guide: bool, sink: S) -> Self {
        let kind = config.kind;
        let content = PracticeContent::load(kind);
        let session = Session::new(config, content.step_count());
        let affirmation = AffirmationLibrary::load().today().text.clone();
        let duration_idx = kind
            .duration_choices()
            .iter()
            .position(|&d| d == session.config.duration_secs)
            .unwrap_or(0);

        let mut app = Self {
            session,
            content,
            form: ReflectionForm::new(kind),
            breath: None,
            affirmation,
            sink,
            save_error: None,
            insights: None,
            insights_open: false,
            duration_idx,
            sink_notified: false,
            show_breath_guide,
        };
        app.rebuild_breath_clock();
        app
    }

    /// Discard the finished session and configure a fresh one of the same
    /// practice.
    pub fn reset(&mut self) {
        let config = self.session.config.clone();
        self.session = Session::new(config, self.content.step_count());
        self.form = ReflectionForm::new(self.kind());
        self.save_error = None;
        self.insights = None;
        self.insights_open = false;
        self.sink_notified = false;
        self.rebuild_breath_clock();
    }

    fn rebuild_breath_clock(&mut self) {
        self.breath = match (self.kind(), self.session.config.technique) {
            (PracticeKind::BreathingPractice, Some(technique)) if self.show_breath_guide => {
                Some(BreathClock::new(technique))
            }
            _ => None,
        };
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn kind(&self) -> PracticeKind {
        self.session.config.kind
    }

    pub fn screen(&self) -> Screen {
        if self.insights_open {
            return Screen::Insights;
        }
        match self.session.phase() {
            SessionPhase::Setup => Screen::Setup,
            SessionPhase::Practice => Screen::Practice,
            SessionPhase::Reflection => Screen::Reflection,
            SessionPhase::Closed => Screen::Closed,
        }
    }

    pub fn duration_idx(&self) -> usize {
        self.duration_idx
    }

    pub fn current_step_def(&self) -> &StepDefinition {
        self.content.step(self.session.current_step())
    }

    pub fn current_instructions(&self) -> &[String] {
        self.content.instructions_for(
            self.session.current_step(),
            self.session.config.after_assignment,
        )
    }

    // ── Setup actions ────────────────────────────────────────────────

    pub fn select_duration(&mut self, forward: bool) {
        if self.session.phase() != SessionPhase::Setup {
            return;
        }
        let choices = self.kind().duration_choices();
        self.duration_idx = if forward {
            (self.duration_idx + 1) % choices.len()
        } else {
            (self.duration_idx + choices.len() - 1) % choices.len()
        };
        self.session.config.duration_secs = choices[self.duration_idx];
    }

    pub fn toggle_after_assignment(&mut self) {
        if self.session.phase() == SessionPhase::Setup {
            self.session.config.after_assignment = !self.session.config.after_assignment;
        }
    }

    pub fn cycle_technique(&mut self) {
        if self.session.phase() != SessionPhase::Setup {
            return;
        }
        if let Some(technique) = self.session.config.technique {
            self.session.config.technique = Some(technique.next());
            self.rebuild_breath_clock();
        }
    }

    pub fn start(&mut self) -> bool {
        self.session.begin()
    }

    // ── Practice actions ─────────────────────────────────────────────

    /// 100ms heartbeat. Drives the session clock and, for breathing, the
    /// pacing indicator; both freeze outside the practice phase.
    pub fn on_tick(&mut self) {
        if self.session.phase() != SessionPhase::Practice {
            return;
        }
        self.session.advance_ms(TICK_RATE_MS);
        if self.session.phase() == SessionPhase::Practice {
            if let Some(ref mut breath) = self.breath {
                breath.on_tick();
            }
        }
    }

    pub fn manual_advance(&mut self) -> bool {
        self.session.advance_step()
    }

    // ── Reflection actions ───────────────────────────────────────────

    /// Submit the reflection. Invokes `on_complete` exactly once; a failed
    /// save is surfaced and the in-memory state left as it was.
    pub fn submit(&mut self) -> bool {
        if self.session.phase() != SessionPhase::Reflection || !self.form.is_submittable() {
            return false;
        }
        let payload = self
            .form
            .payload(self.session.duration_secs(), self.session.elapsed_secs());
        if !self.session.submit() {
            return false;
        }
        self.sink_notified = true;
        if let Err(e) = self.sink.on_complete(&payload) {
            self.save_error = Some(format!("could not save reflection: {}", e));
        }
        true
    }

    // ── Close ────────────────────────────────────────────────────────

    /// Abandon the session. Legal from every screen; notifies `on_close`
    /// unless the session already completed through `submit`.
    pub fn close(&mut self) {
        if !self.sink_notified {
            self.sink.on_close();
            self.sink_notified = true;
        }
        self.session.close();
    }

    // ── Insights ─────────────────────────────────────────────────────

    pub fn open_insights(&mut self, view: InsightsView) {
        self.insights = Some(view);
        self.insights_open = true;
    }

    pub fn close_insights(&mut self) {
        self.insights_open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;
    use assert_matches::assert_matches;

    fn app(kind: PracticeKind) -> App<RecordingSink> {
        App::new(SessionConfig::new(kind), true, RecordingSink::new())
    }

    #[test]
    fn test_new_app_starts_on_setup() {
        let app = app(PracticeKind::BodyCheckIn);
        assert_eq!(app.screen(), Screen::Setup);
        assert!(app.breath.is_none());
        assert!(!app.affirmation.is_empty());
    }

    #[test]
    fn test_breathing_app_has_breath_clock() {
        let app = app(PracticeKind::BreathingPractice);
        assert!(app.breath.is_some());
    }

    #[test]
    fn test_breath_guide_can_be_disabled() {
        let app = App::new(
            SessionConfig::new(PracticeKind::BreathingPractice),
            false,
            RecordingSink::new(),
        );
        assert!(app.breath.is_none());
    }

    #[test]
    fn test_duration_selection_cycles_choices() {
        let mut app = app(PracticeKind::BodyCheckIn);
        let choices = PracticeKind::BodyCheckIn.duration_choices();
        let start = app.duration_idx();

        app.select_duration(true);
        assert_eq!(app.duration_idx(), (start + 1) % choices.len());
        assert_eq!(
            app.session.config.duration_secs,
            choices[app.duration_idx()]
        );

        for _ in 0..choices.len() - 1 {
            app.select_duration(true);
        }
        assert_eq!(app.duration_idx(), start);
    }

    #[test]
    fn test_setup_actions_ignored_mid_practice() {
        let mut app = app(PracticeKind::BodyCheckIn);
        app.start();
        let before = app.session.config.duration_secs;
        app.select_duration(true);
        app.toggle_after_assignment();
        assert_eq!(app.session.config.duration_secs, before);
        assert!(!app.session.config.after_assignment);
    }

    #[test]
    fn test_full_timed_flow_invokes_on_complete_once() {
        let mut app = app(PracticeKind::BodyCheckIn);
        app.start();
        assert_eq!(app.screen(), Screen::Practice);

        let ticks = app.session.duration_secs() as u64 * 10;
        for _ in 0..ticks {
            app.on_tick();
        }
        assert_eq!(app.screen(), Screen::Reflection);

        app.form.select(0);
        assert!(app.submit());
        assert_eq!(app.screen(), Screen::Closed);
        assert!(!app.submit());

        assert_eq!(app.sink.completions.len(), 1);
        assert_eq!(app.sink.closes, 0);
        let payload = &app.sink.completions[0];
        assert_eq!(payload.elapsed_secs, app.session.duration_secs());
        for q in app.form.questions() {
            assert!(payload.answers.contains_key(q.key));
        }
    }

    #[test]
    fn test_submit_requires_an_answer() {
        let mut app = app(PracticeKind::BodyCheckIn);
        app.start();
        for _ in 0..app.session.duration_secs() as u64 * 10 {
            app.on_tick();
        }
        assert!(!app.submit());
        app.form.select(2);
        assert!(app.submit());
    }

    #[test]
    fn test_close_invokes_on_close_never_on_complete() {
        for start in [false, true] {
            let mut app = app(PracticeKind::EmotionMapping);
            if start {
                app.start();
                app.on_tick();
            }
            app.close();
            assert_eq!(app.sink.closes, 1);
            assert!(app.sink.completions.is_empty());
            // A second close stays silent
            app.close();
            assert_eq!(app.sink.closes, 1);
        }
    }

    #[test]
    fn test_close_after_submit_does_not_fire_on_close() {
        let mut app = app(PracticeKind::BodyCheckIn);
        app.start();
        for _ in 0..app.session.duration_secs() as u64 * 10 {
            app.on_tick();
        }
        app.form.select(0);
        app.submit();
        app.close();
        assert_eq!(app.sink.completions.len(), 1);
        assert_eq!(app.sink.closes, 0);
    }

    #[test]
    fn test_ticks_after_close_change_nothing() {
        let mut app = app(PracticeKind::BodyCheckIn);
        app.start();
        app.close();
        let elapsed = app.session.elapsed_secs();
        for _ in 0..50 {
            app.on_tick();
        }
        assert_eq!(app.session.elapsed_secs(), elapsed);
    }

    #[test]
    fn test_manual_advance_to_reflection() {
        let mut app = app(PracticeKind::EmotionMapping);
        app.start();
        let steps = app.content.step_count();
        for _ in 0..steps {
            app.manual_advance();
        }
        assert_eq!(app.screen(), Screen::Reflection);
    }

    #[test]
    fn test_cycle_technique_resets_clock() {
        let mut app = app(PracticeKind::BreathingPractice);
        let before = app.breath.as_ref().unwrap().technique();
        app.cycle_technique();
        let after = app.breath.as_ref().unwrap().technique();
        assert_ne!(before, after);
        assert_eq!(app.session.config.technique, Some(after));
    }

    #[test]
    fn test_reset_prepares_new_session() {
        let mut app = app(PracticeKind::BodyCheckIn);
        app.start();
        app.close();
        assert_matches!(app.screen(), Screen::Closed);

        app.reset();
        assert_eq!(app.screen(), Screen::Setup);
        assert_eq!(app.session.elapsed_secs(), 0);
        assert!(!app.session.was_cancelled());

        // The new session gets its own sink notification
        app.close();
        assert_eq!(app.sink.closes, 2);
    }

    #[test]
    fn test_insights_overlay() {
        let mut app = app(PracticeKind::BodyCheckIn);
        app.start();
        app.close();
        app.open_insights(crate::insights::load_or_fallback(None));
        assert_eq!(app.screen(), Screen::Insights);
        assert!(app.insights.as_ref().unwrap().using_fallback);
        app.close_insights();
        assert_eq!(app.screen(), Screen::Closed);
    }

    #[test]
    fn test_debrief_copy_follows_context_flag() {
        let mut app = app(PracticeKind::BodyCheckIn);
        let base = app.current_instructions().to_vec();
        app.toggle_after_assignment();
        let debrief = app.current_instructions().to_vec();
        assert_ne!(base, debrief);
    }
}
