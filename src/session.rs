use crate::breathing::BreathingTechnique;
use crate::practice::PracticeKind;

/// Parameters gathered by the setup screen before a session starts.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub kind: PracticeKind,
    pub duration_secs: u32,
    /// Shows the debrief variant of step copy where the content provides one.
    pub after_assignment: bool,
    /// Single switch for manual step navigation, shared by every practice.
    pub allow_manual_advance: bool,
    pub technique: Option<BreathingTechnique>,
}

impl SessionConfig {
    pub fn new(kind: PracticeKind) -> Self {
        Self {
            kind,
            duration_secs: kind.default_duration(),
            after_assignment: false,
            allow_manual_advance: true,
            technique: match kind {
                PracticeKind::BreathingPractice => Some(BreathingTechnique::Box),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Setup,
    Practice,
    Reflection,
    Closed,
}

/// A single in-memory practice session.
///
/// One countdown clock drives everything: `elapsed_secs` advances once per
/// whole second while the session is in `Practice`, and the active step is
/// derived from it by splitting the duration into equal buckets. At most one
/// session exists per app instance; it is discarded on close.
#[derive(Debug, Clone)]
pub struct Session {
    pub config: SessionConfig,
    step_count: usize,
    phase: SessionPhase,
    elapsed_secs: u32,
    /// Sub-second remainder carried between 100ms ticks.
    carry_ms: u64,
    /// Set by a manual advance; suppresses automatic step derivation for the
    /// rest of the session.
    manual_step: Option<usize>,
    cancelled: bool,
    submitted: bool,
}

impl Session {
    pub fn new(config: SessionConfig, step_count: usize) -> Self {
        debug_assert!(step_count > 0);
        Self {
            config,
            step_count,
            phase: SessionPhase::Setup,
            elapsed_secs: 0,
            carry_ms: 0,
            manual_step: None,
            cancelled: false,
            submitted: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Practice
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn duration_secs(&self) -> u32 {
        self.config.duration_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.config.duration_secs.saturating_sub(self.elapsed_secs)
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn was_submitted(&self) -> bool {
        self.submitted
    }

    /// 0.0 .. 1.0 progress through the session clock.
    pub fn progress(&self) -> f64 {
        if self.config.duration_secs == 0 {
            return 0.0;
        }
        (self.elapsed_secs as f64 / self.config.duration_secs as f64).min(1.0)
    }

    /// Step index the clock would derive at elapsed time `t`.
    ///
    /// Equal buckets by integer division: with d seconds and n steps the
    /// boundaries fall at d/n, 2*(d/n), ... and the index is clamped to the
    /// last step.
    pub fn step_index_at(&self, t: u32) -> usize {
        let step_len = (self.config.duration_secs / self.step_count as u32).max(1);
        ((t / step_len) as usize).min(self.step_count - 1)
    }

    /// The active step: the manually chosen one if navigation happened,
    /// otherwise derived from the clock.
    pub fn current_step(&self) -> usize {
        self.manual_step
            .unwrap_or_else(|| self.step_index_at(self.elapsed_secs))
    }

    pub fn manual_navigation(&self) -> bool {
        self.manual_step.is_some()
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Setup → Practice on the explicit start action.
    pub fn begin(&mut self) -> bool {
        if self.phase != SessionPhase::Setup {
            return false;
        }
        self.phase = SessionPhase::Practice;
        true
    }

    /// Feed wall time from the tick loop. Whole seconds roll into
    /// `elapsed_secs`; reaching the configured duration moves the session to
    /// `Reflection` exactly once and stops the clock.
    pub fn advance_ms(&mut self, ms: u64) {
        if self.phase != SessionPhase::Practice {
            return;
        }
        self.carry_ms += ms;
        while self.carry_ms >= 1000 && self.phase == SessionPhase::Practice {
            self.carry_ms -= 1000;
            self.elapsed_secs += 1;
            if self.elapsed_secs >= self.config.duration_secs {
                self.phase = SessionPhase::Reflection;
            }
        }
    }

    /// Manual step navigation. Advancing past the last step completes the
    /// session immediately without waiting out the clock.
    pub fn advance_step(&mut self) -> bool {
        if self.phase != SessionPhase::Practice || !self.config.allow_manual_advance {
            return false;
        }
        let next = self.current_step() + 1;
        if next >= self.step_count {
            self.phase = SessionPhase::Reflection;
        } else {
            self.manual_step = Some(next);
        }
        true
    }

    /// Reflection → Closed on submit. The caller owns invoking the sink.
    pub fn submit(&mut self) -> bool {
        if self.phase != SessionPhase::Reflection {
            return false;
        }
        self.phase = SessionPhase::Closed;
        self.submitted = true;
        true
    }

    /// Unconditional discard, legal from every phase. Never produces a
    /// completion payload.
    pub fn close(&mut self) {
        if self.phase != SessionPhase::Closed {
            self.phase = SessionPhase::Closed;
            self.cancelled = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn session(kind: PracticeKind, duration: u32, steps: usize) -> Session {
        let mut config = SessionConfig::new(kind);
        config.duration_secs = duration;
        Session::new(config, steps)
    }

    #[test]
    fn test_new_session_is_in_setup() {
        let s = session(PracticeKind::BodyCheckIn, 120, 5);
        assert_matches!(s.phase(), SessionPhase::Setup);
        assert_eq!(s.elapsed_secs(), 0);
        assert!(!s.is_running());
    }

    #[test]
    fn test_begin_only_from_setup() {
        let mut s = session(PracticeKind::BodyCheckIn, 120, 5);
        assert!(s.begin());
        assert!(s.is_running());
        assert!(!s.begin());
    }

    #[test]
    fn test_step_index_invariant_for_all_durations() {
        // floor(t / (d/n)) clamped to [0, n-1], for every t in [0, d]
        for kind in PracticeKind::all() {
            for &d in kind.duration_choices() {
                for n in [4usize, 5] {
                    let s = session(kind, d, n);
                    let step_len = d / n as u32;
                    for t in 0..=d {
                        let expected = ((t / step_len) as usize).min(n - 1);
                        assert_eq!(s.step_index_at(t), expected, "d={} n={} t={}", d, n, t);
                    }
                }
            }
        }
    }

    #[test]
    fn test_two_minutes_five_steps_boundaries() {
        let s = session(PracticeKind::EmotionMapping, 120, 5);
        // boundaries at 24, 48, 72, 96
        assert_eq!(s.step_index_at(0), 0);
        assert_eq!(s.step_index_at(23), 0);
        assert_eq!(s.step_index_at(24), 1);
        assert_eq!(s.step_index_at(47), 1);
        assert_eq!(s.step_index_at(48), 2);
        assert_eq!(s.step_index_at(50), 2);
        assert_eq!(s.step_index_at(72), 3);
        assert_eq!(s.step_index_at(96), 4);
        assert_eq!(s.step_index_at(120), 4);
    }

    #[test]
    fn test_advance_ms_rolls_whole_seconds() {
        let mut s = session(PracticeKind::BodyCheckIn, 60, 5);
        s.begin();
        for _ in 0..9 {
            s.advance_ms(100);
        }
        assert_eq!(s.elapsed_secs(), 0);
        s.advance_ms(100);
        assert_eq!(s.elapsed_secs(), 1);
        s.advance_ms(2500);
        assert_eq!(s.elapsed_secs(), 3);
    }

    #[test]
    fn test_completes_exactly_at_duration() {
        let mut s = session(PracticeKind::BreathingPractice, 30, 4);
        s.begin();
        s.advance_ms(29_000);
        assert!(s.is_running());
        assert_eq!(s.remaining_secs(), 1);
        s.advance_ms(1000);
        assert_matches!(s.phase(), SessionPhase::Reflection);
        assert_eq!(s.elapsed_secs(), 30);
    }

    #[test]
    fn test_clock_stops_after_completion() {
        let mut s = session(PracticeKind::BreathingPractice, 30, 4);
        s.begin();
        s.advance_ms(45_000);
        assert_eq!(s.elapsed_secs(), 30);
        s.advance_ms(10_000);
        assert_eq!(s.elapsed_secs(), 30);
    }

    #[test]
    fn test_ticks_ignored_outside_practice() {
        let mut s = session(PracticeKind::BodyCheckIn, 60, 5);
        s.advance_ms(5000);
        assert_eq!(s.elapsed_secs(), 0);
    }

    #[test]
    fn test_manual_advance_is_sticky() {
        let mut s = session(PracticeKind::EmotionMapping, 300, 5);
        s.begin();
        assert_eq!(s.current_step(), 0);
        assert!(s.advance_step());
        assert_eq!(s.current_step(), 1);
        assert!(s.manual_navigation());
        // The clock keeps running but no longer drives the step
        s.advance_ms(200_000);
        assert_eq!(s.current_step(), 1);
    }

    #[test]
    fn test_manual_advance_through_all_steps_completes() {
        let mut s = session(PracticeKind::EmotionMapping, 300, 5);
        s.begin();
        for _ in 0..4 {
            assert!(s.advance_step());
            assert!(s.is_running());
        }
        assert!(s.advance_step());
        assert_matches!(s.phase(), SessionPhase::Reflection);
        assert!(s.elapsed_secs() < 300);
    }

    #[test]
    fn test_manual_advance_disabled() {
        let mut config = SessionConfig::new(PracticeKind::BodyCheckIn);
        config.allow_manual_advance = false;
        let mut s = Session::new(config, 5);
        s.begin();
        assert!(!s.advance_step());
        assert_eq!(s.current_step(), 0);
        assert!(!s.manual_navigation());
    }

    #[test]
    fn test_submit_only_from_reflection() {
        let mut s = session(PracticeKind::BodyCheckIn, 60, 5);
        assert!(!s.submit());
        s.begin();
        assert!(!s.submit());
        s.advance_ms(60_000);
        assert!(s.submit());
        assert_matches!(s.phase(), SessionPhase::Closed);
        assert!(s.was_submitted());
        assert!(!s.was_cancelled());
        assert!(!s.submit());
    }

    #[test]
    fn test_close_from_any_phase_discards() {
        for advance in [0u64, 10_000, 60_000] {
            let mut s = session(PracticeKind::BodyCheckIn, 60, 5);
            s.begin();
            s.advance_ms(advance);
            s.close();
            assert_matches!(s.phase(), SessionPhase::Closed);
            assert!(s.was_cancelled());
            assert!(!s.was_submitted());
        }
    }

    #[test]
    fn test_close_after_submit_keeps_submitted() {
        let mut s = session(PracticeKind::BodyCheckIn, 60, 5);
        s.begin();
        s.advance_ms(60_000);
        s.submit();
        s.close();
        assert!(s.was_submitted());
        assert!(!s.was_cancelled());
    }

    #[test]
    fn test_progress() {
        let mut s = session(PracticeKind::BodyCheckIn, 120, 5);
        s.begin();
        assert_eq!(s.progress(), 0.0);
        s.advance_ms(60_000);
        assert!((s.progress() - 0.5).abs() < f64::EPSILON);
        s.advance_ms(60_000);
        assert_eq!(s.progress(), 1.0);
    }

    #[test]
    fn test_default_config_per_kind() {
        let cfg = SessionConfig::new(PracticeKind::BreathingPractice);
        assert!(cfg.technique.is_some());
        assert!(cfg.allow_manual_advance);
        assert!(!cfg.after_assignment);
        let cfg = SessionConfig::new(PracticeKind::BodyCheckIn);
        assert!(cfg.technique.is_none());
        assert_eq!(cfg.duration_secs, 120);
    }
}
