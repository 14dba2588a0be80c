pub mod content;

pub use content::{PracticeContent, StepDefinition};

use clap::ValueEnum;

/// The four guided practices offered by the app.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum PracticeKind {
    BodyCheckIn,
    BreathingPractice,
    EmotionMapping,
    InteroceptiveScan,
}

impl PracticeKind {
    /// File stem of the embedded content for this practice.
    pub fn content_file(&self) -> &'static str {
        match self {
            PracticeKind::BodyCheckIn => "body_check_in",
            PracticeKind::BreathingPractice => "breathing_practice",
            PracticeKind::EmotionMapping => "emotion_mapping",
            PracticeKind::InteroceptiveScan => "interoceptive_scan",
        }
    }

    /// Selectable session lengths in seconds.
    ///
    /// The sets are deliberately not unified; each practice is tuned to the
    /// pace of its own content (see DESIGN.md).
    pub fn duration_choices(&self) -> &'static [u32] {
        match self {
            PracticeKind::BreathingPractice => &[30, 60, 120, 240],
            PracticeKind::BodyCheckIn => &[60, 120, 180],
            PracticeKind::InteroceptiveScan => &[60, 120, 180],
            PracticeKind::EmotionMapping => &[60, 180, 300],
        }
    }

    /// Default session length offered on the setup screen.
    pub fn default_duration(&self) -> u32 {
        self.duration_choices()[1]
    }

    pub fn all() -> [PracticeKind; 4] {
        [
            PracticeKind::BodyCheckIn,
            PracticeKind::BreathingPractice,
            PracticeKind::EmotionMapping,
            PracticeKind::InteroceptiveScan,
        ]
    }
}
