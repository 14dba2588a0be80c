use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::practice::PracticeKind;

/// One single-select question group on the reflection screen.
#[derive(Debug, Clone, Copy)]
pub struct QuestionDef {
    pub key: &'static str,
    pub prompt: &'static str,
    pub options: &'static [&'static str],
}

/// What the user ended up answering for a presented question. Every
/// presented key appears in the payload, skipped or not, so downstream
/// consumers never guess at missing fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerValue {
    Selected(String),
    Skipped,
}

impl AnswerValue {
    pub fn selected(&self) -> Option<&str> {
        match self {
            AnswerValue::Selected(v) => Some(v),
            AnswerValue::Skipped => None,
        }
    }
}

/// Post-session ratings plus session metadata, handed whole to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionPayload {
    pub kind: String,
    pub answers: BTreeMap<String, AnswerValue>,
    pub duration_secs: u32,
    pub elapsed_secs: u32,
    /// RFC 3339 local timestamp of submission.
    pub completed_at: String,
}

/// The question groups shown after each practice. Fixed at compile time,
/// like the step content; three to four groups per practice.
pub fn question_set(kind: PracticeKind) -> &'static [QuestionDef] {
    match kind {
        PracticeKind::BodyCheckIn => &[
            QuestionDef {
                key: "overall_tension",
                prompt: "How much tension are you holding?",
                options: &["light", "moderate", "heavy"],
            },
            QuestionDef {
                key: "energy_level",
                prompt: "Where is your energy?",
                options: &["drained", "steady", "charged"],
            },
            QuestionDef {
                key: "release",
                prompt: "Did anything release during the scan?",
                options: &["yes", "a little", "not yet"],
            },
        ],
        PracticeKind::BreathingPractice => &[
            QuestionDef {
                key: "calm_level",
                prompt: "Compared to when you started, you feel",
                options: &["calmer", "about the same", "more activated"],
            },
            QuestionDef {
                key: "breath_depth",
                prompt: "How deep did your breath get?",
                options: &["shallow", "fuller", "deep"],
            },
            QuestionDef {
                key: "technique_fit",
                prompt: "Did this pacing work for you?",
                options: &["helped", "neutral", "not for me"],
            },
            QuestionDef {
                key: "ready",
                prompt: "Ready for what's next?",
                options: &["ready", "almost", "need more time"],
            },
        ],
        PracticeKind::EmotionMapping => &[
            QuestionDef {
                key: "primary_emotion",
                prompt: "Strongest feeling right now",
                options: &["calm", "anxious", "frustrated", "sad", "energized"],
            },
            QuestionDef {
                key: "intensity",
                prompt: "How intense is it?",
                options: &["mild", "moderate", "strong"],
            },
            QuestionDef {
                key: "body_location",
                prompt: "Where does it sit?",
                options: &["head", "chest", "stomach", "all over"],
            },
            QuestionDef {
                key: "next_need",
                prompt: "What do you need next?",
                options: &["a break", "movement", "talk to someone", "back to work"],
            },
        ],
        PracticeKind::InteroceptiveScan => &[
            QuestionDef {
                key: "signal_clarity",
                prompt: "How clear were your body signals?",
                options: &["clear", "faint", "mixed"],
            },
            QuestionDef {
                key: "strongest_signal",
                prompt: "Which signal stood out?",
                options: &["breath", "heartbeat", "temperature", "tension"],
            },
            QuestionDef {
                key: "settledness",
                prompt: "Overall, your body feels",
                options: &["settled", "partly settled", "unsettled"],
            },
        ],
    }
}

/// Accumulates single-select answers for one reflection screen.
#[derive(Debug, Clone)]
pub struct ReflectionForm {
    kind: PracticeKind,
    questions: &'static [QuestionDef],
    /// Selected option index per question, in presentation order.
    selections: Vec<Option<usize>>,
    cursor: usize,
}

impl ReflectionForm {
    pub fn new(kind: PracticeKind) -> Self {
        let questions = question_set(kind);
        Self {
            kind,
            questions,
            selections: vec![None; questions.len()],
            cursor: 0,
        }
    }

    pub fn questions(&self) -> &'static [QuestionDef] {
        self.questions
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selection(&self, question: usize) -> Option<usize> {
        self.selections.get(question).copied().flatten()
    }

    pub fn cursor_up(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.questions.len() {
            self.cursor += 1;
        }
    }

    /// Select an option for the question under the cursor. Out-of-range
    /// indexes are ignored; the option set is closed.
    pub fn select(&mut self, option: usize) {
        if option < self.questions[self.cursor].options.len() {
            self.selections[self.cursor] = Some(option);
        }
    }

    /// Cycle the current question's selection left/right, for arrow keys.
    pub fn cycle(&mut self, forward: bool) {
        let len = self.questions[self.cursor].options.len();
        let next = match self.selections[self.cursor] {
            None => {
                if forward {
                    0
                } else {
                    len - 1
                }
            }
            Some(cur) => {
                if forward {
                    (cur + 1) % len
                } else {
                    (cur + len - 1) % len
                }
            }
        };
        self.selections[self.cursor] = Some(next);
    }

    pub fn answered_count(&self) -> usize {
        self.selections.iter().filter(|s| s.is_some()).count()
    }

    /// Submission is meaningful once at least one question was touched.
    pub fn is_submittable(&self) -> bool {
        self.answered_count() > 0
    }

    /// Build the completion payload. Every presented question key appears;
    /// untouched ones are carried as `Skipped`.
    pub fn payload(&self, duration_secs: u32, elapsed_secs: u32) -> ReflectionPayload {
        let answers = self
            .questions
            .iter()
            .zip(&self.selections)
            .map(|(q, sel)| {
                let value = match sel {
                    Some(i) => AnswerValue::Selected(q.options[*i].to_string()),
                    None => AnswerValue::Skipped,
                };
                (q.key.to_string(), value)
            })
            .collect();

        ReflectionPayload {
            kind: self.kind.to_string(),
            answers,
            duration_secs,
            elapsed_secs,
            completed_at: Local::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_sets_sized_per_practice() {
        for kind in PracticeKind::all() {
            let qs = question_set(kind);
            assert!((3..=4).contains(&qs.len()), "{} has {}", kind, qs.len());
            for q in qs {
                assert!(q.options.len() >= 3);
            }
        }
    }

    #[test]
    fn test_question_keys_unique_per_set() {
        for kind in PracticeKind::all() {
            let keys: std::collections::HashSet<_> =
                question_set(kind).iter().map(|q| q.key).collect();
            assert_eq!(keys.len(), question_set(kind).len());
        }
    }

    #[test]
    fn test_new_form_is_untouched() {
        let form = ReflectionForm::new(PracticeKind::BodyCheckIn);
        assert_eq!(form.answered_count(), 0);
        assert!(!form.is_submittable());
        assert_eq!(form.cursor(), 0);
    }

    #[test]
    fn test_select_and_overwrite() {
        let mut form = ReflectionForm::new(PracticeKind::BodyCheckIn);
        form.select(0);
        assert_eq!(form.selection(0), Some(0));
        form.select(2);
        assert_eq!(form.selection(0), Some(2));
        assert_eq!(form.answered_count(), 1);
        assert!(form.is_submittable());
    }

    #[test]
    fn test_select_out_of_range_ignored() {
        let mut form = ReflectionForm::new(PracticeKind::BodyCheckIn);
        form.select(99);
        assert_eq!(form.selection(0), None);
    }

    #[test]
    fn test_cursor_bounds() {
        let mut form = ReflectionForm::new(PracticeKind::InteroceptiveScan);
        form.cursor_up();
        assert_eq!(form.cursor(), 0);
        for _ in 0..10 {
            form.cursor_down();
        }
        assert_eq!(form.cursor(), form.questions().len() - 1);
    }

    #[test]
    fn test_cycle_wraps_both_directions() {
        let mut form = ReflectionForm::new(PracticeKind::BodyCheckIn);
        form.cycle(true);
        assert_eq!(form.selection(0), Some(0));
        form.cycle(false);
        let last = form.questions()[0].options.len() - 1;
        assert_eq!(form.selection(0), Some(last));
        form.cycle(true);
        assert_eq!(form.selection(0), Some(0));
    }

    #[test]
    fn test_payload_contains_every_presented_key() {
        let mut form = ReflectionForm::new(PracticeKind::EmotionMapping);
        form.select(1); // answer only the first question
        let payload = form.payload(300, 180);

        assert_eq!(payload.kind, "EmotionMapping");
        assert_eq!(payload.answers.len(), form.questions().len());
        for q in form.questions() {
            assert!(payload.answers.contains_key(q.key), "missing {}", q.key);
        }
        assert_eq!(
            payload.answers["primary_emotion"],
            AnswerValue::Selected("anxious".to_string())
        );
        assert_eq!(payload.answers["intensity"], AnswerValue::Skipped);
        assert_eq!(payload.duration_secs, 300);
        assert_eq!(payload.elapsed_secs, 180);
    }

    #[test]
    fn test_payload_timestamp_is_rfc3339() {
        let form = ReflectionForm::new(PracticeKind::BodyCheckIn);
        let payload = form.payload(60, 60);
        assert!(chrono::DateTime::parse_from_rfc3339(&payload.completed_at).is_ok());
    }

    #[test]
    fn test_payload_roundtrips_through_json() {
        let mut form = ReflectionForm::new(PracticeKind::InteroceptiveScan);
        form.select(2);
        form.cursor_down();
        form.select(0);
        let payload = form.payload(120, 120);

        let json = serde_json::to_string(&payload).unwrap();
        let back: ReflectionPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(payload, back);
    }

    #[test]
    fn test_answer_value_accessor() {
        assert_eq!(
            AnswerValue::Selected("calm".into()).selected(),
            Some("calm")
        );
        assert_eq!(AnswerValue::Skipped.selected(), None);
    }
}
