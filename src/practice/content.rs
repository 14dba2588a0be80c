use include_dir::{include_dir, Dir};
use serde::Deserialize;
use serde_json::from_str;
use std::error::Error;

use super::PracticeKind;

pub(crate) static CONTENT_DIR: Dir = include_dir!("src/content");

/// A single timed step of a practice: what to show while the step is active.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct StepDefinition {
    pub id: String,
    pub title: String,
    pub instructions: Vec<String>,
    /// Variant copy shown when the session follows a tough assignment.
    /// Only some practices carry it; the base instructions are the fallback.
    #[serde(default)]
    pub debrief_instructions: Option<Vec<String>>,
    pub tip: String,
}

/// The full step table for one practice, loaded from embedded JSON.
#[derive(Deserialize, Clone, Debug)]
pub struct PracticeContent {
    pub id: String,
    pub name: String,
    pub steps: Vec<StepDefinition>,
}

impl PracticeContent {
    /// The content ships inside the binary, so a missing or malformed file
    /// is a build defect, not a runtime condition.
    pub fn load(kind: PracticeKind) -> Self {
        read_content_from_file(format!("{}.json", kind.content_file())).unwrap()
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step(&self, index: usize) -> &StepDefinition {
        &self.steps[index.min(self.steps.len() - 1)]
    }

    pub fn step_by_id(&self, id: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Instruction lines for a step, honouring the after-assignment variant
    /// where the content provides one.
    pub fn instructions_for(&self, index: usize, after_assignment: bool) -> &[String] {
        let step = self.step(index);
        if after_assignment {
            if let Some(ref debrief) = step.debrief_instructions {
                return debrief;
            }
        }
        &step.instructions
    }
}

fn read_content_from_file(file_name: String) -> Result<PracticeContent, Box<dyn Error>> {
    let file = CONTENT_DIR
        .get_file(file_name)
        .expect("Practice content file not found");

    let file_as_str = file
        .contents_utf8()
        .expect("Unable to interpret file as a string");

    let content = from_str(file_as_str).expect("Unable to deserialize practice content json");

    Ok(content)
}
