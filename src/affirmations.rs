use chrono::{Datelike, Local, NaiveDate};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::from_str;

use crate::practice::content::CONTENT_DIR;

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Affirmation {
    pub category: String,
    pub text: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AffirmationLibrary {
    pub name: String,
    pub entries: Vec<Affirmation>,
}

impl AffirmationLibrary {
    /// The library ships inside the binary; failing to load it is a build
    /// defect, not a runtime condition.
    pub fn load() -> Self {
        let file = CONTENT_DIR
            .get_file("affirmations.json")
            .expect("Affirmation file not found");

        let file_as_str = file
            .contents_utf8()
            .expect("Unable to interpret file as a string");

        from_str(file_as_str).expect("Unable to deserialize affirmation json")
    }

    /// Deterministic pick for a given date, so the setup screen shows the
    /// same line all day.
    pub fn daily(&self, date: NaiveDate) -> &Affirmation {
        let index = date.num_days_from_ce().unsigned_abs() as usize % self.entries.len();
        &self.entries[index]
    }

    pub fn today(&self) -> &Affirmation {
        self.daily(Local::now().date_naive())
    }

    pub fn random(&self) -> &Affirmation {
        self.entries
            .choose(&mut rand::thread_rng())
            .expect("affirmation library is never empty")
    }

    pub fn by_category(&self, category: &str) -> Vec<&Affirmation> {
        self.entries
            .iter()
            .filter(|a| a.category == category)
            .collect()
    }
}
