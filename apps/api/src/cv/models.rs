use serde::{Deserialize, Serialize};

/// The root record extracted from one uploaded CV.
///
/// Every list is always present and every string defaults to empty; the
/// normalizer guarantees this for upstream data, `#[serde(default)]` for
/// payloads sent back by the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CvRecord {
    pub personal_info: PersonalInfo,
    pub skills: Vec<String>,
    pub experiences: Vec<Experience>,
    pub degrees: Vec<Degree>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub job_title: String,
    pub synonymous_titles: Vec<String>,
    pub interests: Vec<String>,
}

impl PersonalInfo {
    /// "First Last", skipping whichever part is blank.
    pub fn full_name(&self) -> String {
        [self.first_name.trim(), self.last_name.trim()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub position: String,
    pub company: String,
    pub period: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Degree {
    pub degree: String,
    pub institution: String,
    pub year: String,
    pub description: String,
}
