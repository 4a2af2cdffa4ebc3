//! CV Normalizer: turns whatever the extraction gateway produced into a
//! well-formed `CvRecord`.
//!
//! Both entry points are total: a bad extraction degrades to empty fields,
//! never to an error. The editor can always be opened and filled by hand.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::cv::models::{CvRecord, Degree, Experience, PersonalInfo};
use crate::cv::repair::repair_json_text;

const POSITION_KEYS: &[&str] = &["position", "title", "role"];
const COMPANY_KEYS: &[&str] = &["company", "employer", "organization"];
const PERIOD_KEYS: &[&str] = &["period", "dates", "duration"];
const DEGREE_KEYS: &[&str] = &["degree", "title", "qualification"];
const INSTITUTION_KEYS: &[&str] = &["institution", "school", "university"];
const YEAR_KEYS: &[&str] = &["year", "period", "dates", "date"];
const DESCRIPTION_KEYS: &[&str] = &["description", "summary", "details"];

/// Normalizes raw model output text into a record.
///
/// Strict JSON is tried first; on failure the repair pass runs and parsing is
/// retried. Text that still does not parse yields `CvRecord::default()`.
pub fn normalize_response(text: &str) -> CvRecord {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return normalize(&value);
    }

    let repaired = repair_json_text(text);
    match serde_json::from_str::<Value>(&repaired) {
        Ok(value) => {
            debug!("Model output parsed after repair pass");
            normalize(&value)
        }
        Err(e) => {
            warn!("Model output is not parseable JSON, using empty record: {e}");
            CvRecord::default()
        }
    }
}

/// Re-normalizes a record that arrived already typed, e.g. in a `load` action
/// posted by a client. Strings are trimmed and blank list entries dropped.
pub fn normalize_record(record: &CvRecord) -> CvRecord {
    match serde_json::to_value(record) {
        Ok(value) => normalize(&value),
        Err(e) => {
            warn!("Could not re-serialize record for normalization: {e}");
            record.clone()
        }
    }
}

/// Normalizes an already-parsed JSON value into a record.
pub fn normalize(raw: &Value) -> CvRecord {
    let Some(root) = raw.as_object() else {
        if !raw.is_null() {
            warn!("CV payload is not a JSON object, using empty record");
        }
        return CvRecord::default();
    };

    CvRecord {
        personal_info: root
            .get("personalInfo")
            .and_then(Value::as_object)
            .map(normalize_personal_info)
            .unwrap_or_default(),
        skills: string_list(root.get("skills")),
        experiences: object_list(root.get("experiences"), |obj| Experience {
            position: text_field(obj, POSITION_KEYS),
            company: text_field(obj, COMPANY_KEYS),
            period: text_field(obj, PERIOD_KEYS),
            description: text_field(obj, DESCRIPTION_KEYS),
        }),
        degrees: object_list(root.get("degrees"), |obj| Degree {
            degree: text_field(obj, DEGREE_KEYS),
            institution: text_field(obj, INSTITUTION_KEYS),
            year: text_field(obj, YEAR_KEYS),
            description: text_field(obj, DESCRIPTION_KEYS),
        }),
    }
}

fn normalize_personal_info(obj: &Map<String, Value>) -> PersonalInfo {
    PersonalInfo {
        first_name: text_field(obj, &["firstName"]),
        last_name: text_field(obj, &["lastName"]),
        job_title: text_field(obj, &["jobTitle"]),
        synonymous_titles: string_list(obj.get("synonymousTitles")),
        interests: string_list(obj.get("interests")),
    }
}

/// First key that holds a usable scalar wins; a list of strings is joined by newlines.
fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find_map(|value| match value {
            Value::Array(items) => {
                let lines: Vec<String> = items.iter().filter_map(scalar_text).collect();
                (!lines.is_empty()).then(|| lines.join("\n"))
            }
            other => scalar_text(other),
        })
        .unwrap_or_default()
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(single) => scalar_text(single).into_iter().collect(),
        None => Vec::new(),
    }
}

fn object_list<T>(value: Option<&Value>, build: impl Fn(&Map<String, Value>) -> T) -> Vec<T> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_object).map(build).collect())
        .unwrap_or_default()
}
