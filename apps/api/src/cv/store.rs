//! Editable Record Store: the single in-memory CV session.
//!
//! # Architecture
//! - `SessionState` is an immutable value: the current record snapshot (shared
//!   via `Arc`) plus four independent edit flags and a revision counter.
//! - Every change is an `Action` passed through `reduce`, a pure function
//!   `(&SessionState, Action) -> Result<SessionState, StoreError>`.
//! - `CvStore` owns the state inside a `tokio::sync::watch` channel. The reducer
//!   runs under the channel's write lock, so subscribers observe either the old
//!   snapshot or the complete new one, never an intermediate.
//!
//! Section identity is positional. An index always refers to the snapshot that
//! is current when the action is reduced.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;

use crate::cv::models::{CvRecord, Degree, Experience};

// ────────────────────────────────────────────────────────────────────────────
// Sections and edit flags
// ────────────────────────────────────────────────────────────────────────────

/// The four editable sections of a record, named as in the JSON payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    PersonalInfo,
    Skills,
    Experiences,
    Degrees,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Section::PersonalInfo => "personalInfo",
            Section::Skills => "skills",
            Section::Experiences => "experiences",
            Section::Degrees => "degrees",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditFlags {
    pub personal_info: bool,
    pub skills: bool,
    pub experiences: bool,
    pub degrees: bool,
}

impl EditFlags {
    fn set(&mut self, section: Section, editing: bool) {
        let flag = match section {
            Section::PersonalInfo => &mut self.personal_info,
            Section::Skills => &mut self.skills,
            Section::Experiences => &mut self.experiences,
            Section::Degrees => &mut self.degrees,
        };
        *flag = editing;
    }
}

/// Sub-fields of `personalInfo`, addressed by their JSON key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PersonalField {
    FirstName,
    LastName,
    JobTitle,
    SynonymousTitles,
    Interests,
}

impl PersonalField {
    fn parse(key: &str) -> Option<Self> {
        match key {
            "firstName" => Some(PersonalField::FirstName),
            "lastName" => Some(PersonalField::LastName),
            "jobTitle" => Some(PersonalField::JobTitle),
            "synonymousTitles" => Some(PersonalField::SynonymousTitles),
            "interests" => Some(PersonalField::Interests),
            _ => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Actions and errors
// ────────────────────────────────────────────────────────────────────────────

/// Key for `UpdateItem`: a field name for `personalInfo`, an index for lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemKey {
    Index(i64),
    Field(String),
}

/// Every mutation the store accepts.
///
/// Wire form: `{"type": "removeItem", "section": "skills", "index": 0}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    /// Replaces the record and clears all edit flags.
    Load { record: CvRecord },
    BeginEdit { section: Section },
    EndEdit { section: Section },
    AddItem { section: Section, item: Value },
    RemoveItem { section: Section, index: i64 },
    /// Replaces (never merges) the addressed field or element.
    UpdateItem {
        section: Section,
        key: ItemKey,
        value: Value,
    },
}

/// Invalid-argument conditions. The editor UI cannot produce these through
/// normal interaction, so each one points at a caller bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no CV has been loaded yet")]
    NoRecord,

    #[error("section '{0}' is not a list")]
    NotAList(Section),

    #[error("index {index} is out of range for '{section}' (length {len})")]
    IndexOutOfRange {
        section: Section,
        index: i64,
        len: usize,
    },

    #[error("unknown personalInfo field '{0}'")]
    UnknownField(String),

    #[error("invalid key for '{section}': {reason}")]
    InvalidKey { section: Section, reason: String },

    #[error("invalid value for '{section}': {reason}")]
    InvalidItem { section: Section, reason: String },
}

// ────────────────────────────────────────────────────────────────────────────
// State and reducer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub record: Option<Arc<CvRecord>>,
    pub editing: EditFlags,
    /// Incremented by every accepted action.
    pub revision: u64,
}

impl SessionState {
    fn current(&self) -> Result<&Arc<CvRecord>, StoreError> {
        self.record.as_ref().ok_or(StoreError::NoRecord)
    }
}

/// Applies one action to a snapshot, producing the next snapshot.
///
/// Pure: `state` is never modified. On error nothing about the session changes.
pub fn reduce(state: &SessionState, action: Action) -> Result<SessionState, StoreError> {
    let mut next = match action {
        Action::Load { record } => SessionState {
            record: Some(Arc::new(record)),
            editing: EditFlags::default(),
            revision: state.revision,
        },
        Action::BeginEdit { section } => with_flag(state, section, true)?,
        Action::EndEdit { section } => with_flag(state, section, false)?,
        Action::AddItem { section, item } => {
            let mut record = CvRecord::clone(state.current()?);
            add_item(&mut record, section, item)?;
            with_record(state, record)
        }
        Action::RemoveItem { section, index } => {
            let mut record = CvRecord::clone(state.current()?);
            remove_item(&mut record, section, index)?;
            with_record(state, record)
        }
        Action::UpdateItem {
            section,
            key,
            value,
        } => {
            let mut record = CvRecord::clone(state.current()?);
            update_item(&mut record, section, key, value)?;
            with_record(state, record)
        }
    };
    next.revision = state.revision + 1;
    Ok(next)
}

/// Flag changes share the record `Arc`; no record data is copied or touched.
fn with_flag(
    state: &SessionState,
    section: Section,
    editing: bool,
) -> Result<SessionState, StoreError> {
    state.current()?;
    let mut next = state.clone();
    next.editing.set(section, editing);
    Ok(next)
}

fn with_record(state: &SessionState, record: CvRecord) -> SessionState {
    SessionState {
        record: Some(Arc::new(record)),
        editing: state.editing,
        revision: state.revision,
    }
}

fn add_item(record: &mut CvRecord, section: Section, item: Value) -> Result<(), StoreError> {
    match section {
        Section::PersonalInfo => return Err(StoreError::NotAList(section)),
        Section::Skills => record.skills.push(decode::<String>(section, item)?),
        Section::Experiences => record.experiences.push(decode::<Experience>(section, item)?),
        Section::Degrees => record.degrees.push(decode::<Degree>(section, item)?),
    }
    Ok(())
}

fn remove_item(record: &mut CvRecord, section: Section, index: i64) -> Result<(), StoreError> {
    match section {
        Section::PersonalInfo => return Err(StoreError::NotAList(section)),
        Section::Skills => {
            let i = checked_index(section, index, record.skills.len())?;
            record.skills.remove(i);
        }
        Section::Experiences => {
            let i = checked_index(section, index, record.experiences.len())?;
            record.experiences.remove(i);
        }
        Section::Degrees => {
            let i = checked_index(section, index, record.degrees.len())?;
            record.degrees.remove(i);
        }
    }
    Ok(())
}

fn update_item(
    record: &mut CvRecord,
    section: Section,
    key: ItemKey,
    value: Value,
) -> Result<(), StoreError> {
    match (section, key) {
        (Section::PersonalInfo, ItemKey::Field(name)) => {
            let field = PersonalField::parse(&name).ok_or(StoreError::UnknownField(name))?;
            let info = &mut record.personal_info;
            match field {
                PersonalField::FirstName => info.first_name = decode(section, value)?,
                PersonalField::LastName => info.last_name = decode(section, value)?,
                PersonalField::JobTitle => info.job_title = decode(section, value)?,
                PersonalField::SynonymousTitles => info.synonymous_titles = decode(section, value)?,
                PersonalField::Interests => info.interests = decode(section, value)?,
            }
        }
        (Section::PersonalInfo, ItemKey::Index(_)) => {
            return Err(StoreError::InvalidKey {
                section,
                reason: "personalInfo is addressed by field name".to_string(),
            });
        }
        (_, ItemKey::Field(_)) => {
            return Err(StoreError::InvalidKey {
                section,
                reason: "list sections are addressed by numeric index".to_string(),
            });
        }
        (Section::Skills, ItemKey::Index(index)) => {
            let i = checked_index(section, index, record.skills.len())?;
            record.skills[i] = decode(section, value)?;
        }
        (Section::Experiences, ItemKey::Index(index)) => {
            let i = checked_index(section, index, record.experiences.len())?;
            record.experiences[i] = decode(section, value)?;
        }
        (Section::Degrees, ItemKey::Index(index)) => {
            let i = checked_index(section, index, record.degrees.len())?;
            record.degrees[i] = decode(section, value)?;
        }
    }
    Ok(())
}

fn checked_index(section: Section, index: i64, len: usize) -> Result<usize, StoreError> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or(StoreError::IndexOutOfRange {
            section,
            index,
            len,
        })
}

fn decode<T: DeserializeOwned>(section: Section, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::InvalidItem {
        section,
        reason: e.to_string(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

/// Holds the session state and publishes every accepted snapshot.
pub struct CvStore {
    tx: watch::Sender<SessionState>,
    extracting: AtomicBool,
}

impl Default for CvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CvStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self {
            tx,
            extracting: AtomicBool::new(false),
        }
    }

    /// Reduces `action` against the current snapshot and publishes the result.
    /// A rejected action publishes nothing.
    pub fn dispatch(&self, action: Action) -> Result<SessionState, StoreError> {
        let mut outcome = Err(StoreError::NoRecord);
        self.tx.send_if_modified(|state| {
            outcome = reduce(state, action);
            match &outcome {
                Ok(next) => {
                    *state = next.clone();
                    true
                }
                Err(_) => false,
            }
        });
        outcome
    }

    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Claims the single extraction slot. `None` while another extraction runs.
    pub fn begin_extraction(&self) -> Option<ExtractionGuard<'_>> {
        self.extracting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ExtractionGuard {
                flag: &self.extracting,
            })
    }

    pub fn is_extracting(&self) -> bool {
        self.extracting.load(Ordering::Acquire)
    }
}

/// Releases the extraction slot when dropped, whatever the extraction outcome.
pub struct ExtractionGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for ExtractionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
