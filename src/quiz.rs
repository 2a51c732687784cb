use log::{debug, info, warn};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MULTIPLE_CHOICE: &str = "multiple_choice_question";
pub const TRUE_FALSE: &str = "true_false_question";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The file '{}' was not found", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("The file '{}' contains invalid JSON", path.display())]
    InvalidFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    pub fn path(&self) -> &Path {
        match self {
            LoadError::NotFound { path, .. } | LoadError::InvalidFormat { path, .. } => path,
        }
    }
}

/// One question as exported by the quiz-authoring tool.
///
/// Every field is optional in the source JSON; `null` and absent keys both
/// resolve to the field's default.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct QuizRecord {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub question_text: String,
    #[serde(default)]
    pub question_type: QuestionType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub answers: Vec<AnswerOption>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AnswerOption {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    /// Any truthy JSON value marks the answer correct: `true`, a non-zero
    /// number, or a non-empty string, array or object.
    #[serde(default, deserialize_with = "truthy")]
    pub is_correct: bool,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "Option<String>")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    /// Anything else, kept verbatim. An absent type is `Other("")`.
    Other(String),
}

impl Default for QuestionType {
    fn default() -> Self {
        QuestionType::Other(String::new())
    }
}

impl From<Option<String>> for QuestionType {
    fn from(raw: Option<String>) -> Self {
        match raw.as_deref() {
            Some(MULTIPLE_CHOICE) => QuestionType::MultipleChoice,
            Some(TRUE_FALSE) => QuestionType::TrueFalse,
            _ => QuestionType::Other(raw.unwrap_or_default()),
        }
    }
}

impl QuestionType {
    /// The human-readable label shown under the question.
    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "Multiple Choice",
            QuestionType::TrueFalse => "True / False",
            QuestionType::Other(_) => "Question",
        }
    }
}

impl QuizRecord {
    pub fn correct_answers(&self) -> impl Iterator<Item = &AnswerOption> {
        self.answers.iter().filter(|answer| answer.is_correct)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    })
}

/// Reads and decodes a single quiz file.
///
/// Any failure to read the file is a [`LoadError::NotFound`]; anything that
/// is not a JSON array is a [`LoadError::InvalidFormat`]. Elements that do not
/// decode as a question are skipped on their own, the rest of the file is kept.
pub fn load_quiz_file(path: &Path) -> Result<Vec<QuizRecord>, LoadError> {
    info!("[Load] Loading data from {:?}", path);
    let bytes = fs::read(path).map_err(|source| LoadError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let values: Vec<Value> =
        serde_json::from_slice(&bytes).map_err(|source| LoadError::InvalidFormat {
            path: path.to_path_buf(),
            source,
        })?;

    let total = values.len();
    let records: Vec<QuizRecord> = values
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("[Load] Skipping record {} in {:?}: {}", idx, path, err);
                None
            }
        })
        .collect();
    debug!("[Load] {} of {} records kept from {:?}", records.len(), total, path);

    Ok(records)
}
