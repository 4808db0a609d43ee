use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Raw user input for the ingest stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestInput {
    pub repo_url: Option<String>,
    pub code_input: Option<String>,
    /// Free-form language hint passed through to the review prompt
    pub language: Option<String>,
}

/// Structured review of the ingested source, produced by stage 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoAnalysis {
    #[serde(deserialize_with = "lenient_text")]
    pub summary: String,
    #[serde(deserialize_with = "lenient_text")]
    pub architecture: String,
    #[serde(deserialize_with = "lenient_text")]
    pub file_breakdown: String,
    #[serde(deserialize_with = "lenient_text")]
    pub legacy_patterns: String,
    #[serde(deserialize_with = "lenient_text")]
    pub dependencies: String,
    #[serde(deserialize_with = "lenient_text")]
    pub concerns: String,
}

impl RepoAnalysis {
    /// Field name/value pairs in schema order.
    pub fn sections(&self) -> [(&'static str, &str); 6] {
        [
            ("summary", &self.summary),
            ("architecture", &self.architecture),
            ("fileBreakdown", &self.file_breakdown),
            ("legacyPatterns", &self.legacy_patterns),
            ("dependencies", &self.dependencies),
            ("concerns", &self.concerns),
        ]
    }
}

/// Verified free-text action plan, produced by stage 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItems {
    pub actions: String,
    #[serde(default)]
    pub verification_notes: String,
}

/// Ticket urgency. `P0` is the most urgent; ordering follows urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    P0,
    P1,
    P2,
    P3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Migration,
    Testing,
    Refactor,
    Security,
    Documentation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Effort {
    Small,
    Medium,
    Large,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::P0 => "P0",
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
        }
    }
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Migration => "migration",
            Self::Testing => "testing",
            Self::Refactor => "refactor",
            Self::Security => "security",
            Self::Documentation => "documentation",
        }
    }
}

impl Effort {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P0" => Ok(Self::P0),
            "P1" => Ok(Self::P1),
            "P2" => Ok(Self::P2),
            "P3" => Ok(Self::P3),
            other => Err(format!("unknown priority '{other}', expected one of P0, P1, P2, P3")),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "migration" => Ok(Self::Migration),
            "testing" => Ok(Self::Testing),
            "refactor" => Ok(Self::Refactor),
            "security" => Ok(Self::Security),
            "documentation" => Ok(Self::Documentation),
            other => Err(format!(
                "unknown category '{other}', expected one of migration, testing, refactor, security, documentation"
            )),
        }
    }
}

impl FromStr for Effort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(format!("unknown effort '{other}', expected one of small, medium, large")),
        }
    }
}

macro_rules! string_enum_serde {
    ($($ty:ty),+) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    )+};
}

string_enum_serde!(Priority, Category, Effort);

/// One unit of work derived from the action plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredTicket {
    #[serde(deserialize_with = "lenient_text")]
    pub id: String,
    pub priority: Priority,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    pub effort: Effort,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
}

/// Ticket list plus a one-paragraph summary, produced by stage 3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredOutput {
    pub tickets: Vec<StructuredTicket>,
    #[serde(default)]
    pub summary: String,
}

/// Repository the tickets are about, forwarded to the automation runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
}

/// A GitHub issue ready to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubIssueDraft {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackMessagePayload {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Value>>,
}

/// Normalized reply of the automation runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub github_issues_payload: Vec<GitHubIssueDraft>,
    pub slack_message_payload: SlackMessagePayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportProvider {
    /// Delivered through the automation runtime
    External,
    /// Local CSV artifact
    Fallback,
}

/// Terminal artifact of stage 4.
///
/// Exactly one of `raw_response` and `csv_content` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub success: bool,
    pub tickets_created: usize,
    pub provider: ExportProvider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<ExportPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Output of one end-to-end run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub step1: RepoAnalysis,
    pub step2: ActionItems,
    pub step3: StructuredOutput,
    pub step4: ExportResult,
}

/// Accept any JSON value where free text is expected.
///
/// Models regularly answer a "string" field with a list of bullet points or a
/// nested object; those are flattened rather than rejected.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(Value::deserialize(deserializer)?))
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .map(value_to_text)
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}
