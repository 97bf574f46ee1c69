use std::fmt;

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Seed value that asks the backend adapter to pick a seed itself
pub const RANDOM_SEED: &str = "random";

/// Kind of media a request produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

/// Generation parameters keyed by name
///
/// Adapters only ever read a request; backend defaults are merged into a
/// fresh payload so the caller's request is never modified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationRequest(Map<String, Value>);

impl GenerationRequest {
    /// Empty request
    pub fn new() -> Self {
        Self::default()
    }

    /// Request with a prompt
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self::new().with("prompt", prompt.into())
    }

    /// Set a parameter, replacing any existing value
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Look up a parameter
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The text prompt, if present
    pub fn prompt(&self) -> Option<&str> {
        self.get("prompt").and_then(Value::as_str)
    }

    /// All parameters
    pub fn parameters(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Whether the seed under `name` must be generated by the adapter
    ///
    /// True when the key is missing, `null`, or the `"random"` sentinel.
    pub(crate) fn wants_random_seed(&self, name: &str) -> bool {
        match self.get(name) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.eq_ignore_ascii_case(RANDOM_SEED),
            Some(_) => false,
        }
    }

    /// Whether `name` was left out (missing, `null`, or an empty string)
    pub(crate) fn is_omitted(&self, name: &str) -> bool {
        match self.get(name) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        }
    }
}

impl From<Map<String, Value>> for GenerationRequest {
    fn from(parameters: Map<String, Value>) -> Self {
        Self(parameters)
    }
}

/// A URL or `data:` URI identifying one generated output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Encode raw media bytes as `data:<media_type>;base64,<payload>`
    pub fn from_bytes(media_type: &str, bytes: &[u8]) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self(format!("data:{media_type};base64,{payload}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether the reference carries its content inline
    pub fn is_inline(&self) -> bool {
        self.0.starts_with("data:")
    }

    /// Media type and decoded bytes of an inline reference
    ///
    /// Returns `None` for URLs and for malformed or non-base64 data URIs.
    pub fn decode_inline(&self) -> Option<(&str, Vec<u8>)> {
        let rest = self.0.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let media_type = header.strip_suffix(";base64")?;
        let bytes = base64::engine::general_purpose::STANDARD.decode(payload).ok()?;
        Some((media_type, bytes))
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one in-flight job on the polling backend
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of a job on the polling backend
///
/// `Pending` and `Running` are transient; `Succeeded` and `Failed` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Map the backend's status string
    ///
    /// Cancellation on the backend side ends the job, so it counts as a
    /// failure. Unrecognized strings are treated as still running.
    pub fn from_backend(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "starting" | "queued" | "pending" => Self::Pending,
            "succeeded" | "successful" | "completed" => Self::Succeeded,
            "failed" | "canceled" | "cancelled" | "aborted" => Self::Failed,
            _ => Self::Running,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// One observation of a polled job
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub status: JobStatus,
    /// Output payload, present once the job succeeded
    pub output: Option<Value>,
    /// Error text reported by the backend
    pub error: Option<String>,
}

/// Body returned by `POST /v1/images/generations`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenerationResponse {
    pub assets: Vec<AssetRef>,
}

/// Body returned by `POST /v1/videos/generations`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoGenerationResponse {
    pub asset: AssetRef,
}
