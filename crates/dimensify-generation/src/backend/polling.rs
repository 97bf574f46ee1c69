//! Submit-then-poll adapter for the image backend
//!
//! A job is created with one call, then its status endpoint is polled once a
//! second until it reports a terminal status or the poll ceiling is reached.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use dimensify_config::{PollingBackendConfig, configured_secret};
use rand::Rng;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::GenerationBackend;
use crate::{
    delay::{Delay, TokioDelay},
    error::{GenerationError, Result},
    http_client::{execute, http_client, read_json},
    normalize::{TransportFailure, classify},
    types::{AssetRef, GenerationRequest, JobHandle, JobSnapshot, JobStatus},
};

/// Wait between two consecutive polls
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Maximum number of status checks per job
pub const MAX_POLL_ATTEMPTS: u32 = 60;

/// Parameter carrying the seed on this backend
pub const SEED_PARAMETER: &str = "image_seed";

/// Largest generated seed (2^53 - 1, exact in a JSON number)
pub const MAX_RANDOM_SEED: u64 = (1 << 53) - 1;

const EMPTY_OUTPUT_MESSAGE: &str = "Generation succeeded but returned no output.";
const MALFORMED_OUTPUT_MESSAGE: &str = "Generation succeeded but returned an unreadable output.";

/// Per-request bound for submit and poll calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Inputs sent with every job unless the caller sets them
fn fixed_defaults() -> Map<String, Value> {
    let mut defaults = Map::new();
    defaults.insert("style_selections".into(), json!("Fooocus V2,Fooocus Enhance,Fooocus Sharp"));
    defaults.insert("image_number".into(), json!(1));
    defaults.insert("refiner_switch".into(), json!(0.5));
    defaults.insert("uov_method".into(), json!("Disabled"));
    defaults
}

/// Adapter for a backend that returns a job handle and must be polled
pub struct PollingAdapter {
    name: String,
    client: Client,
    base_url: String,
    model_version: String,
    api_key: Option<SecretString>,
    delay: Arc<dyn Delay>,
}

impl PollingAdapter {
    /// Create an adapter from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(name: impl Into<String>, config: &PollingBackendConfig) -> anyhow::Result<Self> {
        Ok(Self {
            name: name.into(),
            client: http_client(Some(REQUEST_TIMEOUT))?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model_version: config.model_version.clone(),
            api_key: configured_secret(config.api_key.as_ref()),
            delay: Arc::new(TokioDelay),
        })
    }

    /// Replace the suspension used between polls
    #[must_use]
    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    fn api_key(&self) -> Result<&SecretString> {
        self.api_key
            .as_ref()
            .ok_or_else(|| classify(TransportFailure::MissingCredential))
    }

    /// Build the job input: fixed defaults, overridden by caller values
    ///
    /// A seed is generated when the caller left it out.
    fn job_input(request: &GenerationRequest) -> Map<String, Value> {
        let mut input = fixed_defaults();
        input.extend(request.parameters().iter().map(|(k, v)| (k.clone(), v.clone())));

        if request.wants_random_seed(SEED_PARAMETER) {
            let seed = rand::rng().random_range(0..=MAX_RANDOM_SEED);
            input.insert(SEED_PARAMETER.to_string(), json!(seed));
        }

        input
    }

    /// Create a job and return its handle
    ///
    /// # Errors
    ///
    /// Fails with a configuration error before any network call when no
    /// token is configured; transport failures are classified.
    pub async fn submit(&self, request: &GenerationRequest) -> Result<JobHandle> {
        let api_key = self.api_key()?;

        let body = PredictionRequest {
            version: &self.model_version,
            input: Self::job_input(request),
        };

        tracing::debug!(backend = %self.name, "submitting generation job");

        let response = execute(
            self.client
                .post(format!("{}/predictions", self.base_url))
                .header("Authorization", format!("Token {}", api_key.expose_secret()))
                .json(&body),
            &self.name,
        )
        .await?;

        let created: PredictionCreated = read_json(response, &self.name).await?;

        tracing::debug!(backend = %self.name, job_id = %created.id, "generation job submitted");

        Ok(JobHandle::new(created.id))
    }

    /// Fetch the current state of a job
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::submit`]
    pub async fn poll(&self, handle: &JobHandle) -> Result<JobSnapshot> {
        let api_key = self.api_key()?;

        let response = execute(
            self.client
                .get(format!("{}/predictions/{handle}", self.base_url))
                .header("Authorization", format!("Token {}", api_key.expose_secret())),
            &self.name,
        )
        .await?;

        let state: PredictionState = read_json(response, &self.name).await?;

        Ok(state.into_snapshot())
    }

    /// Submit a job and poll it to a terminal result
    ///
    /// Polls at most [`MAX_POLL_ATTEMPTS`] times, sleeping [`POLL_INTERVAL`]
    /// between polls. Transport errors end the run immediately.
    ///
    /// # Errors
    ///
    /// `Timeout` when the ceiling is reached, `Backend` when the job fails,
    /// or whatever [`Self::submit`] / [`Self::poll`] raise
    pub async fn run_to_completion(&self, request: &GenerationRequest) -> Result<Vec<AssetRef>> {
        let handle = self.submit(request).await?;
        let mut state = PollState::Pending;

        loop {
            state = match state {
                PollState::Pending => PollState::Polling { attempt: 1 },
                PollState::Polling { attempt } => {
                    if attempt > 1 {
                        self.delay.sleep(POLL_INTERVAL).await;
                    }

                    let snapshot = self.poll(&handle).await?;

                    tracing::debug!(
                        backend = %self.name,
                        job_id = %handle,
                        attempt,
                        status = %snapshot.status,
                        "polled generation job"
                    );

                    PollState::after_poll(attempt, snapshot)
                }
                PollState::Succeeded(output) => return assets_from_output(output),
                PollState::Failed(detail) => {
                    tracing::warn!(backend = %self.name, job_id = %handle, "generation job failed");
                    return Err(GenerationError::job_failed(detail));
                }
                PollState::TimedOut => {
                    tracing::warn!(
                        backend = %self.name,
                        job_id = %handle,
                        attempts = MAX_POLL_ATTEMPTS,
                        "generation job timed out"
                    );
                    return Err(GenerationError::timed_out());
                }
            };
        }
    }
}

#[async_trait]
impl GenerationBackend for PollingAdapter {
    async fn run(&self, request: &GenerationRequest) -> Result<Vec<AssetRef>> {
        self.run_to_completion(request).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Progress of one polling session
#[derive(Debug, Clone, PartialEq)]
enum PollState {
    /// Submitted, not yet polled
    Pending,
    /// About to issue poll number `attempt` (1-based)
    Polling { attempt: u32 },
    Succeeded(Option<Value>),
    Failed(Option<String>),
    TimedOut,
}

impl PollState {
    /// Transition after poll number `attempt` observed `snapshot`
    fn after_poll(attempt: u32, snapshot: JobSnapshot) -> Self {
        match snapshot.status {
            JobStatus::Succeeded => Self::Succeeded(snapshot.output),
            JobStatus::Failed => Self::Failed(snapshot.error),
            JobStatus::Pending | JobStatus::Running if attempt >= MAX_POLL_ATTEMPTS => Self::TimedOut,
            JobStatus::Pending | JobStatus::Running => Self::Polling { attempt: attempt + 1 },
        }
    }
}

/// Normalize a job's output into an ordered, non-empty list of assets
///
/// A single reference becomes a one-element list; a list is kept in order.
/// A list holding anything other than references is rejected whole.
fn assets_from_output(output: Option<Value>) -> Result<Vec<AssetRef>> {
    let assets: Vec<AssetRef> = match output {
        Some(Value::String(reference)) => vec![AssetRef::new(reference)],
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(reference) => Ok(AssetRef::new(reference)),
                _ => Err(GenerationError::Backend(MALFORMED_OUTPUT_MESSAGE.to_string())),
            })
            .collect::<Result<_>>()?,
        _ => Vec::new(),
    };

    if assets.is_empty() {
        return Err(GenerationError::Backend(EMPTY_OUTPUT_MESSAGE.to_string()));
    }

    Ok(assets)
}

#[derive(Serialize)]
struct PredictionRequest<'a> {
    version: &'a str,
    input: Map<String, Value>,
}

#[derive(Deserialize)]
struct PredictionCreated {
    id: String,
}

#[derive(Deserialize)]
struct PredictionState {
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl PredictionState {
    fn into_snapshot(self) -> JobSnapshot {
        let error = match self.error {
            Some(Value::String(text)) => Some(text),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };

        JobSnapshot {
            status: JobStatus::from_backend(&self.status),
            output: self.output.filter(|o| !o.is_null()),
            error,
        }
    }
}
