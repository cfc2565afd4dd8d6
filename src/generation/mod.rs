//! Answer generation against Ollama's `/api/generate` endpoint.
//!
//! Every call ends in an answer string: network failures are retried a fixed
//! number of times and then collapse into [`RETRIES_EXHAUSTED`], a response
//! body that is not JSON becomes [`INVALID_RESPONSE`] without retrying, and a
//! JSON body lacking a `response` field becomes [`NO_ANSWER`]. A `response`
//! that is not a string is shown as its JSON text.


use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::OllamaConfig;

pub const NO_ANSWER: &str = "[No answer from model]";
pub const INVALID_RESPONSE: &str = "[No answer from model due to invalid response]";
pub const RETRIES_EXHAUSTED: &str = "[Error fetching response from model after retries]";

/// Something that can answer a question given retrieved context
pub trait AnswerModel: Send + Sync {
    fn answer(&self, question: &str, context: &str) -> String;
}

/// Waits between attempts. Swapped out in tests to avoid real delays.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    #[inline]
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<F> Sleeper for F
where
    F: Fn(Duration) + Send + Sync,
{
    #[inline]
    fn sleep(&self, duration: Duration) {
        self(duration);
    }
}

/// How a generation call ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Answered(String),
    MissingAnswer,
    InvalidResponse,
    RetriesExhausted,
}

impl Outcome {
    /// The text shown to the user
    #[inline]
    pub fn into_text(self) -> String {
        match self {
            Self::Answered(text) => text,
            Self::MissingAnswer => NO_ANSWER.to_string(),
            Self::InvalidResponse => INVALID_RESPONSE.to_string(),
            Self::RetriesExhausted => RETRIES_EXHAUSTED.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub outcome: Outcome,
    pub attempts: u32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Compose the fixed instruction prompt around the retrieved context
#[inline]
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are a helpful assistant. Use the CONTEXT to answer the QUESTION.\n\n\
         CONTEXT:\n{context}\n\n\
         QUESTION:\n{question}\n\n\
         ANSWER:"
    )
}

#[derive(Clone)]
pub struct OllamaGenerator {
    endpoint: Url,
    model: String,
    agent: ureq::Agent,
    max_attempts: u32,
    retry_delay: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for OllamaGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaGenerator")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

impl OllamaGenerator {
    #[inline]
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let endpoint = config
            .ollama_url()
            .context("Failed to generate Ollama URL from config")?
            .join("/api/generate")
            .context("Failed to build generate URL")?;

        Ok(Self {
            endpoint,
            model: config.generation_model.clone(),
            agent: build_agent(config.request_timeout()),
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay(),
            sleeper: Arc::new(ThreadSleeper),
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    #[inline]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    #[inline]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    #[inline]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `prompt` and classify the result, retrying only network failures
    #[inline]
    pub fn generate(&self, prompt: &str) -> Generation {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        let body = match serde_json::to_string(&request) {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to serialize generate request: {}", e);
                return Generation {
                    outcome: Outcome::InvalidResponse,
                    attempts: 0,
                };
            }
        };

        for attempt in 1..=self.max_attempts {
            debug!(
                "Generate request attempt {}/{} to {}",
                attempt, self.max_attempts, self.endpoint
            );

            match self.send(&body) {
                Ok(text) => {
                    return Generation {
                        outcome: parse_response(&text),
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    warn!(
                        "Error querying model (attempt {}/{}): {}",
                        attempt, self.max_attempts, e
                    );
                    if attempt < self.max_attempts {
                        debug!("Retrying in {:?}", self.retry_delay);
                        self.sleeper.sleep(self.retry_delay);
                    }
                }
            }
        }

        error!(
            "All {} attempts to reach {} failed",
            self.max_attempts, self.endpoint
        );
        Generation {
            outcome: Outcome::RetriesExhausted,
            attempts: self.max_attempts,
        }
    }

    /// One POST; any transport error, timeout, or non-2xx status is a failure
    fn send(&self, body: &str) -> Result<String, ureq::Error> {
        self.agent
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .send(body)
            .and_then(|mut resp| resp.body_mut().read_to_string())
    }
}

impl AnswerModel for OllamaGenerator {
    #[inline]
    fn answer(&self, question: &str, context: &str) -> String {
        let prompt = build_prompt(question, context);
        self.generate(&prompt).outcome.into_text()
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

fn parse_response(text: &str) -> Outcome {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(fields)) => match fields.get("response") {
            Some(Value::String(answer)) => Outcome::Answered(answer.clone()),
            Some(other) => {
                debug!("Model answer is not a string: {}", other);
                Outcome::Answered(other.to_string())
            }
            None => {
                debug!("Model response has no answer field");
                Outcome::MissingAnswer
            }
        },
        Ok(_) => {
            warn!("Model response is JSON but not an object: {}", text);
            Outcome::InvalidResponse
        }
        Err(e) => {
            warn!("JSON decode error: {}, response text: {}", e, text);
            Outcome::InvalidResponse
        }
    }
}
