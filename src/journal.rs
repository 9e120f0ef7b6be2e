//! Explorer's journal.
//!
//! Journal text comes from an OpenAI-compatible chat completion server. The
//! call is slow and may fail, so it never runs on the frame loop: requests go
//! through a [`JournalDesk`] that executes them on a background runtime and is
//! polled once per frame. Every failure maps to a fixed fallback line, so the
//! journal always has something to show and world state is never affected.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Timelike};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::biomes::Biome;

/// Shown when the server answers with nothing usable
pub const EMPTY_FALLBACK: &str = "The fog is too thick to write anything meaningful...";
/// Shown when the request fails
pub const ERROR_FALLBACK: &str = "My pen has run dry. I cannot record this moment. (API Error)";
/// Shown before the first entry
pub const BLANK_PAGE: &str = "The page is blank. Press the quill to record your findings.";

// =============================================================================
// REQUEST
// =============================================================================

/// Time of day passed to the journal writer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    Dawn,
    Day,
    Dusk,
    Night,
}

impl TimeOfDay {
    pub fn name(&self) -> &'static str {
        match self {
            TimeOfDay::Dawn => "Dawn",
            TimeOfDay::Day => "Day",
            TimeOfDay::Dusk => "Dusk",
            TimeOfDay::Night => "Night",
        }
    }

    pub fn next(&self) -> TimeOfDay {
        match self {
            TimeOfDay::Dawn => TimeOfDay::Day,
            TimeOfDay::Day => TimeOfDay::Dusk,
            TimeOfDay::Dusk => TimeOfDay::Night,
            TimeOfDay::Night => TimeOfDay::Dawn,
        }
    }

    /// Bucket a wall-clock hour (0-23)
    pub fn from_hour(hour: u32) -> TimeOfDay {
        match hour % 24 {
            5..=7 => TimeOfDay::Dawn,
            8..=17 => TimeOfDay::Day,
            18..=20 => TimeOfDay::Dusk,
            _ => TimeOfDay::Night,
        }
    }

    pub fn now() -> TimeOfDay {
        Self::from_hour(Local::now().hour())
    }
}

impl Default for TimeOfDay {
    fn default() -> Self {
        TimeOfDay::Dusk
    }
}

/// Altitude above which the air feels thin
const THIN_AIR_ALTITUDE: f32 = 10.0;

/// Sensory details around the player, rolled fresh for every entry.
pub fn nearby_features<R: Rng>(altitude: f32, rng: &mut R) -> Vec<String> {
    let mut features = Vec::new();
    if rng.gen::<f32>() > 0.5 {
        features.push("strange glowing mushrooms".to_string());
    }
    if rng.gen::<f32>() > 0.5 {
        features.push("distant roar of a beast".to_string());
    }
    if altitude > THIN_AIR_ALTITUDE {
        features.push("thin air".to_string());
    }
    if altitude < 0.0 {
        features.push("salty spray".to_string());
    }
    features
}

/// What the writer is asked to describe
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JournalRequest {
    pub biome: Biome,
    pub time_of_day: TimeOfDay,
    pub nearby_features: Vec<String>,
}

impl JournalRequest {
    pub fn system_prompt(&self) -> &'static str {
        "You are an adventurous explorer writing in a journal."
    }

    pub fn user_prompt(&self) -> String {
        let features = if self.nearby_features.is_empty() {
            "nothing unusual".to_string()
        } else {
            self.nearby_features.join(", ")
        };

        format!(
            "You are currently exploring a {} biome.\n\
             It is currently {}.\n\
             Nearby features include: {}.\n\n\
             Write a short, immersive journal entry (max 50 words) describing the atmosphere, \
             what you see, and how you feel.\n\
             Be creative but concise. Do not use markdown headers.",
            self.biome.display_name(),
            self.time_of_day.name(),
            features,
        )
    }
}

// =============================================================================
// SERVICE
// =============================================================================

/// Errors that can occur while asking for an entry
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error: status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("empty response from journal server")]
    EmptyResponse,
}

/// Anything that can write journal text
pub trait JournalService: Send + Sync {
    fn write_entry(&self, request: &JournalRequest) -> Result<String, JournalError>;
}

/// Journal server connection settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Base URL of the server (e.g. "http://localhost:8000")
    pub base_url: String,
    /// Model name; the server default is used when unset
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            model: None,
            max_tokens: 128,
            temperature: 0.9,
            timeout_secs: 30,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize, Debug)]
struct ChatCompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize, Debug)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

impl ChatMessageResponse {
    fn text(&self) -> Option<String> {
        self.content
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.reasoning_content.clone())
    }
}

/// Chat-completion backed journal writer
pub struct LlmJournal {
    config: JournalConfig,
    client: reqwest::blocking::Client,
}

impl LlmJournal {
    pub fn new(config: JournalConfig) -> Result<Self, JournalError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| JournalError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }
}

impl JournalService for LlmJournal {
    fn write_entry(&self, request: &JournalRequest) -> Result<String, JournalError> {
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_prompt().to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user_prompt(),
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let url = format!("{}/v1/chat/completions", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| JournalError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(JournalError::Api { status, body });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .map_err(|e| JournalError::Parse(e.to_string()))?;

        completion
            .choices
            .first()
            .and_then(|c| c.message.text())
            .ok_or(JournalError::EmptyResponse)
    }
}

// =============================================================================
// ENTRIES
// =============================================================================

/// A finished journal line
#[derive(Clone, Debug, PartialEq)]
pub struct JournalEntry {
    pub text: String,
    pub biome: Option<Biome>,
    pub time_of_day: Option<TimeOfDay>,
    pub written_at: DateTime<Local>,
    /// True when `text` is one of the fallback lines
    pub fallback: bool,
}

impl JournalEntry {
    /// A line not produced by the writer (world events, notes)
    pub fn note(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            biome: None,
            time_of_day: None,
            written_at: Local::now(),
            fallback: false,
        }
    }
}

/// Ask `service` for an entry, mapping every failure to a fallback line.
pub fn compose_entry(service: &dyn JournalService, request: &JournalRequest) -> JournalEntry {
    let (text, fallback) = match service.write_entry(request) {
        Ok(text) if !text.trim().is_empty() => (text.trim().to_string(), false),
        Ok(_) | Err(JournalError::EmptyResponse) => (EMPTY_FALLBACK.to_string(), true),
        Err(err) => {
            warn!(error = %err, "journal request failed");
            (ERROR_FALLBACK.to_string(), true)
        }
    };

    JournalEntry {
        text,
        biome: Some(request.biome),
        time_of_day: Some(request.time_of_day),
        written_at: Local::now(),
        fallback,
    }
}

// =============================================================================
// DESK
// =============================================================================

/// Runs journal requests off the frame loop.
///
/// At most one request is in flight. The frame loop calls [`JournalDesk::poll`]
/// every frame; it never blocks on an unfinished request.
pub struct JournalDesk {
    runtime: Option<Runtime>,
    service: Arc<dyn JournalService>,
    pending: Option<JoinHandle<JournalEntry>>,
    latest: Option<JournalEntry>,
}

impl JournalDesk {
    pub fn new(service: Arc<dyn JournalService>) -> std::io::Result<Self> {
        let runtime = Runtime::new()?;
        Ok(Self {
            runtime: Some(runtime),
            service,
            pending: None,
            latest: None,
        })
    }

    /// True while a request is in flight
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Most recent entry or note
    pub fn latest(&self) -> Option<&JournalEntry> {
        self.latest.as_ref()
    }

    /// Text for the journal panel
    pub fn page_text(&self) -> &str {
        self.latest.as_ref().map(|e| e.text.as_str()).unwrap_or(BLANK_PAGE)
    }

    /// Start a request. Ignored (returns false) while one is already running.
    pub fn request(&mut self, request: JournalRequest) -> bool {
        if self.pending.is_some() {
            return false;
        }
        let Some(runtime) = self.runtime.as_ref() else {
            return false;
        };

        info!(biome = %request.biome, time = request.time_of_day.name(), "requesting journal entry");
        let service = Arc::clone(&self.service);
        self.pending = Some(runtime.spawn_blocking(move || compose_entry(service.as_ref(), &request)));
        true
    }

    /// Record a line directly, e.g. a world event. Does not cancel a pending
    /// request; its result will replace this line when it lands.
    pub fn note(&mut self, text: impl Into<String>) {
        self.latest = Some(JournalEntry::note(text));
    }

    /// Collect a finished request. Returns the new entry when one landed.
    pub fn poll(&mut self) -> Option<&JournalEntry> {
        let finished = self.pending.as_ref().map(|h| h.is_finished()).unwrap_or(false);
        if !finished {
            return None;
        }

        let handle = self.pending.take()?;
        let runtime = self.runtime.as_ref()?;
        let entry = match runtime.block_on(handle) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "journal task failed");
                JournalEntry {
                    fallback: true,
                    ..JournalEntry::note(ERROR_FALLBACK)
                }
            }
        };
        self.latest = Some(entry);
        self.latest.as_ref()
    }
}

impl Drop for JournalDesk {
    fn drop(&mut self) {
        // Do not wait for a slow server on exit.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
