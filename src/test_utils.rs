//! Fakes and fixtures shared by unit and integration tests.

use crate::error::FetchError;
use crate::llm::{ChatRequest, ChatResponse, Choice, LlmClient, Message, Usage};
use crate::model::{User, UserProfile};
use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug)]
pub struct MockLlmClient {
    responses: Arc<Mutex<Vec<ChatResponse>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockLlmClient {
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn response_with_content(content: &str) -> ChatResponse {
        ChatResponse {
            choices: vec![Choice {
                message: Message {
                    role: "assistant".to_string(),
                    content: Some(content.to_string()),
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: Some(Usage {
                prompt_tokens: 0,
                completion_tokens: 0,
            }),
        }
    }
}

impl LlmClient for MockLlmClient {
    fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let mut responses = self.responses.lock().expect("responses lock");
        if responses.is_empty() {
            return Ok(ChatResponse {
                choices: Vec::new(),
                usage: None,
            });
        }
        Ok(responses.remove(0))
    }
}

/// Behaves like an unreachable text-generation service.
#[derive(Clone, Copy, Debug)]
pub struct FailingLlmClient;

impl LlmClient for FailingLlmClient {
    fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse> {
        Err(anyhow!("Connection error: service unreachable"))
    }
}

/// How a scripted id fails in [`StaticUserSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFailure {
    Transport,
    Decode,
}

/// In-memory users endpoint; unknown ids answer 404.
#[derive(Debug, Default)]
pub struct StaticUserSource {
    profiles: HashMap<i64, UserProfile>,
    failures: HashMap<i64, ScriptedFailure>,
    calls: Mutex<Vec<i64>>,
}

impl StaticUserSource {
    pub fn new(profiles: Vec<UserProfile>) -> Self {
        Self {
            profiles: profiles.into_iter().map(|p| (p.id, p)).collect(),
            failures: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make `id` fail with `failure`, even if a profile exists for it.
    pub fn failing(mut self, id: i64, failure: ScriptedFailure) -> Self {
        self.failures.insert(id, failure);
        self
    }

    pub fn with_ids(ids: &[i64]) -> Self {
        Self::new(
            ids.iter()
                .map(|&id| sample_profile(id, &sample_name(id)))
                .collect(),
        )
    }

    /// Ids requested so far, in order.
    pub fn calls(&self) -> Vec<i64> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl crate::users::UserSource for StaticUserSource {
    fn fetch_user(&self, id: i64) -> Result<UserProfile, FetchError> {
        self.calls.lock().expect("calls lock").push(id);
        match self.failures.get(&id) {
            Some(ScriptedFailure::Transport) => {
                return Err(FetchError::Transport {
                    id,
                    source: "connection reset by peer".into(),
                })
            }
            Some(ScriptedFailure::Decode) => {
                return Err(FetchError::Decode {
                    id,
                    source: "missing field `name`".into(),
                })
            }
            None => {}
        }
        self.profiles
            .get(&id)
            .cloned()
            .ok_or(FetchError::NotFound { id, status: 404 })
    }
}

const NAMES: &[&str] = &[
    "Leanne Graham",
    "Ervin Howell",
    "Clementine Bauch",
    "Patricia Lebsack",
    "Chelsey Dietrich",
    "Mrs. Dennis Schulist",
    "Kurtis Weissnat",
    "Nicholas Runolfsdottir V",
    "Glenna Reichert",
    "Clementina DuBuque",
];

pub fn sample_name(id: i64) -> String {
    usize::try_from(id - 1)
        .ok()
        .and_then(|i| NAMES.get(i))
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("User {}", id))
}

pub fn sample_profile(id: i64, name: &str) -> UserProfile {
    UserProfile {
        id,
        name: name.to_string(),
        username: name.to_lowercase().replace(' ', "."),
        email: format!("{}@example.com", id),
        phone: "1-770-736-8031".to_string(),
        website: "hildegard.org".to_string(),
        address: json!({"street": "Kulas Light", "suite": "Apt. 556", "city": "Gwenborough"}),
        company: json!({"name": "Romaguera-Crona", "bs": "harness real-time e-markets"}),
    }
}

pub fn sample_user(id: i64, name: &str) -> User {
    User::from_profile(sample_profile(id, name), &mut StdRng::seed_from_u64(id as u64))
}

/// 2025-03-14 09:30:15, used wherever a test needs a stable clock.
pub fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 14)
        .and_then(|d| d.and_hms_opt(9, 30, 15))
        .expect("valid fixed time")
}

/// Base URL on a local port with nothing listening, for connection failures.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local listener");
    let port = listener.local_addr().expect("listener address").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
