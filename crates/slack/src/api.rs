use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum SlackApiError {
    #[error("slack request `{method}` failed: {source}")]
    Http { method: &'static str, source: reqwest::Error },
    #[error("slack method `{method}` returned error `{error}`")]
    Api { method: &'static str, error: String },
    #[error("slack method `{method}` response is missing `{field}`")]
    MissingField { method: &'static str, field: &'static str },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotIdentity {
    pub user_id: String,
    pub name: String,
}

/// Outbound Slack Web API surface used by the responder.
#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), SlackApiError>;
    async fn add_reaction(
        &self,
        channel_id: &str,
        ts: &str,
        name: &str,
    ) -> Result<(), SlackApiError>;
    /// Returns the id of the direct-message channel with `user_id`.
    async fn open_direct_channel(&self, user_id: &str) -> Result<String, SlackApiError>;
    async fn count_members(&self) -> Result<usize, SlackApiError>;
    async fn bot_identity(&self) -> Result<BotIdentity, SlackApiError>;
}

pub struct HttpSlackApi {
    http: reqwest::Client,
    base_url: String,
    bot_token: SecretString,
}

impl HttpSlackApi {
    pub fn new(base_url: impl Into<String>, bot_token: SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            bot_token,
        }
    }

    async fn call(&self, method: &'static str, body: Value) -> Result<Value, SlackApiError> {
        let response = self
            .http
            .post(format!("{}/{method}", self.base_url))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|source| SlackApiError::Http { method, source })?;

        let body: Value =
            response.json().await.map_err(|source| SlackApiError::Http { method, source })?;
        check_ok(method, body)
    }
}

fn check_ok(method: &'static str, body: Value) -> Result<Value, SlackApiError> {
    if body["ok"].as_bool() != Some(true) {
        let error = body["error"].as_str().unwrap_or("unknown").to_owned();
        return Err(SlackApiError::Api { method, error });
    }
    Ok(body)
}

fn required_str(
    body: &Value,
    method: &'static str,
    pointer: &'static str,
    field: &'static str,
) -> Result<String, SlackApiError> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(SlackApiError::MissingField { method, field })
}

#[async_trait]
impl SlackApi for HttpSlackApi {
    async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), SlackApiError> {
        self.call("chat.postMessage", json!({ "channel": channel_id, "text": text })).await?;
        Ok(())
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        ts: &str,
        name: &str,
    ) -> Result<(), SlackApiError> {
        self.call(
            "reactions.add",
            json!({ "channel": channel_id, "timestamp": ts, "name": name }),
        )
        .await?;
        Ok(())
    }

    async fn open_direct_channel(&self, user_id: &str) -> Result<String, SlackApiError> {
        let method = "conversations.open";
        let body = self.call(method, json!({ "users": user_id })).await?;
        required_str(&body, method, "/channel/id", "channel.id")
    }

    async fn count_members(&self) -> Result<usize, SlackApiError> {
        let method = "users.list";
        let mut total = 0;
        let mut cursor = String::new();

        loop {
            let mut request = json!({ "limit": 200 });
            if !cursor.is_empty() {
                request["cursor"] = json!(cursor);
            }
            let body = self.call(method, request).await?;
            let members = body["members"]
                .as_array()
                .ok_or(SlackApiError::MissingField { method, field: "members" })?;
            total += members.len();

            cursor = body
                .pointer("/response_metadata/next_cursor")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            if cursor.is_empty() {
                return Ok(total);
            }
        }
    }

    async fn bot_identity(&self) -> Result<BotIdentity, SlackApiError> {
        let method = "auth.test";
        let body = self.call(method, json!({})).await?;
        Ok(BotIdentity {
            user_id: required_str(&body, method, "/user_id", "user_id")?,
            name: required_str(&body, method, "/user", "user")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackCall {
    PostMessage { channel_id: String, text: String },
    AddReaction { channel_id: String, ts: String, name: String },
    OpenDirectChannel { user_id: String },
}

/// In-memory [`SlackApi`] that records every call instead of sending it.
pub struct RecordingSlackApi {
    identity: BotIdentity,
    member_count: usize,
    state: Mutex<RecordingState>,
}

#[derive(Default)]
struct RecordingState {
    calls: Vec<SlackCall>,
    reaction_failures: VecDeque<String>,
    direct_channels: HashMap<String, String>,
}

impl RecordingSlackApi {
    pub fn new(identity: BotIdentity, member_count: usize) -> Self {
        Self { identity, member_count, state: Mutex::new(RecordingState::default()) }
    }

    /// Makes the next `add_reaction` call fail with `error`.
    pub async fn fail_next_reaction(&self, error: impl Into<String>) {
        self.state.lock().await.reaction_failures.push_back(error.into());
    }

    pub async fn calls(&self) -> Vec<SlackCall> {
        self.state.lock().await.calls.clone()
    }

    /// Texts posted to `channel_id`, in order.
    pub async fn messages_in(&self, channel_id: &str) -> Vec<String> {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter_map(|call| match call {
                SlackCall::PostMessage { channel_id: channel, text } if channel == channel_id => {
                    Some(text.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub async fn reactions(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter_map(|call| match call {
                SlackCall::AddReaction { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn clear(&self) {
        self.state.lock().await.calls.clear();
    }
}

#[async_trait]
impl SlackApi for RecordingSlackApi {
    async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), SlackApiError> {
        self.state
            .lock()
            .await
            .calls
            .push(SlackCall::PostMessage { channel_id: channel_id.to_owned(), text: text.to_owned() });
        Ok(())
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        ts: &str,
        name: &str,
    ) -> Result<(), SlackApiError> {
        let mut state = self.state.lock().await;
        if let Some(error) = state.reaction_failures.pop_front() {
            return Err(SlackApiError::Api { method: "reactions.add", error });
        }
        state.calls.push(SlackCall::AddReaction {
            channel_id: channel_id.to_owned(),
            ts: ts.to_owned(),
            name: name.to_owned(),
        });
        Ok(())
    }

    async fn open_direct_channel(&self, user_id: &str) -> Result<String, SlackApiError> {
        let mut state = self.state.lock().await;
        state.calls.push(SlackCall::OpenDirectChannel { user_id: user_id.to_owned() });
        let channel = state
            .direct_channels
            .entry(user_id.to_owned())
            .or_insert_with(|| format!("D{user_id}"))
            .clone();
        Ok(channel)
    }

    async fn count_members(&self) -> Result<usize, SlackApiError> {
        Ok(self.member_count)
    }

    async fn bot_identity(&self) -> Result<BotIdentity, SlackApiError> {
        Ok(self.identity.clone())
    }
}
