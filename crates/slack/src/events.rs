use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use stijnbot_core::dialogue::DialogueTransitionError;
use stijnbot_core::router::MessageScope;
use stijnbot_db::RepositoryError;

use crate::api::SlackApiError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    Message(MessageEvent),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::Message(_) => SlackEventType::Message,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    Message,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub channel_id: String,
    pub channel_type: String,
    pub user_id: String,
    pub text: String,
    pub ts: String,
    pub bot_id: Option<String>,
}

/// Message text with the bot mention removed, tagged with how it was addressed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopedText {
    pub scope: MessageScope,
    pub text: String,
}

impl MessageEvent {
    pub fn is_direct_channel(&self) -> bool {
        self.channel_type == "im"
    }

    pub fn is_from(&self, bot_user_id: &str) -> bool {
        self.bot_id.is_some() || self.user_id == bot_user_id
    }

    pub fn scoped_text(&self, bot_user_id: &str) -> ScopedText {
        let mention = format!("<@{bot_user_id}>");
        let trimmed = self.text.trim();

        let scope = if self.is_direct_channel() {
            MessageScope::Direct
        } else if trimmed.starts_with(&mention) {
            MessageScope::DirectMention
        } else if trimmed.contains(&mention) {
            MessageScope::Mention
        } else {
            MessageScope::Ambient
        };

        let text = trimmed
            .replace(&mention, "")
            .trim_start_matches(|ch: char| ch == ':' || ch == ',' || ch.is_whitespace())
            .trim_end()
            .to_owned();

        ScopedText { scope, text }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    /// At least one reply was posted.
    Responded,
    Processed,
    Ignored,
}

#[derive(Debug, Error)]
pub enum EventHandlerError {
    #[error("user store failure: {0}")]
    Store(#[from] RepositoryError),
    #[error(transparent)]
    Slack(#[from] SlackApiError),
    #[error(transparent)]
    Dialogue(#[from] DialogueTransitionError),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;
    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }
}

#[async_trait]
pub trait MessageService: Send + Sync {
    async fn handle_message(
        &self,
        event: &MessageEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

pub struct MessageHandler {
    service: Arc<dyn MessageService>,
}

impl MessageHandler {
    pub fn new(service: Arc<dyn MessageService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for MessageHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::Message
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::Message(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        self.service.handle_message(event, ctx).await
    }
}

pub fn message_dispatcher(service: Arc<dyn MessageService>) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(MessageHandler::new(service));
    dispatcher
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use stijnbot_core::router::MessageScope;
    use tokio::sync::Mutex;

    use super::{
        message_dispatcher, EventContext, EventDispatcher, EventHandlerError, HandlerResult,
        MessageEvent, MessageService, SlackEnvelope, SlackEvent,
    };

    fn message(channel_type: &str, text: &str) -> MessageEvent {
        MessageEvent {
            channel_id: "C1".to_owned(),
            channel_type: channel_type.to_owned(),
            user_id: "U1".to_owned(),
            text: text.to_owned(),
            ts: "1730000000.0001".to_owned(),
            bot_id: None,
        }
    }

    #[derive(Default)]
    struct CollectingService {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessageService for CollectingService {
        async fn handle_message(
            &self,
            event: &MessageEvent,
            ctx: &EventContext,
        ) -> Result<HandlerResult, EventHandlerError> {
            self.seen.lock().await.push(format!("{}:{}", ctx.correlation_id, event.text));
            Ok(HandlerResult::Processed)
        }
    }

    #[tokio::test]
    async fn dispatcher_routes_messages_to_service() {
        let service = Arc::new(CollectingService::default());
        let dispatcher = message_dispatcher(service.clone());
        let envelope = SlackEnvelope {
            envelope_id: "env-1".to_owned(),
            event: SlackEvent::Message(message("channel", "hello")),
        };
        let ctx = EventContext { correlation_id: "env-1".to_owned() };

        let result = dispatcher.dispatch(&envelope, &ctx).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Processed);
        assert_eq!(*service.seen.lock().await, vec!["env-1:hello"]);
    }

    #[tokio::test]
    async fn dispatcher_returns_ignored_when_no_handler_registered() {
        let dispatcher = EventDispatcher::new();
        let envelope = SlackEnvelope {
            envelope_id: "env-2".to_owned(),
            event: SlackEvent::Message(message("channel", "hello")),
        };

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Ignored);
    }

    #[test]
    fn scope_classification_follows_channel_and_mention() {
        assert_eq!(message("im", "hi").scoped_text("UBOT").scope, MessageScope::Direct);

        let direct_mention = message("channel", "<@UBOT>: call me Sam").scoped_text("UBOT");
        assert_eq!(direct_mention.scope, MessageScope::DirectMention);
        assert_eq!(direct_mention.text, "call me Sam");

        let mention = message("channel", "hey <@UBOT> uptime").scoped_text("UBOT");
        assert_eq!(mention.scope, MessageScope::Mention);
        assert_eq!(mention.text, "hey  uptime");

        let ambient = message("channel", "lunch at noon").scoped_text("UBOT");
        assert_eq!(ambient.scope, MessageScope::Ambient);
        assert_eq!(ambient.text, "lunch at noon");
    }

    #[test]
    fn mentions_of_other_users_stay_ambient() {
        assert_eq!(
            message("channel", "<@U2> hello").scoped_text("UBOT").scope,
            MessageScope::Ambient
        );
    }

    #[test]
    fn bot_authored_messages_are_recognised() {
        let mut event = message("channel", "Hello.");
        assert!(!event.is_from("UBOT"));

        event.user_id = "UBOT".to_owned();
        assert!(event.is_from("UBOT"));

        event.user_id = "U1".to_owned();
        event.bot_id = Some("B1".to_owned());
        assert!(event.is_from("UBOT"));
    }
}
