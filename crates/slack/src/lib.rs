//! Slack interface for stijnbot.
//!
//! - **Events** (`events`) - envelopes, scope classification and dispatch
//! - **Socket Mode** (`socket`) - transport loop with reconnection
//! - **Web API** (`api`) - outbound messages, reactions and lookups
//! - **Responder** (`responder`) - commands, dialogues and the happiness survey
//!
//! ```text
//! SocketTransport → SocketModeRunner → EventDispatcher → Responder
//!                                                          ↓
//!                                  SlackApi ← replies    UserRepository
//! ```

pub mod api;
pub mod events;
pub mod responder;
pub mod session;
pub mod shutdown;
pub mod socket;

pub use api::{BotIdentity, HttpSlackApi, RecordingSlackApi, SlackApi, SlackApiError, SlackCall};
pub use events::{
    message_dispatcher, EventContext, EventDispatcher, EventHandlerError, HandlerResult,
    MessageEvent, SlackEnvelope, SlackEvent,
};
pub use responder::{local_hostname, Responder, ResponderSettings};
pub use session::BotSession;
pub use shutdown::ShutdownSignal;
pub use socket::{NoopSocketTransport, ReconnectPolicy, SocketModeRunner, SocketTransport};
