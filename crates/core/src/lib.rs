pub mod clock;
pub mod config;
pub mod dialogue;
pub mod domain;
pub mod replies;
pub mod router;
pub mod survey;
pub mod uptime;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use dialogue::{
    DialogueAction, DialogueEngine, DialogueEvent, DialogueKind, DialogueState, DialogueStatus,
    DialogueTransitionError, TransitionOutcome,
};
pub use domain::user::{UserId, UserRecord};
pub use router::{Command, CommandKind, CommandRouter, MessageScope, RouterError};
pub use survey::{tally_team, SurveyGate, TeamHappiness};
pub use uptime::format_uptime;
