use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogueKind {
    Nickname,
    Shutdown,
    HappinessSurvey,
}

impl DialogueKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Nickname => "nickname",
            Self::Shutdown => "shutdown",
            Self::HappinessSurvey => "happiness_survey",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueState {
    Asked,
    Confirming { nickname: String },
    Completed,
    Stopped,
    Abandoned,
}

impl DialogueState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Abandoned)
    }

    pub fn status(&self) -> DialogueStatus {
        match self {
            Self::Asked | Self::Confirming { .. } => DialogueStatus::Active,
            Self::Completed => DialogueStatus::Completed,
            Self::Stopped => DialogueStatus::Stopped,
            Self::Abandoned => DialogueStatus::Abandoned,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueStatus {
    Active,
    Completed,
    Stopped,
    Abandoned,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueEvent {
    Answered(String),
    TimedOut,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueAction {
    Say(String),
    PersistNickname(String),
    PersistHappiness(bool),
    ScheduleShutdown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: DialogueState,
    pub to: DialogueState,
    pub event: DialogueEvent,
    pub actions: Vec<DialogueAction>,
}

impl TransitionOutcome {
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().filter_map(|action| match action {
            DialogueAction::Say(text) => Some(text.as_str()),
            _ => None,
        })
    }
}
