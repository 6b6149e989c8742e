use thiserror::Error;

use crate::dialogue::states::{
    DialogueAction, DialogueEvent, DialogueKind, DialogueState, TransitionOutcome,
};
use crate::dialogue::utterances::{classify_dutch, classify_english, Utterance};
use crate::replies;

pub trait DialogueDefinition: Send + Sync {
    fn kind(&self) -> DialogueKind;
    fn initial_state(&self) -> DialogueState {
        DialogueState::Asked
    }
    /// Messages sent when the dialogue opens.
    fn opening(&self) -> Vec<DialogueAction>;
    fn transition(
        &self,
        current: &DialogueState,
        event: &DialogueEvent,
    ) -> Result<TransitionOutcome, DialogueTransitionError>;
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DialogueTransitionError {
    #[error("dialogue {kind:?} already ended in {state:?}")]
    AlreadyEnded { kind: DialogueKind, state: DialogueState },
    #[error("invalid transition for {kind:?} from {state:?} using event {event:?}")]
    InvalidTransition { kind: DialogueKind, state: DialogueState, event: DialogueEvent },
}

#[derive(Clone, Debug, Default)]
pub struct NicknameDialogue;

#[derive(Clone, Debug, Default)]
pub struct ShutdownDialogue;

#[derive(Clone, Debug, Default)]
pub struct HappinessSurveyDialogue;

static NICKNAME: NicknameDialogue = NicknameDialogue;
static SHUTDOWN: ShutdownDialogue = ShutdownDialogue;
static HAPPINESS_SURVEY: HappinessSurveyDialogue = HappinessSurveyDialogue;

fn say(text: impl Into<String>) -> DialogueAction {
    DialogueAction::Say(text.into())
}

fn outcome(
    from: &DialogueState,
    to: DialogueState,
    event: &DialogueEvent,
    actions: Vec<DialogueAction>,
) -> Result<TransitionOutcome, DialogueTransitionError> {
    Ok(TransitionOutcome { from: from.clone(), to, event: event.clone(), actions })
}

fn ensure_open(kind: DialogueKind, current: &DialogueState) -> Result<(), DialogueTransitionError> {
    if current.is_terminal() {
        return Err(DialogueTransitionError::AlreadyEnded { kind, state: current.clone() });
    }
    Ok(())
}

impl DialogueDefinition for NicknameDialogue {
    fn kind(&self) -> DialogueKind {
        DialogueKind::Nickname
    }

    fn opening(&self) -> Vec<DialogueAction> {
        vec![say(replies::NAME_UNKNOWN), say(replies::ASK_NICKNAME)]
    }

    fn transition(
        &self,
        current: &DialogueState,
        event: &DialogueEvent,
    ) -> Result<TransitionOutcome, DialogueTransitionError> {
        use DialogueEvent::{Answered, TimedOut};
        use DialogueState::{Abandoned, Asked, Completed, Confirming, Stopped};

        ensure_open(self.kind(), current)?;

        match (current, event) {
            (_, TimedOut) => outcome(current, Abandoned, event, vec![say(replies::NEVERMIND)]),
            (Asked, Answered(text)) => {
                let nickname = text.trim();
                if nickname.is_empty() {
                    return outcome(current, Asked, event, vec![say(replies::ASK_NICKNAME)]);
                }
                outcome(
                    current,
                    Confirming { nickname: nickname.to_owned() },
                    event,
                    vec![say(replies::confirm_nickname(nickname))],
                )
            }
            (Confirming { nickname }, Answered(text)) => match classify_english(text) {
                Utterance::Affirmative => outcome(
                    current,
                    Completed,
                    event,
                    vec![
                        say(replies::DOSSIER_UPDATE),
                        DialogueAction::PersistNickname(nickname.clone()),
                    ],
                ),
                Utterance::Negative => {
                    outcome(current, Stopped, event, vec![say(replies::NEVERMIND)])
                }
                Utterance::Other => outcome(
                    current,
                    current.clone(),
                    event,
                    vec![say(replies::confirm_nickname(nickname))],
                ),
            },
            _ => Err(DialogueTransitionError::InvalidTransition {
                kind: self.kind(),
                state: current.clone(),
                event: event.clone(),
            }),
        }
    }
}

impl DialogueDefinition for ShutdownDialogue {
    fn kind(&self) -> DialogueKind {
        DialogueKind::Shutdown
    }

    fn opening(&self) -> Vec<DialogueAction> {
        vec![say(replies::CONFIRM_SHUTDOWN)]
    }

    fn transition(
        &self,
        current: &DialogueState,
        event: &DialogueEvent,
    ) -> Result<TransitionOutcome, DialogueTransitionError> {
        use DialogueEvent::{Answered, TimedOut};
        use DialogueState::{Abandoned, Asked, Completed, Stopped};

        ensure_open(self.kind(), current)?;

        match (current, event) {
            (_, TimedOut) => outcome(current, Abandoned, event, Vec::new()),
            (Asked, Answered(text)) => match classify_english(text) {
                Utterance::Affirmative => outcome(
                    current,
                    Completed,
                    event,
                    vec![say(replies::FAREWELL), DialogueAction::ScheduleShutdown],
                ),
                Utterance::Negative | Utterance::Other => {
                    outcome(current, Stopped, event, vec![say(replies::SHUTDOWN_DISMISSED)])
                }
            },
            _ => Err(DialogueTransitionError::InvalidTransition {
                kind: self.kind(),
                state: current.clone(),
                event: event.clone(),
            }),
        }
    }
}

impl DialogueDefinition for HappinessSurveyDialogue {
    fn kind(&self) -> DialogueKind {
        DialogueKind::HappinessSurvey
    }

    fn opening(&self) -> Vec<DialogueAction> {
        vec![say(replies::ASK_HAPPINESS)]
    }

    fn transition(
        &self,
        current: &DialogueState,
        event: &DialogueEvent,
    ) -> Result<TransitionOutcome, DialogueTransitionError> {
        use DialogueEvent::{Answered, TimedOut};
        use DialogueState::{Abandoned, Asked, Completed};

        ensure_open(self.kind(), current)?;

        match (current, event) {
            (_, TimedOut) => outcome(current, Abandoned, event, Vec::new()),
            (Asked, Answered(text)) => match classify_dutch(text) {
                Utterance::Affirmative => outcome(
                    current,
                    Completed,
                    event,
                    vec![DialogueAction::PersistHappiness(true), say(replies::HAPPY_ACK)],
                ),
                Utterance::Negative => outcome(
                    current,
                    Completed,
                    event,
                    vec![DialogueAction::PersistHappiness(false), say(replies::UNHAPPY_ACK)],
                ),
                // Unrecognized answers are dropped; the question stays open until it expires.
                Utterance::Other => outcome(current, Asked, event, Vec::new()),
            },
            _ => Err(DialogueTransitionError::InvalidTransition {
                kind: self.kind(),
                state: current.clone(),
                event: event.clone(),
            }),
        }
    }
}

#[derive(Clone, Copy)]
pub struct DialogueEngine {
    definition: &'static dyn DialogueDefinition,
}

impl DialogueEngine {
    pub fn for_kind(kind: DialogueKind) -> Self {
        let definition: &'static dyn DialogueDefinition = match kind {
            DialogueKind::Nickname => &NICKNAME,
            DialogueKind::Shutdown => &SHUTDOWN,
            DialogueKind::HappinessSurvey => &HAPPINESS_SURVEY,
        };
        Self { definition }
    }

    pub fn kind(&self) -> DialogueKind {
        self.definition.kind()
    }

    pub fn initial_state(&self) -> DialogueState {
        self.definition.initial_state()
    }

    pub fn opening(&self) -> Vec<DialogueAction> {
        self.definition.opening()
    }

    pub fn apply(
        &self,
        current: &DialogueState,
        event: &DialogueEvent,
    ) -> Result<TransitionOutcome, DialogueTransitionError> {
        self.definition.transition(current, event)
    }
}

impl std::fmt::Debug for DialogueEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueEngine").field("kind", &self.kind()).finish()
    }
}
