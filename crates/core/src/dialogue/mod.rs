pub mod engine;
pub mod states;
pub mod utterances;

pub use engine::{
    DialogueDefinition, DialogueEngine, DialogueTransitionError, HappinessSurveyDialogue,
    NicknameDialogue, ShutdownDialogue,
};
pub use states::{
    DialogueAction, DialogueEvent, DialogueKind, DialogueState, DialogueStatus,
    TransitionOutcome,
};
pub use utterances::Utterance;
