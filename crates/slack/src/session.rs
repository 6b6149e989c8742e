use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use stijnbot_core::dialogue::{DialogueEngine, DialogueKind, DialogueState};
use stijnbot_core::domain::user::{UserId, UserRecord};
use stijnbot_core::survey::SurveyGate;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DialogueKey {
    pub channel_id: String,
    pub user_id: UserId,
}

impl DialogueKey {
    pub fn new(channel_id: impl Into<String>, user_id: UserId) -> Self {
        Self { channel_id: channel_id.into(), user_id }
    }
}

#[derive(Clone, Debug)]
pub struct ActiveDialogue {
    pub engine: DialogueEngine,
    pub state: DialogueState,
    pub last_activity: DateTime<Utc>,
}

impl ActiveDialogue {
    pub fn open(kind: DialogueKind, now: DateTime<Utc>) -> Self {
        let engine = DialogueEngine::for_kind(kind);
        Self { state: engine.initial_state(), engine, last_activity: now }
    }

    pub fn kind(&self) -> DialogueKind {
        self.engine.kind()
    }

    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_activity > timeout
    }
}

/// Open dialogues, at most one per (channel, user).
#[derive(Debug, Default)]
pub struct DialogueRegistry {
    active: HashMap<DialogueKey, ActiveDialogue>,
}

impl DialogueRegistry {
    pub fn insert(
        &mut self,
        key: DialogueKey,
        dialogue: ActiveDialogue,
    ) -> Option<ActiveDialogue> {
        self.active.insert(key, dialogue)
    }

    pub fn take(&mut self, key: &DialogueKey) -> Option<ActiveDialogue> {
        self.active.remove(key)
    }

    pub fn has_open(&self, user_id: &UserId, kind: DialogueKind) -> bool {
        self.active.iter().any(|(key, dialogue)| &key.user_id == user_id && dialogue.kind() == kind)
    }

    pub fn take_expired(
        &mut self,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Vec<(DialogueKey, ActiveDialogue)> {
        let expired: Vec<DialogueKey> = self
            .active
            .iter()
            .filter(|(_, dialogue)| dialogue.is_expired(now, timeout))
            .map(|(key, _)| key.clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|key| self.active.remove(&key).map(|dialogue| (key, dialogue)))
            .collect()
    }

    pub fn open_count(&self) -> usize {
        self.active.len()
    }
}

/// Process-lifetime state shared by every message handler.
#[derive(Debug)]
pub struct BotSession {
    started_at: tokio::time::Instant,
    member_count: AtomicUsize,
    ambient_messages: AtomicU64,
    survey_prompts: Mutex<HashMap<UserId, DateTime<Utc>>>,
    dialogues: Mutex<DialogueRegistry>,
}

impl BotSession {
    pub fn new(member_count: usize) -> Self {
        Self {
            started_at: tokio::time::Instant::now(),
            member_count: AtomicUsize::new(member_count),
            ambient_messages: AtomicU64::new(0),
            survey_prompts: Mutex::new(HashMap::new()),
            dialogues: Mutex::new(DialogueRegistry::default()),
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    pub fn member_count(&self) -> usize {
        self.member_count.load(Ordering::Relaxed)
    }

    /// Returns the updated count.
    pub fn record_ambient_message(&self) -> u64 {
        self.ambient_messages.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn ambient_messages(&self) -> u64 {
        self.ambient_messages.load(Ordering::Relaxed)
    }

    /// Reserves a survey prompt for the record's user when the gate allows one
    /// and no survey is already waiting on them.
    pub async fn claim_survey_prompt(
        &self,
        record: &UserRecord,
        gate: &SurveyGate,
        now: DateTime<Utc>,
    ) -> bool {
        let dialogues = self.dialogues.lock().await;
        if dialogues.has_open(&record.id, DialogueKind::HappinessSurvey) {
            return false;
        }

        let mut prompts = self.survey_prompts.lock().await;
        let last_prompted = prompts.get(&record.id).copied();
        if !gate.should_prompt(record, last_prompted, now) {
            return false;
        }
        prompts.insert(record.id.clone(), now);
        true
    }

    pub async fn open_dialogue(&self, key: DialogueKey, dialogue: ActiveDialogue) {
        self.dialogues.lock().await.insert(key, dialogue);
    }

    pub async fn take_dialogue(&self, key: &DialogueKey) -> Option<ActiveDialogue> {
        self.dialogues.lock().await.take(key)
    }

    pub async fn take_expired_dialogues(
        &self,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Vec<(DialogueKey, ActiveDialogue)> {
        self.dialogues.lock().await.take_expired(now, timeout)
    }

    pub async fn open_dialogue_count(&self) -> usize {
        self.dialogues.lock().await.open_count()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use stijnbot_core::dialogue::DialogueKind;
    use stijnbot_core::domain::user::{UserId, UserRecord};
    use stijnbot_core::survey::SurveyGate;

    use super::{ActiveDialogue, BotSession, DialogueKey, DialogueRegistry};

    #[test]
    fn registry_expires_only_idle_dialogues() {
        let start = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
        let mut registry = DialogueRegistry::default();
        registry.insert(
            DialogueKey::new("C1", UserId::new("U1")),
            ActiveDialogue::open(DialogueKind::Nickname, start),
        );
        registry.insert(
            DialogueKey::new("C1", UserId::new("U2")),
            ActiveDialogue::open(DialogueKind::Shutdown, start + Duration::seconds(200)),
        );

        let expired = registry.take_expired(start + Duration::seconds(301), Duration::seconds(300));

        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].0.user_id, UserId::new("U1"));
        assert_eq!(registry.open_count(), 1);
    }

    #[test]
    fn open_survey_is_found_across_channels() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
        let mut registry = DialogueRegistry::default();
        registry.insert(
            DialogueKey::new("DU1", UserId::new("U1")),
            ActiveDialogue::open(DialogueKind::HappinessSurvey, now),
        );

        assert!(registry.has_open(&UserId::new("U1"), DialogueKind::HappinessSurvey));
        assert!(!registry.has_open(&UserId::new("U1"), DialogueKind::Nickname));
        assert!(!registry.has_open(&UserId::new("U2"), DialogueKind::HappinessSurvey));
    }

    #[tokio::test]
    async fn survey_prompt_is_claimed_once_per_window() {
        let session = BotSession::new(3);
        let gate = SurveyGate::new(20);
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
        let record = UserRecord::unknown(UserId::new("U1"));

        assert!(session.claim_survey_prompt(&record, &gate, now).await);
        assert!(!session.claim_survey_prompt(&record, &gate, now + Duration::seconds(5)).await);
        assert!(session.claim_survey_prompt(&record, &gate, now + Duration::seconds(21)).await);
    }

    #[tokio::test]
    async fn open_survey_blocks_new_prompt() {
        let session = BotSession::new(3);
        let gate = SurveyGate::new(20);
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
        let record = UserRecord::unknown(UserId::new("U1"));

        assert!(session.claim_survey_prompt(&record, &gate, now).await);
        session
            .open_dialogue(
                DialogueKey::new("DU1", UserId::new("U1")),
                ActiveDialogue::open(DialogueKind::HappinessSurvey, now),
            )
            .await;

        assert!(!session.claim_survey_prompt(&record, &gate, now + Duration::seconds(60)).await);
    }

    #[test]
    fn ambient_counter_increments() {
        let session = BotSession::new(0);
        assert_eq!(session.record_ambient_message(), 1);
        assert_eq!(session.record_ambient_message(), 2);
        assert_eq!(session.ambient_messages(), 2);
        assert_eq!(session.member_count(), 0);
    }
}
