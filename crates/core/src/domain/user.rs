use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the bot remembers about one workspace member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: Option<String>,
    pub blij: Option<bool>,
    pub last_survey_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// In-memory record for a user the store has never seen.
    pub fn unknown(id: UserId) -> Self {
        Self { id, name: None, blij: None, last_survey_at: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn record_happiness(&mut self, blij: bool, answered_at: DateTime<Utc>) {
        self.blij = Some(blij);
        self.last_survey_at = Some(answered_at);
    }

    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{UserId, UserRecord};

    #[test]
    fn unknown_record_has_no_state() {
        let record = UserRecord::unknown(UserId::new("U1"));

        assert_eq!(record.id.as_str(), "U1");
        assert!(record.name.is_none());
        assert!(record.blij.is_none());
        assert!(record.last_survey_at.is_none());
    }

    #[test]
    fn recording_happiness_sets_answer_and_timestamp() {
        let answered_at = Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap();
        let mut record = UserRecord::unknown(UserId::new("U2"));

        record.record_happiness(false, answered_at);

        assert_eq!(record.blij, Some(false));
        assert_eq!(record.last_survey_at, Some(answered_at));
    }

    #[test]
    fn blank_names_are_not_displayed() {
        let record = UserRecord::unknown(UserId::new("U3")).with_name("  ");
        assert_eq!(record.display_name(), None);

        let record = UserRecord::unknown(UserId::new("U3")).with_name("Sam");
        assert_eq!(record.display_name(), Some("Sam"));
    }
}
