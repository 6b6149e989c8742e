use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::MAX_BOT_WINDOW_SECS;
use crate::domain::user::UserRecord;

/// Decides whether an ambient message should trigger the happiness prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurveyGate {
    threshold: Duration,
}

impl SurveyGate {
    /// The threshold is clamped to `0..=MAX_BOT_WINDOW_SECS`.
    pub fn new(threshold_secs: i64) -> Self {
        Self { threshold: Duration::seconds(threshold_secs.clamp(0, MAX_BOT_WINDOW_SECS)) }
    }

    /// `last_prompted_at` is the last time this user was asked, answered or not.
    pub fn should_prompt(
        &self,
        record: &UserRecord,
        last_prompted_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        if let Some(prompted_at) = last_prompted_at {
            if now - prompted_at <= self.threshold {
                return false;
            }
        }

        match (record.blij, record.last_survey_at) {
            (Some(_), Some(answered_at)) => now - answered_at > self.threshold,
            _ => true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamHappiness {
    pub happy: usize,
    pub unhappy: usize,
    pub unknown: usize,
}

/// Tallies recorded answers. `member_count` is the startup snapshot, so
/// `unknown` saturates at zero once membership has drifted below the tally.
pub fn tally_team<'a>(
    records: impl IntoIterator<Item = &'a UserRecord>,
    member_count: usize,
) -> TeamHappiness {
    let (happy, unhappy) =
        records.into_iter().fold((0usize, 0usize), |(happy, unhappy), record| match record.blij {
            Some(true) => (happy + 1, unhappy),
            Some(false) => (happy, unhappy + 1),
            None => (happy, unhappy),
        });

    TeamHappiness { happy, unhappy, unknown: member_count.saturating_sub(happy + unhappy) }
}
