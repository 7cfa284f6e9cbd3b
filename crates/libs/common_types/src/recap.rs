use bon::bon;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecapStatus {
    Generating,
    Completed,
    Failed,
}

impl RecapStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl Display for RecapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Text produced by the content-generation service for a completed recap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AiGenerated {
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub highlights: Vec<String>,
}

/// Generation state of a recap. The payload only exists on the completed variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(
    tag = "status",
    rename_all = "lowercase",
    rename_all_fields = "camelCase"
)]
pub enum RecapGeneration {
    Generating,
    Completed { ai_generated: AiGenerated },
    Failed { reason: String },
}

impl RecapGeneration {
    #[must_use]
    pub const fn status(&self) -> RecapStatus {
        match self {
            Self::Generating => RecapStatus::Generating,
            Self::Completed { .. } => RecapStatus::Completed,
            Self::Failed { .. } => RecapStatus::Failed,
        }
    }
}

/// The result delivered by the content-generation service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum GenerationOutcome {
    Completed(AiGenerated),
    Failed { reason: String },
}

/// Completion signal for one recap, possibly delivered more than once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSignal {
    pub recap_id: String,
    pub outcome: GenerationOutcome,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A reference to an existing media item. The recap does not own the item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MediaEntry {
    pub media_item_id: String,
    pub taken_at: DateTime<Utc>,
}

/// An asynchronously generated summary of a date range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Recap {
    pub id: String,
    pub owner_id: String,
    pub child_ids: Vec<String>,
    #[serde(flatten)]
    generation: RecapGeneration,
    pub media_entries: Vec<MediaEntry>,
    pub date_range: DateRange,
    pub likes: u32,
    pub is_favorited: bool,
    pub is_milestone: bool,
    pub comment_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[bon]
impl Recap {
    /// Creates a recap in the `generating` state. Media entries are kept sorted by date.
    #[builder]
    pub fn generating(
        #[builder(into)] id: String,
        #[builder(into)] owner_id: String,
        child_ids: Vec<String>,
        date_range: DateRange,
        #[builder(default)] media_entries: Vec<MediaEntry>,
        #[builder(default = Utc::now())] created_at: DateTime<Utc>,
    ) -> Self {
        let mut media_entries = media_entries;
        media_entries.sort_by_key(|e| e.taken_at);
        Self {
            id,
            owner_id,
            child_ids,
            generation: RecapGeneration::Generating,
            media_entries,
            date_range,
            likes: 0,
            is_favorited: false,
            is_milestone: false,
            comment_count: 0,
            created_at,
            updated_at: created_at,
        }
    }
}

impl Recap {
    #[must_use]
    pub const fn status(&self) -> RecapStatus {
        self.generation.status()
    }

    #[must_use]
    pub const fn ai_generated(&self) -> Option<&AiGenerated> {
        match &self.generation {
            RecapGeneration::Completed { ai_generated } => Some(ai_generated),
            _ => None,
        }
    }

    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        match &self.generation {
            RecapGeneration::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    /// Moves a generating recap to its terminal state.
    ///
    /// Returns `false` without touching the recap when it is already terminal.
    pub fn settle(&mut self, outcome: GenerationOutcome, at: DateTime<Utc>) -> bool {
        if self.status().is_terminal() {
            return false;
        }
        self.generation = match outcome {
            GenerationOutcome::Completed(ai_generated) => {
                RecapGeneration::Completed { ai_generated }
            }
            GenerationOutcome::Failed { reason } => RecapGeneration::Failed { reason },
        };
        self.updated_at = at;
        true
    }

    pub fn toggle_favorite(&mut self, at: DateTime<Utc>) -> bool {
        self.is_favorited = !self.is_favorited;
        self.updated_at = at;
        self.is_favorited
    }

    pub fn toggle_milestone(&mut self, at: DateTime<Utc>) -> bool {
        self.is_milestone = !self.is_milestone;
        self.updated_at = at;
        self.is_milestone
    }

    pub fn increment_likes(&mut self, at: DateTime<Utc>) -> u32 {
        self.likes = self.likes.saturating_add(1);
        self.updated_at = at;
        self.likes
    }

    pub fn add_comment(&mut self, at: DateTime<Utc>) -> u32 {
        self.comment_count = self.comment_count.saturating_add(1);
        self.updated_at = at;
        self.comment_count
    }

    pub fn remove_comment(&mut self, at: DateTime<Utc>) -> u32 {
        self.comment_count = self.comment_count.saturating_sub(1);
        self.updated_at = at;
        self.comment_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> DateRange {
        DateRange {
            start: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 5, 7).unwrap_or_default(),
        }
    }

    fn summary() -> AiGenerated {
        AiGenerated {
            title: "A week at the lake".to_owned(),
            summary: "Swimming, mostly.".to_owned(),
            highlights: vec!["First dive".to_owned()],
        }
    }

    #[test]
    fn media_entries_are_sorted_on_creation() {
        let late = MediaEntry {
            media_item_id: "b".to_owned(),
            taken_at: DateTime::from_timestamp(2_000, 0).unwrap_or_default(),
        };
        let early = MediaEntry {
            media_item_id: "a".to_owned(),
            taken_at: DateTime::from_timestamp(1_000, 0).unwrap_or_default(),
        };
        let recap = Recap::generating()
            .id("r1")
            .owner_id("u1")
            .child_ids(vec!["c1".to_owned()])
            .date_range(range())
            .media_entries(vec![late, early])
            .call();

        let ids: Vec<_> = recap
            .media_entries
            .iter()
            .map(|e| e.media_item_id.as_str())
            .collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(recap.status(), RecapStatus::Generating);
        assert!(recap.ai_generated().is_none());
    }

    #[test]
    fn settle_happens_exactly_once() {
        let mut recap = Recap::generating()
            .id("r1")
            .owner_id("u1")
            .child_ids(vec![])
            .date_range(range())
            .call();

        assert!(recap.settle(GenerationOutcome::Completed(summary()), Utc::now()));
        assert_eq!(recap.status(), RecapStatus::Completed);
        assert_eq!(recap.ai_generated(), Some(&summary()));

        let failed = GenerationOutcome::Failed {
            reason: "late failure".to_owned(),
        };
        assert!(!recap.settle(failed, Utc::now()));
        assert_eq!(recap.status(), RecapStatus::Completed);
        assert!(recap.failure_reason().is_none());
    }

    #[test]
    fn serializes_status_next_to_payload() -> Result<(), serde_json::Error> {
        let mut recap = Recap::generating()
            .id("r1")
            .owner_id("u1")
            .child_ids(vec![])
            .date_range(range())
            .call();
        recap.settle(GenerationOutcome::Completed(summary()), Utc::now());

        let json = serde_json::to_value(&recap)?;
        assert_eq!(json["status"], "completed");
        assert_eq!(json["aiGenerated"]["title"], "A week at the lake");
        assert_eq!(json["dateRange"]["start"], "2024-05-01");

        let back: Recap = serde_json::from_value(json)?;
        assert_eq!(back, recap);
        Ok(())
    }

    #[test]
    fn comment_count_never_underflows() {
        let mut recap = Recap::generating()
            .id("r1")
            .owner_id("u1")
            .child_ids(vec![])
            .date_range(range())
            .call();
        assert_eq!(recap.remove_comment(Utc::now()), 0);
        assert_eq!(recap.add_comment(Utc::now()), 1);
    }
}
