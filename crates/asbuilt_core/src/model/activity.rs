//! Activity feed entries derived from review events.
//!
//! # Responsibility
//! - Map every `(alert, section)` pair to a presentation badge.
//! - Gate approval affordances on explicit approval state.
//!
//! # Invariants
//! - Badge lookup is an exhaustive match; adding an alert or section without
//!   a mapping does not compile.
//! - `shows_respond_action` depends only on `approval`.

use serde::{Deserialize, Serialize};

/// Severity of one activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAlert {
    Success,
    Info,
    Warning,
    Error,
}

/// Dashboard area an activity entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySection {
    Photos,
    Plans,
    Reports,
    Messages,
}

/// Color tone rendered by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTone {
    Positive,
    Neutral,
    Caution,
    Critical,
}

/// Icon key + tone pair for one activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityBadge {
    pub icon: &'static str,
    pub tone: BadgeTone,
}

/// Review state of an item awaiting sign-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    NotRequired,
    Pending,
    Approved,
    Rejected,
}

/// One entry of a project activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub alert: ActivityAlert,
    pub section: ActivitySection,
    pub title: String,
    pub approval: ApprovalStatus,
    /// Unix epoch milliseconds.
    pub occurred_at: i64,
}

impl ActivityItem {
    pub fn badge(&self) -> ActivityBadge {
        badge_for(self.alert, self.section)
    }

    pub fn shows_approved_badge(&self) -> bool {
        self.approval == ApprovalStatus::Approved
    }

    pub fn shows_respond_action(&self) -> bool {
        self.approval == ApprovalStatus::Pending
    }
}

/// Badge lookup over every alert/section pair.
pub fn badge_for(alert: ActivityAlert, section: ActivitySection) -> ActivityBadge {
    use ActivityAlert as A;
    use ActivitySection as S;

    let (icon, tone) = match (alert, section) {
        (A::Success, S::Photos) => ("pin-check", BadgeTone::Positive),
        (A::Success, S::Plans) => ("plan-check", BadgeTone::Positive),
        (A::Success, S::Reports) => ("report-check", BadgeTone::Positive),
        (A::Success, S::Messages) => ("message-check", BadgeTone::Positive),
        (A::Info, S::Photos) => ("photo", BadgeTone::Neutral),
        (A::Info, S::Plans) => ("plan", BadgeTone::Neutral),
        (A::Info, S::Reports) => ("report", BadgeTone::Neutral),
        (A::Info, S::Messages) => ("message", BadgeTone::Neutral),
        (A::Warning, S::Photos) => ("photo-alert", BadgeTone::Caution),
        (A::Warning, S::Plans) => ("plan-alert", BadgeTone::Caution),
        (A::Warning, S::Reports) => ("report-alert", BadgeTone::Caution),
        (A::Warning, S::Messages) => ("message-alert", BadgeTone::Caution),
        (A::Error, S::Photos) => ("photo-error", BadgeTone::Critical),
        (A::Error, S::Plans) => ("plan-error", BadgeTone::Critical),
        (A::Error, S::Reports) => ("report-error", BadgeTone::Critical),
        (A::Error, S::Messages) => ("message-error", BadgeTone::Critical),
    };
    ActivityBadge { icon, tone }
}

#[cfg(test)]
mod tests {
    use super::{
        badge_for, ActivityAlert, ActivityItem, ActivitySection, ApprovalStatus, BadgeTone,
    };

    #[test]
    fn every_pair_has_a_distinct_icon() {
        let alerts = [
            ActivityAlert::Success,
            ActivityAlert::Info,
            ActivityAlert::Warning,
            ActivityAlert::Error,
        ];
        let sections = [
            ActivitySection::Photos,
            ActivitySection::Plans,
            ActivitySection::Reports,
            ActivitySection::Messages,
        ];
        let mut icons = std::collections::HashSet::new();
        for alert in alerts {
            for section in sections {
                assert!(icons.insert(badge_for(alert, section).icon));
            }
        }
        assert_eq!(icons.len(), 16);
        assert_eq!(
            badge_for(ActivityAlert::Error, ActivitySection::Plans).tone,
            BadgeTone::Critical
        );
    }

    #[test]
    fn respond_action_follows_approval_state_only() {
        let mut item = ActivityItem {
            alert: ActivityAlert::Info,
            section: ActivitySection::Reports,
            title: "Weekly report".to_string(),
            approval: ApprovalStatus::Pending,
            occurred_at: 0,
        };
        assert!(item.shows_respond_action());
        assert!(!item.shows_approved_badge());

        item.approval = ApprovalStatus::Approved;
        assert!(!item.shows_respond_action());
        assert!(item.shows_approved_badge());
    }
}
