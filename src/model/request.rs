use crate::error::ApiError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Approval workflow states. `Accepted` and `Rejected` are terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    InProgress,
    Accepted,
    Rejected,
}

/// Actions available to a director while a request is pending.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum DirectorAction {
    Forward,
    Reject,
}

/// Terminal actions available to the chairman once a request is in progress.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ChairmanAction {
    Accept,
    Reject,
}

impl RequestStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Accepted | RequestStatus::Rejected)
    }

    /// In-progress requests sort ahead of everything else in listings.
    pub const fn sort_priority(self) -> i32 {
        match self {
            RequestStatus::InProgress => 0,
            _ => 1,
        }
    }

    /// Director decisions are valid only while the request is still pending.
    pub fn director_transition(self, action: DirectorAction) -> Result<RequestStatus, ApiError> {
        match self {
            RequestStatus::Pending => Ok(match action {
                DirectorAction::Forward => RequestStatus::InProgress,
                DirectorAction::Reject => RequestStatus::Rejected,
            }),
            _ => Err(ApiError::conflict("Already processed")),
        }
    }

    /// Chairman decisions are valid only once a director has forwarded the
    /// request. Repeating an applied decision lands here and fails, which is
    /// what keeps the leave ledger free of duplicate entries.
    pub fn chairman_transition(self, action: ChairmanAction) -> Result<RequestStatus, ApiError> {
        match (self, action) {
            (RequestStatus::InProgress, ChairmanAction::Accept) => Ok(RequestStatus::Accepted),
            (RequestStatus::InProgress, ChairmanAction::Reject) => Ok(RequestStatus::Rejected),
            (_, ChairmanAction::Accept) => Err(ApiError::conflict("Not ready for acceptance")),
            (_, ChairmanAction::Reject) => Err(ApiError::conflict("Already processed")),
        }
    }
}

/// Inclusive day count of a leave interval. A same-day request counts as one.
pub fn leave_days(start: NaiveDate, end: NaiveDate) -> Result<i64, ApiError> {
    if end < start {
        return Err(ApiError::validation("End date must be after start date"));
    }
    Ok((end - start).num_days() + 1)
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct OffdayRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "jane.doe@school.edu", format = "email", value_type = String)]
    pub owner_email: String,
    #[schema(example = "Conference")]
    pub subject: String,
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-03-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 3)]
    pub days: i64,
    #[schema(example = "Attending conf")]
    pub description: String,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(nullable = true)]
    pub rejection_message: Option<String>,
    #[schema(example = "2024-02-20T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
}

impl OffdayRequest {
    /// Typed view of the persisted status column.
    pub fn current_status(&self) -> Result<RequestStatus, ApiError> {
        self.status.parse::<RequestStatus>().map_err(|_| {
            tracing::error!(id = self.id, status = %self.status, "Corrupt request status");
            ApiError::Internal
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn day_count_is_inclusive() {
        assert_eq!(leave_days(date("2024-03-01"), date("2024-03-01")).unwrap(), 1);
        assert_eq!(leave_days(date("2024-03-01"), date("2024-03-03")).unwrap(), 3);
        assert_eq!(leave_days(date("2024-03-01"), date("2024-03-05")).unwrap(), 5);
        // month boundary
        assert_eq!(leave_days(date("2024-02-28"), date("2024-03-01")).unwrap(), 3);
    }

    #[test]
    fn inverted_interval_is_rejected() {
        let err = leave_days(date("2024-03-03"), date("2024-03-01")).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn director_acts_only_on_pending() {
        assert_eq!(
            RequestStatus::Pending
                .director_transition(DirectorAction::Forward)
                .unwrap(),
            RequestStatus::InProgress
        );
        assert_eq!(
            RequestStatus::Pending
                .director_transition(DirectorAction::Reject)
                .unwrap(),
            RequestStatus::Rejected
        );
        for status in [
            RequestStatus::InProgress,
            RequestStatus::Accepted,
            RequestStatus::Rejected,
        ] {
            assert!(status.director_transition(DirectorAction::Forward).is_err());
            assert!(status.director_transition(DirectorAction::Reject).is_err());
        }
    }

    #[test]
    fn chairman_acts_only_on_in_progress() {
        assert_eq!(
            RequestStatus::InProgress
                .chairman_transition(ChairmanAction::Accept)
                .unwrap(),
            RequestStatus::Accepted
        );
        assert_eq!(
            RequestStatus::InProgress
                .chairman_transition(ChairmanAction::Reject)
                .unwrap(),
            RequestStatus::Rejected
        );
        for status in [
            RequestStatus::Pending,
            RequestStatus::Accepted,
            RequestStatus::Rejected,
        ] {
            assert!(status.chairman_transition(ChairmanAction::Accept).is_err());
            assert!(status.chairman_transition(ChairmanAction::Reject).is_err());
        }
    }

    #[test]
    fn repeated_accept_is_a_conflict() {
        let accepted = RequestStatus::InProgress
            .chairman_transition(ChairmanAction::Accept)
            .unwrap();
        let err = accepted.chairman_transition(ChairmanAction::Accept).unwrap_err();
        assert_eq!(err.to_string(), "Not ready for acceptance");
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn terminal_states() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(!RequestStatus::InProgress.is_terminal());
        assert!(RequestStatus::Accepted.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
    }

    #[test]
    fn in_progress_sorts_first() {
        let mut statuses = vec![
            RequestStatus::Accepted,
            RequestStatus::InProgress,
            RequestStatus::Pending,
            RequestStatus::Rejected,
        ];
        statuses.sort_by_key(|s| s.sort_priority());
        assert_eq!(statuses[0], RequestStatus::InProgress);
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::InProgress,
            RequestStatus::Accepted,
            RequestStatus::Rejected,
        ] {
            assert_eq!(status.to_string().parse::<RequestStatus>().unwrap(), status);
        }
        assert_eq!("in_progress".parse::<RequestStatus>().unwrap(), RequestStatus::InProgress);
        assert!("approved".parse::<RequestStatus>().is_err());
    }
}
