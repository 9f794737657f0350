use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub department: Option<String>,
}

/// One approved leave interval from the user's ledger, both ends inclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::FromRow)]
pub struct OffdayInterval {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum AvailabilityStatus {
    OnLeave,
    Available,
}

/// Projection over the leave ledger: a user is on leave on `date` iff the date
/// falls within any approved interval.
pub fn availability_on(date: NaiveDate, offdays: &[OffdayInterval]) -> AvailabilityStatus {
    let on_leave = offdays
        .iter()
        .any(|o| date >= o.start_date && date <= o.end_date);
    if on_leave {
        AvailabilityStatus::OnLeave
    } else {
        AvailabilityStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn interval(start: &str, end: &str) -> OffdayInterval {
        OffdayInterval {
            start_date: date(start),
            end_date: date(end),
        }
    }

    #[test]
    fn interval_bounds_are_inclusive() {
        let ledger = [interval("2024-03-01", "2024-03-03")];
        assert_eq!(availability_on(date("2024-02-29"), &ledger), AvailabilityStatus::Available);
        assert_eq!(availability_on(date("2024-03-01"), &ledger), AvailabilityStatus::OnLeave);
        assert_eq!(availability_on(date("2024-03-02"), &ledger), AvailabilityStatus::OnLeave);
        assert_eq!(availability_on(date("2024-03-03"), &ledger), AvailabilityStatus::OnLeave);
        assert_eq!(availability_on(date("2024-03-04"), &ledger), AvailabilityStatus::Available);
    }

    #[test]
    fn any_interval_counts() {
        let ledger = [
            interval("2024-01-10", "2024-01-12"),
            interval("2024-05-01", "2024-05-01"),
        ];
        assert_eq!(availability_on(date("2024-05-01"), &ledger), AvailabilityStatus::OnLeave);
        assert_eq!(availability_on(date("2024-03-01"), &ledger), AvailabilityStatus::Available);
    }

    #[test]
    fn empty_ledger_means_available() {
        assert_eq!(availability_on(date("2024-03-01"), &[]), AvailabilityStatus::Available);
    }

    #[test]
    fn status_strings() {
        assert_eq!(AvailabilityStatus::OnLeave.to_string(), "on_leave");
        assert_eq!(AvailabilityStatus::Available.to_string(), "available");
        assert_eq!(
            "on_leave".parse::<AvailabilityStatus>().unwrap(),
            AvailabilityStatus::OnLeave
        );
    }
}
