//! Recurrence frequencies and the due-date advance rule.

use chrono::{DateTime, Days, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::HomecueError;

/// How often a maintenance task comes around.
///
/// Closed set: adding a variant forces [`Frequency::advance`] to be updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annual,
    Seasonal,
}

impl Frequency {
    pub const ALL: [Frequency; 6] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::Annual,
        Frequency::Seasonal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Annual => "annual",
            Frequency::Seasonal => "seasonal",
        }
    }

    /// Next due date after `due`.
    ///
    /// Month-based steps use calendar arithmetic and clamp to the last day of
    /// the target month (Jan 31 + 1 month = Feb 28/29). Seasonal is the same
    /// three-month step as quarterly.
    ///
    /// If the addition overflows chrono's range the date is returned unchanged.
    pub fn advance(self, due: DateTime<Utc>) -> DateTime<Utc> {
        let next = match self {
            Frequency::Daily => due.checked_add_days(Days::new(1)),
            Frequency::Weekly => due.checked_add_days(Days::new(7)),
            Frequency::Monthly => due.checked_add_months(Months::new(1)),
            Frequency::Quarterly | Frequency::Seasonal => due.checked_add_months(Months::new(3)),
            Frequency::Annual => due.checked_add_months(Months::new(12)),
        };

        next.unwrap_or_else(|| {
            tracing::warn!(frequency = %self, %due, "due date out of range, keeping it unchanged");
            due
        })
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = HomecueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Frequency::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| HomecueError::UnknownFrequency(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()
    }

    #[rstest]
    #[case(Frequency::Daily, at(2024, 6, 1), at(2024, 6, 2))]
    #[case(Frequency::Daily, at(2024, 12, 31), at(2025, 1, 1))]
    #[case(Frequency::Weekly, at(2024, 2, 26), at(2024, 3, 4))]
    #[case(Frequency::Monthly, at(2024, 1, 15), at(2024, 2, 15))]
    #[case(Frequency::Monthly, at(2024, 1, 31), at(2024, 2, 29))]
    #[case(Frequency::Monthly, at(2023, 1, 31), at(2023, 2, 28))]
    #[case(Frequency::Monthly, at(2024, 12, 10), at(2025, 1, 10))]
    #[case(Frequency::Quarterly, at(2024, 11, 30), at(2025, 2, 28))]
    #[case(Frequency::Seasonal, at(2024, 3, 1), at(2024, 6, 1))]
    #[case(Frequency::Annual, at(2024, 2, 29), at(2025, 2, 28))]
    #[case(Frequency::Annual, at(2024, 7, 4), at(2025, 7, 4))]
    fn advance_rule(
        #[case] frequency: Frequency,
        #[case] due: DateTime<Utc>,
        #[case] expected: DateTime<Utc>,
    ) {
        assert_eq!(frequency.advance(due), expected);
    }

    #[test]
    fn seasonal_matches_quarterly() {
        let due = at(2024, 8, 31);
        assert_eq!(Frequency::Seasonal.advance(due), Frequency::Quarterly.advance(due));
    }

    #[test]
    fn advance_keeps_time_of_day() {
        let due = Utc.with_ymd_and_hms(2024, 5, 5, 23, 59, 59).unwrap();
        let next = Frequency::Monthly.advance(due);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 6, 5, 23, 59, 59).unwrap());
    }

    #[test]
    fn overflow_returns_same_date() {
        let due = DateTime::<Utc>::MAX_UTC;
        assert_eq!(Frequency::Annual.advance(due), due);
    }

    #[test]
    fn parse_round_trips_every_variant() {
        for f in Frequency::ALL {
            assert_eq!(f.as_str().parse::<Frequency>().unwrap(), f);
        }
        assert!(matches!(
            "biweekly".parse::<Frequency>(),
            Err(HomecueError::UnknownFrequency(_))
        ));
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Frequency::Quarterly).unwrap();
        assert_eq!(json, "\"quarterly\"");
        assert!(serde_json::from_str::<Frequency>("\"fortnightly\"").is_err());
    }
}
