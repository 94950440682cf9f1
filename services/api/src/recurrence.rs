//! Recurrence expansion for repeating events
//!
//! A recurring event is stored as independent instances. Given the base date
//! `D`, a recurrence kind and an inclusive end date `E`, the expander yields
//! the dates of the additional instances: `D + k * step` for `k = 1, 2, ...`
//! while the date is not after `E`. The base date itself is never yielded.
//!
//! Monthly steps are computed from the base date rather than from the
//! previous instance, and a day that does not exist in the target month is
//! clamped to that month's last day. A series starting on January 31st
//! therefore runs Feb 29th (or 28th), Mar 31st, Apr 30th and so on without
//! drifting.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// How often a recurring event repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringType {
    Weekly,
    Monthly,
}

impl RecurringType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringType::Weekly => "weekly",
            RecurringType::Monthly => "monthly",
        }
    }
}

impl fmt::Display for RecurringType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurringType {
    type Err = RecurrenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(RecurringType::Weekly),
            "monthly" => Ok(RecurringType::Monthly),
            other => Err(RecurrenceError::UnknownType(other.to_string())),
        }
    }
}

/// Invalid recurrence parameters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("Recurring type is required for recurring events")]
    MissingType,

    #[error("Recurring end date is required for recurring events")]
    MissingEndDate,

    #[error("Recurring end date must be after the event date")]
    EndNotAfterStart,

    #[error("Unknown recurring type: {0}")]
    UnknownType(String),
}

/// A validated recurrence: kind plus inclusive end date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub kind: RecurringType,
    pub end: DateTime<Utc>,
}

impl RecurrenceRule {
    /// Build a rule from request fields
    ///
    /// Returns `Ok(None)` for a non-recurring event. Type and end date are
    /// both required when `is_recurring` is set, and the end date must be
    /// strictly after `base`.
    pub fn from_input(
        is_recurring: bool,
        kind: Option<RecurringType>,
        end: Option<DateTime<Utc>>,
        base: DateTime<Utc>,
    ) -> Result<Option<Self>, RecurrenceError> {
        if !is_recurring {
            return Ok(None);
        }

        let kind = kind.ok_or(RecurrenceError::MissingType)?;
        let end = end.ok_or(RecurrenceError::MissingEndDate)?;

        if end <= base {
            return Err(RecurrenceError::EndNotAfterStart);
        }

        Ok(Some(RecurrenceRule { kind, end }))
    }

    /// Lazily walk the additional instance dates after `base`
    pub fn occurrences(&self, base: DateTime<Utc>) -> Occurrences {
        Occurrences {
            base,
            rule: *self,
            step: 0,
            done: false,
        }
    }

    /// All additional instance dates after `base`, in order
    #[cfg(test)]
    pub fn expand(&self, base: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        self.occurrences(base).collect()
    }
}

/// Iterator over the generated instance dates of a rule
#[derive(Debug, Clone)]
pub struct Occurrences {
    base: DateTime<Utc>,
    rule: RecurrenceRule,
    step: u32,
    done: bool,
}

impl Iterator for Occurrences {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.step += 1;
        match advance(self.base, self.rule.kind, self.step) {
            Some(date) if date <= self.rule.end => Some(date),
            _ => {
                self.done = true;
                None
            }
        }
    }
}

impl std::iter::FusedIterator for Occurrences {}

fn advance(base: DateTime<Utc>, kind: RecurringType, steps: u32) -> Option<DateTime<Utc>> {
    match kind {
        RecurringType::Weekly => base.checked_add_signed(Duration::weeks(i64::from(steps))),
        RecurringType::Monthly => base.checked_add_months(Months::new(steps)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 18, 30, 0).unwrap()
    }

    fn weekly_until(end: DateTime<Utc>) -> RecurrenceRule {
        RecurrenceRule {
            kind: RecurringType::Weekly,
            end,
        }
    }

    #[test]
    fn test_weekly_end_is_inclusive() {
        let dates = weekly_until(at(2024, 1, 22)).expand(at(2024, 1, 1));
        assert_eq!(dates, vec![at(2024, 1, 8), at(2024, 1, 15), at(2024, 1, 22)]);
    }

    #[test]
    fn test_weekly_stops_before_end() {
        let dates = weekly_until(at(2024, 1, 21)).expand(at(2024, 1, 1));
        assert_eq!(dates, vec![at(2024, 1, 8), at(2024, 1, 15)]);
    }

    #[test]
    fn test_end_inside_first_step_yields_nothing() {
        let dates = weekly_until(at(2024, 1, 5)).expand(at(2024, 1, 1));
        assert!(dates.is_empty());
    }

    #[test]
    fn test_monthly_clamps_to_month_end_without_drift() {
        let rule = RecurrenceRule {
            kind: RecurringType::Monthly,
            end: at(2024, 5, 31),
        };

        let dates = rule.expand(at(2024, 1, 31));
        assert_eq!(
            dates,
            vec![at(2024, 2, 29), at(2024, 3, 31), at(2024, 4, 30), at(2024, 5, 31)]
        );
    }

    #[test]
    fn test_monthly_in_non_leap_year() {
        let rule = RecurrenceRule {
            kind: RecurringType::Monthly,
            end: at(2023, 3, 1),
        };
        assert_eq!(rule.expand(at(2023, 1, 31)), vec![at(2023, 2, 28)]);
    }

    #[test]
    fn test_time_of_day_is_preserved() {
        let dates = weekly_until(at(2024, 2, 1)).expand(at(2024, 1, 1));
        assert!(dates.iter().all(|d| d.time() == at(2024, 1, 1).time()));
    }

    #[test]
    fn test_occurrences_are_lazy() {
        let rule = weekly_until(at(2100, 1, 1));
        let first: Vec<_> = rule.occurrences(at(2024, 1, 1)).take(2).collect();
        assert_eq!(first, vec![at(2024, 1, 8), at(2024, 1, 15)]);
    }

    #[test]
    fn test_iterator_is_fused() {
        let mut occurrences = weekly_until(at(2024, 1, 8)).occurrences(at(2024, 1, 1));
        assert_eq!(occurrences.next(), Some(at(2024, 1, 8)));
        assert_eq!(occurrences.next(), None);
        assert_eq!(occurrences.next(), None);
    }

    #[test]
    fn test_from_input_validation() {
        let base = at(2024, 1, 1);

        assert_eq!(RecurrenceRule::from_input(false, None, None, base), Ok(None));
        assert_eq!(
            RecurrenceRule::from_input(true, None, Some(at(2024, 2, 1)), base),
            Err(RecurrenceError::MissingType)
        );
        assert_eq!(
            RecurrenceRule::from_input(true, Some(RecurringType::Weekly), None, base),
            Err(RecurrenceError::MissingEndDate)
        );
        assert_eq!(
            RecurrenceRule::from_input(true, Some(RecurringType::Weekly), Some(base), base),
            Err(RecurrenceError::EndNotAfterStart)
        );
        assert_eq!(
            RecurrenceRule::from_input(
                true,
                Some(RecurringType::Monthly),
                Some(at(2023, 12, 1)),
                base
            ),
            Err(RecurrenceError::EndNotAfterStart)
        );
        assert_eq!(
            RecurrenceRule::from_input(
                true,
                Some(RecurringType::Monthly),
                Some(at(2024, 3, 1)),
                base
            ),
            Ok(Some(RecurrenceRule {
                kind: RecurringType::Monthly,
                end: at(2024, 3, 1)
            }))
        );
    }

    #[test]
    fn test_parse_recurring_type() {
        assert_eq!("weekly".parse::<RecurringType>(), Ok(RecurringType::Weekly));
        assert_eq!("monthly".parse::<RecurringType>(), Ok(RecurringType::Monthly));
        assert!("daily".parse::<RecurringType>().is_err());
    }
}
