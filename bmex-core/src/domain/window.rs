use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::data::provider::DataError;

/// First day for which BitMEX publishes archives.
pub fn dataset_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2014, 11, 22).expect("valid calendar date")
}

/// Validated, inclusive range of calendar days to harvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WindowBounds")]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

/// Unchecked wire form of a [`DateWindow`].
#[derive(Deserialize)]
struct WindowBounds {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<WindowBounds> for DateWindow {
    type Error = DataError;

    /// A stored window has no "today" to clamp against; order and the dataset
    /// start are still enforced.
    fn try_from(bounds: WindowBounds) -> Result<Self, Self::Error> {
        DateWindow::validate(bounds.start, bounds.end, NaiveDate::MAX)
    }
}

impl DateWindow {
    /// Validate a requested range against the dataset start and `today`.
    ///
    /// An `end` past `today` is lowered to `today` rather than rejected.
    pub fn validate(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<Self, DataError> {
        if end < start {
            return Err(DataError::InvalidRange(format!(
                "end date {end} is earlier than start date {start}"
            )));
        }

        let min = dataset_start();
        if start < min {
            return Err(DataError::InvalidRange(format!(
                "start date {start} is earlier than the first available archive ({min})"
            )));
        }

        let end = end.min(today);
        if start > end {
            return Err(DataError::InvalidRange(format!(
                "start date {start} is in the future (today is {today})"
            )));
        }

        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Every day in the window, oldest first.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    pub fn len_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }
}

/// True when `date` is today or yesterday, i.e. its archive may not be published yet.
pub fn is_recent(date: NaiveDate, today: NaiveDate) -> bool {
    date == today || date == today - Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn accepts_ordinary_window() {
        let w = DateWindow::validate(d(2018, 10, 30), d(2018, 11, 1), d(2024, 1, 1)).unwrap();
        assert_eq!(w.start(), d(2018, 10, 30));
        assert_eq!(w.end(), d(2018, 11, 1));
        assert_eq!(
            w.days().collect::<Vec<_>>(),
            vec![d(2018, 10, 30), d(2018, 10, 31), d(2018, 11, 1)]
        );
        assert_eq!(w.len_days(), 3);
    }

    #[test]
    fn single_day_window() {
        let w = DateWindow::validate(d(2020, 2, 29), d(2020, 2, 29), d(2024, 1, 1)).unwrap();
        assert_eq!(w.days().count(), 1);
    }

    #[test]
    fn first_dataset_day_is_allowed() {
        assert!(DateWindow::validate(dataset_start(), dataset_start(), d(2024, 1, 1)).is_ok());
        assert!(DateWindow::validate(d(2014, 11, 21), d(2014, 11, 22), d(2024, 1, 1)).is_err());
    }

    #[test]
    fn future_start_is_rejected() {
        let today = d(2024, 1, 1);
        let err = DateWindow::validate(d(2024, 1, 5), d(2024, 1, 9), today).unwrap_err();
        assert!(matches!(err, DataError::InvalidRange(_)));
    }

    #[test]
    fn deserialized_window_is_validated() {
        let w: DateWindow =
            serde_json::from_str(r#"{"start":"2018-10-30","end":"2018-11-01"}"#).unwrap();
        assert_eq!(w.len_days(), 3);
        assert_eq!(serde_json::from_str::<DateWindow>(&serde_json::to_string(&w).unwrap()).unwrap(), w);

        let reversed = serde_json::from_str::<DateWindow>(r#"{"start":"2018-11-02","end":"2018-11-01"}"#);
        assert!(reversed.unwrap_err().to_string().contains("earlier than start date"));

        let too_early = serde_json::from_str::<DateWindow>(r#"{"start":"2014-01-01","end":"2014-12-01"}"#);
        assert!(too_early.is_err());
    }

    #[test]
    fn recent_days() {
        let today = d(2024, 3, 1);
        assert!(is_recent(today, today));
        assert!(is_recent(d(2024, 2, 29), today));
        assert!(!is_recent(d(2024, 2, 28), today));
    }

    fn arb_date() -> impl Strategy<Value = NaiveDate> {
        (0i64..4000).prop_map(|offset| d(2013, 1, 1) + Duration::days(offset))
    }

    proptest! {
        #[test]
        fn end_before_start_always_fails(start in arb_date(), gap in 1i64..500) {
            let end = start - Duration::days(gap);
            let result = DateWindow::validate(start, end, d(2030, 1, 1));
            prop_assert!(matches!(result, Err(DataError::InvalidRange(_))));
        }

        #[test]
        fn start_before_dataset_always_fails(before in 1i64..700, len in 0i64..30) {
            let start = dataset_start() - Duration::days(before);
            let end = start + Duration::days(len);
            let result = DateWindow::validate(start, end, d(2030, 1, 1));
            prop_assert!(matches!(result, Err(DataError::InvalidRange(_))));
        }

        #[test]
        fn end_after_today_is_clamped(back in 0i64..300, ahead in 1i64..300) {
            let today = d(2022, 6, 15);
            let start = today - Duration::days(back);
            let w = DateWindow::validate(start, today + Duration::days(ahead), today).unwrap();
            prop_assert_eq!(w.end(), today);
            prop_assert!(w.start() <= w.end());
        }
    }
}
