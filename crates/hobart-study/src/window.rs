//! Business-day window construction.
//!
//! An event study works over two disjoint business-day sequences derived
//! from the event date: the event window around the date itself, and an
//! estimation window of fixed length ending a gap of business days before
//! it. Business days are Monday through Friday; no holiday calendar is
//! applied, so exchange holidays surface as dates the stores simply have
//! no rows for.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from window construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    /// Only business-day frequency is supported
    #[error("Unsupported frequency '{0}': only 'B' (business daily) is supported")]
    UnsupportedFrequency(String),

    /// Event-window offsets do not describe a non-empty ordered window
    #[error("Invalid event-window offsets: start {evt_start} after end {evt_end}")]
    InvalidOffsets {
        /// Offset of the window start relative to the event date
        evt_start: i32,
        /// Offset of the window end relative to the event date
        evt_end: i32,
    },

    /// The gap must separate the two windows by at least one business day
    #[error("Invalid gap {0}: windows must be separated by at least one business day")]
    InvalidGap(u32),

    /// The estimation window must contain at least one date
    #[error("Estimation window length must be at least one business day")]
    EmptyEstimationWindow,

    /// The derived windows overlap
    #[error("Estimation window ending {estimation_end} overlaps event window starting {event_start}")]
    Overlapping {
        /// Last estimation-window date
        estimation_end: NaiveDate,
        /// First event-window date
        event_start: NaiveDate,
    },
}

/// Parameters defining the event and estimation windows.
///
/// Defaults mirror the conventional short-horizon setup: a five-day event
/// window (two business days either side of the event date), a one-year
/// (252 business day) estimation window, and a five-day gap between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Business days separating the estimation window from the event window.
    pub gap: u32,
    /// Estimation-window length in business days.
    pub est_period: usize,
    /// Sampling frequency; only "B" (business daily) is supported.
    pub frequency: String,
    /// Event-window start offset in business days (normally negative).
    pub evt_start: i32,
    /// Event-window end offset in business days.
    pub evt_end: i32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            gap: 5,
            est_period: 252,
            frequency: "B".to_string(),
            evt_start: -2,
            evt_end: 2,
        }
    }
}

/// The two business-day sequences of an event study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWindows {
    /// Ordered business dates around the event.
    pub event_window: Vec<NaiveDate>,
    /// Ordered business dates the models are estimated over.
    pub estimation_window: Vec<NaiveDate>,
}

impl EventWindows {
    /// Derive the event and estimation windows from an event date.
    ///
    /// The event window runs from `event_date − |evt_start|` business days
    /// to `event_date + evt_end` business days, inclusive. The estimation
    /// window is the `est_period`-count business-day range ending at
    /// `event_date − |evt_start − gap|` business days.
    pub fn build(event_date: NaiveDate, config: &WindowConfig) -> Result<Self, WindowError> {
        if config.frequency != "B" {
            return Err(WindowError::UnsupportedFrequency(config.frequency.clone()));
        }
        if config.evt_start > config.evt_end {
            return Err(WindowError::InvalidOffsets {
                evt_start: config.evt_start,
                evt_end: config.evt_end,
            });
        }
        if config.gap == 0 {
            return Err(WindowError::InvalidGap(config.gap));
        }
        if config.est_period == 0 {
            return Err(WindowError::EmptyEstimationWindow);
        }

        let event_start = sub_business_days(event_date, config.evt_start.unsigned_abs());
        let event_end = offset_business_days(event_date, i64::from(config.evt_end));
        let event_window = business_day_range(event_start, event_end);

        if event_window.is_empty() {
            return Err(WindowError::InvalidOffsets {
                evt_start: config.evt_start,
                evt_end: config.evt_end,
            });
        }

        let anchor_offset =
            (i64::from(config.evt_start) - i64::from(config.gap)).unsigned_abs() as u32;
        let estimation_end = sub_business_days(event_date, anchor_offset);
        let estimation_window = business_day_range_ending(estimation_end, config.est_period);

        let last_estimation = estimation_window[estimation_window.len() - 1];
        if last_estimation >= event_window[0] {
            return Err(WindowError::Overlapping {
                estimation_end: last_estimation,
                event_start: event_window[0],
            });
        }

        Ok(Self {
            event_window,
            estimation_window,
        })
    }
}

/// Whether a date falls on Monday through Friday.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Move `count` business days forward; a zero count rolls a weekend date
/// forward to the next business day.
pub fn add_business_days(date: NaiveDate, count: u32) -> NaiveDate {
    let mut current = date;
    if count == 0 {
        while !is_business_day(current) {
            current += Duration::days(1);
        }
        return current;
    }
    let mut remaining = count;
    while remaining > 0 {
        current += Duration::days(1);
        if is_business_day(current) {
            remaining -= 1;
        }
    }
    current
}

/// Move `count` business days backward; a zero count rolls a weekend date
/// forward to the next business day, matching `date - BDay(0)` arithmetic.
pub fn sub_business_days(date: NaiveDate, count: u32) -> NaiveDate {
    if count == 0 {
        return add_business_days(date, 0);
    }
    let mut current = date;
    let mut remaining = count;
    while remaining > 0 {
        current -= Duration::days(1);
        if is_business_day(current) {
            remaining -= 1;
        }
    }
    current
}

/// Signed business-day offset.
pub fn offset_business_days(date: NaiveDate, count: i64) -> NaiveDate {
    if count >= 0 {
        add_business_days(date, count.unsigned_abs() as u32)
    } else {
        sub_business_days(date, count.unsigned_abs() as u32)
    }
}

/// All business days in `[start, end]`, ascending.
pub fn business_day_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        if is_business_day(current) {
            dates.push(current);
        }
        current += Duration::days(1);
    }
    dates
}

/// The `periods`-count business-day range ending at `end` (rolled back to
/// a business day if it falls on a weekend), ascending.
pub fn business_day_range_ending(end: NaiveDate, periods: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(periods);
    let mut current = end;
    while !is_business_day(current) {
        current -= Duration::days(1);
    }
    for _ in 0..periods {
        dates.push(current);
        current = sub_business_days(current, 1);
    }
    dates.reverse();
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_add_skips_weekend() {
        // Friday + 1 business day = Monday
        assert_eq!(add_business_days(date("2020-01-03"), 1), date("2020-01-06"));
        // Saturday + 1 business day = Monday
        assert_eq!(add_business_days(date("2020-01-04"), 1), date("2020-01-06"));
    }

    #[test]
    fn test_sub_skips_weekend() {
        // Monday - 1 business day = Friday
        assert_eq!(sub_business_days(date("2020-01-06"), 1), date("2020-01-03"));
        // Sunday - 1 business day = Friday
        assert_eq!(sub_business_days(date("2020-01-05"), 1), date("2020-01-03"));
    }

    #[test]
    fn test_zero_offset_rolls_weekend_forward() {
        // Zero-count offsets roll weekends forward in both directions.
        assert_eq!(add_business_days(date("2020-01-04"), 0), date("2020-01-06"));
        assert_eq!(sub_business_days(date("2020-01-04"), 0), date("2020-01-06"));
        assert_eq!(add_business_days(date("2020-01-06"), 0), date("2020-01-06"));
        assert_eq!(sub_business_days(date("2020-01-06"), 0), date("2020-01-06"));
    }

    #[test]
    fn test_range_excludes_weekends() {
        let range = business_day_range(date("2020-01-02"), date("2020-01-08"));
        assert_eq!(
            range,
            vec![
                date("2020-01-02"),
                date("2020-01-03"),
                date("2020-01-06"),
                date("2020-01-07"),
                date("2020-01-08"),
            ]
        );
    }

    #[test]
    fn test_range_ending_has_exact_count() {
        let range = business_day_range_ending(date("2020-01-08"), 5);
        assert_eq!(range.len(), 5);
        assert_eq!(range[0], date("2020-01-02"));
        assert_eq!(range[4], date("2020-01-08"));
    }

    #[test]
    fn test_range_ending_rolls_weekend_anchor() {
        let range = business_day_range_ending(date("2020-01-05"), 2);
        assert_eq!(range, vec![date("2020-01-02"), date("2020-01-03")]);
    }

    #[test]
    fn test_default_windows_shape() {
        // Wednesday event date
        let windows = EventWindows::build(date("2020-03-18"), &WindowConfig::default()).unwrap();

        assert_eq!(windows.event_window.len(), 5);
        assert_eq!(windows.event_window[0], date("2020-03-16"));
        assert_eq!(windows.event_window[4], date("2020-03-20"));
        assert_eq!(windows.estimation_window.len(), 252);
        // Ends |evt_start - gap| = 7 business days before the event date.
        assert_eq!(
            windows.estimation_window[251],
            sub_business_days(date("2020-03-18"), 7)
        );
    }

    #[test]
    fn test_weekend_event_date_with_zero_start_opens_monday() {
        // Saturday event date with evt_start = 0: the event window opens
        // on the following Monday, not the preceding Friday.
        let config = WindowConfig {
            gap: 2,
            est_period: 5,
            evt_start: 0,
            evt_end: 2,
            ..WindowConfig::default()
        };
        let windows = EventWindows::build(date("2020-03-14"), &config).unwrap();

        assert_eq!(
            windows.event_window,
            vec![date("2020-03-16"), date("2020-03-17")]
        );
        assert_eq!(windows.estimation_window.len(), 5);
        assert_eq!(windows.estimation_window[4], date("2020-03-12"));
    }

    #[rstest]
    #[case(1, 10, -2, 2)]
    #[case(5, 252, -2, 2)]
    #[case(3, 60, -5, 0)]
    #[case(10, 120, 0, 3)]
    fn test_windows_disjoint_and_sized(
        #[case] gap: u32,
        #[case] est_period: usize,
        #[case] evt_start: i32,
        #[case] evt_end: i32,
    ) {
        let config = WindowConfig {
            gap,
            est_period,
            evt_start,
            evt_end,
            ..WindowConfig::default()
        };
        let windows = EventWindows::build(date("2021-06-16"), &config).unwrap();

        assert_eq!(windows.estimation_window.len(), est_period);
        assert!(!windows.event_window.is_empty());
        assert!(
            windows.estimation_window[windows.estimation_window.len() - 1]
                < windows.event_window[0]
        );
        assert!(windows.event_window.windows(2).all(|w| w[0] < w[1]));
        assert!(windows.estimation_window.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_non_business_frequency_rejected() {
        let config = WindowConfig {
            frequency: "D".to_string(),
            ..WindowConfig::default()
        };
        let err = EventWindows::build(date("2020-03-18"), &config).unwrap_err();
        assert_eq!(err, WindowError::UnsupportedFrequency("D".to_string()));
    }

    #[test]
    fn test_non_monotonic_offsets_rejected() {
        let config = WindowConfig {
            evt_start: 3,
            evt_end: -1,
            ..WindowConfig::default()
        };
        let err = EventWindows::build(date("2020-03-18"), &config).unwrap_err();
        assert!(matches!(err, WindowError::InvalidOffsets { .. }));
    }

    #[test]
    fn test_zero_gap_rejected() {
        let config = WindowConfig {
            gap: 0,
            ..WindowConfig::default()
        };
        let err = EventWindows::build(date("2020-03-18"), &config).unwrap_err();
        assert_eq!(err, WindowError::InvalidGap(0));
    }

    #[test]
    fn test_zero_estimation_period_rejected() {
        let config = WindowConfig {
            est_period: 0,
            ..WindowConfig::default()
        };
        let err = EventWindows::build(date("2020-03-18"), &config).unwrap_err();
        assert_eq!(err, WindowError::EmptyEstimationWindow);
    }

    #[test]
    fn test_weekend_event_date() {
        // Saturday event date: window endpoints roll to business days.
        let windows = EventWindows::build(date("2020-03-21"), &WindowConfig::default()).unwrap();
        assert!(windows.event_window.iter().all(|&d| is_business_day(d)));
        assert!(
            windows.estimation_window[windows.estimation_window.len() - 1]
                < windows.event_window[0]
        );
    }
}
