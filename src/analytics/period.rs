use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    /// First day after the window, for `col < $end` comparisons
    pub fn end_exclusive(&self) -> NaiveDate {
        self.to + Duration::days(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Today,
    Week,
    Month,
    Year,
    Custom(DateWindow),
}

impl Period {
    /// Parse `period` (default `month`); `custom` needs both bounds with `from <= to`
    pub fn parse(period: Option<&str>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, String> {
        match period.map(|p| p.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("month") => Ok(Period::Month),
            Some("today") | Some("day") => Ok(Period::Today),
            Some("week") => Ok(Period::Week),
            Some("year") => Ok(Period::Year),
            Some("custom") => match (from, to) {
                (Some(from), Some(to)) if from <= to => Ok(Period::Custom(DateWindow::new(from, to))),
                (Some(_), Some(_)) => Err("from must not be after to".to_string()),
                _ => Err("custom period requires from and to".to_string()),
            },
            Some(other) => Err(format!(
                "unknown period '{}'; expected today, week, month, year or custom",
                other
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
            Period::Custom(_) => "custom",
        }
    }

    /// Current window and the comparison window before it.
    ///
    /// Calendar periods run from their start up to `today`; the previous
    /// window covers the same elapsed span of the preceding period, clamped
    /// to that period's end. Custom ranges compare against the equally long
    /// range immediately before them.
    pub fn windows(&self, today: NaiveDate) -> (DateWindow, DateWindow) {
        match *self {
            Period::Today => {
                let yesterday = today - Duration::days(1);
                (DateWindow::new(today, today), DateWindow::new(yesterday, yesterday))
            }
            Period::Week => {
                let start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                let elapsed = today - start;
                let prev_start = start - Duration::days(7);
                (DateWindow::new(start, today), DateWindow::new(prev_start, prev_start + elapsed))
            }
            Period::Month => {
                let start = first_of_month(today.year(), today.month());
                let (py, pm) = if today.month() == 1 { (today.year() - 1, 12) } else { (today.year(), today.month() - 1) };
                let prev_start = first_of_month(py, pm);
                let prev_end = (prev_start + (today - start)).min(start - Duration::days(1));
                (DateWindow::new(start, today), DateWindow::new(prev_start, prev_end))
            }
            Period::Year => {
                let start = first_of_month(today.year(), 1);
                let prev_start = first_of_month(today.year() - 1, 1);
                let prev_end = (prev_start + (today - start)).min(start - Duration::days(1));
                (DateWindow::new(start, today), DateWindow::new(prev_start, prev_end))
            }
            Period::Custom(window) => {
                let prev_to = window.from - Duration::days(1);
                let prev_from = prev_to - Duration::days(window.days() - 1);
                (window, DateWindow::new(prev_from, prev_to))
            }
        }
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    // Day 1 exists for every month chrono accepts
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}
