//! Calendar domain logic for the budget tracker.
//!
//! This module owns every date calculation the reconciliation engine needs:
//! month lengths, month names, the previous month and, most importantly, the
//! partition of a month into Monday-aligned weeks. Weeks are recomputed on
//! every call and never stored; breakdown rows only keep the week's
//! date-range label.

use chrono::{Datelike, NaiveDate};
use log::debug;
use shared::Week;

/// Calendar service that handles all calendar-related business logic
#[derive(Clone, Debug, Default)]
pub struct CalendarService;

impl CalendarService {
    /// Create a new CalendarService instance
    pub fn new() -> Self {
        Self
    }

    /// Partition a month into Monday-aligned weeks clipped to the month.
    ///
    /// The first week starts on the Monday on or before the 1st (so a Sunday
    /// 1st belongs to a week that began the previous Monday) and is clipped to
    /// day 1. The last week is clipped to the last day of the month. An
    /// invalid year/month yields no weeks.
    pub fn partition_month(&self, year: i32, month: u32) -> Vec<Week> {
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
            debug!("🗓️ CALENDAR: Cannot partition invalid month {}/{}", month, year);
            return Vec::new();
        };
        let days_in_month = self.days_in_month(month, year);

        // Offset of the 1st from the preceding Monday: 0 for Monday, 6 for Sunday
        let offset = first.weekday().num_days_from_monday();

        let mut weeks = Vec::new();
        let mut span_start: i64 = 1 - offset as i64;
        let mut index = 1;
        while span_start <= days_in_month as i64 {
            let span_end = span_start + 6;
            let start_day = span_start.max(1) as u32;
            let end_day = span_end.min(days_in_month as i64) as u32;
            weeks.push(Week { index, start_day, end_day });
            span_start += 7;
            index += 1;
        }

        debug!(
            "🗓️ CALENDAR: Partitioned {}/{} into {} weeks ({} days, first weekday offset {})",
            month,
            year,
            weeks.len(),
            days_in_month,
            offset
        );
        weeks
    }

    /// Get the number of days in a given month and year
    pub fn days_in_month(&self, month: u32, year: i32) -> u32 {
        match month {
            2 => if self.is_leap_year(year) { 29 } else { 28 },
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    /// Check if a year is a leap year
    pub fn is_leap_year(&self, year: i32) -> bool {
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }

    /// Get the human-readable name for a month number
    pub fn month_name(&self, month: u32) -> &'static str {
        match month {
            1 => "January", 2 => "February", 3 => "March", 4 => "April",
            5 => "May", 6 => "June", 7 => "July", 8 => "August",
            9 => "September", 10 => "October", 11 => "November", 12 => "December",
            _ => "Invalid Month",
        }
    }

    /// Navigate to the previous month, returning (month, year)
    pub fn previous_month(&self, current_month: u32, current_year: i32) -> (u32, i32) {
        if current_month == 1 {
            (12, current_year - 1)
        } else {
            (current_month - 1, current_year)
        }
    }
}
