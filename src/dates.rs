use chrono::{Datelike, NaiveDate};

/// Parses `D-M-Y` or `D/M/Y` into a calendar date.
///
/// Returns `None` unless there are exactly three all-digit parts that form a
/// real date, so `31-02-2020` is rejected instead of rolling into March.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = text.trim().split(['-', '/']).collect();
    let [day, month, year] = parts[..] else {
        return None;
    };

    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !(all_digits(day) && all_digits(month) && all_digits(year)) {
        return None;
    }

    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Canonical `DD-MM-YYYY` rendering, which is also the persisted form.
pub fn format_date(date: NaiveDate) -> String {
    format!("{:02}-{:02}-{:04}", date.day(), date.month(), date.year())
}

/// The date's month and day in `year`. A 29 February birthday is observed on
/// 28 February in years without one.
pub fn occurrence_in(date: NaiveDate, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
        .unwrap_or(date)
}

/// Days from `today` to the next occurrence of `date`. Zero when the
/// occurrence is today.
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    let mut next = occurrence_in(date, today.year());
    if next < today {
        next = occurrence_in(date, today.year() + 1);
    }
    (next - today).num_days()
}

pub fn is_birthday_today(date: NaiveDate, today: NaiveDate) -> bool {
    occurrence_in(date, today.year()) == today
}
