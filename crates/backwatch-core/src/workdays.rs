//! Business-day time arithmetic
//!
//! The difference between two instants where Saturdays and Sundays
//! contribute zero elapsed time. Every outdated/future/reminder decision
//! in the engine is built on `time_between`.

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Weekday};

/// Whether the instant falls on a Saturday or Sunday.
pub fn is_weekend(t: NaiveDateTime) -> bool {
    matches!(t.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Round an instant forward to the next Monday at 00:00.
///
/// Always advances at least one day, so a Monday input lands on the
/// following Monday. The loop is bounded: at most seven steps.
pub fn next_monday(t: NaiveDateTime) -> NaiveDateTime {
    let mut date = t.date() + Duration::days(1);
    while date.weekday() != Weekday::Mon {
        date += Duration::days(1);
    }
    date.and_time(NaiveTime::MIN)
}

/// Signed time difference between `a` and `b`.
///
/// Positive when `a <= b`; antisymmetric for all inputs. With
/// `exclude_weekends` set, an endpoint inside a weekend is treated as the
/// following Monday at midnight, and whole weekend days between the
/// endpoints contribute nothing. Sub-day remainders are preserved, so the
/// result is not rounded to whole days.
pub fn time_between(a: NaiveDateTime, b: NaiveDateTime, exclude_weekends: bool) -> Duration {
    if !exclude_weekends {
        return b - a;
    }
    if a > b {
        return -time_between(b, a, true);
    }

    let start = if is_weekend(a) { next_monday(a) } else { a };
    let end = if is_weekend(b) { next_monday(b) } else { b };

    // Walk whole days from the adjusted start, counting only weekdays,
    // then add whatever partial day is left before the adjusted end.
    let mut cursor = start;
    let mut weekdays = 0i64;
    while cursor + Duration::days(1) <= end {
        if !is_weekend(cursor) {
            weekdays += 1;
        }
        cursor += Duration::days(1);
    }
    Duration::days(weekdays) + (end - cursor)
}
