//! Helper functions and utilities
//!
//! Small pure helpers shared by the dialogue engine and the scheduled jobs.

use chrono::{Datelike, NaiveDate};

use crate::models::User;

/// Date format users type their birthdate in (day.month.year).
pub const BIRTHDATE_FORMAT: &str = "%d.%m.%Y";

/// Parse a birthdate entered as `DD.MM.YYYY`.
pub fn parse_birthdate(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), BIRTHDATE_FORMAT).ok()
}

/// The next calendar occurrence of a birthday on or after `today`.
///
/// Feb 29 birthdays fall on Mar 1 in non-leap years.
pub fn next_birthday(birthdate: NaiveDate, today: NaiveDate) -> NaiveDate {
    let this_year = occurrence_in_year(birthdate, today.year());
    if this_year >= today {
        this_year
    } else {
        occurrence_in_year(birthdate, today.year() + 1)
    }
}

/// Whole days from `today` until the next occurrence of the birthday.
///
/// Wraps across the year boundary instead of subtracting day-of-year
/// numbers, so a Dec 30 birthday is 2 days away on Dec 28 and a Jan 1
/// birthday is 2 days away on Dec 30.
pub fn days_until_birthday(birthdate: NaiveDate, today: NaiveDate) -> i64 {
    (next_birthday(birthdate, today) - today).num_days()
}

fn occurrence_in_year(birthdate: NaiveDate, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, birthdate.month(), birthdate.day())
        .unwrap_or_else(|| {
            // Only Feb 29 has no direct counterpart in a non-leap year.
            NaiveDate::from_ymd_opt(year, 3, 1).expect("Mar 1 exists in every year")
        })
}

/// Button/report label for a user: `@handle (First Last)`.
pub fn format_user_label(user: &User) -> String {
    let handle = user.username.trim();
    let name = [user.first_name.as_deref(), user.last_name.as_deref()]
        .iter()
        .flatten()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if name.is_empty() {
        format!("@{handle}")
    } else {
        format!("@{handle} ({name})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_birthdate() {
        assert_eq!(parse_birthdate("15.03.1990"), Some(date(1990, 3, 15)));
        assert_eq!(parse_birthdate(" 01.12.2000 "), Some(date(2000, 12, 1)));
        assert_eq!(parse_birthdate("1990-03-15"), None);
        assert_eq!(parse_birthdate("32.01.1990"), None);
        assert_eq!(parse_birthdate("soon"), None);
    }

    #[test]
    fn test_days_until_same_year() {
        let birthdate = date(1990, 3, 15);
        assert_eq!(days_until_birthday(birthdate, date(2026, 3, 12)), 3);
        assert_eq!(days_until_birthday(birthdate, date(2026, 3, 15)), 0);
    }

    #[test]
    fn test_days_until_wraps_year_boundary() {
        // Dec 30 birthday seen from Dec 28
        assert_eq!(days_until_birthday(date(1985, 12, 30), date(2026, 12, 28)), 2);
        // Jan 1 birthday seen from Dec 30
        assert_eq!(days_until_birthday(date(1985, 1, 1), date(2026, 12, 30)), 2);
        // Far side of the wrap: birthday already passed this year
        assert_eq!(days_until_birthday(date(1985, 1, 1), date(2026, 1, 2)), 364);
    }

    #[test]
    fn test_leap_day_birthday() {
        let birthdate = date(1992, 2, 29);
        // 2028 is a leap year
        assert_eq!(next_birthday(birthdate, date(2028, 2, 1)), date(2028, 2, 29));
        // 2026 is not: falls on Mar 1
        assert_eq!(next_birthday(birthdate, date(2026, 2, 1)), date(2026, 3, 1));
        assert_eq!(days_until_birthday(birthdate, date(2026, 2, 27)), 2);
    }

    #[test]
    fn test_format_user_label() {
        let mut user = User {
            id: 1,
            chat_id: 1,
            username: "alice".to_string(),
            first_name: Some("Alice".to_string()),
            last_name: Some("Liddell".to_string()),
            role: crate::models::ROLE_USER.to_string(),
            birthdate: None,
            wishlist: vec![],
            blocked: false,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        assert_eq!(format_user_label(&user), "@alice (Alice Liddell)");

        user.first_name = None;
        user.last_name = None;
        assert_eq!(format_user_label(&user), "@alice");
    }
}
