//! Value parsers for numeric field functions.
//!
//! Every numeric field function is wired to one of these through a plain
//! `Fn(&str) -> Option<(i64, i64)>` — the parser core never names a concrete
//! parser, only the trait object it was handed, so callers can swap in a
//! stricter or looser implementation without touching `query-parser`'s
//! dispatch logic.

/// A value parser turns the raw word after a field name into a `(start,
/// end)` pair. Interval-valued units (a month name, say) return a pair
/// spanning the whole interval; scalar units return `(n, n)`.
pub type ValueParser = Box<dyn Fn(&str) -> Option<(i64, i64)> + Send + Sync>;

/// Strict base-10 integer parser: optional leading sign, no trailing
/// non-digit characters.
pub fn integer_parser() -> ValueParser {
    Box::new(|s: &str| {
        let trimmed = s.strip_prefix(['+', '-']).unwrap_or(s);
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse::<i64>().ok().map(|n| (n, n))
    })
}

/// `<number>[<unit>]` size parser, binary (1024-based) units (`b`, `k`/`kib`,
/// `m`/`mib`, `g`/`gib`, `t`/`tib`); a bare number is taken as bytes.
pub fn size_parser() -> ValueParser {
    Box::new(|s: &str| {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        let split_at = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (number, unit) = s.split_at(split_at);
        if number.is_empty() {
            return None;
        }
        let n: i64 = number.parse().ok()?;
        let multiplier: i64 = match unit.to_ascii_uppercase().as_str() {
            "" | "B" => 1,
            "K" | "KB" => 1024,
            "M" | "MB" => 1024 * 1024,
            "G" | "GB" => 1024 * 1024 * 1024,
            "T" | "TB" => 1024 * 1024 * 1024 * 1024,
            _ => return None,
        };
        let bytes = n.checked_mul(multiplier)?;
        Some((bytes, bytes))
    })
}

/// Seconds-since-epoch bounds for a calendar unit, plus a handful of
/// relative words, resolved against an explicit `now` (never the system
/// clock, per `SPEC_FULL.md`'s Non-goals: parsing stays pure).
///
/// Accepts `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, and `today`/`yesterday`/
/// `thisweek`/`thismonth`/`thisyear`.
pub fn date_interval_parser(now_epoch_secs: i64) -> ValueParser {
    Box::new(move |s: &str| parse_date_interval(s, now_epoch_secs))
}

const SECS_PER_DAY: i64 = 86_400;

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i64, month: i64) -> i64 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 30,
    }
}

/// Days since the epoch for a proleptic-Gregorian `(year, month, day)`,
/// 1-indexed month/day. Small, self-contained civil-to-days conversion
/// (Howard Hinnant's algorithm), avoiding a dependency on a full date/time
/// crate for what is otherwise pure integer arithmetic.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as i64;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn year_bounds(year: i64) -> (i64, i64) {
    let start = days_from_civil(year, 1, 1) * SECS_PER_DAY;
    let end = days_from_civil(year + 1, 1, 1) * SECS_PER_DAY - 1;
    (start, end)
}

fn month_bounds(year: i64, month: i64) -> (i64, i64) {
    let start = days_from_civil(year, month, 1) * SECS_PER_DAY;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let end = days_from_civil(next_year, next_month, 1) * SECS_PER_DAY - 1;
    (start, end)
}

fn day_bounds(year: i64, month: i64, day: i64) -> (i64, i64) {
    let start = days_from_civil(year, month, day) * SECS_PER_DAY;
    (start, start + SECS_PER_DAY - 1)
}

fn civil_from_epoch_day(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if month <= 2 { y + 1 } else { y };
    (year, month, day)
}

fn parse_date_interval(s: &str, now_epoch_secs: i64) -> Option<(i64, i64)> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    match s.to_ascii_lowercase().as_str() {
        "today" => {
            let day = now_epoch_secs.div_euclid(SECS_PER_DAY);
            let (y, m, d) = civil_from_epoch_day(day);
            return Some(day_bounds(y, m, d));
        }
        "yesterday" => {
            let day = now_epoch_secs.div_euclid(SECS_PER_DAY) - 1;
            let (y, m, d) = civil_from_epoch_day(day);
            return Some(day_bounds(y, m, d));
        }
        "thisweek" => {
            let day = now_epoch_secs.div_euclid(SECS_PER_DAY);
            // Epoch day 0 (1970-01-01) was a Thursday; ISO weeks start Monday.
            let weekday = (day + 3).rem_euclid(7);
            let start_day = day - weekday;
            let (sy, sm, sd) = civil_from_epoch_day(start_day);
            let (ey, em, ed) = civil_from_epoch_day(start_day + 6);
            return Some((day_bounds(sy, sm, sd).0, day_bounds(ey, em, ed).1));
        }
        "thismonth" => {
            let day = now_epoch_secs.div_euclid(SECS_PER_DAY);
            let (y, m, _) = civil_from_epoch_day(day);
            return Some(month_bounds(y, m));
        }
        "thisyear" => {
            let day = now_epoch_secs.div_euclid(SECS_PER_DAY);
            let (y, _, _) = civil_from_epoch_day(day);
            return Some(year_bounds(y));
        }
        _ => {}
    }

    let parts: Vec<&str> = s.split('-').collect();
    match parts.as_slice() {
        [y] => {
            let year = y.parse().ok()?;
            Some(year_bounds(year))
        }
        [y, m] => {
            let year = y.parse().ok()?;
            let month = m.parse().ok()?;
            if !(1..=12).contains(&month) {
                return None;
            }
            Some(month_bounds(year, month))
        }
        [y, m, d] => {
            let year = y.parse().ok()?;
            let month = m.parse().ok()?;
            let day = d.parse().ok()?;
            if !(1..=12).contains(&month) || day < 1 || day > days_in_month(year, month) {
                return None;
            }
            Some(day_bounds(year, month, day))
        }
        _ => None,
    }
}
