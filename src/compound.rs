//! Parsing for cells that pack several metrics into one string, e.g. `"24-88-1"`
//! (attempts-yards-touchdowns) or `"32:14"` (minutes:seconds).
//!
//! Blank or malformed sub-fields become zero. Box scores leave low-relevance
//! cells empty and an empty cell means zero, so this is not reported as an error
//! and a defaulted zero is indistinguishable from a published one.

use std::str::FromStr;

/// Value substituted for any sub-field that fails numeric coercion. Generic
/// parsers use `T::default()`, which is this same zero for every numeric type.
pub const COMPOUND_DEFAULT: i32 = 0;

/// Splits `cell` on `delimiter` into exactly `part_count` numbers.
///
/// Missing or unparsable parts become `T::default()` and surplus parts are
/// ignored. When the delimiter is `-`, a `-` that opens a part and is followed
/// by a digit is read as a minus sign, so `"12--3-0"` yields `[12, -3, 0]`.
pub fn split_compound<T>(cell: &str, delimiter: char, part_count: usize) -> Vec<T>
where
    T: FromStr + Default,
{
    let mut tokens = tokenize(cell, delimiter).into_iter();
    (0..part_count)
        .map(|_| tokens.next().map(|t| parse_or_default(&t)).unwrap_or_default())
        .collect()
}

/// Strict variant: `None` unless the cell has exactly `part_count` parts and all parse.
pub fn try_split_compound<T>(cell: &str, delimiter: char, part_count: usize) -> Option<Vec<T>>
where
    T: FromStr,
{
    let tokens = tokenize(cell, delimiter);
    if tokens.len() != part_count {
        return None;
    }
    tokens.iter().map(|t| t.parse::<T>().ok()).collect()
}

pub fn parse_or_default<T>(cell: &str) -> T
where
    T: FromStr + Default,
{
    cell.trim().parse::<T>().unwrap_or_default()
}

/// Leading numeric prefix of `text`, e.g. `"51.0 (under)"` -> `51.0`.
pub fn leading_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let mut end = 0;
    for (idx, ch) in trimmed.char_indices() {
        let sign = idx == 0 && (ch == '-' || ch == '+');
        if ch.is_ascii_digit() || ch == '.' || sign {
            end = idx + ch.len_utf8();
        } else {
            break;
        }
    }
    trimmed[..end].parse::<f64>().ok()
}

/// `"32:14"` -> `1934`.
pub fn mmss_to_seconds(cell: &str) -> i32 {
    let parts = split_compound::<i32>(cell, ':', 2);
    parts[0]
        .checked_mul(60)
        .and_then(|secs| secs.checked_add(parts[1]))
        .unwrap_or(COMPOUND_DEFAULT)
}

/// `"3:07"` -> `187`.
pub fn hmm_to_minutes(cell: &str) -> u32 {
    let parts = split_compound::<u32>(cell, ':', 2);
    parts[0]
        .checked_mul(60)
        .and_then(|mins| mins.checked_add(parts[1]))
        .unwrap_or_default()
}

/// `"6-3"` -> `75`. Anything that is not exactly feet and inches -> `0`.
pub fn parse_height_inches(cell: &str) -> u32 {
    let normalized = cell.trim().replace(' ', "-");
    try_split_compound::<u32>(&normalized, '-', 2)
        .and_then(|parts| parts[0].checked_mul(12)?.checked_add(parts[1]))
        .unwrap_or_default()
}

/// Float measurement with the zero default, e.g. `"4.52"` or `""`.
pub fn parse_measurement(cell: &str) -> f64 {
    parse_or_default::<f64>(cell)
}

/// `"65,878"` -> `65878`.
pub fn parse_thousands(cell: &str) -> Option<u32> {
    let digits = cell.trim().replace(',', "");
    digits.parse::<u32>().ok()
}

fn tokenize(cell: &str, delimiter: char) -> Vec<String> {
    let trimmed = cell.trim();
    let mut tokens = Vec::new();
    if trimmed.is_empty() {
        return tokens;
    }

    let mut current = String::new();
    let mut chars = trimmed.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == delimiter {
            let is_sign = delimiter == '-'
                && current.trim().is_empty()
                && chars.peek().is_some_and(|next| next.is_ascii_digit());
            if is_sign {
                current.push(ch);
                continue;
            }
            tokens.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
    }
    tokens.push(current.trim().to_string());
    tokens
}
