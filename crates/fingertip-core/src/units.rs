// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parsing for the two unit grammars the CLI and config accept: time
//! intervals (`7d`, `4h`, `30m`, `0`) and binary sizes (`25G`, `512M`).

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitError {
    #[error("empty interval")]
    Empty,
    #[error("invalid numeric value in {0:?}")]
    InvalidNumber(String),
    #[error("unknown suffix {0:?} in {1:?}")]
    UnknownSuffix(String, String),
}

/// Parse a time interval: a non-negative decimal number followed by an
/// optional single-letter suffix `s|m|h|d|w`. No suffix means seconds.
/// `"0"` is a valid interval meaning "always expired".
pub fn parse_interval(s: &str) -> Result<Duration, UnitError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(UnitError::Empty);
    }

    let split_at = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let (digits, suffix) = s.split_at(split_at);

    let value: u64 = digits
        .parse()
        .map_err(|_| UnitError::InvalidNumber(s.to_string()))?;

    let multiplier = match suffix {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "w" => 7 * 24 * 60 * 60,
        other => return Err(UnitError::UnknownSuffix(other.to_string(), s.to_string())),
    };

    Ok(Duration::from_secs(value * multiplier))
}

/// Parse a binary size: a non-negative decimal number followed by an
/// optional single-letter suffix `K|M|G|T|P`, each a power of 1024. No
/// suffix means bytes.
pub fn parse_size(s: &str) -> Result<u64, UnitError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(UnitError::Empty);
    }

    let split_at = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let (digits, suffix) = s.split_at(split_at);

    let value: u64 = digits
        .parse()
        .map_err(|_| UnitError::InvalidNumber(s.to_string()))?;

    let shift = match suffix {
        "" | "B" => 0,
        "K" => 10,
        "M" => 20,
        "G" => 30,
        "T" => 40,
        "P" => 50,
        other => return Err(UnitError::UnknownSuffix(other.to_string(), s.to_string())),
    };

    Ok(value << shift)
}

#[cfg(test)]
#[path = "units_tests.rs"]
mod tests;
