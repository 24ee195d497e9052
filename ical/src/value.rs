// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Value helpers: TEXT escaping and the RECUR value type.

use std::fmt;
use std::str::FromStr;

use crate::keyword::{
    KW_RRULE_BYDAY, KW_RRULE_COUNT, KW_RRULE_FREQ, KW_RRULE_INTERVAL, KW_RRULE_UNTIL,
};

/// Escapes a TEXT value (RFC 5545 Section 3.3.11).
#[must_use]
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out
}

/// Reverses [`escape_text`]. Unknown escapes keep the escaped character.
#[must_use]
pub fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Recurrence frequency (`FREQ`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::EnumString, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[allow(missing_docs)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Errors raised while parsing a RECUR value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecurrenceRuleError {
    /// `FREQ` is missing.
    #[error("recurrence rule has no FREQ part")]
    MissingFrequency,

    /// A part is not `NAME=VALUE` or has an invalid value.
    #[error("invalid recurrence rule part '{0}'")]
    InvalidPart(String),
}

/// A recurrence rule (RFC 5545 Section 3.3.10).
///
/// `FREQ`, `INTERVAL`, `COUNT`, `UNTIL` and `BYDAY` are typed; every other part
/// is preserved verbatim in [`RecurrenceRule::other`] so that rewriting a rule
/// does not lose `BYMONTHDAY`, `WKST` and friends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    /// Frequency.
    pub freq: Frequency,
    /// Interval, `None` when absent (equivalent to 1).
    pub interval: Option<u32>,
    /// Number of occurrences.
    pub count: Option<u32>,
    /// Raw `UNTIL` value.
    pub until: Option<String>,
    /// `BYDAY` entries such as `MO` or `-1FR`.
    pub by_day: Vec<String>,
    /// Remaining parts in their original order.
    pub other: Vec<(String, String)>,
}

impl RecurrenceRule {
    /// Creates a rule with the given frequency and no other parts.
    #[must_use]
    pub const fn new(freq: Frequency) -> Self {
        Self {
            freq,
            interval: None,
            count: None,
            until: None,
            by_day: Vec::new(),
            other: Vec::new(),
        }
    }
}

impl FromStr for RecurrenceRule {
    type Err = RecurrenceRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut freq = None;
        let mut rule = Self::new(Frequency::Daily);

        for part in s.split(';').filter(|p| !p.trim().is_empty()) {
            let (name, value) = part
                .split_once('=')
                .ok_or_else(|| RecurrenceRuleError::InvalidPart(part.to_string()))?;
            let invalid = || RecurrenceRuleError::InvalidPart(part.to_string());
            match name.trim().to_ascii_uppercase().as_str() {
                KW_RRULE_FREQ => freq = Some(Frequency::from_str(value).map_err(|_| invalid())?),
                KW_RRULE_INTERVAL => rule.interval = Some(value.parse().map_err(|_| invalid())?),
                KW_RRULE_COUNT => rule.count = Some(value.parse().map_err(|_| invalid())?),
                KW_RRULE_UNTIL => rule.until = Some(value.to_string()),
                KW_RRULE_BYDAY => {
                    rule.by_day = value
                        .split(',')
                        .filter(|d| !d.is_empty())
                        .map(str::to_ascii_uppercase)
                        .collect();
                }
                other => rule.other.push((other.to_string(), value.to_string())),
            }
        }

        rule.freq = freq.ok_or(RecurrenceRuleError::MissingFrequency)?;
        Ok(rule)
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{KW_RRULE_FREQ}={}", self.freq)?;
        if let Some(interval) = self.interval {
            write!(f, ";{KW_RRULE_INTERVAL}={interval}")?;
        }
        if let Some(count) = self.count {
            write!(f, ";{KW_RRULE_COUNT}={count}")?;
        }
        if let Some(until) = &self.until {
            write!(f, ";{KW_RRULE_UNTIL}={until}")?;
        }
        if !self.by_day.is_empty() {
            write!(f, ";{KW_RRULE_BYDAY}={}", self.by_day.join(","))?;
        }
        for (name, value) in &self.other {
            write!(f, ";{name}={value}")?;
        }
        Ok(())
    }
}
