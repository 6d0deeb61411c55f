//! Strongly-typed configuration values.
//!
//! Each type parses from the string form accepted on the command line and in
//! the YAML config file. Parse errors are plain `String`s; [`crate::config`]
//! wraps them into [`crate::ConfigError`] with the offending value attached.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FileMode
// ---------------------------------------------------------------------------

/// Unix permission bits applied to the target file on overwrite.
///
/// Parsed as octal, chmod-style: `644`, `0644` and `0o644` are the same mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileMode(u32);

impl FileMode {
    /// Largest accepted mode (setuid, setgid, sticky + rwx for all).
    pub const MAX: u32 = 0o7777;

    pub fn new(bits: u32) -> Result<Self, String> {
        if bits > Self::MAX {
            return Err(format!("mode {bits:o} exceeds {:o}", Self::MAX));
        }
        Ok(Self(bits))
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl Default for FileMode {
    /// `rw-r--r--`
    fn default() -> Self {
        Self(0o644)
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

impl FromStr for FileMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0o")
            .or_else(|| trimmed.strip_prefix("0O"))
            .unwrap_or(trimmed);
        if digits.is_empty() {
            return Err("empty mode".to_string());
        }
        if let Some(bad) = digits.chars().find(|c| !('0'..='7').contains(c)) {
            return Err(format!("'{bad}' is not an octal digit"));
        }
        let bits = u32::from_str_radix(digits, 8).map_err(|e| e.to_string())?;
        Self::new(bits)
    }
}

// ---------------------------------------------------------------------------
// PollInterval
// ---------------------------------------------------------------------------

/// Time between poll cycles. Zero means "run once, then exit".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PollInterval(Duration);

impl PollInterval {
    pub const ONCE: PollInterval = PollInterval(Duration::ZERO);

    pub fn new(period: Duration) -> Self {
        Self(period)
    }

    pub fn is_once(self) -> bool {
        self.0.is_zero()
    }

    pub fn period(self) -> Duration {
        self.0
    }
}

impl FromStr for PollInterval {
    type Err = String;

    /// Negative durations collapse to [`PollInterval::ONCE`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, period) = parse_signed_duration(s)?;
        if negative {
            return Ok(Self::ONCE);
        }
        Ok(Self(period))
    }
}

impl fmt::Display for PollInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_once() {
            return f.write_str("once");
        }
        write!(f, "{:?}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Duration parsing
// ---------------------------------------------------------------------------

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Parse a non-negative duration such as `90s`, `1h30m` or `250ms`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    match parse_signed_duration(s)? {
        (true, d) if !d.is_zero() => Err("duration must not be negative".to_string()),
        (_, d) => Ok(d),
    }
}

/// Parse a duration in `<number><unit>` sequence form.
///
/// Accepts an optional sign, decimal numbers with an optional fraction and
/// the units `ns`, `us` (`µs`), `ms`, `s`, `m`, `h`. A bare `0` is the only
/// unit-less value. Returns the sign separately from the magnitude.
fn parse_signed_duration(input: &str) -> Result<(bool, Duration), String> {
    let s = input.trim();
    let (negative, mut rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    if rest == "0" {
        return Ok((negative, Duration::ZERO));
    }
    if rest.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let int_part = &rest[..int_end];
        rest = &rest[int_end..];

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_end = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            frac_part = &after_dot[..frac_end];
            rest = &after_dot[frac_end..];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(format!("invalid duration '{input}'"));
        }

        let unit_end = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 60 * 60 * NANOS_PER_SEC,
            "" => return Err(format!("missing unit in duration '{input}'")),
            other => return Err(format!("unknown unit '{other}' in duration '{input}'")),
        };

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| format!("invalid duration '{input}'"))?
        };
        let mut nanos = whole
            .checked_mul(scale)
            .ok_or_else(|| format!("duration '{input}' overflows"))?;

        if !frac_part.is_empty() {
            // Digits past nanosecond precision cannot change the result.
            let digits = &frac_part[..frac_part.len().min(18)];
            let frac: u128 = digits
                .parse()
                .map_err(|_| format!("invalid duration '{input}'"))?;
            nanos += frac * scale / 10u128.pow(digits.len() as u32);
        }

        total = total
            .checked_add(nanos)
            .ok_or_else(|| format!("duration '{input}' overflows"))?;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC)
        .map_err(|_| format!("duration '{input}' overflows"))?;
    let sub = (total % NANOS_PER_SEC) as u32;
    Ok((negative, Duration::new(secs, sub)))
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// What to do when the local target does not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingTargetPolicy {
    /// Treat the missing file as a read error.
    #[default]
    Fail,
    /// Treat it as differing content and create it.
    Create,
}

impl fmt::Display for MissingTargetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingTargetPolicy::Fail => write!(f, "fail"),
            MissingTargetPolicy::Create => write!(f, "create"),
        }
    }
}

/// How the target is replaced once a change is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplaceMode {
    /// Truncate and rewrite the target in place.
    #[default]
    Overwrite,
    /// Write a sibling `.pollkeys.tmp` file, then rename it over the target.
    Atomic,
}
