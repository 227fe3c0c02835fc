//! The three parameter catalogues a lesson plan is generated from.
//!
//! Each value serialises as its display label ("Apply",
//! "AQF Level 7 - Bachelor Degree", "1.5 hours") so JSON produced here
//! reads the same as what a front-end shows in its dropdowns. Parsing is
//! lenient: labels are matched case-insensitively, and the CLI shorthands
//! (`7` for an AQF level, `90` or `1.5h` for a duration) are accepted too.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A value that is not in one of the catalogues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'; expected one of: {expected}")]
pub struct ParseOptionError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

// ── Bloom's taxonomy ─────────────────────────────────────────────────────

/// Cognitive level from Bloom's (revised) taxonomy, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BloomsLevel {
    Remember,
    Understand,
    Apply,
    Analyze,
    Evaluate,
    Create,
}

impl BloomsLevel {
    pub const ALL: [BloomsLevel; 6] = [
        BloomsLevel::Remember,
        BloomsLevel::Understand,
        BloomsLevel::Apply,
        BloomsLevel::Analyze,
        BloomsLevel::Evaluate,
        BloomsLevel::Create,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BloomsLevel::Remember => "Remember",
            BloomsLevel::Understand => "Understand",
            BloomsLevel::Apply => "Apply",
            BloomsLevel::Analyze => "Analyze",
            BloomsLevel::Evaluate => "Evaluate",
            BloomsLevel::Create => "Create",
        }
    }
}

impl FromStr for BloomsLevel {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        // British spelling shows up in Australian outlines.
        let wanted = if wanted.eq_ignore_ascii_case("analyse") {
            "Analyze"
        } else {
            wanted
        };
        Self::ALL
            .into_iter()
            .find(|level| level.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseOptionError {
                kind: "Bloom's taxonomy level",
                value: s.to_string(),
                expected: Self::ALL.map(|l| l.label()).join(", "),
            })
    }
}

// ── AQF level ────────────────────────────────────────────────────────────

/// Australian Qualifications Framework level, 1 (Certificate I) to 10 (Doctoral).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AqfLevel(u8);

const AQF_QUALIFICATIONS: [&str; 10] = [
    "Certificate I",
    "Certificate II",
    "Certificate III",
    "Certificate IV",
    "Diploma",
    "Advanced Diploma/Associate Degree",
    "Bachelor Degree",
    "Bachelor Honours/Graduate Certificate/Graduate Diploma",
    "Masters Degree",
    "Doctoral Degree",
];

impl AqfLevel {
    pub fn new(level: u8) -> Option<Self> {
        (1..=10).contains(&level).then_some(Self(level))
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn qualification(self) -> &'static str {
        AQF_QUALIFICATIONS[usize::from(self.0 - 1)]
    }

    /// "AQF Level 7 - Bachelor Degree"
    pub fn label(self) -> String {
        format!("AQF Level {} - {}", self.0, self.qualification())
    }

    pub fn all() -> impl Iterator<Item = AqfLevel> {
        (1..=10).map(AqfLevel)
    }
}

impl FromStr for AqfLevel {
    type Err = ParseOptionError;

    /// Accepts `7`, `AQF 7`, `aqf level 7` and the full label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let rest = lowered.strip_prefix("aqf").unwrap_or(&lowered).trim_start();
        let rest = rest.strip_prefix("level").unwrap_or(rest).trim_start();
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        let tail = rest[digits.len()..].trim_start();
        let tail_ok = tail.is_empty() || tail.starts_with('-');

        digits
            .parse::<u8>()
            .ok()
            .filter(|_| tail_ok)
            .and_then(AqfLevel::new)
            .ok_or_else(|| ParseOptionError {
                kind: "AQF level",
                value: s.to_string(),
                expected: "1-10 (e.g. \"7\" or \"AQF Level 7 - Bachelor Degree\")".to_string(),
            })
    }
}

// ── Lesson duration ──────────────────────────────────────────────────────

/// Length of the teaching session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LessonDuration {
    Minutes30,
    Minutes45,
    Hours1,
    Hours1_5,
    Hours2,
    Hours2_5,
    Hours3,
}

impl LessonDuration {
    pub const ALL: [LessonDuration; 7] = [
        LessonDuration::Minutes30,
        LessonDuration::Minutes45,
        LessonDuration::Hours1,
        LessonDuration::Hours1_5,
        LessonDuration::Hours2,
        LessonDuration::Hours2_5,
        LessonDuration::Hours3,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LessonDuration::Minutes30 => "30 minutes",
            LessonDuration::Minutes45 => "45 minutes",
            LessonDuration::Hours1 => "1 hour",
            LessonDuration::Hours1_5 => "1.5 hours",
            LessonDuration::Hours2 => "2 hours",
            LessonDuration::Hours2_5 => "2.5 hours",
            LessonDuration::Hours3 => "3 hours",
        }
    }

    pub fn minutes(self) -> u32 {
        match self {
            LessonDuration::Minutes30 => 30,
            LessonDuration::Minutes45 => 45,
            LessonDuration::Hours1 => 60,
            LessonDuration::Hours1_5 => 90,
            LessonDuration::Hours2 => 120,
            LessonDuration::Hours2_5 => 150,
            LessonDuration::Hours3 => 180,
        }
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.minutes() == minutes)
    }
}

impl FromStr for LessonDuration {
    type Err = ParseOptionError;

    /// Accepts the label, a minute count (`90`, `90m`, `90 min`) or hours (`1.5h`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();

        if let Some(d) = Self::ALL.into_iter().find(|d| d.label() == lowered) {
            return Ok(d);
        }

        let minutes = if let Some(hours) = lowered
            .strip_suffix('h')
            .or_else(|| lowered.strip_suffix("hours"))
            .or_else(|| lowered.strip_suffix("hour"))
        {
            hours
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|h| h.is_finite() && *h > 0.0)
                .map(|h| (h * 60.0).round() as u32)
        } else {
            lowered
                .trim_end_matches("minutes")
                .trim_end_matches("min")
                .trim_end_matches('m')
                .trim()
                .parse::<u32>()
                .ok()
        };

        minutes
            .and_then(Self::from_minutes)
            .ok_or_else(|| ParseOptionError {
                kind: "lesson duration",
                value: s.to_string(),
                expected: Self::ALL.map(|d| d.label()).join(", "),
            })
    }
}

// ── Shared impls ─────────────────────────────────────────────────────────

macro_rules! label_conversions {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.label())
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.label().to_string()
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ParseOptionError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    )*};
}

label_conversions!(BloomsLevel, AqfLevel, LessonDuration);

/// The catalogues as label lists, ready for a dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonOptions {
    pub blooms_taxonomy: Vec<String>,
    pub aqf_levels: Vec<String>,
    pub lesson_durations: Vec<String>,
}

impl LessonOptions {
    pub fn standard() -> Self {
        Self {
            blooms_taxonomy: BloomsLevel::ALL.iter().map(|l| l.to_string()).collect(),
            aqf_levels: AqfLevel::all().map(|l| l.label()).collect(),
            lesson_durations: LessonDuration::ALL.iter().map(|d| d.to_string()).collect(),
        }
    }
}
