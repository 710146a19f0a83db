//! Extension-based media classification and filename timestamp parsing.
//!
//! Every rule in a [`FilenameRules`] set is tried against the filename and a
//! later match overwrites an earlier one, so the last matching rule wins.
//! Callers that expect first-match semantics will be surprised; the ordering
//! is observable and kept as is.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

pub const PICTURE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "flv", "wmv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Picture,
    Video,
    Unknown,
}

impl MediaType {
    /// Classify by extension alone; content is never sniffed.
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        if PICTURE_EXTENSIONS.contains(&ext.as_str()) {
            MediaType::Picture
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaType::Video
        } else {
            MediaType::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Picture => "picture",
            MediaType::Video => "video",
            MediaType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "picture" => Ok(MediaType::Picture),
            "video" => Ok(MediaType::Video),
            "unknown" => Ok(MediaType::Unknown),
            other => Err(format!("unknown media type '{}'", other)),
        }
    }
}

/// A named pattern with `year`, `month`, `day` and optional `hour`,
/// `minute`, `second` capture groups.
#[derive(Debug, Clone)]
pub struct FilenameRule {
    name: &'static str,
    pattern: Regex,
}

impl FilenameRule {
    /// Anchors the pattern at the start of the filename if it is not already.
    pub fn new(name: &'static str, pattern: &str) -> std::result::Result<Self, regex::Error> {
        let anchored = if pattern.starts_with('^') {
            pattern.to_string()
        } else {
            format!("^{}", pattern)
        };
        Ok(Self {
            name,
            pattern: Regex::new(&anchored)?,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn apply(&self, filename: &str) -> Option<Result<NaiveDateTime>> {
        let caps = self.pattern.captures(filename)?;
        Some(build_timestamp(filename, &caps))
    }
}

fn group(filename: &str, caps: &Captures<'_>, name: &str, default: Option<u32>) -> Result<u32> {
    match caps.name(name) {
        Some(m) => m.as_str().parse::<u32>().map_err(|e| IndexError::Validation {
            filename: filename.to_string(),
            reason: format!("{} '{}': {}", name, m.as_str(), e),
        }),
        None => default.ok_or_else(|| IndexError::Validation {
            filename: filename.to_string(),
            reason: format!("pattern has no '{}' group", name),
        }),
    }
}

fn build_timestamp(filename: &str, caps: &Captures<'_>) -> Result<NaiveDateTime> {
    let year = group(filename, caps, "year", None)?;
    let month = group(filename, caps, "month", None)?;
    let day = group(filename, caps, "day", None)?;
    let hour = group(filename, caps, "hour", Some(0))?;
    let minute = group(filename, caps, "minute", Some(0))?;
    let second = group(filename, caps, "second", Some(0))?;

    NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .ok_or_else(|| IndexError::Validation {
            filename: filename.to_string(),
            reason: format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02} is not a valid date/time",
                year, month, day, hour, minute, second
            ),
        })
}

/// Ordered filename timestamp rules.
#[derive(Debug, Clone)]
pub struct FilenameRules {
    rules: Vec<FilenameRule>,
}

const DOTTED_TIME: &str = r"(?P<year>[0-9]{4})-(?P<month>[0-9]{2})-(?P<day>[0-9]{2}) (?P<hour>[0-9]{2})\.(?P<minute>[0-9]{2})\.(?P<second>[0-9]{2})";
const COMPACT: &str = r"(?P<year>[0-9]{4})(?P<month>[0-9]{2})(?P<day>[0-9]{2})_(?P<hour>[0-9]{2})(?P<minute>[0-9]{2})(?P<second>[0-9]{2})";
const DEVICE_PREFIXED: &str = r"(?:IMG|video|MVIMG|VID)_(?P<year>[0-9]{4})(?P<month>[0-9]{2})(?P<day>[0-9]{2})_(?P<hour>[0-9]{2})(?P<minute>[0-9]{2})(?P<second>[0-9]{2})(?:_[0-9])*";

impl FilenameRules {
    pub fn new(rules: Vec<FilenameRule>) -> Self {
        Self { rules }
    }

    /// `YYYY-MM-DD HH.MM.SS`, then `YYYYMMDD_HHMMSS`, then the
    /// `IMG_`/`video_`/`MVIMG_`/`VID_` prefixed form.
    pub fn standard() -> &'static FilenameRules {
        static STANDARD: OnceLock<FilenameRules> = OnceLock::new();
        STANDARD.get_or_init(|| {
            let rules = [
                ("dotted_time", DOTTED_TIME),
                ("compact", COMPACT),
                ("device_prefixed", DEVICE_PREFIXED),
            ]
            .into_iter()
            .map(|(name, pattern)| {
                FilenameRule::new(name, pattern).expect("built-in filename pattern is valid")
            })
            .collect();
            FilenameRules::new(rules)
        })
    }

    pub fn rules(&self) -> &[FilenameRule] {
        &self.rules
    }

    /// Timestamp from the last matching rule, `None` if nothing matched.
    /// A match that is not a valid calendar date/time fails the whole parse.
    pub fn parse(&self, filename: &str) -> Result<Option<NaiveDateTime>> {
        let mut found = None;
        for rule in &self.rules {
            if let Some(parsed) = rule.apply(filename) {
                found = Some(parsed?);
            }
        }
        Ok(found)
    }
}

impl Default for FilenameRules {
    fn default() -> Self {
        FilenameRules::standard().clone()
    }
}
