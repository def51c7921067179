use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime};
use derive_more::{AsRef, Display};
use serde::{Serialize, Serializer};
use thiserror::Error;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIMESTAMP_LEN: usize = 19;
const BUCKET_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("field is empty")]
pub struct EmptyField;

macro_rules! text_field {
    ($name:ident) => {
        #[derive(Debug, Display, AsRef, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl FromStr for $name {
            type Err = EmptyField;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.is_empty() {
                    return Err(EmptyField);
                }
                Ok(Self(s.into()))
            }
        }
    };
}

text_field!(ClientAddr);
text_field!(Endpoint);
text_field!(UserAgent);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("expected 19 characters, got {0}")]
    Width(usize),
    #[error(transparent)]
    Parse(#[from] chrono::ParseError),
}

/// Second-resolution access time, always written as `YYYY-MM-DD HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Floors the timestamp to a bucket `minutes` wide, counted from the epoch.
    /// With `minutes == 1` this is the 16-character `YYYY-MM-DD HH:MM` prefix.
    pub fn bucket(self, minutes: u32) -> TimeBucket {
        let width = i64::from(minutes.max(1)) * 60;
        let secs = self.0.and_utc().timestamp();
        let floor = secs - secs.rem_euclid(width);
        let start = DateTime::from_timestamp(floor, 0)
            .map(|t| t.naive_utc())
            .unwrap_or(self.0);
        TimeBucket(start)
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // chrono accepts unpadded fields, the lexical ordering needs fixed width
        if s.len() != TIMESTAMP_LEN {
            return Err(TimestampError::Width(s.len()));
        }
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .map(Self)
            .map_err(TimestampError::from)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeBucket(NaiveDateTime);

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(BUCKET_FORMAT))
    }
}

impl Serialize for TimeBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
