//! Framework version values used as definition levels and resolution ceilings.
//!
//! A `Version` is an immutable list of numeric segments plus an optional
//! free-text suffix. Ordering goes through [`Version::compare`], which pads
//! missing trailing segments with zero; equality stays exact, so `1.2` and
//! `1.2.0` compare `Equal` without being `==`. Because `Ord` has to agree with
//! `Eq`, the type deliberately does not implement `Ord`/`PartialOrd`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

// Only the first three dot-separated groups are read as numbers; anything
// after them is kept verbatim as the suffix.
const MAX_PARSED_SEGMENTS: usize = 3;

// Serialized form of `Version::LATEST`; plain parsing never yields the sentinel.
const LATEST_TOKEN: &str = "latest";

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
/// Immutable framework version: numeric segments plus an optional suffix.
pub struct Version {
    segments: Vec<u32>,
    suffix: Option<String>,
}

impl Version {
    /// Sentinel that compares greater than any parsed value ("no ceiling").
    pub const LATEST: Version = Version {
        segments: Vec::new(),
        suffix: None,
    };

    /// Build a version from explicit segments and no suffix.
    ///
    /// An empty segment list is normalized to `[0]` so every non-sentinel
    /// version carries at least one segment.
    pub fn new(segments: impl Into<Vec<u32>>) -> Self {
        let mut segments = segments.into();
        if segments.is_empty() {
            segments.push(0);
        }
        Self {
            segments,
            suffix: None,
        }
    }

    /// Attach a suffix, kept verbatim (including any leading separator).
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.suffix = (!suffix.is_empty()).then_some(suffix);
        self
    }

    /// Parse `major[.minor[.patch]][suffix]`.
    ///
    /// Returns `None` for empty input, input that does not start with a
    /// digit, or a numeric group that overflows `u32`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let mut segments = Vec::new();
        let mut rest = text;

        while segments.len() < MAX_PARSED_SEGMENTS {
            let candidate = if segments.is_empty() {
                rest
            } else {
                match rest.strip_prefix('.') {
                    Some(after_dot) => after_dot,
                    None => break,
                }
            };
            let digits = candidate
                .char_indices()
                .find(|(_, c)| !c.is_ascii_digit())
                .map(|(idx, _)| idx)
                .unwrap_or(candidate.len());
            if digits == 0 {
                break;
            }
            segments.push(candidate[..digits].parse::<u32>().ok()?);
            rest = &candidate[digits..];
        }

        if segments.is_empty() {
            return None;
        }
        Some(Version::new(segments).with_suffix(rest))
    }

    /// Numeric segments; the `LATEST` sentinel reports `[u32::MAX]`.
    pub fn segments(&self) -> &[u32] {
        if self.is_latest() {
            &[u32::MAX]
        } else {
            &self.segments
        }
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// True only for the `LATEST` sentinel.
    pub fn is_latest(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total order over versions.
    ///
    /// Segments compare numerically with zero padding. When every segment
    /// ties, a version without suffix sorts *below* one with a suffix, and two
    /// suffixes compare as plain strings.
    pub fn compare(&self, other: &Version) -> Ordering {
        match (self.is_latest(), other.is_latest()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }

        let len = self.segments.len().max(other.segments.len());
        for idx in 0..len {
            let left = self.segments.get(idx).copied().unwrap_or(0);
            let right = other.segments.get(idx).copied().unwrap_or(0);
            match left.cmp(&right) {
                Ordering::Equal => continue,
                decided => return decided,
            }
        }

        match (&self.suffix, &other.suffix) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(left), Some(right)) => left.cmp(right),
        }
    }

    /// `self <= other` under [`Version::compare`].
    pub fn is_at_most(&self, other: &Version) -> bool {
        self.compare(other) != Ordering::Greater
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in self.segments() {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
            first = false;
        }
        if let Some(suffix) = &self.suffix {
            f.write_str(suffix)?;
        }
        Ok(())
    }
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.is_latest() {
            serializer.serialize_str(LATEST_TOKEN)
        } else {
            serializer.collect_str(self)
        }
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        if value == LATEST_TOKEN {
            return Ok(Version::LATEST);
        }
        Version::parse(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("unparsable version '{value}'")))
    }
}
