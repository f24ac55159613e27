//! Addresses into a study document and depth bounds.
//!
//! An address is a slash-delimited path selecting a sub-document:
//! - `""` selects the whole study
//! - `settings/generaldata/general/nbyears` selects one INI value
//! - `output/1/economy/mc-all/areas/de/id-daily` selects one result file
//!
//! Empty segments are dropped, so a leading or doubled slash is harmless.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered sequence of path segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address {
    segments: Vec<String>,
}

impl Address {
    /// The empty address: the whole subtree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a slash-delimited address.
    pub fn parse(s: &str) -> Self {
        Self {
            segments: s
                .split('/')
                .filter(|seg| !seg.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// New address with `name` appended.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    /// First segment and the remaining address, if any.
    pub fn split_first(&self) -> Option<(&str, &[String])> {
        self.segments
            .split_first()
            .map(|(head, rest)| (head.as_str(), rest))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Address::parse(s)
    }
}

/// How many structured levels below the addressed node are expanded.
///
/// Wire form is an integer: any negative value is unbounded, `0` renders
/// keys only, `n` expands `n` levels further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Depth {
    #[default]
    Unbounded,
    Levels(u32),
}

impl Depth {
    pub fn from_i64(value: i64) -> Self {
        if value < 0 {
            Depth::Unbounded
        } else {
            Depth::Levels(u32::try_from(value).unwrap_or(u32::MAX))
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            Depth::Unbounded => -1,
            Depth::Levels(n) => i64::from(n),
        }
    }

    /// True when structured children must be rendered empty.
    pub fn is_exhausted(self) -> bool {
        matches!(self, Depth::Levels(0))
    }

    /// Depth handed to the children of a composite.
    pub fn descend(self) -> Self {
        match self {
            Depth::Unbounded => Depth::Unbounded,
            Depth::Levels(n) => Depth::Levels(n.saturating_sub(1)),
        }
    }
}

impl From<i64> for Depth {
    fn from(value: i64) -> Self {
        Depth::from_i64(value)
    }
}

impl From<Depth> for i64 {
    fn from(depth: Depth) -> Self {
        depth.as_i64()
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}
