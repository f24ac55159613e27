//! Study inventory identity types.
//!
//! These types name the dynamic parts of a study: areas, simulation outputs
//! and the folders outputs are stored in.

use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Area identifier. Areas are case-insensitive; the id is always lower case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaId(String);

impl AreaId {
    pub fn new(name: &str) -> Self {
        AreaId(name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AreaId {
    fn from(name: &str) -> Self {
        AreaId::new(name)
    }
}

/// Output identifier: 1-based position of a simulation in the sorted `output/` listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputId(pub u32);

impl OutputId {
    pub fn parse(s: &str) -> Option<Self> {
        s.parse::<u32>().ok().map(OutputId)
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Simulation mode of an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    Economy,
    Adequacy,
}

impl SimulationMode {
    /// Three-letter code used in output folder names.
    pub fn code(self) -> &'static str {
        match self {
            SimulationMode::Economy => "eco",
            SimulationMode::Adequacy => "adq",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "eco" => Some(SimulationMode::Economy),
            "adq" => Some(SimulationMode::Adequacy),
            _ => None,
        }
    }

    /// Parse the spelled-out mode (`Economy`, `adequacy`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "economy" => Some(SimulationMode::Economy),
            "adequacy" => Some(SimulationMode::Adequacy),
            _ => None,
        }
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationMode::Economy => write!(f, "economy"),
            SimulationMode::Adequacy => write!(f, "adequacy"),
        }
    }
}

/// Parsed simulation output folder name.
///
/// Format: `<YYYYMMDD-HHMM><eco|adq>[-<name>]`
/// Example: `20201014-1422eco-hello`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputName {
    pub date: String,
    pub mode: SimulationMode,
    pub name: String,
}

static OUTPUT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{8}-\d{4})(eco|adq)-?(.*)$").expect("regex"));

impl OutputName {
    /// Parse and validate an output folder name.
    pub fn parse(folder: &str) -> Option<Self> {
        let caps = OUTPUT_NAME_RE.captures(folder)?;
        let date = caps.get(1)?.as_str();
        NaiveDateTime::parse_from_str(date, "%Y%m%d-%H%M").ok()?;
        Some(OutputName {
            date: date.to_string(),
            mode: SimulationMode::from_code(caps.get(2)?.as_str())?,
            name: caps.get(3).map(|m| m.as_str()).unwrap_or_default().to_string(),
        })
    }

    /// Folder name this output is stored under.
    pub fn folder_name(&self) -> String {
        let dash = if self.name.is_empty() { "" } else { "-" };
        format!("{}{}{}{}", self.date, self.mode.code(), dash, self.name)
    }
}

impl fmt::Display for OutputName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.folder_name())
    }
}

/// Name of a study directory under the studies root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudyName(String);

static STUDY_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("regex"));

impl StudyName {
    /// Only alphanumeric characters, '-' and '_' are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        if STUDY_NAME_RE.is_match(s) {
            Some(StudyName(s.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_id_is_lower_case() {
        assert_eq!(AreaId::new(" FR ").as_str(), "fr");
        assert_eq!(AreaId::from("De"), AreaId::new("de"));
    }

    #[test]
    fn test_output_name_with_suffix() {
        let out = OutputName::parse("20201014-1422eco-hello").unwrap();
        assert_eq!(out.date, "20201014-1422");
        assert_eq!(out.mode, SimulationMode::Economy);
        assert_eq!(out.name, "hello");
        assert_eq!(out.folder_name(), "20201014-1422eco-hello");
    }

    #[test]
    fn test_output_name_without_suffix() {
        let out = OutputName::parse("20201014-1430adq").unwrap();
        assert_eq!(out.mode, SimulationMode::Adequacy);
        assert!(out.name.is_empty());
        assert_eq!(out.folder_name(), "20201014-1430adq");
    }

    #[test]
    fn test_output_name_rejects_garbage() {
        assert!(OutputName::parse("maps").is_none());
        assert!(OutputName::parse("20201014-1422xyz-hello").is_none());
        // Month 13 does not exist
        assert!(OutputName::parse("20201314-1422eco").is_none());
    }

    #[test]
    fn test_study_name_validation() {
        assert!(StudyName::parse("STA-mini_2").is_some());
        assert!(StudyName::parse("../etc").is_none());
        assert!(StudyName::parse("").is_none());
        assert!(StudyName::parse("a b").is_none());
    }

    #[test]
    fn test_simulation_mode_names() {
        assert_eq!(SimulationMode::from_name("Economy"), Some(SimulationMode::Economy));
        assert_eq!(SimulationMode::Adequacy.to_string(), "adequacy");
        assert_eq!(SimulationMode::Adequacy.code(), "adq");
    }
}
