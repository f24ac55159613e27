//! Study descriptor: where a node lives on disk plus the study inventory.
//!
//! The inventory (areas, links, thermal clusters, simulation outputs) is
//! read once per call, either from the study directory ([`StudyConfig::from_path`])
//! or from a previously produced study document ([`StudyConfig::from_json`]).
//! Descriptors are values: [`StudyConfig::next`] derives a child descriptor
//! sharing the same inventory behind an [`Arc`].

use indexmap::IndexMap;
use serde_json::Value;
use st_common::{AreaId, Error, OutputId, OutputName, Result, SimulationMode};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::codec::ini::{parse_bool_lenient, IniReader, RawSections};
use crate::fs_util;

// ── Inventory ───────────────────────────────────────────────────────────

/// Output filters of an interconnection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Link {
    pub filters_synthesis: Vec<String>,
    pub filters_year: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Area {
    pub links: IndexMap<AreaId, Link>,
    pub thermals: Vec<String>,
    pub filters_synthesis: Vec<String>,
    pub filters_year: Vec<String>,
}

/// One simulation run stored under `output/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simulation {
    pub name: OutputName,
    pub nbyears: u32,
    /// Per-year detail (`mc-ind`) was written.
    pub by_year: bool,
    /// Synthesis (`mc-all`) was written.
    pub synthesis: bool,
}

impl Simulation {
    pub fn mode(&self) -> SimulationMode {
        self.name.mode
    }

    pub fn folder_name(&self) -> String {
        self.name.folder_name()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub areas: IndexMap<AreaId, Area>,
    pub outputs: BTreeMap<OutputId, Simulation>,
}

// ── Descriptor ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StudyConfig {
    root_path: Arc<PathBuf>,
    path: PathBuf,
    inventory: Arc<Inventory>,
    resources_path: Option<Arc<PathBuf>>,
}

impl StudyConfig {
    pub fn new(root_path: impl Into<PathBuf>, inventory: Inventory) -> Self {
        let root_path = root_path.into();
        Self {
            path: root_path.clone(),
            root_path: Arc::new(root_path),
            inventory: Arc::new(inventory),
            resources_path: None,
        }
    }

    /// Directory raw leaves fall back to when a saved value is not a file reference.
    pub fn with_resources(mut self, path: impl Into<PathBuf>) -> Self {
        self.resources_path = Some(Arc::new(path.into()));
        self
    }

    /// Introspect the study directory.
    pub fn from_path(root_path: impl Into<PathBuf>) -> Result<Self> {
        let root_path = root_path.into();
        let inventory = Inventory {
            areas: read_areas(&root_path)?,
            outputs: read_outputs(&root_path)?,
        };
        info!(
            study = %root_path.display(),
            areas = inventory.areas.len(),
            outputs = inventory.outputs.len(),
            "study inventory loaded"
        );
        Ok(Self::new(root_path, inventory))
    }

    /// Rebuild the inventory from a study document produced by a full `get`.
    pub fn from_json(document: &Value, root_path: impl Into<PathBuf>) -> Result<Self> {
        let inventory = Inventory {
            areas: json_areas(document)?,
            outputs: json_outputs(document)?,
        };
        Ok(Self::new(root_path, inventory))
    }

    /// Descriptor of child `name`. `"."` designates this same directory.
    pub fn next(&self, name: &str) -> Self {
        let path = if name == "." {
            self.path.clone()
        } else {
            self.path.join(name)
        };
        Self {
            root_path: Arc::clone(&self.root_path),
            path,
            inventory: Arc::clone(&self.inventory),
            resources_path: self.resources_path.clone(),
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path below the study root, `/`-separated.
    pub fn relative_path(&self) -> String {
        let rel = self.path.strip_prefix(self.root_path.as_path()).unwrap_or(&self.path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn resources_path(&self) -> Option<&Path> {
        self.resources_path.as_deref().map(PathBuf::as_path)
    }

    pub fn area_ids(&self) -> Vec<AreaId> {
        self.inventory.areas.keys().cloned().collect()
    }

    pub fn thermal_ids(&self, area: &AreaId) -> Vec<String> {
        self.inventory
            .areas
            .get(area)
            .map(|a| a.thermals.clone())
            .unwrap_or_default()
    }

    pub fn link_ids(&self, area: &AreaId) -> Vec<AreaId> {
        self.inventory
            .areas
            .get(area)
            .map(|a| a.links.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Synthesis filters of an area, or of one of its links.
    pub fn filters_synthesis(&self, area: &AreaId, link: Option<&AreaId>) -> Vec<String> {
        let Some(info) = self.inventory.areas.get(area) else {
            return Vec::new();
        };
        match link {
            Some(link) => info
                .links
                .get(link)
                .map(|l| l.filters_synthesis.clone())
                .unwrap_or_default(),
            None => info.filters_synthesis.clone(),
        }
    }

    /// Year-by-year filters of an area, or of one of its links.
    pub fn filters_year(&self, area: &AreaId, link: Option<&AreaId>) -> Vec<String> {
        let Some(info) = self.inventory.areas.get(area) else {
            return Vec::new();
        };
        match link {
            Some(link) => info
                .links
                .get(link)
                .map(|l| l.filters_year.clone())
                .unwrap_or_default(),
            None => info.filters_year.clone(),
        }
    }

    pub fn output_ids(&self) -> Vec<OutputId> {
        self.inventory.outputs.keys().copied().collect()
    }

    pub fn simulation(&self, id: OutputId) -> Option<&Simulation> {
        self.inventory.outputs.get(&id)
    }
}

// ── Filesystem introspection ────────────────────────────────────────────

fn read_required_ini(path: &Path) -> Result<RawSections> {
    match IniReader::read(path) {
        Err(Error::BackingFileMissing { path }) => Err(Error::MissingStudyData {
            path,
            reason: "file not found".to_string(),
        }),
        other => other,
    }
}

fn required<'a>(raw: &'a RawSections, section: &str, key: &str, path: &Path) -> Result<&'a str> {
    raw.get(section)
        .and_then(|s| s.get(key))
        .map(String::as_str)
        .ok_or_else(|| Error::MissingStudyData {
            path: path.to_path_buf(),
            reason: format!("missing [{section}] {key}"),
        })
}

/// Comma separated filter list: trimmed, empties dropped, first occurrence kept.
pub fn split_filters(raw: &str) -> Vec<String> {
    let mut filters: Vec<String> = Vec::new();
    for filter in raw.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        if !filters.iter().any(|f| f == filter) {
            filters.push(filter.to_string());
        }
    }
    filters
}

fn read_areas(root: &Path) -> Result<IndexMap<AreaId, Area>> {
    let list_path = root.join("input/areas/list.txt");
    let list = match fs_util::read_to_string(&list_path) {
        Err(Error::BackingFileMissing { path }) => {
            return Err(Error::MissingStudyData {
                path,
                reason: "area list not found".to_string(),
            })
        }
        other => other?,
    };

    let mut areas = IndexMap::new();
    for name in list.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let id = AreaId::new(name);
        let area = read_area(root, &id)?;
        debug!(
            area = %id,
            links = area.links.len(),
            thermals = area.thermals.len(),
            "area introspected"
        );
        areas.insert(id, area);
    }
    Ok(areas)
}

fn read_area(root: &Path, id: &AreaId) -> Result<Area> {
    let links_path = root.join("input/links").join(id.as_str()).join("properties.ini");
    let links_raw = read_required_ini(&links_path)?;
    let mut links = IndexMap::new();
    for (section, entries) in &links_raw {
        let missing = |key: &str| Error::MissingStudyData {
            path: links_path.clone(),
            reason: format!("missing [{section}] {key}"),
        };
        let synthesis = entries.get("filter-synthesis").ok_or_else(|| missing("filter-synthesis"))?;
        let year = entries
            .get("filter-year-by-year")
            .ok_or_else(|| missing("filter-year-by-year"))?;
        links.insert(
            AreaId::new(section),
            Link {
                filters_synthesis: split_filters(synthesis),
                filters_year: split_filters(year),
            },
        );
    }

    let clusters_path = root
        .join("input/thermal/clusters")
        .join(id.as_str())
        .join("list.ini");
    let thermals = read_required_ini(&clusters_path)?.keys().cloned().collect();

    let optimization_path = root.join("input/areas").join(id.as_str()).join("optimization.ini");
    let optimization = read_required_ini(&optimization_path)?;
    let filters_synthesis = split_filters(required(
        &optimization,
        "filtering",
        "filter-synthesis",
        &optimization_path,
    )?);
    let filters_year = split_filters(required(
        &optimization,
        "filtering",
        "filter-year-by-year",
        &optimization_path,
    )?);

    Ok(Area {
        links,
        thermals,
        filters_synthesis,
        filters_year,
    })
}

fn read_outputs(root: &Path) -> Result<BTreeMap<OutputId, Simulation>> {
    let output_dir = root.join("output");
    let mut folders: Vec<PathBuf> = fs_util::list_entries(&output_dir)?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect();
    folders.sort();

    let mut outputs = BTreeMap::new();
    for (index, folder) in folders.iter().enumerate() {
        let folder_name = fs_util::entry_name(folder);
        let name = OutputName::parse(&folder_name).ok_or_else(|| Error::MissingStudyData {
            path: folder.clone(),
            reason: "output folder name does not match <YYYYMMDD-HHMM><eco|adq>[-name]".to_string(),
        })?;
        let simulation = read_simulation(folder, name)?;
        let id = OutputId(index as u32 + 1);
        debug!(output = %id, folder = %folder_name, nbyears = simulation.nbyears, "output introspected");
        outputs.insert(id, simulation);
    }
    Ok(outputs)
}

fn read_simulation(folder: &Path, name: OutputName) -> Result<Simulation> {
    let path = folder.join("about-the-study/parameters.ini");
    let raw = read_required_ini(&path)?;

    let invalid = |key: &str, value: &str| Error::MissingStudyData {
        path: path.clone(),
        reason: format!("invalid {key} '{value}'"),
    };
    let nbyears_raw = required(&raw, "general", "nbyears", &path)?;
    let nbyears = nbyears_raw
        .parse::<u32>()
        .map_err(|_| invalid("nbyears", nbyears_raw))?;
    let by_year_raw = required(&raw, "general", "year-by-year", &path)?;
    let by_year =
        parse_bool_lenient(by_year_raw).ok_or_else(|| invalid("year-by-year", by_year_raw))?;
    let synthesis_raw = required(&raw, "output", "synthesis", &path)?;
    let synthesis =
        parse_bool_lenient(synthesis_raw).ok_or_else(|| invalid("synthesis", synthesis_raw))?;

    Ok(Simulation {
        name,
        nbyears,
        by_year,
        synthesis,
    })
}

// ── Document reconstruction ─────────────────────────────────────────────

fn at<'a>(document: &'a Value, keys: &[&str]) -> Result<&'a Value> {
    let mut current = document;
    for (i, key) in keys.iter().enumerate() {
        current = current.get(*key).ok_or_else(|| Error::MalformedStudyDocument {
            key: keys[..=i].join("/"),
        })?;
    }
    Ok(current)
}

fn object_keys(value: &Value, key: &str) -> Result<Vec<String>> {
    value
        .as_object()
        .map(|m| m.keys().cloned().collect())
        .ok_or_else(|| Error::MalformedStudyDocument { key: key.to_string() })
}

fn string_at(document: &Value, keys: &[&str]) -> Result<String> {
    at(document, keys)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::MalformedStudyDocument { key: keys.join("/") })
}

fn bool_at(document: &Value, keys: &[&str]) -> Result<bool> {
    let value = at(document, keys)?;
    value
        .as_bool()
        .or_else(|| value.as_str().and_then(parse_bool_lenient))
        .ok_or_else(|| Error::MalformedStudyDocument { key: keys.join("/") })
}

fn joined<'a>(prefix: &[&'a str], rest: &[&'a str]) -> Vec<&'a str> {
    prefix.iter().chain(rest).copied().collect()
}

fn json_areas(document: &Value) -> Result<IndexMap<AreaId, Area>> {
    let names = object_keys(at(document, &["input", "areas"])?, "input/areas")?;
    let mut areas = IndexMap::new();
    for name in names.iter().filter(|n| *n != "sets" && *n != "list") {
        let id = AreaId::new(name);

        let thermals_key = ["input", "thermal", "clusters", name.as_str(), "list"];
        let thermals = object_keys(at(document, &thermals_key)?, &thermals_key.join("/"))?;

        let links_key = ["input", "links", name.as_str(), "properties"];
        let mut links = IndexMap::new();
        for link in object_keys(at(document, &links_key)?, &links_key.join("/"))? {
            let section = ["input", "links", name.as_str(), "properties", link.as_str()];
            let synthesis_key = joined(&section, &["filter-synthesis"]);
            let year_key = joined(&section, &["filter-year-by-year"]);
            links.insert(
                AreaId::new(&link),
                Link {
                    filters_synthesis: split_filters(&string_at(document, &synthesis_key)?),
                    filters_year: split_filters(&string_at(document, &year_key)?),
                },
            );
        }

        let filtering = ["input", "areas", name.as_str(), "optimization", "filtering"];
        let synthesis_key = joined(&filtering, &["filter-synthesis"]);
        let year_key = joined(&filtering, &["filter-year-by-year"]);

        areas.insert(
            id,
            Area {
                links,
                thermals,
                filters_synthesis: split_filters(&string_at(document, &synthesis_key)?),
                filters_year: split_filters(&string_at(document, &year_key)?),
            },
        );
    }
    Ok(areas)
}

fn json_outputs(document: &Value) -> Result<BTreeMap<OutputId, Simulation>> {
    let Some(output) = document.get("output") else {
        return Ok(BTreeMap::new());
    };
    let mut outputs = BTreeMap::new();
    for key in object_keys(output, "output")? {
        let id = OutputId::parse(&key).ok_or_else(|| Error::MalformedStudyDocument {
            key: format!("output/{key}"),
        })?;
        let k = key.as_str();

        let date_raw = string_at(document, &["output", k, "info", "general", "date"])?;
        let date: String = date_raw
            .chars()
            .filter(|c| !matches!(c, '.' | ':' | ' '))
            .collect();
        let mode_raw = string_at(document, &["output", k, "info", "general", "mode"])?;
        let mode = SimulationMode::from_name(&mode_raw).ok_or_else(|| Error::MalformedStudyDocument {
            key: format!("output/{k}/info/general/mode"),
        })?;
        let name = string_at(document, &["output", k, "info", "general", "name"])?;
        let candidate = OutputName { date, mode, name };
        let name = OutputName::parse(&candidate.folder_name()).ok_or_else(|| {
            Error::MalformedStudyDocument {
                key: format!("output/{k}/info/general/date"),
            }
        })?;

        let params = ["output", k, "about-the-study", "parameters"];
        let nbyears_key = joined(&params, &["general", "nbyears"]);
        let nbyears = at(document, &nbyears_key)?
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| Error::MalformedStudyDocument {
                key: nbyears_key.join("/"),
            })?;
        let by_year = bool_at(document, &joined(&params, &["general", "year-by-year"]))?;
        let synthesis = bool_at(document, &joined(&params, &["output", "synthesis"]))?;

        outputs.insert(
            id,
            Simulation {
                name,
                nbyears,
                by_year,
                synthesis,
            },
        );
    }
    Ok(outputs)
}
