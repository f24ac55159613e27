//! Declarative study layout.
//!
//! Every known study directory is a [`TableShape`]: a list of [`ChildRule`]s,
//! each expanding to zero or more children. A rule iterates over a part of
//! the inventory ([`Each`]), renders the child key and on-disk name from
//! templates using the current [`Bindings`], and instantiates a
//! [`NodeTemplate`]. Placeholders: `{area}`, `{link}`, `{cluster}`,
//! `{output}`, `{output_dir}`, `{year}`, `{timing}`, `{entry}`, `{file}`.
//! A path of `"."` keeps the parent directory.

use st_common::{Address, AreaId, Error, OutputId, Result, SimulationMode};
use std::path::Path;
use tracing::{debug, warn};

use super::{Children, FolderNode, IniFileNode, MatrixNode, Node, RawFileNode};
use crate::codec::ini::ScalarType::{Bool, Float, Int, Number, Str};
use crate::codec::ini::{IniSpec, IniTypes, SectionSpec};
use crate::descriptor::{Simulation, StudyConfig};
use crate::fs_util;
use crate::schema::SchemaNode;

// ── Table types ─────────────────────────────────────────────────────────

/// What a rule iterates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Each {
    Once,
    Areas,
    /// Links of the bound area.
    Links,
    /// Thermal clusters of the bound area.
    Thermals,
    /// Synthesis filters of the bound link, else of the bound area.
    FiltersSynthesis,
    /// Year-by-year filters of the bound link, else of the bound area.
    FiltersYear,
    Outputs,
    /// Monte-Carlo years of the bound output.
    Years,
    /// Entries of the folder's own directory.
    Entries,
}

/// Guard evaluated against the bound output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Always,
    Economy,
    Adequacy,
    ByYear,
    Synthesis,
}

#[derive(Debug, Clone, Copy)]
pub enum NodeTemplate {
    Folder(&'static TableShape),
    Ini(&'static IniSpec),
    Matrix,
    Raw,
}

#[derive(Debug)]
pub struct ChildRule {
    pub each: Each,
    pub key: &'static str,
    pub path: &'static str,
    pub node: NodeTemplate,
    pub when: Condition,
}

impl ChildRule {
    pub const fn when(self, when: Condition) -> Self {
        ChildRule { when, ..self }
    }
}

const fn once(key: &'static str, path: &'static str, node: NodeTemplate) -> ChildRule {
    each(Each::Once, key, path, node)
}

const fn each(each: Each, key: &'static str, path: &'static str, node: NodeTemplate) -> ChildRule {
    ChildRule {
        each,
        key,
        path,
        node,
        when: Condition::Always,
    }
}

#[derive(Debug)]
pub struct TableShape {
    pub name: &'static str,
    pub rules: &'static [ChildRule],
}

// ── Bindings ────────────────────────────────────────────────────────────

/// Inventory items bound by the rules above a folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    pub area: Option<AreaId>,
    pub link: Option<AreaId>,
    pub cluster: Option<String>,
    pub output: Option<OutputId>,
    pub year: Option<u32>,
    pub timing: Option<String>,
    pub entry: Option<(String, String)>,
}

impl Bindings {
    fn value(&self, var: &str, config: &StudyConfig) -> Option<String> {
        match var {
            "area" => self.area.as_ref().map(ToString::to_string),
            "link" => self.link.as_ref().map(ToString::to_string),
            "cluster" => self.cluster.clone(),
            "output" => self.output.map(|id| id.to_string()),
            "output_dir" => self
                .output
                .and_then(|id| config.simulation(id))
                .map(Simulation::folder_name),
            "year" => self.year.map(|y| format!("{y:05}")),
            "timing" => self.timing.clone(),
            "entry" => self.entry.as_ref().map(|(key, _)| key.clone()),
            "file" => self.entry.as_ref().map(|(_, name)| name.clone()),
            _ => None,
        }
    }

    fn area(&self) -> Result<&AreaId> {
        self.area
            .as_ref()
            .ok_or_else(|| Error::Config("layout rule needs a bound area".to_string()))
    }

    fn simulation<'a>(&self, config: &'a StudyConfig) -> Result<&'a Simulation> {
        let id = self
            .output
            .ok_or_else(|| Error::Config("layout rule needs a bound output".to_string()))?;
        config
            .simulation(id)
            .ok_or_else(|| Error::Config(format!("output {id} is not in the inventory")))
    }
}

fn render(template: &str, bindings: &Bindings, config: &StudyConfig) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| Error::Config(format!("unterminated placeholder in '{template}'")))?;
        let var = &after[..end];
        let value = bindings.value(var, config).ok_or_else(|| {
            Error::Config(format!("layout template '{template}' uses unbound '{var}'"))
        })?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

impl Condition {
    fn holds(self, bindings: &Bindings, config: &StudyConfig) -> Result<bool> {
        if self == Condition::Always {
            return Ok(true);
        }
        let simulation = bindings.simulation(config)?;
        Ok(match self {
            Condition::Always => true,
            Condition::Economy => simulation.mode() == SimulationMode::Economy,
            Condition::Adequacy => simulation.mode() == SimulationMode::Adequacy,
            Condition::ByYear => simulation.by_year,
            Condition::Synthesis => simulation.synthesis,
        })
    }
}

fn expand(each: Each, base: &Bindings, config: &StudyConfig, dir: &Path) -> Result<Vec<Bindings>> {
    let expanded = match each {
        Each::Once => vec![base.clone()],
        Each::Areas => config
            .area_ids()
            .into_iter()
            .map(|area| Bindings {
                area: Some(area),
                ..base.clone()
            })
            .collect(),
        Each::Links => config
            .link_ids(base.area()?)
            .into_iter()
            .map(|link| Bindings {
                link: Some(link),
                ..base.clone()
            })
            .collect(),
        Each::Thermals => config
            .thermal_ids(base.area()?)
            .into_iter()
            .map(|cluster| Bindings {
                cluster: Some(cluster),
                ..base.clone()
            })
            .collect(),
        Each::FiltersSynthesis => config
            .filters_synthesis(base.area()?, base.link.as_ref())
            .into_iter()
            .map(|timing| Bindings {
                timing: Some(timing),
                ..base.clone()
            })
            .collect(),
        Each::FiltersYear => config
            .filters_year(base.area()?, base.link.as_ref())
            .into_iter()
            .map(|timing| Bindings {
                timing: Some(timing),
                ..base.clone()
            })
            .collect(),
        Each::Outputs => config
            .output_ids()
            .into_iter()
            .map(|id| Bindings {
                output: Some(id),
                ..base.clone()
            })
            .collect(),
        Each::Years => (1..=base.simulation(config)?.nbyears)
            .map(|year| Bindings {
                year: Some(year),
                ..base.clone()
            })
            .collect(),
        Each::Entries => fs_util::list_entries(dir)?
            .iter()
            .map(|path| Bindings {
                entry: Some((fs_util::entry_key(path), fs_util::entry_name(path))),
                ..base.clone()
            })
            .collect(),
    };
    Ok(expanded)
}

/// Instantiate the children a table describes for one folder.
pub fn build(
    table: &'static TableShape,
    config: &StudyConfig,
    address: &Address,
    bindings: &Bindings,
    schema: Option<&SchemaNode>,
) -> Result<Children> {
    let mut children = Children::new();

    for rule in table.rules {
        if !rule.when.holds(bindings, config)? {
            continue;
        }
        for bound in expand(rule.each, bindings, config, config.path())? {
            let key = render(rule.key, &bound, config)?;
            if children.contains_key(&key) {
                if rule.each != Each::Entries {
                    warn!(table = table.name, key = %key, "duplicate child key skipped");
                }
                continue;
            }
            let child_config = config.next(&render(rule.path, &bound, config)?);
            let child_address = address.child(&key);
            let node = match rule.node {
                NodeTemplate::Folder(shape) => Node::Folder(FolderNode::table(
                    child_config,
                    child_address,
                    shape,
                    bound,
                    schema.and_then(|s| s.declared_child(&key)),
                )),
                NodeTemplate::Ini(spec) => Node::Ini(
                    IniFileNode::new(child_config, IniTypes::from(spec))
                        .allow_missing(spec.allow_missing),
                ),
                NodeTemplate::Matrix => Node::Matrix(MatrixNode::new(child_config)),
                NodeTemplate::Raw => Node::Raw(RawFileNode::new(child_config)),
            };
            children.insert(key, node);
        }
    }

    debug!(
        table = table.name,
        address = %address,
        children = children.len(),
        "table folder built"
    );
    Ok(children)
}

// ── INI typing tables ───────────────────────────────────────────────────

static GENERALDATA: IniSpec = IniSpec::sections(&[
    (
        "general",
        SectionSpec::keys(&[
            ("mode", Str),
            ("horizon", Int),
            ("nbyears", Int),
            ("simulation.start", Int),
            ("simulation.end", Int),
            ("january.1st", Str),
            ("first-month-in-year", Str),
            ("first.weekday", Str),
            ("leapyear", Bool),
            ("year-by-year", Bool),
            ("derated", Bool),
            ("custom-ts-numbers", Bool),
            ("user-playlist", Bool),
            ("filtering", Bool),
            ("active-rules-scenario", Str),
            ("generate", Str),
            ("nbtimeseriesload", Int),
            ("nbtimeserieshydro", Int),
            ("nbtimeserieswind", Int),
            ("nbtimeseriesthermal", Int),
            ("nbtimeseriessolar", Int),
            ("refreshtimeseries", Str),
            ("intra-modal", Str),
            ("inter-modal", Str),
            ("refreshintervalload", Int),
            ("refreshintervalhydro", Int),
            ("refreshintervalwind", Int),
            ("refreshintervalthermal", Int),
            ("refreshintervalsolar", Int),
            ("readonly", Bool),
        ]),
    ),
    ("input", SectionSpec::keys(&[("import", Str)])),
    (
        "output",
        SectionSpec::keys(&[("synthesis", Bool), ("storenewset", Bool), ("archives", Str)]),
    ),
    (
        "optimization",
        SectionSpec::keys(&[
            ("simplex-range", Str),
            ("transmission-capacities", Bool),
            ("link-type", Str),
            ("include-constraints", Bool),
            ("include-hurdlecosts", Bool),
            ("include-tc-minstablepower", Bool),
            ("include-tc-min-ud-time", Bool),
            ("include-dayahead", Bool),
            ("include-strategicreserve", Bool),
            ("include-spinningreserve", Bool),
            ("include-primaryreserve", Bool),
            ("include-exportmps", Bool),
        ]),
    ),
    (
        "other preferences",
        SectionSpec::keys(&[
            ("power-fluctuations", Str),
            ("shedding-strategy", Str),
            ("shedding-policy", Str),
            ("unit-commitment-mode", Str),
            ("number-of-cores-mode", Str),
            ("day-ahead-reserve-management", Str),
        ]),
    ),
    (
        "advanced parameters",
        SectionSpec::keys(&[("accuracy-on-correlation", Str), ("adequacy-block-size", Int)]),
    ),
    ("seeds - Mersenne Twister", SectionSpec::all(Int)),
]);

static STUDY_ANTARES: IniSpec = IniSpec::sections(&[(
    "antares",
    SectionSpec::keys(&[
        ("version", Int),
        ("caption", Str),
        ("created", Int),
        ("lastsave", Int),
        ("author", Str),
    ]),
)]);

static DESKTOP: IniSpec = IniSpec::sections(&[(
    ".shellclassinfo",
    SectionSpec::keys(&[("iconfile", Str), ("iconindex", Int), ("infotip", Str)]),
)]);

static INFO_OUTPUT: IniSpec = IniSpec::sections(&[(
    "general",
    SectionSpec::keys(&[
        ("version", Int),
        ("name", Str),
        ("mode", Str),
        ("date", Str),
        ("title", Str),
        ("timestamp", Int),
    ]),
)]);

static AREA_OPTIMIZATION: IniSpec = IniSpec::sections(&[
    (
        "nodal optimization",
        SectionSpec::keys(&[
            ("non-dispatchable-power", Bool),
            ("dispatchable-hydro-power", Bool),
            ("other-dispatchable-power", Bool),
            ("spread-unsupplied-energy-cost", Float),
            ("spread-spilled-energy-cost", Float),
        ]),
    ),
    (
        "filtering",
        SectionSpec::keys(&[("filter-synthesis", Str), ("filter-year-by-year", Str)]),
    ),
]);

static AREA_UI: IniSpec = IniSpec::sections(&[(
    "ui",
    SectionSpec::keys(&[
        ("x", Int),
        ("y", Int),
        ("color_r", Int),
        ("color_g", Int),
        ("color_b", Int),
        ("layers", Str),
    ]),
)]);

static LINK_PROPERTIES: IniSpec = IniSpec::any(SectionSpec::keys(&[
    ("hurdles-cost", Bool),
    ("loop-flow", Bool),
    ("use-phase-shifter", Bool),
    ("transmission-capacities", Str),
    ("asset-type", Str),
    ("link-style", Str),
    ("link-width", Int),
    ("colorr", Int),
    ("colorg", Int),
    ("colorb", Int),
    ("display-comments", Bool),
    ("filter-synthesis", Str),
    ("filter-year-by-year", Str),
]));

static THERMAL_LIST: IniSpec = IniSpec::any(SectionSpec::keys(&[
    ("name", Str),
    ("group", Str),
    ("unitcount", Int),
    ("nominalcapacity", Float),
    ("enabled", Bool),
    ("min-stable-power", Float),
    ("spinning", Float),
    ("co2", Float),
    ("marginal-cost", Float),
    ("market-bid-cost", Float),
    ("spread-cost", Float),
    ("fixed-cost", Float),
    ("startup-cost", Float),
]));

static THERMAL_AREAS: IniSpec = IniSpec::sections(&[
    ("unserverdenergycost", SectionSpec::all(Float)),
    ("spilledenergycost", SectionSpec::all(Float)),
]);

static HYDRO: IniSpec = IniSpec::sections(&[
    ("inter-daily-breakdown", SectionSpec::all(Float)),
    ("intra-daily-modulation", SectionSpec::all(Float)),
    ("inter-monthly-breakdown", SectionSpec::all(Float)),
    ("initialize reservoir date", SectionSpec::all(Int)),
    ("leeway low", SectionSpec::all(Float)),
    ("leeway up", SectionSpec::all(Float)),
    ("pumping efficiency", SectionSpec::all(Float)),
    ("reservoir", SectionSpec::all(Bool)),
    ("reservoir capacity", SectionSpec::all(Float)),
    ("follow load", SectionSpec::all(Bool)),
    ("use water", SectionSpec::all(Bool)),
    ("hard bounds", SectionSpec::all(Bool)),
    ("use heuristic", SectionSpec::all(Bool)),
    ("power to level", SectionSpec::all(Bool)),
    ("use leeway", SectionSpec::all(Bool)),
]);

static HYDRO_ALLOCATION: IniSpec = IniSpec::sections(&[("[allocation]", SectionSpec::all(Number))]);

static HYDRO_PREPRO_INI: IniSpec =
    IniSpec::sections(&[("prepro", SectionSpec::keys(&[("intermonthly-correlation", Float)]))]);

static BINDING_CONSTRAINTS: IniSpec = IniSpec::any(SectionSpec {
    keys: &[
        ("name", Str),
        ("id", Str),
        ("enabled", Bool),
        ("type", Str),
        ("operator", Str),
        ("comments", Str),
    ],
    other: Some(Number),
});

static CORRELATION: IniSpec = IniSpec {
    sections: &[("general", SectionSpec::keys(&[("mode", Str)]))],
    any_section: Some(SectionSpec::all(Number)),
    allow_missing: false,
};

static UNTYPED: IniSpec = IniSpec::untyped();

static OPTIONAL_UNTYPED: IniSpec = IniSpec::untyped().optional();

// ── Study root ──────────────────────────────────────────────────────────

pub static STUDY: TableShape = TableShape {
    name: "study",
    rules: &[
        once("Desktop", "Desktop.ini", NodeTemplate::Ini(&DESKTOP)),
        once("study", "study.antares", NodeTemplate::Ini(&STUDY_ANTARES)),
        once("settings", "settings", NodeTemplate::Folder(&SETTINGS)),
        once("layers", "layers", NodeTemplate::Folder(&LAYERS)),
        once("logs", "logs", NodeTemplate::Folder(&ENTRIES_RAW)),
        once("input", "input", NodeTemplate::Folder(&INPUT)),
        once("output", "output", NodeTemplate::Folder(&OUTPUT)),
    ],
};

static ENTRIES_RAW: TableShape = TableShape {
    name: "entries",
    rules: &[each(Each::Entries, "{entry}", "{file}", NodeTemplate::Raw)],
};

static SETTINGS: TableShape = TableShape {
    name: "settings",
    rules: &[
        once("generaldata", "generaldata.ini", NodeTemplate::Ini(&GENERALDATA)),
        once("resources", "resources", NodeTemplate::Folder(&RESOURCES)),
        once("simulations", "simulations", NodeTemplate::Folder(&ENTRIES_RAW)),
        once("comments", "comments.txt", NodeTemplate::Raw),
        once("scenariobuilder", "scenariobuilder.dat", NodeTemplate::Ini(&OPTIONAL_UNTYPED)),
    ],
};

static RESOURCES: TableShape = TableShape {
    name: "resources",
    rules: &[once("study", "study.ico", NodeTemplate::Raw)],
};

static LAYERS: TableShape = TableShape {
    name: "layers",
    rules: &[once("layers", "layers.ini", NodeTemplate::Ini(&UNTYPED))],
};

// ── Input ───────────────────────────────────────────────────────────────

static INPUT: TableShape = TableShape {
    name: "input",
    rules: &[
        once("areas", "areas", NodeTemplate::Folder(&INPUT_AREAS)),
        once("bindingconstraints", "bindingconstraints", NodeTemplate::Folder(&BINDING)),
        once("hydro", "hydro", NodeTemplate::Folder(&HYDRO_FOLDER)),
        once("links", "links", NodeTemplate::Folder(&LINKS)),
        once("load", "load", NodeTemplate::Folder(&LOAD)),
        once("solar", "solar", NodeTemplate::Folder(&SOLAR)),
        once("wind", "wind", NodeTemplate::Folder(&WIND)),
        once("misc-gen", "misc-gen", NodeTemplate::Folder(&MISC_GEN)),
        once("reserves", "reserves", NodeTemplate::Folder(&RESERVES)),
        once("thermal", "thermal", NodeTemplate::Folder(&THERMAL)),
    ],
};

static INPUT_AREAS: TableShape = TableShape {
    name: "input/areas",
    rules: &[
        once("list", "list.txt", NodeTemplate::Raw),
        once("sets", "sets.ini", NodeTemplate::Ini(&UNTYPED)),
        each(Each::Areas, "{area}", "{area}", NodeTemplate::Folder(&INPUT_AREA)),
    ],
};

static INPUT_AREA: TableShape = TableShape {
    name: "input/areas/<area>",
    rules: &[
        once("optimization", "optimization.ini", NodeTemplate::Ini(&AREA_OPTIMIZATION)),
        once("ui", "ui.ini", NodeTemplate::Ini(&AREA_UI)),
    ],
};

static BINDING: TableShape = TableShape {
    name: "input/bindingconstraints",
    rules: &[
        once(
            "bindingconstraints",
            "bindingconstraints.ini",
            NodeTemplate::Ini(&BINDING_CONSTRAINTS),
        ),
        each(Each::Entries, "{entry}", "{file}", NodeTemplate::Matrix),
    ],
};

static HYDRO_FOLDER: TableShape = TableShape {
    name: "input/hydro",
    rules: &[
        once("allocation", "allocation", NodeTemplate::Folder(&HYDRO_ALLOCATION_FOLDER)),
        once("common", "common", NodeTemplate::Folder(&HYDRO_COMMON)),
        once("prepro", "prepro", NodeTemplate::Folder(&HYDRO_PREPRO)),
        once("series", "series", NodeTemplate::Folder(&HYDRO_SERIES)),
        once("hydro", "hydro.ini", NodeTemplate::Ini(&HYDRO)),
    ],
};

static HYDRO_ALLOCATION_FOLDER: TableShape = TableShape {
    name: "input/hydro/allocation",
    rules: &[each(Each::Areas, "{area}", "{area}.ini", NodeTemplate::Ini(&HYDRO_ALLOCATION))],
};

static HYDRO_COMMON: TableShape = TableShape {
    name: "input/hydro/common",
    rules: &[once("capacity", "capacity", NodeTemplate::Folder(&HYDRO_CAPACITY))],
};

static HYDRO_CAPACITY: TableShape = TableShape {
    name: "input/hydro/common/capacity",
    rules: &[
        each(Each::Areas, "creditmodulations_{area}", "creditmodulations_{area}.txt", NodeTemplate::Matrix),
        each(Each::Areas, "inflowPattern_{area}", "inflowPattern_{area}.txt", NodeTemplate::Matrix),
        each(Each::Areas, "maxpower_{area}", "maxpower_{area}.txt", NodeTemplate::Matrix),
        each(Each::Areas, "reservoir_{area}", "reservoir_{area}.txt", NodeTemplate::Matrix),
        each(Each::Areas, "waterValues_{area}", "waterValues_{area}.txt", NodeTemplate::Matrix),
    ],
};

static HYDRO_PREPRO: TableShape = TableShape {
    name: "input/hydro/prepro",
    rules: &[
        each(Each::Areas, "{area}", "{area}", NodeTemplate::Folder(&HYDRO_PREPRO_AREA)),
        once("correlation", "correlation.ini", NodeTemplate::Ini(&CORRELATION)),
    ],
};

static HYDRO_PREPRO_AREA: TableShape = TableShape {
    name: "input/hydro/prepro/<area>",
    rules: &[
        once("energy", "energy.txt", NodeTemplate::Matrix),
        once("prepro", "prepro.ini", NodeTemplate::Ini(&HYDRO_PREPRO_INI)),
    ],
};

static HYDRO_SERIES: TableShape = TableShape {
    name: "input/hydro/series",
    rules: &[each(Each::Areas, "{area}", "{area}", NodeTemplate::Folder(&HYDRO_SERIES_AREA))],
};

static HYDRO_SERIES_AREA: TableShape = TableShape {
    name: "input/hydro/series/<area>",
    rules: &[
        once("mod", "mod.txt", NodeTemplate::Matrix),
        once("ror", "ror.txt", NodeTemplate::Matrix),
    ],
};

static LINKS: TableShape = TableShape {
    name: "input/links",
    rules: &[each(Each::Areas, "{area}", "{area}", NodeTemplate::Folder(&LINKS_AREA))],
};

static LINKS_AREA: TableShape = TableShape {
    name: "input/links/<area>",
    rules: &[
        once("properties", "properties.ini", NodeTemplate::Ini(&LINK_PROPERTIES)),
        each(Each::Links, "{link}", "{link}.txt", NodeTemplate::Matrix),
    ],
};

static PREPRO_AREA: TableShape = TableShape {
    name: "input/<series>/prepro/<area>",
    rules: &[
        once("conversion", "conversion.txt", NodeTemplate::Matrix),
        once("data", "data.txt", NodeTemplate::Matrix),
        once("k", "k.txt", NodeTemplate::Matrix),
        once("translation", "translation.txt", NodeTemplate::Matrix),
        once("settings", "settings.ini", NodeTemplate::Ini(&UNTYPED)),
    ],
};

static PREPRO: TableShape = TableShape {
    name: "input/<series>/prepro",
    rules: &[
        each(Each::Areas, "{area}", "{area}", NodeTemplate::Folder(&PREPRO_AREA)),
        once("correlation", "correlation.ini", NodeTemplate::Ini(&CORRELATION)),
    ],
};

static LOAD: TableShape = TableShape {
    name: "input/load",
    rules: &[
        once("prepro", "prepro", NodeTemplate::Folder(&PREPRO)),
        once("series", "series", NodeTemplate::Folder(&LOAD_SERIES)),
    ],
};

static LOAD_SERIES: TableShape = TableShape {
    name: "input/load/series",
    rules: &[each(Each::Areas, "load_{area}", "load_{area}.txt", NodeTemplate::Matrix)],
};

static SOLAR: TableShape = TableShape {
    name: "input/solar",
    rules: &[
        once("prepro", "prepro", NodeTemplate::Folder(&PREPRO)),
        once("series", "series", NodeTemplate::Folder(&SOLAR_SERIES)),
    ],
};

static SOLAR_SERIES: TableShape = TableShape {
    name: "input/solar/series",
    rules: &[each(Each::Areas, "solar_{area}", "solar_{area}.txt", NodeTemplate::Matrix)],
};

static WIND: TableShape = TableShape {
    name: "input/wind",
    rules: &[
        once("prepro", "prepro", NodeTemplate::Folder(&PREPRO)),
        once("series", "series", NodeTemplate::Folder(&WIND_SERIES)),
    ],
};

static WIND_SERIES: TableShape = TableShape {
    name: "input/wind/series",
    rules: &[each(Each::Areas, "wind_{area}", "wind_{area}.txt", NodeTemplate::Matrix)],
};

static MISC_GEN: TableShape = TableShape {
    name: "input/misc-gen",
    rules: &[each(Each::Areas, "miscgen-{area}", "miscgen-{area}.txt", NodeTemplate::Matrix)],
};

static RESERVES: TableShape = TableShape {
    name: "input/reserves",
    rules: &[each(Each::Areas, "{area}", "{area}.txt", NodeTemplate::Matrix)],
};

static THERMAL: TableShape = TableShape {
    name: "input/thermal",
    rules: &[
        once("clusters", "clusters", NodeTemplate::Folder(&THERMAL_CLUSTERS)),
        once("prepro", "prepro", NodeTemplate::Folder(&THERMAL_PREPRO)),
        once("series", "series", NodeTemplate::Folder(&THERMAL_SERIES)),
        once("areas", "areas.ini", NodeTemplate::Ini(&THERMAL_AREAS)),
    ],
};

static THERMAL_CLUSTERS: TableShape = TableShape {
    name: "input/thermal/clusters",
    rules: &[each(Each::Areas, "{area}", "{area}", NodeTemplate::Folder(&THERMAL_CLUSTERS_AREA))],
};

static THERMAL_CLUSTERS_AREA: TableShape = TableShape {
    name: "input/thermal/clusters/<area>",
    rules: &[once("list", "list.ini", NodeTemplate::Ini(&THERMAL_LIST))],
};

static THERMAL_PREPRO: TableShape = TableShape {
    name: "input/thermal/prepro",
    rules: &[each(Each::Areas, "{area}", "{area}", NodeTemplate::Folder(&THERMAL_PREPRO_AREA))],
};

static THERMAL_PREPRO_AREA: TableShape = TableShape {
    name: "input/thermal/prepro/<area>",
    rules: &[each(
        Each::Thermals,
        "{cluster}",
        "{cluster}",
        NodeTemplate::Folder(&THERMAL_PREPRO_CLUSTER),
    )],
};

static THERMAL_PREPRO_CLUSTER: TableShape = TableShape {
    name: "input/thermal/prepro/<area>/<cluster>",
    rules: &[
        once("data", "data.txt", NodeTemplate::Matrix),
        once("modulation", "modulation.txt", NodeTemplate::Matrix),
    ],
};

static THERMAL_SERIES: TableShape = TableShape {
    name: "input/thermal/series",
    rules: &[each(Each::Areas, "{area}", "{area}", NodeTemplate::Folder(&THERMAL_SERIES_AREA))],
};

static THERMAL_SERIES_AREA: TableShape = TableShape {
    name: "input/thermal/series/<area>",
    rules: &[each(
        Each::Thermals,
        "{cluster}",
        "{cluster}",
        NodeTemplate::Folder(&THERMAL_SERIES_CLUSTER),
    )],
};

static THERMAL_SERIES_CLUSTER: TableShape = TableShape {
    name: "input/thermal/series/<area>/<cluster>",
    rules: &[once("series", "series.txt", NodeTemplate::Matrix)],
};

// ── Output ──────────────────────────────────────────────────────────────

static OUTPUT: TableShape = TableShape {
    name: "output",
    rules: &[each(Each::Outputs, "{output}", "{output_dir}", NodeTemplate::Folder(&SIMULATION))],
};

static SIMULATION: TableShape = TableShape {
    name: "output/<id>",
    rules: &[
        once("about-the-study", "about-the-study", NodeTemplate::Folder(&ABOUT)),
        once("ts-numbers", "ts-numbers", NodeTemplate::Folder(&TS_NUMBERS)),
        once("annualSystemCost", "annualSystemCost.txt", NodeTemplate::Raw),
        once("checkIntegrity", "checkIntegrity.txt", NodeTemplate::Raw),
        once("simulation-comments", "simulation-comments.txt", NodeTemplate::Raw),
        once("simulation", "simulation.log", NodeTemplate::Raw),
        once("info", "info.antares-output", NodeTemplate::Ini(&INFO_OUTPUT)),
        once("economy", "economy", NodeTemplate::Folder(&MODE)).when(Condition::Economy),
        once("adequacy", "adequacy", NodeTemplate::Folder(&MODE)).when(Condition::Adequacy),
    ],
};

static ABOUT: TableShape = TableShape {
    name: "output/<id>/about-the-study",
    rules: &[
        once("areas", "areas.txt", NodeTemplate::Raw),
        once("comments", "comments.txt", NodeTemplate::Raw),
        once("links", "links.txt", NodeTemplate::Raw),
        once("map", "map", NodeTemplate::Raw),
        once("parameters", "parameters.ini", NodeTemplate::Ini(&GENERALDATA)),
        once("study", "study.ini", NodeTemplate::Ini(&STUDY_ANTARES)),
    ],
};

static TS_NUMBERS: TableShape = TableShape {
    name: "output/<id>/ts-numbers",
    rules: &[
        once("hydro", "hydro", NodeTemplate::Folder(&TS_AREA_FILES)),
        once("load", "load", NodeTemplate::Folder(&TS_AREA_FILES)),
        once("solar", "solar", NodeTemplate::Folder(&TS_AREA_FILES)),
        once("wind", "wind", NodeTemplate::Folder(&TS_AREA_FILES)),
        once("thermal", "thermal", NodeTemplate::Folder(&TS_THERMAL)),
    ],
};

static TS_AREA_FILES: TableShape = TableShape {
    name: "output/<id>/ts-numbers/<series>",
    rules: &[each(Each::Areas, "{area}", "{area}.txt", NodeTemplate::Raw)],
};

static TS_THERMAL: TableShape = TableShape {
    name: "output/<id>/ts-numbers/thermal",
    rules: &[each(Each::Areas, "{area}", "{area}", NodeTemplate::Folder(&TS_THERMAL_AREA))],
};

static TS_THERMAL_AREA: TableShape = TableShape {
    name: "output/<id>/ts-numbers/thermal/<area>",
    rules: &[each(Each::Thermals, "{cluster}", "{cluster}.txt", NodeTemplate::Raw)],
};

static MODE: TableShape = TableShape {
    name: "output/<id>/<mode>",
    rules: &[
        once("mc-ind", "mc-ind", NodeTemplate::Folder(&MC_IND)).when(Condition::ByYear),
        once("mc-all", "mc-all", NodeTemplate::Folder(&MC_ALL)).when(Condition::Synthesis),
    ],
};

static MC_ALL: TableShape = TableShape {
    name: "output/<id>/<mode>/mc-all",
    rules: &[
        once("areas", "areas", NodeTemplate::Folder(&MC_ALL_AREAS)),
        once("grid", "grid", NodeTemplate::Folder(&GRID)),
        once("links", "links", NodeTemplate::Folder(&MC_ALL_LINKS)),
    ],
};

static MC_ALL_AREAS: TableShape = TableShape {
    name: "output/<id>/<mode>/mc-all/areas",
    rules: &[each(Each::Areas, "{area}", "{area}", NodeTemplate::Folder(&MC_ALL_AREA))],
};

static MC_ALL_AREA: TableShape = TableShape {
    name: "output/<id>/<mode>/mc-all/areas/<area>",
    rules: &[
        each(Each::FiltersSynthesis, "details-{timing}", "details-{timing}.txt", NodeTemplate::Raw),
        each(Each::FiltersSynthesis, "id-{timing}", "id-{timing}.txt", NodeTemplate::Raw),
        each(Each::FiltersSynthesis, "values-{timing}", "values-{timing}.txt", NodeTemplate::Raw),
    ],
};

static GRID: TableShape = TableShape {
    name: "output/<id>/<mode>/mc-all/grid",
    rules: &[
        once("areas", "areas.txt", NodeTemplate::Raw),
        once("digest", "digest.txt", NodeTemplate::Raw),
        once("links", "links.txt", NodeTemplate::Raw),
        once("thermals", "thermals.txt", NodeTemplate::Raw),
    ],
};

static MC_ALL_LINKS: TableShape = TableShape {
    name: "output/<id>/<mode>/mc-all/links",
    rules: &[each(Each::Areas, "{area}", ".", NodeTemplate::Folder(&MC_ALL_LINKS_AREA))],
};

static MC_ALL_LINKS_AREA: TableShape = TableShape {
    name: "output/<id>/<mode>/mc-all/links/<area>",
    rules: &[each(Each::Links, "{link}", "{area} - {link}", NodeTemplate::Folder(&MC_ALL_LINK))],
};

static MC_ALL_LINK: TableShape = TableShape {
    name: "output/<id>/<mode>/mc-all/links/<area>/<link>",
    rules: &[each(
        Each::FiltersSynthesis,
        "values-{timing}",
        "values-{timing}.txt",
        NodeTemplate::Raw,
    )],
};

static MC_IND: TableShape = TableShape {
    name: "output/<id>/<mode>/mc-ind",
    rules: &[each(Each::Years, "{year}", "{year}", NodeTemplate::Folder(&MC_IND_YEAR))],
};

static MC_IND_YEAR: TableShape = TableShape {
    name: "output/<id>/<mode>/mc-ind/<year>",
    rules: &[
        once("areas", "areas", NodeTemplate::Folder(&MC_IND_AREAS)),
        once("links", "links", NodeTemplate::Folder(&MC_IND_LINKS)),
    ],
};

static MC_IND_AREAS: TableShape = TableShape {
    name: "output/<id>/<mode>/mc-ind/<year>/areas",
    rules: &[each(Each::Areas, "{area}", "{area}", NodeTemplate::Folder(&MC_IND_AREA))],
};

static MC_IND_AREA: TableShape = TableShape {
    name: "output/<id>/<mode>/mc-ind/<year>/areas/<area>",
    rules: &[
        each(Each::FiltersYear, "details-{timing}", "details-{timing}.txt", NodeTemplate::Raw),
        each(Each::FiltersYear, "values-{timing}", "values-{timing}.txt", NodeTemplate::Raw),
    ],
};

static MC_IND_LINKS: TableShape = TableShape {
    name: "output/<id>/<mode>/mc-ind/<year>/links",
    rules: &[each(Each::Areas, "{area}", ".", NodeTemplate::Folder(&MC_IND_LINKS_AREA))],
};

static MC_IND_LINKS_AREA: TableShape = TableShape {
    name: "output/<id>/<mode>/mc-ind/<year>/links/<area>",
    rules: &[each(Each::Links, "{link}", "{area} - {link}", NodeTemplate::Folder(&MC_IND_LINK))],
};

static MC_IND_LINK: TableShape = TableShape {
    name: "output/<id>/<mode>/mc-ind/<year>/links/<area>/<link>",
    rules: &[each(Each::FiltersYear, "values-{timing}", "values-{timing}.txt", NodeTemplate::Raw)],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Area, Inventory, Link};
    use crate::tree::TreeNode;
    use indexmap::IndexMap;
    use st_common::OutputName;
    use std::collections::BTreeMap;

    fn config() -> StudyConfig {
        let mut links = IndexMap::new();
        links.insert(
            AreaId::new("fr"),
            Link {
                filters_synthesis: vec!["hourly".into()],
                filters_year: vec!["annual".into()],
            },
        );
        let mut areas = IndexMap::new();
        areas.insert(
            AreaId::new("de"),
            Area {
                links,
                thermals: vec!["gas".into()],
                filters_synthesis: vec!["daily".into(), "annual".into()],
                filters_year: vec!["annual".into()],
            },
        );
        areas.insert(AreaId::new("fr"), Area::default());
        let mut outputs = BTreeMap::new();
        outputs.insert(
            OutputId(1),
            Simulation {
                name: OutputName::parse("20201014-1422eco-hello").unwrap(),
                nbyears: 2,
                by_year: true,
                synthesis: false,
            },
        );
        StudyConfig::new("/study", Inventory { areas, outputs })
    }

    fn keys(children: &Children) -> Vec<&str> {
        children.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_render_placeholders() {
        let config = config();
        let bindings = Bindings {
            area: Some(AreaId::new("de")),
            link: Some(AreaId::new("fr")),
            output: Some(OutputId(1)),
            year: Some(7),
            ..Bindings::default()
        };
        assert_eq!(render("{area} - {link}", &bindings, &config).unwrap(), "de - fr");
        assert_eq!(render("{year}", &bindings, &config).unwrap(), "00007");
        assert_eq!(
            render("{output_dir}", &bindings, &config).unwrap(),
            "20201014-1422eco-hello"
        );
        assert!(render("{cluster}", &bindings, &config).is_err());
        assert!(render("{area", &bindings, &config).is_err());
    }

    #[test]
    fn test_root_children_in_order() {
        let children = build(&STUDY, &config(), &Address::root(), &Bindings::default(), None).unwrap();
        assert_eq!(
            keys(&children),
            vec!["Desktop", "study", "settings", "layers", "logs", "input", "output"]
        );
    }

    #[test]
    fn test_fixed_and_per_area_children() {
        let config = config().next("input").next("areas");
        let children = build(
            &INPUT_AREAS,
            &config,
            &Address::parse("input/areas"),
            &Bindings::default(),
            None,
        )
        .unwrap();
        assert_eq!(keys(&children), vec!["list", "sets", "de", "fr"]);
        assert_eq!(children["fr"].config().path(), Path::new("/study/input/areas/fr"));
    }

    #[test]
    fn test_simulation_conditions() {
        let config = config().next("output").next("20201014-1422eco-hello");
        let bindings = Bindings {
            output: Some(OutputId(1)),
            ..Bindings::default()
        };
        let children = build(&SIMULATION, &config, &Address::parse("output/1"), &bindings, None).unwrap();
        assert!(children.contains_key("economy"));
        assert!(!children.contains_key("adequacy"));

        let mode = build(&MODE, &config.next("economy"), &Address::parse("output/1/economy"), &bindings, None)
            .unwrap();
        assert_eq!(keys(&mode), vec!["mc-ind"]);

        let years = build(&MC_IND, &config.next("economy").next("mc-ind"), &Address::root(), &bindings, None)
            .unwrap();
        assert_eq!(keys(&years), vec!["00001", "00002"]);
    }

    #[test]
    fn test_link_folders_share_parent_directory() {
        let bindings = Bindings {
            output: Some(OutputId(1)),
            area: Some(AreaId::new("de")),
            ..Bindings::default()
        };
        let links_dir = config().next("links");
        let children = build(&MC_ALL_LINKS_AREA, &links_dir, &Address::root(), &bindings, None).unwrap();
        assert_eq!(children["fr"].config().path(), Path::new("/study/links/de - fr"));

        let link_bindings = Bindings {
            link: Some(AreaId::new("fr")),
            ..bindings
        };
        let files = build(&MC_ALL_LINK, &links_dir, &Address::root(), &link_bindings, None).unwrap();
        assert_eq!(keys(&files), vec!["values-hourly"]);
    }

    #[test]
    fn test_area_filters_expand() {
        let bindings = Bindings {
            area: Some(AreaId::new("de")),
            ..Bindings::default()
        };
        let children = build(&MC_ALL_AREA, &config(), &Address::root(), &bindings, None).unwrap();
        assert_eq!(
            keys(&children),
            vec![
                "details-daily",
                "details-annual",
                "id-daily",
                "id-annual",
                "values-daily",
                "values-annual"
            ]
        );
    }

    #[test]
    fn test_rule_without_binding_fails() {
        let err = build(&MC_IND, &config(), &Address::root(), &Bindings::default(), None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
