//! End-to-end reads and writes through the study layout.

mod support;

use proptest::prelude::*;
use serde_json::{json, Value};
use st_core::tree::BuildScope;
use st_core::{Address, Depth, Error, PathResolver, Study, StudyConfig};
use std::fs;

fn open_mini() -> (tempfile::TempDir, Study) {
    let dir = tempfile::tempdir().expect("tempdir");
    support::mini_study(dir.path());
    let study = Study::open(dir.path()).expect("open study");
    (dir, study)
}

#[test]
fn full_get_exposes_every_codec() {
    let (_dir, study) = open_mini();
    let doc = study.get(&Address::root(), Depth::Unbounded).unwrap();

    assert_eq!(doc["settings"]["generaldata"]["general"]["nbyears"], json!(1));
    assert_eq!(doc["settings"]["generaldata"]["general"]["year-by-year"], json!(false));
    assert_eq!(doc["input"]["areas"]["list"], json!("file/input/areas/list.txt"));
    assert_eq!(
        doc["input"]["areas"]["fr"]["optimization"]["nodal optimization"]["spread-unsupplied-energy-cost"],
        json!(0.5)
    );
    assert_eq!(
        doc["input"]["hydro"]["common"]["capacity"]["maxpower_fr"],
        json!([[1, 2], [3, 4]])
    );
    assert_eq!(doc["input"]["hydro"]["allocation"]["fr"]["[allocation]"]["fr"], json!(1));
    assert_eq!(doc["input"]["load"]["series"]["load_fr"], json!([[10], [20]]));
    assert_eq!(doc["logs"]["solver"], json!("file/logs/solver.log"));
    assert_eq!(doc["settings"]["scenariobuilder"], json!({}));

    let simulation = &doc["output"]["1"];
    assert_eq!(simulation["info"]["general"]["name"], json!("hello"));
    assert!(simulation.get("adequacy").is_none());
    assert_eq!(
        simulation["economy"]["mc-ind"]["00001"]["areas"]["fr"]["values-annual"],
        json!(format!("file/output/{}/economy/mc-ind/00001/areas/fr/values-annual.txt", support::OUTPUT_DIR))
    );
    assert_eq!(simulation["economy"]["mc-all"]["links"]["fr"], json!({}));
}

#[test]
fn root_keys_follow_layout_order() {
    let (_dir, study) = open_mini();
    let doc = study.get(&Address::root(), Depth::Levels(0)).unwrap();
    let keys: Vec<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["Desktop", "study", "settings", "layers", "logs", "input", "output"]
    );
    assert!(doc.as_object().unwrap().values().all(|v| *v == json!({})));
}

#[test]
fn depth_one_renders_sections_and_leaves() {
    let (_dir, study) = open_mini();
    let settings = study.get(&Address::parse("settings"), Depth::Levels(1)).unwrap();
    assert_eq!(
        settings,
        json!({
            "generaldata": {"general": {}, "output": {}},
            "resources": {"study": "file/settings/resources/study.ico"},
            "simulations": {},
            "comments": "file/settings/comments.txt",
            "scenariobuilder": {}
        })
    );
}

#[test]
fn sections_and_scalars_are_addressable() {
    let (_dir, study) = open_mini();
    let nbyears = study
        .get(&Address::parse("settings/generaldata/general/nbyears"), Depth::Unbounded)
        .unwrap();
    assert_eq!(nbyears, json!(1));

    let antares = study.get(&Address::parse("study/antares"), Depth::Levels(0)).unwrap();
    assert_eq!(antares["version"], json!(800));
    assert_eq!(antares["caption"], json!("mini"));
}

#[test]
fn unknown_segments_are_reported_with_their_parent() {
    let (_dir, study) = open_mini();
    let err = study
        .get(&Address::parse("settings/nope"), Depth::Unbounded)
        .unwrap_err();
    match err {
        Error::UnknownAddressSegment { address, segment } => {
            assert_eq!(address, "settings");
            assert_eq!(segment, "nope");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = study
        .get(&Address::parse("settings/generaldata/general/missing"), Depth::Unbounded)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownAddressSegment { .. }));
}

#[test]
fn leaves_reject_deeper_addresses() {
    let (_dir, study) = open_mini();
    for address in [
        "settings/comments/deeper",
        "settings/generaldata/general/nbyears/x",
        "input/hydro/common/capacity/maxpower_fr/0",
    ] {
        let err = study.get(&Address::parse(address), Depth::Unbounded).unwrap_err();
        assert!(
            matches!(err, Error::AddressNotFullyConsumed { .. }),
            "{address}: {err}"
        );
    }
}

#[test]
fn folder_writes_need_a_child_address() {
    let (_dir, study) = open_mini();
    let err = study.save(json!({}), &Address::parse("settings")).unwrap_err();
    assert!(matches!(err, Error::CompositeWriteRequiresAddress { .. }));
}

#[test]
fn scalar_write_merges_into_ini() {
    let (dir, study) = open_mini();
    let address = Address::parse("settings/generaldata/general/nbyears");
    study.save(json!(5), &address).unwrap();

    assert_eq!(study.get(&address, Depth::Unbounded).unwrap(), json!(5));
    let text = fs::read_to_string(dir.path().join("settings/generaldata.ini")).unwrap();
    assert!(text.contains("nbyears = 5"));
    assert!(text.contains("mode = Economy"));
    assert!(text.contains("[output]"));
}

#[test]
fn mistyped_scalar_write_leaves_file_untouched() {
    let (dir, study) = open_mini();
    let path = dir.path().join("settings/generaldata.ini");
    let before = fs::read_to_string(&path).unwrap();

    let err = study
        .save(json!("many"), &Address::parse("settings/generaldata/general/nbyears"))
        .unwrap_err();
    assert!(matches!(err, Error::TypeCoercion { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn section_write_replaces_section() {
    let (_dir, study) = open_mini();
    let address = Address::parse("input/areas/fr/ui/ui");
    study
        .save(json!({"x": 12, "y": -3, "layers": "0 1"}), &address)
        .unwrap();
    assert_eq!(
        study.get(&address, Depth::Unbounded).unwrap(),
        json!({"x": 12, "y": -3, "layers": "0 1"})
    );
}

#[test]
fn matrix_write_round_trips() {
    let (_dir, study) = open_mini();
    let address = Address::parse("input/load/series/load_fr");
    let matrix = json!([[1.5, 2], [3, 4]]);
    study.save(matrix.clone(), &address).unwrap();
    assert_eq!(study.get(&address, Depth::Unbounded).unwrap(), matrix);
}

#[test]
fn raw_write_copies_referenced_file() {
    let (dir, study) = open_mini();
    study
        .save(json!("file/settings/comments.txt"), &Address::parse("logs/solver"))
        .unwrap();
    let copied = fs::read_to_string(dir.path().join("logs/solver.log")).unwrap();
    assert_eq!(copied, "first study\n");
}

#[test]
fn addressed_get_builds_only_the_path() {
    let (_dir, study) = open_mini();
    let mut scope = BuildScope::new();
    study
        .get_in(
            &mut scope,
            &Address::parse("settings/generaldata/general"),
            Depth::Unbounded,
        )
        .unwrap();
    // Root and settings; nothing under input or output.
    assert_eq!(scope.builds(), 2);
}

#[test]
fn descriptor_rebuilds_from_document() {
    let (dir, study) = open_mini();
    let doc = study.get(&Address::root(), Depth::Unbounded).unwrap();
    let rebuilt = StudyConfig::from_json(&doc, dir.path()).unwrap();
    assert_eq!(rebuilt.area_ids(), study.config().area_ids());
    assert_eq!(rebuilt.output_ids(), study.config().output_ids());
    assert_eq!(
        rebuilt.filters_synthesis(&"fr".into(), None),
        vec!["annual".to_string()]
    );
}

const ADDRESSES: &[&str] = &[
    "",
    "settings",
    "settings/generaldata",
    "input/areas",
    "input/hydro",
    "output",
    "output/1/economy",
];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn bounded_get_is_truncated_full_get(index in 0..ADDRESSES.len(), depth in -1i64..4) {
        let (_dir, study) = open_mini();
        let address = Address::parse(ADDRESSES[index]);
        let depth = Depth::from_i64(depth);

        let full: Value = study.get(&address, Depth::Unbounded).unwrap();
        let bounded = study.get(&address, depth).unwrap();
        prop_assert_eq!(bounded, PathResolver::truncate(&full, depth));
    }
}
