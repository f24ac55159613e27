//! Schema-driven resolution, fallbacks and validation.

mod support;

use serde_json::{json, Value};
use st_core::descriptor::Inventory;
use st_core::{Address, Depth, Error, SchemaDocument, Study, StudyConfig};
use std::fs;
use std::sync::Arc;

fn schema(value: Value) -> Arc<SchemaDocument> {
    Arc::new(SchemaDocument::new(value))
}

fn generic_schema() -> Arc<SchemaDocument> {
    schema(json!({
        "type": "object",
        "properties": {
            "settings": {
                "type": "object",
                "properties": {
                    "generaldata": {
                        "type": "object",
                        "rte-metadata": {"filename": "generaldata.ini"},
                        "properties": {
                            "general": {
                                "type": "object",
                                "properties": {
                                    "mode": {"type": "string", "enum": ["Economy", "Adequacy"]},
                                    "nbyears": {"type": "integer", "minimum": 1}
                                }
                            }
                        }
                    }
                }
            },
            "series": {
                "type": "object",
                "additionalProperties": {"type": "array"}
            }
        }
    }))
}

fn generic_study() -> (tempfile::TempDir, Study) {
    let dir = tempfile::tempdir().expect("tempdir");
    support::write(dir.path(), "settings/generaldata.ini", "[general]\nmode = Economy\nnbyears = 2\n");
    support::write(dir.path(), "series/load_fr.txt", "1\n");
    support::write(dir.path(), "series/wind_fr.txt", "2\t3\n");
    let config = StudyConfig::new(dir.path(), Inventory::default());
    let study = Study::from_schema(config, generic_schema()).expect("study");
    (dir, study)
}

#[test]
fn schema_alone_resolves_the_tree() {
    let (_dir, study) = generic_study();
    let doc = study.get(&Address::root(), Depth::Unbounded).unwrap();
    assert_eq!(
        doc,
        json!({
            "settings": {"generaldata": {"general": {"mode": "Economy", "nbyears": 2}}},
            "series": {"load_fr": [[1]], "wind_fr": [[2, 3]]}
        })
    );
    study.validate(&doc, &Address::root()).unwrap();
}

#[test]
fn schema_typed_ini_accepts_writes() {
    let (dir, study) = generic_study();
    let address = Address::parse("settings/generaldata/general/nbyears");
    study.save(json!(7), &address).unwrap();
    assert_eq!(study.get(&address, Depth::Unbounded).unwrap(), json!(7));
    let text = fs::read_to_string(dir.path().join("settings/generaldata.ini")).unwrap();
    assert!(text.contains("nbyears = 7"));
}

#[test]
fn new_dynamic_entries_appear_on_next_read() {
    let (dir, study) = generic_study();
    support::write(dir.path(), "series/solar_fr.txt", "4\n");
    let series = study.get(&Address::parse("series"), Depth::Levels(0)).unwrap();
    let keys: Vec<&str> = series.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["load_fr", "solar_fr", "wind_fr"]);
}

#[test]
fn validation_reports_the_offending_path() {
    let (_dir, study) = generic_study();
    let err = study
        .validate(&json!(0), &Address::parse("settings/generaldata/general/nbyears"))
        .unwrap_err();
    match err {
        Error::SchemaValidation { path, .. } => {
            assert_eq!(path, "/settings/generaldata/general/nbyears")
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = study
        .validate(
            &json!({"mode": "Draft"}),
            &Address::parse("settings/generaldata/general"),
        )
        .unwrap_err();
    assert!(matches!(err, Error::SchemaValidation { .. }));
}

#[test]
fn shapeless_schema_is_rejected_on_read() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = StudyConfig::new(dir.path(), Inventory::default());
    let study = Study::from_schema(config, schema(json!({"type": "object"}))).unwrap();
    let err = study.get(&Address::root(), Depth::Unbounded).unwrap_err();
    assert!(matches!(err, Error::UnsupportedSchemaShape { .. }));
}

#[test]
fn table_folders_fall_back_to_schema_properties() {
    let dir = tempfile::tempdir().expect("tempdir");
    support::mini_study(dir.path());
    support::write(dir.path(), "settings/user.ini", "[main]\nlevel = 3\n");

    let doc = schema(json!({
        "properties": {
            "settings": {
                "type": "object",
                "properties": {
                    "user": {
                        "type": "object",
                        "properties": {
                            "main": {
                                "type": "object",
                                "properties": {"level": {"type": "integer", "minimum": 1}}
                            }
                        }
                    }
                }
            }
        }
    }));
    let config = StudyConfig::from_path(dir.path()).unwrap();
    let study = Study::with_schema(config, doc).unwrap();

    let level = Address::parse("settings/user/main/level");
    assert_eq!(study.get(&level, Depth::Unbounded).unwrap(), json!(3));

    // Table children are unaffected.
    let nbyears = Address::parse("settings/generaldata/general/nbyears");
    assert_eq!(study.get(&nbyears, Depth::Unbounded).unwrap(), json!(1));

    assert!(study.validate(&json!(0), &level).is_err());
    // No schema constrains the layout-only parts.
    study.validate(&json!(12), &nbyears).unwrap();
}
