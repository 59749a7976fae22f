use crate::literal::Literal;
use crate::model::{
    Costume, Entity, Project, RotationStyle, VarEntry, DEFAULT_DIRECTION, DEFAULT_SIZE,
};
use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::ZipArchive;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read '{}'.", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("'{}' is not a valid zip/.sb3 file.", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("project.json not found in '{}'.", .path.display())]
    MissingProjectJson { path: PathBuf },
    #[error("Invalid project.json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid project.json: missing 'targets' array.")]
    MissingTargets,
    #[error("Target #{index} missing '{field}'.")]
    MissingTargetField { index: usize, field: &'static str },
    #[error("Project can only define one stage (found '{first}' and '{second}').")]
    DuplicateStage { first: String, second: String },
    #[error("Target '{target}' has malformed {kind} entry '{id}'.")]
    MalformedEntry {
        target: String,
        kind: &'static str,
        id: String,
    },
}

/// Loads a project from an `.sb3` archive, or from a bare `project.json` when the
/// file has a `.json` extension.
pub fn load_project(input: &Path) -> Result<Project, LoadError> {
    let is_json = input
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let json_text = if is_json {
        fs::read_to_string(input).map_err(|source| LoadError::Io {
            path: input.to_path_buf(),
            source,
        })?
    } else {
        read_project_json(input)?
    };
    parse_project_json(&json_text)
}

fn read_project_json(input: &Path) -> Result<String, LoadError> {
    let io_err = |source| LoadError::Io {
        path: input.to_path_buf(),
        source,
    };
    let file = fs::File::open(input).map_err(io_err)?;
    let mut zip = ZipArchive::new(file).map_err(|source| LoadError::Archive {
        path: input.to_path_buf(),
        source,
    })?;
    let mut entry = zip
        .by_name("project.json")
        .map_err(|_| LoadError::MissingProjectJson {
            path: input.to_path_buf(),
        })?;
    let mut text = String::new();
    entry.read_to_string(&mut text).map_err(io_err)?;
    Ok(text)
}

pub fn parse_project_json(text: &str) -> Result<Project, LoadError> {
    let root: Value = serde_json::from_str(text)?;
    let targets = root
        .get("targets")
        .and_then(Value::as_array)
        .ok_or(LoadError::MissingTargets)?;

    let mut stage: Option<Entity> = None;
    let mut sprites = Vec::new();
    for (index, target) in targets.iter().enumerate() {
        let entity = read_target(index, target)?;
        if entity.is_stage {
            if let Some(first) = &stage {
                return Err(LoadError::DuplicateStage {
                    first: first.name.clone(),
                    second: entity.name,
                });
            }
            stage = Some(entity);
        } else {
            let layer = target
                .get("layerOrder")
                .and_then(Value::as_i64)
                .unwrap_or(i64::MAX);
            sprites.push((layer, entity));
        }
    }

    // Stable: sprites without a layerOrder keep file order after the ordered ones.
    sprites.sort_by_key(|(layer, _)| *layer);
    let targets = stage
        .into_iter()
        .chain(sprites.into_iter().map(|(_, entity)| entity))
        .collect();
    Ok(Project::new(targets))
}

fn read_target(index: usize, target: &Value) -> Result<Entity, LoadError> {
    let name = target
        .get("name")
        .and_then(Value::as_str)
        .ok_or(LoadError::MissingTargetField { index, field: "name" })?
        .to_string();
    let is_stage = target
        .get("isStage")
        .and_then(Value::as_bool)
        .ok_or(LoadError::MissingTargetField {
            index,
            field: "isStage",
        })?;
    debug!("reading target '{}' (stage: {})", name, is_stage);

    let num = |key: &str, default: f64| {
        target
            .get(key)
            .and_then(Value::as_f64)
            .unwrap_or(default)
    };

    let rotation_style = match target.get("rotationStyle").and_then(Value::as_str) {
        None => RotationStyle::AllAround,
        Some(raw) => RotationStyle::parse(raw).unwrap_or_else(|| {
            warn!(
                "target '{}' has unknown rotation style '{}', using \"all around\"",
                name, raw
            );
            RotationStyle::AllAround
        }),
    };

    let current_costume = target
        .get("currentCostume")
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .map_or(1, |n| n.saturating_add(1));

    let mut variables = IndexMap::new();
    read_variables(&name, target.get("variables"), &mut variables)?;
    read_lists(&name, target.get("lists"), &mut variables)?;

    Ok(Entity {
        x: num("x", 0.0),
        y: num("y", 0.0),
        direction: num("direction", DEFAULT_DIRECTION),
        visible: target.get("visible").map(truthy).unwrap_or(true),
        size: num("size", DEFAULT_SIZE),
        costumes: read_costumes(&name, target.get("costumes")),
        current_costume,
        rotation_style,
        variables,
        is_stage,
        name,
    })
}

fn read_variables(
    target: &str,
    node: Option<&Value>,
    out: &mut IndexMap<String, VarEntry>,
) -> Result<(), LoadError> {
    let Some(obj) = node.and_then(Value::as_object) else {
        return Ok(());
    };
    for (id, decl) in obj {
        let (name, value) = decl_parts(target, "variable", id, decl)?;
        let value = scalar_literal(target, name, value);
        out.insert(id.clone(), VarEntry::scalar(name, value));
    }
    Ok(())
}

fn read_lists(
    target: &str,
    node: Option<&Value>,
    out: &mut IndexMap<String, VarEntry>,
) -> Result<(), LoadError> {
    let Some(obj) = node.and_then(Value::as_object) else {
        return Ok(());
    };
    for (id, decl) in obj {
        let (name, value) = decl_parts(target, "list", id, decl)?;
        let items = value
            .as_array()
            .ok_or_else(|| malformed(target, "list", id))?
            .iter()
            .map(|item| scalar_literal(target, name, item))
            .collect();
        out.insert(id.clone(), VarEntry::list(name, items));
    }
    Ok(())
}

fn decl_parts<'a>(
    target: &str,
    kind: &'static str,
    id: &str,
    decl: &'a Value,
) -> Result<(&'a str, &'a Value), LoadError> {
    let arr = decl.as_array().ok_or_else(|| malformed(target, kind, id))?;
    let name = arr
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(target, kind, id))?;
    let value = arr.get(1).ok_or_else(|| malformed(target, kind, id))?;
    Ok((name, value))
}

fn malformed(target: &str, kind: &'static str, id: &str) -> LoadError {
    LoadError::MalformedEntry {
        target: target.to_string(),
        kind,
        id: id.to_string(),
    }
}

fn scalar_literal(target: &str, owner: &str, value: &Value) -> Literal {
    match value {
        Value::Number(n) => Literal::Number(n.as_f64().unwrap_or(0.0)),
        Value::String(s) => Literal::Text(s.clone()),
        Value::Bool(b) => Literal::Bool(*b),
        Value::Null => {
            warn!("target '{}': '{}' holds null, using 0", target, owner);
            Literal::Number(0.0)
        }
        other => {
            warn!(
                "target '{}': '{}' holds a nested value, using its text form",
                target, owner
            );
            Literal::Text(other.to_string())
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn read_costumes(target: &str, node: Option<&Value>) -> Vec<Costume> {
    let Some(arr) = node.and_then(Value::as_array) else {
        return Vec::new();
    };
    arr.iter()
        .enumerate()
        .filter_map(|(idx, costume)| {
            let obj = costume.as_object();
            if obj.is_none() {
                warn!("target '{}': skipping costume #{} (not an object)", target, idx);
            }
            obj
        })
        .map(read_costume)
        .collect()
}

fn read_costume(costume: &Map<String, Value>) -> Costume {
    let text = |key: &str| {
        costume
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let num = |key: &str, default: f64| {
        costume
            .get(key)
            .and_then(Value::as_f64)
            .unwrap_or(default)
    };

    let asset_id = text("assetId");
    let data_format = text("dataFormat");
    let md5 = costume
        .get("md5ext")
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .unwrap_or_else(|| format!("{}.{}", asset_id, data_format));
    Costume {
        name: text("name"),
        bitmap_resolution: num("bitmapResolution", 1.0),
        rotation_center_x: num("rotationCenterX", 0.0),
        rotation_center_y: num("rotationCenterY", 0.0),
        asset_id,
        md5,
        data_format,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::emit_entity;
    use crate::model::{Runtime, VarKind};

    const PROJECT: &str = r#"{
        "targets": [
            {
                "isStage": false,
                "name": "Cat",
                "variables": {"v1": ["score", 10]},
                "lists": {"l1": ["items", ["a", 2, true]]},
                "costumes": [
                    {"assetId": "abc", "name": "c1", "dataFormat": "svg",
                     "rotationCenterX": 47, "rotationCenterY": 55}
                ],
                "currentCostume": 0,
                "x": 11, "y": -12.5, "direction": 90, "size": 100,
                "visible": true, "rotationStyle": "left-right", "layerOrder": 2
            },
            {
                "isStage": true,
                "name": "Stage",
                "variables": {"g1": ["my variable", 0], "g0": ["cloud", "x", true]},
                "lists": {},
                "costumes": [],
                "currentCostume": 0
            },
            {
                "isStage": false,
                "name": "Dog",
                "variables": {},
                "lists": {},
                "layerOrder": 1,
                "currentCostume": 3,
                "visible": false
            }
        ]
    }"#;

    #[test]
    fn reads_targets_in_layer_order() {
        let project = parse_project_json(PROJECT).unwrap();
        let names = project.targets.iter().map(|t| t.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["Stage", "Dog", "Cat"]);
    }

    #[test]
    fn reads_sprite_state() {
        let project = parse_project_json(PROJECT).unwrap();
        let cat = project.find_target("Cat").unwrap();
        assert_eq!(cat.x, 11.0);
        assert_eq!(cat.y, -12.5);
        assert_eq!(cat.current_costume, 1);
        assert_eq!(cat.rotation_style, RotationStyle::LeftRight);
        assert_eq!(cat.costumes[0].md5, "abc.svg");
        assert_eq!(cat.costumes[0].bitmap_resolution, 1.0);
        assert_eq!(
            cat.lookup("l1"),
            Some(&VarEntry::list(
                "items",
                vec![Literal::from("a"), Literal::from(2i64), Literal::from(true)]
            ))
        );

        let dog = project.find_target("Dog").unwrap();
        assert_eq!(dog.current_costume, 4);
        assert!(!dog.visible);
        assert_eq!(dog.direction, DEFAULT_DIRECTION);
    }

    #[test]
    fn variables_keep_file_order() {
        let project = parse_project_json(PROJECT).unwrap();
        let stage = project.stage().unwrap();
        let ids = stage.variables.keys().cloned().collect::<Vec<_>>();
        assert_eq!(ids, ["g1", "g0"]);
        assert_eq!(stage.entries_of(VarKind::Scalar).count(), 2);
    }

    #[test]
    fn rejects_missing_targets_and_second_stage() {
        assert!(matches!(
            parse_project_json("{}"),
            Err(LoadError::MissingTargets)
        ));
        let two_stages = r#"{"targets": [
            {"isStage": true, "name": "A"},
            {"isStage": true, "name": "B"}
        ]}"#;
        assert!(matches!(
            parse_project_json(two_stages),
            Err(LoadError::DuplicateStage { .. })
        ));
    }

    #[test]
    fn rejects_malformed_entries() {
        let bad = r#"{"targets": [
            {"isStage": true, "name": "Stage", "lists": {"l": ["items", 5]}}
        ]}"#;
        let err = parse_project_json(bad).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Target 'Stage' has malformed list entry 'l'."
        );
        let nameless = r#"{"targets": [{"isStage": true}]}"#;
        assert!(matches!(
            parse_project_json(nameless),
            Err(LoadError::MissingTargetField { index: 0, field: "name" })
        ));
    }

    #[test]
    fn unknown_rotation_style_falls_back() {
        let json = r#"{"targets": [
            {"isStage": false, "name": "S", "rotationStyle": "spin"}
        ]}"#;
        let project = parse_project_json(json).unwrap();
        assert_eq!(project.targets[0].rotation_style, RotationStyle::AllAround);
    }

    #[test]
    fn oversized_costume_index_saturates() {
        let json = r#"{"targets": [
            {"isStage": false, "name": "A", "currentCostume": 18446744073709551615}
        ]}"#;
        let project = parse_project_json(json).unwrap();
        let sprite = &project.targets[0];
        if cfg!(target_pointer_width = "64") {
            assert_eq!(sprite.current_costume, usize::MAX);
        } else {
            assert_eq!(sprite.current_costume, 1);
        }
        assert!(emit_entity(sprite).starts_with("Sprite.new(\"A\""));
    }

    #[test]
    fn visibility_is_coerced_to_bool() {
        let json = r#"{"targets": [
            {"isStage": false, "name": "Zero", "visible": 0},
            {"isStage": false, "name": "Word", "visible": "yes"},
            {"isStage": false, "name": "Empty", "visible": ""},
            {"isStage": false, "name": "Nothing", "visible": null}
        ]}"#;
        let project = parse_project_json(json).unwrap();
        let visible = |name: &str| project.find_target(name).unwrap().visible;
        assert!(!visible("Zero"));
        assert!(visible("Word"));
        assert!(!visible("Empty"));
        assert!(!visible("Nothing"));

        assert_eq!(
            emit_entity(project.find_target("Zero").unwrap()),
            "Sprite.new(\"Zero\",\n           visible: false)"
        );
        assert_eq!(
            emit_entity(project.find_target("Word").unwrap()),
            "Sprite.new(\"Word\")"
        );
    }

    #[test]
    fn null_and_nested_values_are_coerced() {
        let json = r#"{"targets": [
            {
                "isStage": true,
                "name": "Stage",
                "variables": {"n": ["nothing", null], "o": ["obj", {"k": 1}]},
                "lists": {"l": ["nested", [[1, 2]]]}
            }
        ]}"#;
        let project = parse_project_json(json).unwrap();
        let stage = project.stage().unwrap();
        assert_eq!(stage.lookup("n"), Some(&VarEntry::scalar("nothing", 0.0)));
        assert_eq!(stage.lookup("o"), Some(&VarEntry::scalar("obj", r#"{"k":1}"#)));
        assert_eq!(
            stage.lookup("l"),
            Some(&VarEntry::list("nested", vec![Literal::from("[1,2]")]))
        );

        let expected = r#"Stage.new("Stage",
          variables: [
            {
              name: "nothing"
            },
            {
              name: "obj",
              value: "{\"k\":1}"
            }
          ],
          lists: [
            {
              name: "nested",
              value: ["[1,2]"]
            }
          ])"#;
        assert_eq!(emit_entity(stage), expected);
    }

    #[test]
    fn non_object_costumes_are_skipped() {
        let json = r#"{"targets": [
            {"isStage": false, "name": "S", "costumes": [
                "bogus",
                {"assetId": "abc", "name": "c1", "md5ext": "abc.png", "dataFormat": "png"},
                7
            ]}
        ]}"#;
        let project = parse_project_json(json).unwrap();
        let costumes = &project.targets[0].costumes;
        assert_eq!(costumes.len(), 1);
        assert_eq!(costumes[0].md5, "abc.png");
    }
}
