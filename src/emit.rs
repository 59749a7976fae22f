use crate::literal::{format_num, quote_str, serialize_scalar, serialize_sequence};
use crate::model::{
    Costume, Entity, Project, RotationStyle, Runtime, VarEntry, VarKind, DEFAULT_DIRECTION,
    DEFAULT_SIZE,
};
use anyhow::{anyhow, Result};
use log::debug;

const NESTED_INDENT: usize = 2;

/// Argument tree for the constructor call. Inline values are already rendered;
/// arrays and records always break across lines.
#[derive(Debug, Clone)]
enum Node {
    Inline(String),
    Array(Vec<Node>),
    Record(Vec<(&'static str, Node)>),
}

impl Node {
    fn render(&self, indent: usize, out: &mut String) {
        match self {
            Node::Inline(text) => out.push_str(text),
            Node::Array(items) => {
                if items.is_empty() {
                    out.push_str("[]");
                    return;
                }
                out.push_str("[\n");
                for (idx, item) in items.iter().enumerate() {
                    out.push_str(&spaces(indent + NESTED_INDENT));
                    item.render(indent + NESTED_INDENT, out);
                    if idx + 1 < items.len() {
                        out.push(',');
                    }
                    out.push('\n');
                }
                out.push_str(&spaces(indent));
                out.push(']');
            }
            Node::Record(fields) => {
                out.push_str("{\n");
                for (idx, (key, value)) in fields.iter().enumerate() {
                    out.push_str(&spaces(indent + NESTED_INDENT));
                    out.push_str(key);
                    out.push_str(": ");
                    value.render(indent + NESTED_INDENT, out);
                    if idx + 1 < fields.len() {
                        out.push(',');
                    }
                    out.push('\n');
                }
                out.push_str(&spaces(indent));
                out.push('}');
            }
        }
    }
}

/// Renders `entity` as `Sprite.new(...)` or `Stage.new(...)`, keeping only fields that
/// differ from their defaults. Keyword lines align one column past the opening paren.
pub fn emit_entity(entity: &Entity) -> String {
    let constructor = if entity.is_stage { "Stage" } else { "Sprite" };
    let opening = format!("{}.new(", constructor);
    let args = keyword_args(entity);
    debug!(
        "emitting {} '{}' with {} keyword argument(s)",
        constructor,
        entity.name,
        args.len()
    );

    let mut out = format!("{}{}", opening, quote_str(&entity.name));
    if args.is_empty() {
        out.push(')');
        return out;
    }

    let indent = opening.chars().count();
    for (key, value) in &args {
        out.push_str(",\n");
        out.push_str(&spaces(indent));
        out.push_str(key);
        out.push_str(": ");
        value.render(indent, &mut out);
    }
    out.push(')');
    out
}

/// Renders the stage and then every sprite, one blank line apart. With `only` set,
/// renders just the target of that name.
pub fn emit_project(project: &Project, only: Option<&str>) -> Result<String> {
    let blocks = select_targets(project, only)?
        .into_iter()
        .map(emit_entity)
        .collect::<Vec<_>>();
    let mut text = blocks.join("\n\n");
    text.push('\n');
    Ok(text)
}

/// Stage first, then sprites in layer order; or the single target named `only`.
pub fn select_targets<'a>(project: &'a Project, only: Option<&str>) -> Result<Vec<&'a Entity>> {
    match only {
        Some(name) => {
            let target = project
                .find_target(name)
                .ok_or_else(|| anyhow!("Target '{}' not found in project.", name))?;
            Ok(vec![target])
        }
        None => Ok(project.stage().into_iter().chain(project.sprites()).collect()),
    }
}

fn keyword_args(entity: &Entity) -> Vec<(&'static str, Node)> {
    let mut args = Vec::new();
    if entity.x != 0.0 {
        args.push(("x", Node::Inline(format_num(entity.x))));
    }
    if entity.y != 0.0 {
        args.push(("y", Node::Inline(format_num(entity.y))));
    }
    if entity.direction != DEFAULT_DIRECTION {
        args.push(("direction", Node::Inline(format_num(entity.direction))));
    }
    if !entity.visible {
        args.push(("visible", Node::Inline(entity.visible.to_string())));
    }
    if entity.size != DEFAULT_SIZE {
        args.push(("size", Node::Inline(format_num(entity.size))));
    }
    let costume_index = entity.current_costume.saturating_sub(1);
    if costume_index != 0 {
        args.push(("current_costume", Node::Inline(costume_index.to_string())));
    }
    if !entity.costumes.is_empty() {
        let records = entity.costumes.iter().map(costume_record).collect();
        args.push(("costumes", Node::Array(records)));
    }
    if entity.rotation_style != RotationStyle::AllAround {
        args.push((
            "rotation_style",
            Node::Inline(quote_str(entity.rotation_style.as_str())),
        ));
    }
    if let Some(vars) = var_group(entity, VarKind::Scalar) {
        args.push(("variables", vars));
    }
    if let Some(lists) = var_group(entity, VarKind::List) {
        args.push(("lists", lists));
    }
    args
}

fn costume_record(costume: &Costume) -> Node {
    Node::Record(vec![
        ("asset_id", Node::Inline(quote_str(&costume.asset_id))),
        ("name", Node::Inline(quote_str(&costume.name))),
        (
            "bitmap_resolution",
            Node::Inline(format_num(costume.bitmap_resolution)),
        ),
        ("md5", Node::Inline(quote_str(&costume.md5))),
        ("data_format", Node::Inline(quote_str(&costume.data_format))),
        (
            "rotation_center_x",
            Node::Inline(format_num(costume.rotation_center_x)),
        ),
        (
            "rotation_center_y",
            Node::Inline(format_num(costume.rotation_center_y)),
        ),
    ])
}

fn var_group(entity: &Entity, kind: VarKind) -> Option<Node> {
    let records = entity.entries_of(kind).map(var_record).collect::<Vec<_>>();
    if records.is_empty() {
        None
    } else {
        Some(Node::Array(records))
    }
}

fn var_record(entry: &VarEntry) -> Node {
    let mut fields = vec![("name", Node::Inline(quote_str(entry.name())))];
    if !entry.is_default() {
        let value = match entry {
            VarEntry::Scalar { value, .. } => serialize_scalar(value),
            VarEntry::List { items, .. } => serialize_sequence(items),
        };
        fields.push(("value", Node::Inline(value)));
    }
    Node::Record(fields)
}

fn spaces(n: usize) -> String {
    " ".repeat(n)
}
