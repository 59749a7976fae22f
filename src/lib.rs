pub mod emit;
pub mod ident;
pub mod literal;
pub mod model;
pub mod sb3;
pub mod scope;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

#[cfg(all(target_arch = "wasm32", feature = "wasm-bindings"))]
pub mod wasm;

pub use emit::{emit_entity, emit_project};
pub use ident::sanitize;
pub use literal::{quote_str, serialize_scalar, serialize_sequence, Literal};
pub use model::{Costume, Entity, Project, RotationStyle, Runtime, VarEntry, VarKind};
pub use scope::{list_name, resolve_name, sprite_name, variable_name};

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Emit only the target with this name (case-insensitive).
    pub target: Option<String>,
}

#[cfg(not(target_arch = "wasm32"))]
pub fn run_cli(args: &cli::Args) -> Result<()> {
    let total_stages = if args.stdout { 3 } else { 4 };
    let progress = CliProgress::new("Convert", total_stages);

    progress.emit(1, "Resolving input path");
    let input = canonicalize_file(&args.input)?;

    progress.emit(2, "Reading project");
    let project = sb3::load_project(&input)
        .with_context(|| format!("Failed to load '{}'.", pretty_path(&input)))?;

    if args.split_targets {
        progress.emit(3, "Selecting targets");
        let out_dir = match &args.output {
            Some(path) => path.clone(),
            None => default_split_output_dir(&input),
        };
        progress.emit(4, "Writing target files");
        return write_split_targets(&project, args.target.as_deref(), &out_dir);
    }

    progress.emit(3, "Emitting Ruby source");
    let text = emit_project(&project, args.target.as_deref())?;

    if args.stdout {
        print!("{}", text);
        return Ok(());
    }

    progress.emit(4, "Writing output");
    let out_file = match &args.output {
        Some(path) if path.extension().is_none() => path.with_extension("rb"),
        Some(path) => path.clone(),
        None => input.with_extension("rb"),
    };
    if let Some(parent) = out_file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&out_file, text.as_bytes())
        .with_context(|| format!("Failed to write '{}'.", pretty_path(&out_file)))?;
    Ok(())
}

pub fn convert_file(input: &Path, options: &ConvertOptions) -> Result<String> {
    let input = canonicalize_file(input)?;
    let project = sb3::load_project(&input)
        .with_context(|| format!("Failed to load '{}'.", pretty_path(&input)))?;
    emit_project(&project, options.target.as_deref())
}

pub fn convert_project_json(project_json: &str, target: Option<&str>) -> Result<String> {
    let project = sb3::parse_project_json(project_json)?;
    emit_project(&project, target)
}

pub fn canonicalize_file(path: &Path) -> Result<PathBuf> {
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!("Input file not found: '{}'.", path.display()));
    }
    Ok(path.canonicalize()?)
}

#[cfg(not(target_arch = "wasm32"))]
fn write_split_targets(project: &Project, only: Option<&str>, out_dir: &Path) -> Result<()> {
    let selected = emit::select_targets(project, only)?;
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create '{}'.", pretty_path(out_dir)))?;
    let mut used_files = HashSet::new();
    for target in selected {
        let file_name = unique_target_filename(&target.name, &mut used_files);
        let path = out_dir.join(&file_name);
        let mut text = emit_entity(target);
        text.push('\n');
        fs::write(&path, text.as_bytes())
            .with_context(|| format!("Failed to write '{}'.", pretty_path(&path)))?;
        log::debug!("wrote '{}' for target '{}'", file_name, target.name);
    }
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn unique_target_filename(name: &str, used: &mut HashSet<String>) -> String {
    let mut base = sanitize(name).trim_matches('_').to_string();
    if base.is_empty() {
        base = "target".to_string();
    }
    let mut candidate = format!("{}.rb", base);
    let mut index = 2usize;
    while !used.insert(candidate.to_lowercase()) {
        candidate = format!("{}_{}.rb", base, index);
        index += 1;
    }
    candidate
}

#[cfg(not(target_arch = "wasm32"))]
fn default_split_output_dir(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("project");
    input
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}_rb", stem))
}

fn pretty_path(path: &Path) -> String {
    let raw = path.display().to_string();
    if let Some(stripped) = raw.strip_prefix(r"\\?\") {
        stripped.to_string()
    } else {
        raw
    }
}

#[cfg(not(target_arch = "wasm32"))]
struct CliProgress {
    prefix: &'static str,
    total: usize,
}

#[cfg(not(target_arch = "wasm32"))]
impl CliProgress {
    fn new(prefix: &'static str, total: usize) -> Self {
        Self {
            prefix,
            total: total.max(1),
        }
    }

    fn emit(&self, step: usize, label: &str) {
        let step = step.clamp(1, self.total);
        let bar = render_progress_bar(step, self.total, 14);
        eprintln!(
            "[{}] {}... ({}/{}) {}",
            self.prefix, label, step, self.total, bar
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn render_progress_bar(step: usize, total: usize, width: usize) -> String {
    let width = width.max(1);
    let filled = ((step * width) + (total / 2)) / total;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < filled { '=' } else { '-' });
    }
    s.push(']');
    s
}
