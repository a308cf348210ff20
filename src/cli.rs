//! CLI: type table → schema, or compiled unit → rewritten unit.
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;
use tracing::info;

use crate::config::{ArrayItems, Config, LeafStyle, ObjectStyle};
use crate::descriptor::DescriptorTable;
use crate::locator::Locator;
use crate::syntax::Unit;
use crate::walker::Walker;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// synthesize validation schemas from resolved type tables, or rewrite
/// `schema<T>()` call sites in compiled units
#[derive(Parser, Debug)]
#[command(name = "schema-transform", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the schema of one named type from each type table
    Schema(SchemaOut),
    /// replace designated call sites with their schema literal
    Expand(ExpandOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select a subnode in each document (e.g. /program/units/0)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct ModeSettings {
    /// JSON config file (function name, predefined types, output mode)
    #[arg(long)]
    config: Option<PathBuf>,

    /// emit bare property maps for nested objects
    #[arg(long, default_value_t = false)]
    flat: bool,

    /// never merge doc-tag annotations
    #[arg(long, default_value_t = false)]
    no_annotations: bool,

    /// emit arrays without `items`
    #[arg(long, default_value_t = false)]
    opaque_arrays: bool,

    /// emit leaves as bare type names (`"string"`)
    #[arg(long, default_value_t = false)]
    bare_leaves: bool,

    /// name of the designated function
    #[arg(long)]
    function_name: Option<String>,

    /// declaration file suffix the designated function must come from
    #[arg(long)]
    module: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    mode_settings: ModeSettings,

    /// root type name, looked up in the table's `roots`
    #[arg(long = "type")]
    root_type: String,

    /// behave like `schema<T>(false)`
    #[arg(long, default_value_t = false)]
    no_additional: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct ExpandOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    mode_settings: ModeSettings,

    /// directory for rewritten units (stdout if omitted)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

/// One document read from an input file (a file may yield several through
/// a jq filter).
struct Document {
    source: PathBuf,
    index: usize,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load(&self) -> anyhow::Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let per_file = source_paths
            .par_iter()
            .map(|path| self.load_file(path))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(per_file.into_iter().flatten().collect())
    }

    fn load_file(&self, source_path: &Path) -> anyhow::Result<Vec<Document>> {
        let source_path_str = source_path.to_string_lossy().to_string();
        let source = std::fs::read_to_string(source_path)
            .with_context(|| format!("failed to read source file {source_path_str}"))?;
        let mut json_value = serde_json::from_str::<Value>(&source)
            .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
        if let Some(pointer) = self.json_pointer.as_deref() {
            json_value = json_value
                .pointer(pointer)
                .cloned()
                .with_context(|| format!("JSON pointer {pointer} matched nothing in {source_path_str}"))?;
        }
        let values = match self.jq_expr.as_ref() {
            None => vec![json_value],
            Some(jq_expr) => crate::jq_exec::run_jaq(jq_expr, &json_value).with_context(|| {
                format!("failed to apply jq expression to source file ({source_path_str})")
            })?,
        };
        Ok(values
            .into_iter()
            .enumerate()
            .map(|(index, value)| Document { source: source_path.to_path_buf(), index, value })
            .collect())
    }
}

impl ModeSettings {
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => Config::default(),
        };
        if self.flat {
            config.mode.objects = ObjectStyle::Flat;
        }
        if self.no_annotations {
            config.mode.annotations = false;
        }
        if self.opaque_arrays {
            config.mode.array_items = ArrayItems::Opaque;
        }
        if self.bare_leaves {
            config.mode.leaves = LeafStyle::Bare;
        }
        if let Some(name) = &self.function_name {
            config.function_name = name.clone();
        }
        if let Some(module) = &self.module {
            config.module = Some(module.clone());
        }
        Ok(config)
    }
}

impl Document {
    fn label(&self) -> String {
        format!("{}#{}", self.source.display(), self.index)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let config = target.mode_settings.config()?;
                let documents = target.input_settings.load()?;

                let schemas = documents
                    .par_iter()
                    .map(|doc| -> anyhow::Result<Value> {
                        let table: DescriptorTable = crate::path_de::from_value_with_path(doc.value.clone())
                            .with_context(|| format!("{} is not a type table", doc.label()))?;
                        let Some(root) = table.root(&target.root_type) else {
                            bail!("{} has no root named {}", doc.label(), target.root_type);
                        };
                        let fragment = Walker::new(&table, &config)
                            .schema(root, !target.no_additional)
                            .with_context(|| format!("while walking {} in {}", target.root_type, doc.label()))?;
                        info!(document = %doc.label(), root = %target.root_type, "schema generated");
                        Ok(fragment.to_value())
                    })
                    .collect::<anyhow::Result<Vec<_>>>()?;

                let output = match <[Value; 1]>::try_from(schemas) {
                    Ok([single]) => single,
                    Err(many) => Value::Array(many),
                };
                let schema_src = serde_json::to_string_pretty(&output)?;
                match target.out.as_ref() {
                    Some(out) => write_file(out, &schema_src)?,
                    None => println!("{schema_src}"),
                }
                eprintln!("{} {} document(s)", "✔ schema".green().bold(), documents.len());
            }
            Command::Expand(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let config = target.mode_settings.config()?;
                let locator = Locator::new(&config);
                let documents = target.input_settings.load()?;

                let rewritten = documents
                    .par_iter()
                    .map(|doc| {
                        let mut unit: Unit = crate::path_de::from_value_with_path(doc.value.clone())
                            .with_context(|| format!("{} is not a compiled unit", doc.label()))?;
                        let count = locator
                            .rewrite_unit(&mut unit)
                            .with_context(|| format!("while rewriting {}", doc.label()))?;
                        info!(document = %doc.label(), count, "unit rewritten");
                        Ok::<_, anyhow::Error>((doc, unit, count))
                    })
                    .collect::<anyhow::Result<Vec<_>>>()?;

                let mut total = 0;
                for (doc, unit, count) in &rewritten {
                    total += count;
                    let unit_src = serde_json::to_string_pretty(unit)?;
                    match target.out_dir.as_ref() {
                        Some(dir) => write_file(&dir.join(output_name(doc)), &unit_src)?,
                        None => println!("{unit_src}"),
                    }
                }
                eprintln!(
                    "{} {total} call site(s) in {} unit(s)",
                    "✔ rewrote".green().bold(),
                    rewritten.len()
                );
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_file(out: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
}

/// `<stem>.json`, or `<stem>.<index>.json` for later documents of a file.
fn output_name(doc: &Document) -> String {
    let stem = doc
        .source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "unit".to_string());
    if doc.index == 0 {
        format!("{stem}.json")
    } else {
        format!("{stem}.{}.json", doc.index)
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            // Treat as a glob pattern
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
