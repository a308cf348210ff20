//! Scenario runner: every `fixtures/*.json` file names a type table, a root
//! and the schema expected for it, optionally under several output modes.
//!
//! usage: dev-test-runner [fixtures-dir] [name-regex]
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use colored::Colorize;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use schema_transform::{path_de, Config, DescriptorTable, Mode, Walker};

static FIXTURE_FILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.-]+\.json$").unwrap());

#[derive(Debug, Deserialize)]
struct Fixture {
    table: DescriptorTable,
    root: String,
    #[serde(default = "yes")]
    additional: bool,
    cases: Vec<Case>,
}

#[derive(Debug, Deserialize)]
struct Case {
    /// Omitted: run under every mode.
    #[serde(default)]
    mode: Option<Mode>,
    #[serde(default)]
    expected: Option<Value>,
    /// Substring of the expected error message.
    #[serde(default)]
    error: Option<String>,
}

fn yes() -> bool {
    true
}

fn load(path: &Path) -> anyhow::Result<Fixture> {
    let src = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    path_de::from_str_with_path(&src).with_context(|| format!("invalid fixture {}", path.display()))
}

fn run_case(fixture: &Fixture, mode: Mode, case: &Case) -> anyhow::Result<()> {
    let root = fixture
        .table
        .root(&fixture.root)
        .with_context(|| format!("no root named {}", fixture.root))?;
    let config = Config { mode, ..Config::default() };
    let result = Walker::new(&fixture.table, &config).schema(root, fixture.additional);
    match (result, &case.expected, &case.error) {
        (Ok(fragment), Some(expected), _) => {
            let got = fragment.to_value();
            if &got == expected {
                Ok(())
            } else {
                Err(anyhow!("expected {expected}\n     got {got}"))
            }
        }
        (Err(err), _, Some(needle)) if err.to_string().contains(needle.as_str()) => Ok(()),
        (Ok(fragment), None, _) => Err(anyhow!("expected an error, got {}", fragment.to_value())),
        (Err(err), _, _) => Err(anyhow!("unexpected error: {err}")),
    }
}

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let dir = PathBuf::from(args.next().unwrap_or_else(|| "fixtures".to_string()));
    let filter = args.next().map(|f| Regex::new(&f)).transpose()?;

    let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)
        .with_context(|| format!("cannot read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| FIXTURE_FILE.is_match(n))
        })
        .collect();
    paths.sort();

    let (mut passed, mut failed) = (0usize, 0usize);
    for path in paths {
        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string();
        if filter.as_ref().is_some_and(|re| !re.is_match(&name)) {
            continue;
        }
        let fixture = match load(&path) {
            Ok(f) => f,
            Err(error) => {
                failed += 1;
                eprintln!("{} {name}: {error:#}", "✘".red());
                continue;
            }
        };
        for (i, case) in fixture.cases.iter().enumerate() {
            let modes = case.mode.map(|m| vec![m]).unwrap_or_else(Mode::all);
            for mode in modes {
                match run_case(&fixture, mode, case) {
                    Ok(()) => passed += 1,
                    Err(error) => {
                        failed += 1;
                        eprintln!("{} {name}[{i}] {mode:?}\n     {error}", "✘".red());
                    }
                }
            }
        }
    }

    let summary = format!("{passed} passed, {failed} failed");
    if failed == 0 {
        eprintln!("{}", summary.green().bold());
        Ok(())
    } else {
        eprintln!("{}", summary.red().bold());
        std::process::exit(1)
    }
}
