//! CLI: manifests + patterns → (bindings | closure report)
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::closure::{select, MatchMode, SelectOptions, Selection};
use crate::emit::{emit, EmitOptions};
use crate::metadata::{split_archive_list, ManifestProvider};
use crate::output::OutputDir;
use crate::report::ClosureReport;
use crate::template::DirectoryTemplates;

const GENERATE_USAGE: &str = "Usage: jni-api-gen generate <output-dir> <archive[;archive...]> <pattern...>";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate C++ JNI bindings for the closure of the JVM types matching some patterns
#[derive(Parser, Debug)]
#[command(name = "jni-api-gen", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compute the closure and write API.h plus one .cpp per visited type
    Generate(GenerateOut),
    /// compute the closure and print it as JSON
    Closure(ClosureOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// archive manifests, `;`-separated. Entries may be quoted glob patterns
    archives: String,

    /// patterns matched in full against names like `::java::lang::String`
    #[arg(required = true, num_args = 1..)]
    patterns: Vec<String>,

    /// JSON Pointer selecting the class list inside each manifest (e.g. /payload/classes)
    #[arg(long)]
    json_pointer: Option<String>,

    /// expand every type a pattern matches instead of only the first
    #[arg(long, default_value_t = false)]
    all_matches: bool,

    /// do not add the boxed wrappers, Class, NoSuchMethodError and System
    #[arg(long, default_value_t = false)]
    no_bootstrap: bool,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    /// existing, writable destination directory
    output_dir: PathBuf,

    #[command(flatten)]
    input_settings: InputSettings,

    /// directory of `<binary name>.h` / `.cpp` overlays
    #[arg(long, default_value = "templates")]
    templates: PathBuf,

    /// file name of the declaration document
    #[arg(long, default_value = "API.h")]
    header: String,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct ClosureOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn select_options(&self) -> SelectOptions {
        SelectOptions {
            mode: if self.all_matches { MatchMode::All } else { MatchMode::First },
            bootstrap: !self.no_bootstrap,
        }
    }

    fn archive_paths(&self) -> anyhow::Result<Vec<PathBuf>> {
        let entries = split_archive_list(&self.archives);
        if entries.is_empty() {
            bail!("no archive given");
        }
        let paths = resolve_file_path_patterns(entries.iter().map(|p| p.to_string_lossy()))?;
        for path in &paths {
            if !path.is_file() {
                bail!("{}: is not an archive manifest", path.display());
            }
        }
        Ok(paths)
    }

    fn load_provider(&self) -> anyhow::Result<ManifestProvider> {
        let paths = self.archive_paths()?;
        let provider = ManifestProvider::open(&paths, self.json_pointer.as_deref())
            .context("failed to load archive manifests")?;
        log::info!("{} types across {} archive(s)", provider.len(), paths.len());
        Ok(provider)
    }

    fn select(&self, provider: &ManifestProvider) -> anyhow::Result<Selection> {
        let selection = select(provider, &self.patterns, self.select_options())
            .context("failed to compute the type closure")?;
        let closure = &selection.closure;
        if closure.is_empty() {
            eprintln!("{} no type matched {:?}", "warning:".yellow().bold(), self.patterns);
        }
        if !closure.unresolved().is_empty() {
            eprintln!(
                "{} {} referenced type(s) could not be loaded",
                "warning:".yellow().bold(),
                closure.unresolved().len()
            );
        }
        Ok(selection)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                // 1) destination and inputs are checked before any work
                let output = OutputDir::open(&target.output_dir).map_err(with_usage)?;
                let provider = target.input_settings.load_provider().map_err(with_usage)?;

                // 2) closure
                let selection = target.input_settings.select(&provider)?;

                // 3) render everything, then write
                let templates = DirectoryTemplates::new(&target.templates);
                let options = EmitOptions { header_name: target.header.clone(), ..EmitOptions::default() };
                let bindings = emit(&selection.closure, &templates, &options)
                    .context("failed to render bindings")?;
                let written = output.write_all(&bindings)?;

                eprintln!(
                    "{} {} file(s) for {} type(s) to {}",
                    "wrote".green().bold(),
                    written.len(),
                    selection.closure.len(),
                    output.root().display()
                );
            }
            Command::Closure(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let provider = target.input_settings.load_provider()?;
                let selection = target.input_settings.select(&provider)?;
                let report_src = ClosureReport::new(&selection).to_json_pretty()?;

                if let Some(out) = target.out.as_ref() {
                    write_report(out, &report_src)?;
                    eprintln!("{} {}", "wrote".green().bold(), out.display());
                } else {
                    println!("{report_src}");
                }
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn with_usage(error: impl Into<anyhow::Error>) -> anyhow::Error {
    error.into().context(GENERATE_USAGE)
}

fn write_report(out: &Path, src: &str) -> anyhow::Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, src).with_context(|| format!("failed to write {}", out.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                return Err(anyhow!("glob pattern matched no files: {pattern}"));
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
