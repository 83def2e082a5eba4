use std::{
    io::{stdout, BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tracing::debug;

use pydeps::{
    fmt::Label,
    layout::DEFAULT_PYTHON,
    path::get_current_dir,
    AliasTable, Config, DependencyCollector, Layout, ModuleFinder,
};

pub(crate) mod utils;

use self::utils::files::discover_script_path;

/// Find the files that Python scripts need to run from an installer image
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Entry scripts to find dependencies for
    #[clap(required = true)]
    scripts: Vec<PathBuf>,

    /// Config file to use - defaults to `pydeps.toml` in the
    /// current directory, or in the user config directory
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Interpreter to query for its installation layout
    #[clap(short, long)]
    python: Option<String>,
}

impl Cli {
    pub fn new() -> Self {
        Self::parse()
    }

    pub fn run(self) -> Result<ExitCode> {
        let config = match &self.config {
            Some(path) => Some(
                Config::read(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?,
            ),
            None => Config::discover(get_current_dir()).context("Failed to read config file")?,
        };

        let python = self
            .python
            .as_deref()
            .or_else(|| config.as_ref().and_then(Config::python))
            .unwrap_or(DEFAULT_PYTHON)
            .to_string();
        let layout = config
            .as_ref()
            .map(Config::layout_overrides)
            .unwrap_or_default()
            .resolve(&python)
            .with_context(|| format!("Failed to find installation layout of {python}"))?;
        debug!(?layout, "resolved installation layout");

        warn_missing_support_files(&layout);

        let mut aliases = AliasTable::with_defaults(&layout);
        if let Some(config) = &config {
            aliases.extend_relative(&layout.stdlib, config.aliases());
        }

        let scripts = self
            .scripts
            .into_iter()
            .map(discover_script_path)
            .collect::<Result<Vec<_>>>()?;

        let finder = ModuleFinder::new(&layout);
        let collector = DependencyCollector::new(layout, aliases, finder);
        let dependencies = collector
            .collect(&scripts)
            .context("Failed to collect dependencies")?;

        // Nothing is printed until every script has been analyzed,
        // so that a failure never leaves a partial list behind
        let mut out = BufWriter::new(stdout().lock());
        for path in dependencies {
            writeln!(out, "{}", path.display())?;
        }
        out.flush()?;

        Ok(ExitCode::SUCCESS)
    }
}

fn warn_missing_support_files(layout: &Layout) {
    for path in layout.support_files() {
        if !path.exists() {
            eprintln!(
                "{} Support file {} does not exist",
                Label::Warn,
                style(path.display()).yellow()
            );
        }
    }
}
