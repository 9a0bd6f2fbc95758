//! Build-script driver for metamodel generation.

use crate::resolver::SourceResolver;
use crate::scanner::scan_directory;
use crate::writer::FileWriter;
use anyhow::{Context, Result};
use log::info;
use metagen::{MetamodelConfig, MetamodelProcessor, Origin};
use std::path::PathBuf;

/// Builder for configuring and running the metamodel generator.
pub struct MetamodelGenerator {
    scan_paths: Vec<PathBuf>,
    library_paths: Vec<(PathBuf, String)>,
    output_dir: PathBuf,
    crate_name: String,
    config: MetamodelConfig,
    config_file: Option<PathBuf>,
}

/// What a generator run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Generated names, in write order, rewrites included.
    pub written: Vec<String>,
    /// Files whose content changed on disk.
    pub changed: usize,
    pub rounds: usize,
    /// `cargo:rerun-if-changed` targets.
    pub rerun_if_changed: Vec<PathBuf>,
}

impl MetamodelGenerator {
    /// Create a new generator with default settings.
    pub fn new() -> Self {
        Self {
            scan_paths: Vec::new(),
            library_paths: Vec::new(),
            output_dir: PathBuf::from("src/metamodel"),
            crate_name: "crate".to_string(),
            config: MetamodelConfig::default(),
            config_file: None,
        }
    }

    /// Add a path to scan for entity definitions.
    ///
    /// Each path is processed as its own round, in the order added. Entities
    /// referring to types from a later path are retried once it is loaded.
    pub fn scan_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.scan_paths.push(path.into());
        self
    }

    /// Add sources of a dependency whose declarations are inherited from
    /// but never generated, under the given crate name.
    pub fn library_path(mut self, path: impl Into<PathBuf>, crate_name: impl Into<String>) -> Self {
        self.library_paths.push((path.into(), crate_name.into()));
        self
    }

    /// Set the directory generated modules are written to.
    ///
    /// Default: `src/metamodel`
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    /// Set the crate name used in generated paths.
    ///
    /// Default: `crate`
    pub fn crate_name(mut self, name: impl Into<String>) -> Self {
        self.crate_name = name.into();
        self
    }

    pub fn config(mut self, config: MetamodelConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a TOML file when the generator runs.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Run the generator.
    ///
    /// Scans every path, writes one module per entity plus `mod.rs` into
    /// the output directory, and fails when an entity stays unresolvable.
    pub fn run(self) -> Result<GenerationReport> {
        let config = match &self.config_file {
            Some(path) => MetamodelConfig::load(path)
                .with_context(|| format!("Failed to load metamodel config {}", path.display()))?,
            None => self.config.clone(),
        };

        // Default to scanning "src/" if no paths specified
        let scan_paths = if self.scan_paths.is_empty() {
            vec![PathBuf::from("src/")]
        } else {
            self.scan_paths.clone()
        };

        let mut resolver = SourceResolver::new(config.clone());
        for (path, crate_name) in &self.library_paths {
            let scanned = scan_directory(path, crate_name, &config.markers, Origin::Library, None)
                .with_context(|| format!("Failed to scan library {}", path.display()))?;
            resolver.add_library(scanned);
        }

        let mut processor = MetamodelProcessor::new(config);
        let mut writer = FileWriter::new(&self.output_dir);
        let mut report = GenerationReport::default();

        for path in &scan_paths {
            let scanned = scan_directory(
                path,
                &self.crate_name,
                &processor.config().markers,
                Origin::Source,
                Some(self.output_dir.as_path()),
            )
            .with_context(|| format!("Failed to scan {}", path.display()))?;
            resolver.begin_round(scanned);

            let outcome = processor
                .process(&resolver, &mut writer)
                .with_context(|| format!("Failed to generate metamodels for {}", path.display()))?;
            report.written.extend(outcome.written);
            report.rounds = outcome.round;
        }
        processor.finish().context("Metamodel generation did not complete")?;

        writer
            .write_index()
            .with_context(|| format!("Failed to write index in {}", self.output_dir.display()))?;
        report.changed = writer.changed();

        report.rerun_if_changed = match writer.precise_sources() {
            Some(sources) => sources.into_iter().collect(),
            None => scan_paths.clone(),
        };
        report
            .rerun_if_changed
            .extend(self.library_paths.iter().map(|(path, _)| path.clone()));
        report.rerun_if_changed.extend(self.config_file.iter().cloned());

        if report.changed > 0 {
            eprintln!(
                "metagen-build: Generated {} metamodels in {} ({} files changed)",
                writer.modules().count(),
                self.output_dir.display(),
                report.changed
            );
        }
        info!("metamodel generation finished after {} rounds", report.rounds);

        Ok(report)
    }
}

impl Default for MetamodelGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationReport {
    /// Print `cargo:rerun-if-changed` directives for a build script.
    pub fn emit_rerun_directives(&self) {
        for path in &self.rerun_if_changed {
            println!("cargo:rerun-if-changed={}", path.display());
        }
    }
}
