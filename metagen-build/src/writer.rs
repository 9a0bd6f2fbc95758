//! Writes generated metamodels into an output directory.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use metagen::{ArtifactWriter, Dependencies, EmittedArtifact, WriteError};

/// One file per artifact plus a `mod.rs` index.
///
/// Files are only touched when their content changed, so unchanged
/// metamodels do not trigger recompilation.
#[derive(Debug)]
pub struct FileWriter {
    output_dir: PathBuf,
    /// Module name to dependencies of the latest write.
    modules: BTreeMap<String, Dependencies>,
    changed: usize,
}

impl FileWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            modules: BTreeMap::new(),
            changed: 0,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Number of files whose content changed.
    pub fn changed(&self) -> usize {
        self.changed
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Write `mod.rs` declaring and re-exporting every generated module.
    pub fn write_index(&mut self) -> Result<PathBuf, WriteError> {
        let mut content = String::from("//! Auto-generated metamodels. Do not edit manually.\n\n");
        for module in self.modules.keys() {
            content.push_str(&format!("pub mod {module};\npub use {module}::*;\n"));
        }
        let path = self.output_dir.join("mod.rs");
        self.write_if_changed(&path, &content)?;
        Ok(path)
    }

    /// Source files the written artifacts depend on, when all of them track
    /// precise dependencies. `None` means any input change matters.
    pub fn precise_sources(&self) -> Option<BTreeSet<PathBuf>> {
        let mut sources = BTreeSet::new();
        for dependencies in self.modules.values() {
            match dependencies {
                Dependencies::AllFiles => return None,
                Dependencies::Precise { files, .. } => sources.extend(files.iter().cloned()),
            }
        }
        Some(sources)
    }

    fn write_if_changed(&mut self, path: &Path, content: &str) -> Result<(), WriteError> {
        let io_error = |source| WriteError::Io {
            path: path.to_path_buf(),
            source,
        };

        let unchanged = fs::read_to_string(path).is_ok_and(|existing| existing == content);
        if unchanged {
            debug!("{} unchanged", path.display());
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, content).map_err(io_error)?;
        self.changed += 1;
        debug!("wrote {}", path.display());
        Ok(())
    }
}

impl ArtifactWriter for FileWriter {
    fn write(&mut self, artifact: &EmittedArtifact) -> Result<(), WriteError> {
        let path = self.output_dir.join(&artifact.file_name);
        self.write_if_changed(&path, &artifact.source)?;
        let module = artifact.file_name.trim_end_matches(".rs").to_string();
        self.modules.insert(module, artifact.dependencies.clone());
        Ok(())
    }
}
