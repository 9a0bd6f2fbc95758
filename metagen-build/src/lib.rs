//! Build-time metamodel generator.
//!
//! This crate scans your source files for `#[derive(Entity)]` and
//! `#[derive(MappedSuperclass)]` structs and writes a metamodel companion
//! (`Person_`) for each into an output directory, with a `mod.rs` index.
//!
//! # Example
//!
//! In your `build.rs`:
//!
//! ```ignore
//! fn main() {
//!     metagen_build::generate_metamodel()
//!         .scan_path("src/")
//!         .output_dir("src/metamodel")
//!         .run()
//!         .expect("Failed to generate metamodels")
//!         .emit_rerun_directives();
//! }
//! ```

mod generator;
pub mod resolver;
pub mod scanner;
mod writer;

pub use generator::{GenerationReport, MetamodelGenerator};
pub use resolver::SourceResolver;
pub use writer::FileWriter;

/// Create a new metamodel generator with default settings.
pub fn generate_metamodel() -> MetamodelGenerator {
    MetamodelGenerator::new()
}
