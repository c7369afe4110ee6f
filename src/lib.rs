//! shapegen
//!
//! Compiles SHACL-style node shape descriptors into Rust types. Every
//! generated type gets a declaration plus, per enabled feature, structural
//! equality, structural hashing, a JSON document codec with schema, an RDF
//! graph codec and SPARQL CONSTRUCT templates.
//!
//! ## Pipeline
//!
//! ```text
//! descriptors/*.json
//!     │  descriptor::loader   (walk, parse, validate against the descriptor schema)
//!     ▼
//! ShapeDescriptor[]
//!     │  model::build         (types, inheritance, identifiers, recursion, features)
//!     ▼
//! BuildOutput { TypeModel, Diagnostics, RecursionAnalysis }
//!     │  codegen              (names, regions, emitters; one worker per type)
//!     ▼
//! generated.rs  (uses shapegen_runtime::prelude)
//! ```
//!
//! A type that fails (invalid descriptor, name collision, ambiguous
//! inheritance) is reported in the diagnostics and left out together with
//! every type that depends on it. The rest of the model is still generated.

pub mod checksum;
pub mod codegen;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod model;

use std::path::Path;

use tracing::{info, instrument, warn};

pub use checksum::Checksum;
pub use codegen::{generate_module, render_module, CodegenContext, GeneratedUnit, TypeBundle, UnitKind};
pub use config::{GeneratorConfig, OutputConfig, ShapegenConfig};
pub use descriptor::{parse_str, DescriptorSet, ShapeDescriptor};
pub use error::{Result, ShapegenError};
pub use model::{build_model, BuildOutput, Diagnostics, TypeModel};

/// A rendered module and what went into it
#[derive(Debug, Clone)]
pub struct GeneratedModule {
    pub code: String,
    pub diagnostics: Diagnostics,
    /// Fingerprint of the descriptor sources
    pub fingerprint: Checksum,
    /// Shapes read
    pub shapes: usize,
}

/// Load descriptors from `path`, build the model and render one module
#[instrument(skip(config), fields(path = %path.display()))]
pub fn generate_from_path(path: &Path, config: &ShapegenConfig) -> Result<GeneratedModule> {
    let loaded = descriptor::loader::load_path(path)?;
    let output = build_model(&loaded.shapes, &config.generator);
    if !output.is_clean() {
        warn!(failed = output.model.failed().len(), "some types failed and will not be generated");
    }

    let (code, diagnostics) = generate_module(output, config)?;
    info!(
        shapes = loaded.shapes.len(),
        errors = diagnostics.error_count(),
        warnings = diagnostics.warning_count(),
        "module generated"
    );
    Ok(GeneratedModule {
        code,
        diagnostics,
        fingerprint: loaded.fingerprint,
        shapes: loaded.shapes.len(),
    })
}

/// Build and render from an in-memory descriptor document
pub fn generate_from_str(content: &str, config: &ShapegenConfig) -> Result<(String, Diagnostics)> {
    let set = parse_str(content)?;
    generate_module(build_model(&set.shapes, &config.generator), config)
}
