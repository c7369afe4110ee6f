//! Runs the generator over the descriptor fixtures and writes one module
//! per fixture into `$OUT_DIR/generated.rs`.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use shapegen::{generate_from_path, ShapegenConfig};

/// Module name and fixture file
const FIXTURES: &[(&str, &str)] = &[
    ("catalog", "catalog.json"),
    ("fleet", "fleet.json"),
    ("recursive", "recursive.json"),
];

fn main() -> Result<()> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let fixtures = manifest_dir.join("../../tests/fixtures");
    let config = ShapegenConfig::default();

    let mut output = String::new();
    for (module, file) in FIXTURES {
        let path = fixtures.join(file);
        println!("cargo:rerun-if-changed={}", path.display());

        let generated = generate_from_path(&path, &config)
            .with_context(|| format!("Failed to generate {}", path.display()))?;
        if generated.diagnostics.has_errors() {
            bail!("{} did not build cleanly:\n{}", file, generated.diagnostics.format_all());
        }
        output.push_str(&format!("pub mod {} {{\n{}\n}}\n\n", module, generated.code));
    }

    let target = PathBuf::from(env::var("OUT_DIR")?).join("generated.rs");
    fs::write(&target, output).with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(())
}
