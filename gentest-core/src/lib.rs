//! gentest core library - table-driven test scaffolds for Go functions

// Global invariants enforced in this crate:
// - One run handles exactly one target declaration
// - No global mutable state; everything a run reads is in `RunConfig`
// - No randomness, clocks, threads, or async
// - Deterministic traversal order must be explicit
// - Identical input yields byte-for-byte identical output
// - Nothing is emitted unless every stage succeeded

pub mod config;
pub mod error;
pub mod format;
pub mod language;
pub mod locate;
pub mod mutation;
pub mod naming;
pub mod render;
pub mod scaffold;
pub mod signature;
pub mod typecheck;
pub mod types;

pub use config::{ResolvedConfig, RunConfig};
pub use error::{GentestError, Result};
pub use language::GoPackage;
pub use locate::{Locator, MatchMode};
pub use naming::{NameStyle, NamingOptions};
pub use signature::{BaseFunctionData, VarField};
pub use typecheck::{PackageTypes, TypeOracle};
pub use types::TypeDescriptor;

use std::io::Write;

use tracing::{debug, info};

/// Generate the test scaffold for the function `config` points at,
/// resolving types with the package's own declarations.
pub fn generate(package: &GoPackage, config: &RunConfig) -> Result<String> {
    let oracle = PackageTypes::new(package);
    generate_with(package, &oracle, config)
}

/// Same as [`generate`] with a caller-supplied type oracle.
pub fn generate_with(package: &GoPackage, oracle: &dyn TypeOracle, config: &RunConfig) -> Result<String> {
    let decl = locate::locate(package, &config.locator, config.match_mode)?;
    let name = decl.name.clone();

    let data = BaseFunctionData::build(decl, oracle, &config.naming)?;
    debug!(
        function = %name,
        receiver_mutated = data.receiver_mutated,
        "mutation check done"
    );

    let fields = scaffold::assemble(&data, config.parallel);
    debug!(function = %name, test = %fields.test_func_name, "assembled scaffold");

    let output = render::render(&fields)?;
    info!(function = %name, bytes = output.len(), "generated test scaffold");
    Ok(output)
}

/// Generate and write the scaffold to `writer` in one call. Nothing is
/// written when generation fails.
pub fn generate_to<W: Write>(package: &GoPackage, config: &RunConfig, writer: &mut W) -> Result<()> {
    let output = generate(package, config)?;
    writer.write_all(output.as_bytes())?;
    writer.flush()?;
    Ok(())
}
