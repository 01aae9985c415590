//! The sub-generators of one pass, behind a common seam so the driver can
//! orchestrate them uniformly. Sub-generators are partitioned statically
//! into configuration-dependent and configuration-independent sets; the
//! driver never mutates the registry while iterating it.

pub mod declaration;
pub mod docs;
pub mod enum_gen;
pub mod instantiate;
pub mod mapping;
pub mod shape;

use crate::config::JobConfig;
use crate::errors::GeneratorError;
use crate::metadata::{GeneratedArtifact, PassContext};

pub trait SubGenerator {
    fn name(&self) -> &'static str;

    /// Whether this sub-generator consumes a job configuration. Independent
    /// sub-generators run exactly once per pass.
    fn needs_config(&self) -> bool {
        false
    }

    /// Run against the pass context. A failing type inside a sub-generator
    /// is recorded on the context and skipped; returning `Err` here fails
    /// the whole sub-generator (the driver catches it and carries on with
    /// the remaining ones).
    fn run(
        &self,
        ctx: &mut PassContext,
        config: Option<&JobConfig>,
    ) -> Result<Vec<GeneratedArtifact>, GeneratorError>;
}

/// All sub-generators known to a pass, in emission order.
pub fn registry() -> Vec<Box<dyn SubGenerator>> {
    vec![
        Box::new(declaration::DeclarationGenerator),
        Box::new(enum_gen::EnumMirrorGenerator),
        Box::new(mapping::MappingGenerator),
        Box::new(instantiate::InstantiationGenerator),
        Box::new(docs::DocsExportGenerator),
    ]
}
