//! Documentation exporter: the one config-dependent built-in. Each
//! `[[docs]]` job renders a markdown summary of the catalog and routes it
//! to the job's path for materialization.

use std::fmt::Write;

use crate::config::JobConfig;
use crate::errors::GeneratorError;
use crate::generators::SubGenerator;
use crate::metadata::{GeneratedArtifact, PassContext, SourceKind};
use crate::util::ident;

pub struct DocsExportGenerator;

impl SubGenerator for DocsExportGenerator {
    fn name(&self) -> &'static str {
        "docs export"
    }

    fn needs_config(&self) -> bool {
        true
    }

    fn run(
        &self,
        ctx: &mut PassContext,
        config: Option<&JobConfig>,
    ) -> Result<Vec<GeneratedArtifact>, GeneratorError> {
        let Some(config) = config else {
            return Ok(Vec::new());
        };
        let mut artifacts = Vec::new();
        for job in &config.docs {
            let title = job
                .title
                .clone()
                .unwrap_or_else(|| format!("Generated types for `{}`", ctx.module_ident));
            let text = render_summary(ctx, &title)
                .map_err(|e| GeneratorError::Emit(e.to_string()))?;
            let mut artifact = GeneratedArtifact::code(
                &ident("docs"),
                None,
                proc_macro2::TokenStream::new(),
            );
            artifact.file_name = job
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "dtoforge.md".to_string());
            artifact.text = Some(text);
            artifact.path = Some(job.path.clone());
            artifact.source = ctx.module_ident.to_string();
            artifacts.push(artifact);
        }
        Ok(artifacts)
    }
}

fn render_summary(ctx: &PassContext, title: &str) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(out, "# {title}\n")?;
    writeln!(out, "| Source | Kind | Capability | Concrete | Namespace |")?;
    writeln!(out, "|---|---|---|---|---|")?;
    for (st, projection) in ctx.ordered() {
        let kind = match st.kind {
            SourceKind::Struct => "struct",
            SourceKind::Enum => "enum",
        };
        let capability = match st.kind {
            SourceKind::Struct => format!("`{}`", projection.capability),
            SourceKind::Enum => "-".to_string(),
        };
        writeln!(
            out,
            "| `{}` | {} | {} | `{}` | {} |",
            st.ident,
            kind,
            capability,
            projection.concrete,
            projection.namespace.as_deref().unwrap_or("(root)"),
        )?;
    }
    writeln!(out)?;
    for (st, projection) in ctx.ordered() {
        if st.kind != SourceKind::Struct {
            continue;
        }
        writeln!(out, "## `{}` → `{}`\n", st.ident, projection.concrete)?;
        if let Some(base) = &st.base {
            writeln!(out, "Extends `{}` through field `{}`.\n", base.ty, base.field)?;
        }
        for prop in st.own_props() {
            writeln!(out, "- `{}` → `{}`", prop.ident, prop.projected_ident())?;
        }
        writeln!(out)?;
    }
    Ok(out)
}
