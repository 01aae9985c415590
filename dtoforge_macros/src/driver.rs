//! Generation driver and output router. One pass runs every registered
//! sub-generator against the pass context, then routes each artifact either
//! back into the module token stream or out to storage.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Item, ItemMod};

use crate::config::JobConfig;
use crate::errors::MaterializeError;
use crate::generators::{registry, SubGenerator};
use crate::metadata::{GeneratedArtifact, PassContext};
use crate::util::ident;

/// Run all sub-generators for one pass. The registry is partitioned up
/// front: configuration-independent sub-generators run exactly once (against
/// the first parsed configuration, or none at all), configuration-dependent
/// ones run once per parsed configuration. A failing sub-generator is
/// recorded as a diagnostic and the rest still run.
pub fn run_pass(
    ctx: &mut PassContext,
    configs: &[(PathBuf, JobConfig)],
) -> Vec<GeneratedArtifact> {
    let (dependent, independent): (Vec<_>, Vec<_>) =
        registry().into_iter().partition(|g| g.needs_config());

    let mut artifacts = Vec::new();
    let first = configs.first().map(|(_, c)| c);
    for generator in &independent {
        run_one(generator.as_ref(), ctx, first, &mut artifacts);
    }
    for (_, config) in configs {
        for generator in &dependent {
            run_one(generator.as_ref(), ctx, Some(config), &mut artifacts);
        }
    }
    artifacts
}

fn run_one(
    generator: &dyn SubGenerator,
    ctx: &mut PassContext,
    config: Option<&JobConfig>,
    artifacts: &mut Vec<GeneratedArtifact>,
) {
    match generator.run(ctx, config) {
        Ok(mut produced) => artifacts.append(&mut produced),
        Err(err) => ctx.diagnose(format!("sub-generator `{}` failed: {err}", generator.name())),
    }
}

/// Route every artifact: a present path materializes the rendered text to
/// storage (relative paths resolve against the manifest directory), a
/// missing path appends the tokens to the annotated module, grouped into
/// one generated `mod` per namespace.
pub fn route(
    module: &mut ItemMod,
    artifacts: Vec<GeneratedArtifact>,
    manifest_dir: &Path,
    ctx: &PassContext,
) -> Result<(), MaterializeError> {
    let mut inline_root = Vec::new();
    let mut inline_by_ns: BTreeMap<String, Vec<GeneratedArtifact>> = BTreeMap::new();
    for artifact in artifacts {
        match &artifact.path {
            Some(_) => materialize(&artifact, manifest_dir, ctx)?,
            None => match &artifact.namespace {
                Some(ns) => inline_by_ns.entry(ns.clone()).or_default().push(artifact),
                None => inline_root.push(artifact),
            },
        }
    }

    let content = match module.content.as_mut() {
        Some((_, items)) => items,
        None => return Ok(()),
    };
    for (ns, group) in inline_by_ns {
        let ns_ident = ident(&ns);
        let mut seen = Vec::new();
        let mut uses = TokenStream::new();
        for artifact in &group {
            for import in &artifact.uses {
                let rendered = quote!(#import).to_string();
                if !seen.contains(&rendered) {
                    seen.push(rendered);
                    uses.extend(quote!(use #import;));
                }
            }
        }
        let bodies: Vec<&TokenStream> = group.iter().map(|a| &a.tokens).collect();
        // `use super::*;` is the opt-in `auto_imports` surface: one member of
        // the group asking for it pulls the parent scope into the whole
        // generated module.
        let glob = if ctx.namespace_auto_imports(&ns) {
            quote!(use super::*;)
        } else {
            TokenStream::new()
        };
        content.push(Item::Verbatim(quote! {
            pub mod #ns_ident {
                #glob
                #uses
                #(#bodies)*
            }
        }));
    }
    if !inline_root.is_empty() {
        // The declaration and mapping artifacts of one type carry the same
        // `uses(...)` imports, so dedup spans artifacts here too.
        let mut seen = Vec::new();
        let mut uses = TokenStream::new();
        for artifact in &inline_root {
            for import in &artifact.uses {
                let rendered = quote!(#import).to_string();
                if !seen.contains(&rendered) {
                    seen.push(rendered);
                    uses.extend(quote!(use #import;));
                }
            }
        }
        let bodies: Vec<&TokenStream> = inline_root.iter().map(|a| &a.tokens).collect();
        content.push(Item::Verbatim(quote! {
            #uses
            #(#bodies)*
        }));
    }
    Ok(())
}

fn materialize(
    artifact: &GeneratedArtifact,
    manifest_dir: &Path,
    ctx: &PassContext,
) -> Result<(), MaterializeError> {
    let Some(path) = &artifact.path else {
        return Ok(());
    };
    let path = if path.is_absolute() {
        path.clone()
    } else {
        manifest_dir.join(path)
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| MaterializeError::CreateDir {
            path: parent.display().to_string(),
            source,
        })?;
    }
    let text = render(artifact, ctx);
    std::fs::write(&path, text).map_err(|source| MaterializeError::Write {
        path: path.display().to_string(),
        source,
    })
}

/// Rendered file content: documentation artifacts carry pre-rendered text,
/// code artifacts get a provenance header, their imports and the token
/// stream, optionally wrapped in editor region markers.
fn render(artifact: &GeneratedArtifact, ctx: &PassContext) -> String {
    let body = match &artifact.text {
        Some(text) => text.clone(),
        None => {
            let uses = &artifact.uses;
            let tokens = &artifact.tokens;
            let mut out = format!(
                "// Generated by dtoforge at {}. Do not edit.\n// Source: {} ({})\n",
                chrono::Utc::now().to_rfc3339(),
                artifact.source,
                ctx.module_ident,
            );
            if ctx.defaults.regions {
                out.push_str("// region: dtoforge generated\n");
            }
            out.push_str(&quote!(#(use #uses;)* #tokens).to_string());
            out.push('\n');
            if ctx.defaults.regions {
                out.push_str("// endregion: dtoforge generated\n");
            }
            out
        }
    };
    body.replace("\r\n", "\n")
}
