//! Instantiation aliases: every `instantiate(Ty<Args>)` request becomes a
//! `pub type` alias naming a closed projection of a generic pair, so
//! downstream code can spell `PageCustomerDto` instead of
//! `PageDto<CustomerDto>`.

use heck::ToUpperCamelCase;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{GenericArgument, PathArguments, Type};

use crate::attrs::MergedAttribute;
use crate::config::JobConfig;
use crate::errors::GeneratorError;
use crate::generators::SubGenerator;
use crate::metadata::{GeneratedArtifact, PassContext};
use crate::project::project_type;
use crate::util::ident;

pub struct InstantiationGenerator;

impl SubGenerator for InstantiationGenerator {
    fn name(&self) -> &'static str {
        "instantiation aliases"
    }

    fn run(
        &self,
        ctx: &mut PassContext,
        _config: Option<&JobConfig>,
    ) -> Result<Vec<GeneratedArtifact>, GeneratorError> {
        let mut artifacts = Vec::new();
        let mut notes = Vec::new();
        for (st, projection) in ctx.ordered() {
            if projection.merged.instantiate.is_empty() {
                continue;
            }
            let ns = projection.merged.namespace.as_deref();
            let mut aliases = Vec::new();
            for request in &projection.merged.instantiate {
                match emit_alias(request, ctx, ns, &projection.merged) {
                    Ok(alias) => aliases.push(alias),
                    Err(err) => notes.push(err.to_string()),
                }
            }
            if aliases.is_empty() {
                continue;
            }
            let mut artifact = GeneratedArtifact::code(
                &st.ident,
                projection.namespace.clone(),
                quote!(#(#aliases)*),
            );
            artifact.file_name = format!("{}.aliases.g.rs", st.ident);
            artifact.uses = projection.merged.uses.clone();
            artifact.path = ctx
                .defaults
                .out_dir
                .as_ref()
                .map(|dir| dir.join(&artifact.file_name));
            artifacts.push(artifact);
        }
        for note in notes {
            ctx.diagnose(note);
        }
        Ok(artifacts)
    }
}

/// Build one alias from a closed instantiation request such as
/// `Page<Customer>`. The head must be a catalogued generic type; the alias
/// name concatenates head and argument names between the pass prefix and
/// suffix.
fn emit_alias(
    request: &Type,
    ctx: &PassContext,
    ns: Option<&str>,
    merged: &MergedAttribute,
) -> Result<TokenStream, GeneratorError> {
    let Type::Path(path) = request else {
        return Err(GeneratorError::UnknownInstantiationTarget(
            quote!(#request).to_string(),
        ));
    };
    let segment = path
        .path
        .segments
        .last()
        .ok_or_else(|| GeneratorError::UnknownInstantiationTarget(quote!(#request).to_string()))?;
    let head = &segment.ident;
    if ctx.projection(&head.to_string()).is_none() {
        return Err(GeneratorError::UnknownInstantiationTarget(head.to_string()));
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return Err(GeneratorError::UnknownInstantiationTarget(format!(
            "{head} (no type arguments)"
        )));
    };

    let mut name = format!("{}{}", merged.prefix, head);
    for arg in &args.args {
        if let GenericArgument::Type(Type::Path(p)) = arg
            && let Some(seg) = p.path.segments.last()
        {
            name.push_str(&seg.ident.to_string().to_upper_camel_case());
        } else {
            return Err(GeneratorError::UnknownInstantiationTarget(
                quote!(#request).to_string(),
            ));
        }
    }
    name.push_str(&merged.suffix);

    let alias = ident(&name);
    let target = project_type(request, ctx, ns);
    Ok(quote!(pub type #alias = #target;))
}
