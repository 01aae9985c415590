//! Enum mirror emitter. Each annotated enum gets a mirrored declaration
//! with projected payload types, plus `From` impls in both directions so
//! enum-typed properties convert through plain `Into` calls.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::Fields;

use crate::config::JobConfig;
use crate::errors::GeneratorError;
use crate::generators::shape::{classify, owned_map_expr};
use crate::generators::SubGenerator;
use crate::metadata::{GeneratedArtifact, PassContext, Projection, SourceKind, SourceType};
use crate::project::project_type;

pub struct EnumMirrorGenerator;

impl SubGenerator for EnumMirrorGenerator {
    fn name(&self) -> &'static str {
        "enum mirrors"
    }

    fn run(
        &self,
        ctx: &mut PassContext,
        _config: Option<&JobConfig>,
    ) -> Result<Vec<GeneratedArtifact>, GeneratorError> {
        let mut artifacts = Vec::new();
        let mut notes = Vec::new();
        for (st, projection) in ctx.ordered() {
            if st.kind != SourceKind::Enum {
                continue;
            }
            if !st.generics.params.is_empty() {
                notes.push(format!(
                    "generic enum `{}` cannot be mirrored; skipping",
                    st.ident
                ));
                continue;
            }
            let tokens = emit_mirror(st, projection, ctx);
            let mut artifact =
                GeneratedArtifact::code(&st.ident, projection.namespace.clone(), tokens);
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

pub fn emit_mirror(st: &SourceType, projection: &Projection, ctx: &PassContext) -> TokenStream {
    let merged = &projection.merged;
    let ns = merged.namespace.as_deref();
    let src = &st.ident;
    let mirror = &projection.concrete;

    let variants = st.variants.iter().map(|v| {
        let attrs = if merged.retain_field_attrs {
            let attrs = &v.attrs;
            quote!(#(#attrs)*)
        } else {
            TokenStream::new()
        };
        let ident = &v.ident;
        match &v.fields {
            Fields::Unit => match &v.discriminant {
                Some((_, expr)) => quote!(#attrs #ident = #expr,),
                None => quote!(#attrs #ident,),
            },
            Fields::Unnamed(fields) => {
                let tys = fields.unnamed.iter().map(|f| project_type(&f.ty, ctx, ns));
                quote!(#attrs #ident(#(#tys),*),)
            }
            Fields::Named(fields) => {
                let members = fields.named.iter().map(|f| {
                    let id = &f.ident;
                    let ty = project_type(&f.ty, ctx, ns);
                    quote!(#id: #ty)
                });
                quote!(#attrs #ident { #(#members),* },)
            }
        }
    });

    let interop = if merged.interop {
        quote! {
            #[derive(::dtoforge::serde::Serialize, ::dtoforge::serde::Deserialize)]
            #[serde(crate = "dtoforge::serde")]
        }
    } else {
        TokenStream::new()
    };
    let retained = if merged.retain_attrs {
        let attrs = &st.retained;
        quote!(#(#attrs)*)
    } else {
        TokenStream::new()
    };

    let forward_arms = conversion_arms(st, ctx, quote!(#src), quote!(#mirror));
    let backward_arms = conversion_arms(st, ctx, quote!(#mirror), quote!(#src));

    quote! {
        #retained
        #[derive(Debug, Clone)]
        #interop
        pub enum #mirror {
            #(#variants)*
        }

        impl ::core::convert::From<#src> for #mirror {
            fn from(value: #src) -> Self {
                match value {
                    #(#forward_arms)*
                }
            }
        }

        impl ::core::convert::From<#mirror> for #src {
            fn from(value: #mirror) -> Self {
                match value {
                    #(#backward_arms)*
                }
            }
        }
    }
}

/// One `match` arm per variant, moving payload bindings across with the
/// owned mapping expressions. The value shapes are symmetric, so the same
/// arms serve both conversion directions.
fn conversion_arms(
    st: &SourceType,
    ctx: &PassContext,
    from: TokenStream,
    to: TokenStream,
) -> Vec<TokenStream> {
    st.variants
        .iter()
        .map(|v| {
            let ident = &v.ident;
            match &v.fields {
                Fields::Unit => quote!(#from::#ident => #to::#ident,),
                Fields::Unnamed(fields) => {
                    let binders: Vec<_> = (0..fields.unnamed.len())
                        .map(|i| format_ident!("f{i}"))
                        .collect();
                    let exprs = fields.unnamed.iter().zip(&binders).map(|(f, b)| {
                        let shape = classify(&f.ty, ctx, &[]);
                        owned_map_expr(quote!(#b), &shape)
                    });
                    quote!(#from::#ident(#(#binders),*) => #to::#ident(#(#exprs),*),)
                }
                Fields::Named(fields) => {
                    let names: Vec<_> = fields.named.iter().map(|f| f.ident.clone()).collect();
                    let members = fields.named.iter().map(|f| {
                        let id = &f.ident;
                        let shape = classify(&f.ty, ctx, &[]);
                        let expr = owned_map_expr(quote!(#id), &shape);
                        quote!(#id: #expr)
                    });
                    quote!(#from::#ident { #(#names),* } => #to::#ident { #(#members),* },)
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::PassDefaults;
    use crate::util::ident;
    use syn::parse_quote;

    fn rendered(module: syn::ItemMod, name: &str) -> String {
        let mut diagnostics = Vec::new();
        let catalog = Catalog::collect(&module, &mut diagnostics).unwrap();
        let ctx = PassContext::build(catalog, PassDefaults::default(), ident("model")).unwrap();
        let st = ctx.catalog.get(name).unwrap();
        let projection = ctx.projection(name).unwrap();
        emit_mirror(st, projection, &ctx).to_string()
    }

    #[test]
    fn test_mirror_and_from_impls() {
        let out = rendered(
            parse_quote! {
                mod model {
                    #[dto(suffix = "Dto")]
                    pub enum Status {
                        Active,
                        Legacy(u8),
                        Moved { when: String },
                    }
                }
            },
            "Status",
        );
        assert!(out.contains("pub enum StatusDto"));
        assert!(out.contains("impl :: core :: convert :: From < Status > for StatusDto"));
        assert!(out.contains("impl :: core :: convert :: From < StatusDto > for Status"));
        assert!(out.contains("Status :: Legacy (f0) => StatusDto :: Legacy (f0)"));
        assert!(out.contains("Status :: Moved { when } => StatusDto :: Moved { when : when }"));
    }

    #[test]
    fn test_projected_payload_maps_through_mirror() {
        let out = rendered(
            parse_quote! {
                mod model {
                    #[dto(suffix = "Dto")]
                    pub struct City {
                        pub name: String,
                    }
                    #[dto(suffix = "Dto")]
                    pub enum Location {
                        Known(City),
                        Unknown,
                    }
                }
            },
            "Location",
        );
        assert!(out.contains("Known (CityDto)"));
        assert!(out.contains("Location :: Known (f0) => LocationDto :: Known (:: dtoforge :: MapTo :: map_to (& f0))"));
    }

    #[test]
    fn test_variant_attrs_follow_retention_flags() {
        let module: syn::ItemMod = parse_quote! {
            mod model {
                #[dto(suffix = "Dto", retain_attrs, retain_field_attrs)]
                #[repr(u8)]
                pub enum Status {
                    #[serde(rename = "ok")]
                    Active = 1,
                    Retired = 2,
                }
            }
        };
        let out = rendered(module, "Status");
        assert!(out.contains("# [repr (u8)]"));
        assert!(out.contains("# [serde (rename = \"ok\")] Active = 1"));

        let bare: syn::ItemMod = parse_quote! {
            mod model {
                #[dto(suffix = "Dto")]
                #[repr(u8)]
                pub enum Status {
                    #[serde(rename = "ok")]
                    Active = 1,
                    Retired = 2,
                }
            }
        };
        let out = rendered(bare, "Status");
        assert!(!out.contains("repr"));
        assert!(!out.contains("serde"));
    }

    #[test]
    fn test_generic_enum_is_skipped_with_diagnostic() {
        let module: syn::ItemMod = parse_quote! {
            mod model {
                #[dto(suffix = "Dto")]
                pub enum Maybe<T> {
                    Yes(T),
                    No,
                }
            }
        };
        let mut diagnostics = Vec::new();
        let catalog = Catalog::collect(&module, &mut diagnostics).unwrap();
        let mut ctx = PassContext::build(catalog, PassDefaults::default(), ident("model")).unwrap();
        let artifacts = EnumMirrorGenerator.run(&mut ctx, None).unwrap();
        assert!(artifacts.is_empty());
        assert!(ctx.diagnostics.iter().any(|d| d.contains("Maybe")));
    }
}
