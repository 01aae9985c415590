//! Metadata snapshot of the annotated type universe, and the pass-scoped
//! context threaded through every generation stage.
//!
//! Nothing here outlives one macro expansion: the catalog, the projection
//! memo and the diagnostics all belong to a single [`PassContext`] owned by
//! the driver.

use std::collections::HashMap;
use std::path::PathBuf;

use proc_macro2::TokenStream;
use syn::{Attribute, Generics, Ident, Type, Variant};

use crate::attrs::{DtoArgs, FieldArgs, MergedAttribute, resolve_merged};
use crate::catalog::Catalog;
use crate::config::PassDefaults;
use crate::util::ident;

/// Ancestor linkage of one source type: the base type's ident and the
/// embedding field that carries it.
#[derive(Debug, Clone)]
pub struct BaseLink {
    pub ty: Ident,
    pub field: Ident,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Struct,
    Enum,
}

/// One declared property of a source struct.
#[derive(Debug, Clone)]
pub struct SourceProperty {
    pub ident: Ident,
    pub ty: Type,
    pub args: FieldArgs,
    /// Non-dto attributes, candidates for attribute retention.
    pub retained: Vec<Attribute>,
}

impl SourceProperty {
    /// Generated-side name of this property (rename override honored).
    pub fn projected_ident(&self) -> Ident {
        match &self.args.rename {
            Some(name) => ident(name),
            None => self.ident.clone(),
        }
    }
}

/// Immutable snapshot of one annotated type, valid for a single pass.
#[derive(Debug, Clone)]
pub struct SourceType {
    pub ident: Ident,
    pub generics: Generics,
    pub kind: SourceKind,
    pub props: Vec<SourceProperty>,
    pub variants: Vec<Variant>,
    pub base: Option<BaseLink>,
    pub args: DtoArgs,
    /// Non-dto attributes on the item itself, candidates for retention.
    pub retained: Vec<Attribute>,
    /// Added by the cascade sweep rather than a direct annotation.
    pub cascaded: bool,
}

impl SourceType {
    /// Own declared properties: everything except the base-link field and
    /// ignored properties. This is the set both declarations and mappings
    /// operate on, so an ignored property appears in neither.
    pub fn own_props(&self) -> impl Iterator<Item = &SourceProperty> {
        let base_field = self.base.as_ref().map(|b| b.field.clone());
        self.props
            .iter()
            .filter(move |p| !p.args.ignore && Some(&p.ident) != base_field.as_ref())
    }

    pub fn type_params(&self) -> Vec<Ident> {
        self.generics.type_params().map(|p| p.ident.clone()).collect()
    }
}

/// Memoized projected identity of one source type. Every cross-reference to
/// the same source resolves through the same `Projection` within a pass.
#[derive(Debug, Clone)]
pub struct Projection {
    pub source: Ident,
    pub capability: Ident,
    pub concrete: Ident,
    pub namespace: Option<String>,
    pub kind: SourceKind,
    pub merged: MergedAttribute,
}

/// One unit of produced output plus its routing destination. A missing path
/// hands the tokens back to the compilation; a present path materializes the
/// rendered text to storage instead.
#[derive(Debug)]
pub struct GeneratedArtifact {
    pub file_name: String,
    pub namespace: Option<String>,
    pub tokens: TokenStream,
    /// Pre-rendered text for non-code artifacts (documentation exports).
    pub text: Option<String>,
    pub path: Option<PathBuf>,
    pub uses: Vec<syn::Path>,
    /// Source identity recorded in the materialization header.
    pub source: String,
}

impl GeneratedArtifact {
    pub fn code(source: &Ident, namespace: Option<String>, tokens: TokenStream) -> Self {
        GeneratedArtifact {
            file_name: format!("{source}.g.rs"),
            namespace,
            tokens,
            text: None,
            path: None,
            uses: Vec::new(),
            source: source.to_string(),
        }
    }
}

/// The explicit context object threaded through every stage of one pass:
/// catalog, projection memo, resolved-attribute cache and diagnostics.
/// No global mutable state exists anywhere in the generator.
#[derive(Debug)]
pub struct PassContext {
    pub catalog: Catalog,
    pub defaults: PassDefaults,
    pub module_ident: Ident,
    pub diagnostics: Vec<String>,
    projections: HashMap<String, Projection>,
    order: Vec<String>,
}

impl PassContext {
    /// Resolve every collected type's merged attribute and projected
    /// identity up front. Projected-name collisions within one namespace are
    /// a configuration error, surfaced as a compile error rather than
    /// silently renamed.
    pub fn build(
        catalog: Catalog,
        defaults: PassDefaults,
        module_ident: Ident,
    ) -> syn::Result<Self> {
        let mut projections = HashMap::new();
        let mut order = Vec::new();
        let mut claimed: HashMap<(Option<String>, String), Ident> = HashMap::new();
        for st in catalog.types() {
            let merged = resolve_merged(&st.args, &defaults);
            let concrete_name = merged.concrete_name(&st.ident);
            let key = (merged.namespace.clone(), concrete_name.clone());
            if let Some(previous) = claimed.get(&key) {
                return Err(syn::Error::new(
                    st.ident.span(),
                    format!(
                        "projected name `{concrete_name}` for `{}` collides with the projection of `{previous}` in the same namespace",
                        st.ident
                    ),
                ));
            }
            claimed.insert(key, st.ident.clone());
            let projection = Projection {
                source: st.ident.clone(),
                capability: ident(&merged.capability_name(&st.ident)),
                concrete: ident(&concrete_name),
                namespace: merged.namespace.clone(),
                kind: st.kind,
                merged,
            };
            order.push(st.ident.to_string());
            projections.insert(st.ident.to_string(), projection);
        }
        Ok(PassContext {
            catalog,
            defaults,
            module_ident,
            diagnostics: Vec::new(),
            projections,
            order,
        })
    }

    pub fn projection(&self, source: &str) -> Option<&Projection> {
        self.projections.get(source)
    }

    pub fn projection_of(&self, source: &Ident) -> Option<&Projection> {
        self.projections.get(&source.to_string())
    }

    /// Source types in deterministic (declaration) order.
    pub fn ordered(&self) -> impl Iterator<Item = (&SourceType, &Projection)> {
        self.order.iter().filter_map(|name| {
            let st = self.catalog.get(name)?;
            let p = self.projections.get(name)?;
            Some((st, p))
        })
    }

    pub fn diagnose(&mut self, message: impl Into<String>) {
        self.diagnostics.push(message.into());
    }

    /// Whether any type projecting into `ns` opted into the glob import of
    /// its parent module. The router emits `use super::*;` for the whole
    /// namespace group when at least one member asks for it.
    pub fn namespace_auto_imports(&self, ns: &str) -> bool {
        self.projections
            .values()
            .any(|p| p.namespace.as_deref() == Some(ns) && p.merged.auto_imports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use syn::parse_quote;

    fn catalog_for(module: syn::ItemMod) -> Catalog {
        let mut diagnostics = Vec::new();
        Catalog::collect(&module, &mut diagnostics).unwrap()
    }

    #[test]
    fn test_projection_memo_is_consistent() {
        let catalog = catalog_for(parse_quote! {
            mod model {
                #[dto(suffix = "Dto")]
                pub struct Address {
                    pub street: String,
                }
            }
        });
        let ctx =
            PassContext::build(catalog, PassDefaults::default(), ident("model")).unwrap();
        let first = ctx.projection("Address").unwrap().concrete.to_string();
        let second = ctx.projection("Address").unwrap().concrete.to_string();
        assert_eq!(first, "AddressDto");
        assert_eq!(first, second);
    }

    #[test]
    fn test_name_collision_is_an_error() {
        let catalog = catalog_for(parse_quote! {
            mod model {
                #[dto(rename = "Wire")]
                pub struct A {
                    pub x: u64,
                }
                #[dto(rename = "Wire")]
                pub struct B {
                    pub y: u64,
                }
            }
        });
        let err = PassContext::build(catalog, PassDefaults::default(), ident("model"))
            .unwrap_err();
        assert!(err.to_string().contains("collides"));
    }

    #[test]
    fn test_own_props_excludes_base_and_ignored() {
        let catalog = catalog_for(parse_quote! {
            mod model {
                #[dto(suffix = "Dto", cascade)]
                pub struct EntityBase {
                    pub id: u64,
                }
                #[dto(suffix = "Dto", extends = EntityBase)]
                pub struct Address {
                    pub base: EntityBase,
                    pub street: String,
                    #[dto_field(ignore)]
                    pub secret: String,
                }
            }
        });
        let address = catalog.get("Address").unwrap();
        let names: Vec<_> = address.own_props().map(|p| p.ident.to_string()).collect();
        assert_eq!(names, ["street"]);
    }
}
