//! Declaration emitter: the projected declaration pair for each source
//! struct. One capability descriptor (a trait named `I{prefix}{Name}{suffix}`)
//! and one concrete declaration (a struct named `{prefix}{Name}{suffix}`
//! implementing it), with ancestor linkage mirrored one level at a time.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::Ident;

use crate::config::JobConfig;
use crate::errors::GeneratorError;
use crate::generators::SubGenerator;
use crate::metadata::{
    GeneratedArtifact, PassContext, Projection, SourceKind, SourceProperty, SourceType,
};
use crate::project::{bare_struct_projection, capability_path, concrete_path, project_type};

pub struct DeclarationGenerator;

impl SubGenerator for DeclarationGenerator {
    fn name(&self) -> &'static str {
        "declarations"
    }

    fn run(
        &self,
        ctx: &mut PassContext,
        _config: Option<&JobConfig>,
    ) -> Result<Vec<GeneratedArtifact>, GeneratorError> {
        let mut artifacts = Vec::new();
        let mut notes = Vec::new();
        for (st, projection) in ctx.ordered() {
            if st.kind != SourceKind::Struct {
                continue;
            }
            let projection = projection.clone();
            let tokens = emit_pair(st, &projection, ctx, &mut notes);
            let mut artifact = GeneratedArtifact::code(
                &st.ident,
                projection.namespace.clone(),
                tokens,
            );
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

/// Emit the capability descriptor and concrete declaration for one struct,
/// plus the trait impls wiring the concrete type into its ancestor chain.
pub fn emit_pair(
    st: &SourceType,
    projection: &Projection,
    ctx: &PassContext,
    notes: &mut Vec<String>,
) -> TokenStream {
    let merged = &projection.merged;
    let ns = merged.namespace.as_deref();
    let cap = &projection.capability;
    let conc = &projection.concrete;
    let generics = &st.generics;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    // Ancestor linkage: the capability descriptor extends the ancestor's
    // capability descriptor, the concrete declaration embeds the ancestor's
    // concrete declaration. An explicit base override replaces the linkage
    // path.
    let base = st.base.as_ref().and_then(|link| {
        let ancestor = ctx.projection(&link.ty.to_string())?;
        if ancestor.namespace != projection.namespace {
            notes.push(format!(
                "`{}` and its ancestor `{}` project into different namespaces; emitting without base linkage",
                st.ident, link.ty
            ));
            return None;
        }
        Some((link, ancestor))
    });

    let mut supertraits: Vec<syn::Path> = Vec::new();
    if let Some((_, ancestor)) = &base {
        match &merged.base_override {
            Some(path) => supertraits.push(path.clone()),
            None => supertraits.push(capability_path(ancestor, ns)),
        }
    }
    supertraits.extend(merged.capabilities.iter().cloned());

    let own: Vec<&SourceProperty> = st.own_props().collect();
    let params = st.type_params();

    let mut trait_members = Vec::new();
    let mut impl_members = Vec::new();
    for prop in &own {
        let (sig, body) = member_fns(prop, ctx, ns, quote!(self));
        trait_members.extend(sig);
        impl_members.extend(body);
    }

    let trait_decl = if supertraits.is_empty() {
        quote! {
            pub trait #cap #generics #where_clause {
                #(#trait_members)*
            }
        }
    } else {
        quote! {
            pub trait #cap #generics: #(#supertraits)+* #where_clause {
                #(#trait_members)*
            }
        }
    };

    // Concrete declaration.
    let base_field = base.as_ref().map(|(link, ancestor)| {
        let field = &link.field;
        let ty = concrete_path(ancestor, ns);
        quote!(pub #field: #ty,)
    });
    let fields = own.iter().map(|prop| {
        let ident = prop.projected_ident();
        let ty = project_type(&prop.ty, ctx, ns);
        let vis = if prop.args.access.emits_setter() {
            quote!(pub)
        } else {
            // Read-only: reachable through the capability getter, writable
            // only by the generated mappings.
            quote!(pub(crate))
        };
        let retained = if merged.retain_field_attrs || prop.args.retain_attrs {
            let attrs = &prop.retained;
            quote!(#(#attrs)*)
        } else {
            TokenStream::new()
        };
        let prepend = prop.args.prepend.clone().unwrap_or_default();
        quote! {
            #retained
            #prepend
            #vis #ident: #ty,
        }
    });

    let retained = if merged.retain_attrs {
        let attrs = &st.retained;
        quote!(#(#attrs)*)
    } else {
        TokenStream::new()
    };
    let interop = if merged.interop {
        quote! {
            #[derive(::dtoforge::serde::Serialize, ::dtoforge::serde::Deserialize)]
            #[serde(crate = "dtoforge::serde")]
        }
    } else {
        TokenStream::new()
    };
    let prepend = merged.prepend.clone().unwrap_or_default();

    let struct_decl = quote! {
        #retained
        #prepend
        #[derive(Debug, Clone)]
        #interop
        pub struct #conc #generics #where_clause {
            #base_field
            #(#fields)*
        }
    };

    // The concrete declaration implements its own capability descriptor...
    let own_impl = quote! {
        impl #impl_generics #cap #ty_generics for #conc #ty_generics #where_clause {
            #(#impl_members)*
        }
    };

    // ...and satisfies every ancestor capability by delegating through the
    // embedded base, one field hop regardless of chain depth. A property
    // introduced by a projected ancestor is never re-declared here.
    let mut ancestor_impls = Vec::new();
    if let Some((link, _)) = &base {
        let base_field = &link.field;
        let mut receiver = quote!(self.#base_field);
        let mut current = link.ty.clone();
        while let Some(ancestor) = ctx.catalog.get(&current.to_string()) {
            let Some(ancestor_projection) = ctx.projection_of(&ancestor.ident) else {
                break;
            };
            let ancestor_cap = capability_path(ancestor_projection, ns);
            let mut delegated = Vec::new();
            for prop in ancestor.own_props() {
                let (_, body) = member_fns(prop, ctx, ns, receiver.clone());
                delegated.extend(body);
            }
            ancestor_impls.push(quote! {
                impl #impl_generics #ancestor_cap for #conc #ty_generics #where_clause {
                    #(#delegated)*
                }
            });
            // Each mirrored base embeds the next one, so the field path
            // grows with chain depth. Stop where the chain itself stopped
            // mirroring (unlinked or cross-namespace ancestors).
            match &ancestor.base {
                Some(next) => {
                    let linked = ctx
                        .projection(&next.ty.to_string())
                        .is_some_and(|p| p.namespace == ancestor_projection.namespace);
                    if !linked {
                        break;
                    }
                    let field = &next.field;
                    receiver = quote!(#receiver.#field);
                    current = next.ty.clone();
                }
                None => break,
            }
        }
    }

    // Covariant re-declarations: where the capability widens a composite to
    // a trait object, the concrete declaration re-exposes the narrow type.
    let narrow: Vec<TokenStream> = own
        .iter()
        .filter(|p| p.args.access.emits_getter() && !params_shadow(&params, p))
        .filter_map(|p| {
            let nested = bare_struct_projection(&p.ty, ctx)?;
            let getter = p.projected_ident();
            let ident = p.projected_ident();
            let ty = concrete_path(nested, ns);
            Some(quote! {
                pub fn #getter(&self) -> &#ty {
                    &self.#ident
                }
            })
        })
        .collect();
    let narrow_impl = if narrow.is_empty() {
        TokenStream::new()
    } else {
        quote! {
            impl #impl_generics #conc #ty_generics #where_clause {
                #(#narrow)*
            }
        }
    };

    quote! {
        #trait_decl
        #struct_decl
        #own_impl
        #(#ancestor_impls)*
        #narrow_impl
    }
}

fn params_shadow(params: &[Ident], prop: &SourceProperty) -> bool {
    crate::util::path_last_ident(&prop.ty).is_some_and(|id| params.contains(id))
}

/// Trait signatures and implementing bodies for one property. `receiver`
/// is the access path to the struct carrying the field (`self` for own
/// properties, `self.base` when delegating to an embedded ancestor).
fn member_fns(
    prop: &SourceProperty,
    ctx: &PassContext,
    ns: Option<&str>,
    receiver: TokenStream,
) -> (Vec<TokenStream>, Vec<TokenStream>) {
    let ident = prop.projected_ident();
    let getter = ident.clone();
    let setter = format_ident!("set_{}", ident);
    let ty = project_type(&prop.ty, ctx, ns);
    let access = prop.args.access;
    let bare = bare_struct_projection(&prop.ty, ctx);

    let mut sigs = Vec::new();
    let mut bodies = Vec::new();
    if access.emits_getter() {
        match bare {
            Some(nested) => {
                // Capability descriptors reference other capability
                // descriptors; the concrete type coerces at the impl site.
                let cap = capability_path(nested, ns);
                sigs.push(quote!(fn #getter(&self) -> &dyn #cap;));
                bodies.push(quote! {
                    fn #getter(&self) -> &dyn #cap {
                        &#receiver.#ident
                    }
                });
            }
            None => {
                sigs.push(quote!(fn #getter(&self) -> &#ty;));
                bodies.push(quote! {
                    fn #getter(&self) -> &#ty {
                        &#receiver.#ident
                    }
                });
            }
        }
    }
    if access.emits_setter() && bare.is_none() {
        sigs.push(quote!(fn #setter(&mut self, value: #ty);));
        bodies.push(quote! {
            fn #setter(&mut self, value: #ty) {
                #receiver.#ident = value;
            }
        });
    }
    (sigs, bodies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::PassDefaults;
    use crate::util::ident;
    use syn::parse_quote;

    fn ctx_for(module: syn::ItemMod) -> PassContext {
        let mut diagnostics = Vec::new();
        let catalog = Catalog::collect(&module, &mut diagnostics).unwrap();
        PassContext::build(catalog, PassDefaults::default(), ident("model")).unwrap()
    }

    fn emitted(module: syn::ItemMod, name: &str) -> String {
        let ctx = ctx_for(module);
        let st = ctx.catalog.get(name).unwrap();
        let projection = ctx.projection(name).unwrap().clone();
        let mut notes = Vec::new();
        emit_pair(st, &projection, &ctx, &mut notes).to_string()
    }

    #[test]
    fn test_scenario_a_names() {
        let rendered = emitted(
            parse_quote! {
                mod model {
                    #[dto(suffix = "Dto")]
                    pub struct Address {
                        pub street: String,
                        pub city: String,
                        pub country: String,
                    }
                }
            },
            "Address",
        );
        assert!(rendered.contains("pub trait IAddressDto"));
        assert!(rendered.contains("pub struct AddressDto"));
        assert!(rendered.contains("impl IAddressDto for AddressDto"));
        assert!(rendered.contains("fn street (& self) -> & String"));
        assert!(rendered.contains("fn set_street (& mut self , value : String)"));
    }

    #[test]
    fn test_ancestor_linkage() {
        let module: syn::ItemMod = parse_quote! {
            mod model {
                #[dto(suffix = "Dto")]
                pub struct EntityBase {
                    pub id: u64,
                }
                #[dto(suffix = "Dto", extends = EntityBase)]
                pub struct Address {
                    pub base: EntityBase,
                    pub street: String,
                }
            }
        };
        let rendered = emitted(module, "Address");
        assert!(rendered.contains("pub trait IAddressDto : IEntityBaseDto"));
        assert!(rendered.contains("pub base : EntityBaseDto"));
        // Delegation impl, not a re-declaration of the inherited property.
        assert!(rendered.contains("impl IEntityBaseDto for AddressDto"));
        assert!(rendered.contains("& self . base . id"));
        assert!(!rendered.contains("fn id (& self) -> & u64 { & self . id }"));
    }

    #[test]
    fn test_ignored_property_is_absent() {
        let rendered = emitted(
            parse_quote! {
                mod model {
                    #[dto(suffix = "Dto")]
                    pub struct Address {
                        pub street: String,
                        #[dto_field(ignore)]
                        pub audit_token: String,
                    }
                }
            },
            "Address",
        );
        assert!(!rendered.contains("audit_token"));
    }

    #[test]
    fn test_read_only_has_no_setter() {
        let rendered = emitted(
            parse_quote! {
                mod model {
                    #[dto(suffix = "Dto")]
                    pub struct Account {
                        #[dto_field(access = "read_only")]
                        pub balance: i64,
                    }
                }
            },
            "Account",
        );
        assert!(rendered.contains("fn balance (& self) -> & i64"));
        assert!(!rendered.contains("set_balance"));
        assert!(rendered.contains("pub (crate) balance"));
    }

    #[test]
    fn test_composite_widens_in_capability_and_narrows_on_concrete() {
        let module: syn::ItemMod = parse_quote! {
            mod model {
                #[dto(suffix = "Dto")]
                pub struct City {
                    pub name: String,
                }
                #[dto(suffix = "Dto")]
                pub struct Address {
                    pub city: City,
                }
            }
        };
        let rendered = emitted(module, "Address");
        assert!(rendered.contains("fn city (& self) -> & dyn ICityDto ;"));
        assert!(rendered.contains("pub fn city (& self) -> & CityDto"));
        assert!(rendered.contains("pub city : CityDto"));
    }

    #[test]
    fn test_rename_and_extra_capabilities() {
        let rendered = emitted(
            parse_quote! {
                mod model {
                    #[dto(rename = "WireAddress", capabilities(::core::fmt::Debug))]
                    pub struct Address {
                        #[dto_field(rename = "town")]
                        pub city: String,
                    }
                }
            },
            "Address",
        );
        assert!(rendered.contains("pub trait IWireAddress : :: core :: fmt :: Debug"));
        assert!(rendered.contains("pub struct WireAddress"));
        assert!(rendered.contains("fn town (& self)"));
        assert!(!rendered.contains("fn city"));
    }

    #[test]
    fn test_retained_and_prepended_attrs_land_on_the_pair() {
        let rendered = emitted(
            parse_quote! {
                mod model {
                    #[dto(suffix = "Dto", retain_attrs, prepend = "#[derive(PartialEq)]")]
                    #[non_exhaustive]
                    pub struct Address {
                        #[dto_field(retain_attrs, prepend = "#[doc = \"wire form\"]")]
                        #[serde(rename = "zip")]
                        pub zip_code: String,
                    }
                }
            },
            "Address",
        );
        assert!(rendered.contains("# [non_exhaustive] # [derive (PartialEq)]"));
        assert!(rendered.contains("# [serde (rename = \"zip\")] # [doc = \"wire form\"] pub zip_code : String"));
    }

    #[test]
    fn test_attrs_are_dropped_without_retention() {
        let rendered = emitted(
            parse_quote! {
                mod model {
                    #[dto(suffix = "Dto")]
                    #[non_exhaustive]
                    pub struct Address {
                        #[serde(rename = "zip")]
                        pub zip_code: String,
                    }
                }
            },
            "Address",
        );
        assert!(!rendered.contains("non_exhaustive"));
        assert!(!rendered.contains("serde"));
    }

    #[test]
    fn test_base_override_replaces_the_supertrait() {
        let module: syn::ItemMod = parse_quote! {
            mod model {
                #[dto(suffix = "Dto")]
                pub struct EntityBase {
                    pub id: u64,
                }
                #[dto(suffix = "Dto", extends = EntityBase, base = crate::Versioned)]
                pub struct Address {
                    pub base: EntityBase,
                    pub street: String,
                }
            }
        };
        let rendered = emitted(module, "Address");
        // The override swaps only the declared supertrait; implementing it
        // stays with the caller.
        assert!(rendered.contains("pub trait IAddressDto : crate :: Versioned"));
        // Physical linkage still runs through the mirrored ancestor.
        assert!(rendered.contains("pub base : EntityBaseDto"));
        assert!(rendered.contains("impl IEntityBaseDto for AddressDto"));
    }

    #[test]
    fn test_generics_carry_over() {
        let rendered = emitted(
            parse_quote! {
                mod model {
                    #[dto(suffix = "Dto")]
                    pub struct Page<T> {
                        pub items: Vec<T>,
                        pub total: u64,
                    }
                }
            },
            "Page",
        );
        assert!(rendered.contains("pub trait IPageDto < T >"));
        assert!(rendered.contains("pub struct PageDto < T >"));
        assert!(rendered.contains("impl < T > IPageDto < T > for PageDto < T >"));
    }
}
