//! Type projection: rewriting a property's declared type so that every
//! reference to an annotated source type resolves to its projected name.
//!
//! Optionality is unwrapped, the inner type substituted, and optionality
//! re-applied; `Option`, `Vec` and projected generic heads recurse through
//! their type arguments, preserving arity. Everything else passes through
//! untouched, so an optional source property can never project to a
//! non-optional result.

use proc_macro2::Span;
use syn::{GenericArgument, Ident, PathArguments, Type};

use crate::metadata::{PassContext, Projection, SourceKind};

/// Build the path that names `target` when referenced from namespace
/// `from_ns`. Namespaces are single-level generated modules, so the relative
/// forms are: same namespace -> bare ident, root -> namespace ->
/// `ns::Name`, namespace -> root -> `super::Name`, namespace a ->
/// namespace b -> `super::b::Name`.
pub fn ns_qualified(target_ns: Option<&str>, from_ns: Option<&str>, name: &Ident) -> syn::Path {
    let ns_ident = |ns: &str| Ident::new(ns, Span::call_site());
    match (target_ns, from_ns) {
        (None, None) => name.clone().into(),
        (Some(t), None) => {
            let t = ns_ident(t);
            syn::parse_quote!(#t::#name)
        }
        (None, Some(_)) => syn::parse_quote!(super::#name),
        (Some(t), Some(f)) if t == f => name.clone().into(),
        (Some(t), Some(_)) => {
            let t = ns_ident(t);
            syn::parse_quote!(super::#t::#name)
        }
    }
}

/// Path of the concrete projected declaration, relative to `from_ns`.
pub fn concrete_path(projection: &Projection, from_ns: Option<&str>) -> syn::Path {
    ns_qualified(projection.namespace.as_deref(), from_ns, &projection.concrete)
}

/// Path of the capability descriptor, relative to `from_ns`.
pub fn capability_path(projection: &Projection, from_ns: Option<&str>) -> syn::Path {
    ns_qualified(
        projection.namespace.as_deref(),
        from_ns,
        &projection.capability,
    )
}

/// Project one declared type. `from_ns` is the namespace of the declaration
/// being emitted, so cross-namespace references come out correctly qualified.
pub fn project_type(ty: &Type, ctx: &PassContext, from_ns: Option<&str>) -> Type {
    match ty {
        Type::Path(type_path) => {
            let Some(last) = type_path.path.segments.last() else {
                return ty.clone();
            };
            let name = last.ident.to_string();
            if let Some(projection) = ctx.projection(&name) {
                // A reference to a source type: substitute the memoized
                // projected identity, recursing through type arguments.
                let mut path = concrete_path(projection, from_ns);
                if let PathArguments::AngleBracketed(args) = &last.arguments {
                    let mut args = args.clone();
                    for arg in &mut args.args {
                        if let GenericArgument::Type(inner) = arg {
                            *inner = project_type(inner, ctx, from_ns);
                        }
                    }
                    if let Some(seg) = path.segments.last_mut() {
                        seg.arguments = PathArguments::AngleBracketed(args);
                    }
                }
                return Type::Path(syn::TypePath { qself: None, path });
            }
            match name.as_str() {
                // Optionality and the collection container recurse; the
                // wrapper itself is preserved.
                "Option" | "Vec" => {
                    let mut type_path = type_path.clone();
                    if let Some(seg) = type_path.path.segments.last_mut()
                        && let PathArguments::AngleBracketed(args) = &mut seg.arguments
                    {
                        for arg in &mut args.args {
                            if let GenericArgument::Type(inner) = arg {
                                *inner = project_type(inner, ctx, from_ns);
                            }
                        }
                    }
                    Type::Path(type_path)
                }
                // Unknown generic heads pass through unchanged; mapping for
                // them would have no element-wise entry point.
                _ => ty.clone(),
            }
        }
        Type::Tuple(tuple) => {
            let mut tuple = tuple.clone();
            for elem in &mut tuple.elems {
                *elem = project_type(elem, ctx, from_ns);
            }
            Type::Tuple(tuple)
        }
        Type::Reference(reference) => {
            let mut reference = reference.clone();
            *reference.elem = project_type(&reference.elem, ctx, from_ns);
            Type::Reference(reference)
        }
        _ => ty.clone(),
    }
}

/// A bare (unwrapped, non-generic) reference to a projected struct. These are
/// the positions where the capability descriptor references another
/// capability descriptor instead of the concrete type.
pub fn bare_struct_projection<'a>(ty: &Type, ctx: &'a PassContext) -> Option<&'a Projection> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let last = type_path.path.segments.last()?;
    if !matches!(last.arguments, PathArguments::None) {
        return None;
    }
    let projection = ctx.projection(&last.ident.to_string())?;
    (projection.kind == SourceKind::Struct).then_some(projection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::PassDefaults;
    use crate::util::ident;
    use quote::quote;
    use syn::parse_quote;

    fn ctx() -> PassContext {
        let module: syn::ItemMod = parse_quote! {
            mod model {
                #[dto(suffix = "Dto")]
                pub struct City {
                    pub name: String,
                }
                #[dto(suffix = "Dto", namespace = "wire")]
                pub struct Country {
                    pub name: String,
                }
                #[dto(suffix = "Dto")]
                pub enum Status {
                    Active,
                }
                #[dto(suffix = "Dto")]
                pub struct Page<T> {
                    pub items: Vec<T>,
                }
            }
        };
        let mut diagnostics = Vec::new();
        let catalog = Catalog::collect(&module, &mut diagnostics).unwrap();
        PassContext::build(catalog, PassDefaults::default(), ident("model")).unwrap()
    }

    fn projected(ty: Type) -> String {
        let ctx = ctx();
        let out = project_type(&ty, &ctx, None);
        quote!(#out).to_string()
    }

    #[test]
    fn test_plain_types_pass_through() {
        assert_eq!(projected(parse_quote!(String)), "String");
        assert_eq!(projected(parse_quote!(Option<u64>)), "Option < u64 >");
    }

    #[test]
    fn test_projected_substitution() {
        assert_eq!(projected(parse_quote!(City)), "CityDto");
        assert_eq!(projected(parse_quote!(Status)), "StatusDto");
    }

    #[test]
    fn test_optionality_is_preserved() {
        assert_eq!(projected(parse_quote!(Option<City>)), "Option < CityDto >");
        assert_eq!(
            projected(parse_quote!(Option<Vec<City>>)),
            "Option < Vec < CityDto > >"
        );
    }

    #[test]
    fn test_generic_arguments_recurse_preserving_arity() {
        assert_eq!(projected(parse_quote!(Vec<City>)), "Vec < CityDto >");
        assert_eq!(projected(parse_quote!(Page<City>)), "PageDto < CityDto >");
        assert_eq!(
            projected(parse_quote!(Page<Option<City>>)),
            "PageDto < Option < CityDto > >"
        );
    }

    #[test]
    fn test_namespace_qualification() {
        assert_eq!(projected(parse_quote!(Country)), "wire :: CountryDto");
        let ctx = ctx();
        let ty: Type = parse_quote!(City);
        let from_wire = project_type(&ty, &ctx, Some("wire"));
        assert_eq!(quote!(#from_wire).to_string(), "super :: CityDto");
        let ty: Type = parse_quote!(Country);
        let within = project_type(&ty, &ctx, Some("wire"));
        assert_eq!(quote!(#within).to_string(), "CountryDto");
    }

    #[test]
    fn test_unknown_generic_heads_pass_through() {
        assert_eq!(
            projected(parse_quote!(std::collections::HashMap<String, City>)),
            "std :: collections :: HashMap < String , City >"
        );
    }

    #[test]
    fn test_bare_struct_projection_detection() {
        let ctx = ctx();
        assert!(bare_struct_projection(&parse_quote!(City), &ctx).is_some());
        // Enums mirror to enums, not capability pairs.
        assert!(bare_struct_projection(&parse_quote!(Status), &ctx).is_none());
        assert!(bare_struct_projection(&parse_quote!(Option<City>), &ctx).is_none());
        assert!(bare_struct_projection(&parse_quote!(String), &ctx).is_none());
    }
}
