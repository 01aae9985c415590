use proc_macro2::Span;
use syn::Ident;

/// Create an ident at the call site from a plain string.
pub fn ident(name: &str) -> Ident {
    Ident::new(name, Span::call_site())
}

/// Last path segment ident of a `Type::Path`, if any.
pub fn path_last_ident(ty: &syn::Type) -> Option<&Ident> {
    if let syn::Type::Path(tp) = ty {
        tp.path.segments.last().map(|s| &s.ident)
    } else {
        None
    }
}

/// Inner type of `Option<T>`, if `ty` is an `Option`.
pub fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    generic_inner(ty, "Option")
}

/// Inner type of `Vec<T>`, if `ty` is a `Vec`.
pub fn vec_inner(ty: &syn::Type) -> Option<&syn::Type> {
    generic_inner(ty, "Vec")
}

fn generic_inner<'a>(ty: &'a syn::Type, name: &str) -> Option<&'a syn::Type> {
    if let syn::Type::Path(tp) = ty
        && let Some(segment) = tp.path.segments.last()
        && segment.ident == name
        && let syn::PathArguments::AngleBracketed(args) = &segment.arguments
        && let Some(syn::GenericArgument::Type(inner)) = args.args.first()
    {
        return Some(inner);
    }
    None
}
