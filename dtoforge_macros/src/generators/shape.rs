//! Value-shape analysis shared by the mapping and enum-mirror emitters:
//! how one property value travels from source to projection (or back).
//!
//! Composite values go through the generic mapping entry point
//! (`dtoforge::MapTo::map_to`) rather than being inlined, so recursive
//! projection graphs terminate without code duplication. Scalars are copied
//! directly.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Ident, Type};

use crate::metadata::{PassContext, SourceKind};
use crate::util::{option_inner, path_last_ident, vec_inner};

#[derive(Debug, Clone, PartialEq)]
pub enum ValueShape {
    /// No projected type anywhere inside: copied directly.
    Passthrough,
    /// A generic type parameter of the source type: mapped through the
    /// entry point so closed instantiations pick the right target.
    Param,
    /// A projected struct (possibly a generic head with its own arguments).
    Struct,
    /// A mirrored enum: converted through the generated `From` impls.
    Enum,
    OptionOf(Box<ValueShape>),
    VecOf(Box<ValueShape>),
}

impl ValueShape {
    pub fn has_projection(&self) -> bool {
        match self {
            ValueShape::Passthrough => false,
            ValueShape::Param | ValueShape::Struct | ValueShape::Enum => true,
            ValueShape::OptionOf(inner) | ValueShape::VecOf(inner) => inner.has_projection(),
        }
    }
}

pub fn classify(ty: &Type, ctx: &PassContext, params: &[Ident]) -> ValueShape {
    if let Some(inner) = option_inner(ty) {
        return ValueShape::OptionOf(Box::new(classify(inner, ctx, params)));
    }
    if let Some(inner) = vec_inner(ty) {
        return ValueShape::VecOf(Box::new(classify(inner, ctx, params)));
    }
    if let Some(ident) = path_last_ident(ty) {
        if params.contains(ident) {
            return ValueShape::Param;
        }
        if let Some(projection) = ctx.projection(&ident.to_string()) {
            return match projection.kind {
                SourceKind::Struct => ValueShape::Struct,
                SourceKind::Enum => ValueShape::Enum,
            };
        }
    }
    ValueShape::Passthrough
}

/// Expression mapping `access` (a place expression such as `self.city`) to
/// an owned projected value. Used by the assign and construct emitters.
pub fn ref_map_expr(access: TokenStream, shape: &ValueShape) -> TokenStream {
    if !shape.has_projection() {
        return quote!(#access.clone());
    }
    // Closure variables introduced by the wrappers are already references;
    // the top-level access is a place expression that still needs borrowing.
    ref_map_at(access, shape, 0, false)
}

fn ref_map_at(access: TokenStream, shape: &ValueShape, depth: usize, is_ref: bool) -> TokenStream {
    match shape {
        ValueShape::Passthrough => quote!(#access.clone()),
        ValueShape::Param | ValueShape::Struct => {
            if is_ref {
                quote!(::dtoforge::MapTo::map_to(#access))
            } else {
                quote!(::dtoforge::MapTo::map_to(&#access))
            }
        }
        ValueShape::Enum => quote!(::core::convert::Into::into(#access.clone())),
        ValueShape::OptionOf(inner) => {
            let var = format_ident!("v{depth}");
            let body = ref_map_at(quote!(#var), inner, depth + 1, true);
            quote!(#access.as_ref().map(|#var| #body))
        }
        ValueShape::VecOf(inner) => {
            let var = format_ident!("v{depth}");
            let body = ref_map_at(quote!(#var), inner, depth + 1, true);
            quote!(#access.iter().map(|#var| #body).collect())
        }
    }
}

/// Expression mapping an owned value, for enum variant payloads moved out of
/// a `match` binding.
pub fn owned_map_expr(expr: TokenStream, shape: &ValueShape) -> TokenStream {
    if !shape.has_projection() {
        return expr;
    }
    owned_map_at(expr, shape, 0)
}

fn owned_map_at(expr: TokenStream, shape: &ValueShape, depth: usize) -> TokenStream {
    match shape {
        ValueShape::Passthrough => expr,
        ValueShape::Param | ValueShape::Struct => {
            quote!(::dtoforge::MapTo::map_to(&#expr))
        }
        ValueShape::Enum => quote!(::core::convert::Into::into(#expr)),
        ValueShape::OptionOf(inner) => {
            let var = format_ident!("v{depth}");
            let body = owned_map_at(quote!(#var), inner, depth + 1);
            quote!(#expr.map(|#var| #body))
        }
        ValueShape::VecOf(inner) => {
            let var = format_ident!("v{depth}");
            let body = owned_map_at(quote!(#var), inner, depth + 1);
            quote!(#expr.into_iter().map(|#var| #body).collect())
        }
    }
}
