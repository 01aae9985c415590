//! Mapping emitter: the conversion functions tying each source struct to
//! its concrete declaration. Four functions per pair (assignment and
//! construction, in both directions) plus [`MapTo`] impls so nested
//! composites and generic payloads route through one generic entry point.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::Ident;

use crate::config::JobConfig;
use crate::errors::GeneratorError;
use crate::generators::shape::{classify, ref_map_expr, ValueShape};
use crate::generators::SubGenerator;
use crate::metadata::{GeneratedArtifact, PassContext, Projection, SourceKind, SourceType};
use crate::project::concrete_path;

pub struct MappingGenerator;

impl SubGenerator for MappingGenerator {
    fn name(&self) -> &'static str {
        "mappings"
    }

    fn run(
        &self,
        ctx: &mut PassContext,
        _config: Option<&JobConfig>,
    ) -> Result<Vec<GeneratedArtifact>, GeneratorError> {
        let mut artifacts = Vec::new();
        for (st, projection) in ctx.ordered() {
            if st.kind != SourceKind::Struct {
                continue;
            }
            let tokens = emit_mappings(st, projection, ctx);
            // Mapping code always lands at the module root; the concrete
            // declaration is addressed through its namespace path instead.
            let mut artifact = GeneratedArtifact::code(&st.ident, None, tokens);
            artifact.file_name = format!("{}.map.g.rs", st.ident);
            artifact.uses = projection.merged.uses.clone();
            artifact.path = ctx
                .defaults
                .out_dir
                .as_ref()
                .map(|dir| dir.join(&artifact.file_name));
            artifacts.push(artifact);
        }
        Ok(artifacts)
    }
}

pub fn emit_mappings(st: &SourceType, projection: &Projection, ctx: &PassContext) -> TokenStream {
    let merged = &projection.merged;
    let src = &st.ident;
    let dto = concrete_path(projection, None);
    let params = st.type_params();
    let out_params: Vec<Ident> = params.iter().map(|p| format_ident!("{p}Out")).collect();
    let assign_fn = &merged.assign_fn;
    let to_fn = &merged.to_fn;
    let from_fn = &merged.from_fn;

    // The declaration emitter drops ancestor linkage when the pair projects
    // into different namespaces; the mappings have to agree with it.
    let base_field = st.base.as_ref().and_then(|link| {
        let ancestor = ctx.projection(&link.ty.to_string())?;
        (ancestor.namespace == projection.namespace).then(|| link.field.clone())
    });

    let props: Vec<(Ident, Ident, ValueShape)> = st
        .own_props()
        .map(|p| {
            let mut shape = classify(&p.ty, ctx, &params);
            if p.args.map && matches!(shape, ValueShape::Passthrough) {
                // An explicit map flag routes a type the catalog does not
                // know through MapTo, picking up a hand-written impl.
                shape = ValueShape::Struct;
            }
            (p.ident.clone(), p.projected_ident(), shape)
        })
        .collect();

    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();
    let generic = !params.is_empty();
    let dto_out_ty = if generic {
        quote!(#dto<#(#out_params),*>)
    } else {
        quote!(#dto)
    };
    let src_out_ty = if generic {
        quote!(#src<#(#out_params),*>)
    } else {
        quote!(#src)
    };
    let fn_bounds: Vec<TokenStream> = params
        .iter()
        .zip(&out_params)
        .map(|(p, o)| quote!(#p: ::dtoforge::MapTo<#o>))
        .collect();
    let fn_generics = if generic {
        quote!(<#(#out_params),*>)
    } else {
        TokenStream::new()
    };
    let fn_where = if generic {
        quote!(where #(#fn_bounds),*)
    } else {
        TokenStream::new()
    };
    let from_where = if generic {
        quote!(where #(#fn_bounds,)* #src_out_ty: ::core::default::Default)
    } else {
        TokenStream::new()
    };

    // Forward assignment. Ancestor state delegates through the embedded
    // base pair first, then each own property is written.
    let before_hook = merged.hooks.then(|| {
        quote!(::dtoforge::MapHooks::before_assign(self, target);)
    });
    let after_hook = merged.hooks.then(|| {
        quote!(::dtoforge::MapHooks::after_assign(self, target);)
    });
    let base_assign = base_field.as_ref().map(|bf| {
        quote!(::dtoforge::MapTo::assign_to(&self.#bf, &mut target.#bf);)
    });
    let forward_assigns = props.iter().map(|(src_id, dto_id, shape)| {
        let expr = ref_map_expr(quote!(self.#src_id), shape);
        quote!(target.#dto_id = #expr;)
    });
    let forward_assign_fn = quote! {
        pub fn #assign_fn #fn_generics (&self, target: &mut #dto_out_ty) #fn_where {
            #before_hook
            #base_assign
            #(#forward_assigns)*
            #after_hook
        }
    };

    // Forward construction builds the whole value at once; the literal path
    // stays bare so the target parameters are inferred from the return type.
    let base_init = base_field.as_ref().map(|bf| {
        quote!(#bf: ::dtoforge::MapTo::map_to(&self.#bf),)
    });
    let forward_inits = props.iter().map(|(src_id, dto_id, shape)| {
        let expr = ref_map_expr(quote!(self.#src_id), shape);
        quote!(#dto_id: #expr,)
    });
    let forward_construct_fn = quote! {
        pub fn #to_fn #fn_generics (&self) -> #dto_out_ty #fn_where {
            #dto {
                #base_init
                #(#forward_inits)*
            }
        }
    };

    // Backward assignment mirrors the forward one; the value shapes are
    // symmetric so the same mapping expressions apply.
    let backward_assigns = props.iter().map(|(src_id, dto_id, shape)| {
        let expr = ref_map_expr(quote!(self.#dto_id), shape);
        quote!(target.#src_id = #expr;)
    });
    let backward_assign_fn = quote! {
        pub fn #assign_fn #fn_generics (&self, target: &mut #src_out_ty) #fn_where {
            #base_assign
            #(#backward_assigns)*
        }
    };

    // Backward construction seeds a source value and assigns into it, so
    // ignored properties keep their default state.
    let seed = match &merged.factory {
        Some(path) => quote!(let mut value = #path();),
        None => quote!(let mut value: #src_out_ty = ::core::default::Default::default();),
    };
    let backward_construct_fn = quote! {
        pub fn #from_fn #fn_generics (&self) -> #src_out_ty #from_where {
            #seed
            self.#assign_fn(&mut value);
            value
        }
    };

    let forward_generics = mapping_generics(st, &out_params, None);
    let (fwd_ig, _, fwd_wc) = forward_generics.split_for_impl();
    let backward_generics = mapping_generics(st, &out_params, Some(&src_out_ty));
    let (bwd_ig, _, bwd_wc) = backward_generics.split_for_impl();

    quote! {
        impl #impl_generics #src #ty_generics #where_clause {
            #forward_assign_fn
            #forward_construct_fn
        }

        impl #impl_generics #dto #ty_generics #where_clause {
            #backward_assign_fn
            #backward_construct_fn
        }

        impl #fwd_ig ::dtoforge::MapTo<#dto_out_ty> for #src #ty_generics #fwd_wc {
            fn map_to(&self) -> #dto_out_ty {
                self.#to_fn()
            }
            fn assign_to(&self, target: &mut #dto_out_ty) {
                Self::#assign_fn(self, target);
            }
        }

        impl #bwd_ig ::dtoforge::MapTo<#src_out_ty> for #dto #ty_generics #bwd_wc {
            fn map_to(&self) -> #src_out_ty {
                self.#from_fn()
            }
            fn assign_to(&self, target: &mut #src_out_ty) {
                Self::#assign_fn(self, target);
            }
        }
    }
}

/// The source generics widened with one fresh `{Param}Out` parameter per
/// source parameter, each source parameter bounded by `MapTo` onto its
/// counterpart. `default_on` additionally requires `Default` of the named
/// type, which backward construction needs to seed its value.
fn mapping_generics(
    st: &SourceType,
    out_params: &[Ident],
    default_on: Option<&TokenStream>,
) -> syn::Generics {
    let mut generics = st.generics.clone();
    let params = st.type_params();
    for out in out_params {
        generics.params.push(syn::parse_quote!(#out));
    }
    if !out_params.is_empty() {
        let clause = generics.make_where_clause();
        for (param, out) in params.iter().zip(out_params) {
            clause
                .predicates
                .push(syn::parse_quote!(#param: ::dtoforge::MapTo<#out>));
        }
        if let Some(ty) = default_on {
            clause
                .predicates
                .push(syn::parse_quote!(#ty: ::core::default::Default));
        }
    }
    generics
}
