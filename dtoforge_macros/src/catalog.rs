//! Type catalog: one walk over the annotated module per generation pass.
//!
//! Collects every type carrying `#[dto]` directly, then sweeps the remaining
//! types for cascade descendants: a type that embeds a cascade-flagged
//! source type is projected as well, inheriting the ancestor's resolution.

use std::collections::HashMap;

use syn::{Field, Ident, Item, ItemEnum, ItemMod, ItemStruct, Visibility};

use crate::attrs::{DtoArgs, FieldArgs};
use crate::metadata::{BaseLink, SourceKind, SourceProperty, SourceType};

#[derive(Debug)]
pub struct Catalog {
    types: Vec<SourceType>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Walk the module once and build the pass snapshot. Annotation values
    /// that cannot be fully parsed degrade to partial values with a recorded
    /// diagnostic; structural problems (a missing base field, an annotated
    /// tuple struct) are hard configuration errors.
    pub fn collect(module: &ItemMod, diagnostics: &mut Vec<String>) -> syn::Result<Catalog> {
        let mut catalog = Catalog {
            types: Vec::new(),
            index: HashMap::new(),
        };
        let mut plain_structs: Vec<&ItemStruct> = Vec::new();

        let Some((_, items)) = &module.content else {
            return Ok(catalog);
        };
        for item in items {
            match item {
                Item::Struct(item_struct) => {
                    match dto_attr(&item_struct.attrs) {
                        Some(attr) => {
                            let (args, err) = DtoArgs::from_attr(attr);
                            if let Some(e) = err {
                                diagnostics.push(format!(
                                    "partial annotation on `{}`: {e}",
                                    item_struct.ident
                                ));
                            }
                            let st = collect_struct(item_struct, args, false)?;
                            catalog.insert(st);
                        }
                        None => plain_structs.push(item_struct),
                    }
                }
                Item::Enum(item_enum) => {
                    if let Some(attr) = dto_attr(&item_enum.attrs) {
                        let (args, err) = DtoArgs::from_attr(attr);
                        if let Some(e) = err {
                            diagnostics.push(format!(
                                "partial annotation on `{}`: {e}",
                                item_enum.ident
                            ));
                        }
                        catalog.insert(collect_enum(item_enum, args));
                    }
                }
                _ => {}
            }
        }

        catalog.cascade_sweep(&plain_structs)?;
        catalog.resolve_base_links(diagnostics);
        Ok(catalog)
    }

    /// Repeatedly adopt un-annotated structs whose embedded ancestor chain
    /// reaches a cascade-flagged type, until no more are found.
    fn cascade_sweep(&mut self, plain: &[&ItemStruct]) -> syn::Result<()> {
        loop {
            let mut adopted = None;
            for item_struct in plain {
                let name = item_struct.ident.to_string();
                if self.index.contains_key(&name) {
                    continue;
                }
                let Some((ancestor, field)) = self.cascade_ancestor(item_struct) else {
                    continue;
                };
                let inherited = self
                    .get(&ancestor.to_string())
                    .map(|a| a.args.inherited())
                    .unwrap_or_default();
                let mut st = collect_struct(item_struct, inherited, true)?;
                st.base = Some(BaseLink { ty: ancestor, field });
                adopted = Some(st);
                break;
            }
            match adopted {
                Some(st) => self.insert(st),
                None => return Ok(()),
            }
        }
    }

    /// First public field whose type is a cascade-flagged catalogued type.
    fn cascade_ancestor(&self, item_struct: &ItemStruct) -> Option<(Ident, Ident)> {
        let syn::Fields::Named(named) = &item_struct.fields else {
            return None;
        };
        for field in &named.named {
            let Some(field_ident) = &field.ident else {
                continue;
            };
            let Some(ty_ident) = crate::util::path_last_ident(&field.ty) else {
                continue;
            };
            if let Some(ancestor) = self.get(&ty_ident.to_string())
                && ancestor.args.cascade
                && ancestor.kind == SourceKind::Struct
            {
                return Some((ancestor.ident.clone(), field_ident.clone()));
            }
        }
        None
    }

    /// Drop base links whose target is not itself catalogued: per the
    /// contract an un-projected ancestor yields no linkage, and the
    /// embedding field falls back to being an ordinary property.
    fn resolve_base_links(&mut self, diagnostics: &mut Vec<String>) {
        let known: Vec<String> = self.index.keys().cloned().collect();
        for st in &mut self.types {
            if let Some(base) = &st.base
                && !known.contains(&base.ty.to_string())
            {
                diagnostics.push(format!(
                    "`{}` extends `{}`, which is not a projected type; emitting without base linkage",
                    st.ident, base.ty
                ));
                st.base = None;
            }
        }
    }

    fn insert(&mut self, st: SourceType) {
        self.index.insert(st.ident.to_string(), self.types.len());
        self.types.push(st);
    }

    pub fn get(&self, name: &str) -> Option<&SourceType> {
        self.index.get(name).map(|&i| &self.types[i])
    }

    pub fn contains(&self, ident: &Ident) -> bool {
        self.index.contains_key(&ident.to_string())
    }

    pub fn types(&self) -> impl Iterator<Item = &SourceType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn dto_attr(attrs: &[syn::Attribute]) -> Option<&syn::Attribute> {
    attrs.iter().find(|a| a.path().is_ident("dto"))
}

fn collect_struct(
    item_struct: &ItemStruct,
    args: DtoArgs,
    cascaded: bool,
) -> syn::Result<SourceType> {
    let syn::Fields::Named(named) = &item_struct.fields else {
        return Err(syn::Error::new(
            item_struct.ident.span(),
            "only structs with named fields can be projected",
        ));
    };

    let mut props = Vec::new();
    for field in &named.named {
        let Some(field_ident) = &field.ident else {
            continue;
        };
        // Mirror the public shape only.
        if !matches!(field.vis, Visibility::Public(_)) {
            continue;
        }
        let (field_args, err) = FieldArgs::from_attrs(&field.attrs);
        if let Some(e) = err {
            return Err(syn::Error::new(
                field_ident.span(),
                format!("malformed dto_field annotation: {e}"),
            ));
        }
        props.push(SourceProperty {
            ident: field_ident.clone(),
            ty: field.ty.clone(),
            args: field_args,
            retained: retained_attrs(&field.attrs),
        });
    }

    let base = match &args.extends {
        Some(base_ty) => {
            let field = props
                .iter()
                .find(|p| {
                    crate::util::path_last_ident(&p.ty)
                        .is_some_and(|id| id == base_ty)
                })
                .map(|p| p.ident.clone())
                .ok_or_else(|| {
                    syn::Error::new(
                        item_struct.ident.span(),
                        format!(
                            "`{}` declares extends = {base_ty} but embeds no field of that type",
                            item_struct.ident
                        ),
                    )
                })?;
            Some(BaseLink {
                ty: base_ty.clone(),
                field,
            })
        }
        None => None,
    };

    Ok(SourceType {
        ident: item_struct.ident.clone(),
        generics: item_struct.generics.clone(),
        kind: SourceKind::Struct,
        props,
        variants: Vec::new(),
        base,
        args,
        retained: retained_attrs(&item_struct.attrs),
        cascaded,
    })
}

fn collect_enum(item_enum: &ItemEnum, args: DtoArgs) -> SourceType {
    let variants = item_enum
        .variants
        .iter()
        .map(|v| {
            let mut v = v.clone();
            v.attrs.retain(|a| !a.path().is_ident("dto_field"));
            v
        })
        .collect();
    SourceType {
        ident: item_enum.ident.clone(),
        generics: item_enum.generics.clone(),
        kind: SourceKind::Enum,
        props: Vec::new(),
        variants,
        base: None,
        args,
        retained: retained_attrs(&item_enum.attrs),
        cascaded: false,
    }
}

fn retained_attrs(attrs: &[syn::Attribute]) -> Vec<syn::Attribute> {
    attrs
        .iter()
        .filter(|a| {
            !a.path().is_ident("dto")
                && !a.path().is_ident("dto_field")
                // Re-deriving the source's traits on the generated pair
                // conflicts with the pair's own derives.
                && !a.path().is_ident("derive")
        })
        .cloned()
        .collect()
}

/// Remove the inert marker attributes before the module is re-emitted.
pub fn strip_markers(module: &mut ItemMod) {
    let Some((_, items)) = &mut module.content else {
        return;
    };
    for item in items {
        match item {
            Item::Struct(item_struct) => {
                item_struct.attrs.retain(|a| !a.path().is_ident("dto"));
                for field in item_struct.fields.iter_mut() {
                    field.attrs.retain(|a| !a.path().is_ident("dto_field"));
                }
            }
            Item::Enum(item_enum) => {
                item_enum.attrs.retain(|a| !a.path().is_ident("dto"));
                for variant in &mut item_enum.variants {
                    variant.attrs.retain(|a| !a.path().is_ident("dto_field"));
                    for field in variant.fields.iter_mut() {
                        field.attrs.retain(|a| !a.path().is_ident("dto_field"));
                    }
                }
            }
            _ => {}
        }
    }
}
