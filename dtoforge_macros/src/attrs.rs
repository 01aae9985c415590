//! Typed parsing of the `#[dto(...)]` and `#[dto_field(...)]` annotations,
//! and the layered resolution that turns them into one fully-populated
//! configuration value per source type.
//!
//! Precedence, field by field: per-property override > per-class annotation >
//! pass-wide defaults from the job configuration > built-in default.

use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use syn::{Attribute, Ident, LitStr, Token, punctuated::Punctuated};

use crate::config::PassDefaults;
use crate::util::ident;

/// Raw, possibly-partial `#[dto(...)]` arguments as written on a type.
///
/// Every field is optional so a malformed annotation can degrade to whatever
/// was parsed before the error, instead of failing the whole pass.
#[derive(Debug, Default, Clone)]
pub struct DtoArgs {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub rename: Option<String>,
    pub namespace: Option<String>,
    pub cascade: bool,
    pub interop: Option<bool>,
    pub extends: Option<Ident>,
    pub base_override: Option<syn::Path>,
    pub capabilities: Vec<syn::Path>,
    pub uses: Vec<syn::Path>,
    pub auto_imports: bool,
    pub prepend: Option<TokenStream>,
    pub retain_attrs: bool,
    pub retain_field_attrs: bool,
    pub assign_fn: Option<String>,
    pub to_fn: Option<String>,
    pub from_fn: Option<String>,
    pub factory: Option<syn::Path>,
    pub instantiate: Vec<syn::Type>,
    pub hooks: bool,
}

impl DtoArgs {
    /// Parse a `#[dto(...)]` attribute. On a malformed argument the fields
    /// parsed so far are kept and the error is returned alongside them, so
    /// the caller can record a diagnostic and continue with a partial value.
    pub fn from_attr(attr: &Attribute) -> (Self, Option<syn::Error>) {
        let mut args = DtoArgs::default();
        if matches!(attr.meta, syn::Meta::Path(_)) {
            // Bare `#[dto]`: everything resolves through the fallback chain.
            return (args, None);
        }
        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("prefix") {
                args.prefix = Some(fragment_value(&meta, true)?);
            } else if meta.path.is_ident("suffix") {
                args.suffix = Some(fragment_value(&meta, false)?);
            } else if meta.path.is_ident("rename") {
                args.rename = Some(ident_value(&meta)?);
            } else if meta.path.is_ident("namespace") {
                args.namespace = Some(ident_value(&meta)?);
            } else if meta.path.is_ident("cascade") {
                args.cascade = true;
            } else if meta.path.is_ident("interop") {
                args.interop = Some(true);
            } else if meta.path.is_ident("extends") {
                args.extends = Some(meta.value()?.parse::<Ident>()?);
            } else if meta.path.is_ident("base") {
                args.base_override = Some(meta.value()?.parse::<syn::Path>()?);
            } else if meta.path.is_ident("capabilities") {
                let content;
                syn::parenthesized!(content in meta.input);
                for p in Punctuated::<syn::Path, Token![,]>::parse_terminated(&content)? {
                    args.capabilities.push(p);
                }
            } else if meta.path.is_ident("uses") {
                let content;
                syn::parenthesized!(content in meta.input);
                for p in Punctuated::<syn::Path, Token![,]>::parse_terminated(&content)? {
                    args.uses.push(p);
                }
            } else if meta.path.is_ident("auto_imports") {
                args.auto_imports = true;
            } else if meta.path.is_ident("prepend") {
                let lit = meta.value()?.parse::<LitStr>()?;
                let tokens: TokenStream = lit
                    .value()
                    .parse()
                    .map_err(|_| meta.error("prepend text is not valid Rust tokens"))?;
                args.prepend = Some(tokens);
            } else if meta.path.is_ident("retain_attrs") {
                args.retain_attrs = true;
            } else if meta.path.is_ident("retain_field_attrs") {
                args.retain_field_attrs = true;
            } else if meta.path.is_ident("assign_fn") {
                args.assign_fn = Some(ident_value(&meta)?);
            } else if meta.path.is_ident("to_fn") {
                args.to_fn = Some(ident_value(&meta)?);
            } else if meta.path.is_ident("from_fn") {
                args.from_fn = Some(ident_value(&meta)?);
            } else if meta.path.is_ident("factory") {
                args.factory = Some(meta.value()?.parse::<syn::Path>()?);
            } else if meta.path.is_ident("instantiate") {
                let content;
                syn::parenthesized!(content in meta.input);
                for t in Punctuated::<syn::Type, Token![,]>::parse_terminated(&content)? {
                    args.instantiate.push(t);
                }
            } else if meta.path.is_ident("hooks") {
                args.hooks = true;
            } else {
                return Err(meta.error("unknown dto argument"));
            }
            Ok(())
        });
        match result {
            Ok(()) => (args, None),
            Err(e) => (args, Some(e)),
        }
    }

    /// Configuration inherited by a cascaded descendant: everything except
    /// the identity-specific pieces of the ancestor annotation.
    pub fn inherited(&self) -> Self {
        let mut args = self.clone();
        args.rename = None;
        args.extends = None;
        args.base_override = None;
        args.instantiate = Vec::new();
        args.prepend = None;
        args
    }
}

/// A string value that becomes an identifier in generated code. Rejected at
/// parse time so a bad override degrades to a diagnostic instead of a panic
/// deep inside emission.
fn ident_value(meta: &syn::meta::ParseNestedMeta) -> syn::Result<String> {
    let lit = meta.value()?.parse::<LitStr>()?;
    let value = lit.value();
    if syn::parse_str::<Ident>(&value).is_err() {
        return Err(syn::Error::new(
            lit.span(),
            format!("`{value}` is not a valid identifier"),
        ));
    }
    Ok(value)
}

/// A name fragment concatenated into generated identifiers. May be empty
/// (clearing a configured default); a leading fragment must stand as an
/// identifier on its own, a trailing one only needs identifier characters.
fn fragment_value(meta: &syn::meta::ParseNestedMeta, leading: bool) -> syn::Result<String> {
    let lit = meta.value()?.parse::<LitStr>()?;
    let value = lit.value();
    let probe = if leading {
        value.clone()
    } else {
        format!("x{value}")
    };
    if !value.is_empty() && syn::parse_str::<Ident>(&probe).is_err() {
        return Err(syn::Error::new(
            lit.span(),
            format!("`{value}` is not usable in an identifier"),
        ));
    }
    Ok(value)
}

/// Capability access level for one projected property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

impl Access {
    pub fn emits_getter(self) -> bool {
        !matches!(self, Access::WriteOnly)
    }

    pub fn emits_setter(self) -> bool {
        !matches!(self, Access::ReadOnly)
    }
}

/// Parsed `#[dto_field(...)]` arguments for one property.
#[derive(Debug, Default, Clone)]
pub struct FieldArgs {
    pub ignore: bool,
    pub rename: Option<String>,
    pub access: Access,
    pub map: bool,
    pub prepend: Option<TokenStream>,
    pub retain_attrs: bool,
}

impl FieldArgs {
    /// Parse all `#[dto_field(...)]` attributes on a field, degrading to a
    /// partial value on malformed input just like [`DtoArgs::from_attr`].
    pub fn from_attrs(attrs: &[Attribute]) -> (Self, Option<syn::Error>) {
        let mut args = FieldArgs::default();
        let mut first_err = None;
        for attr in attrs.iter().filter(|a| a.path().is_ident("dto_field")) {
            if matches!(attr.meta, syn::Meta::Path(_)) {
                continue;
            }
            let result = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("ignore") {
                    args.ignore = true;
                } else if meta.path.is_ident("rename") {
                    args.rename = Some(ident_value(&meta)?);
                } else if meta.path.is_ident("access") {
                    let lit = meta.value()?.parse::<LitStr>()?;
                    args.access = match lit.value().as_str() {
                        "read_write" => Access::ReadWrite,
                        "read_only" => Access::ReadOnly,
                        "write_only" => Access::WriteOnly,
                        other => {
                            return Err(meta.error(format!(
                                "unknown access level `{other}`; expected read_write, read_only or write_only"
                            )));
                        }
                    };
                } else if meta.path.is_ident("map") {
                    args.map = true;
                } else if meta.path.is_ident("prepend") {
                    let lit = meta.value()?.parse::<LitStr>()?;
                    let tokens: TokenStream = lit
                        .value()
                        .parse()
                        .map_err(|_| meta.error("prepend text is not valid Rust tokens"))?;
                    args.prepend = Some(tokens);
                } else if meta.path.is_ident("retain_attrs") {
                    args.retain_attrs = true;
                } else {
                    return Err(meta.error("unknown dto_field argument"));
                }
                Ok(())
            });
            if let Err(e) = result
                && first_err.is_none()
            {
                first_err = Some(e);
            }
        }
        (args, first_err)
    }
}

/// The fully-resolved generation configuration for one source type. Only
/// constructible through [`resolve_merged`], so every field has been taken
/// through the complete fallback chain before anything reads it.
#[derive(Debug, Clone)]
pub struct MergedAttribute {
    pub prefix: String,
    pub suffix: String,
    pub rename: Option<String>,
    pub namespace: Option<String>,
    pub cascade: bool,
    pub interop: bool,
    pub base_override: Option<syn::Path>,
    pub capabilities: Vec<syn::Path>,
    pub uses: Vec<syn::Path>,
    pub auto_imports: bool,
    pub prepend: Option<TokenStream>,
    pub retain_attrs: bool,
    pub retain_field_attrs: bool,
    pub assign_fn: Ident,
    pub to_fn: Ident,
    pub from_fn: Ident,
    pub factory: Option<syn::Path>,
    pub instantiate: Vec<syn::Type>,
    pub hooks: bool,
}

/// Apply the precedence chain to one type's annotation. The per-property
/// level lives on the properties themselves ([`FieldArgs`]) and is honored at
/// emission time.
pub fn resolve_merged(args: &DtoArgs, defaults: &PassDefaults) -> MergedAttribute {
    let prefix = args
        .prefix
        .clone()
        .or_else(|| defaults.prefix.clone())
        .unwrap_or_default();
    let suffix = args
        .suffix
        .clone()
        .or_else(|| defaults.suffix.clone())
        .unwrap_or_default();
    let to_fn = args
        .to_fn
        .clone()
        .or_else(|| defaults.to_fn.clone())
        .unwrap_or_else(|| default_to_fn(&prefix, &suffix));
    let from_fn = args
        .from_fn
        .clone()
        .or_else(|| defaults.from_fn.clone())
        .unwrap_or_else(|| "to_net".to_string());
    let assign_fn = args
        .assign_fn
        .clone()
        .or_else(|| defaults.assign_fn.clone())
        .unwrap_or_else(|| "assign_to".to_string());
    MergedAttribute {
        prefix,
        suffix,
        rename: args.rename.clone(),
        namespace: args.namespace.clone().or_else(|| defaults.namespace.clone()),
        cascade: args.cascade,
        interop: args.interop.or(defaults.interop).unwrap_or(false),
        base_override: args.base_override.clone(),
        capabilities: args.capabilities.clone(),
        uses: args.uses.clone(),
        auto_imports: args.auto_imports,
        prepend: args.prepend.clone(),
        retain_attrs: args.retain_attrs,
        retain_field_attrs: args.retain_field_attrs,
        assign_fn: ident(&assign_fn),
        to_fn: ident(&to_fn),
        from_fn: ident(&from_fn),
        factory: args.factory.clone(),
        instantiate: args.instantiate.clone(),
        hooks: args.hooks,
    }
}

impl MergedAttribute {
    /// Concrete declaration name: explicit override, else prefix + name + suffix.
    pub fn concrete_name(&self, source: &Ident) -> String {
        match &self.rename {
            Some(name) => name.clone(),
            None => format!("{}{}{}", self.prefix, source, self.suffix),
        }
    }

    /// Capability descriptor name: `I` + concrete name.
    pub fn capability_name(&self, source: &Ident) -> String {
        format!("I{}", self.concrete_name(source))
    }
}

fn default_to_fn(prefix: &str, suffix: &str) -> String {
    let decorated = format!("{prefix}{suffix}");
    if decorated.is_empty() {
        "to_dto".to_string()
    } else {
        format!("to_{}", decorated.to_snake_case())
    }
}
