use std::path::PathBuf;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, ItemMod, LitStr};

use crate::catalog::Catalog;
use crate::metadata::PassContext;

mod attrs;
mod catalog;
mod config;
mod driver;
mod errors;
mod generators;
mod metadata;
mod project;
mod util;

/// Generates mirror types and mapping code for every annotated type in a
/// module.
///
/// The macro walks the module, collects every `#[dto]`-annotated struct and
/// enum, and appends the generated declarations to the module (or writes
/// them to files when an output directory is configured):
///
/// - a capability trait `I{Prefix}{Name}{Suffix}` with getters and setters
///   per property
/// - a concrete struct `{Prefix}{Name}{Suffix}` implementing it, with
///   ancestor linkage mirrored through an embedded base field
/// - mirror enums with `From` impls in both directions
/// - assignment and construction functions in both directions, wired into
///   the generic entry point `dtoforge::MapTo`
///
/// # Arguments
///
/// - `config = "path"` — load exactly this job configuration instead of
///   discovering `dtoforge.toml` / `*.dtoforge.toml` in the manifest
///   directory
/// - `no_config` — skip configuration discovery entirely
///
/// # Example
///
/// ```ignore
/// use dtoforge::{dto_module, MapTo};
///
/// #[dto_module]
/// mod model {
///     #[dto(suffix = "Dto")]
///     #[derive(Clone, Default)]
///     pub struct Address {
///         pub street: String,
///         pub city: String,
///     }
/// }
///
/// let addr = model::Address { street: "1 Main St".into(), city: "Springfield".into() };
/// let dto: model::AddressDto = addr.to_dto();
/// let back: model::Address = dto.to_net();
/// ```
///
/// Ill-formed annotations degrade instead of aborting: the offending
/// argument is skipped, a diagnostic is printed, and generation continues
/// with whatever resolved. Projected-name collisions and malformed module
/// shapes are compile errors.
#[proc_macro_attribute]
pub fn dto_module(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut opts = ModuleOpts::default();
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("config") {
            let lit: LitStr = meta.value()?.parse()?;
            opts.config = Some(PathBuf::from(lit.value()));
            Ok(())
        } else if meta.path.is_ident("no_config") {
            opts.no_config = true;
            Ok(())
        } else {
            Err(meta.error("unknown dto_module argument"))
        }
    });
    parse_macro_input!(args with parser);
    let module = parse_macro_input!(input as ItemMod);

    match expand(module, opts) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Marks a type for generation inside a [`dto_module`]. Outside one this is
/// a pass-through attribute that leaves the item untouched.
///
/// See the crate-level documentation of `dtoforge` for the full argument
/// list: naming (`prefix`, `suffix`, `rename`, `namespace`), cascade and
/// ancestor linkage (`cascade`, `extends`, `base`), declaration shaping
/// (`interop`, `capabilities`, `uses`, `auto_imports`, `prepend`,
/// `retain_attrs`, `retain_field_attrs`), conversion naming (`assign_fn`,
/// `to_fn`, `from_fn`, `factory`), `instantiate` and `hooks`.
///
/// `base = Path` declares the named trait as the capability supertrait in
/// place of the mirrored ancestor's. The concrete type still embeds and
/// delegates to the mirrored ancestor; implementing the override trait for
/// the concrete type is on the caller, the generated code never does it.
#[proc_macro_attribute]
pub fn dto(_args: TokenStream, input: TokenStream) -> TokenStream {
    input
}

#[derive(Default)]
struct ModuleOpts {
    config: Option<PathBuf>,
    no_config: bool,
}

fn expand(mut module: ItemMod, opts: ModuleOpts) -> syn::Result<proc_macro2::TokenStream> {
    let mut diagnostics = Vec::new();
    let catalog = Catalog::collect(&module, &mut diagnostics)?;
    catalog::strip_markers(&mut module);

    let manifest_dir = std::env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let configs = if opts.no_config {
        Vec::new()
    } else {
        config::load_all(&manifest_dir, opts.config.as_deref(), &mut diagnostics)
    };
    // The pass defaults come from the first parsed configuration and feed
    // attribute resolution, so the context is built only after loading.
    let defaults = configs
        .first()
        .map(|(_, c)| c.defaults.clone())
        .unwrap_or_default();

    let mut ctx = PassContext::build(catalog, defaults, module.ident.clone())?;
    ctx.diagnostics.extend(diagnostics);

    let artifacts = driver::run_pass(&mut ctx, &configs);
    driver::route(&mut module, artifacts, &manifest_dir, &ctx).map_err(|err| {
        syn::Error::new(proc_macro2::Span::call_site(), err.to_string())
    })?;

    for diagnostic in &ctx.diagnostics {
        eprintln!("dtoforge: {diagnostic}");
    }

    Ok(quote!(#module))
}
