//! Job-configuration files (`dtoforge.toml`).
//!
//! A pass discovers zero or more configuration files next to the crate
//! manifest. Each carries a DTO defaults section plus job lists for the
//! external structure/tabular generators (parsed here for shape completeness;
//! their generators live outside this crate) and documentation exports.
//! A file that fails to read or parse is skipped with a recorded diagnostic;
//! it never blocks the other configuration files or the pass itself.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::ConfigError;

/// Pass-wide defaults, the third level of the attribute precedence chain.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PassDefaults {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub namespace: Option<String>,
    pub interop: Option<bool>,
    pub assign_fn: Option<String>,
    pub to_fn: Option<String>,
    pub from_fn: Option<String>,
    /// When set, declaration/mapping artifacts are materialized into this
    /// directory (one `{Type}.g.rs` per source type) instead of being handed
    /// back to the compilation.
    pub out_dir: Option<PathBuf>,
    /// Wrap each type's declarations in region marker comments when
    /// materializing.
    #[serde(default)]
    pub regions: bool,
}

/// One structure-generation job: external schema file to declaration tree.
/// Executed by an external generator; carried here so a shared configuration
/// file round-trips without data loss.
#[derive(Debug, Clone, Deserialize)]
pub struct StructureJob {
    pub schema: PathBuf,
    pub out: PathBuf,
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub arrays_as: Option<String>,
}

/// One tabular-generation job: spreadsheet to row model plus lookup
/// declaration. Executed by an external generator.
#[derive(Debug, Clone, Deserialize)]
pub struct TabularJob {
    pub sheet: PathBuf,
    pub out: PathBuf,
    #[serde(default)]
    pub lookup_column: Option<String>,
}

/// One documentation-export job, handled by the docs sub-generator.
#[derive(Debug, Clone, Deserialize)]
pub struct DocsJob {
    pub path: PathBuf,
    #[serde(default)]
    pub title: Option<String>,
}

/// A fully parsed job configuration file.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub defaults: PassDefaults,
    #[serde(default)]
    pub structure: Vec<StructureJob>,
    #[serde(default)]
    pub tabular: Vec<TabularJob>,
    #[serde(default)]
    pub docs: Vec<DocsJob>,
}

/// Discover configuration files for a pass: `dtoforge.toml` plus any
/// `*.dtoforge.toml` in the manifest directory, in name order.
pub fn discover(manifest_dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let primary = manifest_dir.join("dtoforge.toml");
    if primary.is_file() {
        found.push(primary);
    }
    let mut extra: Vec<PathBuf> = std::fs::read_dir(manifest_dir)
        .into_iter()
        .flatten()
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".dtoforge.toml"))
        })
        .collect();
    extra.sort();
    found.extend(extra);
    found
}

/// Load and parse one configuration file.
pub fn load(path: &Path) -> Result<JobConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config: JobConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source: Box::new(source),
    })?;
    if let Some((field, value)) = bad_default_name(&config.defaults) {
        return Err(ConfigError::Name {
            path: path.display().to_string(),
            field,
            value,
        });
    }
    Ok(config)
}

/// Default values that end up in generated identifiers must be identifiers
/// themselves; prefix/suffix are fragments and may also be empty.
fn bad_default_name(defaults: &PassDefaults) -> Option<(&'static str, String)> {
    let full = [
        ("namespace", &defaults.namespace),
        ("assign_fn", &defaults.assign_fn),
        ("to_fn", &defaults.to_fn),
        ("from_fn", &defaults.from_fn),
    ];
    for (field, value) in full {
        if let Some(v) = value
            && syn::parse_str::<syn::Ident>(v).is_err()
        {
            return Some((field, v.clone()));
        }
    }
    if let Some(v) = &defaults.prefix
        && !v.is_empty()
        && syn::parse_str::<syn::Ident>(v).is_err()
    {
        return Some(("prefix", v.clone()));
    }
    if let Some(v) = &defaults.suffix
        && !v.is_empty()
        && syn::parse_str::<syn::Ident>(&format!("x{v}")).is_err()
    {
        return Some(("suffix", v.clone()));
    }
    None
}

/// Discover and parse every configuration for a pass. Unreadable or
/// malformed files are skipped; each skip is recorded as a diagnostic.
pub fn load_all(
    manifest_dir: &Path,
    explicit: Option<&Path>,
    diagnostics: &mut Vec<String>,
) -> Vec<(PathBuf, JobConfig)> {
    let paths = match explicit {
        Some(p) => vec![manifest_dir.join(p)],
        None => discover(manifest_dir),
    };
    let mut configs = Vec::new();
    for path in paths {
        match load(&path) {
            Ok(config) => configs.push((path, config)),
            Err(e) => diagnostics.push(format!("skipping job configuration: {e}")),
        }
    }
    configs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: JobConfig = toml::from_str(
            r#"
            [defaults]
            suffix = "Dto"
            interop = true

            [[structure]]
            schema = "schemas/order.xml"
            out = "src/generated/order.rs"
            ignore = ["Order/Internal"]

            [[tabular]]
            sheet = "data/countries.xlsx"
            out = "src/generated/countries.rs"

            [[docs]]
            path = "docs/projections.md"
            title = "Wire types"
            "#,
        )
        .unwrap();
        assert_eq!(config.defaults.suffix.as_deref(), Some("Dto"));
        assert_eq!(config.defaults.interop, Some(true));
        assert_eq!(config.structure.len(), 1);
        assert_eq!(config.tabular.len(), 1);
        assert_eq!(config.docs.len(), 1);
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config: JobConfig = toml::from_str("").unwrap();
        assert!(config.defaults.suffix.is_none());
        assert!(config.docs.is_empty());
    }

    #[test]
    fn test_load_all_skips_malformed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dtoforge.toml"), "not [valid toml").unwrap();
        std::fs::write(
            dir.path().join("extra.dtoforge.toml"),
            "[defaults]\nsuffix = \"Dto\"\n",
        )
        .unwrap();
        let mut diagnostics = Vec::new();
        let configs = load_all(dir.path(), None, &mut diagnostics);
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].1.defaults.suffix.as_deref(), Some("Dto"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].contains("skipping job configuration"));
    }

    #[test]
    fn test_load_all_skips_non_identifier_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("dtoforge.toml"),
            "[defaults]\nto_fn = \"to dto!\"\n",
        )
        .unwrap();
        let mut diagnostics = Vec::new();
        let configs = load_all(dir.path(), None, &mut diagnostics);
        assert!(configs.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].contains("invalid identifier"));
    }

    #[test]
    fn test_discover_orders_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.dtoforge.toml"), "").unwrap();
        std::fs::write(dir.path().join("a.dtoforge.toml"), "").unwrap();
        std::fs::write(dir.path().join("dtoforge.toml"), "").unwrap();
        let paths = discover(dir.path());
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["dtoforge.toml", "a.dtoforge.toml", "b.dtoforge.toml"]);
    }
}
