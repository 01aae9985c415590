use thiserror::Error;

/// Job-configuration loading failures. These never abort a pass; the driver
/// records them and moves on to the next configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read job configuration {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse job configuration {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: Box<toml::de::Error>,
    },
    #[error("invalid identifier `{value}` for `{field}` in job configuration {path}")]
    Name {
        path: String,
        field: &'static str,
        value: String,
    },
}

/// A sub-generator failing as a whole. Caught by the driver so the remaining
/// sub-generators still run.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("instantiation target `{0}` is not an annotated source type")]
    UnknownInstantiationTarget(String),
    #[error("{0}")]
    Emit(String),
}

/// Storage write failures during artifact materialization. Fatal for the
/// pass.
#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write generated artifact {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
