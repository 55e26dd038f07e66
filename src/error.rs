use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("missing config file {0}")]
    MissingConfig(Utf8PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("missing input table: {0}")]
    MissingTable(Utf8PathBuf),

    #[error("failed to read table {path}: {message}")]
    TableRead { path: Utf8PathBuf, message: String },

    #[error("table {table} row {row}: missing column {column}")]
    MissingColumn {
        table: String,
        row: usize,
        column: String,
    },

    #[error("{source_kind} '{source_id}' links to unknown {target_kind} '{target}'")]
    #[diagnostic(help("run `osc-build validate` to list every unresolved reference"))]
    UnresolvedLink {
        source_kind: &'static str,
        source_id: String,
        target_kind: &'static str,
        target: String,
    },

    #[error("container '{parent}' already has a different child with id '{child}'")]
    DuplicateChild { parent: String, child: String },

    #[error("container id '{0}' yields an empty output path segment")]
    EmptyPathSegment(String),

    #[error("containers '{first}' and '{second}' both map to {path}")]
    PathClash {
        path: Utf8PathBuf,
        first: String,
        second: String,
    },

    #[error("catalog has no '{0}' branch")]
    MissingBranch(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to serialize {0}")]
    Serialize(String),

    #[error("validation reported {0} issue(s)")]
    ValidationFailed(usize),
}
