use std::{io, path::PathBuf};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CorpusError {
    #[display("database error")]
    Sqlite { source: rusqlite::Error },
    #[display("table {table} does not exist")]
    MissingTable { table: &'static str },
    #[display("invalid value {value:?} in {table}.{column}")]
    InvalidValue {
        table: &'static str,
        column: String,
        value: String,
    },
    #[display("failed to access {}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("malformed JSON in {}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl From<rusqlite::Error> for CorpusError {
    fn from(source: rusqlite::Error) -> Self {
        Self::Sqlite { source }
    }
}
