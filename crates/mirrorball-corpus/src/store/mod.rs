//! SQLite-backed corpus store.
//!
//! Every pipeline stage replaces its output table wholesale: the old table is
//! dropped, recreated and filled inside one transaction, so readers never see
//! a half-written table.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params_from_iter, types::Value};
use tracing::{debug, info};

use crate::{
    error::CorpusError,
    schema::{self, Column},
};

mod features;
mod lyrics;
mod results;

pub struct CorpusStore {
    conn: Connection,
}

impl CorpusStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CorpusError> {
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened corpus store");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, CorpusError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Names of all user tables, sorted.
    pub fn table_names(&self) -> Result<Vec<String>, CorpusError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    pub fn has_table(&self, table: &str) -> Result<bool, CorpusError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn row_count(&self, table: &str) -> Result<usize, CorpusError> {
        let sql = format!("SELECT COUNT(*) FROM {}", schema::quote(table));
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }

    /// Drops every table not listed in `keep` and returns the dropped names.
    pub fn cleanup(&mut self, keep: &[&str]) -> Result<Vec<String>, CorpusError> {
        let dropped = self
            .table_names()?
            .into_iter()
            .filter(|name| !keep.contains(&name.as_str()))
            .collect::<Vec<_>>();
        let tx = self.conn.transaction()?;
        for name in &dropped {
            tx.execute(&format!("DROP TABLE IF EXISTS {}", schema::quote(name)), [])?;
            info!(table = %name, "dropped table");
        }
        tx.commit()?;
        Ok(dropped)
    }

    fn require(&self, table: &'static str) -> Result<(), CorpusError> {
        if self.has_table(table)? {
            Ok(())
        } else {
            Err(CorpusError::MissingTable { table })
        }
    }

    /// Drops, recreates and fills `table` in one transaction.
    fn replace_table<I>(
        &mut self,
        table: &str,
        columns: &[Column],
        rows: I,
    ) -> Result<usize, CorpusError>
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        let tx = self.conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", schema::quote(table)), [])?;
        tx.execute(&schema::create_sql(table, columns), [])?;
        let count = insert_rows(&tx, table, columns, rows)?;
        tx.commit()?;
        info!(table, rows = count, "replaced table");
        Ok(count)
    }

    /// Appends to `table`, creating it first if needed.
    fn append_table<I>(
        &mut self,
        table: &str,
        columns: &[Column],
        rows: I,
    ) -> Result<usize, CorpusError>
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        let tx = self.conn.transaction()?;
        let create = schema::create_sql(table, columns).replacen(
            "CREATE TABLE",
            "CREATE TABLE IF NOT EXISTS",
            1,
        );
        tx.execute(&create, [])?;
        let count = insert_rows(&tx, table, columns, rows)?;
        tx.commit()?;
        info!(table, rows = count, "appended to table");
        Ok(count)
    }
}

fn insert_rows<I>(
    conn: &Connection,
    table: &str,
    columns: &[Column],
    rows: I,
) -> Result<usize, CorpusError>
where
    I: IntoIterator<Item = Vec<Value>>,
{
    let mut stmt = conn.prepare(&schema::insert_sql(table, columns))?;
    let mut count = 0;
    for row in rows {
        stmt.execute(params_from_iter(row))?;
        count += 1;
    }
    Ok(count)
}

fn text(value: impl Into<String>) -> Value {
    Value::Text(value.into())
}

fn real(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Real)
}

fn flag(value: bool) -> Value {
    Value::Integer(i64::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PIPELINE_TABLES;

    #[test]
    fn test_cleanup_keeps_listed_tables() {
        let mut store = CorpusStore::open_in_memory().unwrap();
        for table in ["dim_lyrics", "scratch", "master_training_data"] {
            store
                .conn
                .execute(&format!("CREATE TABLE {table} (a INTEGER)"), [])
                .unwrap();
        }
        let dropped = store.cleanup(&PIPELINE_TABLES).unwrap();
        assert_eq!(dropped, ["master_training_data", "scratch"]);
        assert_eq!(store.table_names().unwrap(), ["dim_lyrics"]);
    }

    #[test]
    fn test_replace_table_discards_previous_rows() {
        let mut store = CorpusStore::open_in_memory().unwrap();
        let columns = [Column::new("a", "INTEGER")];
        store
            .replace_table("t", &columns, (0..3).map(|i| vec![Value::Integer(i)]))
            .unwrap();
        store
            .replace_table("t", &columns, [vec![Value::Integer(7)]])
            .unwrap();
        assert_eq!(store.row_count("t").unwrap(), 1);
        store
            .append_table("t", &columns, [vec![Value::Integer(8)]])
            .unwrap();
        assert_eq!(store.row_count("t").unwrap(), 2);
    }

    #[test]
    fn test_opens_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.db");
        {
            let mut store = CorpusStore::open(&path).unwrap();
            store
                .replace_table("t", &[Column::new("a", "TEXT")], [vec![text("x")]])
                .unwrap();
        }
        let store = CorpusStore::open(&path).unwrap();
        assert!(store.has_table("t").unwrap());
        assert!(!store.has_table("u").unwrap());
    }
}
