//! SQL result sets as JSON documents
//!
//! Query results are rendered as an array of objects keyed by column name,
//! in column order, with every value as text and SQL `NULL` as `null`. The
//! output uses the same tab-indented layout as the rest of kamkit.
//!
//! # Example
//!
//! ```rust
//! use rusqlite::Connection;
//!
//! let conn = Connection::open_in_memory().unwrap();
//! conn.execute_batch(
//!     "CREATE TABLE subscriber (username TEXT, domain TEXT);
//!      INSERT INTO subscriber VALUES ('alice', 'example.com');",
//! )
//! .unwrap();
//!
//! let json = kamkit_sql::query_to_json(&conn, "SELECT * FROM subscriber", []).unwrap();
//! assert_eq!(
//!     json,
//!     "[\n\t{\n\t\t\"username\": \"alice\",\n\t\t\"domain\": \"example.com\"\n\t}\n]"
//! );
//! ```

use kamkit_core::{codec, Error, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Params};
use serde_json::{Map, Value};

fn sql_error(e: rusqlite::Error) -> Error {
    Error::Sql(e.to_string())
}

/// Build the array-of-objects document for a result set
///
/// Values beyond the column count are ignored; missing trailing values are
/// left out of the row object.
pub fn rows_to_value(columns: &[String], rows: &[Vec<Option<String>>]) -> Value {
    let records = rows
        .iter()
        .map(|row| {
            let record: Map<String, Value> = columns
                .iter()
                .zip(row)
                .map(|(column, cell)| {
                    let value = cell.clone().map(Value::String).unwrap_or(Value::Null);
                    (column.clone(), value)
                })
                .collect();
            Value::Object(record)
        })
        .collect();
    Value::Array(records)
}

/// Render a result set as tab-indented JSON text
///
/// An empty result set renders as `[]`.
pub fn rows_to_json(columns: &[String], rows: &[Vec<Option<String>>]) -> Result<String> {
    codec::to_pretty_text(&rows_to_value(columns, rows))
}

fn cell_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// Run `sql` with `params` and collect column names and text cells
pub fn query_rows<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<(Vec<String>, Vec<Vec<Option<String>>>)> {
    let mut stmt = conn.prepare(sql).map_err(sql_error)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let rows = stmt
        .query_map(params, |row| {
            (0..width)
                .map(|i| row.get_ref(i).map(cell_text))
                .collect::<rusqlite::Result<Vec<_>>>()
        })
        .map_err(sql_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(sql_error)?;

    tracing::debug!(columns = width, rows = rows.len(), "Query completed");
    Ok((columns, rows))
}

/// Run `sql` and render the result with [`rows_to_json`]
pub fn query_to_json<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<String> {
    let (columns, rows) = query_rows(conn, sql, params)?;
    rows_to_json(&columns, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE location (
                 username TEXT NOT NULL,
                 contact TEXT NOT NULL,
                 expires INTEGER,
                 q REAL,
                 user_agent TEXT
             );
             INSERT INTO location VALUES ('alice', 'sip:alice@10.0.0.5', 3600, 0.5, 'Yealink');
             INSERT INTO location VALUES ('bob', 'sip:bob@10.0.0.7', 60, 1.0, NULL);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_rows_to_json_layout() {
        let text = rows_to_json(
            &columns(&["id", "name"]),
            &[vec![Some("1".into()), Some("a".into())]],
        )
        .unwrap();
        assert_eq!(text, "[\n\t{\n\t\t\"id\": \"1\",\n\t\t\"name\": \"a\"\n\t}\n]");
    }

    #[test]
    fn test_empty_result() {
        assert_eq!(rows_to_json(&columns(&["id"]), &[]).unwrap(), "[]");
    }

    #[test]
    fn test_column_order_and_nulls() {
        let value = rows_to_value(
            &columns(&["zeta", "alpha"]),
            &[vec![None, Some("x".into())]],
        );
        assert_eq!(value, json!([{"zeta": null, "alpha": "x"}]));
        let keys: Vec<&String> = value[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["zeta", "alpha"]);
    }

    #[test]
    fn test_short_row() {
        let value = rows_to_value(&columns(&["a", "b"]), &[vec![Some("1".into())]]);
        assert_eq!(value, json!([{"a": "1"}]));
    }

    #[test]
    fn test_query_to_json() {
        let conn = setup();
        let text = query_to_json(
            &conn,
            "SELECT username, expires, q, user_agent FROM location ORDER BY username",
            [],
        )
        .unwrap();

        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            parsed,
            json!([
                {"username": "alice", "expires": "3600", "q": "0.5", "user_agent": "Yealink"},
                {"username": "bob", "expires": "60", "q": "1", "user_agent": null}
            ])
        );
    }

    #[test]
    fn test_query_with_params() {
        let conn = setup();
        let (cols, rows) = query_rows(
            &conn,
            "SELECT contact FROM location WHERE username = ?1",
            rusqlite::params!["bob"],
        )
        .unwrap();
        assert_eq!(cols, ["contact"]);
        assert_eq!(rows, [vec![Some("sip:bob@10.0.0.7".to_string())]]);

        let text =
            query_to_json(&conn, "SELECT * FROM location WHERE username = ?1", ["carol"]).unwrap();
        assert_eq!(text, "[]");
    }

    #[test]
    fn test_bad_sql() {
        let conn = setup();
        let result = query_to_json(&conn, "SELECT * FROM missing_table", []);
        assert!(matches!(result, Err(Error::Sql(_))));
    }
}
