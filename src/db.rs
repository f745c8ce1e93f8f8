//! Database schema and key-value operations

use rusqlite::{Connection, OptionalExtension};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- One serialized document per key
        CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;
    Ok(())
}

/// Read the value stored under `key`
pub fn get_value(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
        row.get(0)
    })
    .optional()
}

/// Insert or replace the value stored under `key`
pub fn set_value(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO kv_store (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))",
        (key, value),
    )?;
    Ok(())
}

pub fn delete_value(conn: &Connection, key: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn missing_key_reads_none() {
        let conn = open();
        assert_eq!(get_value(&conn, "nope").unwrap(), None);
    }

    #[test]
    fn set_overwrites_and_delete_clears() {
        let conn = open();
        set_value(&conn, "k", "one").unwrap();
        set_value(&conn, "k", "two").unwrap();
        assert_eq!(get_value(&conn, "k").unwrap().as_deref(), Some("two"));

        delete_value(&conn, "k").unwrap();
        assert_eq!(get_value(&conn, "k").unwrap(), None);
    }

    #[test]
    fn init_schema_is_idempotent() {
        let conn = open();
        set_value(&conn, "k", "v").unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(get_value(&conn, "k").unwrap().as_deref(), Some("v"));
    }
}
