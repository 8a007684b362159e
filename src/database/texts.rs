use crate::database::connection::Database;
use crate::database::models::TextTemplate;
use anyhow::Result;
use rand::seq::SliceRandom;
use rusqlite::params;

impl Database {
    pub fn add_text(&self, account_id: i64, category: &str, body: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO texts (account_id, category, body) VALUES (?1, ?2, ?3)",
            params![account_id, category, body],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Texts for an account, category-filtered when `category` is set
    pub fn list_texts(
        &self,
        account_id: i64,
        category: Option<&str>,
    ) -> Result<Vec<TextTemplate>> {
        let conn = self.conn.lock().unwrap();
        let mut texts = Vec::new();
        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<TextTemplate> {
            Ok(TextTemplate {
                id: row.get(0)?,
                account_id: row.get(1)?,
                category: row.get(2)?,
                body: row.get(3)?,
            })
        };
        match category {
            Some(category) => {
                let mut stmt = conn.prepare(
                    "SELECT id, account_id, category, body FROM texts
                     WHERE account_id = ?1 AND category = ?2 ORDER BY id",
                )?;
                let rows = stmt.query_map(params![account_id, category], map_row)?;
                for row in rows {
                    texts.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, account_id, category, body FROM texts
                     WHERE account_id = ?1 ORDER BY category, id",
                )?;
                let rows = stmt.query_map(params![account_id], map_row)?;
                for row in rows {
                    texts.push(row?);
                }
            }
        }
        Ok(texts)
    }

    /// Worker-side draw: a uniformly random variant from a category, `None`
    /// when the category is empty
    ///
    /// Workers compose outgoing messages from this; the console only loads
    /// the variants.
    pub fn pick_text(&self, account_id: i64, category: &str) -> Result<Option<TextTemplate>> {
        let texts = self.list_texts(account_id, Some(category))?;
        Ok(texts.choose(&mut rand::thread_rng()).cloned())
    }

    pub fn delete_text(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM texts WHERE id = ?1", params![id])?;
        Ok(())
    }
}
