use crate::database::connection::Database;
use crate::database::models::Folder;
use anyhow::Result;
use rusqlite::{params, OptionalExtension};

impl Database {
    pub fn create_folder(&self, user_id: i64, name: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO folders (user_id, name) VALUES (?1, ?2)",
            params![user_id, name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_folder(&self, id: i64) -> Result<Option<Folder>> {
        let conn = self.conn.lock().unwrap();
        let folder = conn
            .query_row(
                "SELECT id, user_id, name FROM folders WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Folder {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(folder)
    }

    pub fn list_folders(&self, user_id: i64) -> Result<Vec<Folder>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, user_id, name FROM folders WHERE user_id = ?1 ORDER BY name")?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Folder {
                id: row.get(0)?,
                user_id: row.get(1)?,
                name: row.get(2)?,
            })
        })?;
        let mut folders = Vec::new();
        for row in rows {
            folders.push(row?);
        }
        Ok(folders)
    }

    pub fn rename_folder(&self, id: i64, name: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE folders SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        Ok(())
    }

    /// Deleting a folder unfiles its accounts instead of deleting them
    pub fn delete_folder(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE accounts SET folder_id = NULL WHERE folder_id = ?1",
            params![id],
        )?;
        conn.execute("DELETE FROM folders WHERE id = ?1", params![id])?;
        Ok(())
    }
}
