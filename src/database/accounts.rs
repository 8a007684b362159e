use crate::database::connection::Database;
use crate::database::models::AccountRecord;
use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<AccountRecord> {
    Ok(AccountRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        api_id: row.get(4)?,
        api_hash: row.get(5)?,
        session_path: row.get(6)?,
        is_connected: row.get::<_, i64>(7)? != 0,
        is_started: row.get::<_, i64>(8)? != 0,
        folder_id: row.get(9)?,
        batch_size: row.get(10)?,
    })
}

const ACCOUNT_COLUMNS: &str = "id, user_id, name, phone, api_id, api_hash, session_path, \
     is_connected, is_started, folder_id, batch_size";

impl Database {
    /// Create an account record; the phone must be unique
    pub fn create_account(
        &self,
        user_id: i64,
        name: &str,
        phone: &str,
        api_id: i64,
        api_hash: &str,
        session_path: &str,
    ) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO accounts (user_id, name, phone, api_id, api_hash, session_path, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id,
                name,
                phone,
                api_id,
                api_hash,
                session_path,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_account(&self, id: i64) -> Result<Option<AccountRecord>> {
        let conn = self.conn.lock().unwrap();
        let account = conn
            .query_row(
                &format!("SELECT {} FROM accounts WHERE id = ?1", ACCOUNT_COLUMNS),
                params![id],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    pub fn get_account_by_phone(&self, phone: &str) -> Result<Option<AccountRecord>> {
        let conn = self.conn.lock().unwrap();
        let account = conn
            .query_row(
                &format!("SELECT {} FROM accounts WHERE phone = ?1", ACCOUNT_COLUMNS),
                params![phone],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    /// All accounts owned by an admin, folder-filtered when `folder_id` is set
    pub fn list_accounts(
        &self,
        user_id: i64,
        folder_id: Option<i64>,
    ) -> Result<Vec<AccountRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut accounts = Vec::new();
        match folder_id {
            Some(folder_id) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM accounts WHERE user_id = ?1 AND folder_id = ?2 ORDER BY name, phone",
                    ACCOUNT_COLUMNS
                ))?;
                let rows = stmt.query_map(params![user_id, folder_id], account_from_row)?;
                for row in rows {
                    accounts.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM accounts WHERE user_id = ?1 ORDER BY name, phone",
                    ACCOUNT_COLUMNS
                ))?;
                let rows = stmt.query_map(params![user_id], account_from_row)?;
                for row in rows {
                    accounts.push(row?);
                }
            }
        }
        Ok(accounts)
    }

    pub fn set_account_connected(&self, id: i64, connected: bool) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE accounts SET is_connected = ?1 WHERE id = ?2",
            params![connected as i64, id],
        )?;
        Ok(())
    }

    pub fn set_account_started(&self, id: i64, started: bool) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE accounts SET is_started = ?1 WHERE id = ?2",
            params![started as i64, id],
        )?;
        Ok(())
    }

    pub fn set_account_folder(&self, id: i64, folder_id: Option<i64>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE accounts SET folder_id = ?1 WHERE id = ?2",
            params![folder_id, id],
        )?;
        Ok(())
    }

    pub fn set_account_batch_size(&self, id: i64, batch_size: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE accounts SET batch_size = ?1 WHERE id = ?2",
            params![batch_size, id],
        )?;
        Ok(())
    }

    /// Remove the record and everything hanging off it
    pub fn delete_account(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM texts WHERE account_id = ?1", params![id])?;
        conn.execute("DELETE FROM recipients WHERE account_id = ?1", params![id])?;
        conn.execute("DELETE FROM jobs WHERE account_id = ?1", params![id])?;
        conn.execute("DELETE FROM accounts WHERE id = ?1", params![id])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "0123456789abcdef0123456789abcdef";

    fn sample(db: &Database) -> i64 {
        db.create_account(42, "alpha", "79990001122", 12345, HASH, "/s/79990001122.session")
            .unwrap()
    }

    #[test]
    fn create_and_fetch_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let id = sample(&db);

        let account = db.get_account(id).unwrap().unwrap();
        assert_eq!(account.phone, "79990001122");
        assert_eq!(account.api_id, 12345);
        assert!(!account.is_connected);
        assert_eq!(account.batch_size, 10);

        let by_phone = db.get_account_by_phone("79990001122").unwrap().unwrap();
        assert_eq!(by_phone.id, id);
        assert!(db.get_account_by_phone("70000000000").unwrap().is_none());
    }

    #[test]
    fn duplicate_phone_rejected() {
        let db = Database::open_in_memory().unwrap();
        sample(&db);
        let result =
            db.create_account(42, "beta", "79990001122", 1, HASH, "/s/79990001122.session");
        assert!(result.is_err());
    }

    #[test]
    fn flags_and_folder_updates() {
        let db = Database::open_in_memory().unwrap();
        let id = sample(&db);

        db.set_account_connected(id, true).unwrap();
        db.set_account_started(id, true).unwrap();
        db.set_account_batch_size(id, 25).unwrap();
        let account = db.get_account(id).unwrap().unwrap();
        assert!(account.is_connected);
        assert!(account.is_started);
        assert_eq!(account.batch_size, 25);

        let folder = db.create_folder(42, "cold").unwrap();
        db.set_account_folder(id, Some(folder)).unwrap();
        assert_eq!(db.list_accounts(42, Some(folder)).unwrap().len(), 1);
        assert_eq!(db.list_accounts(42, None).unwrap().len(), 1);
        assert!(db.list_accounts(7, None).unwrap().is_empty());
    }

    #[test]
    fn delete_cascades() {
        let db = Database::open_in_memory().unwrap();
        let id = sample(&db);
        db.add_text(id, "intro", "hello there").unwrap();
        db.create_job(id, "collect").unwrap();

        db.delete_account(id).unwrap();
        assert!(db.get_account(id).unwrap().is_none());
        assert!(db.list_texts(id, None).unwrap().is_empty());
    }

    #[test]
    fn identity_view_matches_record() {
        let db = Database::open_in_memory().unwrap();
        let id = sample(&db);
        let account = db.get_account(id).unwrap().unwrap();
        let identity = account.identity();
        assert_eq!(identity.phone, account.phone);
        assert_eq!(
            identity.session_path.to_string_lossy(),
            account.session_path
        );
    }
}
