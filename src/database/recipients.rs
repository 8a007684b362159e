use crate::database::connection::Database;
use crate::database::models::Recipient;
use anyhow::Result;
use rusqlite::params;

/// Outcome of parsing a pasted recipient list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRecipients {
    /// `(item_name, username)` pairs in input order
    pub parsed: Vec<(String, String)>,
    /// Lines that did not match the expected shape, verbatim
    pub unparsed_lines: Vec<String>,
}

fn is_valid_username(username: &str) -> bool {
    (5..=32).contains(&username.len())
        && username
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Parse lines of the form `item name - @username`
///
/// The username is the last `-`-separated field so item names may contain
/// dashes themselves. A leading `@` on the username is optional. Lines that
/// do not fit are collected instead of dropped so the operator can fix them.
pub fn parse_recipients(input: &str) -> ParsedRecipients {
    let mut result = ParsedRecipients::default();
    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((item, raw_username)) = line.rsplit_once('-') else {
            result.unparsed_lines.push(line.to_string());
            continue;
        };
        let item = item.trim();
        let username = raw_username.trim().trim_start_matches('@');
        if item.is_empty() || !is_valid_username(username) {
            result.unparsed_lines.push(line.to_string());
            continue;
        }
        result.parsed.push((item.to_string(), username.to_string()));
    }
    result
}

impl Database {
    pub fn add_recipient(&self, account_id: i64, username: &str, item_name: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO recipients (account_id, username, item_name) VALUES (?1, ?2, ?3)",
            params![account_id, username, item_name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn add_recipients(&self, account_id: i64, parsed: &ParsedRecipients) -> Result<usize> {
        for (item_name, username) in &parsed.parsed {
            self.add_recipient(account_id, username, item_name)?;
        }
        Ok(parsed.parsed.len())
    }

    pub fn list_recipients(&self, account_id: i64, unsent_only: bool) -> Result<Vec<Recipient>> {
        let conn = self.conn.lock().unwrap();
        let sql = if unsent_only {
            "SELECT id, account_id, username, item_name, sent FROM recipients
             WHERE account_id = ?1 AND sent = 0 ORDER BY id"
        } else {
            "SELECT id, account_id, username, item_name, sent FROM recipients
             WHERE account_id = ?1 ORDER BY id"
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![account_id], |row| {
            Ok(Recipient {
                id: row.get(0)?,
                account_id: row.get(1)?,
                username: row.get(2)?,
                item_name: row.get(3)?,
                sent: row.get::<_, i64>(4)? != 0,
            })
        })?;
        let mut recipients = Vec::new();
        for row in rows {
            recipients.push(row?);
        }
        Ok(recipients)
    }

    /// One history page, newest first; `page` is 1-based
    pub fn recipient_history_page(
        &self,
        account_id: i64,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<Recipient>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, account_id, username, item_name, sent FROM recipients
             WHERE account_id = ?1 ORDER BY id DESC LIMIT ?2 OFFSET ?3",
        )?;
        let offset = (page.max(1) - 1) * page_size;
        let rows = stmt.query_map(params![account_id, page_size, offset], |row| {
            Ok(Recipient {
                id: row.get(0)?,
                account_id: row.get(1)?,
                username: row.get(2)?,
                item_name: row.get(3)?,
                sent: row.get::<_, i64>(4)? != 0,
            })
        })?;
        let mut recipients = Vec::new();
        for row in rows {
            recipients.push(row?);
        }
        Ok(recipients)
    }

    pub fn count_recipients(&self, account_id: i64) -> Result<(i64, i64)> {
        let conn = self.conn.lock().unwrap();
        let (total, sent) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(sent), 0) FROM recipients WHERE account_id = ?1",
            params![account_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((total, sent))
    }

    /// Worker-side completion: flag a recipient as messaged
    ///
    /// The console never sends; workers flip this flag and the history view
    /// renders it as sent.
    pub fn mark_recipient_sent(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("UPDATE recipients SET sent = 1 WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn clear_recipients(&self, account_id: i64) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute(
            "DELETE FROM recipients WHERE account_id = ?1",
            params![account_id],
        )?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parser_handles_the_usual_shapes() {
        let input = "Vintage lamp - @collector_99\n\
                     Road bike - bike_fan\n\
                     \n\
                     Mid-century chair - @chairs_and_more\n";
        let result = parse_recipients(input);
        assert_eq!(
            result.parsed,
            vec![
                ("Vintage lamp".to_string(), "collector_99".to_string()),
                ("Road bike".to_string(), "bike_fan".to_string()),
                ("Mid-century chair".to_string(), "chairs_and_more".to_string()),
            ]
        );
        assert!(result.unparsed_lines.is_empty());
    }

    #[test]
    fn parser_collects_bad_lines() {
        let input = "no separator here\n\
                     thing - @bad name\n\
                     thing - @abc\n\
                     - @lonely_user\n\
                     ok item - good_user\n";
        let result = parse_recipients(input);
        assert_eq!(result.parsed, vec![("ok item".to_string(), "good_user".to_string())]);
        assert_eq!(result.unparsed_lines.len(), 4);
        assert_eq!(result.unparsed_lines[0], "no separator here");
    }

    #[test]
    fn username_bounds() {
        assert!(is_valid_username("abcde"));
        assert!(is_valid_username("a_1_b_2"));
        assert!(!is_valid_username("abcd"));
        assert!(!is_valid_username(&"a".repeat(33)));
        assert!(!is_valid_username("with-dash"));
    }

    #[test]
    fn history_pages_walk_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let account = db
            .create_account(
                42,
                "alpha",
                "79990001122",
                1,
                "0123456789abcdef0123456789abcdef",
                "/s/79990001122.session",
            )
            .unwrap();
        for n in 1..=5 {
            db.add_recipient(account, &format!("user_{:02}", n), "lamp")
                .unwrap();
        }

        let first = db.recipient_history_page(account, 1, 2).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].username, "user_05");
        assert_eq!(first[1].username, "user_04");

        let last = db.recipient_history_page(account, 3, 2).unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].username, "user_01");

        assert!(db.recipient_history_page(account, 4, 2).unwrap().is_empty());
    }

    #[test]
    fn recipient_rows_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let account = db
            .create_account(
                42,
                "alpha",
                "79990001122",
                1,
                "0123456789abcdef0123456789abcdef",
                "/s/79990001122.session",
            )
            .unwrap();

        let parsed = parse_recipients("lamp - @collector_99\nbike - bike_fan\n");
        assert_eq!(db.add_recipients(account, &parsed).unwrap(), 2);

        let all = db.list_recipients(account, false).unwrap();
        assert_eq!(all.len(), 2);
        db.mark_recipient_sent(all[0].id).unwrap();

        assert_eq!(db.list_recipients(account, true).unwrap().len(), 1);
        assert_eq!(db.count_recipients(account).unwrap(), (2, 1));

        assert_eq!(db.clear_recipients(account).unwrap(), 2);
        assert_eq!(db.count_recipients(account).unwrap(), (0, 0));
    }
}
