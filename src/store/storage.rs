use super::{Chat, Reservation, Session, StoredMessage, User};
use crate::Result;
use libsql::{Builder, Connection};
use tracing::{debug, info};
use uuid::Uuid;

pub struct ChatStore {
    // Held for the lifetime of the store: for a libsql `:memory:` database the
    // storage lives only as long as a connection is open, so reconnecting per
    // operation would drop the schema created in `new()`.
    conn: Connection,
}

impl ChatStore {
    pub async fn new(db_path: &str) -> Result<Self> {
        let db = Builder::new_local(db_path).build().await?;

        let conn = db.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                created_at DATETIME NOT NULL
            );
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                access_token TEXT NOT NULL,
                created_at DATETIME NOT NULL
            );
            CREATE TABLE IF NOT EXISTS chats (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                messages TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            );
            CREATE TABLE IF NOT EXISTS reservations (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                details TEXT NOT NULL,
                has_completed_payment INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL
            );
            "#,
        )
        .await?;

        info!("Chat store initialized: {}", db_path);
        Ok(Self { conn })
    }

    pub async fn create_user(&self, email: &str) -> Result<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
        };

        let conn = self.conn.clone();
        conn.execute(
            "INSERT INTO users (id, email, created_at) VALUES (?, ?, ?)",
            (
                user.id.as_str(),
                user.email.as_str(),
                chrono::Utc::now().to_rfc3339(),
            ),
        )
        .await?;

        debug!(user_id = %user.id, "created user");
        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.clone();
        let mut rows = conn
            .query("SELECT id, email FROM users WHERE email = ?", [email])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(User {
                id: row.get(0)?,
                email: row.get(1)?,
            })),
            None => Ok(None),
        }
    }

    pub async fn create_session(&self, user_id: &str, access_token: &str) -> Result<Session> {
        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            access_token: access_token.to_string(),
        };

        let conn = self.conn.clone();
        conn.execute(
            "INSERT INTO sessions (token, user_id, access_token, created_at) VALUES (?, ?, ?, ?)",
            (
                session.token.as_str(),
                session.user_id.as_str(),
                session.access_token.as_str(),
                chrono::Utc::now().to_rfc3339(),
            ),
        )
        .await?;

        Ok(session)
    }

    pub async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let conn = self.conn.clone();
        let mut rows = conn
            .query(
                "SELECT token, user_id, access_token FROM sessions WHERE token = ?",
                [token],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Session {
                token: row.get(0)?,
                user_id: row.get(1)?,
                access_token: row.get(2)?,
            })),
            None => Ok(None),
        }
    }

    /// Saves a finished turn's transcript, replacing any previous transcript
    /// of the same chat.
    pub async fn save_chat(
        &self,
        chat_id: &str,
        user_id: &str,
        messages: &[StoredMessage],
    ) -> Result<()> {
        let serialized = serde_json::to_string(messages)?;
        let now = chrono::Utc::now().to_rfc3339();

        let conn = self.conn.clone();
        conn.execute(
            r#"
            INSERT INTO chats (id, user_id, messages, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                messages = excluded.messages,
                updated_at = excluded.updated_at
            "#,
            (
                chat_id,
                user_id,
                serialized.as_str(),
                now.as_str(),
                now.as_str(),
            ),
        )
        .await?;

        debug!(chat_id, "saved chat transcript ({} messages)", messages.len());
        Ok(())
    }

    pub async fn get_chat(&self, chat_id: &str) -> Result<Option<Chat>> {
        let conn = self.conn.clone();
        let mut rows = conn
            .query(
                "SELECT id, user_id, messages FROM chats WHERE id = ?",
                [chat_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => {
                let raw: String = row.get(2)?;
                Ok(Some(Chat {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    messages: serde_json::from_str(&raw)?,
                }))
            }
            None => Ok(None),
        }
    }

    pub async fn delete_chat(&self, chat_id: &str) -> Result<()> {
        let conn = self.conn.clone();
        conn.execute("DELETE FROM chats WHERE id = ?", [chat_id])
            .await?;
        Ok(())
    }

    pub async fn create_reservation(&self, reservation: &Reservation) -> Result<()> {
        let conn = self.conn.clone();
        conn.execute(
            r#"
            INSERT INTO reservations (id, user_id, details, has_completed_payment, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
            (
                reservation.id.as_str(),
                reservation.user_id.as_str(),
                serde_json::to_string(&reservation.details)?,
                reservation.has_completed_payment as i64,
                chrono::Utc::now().to_rfc3339(),
            ),
        )
        .await?;
        Ok(())
    }

    pub async fn get_reservation(&self, id: &str) -> Result<Option<Reservation>> {
        let conn = self.conn.clone();
        let mut rows = conn
            .query(
                "SELECT id, user_id, details, has_completed_payment FROM reservations WHERE id = ?",
                [id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => {
                let details: String = row.get(2)?;
                let paid: i64 = row.get(3)?;
                Ok(Some(Reservation {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    details: serde_json::from_str(&details)?,
                    has_completed_payment: paid != 0,
                }))
            }
            None => Ok(None),
        }
    }

    pub async fn mark_reservation_paid(&self, id: &str) -> Result<()> {
        let conn = self.conn.clone();
        conn.execute(
            "UPDATE reservations SET has_completed_payment = 1 WHERE id = ?",
            [id],
        )
        .await?;
        Ok(())
    }
}
