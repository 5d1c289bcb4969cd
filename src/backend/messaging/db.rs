//! Database operations for messaging
//!
//! SQLite implementation of [`MessageStore`]. Timestamps are stored as
//! fixed-width RFC 3339 text (microsecond precision, `Z` suffix) so that
//! lexical order in SQL matches chronological order.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteRow, SqliteSynchronous,
};
use sqlx::Row;
use uuid::Uuid;

use super::store::{page_offset, timestamp_now, MessageStore, StoreError};
use crate::shared::messaging::{
    Conversation, ConversationEntry, ConversationId, Message, MessagePage, ParticipantPair,
};

const CONVERSATION_COLUMNS: &str =
    "id, participant_low, participant_high, created_at, last_message_at";

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, sender_id, receiver_id, content, sent_at, read_at, is_read";

/// [`MessageStore`] backed by a SQLite pool
#[derive(Debug, Clone)]
pub struct SqlStore {
    pool: SqlitePool,
}

impl SqlStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// How long a connection waits for another writer before reporting busy
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection options for a file-backed messaging database
///
/// WAL lets readers run alongside the single writer; the busy timeout makes
/// concurrent writers queue instead of failing with "database is locked".
pub fn connect_options(database_url: &str) -> Result<SqliteConnectOptions, sqlx::Error> {
    Ok(SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(BUSY_TIMEOUT))
}

/// Apply the embedded migrations to `pool`
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(pool).await
}

fn encode_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_time(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))
}

fn decode_optional_time(raw: Option<String>) -> Result<Option<DateTime<Utc>>, StoreError> {
    raw.as_deref().map(decode_time).transpose()
}

fn conversation_from_row(row: &SqliteRow) -> Result<Conversation, StoreError> {
    let low: Uuid = row.try_get("participant_low")?;
    let high: Uuid = row.try_get("participant_high")?;
    let participants = ParticipantPair::new(low, high)
        .map_err(|e| StoreError::invalid(format!("corrupt participant pair: {}", e)))?;

    Ok(Conversation {
        id: row.try_get("id")?,
        participants,
        created_at: decode_time(&row.try_get::<String, _>("created_at")?)?,
        last_message_at: decode_optional_time(row.try_get("last_message_at")?)?,
    })
}

fn message_from_row(row: &SqliteRow) -> Result<Message, StoreError> {
    Ok(Message {
        id: row.try_get("id")?,
        conversation_id: row.try_get("conversation_id")?,
        sender_id: row.try_get("sender_id")?,
        receiver_id: row.try_get("receiver_id")?,
        content: row.try_get("content")?,
        sent_at: decode_time(&row.try_get::<String, _>("sent_at")?)?,
        read_at: decode_optional_time(row.try_get("read_at")?)?,
        is_read: row.try_get("is_read")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl MessageStore for SqlStore {
    async fn find_conversation_between(
        &self,
        pair: ParticipantPair,
    ) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM conversations WHERE participant_low = ? AND participant_high = ?",
            CONVERSATION_COLUMNS
        ))
        .bind(pair.low())
        .bind(pair.high())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(conversation_from_row).transpose()
    }

    async fn get_conversation(&self, id: ConversationId) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM conversations WHERE id = ?",
            CONVERSATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(conversation_from_row).transpose()
    }

    async fn create_conversation(&self, pair: ParticipantPair) -> Result<Conversation, StoreError> {
        let created_at = timestamp_now();
        let result = sqlx::query(
            r#"
            INSERT INTO conversations (participant_low, participant_high, created_at, last_message_at)
            VALUES (?, ?, ?, NULL)
            "#,
        )
        .bind(pair.low())
        .bind(pair.high())
        .bind(encode_time(created_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(Conversation {
                id: done.last_insert_rowid(),
                participants: pair,
                created_at,
                last_message_at: None,
            }),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    async fn append_message(
        &self,
        conversation_id: ConversationId,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<Message, StoreError> {
        let Ok(pair) = ParticipantPair::new(sender_id, receiver_id) else {
            return Err(StoreError::invalid("sender and receiver must differ"));
        };
        let sent_at = timestamp_now();
        let mut tx = self.pool.begin().await?;

        // The first statement writes, so the transaction takes SQLite's write
        // lock up front and waits on the busy timeout instead of failing a
        // read-to-write upgrade. `sent_at` is taken before the lock, so the
        // bump only ever moves forward.
        let bumped = sqlx::query(
            r#"
            UPDATE conversations SET last_message_at = MAX(COALESCE(last_message_at, ?), ?)
            WHERE id = ? AND participant_low = ? AND participant_high = ?
            "#,
        )
        .bind(encode_time(sent_at))
        .bind(encode_time(sent_at))
        .bind(conversation_id)
        .bind(pair.low())
        .bind(pair.high())
        .execute(&mut *tx)
        .await?;

        if bumped.rows_affected() == 0 {
            let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM conversations WHERE id = ?")
                .bind(conversation_id)
                .fetch_optional(&mut *tx)
                .await?;
            return Err(match exists {
                Some(_) => StoreError::invalid(
                    "sender and receiver must be the conversation's participants",
                ),
                None => StoreError::not_found("Conversation"),
            });
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO messages (conversation_id, sender_id, receiver_id, content, sent_at, read_at, is_read)
            VALUES (?, ?, ?, ?, ?, NULL, 0)
            "#,
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content)
        .bind(encode_time(sent_at))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Message {
            id: inserted.last_insert_rowid(),
            conversation_id,
            sender_id,
            receiver_id,
            content: content.to_string(),
            sent_at,
            read_at: None,
            is_read: false,
        })
    }

    async fn list_conversations_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ConversationEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.participant_low, c.participant_high, c.created_at, c.last_message_at,
                   (SELECT COUNT(*) FROM messages m
                     WHERE m.conversation_id = c.id AND m.receiver_id = ? AND m.is_read = 0) AS unread_count
            FROM conversations c
            WHERE c.participant_low = ? OR c.participant_high = ?
            ORDER BY COALESCE(c.last_message_at, c.created_at) DESC, c.id DESC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let conversation = conversation_from_row(row)?;
            let unread_count: i64 = row.try_get("unread_count")?;

            let last_row = sqlx::query(&format!(
                "SELECT {} FROM messages WHERE conversation_id = ? ORDER BY sent_at DESC, id DESC LIMIT 1",
                MESSAGE_COLUMNS
            ))
            .bind(conversation.id)
            .fetch_optional(&self.pool)
            .await?;
            let last_message = last_row.as_ref().map(message_from_row).transpose()?;

            entries.push(ConversationEntry {
                conversation,
                last_message,
                unread_count,
            });
        }

        Ok(entries)
    }

    async fn list_messages_page(
        &self,
        conversation_id: ConversationId,
        page: u32,
        page_size: u32,
    ) -> Result<MessagePage, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = ?")
            .bind(conversation_id)
            .fetch_one(&self.pool)
            .await?;

        let offset = i64::try_from(page_offset(page, page_size)).unwrap_or(i64::MAX);
        let rows = sqlx::query(&format!(
            "SELECT {} FROM messages WHERE conversation_id = ? ORDER BY sent_at DESC, id DESC LIMIT ? OFFSET ?",
            MESSAGE_COLUMNS
        ))
        .bind(conversation_id)
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let mut messages = rows
            .iter()
            .map(message_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        messages.reverse();

        Ok(MessagePage { messages, total })
    }

    async fn mark_read_for_user(
        &self,
        conversation_id: ConversationId,
        user_id: Uuid,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE messages SET is_read = 1, read_at = ?
            WHERE conversation_id = ? AND receiver_id = ? AND is_read = 0
            "#,
        )
        .bind(encode_time(timestamp_now()))
        .bind(conversation_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn count_unread_for_user(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE receiver_id = ? AND is_read = 0")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
