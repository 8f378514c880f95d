//! [`SqliteStore`] — the SQLite implementation of [`ConversationStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use waitroom_core::{
  cap::{self, Admission},
  message::{Message, Role},
  session::{Session, SessionId, SessionPreview},
  store::{AdmitOutcome, ConversationStore},
  summary::Summary,
};

use crate::{
  Result,
  encode::{
    RawMessage, RawPreview, RawSession, RawSummary, encode_dt, encode_id,
    encode_key_points, encode_structured,
  },
  schema::SCHEMA,
};

const SESSION_COLUMNS: &str = "session_id, created_at, closed_at, message_cap";
const MESSAGE_COLUMNS: &str = "seq, session_id, role, content, created_at";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Waitroom store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_messages(
    &self,
    id: SessionId,
    since: Option<DateTime<Utc>>,
  ) -> Result<Vec<Message>> {
    let id_str    = encode_id(id);
    let since_str = since.map(encode_dt);

    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages
           WHERE session_id = ?1
             AND (?2 IS NULL OR created_at >= ?2)
           ORDER BY created_at ASC, seq ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str, since_str], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }
}

/// Insert a message, clamping its timestamp so it never precedes the latest
/// message already stored for the session. Call inside a transaction.
fn insert_message(
  conn: &rusqlite::Connection,
  session_id: &str,
  role: Role,
  content: &str,
) -> rusqlite::Result<RawMessage> {
  let now = encode_dt(Utc::now());
  let last: Option<String> = conn.query_row(
    "SELECT MAX(created_at) FROM messages WHERE session_id = ?1",
    rusqlite::params![session_id],
    |r| r.get(0),
  )?;
  // Fixed-width encoding: string order is chronological order.
  let created_at = match last {
    Some(last) if last > now => last,
    _ => now,
  };

  conn.execute(
    "INSERT INTO messages (session_id, role, content, created_at)
     VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![session_id, role.as_str(), content, created_at],
  )?;

  Ok(RawMessage {
    seq: conn.last_insert_rowid(),
    session_id: session_id.to_owned(),
    role: role.as_str().to_owned(),
    content: content.to_owned(),
    created_at,
  })
}

fn count_patient(conn: &rusqlite::Connection, session_id: &str) -> rusqlite::Result<u32> {
  let count: i64 = conn.query_row(
    "SELECT COUNT(*) FROM messages WHERE session_id = ?1 AND role = 'patient'",
    rusqlite::params![session_id],
    |r| r.get(0),
  )?;
  Ok(u32::try_from(count).unwrap_or(u32::MAX))
}

// ─── ConversationStore impl ──────────────────────────────────────────────────

impl ConversationStore for SqliteStore {
  type Error = crate::Error;

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn create_session(&self, message_cap: u32) -> Result<Session> {
    let session = Session {
      id: SessionId::new(),
      created_at: Utc::now(),
      closed_at: None,
      message_cap,
    };

    let id_str = encode_id(session.id);
    let at_str = encode_dt(session.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (session_id, created_at, message_cap) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, at_str, i64::from(message_cap)],
        )?;
        Ok(())
      })
      .await?;

    Ok(session)
  }

  async fn get_session(&self, id: SessionId) -> Result<Option<Session>> {
    let id_str = encode_id(id);

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = ?1"),
              rusqlite::params![id_str],
              RawSession::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn close_session(&self, id: SessionId) -> Result<Option<Session>> {
    let id_str = encode_id(id);
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE sessions SET closed_at = COALESCE(closed_at, ?2) WHERE session_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    self.get_session(id).await
  }

  async fn list_open_sessions(&self) -> Result<Vec<SessionPreview>> {
    let raws: Vec<RawPreview> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT
             s.session_id,
             su.key_points,
             su.updated_at,
             COALESCE(MAX(m.created_at), s.created_at) AS last_message_at
           FROM sessions s
           LEFT JOIN summaries su ON su.session_id = s.session_id
           LEFT JOIN messages  m  ON m.session_id  = s.session_id
           WHERE s.closed_at IS NULL
           GROUP BY s.session_id
           ORDER BY last_message_at DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawPreview {
              session_id:         row.get(0)?,
              key_points:         row.get(1)?,
              summary_updated_at: row.get(2)?,
              last_message_at:    row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPreview::into_preview).collect()
  }

  // ── Messages ──────────────────────────────────────────────────────────────

  async fn count_patient_messages(&self, id: SessionId) -> Result<u32> {
    let id_str = encode_id(id);
    let count = self
      .conn
      .call(move |conn| Ok(count_patient(conn, &id_str)?))
      .await?;
    Ok(count)
  }

  async fn admit_patient_message(
    &self,
    id: SessionId,
    content: String,
    limit: u32,
    closing_message: String,
  ) -> Result<AdmitOutcome> {
    let id_str = encode_id(id);

    // IMMEDIATE takes the write lock up front, so the count cannot go stale
    // between the check and the insert.
    let (admitted, raw) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let count = count_patient(&tx, &id_str)?;
        let outcome = match cap::admit(count, limit) {
          Admission::Allow => (true, insert_message(&tx, &id_str, Role::Patient, &content)?),
          Admission::Deny => (
            false,
            insert_message(&tx, &id_str, Role::Assistant, &closing_message)?,
          ),
        };
        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    let message = raw.into_message()?;
    Ok(if admitted {
      AdmitOutcome::Admitted(message)
    } else {
      AdmitOutcome::Capped(message)
    })
  }

  async fn append_message(
    &self,
    id: SessionId,
    role: Role,
    content: String,
  ) -> Result<Message> {
    let id_str = encode_id(id);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let raw = insert_message(&tx, &id_str, role, &content)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_message()
  }

  async fn messages_since(
    &self,
    id: SessionId,
    since: DateTime<Utc>,
  ) -> Result<Vec<Message>> {
    self.query_messages(id, Some(since)).await
  }

  async fn transcript(&self, id: SessionId) -> Result<Vec<Message>> {
    self.query_messages(id, None).await
  }

  // ── Summaries ─────────────────────────────────────────────────────────────

  async fn get_summary(&self, id: SessionId) -> Result<Option<Summary>> {
    let id_str = encode_id(id);

    let raw: Option<RawSummary> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT session_id, key_points, structured, free_text, updated_at
               FROM summaries WHERE session_id = ?1",
              rusqlite::params![id_str],
              RawSummary::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSummary::into_summary).transpose()
  }

  async fn upsert_summary(&self, summary: Summary) -> Result<()> {
    let id_str         = encode_id(summary.session_id);
    let key_points_str = encode_key_points(&summary.key_points)?;
    let structured_str = encode_structured(&summary.structured)?;
    let updated_at_str = encode_dt(summary.updated_at);
    let free_text      = summary.free_text;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO summaries (session_id, key_points, structured, free_text, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (session_id) DO UPDATE SET
             key_points = excluded.key_points,
             structured = excluded.structured,
             free_text  = excluded.free_text,
             updated_at = excluded.updated_at",
          rusqlite::params![id_str, key_points_str, structured_str, free_text, updated_at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
