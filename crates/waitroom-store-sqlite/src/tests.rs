//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeSet;

use chrono::{Duration, Utc};
use serde_json::json;
use waitroom_core::{
  message::Role,
  session::SessionId,
  store::{AdmitOutcome, ConversationStore},
  summary::{Structured, Summary},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

const CLOSING: &str = "cap reached";

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_session() {
  let s = store().await;

  let session = s.create_session(5).await.unwrap();
  assert_eq!(session.message_cap, 5);
  assert!(session.is_open());

  let fetched = s.get_session(session.id).await.unwrap().unwrap();
  assert_eq!(fetched.id, session.id);
  assert_eq!(fetched.message_cap, 5);
  assert!(fetched.closed_at.is_none());
}

#[tokio::test]
async fn get_session_missing_returns_none() {
  let s = store().await;
  assert!(s.get_session(SessionId::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn close_session_is_sticky() {
  let s = store().await;
  let session = s.create_session(5).await.unwrap();

  let closed = s.close_session(session.id).await.unwrap().unwrap();
  let first_close = closed.closed_at.expect("closed_at set");

  let again = s.close_session(session.id).await.unwrap().unwrap();
  assert_eq!(again.closed_at, Some(first_close));
}

#[tokio::test]
async fn close_missing_session_returns_none() {
  let s = store().await;
  assert!(s.close_session(SessionId::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_open_sessions_skips_closed_and_orders_by_activity() {
  let s = store().await;
  let quiet = s.create_session(5).await.unwrap();
  let busy = s.create_session(5).await.unwrap();
  let closed = s.create_session(5).await.unwrap();
  s.close_session(closed.id).await.unwrap();

  s.append_message(busy.id, Role::Patient, "hello".into())
    .await
    .unwrap();

  let previews = s.list_open_sessions().await.unwrap();
  let ids: Vec<_> = previews.iter().map(|p| p.session_id).collect();
  assert_eq!(ids, vec![busy.id, quiet.id]);
  assert!(previews.iter().all(|p| p.key_points.is_empty()));
  assert!(previews.iter().all(|p| p.summary_updated_at.is_none()));
}

#[tokio::test]
async fn preview_carries_summary_key_points() {
  let s = store().await;
  let session = s.create_session(5).await.unwrap();
  s.upsert_summary(summary(session.id, &["fever"], "text"))
    .await
    .unwrap();

  let previews = s.list_open_sessions().await.unwrap();
  assert_eq!(previews.len(), 1);
  assert_eq!(previews[0].key_points, vec!["fever"]);
  assert!(previews[0].summary_updated_at.is_some());
}

// ─── Messages ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn transcript_is_in_insertion_order_with_non_decreasing_timestamps() {
  let s = store().await;
  let session = s.create_session(10).await.unwrap();

  for (role, text) in [
    (Role::Patient, "one"),
    (Role::Assistant, "two"),
    (Role::Patient, "three"),
    (Role::Assistant, "four"),
  ] {
    s.append_message(session.id, role, text.into()).await.unwrap();
  }

  let transcript = s.transcript(session.id).await.unwrap();
  let contents: Vec<_> = transcript.iter().map(|m| m.content.as_str()).collect();
  assert_eq!(contents, vec!["one", "two", "three", "four"]);
  assert!(transcript.windows(2).all(|w| w[0].created_at <= w[1].created_at));
  assert!(transcript.windows(2).all(|w| w[0].seq < w[1].seq));
}

#[tokio::test]
async fn transcripts_are_isolated_per_session() {
  let s = store().await;
  let a = s.create_session(10).await.unwrap();
  let b = s.create_session(10).await.unwrap();

  s.append_message(a.id, Role::Patient, "for a".into()).await.unwrap();
  s.append_message(b.id, Role::Patient, "for b".into()).await.unwrap();

  let ta = s.transcript(a.id).await.unwrap();
  assert_eq!(ta.len(), 1);
  assert_eq!(ta[0].content, "for a");
  assert_eq!(s.count_patient_messages(b.id).await.unwrap(), 1);
}

#[tokio::test]
async fn append_to_unknown_session_fails() {
  let s = store().await;
  let result = s
    .append_message(SessionId::new(), Role::Patient, "orphan".into())
    .await;
  assert!(result.is_err());
}

#[tokio::test]
async fn messages_since_filters_by_timestamp() {
  let s = store().await;
  let session = s.create_session(10).await.unwrap();
  let first = s
    .append_message(session.id, Role::Patient, "first".into())
    .await
    .unwrap();

  let all = s
    .messages_since(session.id, first.created_at - Duration::seconds(1))
    .await
    .unwrap();
  assert_eq!(all.len(), 1);

  let none = s
    .messages_since(session.id, Utc::now() + Duration::hours(1))
    .await
    .unwrap();
  assert!(none.is_empty());
}

#[tokio::test]
async fn count_only_includes_patient_messages() {
  let s = store().await;
  let session = s.create_session(10).await.unwrap();
  s.append_message(session.id, Role::Patient, "a".into()).await.unwrap();
  s.append_message(session.id, Role::Assistant, "b".into()).await.unwrap();
  s.append_message(session.id, Role::Patient, "c".into()).await.unwrap();

  assert_eq!(s.count_patient_messages(session.id).await.unwrap(), 2);
}

// ─── Cap admission ───────────────────────────────────────────────────────────

#[tokio::test]
async fn admission_persists_patient_message_until_cap() {
  let s = store().await;
  let session = s.create_session(2).await.unwrap();

  for text in ["one", "two"] {
    let outcome = s
      .admit_patient_message(session.id, text.into(), 2, CLOSING.into())
      .await
      .unwrap();
    assert!(
      matches!(outcome, AdmitOutcome::Admitted(ref m) if m.role == Role::Patient && m.content == text)
    );
  }

  let outcome = s
    .admit_patient_message(session.id, "three".into(), 2, CLOSING.into())
    .await
    .unwrap();
  assert!(
    matches!(outcome, AdmitOutcome::Capped(ref m) if m.role == Role::Assistant && m.content == CLOSING)
  );

  let transcript = s.transcript(session.id).await.unwrap();
  assert_eq!(transcript.len(), 3);
  assert!(transcript.iter().all(|m| m.content != "three"));
  assert_eq!(s.count_patient_messages(session.id).await.unwrap(), 2);
}

#[tokio::test]
async fn concurrent_admissions_never_exceed_cap() {
  let s = store().await;
  let session = s.create_session(3).await.unwrap();

  let mut handles = Vec::new();
  for i in 0..10 {
    let s = s.clone();
    handles.push(tokio::spawn(async move {
      s.admit_patient_message(session.id, format!("msg {i}"), 3, CLOSING.into())
        .await
        .unwrap()
    }));
  }

  let mut admitted = 0;
  for h in handles {
    if let AdmitOutcome::Admitted(_) = h.await.unwrap() {
      admitted += 1;
    }
  }

  assert_eq!(admitted, 3);
  assert_eq!(s.count_patient_messages(session.id).await.unwrap(), 3);
}

// ─── Summaries ───────────────────────────────────────────────────────────────

fn summary(id: SessionId, points: &[&str], free_text: &str) -> Summary {
  let structured: Structured =
    serde_json::from_value(json!({ "chief_complaint": "headache" })).unwrap();
  Summary {
    session_id: id,
    key_points: points.iter().map(|p| p.to_string()).collect(),
    structured,
    free_text: free_text.into(),
    updated_at: Utc::now(),
  }
}

#[tokio::test]
async fn get_summary_missing_returns_none() {
  let s = store().await;
  let session = s.create_session(2).await.unwrap();
  assert!(s.get_summary(session.id).await.unwrap().is_none());
}

#[tokio::test]
async fn summary_roundtrip_and_upsert_replaces_row() {
  let s = store().await;
  let session = s.create_session(2).await.unwrap();

  s.upsert_summary(summary(session.id, &["headache"], "first"))
    .await
    .unwrap();
  s.upsert_summary(summary(session.id, &["headache", "nausea"], "second"))
    .await
    .unwrap();

  let stored = s.get_summary(session.id).await.unwrap().unwrap();
  assert_eq!(stored.key_points, vec!["headache", "nausea"]);
  assert_eq!(stored.structured["chief_complaint"], json!("headache"));
  assert_eq!(stored.free_text, "second");

  let previews = s.list_open_sessions().await.unwrap();
  let distinct: BTreeSet<_> = previews.iter().map(|p| p.session_id).collect();
  assert_eq!(distinct.len(), 1);
}
