//! Clinician-facing summary and the merge engine.
//!
//! A summary is never replaced wholesale once it exists: every fresh
//! extraction is merged into it so information captured earlier in the
//! conversation survives later re-summarisation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  prompts::{DEGRADED_FREE_TEXT, DEGRADED_KEY_POINT},
  session::SessionId,
};

/// Upper bound on the narrative part of a summary.
pub const FREE_TEXT_MAX_WORDS: usize = 120;

/// Named clinical fields. Absent fields are simply missing from the map.
pub type Structured = BTreeMap<String, Value>;

/// The live summary for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
  pub session_id: SessionId,
  /// Deduplicated, in first-seen order.
  pub key_points: Vec<String>,
  pub structured: Structured,
  pub free_text:  String,
  pub updated_at: DateTime<Utc>,
}

/// What the extraction capability produced for one transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
  #[serde(default)]
  pub key_points: Vec<String>,
  #[serde(default)]
  pub structured: Structured,
  #[serde(default)]
  pub free_text:  String,
}

impl Extraction {
  /// The deterministic stand-in used when extraction fails.
  pub fn degraded() -> Self {
    Self {
      key_points: vec![DEGRADED_KEY_POINT.to_owned()],
      structured: Structured::new(),
      free_text:  DEGRADED_FREE_TEXT.to_owned(),
    }
  }
}

/// `null`, blank strings, and empty arrays or objects carry no information.
pub fn is_empty_value(value: &Value) -> bool {
  match value {
    Value::Null => true,
    Value::String(s) => s.trim().is_empty(),
    Value::Array(items) => items.is_empty(),
    Value::Object(fields) => fields.is_empty(),
    Value::Bool(_) | Value::Number(_) => false,
  }
}

/// Truncate `text` to [`FREE_TEXT_MAX_WORDS`] words. Text within the bound is
/// returned unchanged apart from surrounding whitespace.
pub fn bound_free_text(text: &str) -> String {
  let text = text.trim();
  if text.split_whitespace().nth(FREE_TEXT_MAX_WORDS).is_none() {
    return text.to_owned();
  }
  text
    .split_whitespace()
    .take(FREE_TEXT_MAX_WORDS)
    .collect::<Vec<_>>()
    .join(" ")
}

/// Merge a fresh extraction into the previous summary.
///
/// - key points: union, first-seen order, exact-string dedup. The degraded
///   placeholder is the one exception: it is dropped as soon as a fresh
///   extraction carries a real finding;
/// - structured: a non-empty fresh value overwrites, an empty or absent one
///   leaves the old value alone;
/// - free text: replaced by the fresh narrative.
///
/// There is no way for an extraction to clear a field; a resolved symptom
/// stays in `structured` until a non-empty value replaces it.
pub fn merge(
  session_id: SessionId,
  old: Option<Summary>,
  fresh: Extraction,
  now: DateTime<Utc>,
) -> Summary {
  let (mut key_points, mut structured) = match old {
    Some(old) => (old.key_points, old.structured),
    None => (Vec::new(), Structured::new()),
  };

  let recovered = fresh
    .key_points
    .iter()
    .map(|p| p.trim())
    .any(|p| !p.is_empty() && p != DEGRADED_KEY_POINT);
  if recovered {
    key_points.retain(|p| p != DEGRADED_KEY_POINT);
  }

  for point in fresh.key_points {
    let point = point.trim();
    if point.is_empty() || key_points.iter().any(|p| p == point) {
      continue;
    }
    key_points.push(point.to_owned());
  }

  for (field, value) in fresh.structured {
    if !is_empty_value(&value) {
      structured.insert(field, value);
    }
  }

  Summary {
    session_id,
    key_points,
    structured,
    free_text: bound_free_text(&fresh.free_text),
    updated_at: now,
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn extraction(points: &[&str], structured: Value, free_text: &str) -> Extraction {
    Extraction {
      key_points: points.iter().map(|p| p.to_string()).collect(),
      structured: serde_json::from_value(structured).unwrap(),
      free_text:  free_text.into(),
    }
  }

  #[test]
  fn first_extraction_becomes_the_summary() {
    let id = SessionId::new();
    let fresh = extraction(
      &["headache", "2 days"],
      json!({ "chief_complaint": "headache" }),
      "Patient reports a headache.",
    );
    let summary = merge(id, None, fresh.clone(), Utc::now());

    assert_eq!(summary.session_id, id);
    assert_eq!(summary.key_points, fresh.key_points);
    assert_eq!(summary.structured, fresh.structured);
    assert_eq!(summary.free_text, fresh.free_text);
  }

  #[test]
  fn key_points_union_keeps_first_seen_order() {
    let id = SessionId::new();
    let old = merge(id, None, extraction(&["a", "b"], json!({}), ""), Utc::now());
    let merged = merge(id, Some(old), extraction(&["b", "c", "a"], json!({}), ""), Utc::now());
    assert_eq!(merged.key_points, vec!["a", "b", "c"]);
  }

  #[test]
  fn key_points_never_shrink() {
    let id = SessionId::new();
    let old = merge(id, None, extraction(&["fever", "cough"], json!({}), ""), Utc::now());
    let merged = merge(id, Some(old.clone()), extraction(&[], json!({}), ""), Utc::now());
    for point in &old.key_points {
      assert!(merged.key_points.contains(point));
    }
  }

  #[test]
  fn blank_key_points_are_dropped() {
    let merged = merge(
      SessionId::new(),
      None,
      extraction(&["  ", "nausea ", "nausea"], json!({}), ""),
      Utc::now(),
    );
    assert_eq!(merged.key_points, vec!["nausea"]);
  }

  #[test]
  fn structured_overwrites_only_with_non_empty_values() {
    let id = SessionId::new();
    let old = merge(
      id,
      None,
      extraction(
        &[],
        json!({
          "chief_complaint": "headache",
          "duration": "2 days",
          "allergies": ["penicillin"],
          "pain_score": 6,
        }),
        "",
      ),
      Utc::now(),
    );

    let fresh = extraction(
      &[],
      json!({
        "chief_complaint": "migraine",
        "duration": "",
        "allergies": [],
        "pain_score": null,
        "medications": ["ibuprofen 400mg"],
      }),
      "",
    );
    let merged = merge(id, Some(old), fresh, Utc::now());

    assert_eq!(merged.structured["chief_complaint"], json!("migraine"));
    assert_eq!(merged.structured["duration"], json!("2 days"));
    assert_eq!(merged.structured["allergies"], json!(["penicillin"]));
    assert_eq!(merged.structured["pain_score"], json!(6));
    assert_eq!(merged.structured["medications"], json!(["ibuprofen 400mg"]));
  }

  #[test]
  fn empty_fresh_fields_are_not_added() {
    let merged = merge(
      SessionId::new(),
      None,
      extraction(&[], json!({ "onset": "", "family_history": {} }), ""),
      Utc::now(),
    );
    assert!(merged.structured.is_empty());
  }

  #[test]
  fn free_text_is_replaced_wholesale() {
    let id = SessionId::new();
    let old = merge(id, None, extraction(&[], json!({}), "old narrative"), Utc::now());
    let merged = merge(id, Some(old), extraction(&[], json!({}), "new narrative"), Utc::now());
    assert_eq!(merged.free_text, "new narrative");
  }

  #[test]
  fn merging_the_same_extraction_twice_is_stable() {
    let id = SessionId::new();
    let old = merge(
      id,
      None,
      extraction(&["headache"], json!({ "duration": "2 days" }), "first"),
      Utc::now(),
    );
    let fresh = extraction(
      &["nausea", "headache"],
      json!({ "duration": "3 days", "allergies": "" }),
      "second",
    );

    let once = merge(id, Some(old), fresh.clone(), Utc::now());
    let twice = merge(id, Some(once.clone()), fresh, Utc::now());

    assert_eq!(twice.key_points, once.key_points);
    assert_eq!(twice.structured, once.structured);
    assert_eq!(twice.free_text, once.free_text);
  }

  #[test]
  fn free_text_is_bounded() {
    let long = vec!["word"; FREE_TEXT_MAX_WORDS + 30].join(" ");
    let merged = merge(SessionId::new(), None, extraction(&[], json!({}), &long), Utc::now());
    assert_eq!(merged.free_text.split_whitespace().count(), FREE_TEXT_MAX_WORDS);
  }

  #[test]
  fn short_free_text_keeps_its_spacing() {
    assert_eq!(bound_free_text("  two  words "), "two  words");
  }

  #[test]
  fn degraded_extraction_keeps_prior_structured_fields() {
    let id = SessionId::new();
    let old = merge(
      id,
      None,
      extraction(&["headache"], json!({ "chief_complaint": "headache" }), "ok"),
      Utc::now(),
    );
    let merged = merge(id, Some(old), Extraction::degraded(), Utc::now());

    assert_eq!(merged.key_points, vec!["headache", DEGRADED_KEY_POINT]);
    assert_eq!(merged.structured["chief_complaint"], json!("headache"));
    assert_eq!(merged.free_text, DEGRADED_FREE_TEXT);
  }

  #[test]
  fn placeholder_is_dropped_once_extraction_recovers() {
    let id = SessionId::new();
    let old = merge(id, None, extraction(&["headache"], json!({}), "ok"), Utc::now());
    let degraded = merge(id, Some(old), Extraction::degraded(), Utc::now());
    let recovered = merge(
      id,
      Some(degraded),
      extraction(&["headache", "nausea"], json!({}), "better"),
      Utc::now(),
    );
    assert_eq!(recovered.key_points, vec!["headache", "nausea"]);
  }

  #[test]
  fn placeholder_survives_an_extraction_without_findings() {
    let id = SessionId::new();
    let degraded = merge(id, None, Extraction::degraded(), Utc::now());
    let merged = merge(id, Some(degraded), extraction(&["  "], json!({}), ""), Utc::now());
    assert_eq!(merged.key_points, vec![DEGRADED_KEY_POINT]);
  }

  #[test]
  fn extraction_tolerates_missing_members() {
    let parsed: Extraction = serde_json::from_str(r#"{"free_text":"x"}"#).unwrap();
    assert!(parsed.key_points.is_empty());
    assert!(parsed.structured.is_empty());
    assert_eq!(parsed.free_text, "x");
  }
}
