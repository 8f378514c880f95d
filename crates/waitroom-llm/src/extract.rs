//! Parsing of extraction replies.

use waitroom_core::summary::Extraction;

use crate::Result;

/// Models sometimes wrap JSON in a Markdown fence despite being told not to.
fn strip_code_fence(text: &str) -> &str {
  let text = text.trim();
  let Some(rest) = text.strip_prefix("```") else {
    return text;
  };
  // Drop the info string (e.g. `json`) on the opening fence line. A fence
  // opened and closed on one line has no info string.
  let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
  let body = body.trim_end();
  body.strip_suffix("```").unwrap_or(body).trim()
}

pub fn parse_extraction(text: &str) -> Result<Extraction> {
  Ok(serde_json::from_str(strip_code_fence(text))?)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::Error;

  #[test]
  fn parses_bare_json() {
    let parsed = parse_extraction(
      r#"{"key_points":["fever"],"structured":{"duration":"3 days"},"free_text":"Fever."}"#,
    )
    .unwrap();
    assert_eq!(parsed.key_points, vec!["fever"]);
    assert_eq!(parsed.structured["duration"], json!("3 days"));
    assert_eq!(parsed.free_text, "Fever.");
  }

  #[test]
  fn parses_fenced_json() {
    let text = "```json\n{\"key_points\":[\"cough\"],\"free_text\":\"Cough.\"}\n```\n";
    let parsed = parse_extraction(text).unwrap();
    assert_eq!(parsed.key_points, vec!["cough"]);
    assert!(parsed.structured.is_empty());
  }

  #[test]
  fn parses_single_line_fence() {
    let parsed = parse_extraction("```{\"free_text\":\"x\"}```").unwrap();
    assert_eq!(parsed.free_text, "x");
  }

  #[test]
  fn prose_is_a_decode_error() {
    assert!(matches!(
      parse_extraction("The patient has a headache."),
      Err(Error::Decode(_))
    ));
  }
}
