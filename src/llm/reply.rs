//! Turning free-form model replies into typed values.
//!
//! Models asked for JSON often wrap it in Markdown fences or add a sentence
//! around it. `parse_reply` tolerates that framing but nothing else: the
//! payload must deserialize into the requested type or the call fails.

use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    #[error("reply contains no JSON value")]
    NoJson,
    #[error("reply JSON does not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),
}

pub fn parse_reply<T: DeserializeOwned>(raw: &str) -> Result<T, ReplyError> {
    let mut first_err = None;
    for payload in json_candidates(strip_fences(raw)) {
        match serde_json::from_str(payload) {
            Ok(value) => return Ok(value),
            Err(e) => {
                first_err.get_or_insert(e);
            }
        }
    }
    Err(first_err.map_or(ReplyError::NoJson, ReplyError::Shape))
}

/// Object and array spans, from the first opening bracket of each kind to
/// the last matching close, earliest start first.
fn json_candidates(body: &str) -> Vec<&str> {
    let mut spans: Vec<(usize, &str)> = [('{', '}'), ('[', ']')]
        .into_iter()
        .filter_map(|(open, close)| {
            let start = body.find(open)?;
            let end = body.rfind(close)?;
            (end > start).then(|| (start, &body[start..=end]))
        })
        .collect();
    spans.sort_by_key(|(start, _)| *start);
    spans.into_iter().map(|(_, span)| span).collect()
}

fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the language tag on the opening fence line
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
