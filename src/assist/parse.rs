//! Validation of raw collaborator responses.

use super::types::{AnalysisResult, Headline, HeadlineStyle, Issue};
use crate::error::{RedpenError, Result};
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    score: f64,
    summary: String,
    tone_analysis: String,
    issues: Vec<Issue>,
}

/// Parse and validate a review response.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult> {
    let parsed: RawAnalysis = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| RedpenError::MalformedResponse(format!("analysis: {}", e)))?;

    if !parsed.score.is_finite() || !(0.0..=100.0).contains(&parsed.score) {
        return Err(RedpenError::MalformedResponse(format!(
            "score out of range: {}",
            parsed.score
        )));
    }

    Ok(AnalysisResult {
        score: parsed.score.round() as u8,
        summary: parsed.summary,
        tone_analysis: parsed.tone_analysis,
        issues: parsed.issues,
    })
}

/// Parse and validate a headline response: exactly one headline per style.
pub fn parse_headlines(raw: &str) -> Result<Vec<Headline>> {
    let headlines: Vec<Headline> = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| RedpenError::MalformedResponse(format!("headlines: {}", e)))?;

    if headlines.len() != HeadlineStyle::ALL.len() {
        return Err(RedpenError::MalformedResponse(format!(
            "expected {} headlines, got {}",
            HeadlineStyle::ALL.len(),
            headlines.len()
        )));
    }

    let styles: HashSet<HeadlineStyle> = headlines.iter().map(|h| h.style).collect();
    if styles.len() != HeadlineStyle::ALL.len() {
        return Err(RedpenError::MalformedResponse(
            "headline styles must each appear once".into(),
        ));
    }

    if let Some(empty) = headlines.iter().find(|h| h.text.trim().is_empty()) {
        return Err(RedpenError::MalformedResponse(format!(
            "empty headline for {:?}",
            empty.style
        )));
    }

    Ok(headlines)
}

/// Normalise a rewrite response for splicing.
///
/// Trims whitespace and strips one pair of wrapping quotation marks. An
/// empty response falls back to the original selection.
pub fn clean_rewrite(raw: &str, selection: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return selection.to_string();
    }

    const PAIRS: [(char, char); 4] = [('"', '"'), ('\u{201c}', '\u{201d}'), ('«', '»'), ('\'', '\'')];

    for (open, close) in PAIRS {
        if trimmed.chars().count() >= 2 && trimmed.starts_with(open) && trimmed.ends_with(close) {
            let inner = &trimmed[open.len_utf8()..trimmed.len() - close.len_utf8()];
            return inner.trim().to_string();
        }
    }

    trimmed.to_string()
}

/// Drop a surrounding Markdown code fence, if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
