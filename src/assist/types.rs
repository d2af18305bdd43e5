//! Request and response types for the language-model collaborators.

use crate::settings::ContentStyle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Depth of an editorial review.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Review against the policy and the style framework.
    #[default]
    Full,
    /// Spelling, punctuation and grammar only.
    Proofread,
}

/// Input for an editorial review.
#[derive(Clone, Debug)]
pub struct AnalysisRequest {
    pub text: String,
    pub policy: String,
    pub mode: AnalysisMode,
    /// Append the strict language rules to the policy.
    pub strict: bool,
    pub style: ContentStyle,
}

/// How serious an issue is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    Warning,
    Nitpick,
    /// Praise: something the text does well.
    Good,
}

/// One finding from a review.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub rule_violated: String,
    /// Exact excerpt of the reviewed text.
    pub quoted_text: String,
    pub suggestion: String,
    pub severity: Severity,
    pub explanation: String,
}

/// Validated review result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// 0 to 100.
    pub score: u8,
    pub summary: String,
    pub tone_analysis: String,
    pub issues: Vec<Issue>,
}

/// The five headline categories. Every generation covers each exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeadlineStyle {
    #[serde(rename = "SEO")]
    Seo,
    Clickbait,
    Social,
    Business,
    Creative,
}

impl HeadlineStyle {
    pub const ALL: [HeadlineStyle; 5] = [
        HeadlineStyle::Seo,
        HeadlineStyle::Clickbait,
        HeadlineStyle::Social,
        HeadlineStyle::Business,
        HeadlineStyle::Creative,
    ];
}

/// One generated headline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub style: HeadlineStyle,
    /// Human-readable name of the style.
    pub label: String,
    pub text: String,
    pub explanation: String,
}

/// What to do with a selected fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewriteOption {
    Shorten,
    Expand,
    Formal,
    Creative,
    Fix,
    /// Deliberately heavy officialese, as a cautionary example.
    Bureaucratese,
}

impl RewriteOption {
    pub fn instruction(self) -> &'static str {
        match self {
            RewriteOption::Shorten => {
                "Shorten this fragment while keeping its main point. Remove filler and redundant words."
            }
            RewriteOption::Expand => {
                "Develop the idea in more detail with specifics or explanation, without padding."
            }
            RewriteOption::Formal => {
                "Rewrite this fragment in a formal, businesslike register with professional vocabulary."
            }
            RewriteOption::Creative => {
                "Make this fragment livelier and more vivid. Use imagery or fresh turns of phrase."
            }
            RewriteOption::Fix => {
                "Fix grammar, punctuation and style errors in this fragment, keeping its meaning."
            }
            RewriteOption::Bureaucratese => {
                "Rewrite this fragment in heavy bureaucratic language: nominalised verbs, passive \
                 voice, stock phrases. It should read as dry and hard to follow as possible."
            }
        }
    }
}

/// A simulated reader.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub description: String,
    /// Role prompt for built-in personas.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Free-form description for a user-defined persona.
    #[serde(default)]
    pub custom_description: Option<String>,
}

impl Persona {
    /// A persona described by the user in their own words.
    pub fn custom(description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            id: "custom".to_string(),
            name: "Custom reader".to_string(),
            emoji: "👤".to_string(),
            description: description.clone(),
            system_prompt: None,
            custom_description: Some(description),
        }
    }

    pub fn is_custom(&self) -> bool {
        self.custom_description.is_some()
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.emoji, self.name)
    }
}
