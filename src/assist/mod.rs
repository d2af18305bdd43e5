//! Language-model collaborators.
//!
//! The host supplies implementations of the four traits below; each returns
//! the raw model output. This module builds the prompts, validates the
//! responses and applies the results to the document. Nothing here talks to
//! the network and no timeout is imposed on the calls.

mod edit;
mod parse;
pub mod prompt;
mod types;

pub use edit::{apply_fix, selection, splice, validate_document};
pub use parse::{clean_rewrite, parse_analysis, parse_headlines};
pub use prompt::Prompt;
pub use types::{
    AnalysisMode, AnalysisRequest, AnalysisResult, Headline, HeadlineStyle, Issue, Persona,
    RewriteOption, Severity,
};

use crate::error::Result;

/// Editorial review. Returns JSON matching [`AnalysisResult`].
pub trait Analyzer {
    fn analyze(&self, request: &AnalysisRequest, prompt: &Prompt) -> Result<String>;
}

/// Headline generation. Returns a JSON array of five [`Headline`]s.
pub trait HeadlineGenerator {
    fn generate(&self, prompt: &Prompt) -> Result<String>;
}

/// Fragment rewriting. Returns the replacement text.
pub trait Rewriter {
    fn rewrite(&self, selection: &str, option: RewriteOption, prompt: &Prompt) -> Result<String>;
}

/// Simulated reader reaction. Returns a short first-person reply.
pub trait PersonaSimulator {
    fn react(&self, persona: &Persona, prompt: &Prompt) -> Result<String>;
}
