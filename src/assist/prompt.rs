//! Prompt assembly for the collaborators.

use super::types::{AnalysisMode, AnalysisRequest, Persona, RewriteOption};
use crate::settings::ContentStyle;

/// Characters of the document sent for headline generation.
pub const HEADLINE_INPUT_CHARS: usize = 5000;

/// Characters of surrounding document sent as rewrite context.
pub const REWRITE_CONTEXT_CHARS: usize = 1000;

/// Characters of the document shown to a simulated reader.
pub const PERSONA_INPUT_CHARS: usize = 3000;

/// Sampling temperature per task.
pub fn analysis_temperature(style: ContentStyle) -> f32 {
    match style {
        ContentStyle::Creative => 0.4,
        _ => 0.1,
    }
}
pub const HEADLINE_TEMPERATURE: f32 = 0.7;
pub const REWRITE_TEMPERATURE: f32 = 0.5;
pub const PERSONA_TEMPERATURE: f32 = 0.8;

pub const STRICT_LANGUAGE_RULES: &str = "STRICT LANGUAGE RULES:\n\
    - Spelling, punctuation and agreement errors are always Critical.\n\
    - Use typographic quotes and proper dashes.\n\
    - Flag run-on sentences and dangling modifiers.";

pub const NEWS_FRAMEWORK: &str = "NEWS FRAMEWORK:\n\
    - The lead answers who, what, where and when.\n\
    - No author opinion; attribute every claim.\n\
    - Most important facts first, background last.";

pub const LITERARY_FRAMEWORK: &str = "LITERARY FRAMEWORK:\n\
    - Show, don't tell.\n\
    - Rhythm and atmosphere matter more than brevity.\n\
    - Dialogue should sound alive.";

/// A prompt ready to send.
#[derive(Clone, Debug, PartialEq)]
pub struct Prompt {
    pub text: String,
    pub temperature: f32,
    /// Whether a JSON response is expected.
    pub json: bool,
}

/// System instruction and effective policy for a review.
pub fn analysis_policy(request: &AnalysisRequest) -> (&'static str, String) {
    if request.mode == AnalysisMode::Proofread {
        return (
            "You are a professional proofreader. Find and fix only spelling, punctuation, \
             grammar and typography errors. Leave style and tone alone unless they contain \
             outright errors.",
            STRICT_LANGUAGE_RULES.to_string(),
        );
    }

    let (instruction, mut policy) = match request.style {
        ContentStyle::News => (
            "Act as a senior news editor at a major wire agency. Check the piece against \
             journalism standards: inverted pyramid, objectivity, sourcing. Be strict about \
             structure and facts.",
            format!("{}\n\nADDITIONAL DESK NOTES:\n{}", NEWS_FRAMEWORK, request.policy),
        ),
        ContentStyle::Creative => (
            "Act as a sensitive literary editor. Review this fiction for atmosphere, rhythm, \
             dialogue and show-don't-tell. Ignore terse-style rules unless they hurt the prose.",
            format!("{}\n\nADDITIONAL AUTHOR NOTES:\n{}", LITERARY_FRAMEWORK, request.policy),
        ),
        ContentStyle::Informational => (
            "Act as a strict senior editor. Review the text against the EDITORIAL POLICY. \
             You value brevity, facts and the active voice, and have no patience for filler.",
            request.policy.clone(),
        ),
    };

    if request.strict {
        policy.push_str("\n\n");
        policy.push_str(STRICT_LANGUAGE_RULES);
    }

    (instruction, policy)
}

pub fn analysis_prompt(request: &AnalysisRequest) -> Prompt {
    let (instruction, policy) = analysis_policy(request);
    let text = format!(
        "{instruction}\n\n\
         REVIEW CRITERIA (POLICY / FRAMEWORK):\n{policy}\n\n\
         CONTENT TO REVIEW:\n{content}\n\n\
         Review ONLY against the criteria above, using a tone of critique suited to '{style}'.\n\
         If the text is flawless, give 100 points. Otherwise list each problem, quote the \
         offending text exactly as it appears, explain why it fails and suggest a fix.",
        instruction = instruction,
        policy = policy,
        content = request.text,
        style = request.style,
    );

    Prompt {
        text,
        temperature: analysis_temperature(request.style),
        json: true,
    }
}

pub fn headline_prompt(text: &str, style: ContentStyle) -> Prompt {
    let genre = match style {
        ContentStyle::Informational => "informational / business",
        ContentStyle::News => "news / journalism",
        ContentStyle::Creative => "fiction / storytelling",
    };
    let text = format!(
        "Read the text below and write 5 headlines, one per category.\n\
         The text is written in a {genre} style.\n\
         Categories:\n\
         1. SEO (searchable, contains key terms)\n\
         2. Clickbait (intriguing, high CTR, but not deceptive)\n\
         3. Social (engaging, for social feeds)\n\
         4. Business (restrained, factual)\n\
         5. Creative (unusual, metaphorical, wordplay)\n\n\
         Text:\n{body}",
        genre = genre,
        body = truncate_chars(text, HEADLINE_INPUT_CHARS),
    );

    Prompt {
        text,
        temperature: HEADLINE_TEMPERATURE,
        json: true,
    }
}

pub fn rewrite_prompt(selection: &str, option: RewriteOption, context: &str) -> Prompt {
    let text = format!(
        "Rewrite the SELECTED FRAGMENT following the instruction.\n\
         INSTRUCTION: {instruction}\n\n\
         CONTEXT (whole text, for meaning only):\n{context} ...\n\n\
         SELECTED FRAGMENT:\n\"{selection}\"\n\n\
         Return ONLY the rewritten text: no quotes, no preamble, no explanation. It must fit \
         grammatically where the fragment was.",
        instruction = option.instruction(),
        context = truncate_chars(context, REWRITE_CONTEXT_CHARS),
        selection = selection,
    );

    Prompt {
        text,
        temperature: REWRITE_TEMPERATURE,
        json: false,
    }
}

pub fn persona_prompt(text: &str, persona: &Persona) -> Prompt {
    let role = match &persona.custom_description {
        Some(description) => format!(
            "You are a person described as: \"{}\". Inhabit this role fully: their values, \
             fears and vocabulary. Comment on the text strictly from their point of view.",
            description
        ),
        None => persona.system_prompt.clone().unwrap_or_default(),
    };

    let text = format!(
        "ROLE:\n{role}\n\n\
         ROLE CONTEXT:\nName: {name} ({emoji})\nDescription: {description}\n\n\
         TASK:\nRead the text and give honest first-person feedback in 2-4 short, emotional \
         sentences, in your character's voice. Criticise or praise freely.\n\n\
         TEXT:\n{body}\n\n\
         YOUR REPLY:",
        role = role,
        name = persona.name,
        emoji = persona.emoji,
        description = persona.description,
        body = truncate_chars(text, PERSONA_INPUT_CHARS),
    );

    Prompt {
        text,
        temperature: PERSONA_TEMPERATURE,
        json: false,
    }
}

/// First `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(mode: AnalysisMode, style: ContentStyle, strict: bool) -> AnalysisRequest {
        AnalysisRequest {
            text: "Body text.".into(),
            policy: "House rules.".into(),
            mode,
            strict,
            style,
        }
    }

    #[test]
    fn test_proofread_ignores_policy() {
        let (_, policy) = analysis_policy(&request(
            AnalysisMode::Proofread,
            ContentStyle::News,
            false,
        ));
        assert_eq!(policy, STRICT_LANGUAGE_RULES);
    }

    #[test]
    fn test_style_frameworks() {
        let (_, news) = analysis_policy(&request(AnalysisMode::Full, ContentStyle::News, false));
        assert!(news.starts_with(NEWS_FRAMEWORK));
        assert!(news.ends_with("House rules."));

        let (_, info) = analysis_policy(&request(
            AnalysisMode::Full,
            ContentStyle::Informational,
            true,
        ));
        assert!(info.starts_with("House rules."));
        assert!(info.ends_with(STRICT_LANGUAGE_RULES));
    }

    #[test]
    fn test_analysis_prompt() {
        let prompt = analysis_prompt(&request(AnalysisMode::Full, ContentStyle::Creative, false));
        assert!(prompt.json);
        assert_eq!(prompt.temperature, 0.4);
        assert!(prompt.text.contains("Body text."));
        assert!(prompt.text.contains(LITERARY_FRAMEWORK));
    }

    #[test]
    fn test_inputs_truncated() {
        let long = "x".repeat(HEADLINE_INPUT_CHARS + 100);
        let prompt = headline_prompt(&long, ContentStyle::News);
        assert!(!prompt.text.contains(&"x".repeat(HEADLINE_INPUT_CHARS + 1)));
        assert!(prompt.text.contains(&"x".repeat(HEADLINE_INPUT_CHARS)));
    }

    #[test]
    fn test_custom_persona_prompt() {
        let persona = Persona::custom("a retired sailor who hates jargon");
        let prompt = persona_prompt("Synergy!", &persona);
        assert!(prompt.text.contains("retired sailor"));
        assert!(!prompt.json);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("абвгд", 3), "абв");
        assert_eq!(truncate_chars("ab", 5), "ab");
    }
}
