//! Typed view over the scalar settings.

use super::kv::SettingsStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Keys of the scalar settings namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SettingKey {
    Policy,
    Content,
    Theme,
    FontFamily,
    FontSize,
    ContentStyle,
    WelcomeSeen,
}

impl SettingKey {
    pub const ALL: [SettingKey; 7] = [
        SettingKey::Policy,
        SettingKey::Content,
        SettingKey::Theme,
        SettingKey::FontFamily,
        SettingKey::FontSize,
        SettingKey::ContentStyle,
        SettingKey::WelcomeSeen,
    ];

    /// Key as stored on disk. These names are part of the profile format.
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::Policy => "policy",
            SettingKey::Content => "content",
            SettingKey::Theme => "theme",
            SettingKey::FontFamily => "fontFamily",
            SettingKey::FontSize => "fontSize",
            SettingKey::ContentStyle => "contentStyle",
            SettingKey::WelcomeSeen => "hasSeenWelcome_v2",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Genre the document is written in; selects the review framework.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStyle {
    #[default]
    Informational,
    News,
    Creative,
}

impl ContentStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentStyle::Informational => "informational",
            ContentStyle::News => "news",
            ContentStyle::Creative => "creative",
        }
    }

    /// Built-in policy that matches this style.
    pub fn template(self) -> &'static PolicyTemplate {
        let id = match self {
            ContentStyle::Informational => "infostyle",
            ContentStyle::News => "news",
            ContentStyle::Creative => "creative",
        };
        POLICY_TEMPLATES
            .iter()
            .find(|t| t.id == id)
            .unwrap_or(&POLICY_TEMPLATES[0])
    }
}

impl FromStr for ContentStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "informational" => Ok(ContentStyle::Informational),
            "news" => Ok(ContentStyle::News),
            "creative" => Ok(ContentStyle::Creative),
            other => Err(format!("unknown content style: {}", other)),
        }
    }
}

impl fmt::Display for ContentStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, built-in editorial policy.
#[derive(Debug)]
pub struct PolicyTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub content: &'static str,
}

pub const POLICY_TEMPLATES: &[PolicyTemplate] = &[
    PolicyTemplate {
        id: "infostyle",
        name: "Informational style",
        content: "1. Syntax: keep sentences short and in the active voice.\n\
                  2. Stop words: remove filler, hedges and empty intensifiers.\n\
                  3. Facts: replace evaluations with numbers and concrete details.\n\
                  4. Officialese: no nominalised verbs or bureaucratic stock phrases.",
    },
    PolicyTemplate {
        id: "news",
        name: "News desk",
        content: "1. Inverted pyramid: the lead answers who, what, where and when.\n\
                  2. Objectivity: no author opinion outside attributed quotes.\n\
                  3. Sources: every claim names a person, agency or document.\n\
                  4. Headline and lead must agree.",
    },
    PolicyTemplate {
        id: "creative",
        name: "Literary",
        content: "1. Imagery: prefer concrete sensory detail over abstraction.\n\
                  2. Show, don't tell: let action and dialogue carry emotion.\n\
                  3. Rhythm: vary sentence length deliberately.\n\
                  4. Dialogue: each voice should be recognisable without tags.",
    },
];

/// Policy used on first run.
pub fn default_policy() -> &'static str {
    POLICY_TEMPLATES[0].content
}

/// Font settings for the editor surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Typography {
    pub font_family: String,
    pub font_size: String,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_family: "font-sans".to_string(),
            font_size: "text-lg".to_string(),
        }
    }
}

/// Everything the session restores from the settings namespace on startup.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub policy: String,
    pub content: String,
    pub dark_mode: bool,
    pub typography: Typography,
    pub content_style: ContentStyle,
    pub welcome_seen: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            policy: default_policy().to_string(),
            content: String::new(),
            dark_mode: true,
            typography: Typography::default(),
            content_style: ContentStyle::default(),
            welcome_seen: false,
        }
    }
}

impl Settings {
    /// Read every key, falling back to defaults for absent or unparsable values.
    pub fn load(store: &SettingsStore) -> Self {
        let defaults = Self::default();
        let get = |key: SettingKey| store.get(key.as_str()).filter(|v| !v.is_empty());

        Self {
            policy: get(SettingKey::Policy).unwrap_or(defaults.policy),
            content: store
                .get(SettingKey::Content.as_str())
                .unwrap_or(defaults.content),
            dark_mode: store.get(SettingKey::Theme.as_str()).as_deref() != Some("false"),
            typography: Typography {
                font_family: get(SettingKey::FontFamily)
                    .unwrap_or(defaults.typography.font_family),
                font_size: get(SettingKey::FontSize).unwrap_or(defaults.typography.font_size),
            },
            content_style: get(SettingKey::ContentStyle)
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.content_style),
            welcome_seen: get(SettingKey::WelcomeSeen).is_some(),
        }
    }
}

/// Policy to use after switching to `style`.
///
/// A policy that is still one of the built-in templates follows the style;
/// anything the user wrote is left alone.
pub fn policy_for_style(current_policy: &str, style: ContentStyle) -> Option<&'static str> {
    let target = style.template();
    let is_builtin = POLICY_TEMPLATES.iter().any(|t| t.content == current_policy);
    if is_builtin && current_policy != target.content {
        Some(target.content)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_on_first_run() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::open(dir.path().join("settings.bin")).unwrap();

        let settings = Settings::load(&store);
        assert_eq!(settings, Settings::default());
        assert!(settings.dark_mode);
        assert!(!settings.welcome_seen);
    }

    #[test]
    fn test_load_stored_values() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::open(dir.path().join("settings.bin")).unwrap();
        store.set("theme", "false");
        store.set("fontFamily", "font-serif");
        store.set("contentStyle", "news");
        store.set("hasSeenWelcome_v2", "true");
        store.set("content", "draft");

        let settings = Settings::load(&store);
        assert!(!settings.dark_mode);
        assert_eq!(settings.typography.font_family, "font-serif");
        assert_eq!(settings.typography.font_size, "text-lg");
        assert_eq!(settings.content_style, ContentStyle::News);
        assert!(settings.welcome_seen);
        assert_eq!(settings.content, "draft");
    }

    #[test]
    fn test_unknown_style_falls_back() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::open(dir.path().join("settings.bin")).unwrap();
        store.set("contentStyle", "poetry");

        assert_eq!(Settings::load(&store).content_style, ContentStyle::Informational);
    }

    #[test]
    fn test_policy_follows_style_only_for_templates() {
        let info = ContentStyle::Informational.template().content;
        assert_eq!(
            policy_for_style(info, ContentStyle::Creative),
            Some(ContentStyle::Creative.template().content)
        );
        assert_eq!(policy_for_style(info, ContentStyle::Informational), None);
        assert_eq!(policy_for_style("My own rules", ContentStyle::News), None);
    }

    #[test]
    fn test_keys_are_distinct() {
        let mut names: Vec<_> = SettingKey::ALL.iter().map(|k| k.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), SettingKey::ALL.len());
    }
}
