//! Editing session: the in-memory document and settings, and every
//! operation that mutates them.

use crate::assist::{
    self,
    prompt::{self, Prompt},
    AnalysisMode, AnalysisRequest, AnalysisResult, Analyzer, Headline,
    HeadlineGenerator, Persona, PersonaSimulator, RewriteOption, Rewriter,
};
use crate::config::SessionConfig;
use crate::error::{RedpenError, Result};
use crate::history::SnapshotHistory;
use crate::scheduler::{Scheduler, SchedulerEvent};
use crate::settings::{policy_for_style, ContentStyle, SettingKey, Settings, SettingsStore, Typography};
use crate::store::Profile;
use crate::types::{Snapshot, SnapshotKind};
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Field that can be cleared and brought back with undo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearTarget {
    Content,
    Policy,
}

/// Operations currently waiting on a collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BusyFlags {
    pub analyzing: bool,
    pub generating_headlines: bool,
    pub rewriting: bool,
    pub simulating: bool,
}

/// Analysis waiting on its collaborator.
#[derive(Clone, Debug)]
pub struct PendingAnalysis {
    pub request: AnalysisRequest,
    pub prompt: Prompt,
}

/// Rewrite waiting on its collaborator.
#[derive(Clone, Debug)]
pub struct PendingRewrite {
    pub selection: String,
    pub start: usize,
    pub end: usize,
    pub option: RewriteOption,
    pub prompt: Prompt,
}

/// Short, user-facing message about something that did not work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

impl Notice {
    fn from_error(error: &RedpenError) -> Self {
        let message = match error {
            RedpenError::EmptyDocument => "Enter some text first.".to_string(),
            RedpenError::DocumentTooLong { max, .. } => {
                format!("The text is too long. The limit is {} characters.", max)
            }
            RedpenError::FixNotFound => {
                "Couldn't find an exact match to replace. The text may have changed.".to_string()
            }
            RedpenError::InvalidSelection { .. } => "The selection is no longer valid.".to_string(),
            RedpenError::MissingCredential => "The API key is missing.".to_string(),
            RedpenError::Collaborator(_) | RedpenError::MalformedResponse(_) => {
                "The assistant request failed. Please try again.".to_string()
            }
            other => other.to_string(),
        };
        Self { message }
    }
}

#[derive(Debug)]
struct UndoSlot {
    target: ClearTarget,
    value: String,
    captured_at: Instant,
}

/// State of one editing session.
///
/// Owns the profile for its lifetime. Content and policy edits reach disk
/// through the scheduler's debounced autosave; other settings are written
/// immediately.
pub struct Session {
    config: SessionConfig,

    content: String,
    settings: Settings,
    analysis: Option<AnalysisResult>,
    headlines: Vec<Headline>,
    busy: BusyFlags,
    notice: Option<Notice>,
    undo: Option<UndoSlot>,

    history: Arc<SnapshotHistory>,
    settings_store: Arc<SettingsStore>,

    // Declared before `profile` so pending autosaves are flushed before the
    // profile lock is released.
    scheduler: Scheduler,
    profile: Profile,
}

impl Session {
    /// Load settings and history from `profile` and start the scheduler.
    pub fn open(profile: Profile, config: SessionConfig) -> Result<Self> {
        let settings_store = Arc::clone(profile.settings());
        let history = Arc::clone(profile.history());
        let settings = Settings::load(&settings_store);

        let scheduler = Scheduler::start(
            Arc::clone(&history),
            Arc::clone(&settings_store),
            config.schedule.clone(),
            settings.content.clone(),
            settings.policy.clone(),
        )?;

        debug!(
            snapshots = history.count(),
            chars = settings.content.chars().count(),
            "session opened"
        );

        Ok(Self {
            config,
            content: settings.content.clone(),
            settings,
            analysis: None,
            headlines: Vec::new(),
            busy: BusyFlags::default(),
            notice: None,
            undo: None,
            history,
            settings_store,
            scheduler,
            profile,
        })
    }

    // --- Accessors ---

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn policy(&self) -> &str {
        &self.settings.policy
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn headlines(&self) -> &[Headline] {
        &self.headlines
    }

    pub fn busy(&self) -> BusyFlags {
        self.busy
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Scheduler activity feed.
    pub fn scheduler_events(&self) -> &Receiver<SchedulerEvent> {
        self.scheduler.events()
    }

    /// Whether the content is over the review limit.
    pub fn is_over_limit(&self) -> bool {
        self.content.chars().count() > self.config.max_document_chars
    }

    // --- Editing ---

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.scheduler.content_changed(&self.content);
    }

    pub fn set_policy(&mut self, policy: impl Into<String>) {
        self.settings.policy = policy.into();
        self.scheduler.policy_changed(&self.settings.policy);
    }

    pub fn set_dark_mode(&mut self, dark: bool) {
        self.settings.dark_mode = dark;
        self.settings_store
            .set(SettingKey::Theme.as_str(), if dark { "true" } else { "false" });
    }

    pub fn toggle_theme(&mut self) {
        self.set_dark_mode(!self.settings.dark_mode);
    }

    pub fn set_typography(&mut self, typography: Typography) {
        self.settings_store
            .set(SettingKey::FontFamily.as_str(), &typography.font_family);
        self.settings_store
            .set(SettingKey::FontSize.as_str(), &typography.font_size);
        self.settings.typography = typography;
    }

    /// Switch genre. A policy still equal to a built-in template follows the
    /// new style's template.
    pub fn set_content_style(&mut self, style: ContentStyle) {
        if let Some(policy) = policy_for_style(&self.settings.policy, style) {
            self.set_policy(policy);
        }
        self.settings.content_style = style;
        self.settings_store
            .set(SettingKey::ContentStyle.as_str(), style.as_str());
    }

    pub fn mark_welcome_seen(&mut self) {
        self.settings.welcome_seen = true;
        self.settings_store.set(SettingKey::WelcomeSeen.as_str(), "true");
    }

    /// Write pending draft and policy autosaves now.
    pub fn flush(&self) {
        self.scheduler.flush();
    }

    // --- History ---

    /// Explicit user save. Returns whether a snapshot was created.
    pub fn save_now(&self) -> bool {
        self.history.capture(&self.content, SnapshotKind::Manual)
    }

    /// All snapshots, newest first.
    pub fn history(&self) -> Vec<Snapshot> {
        self.history.list_all()
    }

    pub fn history_count(&self) -> usize {
        self.history.count()
    }

    /// Replace the document with a snapshot's content.
    ///
    /// The current document is saved as a manual snapshot first, so the
    /// restore can itself be undone from history.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        if !self.content.trim().is_empty() {
            self.history.capture(&self.content, SnapshotKind::Manual);
        }

        self.history.reset_baseline(&snapshot.content);
        self.set_content(snapshot.content.clone());
        debug!(id = %snapshot.id, "restored snapshot");
    }

    /// Empty a field, keeping its value for undo.
    ///
    /// Returns false (and does nothing) if the field is already empty.
    /// Clearing content saves it as a manual snapshot first.
    pub fn clear(&mut self, target: ClearTarget) -> bool {
        let value = match target {
            ClearTarget::Content => self.content.clone(),
            ClearTarget::Policy => self.settings.policy.clone(),
        };
        if value.is_empty() {
            return false;
        }

        match target {
            ClearTarget::Content => {
                self.history.capture(&value, SnapshotKind::Manual);
                self.analysis = None;
                self.set_content(String::new());
            }
            ClearTarget::Policy => self.set_policy(String::new()),
        }

        self.undo = Some(UndoSlot {
            target,
            value,
            captured_at: Instant::now(),
        });
        true
    }

    /// Field that `undo` would restore, if the slot hasn't expired.
    pub fn pending_undo(&mut self) -> Option<ClearTarget> {
        self.expire_undo();
        self.undo.as_ref().map(|slot| slot.target)
    }

    /// Bring back the last cleared value. No effect once the slot expired.
    pub fn undo(&mut self) -> bool {
        self.expire_undo();
        let Some(slot) = self.undo.take() else {
            return false;
        };

        match slot.target {
            ClearTarget::Content => self.set_content(slot.value),
            ClearTarget::Policy => self.set_policy(slot.value),
        }
        true
    }

    fn expire_undo(&mut self) {
        let window = self.config.undo_window;
        if self
            .undo
            .as_ref()
            .is_some_and(|slot| slot.captured_at.elapsed() >= window)
        {
            self.undo = None;
        }
    }

    // --- Collaborators ---
    //
    // Each collaborator call is split into a `begin_*` step that validates
    // and raises the busy flag, and a `finish_*` step that takes the
    // collaborator's raw response and lowers it. The one-shot methods run
    // both around a synchronous call.

    /// Review the document. The previous result is discarded first.
    pub fn analyze(
        &mut self,
        analyzer: &dyn Analyzer,
        mode: AnalysisMode,
        strict: bool,
    ) -> Result<&AnalysisResult> {
        let pending = self.begin_analysis(mode, strict)?;
        let response = analyzer.analyze(&pending.request, &pending.prompt);
        self.finish_analysis(response)
    }

    pub fn begin_analysis(&mut self, mode: AnalysisMode, strict: bool) -> Result<PendingAnalysis> {
        if let Err(e) = assist::validate_document(&self.content, self.config.max_document_chars) {
            return Err(self.report(e));
        }

        let request = AnalysisRequest {
            text: self.content.clone(),
            policy: self.settings.policy.clone(),
            mode,
            strict,
            style: self.settings.content_style,
        };
        let prompt = prompt::analysis_prompt(&request);

        self.analysis = None;
        self.notice = None;
        self.busy.analyzing = true;
        Ok(PendingAnalysis { request, prompt })
    }

    pub fn finish_analysis(&mut self, response: Result<String>) -> Result<&AnalysisResult> {
        self.busy.analyzing = false;
        match response.and_then(|raw| assist::parse_analysis(&raw)) {
            Ok(analysis) => Ok(&*self.analysis.insert(analysis)),
            Err(e) => Err(self.report(e)),
        }
    }

    /// Apply the suggestion of issue `index` and drop it from the result.
    pub fn apply_fix(&mut self, index: usize) -> Result<()> {
        let Some(issue) = self
            .analysis
            .as_ref()
            .and_then(|a| a.issues.get(index))
            .cloned()
        else {
            return Err(self.report(RedpenError::FixNotFound));
        };

        match assist::apply_fix(&self.content, &issue) {
            Ok(updated) => {
                self.set_content(updated);
                if let Some(analysis) = self.analysis.as_mut() {
                    analysis.issues.remove(index);
                }
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    /// Headline suggestions. Cached results are returned unless
    /// `regenerate` is set.
    pub fn generate_headlines(
        &mut self,
        generator: &dyn HeadlineGenerator,
        regenerate: bool,
    ) -> Result<&[Headline]> {
        if !self.content.trim().is_empty() && !self.headlines.is_empty() && !regenerate {
            return Ok(&self.headlines);
        }

        let prompt = self.begin_headlines()?;
        let response = generator.generate(&prompt);
        self.finish_headlines(response)
    }

    pub fn begin_headlines(&mut self) -> Result<Prompt> {
        if self.content.trim().is_empty() {
            return Err(self.report(RedpenError::EmptyDocument));
        }

        self.busy.generating_headlines = true;
        Ok(prompt::headline_prompt(&self.content, self.settings.content_style))
    }

    pub fn finish_headlines(&mut self, response: Result<String>) -> Result<&[Headline]> {
        self.busy.generating_headlines = false;
        match response.and_then(|raw| assist::parse_headlines(&raw)) {
            Ok(headlines) => {
                self.headlines = headlines;
                Ok(&self.headlines)
            }
            Err(e) => Err(self.report(e)),
        }
    }

    /// Put a headline above the document.
    pub fn select_headline(&mut self, headline: &Headline) {
        let content = format!("{}\n\n{}", headline.text, self.content);
        self.set_content(content);
    }

    /// Rewrite the characters `start..end` of the document.
    ///
    /// A manual snapshot of the document is taken before the call.
    pub fn rewrite_selection(
        &mut self,
        rewriter: &dyn Rewriter,
        start: usize,
        end: usize,
        option: RewriteOption,
    ) -> Result<()> {
        let pending = self.begin_rewrite(start, end, option)?;
        let response = rewriter.rewrite(&pending.selection, pending.option, &pending.prompt);
        self.finish_rewrite(pending, response)
    }

    pub fn begin_rewrite(
        &mut self,
        start: usize,
        end: usize,
        option: RewriteOption,
    ) -> Result<PendingRewrite> {
        let Some(selection) = assist::selection(&self.content, start, end) else {
            let len = self.content.chars().count();
            return Err(self.report(RedpenError::InvalidSelection { start, end, len }));
        };
        if selection.trim().is_empty() {
            return Err(self.report(RedpenError::EmptyDocument));
        }

        self.history.capture(&self.content, SnapshotKind::Manual);

        let prompt = prompt::rewrite_prompt(&selection, option, &self.content);
        self.busy.rewriting = true;
        Ok(PendingRewrite {
            selection,
            start,
            end,
            option,
            prompt,
        })
    }

    /// Splice the rewrite into the document. The range is checked again
    /// against the current content.
    pub fn finish_rewrite(&mut self, pending: PendingRewrite, response: Result<String>) -> Result<()> {
        self.busy.rewriting = false;
        let result = response
            .map(|raw| assist::clean_rewrite(&raw, &pending.selection))
            .and_then(|replacement| {
                assist::splice(&self.content, pending.start, pending.end, &replacement)
            });

        match result {
            Ok(updated) => {
                self.set_content(updated);
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    /// A simulated reader's reaction to the document.
    pub fn simulate_reader(
        &mut self,
        simulator: &dyn PersonaSimulator,
        persona: &Persona,
    ) -> Result<String> {
        let prompt = self.begin_simulation(persona)?;
        let response = simulator.react(persona, &prompt);
        self.finish_simulation(response)
    }

    pub fn begin_simulation(&mut self, persona: &Persona) -> Result<Prompt> {
        if self.content.trim().is_empty() {
            return Err(self.report(RedpenError::EmptyDocument));
        }

        self.busy.simulating = true;
        Ok(prompt::persona_prompt(&self.content, persona))
    }

    pub fn finish_simulation(&mut self, response: Result<String>) -> Result<String> {
        self.busy.simulating = false;
        match response {
            Ok(reply) => Ok(reply.trim().to_string()),
            Err(e) => Err(self.report(e)),
        }
    }

    /// Record a notice for `error` and hand the error back.
    fn report(&mut self, error: RedpenError) -> RedpenError {
        warn!(error = %error, "session operation failed");
        self.notice = Some(Notice::from_error(&error));
        error
    }

    /// Stop the scheduler (flushing autosaves) and release the profile.
    pub fn close(mut self) -> Profile {
        self.scheduler.shutdown();
        self.profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScheduleConfig, StoreConfig};
    use std::cell::Cell;
    use std::time::Duration;
    use tempfile::TempDir;

    fn quiet_config() -> SessionConfig {
        // Timers long enough that nothing fires during a test.
        SessionConfig {
            schedule: ScheduleConfig {
                interval: Duration::from_secs(3600),
                quiet_period: Duration::from_secs(3600),
                autosave_delay: Duration::from_secs(3600),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn open_session(dir: &TempDir, config: SessionConfig) -> Session {
        let profile = Profile::open_or_create(StoreConfig {
            path: dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();
        Session::open(profile, config).unwrap()
    }

    struct CannedAnalyzer(&'static str);

    impl Analyzer for CannedAnalyzer {
        fn analyze(&self, _request: &AnalysisRequest, _prompt: &prompt::Prompt) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingAnalyzer;

    impl Analyzer for FailingAnalyzer {
        fn analyze(&self, _request: &AnalysisRequest, _prompt: &prompt::Prompt) -> Result<String> {
            Err(RedpenError::Collaborator("503".into()))
        }
    }

    struct CountingHeadlines(Cell<usize>);

    impl HeadlineGenerator for CountingHeadlines {
        fn generate(&self, _prompt: &prompt::Prompt) -> Result<String> {
            self.0.set(self.0.get() + 1);
            let items: Vec<String> = ["SEO", "Clickbait", "Social", "Business", "Creative"]
                .iter()
                .map(|s| format!(r#"{{"style":"{s}","label":"{s}","text":"{s} title","explanation":""}}"#))
                .collect();
            Ok(format!("[{}]", items.join(",")))
        }
    }

    struct QuotingRewriter;

    impl Rewriter for QuotingRewriter {
        fn rewrite(&self, selection: &str, _option: RewriteOption, _prompt: &prompt::Prompt) -> Result<String> {
            Ok(format!("\"{}\"", selection.to_uppercase()))
        }
    }

    const ANALYSIS: &str = r#"{"score": 64, "summary": "ok", "toneAnalysis": "dry",
        "issues": [{"ruleViolated": "r", "quotedText": "very big", "suggestion": "huge",
                    "severity": "Warning", "explanation": "e"}]}"#;

    #[test]
    fn test_restore_takes_safety_snapshot() {
        let dir = TempDir::new().unwrap();
        let mut session = open_session(&dir, quiet_config());

        session.set_content("first draft");
        assert!(session.save_now());
        let saved = session.history()[0].clone();

        session.set_content("second draft");
        session.restore(&saved);

        assert_eq!(session.content(), "first draft");
        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "second draft");
        assert_eq!(history[0].kind, SnapshotKind::Manual);
        assert_eq!(session.history.baseline().as_deref(), Some("first draft"));
    }

    #[test]
    fn test_restore_from_empty_skips_safety_snapshot() {
        let dir = TempDir::new().unwrap();
        let mut session = open_session(&dir, quiet_config());

        session.set_content("kept");
        session.save_now();
        let saved = session.history()[0].clone();
        session.set_content("   ");
        session.restore(&saved);

        assert_eq!(session.history_count(), 1);
        assert_eq!(session.content(), "kept");
    }

    #[test]
    fn test_clear_and_undo() {
        let dir = TempDir::new().unwrap();
        let mut session = open_session(&dir, quiet_config());

        session.set_content("draft to clear");
        assert!(session.clear(ClearTarget::Content));
        assert_eq!(session.content(), "");
        assert_eq!(session.history()[0].content, "draft to clear");
        assert_eq!(session.pending_undo(), Some(ClearTarget::Content));

        assert!(session.undo());
        assert_eq!(session.content(), "draft to clear");
        assert!(!session.undo());
    }

    #[test]
    fn test_clear_empty_field_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut session = open_session(&dir, quiet_config());

        assert!(!session.clear(ClearTarget::Content));
        assert_eq!(session.pending_undo(), None);
        assert_eq!(session.history_count(), 0);
    }

    #[test]
    fn test_newer_clear_replaces_undo_slot() {
        let dir = TempDir::new().unwrap();
        let mut session = open_session(&dir, quiet_config());

        session.set_content("text");
        session.set_policy("rules");
        session.clear(ClearTarget::Content);
        session.clear(ClearTarget::Policy);

        assert!(session.undo());
        assert_eq!(session.policy(), "rules");
        assert_eq!(session.content(), "");
    }

    #[test]
    fn test_undo_expires() {
        let dir = TempDir::new().unwrap();
        let mut config = quiet_config();
        config.undo_window = Duration::from_millis(20);
        let mut session = open_session(&dir, config);

        session.set_policy("rules");
        session.clear(ClearTarget::Policy);
        std::thread::sleep(Duration::from_millis(40));

        assert!(!session.undo());
        assert_eq!(session.policy(), "");
    }

    #[test]
    fn test_cleared_content_undo_expires() {
        let dir = TempDir::new().unwrap();
        let mut config = quiet_config();
        config.undo_window = Duration::from_millis(20);
        let mut session = open_session(&dir, config);

        session.set_content("draft to clear");
        assert!(session.clear(ClearTarget::Content));
        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(session.pending_undo(), None);
        assert!(!session.undo());
        assert_eq!(session.content(), "");
        assert_eq!(session.history()[0].content, "draft to clear");
    }

    #[test]
    fn test_busy_while_analysis_pending() {
        let dir = TempDir::new().unwrap();
        let mut session = open_session(&dir, quiet_config());
        session.set_content("A very big dog.");

        let pending = session.begin_analysis(AnalysisMode::Full, false).unwrap();
        assert!(session.busy().analyzing);
        assert_eq!(pending.request.text, "A very big dog.");

        let score = session.finish_analysis(Ok(ANALYSIS.to_string())).unwrap().score;
        assert_eq!(score, 64);
        assert!(!session.busy().analyzing);
    }

    #[test]
    fn test_busy_cleared_when_rewrite_fails() {
        let dir = TempDir::new().unwrap();
        let mut session = open_session(&dir, quiet_config());
        session.set_content("make this loud please");

        let pending = session.begin_rewrite(5, 9, RewriteOption::Formal).unwrap();
        assert!(session.busy().rewriting);
        assert_eq!(pending.selection, "this");

        let result = session.finish_rewrite(pending, Err(RedpenError::Collaborator("timeout".into())));
        assert!(result.is_err());
        assert!(!session.busy().rewriting);
        assert_eq!(session.content(), "make this loud please");
        assert!(session.notice().is_some());
    }

    #[test]
    fn test_rejected_begin_leaves_flags_down() {
        let dir = TempDir::new().unwrap();
        let mut session = open_session(&dir, quiet_config());

        assert!(session.begin_headlines().is_err());
        assert!(session.begin_simulation(&Persona::custom("a skeptical editor")).is_err());
        assert_eq!(session.busy(), BusyFlags::default());

        session.set_content("Body.");
        session.begin_headlines().unwrap();
        session.begin_simulation(&Persona::custom("a skeptical editor")).unwrap();
        assert!(session.busy().generating_headlines && session.busy().simulating);

        session.finish_headlines(Err(RedpenError::Collaborator("503".into()))).unwrap_err();
        let reply = session.finish_simulation(Ok("  Too long.  ".into())).unwrap();
        assert_eq!(reply, "Too long.");
        assert_eq!(session.busy(), BusyFlags::default());
    }

    #[test]
    fn test_analyze_and_apply_fix() {
        let dir = TempDir::new().unwrap();
        let mut session = open_session(&dir, quiet_config());
        session.set_content("A very big dog.");

        let result = session
            .analyze(&CannedAnalyzer(ANALYSIS), AnalysisMode::Full, false)
            .unwrap();
        assert_eq!(result.score, 64);
        assert!(!session.busy().analyzing);

        session.apply_fix(0).unwrap();
        assert_eq!(session.content(), "A huge dog.");
        assert!(session.analysis().unwrap().issues.is_empty());
    }

    #[test]
    fn test_apply_fix_after_edit_sets_notice() {
        let dir = TempDir::new().unwrap();
        let mut session = open_session(&dir, quiet_config());
        session.set_content("A very big dog.");
        session
            .analyze(&CannedAnalyzer(ANALYSIS), AnalysisMode::Full, false)
            .unwrap();

        session.set_content("A large dog.");
        assert!(matches!(session.apply_fix(0), Err(RedpenError::FixNotFound)));
        assert_eq!(session.content(), "A large dog.");
        assert!(session.take_notice().is_some());
        assert_eq!(session.analysis().unwrap().issues.len(), 1);
    }

    #[test]
    fn test_analyze_rejects_empty_and_long() {
        let dir = TempDir::new().unwrap();
        let mut config = quiet_config();
        config.max_document_chars = 10;
        let mut session = open_session(&dir, config);

        assert!(matches!(
            session.analyze(&CannedAnalyzer(ANALYSIS), AnalysisMode::Full, false),
            Err(RedpenError::EmptyDocument)
        ));

        session.set_content("more than ten characters");
        assert!(session.is_over_limit());
        assert!(matches!(
            session.analyze(&CannedAnalyzer(ANALYSIS), AnalysisMode::Full, false),
            Err(RedpenError::DocumentTooLong { max: 10, .. })
        ));
    }

    #[test]
    fn test_collaborator_failure_keeps_document() {
        let dir = TempDir::new().unwrap();
        let mut session = open_session(&dir, quiet_config());
        session.set_content("Some text.");

        assert!(session
            .analyze(&FailingAnalyzer, AnalysisMode::Proofread, true)
            .is_err());
        assert_eq!(session.content(), "Some text.");
        assert!(session.analysis().is_none());
        assert!(!session.busy().analyzing);
        assert!(session.notice().is_some());
    }

    #[test]
    fn test_headlines_cached_until_regenerated() {
        let dir = TempDir::new().unwrap();
        let mut session = open_session(&dir, quiet_config());
        session.set_content("Body.");
        let generator = CountingHeadlines(Cell::new(0));

        assert_eq!(session.generate_headlines(&generator, false).unwrap().len(), 5);
        session.generate_headlines(&generator, false).unwrap();
        assert_eq!(generator.0.get(), 1);
        session.generate_headlines(&generator, true).unwrap();
        assert_eq!(generator.0.get(), 2);

        let first = session.headlines()[0].clone();
        session.select_headline(&first);
        assert_eq!(session.content(), "SEO title\n\nBody.");
    }

    #[test]
    fn test_rewrite_selection() {
        let dir = TempDir::new().unwrap();
        let mut session = open_session(&dir, quiet_config());
        session.set_content("make this loud please");

        session
            .rewrite_selection(&QuotingRewriter, 5, 9, RewriteOption::Formal)
            .unwrap();

        assert_eq!(session.content(), "make THIS loud please");
        assert_eq!(session.history()[0].content, "make this loud please");
        assert!(matches!(
            session.rewrite_selection(&QuotingRewriter, 5, 99, RewriteOption::Formal),
            Err(RedpenError::InvalidSelection { .. })
        ));
    }

    #[test]
    fn test_content_style_follows_builtin_policy() {
        let dir = TempDir::new().unwrap();
        let mut session = open_session(&dir, quiet_config());

        session.set_content_style(ContentStyle::News);
        assert_eq!(session.policy(), ContentStyle::News.template().content);

        session.set_policy("my own rules");
        session.set_content_style(ContentStyle::Creative);
        assert_eq!(session.policy(), "my own rules");
        assert_eq!(session.settings().content_style, ContentStyle::Creative);
    }

    #[test]
    fn test_settings_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let mut session = open_session(&dir, quiet_config());
            session.set_content("unsaved draft");
            session.set_dark_mode(false);
            session.mark_welcome_seen();
            session.close();
        }

        let session = open_session(&dir, quiet_config());
        assert_eq!(session.content(), "unsaved draft");
        assert!(!session.settings().dark_mode);
        assert!(session.settings().welcome_seen);
    }
}
