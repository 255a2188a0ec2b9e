//! Contains all the command handlers for the upstream presentation events.
//!
//! Each function corresponds to one `IpcMessage` variant. Handlers run to
//! completion while holding the state lock, report failures through
//! `UserEvent::ShowError`, and leave prior state untouched when they fail.

use super::clipboard::ClipboardService;
use super::events::UserEvent;
use super::helpers::{lock_state, notify, show_error, with_state_and_notify};
use super::proxy::EventProxy;
use super::state::AppState;
use crate::core::{
    create_ingest, DigestGenerator, ErrorCategory, ExclusionMatcher, NodeId, TreeBuilder,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Builds a fresh selection tree for `path`, replacing any previous one.
///
/// The current pattern text is validated first; an invalid pattern or a
/// path that is not a directory aborts without touching the current tree.
pub fn select_directory<P: EventProxy>(path: PathBuf, proxy: P, state: Arc<Mutex<AppState>>) {
    let mut state_guard = lock_state(&state);

    let matcher = match ExclusionMatcher::parse(&state_guard.pattern_text) {
        Ok(matcher) => matcher,
        Err(e) => {
            show_error(&proxy, e.category(), e.to_string());
            return;
        }
    };

    match TreeBuilder::build(&path, &matcher) {
        Ok(tree) => {
            state_guard.reset_directory_state();
            state_guard.status_message = format!(
                "Loaded {} ({} entries).",
                tree.root_path().display(),
                tree.len().saturating_sub(1)
            );
            state_guard.selected_directory = Some(tree.root_path().to_path_buf());
            state_guard.tree = Some(tree);
            notify(&state_guard, &proxy);
        }
        Err(e) => show_error(&proxy, e.category(), e.to_string()),
    }
}

/// Stores the exclude pattern text. It only affects the next tree build.
pub fn update_patterns<P: EventProxy>(text: String, proxy: P, state: Arc<Mutex<AppState>>) {
    with_state_and_notify(&state, &proxy, |s| {
        s.pattern_text = text;
    });
}

/// Applies a direct user toggle of one node.
pub fn toggle_node<P: EventProxy>(
    node_id: NodeId,
    checked: bool,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let mut state_guard = lock_state(&state);
    let Some(tree) = state_guard.tree.as_mut() else {
        show_error(&proxy, ErrorCategory::Input, "No directory selected.");
        return;
    };

    match tree.set_checked(node_id, checked) {
        Ok(()) => notify(&state_guard, &proxy),
        Err(e) => show_error(&proxy, e.category(), e.to_string()),
    }
}

/// Select all / deselect all.
pub fn toggle_all<P: EventProxy>(checked: bool, proxy: P, state: Arc<Mutex<AppState>>) {
    with_state_and_notify(&state, &proxy, |s| {
        if let Some(tree) = s.tree.as_mut() {
            tree.set_all(checked);
            s.all_selected = checked;
        }
    });
}

/// Materializes the checked subset, digests it and publishes the result.
///
/// On failure the previous output stays in place.
pub fn create_ingest_command<P, G>(generator: &G, proxy: P, state: Arc<Mutex<AppState>>)
where
    P: EventProxy,
    G: DigestGenerator + ?Sized,
{
    let mut state_guard = lock_state(&state);
    let Some(tree) = state_guard.tree.as_ref() else {
        show_error(&proxy, ErrorCategory::Input, "No directory selected.");
        return;
    };

    match create_ingest(tree, generator) {
        Ok(output) => {
            state_guard.status_message = format!(
                "Digest created: {} files, {} unreadable.",
                output.stats.files_copied,
                output.unreadable.len()
            );
            state_guard.output_summary = Some(output.summary);
            state_guard.output = Some(output.text.clone());
            proxy.send_event(UserEvent::ShowGeneratedContent(output.text));
            notify(&state_guard, &proxy);
        }
        Err(e) => show_error(&proxy, e.category(), e.to_string()),
    }
}

/// Hands the current digest to the clipboard.
pub fn copy_result<P, C>(clipboard: &C, proxy: P, state: Arc<Mutex<AppState>>)
where
    P: EventProxy,
    C: ClipboardService + ?Sized,
{
    let state_guard = lock_state(&state);
    let text = state_guard
        .output
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    if text.is_empty() {
        show_error(&proxy, ErrorCategory::Input, "No output to copy.");
        return;
    }

    match clipboard.set_text(text) {
        Ok(()) => proxy.send_event(UserEvent::Copied),
        Err(e) => show_error(&proxy, ErrorCategory::Filesystem, format!("{e:#}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::core::{CheckState, Digest};
    use crate::utils::test_helpers::setup_test_logging;
    use std::fs;
    use std::path::Path;
    use std::sync::mpsc::{self, Receiver, Sender};
    use tempfile::{tempdir, TempDir};

    struct FailingGenerator;

    impl DigestGenerator for FailingGenerator {
        fn generate(&self, _directory: &Path) -> anyhow::Result<Digest> {
            anyhow::bail!("ingest backend unavailable")
        }
    }

    #[derive(Default)]
    struct MockClipboard {
        text: Mutex<Option<String>>,
    }

    impl ClipboardService for MockClipboard {
        fn set_text(&self, text: &str) -> anyhow::Result<()> {
            *self.text.lock().unwrap() = Some(text.to_string());
            Ok(())
        }
    }

    struct TestHarness {
        state: Arc<Mutex<AppState>>,
        proxy: Sender<UserEvent>,
        event_rx: Receiver<UserEvent>,
        _temp_dir: TempDir,
        root_path: PathBuf,
    }

    impl TestHarness {
        fn new() -> Self {
            setup_test_logging();
            let temp_dir = tempdir().expect("Failed to create temp dir");
            let root_path = temp_dir.path().join("repo");
            fs::create_dir_all(&root_path).unwrap();
            let (tx, rx) = mpsc::channel();
            let config = AppConfig {
                estimate_tokens: false,
                ..AppConfig::default()
            };

            Self {
                state: Arc::new(Mutex::new(AppState::new(config))),
                proxy: tx,
                event_rx: rx,
                _temp_dir: temp_dir,
                root_path,
            }
        }

        fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
            let path = self.root_path.join(relative_path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, content).unwrap();
            path
        }

        fn events(&self) -> Vec<UserEvent> {
            self.event_rx.try_iter().collect()
        }

        fn errors(&self) -> Vec<(ErrorCategory, String)> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    UserEvent::ShowError { category, message } => Some((category, message)),
                    _ => None,
                })
                .collect()
        }

        fn select(&self) {
            select_directory(self.root_path.clone(), self.proxy.clone(), self.state.clone());
        }

        fn node(&self, rel: &str) -> NodeId {
            let state = self.state.lock().unwrap();
            state.tree.as_ref().unwrap().find(Path::new(rel)).unwrap()
        }
    }

    #[test]
    fn select_directory_builds_tree_and_notifies() {
        let harness = TestHarness::new();
        harness.create_file("src/main.rs", "fn main() {}");

        harness.select();

        let events = harness.events();
        let Some(UserEvent::StateUpdate(ui)) = events.last() else {
            panic!("expected a state update, got {events:?}");
        };
        assert_eq!(ui.tree.len(), 3);
        assert!(ui.tree.iter().all(|row| row.state == CheckState::Checked));
        assert_eq!(ui.selected_files_count, 1);
    }

    #[test]
    fn invalid_pattern_aborts_selection_and_keeps_old_tree() {
        let harness = TestHarness::new();
        harness.create_file("a.txt", "a");
        harness.select();
        harness.events();

        update_patterns("([".to_string(), harness.proxy.clone(), harness.state.clone());
        fs::create_dir_all(harness.root_path.join("other")).unwrap();
        harness.select();

        let errors = harness.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, ErrorCategory::Configuration);
        let state = harness.state.lock().unwrap();
        assert!(state.tree.as_ref().unwrap().find(Path::new("other")).is_none());
    }

    #[test]
    fn selecting_a_file_path_reports_filesystem_error() {
        let harness = TestHarness::new();
        let file = harness.create_file("a.txt", "a");

        select_directory(file, harness.proxy.clone(), harness.state.clone());

        let errors = harness.errors();
        assert_eq!(errors[0].0, ErrorCategory::Filesystem);
        assert!(harness.state.lock().unwrap().tree.is_none());
    }

    #[test]
    fn toggle_without_tree_is_an_input_error() {
        let harness = TestHarness::new();
        toggle_node(
            NodeId::from_index(1),
            false,
            harness.proxy.clone(),
            harness.state.clone(),
        );
        assert_eq!(harness.errors()[0].0, ErrorCategory::Input);
    }

    #[test]
    fn toggle_all_updates_label_and_states() {
        let harness = TestHarness::new();
        harness.create_file("src/a.py", "a");
        harness.select();
        harness.events();

        toggle_all(false, harness.proxy.clone(), harness.state.clone());
        let events = harness.events();
        let Some(UserEvent::StateUpdate(ui)) = events.last() else {
            panic!("expected a state update");
        };
        assert!(ui.tree.iter().all(|row| row.state == CheckState::Unchecked));
        assert_eq!(ui.toggle_all_label, "Select All");

        toggle_all(true, harness.proxy.clone(), harness.state.clone());
        let events = harness.events();
        let Some(UserEvent::StateUpdate(ui)) = events.last() else {
            panic!("expected a state update");
        };
        assert!(ui.tree.iter().all(|row| row.state == CheckState::Checked));
        assert_eq!(ui.toggle_all_label, "Deselect All");
    }

    #[test]
    fn failed_ingest_keeps_previous_output() {
        let harness = TestHarness::new();
        harness.create_file("a.txt", "a");
        harness.select();
        let digester = harness.state.lock().unwrap().config.digester();
        create_ingest_command(&digester, harness.proxy.clone(), harness.state.clone());
        let previous = harness.state.lock().unwrap().output.clone();
        assert!(previous.is_some());
        harness.events();

        create_ingest_command(&FailingGenerator, harness.proxy.clone(), harness.state.clone());

        let errors = harness.errors();
        assert_eq!(
            errors,
            vec![(ErrorCategory::Ingest, "ingest backend unavailable".to_string())]
        );
        assert_eq!(harness.state.lock().unwrap().output, previous);
    }

    #[test]
    fn copy_requires_output() {
        let harness = TestHarness::new();
        let clipboard = MockClipboard::default();

        copy_result(&clipboard, harness.proxy.clone(), harness.state.clone());

        assert_eq!(
            harness.errors(),
            vec![(ErrorCategory::Input, "No output to copy.".to_string())]
        );
        assert!(clipboard.text.lock().unwrap().is_none());
    }

    #[test]
    fn copy_hands_trimmed_digest_to_clipboard() {
        let harness = TestHarness::new();
        harness.state.lock().unwrap().output = Some("  <codebase>x</codebase>\n".to_string());
        let clipboard = MockClipboard::default();

        copy_result(&clipboard, harness.proxy.clone(), harness.state.clone());

        assert_eq!(
            clipboard.text.lock().unwrap().as_deref(),
            Some("<codebase>x</codebase>")
        );
        assert!(matches!(harness.events().as_slice(), [UserEvent::Copied]));
    }

    #[test]
    fn unchecking_a_directory_removes_it_from_the_digest() {
        let harness = TestHarness::new();
        harness.create_file("src/a.py", "a = 1");
        harness.create_file("docs/guide.md", "guide");
        harness.select();

        toggle_node(
            harness.node("docs"),
            false,
            harness.proxy.clone(),
            harness.state.clone(),
        );
        let digester = harness.state.lock().unwrap().config.digester();
        create_ingest_command(&digester, harness.proxy.clone(), harness.state.clone());

        let output = harness.state.lock().unwrap().output.clone().unwrap();
        assert!(output.contains("FILE: src/a.py"));
        assert!(!output.contains("guide.md"));
    }
}
