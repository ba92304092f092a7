//! Interactive editor session: key handling and tick dispatch.
//!
//! Rendering lives in the binary; everything here is terminal-free so it can
//! be driven headlessly from tests.

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info, warn};

use crate::config::{Config, MAX_SETTING};
use crate::controller::{TickEvent, TypingController, TypingState};
use crate::device::{DeviceError, KeystrokeSink, PointerSource};
use crate::editor::TextInput;
use crate::source;

const DELAY_STEP_SECS: u64 = 1;
const INTERVAL_STEP_MS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Text,
    Path,
}

pub struct App<K: KeystrokeSink, P: PointerSource> {
    pub editor: TextInput,
    pub path: TextInput,
    focus: Focus,
    pub delay_secs: u64,
    pub interval_ms: u64,
    /// Dismissible error popup
    pub error: Option<String>,
    pub should_quit: bool,
    controller: TypingController<K, P>,
}

impl<K: KeystrokeSink, P: PointerSource> App<K, P> {
    pub fn new(controller: TypingController<K, P>, config: &Config) -> Self {
        let mut editor = TextInput::multiline(" Text ");
        editor.set_focused(true);
        Self {
            editor,
            path: TextInput::single_line(" File (enter / ctrl+l to load) ", "File path ..."),
            focus: Focus::Text,
            delay_secs: config.delay_secs.min(MAX_SETTING),
            interval_ms: config.interval_ms.min(MAX_SETTING),
            error: None,
            should_quit: false,
            controller,
        }
    }

    pub fn controller(&self) -> &TypingController<K, P> {
        &self.controller
    }

    pub fn state(&self) -> TypingState {
        self.controller.state()
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        self.editor.set_focused(focus == Focus::Text);
        self.path.set_focused(focus == Focus::Path);
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Cadence the runner should tick at right now
    pub fn tick_interval(&self) -> Duration {
        if self.controller.state() == TypingState::Idle {
            self.interval()
        } else {
            self.controller.interval()
        }
    }

    /// Copy adjusted settings back so they can be persisted
    pub fn apply_to(&self, config: &mut Config) {
        config.delay_secs = self.delay_secs;
        config.interval_ms = self.interval_ms;
    }

    pub fn status_line(&self) -> String {
        match self.controller.state() {
            TypingState::Waiting => format!(
                "Starting in {:.1} seconds...",
                self.controller.countdown().as_secs_f64()
            ),
            TypingState::Typing => "Typing ...".to_string(),
            TypingState::Idle | TypingState::Cancelled | TypingState::Completed => {
                "Start typing".to_string()
            }
        }
    }

    pub fn start_typing(&mut self) {
        let text = self.editor.text();
        if self.controller.start(&text, self.delay(), self.interval()) {
            self.editor.set_text(&self.controller.remaining());
        } else {
            debug!("nothing to type");
        }
    }

    /// Only an in-flight session can be cancelled; the editor text is never touched otherwise
    pub fn cancel_typing(&mut self) {
        if self.controller.is_active() {
            self.controller.cancel();
        } else {
            debug!("nothing to cancel");
        }
    }

    pub fn load_file(&mut self) {
        let path = self.path.text();
        match source::load_file(&path) {
            Ok(text) => {
                info!(path = %path, chars = text.len(), "loaded file");
                self.editor.set_text(&text);
                self.set_focus(Focus::Text);
            }
            Err(e) => {
                warn!("load failed: {e}");
                self.error = Some(e.to_string());
            }
        }
    }

    /// Advance the controller; device failures are returned to the caller
    pub fn on_tick(&mut self, elapsed: Duration) -> Result<TickEvent, DeviceError> {
        let before = self.controller.state();
        let event = self.controller.tick(elapsed)?;
        match event {
            TickEvent::Typed(_) => self.editor.set_text(&self.controller.remaining()),
            // hand the untyped rest back; after completion the editor is already empty
            TickEvent::Reset if before == TypingState::Cancelled => {
                let rest = self.controller.take_remaining();
                self.editor.set_text(&rest);
            }
            _ => {}
        }
        Ok(event)
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if self.error.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ')) {
                self.error = None;
            }
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') if ctrl => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('c') if ctrl => {
                self.cancel_typing();
                return;
            }
            // legacy terminals send ctrl+enter as ctrl+j
            KeyCode::Enter | KeyCode::Char('j') if ctrl => {
                self.start_typing();
                return;
            }
            KeyCode::F(5) => {
                self.start_typing();
                return;
            }
            KeyCode::F(7) => {
                self.delay_secs = self.delay_secs.saturating_sub(DELAY_STEP_SECS);
                return;
            }
            KeyCode::F(8) => {
                self.delay_secs = (self.delay_secs + DELAY_STEP_SECS).min(MAX_SETTING);
                return;
            }
            KeyCode::F(9) => {
                self.interval_ms = self.interval_ms.saturating_sub(INTERVAL_STEP_MS);
                return;
            }
            KeyCode::F(10) => {
                self.interval_ms = (self.interval_ms + INTERVAL_STEP_MS).min(MAX_SETTING);
                return;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.set_focus(match self.focus {
                    Focus::Text => Focus::Path,
                    Focus::Path => Focus::Text,
                });
                return;
            }
            _ => {}
        }

        // the buffer belongs to the controller until the session ends
        if self.controller.is_active() {
            return;
        }

        if ctrl && key.code == KeyCode::Char('l') {
            self.load_file();
            return;
        }

        match self.focus {
            Focus::Text => {
                self.editor.handle_key(key);
            }
            Focus::Path if key.code == KeyCode::Enter => self.load_file(),
            Focus::Path => {
                self.path.handle_key(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{RecordingKeyboard, ScriptedPointer};
    use std::fs;
    use tempfile::tempdir;

    type TestApp = App<RecordingKeyboard, ScriptedPointer>;

    fn app_with(delay_secs: u64) -> TestApp {
        let config = Config {
            delay_secs,
            interval_ms: 0,
            ..Config::default()
        };
        let controller =
            TypingController::new(RecordingKeyboard::new(), ScriptedPointer::at(0, 0));
        App::new(controller, &config)
    }

    fn press(app: &mut TestApp, code: KeyCode) {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn ctrl(app: &mut TestApp, c: char) {
        app.on_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
    }

    fn type_str(app: &mut TestApp, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn start_with_empty_editor_stays_idle() {
        let mut app = app_with(1);
        press(&mut app, KeyCode::F(5));
        assert_eq!(app.state(), TypingState::Idle);
        assert_eq!(app.status_line(), "Start typing");
    }

    #[test]
    fn full_session_empties_the_editor() {
        let mut app = app_with(0);
        type_str(&mut app, "ok");
        ctrl(&mut app, 'j');
        assert_eq!(app.state(), TypingState::Waiting);

        for _ in 0..10 {
            app.on_tick(Duration::from_millis(10)).unwrap();
        }
        assert_eq!(app.state(), TypingState::Idle);
        assert_eq!(app.controller().keyboard().typed(), "ok");
        assert!(app.editor.is_empty());
    }

    #[test]
    fn editor_mirrors_remaining_text_while_typing() {
        let mut app = app_with(0);
        type_str(&mut app, "abc");
        press(&mut app, KeyCode::F(5));
        app.on_tick(Duration::ZERO).unwrap();
        app.on_tick(Duration::ZERO).unwrap();
        assert_eq!(app.editor.text(), "bc");
        assert_eq!(app.status_line(), "Typing ...");
    }

    #[test]
    fn cancel_keeps_untyped_text_in_editor() {
        let mut app = app_with(0);
        type_str(&mut app, "abc");
        press(&mut app, KeyCode::F(5));
        app.on_tick(Duration::ZERO).unwrap();
        app.on_tick(Duration::ZERO).unwrap();

        ctrl(&mut app, 'c');
        assert_eq!(app.state(), TypingState::Cancelled);
        assert_eq!(app.on_tick(Duration::ZERO).unwrap(), TickEvent::Reset);
        assert_eq!(app.state(), TypingState::Idle);
        assert_eq!(app.editor.text(), "bc");
    }

    #[test]
    fn cancel_when_idle_keeps_draft() {
        let mut app = app_with(1);
        type_str(&mut app, "draft text");
        ctrl(&mut app, 'c');
        assert_eq!(app.state(), TypingState::Idle);
        app.on_tick(Duration::from_millis(10)).unwrap();
        assert_eq!(app.editor.text(), "draft text");
    }

    #[test]
    fn new_draft_after_completion_survives_cancel_and_reset() {
        let mut app = app_with(0);
        type_str(&mut app, "ab");
        press(&mut app, KeyCode::F(5));
        while app.on_tick(Duration::ZERO).unwrap() != TickEvent::Finished {}
        assert_eq!(app.state(), TypingState::Completed);

        // keys arriving between completion and reset still edit the draft
        type_str(&mut app, "next");
        ctrl(&mut app, 'c');
        assert_eq!(app.on_tick(Duration::ZERO).unwrap(), TickEvent::Reset);
        assert_eq!(app.state(), TypingState::Idle);
        assert_eq!(app.editor.text(), "next");
        assert_eq!(app.controller().keyboard().typed(), "ab");
    }

    #[test]
    fn edits_are_ignored_while_active() {
        let mut app = app_with(3);
        type_str(&mut app, "hi");
        press(&mut app, KeyCode::F(5));
        type_str(&mut app, "zzz");
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.editor.text(), "hi");
        assert_eq!(app.status_line(), "Starting in 3.0 seconds...");
    }

    #[test]
    fn settings_adjust_within_bounds() {
        let mut app = app_with(0);
        press(&mut app, KeyCode::F(7));
        assert_eq!(app.delay_secs, 0);
        press(&mut app, KeyCode::F(8));
        press(&mut app, KeyCode::F(8));
        assert_eq!(app.delay_secs, 2);
        press(&mut app, KeyCode::F(10));
        assert_eq!(app.interval_ms, 10);
        app.interval_ms = MAX_SETTING;
        press(&mut app, KeyCode::F(10));
        assert_eq!(app.interval_ms, MAX_SETTING);

        let mut cfg = Config::default();
        app.apply_to(&mut cfg);
        assert_eq!(cfg.delay_secs, 2);
        assert_eq!(cfg.interval_ms, MAX_SETTING);
    }

    #[test]
    fn tick_interval_follows_session_once_started() {
        let mut app = app_with(1);
        app.interval_ms = 40;
        assert_eq!(app.tick_interval(), Duration::from_millis(40));
        type_str(&mut app, "x");
        press(&mut app, KeyCode::F(5));
        app.interval_ms = 90;
        assert_eq!(app.tick_interval(), Duration::from_millis(40));
    }

    #[test]
    fn loading_a_file_replaces_editor_text() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("snippet.txt");
        fs::write(&file, "loaded\r\ntext").unwrap();

        let mut app = app_with(0);
        type_str(&mut app, "old");
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus(), Focus::Path);
        assert!(app.path.is_focused());
        assert!(!app.editor.is_focused());
        type_str(&mut app, &file.display().to_string());
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.error, None);
        assert_eq!(app.focus(), Focus::Text);
        assert!(app.editor.is_focused());
        assert_eq!(app.editor.text(), "loaded\ntext");
    }

    #[test]
    fn load_errors_show_dismissible_popup() {
        let dir = tempdir().unwrap();
        let mut app = app_with(0);
        type_str(&mut app, "keep me");

        ctrl(&mut app, 'l');
        assert_eq!(app.error.as_deref(), Some("Please select a file first."));

        // popup swallows keys until dismissed
        press(&mut app, KeyCode::Char('x'));
        assert!(app.error.is_some());
        press(&mut app, KeyCode::Esc);
        assert!(app.error.is_none());

        app.path.set_text(&dir.path().display().to_string());
        ctrl(&mut app, 'l');
        assert!(app
            .error
            .as_deref()
            .unwrap()
            .starts_with("Please select a file, not a directory"));
        assert_eq!(app.editor.text(), "keep me");
        assert_eq!(app.state(), TypingState::Idle);
    }

    #[test]
    fn quit_works_in_any_state() {
        let mut app = app_with(5);
        type_str(&mut app, "abc");
        press(&mut app, KeyCode::F(5));
        ctrl(&mut app, 'q');
        assert!(app.should_quit);
    }
}
