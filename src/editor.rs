//! Editing fields for the interactive mode.
//!
//! Wraps `tui-textarea` with the editor's styling. The same type backs the
//! multi-line text area and the single-line file path field.

use crossterm::event::KeyEvent;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders};
use tui_textarea::{CursorMove, Input, Key, TextArea};

const TEXT_COLOR: Color = Color::Rgb(0xcf, 0xcf, 0xcf);
const FOCUS_COLOR: Color = Color::Cyan;

pub struct TextInput {
    textarea: TextArea<'static>,
    title: &'static str,
    placeholder: Option<&'static str>,
    multiline: bool,
    focused: bool,
}

impl TextInput {
    /// Multi-line field; Enter inserts a newline
    pub fn multiline(title: &'static str) -> Self {
        Self::build(title, None, true)
    }

    /// Single-line field; newlines are never inserted
    pub fn single_line(title: &'static str, placeholder: &'static str) -> Self {
        Self::build(title, Some(placeholder), false)
    }

    fn build(title: &'static str, placeholder: Option<&'static str>, multiline: bool) -> Self {
        let mut input = Self {
            textarea: TextArea::default(),
            title,
            placeholder,
            multiline,
            focused: false,
        };
        input.apply_theme();
        input
    }

    fn apply_theme(&mut self) {
        self.textarea.set_style(Style::default().fg(TEXT_COLOR));
        self.textarea.set_cursor_line_style(Style::default());
        // only the focused field shows a cursor
        let cursor_style = if self.focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        self.textarea.set_cursor_style(cursor_style);

        let border_style = if self.focused {
            Style::default().fg(FOCUS_COLOR)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        self.textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(self.title),
        );

        if let Some(placeholder) = self.placeholder {
            self.textarea.set_placeholder_text(placeholder);
            self.textarea
                .set_placeholder_style(Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC));
        }
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        self.apply_theme();
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    /// Replace the contents. Multi-line fields put the cursor at the start,
    /// single-line fields at the end.
    pub fn set_text(&mut self, text: &str) {
        let lines: Vec<String> = if self.multiline {
            text.split('\n').map(str::to_owned).collect()
        } else {
            vec![text.replace(['\n', '\r'], "")]
        };
        self.textarea = TextArea::new(lines);
        self.apply_theme();
        if !self.multiline {
            self.textarea.move_cursor(CursorMove::End);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.textarea.lines() == [""]
    }

    pub fn lines(&self) -> &[String] {
        self.textarea.lines()
    }

    /// (row, col) with col counted in chars
    pub fn cursor(&self) -> (usize, usize) {
        self.textarea.cursor()
    }

    /// Route a key to the text area. Returns whether the text changed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let input = Input::from(key);
        if !self.multiline && is_newline(&input) {
            return false;
        }
        self.textarea.input(input)
    }

    pub fn textarea(&self) -> &TextArea<'static> {
        &self.textarea
    }
}

fn is_newline(input: &Input) -> bool {
    matches!(
        input,
        Input {
            key: Key::Enter | Key::Char('\n' | '\r'),
            ..
        } | Input {
            key: Key::Char('m'),
            ctrl: true,
            ..
        }
    )
}
