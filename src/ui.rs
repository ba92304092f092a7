use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};

use autotype::{
    app::App,
    controller::TypingState,
    device::{KeystrokeSink, PointerSource},
};

const HORIZONTAL_MARGIN: u16 = 1;
const VERTICAL_MARGIN: u16 = 1;
const POPUP_WIDTH_PERCENT: u16 = 60;
const POPUP_HEIGHT: u16 = 5;

/// Screen regions of the editor layout
struct Areas {
    text: Rect,
    path: Rect,
    settings: Rect,
    status: Rect,
    help: Rect,
}

fn split(area: Rect) -> Areas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(3),    // text
            Constraint::Length(3), // file path
            Constraint::Length(1), // delay / interval
            Constraint::Length(1), // status
            Constraint::Length(1), // legend
        ])
        .split(area);

    Areas {
        text: chunks[0],
        path: chunks[1],
        settings: chunks[2],
        status: chunks[3],
        help: chunks[4],
    }
}

fn centered(area: Rect, width_percent: u16, height: u16) -> Rect {
    let width = u32::from(area.width) * u32::from(width_percent.min(100)) / 100;
    let width = u16::try_from(width).unwrap_or(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Renders the editor screen for an [`App`]
pub struct EditorView<'a, K: KeystrokeSink, P: PointerSource> {
    app: &'a App<K, P>,
}

impl<'a, K: KeystrokeSink, P: PointerSource> EditorView<'a, K, P> {
    pub fn new(app: &'a App<K, P>) -> Self {
        Self { app }
    }
}

impl<K: KeystrokeSink, P: PointerSource> Widget for EditorView<'_, K, P> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.app;
        let areas = split(area);

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        app.editor.textarea().render(areas.text, buf);
        app.path.textarea().render(areas.path, buf);

        Paragraph::new(format!(
            "Delay: {} seconds (F7/F8)   Interval: {} ms (F9/F10)",
            app.delay_secs, app.interval_ms
        ))
        .render(areas.settings, buf);

        let status_style = match app.state() {
            TypingState::Waiting => bold_style.fg(Color::Yellow),
            TypingState::Typing => bold_style.fg(Color::Green),
            TypingState::Cancelled | TypingState::Completed | TypingState::Idle => bold_style,
        };
        Paragraph::new(Span::styled(app.status_line(), status_style))
            .alignment(Alignment::Center)
            .render(areas.status, buf);

        let legend = if app.controller().is_active() {
            "(ctrl+c) cancel / (ctrl+q) quit"
        } else {
            "(ctrl+enter / F5) start typing / (tab) switch field / (ctrl+q) quit"
        };
        Paragraph::new(Span::styled(legend, italic_style)).render(areas.help, buf);

        if let Some(error) = &app.error {
            let popup = centered(area, POPUP_WIDTH_PERCENT, POPUP_HEIGHT);
            Clear.render(popup, buf);
            Paragraph::new(vec![
                Line::from(Span::raw(error.as_str())),
                Line::from(Span::styled("(esc) dismiss", italic_style)),
            ])
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red))
                    .title(" Error "),
            )
            .wrap(Wrap { trim: true })
            .render(popup, buf);
        }
    }
}

/// Draw the editor; the focused field renders its own cursor
pub fn draw<K: KeystrokeSink, P: PointerSource>(app: &App<K, P>, f: &mut Frame) {
    f.render_widget(EditorView::new(app), f.area());
}
