use super::util::{short_hex, spinner};
use crate::{
    app::{Action, AppContext, AppResult, AppView, messenger::Operation},
    components::Component,
};
use crossterm::event::KeyEvent;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};
use std::time::{Duration, Instant};

const NOTICE_TTL: Duration = Duration::from_secs(4);

#[derive(Debug)]
pub struct TopBar {
    title: String,
    notice: Option<(String, Instant)>,
    frame: usize,
}

impl Default for TopBar {
    fn default() -> Self {
        Self {
            title: "chain-messenger".to_string(),
            notice: None,
            frame: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TopCommand {
    ShowNotice(String),
}

impl TopBar {
    fn pending_label(operation: Operation) -> &'static str {
        match operation {
            Operation::Connecting => "connecting",
            Operation::Reading => "reading",
            Operation::Writing => "writing",
        }
    }
}

impl Component for TopBar {
    type Command = TopCommand;

    fn command_for_key(&self, _key: KeyEvent, _view: &AppView<'_>) -> Option<Self::Command> {
        None
    }

    fn update(
        &mut self,
        command: &Self::Command,
        _ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        match command {
            TopCommand::ShowNotice(notice) => {
                self.notice = Some((notice.clone(), Instant::now()));
            }
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, view: &AppView<'_>) {
        let messenger = &view.state.messenger;
        let account = messenger
            .account
            .as_deref()
            .map(short_hex)
            .unwrap_or_else(|| "not connected".to_string());
        let title = Line::from(format!("{} • {}", self.title, account))
            .style(Style::default().add_modifier(Modifier::BOLD));

        let mut lines = Vec::new();
        let status_line = match (messenger.pending, messenger.status.is_empty()) {
            (Some(operation), _) => {
                let mut text = format!("{} {}", spinner(self.frame), Self::pending_label(operation));
                if !messenger.status.is_empty() {
                    text = format!("{text} • {}", messenger.status);
                }
                Line::from(Span::styled(text, Style::default().fg(Color::Yellow)))
            }
            (None, false) => Line::from(Span::styled(
                messenger.status.clone(),
                Style::default().fg(Color::LightRed),
            )),
            (None, true) => Line::from("Ready"),
        };
        lines.push(status_line);

        if let Some((notice, _)) = &self.notice {
            lines.push(Line::from(Span::styled(
                notice.clone(),
                Style::default().fg(Color::Gray),
            )));
        } else {
            let missing = view.state.config.missing_env_vars();
            if !missing.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("Missing config: {} (press s)", missing.join(", ")),
                    Style::default().fg(Color::Yellow),
                )));
            }
        }

        let widget = Paragraph::new(lines)
            .style(Style::default().fg(Color::Gray))
            .block(Block::bordered().title(title));
        frame.render_widget(widget, area);
    }

    fn tick(&mut self, ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        if ctx.state.messenger.is_busy() {
            self.frame = self.frame.wrapping_add(1);
        }
        if self
            .notice
            .as_ref()
            .is_some_and(|(_, shown_at)| shown_at.elapsed() >= NOTICE_TTL)
        {
            self.notice = None;
        }
        Ok(None)
    }
}
