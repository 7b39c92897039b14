use super::util::title_style;
use crate::{
    app::{Action, AppContext, AppResult, AppView, FocusedPane, messenger::MessengerEvent},
    components::Component,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

#[derive(Debug, Default)]
pub struct MessengerPane;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessengerCommand {
    Connect,
    Refresh,
    StartEditing,
    StopEditing,
    InputChar(char),
    Backspace,
    ClearDraft,
    Submit,
}

impl MessengerPane {
    fn draft_with(ctx: &AppContext<'_>, edit: impl FnOnce(&mut String)) -> Action {
        let mut draft = ctx.state.messenger.draft.clone();
        edit(&mut draft);
        Action::Messenger(MessengerEvent::DraftChanged(draft))
    }
}

impl Component for MessengerPane {
    type Command = MessengerCommand;

    fn command_for_key(&self, key: KeyEvent, view: &AppView<'_>) -> Option<Self::Command> {
        if view.state.navigation.editing {
            return match (key.modifiers, key.code) {
                (_, KeyCode::Esc) => Some(MessengerCommand::StopEditing),
                (_, KeyCode::Enter) => Some(MessengerCommand::Submit),
                (_, KeyCode::Backspace) => Some(MessengerCommand::Backspace),
                (KeyModifiers::CONTROL, KeyCode::Char('u')) => Some(MessengerCommand::ClearDraft),
                (modifiers, KeyCode::Char(c)) if !modifiers.contains(KeyModifiers::CONTROL) => {
                    Some(MessengerCommand::InputChar(c))
                }
                _ => None,
            };
        }
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('c')) => Some(MessengerCommand::Connect),
            (KeyModifiers::NONE, KeyCode::Char('r')) => Some(MessengerCommand::Refresh),
            (KeyModifiers::NONE, KeyCode::Char('e') | KeyCode::Char('i')) => {
                Some(MessengerCommand::StartEditing)
            }
            (_, KeyCode::Enter) => Some(MessengerCommand::Submit),
            _ => None,
        }
    }

    fn update(
        &mut self,
        command: &Self::Command,
        ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        let busy = ctx.state.messenger.is_busy();
        let action = match command {
            MessengerCommand::Connect if !busy => {
                Some(Action::Messenger(MessengerEvent::ConnectRequested))
            }
            MessengerCommand::Refresh if !busy && ctx.state.messenger.account.is_some() => {
                Some(Action::Messenger(MessengerEvent::ReadRequested))
            }
            MessengerCommand::Connect | MessengerCommand::Refresh => None,
            MessengerCommand::StartEditing => {
                ctx.state.navigation.editing = true;
                None
            }
            MessengerCommand::StopEditing => {
                ctx.state.navigation.editing = false;
                None
            }
            MessengerCommand::InputChar(c) => Some(Self::draft_with(ctx, |draft| draft.push(*c))),
            MessengerCommand::Backspace => Some(Self::draft_with(ctx, |draft| {
                draft.pop();
            })),
            MessengerCommand::ClearDraft => Some(Self::draft_with(ctx, String::clear)),
            MessengerCommand::Submit => {
                if busy || !ctx.state.messenger.can_submit() {
                    None
                } else {
                    ctx.state.navigation.editing = false;
                    Some(Action::Messenger(MessengerEvent::WriteRequested))
                }
            }
        };
        Ok(action)
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, view: &AppView<'_>) {
        let is_focused = matches!(view.state.navigation.focused_pane, FocusedPane::Messenger);
        let messenger = &view.state.messenger;

        let block = Block::default()
            .borders(Borders::ALL)
            .title(Line::from("Messenger").style(title_style(is_focused)));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(3),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(inner);

        let account = match &messenger.account {
            Some(account) => Line::from(vec![
                Span::styled("Account: ", Style::default().fg(Color::Gray)),
                Span::raw(account.clone()),
            ]),
            None => Line::from(Span::styled(
                "No wallet connected. Press c to connect.",
                Style::default().fg(Color::Gray),
            )),
        };
        frame.render_widget(Paragraph::new(account), chunks[0]);

        let message = if messenger.displayed.is_empty() {
            Paragraph::new(Span::styled(
                "(no message loaded)",
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            Paragraph::new(messenger.displayed.clone())
        };
        frame.render_widget(
            message
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::TOP).title("Current message")),
            chunks[1],
        );

        let editing = view.state.navigation.editing;
        let mut input = vec![Span::raw(messenger.draft.clone())];
        if editing {
            input.push(Span::styled(
                "▌",
                Style::default()
                    .fg(Color::LightCyan)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        let input_style = if editing {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        frame.render_widget(
            Paragraph::new(Line::from(input)).block(
                Block::bordered()
                    .title("New message")
                    .border_style(input_style),
            ),
            chunks[2],
        );

        let update_style = if messenger.can_submit() && !messenger.is_busy() {
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        frame.render_widget(
            Paragraph::new(Span::styled("[Enter] Update", update_style)),
            chunks[3],
        );
    }
}
