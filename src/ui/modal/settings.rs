use crate::{
    app::{Action, AppContext, AppResult, AppView, contract::parse_address},
    components::Component,
    storage::ConfigKey,
    ui::util::centered_rect,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tracing::info;

const RPC_SCHEMES: [&str; 4] = ["http://", "https://", "ws://", "wss://"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SettingsField {
    #[default]
    RpcUrl,
    ContractAddress,
}

impl SettingsField {
    fn title(self) -> &'static str {
        match self {
            SettingsField::RpcUrl => "RPC URL",
            SettingsField::ContractAddress => "Contract address",
        }
    }

    fn other(self) -> Self {
        match self {
            SettingsField::RpcUrl => SettingsField::ContractAddress,
            SettingsField::ContractAddress => SettingsField::RpcUrl,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsCommand {
    FocusNextField,
    FocusPreviousField,
    InputChar(char),
    InsertText(String),
    Backspace,
    ClearField,
    Submit,
    Cancel,
}

/// Form for the node endpoint and the message board address.
#[derive(Debug, Default)]
pub struct SettingsModal {
    rpc_url: String,
    contract_address: String,
    focused_field: SettingsField,
    message: Option<String>,
}

impl SettingsModal {
    fn value(&self, field: SettingsField) -> &str {
        match field {
            SettingsField::RpcUrl => &self.rpc_url,
            SettingsField::ContractAddress => &self.contract_address,
        }
    }

    fn selected_value(&mut self) -> &mut String {
        match self.focused_field {
            SettingsField::RpcUrl => &mut self.rpc_url,
            SettingsField::ContractAddress => &mut self.contract_address,
        }
    }

    fn validate(&self) -> Result<(), String> {
        let url = self.rpc_url.trim();
        if url.is_empty() {
            return Err("RPC URL is required".into());
        }
        if !RPC_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
            return Err("RPC URL must start with http://, https://, ws:// or wss://".into());
        }
        if self.contract_address.trim().is_empty() {
            return Err("Contract address is required".into());
        }
        parse_address(&self.contract_address).map(|_| ())
    }

    fn save(&mut self, ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        if let Err(message) = self.validate() {
            self.message = Some(message);
            return Ok(None);
        }

        let rpc_url = self.rpc_url.trim();
        let contract_address = self.contract_address.trim();
        let config = ctx.storage.config();
        config.set(ConfigKey::RpcUrl, rpc_url)?;
        config.set(ConfigKey::ContractAddress, contract_address)?;
        info!(rpc_url, contract_address, "configuration saved");

        ctx.state.config.rpc_url = Some(rpc_url.to_string());
        ctx.state.config.contract_address = Some(contract_address.to_string());
        self.message = None;
        Ok(Some(Action::ConfigSaved))
    }
}

impl Component for SettingsModal {
    type Command = SettingsCommand;

    fn command_for_key(&self, key: KeyEvent, _view: &AppView<'_>) -> Option<Self::Command> {
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc) => Some(SettingsCommand::Cancel),
            (KeyModifiers::NONE, KeyCode::Tab | KeyCode::Down) => {
                Some(SettingsCommand::FocusNextField)
            }
            (_, KeyCode::BackTab) | (KeyModifiers::NONE, KeyCode::Up) => {
                Some(SettingsCommand::FocusPreviousField)
            }
            (_, KeyCode::Enter) => Some(SettingsCommand::Submit),
            (_, KeyCode::Backspace) => Some(SettingsCommand::Backspace),
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => Some(SettingsCommand::ClearField),
            (modifiers, KeyCode::Char(c)) if !modifiers.contains(KeyModifiers::CONTROL) => {
                Some(SettingsCommand::InputChar(c))
            }
            _ => None,
        }
    }

    fn init(&mut self, ctx: &mut AppContext<'_>) -> AppResult<()> {
        let config = &ctx.state.config;
        self.rpc_url = config.rpc_url.clone().unwrap_or_default();
        self.contract_address = config.contract_address.clone().unwrap_or_default();
        self.focused_field = SettingsField::default();
        self.message = None;
        Ok(())
    }

    fn update(
        &mut self,
        command: &Self::Command,
        ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        match command {
            SettingsCommand::Submit => return self.save(ctx),
            SettingsCommand::Cancel => return Ok(Some(Action::CloseModal)),
            SettingsCommand::FocusNextField | SettingsCommand::FocusPreviousField => {
                self.focused_field = self.focused_field.other();
            }
            SettingsCommand::InputChar(c) => self.selected_value().push(*c),
            SettingsCommand::InsertText(text) => {
                let cleaned: String = text.chars().filter(|ch| !ch.is_control()).collect();
                self.selected_value().push_str(&cleaned);
            }
            SettingsCommand::Backspace => {
                self.selected_value().pop();
            }
            SettingsCommand::ClearField => self.selected_value().clear(),
        }
        self.message = None;
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, view: &AppView<'_>) {
        let modal_area = centered_rect(76, 13, area);
        frame.render_widget(Clear, modal_area);

        let title = if view.state.config.is_complete() {
            "Update Configuration"
        } else {
            "Configuration Required"
        };
        let block = Block::default()
            .title(Span::styled(
                title,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Gray));
        let inner = block.inner(modal_area);
        frame.render_widget(block, modal_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Length(2),
            ])
            .split(inner);

        frame.render_widget(
            Paragraph::new(Text::raw(
                "Point the messenger at a node and a deployed message board.",
            ))
            .alignment(Alignment::Center),
            chunks[0],
        );

        for (field, target) in [
            (SettingsField::RpcUrl, chunks[1]),
            (SettingsField::ContractAddress, chunks[2]),
        ] {
            let value = self.value(field);
            let is_focused = self.focused_field == field;
            let mut spans = vec![
                Span::styled(
                    format!("{}: ", field.title()),
                    Style::default()
                        .fg(Color::Gray)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    if value.is_empty() { "<required>" } else { value }.to_string(),
                    if is_focused {
                        Style::default()
                            .fg(Color::White)
                            .bg(Color::Blue)
                            .add_modifier(Modifier::BOLD)
                    } else if value.is_empty() {
                        Style::default().fg(Color::DarkGray)
                    } else {
                        Style::default().fg(Color::White)
                    },
                ),
            ];
            if is_focused {
                spans.push(Span::styled(
                    " ▌",
                    Style::default()
                        .fg(Color::LightCyan)
                        .add_modifier(Modifier::BOLD),
                ));
            }
            frame.render_widget(Paragraph::new(Line::from(spans)), target);
        }

        frame.render_widget(
            Paragraph::new(Span::styled(
                "Tab switches fields • Ctrl+U clears",
                Style::default().fg(Color::Gray),
            )),
            chunks[3],
        );

        let status = match &self.message {
            Some(message) => Span::styled(message.clone(), Style::default().fg(Color::Yellow)),
            None => Span::styled(
                "Save with Enter. Cancel with Esc.",
                Style::default().fg(Color::Gray),
            ),
        };
        frame.render_widget(Paragraph::new(status), chunks[4]);
    }
}
