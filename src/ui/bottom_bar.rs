use super::util::title_style;
use crate::{
    app::{Action, AppContext, AppResult, AppView, FocusedPane},
    components::Component,
};
use crossterm::event::KeyEvent;
use ratatui::{Frame, layout::Rect, text::Line, widgets::{Block, Paragraph}};
use std::convert::Infallible;

#[derive(Debug, Default)]
pub struct BottomBar;

impl BottomBar {
    fn keymap(pane: FocusedPane, editing: bool) -> &'static str {
        match (pane, editing) {
            (FocusedPane::Messenger, true) => "Enter Update • Esc Stop editing • Ctrl+U Clear",
            (FocusedPane::Messenger, false) => {
                "c Connect • r Refresh • e Edit • Enter Update • Tab Quiz • s Settings • q Quit"
            }
            (FocusedPane::Quiz, _) => {
                "j k Move • Enter Answer • a..d Pick • r Restart • Tab Messenger • q Quit"
            }
            (FocusedPane::Modal, _) => "Tab Next field • Enter Save • Esc Cancel",
        }
    }
}

impl Component for BottomBar {
    type Command = Infallible;

    fn command_for_key(&self, _key: KeyEvent, _view: &AppView<'_>) -> Option<Self::Command> {
        None
    }

    fn update(
        &mut self,
        command: &Self::Command,
        _ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        match *command {}
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, view: &AppView<'_>) {
        let pane = view.state.navigation.focused_pane;
        let editing = view.state.navigation.editing;
        let widget = Paragraph::new(Line::from(Self::keymap(pane, editing)))
            .block(Block::bordered().title(Line::from("Keys").style(title_style(false))));
        frame.render_widget(widget, area);
    }
}
