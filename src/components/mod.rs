use crate::app::{Action, AppContext, AppResult, AppView};
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;

/// A pane or modal of the messenger screen.
pub trait Component {
    /// Component-local command type. Returned actions are lifted into the global [`Action`].
    type Command;

    /// Translate a key press received while this component has focus.
    fn command_for_key(&self, key: KeyEvent, view: &AppView<'_>) -> Option<Self::Command>;

    /// Pull whatever the component mirrors from shared state before it is shown.
    fn init(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<()> {
        Ok(())
    }

    fn update(
        &mut self,
        command: &Self::Command,
        ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>>;

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, view: &AppView<'_>);

    /// Called once per loop iteration (spinners, timeouts).
    fn tick(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        Ok(None)
    }
}
