use crate::{
    components::Component,
    storage::{ConfigState, Storage},
    ui::{
        bottom_bar::BottomBar,
        messenger::MessengerPane,
        modal::settings::{SettingsCommand, SettingsModal},
        quiz::QuizPane,
        top::{TopBar, TopCommand},
    },
};
pub type AppResult<T> = color_eyre::Result<T>;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Direction, Layout},
};
use std::{future::Future, path::PathBuf, time::Duration};
use tokio::{
    runtime::{Handle, Runtime},
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub mod contract;
pub mod controller;
pub mod error;
pub mod messenger;
pub mod quiz;
pub mod session;
#[cfg(test)]
mod testing;
pub mod wallet;

use controller::MessengerController;
use error::MessengerError;
use messenger::{MessengerEvent, MessengerState, Operation};
use quiz::Quiz;
use session::Session;

pub use navigation::FocusedPane;

pub const QUIZ_PATH_ENV: &str = "CHAIN_MESSENGER_QUIZ";

/// Central application type that orchestrates state and delegates to UI components.
pub struct App {
    running: bool,
    pub state: AppState,
    pub storage: Storage,
    top_bar: TopBar,
    messenger_pane: MessengerPane,
    quiz_pane: QuizPane,
    bottom_bar: BottomBar,
    settings: SettingsModal,
    controller: MessengerController,
    message_rx: UnboundedReceiver<Message>,
    connecting: CancellationToken,
    runtime: Runtime,
}

impl App {
    const POLL_INTERVAL: Duration = Duration::from_millis(100);
    const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

    pub fn new(data_dir: PathBuf) -> AppResult<Self> {
        let storage = Storage::open(&data_dir)?;
        let mut state = AppState {
            config: ConfigState::load(storage.config())?,
            quiz: load_quiz(),
            ..AppState::default()
        };
        let runtime = Runtime::new()?;
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let controller =
            MessengerController::new(CommandBus::new(message_tx, runtime.handle().clone()));

        let mut top_bar = TopBar::default();
        let mut messenger_pane = MessengerPane::default();
        let mut quiz_pane = QuizPane::default();
        let mut bottom_bar = BottomBar;
        let mut settings = SettingsModal::default();
        {
            let mut ctx = AppContext {
                state: &mut state,
                storage: &storage,
            };
            top_bar.init(&mut ctx)?;
            messenger_pane.init(&mut ctx)?;
            quiz_pane.init(&mut ctx)?;
            bottom_bar.init(&mut ctx)?;
            settings.init(&mut ctx)?;
        }
        info!(root = %storage.root().display(), "storage opened");

        let mut app = Self {
            running: false,
            state,
            storage,
            top_bar,
            messenger_pane,
            quiz_pane,
            bottom_bar,
            settings,
            controller,
            message_rx,
            connecting: CancellationToken::new(),
            runtime,
        };

        if app.state.config.is_complete() {
            app.reconnect();
        } else {
            app.dispatch(Action::OpenSettings)?;
        }
        Ok(app)
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> AppResult<()> {
        self.running = true;
        while self.running {
            self.tick()?;
            terminal.draw(|frame| self.render(frame))?;
            if event::poll(Self::POLL_INTERVAL)? {
                self.handle_events()?;
            }
        }
        self.connecting.cancel();
        self.controller.detach();
        self.runtime.shutdown_timeout(Self::SHUTDOWN_GRACE);
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(1),
                Constraint::Length(3),
            ])
            .split(frame.area());

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(layout[1]);

        let view = AppView { state: &self.state };

        self.top_bar.render(frame, layout[0], &view);
        self.messenger_pane.render(frame, panes[0], &view);
        self.quiz_pane.render(frame, panes[1], &view);
        self.bottom_bar.render(frame, layout[2], &view);
        if self.state.navigation.focused_pane == FocusedPane::Modal {
            let area = frame.area();
            self.settings.render(frame, area, &view);
        }
    }

    fn handle_events(&mut self) -> AppResult<()> {
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key)?,
            Event::Paste(text) if self.state.navigation.focused_pane == FocusedPane::Modal => {
                let action = run_command(
                    &mut self.settings,
                    &SettingsCommand::InsertText(text),
                    &mut self.state,
                    &self.storage,
                )?;
                self.dispatch_optional(action)?;
            }
            Event::Mouse(_) | Event::Resize(_, _) => {}
            _ => {}
        }
        Ok(())
    }

    fn on_key_event(&mut self, key: KeyEvent) -> AppResult<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return self.dispatch(Action::Quit);
        }

        let focused = self.state.navigation.focused_pane;
        let view = AppView { state: &self.state };
        match focused {
            FocusedPane::Modal => {
                if let Some(command) = self.settings.command_for_key(key, &view) {
                    let action = run_command(
                        &mut self.settings,
                        &command,
                        &mut self.state,
                        &self.storage,
                    )?;
                    self.dispatch_optional(action)?;
                }
                return Ok(());
            }
            FocusedPane::Messenger if self.state.navigation.editing => {
                if let Some(command) = self.messenger_pane.command_for_key(key, &view) {
                    let action = run_command(
                        &mut self.messenger_pane,
                        &command,
                        &mut self.state,
                        &self.storage,
                    )?;
                    self.dispatch_optional(action)?;
                }
                return Ok(());
            }
            FocusedPane::Messenger | FocusedPane::Quiz => {}
        }

        match (key.modifiers, key.code) {
            (_, KeyCode::Char('q')) => self.dispatch(Action::Quit),
            (KeyModifiers::NONE, KeyCode::Tab) => self.dispatch(Action::FocusNextPane),
            (_, KeyCode::BackTab) => self.dispatch(Action::FocusPreviousPane),
            (KeyModifiers::NONE, KeyCode::Char('s')) => self.dispatch(Action::OpenSettings),
            _ => self.route_to_focused(key),
        }
    }

    fn route_to_focused(&mut self, key: KeyEvent) -> AppResult<()> {
        let focused = self.state.navigation.focused_pane;
        let view = AppView { state: &self.state };
        let action = match focused {
            FocusedPane::Messenger => match self.messenger_pane.command_for_key(key, &view) {
                Some(command) => run_command(
                    &mut self.messenger_pane,
                    &command,
                    &mut self.state,
                    &self.storage,
                )?,
                None => None,
            },
            FocusedPane::Quiz => match self.quiz_pane.command_for_key(key, &view) {
                Some(command) => {
                    run_command(&mut self.quiz_pane, &command, &mut self.state, &self.storage)?
                }
                None => None,
            },
            FocusedPane::Modal => None,
        };
        self.dispatch_optional(action)
    }

    fn dispatch_optional(&mut self, action: Option<Action>) -> AppResult<()> {
        match action {
            Some(action) => self.dispatch(action),
            None => Ok(()),
        }
    }

    fn dispatch(&mut self, action: Action) -> AppResult<()> {
        match action {
            Action::Quit => self.running = false,
            Action::FocusNextPane => self.state.navigation.focus_next(),
            Action::FocusPreviousPane => self.state.navigation.focus_previous(),
            Action::OpenSettings => {
                let mut ctx = AppContext {
                    state: &mut self.state,
                    storage: &self.storage,
                };
                self.settings.init(&mut ctx)?;
                self.state.navigation.open_modal();
            }
            Action::CloseModal => self.state.navigation.close_modal(),
            Action::ConfigSaved => {
                self.state.navigation.close_modal();
                self.reconnect();
                self.dispatch(Action::ShowNotice("Configuration saved".into()))?;
            }
            Action::ShowNotice(notice) => {
                run_command(
                    &mut self.top_bar,
                    &TopCommand::ShowNotice(notice),
                    &mut self.state,
                    &self.storage,
                )?;
            }
            Action::Messenger(event) => {
                debug!(?event, "messenger event");
                self.apply_messenger(event);
            }
        }
        Ok(())
    }

    /// Tears down the current session and starts one for the current configuration in the
    /// background. A start still in flight from an earlier call is abandoned.
    fn reconnect(&mut self) {
        self.connecting.cancel();
        self.controller.detach();
        self.state.messenger = MessengerState::default();
        if !self.state.config.is_complete() {
            return;
        }
        self.connecting = CancellationToken::new();
        self.state.messenger.pending = Some(Operation::Connecting);
        self.controller
            .connect(self.state.config.clone(), self.connecting.clone());
    }

    fn apply_messenger(&mut self, event: MessengerEvent) {
        self.controller.handle(&mut self.state.messenger, event);
        self.remember_account();
    }

    fn remember_account(&mut self) {
        let Some(account) = self.state.messenger.account.as_deref() else {
            return;
        };
        match self
            .state
            .config
            .remember_account(self.storage.config(), account)
        {
            Ok(true) => debug!(account, "account remembered"),
            Ok(false) => {}
            Err(err) => warn!(?err, "failed to remember account"),
        }
    }

    fn on_session(&mut self, result: Result<Session, MessengerError>) {
        match result {
            Ok(session) => {
                info!(?session, "messenger session ready");
                self.controller.attach(session, &mut self.state.messenger);
                self.remember_account();
            }
            Err(err) => {
                warn!(%err, "failed to start messenger session");
                self.state.messenger = MessengerState {
                    status: err.to_string(),
                    ..MessengerState::default()
                };
            }
        }
    }

    fn tick(&mut self) -> AppResult<()> {
        let actions = {
            let mut ctx = AppContext {
                state: &mut self.state,
                storage: &self.storage,
            };
            [
                self.top_bar.tick(&mut ctx)?,
                self.messenger_pane.tick(&mut ctx)?,
                self.quiz_pane.tick(&mut ctx)?,
                self.bottom_bar.tick(&mut ctx)?,
            ]
        };
        for action in actions.into_iter().flatten() {
            self.dispatch(action)?;
        }
        self.drain_messages();
        Ok(())
    }

    fn drain_messages(&mut self) {
        while let Ok(message) = self.message_rx.try_recv() {
            match message {
                Message::Messenger(guarded) => match guarded.into_live() {
                    Some(event) => self.apply_messenger(event),
                    None => debug!("dropping result from a cancelled task"),
                },
                Message::Session(guarded) => match guarded.into_live() {
                    Some(result) => self.on_session(result),
                    None => debug!("dropping superseded session"),
                },
            }
        }
    }
}

fn run_command<C: Component>(
    component: &mut C,
    command: &C::Command,
    state: &mut AppState,
    storage: &Storage,
) -> AppResult<Option<Action>> {
    let mut ctx = AppContext { state, storage };
    component.update(command, &mut ctx)
}

fn load_quiz() -> Quiz {
    let Ok(path) = std::env::var(QUIZ_PATH_ENV) else {
        return Quiz::builtin();
    };
    match Quiz::load(&path) {
        Ok(quiz) => {
            info!(%path, questions = quiz.total(), "quiz loaded");
            quiz
        }
        Err(err) => {
            warn!(%path, ?err, "falling back to the built-in quiz");
            Quiz::builtin()
        }
    }
}

/// State shared across components.
#[derive(Debug, Default)]
pub struct AppState {
    pub navigation: NavigationState,
    pub messenger: MessengerState,
    pub quiz: Quiz,
    pub config: ConfigState,
}

#[derive(Debug, Default)]
pub struct NavigationState {
    pub focused_pane: FocusedPane,
    /// Keys go to the draft input instead of the global keymap.
    pub editing: bool,
    return_pane: FocusedPane,
}

impl NavigationState {
    pub fn focus_next(&mut self) {
        self.editing = false;
        self.focused_pane = match self.focused_pane {
            FocusedPane::Messenger => FocusedPane::Quiz,
            FocusedPane::Quiz => FocusedPane::Messenger,
            FocusedPane::Modal => FocusedPane::Modal,
        };
    }

    pub fn focus_previous(&mut self) {
        // Two panes, so backwards is the same cycle.
        self.focus_next();
    }

    pub fn open_modal(&mut self) {
        if self.focused_pane != FocusedPane::Modal {
            self.return_pane = self.focused_pane;
            self.focused_pane = FocusedPane::Modal;
        }
    }

    pub fn close_modal(&mut self) {
        if self.focused_pane == FocusedPane::Modal {
            self.focused_pane = self.return_pane;
        }
    }
}

/// Mutable context passed to components while handling logic.
pub struct AppContext<'a> {
    pub state: &'a mut AppState,
    pub storage: &'a Storage,
}

/// Read-only context used during rendering.
pub struct AppView<'a> {
    pub state: &'a AppState,
}

/// Result of background work, tagged with the token of the task that produced it.
#[derive(Debug)]
pub struct Guarded<T> {
    token: CancellationToken,
    payload: T,
}

impl<T> Guarded<T> {
    pub fn new(token: CancellationToken, payload: T) -> Self {
        Self { token, payload }
    }

    /// `None` once the producing task has been cancelled.
    pub fn into_live(self) -> Option<T> {
        (!self.token.is_cancelled()).then_some(self.payload)
    }
}

#[derive(Debug)]
pub enum Message {
    Messenger(Guarded<MessengerEvent>),
    Session(Guarded<Result<Session, MessengerError>>),
}

/// Delivers messenger events for one cancellation scope.
#[derive(Clone)]
pub struct EventSink {
    sender: UnboundedSender<Message>,
    token: CancellationToken,
}

impl EventSink {
    pub fn emit(&self, event: MessengerEvent) {
        if self.token.is_cancelled() {
            return;
        }
        let _ = self
            .sender
            .send(Message::Messenger(Guarded::new(self.token.clone(), event)));
    }
}

#[derive(Clone)]
pub struct CommandBus {
    sender: UnboundedSender<Message>,
    handle: Handle,
}

impl CommandBus {
    pub fn new(sender: UnboundedSender<Message>, handle: Handle) -> Self {
        Self { sender, handle }
    }

    pub fn sink(&self, token: CancellationToken) -> EventSink {
        EventSink {
            sender: self.sender.clone(),
            token,
        }
    }

    /// Runs `task` until it finishes or `token` is cancelled; only a finished task reports back.
    pub fn spawn_guarded<F, Fut>(&self, token: CancellationToken, task: F)
    where
        F: FnOnce(EventSink) -> Fut,
        Fut: Future<Output = MessengerEvent> + Send + 'static,
    {
        let work = task(self.sink(token.clone()));
        self.spawn_message(token, work, Message::Messenger);
    }

    /// Runs `work` under `token` and delivers its output through `wrap` unless cancelled first.
    pub fn spawn_message<Fut, T>(
        &self,
        token: CancellationToken,
        work: Fut,
        wrap: fn(Guarded<T>) -> Message,
    ) where
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.sender.clone();
        self.handle.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => debug!("task cancelled"),
                output = work => {
                    if !token.is_cancelled() {
                        let _ = sender.send(wrap(Guarded::new(token, output)));
                    }
                }
            }
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    FocusNextPane,
    FocusPreviousPane,
    OpenSettings,
    CloseModal,
    ConfigSaved,
    ShowNotice(String),
    Messenger(MessengerEvent),
}

mod navigation {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum FocusedPane {
        #[default]
        Messenger,
        Quiz,
        Modal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout};

    #[test]
    fn focus_cycles_between_panes() {
        let mut navigation = NavigationState::default();
        assert_eq!(navigation.focused_pane, FocusedPane::Messenger);
        navigation.focus_next();
        assert_eq!(navigation.focused_pane, FocusedPane::Quiz);
        navigation.focus_previous();
        assert_eq!(navigation.focused_pane, FocusedPane::Messenger);
    }

    #[test]
    fn modal_returns_to_previous_pane() {
        let mut navigation = NavigationState::default();
        navigation.focus_next();
        navigation.open_modal();
        assert_eq!(navigation.focused_pane, FocusedPane::Modal);
        navigation.focus_next();
        assert_eq!(navigation.focused_pane, FocusedPane::Modal);
        navigation.close_modal();
        assert_eq!(navigation.focused_pane, FocusedPane::Quiz);
    }

    #[test]
    fn guarded_payload_dies_with_its_token() {
        let token = CancellationToken::new();
        let live = Guarded::new(token.clone(), 1);
        assert_eq!(live.into_live(), Some(1));
        let stale = Guarded::new(token.clone(), 2);
        token.cancel();
        assert_eq!(stale.into_live(), None);
    }

    #[tokio::test]
    async fn finished_task_reports_its_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let bus = CommandBus::new(tx, Handle::current());
        bus.spawn_guarded(CancellationToken::new(), |_| async {
            MessengerEvent::MessageRead(Ok("gm".into()))
        });
        let Some(Message::Messenger(guarded)) = rx.recv().await else {
            panic!("channel closed");
        };
        assert_eq!(
            guarded.into_live(),
            Some(MessengerEvent::MessageRead(Ok("gm".into())))
        );
    }

    #[tokio::test]
    async fn cancelled_task_stays_silent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let bus = CommandBus::new(tx, Handle::current());
        let token = CancellationToken::new();
        bus.spawn_guarded(token.clone(), |_| async {
            sleep(Duration::from_millis(200)).await;
            MessengerEvent::MessageRead(Ok("late".into()))
        });
        token.cancel();
        let received = timeout(Duration::from_millis(400), rx.recv()).await;
        assert!(received.is_err(), "cancelled task delivered a message");
    }
}
