use super::{
    CommandBus, Message,
    error::MessengerError,
    messenger::{MessengerEvent, MessengerState, reduce},
    session::Session,
};
use crate::storage::ConfigState;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Applies messenger transitions and runs their effects against the active session.
pub struct MessengerController {
    bus: CommandBus,
    session: Option<Session>,
}

impl MessengerController {
    pub fn new(bus: CommandBus) -> Self {
        Self { bus, session: None }
    }

    pub fn bus(&self) -> &CommandBus {
        &self.bus
    }

    /// Starts a session for `config` off the UI thread. The outcome arrives as
    /// [`Message::Session`] unless `token` is cancelled first.
    pub fn connect(&self, config: ConfigState, token: CancellationToken) {
        let bus = self.bus.clone();
        self.bus.spawn_message(
            token,
            async move { Session::connect(&config, &bus).await },
            Message::Session,
        );
    }

    /// Replaces the session, tearing down the previous one and starting from a clean state.
    pub fn attach(&mut self, session: Session, state: &mut MessengerState) {
        self.detach();
        *state = MessengerState::default();
        let selected = session.selected_address();
        self.session = Some(session);
        if let Some(address) = selected {
            debug!(%address, "restoring selected wallet account");
            self.handle(state, MessengerEvent::AccountsChanged(vec![address]));
        }
    }

    pub fn detach(&mut self) {
        if self.session.take().is_some() {
            debug!("messenger session detached");
        }
    }

    pub fn handle(&mut self, state: &mut MessengerState, event: MessengerEvent) {
        let transition = reduce(state, event);
        *state = transition.state;
        let Some(effect) = transition.effect else {
            return;
        };
        match self.session.as_mut() {
            Some(session) => session.execute(effect, &self.bus),
            None => {
                if let Some(failure) = effect.failed(MessengerError::ProviderMissing) {
                    warn!(?effect, "no session to run effect");
                    self.handle(state, failure);
                }
            }
        }
    }
}
