use super::error::MessengerError;
use crate::ui::util::short_hex;

pub const WAITING_FOR_CONFIRMATION: &str = "Waiting for confirmation…";
pub const CHAIN_CHANGED_NOTICE: &str = "Network changed; connect again to continue";

/// Operation currently awaiting an external result. Drives the spinner and key gating only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Connecting,
    Reading,
    Writing,
}

/// Transient UI state of the messenger pane. Nothing here is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessengerState {
    pub account: Option<String>,
    pub displayed: String,
    pub draft: String,
    pub status: String,
    pub pending: Option<Operation>,
}

impl MessengerState {
    /// Whether the "Update" control is actionable.
    pub fn can_submit(&self) -> bool {
        self.account.is_some() && !self.draft.trim().is_empty()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// A write stays in flight until its confirmation arrives, whatever else completes meanwhile.
    pub fn is_writing(&self) -> bool {
        self.pending == Some(Operation::Writing)
    }

    /// Ends a read or connect. An unconfirmed write keeps the pending slot.
    fn settle(&mut self) {
        if !self.is_writing() {
            self.pending = None;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessengerEvent {
    ConnectRequested,
    AccountsReceived(Result<Vec<String>, MessengerError>),
    ReadRequested,
    MessageRead(Result<String, MessengerError>),
    DraftChanged(String),
    WriteRequested,
    WriteSubmitted(String),
    WriteConfirmed(Result<(), MessengerError>),
    AccountsChanged(Vec<String>),
    ChainChanged(u64),
}

/// External work requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RequestAccounts,
    Read { account: String },
    Write { account: String, message: String },
    Reset,
}

impl Effect {
    /// The event reporting this effect as failed before it could start.
    pub fn failed(&self, error: MessengerError) -> Option<MessengerEvent> {
        match self {
            Effect::RequestAccounts => Some(MessengerEvent::AccountsReceived(Err(error))),
            Effect::Read { .. } => Some(MessengerEvent::MessageRead(Err(error))),
            Effect::Write { .. } => Some(MessengerEvent::WriteConfirmed(Err(error))),
            Effect::Reset => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: MessengerState,
    pub effect: Option<Effect>,
}

impl Transition {
    fn stay(state: MessengerState) -> Self {
        Self {
            state,
            effect: None,
        }
    }

    fn then(state: MessengerState, effect: Effect) -> Self {
        Self {
            state,
            effect: Some(effect),
        }
    }
}

fn read_as(mut state: MessengerState, account: String) -> Transition {
    if !state.is_writing() {
        state.pending = Some(Operation::Reading);
    }
    Transition::then(state, Effect::Read { account })
}

fn fail(mut state: MessengerState, error: MessengerError) -> Transition {
    state.settle();
    state.status = error.to_string();
    Transition::stay(state)
}

pub fn reduce(current: &MessengerState, event: MessengerEvent) -> Transition {
    let mut state = current.clone();
    match event {
        MessengerEvent::ConnectRequested => {
            if !state.is_writing() {
                state.pending = Some(Operation::Connecting);
            }
            Transition::then(state, Effect::RequestAccounts)
        }
        MessengerEvent::AccountsReceived(Ok(accounts)) => match accounts.into_iter().next() {
            Some(account) => {
                state.account = Some(account.clone());
                read_as(state, account)
            }
            None => fail(
                state,
                MessengerError::ConnectionFailed("wallet returned no accounts".into()),
            ),
        },
        MessengerEvent::AccountsReceived(Err(error)) => fail(state, error),
        MessengerEvent::ReadRequested => match state.account.clone() {
            Some(account) => read_as(state, account),
            None => fail(state, MessengerError::NotConnected),
        },
        MessengerEvent::MessageRead(Ok(message)) => {
            state.displayed = message;
            if !state.is_writing() {
                state.pending = None;
                state.status.clear();
            }
            Transition::stay(state)
        }
        MessengerEvent::MessageRead(Err(error)) => fail(state, error),
        MessengerEvent::DraftChanged(draft) => {
            state.draft = draft;
            Transition::stay(state)
        }
        MessengerEvent::WriteRequested => {
            if state.is_writing() {
                return Transition::stay(state);
            }
            if state.draft.trim().is_empty() {
                return fail(state, MessengerError::EmptyInput);
            }
            let Some(account) = state.account.clone() else {
                return fail(state, MessengerError::NotConnected);
            };
            state.pending = Some(Operation::Writing);
            state.status = WAITING_FOR_CONFIRMATION.to_string();
            let message = state.draft.clone();
            Transition::then(state, Effect::Write { account, message })
        }
        MessengerEvent::WriteSubmitted(tx_hash) => {
            state.status = format!("Waiting for confirmation of {}", short_hex(&tx_hash));
            Transition::stay(state)
        }
        MessengerEvent::WriteConfirmed(Ok(())) => {
            state.pending = None;
            state.draft.clear();
            state.status.clear();
            match state.account.clone() {
                Some(account) => read_as(state, account),
                None => Transition::stay(state),
            }
        }
        MessengerEvent::WriteConfirmed(Err(error)) => {
            state.pending = None;
            fail(state, error)
        }
        MessengerEvent::AccountsChanged(accounts) => match accounts.into_iter().next() {
            Some(account) => {
                state.account = Some(account.clone());
                read_as(state, account)
            }
            None => {
                state.account = None;
                state.displayed.clear();
                state.settle();
                Transition::stay(state)
            }
        },
        MessengerEvent::ChainChanged(_) => {
            let state = MessengerState {
                status: CHAIN_CHANGED_NOTICE.to_string(),
                ..MessengerState::default()
            };
            Transition::then(state, Effect::Reset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected(account: &str) -> MessengerState {
        MessengerState {
            account: Some(account.into()),
            displayed: "gm".into(),
            ..MessengerState::default()
        }
    }

    #[test]
    fn connect_requests_accounts() {
        let next = reduce(&MessengerState::default(), MessengerEvent::ConnectRequested);
        assert_eq!(next.effect, Some(Effect::RequestAccounts));
        assert_eq!(next.state.pending, Some(Operation::Connecting));
    }

    #[test]
    fn empty_account_list_leaves_account_unset_without_read() {
        let next = reduce(
            &MessengerState::default(),
            MessengerEvent::AccountsReceived(Ok(Vec::new())),
        );
        assert_eq!(next.state.account, None);
        assert_eq!(next.effect, None);
        assert!(next.state.status.contains("no accounts"));
    }

    #[test]
    fn first_account_is_used_and_read() {
        let next = reduce(
            &MessengerState::default(),
            MessengerEvent::AccountsReceived(Ok(vec!["0xabc".into(), "0xdef".into()])),
        );
        assert_eq!(next.state.account.as_deref(), Some("0xabc"));
        assert_eq!(
            next.effect,
            Some(Effect::Read {
                account: "0xabc".into()
            })
        );
    }

    #[test]
    fn rejected_connect_sets_status() {
        let next = reduce(
            &MessengerState::default(),
            MessengerEvent::AccountsReceived(Err(MessengerError::UserRejected)),
        );
        assert_eq!(next.state.status, MessengerError::UserRejected.to_string());
        assert_eq!(next.state.pending, None);
        assert_eq!(next.effect, None);
    }

    #[test]
    fn whitespace_draft_is_rejected_locally() {
        let mut state = connected("0xabc");
        state.draft = "   ".into();
        let next = reduce(&state, MessengerEvent::WriteRequested);
        assert_eq!(next.effect, None);
        assert_eq!(next.state.status, MessengerError::EmptyInput.to_string());
        assert_eq!(next.state.draft, "   ");
    }

    #[test]
    fn write_sets_in_progress_status() {
        let mut state = connected("0xabc");
        state.draft = "hello".into();
        let next = reduce(&state, MessengerEvent::WriteRequested);
        assert_eq!(next.state.status, WAITING_FOR_CONFIRMATION);
        assert_eq!(
            next.effect,
            Some(Effect::Write {
                account: "0xabc".into(),
                message: "hello".into()
            })
        );
    }

    #[test]
    fn write_without_account_is_not_connected() {
        let state = MessengerState {
            draft: "hello".into(),
            ..MessengerState::default()
        };
        let next = reduce(&state, MessengerEvent::WriteRequested);
        assert_eq!(next.effect, None);
        assert_eq!(next.state.status, MessengerError::NotConnected.to_string());
    }

    #[test]
    fn confirmed_write_clears_draft_and_reads_once() {
        let mut state = connected("0xabc");
        state.draft = "hello".into();
        state.status = WAITING_FOR_CONFIRMATION.into();
        let next = reduce(&state, MessengerEvent::WriteConfirmed(Ok(())));
        assert!(next.state.draft.is_empty());
        assert!(next.state.status.is_empty());
        assert_eq!(
            next.effect,
            Some(Effect::Read {
                account: "0xabc".into()
            })
        );
    }

    #[test]
    fn failed_write_keeps_draft() {
        let mut state = connected("0xabc");
        state.draft = "hello".into();
        let next = reduce(
            &state,
            MessengerEvent::WriteConfirmed(Err(MessengerError::WriteFailed("reverted".into()))),
        );
        assert_eq!(next.state.draft, "hello");
        assert!(next.state.status.contains("reverted"));
        assert_eq!(next.effect, None);
    }

    #[test]
    fn read_failure_keeps_displayed_message() {
        let state = connected("0xabc");
        let next = reduce(
            &state,
            MessengerEvent::MessageRead(Err(MessengerError::ReadFailed("boom".into()))),
        );
        assert_eq!(next.state.displayed, "gm");
        assert!(next.state.status.contains("boom"));
    }

    #[test]
    fn read_success_replaces_message_and_clears_status() {
        let mut state = connected("0xabc");
        state.status = "stale".into();
        let next = reduce(&state, MessengerEvent::MessageRead(Ok("wagmi".into())));
        assert_eq!(next.state.displayed, "wagmi");
        assert!(next.state.status.is_empty());
    }

    #[test]
    fn accounts_changed_switches_account_and_reads() {
        let next = reduce(
            &connected("0x111"),
            MessengerEvent::AccountsChanged(vec!["0xabc".into()]),
        );
        assert_eq!(next.state.account.as_deref(), Some("0xabc"));
        assert_eq!(
            next.effect,
            Some(Effect::Read {
                account: "0xabc".into()
            })
        );
    }

    #[test]
    fn empty_accounts_changed_clears_account_and_message() {
        let next = reduce(&connected("0xabc"), MessengerEvent::AccountsChanged(Vec::new()));
        assert_eq!(next.state.account, None);
        assert!(next.state.displayed.is_empty());
        assert_eq!(next.effect, None);
    }

    #[test]
    fn chain_change_resets_everything() {
        let mut state = connected("0xabc");
        state.draft = "half typed".into();
        let next = reduce(&state, MessengerEvent::ChainChanged(5));
        assert_eq!(next.effect, Some(Effect::Reset));
        assert_eq!(next.state.account, None);
        assert!(next.state.displayed.is_empty());
        assert!(next.state.draft.is_empty());
        assert_eq!(next.state.status, CHAIN_CHANGED_NOTICE);
    }

    #[test]
    fn write_in_flight_survives_a_notified_read() {
        let mut state = connected("0xabc");
        state.draft = "one".into();
        let writing = reduce(&state, MessengerEvent::WriteRequested).state;

        let switched = reduce(&writing, MessengerEvent::AccountsChanged(vec!["0xabc".into()]));
        assert_eq!(switched.state.pending, Some(Operation::Writing));
        let read = reduce(&switched.state, MessengerEvent::MessageRead(Ok("gm".into()))).state;
        assert!(read.is_writing());
        assert!(read.is_busy());
        assert_eq!(read.status, WAITING_FOR_CONFIRMATION);

        let again = reduce(&read, MessengerEvent::WriteRequested);
        assert_eq!(again.effect, None);

        let failed_read = reduce(
            &read,
            MessengerEvent::MessageRead(Err(MessengerError::ReadFailed("boom".into()))),
        );
        assert!(failed_read.state.is_writing());

        let confirmed = reduce(&read, MessengerEvent::WriteConfirmed(Ok(())));
        assert_eq!(confirmed.state.pending, Some(Operation::Reading));
        assert!(confirmed.state.draft.is_empty());
    }

    #[test]
    fn failed_write_frees_the_pending_slot() {
        let mut state = connected("0xabc");
        state.draft = "one".into();
        let writing = reduce(&state, MessengerEvent::WriteRequested).state;
        let failed = reduce(
            &writing,
            MessengerEvent::WriteConfirmed(Err(MessengerError::UserRejected)),
        );
        assert_eq!(failed.state.pending, None);
        assert!(failed.state.can_submit());
    }

    #[test]
    fn update_affordance_needs_account_and_text() {
        let mut state = MessengerState {
            draft: "hi".into(),
            ..MessengerState::default()
        };
        assert!(!state.can_submit());
        state.account = Some("0xabc".into());
        assert!(state.can_submit());
        state.draft = " ".into();
        assert!(!state.can_submit());
    }
}
