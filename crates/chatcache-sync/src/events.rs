//! Session lifecycle events.
//!
//! The session publishes [`SessionEvent`]s on a [`SessionEvents`] source; the
//! cache listens through a [`Subscription`] that stops listening when dropped.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Events beyond this many unread ones make a slow listener skip ahead.
const DEFAULT_CAPACITY: usize = 64;

/// State of the authorization state machine, as reported by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationState {
    WaitParameters,
    WaitPhoneNumber,
    WaitCode,
    WaitPassword,
    WaitRegistration,
    Ready,
    LoggingOut,
    Closing,
    Closed,
}

impl AuthorizationState {
    /// States in which whatever is cached belongs to an account that is gone
    /// or about to be replaced.
    pub fn invalidates_cache(self) -> bool {
        matches!(
            self,
            Self::LoggingOut
                | Self::WaitCode
                | Self::WaitPhoneNumber
                | Self::WaitPassword
                | Self::WaitRegistration
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    AuthorizationState(AuthorizationState),
    /// The live chat list has been loaded from the network.
    DialogsReady,
}

/// Broadcast source of session events.
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish `event`.  Returns the number of listeners it reached.
    pub fn emit(&self, event: SessionEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a listener task.  Dropping it removes the listener.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    /// Stop listening and wait until the listener is gone.
    pub async fn unsubscribe(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logout_like_states_invalidate() {
        assert!(AuthorizationState::LoggingOut.invalidates_cache());
        assert!(AuthorizationState::WaitPhoneNumber.invalidates_cache());
        assert!(AuthorizationState::WaitCode.invalidates_cache());
        assert!(AuthorizationState::WaitPassword.invalidates_cache());
        assert!(AuthorizationState::WaitRegistration.invalidates_cache());

        assert!(!AuthorizationState::Ready.invalidates_cache());
        assert!(!AuthorizationState::Closed.invalidates_cache());
        assert!(!AuthorizationState::Closing.invalidates_cache());
        assert!(!AuthorizationState::WaitParameters.invalidates_cache());
    }

    #[test]
    fn emit_without_listeners_reaches_nobody() {
        let events = SessionEvents::new();
        assert_eq!(events.emit(SessionEvent::DialogsReady), 0);
    }

    #[tokio::test]
    async fn listeners_receive_events_in_order() {
        let events = SessionEvents::new();
        let mut rx = events.subscribe();
        assert_eq!(events.listener_count(), 1);

        events.emit(SessionEvent::AuthorizationState(AuthorizationState::Ready));
        events.emit(SessionEvent::DialogsReady);

        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::AuthorizationState(AuthorizationState::Ready)
        );
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::DialogsReady);
    }

    #[tokio::test]
    async fn dropping_subscription_aborts_listener() {
        let events = SessionEvents::new();
        let mut rx = events.subscribe();
        let subscription = Subscription::new(tokio::spawn(async move {
            while rx.recv().await.is_ok() {}
        }));
        assert!(subscription.is_active());

        subscription.unsubscribe().await;
        assert_eq!(events.listener_count(), 0);
    }
}
