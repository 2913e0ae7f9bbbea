//! Single-slot alert channel between background flows and whatever renders them.
//!
//! At most one alert is shown. Requesting a new one supersedes the current
//! alert, whose waiter resolves immediately. Every alert carries a
//! monotonically increasing id so responses to an alert that is no longer
//! shown are ignored.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::{oneshot, watch};
use tracing::debug;

pub const DEFAULT_TITLE: &str = "Turnos";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Info,
    Warning,
    Error,
    Confirm,
}

impl AlertKind {
    /// Success and info notices dismiss themselves.
    pub fn auto_dismisses(self) -> bool {
        matches!(self, AlertKind::Success | AlertKind::Info)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    Accepted,
    Declined,
    Expired,
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertView {
    pub id: u64,
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub confirm_text: String,
    pub cancel_text: Option<String>,
    pub expires_at: Option<Instant>,
}

struct Shown {
    view: AlertView,
    responder: oneshot::Sender<AlertOutcome>,
}

struct Inner {
    current: Mutex<Option<Shown>>,
    next_id: AtomicU64,
    observers: watch::Sender<Option<AlertView>>,
    notice_timeout: Duration,
}

#[derive(Clone)]
pub struct AlertMediator {
    inner: Arc<Inner>,
}

/// Resolves once the alert it was issued for is answered, expires or is replaced.
pub struct AlertTicket {
    id: u64,
    rx: oneshot::Receiver<AlertOutcome>,
}

impl AlertTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn outcome(self) -> AlertOutcome {
        self.rx.await.unwrap_or(AlertOutcome::Superseded)
    }
}

impl AlertMediator {
    pub fn new(notice_timeout: Duration) -> Self {
        let (observers, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                current: Mutex::new(None),
                next_id: AtomicU64::new(1),
                observers,
                notice_timeout,
            }),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Shown>> {
        self.inner.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AlertView>> {
        self.inner.observers.subscribe()
    }

    pub fn current(&self) -> Option<AlertView> {
        self.slot().as_ref().map(|s| s.view.clone())
    }

    fn show(
        &self,
        kind: AlertKind,
        title: &str,
        message: &str,
        confirm_text: &str,
        cancel_text: Option<&str>,
    ) -> AlertTicket {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let expires_at = kind
            .auto_dismisses()
            .then(|| Instant::now() + self.inner.notice_timeout);
        let view = AlertView {
            id,
            kind,
            title: title.to_string(),
            message: message.to_string(),
            confirm_text: confirm_text.to_string(),
            cancel_text: cancel_text.map(str::to_string),
            expires_at,
        };
        let (responder, rx) = oneshot::channel();

        // Observers are published under the slot lock so they never lag it
        let previous = {
            let mut slot = self.slot();
            let previous = slot.replace(Shown {
                view: view.clone(),
                responder,
            });
            self.inner.observers.send_replace(Some(view));
            previous
        };
        if let Some(previous) = previous {
            debug!("Alert {} superseded by {}", previous.view.id, id);
            let _ = previous.responder.send(AlertOutcome::Superseded);
        }

        if expires_at.is_some() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                let mediator = self.clone();
                let timeout = self.inner.notice_timeout;
                handle.spawn(async move {
                    tokio::time::sleep(timeout).await;
                    mediator.finish(id, AlertOutcome::Expired);
                });
            }
        }

        AlertTicket { id, rx }
    }

    fn finish(&self, id: u64, outcome: AlertOutcome) -> bool {
        let shown = {
            let mut slot = self.slot();
            match slot.as_ref() {
                Some(s) if s.view.id == id => {
                    self.inner.observers.send_replace(None);
                    slot.take()
                }
                _ => None,
            }
        };
        match shown {
            Some(shown) => {
                let _ = shown.responder.send(outcome);
                true
            }
            None => false,
        }
    }

    /// Answer the alert `id`. Returns false if that alert is no longer shown.
    pub fn respond(&self, id: u64, accepted: bool) -> bool {
        let outcome = if accepted {
            AlertOutcome::Accepted
        } else {
            AlertOutcome::Declined
        };
        self.finish(id, outcome)
    }

    /// Dismiss a notice whose deadline has passed. For renderers running
    /// outside a tokio runtime.
    pub fn expire_due(&self, now: Instant) {
        let due = self
            .current()
            .filter(|v| v.expires_at.is_some_and(|deadline| deadline <= now));
        if let Some(view) = due {
            self.finish(view.id, AlertOutcome::Expired);
        }
    }

    pub fn success(&self, message: &str) -> AlertTicket {
        self.show(AlertKind::Success, DEFAULT_TITLE, message, "Aceptar", None)
    }

    pub fn info(&self, message: &str) -> AlertTicket {
        self.show(AlertKind::Info, DEFAULT_TITLE, message, "Aceptar", None)
    }

    pub fn warning(&self, message: &str) -> AlertTicket {
        self.show(AlertKind::Warning, DEFAULT_TITLE, message, "Aceptar", None)
    }

    pub fn error(&self, message: &str) -> AlertTicket {
        self.show(AlertKind::Error, DEFAULT_TITLE, message, "Aceptar", None)
    }

    /// Ask a yes/no question. The alert is shown before this returns; the
    /// future resolves true only if the confirm button is pressed.
    pub fn confirm(
        &self,
        message: &str,
        confirm_text: &str,
        cancel_text: &str,
    ) -> impl Future<Output = bool> + Send + use<> {
        let ticket = self.show(
            AlertKind::Confirm,
            DEFAULT_TITLE,
            message,
            confirm_text,
            Some(cancel_text),
        );
        async move { ticket.outcome().await == AlertOutcome::Accepted }
    }
}
