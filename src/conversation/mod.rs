//! Client-side conversation state: the transcript, the in-flight flag and the
//! one-request-per-turn sequencing.
//!
//! State lives in a [`watch`] channel so a presentation layer can subscribe to
//! [`ConversationView`] snapshots while the controller is shared behind `&self`.

pub mod messages;
pub mod transport;

use log::{ debug, info, warn };
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::models::proxy::{ ErrorKind, ProxyRequest, ProxyResult };
use self::transport::ProxyTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// One utterance in the transcript. Only the controller creates turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    text: String,
    origin: Origin,
    direction: Direction,
}

impl Turn {
    fn outgoing(text: impl Into<String>) -> Self {
        Self { text: text.into(), origin: Origin::User, direction: Direction::Outgoing }
    }

    fn incoming(text: impl Into<String>) -> Self {
        Self { text: text.into(), origin: Origin::Assistant, direction: Direction::Incoming }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// Read-only snapshot handed to renderers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationView {
    pub transcript: Vec<Turn>,
    pub pending: bool,
    pub draft: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input, or a request was already in flight. Nothing changed.
    Ignored,
    Replied,
    Failed(ErrorKind),
}

pub struct ConversationController {
    transport: Arc<dyn ProxyTransport>,
    view: watch::Sender<ConversationView>,
    reply_timeout: Option<Duration>,
}

impl ConversationController {
    pub fn new(transport: Arc<dyn ProxyTransport>) -> Self {
        let (view, _) = watch::channel(ConversationView::default());
        Self { transport, view, reply_timeout: None }
    }

    /// Resolve a turn as a transport error when no reply arrives in time.
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = Some(timeout);
        self
    }

    pub fn view(&self) -> ConversationView {
        self.view.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.view.borrow().pending
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationView> {
        self.view.subscribe()
    }

    /// Edits the input box. Allowed while a request is in flight.
    pub fn set_draft(&self, text: &str) {
        self.view.send_if_modified(|view| {
            if view.draft == text {
                return false;
            }
            view.draft = text.to_string();
            true
        });
    }

    pub async fn submit_draft(&self) -> SubmitOutcome {
        let draft = self.view.borrow().draft.clone();
        self.submit(&draft).await
    }

    /// Sends one user turn and folds the reply back into the transcript.
    ///
    /// A no-op for blank text or while another turn is awaiting its reply.
    pub async fn submit(&self, raw_text: &str) -> SubmitOutcome {
        let mut accepted = false;
        self.view.send_if_modified(|view| {
            if view.pending || raw_text.trim().is_empty() {
                return false;
            }
            view.transcript.push(Turn::outgoing(raw_text));
            view.pending = true;
            accepted = true;
            true
        });

        if !accepted {
            debug!("Ignoring submit: blank input or a reply is still pending");
            return SubmitOutcome::Ignored;
        }

        let mut guard = PendingGuard { view: &self.view, resolved: false };
        let result = self.await_reply(&ProxyRequest::new(raw_text)).await;
        guard.resolve(&result);

        match result {
            ProxyResult::Success { .. } => SubmitOutcome::Replied,
            ProxyResult::Failure { kind, .. } => SubmitOutcome::Failed(kind),
        }
    }

    async fn await_reply(&self, request: &ProxyRequest) -> ProxyResult {
        let Some(limit) = self.reply_timeout else {
            return self.transport.send(request).await;
        };

        match tokio::time::timeout(limit, self.transport.send(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("No reply from chat proxy within {:?}", limit);
                ProxyResult::failure(
                    500,
                    ErrorKind::TransportError,
                    format!("no reply within {:?}", limit)
                )
            }
        }
    }
}

/// Returns the controller to Idle however the awaited call ends, including
/// when the submitting future is dropped mid-flight.
struct PendingGuard<'a> {
    view: &'a watch::Sender<ConversationView>,
    resolved: bool,
}

impl PendingGuard<'_> {
    fn resolve(&mut self, result: &ProxyResult) {
        let reply = messages::reply_text(result);
        if let ProxyResult::Failure { http_status, kind, .. } = result {
            info!("Turn resolved with {} (status {})", kind, http_status);
        }
        self.view.send_modify(|view| {
            view.pending = false;
            view.draft.clear();
            view.transcript.push(Turn::incoming(reply));
        });
        self.resolved = true;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            warn!("Turn abandoned before the proxy replied");
            self.view.send_modify(|view| view.pending = false);
        }
    }
}
