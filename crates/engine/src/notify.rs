//! Asynchronous notification fan-out.
//!
//! Approvals must not block on mail transports: the engine pushes outbound
//! messages onto an unbounded channel and a background task drains it,
//! writing in-app records through the storage port and handing emails to a
//! [`Mailer`]. Delivery failures are logged and never fail the transition
//! that produced them.

use std::sync::Arc;

use async_trait::async_trait;
use lodgeflow_storage::{NotificationRecord, WorkflowStore};
use time::OffsetDateTime;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Email delivery failure.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Transport(String),
}

/// Outbound email port. The default [`LogMailer`] only logs; deployments
/// plug in a real transport.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// A mailer that logs instead of sending. Used in development and tests.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), MailError> {
        tracing::info!(to, subject, "email (log transport)");
        Ok(())
    }
}

/// One outbound message.
#[derive(Debug)]
pub enum Outbound {
    /// Persist an in-app notification for a user.
    InApp { user_id: String, message: String },
    /// Send an email.
    Email {
        to: String,
        subject: String,
        body: String,
    },
    /// Acknowledge once every earlier message has been dispatched. Used for
    /// graceful shutdown and deterministic tests.
    Flush(oneshot::Sender<()>),
}

/// Handle to the dispatcher task. Cheap to clone; dropping every handle
/// closes the channel and ends the task.
#[derive(Clone)]
pub struct NotificationHub {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl NotificationHub {
    /// Spawn the dispatcher task and return a handle to it.
    pub fn spawn(store: Arc<dyn WorkflowStore>, mailer: Arc<dyn Mailer>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();
        tokio::spawn(async move {
            while let Some(outbound) = rx.recv().await {
                match outbound {
                    Outbound::InApp { user_id, message } => {
                        let record = NotificationRecord {
                            id: Uuid::new_v4(),
                            user_id,
                            message,
                            read: false,
                            created_at: OffsetDateTime::now_utc(),
                        };
                        if let Err(err) = store.insert_notification(&record).await {
                            tracing::warn!(user_id = %record.user_id, %err, "in-app notification dropped");
                        }
                    }
                    Outbound::Email { to, subject, body } => {
                        if let Err(err) = mailer.send(&to, &subject, &body).await {
                            tracing::warn!(%to, %err, "email delivery failed");
                        }
                    }
                    Outbound::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
        });
        Self { tx }
    }

    /// Queue an outbound message. Fire-and-forget: a closed dispatcher is
    /// logged, not surfaced.
    pub fn push(&self, outbound: Outbound) {
        if self.tx.send(outbound).is_err() {
            tracing::warn!("notification dispatcher is gone; message dropped");
        }
    }

    /// Wait until everything queued so far has been dispatched.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        self.push(Outbound::Flush(ack));
        let _ = done.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodgeflow_storage::MemoryStore;
    use std::sync::Mutex;

    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), MailError> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string()));
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), MailError> {
            Err(MailError::Transport("smtp down".to_string()))
        }
    }

    #[tokio::test]
    async fn in_app_messages_land_in_the_store() {
        let store = Arc::new(MemoryStore::new());
        let hub = NotificationHub::spawn(store.clone(), Arc::new(LogMailer));

        hub.push(Outbound::InApp {
            user_id: "alice".to_string(),
            message: "Request pending HR approval".to_string(),
        });
        hub.flush().await;

        let listed = store.notifications_for("alice", 10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].message, "Request pending HR approval");
        assert!(!listed[0].read);
    }

    #[tokio::test]
    async fn emails_reach_the_mailer_in_order() {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer {
            sent: Mutex::new(Vec::new()),
        });
        let hub = NotificationHub::spawn(store, mailer.clone());

        for i in 0..3 {
            hub.push(Outbound::Email {
                to: "gm@lodge.com".to_string(),
                subject: format!("subject {i}"),
                body: String::new(),
            });
        }
        hub.flush().await;

        let sent = mailer.sent.lock().unwrap();
        let subjects: Vec<_> = sent.iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(subjects, ["subject 0", "subject 1", "subject 2"]);
    }

    #[tokio::test]
    async fn mail_failure_does_not_kill_the_dispatcher() {
        let store = Arc::new(MemoryStore::new());
        let hub = NotificationHub::spawn(store.clone(), Arc::new(FailingMailer));

        hub.push(Outbound::Email {
            to: "hr@lodge.com".to_string(),
            subject: "will fail".to_string(),
            body: String::new(),
        });
        hub.push(Outbound::InApp {
            user_id: "bob".to_string(),
            message: "still delivered".to_string(),
        });
        hub.flush().await;

        let listed = store.notifications_for("bob", 10).await.unwrap();
        assert_eq!(listed.len(), 1);
    }
}
