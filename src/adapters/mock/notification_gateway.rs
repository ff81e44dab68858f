use crate::ports::notification_gateway::{NotificationGateway as NotificationGatewayTrait, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// 送信された通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub subject: String,
    pub recipients: Vec<String>,
}

/// Mock implementation of NotificationGateway
///
/// Does not deliver anything; logs and records each call.
/// Can be switched to fail for testing the sweep's failure path.
pub struct NotificationGateway {
    sent: Mutex<Vec<SentNotification>>,
    failing: AtomicBool,
}

impl NotificationGateway {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Make subsequent sends fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Notifications recorded so far
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl Default for NotificationGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationGatewayTrait for NotificationGateway {
    async fn send(&self, subject: &str, recipients: &[String]) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err("mock notification gateway is failing".into());
        }

        tracing::info!(subject, ?recipients, "Notification recorded (mock)");

        self.sent
            .lock()
            .map_err(|e| format!("mock notification gateway poisoned: {}", e))?
            .push(SentNotification {
                subject: subject.to_string(),
                recipients: recipients.to_vec(),
            });

        Ok(())
    }
}
