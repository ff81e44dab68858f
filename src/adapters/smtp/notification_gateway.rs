use crate::config::SmtpConfig;
use crate::ports::notification_gateway::{NotificationGateway as NotificationGatewayTrait, Result};
use async_trait::async_trait;
use lettre::{
    Message, SmtpTransport, Transport,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::str::FromStr;

/// NotificationGatewayのSMTP実装
///
/// 宛先ごとに1通ずつ送信する。メールアドレスとして解釈できない宛先は
/// 警告を出して読み飛ばす。1通も送れなかった場合のみエラーを返す。
#[derive(Clone)]
pub struct NotificationGateway {
    config: SmtpConfig,
    body: String,
}

impl NotificationGateway {
    pub fn new(config: SmtpConfig, body: impl Into<String>) -> Self {
        Self {
            config,
            body: body.into(),
        }
    }

    fn transport(&self) -> Result<SmtpTransport> {
        let builder = if self.config.use_tls {
            SmtpTransport::starttls_relay(&self.config.host)?
        } else {
            SmtpTransport::builder_dangerous(&self.config.host)
        }
        .port(self.config.port);

        let builder = match (&self.config.username, &self.config.password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(builder.build())
    }

    fn build_message(&self, from: &Mailbox, to: Mailbox, subject: &str) -> Result<Message> {
        Ok(Message::builder()
            .from(from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(self.body.clone())?)
    }
}

#[async_trait]
impl NotificationGatewayTrait for NotificationGateway {
    async fn send(&self, subject: &str, recipients: &[String]) -> Result<()> {
        let from = Mailbox::from_str(&self.config.from)?;

        let mut messages = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            match Mailbox::from_str(recipient) {
                Ok(to) => messages.push(self.build_message(&from, to, subject)?),
                Err(e) => tracing::warn!(recipient, error = %e, "Skipping non-email recipient"),
            }
        }

        if messages.is_empty() {
            return Err("no deliverable recipients".into());
        }

        let transport = self.transport()?;

        // SmtpTransportはブロッキングのため専用スレッドで送信する
        let delivered = tokio::task::spawn_blocking(move || {
            let mut delivered = 0usize;
            for message in &messages {
                match transport.send(message) {
                    Ok(_) => delivered += 1,
                    Err(e) => tracing::warn!(error = %e, "Failed to deliver overdue notice"),
                }
            }
            delivered
        })
        .await?;

        if delivered == 0 {
            return Err("failed to deliver any notification".into());
        }

        tracing::info!(delivered, "Notifications delivered via SMTP");
        Ok(())
    }
}
