use std::sync::Arc;
use std::time::Duration;

use actix_web::rt::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::Settings;

mod smtp;
pub mod templates;

pub use smtp::SmtpMailer;

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()>;
}

pub type DynMailer = Arc<dyn Mailer>;

// used when SMTP is not configured
pub struct LogMailer;

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()> {
        warn!(to = %message.to, subject = %message.subject, "SMTP not configured, skipping email send");
        Ok(())
    }
}

pub fn create_mailer(settings: &Settings) -> anyhow::Result<DynMailer> {
    match &settings.smtp {
        Some(smtp) => Ok(Arc::new(SmtpMailer::new(smtp)?)),
        None => Ok(Arc::new(LogMailer)),
    }
}

/// Sends `message` in the background, bounded by `timeout`. The handle resolves
/// to whether the send succeeded.
pub fn dispatch(mailer: DynMailer, message: EmailMessage, timeout: Duration) -> JoinHandle<bool> {
    actix_web::rt::spawn(async move {
        let to = message.to.clone();
        let subject = message.subject.clone();
        match actix_web::rt::time::timeout(timeout, mailer.send(message)).await {
            Ok(Ok(())) => {
                info!(%to, %subject, "email sent");
                true
            }
            Ok(Err(e)) => {
                error!(%to, %subject, "failed to send email: {e:#}");
                false
            }
            Err(_) => {
                error!(%to, %subject, "email send timed out after {timeout:?}");
                false
            }
        }
    })
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<EmailMessage>>,
    }

    #[async_trait::async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: EmailMessage) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }

    pub struct FailingMailer;

    #[async_trait::async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _message: EmailMessage) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }
    }

    pub struct StalledMailer;

    #[async_trait::async_trait]
    impl Mailer for StalledMailer {
        async fn send(&self, _message: EmailMessage) -> anyhow::Result<()> {
            actix_web::rt::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }
}
