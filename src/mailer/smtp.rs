use anyhow::Context;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{EmailMessage, Mailer};
use crate::config::SmtpConfig;

const IMPLICIT_TLS_PORT: u16 = 465;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let from = format!("{} <{}>", config.from_name, config.username)
            .parse::<Mailbox>()
            .context("invalid from address")?;
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        // 465 speaks TLS from the first byte, anything else upgrades via STARTTLS
        let builder = if config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .context("failed to create SMTP transport")?;

        let transport = builder.port(config.port).credentials(creds).build();

        Ok(Self { transport, from })
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()> {
        let to = message
            .to
            .parse::<Mailbox>()
            .with_context(|| format!("invalid to address {}", message.to))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.body_text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.body_html),
                    ),
            )
            .context("failed to build email")?;

        self.transport.send(email).await.context("failed to send email via SMTP")?;
        Ok(())
    }
}
