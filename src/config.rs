use std::env;
use std::time::Duration;

use anyhow::Context;

#[derive(Debug, Clone, PartialEq)]
pub struct PayuConfig {
    pub merchant_key: String,
    pub merchant_salt: String,
    pub test_env: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_name: String,
}

/// Process settings, read once from the environment (and `.env`) at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bind_address: String,
    pub database_url: String,
    pub public_base_url: String,
    pub payu: PayuConfig,
    pub smtp: Option<SmtpConfig>,
    pub mail_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} must be set"));
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let payu = PayuConfig {
            merchant_key: optional("PAYU_MERCHANT_KEY").unwrap_or_default(),
            merchant_salt: optional("PAYU_MERCHANT_SALT").unwrap_or_default(),
            test_env: optional("PAYU_TEST_ENV").map_or(true, |v| v.eq_ignore_ascii_case("true")),
        };

        // smtp is all-or-nothing: without host and credentials mail is only logged
        let smtp = match (optional("SMTP_HOST"), optional("SMTP_USER"), optional("SMTP_PASSWORD")) {
            (Some(host), Some(username), Some(password)) => Some(SmtpConfig {
                host,
                port: optional("SMTP_PORT")
                    .map(|v| v.parse::<u16>())
                    .transpose()
                    .context("SMTP_PORT must be a port number")?
                    .unwrap_or(465),
                username,
                password,
                from_name: optional("MAIL_FROM_NAME").unwrap_or_else(|| "LUMINA".to_string()),
            }),
            _ => None,
        };

        let mail_timeout = optional("MAIL_TIMEOUT_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("MAIL_TIMEOUT_SECS must be a number of seconds")?
            .unwrap_or(10);

        Ok(Settings {
            bind_address: required("BIND_ADDRESS")?,
            database_url: required("DATABASE_URL")?,
            public_base_url: optional("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            payu,
            smtp,
            mail_timeout: Duration::from_secs(mail_timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://localhost/ledger"),
        ]))
        .unwrap();
        assert_eq!(settings.bind_address, "127.0.0.1:8080");
        assert!(settings.payu.test_env);
        assert!(settings.payu.merchant_salt.is_empty());
        assert_eq!(settings.smtp, None);
        assert_eq!(settings.mail_timeout, Duration::from_secs(10));
        assert_eq!(settings.public_base_url, "http://localhost:3000");
    }

    #[test]
    fn test_full_settings() {
        let settings = Settings::from_lookup(lookup(&[
            ("BIND_ADDRESS", "0.0.0.0:80"),
            ("DATABASE_URL", "postgres://db/ledger"),
            ("PUBLIC_BASE_URL", "https://learn.example.com/"),
            ("PAYU_MERCHANT_KEY", "key"),
            ("PAYU_MERCHANT_SALT", "salt"),
            ("PAYU_TEST_ENV", "false"),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "mailer"),
            ("SMTP_PASSWORD", "secret"),
            ("SMTP_PORT", "587"),
            ("MAIL_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert!(!settings.payu.test_env);
        assert_eq!(settings.public_base_url, "https://learn.example.com");
        let smtp = settings.smtp.unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.from_name, "LUMINA");
        assert_eq!(settings.mail_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_missing_required() {
        let err = Settings::from_lookup(lookup(&[("BIND_ADDRESS", "127.0.0.1:8080")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"), "{err}");

        let err = Settings::from_lookup(lookup(&[
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://db/ledger"),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "mailer"),
            ("SMTP_PASSWORD", "secret"),
            ("SMTP_PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SMTP_PORT"), "{err}");
    }
}
