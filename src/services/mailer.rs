// src/services/mailer.rs
//
// Envio de e-mail transacional por HTTP. Um provedor por instalação,
// escolhido em EMAIL_PROVIDER. Corpo sempre em texto puro.

use std::{str::FromStr, sync::Arc, time::Duration};

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailProvider {
    Resend,
    SendGrid,
    MailerSend,
}

impl FromStr for EmailProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resend" => Ok(EmailProvider::Resend),
            "sendgrid" => Ok(EmailProvider::SendGrid),
            "mailersend" => Ok(EmailProvider::MailerSend),
            other => Err(format!("provedor de e-mail desconhecido: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

impl EmailMessage {
    pub fn welcome(name: &str, email: &str) -> Self {
        Self {
            to: email.to_string(),
            subject: "Bem-vindo(a) ao Back-office Fiscal".to_string(),
            text: format!(
                "Olá, {name}!\n\nSua conta foi criada. Use este e-mail ({email}) e a senha \
                 informada pelo administrador para entrar.\n"
            ),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError>;
}

/// URL e corpo JSON da chamada de cada provedor.
pub(crate) fn provider_request(provider: EmailProvider, from: &str, message: &EmailMessage) -> (&'static str, Value) {
    match provider {
        EmailProvider::Resend => (
            "https://api.resend.com/emails",
            json!({
                "from": from,
                "to": [message.to],
                "subject": message.subject,
                "text": message.text,
            }),
        ),
        EmailProvider::SendGrid => (
            "https://api.sendgrid.com/v3/mail/send",
            json!({
                "personalizations": [{ "to": [{ "email": message.to }] }],
                "from": { "email": from },
                "subject": message.subject,
                "content": [{ "type": "text/plain", "value": message.text }],
            }),
        ),
        EmailProvider::MailerSend => (
            "https://api.mailersend.com/v1/email",
            json!({
                "from": { "email": from },
                "to": [{ "email": message.to }],
                "subject": message.subject,
                "text": message.text,
            }),
        ),
    }
}

pub struct HttpMailer {
    client: reqwest::Client,
    provider: EmailProvider,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(provider: EmailProvider, api_key: String, from: String, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("falha ao criar cliente HTTP de e-mail: {e}"))?;
        Ok(Self { client, provider, api_key, from })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        let (url, body) = provider_request(self.provider, &self.from, message);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("envio de e-mail falhou: {e}"))?;

        if !response.status().is_success() {
            return Err(anyhow!("provedor de e-mail retornou {}", response.status()).into());
        }
        Ok(())
    }
}

/// Dispara o envio em segundo plano. Falhas só vão para o log.
pub fn spawn_send(mailer: Arc<dyn Mailer>, message: EmailMessage) {
    tokio::spawn(async move {
        match mailer.send(&message).await {
            Ok(()) => tracing::info!(to = %message.to, subject = %message.subject, "📧 E-mail enviado"),
            Err(e) => tracing::warn!(to = %message.to, error = %e, "Falha ao enviar e-mail"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage::welcome("Ana", "ana@empresa.com.br")
    }

    #[test]
    fn parses_provider_names() {
        assert_eq!("Resend".parse::<EmailProvider>(), Ok(EmailProvider::Resend));
        assert_eq!(" sendgrid ".parse::<EmailProvider>(), Ok(EmailProvider::SendGrid));
        assert_eq!("MAILERSEND".parse::<EmailProvider>(), Ok(EmailProvider::MailerSend));
        assert!("smtp".parse::<EmailProvider>().is_err());
    }

    #[test]
    fn resend_payload() {
        let (url, body) = provider_request(EmailProvider::Resend, "no-reply@fiscal.com.br", &message());
        assert_eq!(url, "https://api.resend.com/emails");
        assert_eq!(body["from"], "no-reply@fiscal.com.br");
        assert_eq!(body["to"][0], "ana@empresa.com.br");
        assert!(body["text"].as_str().unwrap().starts_with("Olá, Ana!"));
    }

    #[test]
    fn sendgrid_payload_uses_personalizations() {
        let (url, body) = provider_request(EmailProvider::SendGrid, "no-reply@fiscal.com.br", &message());
        assert_eq!(url, "https://api.sendgrid.com/v3/mail/send");
        assert_eq!(body["personalizations"][0]["to"][0]["email"], "ana@empresa.com.br");
        assert_eq!(body["from"]["email"], "no-reply@fiscal.com.br");
        assert_eq!(body["content"][0]["type"], "text/plain");
    }

    #[test]
    fn mailersend_payload() {
        let (url, body) = provider_request(EmailProvider::MailerSend, "no-reply@fiscal.com.br", &message());
        assert_eq!(url, "https://api.mailersend.com/v1/email");
        assert_eq!(body["to"][0]["email"], "ana@empresa.com.br");
        assert_eq!(body["subject"], "Bem-vindo(a) ao Back-office Fiscal");
    }
}
