use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::{MailConfig, SmtpConfig};

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_html(&self, to: &str, subject: &str, html: String) -> anyhow::Result<()>;
}

/// Sends through an SMTP relay (STARTTLS).
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(smtp: &SmtpConfig, from: &str) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .with_context(|| format!("smtp relay {}", smtp.host))?
            .port(smtp.port);
        if let (Some(user), Some(pass)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        let from = from
            .parse::<Mailbox>()
            .with_context(|| format!("invalid sender {:?}", from))?;
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_html(&self, to: &str, subject: &str, html: String) -> anyhow::Result<()> {
        let to = to
            .parse::<Mailbox>()
            .with_context(|| format!("invalid recipient {:?}", to))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .context("build message")?;
        self.transport.send(message).await.context("smtp send")?;
        Ok(())
    }
}

/// Development mailer: writes the mail to the log instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_html(&self, to: &str, subject: &str, html: String) -> anyhow::Result<()> {
        info!(%to, %subject, body = %html, "mail not sent (no SMTP relay configured)");
        Ok(())
    }
}

pub fn from_config(cfg: &MailConfig) -> anyhow::Result<std::sync::Arc<dyn Mailer>> {
    Ok(match &cfg.smtp {
        Some(smtp) => std::sync::Arc::new(SmtpMailer::new(smtp, &cfg.from)?),
        None => std::sync::Arc::new(LogMailer),
    })
}

pub fn reset_link(frontend_url: &str, token: &str) -> String {
    format!(
        "{}/reset-password?token={}",
        frontend_url.trim_end_matches('/'),
        token
    )
}

/// Subject and HTML body of the password reset mail.
pub fn password_reset_email(name: &str, link: &str, ttl_minutes: i64) -> (String, String) {
    let subject = "SOLVIA - Restablecer contraseña".to_string();
    let html = format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: Arial, sans-serif; color: #333;">
    <h2>Hola {name},</h2>
    <p>Recibimos una solicitud para restablecer la contraseña de tu cuenta en SOLVIA.</p>
    <p>
      <a href="{link}" style="background:#2e7d32;color:#fff;padding:10px 18px;border-radius:4px;text-decoration:none;">
        Restablecer contraseña
      </a>
    </p>
    <p>El enlace caduca en {ttl_minutes} minutos. Si no solicitaste el cambio, ignora este mensaje.</p>
    <p>Equipo SOLVIA</p>
  </body>
</html>"#,
        name = escape_html(name),
        link = link,
        ttl_minutes = ttl_minutes,
    );
    (subject, html)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
