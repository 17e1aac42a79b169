use crate::config::EmailConfig;
use crate::errors::{ServiceError, ServiceResult};
use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::str::FromStr;

/// Email delivery collaborator for the account lifecycle service.
///
/// Delivery failure must propagate to the caller; it is never swallowed.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends the sign-up verification code to the recipient.
    async fn send_verification_email(
        &self,
        recipient_email: &str,
        code: &str,
    ) -> ServiceResult<()>;
}

pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new EmailService instance
    pub fn new(config: EmailConfig) -> ServiceResult<Self> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| ServiceError::validation(format!("Invalid SMTP host: {e}")))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self { mailer, config })
    }

    /// Sends a generic email
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> ServiceResult<()> {
        let from_mailbox = Mailbox::from_str(&format!(
            "{} <{}>",
            self.config.from_name, self.config.from_email
        ))
        .map_err(|e| ServiceError::validation(format!("Invalid from email: {e}")))?;

        let to_mailbox = Mailbox::from_str(to_email)
            .map_err(|e| ServiceError::validation(format!("Invalid recipient email: {e}")))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_content.to_string()),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_content.to_string()),
                    ),
            )
            .map_err(|e| ServiceError::validation(format!("Failed to build email: {e}")))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| ServiceError::upstream(format!("Failed to send email: {e}")))?;

        Ok(())
    }

    fn build_verification_html(&self, code: &str) -> String {
        format!(
            r#"
            <!DOCTYPE html>
            <html>
            <head>
                <meta charset="UTF-8">
                <title>Confirm your email address</title>
            </head>
            <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
                <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
                    <h2 style="color: #2c3e50;">Confirm your email address</h2>

                    <p>Enter the following code to finish creating your account:</p>

                    <div style="text-align: center; margin: 30px 0;">
                        <span style="font-size: 32px; letter-spacing: 8px; font-weight: bold;">
                            {}
                        </span>
                    </div>

                    <hr style="border: none; border-top: 1px solid #ecf0f1; margin: 30px 0;">

                    <p style="font-size: 12px; color: #7f8c8d;">
                        If you didn't sign up for this account, you can safely ignore this email.
                    </p>
                </div>
            </body>
            </html>
            "#,
            code
        )
    }

    fn build_verification_text(&self, code: &str) -> String {
        format!(
            r#"Confirm your email address

Enter the following code to finish creating your account:

{}

If you didn't sign up for this account, you can safely ignore this email.
            "#,
            code
        )
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send_verification_email(
        &self,
        recipient_email: &str,
        code: &str,
    ) -> ServiceResult<()> {
        let subject = "Your sign-up verification code";
        let html_content = self.build_verification_html(code);
        let text_content = self.build_verification_text(code);

        self.send_email(recipient_email, subject, &html_content, &text_content)
            .await
    }
}
