use anyhow::anyhow;
use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{debug, instrument};

use crate::config::email::EmailConfig;
use crate::metrics;
use crate::utils::errors::AppError;

pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    #[instrument(skip(self))]
    pub async fn send_password_reset_email(
        &self,
        to_email: &str,
        to_name: &str,
        reset_token: &str,
    ) -> Result<(), AppError> {
        let reset_link = format!(
            "{}/reset-password?token={}",
            self.config.frontend_url, reset_token
        );

        let html_body = self.layout(
            "Password Reset Request",
            &format!(
                r#"<p style="margin: 0 0 20px 0; color: #666666; font-size: 16px; line-height: 1.5;">
                    Hi <strong>{}</strong>,
                </p>
                <p style="margin: 0 0 20px 0; color: #666666; font-size: 16px; line-height: 1.5;">
                    We received a request to reset your password. Click the button below to create a new one:
                </p>
                <table width="100%" cellpadding="0" cellspacing="0" style="margin: 30px 0;">
                    <tr>
                        <td align="center">
                            <a href="{}" style="display: inline-block; padding: 14px 40px; background-color: #0D9488; color: #ffffff; text-decoration: none; border-radius: 6px; font-size: 16px; font-weight: bold;">Reset Password</a>
                        </td>
                    </tr>
                </table>
                <p style="margin: 0 0 20px 0; color: #666666; font-size: 14px; line-height: 1.5;">
                    <strong>This link will expire in 1 hour.</strong>
                </p>
                <p style="margin: 0; color: #666666; font-size: 14px; line-height: 1.5;">
                    If you didn't request this password reset, you can ignore this email.
                </p>"#,
                to_name, reset_link
            ),
        );
        let text_body = format!(
            "Hi {},\n\n\
             You requested to reset your password.\n\n\
             Click the link below to reset it:\n\
             {}\n\n\
             This link will expire in 1 hour.\n\n\
             If you didn't request this, please ignore this email.\n\n\
             The LunchLit Team",
            to_name, reset_link
        );

        self.send_email(
            "password_reset",
            to_email,
            "Password Reset Request",
            &text_body,
            &html_body,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn send_password_reset_confirmation(
        &self,
        to_email: &str,
        to_name: &str,
    ) -> Result<(), AppError> {
        let html_body = self.layout(
            "Password Reset Successful",
            &format!(
                r#"<p style="margin: 0 0 20px 0; color: #666666; font-size: 16px; line-height: 1.5;">
                    Hi <strong>{}</strong>,
                </p>
                <p style="margin: 0 0 20px 0; color: #666666; font-size: 16px; line-height: 1.5;">
                    Your password has been successfully reset. You can now log in with your new password.
                </p>
                <div style="background-color: #FEF3C7; border-left: 4px solid #F59E0B; padding: 15px; margin: 20px 0;">
                    <p style="margin: 0; color: #92400E; font-size: 14px; line-height: 1.5;">
                        <strong>Security Notice:</strong> If you didn't make this change, please contact support immediately.
                    </p>
                </div>"#,
                to_name
            ),
        );
        let text_body = format!(
            "Hi {},\n\n\
             Your password has been successfully reset.\n\n\
             If you didn't make this change, please contact support immediately.\n\n\
             The LunchLit Team",
            to_name
        );

        self.send_email(
            "password_reset_confirmation",
            to_email,
            "Password Reset Successful",
            &text_body,
            &html_body,
        )
        .await
    }

    /// Sent when a role is assigned to or removed from an account.
    #[instrument(skip(self))]
    pub async fn send_role_change_email(
        &self,
        to_email: &str,
        to_name: &str,
        role_name: &str,
        assigned: bool,
    ) -> Result<(), AppError> {
        let (subject, line) = if assigned {
            (
                "Your Role Has Been Updated",
                format!("You have been given the <strong>{}</strong> role.", role_name),
            )
        } else {
            (
                "Your Role Has Been Updated",
                format!("The <strong>{}</strong> role has been removed from your account.", role_name),
            )
        };

        let html_body = self.layout(
            subject,
            &format!(
                r#"<p style="margin: 0 0 20px 0; color: #666666; font-size: 16px; line-height: 1.5;">
                    Hi <strong>{}</strong>,
                </p>
                <p style="margin: 0 0 20px 0; color: #666666; font-size: 16px; line-height: 1.5;">
                    {}
                </p>
                <p style="margin: 0; color: #666666; font-size: 14px; line-height: 1.5;">
                    Any new permissions take effect the next time you sign in.
                </p>"#,
                to_name, line
            ),
        );
        let text_body = format!(
            "Hi {},\n\n\
             {}\n\n\
             Any new permissions take effect the next time you sign in.\n\n\
             The LunchLit Team",
            to_name,
            if assigned {
                format!("You have been given the {} role.", role_name)
            } else {
                format!("The {} role has been removed from your account.", role_name)
            }
        );

        self.send_email("role_change", to_email, subject, &text_body, &html_body)
            .await
    }

    /// Sent after the yearly grade progression moves a student up.
    #[instrument(skip(self))]
    pub async fn send_grade_progression_email(
        &self,
        to_email: &str,
        to_name: &str,
        new_grade: &str,
    ) -> Result<(), AppError> {
        let subject = format!("Welcome to {} Year!", new_grade);

        let html_body = self.layout(
            &subject,
            &format!(
                r#"<p style="margin: 0 0 20px 0; color: #666666; font-size: 16px; line-height: 1.5;">
                    Hi <strong>{}</strong>,
                </p>
                <p style="margin: 0 0 20px 0; color: #666666; font-size: 16px; line-height: 1.5;">
                    A new school year has started and your profile now shows you as a <strong>{}</strong>.
                </p>
                <p style="margin: 0; color: #666666; font-size: 14px; line-height: 1.5;">
                    If this doesn't look right, you can correct your grade from your profile settings.
                </p>"#,
                to_name, new_grade
            ),
        );
        let text_body = format!(
            "Hi {},\n\n\
             A new school year has started and your profile now shows you as a {}.\n\n\
             If this doesn't look right, you can correct your grade from your profile settings.\n\n\
             The LunchLit Team",
            to_name, new_grade
        );

        self.send_email("grade_progression", to_email, &subject, &text_body, &html_body)
            .await
    }

    /// Sent when an admin moves a feedback item to a new status.
    #[instrument(skip(self))]
    pub async fn send_feedback_status_email(
        &self,
        to_email: &str,
        to_name: &str,
        feedback_title: &str,
        status: &str,
    ) -> Result<(), AppError> {
        let html_body = self.layout(
            "Update on Your Feedback",
            &format!(
                r#"<p style="margin: 0 0 20px 0; color: #666666; font-size: 16px; line-height: 1.5;">
                    Hi <strong>{}</strong>,
                </p>
                <p style="margin: 0 0 20px 0; color: #666666; font-size: 16px; line-height: 1.5;">
                    Your feedback <strong>&ldquo;{}&rdquo;</strong> is now marked as <strong>{}</strong>.
                </p>
                <p style="margin: 0; color: #666666; font-size: 14px; line-height: 1.5;">
                    Thanks for helping us make LunchLit better.
                </p>"#,
                to_name, feedback_title, status
            ),
        );
        let text_body = format!(
            "Hi {},\n\n\
             Your feedback \"{}\" is now marked as {}.\n\n\
             Thanks for helping us make LunchLit better.\n\n\
             The LunchLit Team",
            to_name, feedback_title, status
        );

        self.send_email(
            "feedback_status",
            to_email,
            "Update on Your Feedback",
            &text_body,
            &html_body,
        )
        .await
    }

    #[instrument(skip(self, html_body, text_body))]
    async fn send_email(
        &self,
        template: &str,
        to_email: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        if !self.config.enabled {
            debug!(to = %to_email, subject = %subject, "Email sending disabled, skipping");
            return Ok(());
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| AppError::internal(anyhow!("Invalid from email: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| AppError::internal(anyhow!("Invalid to email: {}", e)))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::internal(anyhow!("Failed to build email: {}", e)))?;

        let mailer = if self.config.smtp_username.is_empty() {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            );

            SmtpTransport::relay(&self.config.smtp_host)
                .map_err(|e| AppError::internal(anyhow!("Failed to create SMTP relay: {}", e)))?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build()
        };

        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::internal(anyhow!("Task join error: {}", e)))?
            .map_err(|e| AppError::internal(anyhow!("Failed to send email: {}", e)));

        metrics::track_email_sent(template, result.is_ok());

        result.map(|_| ())
    }

    /// Wraps email body HTML in the shared LunchLit frame.
    fn layout(&self, heading: &str, body: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{heading}</title>
</head>
<body style="margin: 0; padding: 0; font-family: Arial, sans-serif; background-color: #f4f4f4;">
    <table width="100%" cellpadding="0" cellspacing="0" style="background-color: #f4f4f4; padding: 20px;">
        <tr>
            <td align="center">
                <table width="600" cellpadding="0" cellspacing="0" style="background-color: #ffffff; border-radius: 8px; overflow: hidden; box-shadow: 0 2px 4px rgba(0,0,0,0.1);">
                    <tr>
                        <td style="background-color: #0D9488; padding: 30px; text-align: center;">
                            <h1 style="margin: 0; color: #ffffff; font-size: 28px;">LunchLit</h1>
                        </td>
                    </tr>
                    <tr>
                        <td style="padding: 40px 30px;">
                            <h2 style="margin: 0 0 20px 0; color: #333333; font-size: 24px;">{heading}</h2>
                            {body}
                        </td>
                    </tr>
                    <tr>
                        <td style="background-color: #f8f9fa; padding: 20px 30px; text-align: center; border-top: 1px solid #e9ecef;">
                            <p style="margin: 0; color: #999999; font-size: 12px;">
                                This is an automated email from LunchLit. Please do not reply.
                            </p>
                        </td>
                    </tr>
                </table>
            </td>
        </tr>
    </table>
</body>
</html>"#
        )
    }
}
