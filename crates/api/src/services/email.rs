//! Email service for order confirmations.
//!
//! Uses SMTP via lettre for delivery with Askama text and HTML templates.

use std::sync::Arc;

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use bookstore_core::OrderId;

use crate::config::EmailConfig;
use crate::models::{Order, User};

/// Subject line of every order confirmation.
pub const ORDER_CONFIRMATION_SUBJECT: &str = "Book order details";

/// HTML template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    username: &'a str,
    order_id: OrderId,
    order_date: String,
    total: Decimal,
}

/// Plain text template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    username: &'a str,
    order_id: OrderId,
    order_date: String,
    total: Decimal,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Rendered bodies of a confirmation email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: &'static str,
    pub text: String,
    pub html: String,
}

/// Render the confirmation for `order`, addressed to `user`.
///
/// # Errors
///
/// Returns `EmailError::Template` if a template fails to render.
pub fn render_order_confirmation(user: &User, order: &Order) -> Result<RenderedEmail, EmailError> {
    let order_date = order.order_date.format("%d %b %Y").to_string();
    let total = order.total_amount.round_dp(2);

    let text = OrderConfirmationText {
        username: &user.username,
        order_id: order.id,
        order_date: order_date.clone(),
        total,
    }
    .render()?;
    let html = OrderConfirmationHtml {
        username: &user.username,
        order_id: order.id,
        order_date,
        total,
    }
    .render()?;

    Ok(RenderedEmail {
        subject: ORDER_CONFIRMATION_SUBJECT,
        text,
        html,
    })
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send the confirmation for `order` to `user`.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_confirmation(
        &self,
        user: &User,
        order: &Order,
    ) -> Result<(), EmailError> {
        let rendered = render_order_confirmation(user, order)?;

        self.send_multipart_email(
            user.email.as_str(),
            rendered.subject,
            &rendered.text,
            &rendered.html,
        )
        .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Send an order confirmation in the background.
///
/// The caller's response does not wait for SMTP; failures are logged. With
/// no mailer configured the send is skipped.
pub fn spawn_order_confirmation(mailer: Option<Arc<EmailService>>, user: User, order: Order) {
    let Some(mailer) = mailer else {
        tracing::info!(
            user_id = %user.id,
            order_id = %order.id,
            "Email disabled, skipping order confirmation"
        );
        return;
    };

    tokio::spawn(async move {
        if let Err(e) = mailer.send_order_confirmation(&user, &order).await {
            tracing::error!(
                error = %e,
                user_id = %user.id,
                order_id = %order.id,
                "Failed to send order confirmation"
            );
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use bookstore_core::{DeliveryStatus, Email, MobileNumber, UserId};

    use super::*;

    fn user() -> User {
        User {
            id: UserId::new(3),
            username: "alice".to_string(),
            mobile: MobileNumber::parse("9876543210").unwrap(),
            email: Email::parse("alice@example.com").unwrap(),
            created_at: Utc::now(),
        }
    }

    fn order() -> Order {
        Order {
            id: OrderId::new(17),
            user_id: UserId::new(3),
            total_amount: Decimal::new(4597, 2),
            status: DeliveryStatus::Pending,
            order_date: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_render_order_confirmation() {
        let rendered = render_order_confirmation(&user(), &order()).unwrap();

        assert_eq!(rendered.subject, "Book order details");
        assert!(rendered.text.contains("Hi alice"));
        assert!(rendered.text.contains("Order Confirmed"));
        assert!(rendered.text.contains("Rs.45.97"));
        assert!(rendered.text.contains("#17"));
        assert!(rendered.html.contains("<strong>Rs.45.97</strong>"));
        assert!(rendered.html.contains("14 Mar 2026"));
    }

    #[test]
    fn test_html_escapes_username() {
        let mut user = user();
        user.username = "<b>eve</b>".to_string();
        let rendered = render_order_confirmation(&user, &order()).unwrap();

        assert!(!rendered.html.contains("<b>eve</b>"));
        assert!(rendered.text.contains("<b>eve</b>"));
    }
}
