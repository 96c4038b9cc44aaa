// Services module - Business logic and external integrations

pub mod emails;
pub mod mailer;
pub mod password;
pub mod paystack;
pub mod tokens;
