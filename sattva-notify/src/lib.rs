pub mod mailer;

pub use mailer::{MailError, Mailer, SmtpConfig};
