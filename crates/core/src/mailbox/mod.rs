//! Disposable-mailbox access and verification-code retrieval.

mod client;
mod http;
mod otp;
mod types;

pub use client::{MailboxClient, OtpError};
pub use http::HttpMailboxClient;
pub use otp::OtpRetriever;
pub use types::MailMessage;
