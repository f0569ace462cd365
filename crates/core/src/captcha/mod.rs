//! Captcha solving: challenge submission, task polling, site-key
//! detection.

mod client;
mod detect;
mod http;
mod solver;
mod types;

pub use client::{CaptchaApi, CaptchaError};
pub use detect::find_site_key;
pub use http::HttpCaptchaClient;
pub use solver::CaptchaSolver;
pub use types::{CaptchaChallenge, TaskPoll};
