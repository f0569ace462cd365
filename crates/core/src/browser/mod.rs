//! Browser automation over the W3C WebDriver protocol.

mod driver;
mod webdriver;

pub use driver::{BrowserDriver, BrowserError, BrowserSession};
pub use webdriver::{WebDriverBrowser, WebDriverSession};
