//! Site-key auto-detection.
//!
//! Registration pages expose the reCAPTCHA site key in one of three
//! places, checked in priority order: the challenge iframe `k=` URL
//! parameter, a `data-sitekey` attribute on the widget container, or a
//! `sitekey` literal in an inline script.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static IFRAME_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"recaptcha[^"'\s]*[?&]k=([A-Za-z0-9_-]+)"#)
        .expect("Failed to compile iframe site-key pattern")
});

static DATA_SITEKEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"data-sitekey\s*=\s*["']([^"']+)["']"#)
        .expect("Failed to compile data-sitekey pattern")
});

static SCRIPT_SITEKEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["']?sitekey["']?\s*:\s*["']([^"']+)["']"#)
        .expect("Failed to compile script site-key pattern")
});

/// Scan page HTML for a reCAPTCHA site key.
pub fn find_site_key(html: &str) -> Option<String> {
    for pattern in [&*IFRAME_KEY, &*DATA_SITEKEY, &*SCRIPT_SITEKEY] {
        if let Some(captures) = pattern.captures(html) {
            if let Some(key) = captures.get(1) {
                return Some(key.as_str().to_string());
            }
        }
    }
    None
}
