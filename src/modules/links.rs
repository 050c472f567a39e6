// Bookmark URL normalization for typed input - pure string logic.
// No DNS lookups or network checks happen here.

use url::Url;

const ACCEPTED_SCHEMES: [&str; 6] = ["http", "https", "file", "about", "data", "ftp"];

/// Turns user input into a URL suitable for a bookmark.
///
/// 1. Implicit localhost / IP addresses get `http://`
/// 2. Input with a known scheme is kept (normalized)
/// 3. Anything that looks like a domain gets `https://`
///
/// Returns `None` when the input cannot be a URL (empty, contains spaces, ...).
pub fn normalize_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return None;
    }

    let has_scheme_separator = trimmed.contains("://");
    let is_localhost = trimmed.starts_with("localhost") || trimmed.starts_with("127.0.0.1");
    let is_ip = trimmed.parse::<std::net::IpAddr>().is_ok();

    if (is_localhost || is_ip) && !has_scheme_separator {
        if let Ok(u) = Url::parse(&format!("http://{}", trimmed)) {
            return Some(u.to_string());
        }
    }

    // "example.com" would otherwise parse with scheme "example.com"
    if let Ok(u) = Url::parse(trimmed) {
        if ACCEPTED_SCHEMES.contains(&u.scheme()) {
            return Some(u.to_string());
        }
    }

    if trimmed.contains('.') && !trimmed.ends_with('.') {
        if let Ok(u) = Url::parse(&format!("https://{}", trimmed)) {
            if u.host().is_some() {
                return Some(u.to_string());
            }
        }
    }

    None
}
