//! Registrable-domain extraction for grouping logins across subdomains.

use std::borrow::Cow;
use std::net::IpAddr;

use http::Uri;

use crate::error::{VaultError, VaultResult};

/// Extract the registrable domain (eTLD+1) from a URL-like string.
///
/// E.g., "https://mail.google.com/foo" -> "google.com"
/// E.g., "console.aws.amazon.com" -> "amazon.com"
/// E.g., "https://www.bbc.co.uk" -> "bbc.co.uk"
///
/// Inputs without a `scheme://` delimiter are parsed as `https://`.
/// IP literals and `localhost` are returned exactly as written (minus IPv6
/// brackets), never suffix-stripped or canonicalized. Ports never affect
/// the result, and domain results are always lowercase.
pub fn normalize_domain(url_like: &str) -> VaultResult<String> {
    if url_like.is_empty() {
        return Err(VaultError::InvalidInput("empty URL string".to_string()));
    }

    let candidate: Cow<'_, str> = if url_like.contains("://") {
        Cow::Borrowed(url_like)
    } else {
        Cow::Owned(format!("https://{}", url_like))
    };

    if raw_authority(&candidate).is_empty() {
        return Err(missing_hostname(url_like));
    }

    let uri: Uri = candidate.parse().map_err(|e| parse_error(url_like, e))?;
    let authority = uri.authority().ok_or_else(|| missing_hostname(url_like))?;
    check_port(authority.as_str(), url_like)?;

    // Host text as written: no IPv4 shorthand expansion, no IPv6 compression.
    let host = authority.host();
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return Err(missing_hostname(url_like));
    }

    if host.parse::<IpAddr>().is_ok() || host == "localhost" {
        return Ok(host.to_string());
    }

    let hostname = host.to_lowercase();
    match psl::domain_str(&hostname) {
        Some(domain) => Ok(domain.to_lowercase()),
        None => Err(VaultError::InvalidInput(format!(
            "no registrable domain in hostname {:?}",
            hostname
        ))),
    }
}

/// Text between `scheme://` and the first path, query or fragment delimiter.
fn raw_authority(candidate: &str) -> &str {
    let rest = candidate
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(candidate);
    rest.split(['/', '?', '#']).next().unwrap_or_default()
}

/// A port, when present, must be all digits.
fn check_port(authority: &str, url_like: &str) -> VaultResult<()> {
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    let port = match host_port.rfind(']') {
        Some(end) => host_port[end + 1..].strip_prefix(':'),
        None => host_port.split_once(':').map(|(_, port)| port),
    };

    match port {
        Some(port) if !port.bytes().all(|b| b.is_ascii_digit()) => Err(VaultError::ParseError(
            format!("failed to parse URL {:?}: invalid port {:?}", url_like, port),
        )),
        _ => Ok(()),
    }
}

fn parse_error(url_like: &str, e: impl std::fmt::Display) -> VaultError {
    VaultError::ParseError(format!("failed to parse URL {:?}: {}", url_like, e))
}

fn missing_hostname(url_like: &str) -> VaultError {
    VaultError::InvalidInput(format!("invalid URL {:?}: no hostname found", url_like))
}
