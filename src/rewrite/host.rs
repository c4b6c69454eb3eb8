//! Host extraction and public-suffix-aware subdomain parsing.
//!
//! # Responsibilities
//! - Pick the request host (Host header, falling back to the URI authority)
//! - Normalize it (case, port, trailing dot)
//! - Split off the labels that sit below the registrable domain
//!
//! # Design Decisions
//! - Anything that is not a plain DNS name (IP literals, empty labels,
//!   stray characters) has no subdomain
//! - Only ICANN suffixes count by default; private entries such as
//!   `vercel.app` are opt-in so preview hosts on them still carry a subdomain

use std::net::IpAddr;

use axum::http::{header, HeaderMap, Uri};

/// Return the host the client addressed.
pub fn request_host<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> Option<&'a str> {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .or_else(|| uri.host())
}

/// Lowercase a host and drop its port and trailing dot.
///
/// Returns `None` for bracketed IPv6 literals and empty input.
pub fn normalize_host(raw: &str) -> Option<String> {
    let host = raw.trim();
    if host.is_empty() || host.starts_with('[') {
        return None;
    }

    let host = match host.rsplit_once(':') {
        Some((name, port)) if port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    };
    let host = host.strip_suffix('.').unwrap_or(host);

    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}

/// Return the labels of `host` below its registrable domain, or `""`.
///
/// `host` is expected to be normalized already.
pub fn subdomain(host: &str, include_private: bool) -> &str {
    if !is_dns_name(host) || host.parse::<IpAddr>().is_ok() {
        return "";
    }

    match registrable_domain(host, include_private) {
        Some(domain) if domain.len() < host.len() => &host[..host.len() - domain.len() - 1],
        _ => "",
    }
}

/// The public suffix plus one label, e.g. `example.co.uk` for `a.example.co.uk`.
pub fn registrable_domain(host: &str, include_private: bool) -> Option<&str> {
    let suffix = public_suffix(host, include_private)?;
    if suffix.len() >= host.len() {
        return None;
    }

    let rest = &host[..host.len() - suffix.len() - 1];
    let start = rest.rfind('.').map_or(0, |i| i + 1);
    Some(&host[start..])
}

fn public_suffix(host: &str, include_private: bool) -> Option<&str> {
    let mut name = host;
    loop {
        let suffix = psl::suffix(name.as_bytes())?;
        let matched = &name[name.len() - suffix.as_bytes().len()..];
        if include_private || suffix.typ() != Some(psl::Type::Private) {
            return Some(matched);
        }
        // A private entry always sits on top of an ICANN one; look beneath it.
        match matched.split_once('.') {
            Some((_, parent)) => name = parent,
            None => return Some(matched),
        }
    }
}

fn is_dns_name(host: &str) -> bool {
    !host.is_empty()
        && host.split('.').all(|label| {
            !label.is_empty()
                && label
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
        })
}
