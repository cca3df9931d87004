//! URL and domain normalization used for duplicate detection.
//!
//! Normalization is best effort: input that the URL parser rejects falls back
//! to string slicing and never produces an error.

use url::Url;

/// Lower-case, trim and ensure a scheme is present.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim().to_lowercase();
    if trimmed.is_empty() || has_scheme(&trimmed) {
        trimmed
    } else {
        format!("https://{trimmed}")
    }
}

/// Comparison domain for a user-entered URL, without any leading `www.`.
pub fn extract_domain(raw: &str) -> String {
    let normalized = normalize_url(raw);
    if normalized.is_empty() {
        return normalized;
    }
    match Url::parse(&normalized) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) if !host.is_empty() => strip_www(host).to_string(),
            _ => slice_domain(&normalized),
        },
        Err(_) => slice_domain(&normalized),
    }
}

/// True when `candidate_url` points at `target_domain`, either by normalized
/// domain or by a raw substring match.
pub fn matches_domain(candidate_url: &str, target_domain: &str) -> bool {
    if target_domain.is_empty() {
        return false;
    }
    extract_domain(candidate_url) == target_domain
        || candidate_url.to_lowercase().contains(target_domain)
}

fn has_scheme(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

fn slice_domain(normalized: &str) -> String {
    let rest = normalized
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(normalized);
    let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    strip_www(host.trim()).to_string()
}
