//! # Profile Identity
//!
//! Pure mapping between human profile names and durable cache
//! identifiers, plus construction of the resolution-script URL for a
//! derived cache id.

/// Prefix of every profile-backed cache identifier.
pub const CACHE_ID_PREFIX: &str = "reskin-";

/// Suffix of every profile-backed cache identifier.
pub const CACHE_ID_SUFFIX: &str = "-cache";

/// Fixed name of the default profile.
pub const DEFAULT_PROFILE_NAME: &str = "default";

/// Derive the durable cache identifier for a profile name.
pub fn profile_to_cache_id(name: &str) -> String {
    format!("{CACHE_ID_PREFIX}{name}{CACHE_ID_SUFFIX}")
}

/// Cache identifier of the default profile.
pub fn default_cache_id() -> String {
    profile_to_cache_id(DEFAULT_PROFILE_NAME)
}

/// Recover a profile name from a cache identifier.
///
/// Strips the prefix when present at the start and the suffix when
/// present at the end, both case-insensitively. An identifier carrying
/// neither comes back trimmed but otherwise unchanged. Exact left
/// inverse of [`profile_to_cache_id`] for any name that does not itself
/// contain the prefix or suffix as a fragment.
pub fn cache_id_to_profile(id: &str) -> String {
    let trimmed = id.trim();

    let without_prefix = strip_prefix_ci(trimmed, CACHE_ID_PREFIX);
    strip_suffix_ci(without_prefix, CACHE_ID_SUFFIX).to_string()
}

/// Whether a cache identifier denotes a profile-backed cache, i.e.
/// carries both the prefix and the suffix. Identifiers that fail this
/// test belong to foreign caches and must not be reverse-mapped into
/// profiles at bootstrap.
pub fn is_profile_cache_id(id: &str) -> bool {
    let trimmed = id.trim();
    let lower = trimmed.to_ascii_lowercase();

    lower.starts_with(CACHE_ID_PREFIX)
        && lower.ends_with(CACHE_ID_SUFFIX)
        && trimmed.len() >= CACHE_ID_PREFIX.len() + CACHE_ID_SUFFIX.len()
}

/// Build the URL serving the interception script for a cache id.
///
/// Plain concatenation: the endpoint is expected to already carry its
/// query separator or trailing path separator. That is the caller's
/// contract and is not validated here.
pub fn resolution_script_url(endpoint: &str, cache_id: &str) -> String {
    format!("{endpoint}{cache_id}")
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> &'a str {
    match s.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => &s[prefix.len()..],
        _ => s,
    }
}

fn strip_suffix_ci<'a>(s: &'a str, suffix: &str) -> &'a str {
    let Some(start) = s.len().checked_sub(suffix.len()) else {
        return s;
    };

    match s.get(start..) {
        Some(tail) if tail.eq_ignore_ascii_case(suffix) => &s[..start],
        _ => s,
    }
}
