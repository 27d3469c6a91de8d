//! Denylist for files that must never leave the machine.
//!
//! The check runs on every path component, so a directory named `secrets`
//! takes its whole subtree with it.

use glob::{MatchOptions, Pattern};
use lazy_static::lazy_static;

const SENSITIVE_GLOBS: &[&str] = &[
    ".env",
    ".env.*",
    "*.env",
    "*.pem",
    "*.key",
    "*.crt",
    "*.cer",
    "*.cert",
    "*.p12",
    "*.pfx",
    "*.jks",
    "*.keystore",
    "*.kdbx",
    "*id_rsa*",
    "*id_dsa*",
    "*id_ecdsa*",
    "*id_ed25519*",
    "*secret*",
    "*password*",
    "*credential*",
    ".netrc",
    ".pgpass",
    ".htpasswd",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

lazy_static! {
    static ref SENSITIVE_PATTERNS: Vec<Pattern> = SENSITIVE_GLOBS
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect();
}

/// True if any component of the repo-relative `path` looks like a secret.
pub fn is_sensitive(path: &str) -> bool {
    path.split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .any(is_sensitive_name)
}

/// True if a single file or directory name looks like a secret.
pub fn is_sensitive_name(name: &str) -> bool {
    SENSITIVE_PATTERNS
        .iter()
        .any(|p| p.matches_with(name, MATCH_OPTIONS))
}
