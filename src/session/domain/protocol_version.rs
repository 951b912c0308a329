//! Protocol revision negotiation.

/// Protocol revisions this server understands, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

/// Revision offered when the client requests an unsupported one.
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

/// Echoes a supported `requested` revision, otherwise offers the latest.
///
/// # Examples
///
/// ```
/// use parley::session::domain::negotiate_protocol_version;
///
/// assert_eq!(negotiate_protocol_version("2024-11-05"), "2024-11-05");
/// assert_eq!(negotiate_protocol_version("1999-01-01"), "2025-06-18");
/// ```
#[must_use]
pub fn negotiate_protocol_version(requested: &str) -> &'static str {
    SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .copied()
        .find(|supported| *supported == requested)
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}
