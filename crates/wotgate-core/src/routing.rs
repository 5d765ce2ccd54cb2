//! Route URI helpers.
//!
//! Gateway routes are served under `/gateway/{uri}` where `uri` is a single
//! path segment derived from the Thing title and interaction. These helpers
//! centralise the naming so the registry, API and offerings agree.

/// Path prefix under which routes are served
pub const GATEWAY_PATH_PREFIX: &str = "/gateway";

/// Keep only URL-unreserved characters (`A-Z a-z 0-9 - _ . ~`).
///
/// ```
/// # use wotgate_core::routing::sanitize_segment;
/// assert_eq!(sanitize_segment("Lamp #1/Read-on"), "Lamp1Read-on");
/// ```
pub fn sanitize_segment(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
        .collect()
}

/// Build a route URI: `{thing}-{mode}{interaction}`, sanitized.
///
/// `mode` is `"Read-"`, `"Write-"` or empty for actions.
///
/// ```
/// # use wotgate_core::routing::route_uri;
/// assert_eq!(route_uri("Weather Station", "Read-", "temperature"), "WeatherStation-Read-temperature");
/// assert_eq!(route_uri("Lamp", "", "toggle"), "Lamp-toggle");
/// ```
pub fn route_uri(thing_title: &str, mode: &str, interaction: &str) -> String {
    sanitize_segment(&format!("{}-{}{}", thing_title, mode, interaction))
}

/// Public URL of a route below `public_url`
pub fn route_url(public_url: &str, uri: &str) -> String {
    format!(
        "{}{}/{}",
        public_url.trim_end_matches('/'),
        GATEWAY_PATH_PREFIX,
        uri
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_unsafe_characters() {
        assert_eq!(sanitize_segment("a b?c&d=e/f%g"), "abcdefg");
    }

    #[test]
    fn sanitize_keeps_unreserved() {
        assert_eq!(sanitize_segment("A-z_0.9~"), "A-z_0.9~");
    }

    #[test]
    fn sanitize_drops_non_ascii() {
        assert_eq!(sanitize_segment("Température"), "Temprature");
    }

    #[test]
    fn route_uri_write_mode() {
        assert_eq!(route_uri("Lamp 2", "Write-", "level"), "Lamp2-Write-level");
    }

    #[test]
    fn route_url_trims_trailing_slash() {
        assert_eq!(
            route_url("http://localhost:8080/", "Lamp-toggle"),
            "http://localhost:8080/gateway/Lamp-toggle"
        );
    }
}
