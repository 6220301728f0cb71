//! Video-meeting link detection.
//!
//! Looks at an event's URL field first, then its notes, then its location, and
//! returns the first link that belongs to a known meeting provider.

use std::fmt;
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use url::Url;

/// Hosts accepted straight from an event's URL field.
const MEETING_DOMAINS: [&str; 4] = [
    "zoom.us",
    "meet.google.com",
    "teams.microsoft.com",
    "webex.com",
];

/// Free-text patterns, tried in this order.
const LINK_PATTERNS: [&str; 4] = [
    r"https://\S*zoom\.us/\S*",
    r"https://meet\.google\.com/\S*",
    r"https://teams\.microsoft\.com/\S*",
    r"https://\S*webex\.com/\S*",
];

const ENCLOSING_CHARS: &[char] = &['<', '>', '"', '\''];

/// Meeting provider, derived from the link's host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Zoom,
    Meet,
    Teams,
    Webex,
    Generic,
}

impl Provider {
    pub fn from_host(host: &str) -> Self {
        let host = host.to_ascii_lowercase();
        if host.contains("zoom") {
            Provider::Zoom
        } else if host.contains("meet.google") {
            Provider::Meet
        } else if host.contains("teams") {
            Provider::Teams
        } else if host.contains("webex") {
            Provider::Webex
        } else {
            Provider::Generic
        }
    }

    /// Short label for the join button.
    pub fn label(&self) -> &'static str {
        match self {
            Provider::Zoom => "Zoom",
            Provider::Meet => "Meet",
            Provider::Teams => "Teams",
            Provider::Webex => "Webex",
            Provider::Generic => "Meeting",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A joinable meeting URL and who hosts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingLink {
    pub url: Url,
    pub provider: Provider,
}

impl MeetingLink {
    fn from_url(url: Url) -> Self {
        let provider = Provider::from_host(url.host_str().unwrap_or_default());
        Self { url, provider }
    }

    pub fn label(&self) -> &'static str {
        self.provider.label()
    }
}

fn link_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        LINK_PATTERNS
            .iter()
            .filter_map(|source| {
                RegexBuilder::new(source)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| tracing::error!("Invalid meeting link pattern {}: {}", source, e))
                    .ok()
            })
            .collect()
    })
}

/// Whether a URL points at one of the known meeting providers.
pub fn is_meeting_url(url: &Url) -> bool {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    MEETING_DOMAINS.iter().any(|domain| host.contains(domain))
}

/// Find the first provider link in free text.
///
/// Providers are tried in a fixed order (Zoom, Meet, Teams, Webex); within a
/// provider only the first match is considered.
pub fn extract_from_text(text: &str) -> Option<MeetingLink> {
    link_patterns().iter().find_map(|pattern| {
        let found = pattern.find(text)?;
        let candidate = found.as_str().trim_matches(ENCLOSING_CHARS);
        Url::parse(candidate).ok().map(MeetingLink::from_url)
    })
}

/// Resolve the meeting link for an event's URL, notes and location, in that order.
pub fn meeting_link(
    url: Option<&Url>,
    notes: Option<&str>,
    location: Option<&str>,
) -> Option<MeetingLink> {
    if let Some(url) = url.filter(|url| is_meeting_url(url)) {
        return Some(MeetingLink::from_url(url.clone()));
    }

    notes
        .and_then(extract_from_text)
        .or_else(|| location.and_then(extract_from_text))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_zoom_link_in_notes() {
        let link = meeting_link(None, Some("Join: https://zoom.us/j/12345 details"), None).unwrap();
        assert_eq!(link.url.as_str(), "https://zoom.us/j/12345");
        assert_eq!(link.label(), "Zoom");
    }

    #[test]
    fn test_teams_link_in_location() {
        let location = "Online https://teams.microsoft.com/l/meetup-join/19%3ameeting_abc";
        let link = meeting_link(None, None, Some(location)).unwrap();
        assert_eq!(link.provider, Provider::Teams);
        assert!(link.url.as_str().starts_with("https://teams.microsoft.com/l/meetup-join/"));
    }

    #[test]
    fn test_nothing_to_find() {
        assert!(meeting_link(None, None, None).is_none());
        assert!(meeting_link(
            Some(&url("https://example.com/agenda")),
            Some("Bring snacks"),
            Some("Room 4B"),
        )
        .is_none());
    }

    #[test]
    fn test_vanity_zoom_host_from_url_field() {
        let link = meeting_link(Some(&url("https://us02web.zoom.us/j/999")), None, None).unwrap();
        assert_eq!(link.provider, Provider::Zoom);
        assert_eq!(link.url.host_str(), Some("us02web.zoom.us"));
    }

    #[test]
    fn test_url_field_wins_over_notes() {
        let link = meeting_link(
            Some(&url("https://meet.google.com/abc-defg-hij")),
            Some("https://zoom.us/j/1"),
            None,
        )
        .unwrap();
        assert_eq!(link.provider, Provider::Meet);
    }

    #[test]
    fn test_non_meeting_url_field_falls_through_to_notes() {
        let link = meeting_link(
            Some(&url("https://docs.example.com/agenda")),
            Some("dial in at https://acme.webex.com/meet/pr123"),
            None,
        )
        .unwrap();
        assert_eq!(link.provider, Provider::Webex);
        assert_eq!(link.url.as_str(), "https://acme.webex.com/meet/pr123");
    }

    #[test]
    fn test_notes_win_over_location() {
        let link = meeting_link(
            None,
            Some("https://meet.google.com/xyz-abcd-efg"),
            Some("https://zoom.us/j/42"),
        )
        .unwrap();
        assert_eq!(link.provider, Provider::Meet);
    }

    #[test]
    fn test_provider_order_beats_text_position() {
        // Meet appears first in the text, but Zoom is tried first.
        let notes = "Backup: https://meet.google.com/aaa-bbbb-ccc main: https://zoom.us/j/777";
        let link = extract_from_text(notes).unwrap();
        assert_eq!(link.provider, Provider::Zoom);
        assert_eq!(link.url.as_str(), "https://zoom.us/j/777");
    }

    #[test]
    fn test_strips_enclosing_brackets_and_quotes() {
        let link = extract_from_text("Link: <https://zoom.us/j/555>").unwrap();
        assert_eq!(link.url.as_str(), "https://zoom.us/j/555");

        let link = extract_from_text("href='https://meet.google.com/q-r-s'").unwrap();
        assert_eq!(link.url.as_str(), "https://meet.google.com/q-r-s");
    }

    #[test]
    fn test_case_insensitive() {
        let link = extract_from_text("JOIN HTTPS://ZOOM.US/J/12").unwrap();
        assert_eq!(link.provider, Provider::Zoom);

        let link = meeting_link(Some(&url("https://Teams.Microsoft.com/l/x")), None, None).unwrap();
        assert_eq!(link.provider, Provider::Teams);
    }

    #[test]
    fn test_plain_http_in_text_is_ignored() {
        assert!(extract_from_text("http://zoom.us/j/1").is_none());
    }

    #[test]
    fn test_provider_labels() {
        assert_eq!(Provider::from_host("acme.zoom.us"), Provider::Zoom);
        assert_eq!(Provider::from_host("meet.google.com"), Provider::Meet);
        assert_eq!(Provider::from_host("teams.microsoft.com"), Provider::Teams);
        assert_eq!(Provider::from_host("company.webex.com"), Provider::Webex);
        assert_eq!(Provider::from_host("video.example.com"), Provider::Generic);
        assert_eq!(Provider::Generic.to_string(), "Meeting");
    }

    #[test]
    fn test_generic_label_without_provider_keyword() {
        let link = MeetingLink::from_url(url("https://example.org/room"));
        assert_eq!(link.label(), "Meeting");
    }

    #[test]
    fn test_malformed_text_is_total() {
        assert!(extract_from_text("").is_none());
        assert!(extract_from_text("https://").is_none());
        assert!(extract_from_text("https://zoom.us/").is_some());
        assert!(extract_from_text("\u{0}\u{fffd} https://meet.google.com").is_none());
    }
}
