use axum::http::HeaderMap;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

use super::Fingerprint;

pub const VIEWER_ADDRESS_HEADER: &str = "cloudfront-viewer-address";
pub const USER_AGENT_HEADER: &str = "user-agent";
pub const VIEWER_COUNTRY_HEADER: &str = "cloudfront-viewer-country";
pub const MOBILE_VIEWER_HEADER: &str = "cloudfront-is-mobile-viewer";
pub const TABLET_VIEWER_HEADER: &str = "cloudfront-is-tablet-viewer";

/// Fallback for a missing address or user agent
pub const UNKNOWN: &str = "unknown";
/// Fallback for a missing country code
pub const UNKNOWN_COUNTRY: &str = "XX";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceClass {
    /// Mobile wins over tablet when the edge sets both hints
    pub fn from_hints(is_mobile: bool, is_tablet: bool) -> Self {
        if is_mobile {
            DeviceClass::Mobile
        } else if is_tablet {
            DeviceClass::Tablet
        } else {
            DeviceClass::Desktop
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "Mobile",
            DeviceClass::Tablet => "Tablet",
            DeviceClass::Desktop => "Desktop",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the edge told us about the viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorMetadata {
    pub client_address: String,
    pub user_agent: String,
    pub country: String,
    pub device: DeviceClass,
}

impl VisitorMetadata {
    /// Extract viewer metadata from forwarded edge headers.
    ///
    /// `HeaderMap` normalises names, so lookups are case-insensitive.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let client_address = header_or(headers, VIEWER_ADDRESS_HEADER, UNKNOWN);
        let user_agent = header_or(headers, USER_AGENT_HEADER, UNKNOWN);
        let country = header_or(headers, VIEWER_COUNTRY_HEADER, UNKNOWN_COUNTRY);

        let device = DeviceClass::from_hints(
            header_flag(headers, MOBILE_VIEWER_HEADER),
            header_flag(headers, TABLET_VIEWER_HEADER),
        );

        Self {
            client_address,
            user_agent,
            country,
            device,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::derive(&self.client_address, &self.user_agent)
    }
}

/// Header value as text. Non-ASCII bytes are decoded as UTF-8, lossily, so a
/// value with accented characters is kept rather than treated as missing.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<Cow<'a, str>> {
    headers
        .get(name)
        .map(|h| String::from_utf8_lossy(h.as_bytes()))
}

fn header_or(headers: &HeaderMap, name: &str, fallback: &str) -> String {
    header_str(headers, name).map_or_else(|| fallback.to_string(), Cow::into_owned)
}

fn header_flag(headers: &HeaderMap, name: &str) -> bool {
    header_str(headers, name).is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}
