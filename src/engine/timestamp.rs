// ABOUTME: Creation-timestamp parsing for `{{.Created}}` inspect output.
// ABOUTME: Accepts docker's RFC 3339 and podman's Go default rendering.

use chrono::{DateTime, Utc};

/// Go's default `time.Time` rendering minus the trailing zone name, as
/// printed by podman: `2006-01-02 15:04:05.999999999 -0700`.
const GO_DEFAULT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f %z";

pub(crate) fn parse_created(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let value = raw.trim();

    match DateTime::parse_from_rfc3339(value) {
        Ok(parsed) => Ok(parsed.with_timezone(&Utc)),
        Err(rfc3339_err) => {
            let stripped = strip_zone_name(value);
            DateTime::parse_from_str(stripped, GO_DEFAULT_FORMAT)
                .map(|parsed| parsed.with_timezone(&Utc))
                .map_err(|_| rfc3339_err)
        }
    }
}

/// Drop a trailing alphabetic zone name such as `UTC` or `CEST`; the
/// numeric offset before it carries the actual information.
fn strip_zone_name(value: &str) -> &str {
    match value.rsplit_once(' ') {
        Some((front, zone)) if !zone.is_empty() && zone.chars().all(|c| c.is_ascii_alphabetic()) => {
            front
        }
        _ => value,
    }
}
