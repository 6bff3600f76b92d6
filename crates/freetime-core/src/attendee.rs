//! Attendee identifier handling.

use crate::error::{AvailabilityError, AvailabilityResult};

/// Sentinel identifier for the signed-in user.
pub const ME: &str = "me";

/// Whether `id` names the signed-in user, ignoring case and surrounding
/// blanks.
pub fn is_me(id: &str) -> bool {
    id.trim().eq_ignore_ascii_case(ME)
}

/// Qualifies a bare attendee name with `default_domain`.
///
/// Identifiers that already contain `@` are returned unchanged. The `me`
/// sentinel, in any case, comes back as [`ME`].
pub fn resolve_attendee(id: &str, default_domain: Option<&str>) -> AvailabilityResult<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AvailabilityError::invalid_query("attendee identifier is empty"));
    }
    if is_me(id) {
        return Ok(ME.to_string());
    }
    if id.contains('@') {
        return Ok(id.to_string());
    }

    match default_domain.map(|d| d.trim().trim_start_matches('@')) {
        Some(domain) if !domain.is_empty() => Ok(format!("{}@{}", id, domain)),
        _ => Err(AvailabilityError::invalid_query(format!(
            "attendee '{}' has no domain and no default domain is configured",
            id
        ))),
    }
}

/// Resolves every attendee, keeping first-seen order and dropping duplicates.
pub fn resolve_attendees<'a, I>(ids: I, default_domain: Option<&str>) -> AvailabilityResult<Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut resolved: Vec<String> = Vec::new();
    for id in ids {
        let address = resolve_attendee(id, default_domain)?;
        if !resolved.iter().any(|seen| seen.eq_ignore_ascii_case(&address)) {
            resolved.push(address);
        }
    }
    if resolved.is_empty() {
        return Err(AvailabilityError::invalid_query("at least one attendee is required"));
    }
    Ok(resolved)
}

/// Splits a comma-separated attendee list, trimming blanks and duplicates.
pub fn parse_attendees(list: &str) -> Vec<String> {
    let mut attendees: Vec<String> = Vec::new();
    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !attendees.iter().any(|a| a == part) {
            attendees.push(part.to_string());
        }
    }
    attendees
}
