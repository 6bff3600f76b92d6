//! Directory and calendar lookups: `me`, `people` and `events`.

use chrono::Local;

use freetime_graph::{GraphContext, Person};

use crate::error::ClientResult;
use crate::render::{OutputFormat, events_table, people_table, profile_table};
use crate::timestamp::resolve_window;

const NO_USER: &str = "No matching user found.";
const NO_PEOPLE: &str = "No people found.";
const NO_EVENTS: &str = "No events found.";

/// Profile of `address`.
pub async fn me(context: &GraphContext, address: &str, format: OutputFormat) -> ClientResult<()> {
    let output = match context.profile(address).await? {
        Some(profile) => profile_table(&profile).render(format),
        None => NO_USER.to_string(),
    };
    println!("{}", output);
    Ok(())
}

/// People related to the signed-in user, optionally narrowed to a domain.
pub async fn people(
    context: &GraphContext,
    domain: Option<&str>,
    format: OutputFormat,
) -> ClientResult<()> {
    let people = filter_by_domain(context.people("me").await?, domain);
    if people.is_empty() {
        println!("{}", NO_PEOPLE);
    } else {
        println!("{}", people_table(&people).render(format));
    }
    Ok(())
}

/// Events of `address` within the window.
pub async fn events(
    context: &GraphContext,
    address: &str,
    start: Option<&str>,
    end: Option<&str>,
    detail: bool,
    format: OutputFormat,
) -> ClientResult<()> {
    let window = resolve_window(start, end, Local::now().date_naive())?;
    let events = context.calendar_view(address, window).await?;
    if events.is_empty() {
        println!("{}", NO_EVENTS);
    } else {
        println!("{}", events_table(&events, detail).render(format));
    }
    Ok(())
}

/// Keeps people whose principal name ends with `domain`, ignoring case.
fn filter_by_domain(people: Vec<Person>, domain: Option<&str>) -> Vec<Person> {
    let Some(domain) = domain.map(str::trim).filter(|d| !d.is_empty()) else {
        return people;
    };
    let suffix = domain.to_lowercase();
    people
        .into_iter()
        .filter(|p| {
            p.user_principal_name
                .as_deref()
                .is_some_and(|upn| upn.to_lowercase().ends_with(&suffix))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: &str, upn: Option<&str>) -> Person {
        Person {
            id: id.to_string(),
            display_name: None,
            given_name: None,
            surname: None,
            user_principal_name: upn.map(str::to_string),
            company_name: None,
        }
    }

    #[test]
    fn domain_filter_matches_suffix_case_insensitively() {
        let people = vec![
            person("1", Some("alice@Example.com")),
            person("2", Some("bob@other.org")),
            person("3", None),
        ];
        let kept = filter_by_domain(people, Some("example.com"));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "1");
    }

    #[test]
    fn no_domain_keeps_everyone() {
        let people = vec![person("1", None), person("2", Some("bob@other.org"))];
        assert_eq!(filter_by_domain(people.clone(), None).len(), 2);
        assert_eq!(filter_by_domain(people, Some("  ")).len(), 2);
    }
}
