//! Location-type allow-list and free-text preferred-location matching.
//!
//! Sources whose search API already constrains location are configured through
//! `location.where` upstream; leaving `location.preferred` empty then disables
//! the local text match below.

use jobfinder_core::{Job, Preferences};

/// Cities that accept a posting whose location only names King County.
const KING_COUNTY_CITIES: [&str; 6] = [
    "seattle", "bellevue", "redmond", "kirkland", "bothell", "renton",
];

pub fn apply(jobs: Vec<Job>, prefs: &Preferences) -> Vec<Job> {
    let allowed_types = prefs.location.allowed_types();
    let preferred: Vec<String> = prefs
        .location
        .preferred
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    if allowed_types.is_empty() && preferred.is_empty() {
        return jobs;
    }

    jobs.into_iter()
        .filter(|job| allowed_types.is_empty() || allowed_types.contains(&job.location_type))
        .filter(|job| preferred.is_empty() || matches_preferred(&job.location, &preferred))
        .collect()
}

fn matches_preferred(location: &str, preferred: &[String]) -> bool {
    let location = location.to_lowercase();
    if location.contains("remote") || location.contains("anywhere") {
        return true;
    }
    preferred.iter().any(|place| {
        location.contains(place.as_str())
            || (location.contains("king county") && KING_COUNTY_CITIES.contains(&place.as_str()))
    })
}
