//! Title and keyword rules.
//!
//! Every rule is a case-insensitive substring test, so "Lead" also matches "Leader".

use jobfinder_core::{Job, Preferences};

pub fn apply(jobs: Vec<Job>, prefs: &Preferences) -> Vec<Job> {
    let rules = Rules::new(prefs);
    if rules.is_unconstrained() {
        return jobs;
    }
    jobs.into_iter().filter(|job| rules.accepts(job)).collect()
}

struct Rules {
    role_levels: Vec<String>,
    exclude_roles: Vec<String>,
    include_keywords: Vec<String>,
    exclude_keywords: Vec<String>,
}

impl Rules {
    fn new(prefs: &Preferences) -> Self {
        Self {
            role_levels: lowered(&prefs.role_levels),
            exclude_roles: lowered(&prefs.exclude_roles),
            include_keywords: lowered(&prefs.keywords.include),
            exclude_keywords: lowered(&prefs.keywords.exclude),
        }
    }

    fn is_unconstrained(&self) -> bool {
        self.role_levels.is_empty()
            && self.exclude_roles.is_empty()
            && self.include_keywords.is_empty()
            && self.exclude_keywords.is_empty()
    }

    fn accepts(&self, job: &Job) -> bool {
        let title = job.title.to_lowercase();

        if !self.role_levels.is_empty() && !contains_any(&title, &self.role_levels) {
            return false;
        }
        // Exclusion wins over inclusion.
        if contains_any(&title, &self.exclude_roles) {
            return false;
        }

        if self.include_keywords.is_empty() && self.exclude_keywords.is_empty() {
            return true;
        }
        let text = format!("{} {}", job.title, job.description).to_lowercase();
        if !self.include_keywords.is_empty() && !contains_any(&text, &self.include_keywords) {
            return false;
        }
        !contains_any(&text, &self.exclude_keywords)
    }
}

fn lowered(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle.as_str()))
}
