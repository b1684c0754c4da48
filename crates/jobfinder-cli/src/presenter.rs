use std::fmt::Write as _;

use anyhow::Result;
use jobfinder_core::Salary;
use jobfinder_pipeline::{AnnotatedJob, Presenter};

/// Prints jobs to stdout, optionally stopping after `limit` entries.
pub struct ConsolePresenter {
    limit: Option<usize>,
}

impl ConsolePresenter {
    pub fn new(limit: Option<usize>) -> Self {
        Self { limit }
    }
}

impl Presenter for ConsolePresenter {
    fn present(&self, jobs: &[AnnotatedJob]) -> Result<usize> {
        let count = self.limit.map_or(jobs.len(), |n| n.min(jobs.len()));
        if count == 0 {
            return Ok(0);
        }
        if count < jobs.len() {
            println!("Showing {count} of {} matching jobs:", jobs.len());
        } else {
            println!("Showing {count} matching jobs:");
        }
        for (index, job) in jobs[..count].iter().enumerate() {
            print!("\n{}", render_job(index + 1, job));
        }
        Ok(count)
    }
}

pub fn render_job(position: usize, annotated: &AnnotatedJob) -> String {
    let job = &annotated.job;
    let mut out = String::new();
    let _ = writeln!(out, "{position}. {}", job.title);
    let _ = writeln!(out, "  Company: {}", job.company);
    let _ = writeln!(out, "  Location: {} ({})", job.location, job.location_type);
    if let Some(range) = job.salary.as_ref().and_then(salary_range) {
        let _ = writeln!(out, "  Salary: {range}");
    }
    let _ = writeln!(out, "  Posted: {}", annotated.freshness_label);
    let _ = writeln!(out, "  Source: {}", job.source);
    let _ = writeln!(out, "  URL: {}", job.url);
    out
}

fn salary_range(salary: &Salary) -> Option<String> {
    let range = match (salary.min, salary.max) {
        (Some(min), Some(max)) if min == max => dollars(min),
        (Some(min), Some(max)) => format!("{} - {}", dollars(min), dollars(max)),
        (Some(only), None) | (None, Some(only)) => dollars(only),
        (None, None) => return None,
    };
    let suffix = if salary.is_predicted { " (predicted)" } else { "" };
    Some(format!("{range}{suffix}"))
}

fn dollars(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobfinder_core::{Job, LocationType};

    fn annotated(salary: Option<Salary>) -> AnnotatedJob {
        AnnotatedJob {
            job: Job {
                id: "adzuna-1".into(),
                title: "Engineering Manager".into(),
                company: "Acme".into(),
                description: String::new(),
                location: "Seattle, WA".into(),
                location_type: LocationType::InPerson,
                url: "https://example.com/1".into(),
                posted_date: None,
                source: "Adzuna".into(),
                salary,
                tags: Default::default(),
            },
            days_old: None,
            freshness_label: "Unknown".into(),
        }
    }

    fn salary(min: Option<f64>, max: Option<f64>, is_predicted: bool) -> Salary {
        Salary {
            min,
            max,
            currency: "USD".into(),
            is_predicted,
        }
    }

    #[test]
    fn renders_the_full_block() {
        let text = render_job(2, &annotated(Some(salary(Some(150000.0), Some(185000.0), true))));
        assert_eq!(
            text,
            "2. Engineering Manager\n  Company: Acme\n  Location: Seattle, WA (in-person)\n  \
             Salary: $150,000 - $185,000 (predicted)\n  Posted: Unknown\n  Source: Adzuna\n  \
             URL: https://example.com/1\n"
        );
    }

    #[test]
    fn equal_bounds_collapse_to_one_value() {
        let text = render_job(1, &annotated(Some(salary(Some(90000.0), Some(90000.0), false))));
        assert!(text.contains("  Salary: $90,000\n"));
    }

    #[test]
    fn one_sided_salary_shows_the_known_bound() {
        let text = render_job(1, &annotated(Some(salary(None, Some(1200.0), false))));
        assert!(text.contains("  Salary: $1,200\n"));
    }

    #[test]
    fn salary_line_is_omitted_without_amounts() {
        assert!(!render_job(1, &annotated(None)).contains("Salary"));
        assert!(!render_job(1, &annotated(Some(salary(None, None, true)))).contains("Salary"));
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(dollars(0.0), "$0");
        assert_eq!(dollars(999.0), "$999");
        assert_eq!(dollars(1000.0), "$1,000");
        assert_eq!(dollars(1234567.4), "$1,234,567");
    }
}
