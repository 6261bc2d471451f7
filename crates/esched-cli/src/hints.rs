use esched_core::Planner;
use strsim::jaro_winkler;

const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Closest known name to `input`, if any is similar enough to be a likely typo.
pub fn closest_name<'a>(input: &str, known: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let needle = input.trim().to_lowercase();
    let mut best: Option<(f64, &str)> = None;

    for candidate in known {
        let score = jaro_winkler(&needle, &candidate.to_lowercase());
        if score < SIMILARITY_THRESHOLD {
            continue;
        }
        match best {
            Some((best_score, _)) if score <= best_score => {}
            _ => best = Some((score, candidate)),
        }
    }

    best.map(|(_, name)| name)
}

/// Canonical cohort names for user input, or an error naming the likely intended cohort.
pub fn resolve_cohorts(planner: &Planner, names: &[String]) -> Result<Vec<String>, String> {
    names
        .iter()
        .map(|name| match planner.cohort(name) {
            Some(cohort) => Ok(cohort.name().to_string()),
            None => Err(unknown_cohort(planner, name)),
        })
        .collect()
}

fn unknown_cohort(planner: &Planner, name: &str) -> String {
    let known = planner.cohorts().iter().map(|cohort| cohort.name());
    if let Some(hint) = closest_name(name, known) {
        return format!("Unknown cohort '{name}'. Did you mean '{hint}'?");
    }

    let all: Vec<&str> = planner.cohorts().iter().map(|cohort| cohort.name()).collect();
    if all.is_empty() {
        format!("Unknown cohort '{name}'. The plan defines no cohorts.")
    } else {
        format!("Unknown cohort '{name}'. Known cohorts: {}.", all.join(", "))
    }
}
