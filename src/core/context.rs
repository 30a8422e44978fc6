use crate::models::{AgeRange, Program};

pub const RECORD_DELIMITER: &str = "\n---\n";
pub const CONTEXT_BANNER: &str = "=== IMMIGRATION PROGRAMS ===";
pub const NO_DATA_MESSAGE: &str = "No relevant information found in the database.";

/// Render retrieved programs as a context block for the answer generator
///
/// Fields a program lacks are left out entirely rather than rendered empty.
pub fn format_context(programs: &[&Program]) -> String {
    if programs.is_empty() {
        return NO_DATA_MESSAGE.to_string();
    }

    let records: Vec<String> = programs
        .iter()
        .enumerate()
        .map(|(i, program)| format_program(i + 1, program))
        .collect();

    format!("{}\n{}", CONTEXT_BANNER, records.join(RECORD_DELIMITER))
}

fn format_program(index: usize, program: &Program) -> String {
    let mut lines = vec![format!("Program {}: {}", index, program.name)];
    if !program.jurisdiction.is_empty() {
        lines.push(format!("Jurisdiction: {}", program.jurisdiction));
    }
    lines.push(format!("Category: {}", program.category));

    let reqs = &program.requirements;
    let mut requirement_lines = Vec::new();
    if let Some(age) = reqs.age.as_ref().and_then(age_line) {
        requirement_lines.push(age);
    }
    if let Some(education) = reqs.education.as_deref().filter(|e| !e.is_empty()) {
        requirement_lines.push(format!("- Education: {}", education));
    }
    if let Some(years) = reqs.experience_years.filter(|y| *y > 0.0) {
        requirement_lines.push(format!("- Experience: {} years", years));
    }
    if !requirement_lines.is_empty() {
        lines.push(String::new());
        lines.push("Requirements:".to_string());
        lines.extend(requirement_lines);
    }

    if let Some(language) = reqs.language.as_deref().filter(|l| !l.is_empty()) {
        lines.push(String::new());
        lines.push(format!("Language: {}", language));
    }

    if !program.fees.is_empty() {
        let fees: Vec<String> = program.fees.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        lines.push(String::new());
        lines.push(format!("Fees: {}", fees.join(", ")));
    }

    if let Some(time) = program.processing_time.as_deref().filter(|t| !t.is_empty()) {
        lines.push(format!("Processing Time: {}", time));
    }

    if let Some(source) = program.sources.first() {
        lines.push(String::new());
        lines.push(format!("Source: {}", source));
    }

    lines.join("\n")
}

fn age_line(age: &AgeRange) -> Option<String> {
    match (age.lower(), age.upper()) {
        (Some(min), Some(max)) => Some(format!("- Age {}-{}", min, max)),
        (Some(min), None) => Some(format!("- Age {}+", min)),
        (None, Some(max)) => Some(format!("- Age under {}", max)),
        (None, None) => None,
    }
}
