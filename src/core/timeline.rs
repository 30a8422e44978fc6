use serde::{Deserialize, Serialize};

use crate::models::{Category, Program};

const TIME_UNITS: [&str; 3] = ["day", "week", "month"];

/// One step of an application from preparation to decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineStage {
    pub step: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "estimatedTime")]
    pub estimated_time: String,
}

impl TimelineStage {
    fn new(step: &str, name: &str, description: &str, estimated_time: &str) -> Self {
        Self {
            step: step.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            estimated_time: estimated_time.to_string(),
        }
    }

    /// Stage from an extracted entry such as `("2_biometrics", "Biometrics (1-2 weeks)")`
    fn from_entry(key: &str, description: &str) -> Self {
        let step = key.split('_').next().unwrap_or(key);
        let name = description.split('(').next().unwrap_or(description).trim();
        let estimated_time = extract_duration(description).unwrap_or("Varies");
        Self::new(step, name, description, estimated_time)
    }
}

/// Processing timeline for one program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(rename = "totalTime")]
    pub total_time: String,
    pub stages: Vec<TimelineStage>,
}

impl Timeline {
    /// Extracted stages in key order, otherwise the generic stages for the category
    pub fn for_program(program: &Program) -> Self {
        let stages = if program.timeline_stages.is_empty() {
            generic_stages(program.category)
        } else {
            program
                .timeline_stages
                .iter()
                .map(|(key, description)| TimelineStage::from_entry(key, description))
                .collect()
        };

        Self {
            total_time: program
                .processing_time
                .clone()
                .unwrap_or_else(|| "Not specified".to_string()),
            stages,
        }
    }
}

/// First parenthesised span that mentions a day, week or month
fn extract_duration(description: &str) -> Option<&str> {
    let mut rest = description;
    while let Some(open) = rest.find('(') {
        let after = &rest[open + 1..];
        let close = after.find(')')?;
        let inner = &after[..close];
        let lower = inner.to_lowercase();
        if TIME_UNITS.iter().any(|unit| lower.contains(unit)) {
            return Some(inner);
        }
        rest = &after[close + 1..];
    }
    None
}

fn generic_stages(category: Category) -> Vec<TimelineStage> {
    match category {
        Category::Study => vec![
            TimelineStage::new("1", "University Admission", "Get acceptance from university", "Varies"),
            TimelineStage::new("2", "Document Collection", "Gather visa documents", "2-3 weeks"),
            TimelineStage::new("3", "Application", "Submit visa application", "1 week"),
            TimelineStage::new("4", "Interview", "Attend embassy interview", "1-2 weeks"),
            TimelineStage::new("5", "Visa Issuance", "Receive student visa", "1-2 weeks"),
        ],
        Category::Tourist => vec![
            TimelineStage::new("1", "Documentation", "Prepare required documents", "1-2 weeks"),
            TimelineStage::new("2", "Application", "Submit online/paper application", "1-3 days"),
            TimelineStage::new("3", "Processing", "Application review", "1-3 weeks"),
            TimelineStage::new("4", "Visa Issuance", "Receive visa", "3-7 days"),
        ],
        // Work stages double as the generic fallback
        _ => vec![
            TimelineStage::new("1", "Document Preparation", "Gather all required documents", "2-4 weeks"),
            TimelineStage::new("2", "Application Submission", "Submit visa application", "1-2 days"),
            TimelineStage::new("3", "Processing", "Government reviews application", "4-8 weeks"),
            TimelineStage::new("4", "Interview", "Attend visa interview (if required)", "1-2 weeks"),
            TimelineStage::new("5", "Decision", "Receive visa decision", "1-3 weeks"),
        ],
    }
}
