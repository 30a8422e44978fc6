use serde::{Deserialize, Serialize};

use crate::models::{Category, Program};

const COMMON_DOCUMENTS: &[&str] = &[
    "Valid passport (minimum 6 months validity)",
    "Passport-sized photos (usually 2)",
    "Birth certificate",
    "Police clearance certificate",
];

const OPTIONAL_DOCUMENTS: &[&str] = &[
    "Previous visa copies",
    "Travel history documentation",
    "Additional financial proof",
    "Medical insurance",
    "Cover letter explaining application",
];

fn category_documents(category: Category) -> &'static [&'static str] {
    match category {
        Category::Work => &[
            "Resume/CV",
            "Educational certificates and transcripts",
            "Employment letters from previous employers",
            "Job offer letter",
            "Proof of professional qualifications",
        ],
        Category::Study => &[
            "University acceptance letter",
            "Academic transcripts",
            "Standardized test scores",
            "Proof of financial support",
            "Scholarship letters (if applicable)",
        ],
        Category::Family => &[
            "Marriage certificate (if applicable)",
            "Spouse/partner documents",
            "Children's birth certificates",
            "Relationship evidence (photos, communications)",
            "Sponsor's financial documents",
        ],
        Category::Business => &[
            "Business plan",
            "Proof of investment funds",
            "Bank statements (6-12 months)",
            "Company registration documents",
            "Financial projections",
            "Source of funds documentation",
        ],
        Category::Tourist => &[
            "Travel itinerary",
            "Hotel reservations",
            "Return flight tickets",
            "Proof of ties to home country",
            "Bank statements",
            "Employment letter",
        ],
        Category::Other => &[],
    }
}

fn recommended_documents(category: Category) -> &'static [&'static str] {
    match category {
        Category::Work => &[
            "Reference letters from supervisors",
            "Professional licenses/certifications",
            "Portfolio of work (if applicable)",
            "Salary slips from previous employment",
        ],
        Category::Study => &[
            "Statement of purpose",
            "Recommendation letters from professors",
            "Previous degree certificates",
            "English language proficiency certificate",
        ],
        Category::Business => &[
            "Tax returns (3-5 years)",
            "Property ownership documents",
            "Investment portfolio",
            "Business references",
        ],
        _ => &[],
    }
}

fn owned(documents: &[&str]) -> Vec<String> {
    documents.iter().map(|d| d.to_string()).collect()
}

/// Documents to gather for one program, grouped by necessity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChecklist {
    pub required: Vec<String>,
    pub recommended: Vec<String>,
    pub optional: Vec<String>,
}

/// Completion of the required documents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChecklistProgress {
    #[serde(rename = "totalRequired")]
    pub total_required: usize,
    pub completed: usize,
    pub remaining: usize,
    pub percentage: f64,
}

impl DocumentChecklist {
    /// Program-listed documents when present, otherwise the common set plus the category's
    pub fn for_program(program: &Program) -> Self {
        let required = if program.documents_required.is_empty() {
            COMMON_DOCUMENTS
                .iter()
                .chain(category_documents(program.category))
                .map(|d| d.to_string())
                .collect()
        } else {
            program.documents_required.clone()
        };

        Self {
            required,
            recommended: owned(recommended_documents(program.category)),
            optional: owned(OPTIONAL_DOCUMENTS),
        }
    }

    /// A required document counts as done when any completed name appears in it, ignoring case
    pub fn progress(&self, completed: &[String]) -> ChecklistProgress {
        let completed_lower: Vec<String> = completed
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();

        let done = self
            .required
            .iter()
            .filter(|doc| {
                let doc = doc.to_lowercase();
                completed_lower.iter().any(|c| doc.contains(c.as_str()))
            })
            .count();

        let total = self.required.len();
        let percentage = if total > 0 {
            (done as f64 / total as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };

        ChecklistProgress {
            total_required: total,
            completed: done,
            remaining: total - done,
            percentage,
        }
    }
}
