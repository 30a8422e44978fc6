use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Category, CostRange, Program};

/// One parsed line of a program's fee schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostItem {
    pub name: String,
    pub description: String,
    pub cost: String,
    pub min: f64,
    pub max: f64,
    pub optional: bool,
}

/// Expense outside the government fees that applicants usually incur
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalCost {
    pub item: String,
    pub cost: String,
}

/// Per-fee breakdown with the mandatory total and category extras
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub items: Vec<CostItem>,
    /// Sum of the non-optional items; `None` if none parsed
    pub total: Option<CostRange>,
    #[serde(rename = "additionalCosts")]
    pub additional_costs: Vec<AdditionalCost>,
}

/// Parse a free-text fee such as `"$4,115"` or `"CAD 1,365 - 1,525"`
///
/// Returns `None` for `Varies`, `N/A` and strings without any number.
pub fn parse_cost(text: &str) -> Option<CostRange> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("varies") || trimmed.eq_ignore_ascii_case("n/a") {
        return None;
    }

    let cleaned = trimmed.replace(',', "");
    let numbers: Vec<f64> = extract_numbers(&cleaned);

    let min = numbers.iter().copied().reduce(f64::min)?;
    let max = numbers.iter().copied().reduce(f64::max)?;
    Some(CostRange { min, max })
}

/// Sum of every parseable fee in a schedule; `None` if nothing parsed
pub fn estimate_total(fees: &BTreeMap<String, String>) -> Option<CostRange> {
    let mut parsed = fees.values().filter_map(|v| parse_cost(v)).peekable();
    parsed.peek()?;

    Some(parsed.fold(CostRange { min: 0.0, max: 0.0 }, |acc, c| CostRange {
        min: acc.min + c.min,
        max: acc.max + c.max,
    }))
}

/// Break a program's fees into priced items
///
/// Fees marked "optional" are listed only with `include_optional` and never count
/// toward the total. Unparseable fees are left out.
pub fn calculate_costs(program: &Program, include_optional: bool) -> CostBreakdown {
    let mut items = Vec::new();
    let mut total: Option<CostRange> = None;

    for (name, cost) in &program.fees {
        let optional = cost.to_lowercase().contains("optional");
        if optional && !include_optional {
            continue;
        }
        let Some(range) = parse_cost(cost) else {
            continue;
        };

        if !optional {
            let acc = total.unwrap_or(CostRange { min: 0.0, max: 0.0 });
            total = Some(CostRange {
                min: acc.min + range.min,
                max: acc.max + range.max,
            });
        }
        items.push(CostItem {
            name: name.clone(),
            description: display_name(name),
            cost: cost.clone(),
            min: range.min,
            max: range.max,
            optional,
        });
    }

    CostBreakdown {
        items,
        total,
        additional_costs: additional_costs(program.category),
    }
}

/// `"biometrics_fee"` -> `"Biometrics Fee"`
fn display_name(name: &str) -> String {
    name.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn additional_costs(category: Category) -> Vec<AdditionalCost> {
    let items: &[(&str, &str)] = match category {
        Category::Study => &[
            ("Credential evaluation", "$100-$300"),
            ("English test (TOEFL/IELTS)", "$200-$300"),
            ("Medical exam", "$100-$300"),
            ("Travel to interview", "Varies"),
            ("Document copies/notarization", "$20-$100"),
        ],
        Category::Business => &[
            ("Business consultant fees", "$2000-$10000"),
            ("Accountant fees", "$1000-$5000"),
            ("Document notarization", "$100-$500"),
            ("Translation services", "$200-$1000"),
        ],
        Category::Tourist => &[
            ("Travel insurance", "$50-$200"),
            ("Document copies", "$10-$30"),
            ("Courier fees", "$20-$40"),
        ],
        _ => &[
            ("Document translations", "$50-$200 per document"),
            ("Police clearance", "$20-$100"),
            ("Medical examination", "$100-$500"),
            ("Courier/shipping fees", "$20-$50"),
            ("Photos", "$10-$30"),
        ],
    };

    items
        .iter()
        .map(|(item, cost)| AdditionalCost {
            item: item.to_string(),
            cost: cost.to_string(),
        })
        .collect()
}

pub(crate) fn extract_numbers(text: &str) -> Vec<f64> {
    let mut numbers = Vec::new();
    let mut current = String::new();

    let flush = |current: &mut String, numbers: &mut Vec<f64>| {
        let candidate = current.trim_end_matches('.');
        if let Ok(n) = candidate.parse::<f64>() {
            numbers.push(n);
        }
        current.clear();
    };

    for ch in text.chars() {
        if ch.is_ascii_digit() || (ch == '.' && !current.is_empty() && !current.contains('.')) {
            current.push(ch);
        } else if !current.is_empty() {
            flush(&mut current, &mut numbers);
        }
    }
    if !current.is_empty() {
        flush(&mut current, &mut numbers);
    }

    numbers
}
