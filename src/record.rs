use serde::Serialize;
use serde_json::Value;

/// Grade slots per record: three core subjects, three world-of-work modules,
/// three social-skills modules, in upstream column order.
pub const GRADE_SLOTS: usize = 9;

pub const GRADE_FIELDS: [&str; GRADE_SLOTS] = [
    "nota1",
    "nota2",
    "nota3",
    "mundoTrabalho1",
    "mundoTrabalho2",
    "mundoTrabalho3",
    "convivio1",
    "convivio2",
    "convivio3",
];

/// One student row from the upstream records API, normalized. Built once per
/// fetch snapshot and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub name: String,
    pub absences: u32,
    pub grades: [f64; GRADE_SLOTS],
    pub reported_average: Option<f64>,
    pub reported_situation: Option<String>,
    pub course_name: Option<String>,
    pub origin_code: Option<String>,
    pub period: Option<String>,
}

impl StudentRecord {
    /// Normalize one raw record object. Total: any shape yields a record.
    /// Missing or non-numeric grade/absence values degrade to 0.
    pub fn from_value(raw: &Value) -> StudentRecord {
        let mut grades = [0.0_f64; GRADE_SLOTS];
        for (slot, field) in GRADE_FIELDS.iter().enumerate() {
            grades[slot] = parse_number(raw.get(field));
        }

        StudentRecord {
            name: text_field(raw, "nome").unwrap_or_default(),
            absences: parse_count(raw.get("faltas")),
            grades,
            reported_average: optional_number(raw.get("media")),
            reported_situation: text_field(raw, "situacao"),
            course_name: text_field(raw, "curso"),
            origin_code: text_field(raw, "origem"),
            period: text_field(raw, "periodo"),
        }
    }

    /// True iff at least one of the nine slots holds a grade above zero.
    /// The upstream sheet writes 0 both for "no grade yet" and for a real
    /// zero, so an all-zero row reads as "nothing entered".
    pub fn has_any_grade(&self) -> bool {
        self.grades.iter().any(|g| *g > 0.0)
    }

    /// The record's working average: the upstream-reported one verbatim when
    /// present, else the arithmetic mean over all nine slots, zeros included.
    pub fn average(&self) -> f64 {
        if let Some(reported) = self.reported_average {
            return reported;
        }
        self.grades.iter().sum::<f64>() / (GRADE_SLOTS as f64)
    }
}

/// Tolerant numeric parse: JSON numbers pass through; strings accept either
/// decimal separator ("7,5" or "7.5"); everything else is 0.
pub fn parse_number(raw: Option<&Value>) -> f64 {
    let Some(value) = raw else {
        return 0.0;
    };
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                return 0.0;
            }
            t.replace(',', ".").parse::<f64>().unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

fn parse_count(raw: Option<&Value>) -> u32 {
    let n = parse_number(raw);
    if n <= 0.0 {
        return 0;
    }
    n as u32
}

/// A number only when the field is present and non-empty; used for `media`,
/// where absence means "compute from the slots" rather than "zero".
fn optional_number(raw: Option<&Value>) -> Option<f64> {
    let value = raw?;
    match value {
        Value::Number(_) => Some(parse_number(Some(value))),
        Value::String(s) if !s.trim().is_empty() => Some(parse_number(Some(value))),
        _ => None,
    }
}

fn text_field(raw: &Value, key: &str) -> Option<String> {
    let value = raw.get(key)?;
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
