use serde::Serialize;

use crate::record::StudentRecord;

/// Failing threshold on the absence count: strictly more than this fails the
/// student outright, matching the upstream "reprovado por faltas" rule.
pub const MAX_ABSENCES: u32 = 15;

/// Minimum working average for approval.
pub const PASSING_AVERAGE: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Situation {
    Approved,
    InProgress,
    Failed,
}

impl Situation {
    pub fn as_str(self) -> &'static str {
        match self {
            Situation::Approved => "approved",
            Situation::InProgress => "in_progress",
            Situation::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Situation> {
        match raw {
            "approved" => Some(Situation::Approved),
            "in_progress" => Some(Situation::InProgress),
            "failed" => Some(Situation::Failed),
            _ => None,
        }
    }
}

/// Canonical academic situation for one record. Total and pure: every record
/// shape resolves to exactly one variant, and repeated calls agree.
///
/// An upstream-reported status string always wins. Without one, the rules run
/// in strict order against the working average and the absence count.
pub fn classify(rec: &StudentRecord) -> Situation {
    if let Some(reported) = rec.reported_situation.as_deref() {
        return map_reported(reported);
    }

    let average = rec.average();
    if rec.absences > MAX_ABSENCES {
        return Situation::Failed;
    }
    if !rec.has_any_grade() && rec.absences == 0 {
        return Situation::InProgress;
    }
    if average >= PASSING_AVERAGE && rec.absences <= MAX_ABSENCES {
        return Situation::Approved;
    }
    if average < PASSING_AVERAGE && rec.has_any_grade() {
        return Situation::Failed;
    }
    Situation::InProgress
}

fn map_reported(raw: &str) -> Situation {
    let normalized = raw.trim().to_lowercase();
    match normalized.as_str() {
        "aprovado" => Situation::Approved,
        "reprovado" | "reprovado por faltas" => Situation::Failed,
        // "em curso" and any other non-empty label the sheet may carry.
        _ => Situation::InProgress,
    }
}
