//! Review grades on the SM-2 quality scale and the validation guarding them.
//!
//! Grades arrive from button presses, JSON documents or config files as loosely typed values.
//! They are converted into [`Grade`] here and nowhere else:
//! - integers 0-5 and their string forms ("0".."5")
//! - named tokens: blackout, incorrect (alias: again), familiar, hard, good, easy
//!
//! Anything else is rejected with [`SchedulerError::InvalidGrade`].

use super::ReviewState;
use crate::error::SchedulerError;
use crate::models::scheduler::format_interval;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Grade {
    /// 0: no recall at all
    Blackout,
    /// 1: wrong, recognized the answer once shown
    Incorrect,
    /// 2: wrong, but the answer felt familiar
    Familiar,
    /// 3: correct with serious difficulty
    Hard,
    /// 4: correct after hesitation
    Good,
    /// 5: perfect recall
    Easy,
}

impl Grade {
    pub const ALL: [Grade; 6] = [
        Grade::Blackout,
        Grade::Incorrect,
        Grade::Familiar,
        Grade::Hard,
        Grade::Good,
        Grade::Easy,
    ];

    pub fn from_quality(quality: u8) -> Option<Self> {
        Self::ALL.get(usize::from(quality)).copied()
    }

    pub fn quality(self) -> u8 {
        self as u8
    }

    pub fn is_passing(self) -> bool {
        self >= Grade::Hard
    }

    pub fn label(self) -> &'static str {
        match self {
            Grade::Blackout => "Blackout",
            Grade::Incorrect => "Again",
            Grade::Familiar => "Almost",
            Grade::Hard => "Hard",
            Grade::Good => "Good",
            Grade::Easy => "Easy",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "0" | "blackout" => Some(Grade::Blackout),
            "1" | "incorrect" | "again" => Some(Grade::Incorrect),
            "2" | "familiar" => Some(Grade::Familiar),
            "3" | "hard" => Some(Grade::Hard),
            "4" | "good" => Some(Grade::Good),
            "5" | "easy" => Some(Grade::Easy),
            _ => None,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.quality())
    }
}

impl FromStr for Grade {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| SchedulerError::InvalidGrade(format!("{s:?}")))
    }
}

impl TryFrom<&Value> for Grade {
    type Error = SchedulerError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let grade = match value {
            Value::Number(n) => n
                .as_u64()
                .and_then(|q| u8::try_from(q).ok())
                .and_then(Grade::from_quality),
            Value::String(s) => Grade::from_token(s),
            _ => None,
        };
        grade.ok_or_else(|| SchedulerError::InvalidGrade(value.to_string()))
    }
}

/// True iff `value` names one of the six grades.
pub fn is_valid_grade(value: &Value) -> bool {
    Grade::try_from(value).is_ok()
}

/// Short encouragement for a raw quality value. Unknown values get a generic message.
pub fn grade_feedback_message(quality: i64) -> &'static str {
    match quality {
        0 => "Don't worry - this word will come back soon.",
        1 => "Not quite. Have another look at the answer.",
        2 => "Almost there - it will stick next time.",
        3 => "Correct, but that was hard work.",
        4 => "Good job!",
        5 => "Perfect recall!",
        _ => "Answer recorded.",
    }
}

/// Grade name plus when the item comes back, e.g. "Good - next review in 6 days".
pub fn review_feedback(grade: Grade, state: &ReviewState) -> String {
    if grade.is_passing() {
        format!(
            "{} - next review in {}",
            grade.label(),
            format_interval(state.interval)
        )
    } else {
        format!(
            "{} - review again in {}",
            grade.label(),
            format_interval(state.interval)
        )
    }
}
