use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::GradingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "O")]
    O,
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C")]
    C,
}

impl Grade {
    pub const ALL: [Grade; 6] = [Grade::O, Grade::APlus, Grade::A, Grade::BPlus, Grade::B, Grade::C];

    pub fn points(self) -> u8 {
        match self {
            Grade::O => 10,
            Grade::APlus => 9,
            Grade::A => 8,
            Grade::BPlus => 7,
            Grade::B => 6,
            Grade::C => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Grade::O => "O",
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::C => "C",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Grade {
    type Err = GradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Grade::ALL
            .into_iter()
            .find(|g| g.label() == label)
            .ok_or_else(|| GradingError::InvalidGrade(label.to_string()))
    }
}

/// Looks up the grade point for a letter grade label.
pub fn grade_point(label: &str) -> Result<u8, GradingError> {
    label.parse::<Grade>().map(Grade::points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_point_table() {
        let table: Vec<(&str, u8)> = Grade::ALL.iter().map(|g| (g.label(), g.points())).collect();
        assert_eq!(
            table,
            vec![("O", 10), ("A+", 9), ("A", 8), ("B+", 7), ("B", 6), ("C", 5)]
        );
    }

    #[test]
    fn test_unknown_grade_is_rejected() {
        assert_eq!(grade_point("F"), Err(GradingError::InvalidGrade("F".to_string())));
        assert_eq!(grade_point("a+"), Err(GradingError::InvalidGrade("a+".to_string())));
        assert_eq!(grade_point(" A+ "), Ok(9));
    }

    #[test]
    fn test_serde_uses_letter_labels() {
        let g: Grade = serde_json::from_str("\"B+\"").unwrap();
        assert_eq!(g, Grade::BPlus);
        assert_eq!(serde_json::to_string(&Grade::APlus).unwrap(), "\"A+\"");
    }
}
