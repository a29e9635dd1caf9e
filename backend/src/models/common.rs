//! Value types shared by every record kind.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// ABO/Rh blood group. Serialized exactly as written on a donor card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APositive,
        BloodGroup::ANegative,
        BloodGroup::BPositive,
        BloodGroup::BNegative,
        BloodGroup::AbPositive,
        BloodGroup::AbNegative,
        BloodGroup::OPositive,
        BloodGroup::ONegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::AbPositive => "AB+",
            BloodGroup::AbNegative => "AB-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = ValidationError;

    /// Parse a blood group label.
    ///
    /// A trailing space is read as `+`, since an unescaped `+` in a query
    /// string arrives form-decoded as a space.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_start();
        let label = match trimmed.strip_suffix(' ') {
            Some(head) => {
                let head = head.trim_end();
                if head.ends_with(|c: char| c == '+' || c == '-') {
                    head.to_string()
                } else {
                    format!("{}+", head)
                }
            }
            None => trimmed.to_string(),
        };
        let label = label.to_uppercase();

        BloodGroup::ALL
            .iter()
            .copied()
            .find(|group| group.as_str() == label)
            .ok_or_else(|| ValidationError::new("bloodGroup", format!("unknown blood group '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

/// A field-level validation failure on an incoming record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub(crate) fn require_non_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be blank"));
    }
    Ok(())
}

/// Reject a present-but-blank update field.
pub(crate) fn require_non_blank_opt(
    field: &'static str,
    value: Option<&String>,
) -> Result<(), ValidationError> {
    match value {
        Some(v) => require_non_blank(field, v),
        None => Ok(()),
    }
}

pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

/// Optional calendar dates arrive from HTML date inputs, where "no date"
/// is an empty string rather than `null`.
pub(crate) mod optional_date {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        parse(raw.as_deref()).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse(raw: Option<&str>) -> Result<Option<NaiveDate>, String> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Some)
                .map_err(|e| format!("invalid date '{}': {}", s, e)),
        }
    }
}

/// Patch form of [`optional_date`]: an absent key leaves the stored date
/// alone, while `null` or `""` clears it.
pub(crate) mod patch_date {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        optional_date::parse(raw.as_deref())
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blood_group_round_trips_labels() {
        for group in BloodGroup::ALL {
            let json = serde_json::to_string(&group).unwrap();
            assert_eq!(json, format!("\"{}\"", group.as_str()));
            assert_eq!(group.as_str().parse::<BloodGroup>().unwrap(), group);
        }
    }

    #[test]
    fn test_blood_group_accepts_form_decoded_plus() {
        assert_eq!("AB ".parse::<BloodGroup>().unwrap(), BloodGroup::AbPositive);
        assert_eq!("o-".parse::<BloodGroup>().unwrap(), BloodGroup::ONegative);
        assert!("C+".parse::<BloodGroup>().is_err());
    }

    #[test]
    fn test_optional_date_blank_is_none() {
        assert_eq!(optional_date::parse(Some("")).unwrap(), None);
        assert_eq!(optional_date::parse(None).unwrap(), None);
        assert_eq!(
            optional_date::parse(Some("2024-03-01")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert!(optional_date::parse(Some("01/03/2024")).is_err());
    }
}
