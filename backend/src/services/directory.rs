//! Public directory views: donor filtering and doctor contact routing.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::models::{Approvable, BloodGroup, Doctor, Donor, SystemSettings, ValidationError};

/// Blood group selector from the directory drop-down. `All` disables the
/// group filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BloodGroupFilter {
    #[default]
    All,
    Group(BloodGroup),
}

impl BloodGroupFilter {
    pub fn admits(self, group: BloodGroup) -> bool {
        match self {
            BloodGroupFilter::All => true,
            BloodGroupFilter::Group(selected) => selected == group,
        }
    }

    /// Parse an optional query value; absent or blank means `All`.
    pub fn parse_opt(raw: Option<&str>) -> Result<Self, ValidationError> {
        raw.map(str::parse).transpose().map(Option::unwrap_or_default)
    }
}

impl FromStr for BloodGroupFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        if label.is_empty() || label.eq_ignore_ascii_case("all") {
            return Ok(BloodGroupFilter::All);
        }
        // Untrimmed: a trailing space may be a form-decoded `+`
        s.parse::<BloodGroup>().map(BloodGroupFilter::Group)
    }
}

impl fmt::Display for BloodGroupFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BloodGroupFilter::All => f.write_str("All"),
            BloodGroupFilter::Group(group) => group.fmt(f),
        }
    }
}

/// Filters applied to the public donor list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryFilter {
    pub blood_group: BloodGroupFilter,
    /// Lower-cased, trimmed search term; `None` when blank.
    search: Option<String>,
}

impl DirectoryFilter {
    pub fn new(blood_group: BloodGroupFilter, search: Option<&str>) -> Self {
        let search = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        Self {
            blood_group,
            search,
        }
    }

    /// Group, then approval, then free-text match on name or address.
    pub fn matches(&self, donor: &Donor) -> bool {
        if !self.blood_group.admits(donor.blood_group) {
            return false;
        }
        if !donor.approval().is_approved() {
            return false;
        }
        match &self.search {
            None => true,
            Some(term) => {
                donor.name.to_lowercase().contains(term)
                    || donor.address.to_lowercase().contains(term)
            }
        }
    }

    /// Keep matching donors in their original order.
    pub fn apply(&self, donors: Vec<Donor>) -> Vec<Donor> {
        donors.into_iter().filter(|d| self.matches(d)).collect()
    }
}

/// A doctor as shown in the public directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorListing {
    #[serde(flatten)]
    pub doctor: Doctor,
    pub contact_phone: String,
}

impl DoctorListing {
    pub fn new(doctor: Doctor, settings: &SystemSettings) -> Self {
        let contact_phone = doctor.contact_phone(settings).to_string();
        Self {
            doctor,
            contact_phone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, RecordId};
    use chrono::Utc;
    use proptest::prelude::*;

    fn donor(name: &str, address: &str, group: BloodGroup, approved: bool) -> Donor {
        Donor {
            id: RecordId::generate(),
            name: name.into(),
            age: 30,
            gender: Gender::Female,
            blood_group: group,
            phone: "017".into(),
            address: address.into(),
            last_donation_date: None,
            is_available_for_emergency: false,
            is_approved: approved,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_parse_treats_all_and_blank_as_no_filter() {
        assert_eq!(BloodGroupFilter::parse_opt(None).unwrap(), BloodGroupFilter::All);
        assert_eq!(
            BloodGroupFilter::parse_opt(Some(" ")).unwrap(),
            BloodGroupFilter::All
        );
        assert_eq!("All".parse::<BloodGroupFilter>().unwrap(), BloodGroupFilter::All);
        assert_eq!(
            "AB-".parse::<BloodGroupFilter>().unwrap(),
            BloodGroupFilter::Group(BloodGroup::AbNegative)
        );
        assert!("Z+".parse::<BloodGroupFilter>().is_err());
    }

    #[test]
    fn test_search_matches_name_or_address_case_insensitively() {
        let filter = DirectoryFilter::new(BloodGroupFilter::All, Some("  MIRPUR "));
        assert!(filter.matches(&donor("Rahim", "Mirpur 10", BloodGroup::APositive, true)));
        assert!(!filter.matches(&donor("Rahim", "Uttara", BloodGroup::APositive, true)));

        let by_name = DirectoryFilter::new(BloodGroupFilter::All, Some("rah"));
        assert!(by_name.matches(&donor("Rahim", "Uttara", BloodGroup::APositive, true)));
    }

    #[test]
    fn test_unapproved_never_listed() {
        let filter = DirectoryFilter::default();
        assert!(!filter.matches(&donor("Karim", "Dhaka", BloodGroup::ONegative, false)));
    }

    #[test]
    fn test_doctor_listing_serializes_flat() {
        let doctor = Doctor {
            id: RecordId::new("d1"),
            name: "Dr. A".into(),
            specialist: "Hematologist".into(),
            hospital: "Evercare".into(),
            phone: "111".into(),
            image: None,
            use_central_contact: true,
        };
        let settings = SystemSettings {
            central_phone: "999".into(),
            use_central_phone: true,
        };
        let value = serde_json::to_value(DoctorListing::new(doctor, &settings)).unwrap();
        assert_eq!(value["contactPhone"], "999");
        assert_eq!(value["phone"], "111");
        assert_eq!(value["id"], "d1");
    }

    fn arb_donor() -> impl Strategy<Value = Donor> {
        (
            prop::sample::select(BloodGroup::ALL.to_vec()),
            any::<bool>(),
            any::<bool>(),
            "[a-z ]{0,12}",
            "[a-z ]{0,12}",
        )
            .prop_map(|(group, approved, available, name, address)| {
                let mut d = donor(&name, &address, group, approved);
                d.is_available_for_emergency = available;
                d
            })
    }

    fn arb_filter() -> impl Strategy<Value = BloodGroupFilter> {
        prop_oneof![
            Just(BloodGroupFilter::All),
            prop::sample::select(BloodGroup::ALL.to_vec()).prop_map(BloodGroupFilter::Group),
        ]
    }

    proptest! {
        #[test]
        fn prop_without_search_listing_is_exactly_the_approved_in_group(
            donors in prop::collection::vec(arb_donor(), 0..30),
            group in arb_filter(),
        ) {
            let filter = DirectoryFilter::new(group, None);
            let listed = filter.apply(donors.clone());
            let expected: Vec<Donor> = donors
                .into_iter()
                .filter(|d| d.is_approved && group.admits(d.blood_group))
                .collect();
            prop_assert_eq!(listed, expected);
        }

        #[test]
        fn prop_search_only_narrows(
            donors in prop::collection::vec(arb_donor(), 0..30),
            group in arb_filter(),
            term in "[a-z]{0,3}",
        ) {
            let broad = DirectoryFilter::new(group, None).apply(donors.clone());
            let narrow = DirectoryFilter::new(group, Some(&term)).apply(donors);
            prop_assert!(narrow.len() <= broad.len());
            prop_assert!(narrow.iter().all(|d| broad.contains(d)));
        }
    }
}
