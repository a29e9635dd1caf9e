//! Spreadsheet export projections.
//!
//! The server produces the rows and a suggested file name; rendering the
//! workbook is left to the client.

use chrono::NaiveDate;
use serde::Serialize;

use super::directory::BloodGroupFilter;
use crate::models::{BloodGroup, DonationRequest, Donor, Gender};

/// A donor row as exported: everything except the id and creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorExportRow {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub blood_group: BloodGroup,
    pub phone: String,
    pub address: String,
    pub last_donation_date: Option<NaiveDate>,
    pub is_available_for_emergency: bool,
    pub is_approved: bool,
}

impl From<Donor> for DonorExportRow {
    fn from(d: Donor) -> Self {
        Self {
            name: d.name,
            age: d.age,
            gender: d.gender,
            blood_group: d.blood_group,
            phone: d.phone,
            address: d.address,
            last_donation_date: d.last_donation_date,
            is_available_for_emergency: d.is_available_for_emergency,
            is_approved: d.is_approved,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequestExportRow {
    pub full_name: String,
    pub mobile_number: String,
    pub description: String,
}

impl From<DonationRequest> for DonationRequestExportRow {
    fn from(r: DonationRequest) -> Self {
        Self {
            full_name: r.full_name,
            mobile_number: r.mobile_number,
            description: r.description,
        }
    }
}

/// Rows plus the file name the client should save them under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSheet<T> {
    pub file_name: String,
    pub rows: Vec<T>,
}

/// Approved donors in `group` who are available for emergencies.
pub fn donor_sheet(
    approved: Vec<Donor>,
    group: BloodGroupFilter,
) -> ExportSheet<DonorExportRow> {
    let rows = approved
        .into_iter()
        .filter(|d| d.is_approved && d.is_available_for_emergency)
        .filter(|d| group.admits(d.blood_group))
        .map(DonorExportRow::from)
        .collect();
    ExportSheet {
        file_name: format!("donors_list_{}.xlsx", group),
        rows,
    }
}

pub fn donation_request_sheet(
    approved: Vec<DonationRequest>,
    today: NaiveDate,
) -> ExportSheet<DonationRequestExportRow> {
    ExportSheet {
        file_name: format!("donation_requests_{}.xlsx", today.format("%Y-%m-%d")),
        rows: approved
            .into_iter()
            .filter(|r| r.is_approved)
            .map(DonationRequestExportRow::from)
            .collect(),
    }
}
