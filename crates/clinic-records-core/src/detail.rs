//! Read-only patient detail view.

use serde::Serialize;

use crate::flatten::{flatten_address, format_dob};
use crate::models::{DataField, Patient, PatientStatus};

/// One labelled custom value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailField {
    pub label: String,
    pub value: String,
}

/// What the patient page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientDetail {
    pub title: String,
    pub status: PatientStatus,
    pub dob: String,
    pub sex: String,
    pub gender: String,
    pub phone: String,
    pub primary_address: String,
    /// Present only when the first non-primary address has content.
    pub mailing_address: Option<String>,
    pub notes: String,
    /// Truthy custom values, in registry order.
    pub custom_fields: Vec<DetailField>,
}

pub fn patient_detail(patient: &Patient, fields: &[DataField]) -> PatientDetail {
    let mailing = flatten_address(patient.mailing_address());

    let custom_fields = fields
        .iter()
        .filter(|f| f.is_non_default_field)
        .filter_map(|f| {
            let value = patient.custom.get(&f.field_name)?;
            value.is_truthy().then(|| DetailField {
                label: f.display_name.clone(),
                value: value.to_string(),
            })
        })
        .collect();

    PatientDetail {
        title: patient.full_name(),
        status: patient.status,
        dob: format_dob(patient.dob.as_ref()),
        sex: patient.sex.clone(),
        gender: patient.gender.clone(),
        phone: patient.phone.clone(),
        primary_address: flatten_address(patient.primary_address()),
        mailing_address: (!mailing.is_empty()).then_some(mailing),
        notes: patient.notes.clone(),
        custom_fields,
    }
}
