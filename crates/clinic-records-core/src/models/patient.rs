//! Patient models.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Patient lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PatientStatus {
    Active,
    Inactive,
    #[default]
    Inquiry,
    Onboarding,
}

impl PatientStatus {
    pub const ALL: [PatientStatus; 4] = [
        PatientStatus::Inquiry,
        PatientStatus::Onboarding,
        PatientStatus::Active,
        PatientStatus::Inactive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatientStatus::Active => "active",
            PatientStatus::Inactive => "inactive",
            PatientStatus::Inquiry => "inquiry",
            PatientStatus::Onboarding => "onboarding",
        }
    }

    /// Parse a lowercase status name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(PatientStatus::Active),
            "inactive" => Some(PatientStatus::Inactive),
            "inquiry" => Some(PatientStatus::Inquiry),
            "onboarding" => Some(PatientStatus::Onboarding),
            _ => None,
        }
    }
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Date of birth as either a persisted timestamp or a date edited in memory.
///
/// Only [`DateOfBirth::Timestamp`] is rendered by the table projection; a
/// freshly edited [`DateOfBirth::Date`] renders as the missing sentinel until
/// the record has been stored and read back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DateOfBirth {
    /// Timestamp read back from the record store
    Timestamp(DateTime<Utc>),
    /// Date picked in a form, not yet persisted
    Date(NaiveDate),
}

impl DateOfBirth {
    /// Normalize either representation to a calendar date (UTC).
    pub fn to_date(&self) -> NaiveDate {
        match self {
            DateOfBirth::Timestamp(ts) => ts.date_naive(),
            DateOfBirth::Date(date) => *date,
        }
    }

    pub fn is_timestamp(&self) -> bool {
        matches!(self, DateOfBirth::Timestamp(_))
    }
}

/// Primitive value held by a custom (registry-declared) field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CustomValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CustomValue {
    /// Whether the value would count as "set" for display purposes.
    pub fn is_truthy(&self) -> bool {
        match self {
            CustomValue::Bool(b) => *b,
            CustomValue::Number(n) => *n != 0.0 && !n.is_nan(),
            CustomValue::Text(s) => !s.is_empty(),
        }
    }
}

/// Render-as-text contract: every custom value has exactly one textual form.
impl fmt::Display for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomValue::Bool(b) => write!(f, "{}", b),
            CustomValue::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            CustomValue::Number(n) => write!(f, "{}", n),
            CustomValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CustomValue {
    fn from(s: &str) -> Self {
        CustomValue::Text(s.to_string())
    }
}

impl From<String> for CustomValue {
    fn from(s: String) -> Self {
        CustomValue::Text(s)
    }
}

impl From<f64> for CustomValue {
    fn from(n: f64) -> Self {
        CustomValue::Number(n)
    }
}

impl From<bool> for CustomValue {
    fn from(b: bool) -> Self {
        CustomValue::Bool(b)
    }
}

/// A postal address. The first address flagged primary is the patient's
/// primary address; every other entry is treated as mailing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub is_primary: bool,
    /// Extra string/bool attributes carried along untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, CustomValue>,
}

impl Address {
    pub fn new(street: &str, city: &str, state: &str, zip: &str, is_primary: bool) -> Self {
        Self {
            street: street.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            zip: zip.to_string(),
            is_primary,
            extra: BTreeMap::new(),
        }
    }

    /// An address with every text field empty.
    pub fn empty(is_primary: bool) -> Self {
        Self {
            is_primary,
            ..Self::default()
        }
    }

    /// True when street, city, state and zip are all empty.
    pub fn is_blank(&self) -> bool {
        self.street.is_empty() && self.city.is_empty() && self.state.is_empty() && self.zip.is_empty()
    }
}

/// A patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Store-assigned ID - empty until first persisted
    #[serde(default)]
    pub id: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub sex: String,
    pub gender: String,
    pub phone: String,
    pub notes: String,
    pub status: PatientStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<DateOfBirth>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    /// Set by the store on records created as demo data
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_seed: bool,
    /// Set by the store on create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Values of custom fields, keyed by registry field name. Serialized as
    /// a nested `custom` object, so names may equal record keys.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, CustomValue>,
}

impl Default for Patient {
    fn default() -> Self {
        Self::empty()
    }
}

impl Patient {
    /// The blank record a new-patient form starts from: a primary and a
    /// mailing address, both empty, and a stored epoch date of birth.
    pub fn empty() -> Self {
        Self {
            id: String::new(),
            first_name: String::new(),
            middle_name: String::new(),
            last_name: String::new(),
            sex: String::new(),
            gender: String::new(),
            phone: String::new(),
            notes: String::new(),
            status: PatientStatus::Inquiry,
            dob: Some(DateOfBirth::Timestamp(DateTime::<Utc>::UNIX_EPOCH)),
            addresses: vec![Address::empty(true), Address::empty(false)],
            is_seed: false,
            timestamp: None,
            custom: BTreeMap::new(),
        }
    }

    /// Create a patient with a name and otherwise empty fields.
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            ..Self::empty()
        }
    }

    /// Check if this patient has been persisted.
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    /// First address flagged primary.
    pub fn primary_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|a| a.is_primary)
    }

    /// First address not flagged primary.
    pub fn mailing_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|a| !a.is_primary)
    }

    /// "First Middle Last" as shown on the detail page.
    pub fn full_name(&self) -> String {
        format!("{} {} {}", self.first_name, self.middle_name, self.last_name)
    }
}
