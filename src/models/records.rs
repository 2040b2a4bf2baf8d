// Phone-system record shapes.
//
// Two fixed schemas are supported:
// - Twilio: a document with `users` and `phone_numbers` arrays
// - RingCentral: a document with `accounts` and `numbers` arrays
//
// Field names on the wire are fixed; struct fields are renamed where the
// JSON key differs from the natural Rust name.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Record format a migration reads from or writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneSystemFormat {
    Twilio,
    RingCentral,
}

impl PhoneSystemFormat {
    /// All selectable formats, in menu order.
    pub const ALL: [PhoneSystemFormat; 2] =
        [PhoneSystemFormat::Twilio, PhoneSystemFormat::RingCentral];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhoneSystemFormat::Twilio => "Twilio",
            PhoneSystemFormat::RingCentral => "RingCentral",
        }
    }
}

impl std::fmt::Display for PhoneSystemFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Missing arrays deserialize as empty so a document exported without
/// one section still loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwilioPhoneSystem {
    pub users: Vec<TwilioUser>,
    #[serde(rename = "phone_numbers")]
    pub lines: Vec<TwilioLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwilioUser {
    #[serde(rename = "account_sid")]
    pub id: String,
    #[serde(rename = "friendly_name")]
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwilioLine {
    pub sid: String,
    #[serde(rename = "phone_number")]
    pub number: String,
    pub capabilities: HashMap<String, bool>,
    #[serde(rename = "address_sid")]
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingCentralPhoneSystem {
    pub accounts: Vec<RingCentralAccount>,
    pub numbers: Vec<RingCentralNumber>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingCentralAccount {
    pub id: String,
    #[serde(rename = "name")]
    pub username: String,
    pub contact: String,
    pub main_number: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingCentralNumber {
    pub id: String,
    #[serde(rename = "phone_number")]
    pub number: String,
    pub features: Vec<String>,
    pub region: String,
}
