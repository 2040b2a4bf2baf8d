// Schema conversion service.
//
// Pure, synchronous mapping between the Twilio and RingCentral record
// shapes. No I/O happens here; the migration engine owns reading and
// writing files.
//
// Capability maps convert to feature lists by keeping only the enabled
// capability names, sorted so the output is deterministic.

use std::collections::HashMap;

use crate::models::records::{
    RingCentralAccount, RingCentralNumber, RingCentralPhoneSystem, TwilioLine, TwilioPhoneSystem,
    TwilioUser,
};

const STATUS_ACTIVE: &str = "active";
const STATUS_INACTIVE: &str = "inactive";

pub fn twilio_to_ringcentral(system: &TwilioPhoneSystem) -> RingCentralPhoneSystem {
    let accounts = system
        .users
        .iter()
        .map(|user| RingCentralAccount {
            id: user.id.clone(),
            username: user.name.clone(),
            contact: user.email.clone(),
            main_number: user.phone_number.clone(),
            active: user.status == STATUS_ACTIVE,
        })
        .collect();

    let numbers = system
        .lines
        .iter()
        .map(|line| RingCentralNumber {
            id: line.sid.clone(),
            number: line.number.clone(),
            features: enabled_features(&line.capabilities),
            region: line.location.clone(),
        })
        .collect();

    RingCentralPhoneSystem { accounts, numbers }
}

pub fn ringcentral_to_twilio(system: &RingCentralPhoneSystem) -> TwilioPhoneSystem {
    let users = system
        .accounts
        .iter()
        .map(|account| TwilioUser {
            id: account.id.clone(),
            name: account.username.clone(),
            email: account.contact.clone(),
            phone_number: account.main_number.clone(),
            status: if account.active {
                STATUS_ACTIVE.to_string()
            } else {
                STATUS_INACTIVE.to_string()
            },
        })
        .collect();

    let lines = system
        .numbers
        .iter()
        .map(|number| TwilioLine {
            sid: number.id.clone(),
            number: number.number.clone(),
            capabilities: number
                .features
                .iter()
                .map(|feature| (feature.clone(), true))
                .collect(),
            location: number.region.clone(),
        })
        .collect();

    TwilioPhoneSystem { users, lines }
}

fn enabled_features(capabilities: &HashMap<String, bool>) -> Vec<String> {
    let mut features: Vec<String> = capabilities
        .iter()
        .filter(|(_, enabled)| **enabled)
        .map(|(name, _)| name.clone())
        .collect();
    features.sort();
    features
}
