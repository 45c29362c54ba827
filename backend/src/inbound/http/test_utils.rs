//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::web;
use chrono::{NaiveDate, TimeZone, Utc};

use crate::domain::ports::{MockAccountAuth, MockContactsCommand, MockContactsQuery};
use crate::domain::{
    Contact, ContactId, EmailAddress, PersonName, PhoneNumber, VerificationState,
};

use super::state::HttpState;

/// Mocked driving ports; calls without expectations panic.
#[derive(Default)]
pub struct MockPorts {
    pub contacts: MockContactsQuery,
    pub commands: MockContactsCommand,
    pub auth: MockAccountAuth,
}

impl MockPorts {
    /// Wrap the mocks as handler state.
    pub fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(
            Arc::new(self.contacts),
            Arc::new(self.commands),
            Arc::new(self.auth),
        ))
    }

    /// Expect any bearer token to resolve to `contact`.
    pub fn authenticate_as(&mut self, contact: Contact) {
        self.auth
            .expect_authenticate()
            .returning(move |_| Ok(contact.clone()));
    }
}

/// A verified contact with fixed timestamps.
pub fn contact_fixture(id: i32, email: &str) -> Contact {
    let stamp = Utc
        .with_ymd_and_hms(2024, 1, 28, 12, 0, 0)
        .single()
        .expect("valid stamp");
    Contact {
        id: ContactId::new(id),
        first_name: PersonName::new("Ada").expect("name"),
        last_name: PersonName::new("Lovelace").expect("name"),
        email: EmailAddress::new(email).expect("email"),
        phone: PhoneNumber::new("555-0100").expect("phone"),
        birth_day: NaiveDate::from_ymd_opt(1815, 12, 10).expect("date"),
        data: None,
        avatar_url: None,
        verification: VerificationState::Verified,
        created_at: stamp,
        updated_at: stamp,
    }
}
