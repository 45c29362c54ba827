//! Request and response payloads for the contacts and auth endpoints.
//!
//! Payloads use snake_case field names. Conversions into domain types
//! validate every field and report failures against the payload field name.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::SignupRequest;
use crate::domain::{
    Contact, ContactData, ContactPatch, ContactProfile, ContactSearch, EmailAddress, Error,
    LoginCredentials, NewPassword, PageRequest, PersonName, PhoneNumber,
};

use super::validation::{
    DATA, EMAIL, FIRST_NAME, LAST_NAME, PHONE, contact_field_error, credentials_error,
    query_error,
};

/// Public representation of a contact. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ContactResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Ada")]
    pub first_name: String,
    #[schema(example = "Lovelace")]
    pub last_name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "555-0100")]
    pub phone: String,
    pub birth_day: NaiveDate,
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
    pub avatar_url: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Contact> for ContactResponse {
    fn from(contact: Contact) -> Self {
        let verified = contact.is_verified();
        Self {
            id: contact.id.get(),
            first_name: contact.first_name.as_str().to_owned(),
            last_name: contact.last_name.as_str().to_owned(),
            email: contact.email.as_str().to_owned(),
            phone: contact.phone.as_str().to_owned(),
            birth_day: contact.birth_day,
            data: contact.data.map(ContactData::into_value),
            avatar_url: contact.avatar_url,
            verified,
            created_at: contact.created_at,
            updated_at: contact.updated_at,
        }
    }
}

pub(crate) fn contact_list(contacts: Vec<Contact>) -> Vec<ContactResponse> {
    contacts.into_iter().map(ContactResponse::from).collect()
}

fn parse_data(data: Option<Value>) -> Result<Option<ContactData>, Error> {
    data.map(ContactData::try_from)
        .transpose()
        .map_err(contact_field_error(DATA))
}

/// Signup payload for `POST /api/contacts`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SignupBody {
    #[schema(example = "Ada")]
    pub first_name: String,
    #[schema(example = "Lovelace")]
    pub last_name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "555-0100")]
    pub phone: String,
    pub birth_day: NaiveDate,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
    #[schema(example = "correct horse battery")]
    pub password: String,
}

impl TryFrom<SignupBody> for SignupRequest {
    type Error = Error;

    fn try_from(body: SignupBody) -> Result<Self, Self::Error> {
        let profile = ContactProfile {
            first_name: PersonName::new(&body.first_name)
                .map_err(contact_field_error(FIRST_NAME))?,
            last_name: PersonName::new(&body.last_name).map_err(contact_field_error(LAST_NAME))?,
            email: EmailAddress::new(&body.email).map_err(contact_field_error(EMAIL))?,
            phone: PhoneNumber::new(&body.phone).map_err(contact_field_error(PHONE))?,
            birth_day: body.birth_day,
            data: parse_data(body.data)?,
        };
        let password = NewPassword::new(&body.password).map_err(credentials_error)?;
        Ok(Self { profile, password })
    }
}

/// Partial update payload for `PATCH /api/contacts/{id}`.
///
/// Absent and `null` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct PatchBody {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub birth_day: Option<NaiveDate>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
}

impl TryFrom<PatchBody> for ContactPatch {
    type Error = Error;

    fn try_from(body: PatchBody) -> Result<Self, Self::Error> {
        Ok(Self {
            first_name: body
                .first_name
                .as_deref()
                .map(PersonName::new)
                .transpose()
                .map_err(contact_field_error(FIRST_NAME))?,
            last_name: body
                .last_name
                .as_deref()
                .map(PersonName::new)
                .transpose()
                .map_err(contact_field_error(LAST_NAME))?,
            phone: body
                .phone
                .as_deref()
                .map(PhoneNumber::new)
                .transpose()
                .map_err(contact_field_error(PHONE))?,
            birth_day: body.birth_day,
            data: parse_data(body.data)?,
        })
    }
}

/// Pagination parameters for `GET /api/contacts`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Records to skip (default 0).
    pub skip: Option<u32>,
    /// Page size, 1 to 100 (default 10).
    pub limit: Option<u32>,
}

impl TryFrom<ListQuery> for PageRequest {
    type Error = Error;

    fn try_from(query: ListQuery) -> Result<Self, Self::Error> {
        PageRequest::new(query.skip, query.limit).map_err(query_error)
    }
}

/// Filters for `GET /api/contacts/search`. At least one is required.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl TryFrom<SearchQuery> for ContactSearch {
    type Error = Error;

    fn try_from(query: SearchQuery) -> Result<Self, Self::Error> {
        ContactSearch::new(query.first_name, query.last_name, query.email).map_err(query_error)
    }
}

/// Window for `GET /api/contacts/soon_celebrate`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SoonCelebrateQuery {
    /// Days ahead to include, 0 to 365 (default 7).
    pub days: Option<u32>,
}

/// Login payload for `POST /api/auth/login`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LoginBody {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "correct horse battery")]
    pub password: String,
}

impl TryFrom<LoginBody> for LoginCredentials {
    type Error = Error;

    fn try_from(body: LoginBody) -> Result<Self, Self::Error> {
        LoginCredentials::try_from_parts(&body.email, &body.password).map_err(credentials_error)
    }
}

/// Bearer token issued on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
}

impl TokenResponse {
    /// Wrap an access token with the `bearer` type.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "bearer".to_owned(),
        }
    }
}

/// Plain confirmation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Email verified")]
    pub message: String,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::inbound::http::test_utils::contact_fixture;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn signup() -> SignupBody {
        SignupBody {
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            email: "ada@example.com".to_owned(),
            phone: "555-0100".to_owned(),
            birth_day: NaiveDate::from_ymd_opt(1815, 12, 10).expect("date"),
            data: Some(json!({"notes": "analyst"})),
            password: "correct horse battery".to_owned(),
        }
    }

    #[rstest]
    fn signup_body_converts(signup: SignupBody) {
        let request = SignupRequest::try_from(signup).expect("valid body");
        assert_eq!(request.profile.email.as_str(), "ada@example.com");
        assert!(request.profile.data.is_some());
    }

    #[rstest]
    fn short_passwords_are_rejected(mut signup: SignupBody) {
        signup.password = "short".to_owned();
        let err = SignupRequest::try_from(signup).expect_err("short password");
        assert_eq!(
            err.details().and_then(|d| d.get("field")),
            Some(&json!("password"))
        );
    }

    #[rstest]
    fn non_object_data_is_rejected(mut signup: SignupBody) {
        signup.data = Some(json!("text"));
        let err = SignupRequest::try_from(signup).expect_err("bad data");
        assert_eq!(err.details().and_then(|d| d.get("field")), Some(&json!("data")));
    }

    #[rstest]
    fn null_patch_fields_are_absent() {
        let body: PatchBody =
            serde_json::from_value(json!({"phone": "555-0199", "first_name": null}))
                .expect("patch body");
        let patch = ContactPatch::try_from(body).expect("valid patch");
        assert!(patch.first_name.is_none());
        assert_eq!(patch.phone.as_ref().map(PhoneNumber::as_str), Some("555-0199"));
    }

    #[rstest]
    fn empty_object_data_is_present() {
        let body: PatchBody = serde_json::from_value(json!({"data": {}})).expect("patch body");
        let patch = ContactPatch::try_from(body).expect("valid patch");
        assert_eq!(patch.data, Some(ContactData::default()));
    }

    #[rstest]
    fn response_never_serialises_credentials() {
        let response = ContactResponse::from(contact_fixture(3, "ada@example.com"));
        let value = serde_json::to_value(&response).expect("serialise");
        let object = value.as_object().expect("object");
        assert!(!object.contains_key("password"));
        assert!(!object.contains_key("verification_token"));
        assert_eq!(value["verified"], true);
        assert_eq!(value["birth_day"], "1815-12-10");
    }
}
