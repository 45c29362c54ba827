//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every contacts, auth and health endpoint together
//! with the DTO and error schemas, plus the JWT bearer security scheme. The
//! document backs Swagger UI in debug builds.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::contacts_dto::{
    ContactResponse, LoginBody, MessageResponse, PatchBody, SignupBody, TokenResponse,
};
use crate::inbound::http::health::ProbeStatus;

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Access token issued by POST /api/auth/login."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Contacts backend API",
        description = "Contacts directory with signup, email verification and bearer authentication."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::contacts::list_contacts,
        crate::inbound::http::contacts::search_contacts,
        crate::inbound::http::contacts::soon_celebrate,
        crate::inbound::http::contacts::signup,
        crate::inbound::http::contacts::current_contact,
        crate::inbound::http::contacts::get_contact,
        crate::inbound::http::contacts::update_contact,
        crate::inbound::http::contacts::delete_contact,
        crate::inbound::http::contacts::update_avatar,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::verify_email,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ContactResponse,
        SignupBody,
        PatchBody,
        LoginBody,
        TokenResponse,
        MessageResponse,
        ProbeStatus,
        Error,
        ErrorCode
    )),
    tags(
        (name = "contacts", description = "Contact directory and account profile"),
        (name = "auth", description = "Login and email verification"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated OpenAPI document.

    use super::*;
    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("/api/contacts")]
    #[case("/api/contacts/{id}")]
    #[case("/api/contacts/avatar")]
    #[case("/api/auth/login")]
    #[case("/api/auth/verify/{token}")]
    #[case("/health/ready")]
    fn document_lists_endpoint(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[rstest]
    fn contact_schema_never_exposes_secrets() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let contact = schemas.get("ContactResponse").expect("ContactResponse schema");

        assert_object_schema_has_field(contact, "birth_day");
        assert_object_schema_has_field(contact, "avatar_url");
        match contact {
            RefOr::T(Schema::Object(obj)) => {
                assert!(!obj.properties.contains_key("password_hash"));
                assert!(!obj.properties.contains_key("verification_token"));
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    fn error_schema_has_envelope_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error = schemas.get("Error").expect("Error schema");
        assert_object_schema_has_field(error, "code");
        assert_object_schema_has_field(error, "message");
    }

    #[rstest]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer"));
    }
}
