//! Bearer-token authentication extractor.
//!
//! Handlers that take a [`CurrentContact`] only run for requests carrying a
//! valid `Authorization: Bearer <token>` header; anything else is answered
//! with 401 before the handler body executes.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Contact, Error};

use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";
const MISSING_CREDENTIALS: &str = "Not authenticated";

/// The account resolved from the request's bearer token.
#[derive(Debug, Clone)]
pub struct CurrentContact(pub Contact);

impl CurrentContact {
    /// Borrow the authenticated contact.
    #[must_use]
    pub const fn contact(&self) -> &Contact {
        &self.0
    }

    /// Take ownership of the authenticated contact.
    #[must_use]
    pub fn into_inner(self) -> Contact {
        self.0
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let scheme_len = BEARER_PREFIX.len();
    if value.len() <= scheme_len || !value[..scheme_len].eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }
    let token = value[scheme_len..].trim();
    (!token.is_empty()).then(|| token.to_owned())
}

impl FromRequest for CurrentContact {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not registered"))?;
            let token = token.ok_or_else(|| Error::unauthorized(MISSING_CREDENTIALS))?;
            let contact = state.auth.authenticate(&token).await?;
            Ok(Self(contact))
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::inbound::http::test_utils::{MockPorts, contact_fixture};
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test};
    use rstest::rstest;

    async fn whoami(current: CurrentContact) -> HttpResponse {
        HttpResponse::Ok().body(current.contact().email.as_str().to_owned())
    }

    #[rstest]
    #[case(None)]
    #[case(Some("Basic abc"))]
    #[case(Some("Bearer "))]
    #[actix_web::test]
    async fn missing_or_malformed_headers_are_unauthorized(#[case] header: Option<&str>) {
        let state = MockPorts::default().into_state();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .route("/", web::get().to(whoami)),
        )
        .await;
        let mut req = test::TestRequest::get().uri("/");
        if let Some(value) = header {
            req = req.insert_header((AUTHORIZATION, value));
        }
        let res = test::call_service(&app, req.to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn valid_tokens_resolve_the_contact() {
        let mut ports = MockPorts::default();
        ports
            .auth
            .expect_authenticate()
            .withf(|token: &str| token == "good-token")
            .times(1)
            .returning(|_| Ok(contact_fixture(1, "ada@example.com")));
        let app = test::init_service(
            App::new()
                .app_data(ports.into_state())
                .route("/", web::get().to(whoami)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((AUTHORIZATION, "bearer good-token"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, "ada@example.com");
    }

    #[actix_web::test]
    async fn rejected_tokens_are_unauthorized() {
        let mut ports = MockPorts::default();
        ports
            .auth
            .expect_authenticate()
            .returning(|_| Err(Error::unauthorized("Could not validate credentials")));
        let app = test::init_service(
            App::new()
                .app_data(ports.into_state())
                .route("/", web::get().to(whoami)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((AUTHORIZATION, "Bearer stale"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
