//! Route table for the `/api` scope.

use actix_web::{guard, web};

use crate::middleware::EndpointLimits;

use super::auth::{login, verify_email};
use super::contacts::{
    AVATAR_MAX_BYTES, current_contact, delete_contact, get_contact, list_contacts,
    search_contacts, signup, soon_celebrate, update_avatar, update_contact,
};
use super::error::{json_error_handler, path_error_handler, query_error_handler};

/// Register every API route, throttling signup, login and `/contacts/me`
/// each with its own limiter from `limits`.
///
/// ```
/// use std::num::NonZeroU32;
/// use actix_web::{App, web};
/// use contacts_backend::inbound::http::routes::configure;
/// use contacts_backend::middleware::EndpointLimits;
///
/// let limits = EndpointLimits::per_minute(NonZeroU32::MIN);
/// let _app = App::new().service(web::scope("/api").configure(configure(limits)));
/// ```
pub fn configure(limits: EndpointLimits) -> impl FnOnce(&mut web::ServiceConfig) {
    let EndpointLimits {
        signup: signup_limit,
        current_contact: current_contact_limit,
        login: login_limit,
    } = limits;
    move |cfg| {
        cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .app_data(web::PayloadConfig::new(AVATAR_MAX_BYTES))
            .service(list_contacts)
            .service(search_contacts)
            .service(soon_celebrate)
            .service(
                web::resource(vec!["/contacts", "/contacts/signup"])
                    .guard(guard::Post())
                    .wrap(signup_limit)
                    .route(web::post().to(signup)),
            )
            .service(
                web::resource("/contacts/me")
                    .wrap(current_contact_limit)
                    .route(web::get().to(current_contact)),
            )
            .service(update_avatar)
            .service(get_contact)
            .service(update_contact)
            .service(delete_contact)
            .service(
                web::resource("/auth/login")
                    .wrap(login_limit)
                    .route(web::post().to(login)),
            )
            .service(verify_email);
    }
}
