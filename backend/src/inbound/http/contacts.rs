//! Contacts API handlers.
//!
//! ```text
//! GET    /api/contacts?skip=0&limit=10
//! GET    /api/contacts/search?first_name=Ada
//! GET    /api/contacts/soon_celebrate?days=7
//! POST   /api/contacts/signup        (alias: POST /api/contacts)
//! GET    /api/contacts/me
//! GET    /api/contacts/{id}
//! PATCH  /api/contacts/{id}
//! PATCH  /api/contacts/avatar
//! DELETE /api/contacts/{id}
//! ```

use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, delete, get, patch, web};
use tracing::debug;

use crate::domain::ports::SignupRequest;
use crate::domain::directory_service::CONTACT_NOT_FOUND;
use crate::domain::{ContactId, ContactPatch, ContactSearch, DEFAULT_WINDOW_DAYS, Error, PageRequest};

use super::ApiResult;
use super::bearer::CurrentContact;
use super::contacts_dto::{
    ContactResponse, ListQuery, PatchBody, SearchQuery, SignupBody, SoonCelebrateQuery,
    contact_list,
};
use super::state::HttpState;

/// Largest accepted avatar upload.
pub const AVATAR_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Digits beyond the key range name a contact that cannot exist.
fn contact_id(raw: &str) -> Result<ContactId, Error> {
    raw.parse::<i32>()
        .map(ContactId::new)
        .map_err(|_| Error::not_found(CONTACT_NOT_FOUND))
}

/// List contacts ordered by id.
#[utoipa::path(
    get,
    path = "/api/contacts",
    params(ListQuery),
    responses(
        (status = 200, description = "Contacts page", body = [ContactResponse]),
        (status = 400, description = "Invalid pagination", body = Error)
    ),
    tags = ["contacts"],
    operation_id = "listContacts"
)]
#[get("/contacts")]
pub async fn list_contacts(
    state: web::Data<HttpState>,
    query: web::Query<ListQuery>,
) -> ApiResult<web::Json<Vec<ContactResponse>>> {
    let page = PageRequest::try_from(query.into_inner())?;
    let contacts = state.contacts.list(page).await?;
    Ok(web::Json(contact_list(contacts)))
}

/// Contacts matching every provided filter exactly.
#[utoipa::path(
    get,
    path = "/api/contacts/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching contacts", body = [ContactResponse]),
        (status = 400, description = "No filters supplied", body = Error)
    ),
    tags = ["contacts"],
    operation_id = "searchContacts"
)]
#[get("/contacts/search")]
pub async fn search_contacts(
    state: web::Data<HttpState>,
    query: web::Query<SearchQuery>,
) -> ApiResult<web::Json<Vec<ContactResponse>>> {
    let search = ContactSearch::try_from(query.into_inner())?;
    let contacts = state.contacts.search(&search).await?;
    Ok(web::Json(contact_list(contacts)))
}

/// Contacts whose birthday falls within the next `days` days.
#[utoipa::path(
    get,
    path = "/api/contacts/soon_celebrate",
    params(SoonCelebrateQuery),
    responses(
        (status = 200, description = "Upcoming birthdays", body = [ContactResponse]),
        (status = 400, description = "Window out of range", body = Error)
    ),
    tags = ["contacts"],
    operation_id = "soonCelebrate"
)]
#[get("/contacts/soon_celebrate")]
pub async fn soon_celebrate(
    state: web::Data<HttpState>,
    query: web::Query<SoonCelebrateQuery>,
) -> ApiResult<web::Json<Vec<ContactResponse>>> {
    let days = query.days.unwrap_or(DEFAULT_WINDOW_DAYS);
    let contacts = state.contacts.upcoming_birthdays(days).await?;
    Ok(web::Json(contact_list(contacts)))
}

/// Register an account. A verification email is sent in the background.
///
/// Also served at `POST /api/contacts`.
#[utoipa::path(
    post,
    path = "/api/contacts/signup",
    request_body = SignupBody,
    responses(
        (status = 201, description = "Account created", body = ContactResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 429, description = "Rate limit exceeded")
    ),
    tags = ["contacts"],
    operation_id = "signup",
    security([])
)]
pub async fn signup(
    state: web::Data<HttpState>,
    payload: web::Json<SignupBody>,
) -> ApiResult<HttpResponse> {
    let request = SignupRequest::try_from(payload.into_inner())?;
    let created = state.commands.signup(request).await?;
    Ok(HttpResponse::Created().json(ContactResponse::from(created)))
}

/// The authenticated account.
#[utoipa::path(
    get,
    path = "/api/contacts/me",
    responses(
        (status = 200, description = "Current account", body = ContactResponse),
        (status = 401, description = "Missing or invalid token", body = Error),
        (status = 429, description = "Rate limit exceeded")
    ),
    tags = ["contacts"],
    operation_id = "currentContact",
    security(("bearer" = []))
)]
pub async fn current_contact(current: CurrentContact) -> web::Json<ContactResponse> {
    web::Json(ContactResponse::from(current.into_inner()))
}

/// Fetch one contact.
#[utoipa::path(
    get,
    path = "/api/contacts/{id}",
    params(("id" = i32, Path, description = "Contact id")),
    responses(
        (status = 200, description = "Contact", body = ContactResponse),
        (status = 404, description = "Contact not found", body = Error)
    ),
    tags = ["contacts"],
    operation_id = "getContact"
)]
#[get("/contacts/{id:\\d+}")]
pub async fn get_contact(
    state: web::Data<HttpState>,
    id: web::Path<String>,
) -> ApiResult<web::Json<ContactResponse>> {
    let contact = state.contacts.get(contact_id(&id)?).await?;
    Ok(web::Json(ContactResponse::from(contact)))
}

/// Partially update the caller's own contact.
#[utoipa::path(
    patch,
    path = "/api/contacts/{id}",
    params(("id" = i32, Path, description = "Contact id")),
    request_body = PatchBody,
    responses(
        (status = 200, description = "Updated contact", body = ContactResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Missing or invalid token", body = Error),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "Contact not found", body = Error)
    ),
    tags = ["contacts"],
    operation_id = "updateContact",
    security(("bearer" = []))
)]
#[patch("/contacts/{id:\\d+}")]
pub async fn update_contact(
    state: web::Data<HttpState>,
    current: CurrentContact,
    id: web::Path<String>,
    payload: web::Json<PatchBody>,
) -> ApiResult<web::Json<ContactResponse>> {
    let id = contact_id(&id)?;
    let patch = ContactPatch::try_from(payload.into_inner())?;
    let updated = state
        .commands
        .update(current.contact(), id, patch)
        .await?;
    Ok(web::Json(ContactResponse::from(updated)))
}

/// Delete the caller's own contact.
#[utoipa::path(
    delete,
    path = "/api/contacts/{id}",
    params(("id" = i32, Path, description = "Contact id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Missing or invalid token", body = Error),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "Contact not found", body = Error)
    ),
    tags = ["contacts"],
    operation_id = "deleteContact",
    security(("bearer" = []))
)]
#[delete("/contacts/{id:\\d+}")]
pub async fn delete_contact(
    state: web::Data<HttpState>,
    current: CurrentContact,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = contact_id(&id)?;
    state
        .commands
        .delete(current.contact(), id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

fn image_content_type(req: &HttpRequest) -> Result<String, Error> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_default();
    if content_type.starts_with("image/") {
        Ok(content_type)
    } else {
        debug!(content_type, "rejected avatar upload");
        Err(Error::invalid_request("Avatar must be an image")
            .with_details(serde_json::json!({ "field": "content-type", "code": "not_an_image" })))
    }
}

/// Upload a new avatar for the caller. The body is the raw image.
#[utoipa::path(
    patch,
    path = "/api/contacts/avatar",
    request_body(content = Vec<u8>, content_type = "image/*", description = "Raw image bytes, at most 5 MiB"),
    responses(
        (status = 200, description = "Contact with new avatar", body = ContactResponse),
        (status = 400, description = "Not an image", body = Error),
        (status = 401, description = "Missing or invalid token", body = Error),
        (status = 503, description = "Image hosting unavailable", body = Error)
    ),
    tags = ["contacts"],
    operation_id = "updateAvatar",
    security(("bearer" = []))
)]
#[patch("/contacts/avatar")]
pub async fn update_avatar(
    state: web::Data<HttpState>,
    current: CurrentContact,
    req: HttpRequest,
    body: web::Bytes,
) -> ApiResult<web::Json<ContactResponse>> {
    let content_type = image_content_type(&req)?;
    if body.is_empty() {
        return Err(Error::invalid_request("Avatar image is empty"));
    }
    let updated = state
        .commands
        .upload_avatar(current.contact(), content_type, body.to_vec())
        .await?;
    Ok(web::Json(ContactResponse::from(updated)))
}

#[cfg(test)]
#[path = "contacts_tests.rs"]
mod tests;
