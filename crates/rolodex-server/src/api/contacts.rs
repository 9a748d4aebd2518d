//! Contact CRUD endpoints.
//!
//! Contacts travel as JSON:
//!
//! ```json
//! {"id": "0190b2c4-...", "firstname": "john", "lastname": "smith", "birthday": "1999-12-31"}
//! ```
//!
//! `id` is ignored on input. `birthday` must be a `YYYY-MM-DD` date; any
//! other format is rejected with 422.

use std::sync::Arc;

use chrono::NaiveDate;
use http::{Method, StatusCode};
use rolodex_core::{Contact, ContactId, ContactService};
use rolodex_middleware::{Response, ResponseExt};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::handler::{handler_fn, json_response, ApiResult, RequestParts};
use crate::router::Router;

/// Date format of the `birthday` field.
pub const BIRTHDAY_FORMAT: &str = "%Y-%m-%d";

/// Default page of `GET /contacts`.
pub const DEFAULT_PAGE: usize = 1;

/// Default page size of `GET /contacts`.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: usize = 100;

/// Shared service handle used by the handlers.
pub type SharedService = Arc<dyn ContactService>;

/// Contact as accepted by `POST` and `PUT`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactBody {
    /// First name.
    pub firstname: String,
    /// Last name.
    pub lastname: String,
    /// Birthday, `YYYY-MM-DD`.
    pub birthday: String,
}

impl ContactBody {
    /// Validates the body into a contact without an id.
    pub fn into_contact(self) -> ApiResult<Contact> {
        let birthday = NaiveDate::parse_from_str(&self.birthday, BIRTHDAY_FORMAT)
            .map_err(|e| ApiError::validation(format!("invalid format for birthday: {e}")))?;
        Ok(Contact::new(self.firstname, self.lastname, birthday))
    }
}

/// Response of `POST /contacts`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedContact {
    /// Id of the new contact.
    pub id: ContactId,
}

/// Query of `GET /contacts`.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: usize,
    /// Contacts per page.
    #[serde(default = "default_size")]
    pub size: usize,
}

fn default_page() -> usize {
    DEFAULT_PAGE
}

fn default_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl ListQuery {
    /// Validates the query and returns `(offset, limit)`.
    ///
    /// ```rust
    /// use rolodex_server::api::contacts::ListQuery;
    ///
    /// let query = ListQuery { page: 3, size: 20 };
    /// assert_eq!(query.window().unwrap(), (40, 20));
    /// ```
    pub fn window(self) -> ApiResult<(usize, usize)> {
        if self.page < 1 {
            return Err(ApiError::validation("page: expected number >= 1"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.size) {
            return Err(ApiError::validation(format!(
                "size: expected number between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        let offset = (self.page - 1)
            .checked_mul(self.size)
            .ok_or_else(|| ApiError::validation("page: out of range"))?;
        Ok((offset, self.size))
    }
}

/// Registers the contact endpoints.
pub fn register(router: &mut Router, service: SharedService) {
    let svc = Arc::clone(&service);
    router.route(
        Method::POST,
        "/contacts",
        handler_fn(move |parts| create(Arc::clone(&svc), parts)),
    );

    let svc = Arc::clone(&service);
    router.route(
        Method::GET,
        "/contacts",
        handler_fn(move |parts| list(Arc::clone(&svc), parts)),
    );

    let svc = Arc::clone(&service);
    router.route(
        Method::GET,
        "/contacts/{id}",
        handler_fn(move |parts| read(Arc::clone(&svc), parts)),
    );

    let svc = Arc::clone(&service);
    router.route(
        Method::PUT,
        "/contacts/{id}",
        handler_fn(move |parts| update(Arc::clone(&svc), parts)),
    );

    router.route(
        Method::DELETE,
        "/contacts/{id}",
        handler_fn(move |parts| delete(Arc::clone(&service), parts)),
    );
}

async fn create(service: SharedService, parts: RequestParts) -> ApiResult<Response> {
    let contact = parts.json::<ContactBody>()?.into_contact()?;
    let id = service.create(contact)?;
    tracing::debug!(%id, "contact created");
    Ok(json_response(StatusCode::OK, &CreatedContact { id }))
}

async fn list(service: SharedService, parts: RequestParts) -> ApiResult<Response> {
    let (offset, limit) = parts.query::<ListQuery>()?.window()?;
    let contacts = service.list(offset, limit)?;
    Ok(json_response(StatusCode::OK, &contacts))
}

async fn read(service: SharedService, parts: RequestParts) -> ApiResult<Response> {
    let id: ContactId = parts.parse_param("id")?;
    let contact = service.read(id)?;
    Ok(json_response(StatusCode::OK, &contact))
}

async fn update(service: SharedService, parts: RequestParts) -> ApiResult<Response> {
    let id: ContactId = parts.parse_param("id")?;
    let contact = parts.json::<ContactBody>()?.into_contact()?;
    service.update(id, contact)?;
    Ok(Response::empty(StatusCode::NO_CONTENT))
}

async fn delete(service: SharedService, parts: RequestParts) -> ApiResult<Response> {
    let id: ContactId = parts.parse_param("id")?;
    service.delete(id)?;
    Ok(Response::empty(StatusCode::NO_CONTENT))
}
