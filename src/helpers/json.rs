use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use serde::Serialize;

/// Envelope for every API answer: `{message, item?, list?}`.
#[derive(Debug, Serialize)]
pub struct JsonResponse<T> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<T>>,
}

pub struct JsonResponseBuilder<T> {
    item: Option<T>,
    list: Option<Vec<T>>,
}

impl<T: Serialize> JsonResponse<T> {
    pub fn build() -> JsonResponseBuilder<T> {
        JsonResponseBuilder {
            item: None,
            list: None,
        }
    }
}

impl<T: Serialize> JsonResponseBuilder<T> {
    pub fn set_item(mut self, item: T) -> Self {
        self.item = Some(item);
        self
    }

    pub fn set_list(mut self, list: Vec<T>) -> Self {
        self.list = Some(list);
        self
    }

    pub fn ok(self, message: &str) -> web::Json<JsonResponse<T>> {
        web::Json(JsonResponse {
            message: message.to_string(),
            item: self.item,
            list: self.list,
        })
    }

    fn error(self, status: StatusCode, message: &str) -> actix_web::Error {
        let body = JsonResponse::<T> {
            message: message.to_string(),
            item: None,
            list: None,
        };
        InternalError::from_response(message.to_string(), HttpResponse::build(status).json(body))
            .into()
    }

    pub fn bad_request(self, message: &str) -> actix_web::Error {
        self.error(StatusCode::BAD_REQUEST, message)
    }

    /// Rejected request body; `message` carries the field errors.
    pub fn form_error(self, message: String) -> actix_web::Error {
        self.error(StatusCode::BAD_REQUEST, &message)
    }

    pub fn not_found(self, message: &str) -> actix_web::Error {
        self.error(StatusCode::NOT_FOUND, message)
    }

    pub fn internal_server_error(self, message: &str) -> actix_web::Error {
        let message = if message.trim().is_empty() {
            "Internal error"
        } else {
            message
        };
        self.error(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}
