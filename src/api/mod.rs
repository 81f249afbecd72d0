//! REST API module.
//!
//! Bodies are bare records or arrays of records; failures use the
//! [`ErrorResponse`](crate::errors::ErrorResponse) envelope.

mod documents;

pub use documents::*;

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::errors::AppError;

/// Response type for handlers: a status with a JSON body, or an error.
pub type ApiResult<T> = Result<(StatusCode, Json<T>), AppError>;

/// 200 with a JSON body.
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(data)))
}

/// 201 with a JSON body.
pub fn created<T: Serialize>(data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(data)))
}

/// JSON body extractor whose rejections use the API error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => AppError::Validation(e.body_text()),
            other => AppError::BadRequest(other.body_text()),
        }
    }
}
