use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tickerinfo_core::errors::Error as CoreError;
use tickerinfo_market_data::CatalogError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            ApiError::Core(e) => match e {
                CoreError::Catalog(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                CoreError::NoDataFound { .. } => (StatusCode::NOT_FOUND, "No data found".to_string()),
                CoreError::Cache(_) | CoreError::Unexpected(_) => {
                    tracing::error!("Lookup failed: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                }
            },
        };
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: msg,
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Core(CoreError::Catalog(err))
    }
}
