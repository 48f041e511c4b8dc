use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use market_engine::{MarketplaceError, NotificationApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request is not allowed. {0}")]
    BadRequest(String),
    #[error("The record has changed since it was read. {0}")]
    Conflict(String),
    #[error("The request cannot be processed in the current state. {0}")]
    Unprocessable(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("The {0} header is missing.")]
    MissingHeader(&'static str),
    #[error("The {0} header is not valid. {1}")]
    InvalidHeader(&'static str, String),
}

impl From<MarketplaceError> for ServerError {
    fn from(e: MarketplaceError) -> Self {
        match e {
            MarketplaceError::InvalidTransition { .. } |
            MarketplaceError::InvalidOrder(_) |
            MarketplaceError::InvalidPaymentProof(_) => Self::BadRequest(e.to_string()),
            MarketplaceError::ForbiddenActor(_) => Self::InsufficientPermissions(e.to_string()),
            MarketplaceError::OrderNotFound(_) |
            MarketplaceError::PaymentProofNotFound(_) |
            MarketplaceError::NotificationNotFound(_) => Self::NoRecordFound(e.to_string()),
            MarketplaceError::StaleState { .. } | MarketplaceError::PaymentProofAlreadyReviewed { .. } => {
                Self::Conflict(e.to_string())
            },
            MarketplaceError::CommissionNotTriggered { .. } => Self::Unprocessable(e.to_string()),
            MarketplaceError::DatabaseError(_) => Self::BackendError(e.to_string()),
            MarketplaceError::LedgerInconsistency(_) => {
                error!("💻️ {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<NotificationApiError> for ServerError {
    fn from(e: NotificationApiError) -> Self {
        MarketplaceError::from(e).into()
    }
}
