use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("driver is picking up a passenger")]
    DriverMidClaim,

    #[error("cannot deactivate beacon within {0} minutes of last activity")]
    DwellTooShort(i64),

    #[error("driver not verified or completed")]
    NotEligible,

    #[error("driver not found")]
    DriverNotFound,

    #[error("no drivers found nearby")]
    NoDriversNearby,

    #[error("failed to create work log: {0}")]
    WorkLogCreate(String),

    #[error("failed to record activity: {0}")]
    ActivityInsert(String),

    #[error("status and active same as last activity")]
    DuplicateTransition,

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Stable sub-code callers use to disambiguate rejections.
    pub fn code(&self) -> u16 {
        match self {
            DomainError::DriverMidClaim => 4001,
            DomainError::DwellTooShort(_) => 4002,
            DomainError::NotEligible => 4003,
            DomainError::DriverNotFound | DomainError::NoDriversNearby => 4004,
            DomainError::WorkLogCreate(_) => 4005,
            DomainError::ActivityInsert(_) => 4006,
            DomainError::DuplicateTransition => 4007,
            DomainError::Internal(_) => 5000,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            DomainError::DriverNotFound | DomainError::NoDriversNearby => StatusCode::NOT_FOUND,
            DomainError::NotEligible => StatusCode::UNAUTHORIZED,
            DomainError::DriverMidClaim
            | DomainError::DwellTooShort(_)
            | DomainError::WorkLogCreate(_)
            | DomainError::ActivityInsert(_)
            | DomainError::DuplicateTransition => StatusCode::CONFLICT,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::DomainError;

    #[test]
    fn codes_are_stable() {
        assert_eq!(DomainError::DriverMidClaim.code(), 4001);
        assert_eq!(DomainError::DwellTooShort(10).code(), 4002);
        assert_eq!(DomainError::NotEligible.code(), 4003);
        assert_eq!(DomainError::DriverNotFound.code(), 4004);
        assert_eq!(DomainError::NoDriversNearby.code(), 4004);
        assert_eq!(DomainError::WorkLogCreate("db".into()).code(), 4005);
        assert_eq!(DomainError::ActivityInsert("db".into()).code(), 4006);
        assert_eq!(DomainError::DuplicateTransition.code(), 4007);
    }
}
