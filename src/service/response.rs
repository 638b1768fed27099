// File: ./src/service/response.rs
// Uniform outcome type returned by every service operation.
use http::StatusCode;
use serde::{Serialize, Serializer};

fn status_as_u16<S: Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u16(status.as_u16())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse<T> {
    pub success: bool,
    pub message: String,
    pub response_object: Option<T>,
    #[serde(serialize_with = "status_as_u16")]
    pub status_code: StatusCode,
}

impl<T> ServiceResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            response_object: Some(data),
            status_code: StatusCode::OK,
        }
    }

    pub fn failure(message: impl Into<String>, status_code: StatusCode) -> Self {
        Self {
            success: false,
            message: message.into(),
            response_object: None,
            status_code,
        }
    }

    /// A failure that still carries a payload.
    pub fn failure_with(message: impl Into<String>, data: T, status_code: StatusCode) -> Self {
        Self {
            response_object: Some(data),
            ..Self::failure(message, status_code)
        }
    }

    /// Logs `err` and returns a 500 with a caller-facing message.
    pub fn internal_error(message: impl Into<String>, err: &anyhow::Error) -> Self {
        let message = message.into();
        log::error!("{}: {:#}", message, err);
        Self::failure(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn into_data(self) -> Option<T> {
        self.response_object
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let resp = ServiceResponse::success("Office hours found", vec![1, 2]);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["responseObject"], serde_json::json!([1, 2]));
        assert_eq!(json["statusCode"], 200);

        let fail: ServiceResponse<()> = ServiceResponse::failure("nope", StatusCode::NOT_FOUND);
        let json = serde_json::to_value(&fail).unwrap();
        assert_eq!(json["statusCode"], 404);
        assert!(json["responseObject"].is_null());
    }
}
