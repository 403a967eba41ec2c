//! SDK error classification

use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use cloudsweep_core::{ApiError, CloudsweepError};

const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
    "AuthFailure",
    "InvalidClientTokenId",
    "UnrecognizedClientException",
    "SignatureDoesNotMatch",
];

const NOT_ENABLED_CODES: &[&str] = &[
    "OptInRequired",
    "SubscriptionRequiredException",
    "InvalidRegion",
];

const THROTTLED_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
];

/// Classify a service error by its error code
pub fn classify_code(code: &str, message: &str) -> ApiError {
    let code = code.to_string();
    let message = message.to_string();

    if ACCESS_DENIED_CODES.contains(&code.as_str()) {
        ApiError::AccessDenied { code, message }
    } else if NOT_ENABLED_CODES.contains(&code.as_str()) {
        ApiError::NotEnabled { code, message }
    } else if THROTTLED_CODES.contains(&code.as_str()) {
        ApiError::Throttled { code, message }
    } else {
        ApiError::Service { code, message }
    }
}

/// Convert an SDK failure into a provider error.
///
/// Anything that never reached the service (timeouts, DNS, TLS, signing)
/// is a transport error.
pub fn sdk_error<E, R>(err: SdkError<E, R>) -> CloudsweepError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let api = match &err {
        SdkError::ServiceError(service) => {
            let inner = service.err();
            classify_code(inner.code().unwrap_or("Unknown"), inner.message().unwrap_or_default())
        }
        _ => ApiError::Transport(DisplayErrorContext(&err).to_string()),
    };
    CloudsweepError::Api(api)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_codes() {
        assert_eq!(classify_code("UnauthorizedOperation", "no").kind(), "access_denied");
        assert_eq!(classify_code("AuthFailure", "no").kind(), "access_denied");
        assert_eq!(classify_code("OptInRequired", "no").kind(), "not_enabled");
        assert_eq!(classify_code("RequestLimitExceeded", "slow").kind(), "throttled");
    }

    #[test]
    fn test_unknown_code_is_service_error() {
        let err = classify_code("InvalidParameterValue", "bad filter");
        assert_eq!(
            err,
            ApiError::Service {
                code: "InvalidParameterValue".to_string(),
                message: "bad filter".to_string(),
            }
        );
    }
}
