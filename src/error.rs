use failure::Fail;
use http::{method::Method, status::StatusCode};

/// Problems with the inbound HTTP request itself.
///
/// These never reach the GraphQL engine and are answered directly with a
/// client error status.
#[derive(Debug, Fail)]
pub enum RequestError {
    #[fail(display = "Operation not supported. Only POST is supported!")]
    UnsupportedMethod(Method),
    #[fail(display = "Invalid or Missing Content-type header")]
    InvalidContentType,
    #[fail(display = "Missing post body")]
    MissingPostBody,
    #[fail(display = "Invalid body")]
    InvalidBody,
    #[fail(display = "Body is not valid base64")]
    InvalidEncoding,
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::UnsupportedMethod(_) => StatusCode::NOT_IMPLEMENTED,
            RequestError::InvalidContentType
            | RequestError::MissingPostBody
            | RequestError::InvalidBody
            | RequestError::InvalidEncoding => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Fail)]
pub enum StoreError {
    #[fail(display = "Post {} does not exist", _0)]
    MissingPost(String),
}

/// Failures decoding an AppSync resolver invocation.
#[derive(Debug, Fail)]
pub enum ResolverError {
    #[fail(display = "Unsupported field: {}", _0)]
    UnsupportedField(String),
    #[fail(display = "Invalid arguments for field {}: {}", field, reason)]
    InvalidArguments { field: String, reason: String },
    #[fail(display = "Batch entry for {} is missing source.id", _0)]
    MissingSource(String),
}

/// Failures reading a CloudFormation custom resource event.
#[derive(Debug, Fail)]
pub enum BootstrapError {
    #[fail(display = "ResourceProperties.SqlScript is missing")]
    MissingScript,
}

/// Hands a `failure::Error` to the Lambda runtime, which only speaks
/// `std::error::Error`.
pub fn into_lambda_error(err: failure::Error) -> lambda_runtime::Error {
    Box::new(err.compat())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_errors_are_not_implemented() {
        let err = RequestError::UnsupportedMethod(Method::GET);
        assert_eq!(err.status_code(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(
            err.to_string(),
            "Operation not supported. Only POST is supported!"
        );
    }

    #[test]
    fn content_type_errors_are_client_errors() {
        let err = RequestError::InvalidContentType;
        assert!(err.status_code().is_client_error());
        assert!(err.to_string().contains("Content-type"));
    }

    #[test]
    fn lambda_error_keeps_message() {
        let err = into_lambda_error(StoreError::MissingPost("p1".into()).into());
        assert_eq!(err.to_string(), "Post p1 does not exist");
    }
}
