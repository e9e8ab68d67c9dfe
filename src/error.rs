use thiserror::Error;

/// Kinds of failure a handler can report. Each kind carries the HTTP status
/// code the formatter answers with and the name echoed as `code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    AuthRequired,
    AccessDenied,
    NotFound,
    TooManyRequests,
    Server,
    /// Unannotated failure, e.g. a validation error or a bubbled-up library error.
    Generic,
    Other { name: String, status_code: u16 },
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::AuthRequired => 401,
            ErrorKind::AccessDenied => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::TooManyRequests => 429,
            ErrorKind::Server | ErrorKind::Generic => 500,
            ErrorKind::Other { status_code, .. } => *status_code,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ErrorKind::BadRequest => "BadRequestError",
            ErrorKind::AuthRequired => "AuthRequiredError",
            ErrorKind::AccessDenied => "AccessDeniedError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::TooManyRequests => "TooManyRequestsError",
            ErrorKind::Server => "ServerError",
            ErrorKind::Generic => "Error",
            ErrorKind::Other { name, .. } => name,
        }
    }

    fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "400: Bad Request",
            ErrorKind::AuthRequired => "401: Authorization Required",
            ErrorKind::AccessDenied => "403: Access Denied",
            ErrorKind::NotFound => "404: Not Found",
            ErrorKind::TooManyRequests => "429: Too Many Requests",
            ErrorKind::Server => "500: Server Error",
            ErrorKind::Generic | ErrorKind::Other { .. } => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    kind: ErrorKind,
    message: String,
}

impl HandlerError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    // Typed error carrying the kind's stock message
    pub fn of_kind(kind: ErrorKind) -> Self {
        let message = kind.default_message().to_string();
        Self { kind, message }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn auth_required(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthRequired, message)
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AccessDenied, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TooManyRequests, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Server, message)
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Generic, message)
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &str {
        self.kind.name()
    }
}

impl From<ValidationError> for HandlerError {
    fn from(error: ValidationError) -> Self {
        HandlerError::generic(error.to_string())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(error: serde_json::Error) -> Self {
        HandlerError::generic(error.to_string())
    }
}

impl From<lambda_runtime::Error> for HandlerError {
    fn from(error: lambda_runtime::Error) -> Self {
        match error.downcast::<HandlerError>() {
            Ok(typed) => *typed,
            Err(other) => HandlerError::generic(other.to_string()),
        }
    }
}

/// Rejections produced while checking declared inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required field \"{field}\"")]
    MissingField { field: String },

    #[error("Invalid field \"{field}\", must be of type \"{expected}\"")]
    WrongType { field: String, expected: String },

    #[error("Invalid type description \"{description}\" for field \"{field}\": {reason}")]
    BadTypeDescription {
        field: String,
        description: String,
        reason: String,
    },

    #[error("Invalid field \"{field}\"")]
    Rejected { field: String },

    #[error("Invalid field \"{field}\": {detail}")]
    RejectedWith { field: String, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_errors_carry_status_and_name() {
        let err = HandlerError::too_many_requests("Invalid XYZ.");
        assert_eq!(err.status_code(), 429);
        assert_eq!(err.name(), "TooManyRequestsError");
        assert_eq!(err.message(), "Invalid XYZ.");
    }

    #[test]
    fn stock_messages_fill_in_when_absent() {
        assert_eq!(
            HandlerError::of_kind(ErrorKind::AuthRequired).message(),
            "401: Authorization Required"
        );
        assert_eq!(HandlerError::of_kind(ErrorKind::NotFound).status_code(), 404);
    }

    #[test]
    fn validation_errors_become_generic_500s() {
        let err: HandlerError = ValidationError::WrongType {
            field: "num".to_string(),
            expected: "Number".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.name(), "Error");
        assert_eq!(err.message(), "Invalid field \"num\", must be of type \"Number\"");
    }

    #[test]
    fn boxed_handler_errors_keep_their_kind() {
        let boxed: lambda_runtime::Error = Box::new(HandlerError::access_denied("nope"));
        let err = HandlerError::from(boxed);
        assert_eq!(err.kind(), &ErrorKind::AccessDenied);

        let plain: lambda_runtime::Error = "boom".into();
        assert_eq!(HandlerError::from(plain).kind(), &ErrorKind::Generic);
    }

    #[test]
    fn custom_kinds_report_their_own_code() {
        let err = HandlerError::new(
            ErrorKind::Other {
                name: "ConflictError".to_string(),
                status_code: 409,
            },
            "already exists",
        );
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.name(), "ConflictError");
    }
}
