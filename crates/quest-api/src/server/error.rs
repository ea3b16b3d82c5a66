#[derive(Debug)]
pub enum ServerError {
    Io(std::io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "server io error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<std::io::Error> for ServerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug)]
struct HttpApiError {
    status: StatusCode,
    error: ApiError,
}

impl HttpApiError {
    fn status_for(code: ErrorCode) -> StatusCode {
        match code {
            ErrorCode::ZoneNotFound | ErrorCode::ProblemNotFound | ErrorCode::McqNotFound => {
                StatusCode::NOT_FOUND
            }
            ErrorCode::ZoneLocked => StatusCode::FORBIDDEN,
            ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ApiError> for HttpApiError {
    fn from(error: ApiError) -> Self {
        Self {
            status: Self::status_for(error.error_code),
            error,
        }
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}
