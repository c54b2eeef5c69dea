//! Error values for reviewctl-server
//!
//! Every failure in the service is an [`Error`] record: a stable
//! [`ErrorKind`] (the machine code clients match on), a human message,
//! an optional wrapped cause, a small parameter map and the stack trace
//! captured where the error was created.
//!
//! Parameters are an open registry keyed by string. The keys the service
//! itself understands live in [`params`]; the HTTP boundary reads
//! [`params::HTTP_STATUS`] to pick a response status.

use std::backtrace::Backtrace;
use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Well-known parameter keys.
pub mod params {
    /// HTTP status code (JSON number) the boundary should respond with.
    pub const HTTP_STATUS: &str = "http_status";

    /// Field name -> problem description (JSON object).
    pub const VALIDATION_ERRORS: &str = "validation_errors";
}

/// Closed set of error kinds exposed at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoUserId,
    NoTeamName,
    TeamExists,
    NotFound,
    PrExists,
    PrMerged,
    NotAssigned,
    NoCandidate,
    Internal,
}

impl ErrorKind {
    /// Stable machine code.
    pub fn code(self) -> &'static str {
        match self {
            Self::NoUserId => "NO_USER_ID",
            Self::NoTeamName => "NO_TEAM_NAME",
            Self::TeamExists => "TEAM_EXISTS",
            Self::NotFound => "NOT_FOUND",
            Self::PrExists => "PR_EXISTS",
            Self::PrMerged => "PR_MERGED",
            Self::NotAssigned => "NOT_ASSIGNED",
            Self::NoCandidate => "NO_CANDIDATE",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            Self::NoUserId => "no user_id provided",
            Self::NoTeamName => "no team_name provided",
            Self::TeamExists => "team_name already exists",
            Self::NotFound => "resource not found",
            Self::PrExists => "PR id already exists",
            Self::PrMerged => "cannot reassign on merged PR",
            Self::NotAssigned => "reviewer is not assigned to this PR",
            Self::NoCandidate => "no active replacement candidate in team",
            Self::Internal => "internal error",
        }
    }

    /// HTTP status seeded into the parameters of every error of this kind.
    /// `None` leaves the choice to the boundary (500).
    pub fn default_status(self) -> Option<u16> {
        match self {
            Self::NoUserId | Self::NoTeamName | Self::TeamExists => Some(400),
            Self::NotFound => Some(404),
            Self::PrExists | Self::PrMerged | Self::NotAssigned | Self::NoCandidate => Some(409),
            Self::Internal => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Key/value parameters attached to an error.
pub type Params = BTreeMap<String, Value>;

/// Stack trace captured at error construction.
///
/// Capture honours `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`, so it costs
/// nothing unless enabled.
pub struct StackTrace(Backtrace);

impl StackTrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Display for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

/// Domain error record
#[derive(Error, Debug)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    cause: Option<BoxError>,
    params: Params,
    stack: StackTrace,
}

impl Error {
    /// New error of `kind` with the kind's default message and parameters.
    pub fn new(kind: ErrorKind) -> Self {
        let mut params = Params::new();
        if let Some(status) = kind.default_status() {
            params.insert(params::HTTP_STATUS.to_owned(), Value::from(status));
        }

        Self {
            kind,
            message: kind.default_message().to_owned(),
            cause: None,
            params,
            stack: StackTrace::capture(),
        }
    }

    /// Wrap a lower-level error as `kind`.
    pub fn wrap<E>(kind: ErrorKind, cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        let mut err = Self::new(kind);
        err.cause = Some(cause.into());
        err
    }

    /// Internal error wrapping `cause`.
    pub fn internal<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::wrap(ErrorKind::Internal, cause)
    }

    /// Internal error with a diagnostic message and no cause.
    pub fn internal_msg(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal).with_message(message)
    }

    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_status(self, status: u16) -> Self {
        self.with_param(params::HTTP_STATUS, status)
    }

    pub fn with_validation_errors(self, errors: BTreeMap<String, String>) -> Self {
        let map = errors
            .into_iter()
            .map(|(field, problem)| (field, Value::String(problem)))
            .collect::<serde_json::Map<_, _>>();
        self.with_param(params::VALIDATION_ERRORS, Value::Object(map))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// HTTP status from the parameters, if one was recorded.
    pub fn status(&self) -> Option<u16> {
        self.param(params::HTTP_STATUS)
            .and_then(Value::as_u64)
            .and_then(|status| u16::try_from(status).ok())
    }

    pub fn stack_trace(&self) -> &StackTrace {
        &self.stack
    }

    /// Message followed by every cause, `outer: inner: innermost`.
    pub fn chain(&self) -> String {
        let mut out = self.message.clone();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push_str(": ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Self::internal(e).with_message("database error")
    }
}
