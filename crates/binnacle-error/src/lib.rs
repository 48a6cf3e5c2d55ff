use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::ops::Deref;

#[cfg(feature = "backtrace")]
use std::backtrace::Backtrace;

pub type BinnacleResult<T> = Result<T, BinnacleError>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidSchema,
    InvalidParameter,
    Evaluation,
    Transport,
    Io,
    Serde,
    Multiple,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrString(Cow<'static, str>);

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: Into<Cow<'static, str>>> From<T> for ErrString {
    fn from(v: T) -> Self {
        Self(v.into())
    }
}

/// The error taxonomy shared by the schema/tree layer, the client pipeline, and the server.
///
/// `InvalidSchema` is the only variant meant to abort a process outright (at startup, on a
/// malformed gene template); everything else is meant to be logged and swallowed at a task
/// boundary per the optimizer's best-effort-continuity policy.
#[derive(Debug)]
pub enum BinnacleError {
    InvalidSchema {
        message: ErrString,
    },
    InvalidParameter {
        message: ErrString,
    },
    Evaluation {
        message: ErrString,
    },
    Transport {
        message: ErrString,
    },
    Io {
        message: ErrString,
        source: Option<std::io::Error>,
    },
    Serde {
        message: ErrString,
    },

    Multiple(MultiDisplay),

    Context {
        context: ErrorContext,
        source: Box<BinnacleError>,
        #[cfg(feature = "backtrace")]
        backtrace: Backtrace,
    },
}

impl BinnacleError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidSchema { .. } => ErrorCode::InvalidSchema,
            Self::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            Self::Evaluation { .. } => ErrorCode::Evaluation,
            Self::Transport { .. } => ErrorCode::Transport,
            Self::Io { .. } => ErrorCode::Io,
            Self::Serde { .. } => ErrorCode::Serde,
            Self::Multiple(_) => ErrorCode::Multiple,
            Self::Context { .. } => ErrorCode::Context,
        }
    }

    pub fn with_context(self, msg: impl Into<String>) -> Self {
        BinnacleError::Context {
            context: ErrorContext::new(msg),
            source: Box::new(self),
            #[cfg(feature = "backtrace")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Errors that the best-effort-continuity policy swallows at a task boundary
    /// rather than propagating as a process-ending failure.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.code(), ErrorCode::InvalidSchema)
    }
}

impl Display for BinnacleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSchema { message } => write!(f, "invalid gene schema: {}", message),
            Self::InvalidParameter { message } => write!(f, "invalid parameter: {}", message),
            Self::Evaluation { message } => write!(f, "evaluation failed: {}", message),
            Self::Transport { message } => write!(f, "transport error: {}", message),
            Self::Io { message, .. } => write!(f, "io error: {}", message),
            Self::Serde { message } => write!(f, "serialization error: {}", message),
            Self::Multiple(m) => write!(f, "multiple errors:\n{}", m),
            Self::Context {
                context, source, ..
            } => write!(f, "{}\ncaused by: {}", context, source),
        }
    }
}

impl std::error::Error for BinnacleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io {
                source: Some(e), ..
            } => Some(e),
            Self::Context { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct ErrorContext {
    message: String,
}
impl ErrorContext {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}
impl Display for ErrorContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
impl std::error::Error for ErrorContext {}

#[derive(Debug)]
pub struct MultiDisplay(Vec<BinnacleError>);
impl Display for MultiDisplay {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[{}] {} (code: {:?})", i, e, e.code())?;
        }
        Ok(())
    }
}
impl From<Vec<BinnacleError>> for MultiDisplay {
    fn from(v: Vec<BinnacleError>) -> Self {
        Self(v)
    }
}

impl From<std::io::Error> for BinnacleError {
    fn from(source: std::io::Error) -> Self {
        BinnacleError::Io {
            message: source.to_string().into(),
            source: Some(source),
        }
    }
}

impl From<serde_json::Error> for BinnacleError {
    fn from(source: serde_json::Error) -> Self {
        BinnacleError::Serde {
            message: source.to_string().into(),
        }
    }
}

impl From<serde_yaml::Error> for BinnacleError {
    fn from(source: serde_yaml::Error) -> Self {
        BinnacleError::Serde {
            message: source.to_string().into(),
        }
    }
}

pub trait ResultExt<T> {
    fn context(self, msg: impl Into<String>) -> BinnacleResult<T>;
    fn with_context<F: FnOnce() -> String>(self, f: F) -> BinnacleResult<T>;
}

impl<T, E: Into<BinnacleError>> ResultExt<T> for Result<T, E> {
    fn context(self, msg: impl Into<String>) -> BinnacleResult<T> {
        self.map_err(|e| e.into().with_context(msg))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> BinnacleResult<T> {
        self.map_err(|e| e.into().with_context(f()))
    }
}

pub trait IntoBinnacleError<T> {
    fn into_binnacle_error(self) -> BinnacleResult<T>;
}
impl<T, E: Into<BinnacleError>> IntoBinnacleError<T> for Result<T, E> {
    fn into_binnacle_error(self) -> BinnacleResult<T> {
        self.map_err(Into::into)
    }
}

#[doc(hidden)]
pub mod __private {
    #[inline]
    #[cold]
    #[must_use]
    pub fn must_use<E>(e: E) -> E {
        e
    }
}

#[macro_export]
macro_rules! binnacle_err {
    (InvalidSchema: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::BinnacleError::InvalidSchema { message: format!($fmt, $($arg),*).into() })
    };
    (InvalidParameter: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::BinnacleError::InvalidParameter { message: format!($fmt, $($arg),*).into() })
    };
    (Evaluation: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::BinnacleError::Evaluation { message: format!($fmt, $($arg),*).into() })
    };
    (Transport: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::BinnacleError::Transport { message: format!($fmt, $($arg),*).into() })
    };
    (Serde: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::BinnacleError::Serde { message: format!($fmt, $($arg),*).into() })
    };
}

#[macro_export]
macro_rules! binnacle_bail {
    ($($tt:tt)+) => { return Err($crate::binnacle_err!($($tt)+)) };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($tt:tt)+) => {
        if !$cond { $crate::binnacle_bail!($($tt)+); }
    };
}
