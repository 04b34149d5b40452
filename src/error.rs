use thiserror::Error;

/// Typed failures raised by the session core and by commands hitting
/// precondition violations.
///
/// Commands are free to fail with any error; this enum exists so the common
/// failure shapes keep a stable category label in containment reports, and so
/// precondition checks (e.g. "no dump loaded") stay distinguishable from
/// arbitrary inspection faults.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The current session state does not allow the operation, e.g. a heap
    /// command was issued without a loaded process or dump.
    #[error("{0}")]
    InvalidOperation(String),

    /// An argument parsed fine but is semantically unusable.
    #[error("{0}")]
    InvalidArgument(String),

    /// A persistent alias tried to use a name reserved for temporary aliases.
    #[error("alias name `{0}` is reserved for temporary aliases")]
    ReservedAliasName(String),
}

impl SessionError {
    /// Short category label used on the first line of a containment report.
    pub fn category(&self) -> &'static str {
        match self {
            SessionError::InvalidOperation(_) => "invalid operation",
            SessionError::InvalidArgument(_) => "invalid argument",
            SessionError::ReservedAliasName(_) => "reserved alias name",
        }
    }
}

/// Category label for an arbitrary command failure.
///
/// Walks the error chain so a [`SessionError`] keeps its specific label even
/// when wrapped with context; anything unrecognized reports as plain "error".
pub fn error_category(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(session) = cause.downcast_ref::<SessionError>() {
            return session.category();
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return "i/o error";
        }
    }
    "error"
}
