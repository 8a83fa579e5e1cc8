use crate::error::Error;

/// Human-readable description of a failed request.
///
/// Server answers read `Error <status>: <message>`; failures where no response was
/// received read `Error: <cause>`.
#[must_use]
pub fn describe(error: &Error) -> String {
    match error {
        Error::Api {
            status, message, ..
        } => format!("Error {status}: {message}"),
        other => format!("Error: {other}"),
    }
}

/// Log a failed request. The error itself is left for the caller.
pub(crate) fn report(operation: &'static str, path: &str, error: &Error) {
    tracing::error!(operation, path, status = ?error.status(), "{}", describe(error));
}
