use std::fmt;

#[derive(Debug)]
pub enum SortError {
    Setup(String),
    Channel(String),
    Cancelled,
    Aborted { cause: Box<SortError>, cancelled: usize },
    Io(std::io::Error),
    Json(serde_json::Error),
    Other(String),
}

impl SortError {
    /// True for errors that only report another stage's failure.
    pub fn is_cascade(&self) -> bool {
        matches!(self, SortError::Cancelled | SortError::Channel(_))
    }
}

impl fmt::Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortError::Setup(e) => write!(f, "Setup error: {}", e),
            SortError::Channel(e) => write!(f, "Channel error: {}", e),
            SortError::Cancelled => write!(f, "Cancelled"),
            SortError::Aborted { cause, cancelled } => {
                write!(f, "Pipeline aborted: {} ({} other stages cancelled)", cause, cancelled)
            }
            SortError::Io(e) => write!(f, "IO error: {}", e),
            SortError::Json(e) => write!(f, "JSON error: {}", e),
            SortError::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for SortError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SortError::Aborted { cause, .. } => Some(cause.as_ref()),
            SortError::Io(e) => Some(e),
            SortError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SortError {
    fn from(err: std::io::Error) -> Self {
        SortError::Io(err)
    }
}

impl From<serde_json::Error> for SortError {
    fn from(err: serde_json::Error) -> Self {
        SortError::Json(err)
    }
}

impl From<crossbeam_channel::RecvError> for SortError {
    fn from(_: crossbeam_channel::RecvError) -> Self {
        SortError::Channel("upstream disconnected".to_string())
    }
}

impl<T> From<crossbeam_channel::SendError<T>> for SortError {
    fn from(_: crossbeam_channel::SendError<T>) -> Self {
        SortError::Channel("downstream disconnected".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aborted_display_names_cause() {
        let err = SortError::Aborted {
            cause: Box::new(SortError::Other("stage 2 panicked".to_string())),
            cancelled: 3,
        };
        let text = err.to_string();
        assert!(text.contains("stage 2 panicked"));
        assert!(text.contains("3 other stages"));
    }

    #[test]
    fn test_cascade_classification() {
        assert!(SortError::Cancelled.is_cascade());
        assert!(SortError::Channel("x".into()).is_cascade());
        assert!(!SortError::Setup("x".into()).is_cascade());
        assert!(!SortError::Other("x".into()).is_cascade());
    }
}
