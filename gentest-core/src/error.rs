//! Error taxonomy for a generation run
//!
//! Every variant is terminal: a run either emits a complete scaffold or
//! surfaces one of these and writes nothing.

/// Errors that abort a generation run.
#[derive(Debug, thiserror::Error)]
pub enum GentestError {
    #[error("not found function with offset {offset}")]
    NotFound { offset: usize },

    #[error("no function declaration is documented with comment {comment:?}")]
    CommentNotFound { comment: String },

    #[error("comment {comment:?} documents {count} function declarations, expected exactly one")]
    AmbiguousComment { comment: String, count: usize },

    #[error("failed to resolve signature of {function}: {reason}")]
    SignatureResolution { function: String, reason: String },

    #[error("failed to render test code: {message}\n{buffer}")]
    Render { message: String, buffer: String },

    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the engine.
pub type Result<T, E = GentestError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_carries_buffer() {
        let err = GentestError::Render {
            message: "syntax error".to_string(),
            buffer: "func TestX(t *testing.T) {".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("syntax error"));
        assert!(text.contains("func TestX(t *testing.T) {"));
    }

    #[test]
    fn test_not_found_mentions_offset() {
        let err = GentestError::NotFound { offset: 42 };
        assert_eq!(err.to_string(), "not found function with offset 42");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: GentestError = io.into();
        assert!(matches!(err, GentestError::Io(_)));
    }
}
