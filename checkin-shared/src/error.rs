//! Error types for the check-in services

/// Errors from attendance marking, searching and reporting
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Student or class id does not exist
    #[error("Invalid student or class")]
    InvalidStudentOrClass,

    /// Class id does not exist (batch check-in)
    #[error("Invalid class")]
    InvalidClass,

    /// Requested class does not exist (reports, kiosk)
    #[error("Class {0} not found")]
    ClassNotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ServiceError::InvalidStudentOrClass.to_string(),
            "Invalid student or class"
        );
        assert_eq!(ServiceError::ClassNotFound(4).to_string(), "Class 4 not found");
    }
}
