/// Error types for social-service
use document_store::{validate_id, StoreError};
use validator::ValidationErrors;

pub use error_types::{WriteError, WriteResult};

/// Flatten validator output into a single readable message
pub(crate) fn invalid(errors: ValidationErrors) -> WriteError {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();
    WriteError::InvalidInput(messages.join(", "))
}

/// Reject ids that are empty or would nest deeper than one path segment
pub(crate) fn check_id(kind: &str, id: &str) -> WriteResult<()> {
    validate_id(id).map_err(|_| {
        if id.is_empty() {
            WriteError::InvalidInput(format!("{} id must not be empty", kind))
        } else {
            WriteError::InvalidInput(format!("{} id '{}' is not a single segment", kind, id))
        }
    })
}

/// Path named by a failed existence precondition
pub(crate) fn precondition_path(err: &StoreError) -> Option<&str> {
    match err {
        StoreError::NotFound(path) | StoreError::AlreadyExists(path) => Some(path.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(length(max = 2))]
        job: String,
    }

    #[test]
    fn test_check_id() {
        assert!(check_id("User", "u1").is_ok());
        assert_eq!(
            check_id("User", ""),
            Err(WriteError::InvalidInput("User id must not be empty".into()))
        );
        assert!(matches!(
            check_id("Post", "p1/likes/u2"),
            Err(WriteError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_invalid_collects_messages() {
        let form = Form {
            name: String::new(),
            job: "long".into(),
        };
        let err = invalid(form.validate().unwrap_err());
        assert_eq!(
            err,
            WriteError::InvalidInput("Name is required, job is invalid".into())
        );
    }
}
