use vidseek_core::error::{CoreError, ValidationErrors};

use crate::table::TableError;

/// Errors returned by the favorite and search history repositories.
///
/// Absent items on delete are not errors; those operations return
/// `Ok(false)`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Favorite already exists: user {user_id}, video {video_id}")]
    AlreadyExists { user_id: String, video_id: String },

    #[error("Favorite limit of {limit} reached")]
    QuotaExceeded { limit: usize },

    #[error(transparent)]
    Backend(#[from] TableError),
}

impl From<ValidationErrors> for StoreError {
    fn from(errors: ValidationErrors) -> Self {
        StoreError::Validation(errors)
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(errors) => CoreError::Validation(errors),
            StoreError::AlreadyExists { .. } | StoreError::QuotaExceeded { .. } => {
                CoreError::Conflict(err.to_string())
            }
            StoreError::Backend(e) => CoreError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn validation_maps_to_core_validation() {
        let mut errors = ValidationErrors::new();
        errors.push("userId is required");
        let core = CoreError::from(StoreError::from(errors.clone()));
        assert_matches!(core, CoreError::Validation(e) if e == errors);
    }

    #[test]
    fn duplicate_and_quota_map_to_conflict() {
        let duplicate = StoreError::AlreadyExists {
            user_id: "user-1".into(),
            video_id: "vid-1".into(),
        };
        assert_matches!(
            CoreError::from(duplicate),
            CoreError::Conflict(msg) if msg == "Favorite already exists: user user-1, video vid-1"
        );
        assert_matches!(
            CoreError::from(StoreError::QuotaExceeded { limit: 100 }),
            CoreError::Conflict(msg) if msg == "Favorite limit of 100 reached"
        );
    }

    #[test]
    fn backend_failure_maps_to_internal() {
        let err = StoreError::from(TableError::ConditionalCheckFailed);
        assert_matches!(
            CoreError::from(err),
            CoreError::Internal(msg) if msg == "Conditional check failed"
        );
    }
}
