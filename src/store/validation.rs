//! Field validation for project records.

use super::{NewProject, StoreError, StoreResult};
use crate::timeline::{parse_start_date, STAGE_COUNT};

/// Check the fields every stored project must satisfy.
///
/// Returns one message per problem, in field order.
pub fn validate_fields(name: &str, start_date: &str, stage: Option<u8>) -> Vec<String> {
    let mut errors = Vec::new();

    if name.trim().chars().count() < 2 {
        errors.push("Project name must be at least 2 characters long".to_string());
    }

    if start_date.trim().is_empty() {
        errors.push("Start date is required".to_string());
    } else if parse_start_date(start_date).is_none() {
        errors.push("Start date must be a valid date".to_string());
    }

    if let Some(stage) = stage {
        if !(1..=STAGE_COUNT).contains(&stage) {
            errors.push(format!("Stage must be between 1 and {STAGE_COUNT}"));
        }
    }

    errors
}

/// Validate creation input, joining all messages with `", "`.
pub fn validate_project(input: &NewProject) -> StoreResult<()> {
    let errors = validate_fields(&input.name, &input.start_date, input.stage);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(StoreError::Validation(errors.join(", ")))
    }
}
