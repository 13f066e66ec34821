use std::str::FromStr;

use cohort_core::{AppError, AppResult};
use cohort_domain::Reference;

/// Decodes a stored `Prefix/id` reference column.
pub(crate) fn decode_reference(value: &str, column: &str) -> AppResult<Reference> {
    Reference::parse(value).map_err(|error| {
        AppError::Internal(format!("failed to decode {column} '{value}': {error}"))
    })
}

/// Decodes an optional stored reference column.
pub(crate) fn decode_optional_reference(
    value: Option<&str>,
    column: &str,
) -> AppResult<Option<Reference>> {
    value
        .map(|value| decode_reference(value, column))
        .transpose()
}

/// Decodes a stored enum column through its `FromStr` implementation.
pub(crate) fn decode_value<T>(value: &str, column: &str) -> AppResult<T>
where
    T: FromStr<Err = AppError>,
{
    T::from_str(value).map_err(|error| {
        AppError::Internal(format!("failed to decode {column} '{value}': {error}"))
    })
}

/// Renders references as the strings stored in reference columns.
pub(crate) fn reference_values(references: &[Reference]) -> Vec<String> {
    references.iter().map(ToString::to_string).collect()
}
