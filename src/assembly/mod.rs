//! Rules of the assembly cycle: registration deadline, roster limits,
//! delegate identification, the enrollment and calendar forms and state
//! reports.

pub mod calendar;
pub mod deadline;
pub mod enrollment;
pub mod identity;
pub mod reports;
pub mod roster;

use validator::ValidationErrors;

/// Flattens validator output into user-facing messages, ordered by field.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("Campo inválido: {field}"),
            })
        })
        .collect()
}

/// Empty or whitespace-only form values become `None`.
pub fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
