//! Pure transition checks and the realtime events a transition emits.

use dormhub_core::AppError;
use dormhub_core::result::AppResult;
use dormhub_entity::account::{Role, Staff};
use dormhub_entity::form::status::describe;
use dormhub_entity::form::{Form, FormStatus};
use dormhub_realtime::{EmitTarget, OutboundEvent};

use crate::effects::Outcome;
use crate::notification::rules;

/// Check an admin-requested status change.
pub fn check_admin_transition(form: &Form, target: FormStatus) -> AppResult<()> {
    if target.is_staff_only() {
        return Err(AppError::validation(format!(
            "Only the assigned staff member can set a form to {target}"
        )));
    }
    if !form.status.admin_can_transition_to(target) {
        return Err(AppError::validation(format!(
            "Cannot change a {} form to {target}. Allowed: {}",
            form.status,
            describe(form.status.admin_targets())
        )));
    }
    if target == FormStatus::Assigned && form.assigned_staff_id.is_none() {
        return Err(AppError::validation(
            "Assigning a form requires a staff member; use the assign action",
        ));
    }
    Ok(())
}

/// Check that `staff` can take `form`.
pub fn check_assignment(form: &Form, staff: &Staff) -> AppResult<()> {
    if !form.status.accepts_assignment() {
        return Err(AppError::validation(format!(
            "Cannot assign a {} form. Allowed: {}",
            form.status,
            describe(&[FormStatus::Submitted, FormStatus::Approved])
        )));
    }
    if !staff.is_available() {
        return Err(AppError::conflict(format!(
            "{} is not available ({})",
            staff.name,
            staff.status.as_str()
        )));
    }
    let required = form.form_type.required_staff_type();
    if staff.type_of_staff != required {
        return Err(AppError::validation(format!(
            "{} requests need {} staff, not {}",
            form.form_type.as_str(),
            required.as_str(),
            staff.type_of_staff.as_str()
        )));
    }
    Ok(())
}

/// Check a staff-driven status change.
pub fn check_staff_transition(form: &Form, staff_id: uuid::Uuid, target: FormStatus) -> AppResult<()> {
    if form.assigned_staff_id != Some(staff_id) {
        return Err(AppError::authorization(
            "Only the assigned staff member can update this form",
        ));
    }
    let expected = match target {
        FormStatus::InProgress => FormStatus::Assigned,
        FormStatus::Completed => FormStatus::InProgress,
        _ => {
            return Err(AppError::validation(format!(
                "Staff cannot set a form to {target}"
            )));
        }
    };
    if form.status != expected {
        return Err(AppError::validation(format!(
            "Cannot change a {} form to {target}. Allowed from: {expected}",
            form.status
        )));
    }
    Ok(())
}

/// Attach the fan-out and `formStatusChanged` events for a transition.
pub fn transition_outcome(
    form: Form,
    previous: Option<FormStatus>,
    notes: Option<&str>,
) -> Outcome<Form> {
    let notifications = rules::form_status_changed(&form, previous, notes);
    let event = OutboundEvent::FormStatusChanged {
        form_id: form.id,
        student_id: form.student_id,
        previous_status: previous,
        status: form.status,
        updated_at: form.updated_at,
    };

    let mut targets = vec![EmitTarget::User(form.student_id), EmitTarget::Group(Role::Admin)];
    if let Some(staff_id) = form.assigned_staff_id {
        targets.push(EmitTarget::User(staff_id));
    }

    let mut outcome = Outcome::new(form).notify_all(notifications);
    for target in targets {
        outcome = outcome.emit(target, event.clone());
    }
    outcome
}
