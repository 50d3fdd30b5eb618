//! Notification fan-out rules: who hears about which event.
//!
//! Every function here is pure. Callers attach the result to an
//! [`Outcome`](crate::effects::Outcome).

use chrono::NaiveDate;
use serde_json::json;

use dormhub_entity::attendance::LogEntry;
use dormhub_entity::bill::Bill;
use dormhub_entity::form::{Form, FormStatus};
use dormhub_entity::messaging::{Message, ParticipantRole};
use dormhub_entity::news::News;
use dormhub_entity::notification::{NewNotification, NotificationType, Recipient, RecipientModel};
use dormhub_entity::offense::Offense;

/// Statuses that also notify the assigned staff member.
const STAFF_STATUSES: [FormStatus; 2] = [FormStatus::Assigned, FormStatus::InProgress];

/// Statuses that also notify the admin group.
const ADMIN_STATUSES: [FormStatus; 1] = [FormStatus::Submitted];

fn status_label(status: Option<FormStatus>) -> &'static str {
    status.map(|s| s.as_str()).unwrap_or("New")
}

/// Notifications for a form moving from `previous` to its current status.
///
/// The student always hears about it. The assigned staff member hears
/// about assignment and start of work; assignment arrives as
/// `FormAssigned`. Admins hear about new submissions. A completed form
/// additionally sends the student the staff's completion notes.
pub fn form_status_changed(
    form: &Form,
    previous: Option<FormStatus>,
    notes: Option<&str>,
) -> Vec<NewNotification> {
    let from = status_label(previous);
    let to = form.status.as_str();
    let metadata = json!({
        "form_id": form.id,
        "previous_status": previous,
        "status": form.status,
    });
    let mut out = Vec::new();

    out.push(
        NewNotification::new(
            Recipient::student(form.student_id),
            NotificationType::FormStatusChanged,
            format!("Form {to}"),
            format!("Your request \"{}\" changed from {from} to {to}.", form.title),
        )
        .related("Form", form.id)
        .with_metadata(metadata.clone()),
    );

    if STAFF_STATUSES.contains(&form.status) {
        if let Some(staff_id) = form.assigned_staff_id {
            let (kind, title) = if form.status == FormStatus::Assigned {
                (NotificationType::FormAssigned, "New assignment".to_string())
            } else {
                (NotificationType::FormStatusChanged, format!("Form {to}"))
            };
            out.push(
                NewNotification::new(
                    Recipient::staff(staff_id),
                    kind,
                    title,
                    format!(
                        "{} request \"{}\" changed from {from} to {to}. Due {}.",
                        form.form_type.as_str(),
                        form.title,
                        form.due_date.format("%Y-%m-%d %H:%M UTC")
                    ),
                )
                .related("Form", form.id)
                .with_metadata(metadata.clone()),
            );
        }
    }

    if ADMIN_STATUSES.contains(&form.status) {
        out.push(
            NewNotification::new(
                Recipient::all_admins(),
                NotificationType::FormSubmitted,
                "New service request",
                format!(
                    "{} request \"{}\" ({} priority) is waiting for review.",
                    form.form_type.as_str(),
                    form.title,
                    form.priority.as_str()
                ),
            )
            .related("Form", form.id)
            .with_metadata(metadata.clone()),
        );
    }

    if form.status == FormStatus::Completed {
        let body = match notes.map(str::trim).filter(|n| !n.is_empty()) {
            Some(notes) => format!("Your request \"{}\" is done. Notes: {notes}", form.title),
            None => format!("Your request \"{}\" is done.", form.title),
        };
        out.push(
            NewNotification::new(
                Recipient::student(form.student_id),
                NotificationType::FormStatusChanged,
                "Request completed",
                body,
            )
            .related("Form", form.id)
            .with_metadata(metadata),
        );
    }

    out
}

/// Notice to admins that a form is past its due date.
pub fn form_overdue(form: &Form) -> NewNotification {
    NewNotification::new(
        Recipient::all_admins(),
        NotificationType::FormOverdue,
        "Request overdue",
        format!(
            "{} request \"{}\" is still {} past its due date {}.",
            form.form_type.as_str(),
            form.title,
            form.status.as_str(),
            form.due_date.format("%Y-%m-%d %H:%M UTC")
        ),
    )
    .related("Form", form.id)
    .with_metadata(json!({ "form_id": form.id, "status": form.status }))
}

fn money(amount: i64) -> String {
    format!("{}.{:02}", amount / 100, (amount % 100).abs())
}

/// A new bill for the student.
pub fn bill_created(bill: &Bill) -> NewNotification {
    NewNotification::new(
        Recipient::student(bill.student_id),
        NotificationType::BillCreated,
        "New bill",
        format!(
            "A bill of {} is due on {}.",
            money(bill.total_amount()),
            bill.due_date.format("%Y-%m-%d")
        ),
    )
    .related("Bill", bill.id)
}

/// A bill is fully paid: the student and the admin group hear about it.
pub fn bill_paid(bill: &Bill) -> Vec<NewNotification> {
    let content = format!(
        "Bill for {} to {} is paid in full ({}).",
        bill.billing_period_start.format("%Y-%m-%d"),
        bill.billing_period_end.format("%Y-%m-%d"),
        money(bill.amount_paid)
    );
    vec![
        NewNotification::new(
            Recipient::student(bill.student_id),
            NotificationType::BillPaid,
            "Bill paid",
            content.clone(),
        )
        .related("Bill", bill.id),
        NewNotification::new(
            Recipient::all_admins(),
            NotificationType::BillPaid,
            "Bill paid",
            content,
        )
        .related("Bill", bill.id)
        .with_metadata(json!({ "student_id": bill.student_id })),
    ]
}

/// A bill was sent back to the student.
pub fn bill_returned(bill: &Bill, reason: Option<&str>) -> NewNotification {
    let content = match reason {
        Some(reason) => format!("Your bill was returned: {reason}"),
        None => "Your bill was returned. Please review your payment.".to_string(),
    };
    NewNotification::new(
        Recipient::student(bill.student_id),
        NotificationType::BillReturned,
        "Bill returned",
        content,
    )
    .related("Bill", bill.id)
}

/// A bill went past its due date unpaid.
pub fn bill_overdue(bill: &Bill) -> NewNotification {
    NewNotification::new(
        Recipient::student(bill.student_id),
        NotificationType::BillOverdue,
        "Bill overdue",
        format!(
            "Your bill due {} is overdue. Outstanding balance: {}.",
            bill.due_date.format("%Y-%m-%d"),
            money(bill.balance())
        ),
    )
    .related("Bill", bill.id)
}

/// A late check-in or check-out, for the admin group.
pub fn late_attendance(
    student_name: &str,
    student_id: uuid::Uuid,
    date: NaiveDate,
    entry: &LogEntry,
    check_out: bool,
) -> NewNotification {
    let (kind, verb, at) = if check_out {
        (
            NotificationType::LateCheckOut,
            "checked out",
            entry.check_out_time.unwrap_or(entry.check_in_time),
        )
    } else {
        (NotificationType::LateCheckIn, "checked in", entry.check_in_time)
    };
    NewNotification::new(
        Recipient::all_admins(),
        kind,
        format!("Late {}", if check_out { "check-out" } else { "check-in" }),
        format!("{student_name} {verb} late at {}.", at.format("%H:%M UTC")),
    )
    .related("Student", student_id)
    .with_metadata(json!({ "date": date }))
}

/// A direct message for its recipient.
pub fn new_message(message: &Message, sender_name: &str) -> NewNotification {
    let model = match message.recipient_role {
        ParticipantRole::User => RecipientModel::User,
        ParticipantRole::Admin => RecipientModel::Admin,
    };
    let preview: String = message.content.chars().take(80).collect();
    NewNotification::new(
        Recipient::SpecificUser {
            id: message.recipient_id,
            model,
        },
        NotificationType::NewMessage,
        format!("New message from {sender_name}"),
        preview,
    )
    .related("Conversation", message.conversation_id)
    .with_metadata(json!({ "message_id": message.id, "sender_id": message.sender_id }))
}

/// A published news item, for every student.
pub fn news_published(news: &News) -> NewNotification {
    NewNotification::new(
        Recipient::all_students(),
        NotificationType::NewsPublished,
        news.title.clone(),
        news.content.chars().take(160).collect::<String>(),
    )
    .related("News", news.id)
}

/// A disciplinary record for the student.
pub fn offense_recorded(offense: &Offense) -> NewNotification {
    NewNotification::new(
        Recipient::student(offense.student_id),
        NotificationType::OffenseRecorded,
        "Offense recorded",
        format!(
            "{} on {}: {}",
            offense.offense_type,
            offense.occurred_on.format("%Y-%m-%d"),
            offense.description
        ),
    )
    .related("Offense", offense.id)
}
