//! Persisted notifications and their recipients.

pub mod kind;
pub mod model;
pub mod recipient;

pub use kind::{NotificationPriority, NotificationType};
pub use model::{NewNotification, Notification, RelatedTo};
pub use recipient::{Recipient, RecipientModel};
