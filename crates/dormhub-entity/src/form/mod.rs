//! Service request forms.

pub mod model;
pub mod priority;
pub mod status;

pub use model::{Feedback, Form, FormType, NewForm, StatusHistoryEntry, Timing};
pub use priority::Priority;
pub use status::FormStatus;
