//! Built-in job handler implementations.

pub mod bills;
pub mod forms;

pub use bills::OverdueBillsJob;
pub use forms::OverdueFormsJob;
