//! Bills and the payment ledger.

pub mod ledger;
pub mod model;

pub use model::{
    Bill, BillNote, BillStatus, MAX_AMOUNT, NewBill, OtherFee, Payment, PaymentStatus,
};
