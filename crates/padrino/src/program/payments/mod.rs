//! Tuition payment records and the derived-standing ledger.

pub mod domain;
pub mod ledger;
pub mod repository;

pub use domain::{
    NewPayment, Payment, PaymentId, PaymentKind, PaymentPatch, PaymentState, TuitionSchedule,
};
pub use ledger::{classify_standing, PaymentError, PaymentLedger, PaymentWrite};
pub use repository::PaymentStore;
