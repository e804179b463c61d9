//! Orders awaiting payment and the payment outcomes that settle them.

mod id;
mod payment;
mod pending;

pub use id::{OrderId, DEFAULT_ORDER_PREFIX, MAX_ORDER_ID_LEN};
pub use payment::{PaymentConfirmation, PaymentStatus};
pub use pending::{Gateway, PendingOrder};
