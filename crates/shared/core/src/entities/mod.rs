mod account;
mod holding;
mod order;
mod order_state;
mod side;
mod trade;

pub use account::{AccountError, ParticipantAccount};
pub use holding::Holding;
pub use order::{Order, OrderValidationError};
pub use order_state::OrderState;
pub use side::Side;
pub use trade::Trade;
