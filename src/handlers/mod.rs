pub mod dispatch;
pub mod orders;
pub mod payments;
