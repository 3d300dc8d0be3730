pub mod engine;
pub mod filter;
pub mod render;
pub mod report;

pub use crate::domain::model::{
    CabinClass, Criteria, DateWindow, Mailbox, Notification, Offer, Route, RunOutcome,
};
pub use crate::domain::ports::{FareProvider, Notifier, Storage};
pub use crate::utils::error::Result;
