// Adapters layer: concrete implementations of the domain ports.

pub mod amadeus;
pub mod brevo;
pub mod storage;
