pub mod identification;
pub mod listing;
