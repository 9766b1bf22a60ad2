pub mod reports;
pub mod sales;
