pub mod ledger;
pub mod signature;
pub mod stripe;
