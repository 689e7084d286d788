pub mod fees;
pub mod money;
pub mod ports;
pub mod request;
pub mod transaction;
pub mod validation;
