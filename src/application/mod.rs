//! Application layer orchestrating validation, limits and status changes.
//!
//! `PaymentService` is the entry point. It owns the store and the payment
//! policy and is safe to share across tasks behind an `Arc`.

pub mod service;
pub mod window;
