//! Core types and trait definitions for the Overseer price ledger.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! It owns the labelling and period-window rules; storage backends implement
//! [`store::PriceStore`] and the [`ledger::Ledger`] service drives them.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod auth;
pub mod calendar;
pub mod clock;
pub mod error;
pub mod item;
pub mod labels;
pub mod ledger;
pub mod observation;
pub mod period;
pub mod store;

pub use error::{Error, ErrorKind, Result, ValidationError};
