//! # Repository Pattern Implementation
//!
//! One repository per aggregate. Each repository owns a pool clone and
//! exposes async methods returning `DbResult<T>`.

pub mod period;
pub mod reservation;
pub mod review;
pub mod room;
