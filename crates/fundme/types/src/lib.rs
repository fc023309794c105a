//! Core type definitions for FundMe.
//!
//! This crate provides the identity and value types shared by every FundMe crate.
//! No business logic, just types.

#![deny(unsafe_code)]

pub mod address;
pub mod units;

pub use address::{Address, AddressParseError};
pub use units::{UnitError, Wei, NATIVE_DECIMALS, WEI_PER_ETHER};
