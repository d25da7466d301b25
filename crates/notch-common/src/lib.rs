//! Shared types used across the notch workspace.
//!
//! This crate contains only the data needed to describe a device response
//! and a safe output path — it does not include device-access transport
//! logic (that lives behind `notch_core::external::DeviceClient`) or filter
//! logic (that lives in `notch-filter`).

pub mod device;
pub mod path;

pub use device::{DeviceInfo, DeviceResponse, ResponsePayload};
