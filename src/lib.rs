//! Ajazz panel driver - shared library
//!
//! Configuration for the `ajazz_driver` binary. The protocol lives in
//! `ajazz-transport`, the device session in `ajazz-deck`.

pub mod config;

pub use config::DriverConfig;
