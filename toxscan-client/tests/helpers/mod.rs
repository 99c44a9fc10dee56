#![allow(dead_code)]

//! Test doubles for client integration tests
//!
//! - FakeMicrophone: scripted capture device that counts opens and releases
//! - FakeBackend: scripted analysis backend that counts calls

pub mod fake_backend;
pub mod fake_device;

pub use fake_backend::{sample_response, FakeBackend};
pub use fake_device::FakeMicrophone;
