//! Common test utilities and fixtures for fontwarden integration tests
//!
//! This module provides:
//! - `FontDir` builder for laying out source and managed font directories
//! - `TestAgent` for running a listener against a temporary font directory
//! - A WebSocket client helper and a counting registrar

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod agent;
pub mod font_dir;

pub use agent::{quick_policy, CountingRegistrar, TestAgent, WsClient};
pub use font_dir::{FontDir, OTF, TTF, WOFF, WOFF2};
