// Copyright 2026 Feedpanel Contributors
// SPDX-License-Identifier: Apache-2.0

//! Feedpanel runtime library — headless scrape-and-sync engine that keeps a
//! local panel dataset in step with a mobile social feed.
//!
//! This library crate exposes the core modules for integration testing.

pub mod auth;
pub mod cli;
pub mod config;
pub mod events;
pub mod extract;
pub mod item;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod sync;
