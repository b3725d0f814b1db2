// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod agent;
pub mod client;
pub mod config;
pub mod console;
pub mod platform;
pub mod supervisor;
