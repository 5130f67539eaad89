// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer for Cadence triggers

mod encoding;
mod file_store;
mod loader;
mod memory;
mod store;

pub use encoding::EncodingType;
pub use file_store::FsTriggerStore;
pub use loader::{LoaderError, TriggerLoader};
pub use memory::MemoryTriggerStore;
pub use store::{StoreError, StoredTrigger, TriggerStore};
