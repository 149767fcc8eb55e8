// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Unibox integration tests.
//!
//! # Components
//!
//! - [`MockChannelClient`] - scriptable channel client with optional breaker
//! - [`RecordingObserver`] - breaker observer capturing every notification
//! - [`fixtures`] - deterministic messages and user mappings

pub mod fixtures;
pub mod mock_channel;
pub mod observer;

pub use mock_channel::{FetchBehaviour, MockChannelClient};
pub use observer::RecordingObserver;
