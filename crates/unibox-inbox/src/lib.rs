// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The unified inbox.
//!
//! - [`UnifiedInbox`] fans `get_messages` out over every channel client and
//!   merges what comes back.
//! - [`resolve`] attaches the person behind each sender.
//! - [`RelatedMessageGatherer`] collects a person's recent messages across
//!   their linked channels.
//! - [`MappingStore`] persists the sender-to-person mappings.

pub mod aggregator;
pub mod mappings;
pub mod related;
pub mod resolver;

pub use aggregator::{AggregationResult, ChannelResult, NOT_AUTHENTICATED, UnifiedInbox};
pub use mappings::{identities_from, MappingStore, USER_MAPPINGS_KEY};
pub use related::{Origin, RelatedMessageGatherer};
pub use resolver::{find_mapping, resolve, ResolvedMessage};
