//! Contract events for state change notifications.
//!
//! Events are emitted for every successful state change, enabling clients to
//! track activity. Failed operations emit nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::exchange::{UnwrapReceipt, WrapReceipt};
use crate::core::token::TokenAmount;
use crate::core::treasury::NativeAmount;
use crate::utils::crypto::{Address, Hash};

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// All contract event kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Tokens moved between two holders
    Transfer {
        /// Sender
        from: Address,
        /// Recipient
        to: Address,
        /// Amount moved
        value: TokenAmount,
    },
    /// Allowance set
    Approval {
        /// Token owner
        owner: Address,
        /// Approved spender
        spender: Address,
        /// New allowance
        value: TokenAmount,
    },
    /// Native currency wrapped into tokens
    Wrapped(WrapReceipt),
    /// Tokens unwrapped into native currency
    Unwrapped(UnwrapReceipt),
    /// Owner drained the fee residue
    FeesWithdrawn {
        /// Owner
        owner: Address,
        /// Amount withdrawn
        amount: NativeAmount,
    },
}

impl EventKind {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "Transfer",
            Self::Approval { .. } => "Approval",
            Self::Wrapped(_) => "Wrapped",
            Self::Unwrapped(_) => "Unwrapped",
            Self::FeesWithdrawn { .. } => "FeesWithdrawn",
        }
    }

    /// Whether `address` appears in the event
    pub fn involves(&self, address: &Address) -> bool {
        match self {
            Self::Transfer { from, to, .. } => from == address || to == address,
            Self::Approval { owner, spender, .. } => owner == address || spender == address,
            Self::Wrapped(r) => &r.holder == address,
            Self::Unwrapped(r) => &r.holder == address,
            Self::FeesWithdrawn { owner, .. } => owner == address,
        }
    }
}

/// An emitted event with its position in the log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractEvent {
    /// Monotonic sequence number, starting at 1
    pub sequence: u64,
    /// Emission time
    pub timestamp: DateTime<Utc>,
    /// Payload
    pub kind: EventKind,
}

impl ContractEvent {
    /// Compute event hash
    pub fn hash(&self) -> Hash {
        let data = bincode::serialize(self).unwrap_or_default();
        Hash::sha256(&data)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// Bounded in-memory event log; the oldest events are pruned first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    events: VecDeque<ContractEvent>,
    capacity: usize,
    next_sequence: u64,
}

impl EventLog {
    /// Create a log holding at most `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            next_sequence: 1,
        }
    }

    /// Append an event
    pub fn emit(&mut self, kind: EventKind) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        if self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(ContractEvent {
            sequence,
            timestamp: Utc::now(),
            kind,
        });
        sequence
    }

    /// Number of events retained
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total events ever emitted, including pruned ones
    pub fn total_emitted(&self) -> u64 {
        self.next_sequence - 1
    }

    /// Retained events, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &ContractEvent> {
        self.events.iter()
    }

    /// The most recent `n` events, oldest first
    pub fn recent(&self, n: usize) -> Vec<&ContractEvent> {
        let skip = self.events.len().saturating_sub(n);
        self.events.iter().skip(skip).collect()
    }

    /// Events involving a specific address
    pub fn for_address(&self, address: &Address) -> Vec<&ContractEvent> {
        self.events.iter().filter(|e| e.kind.involves(address)).collect()
    }
}
