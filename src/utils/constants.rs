//! Protocol constants and magic numbers.
//!
//! All protocol-wide constants are defined here for easy auditing and modification.

// ═══════════════════════════════════════════════════════════════════════════════
// TOKEN CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default token name
pub const TOKEN_NAME: &str = "Athena";

/// Default token symbol
pub const TOKEN_SYMBOL: &str = "ATH";

/// Token decimals (base units per whole token = 10^18)
pub const TOKEN_DECIMALS: u8 = 18;

/// Base units in one whole token or one whole unit of the native currency
pub const BASE_UNIT: u128 = 1_000_000_000_000_000_000;

/// Whole tokens minted at deployment (1 billion)
pub const INITIAL_SUPPLY_WHOLE: u128 = 1_000_000_000;

/// Total supply in base units, fixed for the lifetime of a deployment
pub const TOTAL_SUPPLY: u128 = INITIAL_SUPPLY_WHOLE * BASE_UNIT;

// ═══════════════════════════════════════════════════════════════════════════════
// FEE CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Tax divisor: tax = gross / TAX_DIVISOR (0.1%)
pub const TAX_DIVISOR: u128 = 1000;

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTITY CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Address length in bytes
pub const ADDRESS_LENGTH: usize = 20;

/// Hash length in bytes
pub const HASH_LENGTH: usize = 32;

/// Address the contract itself lives at in a local deployment
pub const CONTRACT_ADDRESS: [u8; ADDRESS_LENGTH] = [
    0xa7, 0x4e, 0x9a, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
];

// ═══════════════════════════════════════════════════════════════════════════════
// LIMITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default number of events kept in the in-memory log
pub const DEFAULT_EVENT_CAPACITY: usize = 1000;

/// Snapshot format version
pub const STATE_VERSION: u32 = 1;
