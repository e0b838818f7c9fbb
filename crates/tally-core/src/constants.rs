//! Protocol constants. All monetary values in base units (1 coin = 10^8 units).

pub const COIN: u64 = 100_000_000;

/// Version written into transactions built by this workspace.
pub const TX_VERSION: u64 = 1;

/// Length of an address hash in bytes (160 bits).
pub const ADDRESS_LEN: usize = 20;

/// Length of a raw Ed25519 public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Length of a raw Ed25519 signature in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Fee floor applied to every built transaction, in base units.
pub const DEFAULT_MIN_FEE: u64 = 500_000;

/// Change at or below this amount is folded into the fee.
pub const DEFAULT_DUST_THRESHOLD: u64 = 50_000;

/// Proportional fee divisor: the fee is at least `amount / FEE_DIVISOR`.
pub const FEE_DIVISOR: u64 = 1_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dust_below_min_fee() {
        assert!(DEFAULT_DUST_THRESHOLD < DEFAULT_MIN_FEE);
    }

    #[test]
    fn proportional_fee_overtakes_floor() {
        // The floor dominates until the paid amount reaches 5 coins.
        let crossover = DEFAULT_MIN_FEE * FEE_DIVISOR;
        assert_eq!(crossover / FEE_DIVISOR, DEFAULT_MIN_FEE);
        assert_eq!(crossover, 5 * COIN);
    }
}
