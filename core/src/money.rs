//! Lamport <-> [`Decimal`] conversions for the `NUMERIC(20,9)` persisted
//! monetary columns (`spec.md` §6 "Persisted layout").

use rust_decimal::Decimal;

/// Lamports per SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Converts a lamport amount to a SOL-denominated [`Decimal`] with full
/// 9-digit lamport precision, suitable for a `NUMERIC(20,9)` column.
pub fn lamports_to_decimal(lamports: u64) -> Decimal {
    Decimal::from(lamports) / Decimal::from(LAMPORTS_PER_SOL)
}

/// Converts a SOL-denominated [`Decimal`] back to lamports.
///
/// Returns `None` if `sol` is negative or would overflow `u64` lamports.
pub fn decimal_to_lamports(sol: Decimal) -> Option<u64> {
    if sol.is_sign_negative() {
        return None;
    }
    let lamports = sol * Decimal::from(LAMPORTS_PER_SOL);
    lamports.round().to_string().parse::<u64>().ok()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roundtrips_exactly() {
        let lamports = 1_234_567_890u64;
        let sol = lamports_to_decimal(lamports);
        assert_eq!(decimal_to_lamports(sol), Some(lamports));
    }

    #[test]
    fn rejects_negative() {
        assert_eq!(decimal_to_lamports(Decimal::from(-1)), None);
    }

    #[test]
    fn zero_roundtrips() {
        assert_eq!(decimal_to_lamports(lamports_to_decimal(0)), Some(0));
    }
}
