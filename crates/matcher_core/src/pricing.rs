//! Pricing.
//!
//! The base price per passenger is `ceil(total_km * rate_per_km)` with a
//! floor of one rate unit. On a successful pairing every passenger in the
//! resulting trip receives the pooling discount applied once per join
//! event. Whether the multiplier anchors on the peer's previous
//! `issued_price` or the caller's is left explicit rather than implicit:
//! this implementation takes the peer-anchored form as canonical and makes
//! the anchor a parameter so callers can't apply it silently to the wrong
//! side.

/// Base price for a trip of `total_km`, before any pooling discount.
///
/// `ceil(total_km * rate_per_km)`, floored at one rate unit.
pub fn base_price(total_km: f64, rate_per_km: f64) -> f64 {
    let raw = (total_km * rate_per_km).ceil();
    raw.max(rate_per_km)
}

/// Apply the pooling discount once, anchored on `anchor_price`.
/// `discount_factor` is the fraction of the anchor price kept after the
/// join (default 0.30, i.e. a 70% discount).
pub fn apply_pooling_discount(anchor_price: f64, discount_factor: f64) -> f64 {
    (anchor_price * discount_factor).ceil()
}

/// Price anchor for a pairing join: the *peer's* previous `issued_price` is
/// the canonical anchor, not the caller's.
#[derive(Debug, Clone, Copy)]
pub enum PriceAnchor {
    Peer,
    Caller,
}

/// Compute the rounded-up per-passenger fare every rider in the resulting
/// trip receives after a successful pairing.
pub fn joined_price(anchor: PriceAnchor, peer_price: f64, caller_price: f64, discount_factor: f64) -> f64 {
    let anchor_price = match anchor {
        PriceAnchor::Peer => peer_price,
        PriceAnchor::Caller => caller_price,
    };
    apply_pooling_discount(anchor_price, discount_factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_price_has_a_floor() {
        assert_eq!(base_price(0.0, 10.0), 10.0);
        assert_eq!(base_price(0.1, 10.0), 10.0);
    }

    #[test]
    fn base_price_rounds_up() {
        assert_eq!(base_price(2.01, 10.0), 21.0);
    }

    #[test]
    fn peer_anchored_discount_uses_peer_price() {
        let price = joined_price(PriceAnchor::Peer, 100.0, 50.0, 0.30);
        assert_eq!(price, 30.0);
    }

    #[test]
    fn discount_compounds_across_joins() {
        let first_join = joined_price(PriceAnchor::Peer, 100.0, 80.0, 0.30);
        let second_join = joined_price(PriceAnchor::Peer, first_join, 60.0, 0.30);
        assert_eq!(first_join, 30.0);
        assert_eq!(second_join, 9.0);
    }
}
