//! Route signatures: the concatenation of fixed-width hex cell ids that
//! linearizes a driving route into a lexicographically comparable string.

use serde::{Deserialize, Serialize};

/// Width (in characters) of a single hex cell id. H3's canonical string
/// representation is a fixed 15-character lowercase hex string.
pub const CELL_WIDTH: usize = 15;

/// Separator between a pool entry's route signature and its entry id in a
/// lex-set membership record.
pub const MEMBER_SEPARATOR: &str = "::";

/// Prefix marking a trip's entry id, as opposed to a bare passenger user id.
pub const TRIP_ID_PREFIX: &str = "TRIP";

/// An ordered concatenation of `CELL_WIDTH`-character cell ids, always a
/// multiple of `CELL_WIDTH` in length.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RouteSignature(String);

impl RouteSignature {
    /// Build a signature from an ordered list of cell ids.
    pub fn from_cells<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut s = String::new();
        for cell in cells {
            let cell = cell.as_ref();
            debug_assert_eq!(cell.len(), CELL_WIDTH, "cell id must be CELL_WIDTH chars");
            s.push_str(cell);
        }
        Self(s)
    }

    /// Wrap an already-concatenated signature string verbatim (e.g. read
    /// back from the pool store). Does not re-validate width; callers that
    /// need the invariant checked should use [`RouteSignature::parse`].
    pub fn from_raw(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn parse(s: impl Into<String>) -> Option<Self> {
        let s = s.into();
        if s.len() % CELL_WIDTH != 0 || s.is_empty() {
            return None;
        }
        Some(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn cell_count(&self) -> usize {
        self.0.len() / CELL_WIDTH
    }

    /// The `index`-th cell (0-based), or `None` if out of range.
    pub fn cell_at(&self, index: usize) -> Option<&str> {
        let start = index.checked_mul(CELL_WIDTH)?;
        let end = start + CELL_WIDTH;
        self.0.get(start..end)
    }

    /// The last cell: the destination cell.
    pub fn destination_cell(&self) -> &str {
        let len = self.0.len();
        &self.0[len - CELL_WIDTH..]
    }

    /// `true` if `self`'s cells are a strict prefix sequence of `other`'s,
    /// i.e. `other` fully contains `self`'s route.
    pub fn is_prefix_of(&self, other: &RouteSignature) -> bool {
        self.0.len() <= other.0.len() && other.0.starts_with(&self.0)
    }

    /// Number of leading whole cells shared between `self` and `other`:
    /// the longest common cell-aligned prefix.
    pub fn common_prefix_cell_count(&self, other: &RouteSignature) -> usize {
        let max_cells = self.cell_count().min(other.cell_count());
        let mut k = 0;
        while k < max_cells && self.cell_at(k) == other.cell_at(k) {
            k += 1;
        }
        k
    }

    /// The split cell: the `k`-th cell (1-based count `k`), i.e. the cell at
    /// position `[(k-1)*W, k*W)`.
    pub fn split_cell(&self, k: usize) -> Option<&str> {
        if k == 0 {
            return None;
        }
        self.cell_at(k - 1)
    }

    /// The longer of `self`/`other` by cell count, used to compute the
    /// extended trip route on a subset/superset pairing.
    pub fn longer_of<'a>(&'a self, other: &'a RouteSignature) -> &'a RouteSignature {
        if other.cell_count() > self.cell_count() {
            other
        } else {
            self
        }
    }
}

impl std::fmt::Display for RouteSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the lex-set membership string `route_signature :: entry_id`.
pub fn member_string(signature: &RouteSignature, entry_id: &str) -> String {
    format!("{}{}{}", signature.as_str(), MEMBER_SEPARATOR, entry_id)
}

/// Split a membership string back into its signature and entry id.
pub fn parse_member(member: &str) -> Option<(RouteSignature, &str)> {
    let (sig, id) = member.split_once(MEMBER_SEPARATOR)?;
    Some((RouteSignature::parse(sig.to_string())?, id))
}

/// `true` if `entry_id` follows the trip-entry prefix convention.
pub fn is_trip_entry_id(entry_id: &str) -> bool {
    entry_id.starts_with(TRIP_ID_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(s: &str) -> RouteSignature {
        RouteSignature::parse(s.to_string()).expect("valid signature")
    }

    #[test]
    fn prefix_detection() {
        let short = sig(&"A".repeat(CELL_WIDTH));
        let long = sig(&"A".repeat(CELL_WIDTH * 2));
        assert!(short.is_prefix_of(&long));
        assert!(!long.is_prefix_of(&short));
    }

    #[test]
    fn common_prefix_counts_whole_cells() {
        let a = RouteSignature::from_cells(vec!["A".repeat(CELL_WIDTH), "B".repeat(CELL_WIDTH)]);
        let b = RouteSignature::from_cells(vec![
            "A".repeat(CELL_WIDTH),
            "B".repeat(CELL_WIDTH),
            "C".repeat(CELL_WIDTH),
        ]);
        assert_eq!(a.common_prefix_cell_count(&b), 2);
    }

    #[test]
    fn member_roundtrip() {
        let s = sig(&"A".repeat(CELL_WIDTH));
        let member = member_string(&s, "user-1");
        let (parsed_sig, parsed_id) = parse_member(&member).expect("parses");
        assert_eq!(parsed_sig, s);
        assert_eq!(parsed_id, "user-1");
    }

    #[test]
    fn trip_id_prefix_detected() {
        assert!(is_trip_entry_id("TRIPabc123"));
        assert!(!is_trip_entry_id("user-42"));
    }
}
