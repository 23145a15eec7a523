//! Importance weights for documents by issuing court.

pub const MOST_AUTHORITATIVE: f64 = 1.0;
pub const AUTHORITATIVE: f64 = 0.9;
pub const DEFAULT_WEIGHT: f64 = 0.85;

/// Weight for a source label. Documents without a label are not penalized.
pub fn importance_weight(court: Option<&str>) -> f64 {
    let Some(court) = court.map(str::trim).filter(|c| !c.is_empty()) else {
        return 1.0;
    };
    match court {
        "SG Court of Appeal"
        | "SG Privy Council"
        | "UK House of Lords"
        | "UK Supreme Court"
        | "High Court of Australia"
        | "CA Supreme Court" => MOST_AUTHORITATIVE,
        "SG High Court"
        | "Singapore International Commercial Court"
        | "HK High Court"
        | "HK Court of First Instance"
        | "UK Crown Court"
        | "UK Court of Appeal"
        | "UK High Court"
        | "Federal Court of Australia"
        | "NSW Court of Appeal"
        | "NSW Court of Criminal Appeal"
        | "NSW Supreme Court" => AUTHORITATIVE,
        _ => DEFAULT_WEIGHT,
    }
}
