//! Visa policy entries, category codes, and query filters.

use serde::{Deserialize, Serialize};

use crate::error::UnknownPolicyCode;

/// Largest stay length accepted by the store (`INTEGER` column).
pub const MAX_DURATION_DAYS: u32 = 2_147_483_647;

/// Entry requirement category for an origin passport travelling to a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "i64")]
pub enum PolicyCode {
    /// The destination is the passport's own country.
    HomeCountry = 0,
    /// A visa must be obtained before travel.
    VisaRequired = 1,
    /// Freedom of movement within the OECS.
    OecsFreedom = 2,
    /// Freedom of movement within MERCOSUR.
    MercosurFreedom = 3,
    /// Freedom of movement within the EU.
    EuFreedom = 4,
    /// Freedom of movement within the GCC.
    GccFreedom = 5,
    /// Other freedom of movement arrangements.
    FreedomOfMovement = 6,
    /// No visa required.
    VisaFree = 7,
    /// Electronic travel authorisation.
    Eta = 8,
    /// Either a visa on arrival or an eVisa.
    VisaOnArrivalOrEvisa = 9,
    /// Visa issued on arrival.
    VisaOnArrival = 10,
    /// Electronic visa obtained online.
    Evisa = 11,
    /// Entry by special permit.
    SpecialPermit = 12,
    /// Simplified visa procedure.
    SimplifiedVisa = 13,
    /// Entry subject to prior confirmation.
    ConfirmationRequired = 14,
    /// Entry not permitted.
    NoAccess = 15,
}

impl PolicyCode {
    /// Every category ordered by its numeric code.
    pub const ALL: [Self; 16] = [
        Self::HomeCountry,
        Self::VisaRequired,
        Self::OecsFreedom,
        Self::MercosurFreedom,
        Self::EuFreedom,
        Self::GccFreedom,
        Self::FreedomOfMovement,
        Self::VisaFree,
        Self::Eta,
        Self::VisaOnArrivalOrEvisa,
        Self::VisaOnArrival,
        Self::Evisa,
        Self::SpecialPermit,
        Self::SimplifiedVisa,
        Self::ConfirmationRequired,
        Self::NoAccess,
    ];

    /// Numeric code used on the wire and in the store.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Human-readable category label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HomeCountry => "Home Country",
            Self::VisaRequired => "Visa Required",
            Self::OecsFreedom => "OECS Freedom",
            Self::MercosurFreedom => "MERCOSUR Freedom",
            Self::EuFreedom => "EU Freedom",
            Self::GccFreedom => "GCC Freedom",
            Self::FreedomOfMovement => "Freedom of Movement",
            Self::VisaFree => "Visa-Free",
            Self::Eta => "ETA",
            Self::VisaOnArrivalOrEvisa => "Visa on Arrival / eVisa",
            Self::VisaOnArrival => "Visa on Arrival",
            Self::Evisa => "eVisa",
            Self::SpecialPermit => "Special Permit",
            Self::SimplifiedVisa => "Simplified Visa",
            Self::ConfirmationRequired => "Confirmation Required",
            Self::NoAccess => "No Access",
        }
    }
}

impl From<PolicyCode> for u8 {
    fn from(code: PolicyCode) -> Self {
        code.code()
    }
}

impl TryFrom<i64> for PolicyCode {
    type Error = UnknownPolicyCode;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or(UnknownPolicyCode { code })
    }
}

/// A single (origin, destination) visa policy row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyEntry {
    /// Passport-issuing country.
    pub origin: String,
    /// Country being entered.
    pub destination: String,
    /// Entry requirement category.
    pub policy_code: PolicyCode,
    /// Permitted stay in days; `0` when not applicable.
    pub duration_days: u32,
}

impl PolicyEntry {
    /// Natural key of the entry.
    #[must_use]
    pub fn key(&self) -> PolicyKey {
        PolicyKey {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
        }
    }
}

/// Natural key identifying an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolicyKey {
    /// Passport-issuing country.
    pub origin: String,
    /// Country being entered.
    pub destination: String,
}

/// Unvalidated mutation payload as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyDraft {
    /// Passport-issuing country, possibly padded or empty.
    pub origin: String,
    /// Destination country, possibly padded or empty.
    pub destination: String,
    /// Raw category code.
    pub policy_code: Option<i64>,
    /// Raw stay length; defaults to `0` when absent.
    pub duration_days: Option<i64>,
}

/// Optional equality filters applied to list queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyFilter {
    origin: Option<String>,
    destination: Option<String>,
}

impl PolicyFilter {
    /// Filter matching every entry.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            origin: None,
            destination: None,
        }
    }

    /// Build a filter; blank values are treated as absent, others match exactly.
    #[must_use]
    pub fn new(origin: Option<String>, destination: Option<String>) -> Self {
        Self {
            origin: normalise(origin),
            destination: normalise(destination),
        }
    }

    /// Origin constraint, if any.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Destination constraint, if any.
    #[must_use]
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    /// Whether the entry satisfies every constraint.
    #[must_use]
    pub fn matches(&self, entry: &PolicyEntry) -> bool {
        self.origin().is_none_or(|origin| origin == entry.origin)
            && self
                .destination()
                .is_none_or(|destination| destination == entry.destination)
    }
}

fn normalise(value: Option<String>) -> Option<String> {
    value
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(origin: &str, destination: &str) -> PolicyEntry {
        PolicyEntry {
            origin: origin.to_string(),
            destination: destination.to_string(),
            policy_code: PolicyCode::VisaFree,
            duration_days: 90,
        }
    }

    #[test]
    fn policy_codes_are_dense_and_labelled() {
        for (index, code) in PolicyCode::ALL.iter().enumerate() {
            assert_eq!(usize::from(code.code()), index);
            assert!(!code.label().is_empty());
        }
        assert_eq!(PolicyCode::VisaFree.label(), "Visa-Free");
        assert_eq!(PolicyCode::NoAccess.code(), 15);
    }

    #[test]
    fn policy_code_rejects_out_of_range_values() {
        assert_eq!(PolicyCode::try_from(7), Ok(PolicyCode::VisaFree));
        assert_eq!(
            PolicyCode::try_from(16),
            Err(UnknownPolicyCode { code: 16 })
        );
        assert_eq!(
            PolicyCode::try_from(-1),
            Err(UnknownPolicyCode { code: -1 })
        );
    }

    #[test]
    fn entry_serialises_with_integer_code() {
        let value = serde_json::to_value(entry("Germany", "Canada")).expect("serialise");
        assert_eq!(
            value,
            json!({
                "origin": "Germany",
                "destination": "Canada",
                "policyCode": 7,
                "durationDays": 90
            })
        );
        let parsed: PolicyEntry = serde_json::from_value(value).expect("deserialise");
        assert_eq!(parsed, entry("Germany", "Canada"));
        assert!(
            serde_json::from_value::<PolicyEntry>(json!({
                "origin": "A",
                "destination": "B",
                "policyCode": 99,
                "durationDays": 0
            }))
            .is_err()
        );
    }

    #[test]
    fn filter_ignores_blank_constraints() {
        let filter = PolicyFilter::new(Some("  ".to_string()), Some("Canada".to_string()));
        assert_eq!(filter.origin(), None);
        assert_eq!(filter.destination(), Some("Canada"));
        assert!(filter.matches(&entry("Germany", "Canada")));
        assert!(!filter.matches(&entry("Germany", "Canada ")));
        assert!(!filter.matches(&entry("Germany", "Chile")));
        assert!(PolicyFilter::all().matches(&entry("X", "Y")));
    }
}
