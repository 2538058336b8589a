//! Status enums.

use serde::{Deserialize, Serialize};

/// Review state of a customer offer.
///
/// Offers start out `Pending`. An admin accepts or rejects them exactly once;
/// both outcomes are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

/// A requested status change that the offer lifecycle does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("offer cannot move from {from} to {to}")]
pub struct StatusTransitionError {
    pub from: OfferStatus,
    pub to: OfferStatus,
}

impl OfferStatus {
    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    /// Whether `self -> next` is a legal review step.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Accepted | Self::Rejected)
        )
    }

    /// Validate a review step and return the new status.
    ///
    /// # Errors
    ///
    /// Returns [`StatusTransitionError`] for anything other than
    /// `pending -> accepted` or `pending -> rejected`.
    pub const fn transition_to(self, next: Self) -> Result<Self, StatusTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StatusTransitionError {
                from: self,
                to: next,
            })
        }
    }

    /// The wire / database spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OfferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("invalid offer status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALL: [OfferStatus; 3] = [
        OfferStatus::Pending,
        OfferStatus::Accepted,
        OfferStatus::Rejected,
    ];

    #[test]
    fn test_only_pending_moves_and_only_to_a_decision() {
        for from in ALL {
            for to in ALL {
                let allowed = from.transition_to(to).is_ok();
                let expected = from == OfferStatus::Pending && to != OfferStatus::Pending;
                assert_eq!(allowed, expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_transition_error_names_both_states() {
        let err = OfferStatus::Accepted
            .transition_to(OfferStatus::Rejected)
            .unwrap_err();
        assert_eq!(err.to_string(), "offer cannot move from accepted to rejected");
    }

    #[test]
    fn test_default_is_pending() {
        assert_eq!(OfferStatus::default(), OfferStatus::Pending);
        assert!(!OfferStatus::Pending.is_terminal());
        assert!(OfferStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_serde_and_from_str_agree() {
        for status in ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<OfferStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OfferStatus>().is_err());
    }
}
