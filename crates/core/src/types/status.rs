//! Order lifecycle status.

use serde::{Deserialize, Serialize};

/// The order lifecycle state.
///
/// Transitions are monotonic and one-directional:
///
/// ```text
/// PENDING -> ASSIGNED -> DELIVERED
/// ```
///
/// There is no cancellation state and a delivered order never moves again.
/// The database stores these as the `order_status` Postgres enum using the
/// uppercase wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created, waiting for a driver to accept.
    #[default]
    Pending,
    /// Accepted by a driver; delivery in progress.
    Assigned,
    /// Terminal state; retained for history queries.
    Delivered,
}

impl OrderStatus {
    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Assigned) | (Self::Assigned, Self::Delivered)
        )
    }

    /// Whether this state admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// The uppercase wire name, matching the database enum.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Assigned => "ASSIGNED",
            Self::Delivered => "DELIVERED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "ASSIGNED" => Ok(Self::Assigned),
            "DELIVERED" => Ok(Self::Delivered),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_forward_transitions_are_legal() {
        use OrderStatus::{Assigned, Delivered, Pending};

        assert!(Pending.can_transition_to(Assigned));
        assert!(Assigned.can_transition_to(Delivered));

        // Everything else is forbidden, including skips and reversals.
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Assigned.can_transition_to(Pending));
        assert!(!Assigned.can_transition_to(Assigned));
        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Delivered.can_transition_to(Assigned));
        assert!(!Delivered.can_transition_to(Delivered));
    }

    #[test]
    fn delivered_is_the_only_terminal_state() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Assigned.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
    }

    #[test]
    fn wire_names_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Assigned,
            OrderStatus::Delivered,
        ] {
            let parsed: OrderStatus = status.as_str().parse().expect("round trip");
            assert_eq!(parsed, status);
        }
        assert!("CANCELLED".parse::<OrderStatus>().is_err());
    }
}
