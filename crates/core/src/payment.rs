//! Payment status normalization and the transition guard.
//!
//! Gateway webhooks report free-form status strings. They are first folded
//! into [`PaymentStatus`] by [`normalize_gateway_status`], then
//! [`reconcile`] decides whether the stored order may move to that status.
//! Both functions are pure; the caller applies the result with a
//! compare-and-set update.

use crate::types::{OrderStatus, PaymentStatus};

/// Fold a gateway status string into a [`PaymentStatus`].
///
/// Matching is case-insensitive and ignores surrounding whitespace. Any
/// unrecognised value maps to [`PaymentStatus::Pending`].
#[must_use]
pub fn normalize_gateway_status(raw: &str) -> PaymentStatus {
    match raw.trim().to_ascii_lowercase().as_str() {
        "success" | "paid" | "completed" | "captured" | "payment_success" => PaymentStatus::Paid,
        "failed" | "failure" | "cancelled" | "canceled" | "payment_failed" => PaymentStatus::Failed,
        _ => PaymentStatus::Pending,
    }
}

/// Why a reported status was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The order is already paid; paid is terminal.
    AlreadyPaid,
    /// The report would move the order back to pending.
    WouldRegress,
}

impl RejectReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlreadyPaid => "order already paid",
            Self::WouldRegress => "status would regress to pending",
        }
    }
}

/// Outcome of checking a reported status against the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The stored status already matches.
    Unchanged,
    /// Move `payment_status` from `from` to `to`, and set the fulfillment
    /// status when `order_status` is `Some`.
    Apply {
        from: PaymentStatus,
        to: PaymentStatus,
        order_status: Option<OrderStatus>,
    },
    /// The report conflicts with the stored state and is ignored.
    Rejected(RejectReason),
}

/// Decide how a stored order reacts to a reported payment status.
///
/// | stored  | reported | result |
/// |---------|----------|--------|
/// | any     | same     | unchanged |
/// | paid    | other    | rejected (already paid) |
/// | any     | pending  | rejected (regression) |
/// | pending / failed | paid | apply; confirm if pending or cancelled |
/// | pending | failed   | apply; cancel if pending |
#[must_use]
pub fn reconcile(
    current_payment: PaymentStatus,
    current_order: OrderStatus,
    reported: PaymentStatus,
) -> Reconciliation {
    use PaymentStatus::{Failed, Paid, Pending};

    if current_payment == reported {
        return Reconciliation::Unchanged;
    }

    match (current_payment, reported) {
        (Paid, _) => Reconciliation::Rejected(RejectReason::AlreadyPaid),
        (_, Pending) => Reconciliation::Rejected(RejectReason::WouldRegress),
        (Pending | Failed, Paid) => Reconciliation::Apply {
            from: current_payment,
            to: Paid,
            order_status: matches!(current_order, OrderStatus::Pending | OrderStatus::Cancelled)
                .then_some(OrderStatus::Confirmed),
        },
        (Pending, Failed) => Reconciliation::Apply {
            from: Pending,
            to: Failed,
            order_status: (current_order == OrderStatus::Pending)
                .then_some(OrderStatus::Cancelled),
        },
        // Equal pairs returned above
        (Failed, Failed) => Reconciliation::Unchanged,
    }
}

/// Build a gateway order reference such as `CF-3F9A0C12B7D4E5A6`.
///
/// The caller supplies the random bytes so this stays deterministic.
#[must_use]
pub fn format_order_reference(prefix: &str, random: &[u8; 8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(prefix.len() + 17);
    out.push_str(prefix);
    out.push('-');
    for byte in random {
        let _ = write!(out, "{byte:02X}");
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALL_PAYMENT: [PaymentStatus; 3] =
        [PaymentStatus::Pending, PaymentStatus::Paid, PaymentStatus::Failed];

    #[test]
    fn test_normalize_alias_table() {
        for raw in ["SUCCESS", "paid", "Completed", "captured", "PAYMENT_SUCCESS", " success "] {
            assert_eq!(normalize_gateway_status(raw), PaymentStatus::Paid, "{raw}");
        }
        for raw in ["failed", "FAILURE", "cancelled", "canceled", "payment_failed"] {
            assert_eq!(normalize_gateway_status(raw), PaymentStatus::Failed, "{raw}");
        }
        for raw in ["", "PENDING", "USER_DROPPED", "flagged", "not-a-status"] {
            assert_eq!(normalize_gateway_status(raw), PaymentStatus::Pending, "{raw}");
        }
    }

    #[test]
    fn test_pending_to_paid_confirms_order() {
        assert_eq!(
            reconcile(PaymentStatus::Pending, OrderStatus::Pending, PaymentStatus::Paid),
            Reconciliation::Apply {
                from: PaymentStatus::Pending,
                to: PaymentStatus::Paid,
                order_status: Some(OrderStatus::Confirmed),
            }
        );
    }

    #[test]
    fn test_paid_keeps_staff_set_fulfillment() {
        assert_eq!(
            reconcile(PaymentStatus::Pending, OrderStatus::Processing, PaymentStatus::Paid),
            Reconciliation::Apply {
                from: PaymentStatus::Pending,
                to: PaymentStatus::Paid,
                order_status: None,
            }
        );
    }

    #[test]
    fn test_failed_then_paid_is_allowed() {
        assert_eq!(
            reconcile(PaymentStatus::Failed, OrderStatus::Cancelled, PaymentStatus::Paid),
            Reconciliation::Apply {
                from: PaymentStatus::Failed,
                to: PaymentStatus::Paid,
                order_status: Some(OrderStatus::Confirmed),
            }
        );
    }

    #[test]
    fn test_pending_to_failed_cancels() {
        assert_eq!(
            reconcile(PaymentStatus::Pending, OrderStatus::Pending, PaymentStatus::Failed),
            Reconciliation::Apply {
                from: PaymentStatus::Pending,
                to: PaymentStatus::Failed,
                order_status: Some(OrderStatus::Cancelled),
            }
        );
    }

    #[test]
    fn test_paid_is_terminal() {
        for reported in [PaymentStatus::Failed, PaymentStatus::Pending] {
            assert_eq!(
                reconcile(PaymentStatus::Paid, OrderStatus::Confirmed, reported),
                Reconciliation::Rejected(RejectReason::AlreadyPaid)
            );
        }
    }

    #[test]
    fn test_never_regresses_to_pending() {
        assert_eq!(
            reconcile(PaymentStatus::Failed, OrderStatus::Cancelled, PaymentStatus::Pending),
            Reconciliation::Rejected(RejectReason::WouldRegress)
        );
    }

    #[test]
    fn test_reapplying_same_status_is_idempotent() {
        for current in ALL_PAYMENT {
            for reported in ALL_PAYMENT {
                let first = reconcile(current, OrderStatus::Pending, reported);
                let after = match first {
                    Reconciliation::Apply { to, .. } => to,
                    _ => current,
                };
                let order_after = match first {
                    Reconciliation::Apply {
                        order_status: Some(s),
                        ..
                    } => s,
                    _ => OrderStatus::Pending,
                };
                // A second delivery of the same report changes nothing
                let second = reconcile(after, order_after, reported);
                assert!(
                    !matches!(second, Reconciliation::Apply { .. }),
                    "{current:?} -> {reported:?} applied twice"
                );
            }
        }
    }

    #[test]
    fn test_order_reference_format() {
        let id = format_order_reference("CF", &[0x3f, 0x9a, 0x0c, 0x12, 0xb7, 0xd4, 0xe5, 0xa6]);
        assert_eq!(id, "CF-3F9A0C12B7D4E5A6");
        assert_eq!(format_order_reference("CF", &[0; 8]).len(), 19);
    }
}
