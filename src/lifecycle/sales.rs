use crate::entities::{ProductionOrderStatus, SalesOrderStatus};

use super::TransitionError;

/// User-driven sales-order actions. Derived statuses
/// (`ReadyForDelivery`, `Completed`) are never reached through these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesAction {
    Confirm,
    RequestSupplies,
    Cancel,
}

/// Validates a manual action against the current status and returns the
/// status it moves the order to.
pub fn plan_action(
    current: SalesOrderStatus,
    action: SalesAction,
) -> Result<SalesOrderStatus, TransitionError> {
    if current.is_terminal() {
        return Err(TransitionError::terminal(current));
    }

    match (current, action) {
        (SalesOrderStatus::Pending, SalesAction::Confirm) => Ok(SalesOrderStatus::Confirmed),
        (SalesOrderStatus::Confirmed, SalesAction::RequestSupplies) => {
            Ok(SalesOrderStatus::SuppliesRequested)
        }
        (_, SalesAction::Cancel) => Ok(SalesOrderStatus::Cancelled),
        (from, SalesAction::Confirm) => Err(TransitionError::invalid(from, "confirmed")),
        (from, SalesAction::RequestSupplies) => {
            Err(TransitionError::invalid(from, "supplies_requested"))
        }
    }
}

/// Derives the status an order should take from the aggregate state of its
/// child production orders: `ReadyForDelivery` exactly when at least one
/// non-cancelled child exists and every non-cancelled child is completed.
/// Returns `None` when the aggregate does not force a change.
pub fn derive_from_children(
    current: SalesOrderStatus,
    children: &[ProductionOrderStatus],
) -> Option<SalesOrderStatus> {
    // Derived promotion only applies while the order is in flight.
    if matches!(
        current,
        SalesOrderStatus::ReadyForDelivery | SalesOrderStatus::Completed | SalesOrderStatus::Cancelled
    ) {
        return None;
    }

    let active: Vec<ProductionOrderStatus> = children
        .iter()
        .filter(|s| **s != ProductionOrderStatus::Cancelled)
        .copied()
        .collect();

    if !active.is_empty()
        && active
            .iter()
            .all(|s| *s == ProductionOrderStatus::Completed)
    {
        Some(SalesOrderStatus::ReadyForDelivery)
    } else {
        None
    }
}

/// An order ready for delivery completes once every finished-good lot its
/// production orders produced has been shipped.
pub fn derive_from_lots(
    current: SalesOrderStatus,
    shipped_flags: &[bool],
) -> Option<SalesOrderStatus> {
    if current != SalesOrderStatus::ReadyForDelivery {
        return None;
    }
    if !shipped_flags.is_empty() && shipped_flags.iter().all(|shipped| *shipped) {
        Some(SalesOrderStatus::Completed)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use ProductionOrderStatus as Op;
    use SalesOrderStatus as Ov;

    #[test]
    fn manual_flow_follows_confirm_then_request() {
        assert_eq!(plan_action(Ov::Pending, SalesAction::Confirm), Ok(Ov::Confirmed));
        assert_eq!(
            plan_action(Ov::Confirmed, SalesAction::RequestSupplies),
            Ok(Ov::SuppliesRequested)
        );
        assert_matches!(
            plan_action(Ov::Pending, SalesAction::RequestSupplies),
            Err(TransitionError::InvalidTransition { .. })
        );
        assert_matches!(
            plan_action(Ov::Confirmed, SalesAction::Confirm),
            Err(TransitionError::InvalidTransition { .. })
        );
    }

    #[test]
    fn cancel_allowed_until_terminal() {
        for from in [Ov::Pending, Ov::Confirmed, Ov::SuppliesRequested, Ov::ReadyForDelivery] {
            assert_eq!(plan_action(from, SalesAction::Cancel), Ok(Ov::Cancelled));
        }
        assert_matches!(
            plan_action(Ov::Completed, SalesAction::Cancel),
            Err(TransitionError::Terminal { .. })
        );
        assert_matches!(
            plan_action(Ov::Cancelled, SalesAction::Cancel),
            Err(TransitionError::Terminal { .. })
        );
    }

    #[test]
    fn ready_for_delivery_requires_all_active_children_complete() {
        // All complete
        assert_eq!(
            derive_from_children(Ov::SuppliesRequested, &[Op::Completed, Op::Completed]),
            Some(Ov::ReadyForDelivery)
        );
        // One still producing
        assert_eq!(
            derive_from_children(Ov::SuppliesRequested, &[Op::Completed, Op::InProgress]),
            None
        );
        // Cancelled children are ignored
        assert_eq!(
            derive_from_children(Ov::SuppliesRequested, &[Op::Completed, Op::Cancelled]),
            Some(Ov::ReadyForDelivery)
        );
        // All cancelled: nothing to deliver
        assert_eq!(
            derive_from_children(Ov::SuppliesRequested, &[Op::Cancelled]),
            None
        );
        // No children at all
        assert_eq!(derive_from_children(Ov::SuppliesRequested, &[]), None);
    }

    #[test]
    fn derivation_never_touches_settled_orders() {
        for current in [Ov::ReadyForDelivery, Ov::Completed, Ov::Cancelled] {
            assert_eq!(derive_from_children(current, &[Op::Completed]), None);
        }
    }

    #[test]
    fn completion_requires_every_lot_shipped() {
        assert_eq!(
            derive_from_lots(Ov::ReadyForDelivery, &[true, true]),
            Some(Ov::Completed)
        );
        assert_eq!(derive_from_lots(Ov::ReadyForDelivery, &[true, false]), None);
        assert_eq!(derive_from_lots(Ov::ReadyForDelivery, &[]), None);
        assert_eq!(derive_from_lots(Ov::SuppliesRequested, &[true]), None);
    }
}
