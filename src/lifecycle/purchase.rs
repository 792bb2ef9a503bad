use crate::entities::PurchaseOrderStatus;

use super::TransitionError;

use PurchaseOrderStatus::*;

fn allowed_predecessors(target: PurchaseOrderStatus) -> &'static [PurchaseOrderStatus] {
    match target {
        Draft => &[],
        Approved => &[Draft],
        SentToSupplier => &[Approved],
        InTransit => &[SentToSupplier],
        // Receipt statuses are reached through `status_after_receipt`, not
        // through a bare status update, but the same predecessor rules hold.
        PartiallyReceived => &[InTransit, PartiallyReceived],
        Received => &[InTransit, PartiallyReceived],
        Cancelled => &[],
    }
}

/// Validates `current -> target`. `Cancelled` is reachable from any
/// non-terminal status.
pub fn plan_transition(
    current: PurchaseOrderStatus,
    target: PurchaseOrderStatus,
) -> Result<(), TransitionError> {
    if current.is_terminal() {
        return Err(TransitionError::terminal(current));
    }

    let valid = match target {
        Cancelled => true,
        _ => allowed_predecessors(target).contains(&current),
    };
    if valid {
        Ok(())
    } else {
        Err(TransitionError::invalid(current, target))
    }
}

/// Quantity, supplier, supply item and price can only change on drafts.
pub fn is_editable(status: PurchaseOrderStatus) -> bool {
    status == Draft
}

/// Goods can only be booked in while the order is on its way.
pub fn can_receive(status: PurchaseOrderStatus) -> bool {
    matches!(status, InTransit | PartiallyReceived)
}

/// Status after booking a receipt: fully received orders close, anything
/// short of the ordered quantity stays open as partially received.
pub fn status_after_receipt(ordered: i32, received_total: i32) -> PurchaseOrderStatus {
    if received_total >= ordered {
        Received
    } else {
        PartiallyReceived
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use test_case::test_case;

    #[test_case(Draft, Approved)]
    #[test_case(Approved, SentToSupplier)]
    #[test_case(SentToSupplier, InTransit)]
    #[test_case(InTransit, PartiallyReceived)]
    #[test_case(PartiallyReceived, Received)]
    #[test_case(InTransit, Received)]
    fn accepts_forward_path(from: PurchaseOrderStatus, to: PurchaseOrderStatus) {
        assert!(plan_transition(from, to).is_ok());
    }

    #[test_case(Draft, SentToSupplier)]
    #[test_case(Draft, Received)]
    #[test_case(Approved, InTransit)]
    #[test_case(SentToSupplier, Approved)]
    fn rejects_skips_and_backtracking(from: PurchaseOrderStatus, to: PurchaseOrderStatus) {
        assert_matches!(
            plan_transition(from, to),
            Err(TransitionError::InvalidTransition { .. })
        );
    }

    #[test]
    fn cancel_reachable_from_all_open_states() {
        for from in [Draft, Approved, SentToSupplier, InTransit, PartiallyReceived] {
            assert!(plan_transition(from, Cancelled).is_ok());
        }
        assert_matches!(
            plan_transition(Received, Cancelled),
            Err(TransitionError::Terminal { .. })
        );
        assert_matches!(
            plan_transition(Cancelled, Approved),
            Err(TransitionError::Terminal { .. })
        );
    }

    #[test]
    fn only_drafts_are_editable() {
        assert!(is_editable(Draft));
        for status in [Approved, SentToSupplier, InTransit, PartiallyReceived, Received, Cancelled]
        {
            assert!(!is_editable(status));
        }
    }

    #[test]
    fn receipt_status_tracks_cumulative_quantity() {
        assert_eq!(status_after_receipt(10, 4), PartiallyReceived);
        assert_eq!(status_after_receipt(10, 10), Received);
        assert_eq!(status_after_receipt(10, 12), Received);
    }
}
