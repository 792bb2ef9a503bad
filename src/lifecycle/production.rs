use crate::entities::ProductionOrderStatus;

use super::TransitionError;

use ProductionOrderStatus::*;

/// Effects a validated production-order transition asks the caller to
/// apply. Everything in the plan must happen in one transaction together
/// with the status write itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub target: ProductionOrderStatus,
    /// Consume BOM supplies (all-or-nothing) before the status write.
    pub consumes_supplies: bool,
    /// Create a finished-good lot sized to the order quantity.
    pub creates_lot: bool,
    /// Stamp `actual_start` if not already set.
    pub stamps_actual_start: bool,
    /// Stamp `actual_end`.
    pub stamps_actual_end: bool,
}

/// Allowed predecessor set per target status. `Cancelled` is handled
/// separately: it is reachable from any non-terminal status.
fn allowed_predecessors(target: ProductionOrderStatus) -> &'static [ProductionOrderStatus] {
    match target {
        Pending => &[],
        SuppliesRequested => &[Pending],
        SuppliesReceived => &[SuppliesRequested, Paused],
        Started => &[SuppliesReceived, Paused],
        InProgress => &[Started, Paused],
        PartiallyComplete => &[Started, InProgress, Paused],
        Completed => &[Started, InProgress, PartiallyComplete],
        Paused => &[SuppliesReceived, Started, InProgress, PartiallyComplete],
        Cancelled => &[],
    }
}

/// Validates `current -> target` and returns the effect plan.
pub fn plan_transition(
    current: ProductionOrderStatus,
    target: ProductionOrderStatus,
) -> Result<TransitionPlan, TransitionError> {
    if current.is_terminal() {
        return Err(TransitionError::terminal(current));
    }

    let valid = match target {
        Cancelled => true,
        _ => allowed_predecessors(target).contains(&current),
    };
    if !valid {
        return Err(TransitionError::invalid(current, target));
    }

    Ok(TransitionPlan {
        target,
        consumes_supplies: target == SuppliesReceived && current == SuppliesRequested,
        creates_lot: target == Completed,
        stamps_actual_start: target == Started,
        stamps_actual_end: matches!(target, Completed | Cancelled),
    })
}

/// Sector, schedule dates and notes are frozen once the order is terminal.
pub fn is_editable(status: ProductionOrderStatus) -> bool {
    !status.is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use test_case::test_case;

    #[test_case(Pending, SuppliesRequested)]
    #[test_case(SuppliesRequested, SuppliesReceived)]
    #[test_case(Paused, SuppliesReceived)]
    #[test_case(SuppliesReceived, Started)]
    #[test_case(Started, InProgress)]
    #[test_case(InProgress, PartiallyComplete)]
    #[test_case(PartiallyComplete, Completed)]
    #[test_case(Started, Completed)]
    #[test_case(InProgress, Paused)]
    fn accepts_valid_transitions(from: ProductionOrderStatus, to: ProductionOrderStatus) {
        assert!(plan_transition(from, to).is_ok());
    }

    #[test_case(Pending, SuppliesReceived)]
    #[test_case(Pending, Completed)]
    #[test_case(SuppliesRequested, Started)]
    #[test_case(SuppliesReceived, Completed)]
    #[test_case(Paused, Completed)]
    #[test_case(Pending, Paused)]
    fn rejects_skipped_states(from: ProductionOrderStatus, to: ProductionOrderStatus) {
        assert_matches!(
            plan_transition(from, to),
            Err(TransitionError::InvalidTransition { .. })
        );
    }

    #[test_case(Completed)]
    #[test_case(Cancelled)]
    fn terminal_states_accept_nothing(from: ProductionOrderStatus) {
        for to in [
            SuppliesRequested,
            SuppliesReceived,
            Started,
            InProgress,
            PartiallyComplete,
            Completed,
            Cancelled,
            Paused,
        ] {
            assert_matches!(
                plan_transition(from, to),
                Err(TransitionError::Terminal { .. })
            );
        }
        assert!(!is_editable(from));
    }

    #[test]
    fn cancel_is_reachable_from_any_productive_state(){
        for from in [
            Pending,
            SuppliesRequested,
            SuppliesReceived,
            Started,
            InProgress,
            PartiallyComplete,
            Paused,
        ] {
            let plan = plan_transition(from, Cancelled).expect("cancel allowed");
            assert!(plan.stamps_actual_end);
            assert!(!plan.creates_lot);
        }
    }

    #[test]
    fn receiving_supplies_consumes_stock() {
        let plan = plan_transition(SuppliesRequested, SuppliesReceived).unwrap();
        assert!(plan.consumes_supplies);

        // Resuming from pause does not consume a second time.
        let resumed = plan_transition(Paused, SuppliesReceived).unwrap();
        assert!(!resumed.consumes_supplies);
    }

    #[test]
    fn completion_creates_a_lot_and_closes_the_order() {
        let plan = plan_transition(InProgress, Completed).unwrap();
        assert!(plan.creates_lot);
        assert!(plan.stamps_actual_end);
        assert!(!plan.consumes_supplies);
    }
}
