//! # Order lifecycle
//!
//! The order state machine. Orders move forward along
//!
//! ```text
//! pending -> preparing -> in_transit -> delivered -> completed
//!    |           |
//!    +-----------+-----> cancelled
//! ```
//!
//! Every edge is gated by the role of the actor requesting it:
//!
//! | From        | To          | Allowed roles   |
//! |-------------|-------------|-----------------|
//! | pending     | preparing   | seller          |
//! | pending     | cancelled   | buyer, admin    |
//! | preparing   | in_transit  | seller          |
//! | preparing   | cancelled   | buyer, admin    |
//! | in_transit  | delivered   | seller          |
//! | delivered   | completed   | buyer, admin    |
//!
//! `completed` and `cancelled` are terminal. Entering `completed` is the single commission-triggering edge.
use thiserror::Error;

use crate::db_types::{OrderStatusType, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Transition from {from} to {to} is not permitted")]
    InvalidTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("A {role} may not move an order from {from} to {to}")]
    ForbiddenActor { role: Role, from: OrderStatusType, to: OrderStatusType },
}

const SELLER_ONLY: &[Role] = &[Role::Seller];
const BUYER_OR_ADMIN: &[Role] = &[Role::Buyer, Role::Admin];

/// Returns the roles that may request the `from -> to` edge, or `None` if the edge does not exist.
pub fn allowed_roles(from: OrderStatusType, to: OrderStatusType) -> Option<&'static [Role]> {
    use OrderStatusType::*;
    match (from, to) {
        (Pending, Preparing) | (Preparing, InTransit) | (InTransit, Delivered) => Some(SELLER_ONLY),
        (Pending, Cancelled) | (Preparing, Cancelled) => Some(BUYER_OR_ADMIN),
        (Delivered, Completed) => Some(BUYER_OR_ADMIN),
        _ => None,
    }
}

/// Checks that `from -> to` is an edge of the state machine and that `role` holds the right to request it.
///
/// Edge existence is checked first, so a request for a non-existent edge is always an `InvalidTransition`,
/// whoever asks.
pub fn authorize(from: OrderStatusType, to: OrderStatusType, role: Role) -> Result<(), LifecycleError> {
    let roles = allowed_roles(from, to).ok_or(LifecycleError::InvalidTransition { from, to })?;
    if roles.contains(&role) {
        Ok(())
    } else {
        Err(LifecycleError::ForbiddenActor { role, from, to })
    }
}

/// The statuses an order in `from` may legally move to next, regardless of actor.
pub fn next_statuses(from: OrderStatusType) -> Vec<OrderStatusType> {
    OrderStatusType::ALL.into_iter().filter(|to| allowed_roles(from, *to).is_some()).collect()
}

pub fn is_commission_trigger(to: OrderStatusType) -> bool {
    to == OrderStatusType::Completed
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db_types::OrderStatusType::*;

    const EDGES: [(OrderStatusType, OrderStatusType); 6] = [
        (Pending, Preparing),
        (Pending, Cancelled),
        (Preparing, InTransit),
        (Preparing, Cancelled),
        (InTransit, Delivered),
        (Delivered, Completed),
    ];

    #[test]
    fn every_pair_outside_the_table_is_invalid() {
        for from in OrderStatusType::ALL {
            for to in OrderStatusType::ALL {
                if EDGES.contains(&(from, to)) {
                    continue;
                }
                for role in [Role::Admin, Role::Buyer, Role::Seller] {
                    assert_eq!(authorize(from, to, role), Err(LifecycleError::InvalidTransition { from, to }));
                }
            }
        }
    }

    #[test]
    fn edges_are_role_gated() {
        assert!(authorize(Pending, Preparing, Role::Seller).is_ok());
        assert_eq!(
            authorize(Pending, Preparing, Role::Buyer),
            Err(LifecycleError::ForbiddenActor { role: Role::Buyer, from: Pending, to: Preparing })
        );
        assert!(authorize(Pending, Cancelled, Role::Buyer).is_ok());
        assert!(authorize(Preparing, Cancelled, Role::Admin).is_ok());
        assert!(authorize(Preparing, Cancelled, Role::Seller).is_err());
        assert!(authorize(InTransit, Delivered, Role::Admin).is_err());
        assert!(authorize(Delivered, Completed, Role::Buyer).is_ok());
        assert!(authorize(Delivered, Completed, Role::Admin).is_ok());
        assert!(authorize(Delivered, Completed, Role::Seller).is_err());
    }

    #[test]
    fn transitions_only_move_forward() {
        for (from, to) in EDGES {
            assert!(to.rank() > from.rank(), "{from} -> {to} does not increase rank");
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        assert!(next_statuses(Completed).is_empty());
        assert!(next_statuses(Cancelled).is_empty());
        assert_eq!(next_statuses(Pending), vec![Preparing, Cancelled]);
        assert_eq!(next_statuses(InTransit), vec![Delivered]);
    }

    #[test]
    fn only_completion_triggers_commission() {
        let triggers: Vec<_> = OrderStatusType::ALL.into_iter().filter(|s| is_commission_trigger(*s)).collect();
        assert_eq!(triggers, vec![Completed]);
    }
}
