//! Authorization capability checks
//!
//! One uniform check applied before every order operation instead of ad hoc
//! role tests scattered across handlers. Admins satisfy every requirement.

use crate::{
    error::{Error, Result},
    types::{Actor, Order, Role},
};

/// What an operation requires of its actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// A specific role
    Role(Role),

    /// Buyer of the order, or a farmer owning at least one line item
    Participant,

    /// A farmer owning at least one line item
    LineItemOwner,
}

/// Check an actor against a requirement for one order
pub fn authorize(actor: &Actor, order: &Order, requirement: Requirement) -> Result<()> {
    if actor.role == Role::Admin {
        return Ok(());
    }

    let allowed = match requirement {
        Requirement::Role(role) => actor.role == role,
        Requirement::Participant => {
            order.buyer_id == actor.user_id
                || (actor.role == Role::Farmer && order.has_farmer(actor.user_id))
        }
        Requirement::LineItemOwner => {
            actor.role == Role::Farmer && order.has_farmer(actor.user_id)
        }
    };

    if allowed {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "{:?} {} may not act on order {}",
            actor.role, actor.user_id, order.order_id
        )))
    }
}
