// service/access_policy.rs
//! Ticket access rules.
//!
//! Every read or mutation of a ticket (and of its comments and attachments)
//! goes through this module. The decision depends only on the actor's role and
//! on how the actor relates to the ticket, so the whole policy is one table:
//! `(UserRole, Relation) -> PermissionSet`.

use crate::{
    models::{
        ticketmodel::Ticket,
        usermodel::{User, UserRole},
    },
    service::error::ServiceError,
};

/// How the actor stands with respect to a ticket. `Creator` wins when the
/// actor is both creator and assignee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Creator,
    Assignee,
    Unrelated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    View,
    Comment,
    UpdateStatus,
    Assign,
    Rate,
}

impl Permission {
    const fn bit(self) -> u8 {
        match self {
            Permission::View => 1,
            Permission::Comment => 1 << 1,
            Permission::UpdateStatus => 1 << 2,
            Permission::Assign => 1 << 3,
            Permission::Rate => 1 << 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionSet(u8);

impl PermissionSet {
    pub const NONE: PermissionSet = PermissionSet(0);

    pub const fn with(self, permission: Permission) -> Self {
        PermissionSet(self.0 | permission.bit())
    }

    pub const fn contains(self, permission: Permission) -> bool {
        self.0 & permission.bit() != 0
    }
}

const READ_WRITE: PermissionSet = PermissionSet::NONE
    .with(Permission::View)
    .with(Permission::Comment)
    .with(Permission::UpdateStatus);

const SUPPORT: PermissionSet = READ_WRITE.with(Permission::Assign);

const OWNER: PermissionSet = READ_WRITE.with(Permission::Rate);

const SUPPORT_OWNER: PermissionSet = SUPPORT.with(Permission::Rate);

/// The single source of truth for who may do what.
pub fn permissions(role: UserRole, relation: Relation) -> PermissionSet {
    match (role, relation) {
        (UserRole::Admin, Relation::Creator) => SUPPORT_OWNER,
        (UserRole::Admin, _) => SUPPORT,

        (UserRole::SupportAgent, Relation::Creator) => SUPPORT_OWNER,
        (UserRole::SupportAgent, Relation::Assignee) => SUPPORT,
        (UserRole::SupportAgent, Relation::Unrelated) => PermissionSet::NONE,

        (UserRole::User, Relation::Creator) => OWNER,
        (UserRole::User, _) => PermissionSet::NONE,
    }
}

pub fn relation(actor: &User, ticket: &Ticket) -> Relation {
    if ticket.creator_id == actor.id {
        Relation::Creator
    } else if ticket.assignee_id == Some(actor.id) {
        Relation::Assignee
    } else {
        Relation::Unrelated
    }
}

pub fn can(actor: &User, ticket: &Ticket, permission: Permission) -> bool {
    permissions(actor.role, relation(actor, ticket)).contains(permission)
}

/// Base policy: may the actor see this ticket at all.
pub fn can_access(actor: &User, ticket: &Ticket) -> bool {
    can(actor, ticket, Permission::View)
}

pub fn ensure_can_access(actor: &User, ticket: &Ticket) -> Result<(), ServiceError> {
    if can_access(actor, ticket) {
        Ok(())
    } else {
        Err(ServiceError::forbidden("You don't have access to this ticket"))
    }
}

pub fn authorize_comment(actor: &User, ticket: &Ticket) -> Result<(), ServiceError> {
    if can(actor, ticket, Permission::Comment) {
        Ok(())
    } else {
        Err(ServiceError::forbidden("You don't have access to this ticket"))
    }
}

pub fn authorize_status_update(actor: &User, ticket: &Ticket) -> Result<(), ServiceError> {
    if can(actor, ticket, Permission::UpdateStatus) {
        return Ok(());
    }

    match actor.role {
        UserRole::User => Err(ServiceError::forbidden("You can only update your own tickets")),
        _ => Err(ServiceError::forbidden("You don't have access to this ticket")),
    }
}

/// Checks the acting side of an assignment. The target is checked separately
/// with [`ensure_assignable`] once it has been loaded.
pub fn authorize_assign(actor: &User, ticket: &Ticket) -> Result<(), ServiceError> {
    if !actor.role.is_support_side() {
        return Err(ServiceError::forbidden(
            "Only admins and support agents can assign tickets",
        ));
    }

    if can(actor, ticket, Permission::Assign) {
        Ok(())
    } else {
        Err(ServiceError::forbidden("You don't have access to this ticket"))
    }
}

pub fn ensure_assignable(assignee: &User) -> Result<(), ServiceError> {
    if assignee.role.is_support_side() {
        Ok(())
    } else {
        Err(ServiceError::forbidden("Can only assign to support agents or admins"))
    }
}

/// Rating belongs to the creator alone, whatever their role, and only once
/// the ticket is resolved or closed.
pub fn authorize_rate(actor: &User, ticket: &Ticket) -> Result<(), ServiceError> {
    if relation(actor, ticket) != Relation::Creator || !can(actor, ticket, Permission::Rate) {
        return Err(ServiceError::forbidden("Only ticket creator can rate the ticket"));
    }

    if !ticket.status.is_rateable() {
        return Err(ServiceError::forbidden("Can only rate resolved or closed tickets"));
    }

    Ok(())
}
