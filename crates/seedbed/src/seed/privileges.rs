//! Global privilege grants.
//!
//! Each privilege is a store set named `privileges:global:<privilege>` whose
//! members are the groups holding it. Grants are additive.

use crate::store::{Store, StoreError};

/// Group containing every signed-in account.
pub const REGISTERED_USERS: &str = "registered-users";
/// Group representing anonymous visitors.
pub const GUESTS: &str = "guests";

/// Privileges granted to one group during seeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivilegeGrant {
    /// Receiving group.
    pub group: &'static str,
    /// Granted privilege identifiers.
    pub privileges: &'static [&'static str],
}

/// Baseline privilege set applied on every seed.
pub const BASELINE_GRANTS: &[PrivilegeGrant] = &[
    PrivilegeGrant {
        group: REGISTERED_USERS,
        privileges: &[
            "chat",
            "upload:post:image",
            "signature",
            "search:content",
            "search:users",
            "search:tags",
            "view:users",
            "view:tags",
            "view:groups",
            "local:login",
        ],
    },
    PrivilegeGrant {
        group: GUESTS,
        privileges: &["view:users", "view:tags", "view:groups"],
    },
];

/// Store key of the set listing holders of `privilege`.
#[must_use]
pub fn privilege_key(privilege: &str) -> String {
    format!("privileges:global:{privilege}")
}

/// Grants `privileges` to `group`.
pub async fn give(store: &dyn Store, privileges: &[&str], group: &str) -> Result<(), StoreError> {
    let members = [group.to_string()];
    for privilege in privileges {
        store.set_add(&privilege_key(privilege), &members).await?;
    }
    Ok(())
}

/// Whether `group` holds the global `privilege`.
pub async fn global_can(store: &dyn Store, privilege: &str, group: &str) -> Result<bool, StoreError> {
    store.is_set_member(&privilege_key(privilege), group).await
}
