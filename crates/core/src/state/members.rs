//! Members, roles and permission checks

use std::collections::BTreeSet;

use tracing::{debug, info};

use super::{Persist, StateStore, StateValue};
use crate::error::{Error, Result};
use crate::models::{DenId, Member, Role, RoleId, UserId, UserStatus};
use crate::permissions::{Permission, PermissionMatrix};

impl StateStore {
    /// Members of a den; empty for unknown dens
    pub fn members_for_den(&self, den_id: &DenId) -> Vec<Member> {
        self.data
            .borrow()
            .members
            .get(den_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn find_member(&self, den_id: &DenId, member_id: &UserId) -> Option<Member> {
        self.members_for_den(den_id)
            .into_iter()
            .find(|m| &m.id == member_id)
    }

    /// Roles of a den. Dens without stored roles report the default
    /// admin/moderator pair; they are stored on the first role mutation.
    pub fn roles_for_den(&self, den_id: &DenId) -> Vec<Role> {
        match self.data.borrow().roles.get(den_id) {
            Some(roles) => roles.clone(),
            None => Role::defaults(),
        }
    }

    pub fn set_member_status(&self, den_id: &DenId, member_id: &UserId, status: UserStatus) -> bool {
        self.modify_member(den_id, member_id, |m| m.status = status)
    }

    /// Whether a member holds `permission` in a den. Unknown members hold
    /// nothing.
    pub fn has_permission(&self, den_id: &DenId, member_id: &UserId, permission: Permission) -> bool {
        let Some(member) = self.find_member(den_id, member_id) else {
            return false;
        };
        PermissionMatrix::can_perform(&member, &self.roles_for_den(den_id), permission)
    }

    /// Create a role. `actor_id` needs `ManageRoles`.
    pub fn create_role(
        &self,
        den_id: &DenId,
        actor_id: &UserId,
        name: &str,
        color: &str,
        permissions: BTreeSet<Permission>,
    ) -> Result<Role> {
        self.require_permission(den_id, actor_id, Permission::ManageRoles)?;

        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidOperation("role name is empty".to_string()));
        }

        let role = Role::new(name.to_string(), color.to_string(), permissions);
        let mut roles = self.data.borrow().roles.clone();
        roles
            .entry(den_id.clone())
            .or_insert_with(Role::defaults)
            .push(role.clone());
        self.set_with(StateValue::Roles(roles), Persist::No);

        info!(den_id = %den_id, role = %role.name, "Created role");
        Ok(role)
    }

    /// Give a member a role. `actor_id` needs `ManageRoles`.
    pub fn assign_role(
        &self,
        den_id: &DenId,
        actor_id: &UserId,
        member_id: &UserId,
        role_id: &RoleId,
    ) -> Result<()> {
        self.require_permission(den_id, actor_id, Permission::ManageRoles)?;
        if self.find_member(den_id, member_id).is_none() {
            return Err(Error::NotFound(format!("member {member_id}")));
        }
        self.require_role(den_id, role_id)?;

        self.modify_member(den_id, member_id, |m| {
            if !m.has_role(role_id) {
                m.roles.push(role_id.clone());
            }
        });
        info!(den_id = %den_id, member_id = %member_id, role_id = %role_id, "Assigned role");
        Ok(())
    }

    /// Take a role away from a member. `actor_id` needs `ManageRoles`.
    pub fn revoke_role(
        &self,
        den_id: &DenId,
        actor_id: &UserId,
        member_id: &UserId,
        role_id: &RoleId,
    ) -> Result<()> {
        self.require_permission(den_id, actor_id, Permission::ManageRoles)?;

        let changed = self.modify_member(den_id, member_id, |m| m.roles.retain(|r| r != role_id));
        if !changed {
            return Err(Error::NotFound(format!("member {member_id}")));
        }
        Ok(())
    }

    fn require_permission(&self, den_id: &DenId, actor_id: &UserId, permission: Permission) -> Result<()> {
        if self.find_member(den_id, actor_id).is_none() {
            return Err(Error::NotFound(format!("member {actor_id} in den {den_id}")));
        }
        if !self.has_permission(den_id, actor_id, permission) {
            debug!(den_id = %den_id, actor_id = %actor_id, %permission, "Permission denied");
            return Err(Error::PermissionDenied(format!(
                "{actor_id} lacks {permission} in den {den_id}"
            )));
        }
        Ok(())
    }

    /// Make sure the role exists, storing the default roles if needed
    fn require_role(&self, den_id: &DenId, role_id: &RoleId) -> Result<()> {
        let roles = self.roles_for_den(den_id);
        if !roles.iter().any(|r| &r.id == role_id) {
            return Err(Error::NotFound(format!("role {role_id} in den {den_id}")));
        }

        let stored = self.data.borrow().roles.contains_key(den_id);
        if !stored {
            let mut all = self.data.borrow().roles.clone();
            all.insert(den_id.clone(), roles);
            self.set_with(StateValue::Roles(all), Persist::No);
        }
        Ok(())
    }

    /// Copy-on-write edit of one member; false when the member is unknown
    fn modify_member(&self, den_id: &DenId, member_id: &UserId, edit: impl FnOnce(&mut Member)) -> bool {
        let mut members = self.data.borrow().members.clone();
        let Some(member) = members
            .get_mut(den_id)
            .and_then(|list| list.iter_mut().find(|m| &m.id == member_id))
        else {
            return false;
        };
        edit(member);
        self.set_with(StateValue::Members(members), Persist::No);
        true
    }
}
