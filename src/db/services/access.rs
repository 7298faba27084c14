use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Select};

use crate::db::enums::Role;

/// The authenticated caller as seen by the data layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: i32,
    pub role: Role,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Appends an ownership filter to `select` unless the caller is an admin.
///
/// Admins see every row; moderators and plain users are restricted to rows
/// whose owner column matches their own id.
pub fn scope_owned<E, C>(select: Select<E>, owner_col: C, caller: &Caller) -> Select<E>
where
    E: EntityTrait,
    C: ColumnTrait,
{
    if caller.is_admin() {
        select
    } else {
        select.filter(owner_col.eq(caller.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::entities::photo;
    use sea_orm::{DbBackend, QueryTrait};

    fn sql_for(caller: &Caller) -> String {
        scope_owned(photo::Entity::find(), photo::Column::UserId, caller)
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn admin_bypasses_ownership_filter() {
        let admin = Caller { id: 1, role: Role::Admin };
        let sql = sql_for(&admin);
        assert!(!sql.contains("user_id"), "unexpected owner filter: {sql}");
    }

    #[test]
    fn non_admin_roles_are_owner_scoped() {
        for role in [Role::Moderator, Role::User] {
            let caller = Caller { id: 42, role };
            let sql = sql_for(&caller);
            assert!(sql.contains(r#""photos"."user_id" = 42"#), "missing owner filter: {sql}");
        }
    }
}
