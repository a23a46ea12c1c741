//! Identity and permission provider.

use std::fmt;
use std::str::FromStr;

use la_core::{Result, UserId, UserRef};
use la_db::pool::{get_conn, DbPool};
use la_db::queries::users;
use serde::{Deserialize, Serialize};

/// Account role, ordered by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Subscriber,
    Author,
    Editor,
    Administrator,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Subscriber => "subscriber",
            Role::Author => "author",
            Role::Editor => "editor",
            Role::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = la_core::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subscriber" => Ok(Role::Subscriber),
            "author" => Ok(Role::Author),
            "editor" => Ok(Role::Editor),
            "administrator" | "admin" => Ok(Role::Administrator),
            other => Err(la_core::Error::validation(format!("unknown role: {other}"))),
        }
    }
}

/// A resolved account.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

/// Answers "who is this" and "may they do that".
pub trait Directory: Send + Sync {
    fn find(&self, user: &UserRef) -> Result<Option<Person>>;

    /// Users may edit themselves. Only administrators may edit other users.
    fn can_edit(&self, actor: &Person, target: UserId) -> bool {
        actor.id == target || actor.role == Role::Administrator
    }

    /// File uploads need at least the author role.
    fn can_upload(&self, actor: &Person) -> bool {
        actor.role >= Role::Author
    }

    fn is_admin(&self, actor: &Person) -> bool {
        actor.role == Role::Administrator
    }
}

/// [`Directory`] over the `users` table.
#[derive(Clone)]
pub struct DbDirectory {
    pool: DbPool,
}

impl DbDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl Directory for DbDirectory {
    fn find(&self, user: &UserRef) -> Result<Option<Person>> {
        let conn = get_conn(&self.pool)?;
        let row = match user {
            UserRef::Id(id) => users::get_user_by_id(&conn, *id)?,
            UserRef::Email(email) => users::get_user_by_email(&conn, email)?,
        };
        Ok(row.map(person_from_user))
    }
}

/// Unknown role strings degrade to the least privileged role.
pub fn person_from_user(u: la_db::models::User) -> Person {
    let role = u.role.parse().unwrap_or_else(|_| {
        tracing::warn!(user_id = %u.id, role = %u.role, "Unknown role; treating as subscriber");
        Role::Subscriber
    });
    Person {
        id: u.id,
        email: u.email,
        display_name: u.display_name,
        role,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use la_db::pool::init_memory_pool;

    fn person(id: i64, role: Role) -> Person {
        Person {
            id: UserId::from(id),
            email: format!("u{id}@test"),
            display_name: format!("U{id}"),
            role,
        }
    }

    #[test]
    fn role_ordering() {
        assert!(Role::Subscriber < Role::Author);
        assert!(Role::Editor < Role::Administrator);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Administrator);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn edit_rules() {
        let dir = DbDirectory::new(init_memory_pool().unwrap());
        let sub = person(1, Role::Subscriber);
        let editor = person(2, Role::Editor);
        let admin = person(3, Role::Administrator);

        assert!(dir.can_edit(&sub, UserId::from(1)));
        assert!(!dir.can_edit(&sub, UserId::from(2)));
        assert!(dir.can_edit(&editor, editor.id));
        assert!(!dir.can_edit(&editor, sub.id));
        assert!(!dir.can_edit(&editor, admin.id));
        assert!(dir.can_edit(&admin, sub.id));
        assert!(dir.can_edit(&admin, editor.id));
    }

    #[test]
    fn upload_rules() {
        let dir = DbDirectory::new(init_memory_pool().unwrap());
        assert!(!dir.can_upload(&person(1, Role::Subscriber)));
        assert!(dir.can_upload(&person(1, Role::Author)));
        assert!(dir.is_admin(&person(1, Role::Administrator)));
        assert!(!dir.is_admin(&person(1, Role::Editor)));
    }

    #[test]
    fn find_by_id_and_email() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let u = users::create_user(&conn, "ann", "Ann@Test.com", "Ann", "author").unwrap();
        let dir = DbDirectory::new(pool.clone());

        let by_id = dir.find(&UserRef::Id(u.id)).unwrap().unwrap();
        assert_eq!(by_id.display_name, "Ann");
        assert_eq!(by_id.role, Role::Author);

        let by_email = dir.find(&UserRef::parse("ann@test.com").unwrap()).unwrap().unwrap();
        assert_eq!(by_email.id, u.id);

        assert!(dir.find(&UserRef::Id(UserId::from(99))).unwrap().is_none());
    }
}
