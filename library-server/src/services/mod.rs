//! Domain operations shared by the HTTP handlers
//!
//! Each function takes the [`Store`](crate::db::Store) plus already
//! validated input, applies permission checks, and performs one or two
//! store calls. Errors come back in the API taxonomy.

pub mod accounts;
pub mod follows;
pub mod images;
pub mod messages;
pub mod orgs;
pub mod owners;
pub mod topics;

#[cfg(test)]
pub(crate) mod testing {
    use library_core::models::{Email, NewOrg, NewUser, Org, Owner, User};

    use crate::db::{MemoryStore, Store};

    pub async fn user(store: &MemoryStore, name: &str) -> (User, Owner) {
        store
            .create_user(NewUser {
                email: Email::new(&format!("{name}@example.com")).unwrap(),
                name: name.to_string(),
                password_hash: "unused".into(),
            })
            .await
            .unwrap()
    }

    pub async fn org(store: &MemoryStore, creator: &User, slug: &str) -> (Org, Owner) {
        store
            .create_org(NewOrg::new(slug, slug, None).unwrap(), creator.id)
            .await
            .unwrap()
    }
}
