//! Postgres repositories
//!
//! Each repository follows these patterns:
//! - Borrows the pool; constructed per call site
//! - Uses JOINs for list operations (no N+1)
//! - Turns constraint violations into [`DbError`] variants

pub mod follows;
pub mod images;
pub mod messages;
pub mod orgs;
pub mod owners;
pub mod topics;
pub mod users;

use sqlx::postgres::PgRow;
use sqlx::Row;

use library_core::models::PageRequest;

pub use follows::FollowRepo;
pub use images::ImageRepo;
pub use messages::MessageRepo;
pub use orgs::OrgRepo;
pub use owners::OwnerRepo;
pub use topics::TopicRepo;
pub use users::UserRepo;

use super::DbError;

/// Map unique violations to `Conflict` and foreign-key violations to
/// `NotFound`; everything else stays a raw database error.
pub(crate) fn map_constraint(err: sqlx::Error, resource: &'static str, detail: &str) -> DbError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return DbError::Conflict {
                resource,
                detail: detail.to_owned(),
            };
        }
        if db.is_foreign_key_violation() {
            return DbError::NotFound {
                resource: "referenced row",
                id: db.constraint().unwrap_or("unknown").to_owned(),
            };
        }
    }
    DbError::Sqlx(err)
}

/// Total carried by `COUNT(*) OVER()` on the first row of a page.
///
/// A page past the end has no rows to carry it; `None` tells the caller to
/// count separately so the total matches what an in-range page reports.
pub(crate) fn window_total(rows: &[PgRow], page: PageRequest) -> Option<i64> {
    known_total(rows.first().map(|r| r.get::<i64, _>("total")), page)
}

fn known_total(first_row_total: Option<i64>, page: PageRequest) -> Option<i64> {
    match first_row_total {
        Some(total) => Some(total),
        None if page.offset() == 0 => Some(0),
        None => None,
    }
}
