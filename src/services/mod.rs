// Partner and location management
pub mod partners;
pub mod service_points;

// Service catalog
pub mod catalog;

// Slots and reservations
pub mod bookings;
pub mod schedules;

use sea_orm::{DbErr, SqlErr};
use tracing::{error, warn};

use crate::errors::ServiceError;

/// Maps a database error to a `ServiceError`, logging it with `context`.
///
/// Unique and foreign-key violations become `Conflict`: a concurrent writer
/// claimed the key or still references the row.
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(DbErr) -> ServiceError {
    move |e| {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                warn!(%context, %detail, "Unique constraint violated");
                return ServiceError::Conflict(format!("{}: record already exists", context));
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                warn!(%context, %detail, "Foreign key constraint violated");
                return ServiceError::Conflict(format!(
                    "{}: record is referenced by or refers to missing data",
                    context
                ));
            }
            _ => {}
        }
        error!(%context, error = %e, "Database operation failed");
        ServiceError::DatabaseError(e)
    }
}

/// Resolves page/limit query values into a 1-based page and a bounded limit.
pub(crate) fn page_bounds(page: Option<u64>, limit: u64) -> (u64, u64) {
    (page.unwrap_or(1).max(1), limit.max(1))
}

/// Number of pages needed for `total` items.
pub fn total_pages(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn page_bounds_never_return_zero() {
        assert_eq!(page_bounds(None, 20), (1, 20));
        assert_eq!(page_bounds(Some(0), 0), (1, 1));
        assert_eq!(page_bounds(Some(3), 50), (3, 50));
    }

    #[tokio::test]
    async fn foreign_key_violations_become_conflicts() {
        use crate::entities::service_post;
        use chrono::Utc;
        use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
        use uuid::Uuid;

        // every pooled connection would open its own empty in-memory database
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).min_connections(1);
        let db = Database::connect(options).await.unwrap();
        crate::db::run_migrations(&db).await.unwrap();

        let now = Utc::now();
        let err = service_post::ActiveModel {
            id: Set(Uuid::new_v4()),
            service_point_id: Set(Uuid::new_v4()),
            name: Set("Orphan bay".into()),
            post_number: Set(1),
            slot_duration_minutes: Set(30),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&db)
        .await
        .unwrap_err();

        assert_matches::assert_matches!(
            db_error("create service post")(err),
            ServiceError::Conflict(_)
        );
    }

    #[test]
    fn unrelated_db_errors_stay_internal() {
        let err = db_error("load partner")(DbErr::Custom("boom".into()));
        assert!(matches!(err, ServiceError::DatabaseError(_)));
    }
}
