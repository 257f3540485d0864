use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A guest stay at one property.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, TS)]
pub struct Booking {
    pub id: Uuid,
    pub guest_name: String,
    pub guest_email: String,
    pub property_id: Uuid,
    pub check_in_date_time: DateTime<Utc>,
    pub check_out_date_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateBooking {
    pub guest_name: String,
    pub guest_email: String,
    pub property_id: Uuid,
    pub check_in_date_time: DateTime<Utc>,
    pub check_out_date_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateBooking {
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub property_id: Option<Uuid>,
    pub check_in_date_time: Option<DateTime<Utc>>,
    pub check_out_date_time: Option<DateTime<Utc>>,
}

impl Booking {
    fn apply(&mut self, update: UpdateBooking) {
        if let Some(guest_name) = update.guest_name {
            self.guest_name = guest_name;
        }
        if let Some(guest_email) = update.guest_email {
            self.guest_email = guest_email;
        }
        if let Some(property_id) = update.property_id {
            self.property_id = property_id;
        }
        if let Some(check_in) = update.check_in_date_time {
            self.check_in_date_time = check_in;
        }
        if let Some(check_out) = update.check_out_date_time {
            self.check_out_date_time = check_out;
        }
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            r#"SELECT * FROM bookings
               ORDER BY created_at DESC, rowid DESC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateBooking,
        booking_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Booking>(
            r#"INSERT INTO bookings (id, guest_name, guest_email, property_id, check_in_date_time, check_out_date_time, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(booking_id)
        .bind(&data.guest_name)
        .bind(&data.guest_email)
        .bind(data.property_id)
        .bind(data.check_in_date_time)
        .bind(data.check_out_date_time)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        update: UpdateBooking,
    ) -> Result<Self, sqlx::Error> {
        let mut booking = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        booking.apply(update);

        sqlx::query_as::<_, Booking>(
            r#"UPDATE bookings
               SET guest_name = ?, guest_email = ?, property_id = ?, check_in_date_time = ?, check_out_date_time = ?, updated_at = ?
               WHERE id = ?
               RETURNING *"#,
        )
        .bind(&booking.guest_name)
        .bind(&booking.guest_email)
        .bind(booking.property_id)
        .bind(booking.check_in_date_time)
        .bind(booking.check_out_date_time)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Booking>("DELETE FROM bookings WHERE id = ? RETURNING *")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Empty the table, returning the removed rows.
    pub async fn delete_all<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Booking>("DELETE FROM bookings RETURNING *")
            .fetch_all(executor)
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{
        DBService,
        models::property::{CreateProperty, Property},
    };

    async fn booking(db: &DBService) -> Booking {
        let property = Property::create(&db.pool, &CreateProperty::new("Bryggen 12"), Uuid::new_v4())
            .await
            .unwrap();
        Booking::create(
            &db.pool,
            &CreateBooking {
                guest_name: "Lars Andersen".to_string(),
                guest_email: "lars.andersen@outlook.com".to_string(),
                property_id: property.id,
                check_in_date_time: Utc.with_ymd_and_hms(2024, 10, 18, 15, 0, 0).unwrap(),
                check_out_date_time: Utc.with_ymd_and_hms(2024, 10, 25, 10, 0, 0).unwrap(),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_update_touches_only_given_fields() {
        let db = DBService::new_in_memory().await.unwrap();
        let original = booking(&db).await;
        let check_out = Utc.with_ymd_and_hms(2024, 10, 26, 10, 0, 0).unwrap();

        let updated = Booking::update(
            &db.pool,
            original.id,
            UpdateBooking {
                check_out_date_time: Some(check_out),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.check_out_date_time, check_out);
        assert_eq!(updated.guest_name, original.guest_name);
        assert_eq!(updated.property_id, original.property_id);
        assert_eq!(updated.check_in_date_time, original.check_in_date_time);
        assert_eq!(updated.created_at, original.created_at);
    }

    #[tokio::test]
    async fn test_update_to_unknown_property_fails() {
        let db = DBService::new_in_memory().await.unwrap();
        let original = booking(&db).await;

        let err = Booking::update(
            &db.pool,
            original.id,
            UpdateBooking {
                property_id: Some(Uuid::new_v4()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(
            err.as_database_error()
                .is_some_and(|e| e.is_foreign_key_violation())
        );

        let missing = Booking::update(&db.pool, Uuid::new_v4(), UpdateBooking::default()).await;
        assert!(matches!(missing, Err(sqlx::Error::RowNotFound)));
    }

    #[tokio::test]
    async fn test_delete_returns_removed_row() {
        let db = DBService::new_in_memory().await.unwrap();
        let original = booking(&db).await;

        let removed = Booking::delete(&db.pool, original.id).await.unwrap();
        assert_eq!(removed, Some(original.clone()));
        assert_eq!(Booking::delete(&db.pool, original.id).await.unwrap(), None);
        assert!(Booking::find_all(&db.pool).await.unwrap().is_empty());
    }
}
