use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, TS)]
pub struct Property {
    pub id: Uuid,
    pub address: String,
    pub wifi_ssid: Option<String>,
    pub wifi_password: Option<String>,
    pub access_instructions: Option<String>, // Free text shown to guests before check-in
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateProperty {
    pub address: String,
    #[serde(default)]
    pub wifi_ssid: Option<String>,
    #[serde(default)]
    pub wifi_password: Option<String>,
    #[serde(default)]
    pub access_instructions: Option<String>,
}

impl CreateProperty {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            wifi_ssid: None,
            wifi_password: None,
            access_instructions: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateProperty {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub wifi_ssid: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub wifi_password: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub access_instructions: Option<Option<String>>,
}

impl Property {
    fn apply(&mut self, update: UpdateProperty) {
        if let Some(address) = update.address {
            self.address = address;
        }
        if let Some(wifi_ssid) = update.wifi_ssid {
            self.wifi_ssid = wifi_ssid;
        }
        if let Some(wifi_password) = update.wifi_password {
            self.wifi_password = wifi_password;
        }
        if let Some(access_instructions) = update.access_instructions {
            self.access_instructions = access_instructions;
        }
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Property>(
            r#"SELECT * FROM properties
               ORDER BY created_at DESC, rowid DESC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateProperty,
        property_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Property>(
            r#"INSERT INTO properties (id, address, wifi_ssid, wifi_password, access_instructions, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(property_id)
        .bind(&data.address)
        .bind(&data.wifi_ssid)
        .bind(&data.wifi_password)
        .bind(&data.access_instructions)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        update: UpdateProperty,
    ) -> Result<Self, sqlx::Error> {
        let mut property = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        property.apply(update);

        sqlx::query_as::<_, Property>(
            r#"UPDATE properties
               SET address = ?, wifi_ssid = ?, wifi_password = ?, access_instructions = ?, updated_at = ?
               WHERE id = ?
               RETURNING *"#,
        )
        .bind(&property.address)
        .bind(&property.wifi_ssid)
        .bind(&property.wifi_password)
        .bind(&property.access_instructions)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Property>("DELETE FROM properties WHERE id = ? RETURNING *")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Empty the table, returning the removed rows.
    pub async fn delete_all<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Property>("DELETE FROM properties RETURNING *")
            .fetch_all(executor)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    #[tokio::test]
    async fn test_find_all_newest_first() {
        let db = DBService::new_in_memory().await.unwrap();
        for address in ["Strandgata 15", "Fisketorget 8", "Nygårdsgaten 45"] {
            Property::create(&db.pool, &CreateProperty::new(address), Uuid::new_v4())
                .await
                .unwrap();
        }

        let addresses: Vec<String> = Property::find_all(&db.pool)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.address)
            .collect();
        assert_eq!(addresses, ["Nygårdsgaten 45", "Fisketorget 8", "Strandgata 15"]);
    }

    #[tokio::test]
    async fn test_delete_returns_removed_row() {
        let db = DBService::new_in_memory().await.unwrap();
        let mut data = CreateProperty::new("Strandgata 15");
        data.wifi_ssid = Some("Bergen_Apartment_Guest".to_string());
        let property = Property::create(&db.pool, &data, Uuid::new_v4()).await.unwrap();

        let removed = Property::delete(&db.pool, property.id).await.unwrap();
        assert_eq!(removed, Some(property.clone()));
        assert_eq!(Property::delete(&db.pool, property.id).await.unwrap(), None);
        assert!(Property::find_by_id(&db.pool, property.id).await.unwrap().is_none());
    }
}
