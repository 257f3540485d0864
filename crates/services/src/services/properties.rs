use db::{
    DBService,
    change_feed::{ChangeEvent, TableSubscription},
    models::property::{CreateProperty, Property, UpdateProperty},
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::live_list::{LiveList, LiveRow};

#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("property {0} not found")]
    NotFound(Uuid),
}

pub async fn list_properties(pool: &SqlitePool) -> Result<Vec<Property>, PropertyError> {
    Ok(Property::find_all(pool).await?)
}

pub async fn insert_property(
    db: &DBService,
    data: &CreateProperty,
) -> Result<Property, PropertyError> {
    let property = Property::create(&db.pool, data, Uuid::new_v4()).await?;
    info!(property_id = %property.id, address = %property.address, "property created");
    db.changes.publish(ChangeEvent::insert(property.clone()));
    Ok(property)
}

pub async fn update_property(
    db: &DBService,
    id: Uuid,
    update: UpdateProperty,
) -> Result<Property, PropertyError> {
    let property = Property::update(&db.pool, id, update)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PropertyError::NotFound(id),
            e => PropertyError::Database(e),
        })?;
    db.changes.publish(ChangeEvent::update(property.clone()));
    Ok(property)
}

/// Fails with a database error while bookings, tasks or FAQs still point at
/// the property.
pub async fn delete_property(db: &DBService, id: Uuid) -> Result<Property, PropertyError> {
    let property = Property::delete(&db.pool, id)
        .await?
        .ok_or(PropertyError::NotFound(id))?;
    info!(property_id = %id, "property deleted");
    db.changes.publish(ChangeEvent::delete(property.clone()));
    Ok(property)
}

pub struct PropertyList {
    list: LiveList<Property>,
    changes: TableSubscription,
}

impl PropertyList {
    pub async fn load(db: &DBService) -> Result<Self, PropertyError> {
        let changes = db.changes.subscribe(Property::TABLE);
        let rows = list_properties(&db.pool).await?;
        Ok(Self {
            list: LiveList::unfiltered(rows),
            changes,
        })
    }

    pub fn properties(&self) -> &[Property] {
        self.list.rows()
    }

    pub async fn refresh(&mut self, pool: &SqlitePool) -> Result<(), PropertyError> {
        self.list.replace(list_properties(pool).await?);
        Ok(())
    }

    pub fn apply(&mut self, event: &ChangeEvent) -> bool {
        self.list.apply(event)
    }

    pub fn sync(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.changes.try_recv() {
            if self.list.apply(&event) {
                applied += 1;
            }
        }
        applied
    }
}
