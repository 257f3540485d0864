use db::{
    DBService,
    change_feed::{ChangeEvent, TableSubscription},
    models::{
        partner::{CreatePartner, Partner, UpdatePartner},
        task::TaskType,
    },
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::live_list::{LiveList, LiveRow};

#[derive(Debug, Error)]
pub enum PartnerError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("partner {0} not found")]
    NotFound(Uuid),
}

pub async fn list_partners(
    pool: &SqlitePool,
    partner_type: Option<TaskType>,
) -> Result<Vec<Partner>, PartnerError> {
    Ok(Partner::find_all(pool, partner_type).await?)
}

pub async fn insert_partner(db: &DBService, data: &CreatePartner) -> Result<Partner, PartnerError> {
    let partner = Partner::create(&db.pool, data, Uuid::new_v4()).await?;
    info!(partner_id = %partner.id, partner_type = %partner.partner_type, "partner created");
    db.changes.publish(ChangeEvent::insert(partner.clone()));
    Ok(partner)
}

pub async fn update_partner(
    db: &DBService,
    id: Uuid,
    update: UpdatePartner,
) -> Result<Partner, PartnerError> {
    let partner = Partner::update(&db.pool, id, update)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PartnerError::NotFound(id),
            e => PartnerError::Database(e),
        })?;
    db.changes.publish(ChangeEvent::update(partner.clone()));
    Ok(partner)
}

pub async fn delete_partner(db: &DBService, id: Uuid) -> Result<Partner, PartnerError> {
    let partner = Partner::delete(&db.pool, id)
        .await?
        .ok_or(PartnerError::NotFound(id))?;
    info!(partner_id = %id, "partner deleted");
    db.changes.publish(ChangeEvent::delete(partner.clone()));
    Ok(partner)
}

/// Partners, optionally only those doing one kind of work.
pub struct PartnerList {
    partner_type: Option<TaskType>,
    list: LiveList<Partner>,
    changes: TableSubscription,
}

impl PartnerList {
    pub async fn load(db: &DBService, partner_type: Option<TaskType>) -> Result<Self, PartnerError> {
        let changes = db.changes.subscribe(Partner::TABLE);
        let rows = list_partners(&db.pool, partner_type).await?;
        let list = LiveList::new(rows, move |partner: &Partner| {
            partner_type.is_none_or(|t| partner.partner_type == t)
        });
        Ok(Self {
            partner_type,
            list,
            changes,
        })
    }

    pub fn partners(&self) -> &[Partner] {
        self.list.rows()
    }

    pub fn partner_type(&self) -> Option<TaskType> {
        self.partner_type
    }

    pub async fn refresh(&mut self, pool: &SqlitePool) -> Result<(), PartnerError> {
        self.list.replace(list_partners(pool, self.partner_type).await?);
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

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: &str, partner_type: TaskType) -> CreatePartner {
        CreatePartner {
            name: name.to_string(),
            email: "contact@example.no".to_string(),
            phone: Some("+47 55 12 34 56".to_string()),
            partner_type,
        }
    }

    #[tokio::test]
    async fn test_type_filter_applies_to_changes() {
        let db = DBService::new_in_memory().await.unwrap();
        let mut cleaners = PartnerList::load(&db, Some(TaskType::Cleaning)).await.unwrap();

        insert_partner(&db, &create("Fjord Maintenance", TaskType::Maintenance))
            .await
            .unwrap();
        let clean = insert_partner(&db, &create("Bergen Clean Pro", TaskType::Cleaning))
            .await
            .unwrap();

        assert_eq!(cleaners.sync(), 1);
        assert_eq!(cleaners.partners()[0].id, clean.id);

        update_partner(
            &db,
            clean.id,
            UpdatePartner {
                phone: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        cleaners.sync();
        assert_eq!(cleaners.partners()[0].phone, None);

        delete_partner(&db, clean.id).await.unwrap();
        cleaners.sync();
        assert!(cleaners.partners().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_reloads_from_store() {
        let db = DBService::new_in_memory().await.unwrap();
        let mut all = PartnerList::load(&db, None).await.unwrap();
        Partner::create(&db.pool, &create("Quality Inspections AS", TaskType::Inspection), Uuid::new_v4())
            .await
            .unwrap();

        // Written straight to the store, so no event was published.
        assert_eq!(all.sync(), 0);
        all.refresh(&db.pool).await.unwrap();
        assert_eq!(all.partners().len(), 1);
    }
}
