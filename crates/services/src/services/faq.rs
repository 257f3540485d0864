use db::{
    DBService,
    change_feed::{ChangeEvent, TableSubscription},
    models::faq::{CreateFaq, Faq, UpdateFaq},
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::live_list::{LiveList, LiveRow};

#[derive(Debug, Error)]
pub enum FaqError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("faq {0} not found")]
    NotFound(Uuid),
}

pub async fn list_faqs(pool: &SqlitePool, property_id: Option<Uuid>) -> Result<Vec<Faq>, FaqError> {
    Ok(Faq::find_all(pool, property_id).await?)
}

pub async fn insert_faq(db: &DBService, data: &CreateFaq) -> Result<Faq, FaqError> {
    let faq = Faq::create(&db.pool, data, Uuid::new_v4()).await?;
    info!(faq_id = %faq.id, property_id = ?faq.property_id, "faq created");
    db.changes.publish(ChangeEvent::insert(faq.clone()));
    Ok(faq)
}

pub async fn update_faq(db: &DBService, id: Uuid, update: UpdateFaq) -> Result<Faq, FaqError> {
    let faq = Faq::update(&db.pool, id, update).await.map_err(|e| match e {
        sqlx::Error::RowNotFound => FaqError::NotFound(id),
        e => FaqError::Database(e),
    })?;
    db.changes.publish(ChangeEvent::update(faq.clone()));
    Ok(faq)
}

pub async fn delete_faq(db: &DBService, id: Uuid) -> Result<Faq, FaqError> {
    let faq = Faq::delete(&db.pool, id).await?.ok_or(FaqError::NotFound(id))?;
    info!(faq_id = %id, "faq deleted");
    db.changes.publish(ChangeEvent::delete(faq.clone()));
    Ok(faq)
}

/// FAQs for one property, or all of them, kept current from the change feed.
pub struct FaqList {
    property_id: Option<Uuid>,
    list: LiveList<Faq>,
    changes: TableSubscription,
}

impl FaqList {
    pub async fn load(db: &DBService, property_id: Option<Uuid>) -> Result<Self, FaqError> {
        let changes = db.changes.subscribe(Faq::TABLE);
        let rows = list_faqs(&db.pool, property_id).await?;
        let list = LiveList::new(rows, move |faq: &Faq| {
            property_id.is_none() || faq.property_id == property_id
        });
        Ok(Self {
            property_id,
            list,
            changes,
        })
    }

    pub fn faqs(&self) -> &[Faq] {
        self.list.rows()
    }

    pub fn property_id(&self) -> Option<Uuid> {
        self.property_id
    }

    pub async fn refresh(&mut self, pool: &SqlitePool) -> Result<(), FaqError> {
        self.list.replace(list_faqs(pool, self.property_id).await?);
        Ok(())
    }

    pub fn apply(&mut self, event: &ChangeEvent) -> bool {
        self.list.apply(event)
    }

    /// Apply every change published since the last call. Returns how many
    /// changed the list.
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
    use db::models::property::{CreateProperty, Property};

    use super::*;

    fn create(question: &str, property_id: Option<Uuid>) -> CreateFaq {
        CreateFaq {
            question: question.to_string(),
            answer: "See the welcome sheet.".to_string(),
            property_id,
        }
    }

    #[tokio::test]
    async fn test_filtered_list_follows_changes() {
        let db = DBService::new_in_memory().await.unwrap();
        let property = Property::create(&db.pool, &CreateProperty::new("Strandgata 15"), Uuid::new_v4())
            .await
            .unwrap();

        let mut all = FaqList::load(&db, None).await.unwrap();
        let mut local = FaqList::load(&db, Some(property.id)).await.unwrap();

        insert_faq(&db, &create("What is the WiFi password?", None)).await.unwrap();
        let grocery = insert_faq(&db, &create("Nearest grocery store?", Some(property.id)))
            .await
            .unwrap();

        assert_eq!(all.sync(), 2);
        assert_eq!(local.sync(), 1);
        assert_eq!(all.faqs()[0].question, "Nearest grocery store?");
        assert_eq!(local.faqs().len(), 1);

        delete_faq(&db, grocery.id).await.unwrap();
        assert_eq!(local.sync(), 1);
        assert!(local.faqs().is_empty());
        assert_eq!(all.sync(), 1);
        assert_eq!(all.faqs().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_missing_rows() {
        let db = DBService::new_in_memory().await.unwrap();
        let faq = insert_faq(&db, &create("Is parking available?", None)).await.unwrap();

        let updated = update_faq(
            &db,
            faq.id,
            UpdateFaq {
                answer: Some("Street parking only.".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.answer, "Street parking only.");
        assert_eq!(updated.question, "Is parking available?");

        let missing = Uuid::new_v4();
        assert!(matches!(
            update_faq(&db, missing, UpdateFaq::default()).await,
            Err(FaqError::NotFound(id)) if id == missing
        ));
        assert!(matches!(
            delete_faq(&db, missing).await,
            Err(FaqError::NotFound(_))
        ));
    }
}
