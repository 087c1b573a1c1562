use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entities::{event, image},
    models::ids,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvent {
    pub name: String,
    pub description: Option<String>,
    pub key: String,
}

impl Event {
    fn from_model(model: event::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            description: model.description,
            key: model.key,
            created_at: model.created_at.into(),
        }
    }

    pub async fn create<C: ConnectionTrait>(db: &C, data: &CreateEvent) -> Result<Self, DbErr> {
        let active = event::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            name: Set(data.name.clone()),
            description: Set(data.description.clone()),
            key: Set(data.key.clone()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn find_by_key<C: ConnectionTrait>(db: &C, key: &str) -> Result<Option<Self>, DbErr> {
        let record = event::Entity::find()
            .filter(event::Column::Key.eq(key))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = event::Entity::find()
            .filter(event::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = event::Entity::find()
            .order_by_desc(event::Column::CreatedAt)
            .order_by_desc(event::Column::Id)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    /// Deletes the event's image rows first, then the event row itself.
    /// Run inside a transaction so a crash cannot leave rows half-deleted;
    /// backing files are the caller's concern.
    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let Some(event_row_id) = ids::event_id_by_uuid(db, id).await? else {
            return Ok(0);
        };

        image::Entity::delete_many()
            .filter(image::Column::EventId.eq(event_row_id))
            .exec(db)
            .await?;

        let result = event::Entity::delete_many()
            .filter(event::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::image::{CreateImage, Image};

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    fn create_data(name: &str, key: &str) -> CreateEvent {
        CreateEvent {
            name: name.to_string(),
            description: Some("a test gallery".to_string()),
            key: key.to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_lookup_by_key_and_id() {
        let db = setup_db().await;

        let created = Event::create(&db, &create_data("Wedding", "abc123"))
            .await
            .unwrap();
        assert_eq!(created.name, "Wedding");
        assert_eq!(created.key, "abc123");

        let by_key = Event::find_by_key(&db, "abc123").await.unwrap().unwrap();
        assert_eq!(by_key.id, created.id);

        let by_id = Event::find_by_id(&db, created.id).await.unwrap().unwrap();
        assert_eq!(by_id.key, "abc123");

        assert!(Event::find_by_key(&db, "missing").await.unwrap().is_none());
        assert!(
            Event::find_by_id(&db, Uuid::new_v4())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn find_all_returns_newest_first() {
        let db = setup_db().await;

        Event::create(&db, &create_data("First", "key00001"))
            .await
            .unwrap();
        Event::create(&db, &create_data("Second", "key00002"))
            .await
            .unwrap();
        Event::create(&db, &create_data("Third", "key00003"))
            .await
            .unwrap();

        let all = Event::find_all(&db).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].name, "Third");
        assert_eq!(all[2].name, "First");
    }

    #[tokio::test]
    async fn duplicate_key_is_rejected() {
        let db = setup_db().await;

        Event::create(&db, &create_data("One", "samekey"))
            .await
            .unwrap();
        let result = Event::create(&db, &create_data("Two", "samekey")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn delete_cascades_to_images() {
        let db = setup_db().await;

        let event = Event::create(&db, &create_data("Party", "party123"))
            .await
            .unwrap();
        let image = Image::create(
            &db,
            &CreateImage {
                file_name: "20250601120000_deadbeef_photo.jpg".to_string(),
                original_name: "photo.jpg".to_string(),
                sender: "guest@example.com".to_string(),
                event_id: event.id,
            },
        )
        .await
        .unwrap();

        let deleted = Event::delete(&db, event.id).await.unwrap();
        assert_eq!(deleted, 1);

        assert!(Event::find_by_id(&db, event.id).await.unwrap().is_none());
        assert!(Image::find_by_id(&db, image.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_missing_event_is_a_noop() {
        let db = setup_db().await;
        let deleted = Event::delete(&db, Uuid::new_v4()).await.unwrap();
        assert_eq!(deleted, 0);
    }
}
