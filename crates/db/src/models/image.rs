use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{entities::image, models::ids};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: Uuid,
    pub file_name: String,
    pub original_name: String,
    pub sender: String,
    pub received_at: DateTime<Utc>,
    pub event_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateImage {
    pub file_name: String,
    pub original_name: String,
    pub sender: String,
    pub event_id: Uuid,
}

impl Image {
    fn from_model(model: image::Model, event_id: Uuid) -> Self {
        Self {
            id: model.uuid,
            file_name: model.file_name,
            original_name: model.original_name,
            sender: model.sender,
            received_at: model.received_at.into(),
            event_id,
        }
    }

    pub async fn create<C: ConnectionTrait>(db: &C, data: &CreateImage) -> Result<Self, DbErr> {
        let event_row_id = ids::event_id_by_uuid(db, data.event_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Event not found".to_string()))?;

        let active = image::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            file_name: Set(data.file_name.clone()),
            original_name: Set(data.original_name.clone()),
            sender: Set(data.sender.clone()),
            received_at: Set(Utc::now().into()),
            event_id: Set(event_row_id),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model, data.event_id))
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let Some(model) = image::Entity::find()
            .filter(image::Column::Uuid.eq(id))
            .one(db)
            .await?
        else {
            return Ok(None);
        };

        let event_uuid = ids::event_uuid_by_id(db, model.event_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Event not found".to_string()))?;
        Ok(Some(Self::from_model(model, event_uuid)))
    }

    pub async fn list_by_event<C: ConnectionTrait>(
        db: &C,
        event_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let Some(event_row_id) = ids::event_id_by_uuid(db, event_id).await? else {
            return Ok(Vec::new());
        };

        let records = image::Entity::find()
            .filter(image::Column::EventId.eq(event_row_id))
            .order_by_desc(image::Column::ReceivedAt)
            // Same-second arrivals still come back newest first.
            .order_by_desc(image::Column::Id)
            .all(db)
            .await?;
        Ok(records
            .into_iter()
            .map(|model| Self::from_model(model, event_id))
            .collect())
    }

    pub async fn count_by_event<C: ConnectionTrait>(db: &C, event_id: Uuid) -> Result<i64, DbErr> {
        let Some(event_row_id) = ids::event_id_by_uuid(db, event_id).await? else {
            return Ok(0);
        };

        let count = image::Entity::find()
            .filter(image::Column::EventId.eq(event_row_id))
            .count(db)
            .await?;
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = image::Entity::delete_many()
            .filter(image::Column::Uuid.eq(id))
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
    use crate::models::event::{CreateEvent, Event};

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn seed_event(db: &sea_orm::DatabaseConnection, key: &str) -> Event {
        Event::create(
            db,
            &CreateEvent {
                name: "Gallery".to_string(),
                description: None,
                key: key.to_string(),
            },
        )
        .await
        .unwrap()
    }

    fn create_data(event_id: Uuid, file_name: &str, original: &str) -> CreateImage {
        CreateImage {
            file_name: file_name.to_string(),
            original_name: original.to_string(),
            sender: "guest@example.com".to_string(),
            event_id,
        }
    }

    #[tokio::test]
    async fn create_maps_event_uuid_both_ways() {
        let db = setup_db().await;
        let event = seed_event(&db, "imgtest1").await;

        let image = Image::create(
            &db,
            &create_data(event.id, "20250601120000_cafef00d_pic.png", "pic.png"),
        )
        .await
        .unwrap();
        assert_eq!(image.event_id, event.id);
        assert_eq!(image.original_name, "pic.png");

        let found = Image::find_by_id(&db, image.id).await.unwrap().unwrap();
        assert_eq!(found.event_id, event.id);
        assert_eq!(found.file_name, "20250601120000_cafef00d_pic.png");
    }

    #[tokio::test]
    async fn create_rejects_missing_event() {
        let db = setup_db().await;
        let result = Image::create(
            &db,
            &create_data(Uuid::new_v4(), "20250601120000_0badc0de_x.jpg", "x.jpg"),
        )
        .await;
        assert!(matches!(result, Err(DbErr::RecordNotFound(_))));
    }

    #[tokio::test]
    async fn list_by_event_returns_newest_first_and_only_owned() {
        let db = setup_db().await;
        let event = seed_event(&db, "imgtest2").await;
        let other = seed_event(&db, "imgtest3").await;

        Image::create(&db, &create_data(event.id, "a_first.jpg", "first.jpg"))
            .await
            .unwrap();
        Image::create(&db, &create_data(event.id, "b_second.jpg", "second.jpg"))
            .await
            .unwrap();
        Image::create(&db, &create_data(other.id, "c_other.jpg", "other.jpg"))
            .await
            .unwrap();

        let images = Image::list_by_event(&db, event.id).await.unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].original_name, "second.jpg");
        assert_eq!(images[1].original_name, "first.jpg");

        assert_eq!(Image::count_by_event(&db, event.id).await.unwrap(), 2);
        assert_eq!(Image::count_by_event(&db, other.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_by_missing_event_is_empty() {
        let db = setup_db().await;
        let images = Image::list_by_event(&db, Uuid::new_v4()).await.unwrap();
        assert!(images.is_empty());
    }

    #[tokio::test]
    async fn delete_reports_rows_affected() {
        let db = setup_db().await;
        let event = seed_event(&db, "imgtest4").await;
        let image = Image::create(&db, &create_data(event.id, "d_gone.gif", "gone.gif"))
            .await
            .unwrap();

        assert_eq!(Image::delete(&db, image.id).await.unwrap(), 1);
        assert_eq!(Image::delete(&db, image.id).await.unwrap(), 0);
        assert!(Image::find_by_id(&db, image.id).await.unwrap().is_none());
    }
}
