use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::entities::{event, image};

pub async fn event_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    event::Entity::find()
        .select_only()
        .column(event::Column::Id)
        .filter(event::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn event_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    event::Entity::find()
        .select_only()
        .column(event::Column::Uuid)
        .filter(event::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn image_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    image::Entity::find()
        .select_only()
        .column(image::Column::Id)
        .filter(image::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn image_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    image::Entity::find()
        .select_only()
        .column(image::Column::Uuid)
        .filter(image::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::{
        event::{CreateEvent, Event},
        image::{CreateImage, Image},
    };

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn ids_roundtrip_and_uuid_resolution() {
        let db = setup_db().await;

        let event = Event::create(
            &db,
            &CreateEvent {
                name: "Test event".to_string(),
                description: None,
                key: "idstest1".to_string(),
            },
        )
        .await
        .unwrap();

        let event_row_id = event_id_by_uuid(&db, event.id)
            .await
            .unwrap()
            .expect("event row id");
        assert_eq!(
            event_uuid_by_id(&db, event_row_id).await.unwrap(),
            Some(event.id)
        );

        let image = Image::create(
            &db,
            &CreateImage {
                file_name: "20250601120000_00c0ffee_shot.jpg".to_string(),
                original_name: "shot.jpg".to_string(),
                sender: "guest@example.com".to_string(),
                event_id: event.id,
            },
        )
        .await
        .unwrap();

        let image_row_id = image_id_by_uuid(&db, image.id)
            .await
            .unwrap()
            .expect("image row id");
        assert_eq!(
            image_uuid_by_id(&db, image_row_id).await.unwrap(),
            Some(image.id)
        );

        assert_eq!(event_id_by_uuid(&db, Uuid::new_v4()).await.unwrap(), None);
        assert_eq!(image_uuid_by_id(&db, 999_999).await.unwrap(), None);
    }
}
