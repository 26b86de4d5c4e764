use std::marker::PhantomData;

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DbErr, DeleteResult, EntityTrait, IntoActiveModel,
    PaginatorTrait, PrimaryKeyTrait,
};
use tracing::trace;

/// Generic pass-through over SeaORM query builders.
///
/// Parameterized by entity so every table gets the same create, read,
/// update, delete and count surface without repeating query plumbing in
/// handlers. Holds no state; the connection is passed per call.
pub struct Repository<E: EntityTrait> {
    _entity: PhantomData<E>,
}

impl<E: EntityTrait> Repository<E> {
    /// Insert a new record and return the stored model.
    pub async fn insert<A, C>(db: &C, model: A) -> Result<E::Model, DbErr>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<A>,
        C: sea_orm::ConnectionTrait,
    {
        trace!("Inserting {} record", E::default().table_name());
        model.insert(db).await
    }

    /// Update an existing record and return the stored model.
    pub async fn update<A, C>(db: &C, model: A) -> Result<E::Model, DbErr>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<A>,
        C: sea_orm::ConnectionTrait,
    {
        trace!("Updating {} record", E::default().table_name());
        model.update(db).await
    }

    /// Find a record by primary key.
    pub async fn find_by_id<C>(
        db: &C,
        id: <E::PrimaryKey as PrimaryKeyTrait>::ValueType,
    ) -> Result<Option<E::Model>, DbErr>
    where
        C: sea_orm::ConnectionTrait,
    {
        E::find_by_id(id).one(db).await
    }

    /// Fetch every record of the entity.
    pub async fn find_all<C>(db: &C) -> Result<Vec<E::Model>, DbErr>
    where
        C: sea_orm::ConnectionTrait,
    {
        E::find().all(db).await
    }

    /// Count the records of the entity.
    pub async fn count<C>(db: &C) -> Result<u64, DbErr>
    where
        C: sea_orm::ConnectionTrait,
        E::Model: Send + Sync,
    {
        E::find().count(db).await
    }

    /// Delete a record by primary key; the result carries the affected
    /// row count so callers can distinguish a miss.
    pub async fn delete_by_id<C>(
        db: &C,
        id: <E::PrimaryKey as PrimaryKeyTrait>::ValueType,
    ) -> Result<DeleteResult, DbErr>
    where
        C: sea_orm::ConnectionTrait,
    {
        trace!("Deleting {} record", E::default().table_name());
        E::delete_by_id(id).exec(db).await
    }
}
