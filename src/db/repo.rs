//! Subscriber repository: the only component that writes subscribers and
//! subscriptions or reads them back through the advert join.

use super::store::{FromRecord, Store};
use crate::config::Tables;
use crate::error::RepoError;
use crate::ids::{IdGenerator, UuidV4};
use crate::model::{Subscriber, Subscription};
use crate::sql::{Insert, Select};
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    /// Persists a new subscriber under a freshly generated id and returns it.
    async fn insert_subscriber(&self, subscriber: Subscriber) -> Result<Subscriber, RepoError>;

    async fn insert_subscription(&self, subscription: &Subscription) -> Result<(), RepoError>;

    /// Subscribers linked to `advert_id`, in store order. Unknown adverts and
    /// adverts without subscriptions both yield an empty list.
    async fn get_advert_subscribers(&self, advert_id: &str) -> Result<Vec<Subscriber>, RepoError>;
}

/// SQL implementation of [`SubscriberRepository`] over any [`Store`].
#[derive(Debug, Clone)]
pub struct SqlSubscriberRepository<S, G = UuidV4> {
    store: S,
    ids: G,
    tables: Tables,
}

impl<S: Store> SqlSubscriberRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_id_generator(store, UuidV4)
    }
}

impl<S: Store, G: IdGenerator> SqlSubscriberRepository<S, G> {
    pub fn with_id_generator(store: S, ids: G) -> Self {
        Self {
            store,
            ids,
            tables: Tables::default(),
        }
    }

    /// Uses `tables` instead of the default table names. Names are checked
    /// when statements are built; an invalid one surfaces as
    /// [`RepoError::Build`] on every operation.
    pub fn with_tables(mut self, tables: Tables) -> Self {
        self.tables = tables;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs a statement whose rows are not needed.
    async fn execute(&self, insert: Insert) -> Result<(), RepoError> {
        let stmt = insert.to_sql(self.store.placeholder())?;
        let (_rows, release) = self.store.query(&stmt).await?;
        release.release();
        Ok(())
    }
}

#[async_trait]
impl<S, G> SubscriberRepository for SqlSubscriberRepository<S, G>
where
    S: Store,
    G: IdGenerator,
{
    #[instrument(skip_all)]
    async fn insert_subscriber(&self, mut subscriber: Subscriber) -> Result<Subscriber, RepoError> {
        subscriber.id = self.ids.new_id();

        let insert = Insert::into(&self.tables.subscribers)
            .columns(["id", Subscriber::COL_TELEGRAM_ID])
            .values([&subscriber.id, &subscriber.telegram_id]);
        self.execute(insert).await?;

        debug!(id = %subscriber.id, "subscriber inserted");
        Ok(subscriber)
    }

    #[instrument(skip_all, fields(advert_id = %subscription.advert_id))]
    async fn insert_subscription(&self, subscription: &Subscription) -> Result<(), RepoError> {
        let insert = Insert::into(&self.tables.subscriptions)
            .columns([Subscription::COL_ADVERT_ID, Subscription::COL_SUBSCRIBER_ID])
            .values([&subscription.advert_id, &subscription.subscriber_id]);
        self.execute(insert).await?;

        debug!(subscriber_id = %subscription.subscriber_id, "subscription inserted");
        Ok(())
    }

    #[instrument(skip_all, fields(advert_id = %advert_id))]
    async fn get_advert_subscribers(&self, advert_id: &str) -> Result<Vec<Subscriber>, RepoError> {
        let Tables {
            subscribers,
            subscriptions,
            adverts,
        } = &self.tables;
        let stmt = Select::new()
            .column_as(&format!("{subscribers}.id"), Subscriber::COL_ID)
            .column(&format!("{subscribers}.{}", Subscriber::COL_TELEGRAM_ID))
            .from(subscriptions)
            .join(
                subscribers,
                &format!("{subscribers}.id"),
                &format!("{subscriptions}.{}", Subscription::COL_SUBSCRIBER_ID),
            )
            .join(
                adverts,
                &format!("{adverts}.advert_id"),
                &format!("{subscriptions}.{}", Subscription::COL_ADVERT_ID),
            )
            .where_eq(&format!("{adverts}.advert_id"), advert_id)
            .to_sql(self.store.placeholder())?;

        let (rows, _release) = self.store.query(&stmt).await?;
        let records = self.store.scan_all(rows).await.map_err(|err| {
            warn!(?err, "failed to materialize subscribers");
            RepoError::Internal(err)
        })?;

        let subscribers = records
            .iter()
            .map(Subscriber::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = subscribers.len(), "advert subscribers loaded");
        Ok(subscribers)
    }
}
