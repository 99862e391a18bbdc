mod common;

use advert_subscribers::config::Tables;
use advert_subscribers::db::{Record, Release, Store};
use advert_subscribers::sql::{Placeholder, Statement, Value};
use advert_subscribers::{
    RepoError, SqlSubscriberRepository, StoreError, Subscriber, SubscriberRepository,
    Subscription,
};
use async_trait::async_trait;
use common::SequentialIds;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory store that records statements, counts acquired and released
/// cursors, and fails on demand.
#[derive(Default)]
struct FakeStore {
    placeholder: Placeholder,
    rows: Vec<Record>,
    fail_query: bool,
    fail_scan: bool,
    statements: Mutex<Vec<Statement>>,
    acquired: AtomicUsize,
    released: Arc<AtomicUsize>,
}

impl FakeStore {
    fn statements(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }

    fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for FakeStore {
    type Cursor = Vec<Record>;

    fn placeholder(&self) -> Placeholder {
        self.placeholder
    }

    async fn query(&self, stmt: &Statement) -> Result<(Self::Cursor, Release), StoreError> {
        self.statements.lock().unwrap().push(stmt.clone());
        if self.fail_query {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        let released = self.released.clone();
        let release = Release::new(move || {
            released.fetch_add(1, Ordering::SeqCst);
        });
        Ok((self.rows.clone(), release))
    }

    async fn scan_all(&self, cursor: Self::Cursor) -> Result<Vec<Record>, StoreError> {
        if self.fail_scan {
            return Err(StoreError::Decode {
                column: "telegram_id".into(),
                reason: "injected".into(),
            });
        }
        Ok(cursor)
    }
}

fn repo(store: FakeStore) -> SqlSubscriberRepository<FakeStore, SequentialIds> {
    SqlSubscriberRepository::with_id_generator(store, SequentialIds::default())
}

#[tokio::test]
async fn insert_subscriber_binds_generated_id_and_telegram_id() {
    let repo = repo(FakeStore::default());
    let saved = repo.insert_subscriber(Subscriber::new("tg-1")).await.unwrap();
    assert_eq!(saved.id, "id-1");

    let stmts = repo.store().statements();
    assert_eq!(
        stmts,
        vec![Statement {
            sql: "INSERT INTO subscribers (id, telegram_id) VALUES (?, ?)".into(),
            args: vec![Value::from("id-1"), Value::from("tg-1")],
        }]
    );
    assert_eq!(repo.store().acquired(), 1);
    assert_eq!(repo.store().released(), 1);
}

#[tokio::test]
async fn insert_subscription_binds_advert_then_subscriber() {
    let repo = repo(FakeStore {
        placeholder: Placeholder::Dollar,
        ..Default::default()
    });
    repo.insert_subscription(&Subscription::new("sub-1", "advert-1"))
        .await
        .unwrap();

    let stmts = repo.store().statements();
    assert_eq!(
        stmts[0].sql,
        "INSERT INTO subscriptions (advert_id, subscriber_id) VALUES ($1, $2)"
    );
    assert_eq!(
        stmts[0].args,
        vec![Value::from("advert-1"), Value::from("sub-1")]
    );
    assert_eq!(repo.store().released(), 1);
}

#[tokio::test]
async fn advert_query_projects_explicit_columns() {
    let repo = repo(FakeStore {
        rows: vec![
            Record::new()
                .with("subscriber_id", "id-9")
                .with("telegram_id", "tg-9"),
        ],
        ..Default::default()
    });
    let subs = repo.get_advert_subscribers("advert-1").await.unwrap();
    assert_eq!(
        subs,
        vec![Subscriber {
            id: "id-9".into(),
            telegram_id: "tg-9".into()
        }]
    );

    let stmt = &repo.store().statements()[0];
    assert_eq!(
        stmt.sql,
        "SELECT subscribers.id AS subscriber_id, subscribers.telegram_id \
         FROM subscriptions \
         JOIN subscribers ON subscribers.id = subscriptions.subscriber_id \
         JOIN adverts ON adverts.advert_id = subscriptions.advert_id \
         WHERE adverts.advert_id = ?"
    );
    assert!(!stmt.sql.contains('*'));
    assert_eq!(stmt.args, vec![Value::from("advert-1")]);
    assert_eq!(repo.store().released(), 1);
}

#[tokio::test]
async fn no_rows_is_empty_vec() {
    let repo = repo(FakeStore::default());
    let subs = repo.get_advert_subscribers("advert-1").await.unwrap();
    assert!(subs.is_empty());
    assert_eq!(repo.store().released(), 1);
}

#[tokio::test]
async fn scan_failure_is_internal_and_still_releases() {
    let repo = repo(FakeStore {
        fail_scan: true,
        ..Default::default()
    });
    let err = repo.get_advert_subscribers("advert-1").await.unwrap_err();
    assert!(matches!(
        err,
        RepoError::Internal(StoreError::Decode { .. })
    ));
    assert_eq!(repo.store().acquired(), 1);
    assert_eq!(repo.store().released(), 1);
}

#[tokio::test]
async fn malformed_row_is_internal_and_still_releases() {
    let repo = repo(FakeStore {
        rows: vec![Record::new().with("telegram_id", "tg-1")],
        ..Default::default()
    });
    let err = repo.get_advert_subscribers("advert-1").await.unwrap_err();
    assert!(matches!(
        err,
        RepoError::Internal(StoreError::MissingColumn(ref c)) if c == "subscriber_id"
    ));
    assert_eq!(repo.store().released(), 1);
}

#[tokio::test]
async fn query_failure_is_internal_for_every_operation() {
    let repo = repo(FakeStore {
        fail_query: true,
        ..Default::default()
    });

    let err = repo.get_advert_subscribers("advert-1").await.unwrap_err();
    assert!(err.is_internal());
    assert_eq!(
        err.to_string(),
        "internal error: store unavailable: connection refused"
    );

    let err = repo
        .insert_subscriber(Subscriber::new("tg-1"))
        .await
        .unwrap_err();
    assert!(err.is_internal());

    let err = repo
        .insert_subscription(&Subscription::new("s", "a"))
        .await
        .unwrap_err();
    assert!(err.is_internal());

    // Nothing was acquired, so nothing is released.
    assert_eq!(repo.store().acquired(), 0);
    assert_eq!(repo.store().released(), 0);
}

#[tokio::test]
async fn releases_match_acquisitions_across_calls() {
    let repo = repo(FakeStore::default());
    repo.insert_subscriber(Subscriber::new("a")).await.unwrap();
    repo.insert_subscription(&Subscription::new("id-1", "ad"))
        .await
        .unwrap();
    repo.get_advert_subscribers("ad").await.unwrap();
    assert_eq!(repo.store().acquired(), 3);
    assert_eq!(repo.store().released(), 3);
}

#[tokio::test]
async fn usable_through_trait_object() {
    let repo: Arc<dyn SubscriberRepository> = Arc::new(repo(FakeStore::default()));
    let saved = repo.insert_subscriber(Subscriber::new("tg-1")).await.unwrap();
    assert_eq!(saved.id, "id-1");
}

#[tokio::test]
async fn invalid_table_name_is_build_error_and_never_reaches_store() {
    let repo = repo(FakeStore::default()).with_tables(Tables {
        subscribers: "subscribers; DROP TABLE adverts".into(),
        ..Tables::default()
    });

    let err = repo
        .insert_subscriber(Subscriber::new("tg-1"))
        .await
        .unwrap_err();
    assert!(err.is_build());
    assert!(!err.is_internal());
    assert!(!err.to_string().starts_with("internal error"));

    let err = repo.get_advert_subscribers("advert-1").await.unwrap_err();
    assert!(matches!(err, RepoError::Build(_)));

    // Subscriptions live in a valid table, so that insert still goes through.
    repo.insert_subscription(&Subscription::new("s", "a"))
        .await
        .unwrap();

    assert_eq!(repo.store().statements().len(), 1);
    assert_eq!(repo.store().acquired(), 1);
    assert_eq!(repo.store().released(), 1);
}
