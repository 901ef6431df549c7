#![cfg(feature = "anyhow")]

mod common;

use common::{Call, FakeStore};
use sqlx_unit_of_work::{
    with_nested_transaction_anyhow, with_transaction_anyhow, Accessor, TransactionManager,
};

fn check_pending_states(pending: u64) -> anyhow::Result<()> {
    if pending > 0 {
        anyhow::bail!("oauth state already pending");
    }
    Ok(())
}

#[tokio::test]
async fn commits_on_success() {
    let store = FakeStore::new();
    let manager = TransactionManager::new(store.clone());

    let token = with_transaction_anyhow(&manager, |tx| {
        Box::pin(async move {
            tx.external_tokens()?
                .execute("insert into external_tokens values t1")
                .await?;
            Ok("t1")
        })
    })
    .await
    .unwrap();

    assert_eq!(token, "t1");
    assert_eq!(store.rows("external_tokens"), vec!["t1".to_owned()]);
    assert_eq!(store.calls().last(), Some(&Call::Commit(1)));
}

#[tokio::test]
async fn bail_rolls_back() {
    let store = FakeStore::new();
    let manager = TransactionManager::new(store.clone());

    let err = with_transaction_anyhow(&manager, |tx| {
        Box::pin(async move {
            let pending = tx
                .oauth_states()?
                .execute("insert into oauth_state values s1")
                .await?;
            check_pending_states(pending)
        })
    })
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "oauth state already pending");
    assert!(store.rows("oauth_state").is_empty());
    assert_eq!(store.calls().last(), Some(&Call::Rollback(1)));
}

#[tokio::test]
async fn failed_rollback_is_attached_as_context() {
    let store = FakeStore::new();
    store.fail_rollback("boom");
    let manager = TransactionManager::new(store.clone());

    let err = with_transaction_anyhow(&manager, |_tx| {
        Box::pin(async move { Err::<(), _>(anyhow::anyhow!("nothing to publish")) })
    })
    .await
    .unwrap_err();

    let chain = format!("{err:#}");
    assert!(chain.starts_with("Failed to roll back transaction: boom"), "{chain}");
    assert!(chain.ends_with("nothing to publish"), "{chain}");
    assert_eq!(err.root_cause().to_string(), "nothing to publish");
    assert_eq!(store.calls().last(), Some(&Call::Rollback(1)));
}

#[tokio::test]
async fn store_errors_surface_through_anyhow() {
    let store = FakeStore::new();
    store.fail_exec_starting_with("insert into invitation", "duplicate key value");
    let manager = TransactionManager::new(store.clone());

    let err = with_transaction_anyhow(&manager, |tx| {
        Box::pin(async move {
            tx.invitations()?
                .execute("insert into invitation values heidi")
                .await?;
            Ok(())
        })
    })
    .await
    .unwrap_err();

    let unit_of_work = err.downcast_ref::<sqlx_unit_of_work::Error>();
    assert!(matches!(unit_of_work, Some(sqlx_unit_of_work::Error::Database(_))));
    assert_eq!(store.calls().last(), Some(&Call::Rollback(1)));
}

#[tokio::test]
async fn nested_failure_rolls_back_to_savepoint() {
    let store = FakeStore::new();
    let manager = TransactionManager::new(store.clone());

    with_transaction_anyhow(&manager, |tx| {
        Box::pin(async move {
            tx.resources()?.execute("insert into resource values space").await?;

            let nested = with_nested_transaction_anyhow(tx, |nested| {
                Box::pin(async move {
                    nested
                        .space_resources()?
                        .execute("insert into space_resources values space:1")
                        .await?;
                    Err::<(), _>(anyhow::anyhow!("resource already linked"))
                })
            })
            .await;
            assert_eq!(nested.unwrap_err().to_string(), "resource already linked");

            Ok(())
        })
    })
    .await
    .unwrap();

    assert_eq!(
        store.tx_statements(),
        vec![
            "insert into resource values space".to_owned(),
            "SAVEPOINT sp_1".to_owned(),
            "insert into space_resources values space:1".to_owned(),
            "ROLLBACK TO SAVEPOINT sp_1".to_owned(),
        ]
    );
    assert_eq!(store.calls().last(), Some(&Call::Commit(1)));
}

#[tokio::test]
async fn nested_success_releases_savepoint() {
    let store = FakeStore::new();
    let manager = TransactionManager::new(store.clone());

    let linked = with_transaction_anyhow(&manager, |tx| {
        Box::pin(async move {
            with_nested_transaction_anyhow(tx, |nested| {
                Box::pin(async move {
                    nested
                        .resource_types()?
                        .execute("insert into resource_type values space")
                        .await
                        .map_err(anyhow::Error::from)
                })
            })
            .await
        })
    })
    .await
    .unwrap();

    assert_eq!(linked, 1);
    assert_eq!(
        store.tx_statements(),
        vec![
            "SAVEPOINT sp_1".to_owned(),
            "insert into resource_type values space".to_owned(),
            "RELEASE SAVEPOINT sp_1".to_owned(),
        ]
    );
    assert_eq!(store.rows("resource_type"), vec!["space".to_owned()]);
}
