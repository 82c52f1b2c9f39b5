//! Postgres document store contract. Runs only when `DATABASE_URL` is set.

use portfolio_admin::storage::document::Fields;
use portfolio_admin::{DocumentStore, PostgresDocumentStore, StoreError};
use serde_json::json;

fn fields(v: serde_json::Value) -> Fields {
    v.as_object().cloned().expect("object literal")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn postgres_store_contract() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        println!("DATABASE_URL not set; skipping");
        return Ok(());
    };

    let store = PostgresDocumentStore::connect(&url).await?;
    let collection = format!("it_{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default());

    let a = store
        .create(&collection, fields(json!({"title": "A", "location": {"name": "Hall"}})))
        .await?;
    let b = store.create(&collection, fields(json!({"title": "B"}))).await?;
    store.create(&collection, fields(json!({"title": "C"}))).await?;
    assert_eq!(a.len(), 20);
    assert_ne!(a, b);

    assert_eq!(store.list_all(&collection, None).await?.len(), 3);
    assert_eq!(store.list_all(&collection, Some(2)).await?.len(), 2);

    // Shallow merge: untouched keys survive.
    store
        .update(&collection, &a, fields(json!({"title": "A2"})))
        .await?;
    let listed = store.list_all(&collection, None).await?;
    let updated = listed.iter().find(|r| r.id == a).expect("record a");
    assert_eq!(updated.fields["title"], json!("A2"));
    assert_eq!(updated.fields["location"]["name"], json!("Hall"));

    let missing = store
        .update(&collection, "does-not-exist", fields(json!({"title": "x"})))
        .await;
    assert!(matches!(missing, Err(StoreError::NotFound { .. })));

    store.delete(&collection, &b).await?;
    store.delete(&collection, &b).await?;
    assert_eq!(store.list_all(&collection, None).await?.len(), 2);

    for record in store.list_all(&collection, None).await? {
        store.delete(&collection, &record.id).await?;
    }
    Ok(())
}
