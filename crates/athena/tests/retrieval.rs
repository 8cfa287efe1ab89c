//! Result retrieval against an in-memory object store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use silver_athena::*;

#[derive(Default)]
struct MemoryStore {
    objects: HashMap<(String, String), Bytes>,
    requests: Mutex<Vec<S3Location>>,
}

impl MemoryStore {
    fn with_object(mut self, bucket: &str, key: &str, body: String) -> Self {
        self.objects
            .insert((bucket.to_string(), key.to_string()), Bytes::from(body));
        self
    }

    fn requests(&self) -> Vec<S3Location> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn get_object(&self, location: &S3Location) -> Result<Bytes, AthenaError> {
        self.requests.lock().unwrap().push(location.clone());
        self.objects
            .get(&(location.bucket.clone(), location.key.clone()))
            .cloned()
            .ok_or_else(|| AthenaError::ObjectStore(format!("NoSuchKey: {location}")))
    }
}

fn succeeded(query_id: &str, output_location: Option<&str>) -> ExecutionInfo {
    ExecutionInfo {
        query_id: query_id.to_string(),
        status: QueryStatus::new(QueryState::Succeeded),
        output_location: output_location.map(str::to_string),
        bytes_scanned: 1024,
        execution_time_ms: 800,
    }
}

fn company_csv(rows: usize) -> String {
    let mut csv = String::from("\"company_id\",\"whatsappnumber\",\"voipnumber\",\"askflowname\"\n");
    for i in 0..rows {
        csv.push_str(&format!("\"{}\",\"55119{i:08}\",,\"Hotel {i}\"\n", 1000 + i));
    }
    csv
}

#[tokio::test]
async fn fetches_from_the_location_athena_reported() {
    let store = MemoryStore::default().with_object(
        "asksuite-athena-results",
        "athena-temp/q-500.csv",
        company_csv(500),
    );
    let execution = succeeded(
        "q-500",
        Some("s3://asksuite-athena-results/athena-temp/q-500.csv"),
    );

    let table = fetch_result_table(&store, &execution).await.unwrap();

    assert_eq!(table.row_count(), 500);
    assert_eq!(table.column_count(), 4);
    assert_eq!(
        store.requests(),
        vec![S3Location {
            bucket: "asksuite-athena-results".into(),
            key: "athena-temp/q-500.csv".into(),
        }]
    );
}

#[tokio::test]
async fn malformed_location_fails_without_fetching() {
    let store = MemoryStore::default();
    let execution = succeeded("q-bad", Some("asksuite-athena-results/athena-temp/q-bad.csv"));

    let err = fetch_result_table(&store, &execution).await.unwrap_err();

    assert!(matches!(err, AthenaError::InvalidOutputLocation(_)), "got {err:?}");
    assert!(store.requests().is_empty());
}

#[tokio::test]
async fn missing_location_is_reported() {
    let store = MemoryStore::default();
    let err = fetch_result_table(&store, &succeeded("q-none", None))
        .await
        .unwrap_err();

    match err {
        AthenaError::MissingOutputLocation { query_id } => assert_eq!(query_id, "q-none"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.requests().is_empty());
}

#[tokio::test]
async fn store_errors_propagate() {
    let store = MemoryStore::default();
    let execution = succeeded("q-gone", Some("s3://asksuite-athena-results/athena-temp/q-gone.csv"));

    let err = fetch_result_table(&store, &execution).await.unwrap_err();
    assert!(err.to_string().contains("NoSuchKey"));
}
