//! End-to-end acquisition against a local index server and an in-memory
//! bucket.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::ObjectStore;

use ingestion::{
    AcquisitionConfig, ChunkAcquirer, GribDecoder, IndexResolver, RemoteRunSource, RunSource,
};
use storage::ObjectStorage;
use test_utils::fixtures::index::{contiguous_index, index_line};
use wind_common::{RunKey, WindError, WindResult};

const BUCKET: &str = "ecmwf-open-data";

/// Each byte becomes one value.
struct ByteDecoder;

#[async_trait]
impl GribDecoder for ByteDecoder {
    async fn decode(&self, _field: &str, data: Bytes) -> WindResult<Vec<f64>> {
        Ok(data.iter().map(|b| f64::from(*b)).collect())
    }

    fn name(&self) -> &'static str {
        "bytes"
    }
}

async fn index_handler(
    State(documents): State<Arc<HashMap<String, String>>>,
    UrlPath(path): UrlPath<String>,
) -> Result<String, StatusCode> {
    documents.get(&path).cloned().ok_or(StatusCode::NOT_FOUND)
}

/// Serve `documents` (object path -> body) under `/<bucket>/`.
async fn spawn_index_server(documents: HashMap<String, String>) -> String {
    let app = Router::new()
        .route(&format!("/{}/*path", BUCKET), get(index_handler))
        .with_state(Arc::new(documents));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn source_with(
    documents: HashMap<String, String>,
    objects: Vec<(String, Vec<u8>)>,
) -> RemoteRunSource {
    let base_url = spawn_index_server(documents).await;

    let store = Arc::new(InMemory::new());
    for (path, data) in objects {
        store.put(&Path::from(path), Bytes::from(data).into()).await.unwrap();
    }

    let config = AcquisitionConfig {
        index_base_url: base_url,
        bucket: BUCKET.to_string(),
        index_timeout_secs: 5,
        ..AcquisitionConfig::default()
    };
    let resolver = IndexResolver::new(&config).unwrap();
    let reader = Arc::new(ObjectStorage::from_store(store, BUCKET));
    RemoteRunSource::new(resolver, ChunkAcquirer::new(reader, Arc::new(ByteDecoder)))
}

#[tokio::test]
async fn test_fetch_run_decodes_both_fields() {
    let key = RunKey::parse("20240102", "06z").unwrap();
    let mut data = vec![7u8; 4];
    data.extend_from_slice(&[9u8; 3]);

    let documents = HashMap::from([(key.object_path(".index"), contiguous_index(4, 3))]);
    let source = source_with(documents, vec![(key.object_path(".grib2"), data)]).await;

    let fields = source.fetch_run(&key).await.unwrap();
    assert_eq!(fields["10u"], vec![7.0; 4]);
    assert_eq!(fields["10v"], vec![9.0; 3]);
}

#[tokio::test]
async fn test_missing_index_is_fetch_error() {
    let key = RunKey::parse("20240102", "00z").unwrap();
    let source = source_with(HashMap::new(), Vec::new()).await;

    let err = source.fetch_run(&key).await.unwrap_err();
    match err {
        WindError::IndexFetch { url, message } => {
            assert!(url.ends_with("20240102/00z/ifs/0p25/oper/20240102000000-0h-oper-fc.index"));
            assert!(message.contains("404"));
        }
        other => panic!("expected IndexFetch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_index_without_wind_is_empty() {
    let key = RunKey::parse("20240102", "12z").unwrap();
    let documents = HashMap::from([(key.object_path(".index"), index_line("2t", "sfc", 0, 10))]);
    let source = source_with(documents, Vec::new()).await;

    assert!(matches!(
        source.fetch_run(&key).await,
        Err(WindError::EmptyIndex { .. })
    ));
}

#[tokio::test]
async fn test_missing_object_is_acquisition_error() {
    let key = RunKey::parse("20240102", "18z").unwrap();
    let documents = HashMap::from([(key.object_path(".index"), contiguous_index(4, 4))]);
    let source = source_with(documents, Vec::new()).await;

    match source.fetch_run(&key).await.unwrap_err() {
        WindError::Acquisition { key: failed, path, .. } => {
            assert_eq!(failed, key);
            assert!(path.starts_with("store://ecmwf-open-data/20240102/18z/"));
        }
        other => panic!("expected Acquisition, got {:?}", other),
    }
}
