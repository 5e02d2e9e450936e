//! Chunk acquisition: byte-range reads plus decoding.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info, instrument};

use storage::RangeReader;
use wind_common::{RunKey, WindError, WindResult};

use crate::decoder::GribDecoder;
use crate::index::ChunkDescriptor;

/// Fetches the bytes described by a [`ChunkDescriptor`] and decodes them.
#[derive(Clone)]
pub struct ChunkAcquirer {
    reader: Arc<dyn RangeReader>,
    decoder: Arc<dyn GribDecoder>,
}

impl ChunkAcquirer {
    pub fn new(reader: Arc<dyn RangeReader>, decoder: Arc<dyn GribDecoder>) -> Self {
        Self { reader, decoder }
    }

    pub fn decoder_name(&self) -> &'static str {
        self.decoder.name()
    }

    /// Acquire one field of the run identified by `key`.
    #[instrument(skip(self, chunk), fields(run = %key, field = %chunk.field))]
    pub async fn acquire(&self, key: &RunKey, chunk: &ChunkDescriptor) -> WindResult<Vec<f64>> {
        let path = key.object_path(".grib2");
        let location = self.reader.describe(&path);
        let fail = |message: String| WindError::Acquisition {
            key: *key,
            field: chunk.field.clone(),
            path: location.clone(),
            message,
        };

        let data = self
            .reader
            .read_range(&path, chunk.range())
            .await
            .map_err(|e| fail(e.to_string()))?;

        if data.len() as u64 != chunk.length {
            return Err(fail(format!(
                "short read: expected {} bytes, got {}",
                chunk.length,
                data.len()
            )));
        }
        debug!(bytes = data.len(), "Fetched chunk");

        self.decoder.decode(&chunk.field, data).await
    }

    /// Acquire every chunk concurrently. Any failure fails the whole run.
    pub async fn acquire_all(
        &self,
        key: &RunKey,
        chunks: &[ChunkDescriptor],
    ) -> WindResult<HashMap<String, Vec<f64>>> {
        let decoded = try_join_all(chunks.iter().map(|chunk| async move {
            let values = self.acquire(key, chunk).await?;
            Ok::<_, WindError>((chunk.field.clone(), values))
        }))
        .await?;

        info!(run = %key, fields = decoded.len(), decoder = self.decoder.name(), "Acquired run fields");
        Ok(decoded.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::ops::Range;
    use std::sync::Mutex;

    /// Serves a fixed byte buffer for any path and records requests.
    struct BufferReader {
        data: Vec<u8>,
        requests: Mutex<Vec<(String, Range<u64>)>>,
    }

    #[async_trait]
    impl RangeReader for BufferReader {
        async fn read_range(&self, path: &str, range: Range<u64>) -> WindResult<Bytes> {
            self.requests.lock().unwrap().push((path.to_string(), range.clone()));
            let end = (range.end as usize).min(self.data.len());
            let start = (range.start as usize).min(end);
            Ok(Bytes::copy_from_slice(&self.data[start..end]))
        }

        fn describe(&self, path: &str) -> String {
            format!("mem://{}", path)
        }
    }

    /// Interprets each byte as one value.
    struct ByteDecoder;

    #[async_trait]
    impl GribDecoder for ByteDecoder {
        async fn decode(&self, field: &str, data: Bytes) -> WindResult<Vec<f64>> {
            if data.first() == Some(&0xff) {
                return Err(WindError::decode(field, "bad marker"));
            }
            Ok(data.iter().map(|b| f64::from(*b)).collect())
        }

        fn name(&self) -> &'static str {
            "bytes"
        }
    }

    fn acquirer(data: Vec<u8>) -> (ChunkAcquirer, Arc<BufferReader>) {
        let reader = Arc::new(BufferReader {
            data,
            requests: Mutex::new(Vec::new()),
        });
        (ChunkAcquirer::new(reader.clone(), Arc::new(ByteDecoder)), reader)
    }

    fn chunk(field: &str, offset: u64, length: u64) -> ChunkDescriptor {
        ChunkDescriptor {
            field: field.to_string(),
            offset,
            length,
        }
    }

    fn key() -> RunKey {
        RunKey::parse("20240101", "18z").unwrap()
    }

    #[tokio::test]
    async fn test_acquire_reads_exact_range() {
        let (acquirer, reader) = acquirer((0u8..50).collect());

        let values = acquirer.acquire(&key(), &chunk("10u", 10, 3)).await.unwrap();
        assert_eq!(values, vec![10.0, 11.0, 12.0]);

        let requests = reader.requests.lock().unwrap();
        assert_eq!(
            requests[0],
            (
                "20240101/18z/ifs/0p25/scda/20240101180000-0h-scda-fc.grib2".to_string(),
                10..13
            )
        );
    }

    #[tokio::test]
    async fn test_short_read_is_acquisition_error() {
        let (acquirer, _) = acquirer(vec![1, 2, 3]);

        let err = acquirer.acquire(&key(), &chunk("10v", 1, 10)).await.unwrap_err();
        match err {
            WindError::Acquisition { field, path, message, .. } => {
                assert_eq!(field, "10v");
                assert!(path.starts_with("mem://20240101/18z"));
                assert!(message.contains("short read"));
            }
            other => panic!("expected Acquisition, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_acquire_all_collects_fields() {
        let (acquirer, _) = acquirer((0u8..20).collect());
        let chunks = vec![chunk("10u", 0, 4), chunk("10v", 4, 4)];

        let fields = acquirer.acquire_all(&key(), &chunks).await.unwrap();
        assert_eq!(fields["10u"], vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(fields["10v"], vec![4.0, 5.0, 6.0, 7.0]);
    }

    #[tokio::test]
    async fn test_acquire_all_fails_on_any_field() {
        let mut data: Vec<u8> = (0u8..20).collect();
        data[4] = 0xff;
        let (acquirer, _) = acquirer(data);
        let chunks = vec![chunk("10u", 0, 4), chunk("10v", 4, 4)];

        let err = acquirer.acquire_all(&key(), &chunks).await.unwrap_err();
        assert!(matches!(err, WindError::Decode { ref field, .. } if field == "10v"));
    }
}
