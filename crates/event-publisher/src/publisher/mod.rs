//! [`SecureEventPublisher`]: serialise, encrypt, wrap, and append events.
//!
//! # Delivery contract
//!
//! Publishing is best-effort. [`SecureEventPublisher::write_event`] always
//! resolves; a failing stage is logged with its name and the triggering error,
//! the chain stops there, and the caller gets `None`. Nothing is retried,
//! queued, or ordered across calls.
//!
//! # Security invariants
//!
//! - The stream key, plaintext events, and ciphertext never appear in logs,
//!   span attributes, or metric labels.
//! - With no destination configured, no cipher, KMS, or log call is made.

pub mod log;
pub mod pipeline;

pub use log::{EventLog, LogError, LogRecord};
pub use pipeline::StageError;

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info, info_span, Instrument};

use crate::crypto::{CryptoBackendError, KeyCryptoService, StreamKey};
use crate::telemetry::PublishMetrics;

/// Publisher settings fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct PublisherConfig {
    /// Destination stream. `None` or blank disables publishing.
    pub destination: Option<String>,
    /// KMS key id used by the key-wrap stage.
    pub wrapping_key_id: String,
    /// Base64 KMS blob that unwraps to the 32-byte stream key.
    pub wrapped_key_ciphertext: String,
}

impl PublisherConfig {
    /// The destination stream, if one is configured and non-blank.
    pub fn destination(&self) -> Option<&str> {
        self.destination
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Returns `true` if a destination stream is configured.
    pub fn is_enabled(&self) -> bool {
        self.destination().is_some()
    }
}

/// Everything an enabled publisher needs to run the pipeline.
struct Destination {
    stream_name: String,
    wrapping_key_id: String,
    stream_key: StreamKey,
    crypto: KeyCryptoService,
    log: Arc<dyn EventLog>,
}

/// Turns arbitrary serialisable events into encrypted, appended log records.
///
/// Cheap to clone; clones share the same immutable destination.
#[derive(Clone)]
pub struct SecureEventPublisher {
    destination: Option<Arc<Destination>>,
    metrics: PublishMetrics,
}

impl SecureEventPublisher {
    /// A publisher that accepts every event and does nothing with it.
    pub fn disabled() -> Self {
        Self {
            destination: None,
            metrics: PublishMetrics::new(),
        }
    }

    /// Resolve the stream key through KMS and build the publisher.
    ///
    /// With no destination configured this returns [`SecureEventPublisher::disabled`]
    /// without touching KMS.
    ///
    /// # Errors
    ///
    /// Returns a [`CryptoBackendError`] if the wrapped key cannot be unwrapped
    /// or does not unwrap to exactly 32 bytes.
    pub async fn connect(
        config: PublisherConfig,
        crypto: KeyCryptoService,
        log: Arc<dyn EventLog>,
    ) -> Result<Self, CryptoBackendError> {
        if !config.is_enabled() {
            info!("no destination stream configured; event publishing disabled");
            return Ok(Self::disabled());
        }

        let mut key_bytes = crypto.wrap_decrypt(&config.wrapped_key_ciphertext).await?;
        let stream_key = StreamKey::from_slice(&key_bytes);
        key_bytes.iter_mut().for_each(|b| *b = 0);
        let stream_key = stream_key.inspect_err(|e| error!(error = %e, "unwrapped stream key rejected"))?;

        let publisher = Self::with_stream_key(config, stream_key, crypto, log);
        info!(stream = publisher.stream_name().unwrap_or_default(), "event publishing enabled");
        Ok(publisher)
    }

    /// Build the publisher around an already-resolved stream key.
    pub fn with_stream_key(
        config: PublisherConfig,
        stream_key: StreamKey,
        crypto: KeyCryptoService,
        log: Arc<dyn EventLog>,
    ) -> Self {
        let destination = config.destination().map(|stream_name| {
            Arc::new(Destination {
                stream_name: stream_name.to_owned(),
                wrapping_key_id: config.wrapping_key_id.clone(),
                stream_key,
                crypto,
                log,
            })
        });
        Self {
            destination,
            metrics: PublishMetrics::new(),
        }
    }

    /// Returns `true` if events are forwarded to a stream.
    pub fn is_enabled(&self) -> bool {
        self.destination.is_some()
    }

    /// The destination stream name, if publishing is enabled.
    pub fn stream_name(&self) -> Option<&str> {
        self.destination.as_deref().map(|d| d.stream_name.as_str())
    }

    /// Encrypt and append one event.
    ///
    /// Returns the log acknowledgment serialised as JSON, or `None` when
    /// publishing is disabled or any stage failed. Never panics on bad input.
    pub async fn write_event<E: Serialize + ?Sized>(&self, event: &E) -> Option<String> {
        let dest = self.destination.as_deref()?;

        let started = Instant::now();
        let span = info_span!("write_event", stream = %dest.stream_name);
        let result = dest.run(event).instrument(span).await;
        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

        match result {
            Ok(ack) => {
                self.metrics.record_duration(elapsed, "delivered");
                info!(stream = %dest.stream_name, elapsed_ms, outcome = "delivered", "event published");
                Some(ack)
            }
            Err(e) => {
                self.metrics.record_duration(elapsed, "failed");
                self.metrics.record_stage_failure(e.stage());
                error!(
                    stream = %dest.stream_name,
                    stage = e.stage(),
                    error = %e,
                    elapsed_ms,
                    outcome = "failed",
                    "event publishing halted"
                );
                None
            }
        }
    }

    /// Run [`SecureEventPublisher::write_event`] on the Tokio runtime without
    /// waiting for it.
    pub fn spawn_event<E>(&self, event: E) -> tokio::task::JoinHandle<Option<String>>
    where
        E: Serialize + Send + Sync + 'static,
    {
        let publisher = self.clone();
        tokio::spawn(async move { publisher.write_event(&event).await })
    }
}

impl Destination {
    async fn run<E: Serialize + ?Sized>(&self, event: &E) -> Result<String, StageError> {
        let line = pipeline::serialize(event)?;
        let sealed = pipeline::seal(&self.crypto, &self.stream_key, &line)?;
        let wrapped = pipeline::wrap(&self.crypto, &self.wrapping_key_id, &sealed).await?;
        pipeline::append(self.log.as_ref(), &self.stream_name, wrapped).await
    }
}

impl std::fmt::Debug for SecureEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureEventPublisher")
            .field("stream", &self.stream_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;

    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use common::protocol::{Acknowledgment, CipherEnvelope};
    use mockall::Sequence;
    use serde_json::json;
    use tracing_subscriber::fmt::MakeWriter;
    use uuid::Uuid;

    use super::*;
    use crate::crypto::service::MockKeyManagement;
    use crate::crypto::KEY_LEN;
    use crate::publisher::log::MockEventLog;

    const STREAM: &str = "analytics-stream";
    const KEY_ID: &str = "alias/events";

    fn config(destination: Option<&str>) -> PublisherConfig {
        PublisherConfig {
            destination: destination.map(str::to_owned),
            wrapping_key_id: KEY_ID.into(),
            wrapped_key_ciphertext: STANDARD.encode([9u8; KEY_LEN]),
        }
    }

    fn stream_key() -> StreamKey {
        StreamKey::from_slice(&[0x5Au8; KEY_LEN]).unwrap()
    }

    fn ack(seq: &str) -> Acknowledgment {
        Acknowledgment {
            shard_id: "shardId-000000000000".into(),
            sequence_number: seq.into(),
        }
    }

    fn reverse(bytes: &[u8]) -> Vec<u8> {
        bytes.iter().rev().copied().collect()
    }

    fn publisher(kms: MockKeyManagement, log: MockEventLog, destination: Option<&str>) -> SecureEventPublisher {
        SecureEventPublisher::with_stream_key(
            config(destination),
            stream_key(),
            KeyCryptoService::new(Arc::new(kms)),
            Arc::new(log),
        )
    }

    /// Collects formatted log output so tests can assert on it.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;
        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn disabled_publisher_makes_no_calls() {
        let mut kms = MockKeyManagement::new();
        kms.expect_encrypt().times(0);
        kms.expect_decrypt().times(0);
        let mut log = MockEventLog::new();
        log.expect_append().times(0);

        let p = publisher(kms, log, None);
        assert!(!p.is_enabled());
        assert_eq!(p.write_event(&json!({"a": 1})).await, None);
    }

    #[tokio::test]
    async fn blank_destination_is_disabled() {
        let mut log = MockEventLog::new();
        log.expect_append().times(0);
        let p = publisher(MockKeyManagement::new(), log, Some("   "));
        assert!(!p.is_enabled());
        assert_eq!(p.write_event(&json!({"a": 1})).await, None);
    }

    #[tokio::test]
    async fn connect_disabled_skips_kms() {
        let mut kms = MockKeyManagement::new();
        kms.expect_decrypt().times(0);
        let p = SecureEventPublisher::connect(
            config(Some("")),
            KeyCryptoService::new(Arc::new(kms)),
            Arc::new(MockEventLog::new()),
        )
        .await
        .unwrap();
        assert!(!p.is_enabled());
    }

    #[tokio::test]
    async fn connect_unwraps_stream_key() {
        let mut kms = MockKeyManagement::new();
        kms.expect_decrypt()
            .withf(|ct| ct == [9u8; KEY_LEN])
            .times(1)
            .returning(|_| Ok(vec![0x11; KEY_LEN]));
        let p = SecureEventPublisher::connect(
            config(Some(STREAM)),
            KeyCryptoService::new(Arc::new(kms)),
            Arc::new(MockEventLog::new()),
        )
        .await
        .unwrap();
        assert_eq!(p.stream_name(), Some(STREAM));
    }

    #[tokio::test]
    async fn connect_rejects_short_stream_key() {
        let mut kms = MockKeyManagement::new();
        kms.expect_decrypt().returning(|_| Ok(vec![0x11; 16]));
        let err = SecureEventPublisher::connect(
            config(Some(STREAM)),
            KeyCryptoService::new(Arc::new(kms)),
            Arc::new(MockEventLog::new()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CryptoBackendError::InvalidKeyLength(16)));
    }

    #[tokio::test]
    async fn stages_run_once_in_order() {
        let mut seq = Sequence::new();
        let mut kms = MockKeyManagement::new();
        // Stage A must already have produced a cipher envelope.
        kms.expect_encrypt()
            .withf(|key_id, pt| {
                key_id == KEY_ID && serde_json::from_slice::<CipherEnvelope>(pt).is_ok()
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, pt| Ok(reverse(pt)));

        let mut log = MockEventLog::new();
        log.expect_append()
            .withf(|r| {
                r.stream_name == STREAM
                    && Uuid::parse_str(&r.partition_key).is_ok()
                    && STANDARD.decode(&r.data).is_ok()
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(ack("1")));

        let p = publisher(kms, log, Some(STREAM));
        let result = p.write_event(&json!({"a": 1})).await;
        assert_eq!(
            result.as_deref(),
            Some(r#"{"ShardId":"shardId-000000000000","SequenceNumber":"1"}"#)
        );
    }

    #[tokio::test]
    async fn appended_record_decrypts_to_original_event() {
        let captured = Arc::new(Mutex::new(Vec::<LogRecord>::new()));

        let mut kms = MockKeyManagement::new();
        kms.expect_encrypt().returning(|_, pt| Ok(reverse(pt)));
        kms.expect_decrypt().returning(|ct| Ok(reverse(ct)));
        let mut log = MockEventLog::new();
        let sink = captured.clone();
        log.expect_append().returning(move |r| {
            sink.lock().unwrap().push(r);
            Ok(ack("7"))
        });

        let kms = Arc::new(kms);
        let p = SecureEventPublisher::with_stream_key(
            config(Some(STREAM)),
            stream_key(),
            KeyCryptoService::new(kms.clone()),
            Arc::new(log),
        );
        assert!(p.write_event(&json!({"a": 1})).await.is_some());

        let record = captured.lock().unwrap().pop().unwrap();
        let reader = KeyCryptoService::new(kms);
        let wrapped = std::str::from_utf8(&record.data).unwrap();
        let envelope_json = reader.wrap_decrypt(wrapped).await.unwrap();
        let env: CipherEnvelope = serde_json::from_slice(&envelope_json).unwrap();
        let line = reader
            .symmetric_decrypt(stream_key().as_bytes(), &env.iv, &env.ciphertext)
            .unwrap();
        assert_eq!(line, "{\"a\":1}\n");
    }

    #[tokio::test]
    async fn partition_key_is_fresh_per_call() {
        let keys = Arc::new(Mutex::new(Vec::<String>::new()));

        let mut kms = MockKeyManagement::new();
        kms.expect_encrypt().times(2).returning(|_, pt| Ok(reverse(pt)));
        let mut log = MockEventLog::new();
        let sink = keys.clone();
        log.expect_append().times(2).returning(move |r| {
            sink.lock().unwrap().push(r.partition_key);
            Ok(ack("1"))
        });

        let p = publisher(kms, log, Some(STREAM));
        p.write_event(&json!({"a": 1})).await;
        p.write_event(&json!({"a": 1})).await;

        let keys = keys.lock().unwrap();
        assert_eq!(keys.len(), 2);
        assert_ne!(keys[0], keys[1]);
        for k in keys.iter() {
            assert!(Uuid::parse_str(k).is_ok(), "not a uuid: {k}");
        }
    }

    fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    #[tokio::test]
    async fn delivered_event_is_timed_once() {
        let (logs, _guard) = capture_logs();

        let mut kms = MockKeyManagement::new();
        kms.expect_encrypt().times(1).returning(|_, pt| Ok(reverse(pt)));
        let mut log = MockEventLog::new();
        log.expect_append().times(1).returning(|_| Ok(ack("3")));

        let p = publisher(kms, log, Some(STREAM));
        assert!(p.write_event(&json!({"a": 1})).await.is_some());

        let out = logs.contents();
        assert_eq!(out.matches("elapsed_ms=").count(), 1, "logs: {out}");
        assert!(out.contains("event published"), "logs: {out}");
        assert!(out.contains("delivered"), "logs: {out}");
        assert!(!out.contains("failed"), "logs: {out}");
    }

    #[tokio::test]
    async fn kms_failure_resolves_and_is_logged() {
        let (logs, _guard) = capture_logs();

        let mut kms = MockKeyManagement::new();
        kms.expect_encrypt()
            .times(1)
            .returning(|_, _| Err(CryptoBackendError::Backend("KMS unavailable".into())));
        let mut log = MockEventLog::new();
        log.expect_append().times(0);

        let p = publisher(kms, log, Some(STREAM));
        assert_eq!(p.write_event(&json!({"a": 1})).await, None);

        let out = logs.contents();
        assert!(out.contains("event publishing halted"), "logs: {out}");
        assert!(out.contains("key_wrap"), "logs: {out}");
        assert!(out.contains("KMS unavailable"), "logs: {out}");
        assert_eq!(out.matches("elapsed_ms=").count(), 1, "logs: {out}");
        assert!(out.contains("outcome=") && out.contains("failed"), "logs: {out}");
        assert!(!out.contains("delivered"), "logs: {out}");
    }

    #[tokio::test]
    async fn append_failure_resolves_to_none() {
        let mut kms = MockKeyManagement::new();
        kms.expect_encrypt().returning(|_, pt| Ok(reverse(pt)));
        let mut log = MockEventLog::new();
        log.expect_append().times(1).returning(|r| {
            Err(LogError::Throttled {
                stream: r.stream_name,
                message: "ProvisionedThroughputExceededException".into(),
            })
        });

        let p = publisher(kms, log, Some(STREAM));
        assert_eq!(p.write_event(&json!({"a": 1})).await, None);
    }

    #[tokio::test]
    async fn unserialisable_event_resolves_to_none() {
        let mut kms = MockKeyManagement::new();
        kms.expect_encrypt().times(0);
        let mut log = MockEventLog::new();
        log.expect_append().times(0);

        let mut bad = std::collections::BTreeMap::new();
        bad.insert((1, 2), "tuple keys are not JSON");
        let p = publisher(kms, log, Some(STREAM));
        assert_eq!(p.write_event(&bad).await, None);
    }

    #[tokio::test]
    async fn concurrent_writes_are_independent() {
        let mut kms = MockKeyManagement::new();
        kms.expect_encrypt().times(8).returning(|_, pt| Ok(reverse(pt)));
        let mut log = MockEventLog::new();
        log.expect_append()
            .times(8)
            .returning(|r| Ok(ack(&r.partition_key)));

        let p = publisher(kms, log, Some(STREAM));
        let handles: Vec<_> = (0..8).map(|i| p.spawn_event(json!({ "n": i }))).collect();

        let mut acks = Vec::new();
        for h in handles {
            acks.push(h.await.unwrap().unwrap());
        }
        acks.sort();
        acks.dedup();
        assert_eq!(acks.len(), 8);
    }
}
