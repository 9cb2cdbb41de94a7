//! [`EventLog`] backed by Kinesis Data Streams `PutRecord`.

use async_trait::async_trait;
use aws_sdk_kinesis::error::DisplayErrorContext;
use aws_sdk_kinesis::primitives::Blob;
use common::protocol::Acknowledgment;

use crate::publisher::{EventLog, LogError, LogRecord};

/// Kinesis Data Streams event log.
#[derive(Clone, Debug)]
pub struct KinesisEventLog {
    client: aws_sdk_kinesis::Client,
}

impl KinesisEventLog {
    /// Wrap a shared Kinesis client.
    pub fn new(client: aws_sdk_kinesis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventLog for KinesisEventLog {
    async fn append(&self, record: LogRecord) -> Result<Acknowledgment, LogError> {
        let LogRecord {
            stream_name,
            partition_key,
            data,
        } = record;

        let resp = self
            .client
            .put_record()
            .stream_name(&stream_name)
            .partition_key(partition_key)
            .data(Blob::new(data.to_vec()))
            .send()
            .await;

        match resp {
            Ok(out) => Ok(Acknowledgment {
                shard_id: out.shard_id().to_owned(),
                sequence_number: out.sequence_number().to_owned(),
            }),
            Err(e) => {
                let message = DisplayErrorContext(&e).to_string();
                let throttled = e
                    .as_service_error()
                    .is_some_and(|se| se.is_provisioned_throughput_exceeded_exception());
                if throttled {
                    Err(LogError::Throttled {
                        stream: stream_name,
                        message,
                    })
                } else {
                    Err(LogError::Append {
                        stream: stream_name,
                        message,
                    })
                }
            }
        }
    }
}
