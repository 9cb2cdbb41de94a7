//! AWS SDK client bundle shared by the publisher.

use aws_config::BehaviorVersion;

/// Bundle of AWS SDK clients built from one shared [`aws_config::SdkConfig`] so
/// that credentials and region are resolved once and reused.
#[derive(Clone, Debug)]
pub struct AwsClients {
    /// KMS client used to wrap payloads and unwrap the stream key.
    pub kms: aws_sdk_kms::Client,
    /// Kinesis client used to append encrypted records.
    pub kinesis: aws_sdk_kinesis::Client,
}

impl AwsClients {
    /// Initialise all AWS SDK clients from the standard provider chain.
    ///
    /// Region, credentials, and endpoint overrides (`AWS_ENDPOINT_URL`,
    /// `AWS_ENDPOINT_URL_KINESIS`, ...) come from the environment as usual.
    pub async fn init() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self {
            kms: aws_sdk_kms::Client::new(&config),
            kinesis: aws_sdk_kinesis::Client::new(&config),
        }
    }
}
