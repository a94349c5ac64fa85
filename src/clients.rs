use aws_config::SdkConfig;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_redshiftdata::Client as RedshiftDataClient;
use aws_sdk_s3::Client as S3Client;

/// A type used to hold the AWS clients required to interact with AWS services
/// used by the lambda function.
#[derive(Clone)]
pub struct AwsClients {
    pub dynamodb: DynamoDbClient,
    pub s3: S3Client,
    pub redshift: RedshiftDataClient,
}

impl AwsClients {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        AwsClients {
            dynamodb: DynamoDbClient::new(sdk_config),
            s3: S3Client::new(sdk_config),
            redshift: RedshiftDataClient::new(sdk_config),
        }
    }
}
