//! AWS adapter for cloudsweep
//!
//! Implements the session traits on top of the AWS SDK. The SDK is async; the
//! scan engine is not, so every call is driven to completion with `block_on`
//! on one shared multi-threaded tokio runtime.

mod client;
mod error;
mod render;

pub use client::{ec2_filters, ServiceHandle, SUPPORTED_SERVICES};
pub use error::{classify_code, sdk_error};

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_ec2::config::Credentials;
use cloudsweep_core::{
    Account, CallParams, CloudSession, CloudsweepError, Config, Result, ServiceClient,
    SessionProvider,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::debug;

const CREDENTIALS_SOURCE: &str = "cloudsweep-credentials-file";

/// Opens SDK sessions from static account credentials
pub struct AwsSessionProvider {
    runtime: Arc<Runtime>,
    anchor_region: String,
    call_timeout: Duration,
}

impl AwsSessionProvider {
    /// Create a provider with its own runtime
    pub fn new(config: &Config) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("cloudsweep-aws")
            .build()?;
        Ok(Self::with_runtime(Arc::new(runtime), config))
    }

    /// Create a provider on an existing runtime
    pub fn with_runtime(runtime: Arc<Runtime>, config: &Config) -> Self {
        Self {
            runtime,
            anchor_region: config.anchor_region.clone(),
            call_timeout: Duration::from_secs(config.call_timeout_secs),
        }
    }
}

impl SessionProvider for AwsSessionProvider {
    fn name(&self) -> &str {
        "aws"
    }

    fn open(&self, account: &Account) -> Result<Arc<dyn CloudSession>> {
        if account.access_key.is_empty() || account.secret_key().is_empty() {
            return Err(CloudsweepError::Session(format!(
                "{} has an empty access or secret key",
                account.name
            )));
        }

        let credentials = Credentials::new(
            account.access_key.clone(),
            account.secret_key().to_string(),
            None,
            None,
            CREDENTIALS_SOURCE,
        );

        // No retries: a throttled or failing call is absorbed by the scan
        let base = self.runtime.block_on(
            aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(self.anchor_region.clone()))
                .credentials_provider(credentials)
                .retry_config(RetryConfig::disabled())
                .timeout_config(
                    TimeoutConfig::builder()
                        .operation_timeout(self.call_timeout)
                        .build(),
                )
                .load(),
        );

        debug!("Opened AWS session for {} ({})", account.name, account.key_hint());
        Ok(Arc::new(AwsSession {
            runtime: Arc::clone(&self.runtime),
            base,
        }))
    }
}

/// Authenticated session for one account
pub struct AwsSession {
    runtime: Arc<Runtime>,
    base: SdkConfig,
}

impl AwsSession {
    /// The session config re-targeted at `region`
    pub fn config_for(&self, region: &str) -> SdkConfig {
        self.base
            .to_builder()
            .region(Region::new(region.to_string()))
            .build()
    }
}

impl CloudSession for AwsSession {
    fn client(&self, service: &str, region: &str) -> Result<Box<dyn ServiceClient>> {
        let handle = ServiceHandle::connect(service, &self.config_for(region))?;
        Ok(Box::new(AwsClient {
            runtime: Arc::clone(&self.runtime),
            handle,
            region: region.to_string(),
        }))
    }
}

/// A service client bound to one region
pub struct AwsClient {
    runtime: Arc<Runtime>,
    handle: ServiceHandle,
    region: String,
}

impl ServiceClient for AwsClient {
    fn invoke(&self, operation: &str, params: &CallParams) -> Result<Value> {
        debug!("{}.{} in {}", self.handle.service(), operation, self.region);
        self.runtime.block_on(self.handle.call(operation, params))
    }
}
