//! Per-service SDK clients and operation dispatch

use crate::error::sdk_error;
use crate::render::{self, list};
use aws_config::SdkConfig;
use cloudsweep_core::{CallParams, CloudsweepError, Result};
use serde_json::Value;

/// Service names understood by [`ServiceHandle::connect`]
pub const SUPPORTED_SERVICES: &[&str] = &[
    "iam",
    "cloudfront",
    "wafv2",
    "ec2",
    "autoscaling",
    "kms",
    "elb",
    "elbv2",
    "eks",
    "lambda",
    "secretsmanager",
    "rds",
    "ecs",
    "ecr",
    "codebuild",
];

/// One SDK client, selected by service name
#[derive(Debug, Clone)]
pub enum ServiceHandle {
    Iam(aws_sdk_iam::Client),
    CloudFront(aws_sdk_cloudfront::Client),
    Wafv2(aws_sdk_wafv2::Client),
    Ec2(aws_sdk_ec2::Client),
    AutoScaling(aws_sdk_autoscaling::Client),
    Kms(aws_sdk_kms::Client),
    Elb(aws_sdk_elasticloadbalancing::Client),
    Elbv2(aws_sdk_elasticloadbalancingv2::Client),
    Eks(aws_sdk_eks::Client),
    Lambda(aws_sdk_lambda::Client),
    SecretsManager(aws_sdk_secretsmanager::Client),
    Rds(aws_sdk_rds::Client),
    Ecs(aws_sdk_ecs::Client),
    Ecr(aws_sdk_ecr::Client),
    CodeBuild(aws_sdk_codebuild::Client),
}

impl ServiceHandle {
    /// Build the client for `service` from a region-scoped config
    pub fn connect(service: &str, config: &SdkConfig) -> Result<Self> {
        let handle = match service {
            "iam" => Self::Iam(aws_sdk_iam::Client::new(config)),
            "cloudfront" => Self::CloudFront(aws_sdk_cloudfront::Client::new(config)),
            "wafv2" => Self::Wafv2(aws_sdk_wafv2::Client::new(config)),
            "ec2" => Self::Ec2(aws_sdk_ec2::Client::new(config)),
            "autoscaling" => Self::AutoScaling(aws_sdk_autoscaling::Client::new(config)),
            "kms" => Self::Kms(aws_sdk_kms::Client::new(config)),
            "elb" => Self::Elb(aws_sdk_elasticloadbalancing::Client::new(config)),
            "elbv2" => Self::Elbv2(aws_sdk_elasticloadbalancingv2::Client::new(config)),
            "eks" => Self::Eks(aws_sdk_eks::Client::new(config)),
            "lambda" => Self::Lambda(aws_sdk_lambda::Client::new(config)),
            "secretsmanager" => Self::SecretsManager(aws_sdk_secretsmanager::Client::new(config)),
            "rds" => Self::Rds(aws_sdk_rds::Client::new(config)),
            "ecs" => Self::Ecs(aws_sdk_ecs::Client::new(config)),
            "ecr" => Self::Ecr(aws_sdk_ecr::Client::new(config)),
            "codebuild" => Self::CodeBuild(aws_sdk_codebuild::Client::new(config)),
            other => return Err(CloudsweepError::UnknownService(other.to_string())),
        };
        Ok(handle)
    }

    pub fn service(&self) -> &'static str {
        match self {
            Self::Iam(_) => "iam",
            Self::CloudFront(_) => "cloudfront",
            Self::Wafv2(_) => "wafv2",
            Self::Ec2(_) => "ec2",
            Self::AutoScaling(_) => "autoscaling",
            Self::Kms(_) => "kms",
            Self::Elb(_) => "elb",
            Self::Elbv2(_) => "elbv2",
            Self::Eks(_) => "eks",
            Self::Lambda(_) => "lambda",
            Self::SecretsManager(_) => "secretsmanager",
            Self::Rds(_) => "rds",
            Self::Ecs(_) => "ecs",
            Self::Ecr(_) => "ecr",
            Self::CodeBuild(_) => "codebuild",
        }
    }

    /// Issue `operation` and render its first page of results.
    pub async fn call(&self, operation: &str, params: &CallParams) -> Result<Value> {
        match (self, operation) {
            (Self::Iam(c), "list_users") => {
                let out = c.list_users().send().await.map_err(sdk_error)?;
                Ok(render::users(list(out.users())))
            }
            (Self::CloudFront(c), "list_distributions") => {
                let out = c.list_distributions().send().await.map_err(sdk_error)?;
                Ok(render::distributions(out.distribution_list()))
            }
            (Self::Wafv2(c), "list_web_acls") => {
                let scope = params.scope.as_deref().unwrap_or("REGIONAL");
                let out = c
                    .list_web_acls()
                    .scope(aws_sdk_wafv2::types::Scope::from(scope))
                    .send()
                    .await
                    .map_err(sdk_error)?;
                Ok(render::web_acls(list(out.web_acls())))
            }
            (Self::Ec2(c), "describe_regions") => {
                let out = c
                    .describe_regions()
                    .set_filters(ec2_filters(params))
                    .send()
                    .await
                    .map_err(sdk_error)?;
                Ok(render::regions(list(out.regions())))
            }
            (Self::Ec2(c), "describe_instances") => {
                let out = c
                    .describe_instances()
                    .set_filters(ec2_filters(params))
                    .send()
                    .await
                    .map_err(sdk_error)?;
                Ok(render::reservations(list(out.reservations())))
            }
            (Self::Ec2(c), "describe_vpcs") => {
                let out = c
                    .describe_vpcs()
                    .set_filters(ec2_filters(params))
                    .send()
                    .await
                    .map_err(sdk_error)?;
                Ok(render::vpcs(list(out.vpcs())))
            }
            (Self::Ec2(c), "describe_images") => {
                let out = c
                    .describe_images()
                    .set_owners(non_empty(&params.owners))
                    .set_filters(ec2_filters(params))
                    .send()
                    .await
                    .map_err(sdk_error)?;
                Ok(render::images(list(out.images())))
            }
            (Self::Ec2(c), "describe_snapshots") => {
                let out = c
                    .describe_snapshots()
                    .set_owner_ids(non_empty(&params.owners))
                    .set_filters(ec2_filters(params))
                    .send()
                    .await
                    .map_err(sdk_error)?;
                Ok(render::snapshots(list(out.snapshots())))
            }
            (Self::Ec2(c), "describe_volumes") => {
                let out = c
                    .describe_volumes()
                    .set_filters(ec2_filters(params))
                    .send()
                    .await
                    .map_err(sdk_error)?;
                Ok(render::volumes(list(out.volumes())))
            }
            (Self::Ec2(c), "describe_addresses") => {
                let out = c
                    .describe_addresses()
                    .set_filters(ec2_filters(params))
                    .send()
                    .await
                    .map_err(sdk_error)?;
                Ok(render::addresses(list(out.addresses())))
            }
            (Self::AutoScaling(c), "describe_auto_scaling_groups") => {
                let out = c.describe_auto_scaling_groups().send().await.map_err(sdk_error)?;
                Ok(render::auto_scaling_groups(list(out.auto_scaling_groups())))
            }
            (Self::Kms(c), "list_keys") => {
                let out = c.list_keys().send().await.map_err(sdk_error)?;
                Ok(render::keys(list(out.keys())))
            }
            (Self::Kms(c), "describe_key") => {
                let key_id = params.resource_id.as_deref().ok_or_else(|| {
                    CloudsweepError::Other("kms.describe_key needs a key id".to_string())
                })?;
                let out = c.describe_key().key_id(key_id).send().await.map_err(sdk_error)?;
                Ok(render::key_metadata(out.key_metadata()))
            }
            (Self::Elb(c), "describe_load_balancers") => {
                let out = c.describe_load_balancers().send().await.map_err(sdk_error)?;
                Ok(render::classic_load_balancers(list(out.load_balancer_descriptions())))
            }
            (Self::Elbv2(c), "describe_load_balancers") => {
                let out = c.describe_load_balancers().send().await.map_err(sdk_error)?;
                Ok(render::load_balancers(list(out.load_balancers())))
            }
            (Self::Eks(c), "list_clusters") => {
                let out = c.list_clusters().send().await.map_err(sdk_error)?;
                Ok(render::names("clusters", list(out.clusters())))
            }
            (Self::Lambda(c), "list_functions") => {
                let out = c.list_functions().send().await.map_err(sdk_error)?;
                Ok(render::functions(list(out.functions())))
            }
            (Self::SecretsManager(c), "list_secrets") => {
                let out = c.list_secrets().send().await.map_err(sdk_error)?;
                Ok(render::secrets(list(out.secret_list())))
            }
            (Self::Rds(c), "describe_db_instances") => {
                let out = c.describe_db_instances().send().await.map_err(sdk_error)?;
                Ok(render::db_instances(list(out.db_instances())))
            }
            (Self::Ecs(c), "list_clusters") => {
                let out = c.list_clusters().send().await.map_err(sdk_error)?;
                Ok(render::names("clusterArns", list(out.cluster_arns())))
            }
            (Self::Ecr(c), "describe_repositories") => {
                let out = c.describe_repositories().send().await.map_err(sdk_error)?;
                Ok(render::repositories(list(out.repositories())))
            }
            (Self::CodeBuild(c), "list_projects") => {
                let out = c.list_projects().send().await.map_err(sdk_error)?;
                Ok(render::names("projects", list(out.projects())))
            }
            (handle, operation) => Err(CloudsweepError::UnknownOperation {
                service: handle.service().to_string(),
                operation: operation.to_string(),
            }),
        }
    }
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| values.to_vec())
}

/// Server-side EC2 filters, or `None` when there are none
pub fn ec2_filters(params: &CallParams) -> Option<Vec<aws_sdk_ec2::types::Filter>> {
    if params.filters.is_empty() {
        return None;
    }
    Some(
        params
            .filters
            .iter()
            .map(|f| {
                aws_sdk_ec2::types::Filter::builder()
                    .name(&f.name)
                    .set_values(Some(f.values.clone()))
                    .build()
            })
            .collect(),
    )
}
