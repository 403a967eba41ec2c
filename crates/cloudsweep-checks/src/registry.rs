//! The table of resource checks

use cloudsweep_core::{CloudsweepError, Result, Scope};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// Definition of a resource check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCheckSpec {
    /// Unique check name; doubles as display label and filter key
    pub name: String,
    /// Owning service (e.g. `ec2`)
    pub service: String,
    /// Global or per-region
    pub scope: Scope,
    /// Listing operation
    pub operation: String,
    /// Top-level key of the listing in the response document
    pub result_key: String,
}

impl ResourceCheckSpec {
    pub fn new(
        name: impl Into<String>,
        service: impl Into<String>,
        scope: Scope,
        operation: impl Into<String>,
        result_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            service: service.into(),
            scope,
            operation: operation.into(),
            result_key: result_key.into(),
        }
    }

    /// A check issued once from the anchor region
    pub fn global(
        name: impl Into<String>,
        service: impl Into<String>,
        operation: impl Into<String>,
        result_key: impl Into<String>,
    ) -> Self {
        Self::new(name, service, Scope::Global, operation, result_key)
    }

    /// A check issued in every enabled region
    pub fn regional(
        name: impl Into<String>,
        service: impl Into<String>,
        operation: impl Into<String>,
        result_key: impl Into<String>,
    ) -> Self {
        Self::new(name, service, Scope::Regional, operation, result_key)
    }
}

// (name, service, scope, operation, result key)
const BUILTIN_CHECKS: &[(&str, &str, Scope, &str, &str)] = &[
    // Global services
    ("IAM Users", "iam", Scope::Global, "list_users", "Users"),
    ("CloudFront (Enabled)", "cloudfront", Scope::Global, "list_distributions", "DistributionList"),
    ("WAFv2 ACLs (Global)", "wafv2", Scope::Global, "list_web_acls", "WebACLs"),
    // Regional services
    ("EC2 Instances", "ec2", Scope::Regional, "describe_instances", "Reservations"),
    ("VPC", "ec2", Scope::Regional, "describe_vpcs", "Vpcs"),
    ("AMI", "ec2", Scope::Regional, "describe_images", "Images"),
    ("EBS Snapshots", "ec2", Scope::Regional, "describe_snapshots", "Snapshots"),
    ("EBS Volumes", "ec2", Scope::Regional, "describe_volumes", "Volumes"),
    ("EIP", "ec2", Scope::Regional, "describe_addresses", "Addresses"),
    ("AutoScalingGroups", "autoscaling", Scope::Regional, "describe_auto_scaling_groups", "AutoScalingGroups"),
    ("KMS Keys (Disabled CMK)", "kms", Scope::Regional, "list_keys", "Keys"),
    ("ELB (v1)", "elb", Scope::Regional, "describe_load_balancers", "LoadBalancerDescriptions"),
    ("ELB (v2)", "elbv2", Scope::Regional, "describe_load_balancers", "LoadBalancers"),
    ("EKS Clusters", "eks", Scope::Regional, "list_clusters", "clusters"),
    ("Lambda", "lambda", Scope::Regional, "list_functions", "Functions"),
    ("SecretManager", "secretsmanager", Scope::Regional, "list_secrets", "SecretList"),
    ("RDS", "rds", Scope::Regional, "describe_db_instances", "DBInstances"),
    ("ECS Clusters", "ecs", Scope::Regional, "list_clusters", "clusterArns"),
    ("ECR Repos", "ecr", Scope::Regional, "describe_repositories", "repositories"),
    ("CodeBuild", "codebuild", Scope::Regional, "list_projects", "projects"),
    ("WAFv2 ACLs (Regional)", "wafv2", Scope::Regional, "list_web_acls", "WebACLs"),
];

/// Ordered, immutable collection of resource checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRegistry {
    checks: Vec<ResourceCheckSpec>,
}

impl CheckRegistry {
    /// Build a registry, rejecting duplicate names
    pub fn new(checks: Vec<ResourceCheckSpec>) -> Result<Self> {
        let mut seen = HashSet::new();
        for check in &checks {
            if !seen.insert(check.name.as_str()) {
                return Err(CloudsweepError::Config(format!(
                    "duplicate check name: {}",
                    check.name
                )));
            }
        }
        Ok(Self { checks })
    }

    /// The curated set of checks shipped with cloudsweep
    pub fn builtin() -> Self {
        let checks = BUILTIN_CHECKS
            .iter()
            .map(|(name, service, scope, operation, key)| {
                ResourceCheckSpec::new(*name, *service, *scope, *operation, *key)
            })
            .collect();
        Self { checks }
    }

    pub fn checks(&self) -> &[ResourceCheckSpec] {
        &self.checks
    }

    pub fn get(&self, name: &str) -> Option<&ResourceCheckSpec> {
        self.checks.iter().find(|c| c.name == name)
    }

    pub fn filter_by_scope(&self, scope: Scope) -> Vec<&ResourceCheckSpec> {
        self.checks.iter().filter(|c| c.scope == scope).collect()
    }

    /// Derive a registry without the named checks. Unknown names are logged.
    pub fn without(&self, names: &[String]) -> Self {
        for name in names {
            if self.get(name).is_none() {
                warn!("Cannot skip unknown check: {}", name);
            }
        }
        Self {
            checks: self
                .checks
                .iter()
                .filter(|c| !names.contains(&c.name))
                .cloned()
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_are_unique() {
        let builtin = CheckRegistry::builtin();
        assert_eq!(builtin.len(), 21);
        assert!(CheckRegistry::new(builtin.checks().to_vec()).is_ok());
    }

    #[test]
    fn test_builtin_scopes() {
        let builtin = CheckRegistry::builtin();
        let global: Vec<_> = builtin
            .filter_by_scope(Scope::Global)
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(global, vec!["IAM Users", "CloudFront (Enabled)", "WAFv2 ACLs (Global)"]);
        assert_eq!(builtin.get("KMS Keys (Disabled CMK)").map(|c| c.scope), Some(Scope::Regional));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let checks = vec![
            ResourceCheckSpec::regional("Lambda", "lambda", "list_functions", "Functions"),
            ResourceCheckSpec::regional("Lambda", "lambda", "list_functions", "Functions"),
        ];
        assert!(matches!(CheckRegistry::new(checks), Err(CloudsweepError::Config(_))));
    }

    #[test]
    fn test_without_keeps_order() {
        let builtin = CheckRegistry::builtin();
        let trimmed = builtin.without(&["VPC".to_string(), "No Such Check".to_string()]);

        assert_eq!(trimmed.len(), builtin.len() - 1);
        assert!(trimmed.get("VPC").is_none());
        assert_eq!(trimmed.checks()[0].name, "IAM Users");
        assert_eq!(trimmed.checks()[3].name, "EC2 Instances");
        assert_eq!(trimmed.checks()[4].name, "AMI");
    }
}
