//! Per-resource filters that decide whether a listing is worth reporting
//!
//! Every check name maps to a [`ResourceFilter`]. Names without an entry in the
//! [`FilterTable`] use [`CountAll`]: a non-empty listing is a finding whose
//! count is the listing length.

use crate::registry::ResourceCheckSpec;
use cloudsweep_core::{CallParams, CloudsweepError, Finding, Result, ServiceClient};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Instance lifecycle states that still cost money or expose something
pub const LIVE_INSTANCE_STATES: [&str; 4] = ["pending", "running", "stopping", "stopped"];

/// Everything a filter may look at for one task
pub struct FilterInput<'a> {
    /// Check being evaluated
    pub spec: &'a ResourceCheckSpec,
    /// Region the listing came from
    pub region: &'a str,
    /// Raw listing response
    pub response: &'a Value,
    /// Client the listing was issued with, for follow-up lookups
    pub client: &'a dyn ServiceClient,
}

impl<'a> FilterInput<'a> {
    /// Entries under the check's result key
    pub fn items(&self) -> Result<&'a [Value]> {
        list_at(self.response, &self.spec.result_key)
    }

    /// A finding for this task with the given count
    pub fn finding(&self, count: usize) -> Finding {
        Finding::new(&self.spec.name, self.region, self.spec.scope, count)
    }

    /// `Some(finding)` when `count` is non-zero
    pub fn finding_if_any(&self, count: usize) -> Option<Finding> {
        (count > 0).then(|| self.finding(count))
    }
}

/// Read `document[key]` as a list. Missing or null keys are an empty listing.
pub fn list_at<'a>(document: &'a Value, key: &str) -> Result<&'a [Value]> {
    match document.get(key) {
        None | Some(Value::Null) => Ok(&[][..]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(other) => Err(CloudsweepError::malformed(
            key,
            format!("expected a list, found {}", json_kind(other)),
        )),
    }
}

/// Read `document[key]` as an object. Missing or null keys are `None`.
pub fn object_at<'a>(document: &'a Value, key: &str) -> Result<Option<&'a Value>> {
    match document.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(object @ Value::Object(_)) => Ok(Some(object)),
        Some(other) => Err(CloudsweepError::malformed(
            key,
            format!("expected an object, found {}", json_kind(other)),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Decision logic for one resource type
pub trait ResourceFilter: Send + Sync {
    /// Parameters for the listing call
    fn params(&self) -> CallParams {
        CallParams::default()
    }

    /// Turn a listing into a finding, or `None` when there is nothing to report
    fn evaluate(&self, input: &FilterInput<'_>) -> Result<Option<Finding>>;
}

/// Default rule: any entry is reportable
#[derive(Debug, Clone, Copy, Default)]
pub struct CountAll;

impl ResourceFilter for CountAll {
    fn evaluate(&self, input: &FilterInput<'_>) -> Result<Option<Finding>> {
        Ok(input.finding_if_any(input.items()?.len()))
    }
}

/// Identity users, excluding service-linked entries; names go in the detail
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountUsers;

impl AccountUsers {
    fn is_service_linked(user: &Value) -> bool {
        let arn = user.get("Arn").and_then(Value::as_str).unwrap_or_default();
        let path = user.get("Path").and_then(Value::as_str).unwrap_or_default();
        arn.contains("AWSServiceRole")
            || arn.contains("/aws-service-role/")
            || path.starts_with("/aws-service-role/")
    }
}

impl ResourceFilter for AccountUsers {
    fn evaluate(&self, input: &FilterInput<'_>) -> Result<Option<Finding>> {
        let names: Vec<&str> = input
            .items()?
            .iter()
            .filter(|user| !Self::is_service_linked(user))
            .map(|user| {
                user.get("UserName")
                    .or_else(|| user.get("Arn"))
                    .and_then(Value::as_str)
                    .unwrap_or("<unnamed>")
            })
            .collect();

        Ok(input
            .finding_if_any(names.len())
            .map(|f| f.with_detail(names.join(", "))))
    }
}

/// Edge distributions that are currently enabled
#[derive(Debug, Clone, Copy, Default)]
pub struct EnabledDistributions;

impl ResourceFilter for EnabledDistributions {
    fn evaluate(&self, input: &FilterInput<'_>) -> Result<Option<Finding>> {
        let items = match object_at(input.response, &input.spec.result_key)? {
            Some(list) => list_at(list, "Items")?,
            None => &[][..],
        };
        let enabled = items
            .iter()
            .filter(|d| d.get("Enabled").and_then(Value::as_bool) == Some(true))
            .count();
        Ok(input.finding_if_any(enabled))
    }
}

/// Customer-managed keys in exactly the `Disabled` state.
///
/// Each key costs one `describe_key` call. A lookup that fails with a provider
/// error only drops that key.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCustomerKeys;

impl DisabledCustomerKeys {
    fn is_disabled_customer_key(metadata: &Value) -> bool {
        metadata.get("KeyManager").and_then(Value::as_str) == Some("CUSTOMER")
            && metadata.get("KeyState").and_then(Value::as_str) == Some("Disabled")
    }
}

impl ResourceFilter for DisabledCustomerKeys {
    fn evaluate(&self, input: &FilterInput<'_>) -> Result<Option<Finding>> {
        let mut disabled = 0;

        for key in input.items()? {
            let Some(key_id) = key.get("KeyId").and_then(Value::as_str) else {
                continue;
            };

            match input
                .client
                .invoke("describe_key", &CallParams::new().resource(key_id))
            {
                Ok(described) => {
                    if described
                        .get("KeyMetadata")
                        .is_some_and(Self::is_disabled_customer_key)
                    {
                        disabled += 1;
                    }
                }
                Err(e) if e.is_provider_error() => {
                    debug!("describe_key {} in {} skipped: {}", key_id, input.region, e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(input.finding_if_any(disabled))
    }
}

/// Listing issued with a service-specific scope (web ACLs)
#[derive(Debug, Clone, Copy)]
pub struct ScopedListing {
    scope: &'static str,
}

impl ScopedListing {
    /// Web ACLs attached to edge distributions
    pub const EDGE: Self = Self { scope: "CLOUDFRONT" };
    /// Web ACLs attached to regional resources
    pub const REGIONAL: Self = Self { scope: "REGIONAL" };
}

impl ResourceFilter for ScopedListing {
    fn params(&self) -> CallParams {
        CallParams::new().scope(self.scope)
    }

    fn evaluate(&self, input: &FilterInput<'_>) -> Result<Option<Finding>> {
        CountAll.evaluate(input)
    }
}

/// Images and snapshots owned by the account itself
#[derive(Debug, Clone, Copy, Default)]
pub struct SelfOwned;

impl ResourceFilter for SelfOwned {
    fn params(&self) -> CallParams {
        CallParams::new().owner("self")
    }

    fn evaluate(&self, input: &FilterInput<'_>) -> Result<Option<Finding>> {
        CountAll.evaluate(input)
    }
}

/// Virtual networks other than the default one
#[derive(Debug, Clone, Copy, Default)]
pub struct NonDefaultNetworks;

impl ResourceFilter for NonDefaultNetworks {
    fn params(&self) -> CallParams {
        CallParams::new().filter("is-default", ["false"])
    }

    fn evaluate(&self, input: &FilterInput<'_>) -> Result<Option<Finding>> {
        let count = input
            .items()?
            .iter()
            .filter(|vpc| vpc.get("IsDefault").and_then(Value::as_bool) != Some(true))
            .count();
        Ok(input.finding_if_any(count))
    }
}

/// Instances that are not terminated, counted across reservations
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveInstances;

impl LiveInstances {
    fn is_live(instance: &Value) -> bool {
        match instance
            .get("State")
            .and_then(|s| s.get("Name"))
            .and_then(Value::as_str)
        {
            Some(state) => LIVE_INSTANCE_STATES.contains(&state),
            None => true,
        }
    }
}

impl ResourceFilter for LiveInstances {
    fn params(&self) -> CallParams {
        CallParams::new().filter("instance-state-name", LIVE_INSTANCE_STATES)
    }

    fn evaluate(&self, input: &FilterInput<'_>) -> Result<Option<Finding>> {
        let mut count = 0;
        for reservation in input.items()? {
            if !reservation.is_object() {
                return Err(CloudsweepError::malformed(
                    &input.spec.result_key,
                    format!("expected reservations, found {}", json_kind(reservation)),
                ));
            }
            count += list_at(reservation, "Instances")?
                .iter()
                .filter(|instance| Self::is_live(instance))
                .count();
        }
        Ok(input.finding_if_any(count))
    }
}

/// Mapping from check name to filter, with [`CountAll`] as the fallback
pub struct FilterTable {
    filters: HashMap<String, Box<dyn ResourceFilter>>,
    fallback: CountAll,
}

impl FilterTable {
    /// A table with no special cases
    pub fn new() -> Self {
        Self {
            filters: HashMap::new(),
            fallback: CountAll,
        }
    }

    /// Special cases for the built-in checks
    pub fn builtin() -> Self {
        Self::new()
            .with("IAM Users", AccountUsers)
            .with("CloudFront (Enabled)", EnabledDistributions)
            .with("KMS Keys (Disabled CMK)", DisabledCustomerKeys)
            .with("WAFv2 ACLs (Global)", ScopedListing::EDGE)
            .with("WAFv2 ACLs (Regional)", ScopedListing::REGIONAL)
            .with("AMI", SelfOwned)
            .with("EBS Snapshots", SelfOwned)
            .with("VPC", NonDefaultNetworks)
            .with("EC2 Instances", LiveInstances)
    }

    /// Register `filter` for the check called `name`
    pub fn with(mut self, name: impl Into<String>, filter: impl ResourceFilter + 'static) -> Self {
        self.filters.insert(name.into(), Box::new(filter));
        self
    }

    /// Filter for `name`, falling back to [`CountAll`]
    pub fn get(&self, name: &str) -> &dyn ResourceFilter {
        self.filters
            .get(name)
            .map(|f| f.as_ref())
            .unwrap_or(&self.fallback)
    }

    /// Whether `name` has a special-case rule
    pub fn has_rule(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }
}

impl Default for FilterTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CheckRegistry;
    use cloudsweep_core::testing::{access_denied, MockSession};
    use cloudsweep_core::{CloudSession, Scope};
    use serde_json::json;

    fn evaluate(name: &str, region: &str, response: Value, session: &MockSession) -> Result<Option<Finding>> {
        let registry = CheckRegistry::builtin();
        let spec = registry.get(name).unwrap();
        let client = session.client(&spec.service, region).unwrap();
        let input = FilterInput {
            spec,
            region,
            response: &response,
            client: client.as_ref(),
        };
        FilterTable::builtin().get(name).evaluate(&input)
    }

    #[test]
    fn test_default_rule_counts_entries() {
        let session = MockSession::new();
        let finding = evaluate(
            "Lambda",
            "eu-west-1",
            json!({"Functions": [{"FunctionName": "a"}, {"FunctionName": "b"}]}),
            &session,
        )
        .unwrap()
        .unwrap();
        assert_eq!(finding.count, 2);
        assert_eq!(finding.summary(), "Lambda found: 2 (eu-west-1)");

        let empty = evaluate("Lambda", "eu-west-1", json!({"Functions": []}), &session).unwrap();
        assert!(empty.is_none());
        let missing = evaluate("Lambda", "eu-west-1", json!({}), &session).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        let session = MockSession::new();
        let err = evaluate("Lambda", "eu-west-1", json!({"Functions": {"a": 1}}), &session).unwrap_err();
        assert!(matches!(err, CloudsweepError::MalformedResponse { .. }));
        assert!(!err.is_provider_error());
    }

    #[test]
    fn test_service_linked_users_excluded() {
        let session = MockSession::new();
        let response = json!({"Users": [
            {"UserName": "alice", "Arn": "arn:aws:iam::123456789012:user/alice"},
            {"UserName": "AWSServiceRoleForSupport", "Arn": "arn:aws:iam::123456789012:role/aws-service-role/support.amazonaws.com/AWSServiceRoleForSupport"},
            {"UserName": "bob", "Arn": "arn:aws:iam::123456789012:user/bob"},
        ]});

        let finding = evaluate("IAM Users", "us-east-1", response, &session).unwrap().unwrap();
        assert_eq!(finding.count, 2);
        assert_eq!(finding.detail.as_deref(), Some("alice, bob"));
        assert_eq!(finding.scope, Scope::Global);
        assert_eq!(finding.summary(), "IAM Users found: 2 (alice, bob)");
    }

    #[test]
    fn test_only_service_linked_users_is_clean() {
        let session = MockSession::new();
        let response = json!({"Users": [
            {"UserName": "svc", "Arn": "arn:aws:iam::1:role/AWSServiceRoleForECS"},
        ]});
        assert!(evaluate("IAM Users", "us-east-1", response, &session).unwrap().is_none());
    }

    #[test]
    fn test_only_enabled_distributions_counted() {
        let session = MockSession::new();
        let response = json!({"DistributionList": {"Items": [
            {"Id": "E1", "Enabled": true},
            {"Id": "E2", "Enabled": false},
        ]}});
        let finding = evaluate("CloudFront (Enabled)", "us-east-1", response, &session)
            .unwrap()
            .unwrap();
        assert_eq!(finding.summary(), "CloudFront (Enabled) found: 1");

        let none = evaluate(
            "CloudFront (Enabled)",
            "us-east-1",
            json!({"DistributionList": {"Quantity": 0}}),
            &session,
        )
        .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_disabled_customer_keys() {
        let session = MockSession::new()
            .respond_for("kms", "describe_key", "k-disabled", json!({"KeyMetadata": {"KeyManager": "CUSTOMER", "KeyState": "Disabled"}}))
            .respond_for("kms", "describe_key", "k-pending", json!({"KeyMetadata": {"KeyManager": "CUSTOMER", "KeyState": "PendingDeletion"}}))
            .respond_for("kms", "describe_key", "k-enabled", json!({"KeyMetadata": {"KeyManager": "CUSTOMER", "KeyState": "Enabled"}}))
            .respond_for("kms", "describe_key", "k-aws", json!({"KeyMetadata": {"KeyManager": "AWS", "KeyState": "Disabled"}}))
            .fail_for("kms", "describe_key", "k-denied", access_denied());

        let response = json!({"Keys": [
            {"KeyId": "k-disabled"}, {"KeyId": "k-pending"}, {"KeyId": "k-enabled"},
            {"KeyId": "k-aws"}, {"KeyId": "k-denied"},
        ]});
        let finding = evaluate("KMS Keys (Disabled CMK)", "ap-northeast-2", response, &session)
            .unwrap()
            .unwrap();
        assert_eq!(finding.count, 1);
        assert_eq!(session.calls_to("kms", "describe_key").len(), 5);
    }

    #[test]
    fn test_pending_deletion_key_never_counted() {
        let session = MockSession::new().respond_for(
            "kms",
            "describe_key",
            "k-pending",
            json!({"KeyMetadata": {"KeyManager": "CUSTOMER", "KeyState": "PendingDeletion"}}),
        );
        let response = json!({"Keys": [{"KeyId": "k-pending"}]});
        assert!(evaluate("KMS Keys (Disabled CMK)", "us-west-2", response, &session)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_live_instances_across_reservations() {
        let session = MockSession::new();
        let response = json!({"Reservations": [
            {"Instances": [
                {"InstanceId": "i-1", "State": {"Name": "running"}},
                {"InstanceId": "i-2", "State": {"Name": "terminated"}},
            ]},
            {"Instances": [{"InstanceId": "i-3", "State": {"Name": "stopped"}}]},
        ]});
        let finding = evaluate("EC2 Instances", "eu-north-1", response, &session).unwrap().unwrap();
        assert_eq!(finding.count, 2);
    }

    #[test]
    fn test_nested_wrong_shape_is_malformed() {
        let session = MockSession::new();
        let err = evaluate(
            "CloudFront (Enabled)",
            "us-east-1",
            json!({"DistributionList": [{"Enabled": true}]}),
            &session,
        )
        .unwrap_err();
        assert!(matches!(err, CloudsweepError::MalformedResponse { .. }));

        let err = evaluate("EC2 Instances", "eu-north-1", json!({"Reservations": ["x"]}), &session).unwrap_err();
        assert!(matches!(err, CloudsweepError::MalformedResponse { .. }));
        assert!(!err.is_provider_error());
    }

    #[test]
    fn test_default_vpc_dropped() {
        let session = MockSession::new();
        let response = json!({"Vpcs": [
            {"VpcId": "vpc-default", "IsDefault": true},
            {"VpcId": "vpc-lab", "IsDefault": false},
        ]});
        let finding = evaluate("VPC", "eu-north-1", response, &session).unwrap().unwrap();
        assert_eq!(finding.count, 1);
    }

    #[test]
    fn test_request_params() {
        let table = FilterTable::builtin();
        assert_eq!(table.get("AMI").params().owners, vec!["self".to_string()]);
        assert_eq!(table.get("EBS Snapshots").params().owners, vec!["self".to_string()]);
        assert_eq!(table.get("WAFv2 ACLs (Global)").params().scope.as_deref(), Some("CLOUDFRONT"));
        assert_eq!(table.get("WAFv2 ACLs (Regional)").params().scope.as_deref(), Some("REGIONAL"));
        assert_eq!(
            table.get("VPC").params().filter_values("is-default"),
            Some(&["false".to_string()][..])
        );
        assert_eq!(
            table.get("EC2 Instances").params().filter_values("instance-state-name").map(|v| v.len()),
            Some(4)
        );
        assert_eq!(table.get("Lambda").params(), CallParams::default());
        assert!(!table.has_rule("Lambda"));
    }
}
