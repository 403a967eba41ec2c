//! SDK output → JSON documents keyed like the service APIs

use serde_json::{json, Value};

/// Accept both required (`&str`) and optional (`Option<&str>`) accessors
pub(crate) fn text<'a>(value: impl Into<Option<&'a str>>) -> Option<&'a str> {
    value.into()
}

pub(crate) fn flag(value: impl Into<Option<bool>>) -> Option<bool> {
    value.into()
}

/// Accept both `&[T]` and `Option<&[T]>` list accessors
pub(crate) fn list<'a, T>(value: impl Into<Option<&'a [T]>>) -> &'a [T] {
    value.into().unwrap_or_default()
}

fn each<T>(items: &[T], f: impl Fn(&T) -> Value) -> Vec<Value> {
    items.iter().map(f).collect()
}

pub fn users(users: &[aws_sdk_iam::types::User]) -> Value {
    json!({
        "Users": each(users, |u| json!({
            "UserName": text(u.user_name()),
            "Arn": text(u.arn()),
            "Path": text(u.path()),
        }))
    })
}

pub fn distributions(list_root: Option<&aws_sdk_cloudfront::types::DistributionList>) -> Value {
    match list_root {
        Some(root) => json!({
            "DistributionList": {
                "Items": each(list(root.items()), |d| json!({
                    "Id": text(d.id()),
                    "Enabled": flag(d.enabled()),
                }))
            }
        }),
        None => json!({ "DistributionList": null }),
    }
}

pub fn web_acls(acls: &[aws_sdk_wafv2::types::WebAclSummary]) -> Value {
    json!({
        "WebACLs": each(acls, |a| json!({
            "Name": text(a.name()),
            "Id": text(a.id()),
            "ARN": text(a.arn()),
        }))
    })
}

pub fn reservations(reservations: &[aws_sdk_ec2::types::Reservation]) -> Value {
    json!({
        "Reservations": each(reservations, |r| json!({
            "Instances": each(list(r.instances()), |i| json!({
                "InstanceId": text(i.instance_id()),
                "State": i.state().and_then(|s| s.name()).map(|n| json!({ "Name": n.as_str() })),
            }))
        }))
    })
}

pub fn vpcs(vpcs: &[aws_sdk_ec2::types::Vpc]) -> Value {
    json!({
        "Vpcs": each(vpcs, |v| json!({
            "VpcId": text(v.vpc_id()),
            "IsDefault": flag(v.is_default()),
        }))
    })
}

pub fn images(images: &[aws_sdk_ec2::types::Image]) -> Value {
    json!({
        "Images": each(images, |i| json!({
            "ImageId": text(i.image_id()),
            "Name": text(i.name()),
        }))
    })
}

pub fn snapshots(snapshots: &[aws_sdk_ec2::types::Snapshot]) -> Value {
    json!({
        "Snapshots": each(snapshots, |s| json!({ "SnapshotId": text(s.snapshot_id()) }))
    })
}

pub fn volumes(volumes: &[aws_sdk_ec2::types::Volume]) -> Value {
    json!({
        "Volumes": each(volumes, |v| json!({
            "VolumeId": text(v.volume_id()),
            "State": v.state().map(|s| s.as_str()),
        }))
    })
}

pub fn addresses(addresses: &[aws_sdk_ec2::types::Address]) -> Value {
    json!({
        "Addresses": each(addresses, |a| json!({
            "AllocationId": text(a.allocation_id()),
            "PublicIp": text(a.public_ip()),
        }))
    })
}

pub fn regions(regions: &[aws_sdk_ec2::types::Region]) -> Value {
    json!({
        "Regions": each(regions, |r| json!({
            "RegionName": text(r.region_name()),
            "OptInStatus": text(r.opt_in_status()),
        }))
    })
}

pub fn auto_scaling_groups(groups: &[aws_sdk_autoscaling::types::AutoScalingGroup]) -> Value {
    json!({
        "AutoScalingGroups": each(groups, |g| json!({
            "AutoScalingGroupName": text(g.auto_scaling_group_name()),
        }))
    })
}

pub fn keys(keys: &[aws_sdk_kms::types::KeyListEntry]) -> Value {
    json!({
        "Keys": each(keys, |k| json!({ "KeyId": text(k.key_id()) }))
    })
}

pub fn key_metadata(metadata: Option<&aws_sdk_kms::types::KeyMetadata>) -> Value {
    json!({
        "KeyMetadata": metadata.map(|m| json!({
            "KeyId": text(m.key_id()),
            "KeyManager": m.key_manager().map(|k| k.as_str()),
            "KeyState": m.key_state().map(|s| s.as_str()),
        }))
    })
}

pub fn classic_load_balancers(lbs: &[aws_sdk_elasticloadbalancing::types::LoadBalancerDescription]) -> Value {
    json!({
        "LoadBalancerDescriptions": each(lbs, |lb| json!({
            "LoadBalancerName": text(lb.load_balancer_name()),
        }))
    })
}

pub fn load_balancers(lbs: &[aws_sdk_elasticloadbalancingv2::types::LoadBalancer]) -> Value {
    json!({
        "LoadBalancers": each(lbs, |lb| json!({
            "LoadBalancerName": text(lb.load_balancer_name()),
            "LoadBalancerArn": text(lb.load_balancer_arn()),
        }))
    })
}

pub fn functions(functions: &[aws_sdk_lambda::types::FunctionConfiguration]) -> Value {
    json!({
        "Functions": each(functions, |f| json!({ "FunctionName": text(f.function_name()) }))
    })
}

pub fn secrets(secrets: &[aws_sdk_secretsmanager::types::SecretListEntry]) -> Value {
    json!({
        "SecretList": each(secrets, |s| json!({
            "Name": text(s.name()),
            "ARN": text(s.arn()),
        }))
    })
}

pub fn db_instances(instances: &[aws_sdk_rds::types::DbInstance]) -> Value {
    json!({
        "DBInstances": each(instances, |db| json!({
            "DBInstanceIdentifier": text(db.db_instance_identifier()),
        }))
    })
}

pub fn repositories(repos: &[aws_sdk_ecr::types::Repository]) -> Value {
    json!({
        "repositories": each(repos, |r| json!({ "repositoryName": text(r.repository_name()) }))
    })
}

/// Listings that are plain identifier arrays (EKS, ECS, CodeBuild)
pub fn names(key: &str, names: &[String]) -> Value {
    let mut doc = serde_json::Map::new();
    doc.insert(key.to_string(), json!(names));
    Value::Object(doc)
}
