//! AWS implementation of the CloudInspector facade
//!
//! One thin, stateless mapping per trait method: build the service client,
//! make one call, normalize the response into engine records, classify the
//! failure. No retries here - isolation and caching live in the engine.
//!
//! Regional clients are constructed per call from a region-scoped config;
//! account-wide services (STS, S3, Cost Explorer) use the base config.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ec2::error::{ProvideErrorMetadata, SdkError};
use aws_types::region::Region;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, warn};

use cumulo_core::{
    AccountId, AccountIdentity, CloudInspector, CommitmentSource, CommitmentUtilization, CostLine,
    Finding, ProviderError, Recommendation, RegionId, ResourceDetails, ResourceFamily,
    ResourceRecord, ResourceState, Result, Severity,
};

/// Page size for the cheap existence checks. DescribeInstances rejects
/// anything below 5.
const EXISTENCE_PAGE_SIZE: i32 = 5;

/// Findings fetched per regional security scan
const FINDINGS_PAGE_SIZE: i32 = 100;

/// CloudInspector backed by the AWS SDK
pub struct AwsInspector {
    base: aws_config::SdkConfig,
}

impl AwsInspector {
    /// Create an inspector from the environment's default credentials chain
    pub async fn new() -> Self {
        let base = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self { base }
    }

    /// Create from an already-loaded AWS config
    pub fn from_config(base: aws_config::SdkConfig) -> Self {
        Self { base }
    }

    async fn region_config(&self, region: &RegionId) -> aws_config::SdkConfig {
        debug!(region = %region, "building region-scoped AWS config");
        aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await
    }

    async fn list_instances(&self, region: &RegionId) -> Result<Vec<ResourceRecord>> {
        let config = self.region_config(region).await;
        let client = aws_sdk_ec2::Client::new(&config);
        let response = client
            .describe_instances()
            .send()
            .await
            .map_err(|e| map_sdk("describe instances", e))?;

        let mut records = Vec::new();
        for reservation in response.reservations() {
            for instance in reservation.instances() {
                let Some(id) = instance.instance_id() else {
                    continue;
                };
                let name = instance
                    .tags()
                    .iter()
                    .find(|tag| tag.key() == Some("Name"))
                    .and_then(|tag| tag.value())
                    .unwrap_or(id)
                    .to_string();
                let state = instance
                    .state()
                    .and_then(|s| s.name())
                    .map(|name| match name {
                        aws_sdk_ec2::types::InstanceStateName::Running => ResourceState::Running,
                        aws_sdk_ec2::types::InstanceStateName::Stopped => ResourceState::Stopped,
                        aws_sdk_ec2::types::InstanceStateName::Terminated
                        | aws_sdk_ec2::types::InstanceStateName::ShuttingDown => {
                            ResourceState::Terminated
                        }
                        _ => ResourceState::Unknown,
                    })
                    .unwrap_or(ResourceState::Unknown);
                let instance_type = instance
                    .instance_type()
                    .map(|t| t.as_str().to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let spot = instance
                    .instance_lifecycle()
                    .map(|lifecycle| lifecycle.as_str() == "spot")
                    .unwrap_or(false);

                records.push(ResourceRecord {
                    id: id.to_string(),
                    name,
                    family: ResourceFamily::Compute,
                    region: region.clone(),
                    state,
                    created_at: instance.launch_time().and_then(to_chrono),
                    details: ResourceDetails::Compute {
                        instance_type,
                        spot,
                    },
                });
            }
        }
        Ok(records)
    }

    async fn list_volumes(&self, region: &RegionId) -> Result<Vec<ResourceRecord>> {
        let config = self.region_config(region).await;
        let client = aws_sdk_ec2::Client::new(&config);
        let response = client
            .describe_volumes()
            .send()
            .await
            .map_err(|e| map_sdk("describe volumes", e))?;

        let mut records = Vec::new();
        for volume in response.volumes() {
            let Some(id) = volume.volume_id() else {
                continue;
            };
            let state = volume
                .state()
                .map(|s| match s {
                    aws_sdk_ec2::types::VolumeState::InUse => ResourceState::Running,
                    aws_sdk_ec2::types::VolumeState::Available => ResourceState::Available,
                    _ => ResourceState::Unknown,
                })
                .unwrap_or(ResourceState::Unknown);

            records.push(ResourceRecord {
                id: id.to_string(),
                name: id.to_string(),
                family: ResourceFamily::BlockStorage,
                region: region.clone(),
                state,
                created_at: volume.create_time().and_then(to_chrono),
                details: ResourceDetails::BlockStorage {
                    size_gb: volume.size().unwrap_or(0),
                    volume_type: volume
                        .volume_type()
                        .map(|t| t.as_str().to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                    encrypted: volume.encrypted().unwrap_or(false),
                    attached: !volume.attachments().is_empty(),
                },
            });
        }
        Ok(records)
    }

    async fn list_db_instances(&self, region: &RegionId) -> Result<Vec<ResourceRecord>> {
        let config = self.region_config(region).await;
        let client = aws_sdk_rds::Client::new(&config);
        let response = client
            .describe_db_instances()
            .send()
            .await
            .map_err(|e| map_sdk("describe db instances", e))?;

        let mut records = Vec::new();
        for db in response.db_instances() {
            let Some(id) = db.db_instance_identifier() else {
                continue;
            };
            let state = match db.db_instance_status() {
                Some("available") => ResourceState::Available,
                Some("stopped") => ResourceState::Stopped,
                _ => ResourceState::Unknown,
            };

            records.push(ResourceRecord {
                id: id.to_string(),
                name: id.to_string(),
                family: ResourceFamily::Database,
                region: region.clone(),
                state,
                created_at: db.instance_create_time().and_then(to_chrono),
                details: ResourceDetails::Database {
                    engine: db.engine().unwrap_or("unknown").to_string(),
                    instance_class: db.db_instance_class().unwrap_or("unknown").to_string(),
                },
            });
        }
        Ok(records)
    }

    async fn list_functions_in(&self, region: &RegionId) -> Result<Vec<ResourceRecord>> {
        let config = self.region_config(region).await;
        let client = aws_sdk_lambda::Client::new(&config);
        let response = client
            .list_functions()
            .send()
            .await
            .map_err(|e| map_sdk("list functions", e))?;

        let mut records = Vec::new();
        for function in response.functions() {
            let Some(name) = function.function_name() else {
                continue;
            };
            let created_at = function
                .last_modified()
                .and_then(|stamp| DateTime::parse_from_rfc3339(stamp).ok())
                .map(|dt| dt.with_timezone(&Utc));

            records.push(ResourceRecord {
                id: name.to_string(),
                name: name.to_string(),
                family: ResourceFamily::Serverless,
                region: region.clone(),
                state: ResourceState::Available,
                created_at,
                details: ResourceDetails::Serverless {
                    runtime: function
                        .runtime()
                        .map(|r| r.as_str().to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                    memory_mb: function.memory_size().unwrap_or(0),
                },
            });
        }
        Ok(records)
    }

    async fn list_clusters_in(&self, region: &RegionId) -> Result<Vec<ResourceRecord>> {
        let config = self.region_config(region).await;
        let client = aws_sdk_eks::Client::new(&config);
        let response = client
            .list_clusters()
            .send()
            .await
            .map_err(|e| map_sdk("list clusters", e))?;

        let mut records = Vec::new();
        for name in response.clusters() {
            let (version, state, created_at) = match client
                .describe_cluster()
                .name(name)
                .send()
                .await
            {
                Ok(described) => {
                    let cluster = described.cluster();
                    (
                        cluster
                            .and_then(|c| c.version())
                            .unwrap_or("unknown")
                            .to_string(),
                        cluster
                            .and_then(|c| c.status())
                            .map(|status| match status {
                                aws_sdk_eks::types::ClusterStatus::Active => ResourceState::Running,
                                _ => ResourceState::Unknown,
                            })
                            .unwrap_or(ResourceState::Unknown),
                        cluster.and_then(|c| c.created_at()).and_then(to_chrono),
                    )
                }
                Err(e) => {
                    warn!(cluster = %name, error = %map_sdk("describe cluster", e), "listing cluster without detail");
                    ("unknown".to_string(), ResourceState::Unknown, None)
                }
            };

            records.push(ResourceRecord {
                id: name.to_string(),
                name: name.to_string(),
                family: ResourceFamily::Cluster,
                region: region.clone(),
                state,
                created_at,
                details: ResourceDetails::Cluster { version },
            });
        }
        Ok(records)
    }

    async fn reserved_instance_utilization(
        &self,
        account: &AccountId,
    ) -> Result<CommitmentUtilization> {
        let client = aws_sdk_costexplorer::Client::new(&self.base);
        let period = month_window()?;

        let utilization = client
            .get_reservation_utilization()
            .time_period(period.clone())
            .send()
            .await
            .map_err(|e| map_sdk("reservation utilization", e))?;
        let utilization_pct = utilization
            .total()
            .and_then(|total| total.utilization_percentage())
            .and_then(parse_pct);

        let coverage = client
            .get_reservation_coverage()
            .time_period(period)
            .send()
            .await
            .map_err(|e| map_sdk("reservation coverage", e))?;
        let coverage_pct = coverage
            .total()
            .and_then(|total| total.coverage_hours())
            .and_then(|hours| hours.coverage_hours_percentage())
            .and_then(parse_pct);

        let active_commitments = self.count_active_reserved_instances(account).await?;

        Ok(CommitmentUtilization {
            source: CommitmentSource::ReservedInstances,
            utilization_pct,
            coverage_pct,
            active_commitments,
        })
    }

    async fn count_active_reserved_instances(&self, _account: &AccountId) -> Result<u32> {
        let client = aws_sdk_ec2::Client::new(&self.base);
        let response = client
            .describe_reserved_instances()
            .filters(
                aws_sdk_ec2::types::Filter::builder()
                    .name("state")
                    .values("active")
                    .build(),
            )
            .send()
            .await
            .map_err(|e| map_sdk("describe reserved instances", e))?;
        Ok(response.reserved_instances().len() as u32)
    }

    async fn savings_plans_utilization(&self) -> Result<CommitmentUtilization> {
        let client = aws_sdk_costexplorer::Client::new(&self.base);
        let period = month_window()?;

        let response = client
            .get_savings_plans_utilization()
            .time_period(period)
            .send()
            .await
            .map_err(|e| map_sdk("savings plans utilization", e))?;
        let utilization_pct = response
            .total()
            .and_then(|total| total.utilization())
            .and_then(|utilization| utilization.utilization_percentage())
            .and_then(parse_pct);

        Ok(CommitmentUtilization {
            source: CommitmentSource::SavingsPlans,
            utilization_pct,
            // The savings-plans API reports coverage per plan, not as one
            // account-wide percentage; the merge step falls back to the
            // reserved-instance signal
            coverage_pct: None,
            active_commitments: 0,
        })
    }

    async fn costs_for_region_value(
        &self,
        region_value: &str,
        region: Option<&RegionId>,
    ) -> Result<Vec<CostLine>> {
        use aws_sdk_costexplorer::types::{
            Dimension, DimensionValues, Expression, Granularity, GroupDefinition,
            GroupDefinitionType,
        };

        let client = aws_sdk_costexplorer::Client::new(&self.base);
        let response = client
            .get_cost_and_usage()
            .time_period(month_window()?)
            .granularity(Granularity::Monthly)
            .metrics("UnblendedCost")
            .group_by(
                GroupDefinition::builder()
                    .r#type(GroupDefinitionType::Dimension)
                    .key("SERVICE")
                    .build(),
            )
            .filter(
                Expression::builder()
                    .dimensions(
                        DimensionValues::builder()
                            .key(Dimension::Region)
                            .values(region_value)
                            .build(),
                    )
                    .build(),
            )
            .send()
            .await
            .map_err(|e| map_sdk("cost and usage", e))?;

        let mut lines = Vec::new();
        for window in response.results_by_time() {
            for group in window.groups() {
                let service = group
                    .keys()
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string());
                let amount_usd = group
                    .metrics()
                    .and_then(|metrics| metrics.get("UnblendedCost"))
                    .and_then(|value| value.amount())
                    .and_then(|amount| amount.parse::<f64>().ok());
                lines.push(CostLine {
                    service,
                    region: region.cloned(),
                    amount_usd,
                });
            }
        }
        Ok(lines)
    }
}

#[async_trait]
impl CloudInspector for AwsInspector {
    async fn resolve_account(&self, account: &AccountId) -> Result<AccountIdentity> {
        let client = aws_sdk_sts::Client::new(&self.base);
        let identity = client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| map_sdk("resolve caller identity", e))?;

        let resolved = identity.account().unwrap_or_default();
        if resolved != account.0 {
            return Err(ProviderError::AccountNotFound(format!(
                "credentials resolve to account {resolved}, not {account}"
            )));
        }

        Ok(AccountIdentity {
            account: AccountId::new(resolved),
            arn: identity.arn().unwrap_or_default().to_string(),
            alias: None,
        })
    }

    async fn list_regions(&self, _account: &AccountId) -> Result<Vec<RegionId>> {
        let client = aws_sdk_ec2::Client::new(&self.base);
        let response = client
            .describe_regions()
            .all_regions(false)
            .send()
            .await
            .map_err(|e| map_sdk("describe regions", e))?;

        Ok(response
            .regions()
            .iter()
            .filter_map(|region| region.region_name().map(RegionId::new))
            .collect())
    }

    async fn has_compute(&self, _account: &AccountId, region: &RegionId) -> Result<bool> {
        let config = self.region_config(region).await;
        let client = aws_sdk_ec2::Client::new(&config);
        let response = client
            .describe_instances()
            .max_results(EXISTENCE_PAGE_SIZE)
            .send()
            .await
            .map_err(|e| map_sdk("probe compute", e))?;
        Ok(!response.reservations().is_empty())
    }

    async fn has_databases(&self, _account: &AccountId, region: &RegionId) -> Result<bool> {
        let config = self.region_config(region).await;
        let client = aws_sdk_rds::Client::new(&config);
        let response = client
            .describe_db_instances()
            .max_records(20)
            .send()
            .await
            .map_err(|e| map_sdk("probe databases", e))?;
        Ok(!response.db_instances().is_empty())
    }

    async fn has_functions(&self, _account: &AccountId, region: &RegionId) -> Result<bool> {
        let config = self.region_config(region).await;
        let client = aws_sdk_lambda::Client::new(&config);
        let response = client
            .list_functions()
            .max_items(1)
            .send()
            .await
            .map_err(|e| map_sdk("probe functions", e))?;
        Ok(!response.functions().is_empty())
    }

    async fn has_clusters(&self, _account: &AccountId, region: &RegionId) -> Result<bool> {
        let config = self.region_config(region).await;
        let client = aws_sdk_eks::Client::new(&config);
        let response = client
            .list_clusters()
            .max_results(1)
            .send()
            .await
            .map_err(|e| map_sdk("probe clusters", e))?;
        Ok(!response.clusters().is_empty())
    }

    async fn storage_regions(&self, _account: &AccountId) -> Result<HashSet<RegionId>> {
        let client = aws_sdk_s3::Client::new(&self.base);
        let response = client
            .list_buckets()
            .send()
            .await
            .map_err(|e| map_sdk("list buckets", e))?;

        let mut regions = HashSet::new();
        for bucket in response.buckets() {
            let Some(name) = bucket.name() else {
                continue;
            };
            match client.get_bucket_location().bucket(name).send().await {
                Ok(location) => {
                    regions.insert(bucket_region(location.location_constraint()));
                }
                Err(e) => {
                    warn!(bucket = %name, error = %map_sdk("bucket location", e), "skipping bucket with unreadable location");
                }
            }
        }
        Ok(regions)
    }

    async fn list_resources(
        &self,
        account: &AccountId,
        region: &RegionId,
        family: ResourceFamily,
    ) -> Result<Vec<ResourceRecord>> {
        match family {
            ResourceFamily::Compute => self.list_instances(region).await,
            ResourceFamily::BlockStorage => self.list_volumes(region).await,
            ResourceFamily::Database => self.list_db_instances(region).await,
            ResourceFamily::Serverless => self.list_functions_in(region).await,
            ResourceFamily::Cluster => self.list_clusters_in(region).await,
            ResourceFamily::ObjectStorage => self.list_buckets(account).await,
        }
    }

    async fn list_buckets(&self, _account: &AccountId) -> Result<Vec<ResourceRecord>> {
        let client = aws_sdk_s3::Client::new(&self.base);
        let response = client
            .list_buckets()
            .send()
            .await
            .map_err(|e| map_sdk("list buckets", e))?;

        let mut records = Vec::new();
        for bucket in response.buckets() {
            let Some(name) = bucket.name() else {
                continue;
            };
            let location = match client.get_bucket_location().bucket(name).send().await {
                Ok(location) => bucket_region(location.location_constraint()),
                Err(e) => {
                    warn!(bucket = %name, error = %map_sdk("bucket location", e), "listing bucket without location");
                    RegionId::new("unknown")
                }
            };

            records.push(ResourceRecord {
                id: name.to_string(),
                name: name.to_string(),
                family: ResourceFamily::ObjectStorage,
                region: location.clone(),
                state: ResourceState::Available,
                created_at: bucket.creation_date().and_then(to_chrono),
                details: ResourceDetails::ObjectStorage { location },
            });
        }
        Ok(records)
    }

    async fn regional_costs(
        &self,
        _account: &AccountId,
        region: &RegionId,
    ) -> Result<Vec<CostLine>> {
        self.costs_for_region_value(&region.to_string(), Some(region))
            .await
    }

    async fn global_costs(&self, _account: &AccountId) -> Result<Vec<CostLine>> {
        // Cost Explorer attributes region-less services (IAM, Route 53,
        // support plans) to the literal "global" region value
        self.costs_for_region_value("global", None).await
    }

    async fn security_findings(
        &self,
        _account: &AccountId,
        region: &RegionId,
    ) -> Result<Vec<Finding>> {
        use aws_sdk_securityhub::types::{
            AwsSecurityFindingFilters, StringFilter, StringFilterComparison,
        };

        let config = self.region_config(region).await;
        let client = aws_sdk_securityhub::Client::new(&config);
        let response = client
            .get_findings()
            .filters(
                AwsSecurityFindingFilters::builder()
                    .record_state(
                        StringFilter::builder()
                            .value("ACTIVE")
                            .comparison(StringFilterComparison::Equals)
                            .build(),
                    )
                    .build(),
            )
            .max_results(FINDINGS_PAGE_SIZE)
            .send()
            .await
            .map_err(|e| map_sdk("get findings", e))?;

        let mut findings = Vec::new();
        for finding in response.findings() {
            let severity = finding
                .severity()
                .and_then(|severity| severity.label())
                .map(|label| match label {
                    aws_sdk_securityhub::types::SeverityLabel::Critical => Severity::Critical,
                    aws_sdk_securityhub::types::SeverityLabel::High => Severity::High,
                    aws_sdk_securityhub::types::SeverityLabel::Medium => Severity::Medium,
                    aws_sdk_securityhub::types::SeverityLabel::Low => Severity::Low,
                    _ => Severity::Informational,
                })
                .unwrap_or(Severity::Informational);

            findings.push(Finding {
                id: finding.id().unwrap_or_default().to_string(),
                title: finding.title().unwrap_or("untitled finding").to_string(),
                severity,
                region: Some(region.clone()),
                resource_id: finding
                    .resources()
                    .first()
                    .and_then(|resource| resource.id())
                    .map(str::to_string),
            });
        }
        Ok(findings)
    }

    async fn recommendations(
        &self,
        account: &AccountId,
        region: &RegionId,
        family: ResourceFamily,
    ) -> Result<Vec<Recommendation>> {
        // Derived from the same listings the inventory uses: the signals are
        // cheap and need no extra permissions. Savings estimates are left
        // unset; price lookup is a different collaborator's job.
        let mut recommendations = Vec::new();
        match family {
            ResourceFamily::Compute => {
                for record in self.list_instances(region).await? {
                    if record.state == ResourceState::Stopped {
                        recommendations.push(Recommendation {
                            id: format!("stopped-instance-{}", record.id),
                            family,
                            region: Some(region.clone()),
                            action: format!(
                                "instance {} is stopped but still billed for attached storage; terminate or archive it",
                                record.id
                            ),
                            est_monthly_savings_usd: None,
                        });
                    }
                }
            }
            ResourceFamily::BlockStorage => {
                for record in self.list_volumes(region).await? {
                    let ResourceDetails::BlockStorage {
                        encrypted,
                        attached,
                        ..
                    } = record.details
                    else {
                        continue;
                    };
                    if !attached {
                        recommendations.push(Recommendation {
                            id: format!("unattached-volume-{}", record.id),
                            family,
                            region: Some(region.clone()),
                            action: format!(
                                "volume {} is not attached to any instance; snapshot and delete it",
                                record.id
                            ),
                            est_monthly_savings_usd: None,
                        });
                    } else if !encrypted {
                        recommendations.push(Recommendation {
                            id: format!("unencrypted-volume-{}", record.id),
                            family,
                            region: Some(region.clone()),
                            action: format!("volume {} is unencrypted; migrate to an encrypted volume", record.id),
                            est_monthly_savings_usd: None,
                        });
                    }
                }
            }
            ResourceFamily::Database => {
                for record in self.list_db_instances(region).await? {
                    if record.state == ResourceState::Stopped {
                        recommendations.push(Recommendation {
                            id: format!("stopped-database-{}", record.id),
                            family,
                            region: Some(region.clone()),
                            action: format!(
                                "database {} has been stopped; snapshot and delete it if it is no longer needed",
                                record.id
                            ),
                            est_monthly_savings_usd: None,
                        });
                    }
                }
            }
            _ => {
                debug!(account = %account, family = %family, "no recommendation rules for family");
            }
        }
        Ok(recommendations)
    }

    async fn reservation_utilization(
        &self,
        account: &AccountId,
        source: CommitmentSource,
    ) -> Result<CommitmentUtilization> {
        match source {
            CommitmentSource::ReservedInstances => {
                self.reserved_instance_utilization(account).await
            }
            CommitmentSource::SavingsPlans => self.savings_plans_utilization().await,
        }
    }
}

/// Classify an SDK error into the engine's provider taxonomy by its error
/// code. Dispatch-layer failures carry no code and read as network faults.
fn map_sdk<E, R>(what: &str, err: SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata,
{
    let code = err.code().unwrap_or("").to_string();
    let msg = format!("{what}: {}", err.message().unwrap_or("no detail"));
    match code.as_str() {
        "" => ProviderError::Network(msg),
        "AccessDenied" | "AccessDeniedException" | "UnauthorizedOperation" | "AuthFailure" => {
            ProviderError::AccessDenied(msg)
        }
        "OptInRequired" | "SubscriptionRequiredException" | "InvalidAccessException" => {
            ProviderError::NotEnabled(msg)
        }
        "RegionDisabledException" => ProviderError::RegionUnavailable(msg),
        "RequestLimitExceeded" | "TooManyRequestsException" | "ThrottlingException"
        | "Throttling" => ProviderError::RateLimited(msg),
        other => ProviderError::Api(format!("{msg} ({other})")),
    }
}

/// Convert a Smithy timestamp into a chrono one
fn to_chrono(stamp: &aws_sdk_ec2::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(stamp.secs(), stamp.subsec_nanos())
}

/// S3 reports the original region as a location constraint, with two legacy
/// quirks: an absent constraint means us-east-1 and "EU" means eu-west-1
fn bucket_region(
    constraint: Option<&aws_sdk_s3::types::BucketLocationConstraint>,
) -> RegionId {
    match constraint.map(|c| c.as_str()) {
        None | Some("") => RegionId::new("us-east-1"),
        Some("EU") => RegionId::new("eu-west-1"),
        Some(region) => RegionId::new(region),
    }
}

/// Trailing one-month window for cost and utilization lookups
fn month_window() -> Result<aws_sdk_costexplorer::types::DateInterval> {
    let end = Utc::now().date_naive();
    let start = end - chrono::Days::new(30);
    aws_sdk_costexplorer::types::DateInterval::builder()
        .start(start.format("%Y-%m-%d").to_string())
        .end(end.format("%Y-%m-%d").to_string())
        .build()
        .map_err(|e| ProviderError::Api(format!("cost period: {e}")))
}

fn parse_pct(value: &str) -> Option<f64> {
    value.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_region_legacy_constraints() {
        use aws_sdk_s3::types::BucketLocationConstraint;

        assert_eq!(bucket_region(None), RegionId::new("us-east-1"));
        assert_eq!(
            bucket_region(Some(&BucketLocationConstraint::Eu)),
            RegionId::new("eu-west-1")
        );
        assert_eq!(
            bucket_region(Some(&BucketLocationConstraint::EuNorth1)),
            RegionId::new("eu-north-1")
        );
    }

    #[test]
    fn test_month_window_is_well_formed() {
        let window = month_window().unwrap();
        assert!(window.start().len() == 10);
        assert!(window.end().len() == 10);
        assert!(window.start() < window.end());
    }

    #[test]
    fn test_parse_pct() {
        assert_eq!(parse_pct("87.5"), Some(87.5));
        assert_eq!(parse_pct("n/a"), None);
    }
}
