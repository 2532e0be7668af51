//! Concurrent fan-out with per-unit failure isolation
//!
//! The one place concurrency correctness is gotten right, reused by every
//! scan family. Two shapes:
//!
//! - [`FanOut::run`]: one fetch per unit from a shared closure - the
//!   "one call per active region" case
//! - [`FanOut::run_tasks`]: independently named sub-tasks - the "combine
//!   EC2, EBS, RDS listings" case
//!
//! Every unit runs as its own task on the shared runtime. A failing unit
//! contributes an empty result - never an error, never a null - so aggregate
//! totals over a partially failed fan-out are a lower bound, not an error
//! state. The run waits for ALL units: no early return on first failure, no
//! early return on first success.

use futures::future::BoxFuture;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use cumulo_core::ProviderError;

/// Flattened union of all successful unit results, plus how many units
/// were lost along the way.
///
/// Failed units are observable here and in the warn logs; callers are not
/// forced to treat them as errors.
#[derive(Debug, Clone)]
pub struct Gathered<T> {
    /// Union of every successful unit's items. Order carries no meaning;
    /// merge steps downstream must be commutative.
    pub items: Vec<T>,
    /// Units submitted
    pub total_units: usize,
    /// Units that errored, timed out, or panicked
    pub failed_units: usize,
}

impl<T> Gathered<T> {
    /// Whether any unit failed to contribute
    pub fn degraded(&self) -> bool {
        self.failed_units > 0
    }
}

/// One named unit for [`FanOut::run_tasks`]
pub struct SubTask<T> {
    /// Unit identifier for logs (a region id, a service name, "S3 buckets")
    pub name: String,
    fut: BoxFuture<'static, Result<Vec<T>, ProviderError>>,
}

impl<T> SubTask<T> {
    /// Create a named sub-task from any producer future
    pub fn new<F>(name: impl Into<String>, fut: F) -> Self
    where
        F: Future<Output = Result<Vec<T>, ProviderError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            fut: Box::pin(fut),
        }
    }
}

/// Executes independent units concurrently and flattens their results
#[derive(Debug, Clone)]
pub struct FanOut {
    unit_timeout: Option<Duration>,
}

impl FanOut {
    /// Create an executor with the given per-unit deadline policy
    pub fn new(unit_timeout: Option<Duration>) -> Self {
        Self { unit_timeout }
    }

    /// Run one producer per unit, all concurrently, and gather the union.
    ///
    /// `label` names the fetch family in logs; each unit is identified by
    /// its `Display` form. Results are flattened without deduplication -
    /// identity semantics differ per resource type, so duplicate detection
    /// belongs to the caller.
    pub async fn run<U, T, F, Fut>(&self, label: &str, units: Vec<U>, per_unit: F) -> Gathered<T>
    where
        U: Display,
        T: Send + 'static,
        F: Fn(U) -> Fut,
        Fut: Future<Output = Result<Vec<T>, ProviderError>> + Send + 'static,
    {
        let mut set = JoinSet::new();
        let total_units = units.len();

        for unit in units {
            let key = unit.to_string();
            let fut = with_deadline(self.unit_timeout, per_unit(unit));
            set.spawn(async move { (key, fut.await) });
        }

        self.gather(label, total_units, set).await
    }

    /// Run independently named sub-tasks, all concurrently, and gather the
    /// union
    pub async fn run_tasks<T: Send + 'static>(
        &self,
        label: &str,
        tasks: Vec<SubTask<T>>,
    ) -> Gathered<T> {
        let mut set = JoinSet::new();
        let total_units = tasks.len();

        for task in tasks {
            let key = task.name;
            let fut = with_deadline(self.unit_timeout, task.fut);
            set.spawn(async move { (key, fut.await) });
        }

        self.gather(label, total_units, set).await
    }

    /// Wait for every unit, isolate failures, flatten the rest
    async fn gather<T: Send + 'static>(
        &self,
        label: &str,
        total_units: usize,
        mut set: JoinSet<(String, Result<Vec<T>, ProviderError>)>,
    ) -> Gathered<T> {
        let mut items = Vec::new();
        let mut failed_units = 0usize;

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((unit, Ok(mut unit_items))) => {
                    debug!(label, unit = %unit, count = unit_items.len(), "unit completed");
                    items.append(&mut unit_items);
                }
                Ok((unit, Err(e))) => {
                    warn!(label, unit = %unit, error = %e, "unit failed, contributing empty result");
                    failed_units += 1;
                }
                Err(join_err) => {
                    warn!(label, error = %join_err, "unit task panicked, contributing empty result");
                    failed_units += 1;
                }
            }
        }

        if failed_units > 0 {
            warn!(
                label,
                failed_units, total_units, "fan-out completed degraded"
            );
        } else {
            debug!(label, total_units, count = items.len(), "fan-out completed");
        }

        Gathered {
            items,
            total_units,
            failed_units,
        }
    }
}

/// Wrap a producer with the per-unit deadline, converting a timeout into the
/// ordinary isolated-failure path
async fn with_deadline<T>(
    timeout: Option<Duration>,
    fut: impl Future<Output = Result<Vec<T>, ProviderError>> + Send + 'static,
) -> Result<Vec<T>, ProviderError>
where
    T: Send + 'static,
{
    match timeout {
        Some(deadline) => match tokio::time::timeout(deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(deadline)),
        },
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cumulo_core::RegionId;

    fn regions(ids: &[&str]) -> Vec<RegionId> {
        ids.iter().map(|id| RegionId::new(*id)).collect()
    }

    #[tokio::test]
    async fn test_all_units_contribute() {
        let fanout = FanOut::new(None);
        let gathered = fanout
            .run("listing", regions(&["r1", "r2"]), |region| async move {
                Ok(vec![format!("{region}-a"), format!("{region}-b")])
            })
            .await;

        assert_eq!(gathered.total_units, 2);
        assert_eq!(gathered.failed_units, 0);
        assert!(!gathered.degraded());

        let mut items = gathered.items;
        items.sort();
        assert_eq!(items, vec!["r1-a", "r1-b", "r2-a", "r2-b"]);
    }

    #[tokio::test]
    async fn test_failing_unit_is_isolated() {
        // Three units, the middle one raises: output is the concatenation of
        // units 1 and 3, no error propagated, nothing from unit 2.
        let fanout = FanOut::new(None);
        let gathered = fanout
            .run("listing", regions(&["r1", "r2", "r3"]), |region| async move {
                if region.0 == "r2" {
                    Err(ProviderError::RateLimited("slow down".to_string()))
                } else {
                    Ok(vec![format!("{region}-x")])
                }
            })
            .await;

        assert_eq!(gathered.total_units, 3);
        assert_eq!(gathered.failed_units, 1);
        assert!(gathered.degraded());

        let mut items = gathered.items;
        items.sort();
        assert_eq!(items, vec!["r1-x", "r3-x"]);
    }

    #[tokio::test]
    async fn test_panicking_unit_is_isolated() {
        let fanout = FanOut::new(None);
        let gathered = fanout
            .run("listing", regions(&["r1", "r2"]), |region| async move {
                if region.0 == "r2" {
                    panic!("producer bug");
                }
                Ok(vec![region.to_string()])
            })
            .await;

        assert_eq!(gathered.failed_units, 1);
        assert_eq!(gathered.items, vec!["r1".to_string()]);
    }

    #[tokio::test]
    async fn test_hung_unit_converted_to_isolated_failure() {
        let fanout = FanOut::new(Some(Duration::from_millis(50)));
        let gathered = fanout
            .run("listing", regions(&["r1", "r2"]), |region| async move {
                if region.0 == "r2" {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
                Ok(vec![region.to_string()])
            })
            .await;

        assert_eq!(gathered.failed_units, 1);
        assert_eq!(gathered.items, vec!["r1".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_units_complete_immediately() {
        let fanout = FanOut::new(Some(Duration::from_secs(30)));
        let gathered = fanout
            .run("listing", Vec::<RegionId>::new(), |_region: RegionId| async move {
                Ok(vec![0u32])
            })
            .await;

        assert_eq!(gathered.total_units, 0);
        assert!(gathered.items.is_empty());
        assert!(!gathered.degraded());
    }

    #[tokio::test]
    async fn test_named_sub_tasks() {
        let fanout = FanOut::new(None);
        let tasks = vec![
            SubTask::new("ec2", async { Ok(vec![1, 2]) }),
            SubTask::new("ebs", async {
                Err(ProviderError::AccessDenied("no ec2:DescribeVolumes".to_string()))
            }),
            SubTask::new("s3-buckets", async { Ok(vec![3]) }),
        ];
        let gathered = fanout.run_tasks("inventory", tasks).await;

        assert_eq!(gathered.total_units, 3);
        assert_eq!(gathered.failed_units, 1);

        let mut items = gathered.items;
        items.sort();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_flatten_does_not_deduplicate() {
        let fanout = FanOut::new(None);
        let gathered = fanout
            .run("listing", regions(&["r1", "r2"]), |_region| async move {
                Ok(vec!["same-id".to_string()])
            })
            .await;

        assert_eq!(gathered.items.len(), 2);
    }
}
