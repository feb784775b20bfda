//! EC2 instance lookup across several AWS accounts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, warn};

use super::{ResultSet, Resolver, SearchResult};
use crate::error::SearchError;
use crate::slack::HandlerContext;

/// Kind of the results produced by this resolver.
pub const EC2_INSTANCE_KIND: &str = "ec2.instance";

/// "i-" followed by 17 hex characters.
pub const EC2_INSTANCE_ID_LENGTH: usize = 19;

/// The parts of an EC2 instance we report on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ec2Instance {
    pub instance_id: String,
    pub image_id: String,
    pub instance_type: String,
    pub state: String,
    pub availability_zone: String,
    pub public_ips: Vec<String>,
    pub private_ips: Vec<String>,
    pub tags: Vec<(String, String)>,
}

/// EC2 access for one account and region.
#[async_trait]
pub trait Ec2Api: Send + Sync {
    /// Account alias, used in logs
    fn name(&self) -> &str;

    fn region(&self) -> &str;

    async fn find_instances(&self, instance_id: &str) -> Result<Vec<Ec2Instance>, SearchError>;
}

/// Finds EC2 instances by exact id in every configured account.
#[derive(Clone, Default)]
pub struct Ec2Resolver {
    accounts: Vec<Arc<dyn Ec2Api>>,
}

impl Ec2Resolver {
    pub fn new(accounts: Vec<Arc<dyn Ec2Api>>) -> Self {
        Self { accounts }
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

#[async_trait]
impl Resolver for Ec2Resolver {
    async fn search(&self, _ctx: &HandlerContext, query: &str) -> Vec<ResultSet> {
        let query = query.trim();

        // The EC2 API has no substring search, so only exact ids are worth a call.
        if !is_instance_id(query) {
            return Vec::new();
        }

        let lookups = self.accounts.iter().map(|account| async move {
            (account, account.find_instances(query).await)
        });

        let mut result_sets = Vec::new();
        for (account, outcome) in join_all(lookups).await {
            match outcome {
                Ok(instances) if instances.is_empty() => {}
                Ok(instances) => {
                    info!(
                        account = account.name(),
                        instance_id = %query,
                        found = instances.len(),
                        "ec2_instances_found"
                    );
                    result_sets.push(ResultSet {
                        kind: EC2_INSTANCE_KIND.to_string(),
                        search_link: console_link(account.region(), query),
                        results: instances
                            .iter()
                            .map(|instance| instance_result(account.region(), instance))
                            .collect(),
                    });
                }
                Err(e) => {
                    warn!(account = account.name(), error = %e, "ec2_lookup_failed");
                }
            }
        }

        result_sets
    }
}

fn is_instance_id(query: &str) -> bool {
    query.starts_with("i-") && query.len() == EC2_INSTANCE_ID_LENGTH
}

fn instance_result(region: &str, instance: &Ec2Instance) -> SearchResult {
    let mut metadata: HashMap<String, Vec<String>> = HashMap::from([
        ("instance_id".to_string(), vec![instance.instance_id.clone()]),
        ("ami_id".to_string(), vec![instance.image_id.clone()]),
        ("instance_type".to_string(), vec![instance.instance_type.clone()]),
        ("instance_state".to_string(), vec![instance.state.clone()]),
        ("az".to_string(), vec![instance.availability_zone.clone()]),
        ("public_ips".to_string(), instance.public_ips.clone()),
        ("private_ips".to_string(), instance.private_ips.clone()),
    ]);

    for (key, value) in &instance.tags {
        metadata.insert(format!("tag:{}", key), vec![value.clone()]);
    }

    let links = HashMap::from([
        (
            "ec2_console".to_string(),
            console_link(region, &instance.instance_id),
        ),
        (
            "config_timeline".to_string(),
            config_timeline_link(region, &instance.instance_id),
        ),
    ]);

    SearchResult {
        kind: EC2_INSTANCE_KIND.to_string(),
        metadata,
        links,
    }
}

fn console_link(region: &str, search: &str) -> String {
    format!(
        "https://console.aws.amazon.com/ec2/v2/home?region={}#Instances:search={};sort=desc:launchTime",
        region, search
    )
}

fn config_timeline_link(region: &str, instance_id: &str) -> String {
    format!(
        "https://console.aws.amazon.com/config/home?region={}#/timeline/AWS::EC2::Instance/{}/configuration",
        region, instance_id
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    pub(crate) const INSTANCE_ID: &str = "i-0123456789abcdef0";

    pub(crate) struct FakeAccount {
        pub name: &'static str,
        pub region: &'static str,
        pub outcome: Result<Vec<Ec2Instance>, String>,
        pub calls: AtomicUsize,
    }

    impl FakeAccount {
        pub(crate) fn with(name: &'static str, outcome: Result<Vec<Ec2Instance>, String>) -> Self {
            Self {
                name,
                region: "us-east-1",
                outcome,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Ec2Api for FakeAccount {
        fn name(&self) -> &str {
            self.name
        }

        fn region(&self) -> &str {
            self.region
        }

        async fn find_instances(&self, _instance_id: &str) -> Result<Vec<Ec2Instance>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome
                .clone()
                .map_err(|message| SearchError::new(self.name, message))
        }
    }

    pub(crate) fn sample_instance() -> Ec2Instance {
        Ec2Instance {
            instance_id: INSTANCE_ID.to_string(),
            image_id: "ami-12345678".to_string(),
            instance_type: "t3.micro".to_string(),
            state: "running".to_string(),
            availability_zone: "us-east-1a".to_string(),
            public_ips: vec!["54.0.0.1".to_string()],
            private_ips: vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()],
            tags: vec![
                ("Environment".to_string(), "production".to_string()),
                ("Role".to_string(), "web".to_string()),
            ],
        }
    }

    fn ctx() -> HandlerContext {
        HandlerContext {
            started_at: Instant::now(),
            deadline: None,
        }
    }

    #[test]
    fn test_is_instance_id() {
        assert!(is_instance_id(INSTANCE_ID));
        assert!(!is_instance_id("i-0123"));
        assert!(!is_instance_id("x-0123456789abcdef0"));
        assert!(!is_instance_id("web-server"));
    }

    #[tokio::test]
    async fn test_search_skips_non_instance_queries() {
        let account = Arc::new(FakeAccount::with("prod", Ok(vec![sample_instance()])));
        let resolver = Ec2Resolver::new(vec![account.clone() as Arc<dyn Ec2Api>]);

        assert!(resolver.search(&ctx(), "web-server").await.is_empty());
        assert_eq!(account.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_search_builds_instance_result() {
        let account: Arc<dyn Ec2Api> =
            Arc::new(FakeAccount::with("prod", Ok(vec![sample_instance()])));
        let resolver = Ec2Resolver::new(vec![account]);

        let sets = resolver.search(&ctx(), &format!("  {}\n", INSTANCE_ID)).await;

        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].kind, EC2_INSTANCE_KIND);
        assert_eq!(sets[0].results.len(), 1);

        let result = &sets[0].results[0];
        assert_eq!(result.metadata("instance_id"), INSTANCE_ID);
        assert_eq!(result.metadata("instance_state"), "running");
        assert_eq!(result.metadata("private_ips"), "10.0.0.1, 10.0.0.2");
        assert_eq!(result.metadata("tag:Role"), "web");
        assert_eq!(
            result.link("config_timeline"),
            "https://console.aws.amazon.com/config/home?region=us-east-1#/timeline/AWS::EC2::Instance/i-0123456789abcdef0/configuration"
        );
    }

    #[tokio::test]
    async fn test_search_tolerates_failing_account() {
        let failing = Arc::new(FakeAccount::with("staging", Err("AccessDenied".to_string())));
        let working: Arc<dyn Ec2Api> =
            Arc::new(FakeAccount::with("prod", Ok(vec![sample_instance()])));
        let empty: Arc<dyn Ec2Api> = Arc::new(FakeAccount::with("dev", Ok(vec![])));
        let accounts: Vec<Arc<dyn Ec2Api>> = vec![failing.clone() as Arc<dyn Ec2Api>, working, empty];
        let resolver = Ec2Resolver::new(accounts);

        let sets = resolver.search(&ctx(), INSTANCE_ID).await;

        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].results[0].metadata("az"), "us-east-1a");
    }
}
