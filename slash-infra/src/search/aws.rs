//! `Ec2Api` backed by the AWS SDK, one client per configured account.
//!
//! Base credentials come from the default provider chain and are only used
//! to assume each account's `AWS_ROLE_<alias>` role.

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::{sts::AssumeRoleProvider, BehaviorVersion};
use aws_sdk_ec2::{config::Region, error::DisplayErrorContext, types::Filter, Client};
use tracing::info;

use super::ec2::{Ec2Api, Ec2Instance};
use crate::config::AwsAccount;
use crate::error::SearchError;

const ROLE_SESSION_NAME: &str = "slash-infra";

/// EC2 client for a single account, authenticated by assuming its role.
pub struct AwsEc2Client {
    alias: String,
    region: String,
    client: Client,
}

impl AwsEc2Client {
    pub async fn for_account(account: &AwsAccount) -> Self {
        let region = Region::new(account.region.clone());

        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(region.clone())
            .load()
            .await;

        let credentials = AssumeRoleProvider::builder(account.role_arn.clone())
            .session_name(ROLE_SESSION_NAME)
            .region(region.clone())
            .configure(&base)
            .build()
            .await;

        let config = aws_sdk_ec2::config::Builder::from(&base)
            .credentials_provider(credentials)
            .region(region)
            .build();

        Self {
            alias: account.alias.clone(),
            region: account.region.clone(),
            client: Client::from_conf(config),
        }
    }
}

/// Build one client per configured account.
pub async fn ec2_clients(accounts: &[AwsAccount]) -> Vec<Arc<dyn Ec2Api>> {
    let mut clients: Vec<Arc<dyn Ec2Api>> = Vec::with_capacity(accounts.len());

    for account in accounts {
        info!(
            account = %account.alias,
            region = %account.region,
            "aws_ec2_client_created"
        );
        clients.push(Arc::new(AwsEc2Client::for_account(account).await));
    }

    clients
}

#[async_trait]
impl Ec2Api for AwsEc2Client {
    fn name(&self) -> &str {
        &self.alias
    }

    fn region(&self) -> &str {
        &self.region
    }

    async fn find_instances(&self, instance_id: &str) -> Result<Vec<Ec2Instance>, SearchError> {
        let output = self
            .client
            .describe_instances()
            .filters(
                Filter::builder()
                    .name("instance-id")
                    .values(instance_id)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| SearchError::new(&self.alias, DisplayErrorContext(&e).to_string()))?;

        let instances = output
            .reservations()
            .iter()
            .flat_map(|reservation| reservation.instances())
            .map(|instance| {
                let mut public_ips = Vec::new();
                let mut private_ips = Vec::new();

                // Stopped instances have no network interfaces
                for interface in instance.network_interfaces() {
                    if let Some(ip) = interface.association().and_then(|a| a.public_ip()) {
                        public_ips.push(ip.to_string());
                    }
                    for private in interface.private_ip_addresses() {
                        if let Some(ip) = private.private_ip_address() {
                            private_ips.push(ip.to_string());
                        }
                    }
                }

                Ec2Instance {
                    instance_id: instance.instance_id().unwrap_or_default().to_string(),
                    image_id: instance.image_id().unwrap_or_default().to_string(),
                    instance_type: instance
                        .instance_type()
                        .map(|t| t.as_str().to_string())
                        .unwrap_or_default(),
                    state: instance
                        .state()
                        .and_then(|s| s.name())
                        .map(|n| n.as_str().to_string())
                        .unwrap_or_default(),
                    availability_zone: instance
                        .placement()
                        .and_then(|p| p.availability_zone())
                        .unwrap_or_default()
                        .to_string(),
                    public_ips,
                    private_ips,
                    tags: instance
                        .tags()
                        .iter()
                        .filter_map(|tag| Some((tag.key()?.to_string(), tag.value()?.to_string())))
                        .collect(),
                }
            })
            .collect();

        Ok(instances)
    }
}
