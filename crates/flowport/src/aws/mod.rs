//! Amazon Connect as a [`Source`].
use anyhow::Context;
use aws_config::SdkConfig;
use aws_sdk_connect::types as aws;

use crate::{Described, ManifestCategory, Page, ResourceKind, Source, SourceIdentity, Summary};

mod properties;

/// Largest page the list operations accept.
const PAGE_SIZE: i32 = 50;

/// Looks up the account number and the ARN of the source instance.
pub async fn discover_identity(
    cfg: &SdkConfig,
    instance_id: &str,
) -> crate::Result<SourceIdentity> {
    let sts = aws_sdk_sts::Client::new(cfg);
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .context("could not get caller identity")?;
    let account = identity.account.context("caller identity has no account")?;

    let connect = aws_sdk_connect::Client::new(cfg);
    let out = connect
        .describe_instance()
        .instance_id(instance_id)
        .send()
        .await
        .with_context(|| format!("could not describe instance {instance_id}"))?;
    let arn = out
        .instance
        .and_then(|instance| instance.arn)
        .with_context(|| format!("instance {instance_id} has no arn"))?;
    log::info!("exporting from {arn} in account {account}");

    SourceIdentity::new(account, instance_id, arn)
}

fn summary(id: Option<String>, arn: Option<String>, name: Option<String>) -> Option<Summary> {
    match (id, name) {
        (Some(id), Some(name)) => Some(Summary { id, arn, name }),
        (id, _) => {
            log::debug!("skipping unnamed summary {id:?}");
            None
        }
    }
}

/// One Amazon Connect instance.
pub struct ConnectSource {
    client: aws_sdk_connect::Client,
    instance_id: String,
}

impl ConnectSource {
    pub fn new(cfg: &SdkConfig, instance_id: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_connect::Client::new(cfg),
            instance_id: instance_id.into(),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    async fn list(
        &self,
        category: ManifestCategory,
        next_token: Option<String>,
    ) -> anyhow::Result<Page> {
        let client = &self.client;
        let instance_id = self.instance_id.as_str();
        let (items, next_token) = match category {
            ManifestCategory::Modules => {
                let out = client
                    .list_contact_flow_modules()
                    .instance_id(instance_id)
                    .contact_flow_module_state(aws::ContactFlowModuleState::Active)
                    .max_results(PAGE_SIZE)
                    .set_next_token(next_token)
                    .send()
                    .await?;
                let items = out
                    .contact_flow_modules_summary_list
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|s| summary(s.id, s.arn, s.name))
                    .collect();
                (items, out.next_token)
            }
            ManifestCategory::Flows => {
                let out = client
                    .list_contact_flows()
                    .instance_id(instance_id)
                    .set_contact_flow_types(Some(vec![
                        aws::ContactFlowType::ContactFlow,
                        aws::ContactFlowType::CustomerQueue,
                        aws::ContactFlowType::CustomerHold,
                        aws::ContactFlowType::CustomerWhisper,
                        aws::ContactFlowType::AgentHold,
                        aws::ContactFlowType::AgentWhisper,
                        aws::ContactFlowType::OutboundWhisper,
                        aws::ContactFlowType::AgentTransfer,
                        aws::ContactFlowType::QueueTransfer,
                    ]))
                    .max_results(PAGE_SIZE)
                    .set_next_token(next_token)
                    .send()
                    .await?;
                let items = out
                    .contact_flow_summary_list
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|s| summary(s.id, s.arn, s.name))
                    .collect();
                (items, out.next_token)
            }
            ManifestCategory::HoursOfOperation => {
                let out = client
                    .list_hours_of_operations()
                    .instance_id(instance_id)
                    .max_results(PAGE_SIZE)
                    .set_next_token(next_token)
                    .send()
                    .await?;
                let items = out
                    .hours_of_operation_summary_list
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|s| summary(s.id, s.arn, s.name))
                    .collect();
                (items, out.next_token)
            }
            ManifestCategory::PhoneNumbers => {
                let out = client
                    .list_phone_numbers()
                    .instance_id(instance_id)
                    .set_phone_number_types(Some(vec![
                        aws::PhoneNumberType::TollFree,
                        aws::PhoneNumberType::Did,
                    ]))
                    .max_results(PAGE_SIZE)
                    .set_next_token(next_token)
                    .send()
                    .await?;
                let items = out
                    .phone_number_summary_list
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|s| summary(s.id, s.arn, s.phone_number))
                    .collect();
                (items, out.next_token)
            }
            ManifestCategory::Prompts => {
                let out = client
                    .list_prompts()
                    .instance_id(instance_id)
                    .max_results(PAGE_SIZE)
                    .set_next_token(next_token)
                    .send()
                    .await?;
                let items = out
                    .prompt_summary_list
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|s| summary(s.id, s.arn, s.name))
                    .collect();
                (items, out.next_token)
            }
            ManifestCategory::Queues => {
                let out = client
                    .list_queues()
                    .instance_id(instance_id)
                    .set_queue_types(Some(vec![aws::QueueType::Standard, aws::QueueType::Agent]))
                    .max_results(PAGE_SIZE)
                    .set_next_token(next_token)
                    .send()
                    .await?;
                let items = out
                    .queue_summary_list
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|s| summary(s.id, s.arn, s.name))
                    .collect();
                (items, out.next_token)
            }
            ManifestCategory::QuickConnects => {
                let out = client
                    .list_quick_connects()
                    .instance_id(instance_id)
                    .set_quick_connect_types(Some(vec![
                        aws::QuickConnectType::User,
                        aws::QuickConnectType::Queue,
                        aws::QuickConnectType::PhoneNumber,
                    ]))
                    .max_results(PAGE_SIZE)
                    .set_next_token(next_token)
                    .send()
                    .await?;
                let items = out
                    .quick_connect_summary_list
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|s| summary(s.id, s.arn, s.name))
                    .collect();
                (items, out.next_token)
            }
            ManifestCategory::RoutingProfiles => {
                let out = client
                    .list_routing_profiles()
                    .instance_id(instance_id)
                    .max_results(PAGE_SIZE)
                    .set_next_token(next_token)
                    .send()
                    .await?;
                let items = out
                    .routing_profile_summary_list
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|s| summary(s.id, s.arn, s.name))
                    .collect();
                (items, out.next_token)
            }
        };
        Ok(Page { items, next_token })
    }

    async fn describe_resource(&self, kind: ResourceKind, id: &str) -> anyhow::Result<Described> {
        let client = &self.client;
        let instance_id = self.instance_id.as_str();
        let descriptor = match kind {
            ResourceKind::Flow => {
                let result = client
                    .describe_contact_flow()
                    .instance_id(instance_id)
                    .contact_flow_id(id)
                    .send()
                    .await;
                let out = match result {
                    Ok(out) => out,
                    Err(err)
                        if err
                            .as_service_error()
                            .is_some_and(|e| e.is_contact_flow_not_published_exception()) =>
                    {
                        return Ok(Described::NotPublished);
                    }
                    Err(err) => return Err(err.into()),
                };
                let flow = out.contact_flow.context("missing contact flow")?;
                properties::contact_flow(id, flow)?
            }
            ResourceKind::Module => {
                let out = client
                    .describe_contact_flow_module()
                    .instance_id(instance_id)
                    .contact_flow_module_id(id)
                    .send()
                    .await?;
                let module = out.contact_flow_module.context("missing contact flow module")?;
                properties::contact_flow_module(id, module)?
            }
            ResourceKind::HoursOfOperation => {
                let out = client
                    .describe_hours_of_operation()
                    .instance_id(instance_id)
                    .hours_of_operation_id(id)
                    .send()
                    .await?;
                let hours = out.hours_of_operation.context("missing hours of operation")?;
                properties::hours_of_operation(id, hours)?
            }
            ResourceKind::QuickConnect => {
                let out = client
                    .describe_quick_connect()
                    .instance_id(instance_id)
                    .quick_connect_id(id)
                    .send()
                    .await?;
                let quick_connect = out.quick_connect.context("missing quick connect")?;
                properties::quick_connect(id, quick_connect)?
            }
        };
        Ok(Described::Found(descriptor))
    }
}

impl Source for ConnectSource {
    type Error = anyhow::Error;

    async fn list_page(
        &self,
        category: ManifestCategory,
        next_token: Option<String>,
    ) -> anyhow::Result<Page> {
        log::trace!("listing {category} of {}", self.instance_id);
        self.list(category, next_token).await
    }

    async fn describe(&self, kind: ResourceKind, id: &str) -> anyhow::Result<Described> {
        log::trace!("describing {kind} {id}");
        self.describe_resource(kind, id)
            .await
            .with_context(|| format!("{kind} {id} in instance {}", self.instance_id))
    }
}
