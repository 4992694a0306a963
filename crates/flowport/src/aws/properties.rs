//! Described Amazon Connect resources as template properties.
//!
//! Properties are keyed by their service names, metadata included. The
//! fetcher strips the fields that are not configuration.
use anyhow::Context;
use aws_sdk_connect::types as aws;
use serde_json::{json, Map, Value};

use crate::{ResourceDescriptor, ResourceKind};

fn insert_opt(properties: &mut Map<String, Value>, key: &str, value: Option<impl Into<Value>>) {
    if let Some(value) = value {
        properties.insert(key.to_owned(), value.into());
    }
}

fn tags(tags: Option<std::collections::HashMap<String, String>>) -> Option<Value> {
    tags.map(|tags| json!(tags))
}

fn descriptor(
    kind: ResourceKind,
    id: &str,
    name: Option<String>,
    mut properties: Map<String, Value>,
) -> anyhow::Result<ResourceDescriptor> {
    let name = name.with_context(|| format!("{kind} {id} has no name"))?;
    properties.insert("Name".to_owned(), Value::String(name.clone()));
    Ok(ResourceDescriptor {
        kind,
        source_id: id.to_owned(),
        name,
        properties,
    })
}

pub fn contact_flow(id: &str, flow: aws::ContactFlow) -> anyhow::Result<ResourceDescriptor> {
    let mut properties = Map::new();
    insert_opt(&mut properties, "Arn", flow.arn);
    insert_opt(&mut properties, "Id", flow.id);
    insert_opt(&mut properties, "Type", flow.r#type.map(|ty| ty.as_str().to_owned()));
    insert_opt(&mut properties, "State", flow.state.map(|state| state.as_str().to_owned()));
    insert_opt(&mut properties, "Description", flow.description);
    insert_opt(&mut properties, "Content", flow.content);
    insert_opt(&mut properties, "Tags", tags(flow.tags));
    descriptor(ResourceKind::Flow, id, flow.name, properties)
}

pub fn contact_flow_module(
    id: &str,
    module: aws::ContactFlowModule,
) -> anyhow::Result<ResourceDescriptor> {
    let mut properties = Map::new();
    insert_opt(&mut properties, "Arn", module.arn);
    insert_opt(&mut properties, "Id", module.id);
    insert_opt(&mut properties, "State", module.state.map(|state| state.as_str().to_owned()));
    insert_opt(&mut properties, "Status", module.status.map(|status| status.as_str().to_owned()));
    insert_opt(&mut properties, "Description", module.description);
    insert_opt(&mut properties, "Content", module.content);
    insert_opt(&mut properties, "Tags", tags(module.tags));
    descriptor(ResourceKind::Module, id, module.name, properties)
}

fn time_slice(slice: &aws::HoursOfOperationTimeSlice) -> Value {
    json!({ "Hours": slice.hours(), "Minutes": slice.minutes() })
}

pub fn hours_of_operation(
    id: &str,
    hours: aws::HoursOfOperation,
) -> anyhow::Result<ResourceDescriptor> {
    let mut properties = Map::new();
    insert_opt(&mut properties, "HoursOfOperationId", hours.hours_of_operation_id);
    insert_opt(&mut properties, "HoursOfOperationArn", hours.hours_of_operation_arn);
    insert_opt(&mut properties, "Description", hours.description);
    insert_opt(&mut properties, "TimeZone", hours.time_zone);
    if let Some(config) = hours.config {
        let config = config
            .iter()
            .map(|entry| {
                let mut day = Map::new();
                day.insert("Day".to_owned(), Value::String(entry.day().as_str().to_owned()));
                insert_opt(&mut day, "StartTime", entry.start_time().map(time_slice));
                insert_opt(&mut day, "EndTime", entry.end_time().map(time_slice));
                Value::Object(day)
            })
            .collect::<Vec<_>>();
        properties.insert("Config".to_owned(), Value::Array(config));
    }
    insert_opt(&mut properties, "Tags", tags(hours.tags));
    insert_opt(
        &mut properties,
        "LastModifiedTime",
        hours.last_modified_time.map(|time| time.to_string()),
    );
    insert_opt(&mut properties, "LastModifiedRegion", hours.last_modified_region);
    descriptor(ResourceKind::HoursOfOperation, id, hours.name, properties)
}

fn quick_connect_config(config: &aws::QuickConnectConfig) -> Value {
    let mut value = Map::new();
    value.insert(
        "QuickConnectType".to_owned(),
        Value::String(config.quick_connect_type().as_str().to_owned()),
    );
    insert_opt(
        &mut value,
        "UserConfig",
        config.user_config().map(|user| {
            json!({ "UserId": user.user_id(), "ContactFlowId": user.contact_flow_id() })
        }),
    );
    insert_opt(
        &mut value,
        "QueueConfig",
        config.queue_config().map(|queue| {
            json!({ "QueueId": queue.queue_id(), "ContactFlowId": queue.contact_flow_id() })
        }),
    );
    insert_opt(
        &mut value,
        "PhoneConfig",
        config
            .phone_config()
            .map(|phone| json!({ "PhoneNumber": phone.phone_number() })),
    );
    Value::Object(value)
}

pub fn quick_connect(
    id: &str,
    quick_connect: aws::QuickConnect,
) -> anyhow::Result<ResourceDescriptor> {
    let mut properties = Map::new();
    insert_opt(&mut properties, "QuickConnectARN", quick_connect.quick_connect_arn);
    insert_opt(&mut properties, "QuickConnectId", quick_connect.quick_connect_id);
    insert_opt(&mut properties, "Description", quick_connect.description);
    insert_opt(
        &mut properties,
        "QuickConnectConfig",
        quick_connect.quick_connect_config.as_ref().map(quick_connect_config),
    );
    insert_opt(&mut properties, "Tags", tags(quick_connect.tags));
    insert_opt(
        &mut properties,
        "LastModifiedTime",
        quick_connect.last_modified_time.map(|time| time.to_string()),
    );
    insert_opt(&mut properties, "LastModifiedRegion", quick_connect.last_modified_region);
    descriptor(ResourceKind::QuickConnect, id, quick_connect.name, properties)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn module_properties() {
        let module = aws::ContactFlowModule::builder()
            .arn("arn:aws:connect:us-east-1:123456789012:instance/i/flow-module/m1")
            .id("m1")
            .name("Auth")
            .content(r#"{"Actions":[]}"#)
            .state(aws::ContactFlowModuleState::Active)
            .build();
        let descriptor = contact_flow_module("m1", module).unwrap();

        assert_eq!(ResourceKind::Module, descriptor.kind);
        assert_eq!("Auth", descriptor.name);
        assert_eq!(Some(&json!("ACTIVE")), descriptor.properties.get("State"));
        assert_eq!(
            Some(&json!(r#"{"Actions":[]}"#)),
            descriptor.properties.get("Content")
        );
        assert!(descriptor.properties.contains_key("Arn"));
    }

    #[test]
    fn unnamed_resources_are_rejected() {
        let flow = aws::ContactFlow::builder().id("f1").build();
        assert!(contact_flow("f1", flow).is_err());
    }
}
