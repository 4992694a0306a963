//! The CloudFormation template under construction.
use std::collections::BTreeMap;

use snafu::prelude::*;

use crate::{ResourceDescriptor, ResourceKind, Result, SerializeSnafu, SymbolicName, WriteFileSnafu};

/// Parameter holding the destination instance id.
pub const INSTANCE_ID_PARAMETER: &str = "ConnectInstanceID";
/// Parameter holding the destination instance ARN, Ref-style only.
pub const INSTANCE_ARN_PARAMETER: &str = "ConnectInstanceArn";
/// Parameter appended to every resource name when enabled.
pub const NAME_SUFFIX_PARAMETER: &str = "NameSuffix";

/// How the template refers to the destination instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// `InstanceArn` is the source instance ARN rebuilt with `Fn::Sub` from
    /// pseudo parameters and the `ConnectInstanceID` parameter.
    #[default]
    Sub,
    /// `InstanceArn` is a `Ref` to a `ConnectInstanceArn` parameter.
    Ref,
}

/// The placeholder policy of one export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Placeholders {
    pub style: PlaceholderStyle,
    /// Whether resource names get a `${NameSuffix}` appended.
    pub name_suffix: bool,
}

impl Placeholders {
    /// The `InstanceArn` property value.
    pub fn instance_arn(&self, normalized_instance_arn: &str) -> serde_json::Value {
        match self.style {
            PlaceholderStyle::Sub => serde_json::json!({ "Fn::Sub": normalized_instance_arn }),
            PlaceholderStyle::Ref => serde_json::json!({ "Ref": INSTANCE_ARN_PARAMETER }),
        }
    }

    /// The `Name` property value.
    pub fn name(&self, name: &str) -> serde_json::Value {
        if self.name_suffix {
            serde_json::json!({ "Fn::Sub": format!("{name}${{{NAME_SUFFIX_PARAMETER}}}") })
        } else {
            serde_json::Value::String(name.to_owned())
        }
    }

    /// The deployment-time inputs the template declares.
    pub fn parameters(&self) -> BTreeMap<String, Parameter> {
        let mut parameters = BTreeMap::from([(
            INSTANCE_ID_PARAMETER.to_owned(),
            Parameter::required(INSTANCE_ID_PARAMETER),
        )]);
        if self.style == PlaceholderStyle::Ref {
            parameters.insert(
                INSTANCE_ARN_PARAMETER.to_owned(),
                Parameter::required(INSTANCE_ARN_PARAMETER),
            );
        }
        if self.name_suffix {
            parameters.insert(
                NAME_SUFFIX_PARAMETER.to_owned(),
                Parameter {
                    ty: "String".to_owned(),
                    default: Some(String::new()),
                    description: Some("Appended to the name of every exported resource".to_owned()),
                    ..Default::default()
                },
            );
        }
        parameters
    }
}

/// A template parameter.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Parameter {
    #[serde(rename = "Type")]
    pub ty: String,
    #[serde(rename = "AllowedPattern", skip_serializing_if = "Option::is_none")]
    pub allowed_pattern: Option<String>,
    #[serde(rename = "ConstraintDescription", skip_serializing_if = "Option::is_none")]
    pub constraint_description: Option<String>,
    #[serde(rename = "Default", skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Parameter {
    /// A non-empty string parameter.
    pub fn required(name: &str) -> Self {
        Parameter {
            ty: "String".to_owned(),
            allowed_pattern: Some(".+".to_owned()),
            constraint_description: Some(format!("{name} is required")),
            ..Default::default()
        }
    }
}

/// A resource of the finished template.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TemplateResource {
    #[serde(rename = "Type")]
    pub ty: String,
    #[serde(rename = "Properties")]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// The finished template.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, TemplateResource>,
    #[serde(rename = "Parameters")]
    pub parameters: BTreeMap<String, Parameter>,
}

impl Template {
    /// Serializes the template as JSON indented by four spaces.
    pub fn to_json_string(&self) -> Result<String> {
        use serde::Serialize;

        let mut buffer = vec![];
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)
            .context(SerializeSnafu { what: "template" })?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = self.to_json_string()?;
        log::info!("writing template with {} resources to {path:?}", self.resources.len());
        std::fs::write(path, contents).context(WriteFileSnafu { path })
    }
}

/// A resource before its cross references are resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct DraftResource {
    pub kind: ResourceKind,
    pub properties: serde_json::Map<String, serde_json::Value>,
    /// Normalized `Content`, kept as text until the template is finished.
    pub content: Option<String>,
}

/// Accumulates resources until the template is finished.
#[derive(Clone, Debug)]
pub struct TemplateDraft {
    description: String,
    placeholders: Placeholders,
    normalized_instance_arn: String,
    resources: BTreeMap<SymbolicName, DraftResource>,
}

impl TemplateDraft {
    pub fn new(
        description: impl Into<String>,
        placeholders: Placeholders,
        normalized_instance_arn: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            placeholders,
            normalized_instance_arn: normalized_instance_arn.into(),
            resources: Default::default(),
        }
    }

    /// Adds a fetched resource.
    ///
    /// `content` is the normalized content, if the resource has any. The
    /// remaining properties are shaped for the template: `InstanceArn` and
    /// `Name` follow the placeholder policy, module `State` is uppercased
    /// whichever case the source reported it in.
    pub fn insert(
        &mut self,
        symbol: SymbolicName,
        descriptor: ResourceDescriptor,
        content: Option<String>,
    ) {
        let ResourceDescriptor {
            kind,
            name,
            mut properties,
            ..
        } = descriptor;
        properties.insert(
            "InstanceArn".to_owned(),
            self.placeholders.instance_arn(&self.normalized_instance_arn),
        );
        properties.insert("Name".to_owned(), self.placeholders.name(&name));
        if kind == ResourceKind::Module {
            if let Some(serde_json::Value::String(state)) = properties.get_mut("State") {
                *state = state.to_uppercase();
            }
        }
        self.resources.insert(
            symbol,
            DraftResource {
                kind,
                properties,
                content,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterates over the resources that carry content.
    pub fn contents_mut(&mut self) -> impl Iterator<Item = (&SymbolicName, &mut String)> {
        self.resources
            .iter_mut()
            .filter_map(|(symbol, resource)| Some((symbol, resource.content.as_mut()?)))
    }

    /// Finishes the template, wrapping each content in a single `Fn::Sub`.
    pub fn finish(self) -> Template {
        let parameters = self.placeholders.parameters();
        let resources = self
            .resources
            .into_iter()
            .map(|(symbol, resource)| {
                let DraftResource {
                    kind,
                    mut properties,
                    content,
                } = resource;
                if let Some(content) = content {
                    properties.insert(
                        "Content".to_owned(),
                        serde_json::json!({ "Fn::Sub": content }),
                    );
                }
                (
                    symbol.to_string(),
                    TemplateResource {
                        ty: kind.template_type().to_owned(),
                        properties,
                    },
                )
            })
            .collect();
        Template {
            format_version: "2010-09-09".to_owned(),
            description: self.description,
            resources,
            parameters,
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    fn module() -> ResourceDescriptor {
        ResourceDescriptor {
            kind: ResourceKind::Module,
            source_id: "m1".to_owned(),
            name: "Auth".to_owned(),
            properties: serde_json::json!({ "Name": "Auth", "State": "active" })
                .as_object()
                .cloned()
                .unwrap(),
        }
    }

    #[test]
    fn sub_style_template() {
        let mut draft =
            TemplateDraft::new("export", Placeholders::default(), "arn:${AWS::Partition}:x");
        let symbol = SymbolicName::derive(ResourceKind::Module, "Auth").unwrap();
        draft.insert(symbol, module(), Some(r#"{"Actions":[]}"#.to_owned()));
        let template = draft.finish();

        assert_eq!(
            serde_json::json!({
                "AWSTemplateFormatVersion": "2010-09-09",
                "Description": "export",
                "Resources": {
                    "AuthModule": {
                        "Type": "AWS::Connect::ContactFlowModule",
                        "Properties": {
                            "Name": "Auth",
                            "State": "ACTIVE",
                            "InstanceArn": { "Fn::Sub": "arn:${AWS::Partition}:x" },
                            "Content": { "Fn::Sub": "{\"Actions\":[]}" }
                        }
                    }
                },
                "Parameters": {
                    "ConnectInstanceID": {
                        "Type": "String",
                        "AllowedPattern": ".+",
                        "ConstraintDescription": "ConnectInstanceID is required"
                    }
                }
            }),
            serde_json::to_value(&template).unwrap()
        );
    }

    #[test]
    fn ref_style_with_name_suffix() {
        let placeholders = Placeholders {
            style: PlaceholderStyle::Ref,
            name_suffix: true,
        };
        let mut draft = TemplateDraft::new("export", placeholders, "unused");
        let symbol = SymbolicName::derive(ResourceKind::Module, "Auth").unwrap();
        draft.insert(symbol, module(), None);
        let template = draft.finish();

        let properties = &template.resources["AuthModule"].properties;
        assert_eq!(
            serde_json::json!({ "Ref": "ConnectInstanceArn" }),
            properties["InstanceArn"]
        );
        assert_eq!(
            serde_json::json!({ "Fn::Sub": "Auth${NameSuffix}" }),
            properties["Name"]
        );
        assert!(!properties.contains_key("Content"));
        assert_eq!(
            vec!["ConnectInstanceArn", "ConnectInstanceID", "NameSuffix"],
            template.parameters.keys().collect::<Vec<_>>()
        );
        assert_eq!(Some(String::new()), template.parameters["NameSuffix"].default);
    }

    #[test]
    fn serializes_with_four_space_indent() {
        let template = TemplateDraft::new("d", Placeholders::default(), "arn").finish();
        let json = template.to_json_string().unwrap();
        assert!(json.contains("\n    \"AWSTemplateFormatVersion\": \"2010-09-09\""));
    }
}
