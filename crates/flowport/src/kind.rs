//! Resource kinds and the template names derived from them.
use crate::ManifestCategory;

/// The kinds of Amazon Connect resources an export can contain.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum ResourceKind {
    HoursOfOperation,
    Flow,
    Module,
    QuickConnect,
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ResourceKind::HoursOfOperation => "hours of operation",
            ResourceKind::Flow => "contact flow",
            ResourceKind::Module => "contact flow module",
            ResourceKind::QuickConnect => "quick connect",
        })
    }
}

/// Fields that every kind drops from the described properties.
const COMMON_EXCLUDED: &[&str] = &[
    "Id",
    "Arn",
    "ResponseMetadata",
    "InstanceId",
    "Tags",
    "Description",
    "Status",
];

impl ResourceKind {
    /// All kinds, in the order the export fetches them for each filter.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::HoursOfOperation,
        ResourceKind::Flow,
        ResourceKind::Module,
        ResourceKind::QuickConnect,
    ];

    /// Suffix appended to the sanitized name to build the [`SymbolicName`].
    pub fn suffix(&self) -> &'static str {
        match self {
            ResourceKind::HoursOfOperation => "HoursOfOperation",
            ResourceKind::Flow => "",
            ResourceKind::Module => "Module",
            ResourceKind::QuickConnect => "QuickConnect",
        }
    }

    /// The CloudFormation resource type.
    pub fn template_type(&self) -> &'static str {
        match self {
            ResourceKind::HoursOfOperation => "AWS::Connect::HoursOfOperation",
            ResourceKind::Flow => "AWS::Connect::ContactFlow",
            ResourceKind::Module => "AWS::Connect::ContactFlowModule",
            ResourceKind::QuickConnect => "AWS::Connect::QuickConnect",
        }
    }

    /// The `Fn::GetAtt` attribute holding the ARN of the created resource.
    pub fn arn_attribute(&self) -> &'static str {
        match self {
            ResourceKind::HoursOfOperation => "HoursOfOperationArn",
            ResourceKind::Flow => "ContactFlowArn",
            ResourceKind::Module => "ContactFlowModuleArn",
            ResourceKind::QuickConnect => "QuickConnectArn",
        }
    }

    /// Whether resources of this kind carry a `Content` document.
    pub fn has_content(&self) -> bool {
        matches!(self, ResourceKind::Flow | ResourceKind::Module)
    }

    /// Whether a described property is metadata rather than configuration.
    pub fn is_excluded(&self, field: &str) -> bool {
        let specific: &[&str] = match self {
            ResourceKind::HoursOfOperation => &[
                "HoursOfOperationId",
                "HoursOfOperationArn",
                "LastModifiedTime",
                "LastModifiedRegion",
            ],
            ResourceKind::QuickConnect => &[
                "QuickConnectId",
                "QuickConnectARN",
                "LastModifiedTime",
                "LastModifiedRegion",
            ],
            ResourceKind::Flow | ResourceKind::Module => &[],
        };
        COMMON_EXCLUDED.contains(&field) || specific.contains(&field)
    }

    /// The manifest table listing resources of this kind.
    pub fn manifest_category(&self) -> ManifestCategory {
        match self {
            ResourceKind::HoursOfOperation => ManifestCategory::HoursOfOperation,
            ResourceKind::Flow => ManifestCategory::Flows,
            ResourceKind::Module => ManifestCategory::Modules,
            ResourceKind::QuickConnect => ManifestCategory::QuickConnects,
        }
    }
}

/// The logical id of a resource in the output template.
///
/// Derived from the resource name by dropping every character that is not
/// ASCII alphanumeric and appending the kind's suffix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolicName(String);

impl core::fmt::Display for SymbolicName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SymbolicName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SymbolicName {
    /// Derive the symbolic name of a resource.
    ///
    /// Returns `None` if the name has no alphanumeric characters.
    pub fn derive(kind: ResourceKind, name: &str) -> Option<Self> {
        let sanitized = name
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>();
        if sanitized.is_empty() {
            None
        } else {
            Some(SymbolicName(sanitized + kind.suffix()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `${Name}`, a reference to this resource inside an `Fn::Sub` string.
    pub fn sub_ref(&self) -> String {
        format!("${{{}}}", self.0)
    }

    /// `${Name.Attribute}`, an attribute of this resource inside an `Fn::Sub` string.
    pub fn sub_attribute(&self, attribute: &str) -> String {
        format!("${{{}.{attribute}}}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn symbolic_names_strip_and_suffix() {
        let derive = |kind, name| SymbolicName::derive(kind, name).map(|s| s.to_string());
        assert_eq!(Some("MainMenu".to_owned()), derive(ResourceKind::Flow, "Main Menu"));
        assert_eq!(
            Some("Auth2v1Module".to_owned()),
            derive(ResourceKind::Module, "Auth_2 (v1)")
        );
        assert_eq!(
            Some("BusinessHoursHoursOfOperation".to_owned()),
            derive(ResourceKind::HoursOfOperation, "Business-Hours")
        );
        assert_eq!(
            Some("SupportQuickConnect".to_owned()),
            derive(ResourceKind::QuickConnect, "Support!")
        );
        assert_eq!(None, derive(ResourceKind::Flow, "__ --"));
    }

    #[test]
    fn sub_references() {
        let sub = SymbolicName::derive(ResourceKind::Flow, "Sub").unwrap();
        assert_eq!("${Sub}", sub.sub_ref());
        assert_eq!("${Sub.ContactFlowArn}", sub.sub_attribute("ContactFlowArn"));
    }

    #[test]
    fn excluded_fields() {
        assert!(ResourceKind::Flow.is_excluded("Arn"));
        assert!(ResourceKind::Module.is_excluded("Status"));
        assert!(!ResourceKind::Module.is_excluded("State"));
        assert!(ResourceKind::QuickConnect.is_excluded("QuickConnectARN"));
        assert!(!ResourceKind::Flow.is_excluded("QuickConnectARN"));
        assert!(ResourceKind::HoursOfOperation.is_excluded("HoursOfOperationArn"));
    }
}
