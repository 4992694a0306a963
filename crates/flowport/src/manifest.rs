//! The destination manifest.
//!
//! A manifest maps the names of resources that already exist in the
//! destination instance to their identifiers. It is produced by
//! [`collect`] (the `manifest` command) and read before an export.
use std::collections::BTreeMap;

use snafu::prelude::*;

use crate::{
    Error, ManifestParseSnafu, ManifestReadSnafu, Result, SerializeSnafu, Source,
    WriteFileSnafu,
};

/// The tables of a manifest, named by their keys in the manifest document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ManifestCategory {
    Modules,
    Flows,
    HoursOfOperation,
    PhoneNumbers,
    Prompts,
    Queues,
    QuickConnects,
    RoutingProfiles,
}

impl core::fmt::Display for ManifestCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ManifestCategory::Modules => "contact flow modules",
            ManifestCategory::Flows => "contact flows",
            ManifestCategory::HoursOfOperation => "hours of operation",
            ManifestCategory::PhoneNumbers => "phone numbers",
            ManifestCategory::Prompts => "prompts",
            ManifestCategory::Queues => "queues",
            ManifestCategory::QuickConnects => "quick connects",
            ManifestCategory::RoutingProfiles => "routing profiles",
        })
    }
}

impl ManifestCategory {
    pub const ALL: [ManifestCategory; 8] = [
        ManifestCategory::Modules,
        ManifestCategory::Flows,
        ManifestCategory::HoursOfOperation,
        ManifestCategory::PhoneNumbers,
        ManifestCategory::Prompts,
        ManifestCategory::Queues,
        ManifestCategory::QuickConnects,
        ManifestCategory::RoutingProfiles,
    ];
}

/// Identifiers of one destination resource.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "RawEntry")]
pub struct ManifestEntry {
    #[serde(rename = "Arn", skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(rename = "Id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Older manifests store hours of operation as a bare ARN.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Arn(String),
    Record {
        #[serde(rename = "Arn", default)]
        arn: Option<String>,
        #[serde(rename = "Id", default)]
        id: Option<String>,
    },
}

impl From<RawEntry> for ManifestEntry {
    fn from(raw: RawEntry) -> Self {
        match raw {
            RawEntry::Arn(arn) => ManifestEntry {
                arn: Some(arn),
                id: None,
            },
            RawEntry::Record { arn, id } => ManifestEntry { arn, id },
        }
    }
}

/// Name to identifiers, for one category.
pub type ManifestTable = BTreeMap<String, ManifestEntry>;

/// Destination resources by category and name.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Manifest {
    #[serde(
        rename = "ContactFlowModulesSummaryList",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    modules: ManifestTable,
    #[serde(
        rename = "ContactFlowSummaryList",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    flows: ManifestTable,
    #[serde(
        rename = "HoursOfOperationSummaryList",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    hours_of_operation: ManifestTable,
    #[serde(
        rename = "PhoneNumberSummaryList",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    phone_numbers: ManifestTable,
    #[serde(
        rename = "PromptSummaryList",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    prompts: ManifestTable,
    #[serde(
        rename = "QueueSummaryList",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    queues: ManifestTable,
    #[serde(
        rename = "QuickConnectSummaryList",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    quick_connects: ManifestTable,
    #[serde(
        rename = "RoutingProfileSummaryList",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    routing_profiles: ManifestTable,
}

impl Manifest {
    pub fn table(&self, category: ManifestCategory) -> &ManifestTable {
        match category {
            ManifestCategory::Modules => &self.modules,
            ManifestCategory::Flows => &self.flows,
            ManifestCategory::HoursOfOperation => &self.hours_of_operation,
            ManifestCategory::PhoneNumbers => &self.phone_numbers,
            ManifestCategory::Prompts => &self.prompts,
            ManifestCategory::Queues => &self.queues,
            ManifestCategory::QuickConnects => &self.quick_connects,
            ManifestCategory::RoutingProfiles => &self.routing_profiles,
        }
    }

    pub fn table_mut(&mut self, category: ManifestCategory) -> &mut ManifestTable {
        match category {
            ManifestCategory::Modules => &mut self.modules,
            ManifestCategory::Flows => &mut self.flows,
            ManifestCategory::HoursOfOperation => &mut self.hours_of_operation,
            ManifestCategory::PhoneNumbers => &mut self.phone_numbers,
            ManifestCategory::Prompts => &mut self.prompts,
            ManifestCategory::Queues => &mut self.queues,
            ManifestCategory::QuickConnects => &mut self.quick_connects,
            ManifestCategory::RoutingProfiles => &mut self.routing_profiles,
        }
    }

    pub fn lookup(&self, category: ManifestCategory, name: &str) -> Option<&ManifestEntry> {
        self.table(category).get(name)
    }

    pub fn insert(
        &mut self,
        category: ManifestCategory,
        name: impl Into<String>,
        entry: ManifestEntry,
    ) {
        self.table_mut(category).insert(name.into(), entry);
    }

    pub fn from_json_str(contents: &str, path: impl AsRef<std::path::Path>) -> Result<Self> {
        serde_json::from_str(contents).context(ManifestParseSnafu {
            path: path.as_ref(),
        })
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("reading manifest {path:?}");
        let contents = std::fs::read_to_string(path).context(ManifestReadSnafu { path })?;
        Self::from_json_str(&contents, path)
    }

    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self).context(SerializeSnafu {
            what: "manifest",
        })?;
        log::info!("writing manifest to {path:?}");
        std::fs::write(path, contents).context(WriteFileSnafu { path })
    }
}

/// Lists every category of `source` into a new manifest.
///
/// All pages are accumulated. Entries are keyed by name, phone numbers by
/// the number itself.
pub async fn collect<S: Source>(source: &S) -> Result<Manifest> {
    let mut manifest = Manifest::default();
    for category in ManifestCategory::ALL {
        let mut next_token = None;
        let mut count = 0;
        loop {
            let page = source
                .list_page(category, next_token.take())
                .await
                .map_err(|error| Error::List {
                    category,
                    error: Box::new(error),
                })?;
            for summary in page.items {
                count += 1;
                manifest.insert(
                    category,
                    summary.name,
                    ManifestEntry {
                        arn: summary.arn,
                        id: Some(summary.id),
                    },
                );
            }
            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }
        log::info!("collected {count} {category}");
    }
    Ok(manifest)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn reads_both_entry_shapes() {
        let manifest = Manifest::from_json_str(
            r#"{
                "HoursOfOperationSummaryList": {
                    "Basic Hours": "arn:aws:connect:us-east-1:210987654321:instance/dest/operating-hours/h9"
                },
                "PromptSummaryList": {
                    "Beep.wav": { "Arn": "arn:aws:connect:us-east-1:210987654321:instance/dest/prompt/p9", "Id": "p9" }
                },
                "PhoneNumberSummaryList": {
                    "+15555550100": { "Arn": "arn:phone", "Name": "+15555550100" }
                },
                "SomethingNew": {}
            }"#,
            "manifest.json",
        )
        .unwrap();

        assert_eq!(
            Some("p9"),
            manifest
                .lookup(ManifestCategory::Prompts, "Beep.wav")
                .and_then(|entry| entry.id.as_deref())
        );
        let hours = manifest
            .lookup(ManifestCategory::HoursOfOperation, "Basic Hours")
            .unwrap();
        assert_eq!(None, hours.id);
        assert!(hours.arn.as_deref().unwrap().ends_with("/h9"));
        assert_eq!(
            Some("arn:phone"),
            manifest
                .lookup(ManifestCategory::PhoneNumbers, "+15555550100")
                .and_then(|entry| entry.arn.as_deref())
        );
        assert_eq!(None, manifest.lookup(ManifestCategory::Queues, "BasicQueue"));
    }

    #[test]
    fn serializes_with_category_keys() {
        let mut manifest = Manifest::default();
        manifest.insert(
            ManifestCategory::Queues,
            "BasicQueue",
            ManifestEntry {
                arn: Some("arn:queue".into()),
                id: Some("q9".into()),
            },
        );
        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(
            serde_json::json!({
                "QueueSummaryList": {
                    "BasicQueue": { "Arn": "arn:queue", "Id": "q9" }
                }
            }),
            value
        );
        let back: Manifest = serde_json::from_value(value).unwrap();
        assert_eq!(manifest, back);
    }
}
