//! The export configuration document.
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use snafu::prelude::*;

use crate::{
    ConfigJsonSnafu, ConfigReadSnafu, ConfigTomlSnafu, MissingDestinationInstanceSnafu,
    MissingOutputFileSnafu,
    PlaceholderStyle, Placeholders, ResourceKind, Result,
};

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Input {
    /// The instance resources are exported from.
    pub connect_instance_id: String,
    /// Source phone number to destination phone number.
    #[serde(default)]
    pub phone_number_mappings: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    /// Where the template is written, only needed to export.
    #[serde(default)]
    pub filename: Option<PathBuf>,
    #[serde(default)]
    pub template_description: String,
    pub manifest_file_name: PathBuf,
    /// The instance a manifest is collected from.
    #[serde(default)]
    pub connect_instance_id: Option<String>,
}

fn all_kinds() -> Vec<ResourceKind> {
    ResourceKind::ALL.to_vec()
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceFilters {
    /// Name substrings selecting the resources to export.
    #[serde(default)]
    pub contact_flows: Vec<String>,
    /// Kinds fetched for each filter, in order.
    #[serde(default = "all_kinds")]
    pub kinds: Vec<ResourceKind>,
}

impl Default for ResourceFilters {
    fn default() -> Self {
        Self {
            contact_flows: vec![],
            kinds: all_kinds(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateSettings {
    #[serde(default)]
    pub placeholders: PlaceholderStyle,
    #[serde(default)]
    pub name_suffix: bool,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    pub input: Input,
    pub output: Output,
    #[serde(default)]
    pub resource_filters: ResourceFilters,
    #[serde(default)]
    pub template: TemplateSettings,
    /// Directory relative output paths resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Config {
    /// Parses a configuration document, TOML if `path` ends in `.toml` and
    /// JSON otherwise.
    pub fn parse(contents: &str, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config: Config = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(contents).context(ConfigTomlSnafu { path })?
        } else {
            serde_json::from_str(contents).context(ConfigJsonSnafu { path })?
        };
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        if config.resource_filters.contact_flows.is_empty() {
            log::warn!("{path:?} has no 'ResourceFilters.ContactFlows', nothing will be exported");
        }
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("reading config {path:?}");
        let contents = std::fs::read_to_string(path).context(ConfigReadSnafu { path })?;
        Self::parse(&contents, path)
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Where the template is written.
    pub fn output_path(&self) -> Result<PathBuf> {
        let filename = self
            .output
            .filename
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
            .context(MissingOutputFileSnafu)?;
        Ok(self.resolve_path(filename))
    }

    /// Where the manifest is read from and written to.
    pub fn manifest_path(&self) -> PathBuf {
        self.resolve_path(&self.output.manifest_file_name)
    }

    pub fn placeholders(&self) -> Placeholders {
        Placeholders {
            style: self.template.placeholders,
            name_suffix: self.template.name_suffix,
        }
    }

    pub fn destination_instance_id(&self) -> Result<&str> {
        self.output
            .connect_instance_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .context(MissingDestinationInstanceSnafu)
    }
}
