//! # Flowport
//!
//! Flowport exports Amazon Connect contact-center configuration from a
//! source instance and emits a CloudFormation template that can recreate it
//! in another account or instance.
//!
//! ## Resources
//!
//! Four kinds of resources are exported, see [`ResourceKind`]:
//!
//! - contact flows
//! - contact flow modules
//! - hours of operation
//! - quick connects
//!
//! ## Pipeline
//!
//! Contact flows carry an opaque JSON document (`Content`) that embeds the
//! source account number, partition, region and instance id, as well as the
//! identifiers of other flows, modules, queues, prompts and hours of
//! operation. None of these are meaningful in the destination, so an export
//! runs in two phases:
//!
//! 1. **Fetch and normalize.** Each resource is read through a [`Source`],
//!    registered in an [`IdentifierMapBuilder`] and its content is
//!    normalized by a [`Normalizer`] (pseudo parameters, prompt, queue and
//!    phone number mappings).
//! 2. **Resolve.** Once every resource is known the builder is closed into
//!    [`IdentifierMaps`] and the [`Resolver`] rewrites references between
//!    exported resources into template references, falling back to the
//!    destination [`Manifest`] for resources that were not exported.
//!
//! The result is a [`Template`] that can be serialized exactly once.
//!
//! ## Error Handling
//!
//! Flowport exposes one error enum [`Error`] that encompasses all errors
//! that may occur during an export.
use snafu::prelude::*;

pub mod aws;
pub mod config;
pub mod fetch;
pub mod kind;
pub mod manifest;
pub mod normalize;
pub mod resolve;
pub mod rewrite;
pub mod source;
pub mod template;

pub use config::Config;
pub use fetch::{Fetched, Fetcher, IdentifierMapBuilder, IdentifierMaps};
pub use kind::{ResourceKind, SymbolicName};
pub use manifest::{Manifest, ManifestCategory, ManifestEntry};
pub use normalize::{Normalizer, SourceIdentity, Substitutions};
pub use resolve::Resolver;
pub use source::{Described, Page, ResourceDescriptor, Source, Summary};
pub use template::{PlaceholderStyle, Placeholders, Template, TemplateDraft};

/// Marker trait for errors reported by a [`Source`].
pub trait UserError: core::fmt::Display + core::fmt::Debug + Send + Sync + 'static {}
impl<T: core::fmt::Display + core::fmt::Debug + Send + Sync + 'static> UserError for T {}

/// Top-level error enum that encompasses all errors.
#[derive(snafu::Snafu, Debug)]
pub enum Error {
    #[snafu(display("{source}:\n{}",
                source.chain()
                    .map(|e| format!("{e}"))
                    .collect::<Vec<_>>()
                    .join("\n -> ")))]
    Aws { source: anyhow::Error },

    #[snafu(display("Could not read config file '{path:?}': {source}"))]
    ConfigRead {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Could not parse config file '{path:?}': {source}"))]
    ConfigJson {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("Could not parse config file '{path:?}': {source}"))]
    ConfigToml {
        path: std::path::PathBuf,
        source: toml::de::Error,
    },

    #[snafu(display(
        "The config file does not name a destination instance, \
        set 'Output.ConnectInstanceId' to collect a manifest"
    ))]
    MissingDestinationInstance,

    #[snafu(display(
        "The config file does not name an output file, \
        set 'Output.Filename' to export a template"
    ))]
    MissingOutputFile,

    #[snafu(display("Could not read manifest file '{path:?}': {source}"))]
    ManifestRead {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Could not parse manifest file '{path:?}': {source}"))]
    ManifestParse {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("Could not serialize {what}: {source}"))]
    Serialize {
        what: String,
        source: serde_json::Error,
    },

    #[snafu(display("Could not write file {path:?}: {source}"))]
    WriteFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Malformed instance ARN '{arn}'"))]
    InstanceArn { arn: String },

    #[snafu(display(
        "Substitution identifier '{inner}' occurs inside '{outer}', \
        normalization would be ambiguous"
    ))]
    OverlappingSubstitution { inner: String, outer: String },

    #[snafu(display("Could not list {category}: {error}"))]
    List {
        category: ManifestCategory,
        error: Box<dyn UserError>,
    },

    #[snafu(display("Could not describe {kind} '{id}': {error}"))]
    Describe {
        kind: ResourceKind,
        id: String,
        error: Box<dyn UserError>,
    },

    #[snafu(display("The {kind} '{id}' has a name without any alphanumeric characters"))]
    EmptyName { kind: ResourceKind, id: String },

    #[snafu(display(
        "The {kind} '{name}' and the {other_kind} '{other_name}' both derive \
        the template resource name '{symbol}'"
    ))]
    DuplicateSymbolicName {
        symbol: SymbolicName,
        kind: ResourceKind,
        name: String,
        other_kind: ResourceKind,
        other_name: String,
    },

    #[snafu(display("The {kind} '{resource}' has no text 'Content'"))]
    MissingContent {
        kind: ResourceKind,
        resource: SymbolicName,
    },

    #[snafu(display("Could not parse the content of '{resource}': {source}"))]
    ContentParse {
        resource: SymbolicName,
        source: serde_json::Error,
    },

    #[snafu(display(
        "The prompt '{prompt}' used in '{resource}' is not in the manifest's prompt table"
    ))]
    UnmappedPrompt {
        prompt: String,
        resource: SymbolicName,
    },

    #[snafu(display(
        "The queue '{queue}' used in '{resource}' is not in the manifest's queue table"
    ))]
    UnmappedQueue {
        queue: String,
        resource: SymbolicName,
    },

    #[snafu(display(
        "The referenced module '{module}' in the contact flow '{resource}' was not \
        exported and was not found in the destination Connect instance"
    ))]
    UnresolvedModule {
        module: String,
        resource: SymbolicName,
    },

    #[snafu(display(
        "The referenced contact flow '{flow}' in '{resource}' was not \
        exported and was not found in the destination Connect instance"
    ))]
    UnresolvedFlow {
        flow: String,
        resource: SymbolicName,
    },

    #[snafu(display(
        "The referenced hours of operation '{hours}' in '{resource}' were not \
        exported and were not found in the destination Connect instance"
    ))]
    UnresolvedHours {
        hours: String,
        resource: SymbolicName,
    },
}

impl From<anyhow::Error> for Error {
    fn from(source: anyhow::Error) -> Self {
        Error::Aws { source }
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Returns the trailing segment of an ARN-like identifier.
///
/// Bare identifiers are returned unchanged.
pub fn trailing_id(arn_or_id: &str) -> &str {
    arn_or_id.rsplit('/').next().unwrap_or(arn_or_id)
}

/// Runs a complete export against `source` and returns the finished template.
///
/// Resources are fetched per name filter in the configured kind order, each
/// one normalized as it arrives. Cross references are only resolved after
/// every filter has been fetched.
pub async fn export<S: Source>(
    source: &S,
    config: &Config,
    manifest: &Manifest,
    identity: &SourceIdentity,
) -> Result<Template> {
    let placeholders = config.placeholders();
    let normalizer = Normalizer::new(
        &identity.substitutions,
        manifest,
        &config.input.phone_number_mappings,
    );
    let mut identifiers = IdentifierMapBuilder::default();
    let mut draft = TemplateDraft::new(
        config.output.template_description.clone(),
        placeholders,
        identity.normalized_instance_arn(),
    );

    for filter in config.resource_filters.contact_flows.iter() {
        let exported = draft.len();
        for kind in config.resource_filters.kinds.iter().copied() {
            let fetched = Fetcher::new(source, &mut identifiers)
                .fetch(kind, filter)
                .await?;
            for Fetched {
                symbol,
                mut descriptor,
            } in fetched
            {
                let content = match descriptor.properties.remove("Content") {
                    Some(serde_json::Value::String(content)) => {
                        Some(normalizer.normalize(&symbol, &content)?)
                    }
                    Some(_) => {
                        return MissingContentSnafu {
                            kind,
                            resource: symbol,
                        }
                        .fail()
                    }
                    None => {
                        snafu::ensure!(
                            !kind.has_content(),
                            MissingContentSnafu {
                                kind,
                                resource: symbol
                            }
                        );
                        None
                    }
                };
                log::info!("exported {kind} '{}' as {symbol}", descriptor.name);
                draft.insert(symbol, descriptor, content);
            }
        }
        if draft.len() == exported {
            log::warn!("no new resources matched '{filter}'");
        }
    }

    let identifiers = identifiers.close();
    log::info!("resolving references between {} resources", identifiers.len());
    Resolver::new(source, &identifiers, manifest)
        .resolve(&mut draft)
        .await?;

    log::info!("assembled a template with {} resources", draft.len());
    Ok(draft.finish())
}
