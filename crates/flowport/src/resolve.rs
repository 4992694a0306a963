//! Cross-reference resolution.
//!
//! Runs once every resource has been fetched. References between exported
//! resources become template references, references to anything else are
//! resolved through the destination [`Manifest`].
use std::collections::BTreeMap;

use snafu::prelude::*;

use crate::{
    normalize::{ACCOUNT_ID, INSTANCE_ID, PARTITION, REGION},
    rewrite::SpanEdits,
    trailing_id, ContentParseSnafu, Described, Error, IdentifierMaps, Manifest, ResourceKind,
    Result, Source, SymbolicName, TemplateDraft, UnresolvedFlowSnafu, UnresolvedHoursSnafu,
    UnresolvedModuleSnafu,
};

/// A reference found in the actions of a flow document.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Reference {
    /// Full ARN of a flow, from `TransferToFlow` or `UpdateContactEventHooks`.
    Flow(String),
    /// Bare id of a module, from `InvokeFlowModule`.
    Module(String),
    /// Full ARN of hours of operation, from `CheckHoursOfOperation`.
    Hours(String),
}

impl Reference {
    fn needle(&self) -> &str {
        match self {
            Reference::Flow(text) | Reference::Module(text) | Reference::Hours(text) => text,
        }
    }

    fn kind(&self) -> ResourceKind {
        match self {
            Reference::Flow(_) => ResourceKind::Flow,
            Reference::Module(_) => ResourceKind::Module,
            Reference::Hours(_) => ResourceKind::HoursOfOperation,
        }
    }
}

fn text_field<'v>(value: &'v serde_json::Value, field: &str) -> Option<&'v str> {
    value.get(field).and_then(serde_json::Value::as_str)
}

fn parameter<'v>(action: &'v serde_json::Value, pointer: &str) -> Option<&'v str> {
    action
        .get("Parameters")
        .and_then(|parameters| parameters.pointer(pointer))
        .and_then(serde_json::Value::as_str)
}

/// Locates the references in a flow document's `Actions`.
///
/// Flows come first, then modules, then hours of operation. Each distinct
/// reference is returned once.
fn locate(flow: &serde_json::Value) -> Vec<Reference> {
    let actions = flow
        .get("Actions")
        .and_then(serde_json::Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let of_type = |ty: &'static str| {
        actions
            .iter()
            .filter(move |action| text_field(action, "Type") == Some(ty))
    };

    let flows = of_type("TransferToFlow")
        .filter_map(|action| parameter(action, "/ContactFlowId"))
        .chain(
            of_type("UpdateContactEventHooks")
                .filter_map(|action| parameter(action, "/EventHooks/CustomerQueue")),
        )
        .map(|arn| Reference::Flow(arn.to_owned()));
    let modules = of_type("InvokeFlowModule")
        .filter_map(|action| parameter(action, "/FlowModuleId"))
        .map(|id| Reference::Module(id.to_owned()));
    let hours = of_type("CheckHoursOfOperation")
        .filter_map(|action| parameter(action, "/Hours"))
        .map(|arn| Reference::Hours(arn.to_owned()));

    let mut references: Vec<Reference> = vec![];
    for reference in flows.chain(modules).chain(hours) {
        if !reference.needle().is_empty() && !references.contains(&reference) {
            references.push(reference);
        }
    }
    references
}

/// Rewrites references in the contents of a [`TemplateDraft`].
///
/// Only accepts closed [`IdentifierMaps`], so no reference can be resolved
/// before every resource is known.
pub struct Resolver<'a, S> {
    source: &'a S,
    identifiers: &'a IdentifierMaps,
    manifest: &'a Manifest,
    /// Names of resources that were looked up on the source, by kind and id.
    names: BTreeMap<(ResourceKind, String), Option<String>>,
}

impl<'a, S: Source> Resolver<'a, S> {
    pub fn new(source: &'a S, identifiers: &'a IdentifierMaps, manifest: &'a Manifest) -> Self {
        Self {
            source,
            identifiers,
            manifest,
            names: Default::default(),
        }
    }

    /// Resolves the references of every resource in `draft` that has content.
    pub async fn resolve(&mut self, draft: &mut TemplateDraft) -> Result<()> {
        for (resource, content) in draft.contents_mut() {
            let resolved = self.resolve_content(resource, content).await?;
            *content = resolved;
        }
        Ok(())
    }

    async fn resolve_content(&mut self, resource: &SymbolicName, content: &str) -> Result<String> {
        let flow: serde_json::Value = serde_json::from_str(content).context(ContentParseSnafu {
            resource: resource.clone(),
        })?;
        let references = locate(&flow);
        if references.is_empty() {
            return Ok(content.to_owned());
        }

        log::info!("{resource}: resolving {} references", references.len());
        let mut edits = SpanEdits::new(content);
        for reference in references {
            let needle = reference.needle();
            let replacement = self.replacement(resource, &reference).await?;
            let found = edits.replace_all(needle, &replacement);
            if found == 0 {
                log::warn!(
                    "{resource}: reference '{needle}' was located but not found in the content"
                );
            } else {
                log::debug!("{resource}: {needle} -> {replacement} ({found}x)");
            }
        }
        if edits.is_empty() {
            return Ok(content.to_owned());
        }
        Ok(edits.apply())
    }

    /// The text that replaces `reference` in the content of `resource`.
    async fn replacement(
        &mut self,
        resource: &SymbolicName,
        reference: &Reference,
    ) -> Result<String> {
        let kind = reference.kind();
        let id = trailing_id(reference.needle());
        if let Some(symbol) = self.identifiers.get(kind, id) {
            return Ok(match reference {
                Reference::Flow(_) => symbol.sub_attribute(kind.arn_attribute()),
                Reference::Module(_) => symbol.sub_ref(),
                Reference::Hours(_) => format!(
                    "arn:{PARTITION}:connect:{REGION}:{ACCOUNT_ID}:instance/{INSTANCE_ID}\
                    /operating-hours/{}",
                    symbol.sub_attribute(kind.arn_attribute())
                ),
            });
        }

        let name = self.source_name(kind, id).await?;
        let entry = name
            .as_deref()
            .and_then(|name| self.manifest.lookup(kind.manifest_category(), name));
        let destination = match reference {
            Reference::Module(_) => entry.and_then(|entry| entry.id.clone()),
            Reference::Flow(_) | Reference::Hours(_) => entry.and_then(|entry| entry.arn.clone()),
        };
        let shown = name.unwrap_or_else(|| id.to_owned());
        let destination = match reference {
            Reference::Flow(_) => destination.context(UnresolvedFlowSnafu {
                flow: shown,
                resource: resource.clone(),
            })?,
            Reference::Module(_) => destination.context(UnresolvedModuleSnafu {
                module: shown,
                resource: resource.clone(),
            })?,
            Reference::Hours(_) => destination.context(UnresolvedHoursSnafu {
                hours: shown,
                resource: resource.clone(),
            })?,
        };
        log::info!(
            "{resource}: {kind} '{id}' was not exported, using {destination} from the manifest"
        );
        Ok(destination)
    }

    /// Looks up the name of a resource that was not exported.
    ///
    /// Returns `None` for flows that are not published.
    async fn source_name(&mut self, kind: ResourceKind, id: &str) -> Result<Option<String>> {
        let key = (kind, id.to_owned());
        if let Some(name) = self.names.get(&key) {
            return Ok(name.clone());
        }
        let described = self
            .source
            .describe(kind, id)
            .await
            .map_err(|error| Error::Describe {
                kind,
                id: id.to_owned(),
                error: Box::new(error),
            })?;
        let name = match described {
            Described::Found(descriptor) => Some(descriptor.name),
            Described::NotPublished => None,
        };
        self.names.insert(key, name.clone());
        Ok(name)
    }
}
