//! Fetching resources and registering their identifiers.
use std::collections::BTreeMap;

use snafu::OptionExt;

use crate::{
    trailing_id, Described, DuplicateSymbolicNameSnafu, EmptyNameSnafu, Error, ResourceDescriptor,
    ResourceKind, Result, Source, SymbolicName,
};

/// Source id to symbolic name, for a single kind.
pub type IdentifierMap = BTreeMap<String, SymbolicName>;

#[derive(Clone, Debug, Default)]
struct PerKind<T> {
    hours_of_operation: T,
    flows: T,
    modules: T,
    quick_connects: T,
}

impl<T> PerKind<T> {
    fn get(&self, kind: ResourceKind) -> &T {
        match kind {
            ResourceKind::HoursOfOperation => &self.hours_of_operation,
            ResourceKind::Flow => &self.flows,
            ResourceKind::Module => &self.modules,
            ResourceKind::QuickConnect => &self.quick_connects,
        }
    }

    fn get_mut(&mut self, kind: ResourceKind) -> &mut T {
        match kind {
            ResourceKind::HoursOfOperation => &mut self.hours_of_operation,
            ResourceKind::Flow => &mut self.flows,
            ResourceKind::Module => &mut self.modules,
            ResourceKind::QuickConnect => &mut self.quick_connects,
        }
    }
}

/// Accumulates identifier maps while resources are being fetched.
///
/// Closing the builder with [`IdentifierMapBuilder::close`] is the only way
/// to obtain the [`IdentifierMaps`] that cross-reference resolution needs.
#[derive(Debug, Default)]
pub struct IdentifierMapBuilder {
    maps: PerKind<IdentifierMap>,
    /// Every symbolic name handed out so far, with its kind and resource name.
    claimed: BTreeMap<SymbolicName, (ResourceKind, String)>,
}

impl IdentifierMapBuilder {
    /// Returns the symbolic name already registered for this resource, if any.
    pub fn get(&self, kind: ResourceKind, source_id: &str) -> Option<&SymbolicName> {
        self.maps.get(kind).get(source_id)
    }

    /// Registers a resource and returns its symbolic name.
    ///
    /// Registering the same resource twice returns the same name. Two
    /// different resources deriving the same name is an error.
    pub fn register(
        &mut self,
        kind: ResourceKind,
        source_id: &str,
        name: &str,
    ) -> Result<SymbolicName> {
        if let Some(symbol) = self.get(kind, source_id) {
            return Ok(symbol.clone());
        }
        let symbol = SymbolicName::derive(kind, name).context(EmptyNameSnafu {
            kind,
            id: source_id,
        })?;
        if let Some((other_kind, other_name)) = self.claimed.get(&symbol) {
            return DuplicateSymbolicNameSnafu {
                symbol,
                kind,
                name,
                other_kind: *other_kind,
                other_name,
            }
            .fail();
        }
        log::debug!("registered {kind} '{source_id}' as {symbol}");
        self.claimed
            .insert(symbol.clone(), (kind, name.to_owned()));
        self.maps
            .get_mut(kind)
            .insert(source_id.to_owned(), symbol.clone());
        Ok(symbol)
    }

    pub fn close(self) -> IdentifierMaps {
        IdentifierMaps { maps: self.maps }
    }
}

/// The closed, read-only identifier maps of one export.
#[derive(Clone, Debug, Default)]
pub struct IdentifierMaps {
    maps: PerKind<IdentifierMap>,
}

impl IdentifierMaps {
    pub fn get(&self, kind: ResourceKind, source_id: &str) -> Option<&SymbolicName> {
        self.maps.get(kind).get(source_id)
    }

    pub fn map(&self, kind: ResourceKind) -> &IdentifierMap {
        self.maps.get(kind)
    }

    /// Total number of registered resources across all kinds.
    pub fn len(&self) -> usize {
        ResourceKind::ALL
            .iter()
            .map(|kind| self.maps.get(*kind).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fetched resource with its registered name.
#[derive(Clone, Debug, PartialEq)]
pub struct Fetched {
    pub symbol: SymbolicName,
    pub descriptor: ResourceDescriptor,
}

/// Reads resources whose names contain a filter from a [`Source`].
pub struct Fetcher<'a, S> {
    source: &'a S,
    identifiers: &'a mut IdentifierMapBuilder,
}

impl<'a, S: Source> Fetcher<'a, S> {
    pub fn new(source: &'a S, identifiers: &'a mut IdentifierMapBuilder) -> Self {
        Self {
            source,
            identifiers,
        }
    }

    /// Fetches every resource of `kind` whose name contains `filter`.
    ///
    /// Pages are requested one after the other. Unpublished flows are
    /// skipped with a warning, resources already fetched through an earlier
    /// filter are skipped silently. Each returned resource is registered and
    /// stripped of metadata fields.
    pub async fn fetch(&mut self, kind: ResourceKind, filter: &str) -> Result<Vec<Fetched>> {
        let category = kind.manifest_category();
        let mut fetched = vec![];
        let mut next_token = None;
        loop {
            let page = self
                .source
                .list_page(category, next_token.take())
                .await
                .map_err(|error| Error::List {
                    category,
                    error: Box::new(error),
                })?;
            for summary in page.items {
                if !summary.name.contains(filter) {
                    continue;
                }
                let id = trailing_id(&summary.id);
                if self.identifiers.get(kind, id).is_some() {
                    log::debug!("{kind} '{}' was already exported", summary.name);
                    continue;
                }
                let described =
                    self.source
                        .describe(kind, id)
                        .await
                        .map_err(|error| Error::Describe {
                            kind,
                            id: id.to_owned(),
                            error: Box::new(error),
                        })?;
                let descriptor = match described {
                    Described::Found(descriptor) => descriptor,
                    Described::NotPublished => {
                        log::warn!(
                            "{kind} '{}' is not published, unable to export",
                            summary.name
                        );
                        continue;
                    }
                };
                let symbol = self.identifiers.register(kind, id, &summary.name)?;
                fetched.push(Fetched {
                    symbol,
                    descriptor: strip_excluded(descriptor),
                });
            }
            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }
        if fetched.is_empty() {
            log::debug!("no {kind} matched '{filter}'");
        }
        Ok(fetched)
    }
}

/// Drops the fields that describe the resource rather than configure it.
fn strip_excluded(mut descriptor: ResourceDescriptor) -> ResourceDescriptor {
    let kind = descriptor.kind;
    descriptor
        .properties
        .retain(|field, _| !kind.is_excluded(field));
    descriptor
}
