//! The contact center service an export reads from.
//!
//! A [`Source`] answers two questions: which resources exist (one page at a
//! time) and what a single resource looks like. The AWS implementation lives
//! in [`crate::aws`]; tests use an in-memory one.
use std::future::Future;

use crate::{ManifestCategory, ResourceKind, UserError};

/// One entry of a listing page.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub id: String,
    pub arn: Option<String>,
    pub name: String,
}

/// A page of summaries, with the token of the next page if there is one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Summary>,
    pub next_token: Option<String>,
}

/// A described resource.
///
/// `properties` holds the fields returned by the service, keyed by their
/// CloudFormation property names. Flows and modules carry their flow
/// document as a JSON string under `Content`.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub source_id: String,
    pub name: String,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// Result of describing a resource.
#[derive(Clone, Debug, PartialEq)]
pub enum Described {
    Found(ResourceDescriptor),
    /// The resource exists but has no published version to export.
    NotPublished,
}

/// A paginated lookup service.
pub trait Source {
    /// Errors that may occur talking to the service.
    type Error: UserError;

    /// Lists one page of the given category.
    ///
    /// Pass `None` for the first page and the previous page's `next_token`
    /// afterwards.
    fn list_page(
        &self,
        category: ManifestCategory,
        next_token: Option<String>,
    ) -> impl Future<Output = Result<Page, Self::Error>>;

    /// Describes a single resource by its bare id.
    fn describe(
        &self,
        kind: ResourceKind,
        id: &str,
    ) -> impl Future<Output = Result<Described, Self::Error>>;
}
