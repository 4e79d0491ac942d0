//! Code tree construction
//!
//! The builder walks a code page and everything below it depth-first,
//! fetching one page at a time. Instead of recursing it keeps an explicit
//! stack of frames, one per code whose children are still being built, so
//! deep code hierarchies cannot exhaust the call stack.

use crate::catalog::CodeNode;
use crate::config::CatalogConfig;
use crate::crawler::discover::{discover_children, CodeLink};
use crate::crawler::extract::extract_fields;
use crate::crawler::fetcher::Fetcher;
use url::Url;

/// A fetched code whose children are still being built
struct Frame {
    node: CodeNode,
    pending: std::vec::IntoIter<CodeLink>,
}

/// Builds code trees from the catalog site
pub struct TreeBuilder<'a> {
    fetcher: &'a Fetcher,
    base_url: &'a Url,
    catalog: &'a CatalogConfig,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(fetcher: &'a Fetcher, base_url: &'a Url, catalog: &'a CatalogConfig) -> Self {
        Self {
            fetcher,
            base_url,
            catalog,
        }
    }

    /// Builds the tree rooted at `code`, whose page is at `url`
    ///
    /// Returns `None` when the root page cannot be fetched. A child whose
    /// page cannot be fetched is left out of its parent entirely, together
    /// with its subtree. Children keep their discovery order, and each child
    /// is finished, subtree included, before its next sibling is fetched.
    ///
    /// Terminates because every child code is strictly longer than its
    /// parent.
    pub async fn build(&self, url: &str, code: &str) -> Option<CodeNode> {
        let root = self.visit(url, code).await?;
        let mut stack = vec![root];

        loop {
            let next = stack.last_mut().and_then(|frame| frame.pending.next());

            match next {
                Some(child) => {
                    tracing::debug!("Child: {}", child.code);
                    if let Some(frame) = self.visit(&child.url, &child.code).await {
                        stack.push(frame);
                    } else {
                        tracing::warn!("Dropping {} and its subtree: page unavailable", child.code);
                    }
                }
                None => {
                    let finished = stack.pop()?.node;
                    match stack.last_mut() {
                        Some(parent) => parent.node.children.push(finished),
                        None => return Some(finished),
                    }
                }
            }
        }
    }

    /// Fetches one code page and prepares its frame
    async fn visit(&self, url: &str, code: &str) -> Option<Frame> {
        let document = self.fetcher.fetch_document(url).await?;

        let fields = extract_fields(&document, code);
        let children = discover_children(&document, code, self.base_url, self.catalog);

        let node = CodeNode {
            code: code.to_string(),
            description: fields.description,
            clinical_information: fields.clinical_information,
            applicable_to: fields.applicable_to,
            approximate_synonyms: fields.approximate_synonyms,
            children: Vec::with_capacity(children.len()),
        };

        Some(Frame {
            node,
            pending: children.into_iter(),
        })
    }
}

// Fetch-driven behavior is exercised with wiremock in the integration tests
