//! Keeps the linked stylesheets of one document in step with its `<link>` elements.

use css_orchestrator::{Document, NodeKey, StyleSheetSet};
use futures::future::join_all;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info_span;

use crate::engine::StyleEngineRegistry;
use crate::error::LoadError;
use crate::loader::ResourceLoader;
use crate::processor::{LinkStatus, LoadOutcome, PendingLoad, StyleSheetRequestProcessor};
use crate::request::ResourceRequest;

/// Drives one `StyleSheetRequestProcessor` per stylesheet link of a document.
pub struct DocumentStyleLoader<L: ResourceLoader> {
    sheets: StyleSheetSet,
    loader: Arc<L>,
    engines: Arc<StyleEngineRegistry>,
    processors: HashMap<NodeKey, StyleSheetRequestProcessor<L>>,
    pending: Vec<(NodeKey, PendingLoad)>,
}

impl<L: ResourceLoader> DocumentStyleLoader<L> {
    /// Create a loader that attaches into `document`'s sheet set.
    pub fn new(document: &Document, loader: Arc<L>, engines: Arc<StyleEngineRegistry>) -> Self {
        Self {
            sheets: document.sheets().clone(),
            loader,
            engines,
            processors: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// Start fetches for new or retargeted links and drop sheets of links that
    /// are gone. Returns how many fetches were started.
    ///
    /// # Errors
    /// Returns `LoadError::NoRuntime` when called outside a tokio runtime.
    pub fn sync(&mut self, document: &Document) -> Result<usize, LoadError> {
        let _span = info_span!("css.sync_links").entered();
        let links = document.stylesheet_links();
        let initiator = document.base_url();

        let live: Vec<NodeKey> = links.iter().map(|link| link.owner).collect();
        let stale: Vec<NodeKey> = self
            .processors
            .keys()
            .filter(|owner| !live.contains(owner))
            .copied()
            .collect();
        for owner in stale {
            if let Some(processor) = self.processors.remove(&owner) {
                processor.cancel();
            }
            self.sheets.detach(owner);
            debug!("Link {owner:?} no longer references a stylesheet");
        }

        let mut started = 0;
        for link in &links {
            if !self.processors.contains_key(&link.owner) {
                let created = StyleSheetRequestProcessor::new(
                    link.owner,
                    self.sheets.clone(),
                    Arc::clone(&self.loader),
                    Arc::clone(&self.engines),
                )?;
                self.processors.insert(link.owner, created);
            }
            let Some(processor) = self.processors.get(&link.owner) else {
                continue;
            };
            self.sheets.revive(link.owner);
            let request = ResourceRequest::new(link.href.clone()).with_initiator(initiator.clone());
            if let Some(pending) = processor.process(link, request) {
                self.pending.push((link.owner, pending));
                started += 1;
            }
        }
        Ok(started)
    }

    /// Wait for every fetch started so far and report how each ended.
    pub async fn settle(&mut self) -> Vec<(NodeKey, Result<LoadOutcome, LoadError>)> {
        let pending: Vec<(NodeKey, PendingLoad)> = self.pending.drain(..).collect();
        let (owners, loads): (Vec<NodeKey>, Vec<PendingLoad>) = pending.into_iter().unzip();
        owners.into_iter().zip(join_all(loads).await).collect()
    }

    /// Acquisition state of the link owned by `owner`.
    pub fn status(&self, owner: NodeKey) -> Option<LinkStatus> {
        self.processors.get(&owner).map(StyleSheetRequestProcessor::status)
    }

    /// Processor of the link owned by `owner`.
    #[inline]
    pub fn processor(&self, owner: NodeKey) -> Option<&StyleSheetRequestProcessor<L>> {
        self.processors.get(&owner)
    }
}
