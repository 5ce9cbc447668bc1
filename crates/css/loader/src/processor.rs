//! Per-link stylesheet acquisition with cancel-then-replace semantics.
//!
//! A processor owns at most one fetch at a time. Starting a fetch for a new
//! target first aborts the outstanding one and bumps a generation counter; a
//! fetch only publishes its sheet if its generation is still current when it
//! takes the state lock, so a late response can never overwrite a newer sheet.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use css_orchestrator::{NodeKey, StyleLink, StyleSheetSet};
use log::{debug, warn};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{Instrument as _, info_span};
use url::Url;

use crate::engine::StyleEngineRegistry;
use crate::error::LoadError;
use crate::loader::ResourceLoader;
use crate::request::{CorsSetting, OriginBehavior, ResourceRequest};

/// Acquisition state of one link.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkStatus {
    #[default]
    Idle,
    Fetching,
    Attached,
    Failed,
}

/// How a fetch ended when it did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The sheet was published with this many rules.
    Attached { rules: usize },
    /// A newer request (or a cancel) took over; nothing was published.
    Superseded,
}

#[derive(Debug, Default)]
struct LinkState {
    generation: u64,
    /// Target of the in-flight fetch. Cleared when it ends so a failed target
    /// can be retried.
    target: Option<Url>,
    /// Target whose sheet is currently published.
    attached: Option<Url>,
    status: LinkStatus,
    in_flight: Option<AbortHandle>,
    last_error: Option<LoadError>,
}

/// Completion of one `process` call.
///
/// Dropping it does not cancel the fetch; only a newer `process` or `cancel` does.
#[must_use = "a PendingLoad reports whether the sheet was attached"]
#[derive(Debug)]
pub struct PendingLoad {
    handle: JoinHandle<Result<LoadOutcome, LoadError>>,
}

impl Future for PendingLoad {
    type Output = Result<LoadOutcome, LoadError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Ok(LoadOutcome::Superseded),
            Err(err) => Err(LoadError::Task(err.to_string())),
        })
    }
}

/// Fetches, parses and attaches the sheet of one `<link>` element.
pub struct StyleSheetRequestProcessor<L: ResourceLoader> {
    owner: NodeKey,
    sheets: StyleSheetSet,
    loader: Arc<L>,
    engines: Arc<StyleEngineRegistry>,
    runtime: Handle,
    state: Arc<Mutex<LinkState>>,
}

impl<L: ResourceLoader> StyleSheetRequestProcessor<L> {
    /// Create a processor for `owner` that attaches into `sheets`.
    ///
    /// # Errors
    /// Returns `LoadError::NoRuntime` when called outside a tokio runtime.
    pub fn new(
        owner: NodeKey,
        sheets: StyleSheetSet,
        loader: Arc<L>,
        engines: Arc<StyleEngineRegistry>,
    ) -> Result<Self, LoadError> {
        let runtime = Handle::try_current().map_err(|_| LoadError::NoRuntime)?;
        Ok(Self {
            owner,
            sheets,
            loader,
            engines,
            runtime,
            state: Arc::new(Mutex::new(LinkState::default())),
        })
    }

    #[inline]
    pub const fn owner(&self) -> NodeKey {
        self.owner
    }

    pub fn status(&self) -> LinkStatus {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).status
    }

    /// Target of the in-flight fetch, else of the attached sheet.
    pub fn current_target(&self) -> Option<Url> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.target.clone().or_else(|| state.attached.clone())
    }

    /// Error of the most recent failed fetch.
    pub fn last_error(&self) -> Option<LoadError> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_error
            .clone()
    }

    /// Start acquiring the sheet `link` points at.
    ///
    /// Returns `None` when no engine handles the link's type, or when `request`
    /// targets what is already in flight or attached. Going back to the attached
    /// target still cancels a fetch for another one. Otherwise any outstanding
    /// fetch is cancelled before the new one starts.
    pub fn process(&self, link: &StyleLink, request: ResourceRequest) -> Option<PendingLoad> {
        let content_type = link.content_type();
        let Some(engine) = self.engines.get(content_type) else {
            debug!("No style engine for {content_type:?}; ignoring link {:?}", self.owner);
            return None;
        };
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.status == LinkStatus::Fetching && state.target.as_ref() == Some(&request.url) {
            debug!("Link {:?} is already fetching {}", self.owner, request.url);
            return None;
        }
        let published = state.attached.as_ref() == Some(&request.url) && self.sheets.sheet_for(self.owner).is_some();
        if let Some(previous) = state.in_flight.take() {
            debug!("Cancelling superseded fetch for link {:?}", self.owner);
            previous.abort();
        }
        state.generation = state.generation.wrapping_add(1);
        if published {
            debug!("Link {:?} already has {}", self.owner, request.url);
            state.target = None;
            state.status = LinkStatus::Attached;
            state.last_error = None;
            return None;
        }
        state.target = Some(request.url.clone());
        state.status = LinkStatus::Fetching;
        state.last_error = None;

        let generation = state.generation;
        let cors = CorsSetting::from_attribute(link.cross_origin.as_deref());
        let template = link.sheet_template();
        let owner = self.owner;
        let sheets = self.sheets.clone();
        let loader = Arc::clone(&self.loader);
        let shared = Arc::clone(&self.state);
        let span = info_span!("css.load_stylesheet", url = %request.url, link = owner.0, generation);

        let handle = self.runtime.spawn(
            async move {
                let fetched = async {
                    let response = loader.fetch(&request, cors, OriginBehavior::Taint).await?;
                    engine.parse(&response, template).await
                }
                .await;
                let mut link_state = shared.lock().unwrap_or_else(PoisonError::into_inner);
                if link_state.generation != generation {
                    debug!("Discarding stale response for link {owner:?}");
                    return Ok(LoadOutcome::Superseded);
                }
                link_state.in_flight = None;
                let target = link_state.target.take();
                match fetched {
                    Ok(sheet) => {
                        let rules = sheet.len();
                        if sheets.attach_if_live(owner, sheet).is_none() {
                            debug!("Link {owner:?} left the document; dropping its sheet");
                            link_state.status = LinkStatus::Idle;
                            link_state.attached = None;
                            return Ok(LoadOutcome::Superseded);
                        }
                        link_state.status = LinkStatus::Attached;
                        link_state.attached = target;
                        Ok(LoadOutcome::Attached { rules })
                    }
                    Err(err) => {
                        warn!("Stylesheet for link {owner:?} failed: {err}");
                        link_state.status = LinkStatus::Failed;
                        link_state.last_error = Some(err.clone());
                        Err(err)
                    }
                }
            }
            .instrument(span),
        );
        state.in_flight = Some(handle.abort_handle());
        Some(PendingLoad { handle })
    }

    /// Abandon any outstanding fetch. The attached sheet, if any, stays.
    pub fn cancel(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = state.in_flight.take() {
            previous.abort();
        }
        state.generation = state.generation.wrapping_add(1);
        if state.status == LinkStatus::Fetching {
            state.target = None;
            state.status = if state.attached.is_some() && self.sheets.sheet_for(self.owner).is_some() {
                LinkStatus::Attached
            } else {
                LinkStatus::Idle
            };
        }
    }
}
