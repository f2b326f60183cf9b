//! Page-level dataset view state
//!
//! A session starts in `NoDataset` when no dataset URL was given, moves to
//! `Loading` for every fetch it issues, and settles in `Ready` or `Failed`
//! when the most recent fetch completes. Responses to superseded fetches
//! are dropped.

use crate::selection::SelectionController;
use geo_resolver::RegionMatch;
use sample_records::{CountrySummary, ParseWarning};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shown when the page was opened without a dataset URL
pub const NO_DATASET_NOTICE: &str = "No dataset selected";

/// Sequence number of an issued fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// A fetched and aggregated dataset
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDataset {
    pub url: String,
    pub summary: Arc<CountrySummary>,
    pub warnings: Vec<ParseWarning>,
    /// Regions the dataset was resolved against, `None` when no map is drawn
    pub map_regions: Option<Vec<RegionMatch>>,
}

/// Headline numbers for a loaded dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_samples: usize,
    /// Buckets other than "Unknown" and "missing"
    pub country_count: usize,
}

impl Overview {
    pub fn of(summary: &CountrySummary) -> Self {
        Self {
            total_samples: summary.total_count(),
            country_count: summary.country_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    NoDataset,
    Loading { url: String, request: RequestTicket },
    Failed { url: String, message: String },
    Ready { dataset: LoadedDataset },
}

impl ViewState {
    pub fn kind(&self) -> &'static str {
        match self {
            ViewState::NoDataset => "no_dataset",
            ViewState::Loading { .. } => "loading",
            ViewState::Failed { .. } => "failed",
            ViewState::Ready { .. } => "ready",
        }
    }

    /// URL of the dataset being shown or fetched
    pub fn url(&self) -> Option<&str> {
        match self {
            ViewState::NoDataset => None,
            ViewState::Loading { url, .. } | ViewState::Failed { url, .. } => Some(url),
            ViewState::Ready { dataset } => Some(&dataset.url),
        }
    }

    /// User-facing message for states that have one
    pub fn message(&self) -> Option<&str> {
        match self {
            ViewState::NoDataset => Some(NO_DATASET_NOTICE),
            ViewState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatasetSession {
    view: ViewState,
    last_issued: u64,
    selection: SelectionController,
}

impl DatasetSession {
    pub fn new() -> Self {
        Self {
            view: ViewState::NoDataset,
            last_issued: 0,
            selection: SelectionController::default(),
        }
    }

    /// Start a fetch. Hover, selection and page are cleared right away so
    /// nothing from the previous dataset is shown while loading.
    pub fn begin_load(&mut self, url: impl Into<String>) -> RequestTicket {
        self.last_issued += 1;
        let request = RequestTicket(self.last_issued);
        let url = url.into();

        debug!("Issuing request #{} for {}", request.0, url);
        self.selection = SelectionController::default();
        self.view = ViewState::Loading { url, request };
        request
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.last_issued
    }

    /// Apply a fetch outcome. Returns false, changing nothing, when a later
    /// fetch has been issued since `ticket`.
    pub fn complete(&mut self, ticket: RequestTicket, outcome: Result<LoadedDataset, String>) -> bool {
        if !self.is_current(ticket) {
            debug!(
                "Dropping response to request #{} (latest is #{})",
                ticket.0, self.last_issued
            );
            return false;
        }

        let url = self.view.url().unwrap_or_default().to_string();
        match outcome {
            Ok(dataset) => {
                info!(
                    "Loaded {} samples in {} buckets from {}",
                    dataset.summary.total_count(),
                    dataset.summary.buckets().len(),
                    dataset.url
                );
                let selection = SelectionController::new(Arc::clone(&dataset.summary));
                self.selection = match &dataset.map_regions {
                    Some(regions) => selection.with_map_regions(regions),
                    None => selection,
                };
                self.view = ViewState::Ready { dataset };
            }
            Err(message) => {
                warn!("Loading {} failed: {}", url, message);
                self.selection = SelectionController::default();
                self.view = ViewState::Failed { url, message };
            }
        }
        true
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn dataset(&self) -> Option<&LoadedDataset> {
        match &self.view {
            ViewState::Ready { dataset } => Some(dataset),
            _ => None,
        }
    }

    pub fn overview(&self) -> Option<Overview> {
        self.dataset().map(|d| Overview::of(&d.summary))
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionController {
        &mut self.selection
    }
}

impl Default for DatasetSession {
    fn default() -> Self {
        Self::new()
    }
}
