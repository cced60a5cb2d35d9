//! Dataset state: the known dataset names, the active one, and its grid.
//!
//! The store performs no I/O. Each backend round trip is split into a
//! `begin_*` call that hands out a ticket and a `finish_*` call that applies
//! the response. Tickets carry a generation number, so a response that
//! arrives after a newer request of the same kind was issued is dropped
//! instead of overwriting fresher state:
//!
//! ```text
//! begin_select("A") -> ticket gen 1
//! begin_select("B") -> ticket gen 2
//! finish_select(gen 2, rows of B)   applied
//! finish_select(gen 1, rows of A)   superseded, ignored
//! ```
//!
//! [`crate::controller::DatasetController`] drives these calls against a
//! [`crate::api::DatasetApi`].

use crate::api::DatasetListing;
use crate::dataset::DatasetId;
use crate::error::{Result, WranglerError};
use crate::grid::Grid;

/// Issued by [`DatasetStore::begin_select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    id: DatasetId,
    generation: u64,
}

impl FetchTicket {
    pub fn id(&self) -> &DatasetId {
        &self.id
    }
}

/// Issued by [`DatasetStore::begin_refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
}

/// Snapshot taken by [`DatasetStore::begin_save`]: exactly the grid that was
/// current when the save was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveTicket {
    id: DatasetId,
    grid: Grid,
    revision: u64,
}

impl SaveTicket {
    pub fn id(&self) -> &DatasetId {
        &self.id
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Applied,
    /// A newer selection was issued while this one was in flight.
    Superseded,
}

#[derive(Debug, Default)]
pub struct DatasetStore {
    datasets: Vec<DatasetId>,
    active: Option<DatasetId>,
    grid: Grid,
    error: Option<String>,

    fetch_generation: u64,
    fetch_pending: bool,
    refresh_generation: u64,
    refresh_pending: bool,

    // bumped by every edit; equal to saved_revision when nothing is unsaved
    revision: u64,
    saved_revision: u64,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn datasets(&self) -> &[DatasetId] {
        &self.datasets
    }

    pub fn active(&self) -> Option<&DatasetId> {
        self.active.as_ref()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn is_loading(&self) -> bool {
        self.fetch_pending || self.refresh_pending
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch_pending
    }

    /// Last failure of a refresh or fetch, for display.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// True when the grid holds edits that have not been saved.
    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.refresh_generation += 1;
        self.refresh_pending = true;
        RefreshTicket {
            generation: self.refresh_generation,
        }
    }

    /// Applies a dataset listing.
    ///
    /// The list is replaced wholesale. With no active dataset, the first entry
    /// (or the one the backend marks active) is selected and its fetch ticket
    /// returned. An empty list clears the active dataset and the grid. On
    /// failure every field keeps its last value.
    pub fn finish_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<DatasetListing>,
    ) -> Result<Option<FetchTicket>> {
        if ticket.generation != self.refresh_generation {
            tracing::debug!(generation = ticket.generation, "Discarding stale dataset listing");
            return Ok(None);
        }
        self.refresh_pending = false;

        let listing = match result {
            Ok(listing) => listing,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        self.datasets = listing.datasets;
        if self.datasets.is_empty() {
            self.clear_active();
            return Ok(None);
        }
        if self.active.is_some() {
            return Ok(None);
        }

        let next = listing
            .active_dataset
            .filter(|id| self.datasets.contains(id))
            .or_else(|| self.datasets.first().cloned());
        Ok(next.map(|id| self.begin_select(id)))
    }

    /// Makes `id` active and empties the grid until its rows arrive.
    pub fn begin_select(&mut self, id: DatasetId) -> FetchTicket {
        self.fetch_generation += 1;
        self.active = Some(id.clone());
        self.grid = Grid::empty();
        self.fetch_pending = true;
        self.error = None;
        self.saved_revision = self.revision;
        FetchTicket {
            id,
            generation: self.fetch_generation,
        }
    }

    /// Applies fetched rows if the ticket still belongs to the latest
    /// selection. A failed fetch leaves the dataset active with an empty grid.
    pub fn finish_select(
        &mut self,
        ticket: FetchTicket,
        result: Result<Grid>,
    ) -> Result<SelectOutcome> {
        if ticket.generation != self.fetch_generation || self.active.as_ref() != Some(&ticket.id) {
            tracing::debug!(
                dataset = %ticket.id,
                generation = ticket.generation,
                "Discarding rows for superseded selection"
            );
            return Ok(SelectOutcome::Superseded);
        }
        self.fetch_pending = false;

        match result {
            Ok(grid) => {
                self.grid = grid;
                Ok(SelectOutcome::Applied)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Replaces the grid with an edited copy.
    pub fn edit(&mut self, grid: Grid) {
        self.grid = grid;
        self.revision += 1;
    }

    /// Snapshots the active dataset's grid for saving. `None` when nothing is
    /// active; an error while its rows are still loading, since saving then
    /// would overwrite the dataset with an empty grid.
    pub fn begin_save(&self) -> Result<Option<SaveTicket>> {
        let Some(id) = &self.active else {
            return Ok(None);
        };
        if self.fetch_pending {
            return Err(WranglerError::Validation(format!(
                "'{id}' is still loading"
            )));
        }
        Ok(Some(SaveTicket {
            id: id.clone(),
            grid: self.grid.clone(),
            revision: self.revision,
        }))
    }

    /// Marks the snapshot as persisted. Edits made while the save was in
    /// flight stay dirty.
    pub fn finish_save(&mut self, ticket: &SaveTicket, succeeded: bool) {
        if succeeded && self.active.as_ref() == Some(&ticket.id) && self.revision == ticket.revision
        {
            self.saved_revision = ticket.revision;
        }
    }

    /// A new dataset was imported: make it active right away and re-list.
    ///
    /// Because `active` is set before the listing comes back, the refresh
    /// cannot replace the new dataset with whichever entry happens to be
    /// first.
    pub fn begin_import_completed(&mut self, id: DatasetId) -> (FetchTicket, RefreshTicket) {
        let fetch = self.begin_select(id);
        let refresh = self.begin_refresh();
        (fetch, refresh)
    }

    /// Forgets a deleted dataset locally.
    pub fn remove(&mut self, id: &DatasetId) {
        self.datasets.retain(|d| d != id);
        if self.active.as_ref() == Some(id) {
            self.clear_active();
        }
    }

    fn clear_active(&mut self) {
        self.active = None;
        self.grid = Grid::empty();
        // in-flight fetches no longer have anywhere to land
        self.fetch_generation += 1;
        self.fetch_pending = false;
        self.saved_revision = self.revision;
    }
}
