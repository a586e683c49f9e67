// Session controller: the single owner of the view state
//
// Every mutation recomputes derived data (search results, picker results) with plain calls
// into the search engine, so readers always see results that match the current inputs.

use std::sync::Arc;

use thiserror::Error;
use tokio::{
    sync::mpsc::{error::TryRecvError, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    catalog::{Catalog, SpeedStats},
    config::{AppConfig, ConfigError},
    models::{Hotel, SearchFilters, SpeedTestResult, WifiReview},
    review::{self, Notification, ReviewConsumer, ReviewDraft, ReviewError},
    search::HotelSearch,
    speedtest::{SpeedTest, SpeedTestError, SpeedTestEvent},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Unknown hotel: {0}")]
    UnknownHotel(String),

    #[error("No hotel selected for review")]
    NoHotelSelected,

    #[error("No speed test has been started")]
    NoSpeedTestRunning,

    #[error("Speed test task failed: {0}")]
    SpeedTestTask(String),

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error(transparent)]
    SpeedTest(#[from] SpeedTestError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Search,
    Review,
    SpeedTest,
}

// Everything the details view shows for one hotel
#[derive(Debug, Clone, PartialEq)]
pub struct HotelDetails {
    pub hotel: Hotel,
    pub reviews: Vec<WifiReview>,
    pub speed_stats: Option<SpeedStats>,
}

#[derive(Debug, Default)]
struct SearchState {
    query: String,
    filters: SearchFilters,
    results: Vec<Hotel>,
    // Hotel opened from the result list
    opened: Option<String>,
}

#[derive(Debug, Default)]
struct ReviewState {
    // Set when the user jumped here from a hotel card
    preselected: Option<String>,
    selected: Option<String>,
    picker_query: String,
    picker_results: Vec<Hotel>,
    draft: ReviewDraft,
}

// Run started with `start_speed_test` whose result has not been collected yet
struct PendingRun {
    handle: JoinHandle<Result<SpeedTestResult, SpeedTestError>>,
    events: UnboundedReceiver<SpeedTestEvent>,
}

pub struct Session {
    catalog: Arc<Catalog>,
    engine: HotelSearch,
    speed_test: Arc<SpeedTest>,
    tab: Tab,
    search: SearchState,
    review: ReviewState,
    last_speed_test: Option<SpeedTestResult>,
    pending: Option<PendingRun>,
    notifications: Vec<Notification>,
}

impl Session {
    pub fn new(catalog: Arc<Catalog>, config: AppConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut session = Self {
            catalog,
            engine: HotelSearch::new(config.search),
            speed_test: Arc::new(SpeedTest::new(config.speed_test)?),
            tab: Tab::default(),
            search: SearchState::default(),
            review: ReviewState::default(),
            last_speed_test: None,
            pending: None,
            notifications: vec![],
        };
        session.refresh_results();
        session.refresh_picker();
        Ok(session)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    // Leaving the review tab discards the picker, the selection and the draft
    pub fn set_tab(&mut self, tab: Tab) {
        debug!(from = ?self.tab, to = ?tab, "tab changed");
        self.tab = tab;
        if tab != Tab::Review {
            self.review = ReviewState::default();
            self.refresh_picker();
        }
    }

    // Search

    pub fn query(&self) -> &str {
        &self.search.query
    }

    pub fn filters(&self) -> &SearchFilters {
        &self.search.filters
    }

    pub fn results(&self) -> &[Hotel] {
        &self.search.results
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.search.query = query.into();
        self.refresh_results();
    }

    pub fn set_filters(&mut self, filters: SearchFilters) {
        self.search.filters = filters;
        self.refresh_results();
    }

    pub fn search(&mut self, query: impl Into<String>, filters: SearchFilters) {
        self.search.query = query.into();
        self.search.filters = filters;
        self.refresh_results();
    }

    // Back to an empty query, no filters, sorted by rating
    pub fn reset_filters(&mut self) {
        self.search(String::new(), SearchFilters::default());
    }

    fn refresh_results(&mut self) {
        self.search.results =
            self.engine
                .search(self.catalog.hotels(), &self.search.query, &self.search.filters);
    }

    pub fn open_hotel(&mut self, hotel_id: &str) -> Result<(), SessionError> {
        self.require_hotel(hotel_id)?;
        self.search.opened = Some(hotel_id.to_string());
        Ok(())
    }

    pub fn close_hotel(&mut self) {
        self.search.opened = None;
    }

    pub fn details(&self) -> Option<HotelDetails> {
        let hotel = self.catalog.hotel(self.search.opened.as_deref()?)?;
        Some(HotelDetails {
            hotel: hotel.clone(),
            reviews: self.catalog.reviews_for(&hotel.id),
            speed_stats: self.catalog.speed_stats(&hotel.id),
        })
    }

    // Review

    pub fn switch_to_review(&mut self, hotel_id: &str) -> Result<(), SessionError> {
        self.require_hotel(hotel_id)?;
        self.review.preselected = Some(hotel_id.to_string());
        self.begin_review(hotel_id);
        self.tab = Tab::Review;
        info!(hotel_id, "review started from search");
        Ok(())
    }

    pub fn preselected_hotel(&self) -> Option<&Hotel> {
        self.catalog.hotel(self.review.preselected.as_deref()?)
    }

    pub fn clear_preselection(&mut self) {
        if let Some(id) = self.review.preselected.take() {
            if self.review.selected.as_deref() == Some(id.as_str()) {
                self.review.selected = None;
            }
        }
    }

    pub fn picker_query(&self) -> &str {
        &self.review.picker_query
    }

    pub fn picker_results(&self) -> &[Hotel] {
        &self.review.picker_results
    }

    pub fn set_picker_query(&mut self, query: impl Into<String>) {
        self.review.picker_query = query.into();
        self.refresh_picker();
    }

    fn refresh_picker(&mut self) {
        self.review.picker_results = self
            .engine
            .pick(self.catalog.hotels(), &self.review.picker_query);
    }

    // Hotel whose review form is open, None while the picker is shown
    pub fn review_hotel(&self) -> Option<&Hotel> {
        self.catalog.hotel(self.review.selected.as_deref()?)
    }

    pub fn select_for_review(&mut self, hotel_id: &str) -> Result<(), SessionError> {
        self.require_hotel(hotel_id)?;
        self.begin_review(hotel_id);
        Ok(())
    }

    fn begin_review(&mut self, hotel_id: &str) {
        self.review.selected = Some(hotel_id.to_string());
        self.review.draft = ReviewDraft::prefilled(self.last_speed_test.as_ref());
    }

    pub fn draft(&self) -> &ReviewDraft {
        &self.review.draft
    }

    pub fn draft_mut(&mut self) -> &mut ReviewDraft {
        &mut self.review.draft
    }

    // Drop the form and show the picker again
    pub fn cancel_review(&mut self) {
        self.review.selected = None;
        self.review.preselected = None;
        self.review.draft = ReviewDraft::default();
    }

    // A failed validation keeps the form open so the user can fix it
    pub async fn submit_review<C: ReviewConsumer + ?Sized>(
        &mut self,
        consumer: &C,
    ) -> Result<Notification, SessionError> {
        let hotel = self
            .review_hotel()
            .cloned()
            .ok_or(SessionError::NoHotelSelected)?;

        let notification = review::submit_review(consumer, &hotel, &self.review.draft).await?;

        self.notifications.push(notification.clone());
        self.cancel_review();
        Ok(notification)
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    // Speed test

    pub fn speed_tester(&self) -> Arc<SpeedTest> {
        self.speed_test.clone()
    }

    pub fn last_speed_test(&self) -> Option<&SpeedTestResult> {
        self.last_speed_test.as_ref()
    }

    pub async fn run_speed_test(
        &mut self,
        events: Option<UnboundedSender<SpeedTestEvent>>,
    ) -> Result<SpeedTestResult, SessionError> {
        let result = self.speed_test.run(events).await?;
        self.record_speed_test(result.clone());
        Ok(result)
    }

    // Start a run in the background. Search and review keep working while it progresses.
    pub fn start_speed_test(&mut self) -> Result<(), SessionError> {
        let busy = self
            .pending
            .as_ref()
            .is_some_and(|run| !run.handle.is_finished());
        if busy || self.speed_test.is_running() {
            return Err(SpeedTestError::AlreadyRunning(self.speed_test.progress()).into());
        }

        // Record a finished run that was never polled before replacing it
        if self.pending.is_some() {
            self.poll_speed_test();
        }
        if self.pending.take().is_some() {
            warn!("discarding uncollected speed test run");
        }

        let (handle, events) = SpeedTest::spawn(self.speed_test.clone());
        self.pending = Some(PendingRun { handle, events });
        Ok(())
    }

    // Drain the events of the background run. A completed run is recorded and forgotten.
    pub fn poll_speed_test(&mut self) -> Vec<SpeedTestEvent> {
        let Some(run) = self.pending.as_mut() else {
            return vec![];
        };

        let mut events = vec![];
        loop {
            match run.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        let completed = events.iter().find_map(|event| match event {
            SpeedTestEvent::Completed(result) => Some(result.clone()),
            _ => None,
        });
        if let Some(result) = completed {
            self.pending = None;
            self.record_speed_test(result);
        }

        events
    }

    pub fn speed_test_pending(&self) -> bool {
        self.pending.is_some()
    }

    // Wait for the background run and record its result
    pub async fn finish_speed_test(&mut self) -> Result<SpeedTestResult, SessionError> {
        let run = self
            .pending
            .take()
            .ok_or(SessionError::NoSpeedTestRunning)?;

        let result = run
            .handle
            .await
            .map_err(|e| SessionError::SpeedTestTask(e.to_string()))??;

        self.record_speed_test(result.clone());
        Ok(result)
    }

    // Store a result from a run driven elsewhere, e.g. via `SpeedTest::spawn`
    pub fn record_speed_test(&mut self, result: SpeedTestResult) {
        self.last_speed_test = Some(result);
    }

    fn require_hotel(&self, hotel_id: &str) -> Result<(), SessionError> {
        match self.catalog.hotel(hotel_id) {
            Some(_) => Ok(()),
            None => Err(SessionError::UnknownHotel(hotel_id.to_string())),
        }
    }
}
