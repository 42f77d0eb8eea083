//! Reacts to the three fetch triggers (startup geolocation, city search, unit change)
//! and reconciles their results into one shared [`AppState`].
//!
//! The state lock is never held across a request; several triggers can be in flight at
//! once and each result is applied atomically when it arrives.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    geolocation::{Geolocator, LocationError},
    model::{MeasurementUnit, WeatherRecord},
    provider::{FetchError, WeatherClient},
    store::RecordStore,
};

pub const MSG_EMPTY_SEARCH: &str = "Please enter a city name.";
pub const MSG_NOT_FOUND: &str = "City not found. Please try again.";
pub const MSG_LOCATION_DENIED: &str = "Unable to retrieve location. Please search manually.";
pub const MSG_GEOLOCATION_UNSUPPORTED: &str = "Geolocation is not supported by this browser.";

/// Why a trigger did not produce a record. Every variant is recoverable.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("empty search term")]
    InputInvalid,
    #[error(transparent)]
    LocationUnavailable(#[from] LocationError),
    #[error(transparent)]
    FetchFailed(#[from] FetchError),
}

impl TriggerError {
    /// Text placed in the shared error slot.
    pub fn user_message(&self) -> &'static str {
        match self {
            TriggerError::InputInvalid => MSG_EMPTY_SEARCH,
            TriggerError::LocationUnavailable(LocationError::PermissionDenied) => {
                MSG_LOCATION_DENIED
            }
            TriggerError::LocationUnavailable(LocationError::Unsupported) => {
                MSG_GEOLOCATION_UNSUPPORTED
            }
            TriggerError::FetchFailed(_) => MSG_NOT_FOUND,
        }
    }
}

/// Everything the presentation layer reads.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub unit: MeasurementUnit,
    pub records: RecordStore,
    /// Name of the record shown in the detail view.
    pub selected: Option<String>,
    /// Single error slot; overwritten by the latest failure, cleared by any success.
    pub error: Option<String>,
    /// Last submitted search text, kept as typed.
    pub query: String,
    started: bool,
}

impl AppState {
    pub fn new(unit: MeasurementUnit) -> Self {
        Self { unit, ..Self::default() }
    }

    pub fn selected_record(&self) -> Option<&WeatherRecord> {
        self.selected.as_deref().and_then(|name| self.records.get(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshOutcome {
    Applied,
    Failed,
    Stale,
}

/// Tally of one unit-change fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub requested: usize,
    pub applied: usize,
    pub failed: usize,
    /// Responses dropped because the unit changed again before they arrived.
    pub stale: usize,
}

#[derive(Debug, Clone)]
pub struct FetchOrchestrator {
    client: Arc<dyn WeatherClient>,
    state: Arc<Mutex<AppState>>,
}

impl FetchOrchestrator {
    pub fn new(client: Arc<dyn WeatherClient>, unit: MeasurementUnit) -> Self {
        Self { client, state: Arc::new(Mutex::new(AppState::new(unit))) }
    }

    pub async fn snapshot(&self) -> AppState {
        self.state.lock().await.clone()
    }

    pub async fn unit(&self) -> MeasurementUnit {
        self.state.lock().await.unit
    }

    pub async fn selected_record(&self) -> Option<WeatherRecord> {
        self.state.lock().await.selected_record().cloned()
    }

    /// Look up the current position once and fetch weather for it.
    ///
    /// Later calls are no-ops.
    pub async fn startup(&self, geolocator: &dyn Geolocator) -> Result<(), TriggerError> {
        {
            let mut state = self.state.lock().await;
            if state.started {
                tracing::debug!("startup geolocation already ran");
                return Ok(());
            }
            state.started = true;
        }

        let coordinates = match geolocator.current_position().await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "geolocation unavailable");
                return Err(self.fail(TriggerError::LocationUnavailable(e)).await);
            }
        };

        if !coordinates.is_finite() {
            let err = FetchError::InvalidInput(format!("position ({coordinates}) is not finite"));
            tracing::warn!(error = %err, "unusable position");
            return Err(self.fail(TriggerError::FetchFailed(err)).await);
        }

        let unit = self.unit().await;
        tracing::info!(%coordinates, %unit, "fetching weather for current position");
        let result = self.client.fetch_by_coordinates(coordinates, unit).await;
        self.apply(result).await
    }

    /// Fetch weather for a user-entered city name.
    pub async fn search(&self, input: &str) -> Result<(), TriggerError> {
        let unit = {
            let mut state = self.state.lock().await;
            state.query = input.to_string();
            state.unit
        };

        let city = input.trim();
        if city.is_empty() {
            return Err(self.fail(TriggerError::InputInvalid).await);
        }

        tracing::info!(city, %unit, "searching");
        let result = self.client.fetch_by_city(city, unit).await;
        self.apply(result).await
    }

    /// Switch units and refetch every stored record in the new unit.
    ///
    /// The unit takes effect immediately. Refreshes run as detached tasks and each one is
    /// applied as it completes; one failing does not stop the rest. The returned future
    /// only tallies them: dropping it early leaves every refresh running.
    pub async fn change_unit(&self, unit: MeasurementUnit) -> RefreshSummary {
        let names = {
            let mut state = self.state.lock().await;
            state.unit = unit;
            state.records.names()
        };

        tracing::info!(%unit, records = names.len(), "unit changed, refreshing");

        let mut summary = RefreshSummary { requested: names.len(), ..Default::default() };
        let handles: Vec<_> = names
            .into_iter()
            .map(|name| {
                let this = self.clone();
                tokio::spawn(async move { this.refresh(name, unit).await })
            })
            .collect();

        for handle in handles {
            match handle.await {
                Ok(RefreshOutcome::Applied) => summary.applied += 1,
                Ok(RefreshOutcome::Failed) => summary.failed += 1,
                Ok(RefreshOutcome::Stale) => summary.stale += 1,
                Err(e) => {
                    tracing::error!(error = %e, "refresh task aborted");
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    /// Show `name` in the detail view. Returns false if no such record exists.
    pub async fn select(&self, name: &str) -> bool {
        let mut state = self.state.lock().await;
        if state.records.get(name).is_some() {
            state.selected = Some(name.to_string());
            true
        } else {
            false
        }
    }

    pub async fn clear_selection(&self) {
        self.state.lock().await.selected = None;
    }

    async fn refresh(&self, name: String, unit: MeasurementUnit) -> RefreshOutcome {
        let result = self.client.fetch_by_city(&name, unit).await;

        // Superseded unit: drop successes and failures alike, error slot included.
        let mut state = self.state.lock().await;
        if state.unit != unit {
            tracing::debug!(
                name = %name,
                requested = %unit,
                current = %state.unit,
                ok = result.is_ok(),
                "dropping stale refresh"
            );
            return RefreshOutcome::Stale;
        }

        match Self::apply_locked(&mut state, result) {
            Ok(()) => RefreshOutcome::Applied,
            Err(_) => RefreshOutcome::Failed,
        }
    }

    async fn apply(&self, result: Result<WeatherRecord, FetchError>) -> Result<(), TriggerError> {
        let mut state = self.state.lock().await;
        Self::apply_locked(&mut state, result)
    }

    fn apply_locked(
        state: &mut AppState,
        result: Result<WeatherRecord, FetchError>,
    ) -> Result<(), TriggerError> {
        match result {
            Ok(record) => {
                tracing::info!(name = %record.name, unit = %record.unit, "record updated");
                state.records.upsert(record);
                state.error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "weather lookup failed");
                let err = TriggerError::FetchFailed(e);
                state.error = Some(err.user_message().to_string());
                Err(err)
            }
        }
    }

    async fn fail(&self, err: TriggerError) -> TriggerError {
        self.state.lock().await.error = Some(err.user_message().to_string());
        err
    }
}
