//! Ad lifecycle coordination between the local store and the marketplace.
//!
//! The local record is the source of truth. Every flow writes the store first
//! and treats the marketplace as best-effort: a [`MarketplaceError`] is
//! recorded on the record (`action_state = error`) and never turned into a
//! request failure. Without a configured client every flow is local-only.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use adsync_market::{
    vehicle_to_request, AdResponse, AdUpdate, BumpOptions, LogMessage, MarketplaceClient,
    MarketplaceError,
};
use adsync_shared::payload::{CreateAdPayload, UpdateAdPayload};
use adsync_shared::{vehicle_source_id, ActionState, AdAction, AdRecord, ValidationError};
use adsync_store::{AdRecordPatch, AdRecordStore, Directory, NewAdRecord, StoreError};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ServerError;

/// Why a create could not be published.
#[derive(Debug, Error)]
enum PublishError {
    #[error("Ad has no linked vehicle")]
    NoVehicle,

    #[error("Vehicle {0} not found")]
    VehicleNotFound(String),

    #[error("Owner {0} not found")]
    OwnerNotFound(String),

    #[error(transparent)]
    Marketplace(#[from] MarketplaceError),
}

/// A record returned from a read, with the marketplace's processing log when
/// the read reached the marketplace.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledAd {
    #[serde(flatten)]
    pub record: AdRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_logs: Option<Vec<LogMessage>>,
}

pub struct AdSyncCoordinator {
    store: Arc<dyn AdRecordStore>,
    directory: Arc<Directory>,
    marketplace: Option<Arc<dyn MarketplaceClient>>,
    default_dealer_code: String,
    call_timeout: Duration,
}

impl AdSyncCoordinator {
    pub fn new(
        store: Arc<dyn AdRecordStore>,
        directory: Arc<Directory>,
        marketplace: Option<Arc<dyn MarketplaceClient>>,
        default_dealer_code: impl Into<String>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            directory,
            marketplace,
            default_dealer_code: default_dealer_code.into(),
            call_timeout,
        }
    }

    pub fn marketplace_enabled(&self) -> bool {
        self.marketplace.is_some()
    }

    pub fn list(&self, owner_id: &str) -> Result<Vec<AdRecord>, ServerError> {
        Ok(self.store.list_by_owner(owner_id)?)
    }

    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Store the ad, then try to publish it. A marketplace failure never
    /// fails the create; it is recorded on the returned record.
    pub async fn create(
        &self,
        owner_id: &str,
        payload: CreateAdPayload,
    ) -> Result<AdRecord, ServerError> {
        let validated = payload.validate()?;

        let source_id = match (validated.source_id, validated.vehicle_id.as_deref()) {
            (Some(source_id), _) => source_id,
            (None, Some(vehicle_id)) => vehicle_source_id(vehicle_id, Utc::now()),
            (None, None) => return Err(ValidationError::NoSourceId.into()),
        };

        let record = self.store.create(NewAdRecord {
            source_id,
            vehicle_id: validated.vehicle_id,
            owner_id: owner_id.to_string(),
            content: validated.content,
            last_action: Some(AdAction::Create),
            action_state: Some(ActionState::Processing),
        })?;

        info!(id = %record.id, source_id = %record.source_id, owner = %owner_id, "Ad created locally");

        let Some(client) = self.marketplace.as_deref() else {
            return Ok(self
                .store
                .update(record.id, AdRecordPatch::status(AdAction::Create, ActionState::Done))?);
        };

        let patch = self.publish_patch(client, &record).await;
        self.settle(record, patch)
    }

    /// Publish `record` and turn the outcome into a `create` status patch.
    async fn publish_patch(&self, client: &dyn MarketplaceClient, record: &AdRecord) -> AdRecordPatch {
        match self.publish(client, record).await {
            Ok(resp) => {
                info!(id = %record.id, remote_ad_id = %resp.remote_ad_id(), "Ad published");
                remote_patch(&resp, Some(AdAction::Create))
            }
            Err(e) => {
                warn!(id = %record.id, error = %e, "Publishing ad failed");
                AdRecordPatch::failed(AdAction::Create, e.to_string())
            }
        }
    }

    async fn publish(
        &self,
        client: &dyn MarketplaceClient,
        record: &AdRecord,
    ) -> Result<AdResponse, PublishError> {
        let vehicle_id = record.vehicle_id.as_deref().ok_or(PublishError::NoVehicle)?;
        let vehicle = self
            .directory
            .vehicle(vehicle_id)
            .ok_or_else(|| PublishError::VehicleNotFound(vehicle_id.to_string()))?;
        let owner = self
            .directory
            .user(&record.owner_id)
            .ok_or_else(|| PublishError::OwnerNotFound(record.owner_id.clone()))?;

        let dealer_code = owner
            .dealership
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(&self.default_dealer_code);

        let request = vehicle_to_request(
            vehicle,
            dealer_code,
            &owner.contact_info(),
            Some(&record.source_id),
        )
        .with_content(&record.content());

        Ok(self.call(client.create_ad(&request)).await?)
    }

    // ------------------------------------------------------------------
    // Read / reconcile
    // ------------------------------------------------------------------

    /// Fetch a record, merging the marketplace's current state when it can
    /// be reached. A marketplace failure returns the stored record as is.
    pub async fn reconcile(&self, owner_id: &str, id: Uuid) -> Result<ReconciledAd, ServerError> {
        let record = self.owned(owner_id, id)?;

        let Some(client) = self.marketplace.as_deref() else {
            return Ok(ReconciledAd {
                record,
                remote_logs: None,
            });
        };

        match self.call(client.get_ad(&record.source_id)).await {
            Ok(resp) => {
                let updated = self.store.update(record.id, remote_patch(&resp, None))?;
                debug!(id = %id, remote_state = %resp.state, "Reconciled ad with marketplace");
                Ok(ReconciledAd {
                    record: updated,
                    remote_logs: Some(resp.logs),
                })
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Marketplace unreachable, serving local record");
                Ok(ReconciledAd {
                    record,
                    remote_logs: None,
                })
            }
        }
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Merge new content locally, then push it to the marketplace. An ad that
    /// was never published (a failed create) is published again with the
    /// merged content and stamped as a `create`.
    pub async fn update(
        &self,
        owner_id: &str,
        id: Uuid,
        payload: UpdateAdPayload,
    ) -> Result<AdRecord, ServerError> {
        let changes = payload.validate()?;
        let record = self.owned(owner_id, id)?;

        let mut local = AdRecordPatch::from_content(changes.clone());
        local.last_action = Some(AdAction::Update);
        local.action_state = Some(ActionState::Processing);
        let record = self.store.update(record.id, local)?;

        let patch = match self.marketplace.as_deref() {
            Some(client) if record.is_published() => {
                let update = AdUpdate::from_patch(&changes);
                match self.call(client.update_ad(&record.source_id, &update)).await {
                    Ok(resp) => remote_patch(&resp, Some(AdAction::Update)),
                    Err(e) => {
                        warn!(id = %id, error = %e, "Marketplace update failed");
                        AdRecordPatch::failed(AdAction::Update, e.to_string())
                    }
                }
            }
            Some(client) => self.publish_patch(client, &record).await,
            None => AdRecordPatch::status(AdAction::Update, ActionState::Done),
        };

        self.settle(record, patch)
    }

    // ------------------------------------------------------------------
    // Bump
    // ------------------------------------------------------------------

    /// Ask the marketplace to renew the ad. The record is marked
    /// `bump/processing` before the call; the marketplace finishes the
    /// renewal on its own schedule. A failed dispatch flips it to `error`.
    pub async fn bump(
        &self,
        owner_id: &str,
        id: Uuid,
        options: BumpOptions,
    ) -> Result<AdRecord, ServerError> {
        let record = self.owned(owner_id, id)?;

        let Some(client) = self.marketplace.as_deref() else {
            return Err(ServerError::PreconditionFailed(
                "Marketplace API not configured".into(),
            ));
        };
        if !record.is_published() {
            return Err(ServerError::PreconditionFailed(
                "Ad has not been published to the marketplace".into(),
            ));
        }

        let marked = self
            .store
            .update(id, AdRecordPatch::status(AdAction::Bump, ActionState::Processing))?;

        match self.call(client.bump_ad(&record.source_id, &options)).await {
            Ok(_) => {
                info!(
                    id = %id,
                    exclude_blocket = options.exclude_blocket,
                    exclude_bytbil = options.exclude_bytbil,
                    "Ad renewal dispatched"
                );
                Ok(marked)
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Ad renewal failed");
                self.settle(marked, AdRecordPatch::failed(AdAction::Bump, e.to_string()))
            }
        }
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Remove the ad remotely (best-effort), then locally (authoritative).
    pub async fn delete(&self, owner_id: &str, id: Uuid) -> Result<(), ServerError> {
        let record = self.owned(owner_id, id)?;

        if let Some(client) = self.marketplace.as_deref() {
            if let Err(e) = self.call(client.delete_ad(&record.source_id)).await {
                warn!(
                    id = %id,
                    source_id = %record.source_id,
                    error = %e,
                    "Marketplace delete failed, deleting locally anyway"
                );
            }
        }

        if !self.store.delete(id)? {
            return Err(ServerError::NotFound);
        }
        info!(id = %id, source_id = %record.source_id, "Ad deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// The record, if it exists and belongs to `owner_id`.
    fn owned(&self, owner_id: &str, id: Uuid) -> Result<AdRecord, ServerError> {
        self.store
            .get_by_id(id)?
            .filter(|r| r.owner_id == owner_id)
            .ok_or(ServerError::NotFound)
    }

    /// Write the outcome of a marketplace call. If the record was deleted
    /// while the call was in flight, the outcome is returned without being
    /// stored.
    fn settle(&self, record: AdRecord, patch: AdRecordPatch) -> Result<AdRecord, ServerError> {
        match self.store.update(record.id, patch.clone()) {
            Ok(updated) => Ok(updated),
            Err(StoreError::NotFound(_)) => {
                warn!(
                    id = %record.id,
                    source_id = %record.source_id,
                    remote_ad_id = ?patch.remote_ad_id,
                    "Ad deleted during a marketplace call, remote ad may be orphaned"
                );
                let mut record = record;
                patch.apply(&mut record, Utc::now());
                Ok(record)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, MarketplaceError>>,
    ) -> Result<T, MarketplaceError> {
        tokio::time::timeout(self.call_timeout, fut)
            .await
            .unwrap_or(Err(MarketplaceError::Timeout))
    }
}

/// Merge what the marketplace reported. With `action`, also mark it done.
fn remote_patch(resp: &AdResponse, action: Option<AdAction>) -> AdRecordPatch {
    let mut patch = match action {
        Some(action) => AdRecordPatch::status(action, ActionState::Done),
        None => AdRecordPatch::default(),
    };
    patch.remote_ad_id = Some(resp.remote_ad_id());
    patch.secondary_remote_ad_id = resp.secondary_remote_ad_id();
    patch.remote_state = Some(resp.state.clone());
    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use adsync_store::MemoryAdStore;
    use async_trait::async_trait;

    // ------------------------------------------------------------------
    // Scriptable marketplace
    // ------------------------------------------------------------------

    #[derive(Default)]
    struct FakeMarketplace {
        failing: Mutex<HashSet<&'static str>>,
        slow: HashSet<&'static str>,
        hang: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeMarketplace {
        fn failing(ops: &[&'static str]) -> Self {
            Self {
                failing: Mutex::new(ops.iter().copied().collect()),
                ..Default::default()
            }
        }

        fn slow(ops: &[&'static str]) -> Self {
            Self {
                slow: ops.iter().copied().collect(),
                ..Default::default()
            }
        }

        fn recover(&self, op: &'static str) {
            self.failing.lock().unwrap().remove(op);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        async fn respond(&self, op: &'static str, source_id: &str) -> Result<AdResponse, MarketplaceError> {
            self.calls.lock().unwrap().push(format!("{op}:{source_id}"));
            if self.hang {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.slow.contains(op) {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            let fails = self.failing.lock().unwrap().contains(op);
            if fails {
                return Err(MarketplaceError::Status {
                    status: 500,
                    body: "internal error".into(),
                });
            }
            Ok(AdResponse {
                id: "imp-1".into(),
                source_id: source_id.into(),
                state: if op == "delete" { "deleted" } else { "created" }.into(),
                blocket_ad_id: Some("R1".into()),
                bytbil_ad_id: Some("B1".into()),
                dealer_code: None,
                category_id: None,
                title: None,
                body: None,
                price: vec![],
                image_urls: vec![],
                created_at: None,
                updated_at: None,
                logs: vec![LogMessage {
                    id: "log-1".into(),
                    action: adsync_market::LogAction::Publish,
                    state: adsync_market::LogState::Done,
                    message: None,
                    created_at: "2024-05-01T10:00:00Z".into(),
                }],
            })
        }
    }

    #[async_trait]
    impl MarketplaceClient for FakeMarketplace {
        async fn create_ad(&self, request: &adsync_market::AdRequest) -> Result<AdResponse, MarketplaceError> {
            self.respond("create", &request.source_id).await
        }

        async fn get_ad(&self, source_id: &str) -> Result<AdResponse, MarketplaceError> {
            self.respond("get", source_id).await
        }

        async fn update_ad(&self, source_id: &str, _update: &AdUpdate) -> Result<AdResponse, MarketplaceError> {
            self.respond("update", source_id).await
        }

        async fn bump_ad(&self, source_id: &str, _options: &BumpOptions) -> Result<AdResponse, MarketplaceError> {
            self.respond("bump", source_id).await
        }

        async fn delete_ad(&self, source_id: &str) -> Result<(), MarketplaceError> {
            self.respond("delete", source_id).await.map(|_| ())
        }
    }

    // ------------------------------------------------------------------
    // Fixtures
    // ------------------------------------------------------------------

    const OWNER: &str = "user-1";

    struct Harness {
        store: Arc<MemoryAdStore>,
        market: Option<Arc<FakeMarketplace>>,
        coordinator: AdSyncCoordinator,
    }

    fn harness(market: Option<FakeMarketplace>) -> Harness {
        let store = Arc::new(MemoryAdStore::new());
        let market = market.map(Arc::new);
        let client = market
            .clone()
            .map(|m| m as Arc<dyn MarketplaceClient>);
        let coordinator = AdSyncCoordinator::new(
            store.clone(),
            Arc::new(Directory::sample()),
            client,
            "DEFAULT_DEALER",
            Duration::from_millis(200),
        );
        Harness {
            store,
            market,
            coordinator,
        }
    }

    fn payload(source_id: &str) -> CreateAdPayload {
        serde_json::from_value(serde_json::json!({
            "sourceId": source_id,
            "vehicleId": "vehicle-1",
            "categoryId": 1020,
            "title": "2024 Honda Accord LX",
            "body": "One owner, full service history",
            "price": 459000
        }))
        .unwrap()
    }

    impl Harness {
        fn calls(&self) -> Vec<String> {
            self.market.as_ref().map(|m| m.calls()).unwrap_or_default()
        }

        async fn published(&self) -> AdRecord {
            let record = self.coordinator.create(OWNER, payload("v-1-1000")).await.unwrap();
            assert_eq!(record.remote_ad_id.as_deref(), Some("R1"));
            record
        }
    }

    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn create_then_read_reflects_remote_ids() {
        let h = harness(Some(FakeMarketplace::default()));
        let created = h.coordinator.create(OWNER, payload("v-1-1000")).await.unwrap();

        assert_eq!(created.remote_ad_id.as_deref(), Some("R1"));
        assert_eq!(created.secondary_remote_ad_id.as_deref(), Some("B1"));
        assert_eq!(created.remote_state.as_deref(), Some("created"));
        assert_eq!(created.last_action, Some(AdAction::Create));
        assert_eq!(created.action_state, Some(ActionState::Done));
        assert_eq!(created.price, 459000.0);

        let read = h.coordinator.reconcile(OWNER, created.id).await.unwrap();
        assert_eq!(read.record.remote_ad_id.as_deref(), Some("R1"));
        assert_eq!(read.record.action_state, Some(ActionState::Done));
        assert_eq!(h.calls(), vec!["create:v-1-1000", "get:v-1-1000"]);
    }

    #[tokio::test]
    async fn duplicate_source_id_is_rejected_without_side_effects() {
        let h = harness(Some(FakeMarketplace::default()));
        let first = h.coordinator.create(OWNER, payload("v-1-1000")).await.unwrap();
        let before = h.store.get_by_id(first.id).unwrap();

        let err = h.coordinator.create(OWNER, payload("v-1-1000")).await.unwrap_err();
        assert!(matches!(err, ServerError::DuplicateSourceId(ref s) if s == "v-1-1000"));

        assert_eq!(h.store.len(), 1);
        assert_eq!(h.store.get_by_id(first.id).unwrap(), before);
        assert_eq!(h.calls(), vec!["create:v-1-1000"]);
    }

    #[tokio::test]
    async fn failed_publish_keeps_local_record() {
        let h = harness(Some(FakeMarketplace::failing(&["create"])));
        let record = h.coordinator.create(OWNER, payload("v-1-1000")).await.unwrap();

        assert_eq!(record.last_action, Some(AdAction::Create));
        assert_eq!(record.action_state, Some(ActionState::Error));
        assert!(record.remote_ad_id.is_none());
        assert!(record
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("500")));

        let read = h.coordinator.reconcile(OWNER, record.id).await.unwrap();
        assert_eq!(read.record.id, record.id);
    }

    #[tokio::test]
    async fn timeout_is_recorded_like_any_failure() {
        let h = harness(Some(FakeMarketplace {
            hang: true,
            ..Default::default()
        }));
        let record = h.coordinator.create(OWNER, payload("v-1-1000")).await.unwrap();

        assert_eq!(record.action_state, Some(ActionState::Error));
        assert_eq!(record.error_message.as_deref(), Some("Marketplace request timed out"));
        assert!(record.created_at <= record.updated_at);
    }

    #[tokio::test]
    async fn local_only_mode_completes_create() {
        let h = harness(None);
        let record = h.coordinator.create(OWNER, payload("v-1-1000")).await.unwrap();

        assert_eq!(record.last_action, Some(AdAction::Create));
        assert_eq!(record.action_state, Some(ActionState::Done));
        assert!(record.remote_ad_id.is_none());
        assert!(!h.coordinator.marketplace_enabled());
    }

    #[tokio::test]
    async fn unknown_vehicle_is_recorded_as_error() {
        let h = harness(Some(FakeMarketplace::default()));
        let mut p = payload("v-9-1000");
        p.vehicle_id = Some("vehicle-9".into());

        let record = h.coordinator.create(OWNER, p).await.unwrap();
        assert_eq!(record.action_state, Some(ActionState::Error));
        assert_eq!(record.error_message.as_deref(), Some("Vehicle vehicle-9 not found"));
        assert!(h.calls().is_empty());
    }

    #[tokio::test]
    async fn generated_source_id_uses_vehicle() {
        let h = harness(None);
        let mut p = payload("ignored");
        p.source_id = None;

        let record = h.coordinator.create(OWNER, p).await.unwrap();
        assert!(record.source_id.starts_with("vehicle-vehicle-1-"));
    }

    #[tokio::test]
    async fn invalid_payload_never_touches_store() {
        let h = harness(Some(FakeMarketplace::default()));
        let mut p = payload("v-1-1000");
        p.price = Some(adsync_shared::payload::PriceInput::Number(-5.0));

        let err = h.coordinator.create(OWNER, p).await.unwrap_err();
        assert!(matches!(err, ServerError::Validation(ValidationError::NonPositivePrice(_))));
        assert!(h.store.is_empty());
        assert!(h.calls().is_empty());
    }

    // ------------------------------------------------------------------
    // Reconcile
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn reconcile_failure_returns_stored_record() {
        let h = harness(Some(FakeMarketplace::failing(&["get"])));
        let record = h.published().await;
        let stored = h.store.get_by_id(record.id).unwrap().unwrap();

        let read = h.coordinator.reconcile(OWNER, record.id).await.unwrap();
        assert_eq!(read.record, stored);
        assert!(read.remote_logs.is_none());
    }

    #[tokio::test]
    async fn reconcile_returns_remote_logs() {
        let h = harness(Some(FakeMarketplace::default()));
        let record = h.published().await;

        let read = h.coordinator.reconcile(OWNER, record.id).await.unwrap();
        let logs = read.remote_logs.unwrap();
        assert_eq!(logs.len(), 1);

        let json = serde_json::to_value(ReconciledAd {
            record: read.record,
            remote_logs: Some(logs),
        })
        .unwrap();
        assert_eq!(json["remoteAdId"], "R1");
        assert_eq!(json["remoteLogs"][0]["action"], "publish");
    }

    #[tokio::test]
    async fn other_owners_see_not_found() {
        let h = harness(Some(FakeMarketplace::default()));
        let record = h.published().await;

        assert!(matches!(
            h.coordinator.reconcile("user-2", record.id).await,
            Err(ServerError::NotFound)
        ));
        assert!(matches!(
            h.coordinator.delete("user-2", record.id).await,
            Err(ServerError::NotFound)
        ));
        assert!(h.store.get_by_id(record.id).unwrap().is_some());
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn update_pushes_changes_for_published_ads() {
        let h = harness(Some(FakeMarketplace::default()));
        let record = h.published().await;

        let update: UpdateAdPayload =
            serde_json::from_value(serde_json::json!({ "price": 449000 })).unwrap();
        let updated = h.coordinator.update(OWNER, record.id, update).await.unwrap();

        assert_eq!(updated.price, 449000.0);
        assert_eq!(updated.last_action, Some(AdAction::Update));
        assert_eq!(updated.action_state, Some(ActionState::Done));
        assert!(h.calls().contains(&"update:v-1-1000".to_string()));
    }

    #[tokio::test]
    async fn update_failure_keeps_local_change() {
        let h = harness(Some(FakeMarketplace::failing(&["update"])));
        let record = h.published().await;

        let update: UpdateAdPayload =
            serde_json::from_value(serde_json::json!({ "title": "Price drop!" })).unwrap();
        let updated = h.coordinator.update(OWNER, record.id, update).await.unwrap();

        assert_eq!(updated.title, "Price drop!");
        assert_eq!(updated.action_state, Some(ActionState::Error));
        assert_eq!(updated.remote_ad_id.as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn update_republishes_after_failed_create() {
        let h = harness(Some(FakeMarketplace::failing(&["create"])));
        let record = h.coordinator.create(OWNER, payload("v-1-1000")).await.unwrap();
        assert_eq!(record.action_state, Some(ActionState::Error));

        h.market.as_ref().unwrap().recover("create");
        let update: UpdateAdPayload =
            serde_json::from_value(serde_json::json!({ "body": "Winter tyres included" })).unwrap();
        let updated = h.coordinator.update(OWNER, record.id, update).await.unwrap();

        assert_eq!(updated.body, "Winter tyres included");
        assert_eq!(updated.last_action, Some(AdAction::Create));
        assert_eq!(updated.action_state, Some(ActionState::Done));
        assert_eq!(updated.remote_ad_id.as_deref(), Some("R1"));
        assert!(updated.error_message.is_none());
        assert_eq!(h.calls(), vec!["create:v-1-1000", "create:v-1-1000"]);
    }

    #[tokio::test]
    async fn update_of_unpublished_ad_keeps_failure_visible() {
        let h = harness(Some(FakeMarketplace::failing(&["create"])));
        let record = h.coordinator.create(OWNER, payload("v-1-1000")).await.unwrap();

        let update: UpdateAdPayload =
            serde_json::from_value(serde_json::json!({ "body": "x" })).unwrap();
        let updated = h.coordinator.update(OWNER, record.id, update).await.unwrap();

        assert_eq!(updated.body, "x");
        assert_eq!(updated.action_state, Some(ActionState::Error));
        assert!(updated.remote_ad_id.is_none());
        assert!(updated
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("500")));
        assert_eq!(h.calls(), vec!["create:v-1-1000", "create:v-1-1000"]);
    }

    #[tokio::test]
    async fn update_without_marketplace_is_local_only() {
        let h = harness(None);
        let record = h.coordinator.create(OWNER, payload("v-1-1000")).await.unwrap();

        let update: UpdateAdPayload =
            serde_json::from_value(serde_json::json!({ "title": "New title" })).unwrap();
        let updated = h.coordinator.update(OWNER, record.id, update).await.unwrap();

        assert_eq!(updated.last_action, Some(AdAction::Update));
        assert_eq!(updated.action_state, Some(ActionState::Done));
    }

    // ------------------------------------------------------------------
    // Bump
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn bump_marks_processing_immediately() {
        let h = harness(Some(FakeMarketplace::default()));
        let record = h.published().await;

        let options = BumpOptions {
            exclude_blocket: false,
            exclude_bytbil: true,
        };
        let bumped = h.coordinator.bump(OWNER, record.id, options).await.unwrap();

        assert_eq!(bumped.last_action, Some(AdAction::Bump));
        assert_eq!(bumped.action_state, Some(ActionState::Processing));
        let stored = h.store.get_by_id(record.id).unwrap().unwrap();
        assert_eq!(stored.action_state, Some(ActionState::Processing));
        assert!(h.calls().contains(&"bump:v-1-1000".to_string()));
    }

    #[tokio::test]
    async fn bump_requires_published_ad() {
        let h = harness(Some(FakeMarketplace::failing(&["create"])));
        let record = h.coordinator.create(OWNER, payload("v-1-1000")).await.unwrap();

        let err = h
            .coordinator
            .bump(OWNER, record.id, BumpOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::PreconditionFailed(_)));
        assert!(!h.calls().iter().any(|c| c.starts_with("bump")));

        let stored = h.store.get_by_id(record.id).unwrap().unwrap();
        assert_eq!(stored.last_action, Some(AdAction::Create));
    }

    #[tokio::test]
    async fn bump_requires_configured_marketplace() {
        let h = harness(None);
        let record = h.coordinator.create(OWNER, payload("v-1-1000")).await.unwrap();
        assert!(matches!(
            h.coordinator.bump(OWNER, record.id, BumpOptions::default()).await,
            Err(ServerError::PreconditionFailed(_))
        ));
    }

    #[tokio::test]
    async fn failed_bump_is_recorded() {
        let h = harness(Some(FakeMarketplace::failing(&["bump"])));
        let record = h.published().await;

        let bumped = h
            .coordinator
            .bump(OWNER, record.id, BumpOptions::default())
            .await
            .unwrap();
        assert_eq!(bumped.last_action, Some(AdAction::Bump));
        assert_eq!(bumped.action_state, Some(ActionState::Error));
        assert_eq!(bumped.remote_ad_id.as_deref(), Some("R1"));
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn delete_survives_remote_failure() {
        let h = harness(Some(FakeMarketplace::failing(&["delete"])));
        let record = h.published().await;

        h.coordinator.delete(OWNER, record.id).await.unwrap();

        assert!(h.store.get_by_id(record.id).unwrap().is_none());
        assert!(h.calls().contains(&"delete:v-1-1000".to_string()));
    }

    #[tokio::test]
    async fn create_survives_delete_during_publish() {
        let h = harness(Some(FakeMarketplace::slow(&["create"])));

        let delete_soon = async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            let id = h.store.get_by_source_id("v-1-1000").unwrap().unwrap().id;
            h.coordinator.delete(OWNER, id).await
        };
        let (created, deleted) =
            tokio::join!(h.coordinator.create(OWNER, payload("v-1-1000")), delete_soon);

        deleted.unwrap();
        let created = created.unwrap();
        assert_eq!(created.remote_ad_id.as_deref(), Some("R1"));
        assert_eq!(created.action_state, Some(ActionState::Done));
        assert!(h.store.get_by_id(created.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_missing_record() {
        let h = harness(None);
        assert!(matches!(
            h.coordinator.delete(OWNER, Uuid::new_v4()).await,
            Err(ServerError::NotFound)
        ));
    }
}
