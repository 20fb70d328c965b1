//! Upload intent state machine: the two-phase handoff between "client wants
//! to upload" and "bytes verifiably exist in object storage."
//!
//! The database is the durable intent ledger; the object store is the data
//! plane. Ordering on the request path is validate → sign → persist: a
//! validation failure costs nothing, a signing failure leaves zero rows, and
//! a failed insert after signing only orphans a URL that expires unused.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mediary_core::models::{
    NewUploadIntent, UploadIntent, UploadRequest, UploadStatus, UploadTicket,
};
use mediary_core::{AppError, UploadConfig};
use mediary_db::UploadIntentStore;
use mediary_storage::{derive_upload_key, CapabilityIssuer};

#[derive(Clone)]
pub struct UploadService {
    intents: Arc<dyn UploadIntentStore>,
    issuer: Arc<dyn CapabilityIssuer>,
    config: UploadConfig,
}

impl UploadService {
    pub fn new(
        intents: Arc<dyn UploadIntentStore>,
        issuer: Arc<dyn CapabilityIssuer>,
        config: UploadConfig,
    ) -> Self {
        Self {
            intents,
            issuer,
            config,
        }
    }

    /// Issue a write capability and record the matching `PENDING` intent.
    #[tracing::instrument(
        skip(self, request),
        fields(user_id = %user_id, file_name = %request.file_name, size_bytes = request.size_bytes)
    )]
    pub async fn request_upload(
        &self,
        user_id: &str,
        request: &UploadRequest,
    ) -> Result<UploadTicket, AppError> {
        // Checked before any issuer or DB call.
        if request.file_name.is_empty() || request.content_type.is_empty() {
            return Err(AppError::InvalidInput(
                "file_name and content_type are required".to_string(),
            ));
        }
        if request.size_bytes == 0 {
            return Err(AppError::InvalidInput(
                "File size must be at least 1 byte".to_string(),
            ));
        }
        if request.size_bytes > self.config.max_file_size_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "{} bytes exceeds maximum allowed size of {} bytes",
                request.size_bytes, self.config.max_file_size_bytes
            )));
        }

        let key = derive_upload_key(
            &self.config.key_prefix,
            user_id,
            Utc::now().timestamp_millis(),
            &request.file_name,
        );

        let signed = self
            .issuer
            .signed_put_url(
                &key,
                &request.content_type,
                request.size_bytes,
                Duration::from_secs(self.config.signed_url_expiry_secs),
            )
            .await
            .map_err(|e| AppError::Storage(format!("Failed to sign upload URL: {}", e)))?;

        let intent = self
            .intents
            .insert_pending(NewUploadIntent {
                user_id: user_id.to_string(),
                file_name: request.file_name.clone(),
                storage_key: key.clone(),
                content_type: request.content_type.clone(),
                size_bytes: request.size_bytes as i64,
            })
            .await?;

        tracing::info!(intent_id = intent.id, storage_key = %key, "Upload capability issued");

        Ok(UploadTicket {
            upload_url: signed.url,
            intent_id: intent.id,
            key,
            expires_at: Utc::now()
                + chrono::Duration::seconds(signed.expires_in.as_secs() as i64),
        })
    }

    /// Confirm a completed transfer, moving the intent `PENDING → UPLOADED`.
    ///
    /// Ownership is an equality check, not mere existence: a foreign intent
    /// id fails closed with a distinct error and no state change. The
    /// client's claim that the bytes landed is trusted here; verifying object
    /// existence is the reconciliation sweep's job.
    #[tracing::instrument(skip(self), fields(user_id = %user_id, intent_id = intent_id))]
    pub async fn confirm_upload(&self, user_id: &str, intent_id: i64) -> Result<(), AppError> {
        let intent = self
            .intents
            .find_by_id(intent_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Upload intent not found: {}", intent_id)))?;

        if intent.user_id != user_id {
            tracing::warn!(
                owner_id = %intent.user_id,
                "Rejected confirm for upload intent owned by another user"
            );
            return Err(AppError::Forbidden(
                "Upload intent belongs to another user".to_string(),
            ));
        }

        let moved = self
            .intents
            .transition(intent_id, UploadStatus::Pending, UploadStatus::Uploaded, None)
            .await?;
        if !moved {
            return Err(AppError::Conflict(format!(
                "Upload intent is not pending (status: {:?})",
                intent.status
            )));
        }

        tracing::info!("Upload confirmed");

        Ok(())
    }

    /// Pipeline hook: `UPLOADED → PROCESSING`.
    pub async fn mark_processing(&self, intent_id: i64) -> Result<(), AppError> {
        self.advance(intent_id, UploadStatus::Processing, None).await
    }

    /// Pipeline hook: `PROCESSING → COMPLETED`.
    pub async fn mark_completed(&self, intent_id: i64) -> Result<(), AppError> {
        self.advance(intent_id, UploadStatus::Completed, None).await
    }

    /// Pipeline hook: terminal failure with an operator-readable reason.
    pub async fn mark_failed(&self, intent_id: i64, error: String) -> Result<(), AppError> {
        self.advance(intent_id, UploadStatus::Failed, Some(error)).await
    }

    async fn advance(
        &self,
        intent_id: i64,
        to: UploadStatus,
        error_message: Option<String>,
    ) -> Result<(), AppError> {
        let intent = self
            .intents
            .find_by_id(intent_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Upload intent not found: {}", intent_id)))?;

        if !intent.status.can_transition_to(to) {
            return Err(AppError::Conflict(format!(
                "Illegal transition {:?} -> {:?} for intent {}",
                intent.status, to, intent_id
            )));
        }

        let moved = self
            .intents
            .transition(intent_id, intent.status, to, error_message)
            .await?;
        if !moved {
            // The row moved underneath us between the read and the guarded
            // update; surface it the same way as an illegal transition.
            return Err(AppError::Conflict(format!(
                "Upload intent {} changed concurrently",
                intent_id
            )));
        }

        Ok(())
    }

    /// A user's intents, newest first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UploadIntent>, AppError> {
        self.intents.list_for_user(user_id, limit, offset).await
    }

    /// Intents stuck in `PENDING` longer than `staleness` — the read side of
    /// the external reconciliation sweep.
    pub async fn stale_pending(
        &self,
        staleness: chrono::Duration,
    ) -> Result<Vec<UploadIntent>, AppError> {
        self.intents.list_stale_pending(Utc::now() - staleness).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediary_db::InMemoryUploadIntentStore;
    use mediary_storage::InMemoryCapabilityIssuer;

    const MAX_FILE_SIZE: u64 = 100_000_000;

    fn upload_request(file_name: &str, content_type: &str, size_bytes: u64) -> UploadRequest {
        UploadRequest {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            size_bytes,
        }
    }

    fn setup() -> (
        UploadService,
        Arc<InMemoryUploadIntentStore>,
        Arc<InMemoryCapabilityIssuer>,
    ) {
        let intents = Arc::new(InMemoryUploadIntentStore::new());
        let issuer = Arc::new(InMemoryCapabilityIssuer::new());
        let service = UploadService::new(
            intents.clone(),
            issuer.clone(),
            UploadConfig {
                max_file_size_bytes: MAX_FILE_SIZE,
                signed_url_expiry_secs: 600,
                key_prefix: "uploads".to_string(),
            },
        );
        (service, intents, issuer)
    }

    #[tokio::test]
    async fn test_request_then_confirm_round_trip() {
        let (service, intents, _issuer) = setup();

        let ticket = service
            .request_upload("u1", &upload_request("photo.jpg", "image/jpeg", 50_000_000))
            .await
            .unwrap();
        assert!(ticket.key.starts_with("uploads/u1/"));
        assert!(ticket.upload_url.contains(&ticket.key));
        assert!(ticket.expires_at > Utc::now());

        let intent = intents.find_by_id(ticket.intent_id).await.unwrap().unwrap();
        assert_eq!(intent.status, UploadStatus::Pending);
        assert_eq!(intent.size_bytes, 50_000_000);

        service.confirm_upload("u1", ticket.intent_id).await.unwrap();
        let intent = intents.find_by_id(ticket.intent_id).await.unwrap().unwrap();
        assert_eq!(intent.status, UploadStatus::Uploaded);
        assert!(intent.updated_at >= intent.created_at);
    }

    #[tokio::test]
    async fn test_oversized_request_is_rejected_before_any_side_effect() {
        let (service, intents, issuer) = setup();

        let err = service
            .request_upload("u1", &upload_request("huge.mp4", "video/mp4", 200_000_000))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PayloadTooLarge(_)));
        assert_eq!(intents.intent_count(), 0);
        assert_eq!(issuer.sign_count(), 0);
    }

    #[tokio::test]
    async fn test_signing_failure_leaves_no_row() {
        let (service, intents, issuer) = setup();
        issuer.set_fail_signing(true);

        let err = service
            .request_upload("u1", &upload_request("photo.jpg", "image/jpeg", 1_000))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(intents.intent_count(), 0);
    }

    #[tokio::test]
    async fn test_confirm_foreign_intent_fails_closed() {
        let (service, intents, _issuer) = setup();
        let ticket = service
            .request_upload("owner", &upload_request("photo.jpg", "image/jpeg", 1_000))
            .await
            .unwrap();

        let err = service
            .confirm_upload("intruder", ticket.intent_id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
        let intent = intents.find_by_id(ticket.intent_id).await.unwrap().unwrap();
        assert_eq!(intent.status, UploadStatus::Pending);
    }

    #[tokio::test]
    async fn test_confirm_unknown_intent_is_not_found() {
        let (service, _intents, _issuer) = setup();
        let err = service.confirm_upload("u1", 999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_double_confirm_is_a_conflict() {
        let (service, _intents, _issuer) = setup();
        let ticket = service
            .request_upload("u1", &upload_request("photo.jpg", "image/jpeg", 1_000))
            .await
            .unwrap();

        service.confirm_upload("u1", ticket.intent_id).await.unwrap();
        let err = service
            .confirm_upload("u1", ticket.intent_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_pipeline_transitions_enforce_legality() {
        let (service, intents, _issuer) = setup();
        let ticket = service
            .request_upload("u1", &upload_request("clip.mp4", "video/mp4", 1_000))
            .await
            .unwrap();
        let id = ticket.intent_id;

        // Processing before confirm is illegal.
        assert!(matches!(
            service.mark_processing(id).await.unwrap_err(),
            AppError::Conflict(_)
        ));

        service.confirm_upload("u1", id).await.unwrap();
        service.mark_processing(id).await.unwrap();
        service.mark_completed(id).await.unwrap();

        // Terminal states never regress.
        assert!(matches!(
            service.mark_failed(id, "late failure".to_string()).await.unwrap_err(),
            AppError::Conflict(_)
        ));
        let intent = intents.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(intent.status, UploadStatus::Completed);
    }

    #[tokio::test]
    async fn test_mark_failed_records_the_reason() {
        let (service, intents, _issuer) = setup();
        let ticket = service
            .request_upload("u1", &upload_request("clip.mp4", "video/mp4", 1_000))
            .await
            .unwrap();
        service.confirm_upload("u1", ticket.intent_id).await.unwrap();
        service
            .mark_failed(ticket.intent_id, "transcode crashed".to_string())
            .await
            .unwrap();

        let intent = intents.find_by_id(ticket.intent_id).await.unwrap().unwrap();
        assert_eq!(intent.status, UploadStatus::Failed);
        assert_eq!(intent.error_message.as_deref(), Some("transcode crashed"));
    }

    #[tokio::test]
    async fn test_stale_pending_surfaces_abandoned_intents() {
        let (service, intents, _issuer) = setup();
        let abandoned = service
            .request_upload("u1", &upload_request("a.jpg", "image/jpeg", 1_000))
            .await
            .unwrap();
        let fresh = service
            .request_upload("u1", &upload_request("b.jpg", "image/jpeg", 1_000))
            .await
            .unwrap();

        intents.set_created_at(abandoned.intent_id, Utc::now() - chrono::Duration::hours(48));

        let stale = service
            .stale_pending(chrono::Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, abandoned.intent_id);
        assert_ne!(stale[0].id, fresh.intent_id);
    }

    #[tokio::test]
    async fn test_list_for_user_is_scoped_and_paginated() {
        let (service, _intents, _issuer) = setup();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            service
                .request_upload("u1", &upload_request(name, "image/jpeg", 1_000))
                .await
                .unwrap();
        }
        service
            .request_upload("u2", &upload_request("other.jpg", "image/jpeg", 1_000))
            .await
            .unwrap();

        let mine = service.list_for_user("u1", 2, 0).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|i| i.user_id == "u1"));

        let rest = service.list_for_user("u1", 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
    }
}
