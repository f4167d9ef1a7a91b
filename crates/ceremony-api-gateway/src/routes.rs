//! The ceremony RPC surface: one axum route per operation,
//! each returning its concrete result type rather than a JSON-RPC
//! envelope. Coordinator-only operations are nested under a router with
//! `AuthLayer::new(.., MethodTier::CoordinatorOnly)`; the rest sit behind
//! `MethodTier::ContributorOrCoordinator`, with `RateLimitLayer` layered
//! again on the two highest-frequency upload calls.

use crate::dto::*;
use crate::middleware::{AuthLayer, MethodTier, RateLimitLayer};
use crate::domain::error::{core, ResponseError};
use crate::domain::config::CoordinatorConfig;
use axum::extract::{Extension, Path, State};
use axum::routing::post;
use axum::{Json, Router};
use ceremony_ports::{Authenticator, BlobStore, CorsConfig, CoreError, MetaStore, Principal};
use chrono::Utc;
use shared_types::{
    Ceremony, CeremonyId, Circuit, CircuitId, Contribution, Participant, ParticipantId,
    ParticipantStatus,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub meta_store: Arc<dyn MetaStore>,
    pub blob_store: Arc<dyn BlobStore>,
    pub setup: Arc<ceremony_setup::Setup>,
    pub finalizer: Arc<ceremony_finalizer::Finalizer>,
    pub upload: Arc<ceremony_upload::UploadCoordinator>,
    pub verifier: Arc<ceremony_verifier::Verifier>,
    pub scheduler: Arc<ceremony_scheduler::Scheduler>,
    pub config: CoordinatorConfig,
}

fn caller(principal: &Principal) -> Result<ParticipantId, ResponseError> {
    principal
        .participant_id()
        .cloned()
        .ok_or_else(|| ResponseError(CoreError::Forbidden("caller has no bound participant identity".to_string())))
}

async fn circuit_at_progress(
    state: &AppState,
    ceremony_id: &CeremonyId,
    progress: u32,
) -> Result<Circuit, ResponseError> {
    let circuits = state.meta_store.list_circuits(ceremony_id).await.map_err(core)?;
    circuits
        .into_iter()
        .find(|c| c.sequence_position == progress)
        .ok_or_else(|| ResponseError(CoreError::NotFound(format!("no circuit at sequence position {progress}"))))
}

pub fn router(state: AppState, authenticator: Arc<dyn Authenticator>) -> Router {
    let coordinator_only = Router::new()
        .route("/ceremonies", post(setup_ceremony))
        .route("/buckets", post(create_bucket))
        .route("/ceremonies/:ceremony_id/circuits/:circuit_id/finalize", post(finalize_circuit))
        .route("/ceremonies/:ceremony_id/finalize", post(finalize_ceremony))
        .route(
            "/ceremonies/:ceremony_id/prepare-finalization",
            post(check_and_prepare_coordinator_for_finalization),
        )
        .layer(AuthLayer::new(Arc::clone(&authenticator), MethodTier::CoordinatorOnly));

    let rate_limited = RateLimitLayer::new(state.config.rate_limit.clone());

    let contributor_or_coordinator = Router::new()
        .route("/ceremonies/:ceremony_id/participants/check", post(check_participant_for_ceremony))
        .route(
            "/ceremonies/:ceremony_id/participants/progress-circuit",
            post(progress_to_next_circuit_for_contribution),
        )
        .route(
            "/ceremonies/:ceremony_id/participants/progress-step",
            post(progress_to_next_contribution_step),
        )
        .route(
            "/ceremonies/:ceremony_id/participants/contribution-time-hash",
            post(permanently_store_contribution_time_and_hash),
        )
        .route(
            "/ceremonies/:ceremony_id/participants/resume-timeout",
            post(resume_contribution_after_timeout_expiration),
        )
        .route("/ceremonies/:ceremony_id/circuits/:circuit_id/verify", post(verify_contribution))
        .route("/objects/sign-get", post(generate_get_object_pre_signed_url))
        .route("/objects/exists", post(check_if_object_exist))
        .route("/uploads/store-id", post(temporary_store_upload_id))
        .route("/uploads/sign-parts", post(generate_pre_signed_urls_parts))
        .route("/uploads/complete", post(complete_multi_part_upload))
        .route(
            "/uploads/open",
            post(open_multi_part_upload).layer(rate_limited.clone()),
        )
        .route(
            "/uploads/store-chunk",
            post(temporary_store_uploaded_chunk_data).layer(rate_limited),
        )
        .layer(AuthLayer::new(authenticator, MethodTier::ContributorOrCoordinator));

    Router::new().merge(coordinator_only).merge(contributor_or_coordinator).with_state(state)
}

// -- Coordinator-only ------------------------------------------------------

async fn setup_ceremony(
    State(state): State<AppState>,
    Json(body): Json<SetupCeremonyRequest>,
) -> Result<Json<Ceremony>, ResponseError> {
    let input = body.into_input().map_err(ResponseError::from)?;
    let ceremony = state.setup.setup_ceremony(input).await.map_err(core)?;
    Ok(Json(ceremony))
}

async fn create_bucket(
    State(state): State<AppState>,
    Json(body): Json<CreateBucketRequest>,
) -> Result<Json<CreateBucketResponse>, ResponseError> {
    state
        .blob_store
        .create_bucket(&body.bucket, CorsConfig::default())
        .await
        .map_err(ResponseError::from)?;
    Ok(Json(CreateBucketResponse { bucket: body.bucket }))
}

async fn finalize_circuit(
    State(state): State<AppState>,
    Path((ceremony_id, circuit_id)): Path<(String, String)>,
) -> Result<Json<Contribution>, ResponseError> {
    let contribution = state
        .finalizer
        .finalize_circuit(&CeremonyId::from(ceremony_id), &CircuitId::from(circuit_id))
        .await
        .map_err(core)?;
    Ok(Json(contribution))
}

async fn finalize_ceremony(
    State(state): State<AppState>,
    Path(ceremony_id): Path<String>,
) -> Result<Json<Ceremony>, ResponseError> {
    let ceremony = state.finalizer.finalize_ceremony(&CeremonyId::from(ceremony_id)).await.map_err(core)?;
    Ok(Json(ceremony))
}

async fn check_and_prepare_coordinator_for_finalization(
    State(state): State<AppState>,
    Path(ceremony_id): Path<String>,
) -> Result<Json<Ceremony>, ResponseError> {
    let ceremony_id = CeremonyId::from(ceremony_id);
    let now = Utc::now();
    let ceremony = state
        .meta_store
        .mutate_ceremony(
            &ceremony_id,
            Box::new(move |ceremony| {
                ceremony_statemachine::close_if_due(ceremony, now)?;
                Ok(())
            }),
        )
        .await
        .map_err(ResponseError::from)?;
    Ok(Json(ceremony))
}

// -- Authenticated contributor or coordinator ------------------------------

async fn check_participant_for_ceremony(
    State(state): State<AppState>,
    Path(ceremony_id): Path<String>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Participant>, ResponseError> {
    let ceremony_id = CeremonyId::from(ceremony_id);
    let participant_id = caller(&principal)?;

    let ceremony = state.meta_store.get_ceremony(&ceremony_id).await.map_err(ResponseError::from)?;

    match state.meta_store.get_participant(&ceremony_id, &participant_id).await {
        Ok(_) => {}
        Err(CoreError::NotFound(_)) => {
            state
                .meta_store
                .create_participant(Participant::new(ceremony_id.clone(), participant_id.clone(), Utc::now()))
                .await
                .map_err(ResponseError::from)?;
        }
        Err(other) => return Err(ResponseError(other)),
    }

    let has_active_timeout = state
        .meta_store
        .active_timeout(&participant_id, Utc::now())
        .await
        .map_err(ResponseError::from)?
        .is_some();

    let participant = state
        .meta_store
        .mutate_participant(
            &ceremony_id,
            &participant_id,
            Box::new(move |p| {
                match p.status {
                    ParticipantStatus::Created => ceremony_statemachine::join_ceremony(p, &ceremony)?,
                    ParticipantStatus::Waiting => {
                        ceremony_statemachine::mark_ready(p, &ceremony, has_active_timeout)?
                    }
                    _ => {}
                }
                Ok(())
            }),
        )
        .await
        .map_err(ResponseError::from)?;

    if participant.status == ParticipantStatus::Ready {
        if let Ok(circuit) = circuit_at_progress(&state, &ceremony_id, participant.contribution_progress + 1).await {
            state.scheduler.admit(&ceremony_id, &circuit.id, &participant_id).await.map_err(core)?;
        }
    }

    Ok(Json(participant))
}

async fn progress_to_next_circuit_for_contribution(
    State(state): State<AppState>,
    Path(ceremony_id): Path<String>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Participant>, ResponseError> {
    let ceremony_id = CeremonyId::from(ceremony_id);
    let participant_id = caller(&principal)?;

    let total_circuits = state.meta_store.list_circuits(&ceremony_id).await.map_err(ResponseError::from)?.len() as u32;

    let participant = state
        .meta_store
        .mutate_participant(
            &ceremony_id,
            &participant_id,
            Box::new(move |p| {
                ceremony_statemachine::complete_circuit(p, total_circuits, Utc::now())?;
                Ok(())
            }),
        )
        .await
        .map_err(ResponseError::from)?;

    if participant.status == ParticipantStatus::Waiting {
        if let Ok(circuit) = circuit_at_progress(&state, &ceremony_id, participant.contribution_progress + 1).await {
            state.scheduler.admit(&ceremony_id, &circuit.id, &participant_id).await.map_err(core)?;
        }
    }

    Ok(Json(participant))
}

async fn progress_to_next_contribution_step(
    State(state): State<AppState>,
    Path(ceremony_id): Path<String>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<ProgressToNextContributionStepRequest>,
) -> Result<Json<Participant>, ResponseError> {
    let participant_id = caller(&principal)?;
    let target = body.step;
    let participant = state
        .meta_store
        .mutate_participant(
            &CeremonyId::from(ceremony_id),
            &participant_id,
            Box::new(move |p| {
                ceremony_statemachine::advance_contribution_step(p, target)?;
                Ok(())
            }),
        )
        .await
        .map_err(ResponseError::from)?;
    Ok(Json(participant))
}

async fn permanently_store_contribution_time_and_hash(
    State(state): State<AppState>,
    Path(ceremony_id): Path<String>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<PermanentlyStoreContributionTimeAndHashRequest>,
) -> Result<Json<Participant>, ResponseError> {
    let participant_id = caller(&principal)?;
    let participant = state
        .meta_store
        .mutate_participant(
            &CeremonyId::from(ceremony_id),
            &participant_id,
            Box::new(move |p| {
                p.temp_contribution_data.contribution_computation_time_secs =
                    Some(body.contribution_computation_time_secs);
                p.temp_contribution_data.last_zkey_hash = Some(body.last_zkey_hash);
                Ok(())
            }),
        )
        .await
        .map_err(ResponseError::from)?;
    Ok(Json(participant))
}

async fn resume_contribution_after_timeout_expiration(
    State(state): State<AppState>,
    Path(ceremony_id): Path<String>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<serde_json::Value>, ResponseError> {
    let participant_id = caller(&principal)?;
    state
        .scheduler
        .resume_after_timeout(&CeremonyId::from(ceremony_id), &participant_id)
        .await
        .map_err(core)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn open_multi_part_upload(
    State(state): State<AppState>,
    Path(ceremony_id): Path<String>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<OpenMultiPartUploadRequest>,
) -> Result<Json<OpenMultiPartUploadResponse>, ResponseError> {
    let participant_id = caller(&principal)?;
    let upload_id = state
        .upload
        .open_upload(&CeremonyId::from(ceremony_id), &participant_id, &body.bucket, &body.object_key)
        .await
        .map_err(core)?;
    Ok(Json(OpenMultiPartUploadResponse { upload_id }))
}

async fn temporary_store_upload_id(
    State(state): State<AppState>,
    Path(ceremony_id): Path<String>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<StoreUploadIdRequest>,
) -> Result<Json<serde_json::Value>, ResponseError> {
    let participant_id = caller(&principal)?;
    state
        .upload
        .store_upload_id(&CeremonyId::from(ceremony_id), &participant_id, &body.bucket, &body.object_key, &body.upload_id)
        .await
        .map_err(core)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn generate_pre_signed_urls_parts(
    State(state): State<AppState>,
    Path(ceremony_id): Path<String>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<GeneratePreSignedUrlsPartsRequest>,
) -> Result<Json<GeneratePreSignedUrlsPartsResponse>, ResponseError> {
    let participant_id = caller(&principal)?;
    let urls = state
        .upload
        .sign_parts(
            &CeremonyId::from(ceremony_id),
            &participant_id,
            &body.bucket,
            &body.object_key,
            &body.upload_id,
            body.number_of_parts,
        )
        .await
        .map_err(core)?;
    Ok(Json(GeneratePreSignedUrlsPartsResponse { urls }))
}

async fn temporary_store_uploaded_chunk_data(
    State(state): State<AppState>,
    Path(ceremony_id): Path<String>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<StoreUploadedChunkRequest>,
) -> Result<Json<serde_json::Value>, ResponseError> {
    let participant_id = caller(&principal)?;
    let bucket = body.bucket.clone();
    let object_key = body.object_key.clone();
    state
        .upload
        .store_chunk(&CeremonyId::from(ceremony_id), &participant_id, &bucket, &object_key, body.into())
        .await
        .map_err(core)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn complete_multi_part_upload(
    State(state): State<AppState>,
    Path(ceremony_id): Path<String>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<CompleteMultiPartUploadRequest>,
) -> Result<Json<CompleteMultiPartUploadResponse>, ResponseError> {
    let participant_id = caller(&principal)?;
    let parts = body.parts.into_iter().map(Into::into).collect();
    let location = state
        .upload
        .complete_upload(&CeremonyId::from(ceremony_id), &participant_id, &body.bucket, &body.object_key, &body.upload_id, parts)
        .await
        .map_err(core)?;
    Ok(Json(CompleteMultiPartUploadResponse { location }))
}

async fn verify_contribution(
    State(state): State<AppState>,
    Path((ceremony_id, circuit_id)): Path<(String, String)>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Contribution>, ResponseError> {
    let participant_id = caller(&principal)?;
    let contribution = state
        .verifier
        .verify_current_contribution(&CeremonyId::from(ceremony_id), &CircuitId::from(circuit_id), &participant_id)
        .await
        .map_err(core)?;
    Ok(Json(contribution))
}

async fn generate_get_object_pre_signed_url(
    State(state): State<AppState>,
    Json(body): Json<GenerateGetObjectPreSignedUrlRequest>,
) -> Result<Json<GenerateGetObjectPreSignedUrlResponse>, ResponseError> {
    let url = state
        .blob_store
        .signed_get_url(&body.bucket, &body.object_key, state.config.presigned_url_expiration_secs)
        .await
        .map_err(ResponseError::from)?;
    Ok(Json(GenerateGetObjectPreSignedUrlResponse { url }))
}

async fn check_if_object_exist(
    State(state): State<AppState>,
    Json(body): Json<CheckIfObjectExistRequest>,
) -> Result<Json<CheckIfObjectExistResponse>, ResponseError> {
    let exists = state.blob_store.object_exists(&body.bucket, &body.object_key).await.map_err(ResponseError::from)?;
    Ok(Json(CheckIfObjectExistResponse { exists }))
}
