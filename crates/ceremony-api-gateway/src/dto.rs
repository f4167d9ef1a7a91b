//! Request/response bodies for the RPC surface. Kept separate
//! from the domain types in `shared-types` so the wire shape (hex-encoded
//! artifact bytes, bare path segments) can evolve independently of the
//! persisted shape.

use ceremony_setup::{CeremonySetupInput, CircuitSetupInput};
use ceremony_ports::CoreError;
use serde::{Deserialize, Serialize};
use shared_types::{CircuitMetadata, ContributionStep, TimeoutMechanism, UploadedChunk, VerificationMechanism};

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, CoreError> {
    hex::decode(value).map_err(|e| CoreError::InvalidInput(format!("{field} is not valid hex: {e}")))
}

#[derive(Debug, Deserialize)]
pub struct CircuitSetupRequest {
    pub sequence_position: u32,
    pub prefix: String,
    #[serde(default)]
    pub metadata: CircuitMetadata,
    pub zkey_size_bytes: u64,
    pub fixed_time_window_secs: Option<u64>,
    pub mechanism: VerificationMechanism,
    pub genesis_zkey_hex: String,
    pub pot_hex: String,
    pub wasm_hex: String,
    pub r1cs_hex: String,
}

impl CircuitSetupRequest {
    pub fn into_input(self) -> Result<CircuitSetupInput, CoreError> {
        Ok(CircuitSetupInput {
            sequence_position: self.sequence_position,
            prefix: self.prefix,
            metadata: self.metadata,
            zkey_size_bytes: self.zkey_size_bytes,
            fixed_time_window_secs: self.fixed_time_window_secs,
            mechanism: self.mechanism,
            genesis_zkey: decode_hex("genesisZkeyHex", &self.genesis_zkey_hex)?,
            pot: decode_hex("potHex", &self.pot_hex)?,
            wasm: decode_hex("wasmHex", &self.wasm_hex)?,
            r1cs: decode_hex("r1csHex", &self.r1cs_hex)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SetupCeremonyRequest {
    pub prefix: String,
    pub title: String,
    pub description: String,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: chrono::DateTime<chrono::Utc>,
    pub coordinator_id: String,
    pub timeout_mechanism: TimeoutMechanism,
    pub penalty_secs: u64,
    pub penalty_multiplier: f64,
    pub circuits: Vec<CircuitSetupRequest>,
}

impl SetupCeremonyRequest {
    pub fn into_input(self) -> Result<CeremonySetupInput, CoreError> {
        let circuits = self
            .circuits
            .into_iter()
            .map(CircuitSetupRequest::into_input)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CeremonySetupInput {
            prefix: self.prefix,
            title: self.title,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            coordinator_id: self.coordinator_id,
            timeout_mechanism: self.timeout_mechanism,
            penalty_secs: self.penalty_secs,
            penalty_multiplier: self.penalty_multiplier,
            circuits,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBucketRequest {
    pub bucket: String,
}

#[derive(Debug, Serialize)]
pub struct CreateBucketResponse {
    pub bucket: String,
}

#[derive(Debug, Deserialize)]
pub struct ProgressToNextContributionStepRequest {
    pub step: ContributionStep,
}

#[derive(Debug, Deserialize)]
pub struct PermanentlyStoreContributionTimeAndHashRequest {
    pub contribution_computation_time_secs: f64,
    pub last_zkey_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenMultiPartUploadRequest {
    pub bucket: String,
    pub object_key: String,
}

#[derive(Debug, Serialize)]
pub struct OpenMultiPartUploadResponse {
    pub upload_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StoreUploadIdRequest {
    pub bucket: String,
    pub object_key: String,
    pub upload_id: String,
}

#[derive(Debug, Deserialize)]
pub struct GeneratePreSignedUrlsPartsRequest {
    pub bucket: String,
    pub object_key: String,
    pub upload_id: String,
    pub number_of_parts: u32,
}

#[derive(Debug, Serialize)]
pub struct GeneratePreSignedUrlsPartsResponse {
    pub urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct StoreUploadedChunkRequest {
    pub bucket: String,
    pub object_key: String,
    pub part_number: u32,
    pub e_tag: String,
}

impl From<StoreUploadedChunkRequest> for UploadedChunk {
    fn from(req: StoreUploadedChunkRequest) -> Self {
        UploadedChunk {
            part_number: req.part_number,
            e_tag: req.e_tag,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompleteMultiPartUploadRequest {
    pub bucket: String,
    pub object_key: String,
    pub upload_id: String,
    pub parts: Vec<StoreUploadedChunkRequest>,
}

#[derive(Debug, Serialize)]
pub struct CompleteMultiPartUploadResponse {
    pub location: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateGetObjectPreSignedUrlRequest {
    pub bucket: String,
    pub object_key: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateGetObjectPreSignedUrlResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckIfObjectExistRequest {
    pub bucket: String,
    pub object_key: String,
}

#[derive(Debug, Serialize)]
pub struct CheckIfObjectExistResponse {
    pub exists: bool,
}
