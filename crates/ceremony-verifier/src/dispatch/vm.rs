//! VM mechanism: verification is dispatched to a provisioned compute
//! instance and polled to completion. The instance already
//! has the circuit's genesis/pot/last zkey staged; `vm_verify_command` is
//! the script invocation, success emits the last zkey hash on stdout.

use std::time::Duration;
use std::sync::Arc;

use async_trait::async_trait;
use ceremony_ports::{CommandStatus, ComputeProvider};

use super::backend::{VerificationBackend, VerifyRequest, VerifyResult};
use crate::errors::VerifierError;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 720; // 1 hour at the default interval

pub struct VmBackend {
    compute: Arc<dyn ComputeProvider>,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl VmBackend {
    pub fn new(compute: Arc<dyn ComputeProvider>) -> Self {
        Self {
            compute,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }

    pub fn with_poll_schedule(
        compute: Arc<dyn ComputeProvider>,
        poll_interval: Duration,
        max_poll_attempts: u32,
    ) -> Self {
        Self {
            compute,
            poll_interval,
            max_poll_attempts,
        }
    }
}

#[async_trait]
impl VerificationBackend for VmBackend {
    async fn verify(&self, request: VerifyRequest) -> Result<VerifyResult, VerifierError> {
        let instance_id = request.vm_instance_id.ok_or_else(|| {
            VerifierError::Store(ceremony_ports::CoreError::InvalidInput(
                "vm verification requires a provisioned instance id".into(),
            ))
        })?;

        let command_id = self
            .compute
            .run_command(&instance_id, &request.vm_verify_command)
            .await
            .map_err(VerifierError::Store)?;

        let mut attempts = 0u32;
        loop {
            let status = self
                .compute
                .command_status(&instance_id, &command_id)
                .await
                .map_err(VerifierError::Store)?;

            match status {
                CommandStatus::Succeeded => break,
                CommandStatus::Failed => {
                    return Ok(VerifyResult {
                        valid: false,
                        transcript: format!(
                            "vm verification command {command_id} on instance {instance_id} failed"
                        )
                        .into_bytes(),
                    });
                }
                CommandStatus::Running => {
                    attempts += 1;
                    if attempts > self.max_poll_attempts {
                        return Err(VerifierError::DeadlineExceeded {
                            elapsed_secs: self.poll_interval.as_secs() * attempts as u64,
                        });
                    }
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        let output = self
            .compute
            .command_output(&instance_id, &command_id)
            .await
            .map_err(VerifierError::Store)?;

        Ok(VerifyResult {
            valid: true,
            transcript: format!(
                "vm verification succeeded\ninstance={instance_id}\ncommand={command_id}\nlast_zkey_hash={output}\n"
            )
            .into_bytes(),
        })
    }
}
