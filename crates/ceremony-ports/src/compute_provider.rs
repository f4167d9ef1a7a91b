//! `ComputeProvider`: VM provisioning and remote-command execution for the
//! `VM` verification mechanism (component D).

use crate::error::CoreError;
use async_trait::async_trait;

/// Sizing request for a verification VM, computed as
/// `ceil(2 * zkey_size_gb + pot_file_size_gb) + 8` GB of disk.
#[derive(Debug, Clone, Copy)]
pub struct VmSpec {
    pub disk_gb: u64,
}

/// Status of a command dispatched to a VM via `runCommand`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Running,
    Succeeded,
    Failed,
}

#[async_trait]
pub trait ComputeProvider: Send + Sync {
    /// Provisions a new VM sized per `spec`, returning its instance id
    ///.
    async fn provision(&self, spec: VmSpec) -> Result<String, CoreError>;

    async fn start(&self, instance_id: &str) -> Result<(), CoreError>;
    async fn stop(&self, instance_id: &str) -> Result<(), CoreError>;

    /// Terminates the VM.
    async fn terminate(&self, instance_id: &str) -> Result<(), CoreError>;

    /// Dispatches `command` on the VM, returning a command handle the
    /// caller polls with [`Self::command_status`].
    async fn run_command(&self, instance_id: &str, command: &str) -> Result<String, CoreError>;

    async fn command_status(
        &self,
        instance_id: &str,
        command_id: &str,
    ) -> Result<CommandStatus, CoreError>;

    /// The command's standard output once it has succeeded; for the
    /// verify script this is the last zkey's hash.
    async fn command_output(
        &self,
        instance_id: &str,
        command_id: &str,
    ) -> Result<String, CoreError>;
}
