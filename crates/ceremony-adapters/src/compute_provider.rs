//! In-memory `ComputeProvider`: VM lifecycle and
//! run-command-on-VM, standing in for the real provisioning backend behind
//! the `VM` verification mechanism.

use async_trait::async_trait;
use ceremony_ports::{CommandStatus, ComputeProvider, CoreError, VmSpec};
use dashmap::DashMap;

#[derive(Debug, Clone)]
struct Instance {
    running: bool,
    disk_gb: u64,
}

#[derive(Debug, Clone)]
struct Command {
    status: CommandStatus,
    output: String,
}

/// Every dispatched command completes immediately with a canned
/// "succeeded" status, its output the blake2b-512 hash of the command
/// string (scenario tests that need the VM path to observe a real last-zkey
/// hash override this by constructing the store with a pre-seeded output).
#[derive(Default)]
pub struct InMemoryComputeProvider {
    instances: DashMap<String, Instance>,
    commands: DashMap<String, Command>,
}

impl InMemoryComputeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: forces the output a future `run_command` call on
    /// `instance_id` will report, so VM-backend verification tests can
    /// drive a specific last-zkey hash.
    pub fn seed_command_output(&self, instance_id: &str, command: &str, output: String) {
        let command_id = Self::command_id(instance_id, command);
        self.commands.insert(
            command_id,
            Command {
                status: CommandStatus::Succeeded,
                output,
            },
        );
    }

    fn command_id(instance_id: &str, command: &str) -> String {
        format!("{instance_id}:{}", ceremony_crypto::blake2b512_hex(command.as_bytes()))
    }
}

#[async_trait]
impl ComputeProvider for InMemoryComputeProvider {
    async fn provision(&self, spec: VmSpec) -> Result<String, CoreError> {
        let instance_id = format!("vm-{}", uuid::Uuid::new_v4());
        self.instances.insert(
            instance_id.clone(),
            Instance {
                running: false,
                disk_gb: spec.disk_gb,
            },
        );
        Ok(instance_id)
    }

    async fn start(&self, instance_id: &str) -> Result<(), CoreError> {
        let mut instance = self
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| CoreError::NotFound(format!("vm instance {instance_id}")))?;
        instance.running = true;
        Ok(())
    }

    async fn stop(&self, instance_id: &str) -> Result<(), CoreError> {
        let mut instance = self
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| CoreError::NotFound(format!("vm instance {instance_id}")))?;
        instance.running = false;
        Ok(())
    }

    async fn terminate(&self, instance_id: &str) -> Result<(), CoreError> {
        self.instances
            .remove(instance_id)
            .ok_or_else(|| CoreError::NotFound(format!("vm instance {instance_id}")))?;
        Ok(())
    }

    async fn run_command(&self, instance_id: &str, command: &str) -> Result<String, CoreError> {
        if !self.instances.contains_key(instance_id) {
            return Err(CoreError::NotFound(format!("vm instance {instance_id}")));
        }
        let command_id = Self::command_id(instance_id, command);
        self.commands.entry(command_id.clone()).or_insert_with(|| Command {
            status: CommandStatus::Succeeded,
            output: ceremony_crypto::blake2b512_hex(command.as_bytes()),
        });
        Ok(command_id)
    }

    async fn command_status(
        &self,
        _instance_id: &str,
        command_id: &str,
    ) -> Result<CommandStatus, CoreError> {
        self.commands
            .get(command_id)
            .map(|c| c.status)
            .ok_or_else(|| CoreError::NotFound(format!("command {command_id}")))
    }

    async fn command_output(
        &self,
        _instance_id: &str,
        command_id: &str,
    ) -> Result<String, CoreError> {
        self.commands
            .get(command_id)
            .map(|c| c.output.clone())
            .ok_or_else(|| CoreError::NotFound(format!("command {command_id}")))
    }
}
