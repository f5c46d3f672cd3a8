//! Dry-run simulation
//!
//! A dry run validates as much as possible without side effects. Commands
//! whose provider operation supports the simulate marker are actually sent
//! with it set; the provider then rejects the call with a code telling us
//! whether the real call would have gone through. Everything else is
//! validated locally and succeeds with a placeholder identifier, so later
//! steps referencing the result still resolve.

use tracing::info;
use uuid::Uuid;

use crate::command::CommandDescriptor;
use crate::error::EngineError;
use crate::lifecycle::RunEnv;
use crate::params::ParamDict;
use crate::provider::ProviderError;

/// The provider accepted the simulated call outright.
pub const SIMULATION_ACCEPTED_CODE: &str = "DryRunOperation";

/// Codes with this suffix mean a referenced resource does not exist yet.
/// During a dry run of a multi-step template that is expected: the resource
/// is created by an earlier step that was itself only simulated.
pub const NOT_FOUND_CODE_SUFFIX: &str = "NotFound";

/// Some providers propagate instance profiles asynchronously, so a simulated
/// call right after a profile creation can fail on the name lookup even
/// though the real, ordered run would succeed. Matched verbatim.
pub const PROFILE_RACE_MESSAGE: &str = "Invalid IAM Instance Profile name";

/// Classify a rejection of a simulated call: would the real call have
/// succeeded?
pub fn would_have_succeeded(err: &ProviderError) -> bool {
    err.code == SIMULATION_ACCEPTED_CODE
        || err.code.ends_with(NOT_FOUND_CODE_SUFFIX)
        || err.message.contains(PROFILE_RACE_MESSAGE)
}

/// Placeholder identifier standing in for the result of a simulated step.
/// Deterministic per entity kind, so repeated dry runs render identically.
pub fn placeholder_id(entity: &str) -> String {
    let prefix = match entity {
        "instance" => "i",
        "volume" => "vol",
        "subnet" => "subnet",
        "securitygroup" => "sg",
        "internetgateway" => "igw",
        "natgateway" => "nat",
        "routetable" => "rtb",
        "vpc" => "vpc",
        _ => "dryrunid",
    };
    let uid = Uuid::new_v5(&Uuid::NAMESPACE_OID, entity.as_bytes());
    format!("{}-{}", prefix, &uid.simple().to_string()[..8])
}

impl CommandDescriptor {
    /// Simulate the command: full injection and validation, a marked
    /// provider call when the operation supports it, and a placeholder
    /// identifier on success.
    pub(crate) fn dry_run(
        &self,
        env: &mut RunEnv<'_>,
        params: &ParamDict,
    ) -> Result<Option<String>, EngineError> {
        let instance = self.prepare(params)?;

        if !self.simulable || self.custom_exec.is_some() {
            // Nothing safe to send; local checks passed.
            info!("dry run: {} {} ok", self.action(), self.entity());
            return Ok(Some(placeholder_id(self.entity())));
        }

        match self.execute(&instance, env, true) {
            Ok(_) => {}
            Err(EngineError::Execution { source, .. })
                if source
                    .downcast_ref::<ProviderError>()
                    .is_some_and(would_have_succeeded) => {}
            Err(other) => return Err(other),
        }

        info!("dry run: {} {} ok", self.action(), self.entity());
        Ok(Some(placeholder_id(self.entity())))
    }
}
