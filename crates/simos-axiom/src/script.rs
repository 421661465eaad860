//! Scripted driver
//!
//! A [`Script`] is a configuration plus a list of events, usually read from
//! JSON. Running it pushes every event through an [`AxiomGateway`] and
//! reports the result and the observable state after each one.

use serde::{Deserialize, Serialize};
use simos_core::{ConfigError, Event, EventOutcome, KernelConfig, KernelError, Snapshot};

use crate::gateway::AxiomGateway;

/// Kernel configuration and the events to apply to it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub config: KernelConfig,
    #[serde(default)]
    pub events: Vec<Event>,
}

/// One applied event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub event: Event,
    pub result: Result<EventOutcome, KernelError>,
    /// Kernel state after the event
    pub snapshot: Snapshot,
}

/// Every step of a script run, in order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptReport {
    pub steps: Vec<ScriptStep>,
}

impl ScriptReport {
    /// State after the last event, if any ran
    pub fn final_snapshot(&self) -> Option<&Snapshot> {
        self.steps.last().map(|s| &s.snapshot)
    }

    /// Number of events the kernel rejected
    pub fn rejected(&self) -> usize {
        self.steps.iter().filter(|s| s.result.is_err()).count()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("malformed script: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Run `script` on a fresh kernel.
///
/// Rejected events do not stop the run; they show up as `Err` results.
pub fn run_script(script: &Script) -> Result<ScriptReport, ScriptError> {
    let mut gateway = AxiomGateway::new(script.config)?;

    let steps = script
        .events
        .iter()
        .map(|event| {
            let result = gateway.dispatch(event.clone()).result;
            ScriptStep {
                event: event.clone(),
                result,
                snapshot: gateway.kernel().snapshot(),
            }
        })
        .collect();

    let report = ScriptReport { steps };
    log::info!(
        "script finished: {} event(s), {} rejected",
        report.steps.len(),
        report.rejected()
    );
    Ok(report)
}

/// Parse a JSON script, run it and return the report as JSON.
pub fn run_script_json(json: &str) -> Result<String, ScriptError> {
    let script: Script = serde_json::from_str(json)?;
    let report = run_script(&script)?;
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use simos_core::{ProcessId, NO_PROCESS};

    #[test]
    fn test_run_script_records_every_step() {
        let script = Script {
            config: KernelConfig::new(1, 512, 256),
            events: vec![
                Event::SimFork,
                Event::NewProcess,
                Event::AccessMemoryAddress { address: 0 },
                Event::DiskReadRequest {
                    disk: 0,
                    file_name: "boot.cfg".into(),
                },
            ],
        };

        let report = run_script(&script).unwrap();
        assert_eq!(report.steps.len(), 4);
        assert_eq!(report.rejected(), 1);
        assert_eq!(report.steps[0].result, Err(KernelError::Idle));
        assert_eq!(
            report.steps[1].result,
            Ok(EventOutcome::Created { pid: ProcessId(1) })
        );
        assert_eq!(report.steps[2].snapshot.memory.len(), 1);

        let last = report.final_snapshot().unwrap();
        assert_eq!(last.cpu, NO_PROCESS);
        assert_eq!(last.disks[0].serving.file_name, "boot.cfg");
    }

    #[test]
    fn test_run_script_bad_config() {
        let script = Script {
            config: KernelConfig::new(1, 128, 256),
            events: Vec::new(),
        };
        assert!(matches!(
            run_script(&script),
            Err(ScriptError::Config(ConfigError::InsufficientRam { .. }))
        ));
    }

    #[test]
    fn test_run_script_json_rejects_garbage() {
        let err = run_script_json("{\"config\": 3}").unwrap_err();
        assert!(matches!(err, ScriptError::Json(_)));
        assert!(err.to_string().starts_with("malformed script"));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_json_script_with_terabyte_ram() {
        let json = r#"{
            "config": { "number_of_disks": 1, "amount_of_ram": 1099511627776, "page_size": 1 },
            "events": [{ "op": "new_process" }, { "op": "access_memory_address", "address": 5 }]
        }"#;
        let report: ScriptReport = serde_json::from_str(&run_script_json(json).unwrap()).unwrap();
        assert_eq!(report.rejected(), 0);
        assert_eq!(report.final_snapshot().unwrap().memory.len(), 1);
    }

    #[test]
    fn test_empty_script() {
        let report = run_script(&Script {
            config: KernelConfig::new(1, 256, 256),
            events: Vec::new(),
        })
        .unwrap();
        assert!(report.final_snapshot().is_none());
    }
}
