// worker-listener: the worker runtime shell and the job handlers.
//
// The shell (`worker`) owns the subscribe-then-receive loop against the
// orchestrator gateway. The handlers turn one job into one result: the
// credit-score lookup composes fetch -> validate -> fallback and never
// fails outward; the message forwarder republishes correlation messages
// and surfaces publish failures for orchestrator-level redelivery.

pub mod command_settings;
pub mod credit_score;
pub mod fetch;
pub mod forwarder;
pub mod validate;
pub mod worker;
