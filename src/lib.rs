// Library root
// -----------
// The `vespa` binary is a thin wrapper around this crate.
//
// Module responsibilities:
// - `document_id`: parsing document ids and mapping them to /document/v1 paths.
// - `operation`: deciding put/update/remove, id and body from arguments and
//   a JSON file.
// - `dispatch`: sending document operations and gets, classifying responses.
// - `status`: readiness checks of the query, document and deploy services.
// - `progress`: the spinner wrapped around blocking network calls.
// - `api`: the HTTP exchange seam and its reqwest implementation.
// - `config`: the persisted settings file and target resolution.
// - `output`: the per-invocation output context.
// - `cli`: clap definitions and command handlers.
pub mod api;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod document_id;
pub mod operation;
pub mod output;
pub mod progress;
pub mod status;
