use super::test_helpers::*;
use super::*;
use crate::error::ExportError;
use crate::types::{
    Event, ExportFormat, ExportKind, ExportRequest, RunStatus, TerminalStatus, filter_keys,
};


fn voters_request() -> ExportRequest {
    ExportRequest::new(ExportKind::Voters, ExportFormat::Spreadsheet)
        .with_filter(filter_keys::CODIGO_ESTADO, "05")
}

/// Drain events already sent to `rx`
fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
