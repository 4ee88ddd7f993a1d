//! Backend commands queued from UI to backend worker.

use client_core::RequestTicket;
use shared::protocol::{GenerateRequest, WikiSearchRequest};

#[derive(Debug)]
pub enum BackendCommand {
    Search {
        ticket: RequestTicket,
        request: WikiSearchRequest,
    },
    Generate {
        ticket: RequestTicket,
        request: GenerateRequest,
    },
    CancelSearch,
    CancelGeneration,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Search { .. } => "search",
            BackendCommand::Generate { .. } => "generate",
            BackendCommand::CancelSearch => "cancel_search",
            BackendCommand::CancelGeneration => "cancel_generation",
        }
    }
}
