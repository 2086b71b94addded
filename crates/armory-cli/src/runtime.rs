// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use armory_app::{Listing, PageTarget, PendingRequest, ResponseOutcome};
use armory_client::Client;
use armory_tui::InternalEvent;
use log::{debug, info};
use std::sync::mpsc::Sender;
use std::thread;

pub struct HttpRuntime {
    client: Client,
}

impl HttpRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl armory_tui::AppRuntime for HttpRuntime {
    fn load_rows(&mut self, target: &PageTarget) -> Result<Listing> {
        let listing = self.client.fetch_rows(target)?;
        match &listing {
            Listing::Rows(rows) => debug!("loaded {} rows for {}", rows.len(), target.title()),
            Listing::Redirect(path) => info!("{} redirected to {path}", target.title()),
        }
        Ok(listing)
    }

    fn submit(&mut self, request: &PendingRequest) -> ResponseOutcome {
        self.client.submit(request)
    }

    /// Runs the request on its own thread so the UI keeps drawing while the
    /// server answers.
    fn spawn_submission(
        &mut self,
        request_id: u64,
        request: &PendingRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        let request = request.clone();
        thread::Builder::new()
            .name(format!("submit-{request_id}"))
            .spawn(move || {
                let outcome = client.submit(&request);
                if tx
                    .send(InternalEvent::SubmissionFinished {
                        request_id,
                        outcome,
                    })
                    .is_err()
                {
                    debug!("ui gone before request {request_id} finished");
                }
            })
            .context("spawn submission thread")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::HttpRuntime;
    use anyhow::Result;
    use armory_app::{ActionKind, Listing, PageKind, PageTarget, PendingRequest, ResponseOutcome};
    use armory_client::Client;
    use armory_testkit::{ArmoryFaker, MockBackend, ScriptedResponse};
    use armory_tui::{AppRuntime, InternalEvent};
    use serde_json::json;
    use std::sync::mpsc;
    use std::time::Duration;

    fn runtime_for(backend: &MockBackend) -> Result<HttpRuntime> {
        let client = Client::new(backend.base_url(), Duration::from_secs(2), "data")?;
        Ok(HttpRuntime::new(client))
    }

    #[test]
    fn load_rows_reads_listing() -> Result<()> {
        let backend = MockBackend::start()?;
        backend.route(
            "/collections-data/kits",
            ScriptedResponse::json(200, ArmoryFaker::new(2).listing(PageKind::Kits, 3)),
        );

        let mut runtime = runtime_for(&backend)?;
        let Listing::Rows(rows) = runtime.load_rows(&PageTarget::new(PageKind::Kits))? else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 3);
        Ok(())
    }

    #[test]
    fn spawned_submission_reports_outcome() -> Result<()> {
        let backend = MockBackend::start()?;
        backend.route(
            "/master/delete_item_from_inventory",
            ScriptedResponse::json(400, json!({"detail": "item is signed"})),
        );

        let mut runtime = runtime_for(&backend)?;
        let request = PendingRequest::new(
            ActionKind::DeleteItem,
            json!({"item_id": "item-1"}),
            "radio",
        );
        let (tx, rx) = mpsc::channel();
        runtime.spawn_submission(7, &request, tx)?;

        let event = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("submission should finish");
        assert_eq!(
            event,
            InternalEvent::SubmissionFinished {
                request_id: 7,
                outcome: ResponseOutcome::FieldError("item is signed".to_owned()),
            }
        );
        Ok(())
    }
}
