// Dashboard runtime - Single-task event loop over inbound messages and fetches
use crate::application::query_coordinator::{FilterTicket, QueryCoordinator};
use crate::application::session::DashboardSession;
use crate::application::stream_ingestor::StreamIngestor;
use crate::domain::error::DashboardError;
use crate::domain::events::{control_text, ControlCommand, InboundMessage};
use crate::domain::telemetry::{DateRange, PreloadBatch, SensorReading, SummaryStats};
use chrono::Utc;
use tokio::sync::mpsc;

/// Fetch results reported back to the loop by spawned tasks.
enum Completion {
    Preload(Result<PreloadBatch, DashboardError>),
    Filter(FilterTicket, Result<Vec<SensorReading>, DashboardError>),
    Stats(Result<SummaryStats, DashboardError>),
}

/// Owns the session and is its only mutator. Fetches run concurrently in
/// spawned tasks, but their results are applied here, one handler at a time.
pub struct DashboardRuntime {
    session: DashboardSession,
    ingestor: StreamIngestor,
    coordinator: QueryCoordinator,
    preload_limit: usize,
    pending: usize,
    completions_tx: mpsc::Sender<Completion>,
    completions_rx: mpsc::Receiver<Completion>,
}

impl DashboardRuntime {
    pub fn new(
        session: DashboardSession,
        ingestor: StreamIngestor,
        coordinator: QueryCoordinator,
        preload_limit: usize,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::channel(32);
        Self {
            session,
            ingestor,
            coordinator,
            preload_limit,
            pending: 0,
            completions_tx,
            completions_rx,
        }
    }

    /// Preload, then process messages until `inbound` closes and every
    /// outstanding fetch has been applied. Returns the final session.
    pub async fn run(mut self, mut inbound: mpsc::Receiver<InboundMessage>) -> DashboardSession {
        self.spawn_preload();
        self.spawn_stats(None);

        let mut inbound_open = true;
        while inbound_open || self.pending > 0 {
            tokio::select! {
                message = inbound.recv(), if inbound_open => match message {
                    Some(message) => self.handle_message(message),
                    None => {
                        tracing::info!("Inbound channel closed");
                        inbound_open = false;
                    }
                },
                Some(completion) = self.completions_rx.recv(), if self.pending > 0 => {
                    self.pending -= 1;
                    self.handle_completion(completion);
                }
            }
        }

        self.session
    }

    fn handle_message(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::Reading(event) => {
                if let Err(e) = self.ingestor.on_reading(&mut self.session, event, Utc::now()) {
                    tracing::warn!("Dropping reading: {}", e);
                }
            }
            InboundMessage::Connectivity(event) => {
                self.ingestor.on_connectivity(&self.session, &event);
            }
            InboundMessage::Interaction(event) => {
                self.session.signal_user_interaction(&event);
            }
            InboundMessage::Control(command) => self.handle_control(command),
        }
    }

    fn handle_control(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::GoLive { window } => {
                let raw = window.as_ref().map(control_text);
                self.session.go_live(raw.as_deref());
            }
            ControlCommand::SetWindow { value } => {
                self.session.set_window_size(&control_text(&value));
            }
            ControlCommand::ApplyFilter {
                start,
                end,
                sensor_id,
            } => match DateRange::parse(&start, &end) {
                Ok(range) => {
                    let ticket = self.coordinator.begin_filter(&mut self.session, range, sensor_id);
                    self.spawn_filter(ticket);
                    self.spawn_stats(Some(range));
                }
                Err(e) => {
                    tracing::warn!("Rejecting filter: {}", e);
                    self.session.status().report_error(&e.to_string());
                }
            },
            ControlCommand::ToggleVisibility { sensor_id } => {
                self.session.toggle_visibility(&sensor_id);
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Preload(outcome) => {
                // Failure is already reported to the operator.
                let _ = self.coordinator.complete_preload(&mut self.session, outcome);
            }
            Completion::Filter(ticket, outcome) => {
                let result = self
                    .coordinator
                    .complete_filter(&mut self.session, &ticket, outcome);
                tracing::debug!("Filter completed: {:?}", result);
            }
            Completion::Stats(outcome) => {
                self.coordinator.complete_stats(&self.session, outcome);
            }
        }
    }

    fn spawn_preload(&mut self) {
        let coordinator = self.coordinator.clone();
        let limit = self.preload_limit;
        self.spawn(async move { Completion::Preload(coordinator.fetch_preload(limit).await) });
    }

    fn spawn_filter(&mut self, ticket: FilterTicket) {
        let coordinator = self.coordinator.clone();
        self.spawn(async move {
            let outcome = coordinator.fetch_filter(&ticket).await;
            Completion::Filter(ticket, outcome)
        });
    }

    fn spawn_stats(&mut self, range: Option<DateRange>) {
        let coordinator = self.coordinator.clone();
        self.spawn(async move { Completion::Stats(coordinator.fetch_stats(range).await) });
    }

    fn spawn<F>(&mut self, fetch: F)
    where
        F: std::future::Future<Output = Completion> + Send + 'static,
    {
        self.pending += 1;
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(fetch.await).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{
        harness, reading, Harness, RecordingStatus, RecordingSurface, StatusCall, StubFetch,
        SurfaceCall,
    };
    use crate::domain::events::{InteractionEvent, ReadingEvent};
    use crate::domain::mode::ViewMode;
    use crate::domain::telemetry::{Deployment, SummaryStats};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    struct Recorders {
        surface: Arc<RecordingSurface>,
        status: Arc<RecordingStatus>,
    }

    fn runtime(fetch: StubFetch, deployment: Deployment, window: usize) -> (DashboardRuntime, Recorders) {
        let Harness {
            session,
            surface,
            status,
        } = harness(deployment, window);
        let coordinator = QueryCoordinator::new(Arc::new(fetch), deployment, "main", 2000);
        let ingestor = StreamIngestor::new(deployment, "main");
        let runtime = DashboardRuntime::new(session, ingestor, coordinator, 300);
        (runtime, Recorders { surface, status })
    }

    fn live(value: f64) -> InboundMessage {
        InboundMessage::Reading(ReadingEvent {
            value: Some(value),
            ..ReadingEvent::default()
        })
    }

    #[tokio::test]
    async fn test_run_preloads_and_ingests() {
        let fetch = StubFetch {
            preload: Some(vec![reading(None, 0, 10.0), reading(None, 1, 12.0)]),
            stats: Some(SummaryStats {
                period_avg: Some(11.0),
                ..SummaryStats::default()
            }),
            ..StubFetch::default()
        };
        let (runtime, h) = runtime(fetch, Deployment::Single, 20);
        let (tx, rx) = mpsc::channel(8);
        drop(tx);

        let session = runtime.run(rx).await;
        assert_eq!(session.registry().get("main").unwrap().buffer.len(), 2);
        assert_eq!(h.surface.shown("main"), vec![10.0, 12.0]);
        assert!(h
            .surface
            .calls()
            .iter()
            .any(|c| matches!(c, SurfaceCall::Summary(s) if s.period_avg == Some(11.0))));
    }

    #[tokio::test]
    async fn test_run_keeps_live_readings_without_preload() {
        let (runtime, h) = runtime(StubFetch::default(), Deployment::Single, 2);
        let (tx, rx) = mpsc::channel(8);
        for v in [1.0, 2.0, 3.0] {
            tx.send(live(v)).await.unwrap();
        }
        drop(tx);

        let session = runtime.run(rx).await;
        assert_eq!(session.registry().get("main").unwrap().buffer.len(), 3);
        assert_eq!(h.surface.shown("main"), vec![2.0, 3.0]);
        assert!(h.status.errors()[0].starts_with("Failed to initialize"));
    }

    #[tokio::test]
    async fn test_run_handles_controls() {
        let fetch = StubFetch {
            preload: Some(Vec::new()),
            ..StubFetch::default()
        };
        let (runtime, h) = runtime(fetch, Deployment::Single, 20);
        let (tx, rx) = mpsc::channel(16);
        let decode = |value| serde_json::from_value::<InboundMessage>(value).unwrap();

        tx.send(decode(json!({"event": "interaction", "data": {"xaxis.range[0]": 1, "xaxis.range[1]": 2}})))
            .await
            .unwrap();
        for v in 0..10 {
            tx.send(live(v as f64)).await.unwrap();
        }
        tx.send(decode(json!({"event": "control", "data": {"action": "set_window", "value": 3.0}})))
            .await
            .unwrap();
        tx.send(decode(json!({"event": "control", "data": {"action": "go_live"}})))
            .await
            .unwrap();
        drop(tx);

        let session = runtime.run(rx).await;
        assert_eq!(session.mode().mode(), ViewMode::Live);
        assert_eq!(h.surface.shown("main"), vec![7.0, 8.0, 9.0]);
    }

    #[tokio::test]
    async fn test_run_applies_filter_and_rejects_bad_range() {
        let fetch = StubFetch {
            preload: Some(Vec::new()),
            filtered: Some((0..40).map(|i| reading(None, i, i as f64)).collect()),
            ..StubFetch::default()
        };
        let (runtime, h) = runtime(fetch, Deployment::Single, 5);
        let (tx, rx) = mpsc::channel(8);

        tx.send(InboundMessage::Control(ControlCommand::ApplyFilter {
            start: "2024-03-02".to_string(),
            end: "2024-03-01".to_string(),
            sensor_id: None,
        }))
        .await
        .unwrap();
        tx.send(InboundMessage::Control(ControlCommand::ApplyFilter {
            start: "2024-03-01".to_string(),
            end: "2024-03-01".to_string(),
            sensor_id: None,
        }))
        .await
        .unwrap();
        drop(tx);

        let session = runtime.run(rx).await;
        assert_eq!(session.mode().mode(), ViewMode::Historical);
        assert_eq!(h.surface.shown("main").len(), 40);
        assert_eq!(h.status.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_go_live_while_filter_in_flight_wins() {
        let gate = Arc::new(Notify::new());
        let fetch = StubFetch {
            preload: Some(Vec::new()),
            filtered: Some((0..30).map(|i| reading(None, i, 40.0 + i as f64)).collect()),
            filter_gate: Some(gate.clone()),
            ..StubFetch::default()
        };
        let (runtime, h) = runtime(fetch, Deployment::Single, 5);
        let (tx, rx) = mpsc::channel(8);
        let running = tokio::spawn(runtime.run(rx));

        tx.send(InboundMessage::Control(ControlCommand::ApplyFilter {
            start: "2024-03-01".to_string(),
            end: "2024-03-01".to_string(),
            sensor_id: None,
        }))
        .await
        .unwrap();
        tx.send(live(3.0)).await.unwrap();
        tx.send(InboundMessage::Control(ControlCommand::GoLive { window: None }))
            .await
            .unwrap();

        // Wait until go_live has been handled before the fetch answers.
        let live_shown = || {
            h.status
                .calls()
                .iter()
                .filter(|c| **c == StatusCall::Mode(ViewMode::Live))
                .count()
        };
        tokio::time::timeout(Duration::from_secs(5), async {
            while live_shown() < 2 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        gate.notify_one();
        drop(tx);

        let session = running.await.unwrap();
        assert!(session.mode().is_live());
        assert_eq!(session.registry().get("main").unwrap().buffer.len(), 1);
        assert_eq!(h.surface.shown("main"), vec![3.0]);
    }

    #[tokio::test]
    async fn test_run_ignores_projection_echo() {
        let (runtime, _h) = runtime(StubFetch::default(), Deployment::Single, 20);
        let (tx, rx) = mpsc::channel(8);
        tx.send(live(1.0)).await.unwrap();
        tx.send(InboundMessage::Interaction(InteractionEvent {
            echo: Some(crate::domain::events::ProjectionTag(1)),
            ..InteractionEvent::pan(0, 1)
        }))
        .await
        .unwrap();
        drop(tx);

        let session = runtime.run(rx).await;
        assert!(session.mode().is_live());
    }
}
