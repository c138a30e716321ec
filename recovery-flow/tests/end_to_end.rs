use async_trait::async_trait;
use recovery_flow::{
    ALL_STATUSES, AgentCapability, AgentDirectory, AgentEnvelope, AgentGateway, AgentRequest,
    CaseRegistry, Completion, DeskRunner, DeskSettings, FlowError, GatewayError,
    InMemorySessionStorage, Operation, ScreenKind, ScreenView, ScriptedGateway, ScriptedReply,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

fn runner(gateway: Arc<dyn AgentGateway>) -> DeskRunner {
    DeskRunner::new(
        Arc::new(CaseRegistry::sample()),
        Arc::new(InMemorySessionStorage::new()),
        gateway,
        Arc::new(AgentDirectory::default()),
        DeskSettings {
            approval_delay: Duration::from_millis(10),
            ..DeskSettings::default()
        },
    )
}

fn ready_evaluation() -> Value {
    json!({
        "case_summary": {
            "case_id": "CLM-2024-78432",
            "case_status": "VALIDATED",
            "processing_timestamp": "2024-01-15T10:30:00Z",
            "overall_assessment": "Clear third-party liability"
        },
        "aggregated_data": {
            "liability_summary": {
                "liability_percentage": 100,
                "at_fault_party": "ABC Insurance",
                "supporting_evidence": ["Police report", "Dashcam footage"]
            },
            "financial_summary": {"total_recovery_amount": 4200}
        },
        "validation_status": {"overall_validation": "PASSED", "validation_score": 92},
        "fraud_assessment": {"risk_level": "LOW", "fraud_score": 5},
        "next_steps": [{"priority": "HIGH", "action": "Send demand letter"}],
        "ready_for_document_generation": true
    })
}

fn outlay_document() -> Value {
    json!({
        "document_metadata": {"document_id": "OUT-78432", "case_reference": "CLM-2024-78432"},
        "outlay_summary": {
            "total_recovery_amount": 4200,
            "currency": "GBP",
            "recovery_calculation": {"total_damages": 4200, "liability_percentage": 100, "final_recovery_amount": 4200}
        },
        "document_status": "READY_FOR_APPROVAL"
    })
}

#[tokio::test]
async fn test_select_process_generate_approve() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway
        .push_success(AgentCapability::SubrogationCoordinator, ready_evaluation())
        .await;
    gateway
        .push_success(AgentCapability::OutlayDocument, outlay_document())
        .await;
    let runner = runner(gateway.clone());
    let session = runner.open_session().await.unwrap();

    runner.select_case(&session.id, "CLM-2024-78432").await.unwrap();
    assert_eq!(runner.screen_kind(&session.id).await.unwrap(), ScreenKind::Processing);

    assert_eq!(runner.process(&session.id).await.unwrap(), Completion::Applied);
    let ScreenView::Processing {
        can_open_outlay,
        evaluation,
        error,
        ..
    } = runner.view(&session.id, "", ALL_STATUSES).await.unwrap()
    else {
        panic!("expected processing view");
    };
    assert!(can_open_outlay);
    assert!(error.is_none());
    let evaluation = evaluation.unwrap();
    assert_eq!(evaluation.validation_score.unwrap().label, "PASS (92%)");
    assert_eq!(evaluation.supporting_evidence.len(), 2);

    runner.open_outlay(&session.id).await.unwrap();
    assert_eq!(runner.generate_document(&session.id).await.unwrap(), Completion::Applied);

    let ScreenView::Outlay {
        document,
        can_generate,
        can_approve,
        ..
    } = runner.view(&session.id, "", ALL_STATUSES).await.unwrap()
    else {
        panic!("expected outlay view");
    };
    assert!(!can_generate);
    assert!(can_approve);
    assert_eq!(document.unwrap().total_recovery, "£4,200");

    assert_eq!(runner.approve(&session.id).await.unwrap(), Completion::Applied);
    assert_eq!(runner.screen_kind(&session.id).await.unwrap(), ScreenKind::Dashboard);
    assert!(matches!(
        runner.view(&session.id, "", ALL_STATUSES).await.unwrap(),
        ScreenView::Dashboard { .. }
    ));

    let calls = gateway.calls().await;
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0].instruction,
        "Process case CLM-2024-78432 for J. Smith vs ABC Insurance, estimated recovery £4200"
    );
    assert!(calls[1].instruction.contains("Liability: 100% third party fault."));
}

#[tokio::test]
async fn test_transport_failure_keeps_previous_evaluation() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway
        .push_success(AgentCapability::SubrogationCoordinator, ready_evaluation())
        .await;
    gateway
        .push(
            AgentCapability::SubrogationCoordinator,
            ScriptedReply::TransportError("connection reset".to_string()),
        )
        .await;
    let runner = runner(gateway);
    let session = runner.open_session().await.unwrap();

    runner.select_case(&session.id, "CLM-2024-78432").await.unwrap();
    runner.process(&session.id).await.unwrap();

    let completion = runner.process(&session.id).await.unwrap();
    assert!(matches!(completion, Completion::Failed(ref m) if !m.is_empty()));

    let ScreenView::Processing {
        evaluation, error, ..
    } = runner.view(&session.id, "", ALL_STATUSES).await.unwrap()
    else {
        panic!("expected processing view");
    };
    assert!(evaluation.is_some());
    assert!(error.unwrap().contains("connection reset"));
}

#[tokio::test]
async fn test_business_failure_is_reported_inline() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway
        .push(
            AgentCapability::SubrogationCoordinator,
            ScriptedReply::Envelope(AgentEnvelope::rejected("error", "Claim data incomplete")),
        )
        .await;
    let runner = runner(gateway);
    let session = runner.open_session().await.unwrap();

    runner.select_case(&session.id, "CLM-2024-78419").await.unwrap();
    assert_eq!(
        runner.process(&session.id).await.unwrap(),
        Completion::Failed("Claim data incomplete".to_string())
    );
    assert!(matches!(
        runner.open_outlay(&session.id).await,
        Err(FlowError::NotReady)
    ));
}

/// Answers every capability with a fixed payload, holding calls to `gated` until released.
struct GatedGateway {
    gated: AgentCapability,
    entered: Notify,
    release: Notify,
}

impl GatedGateway {
    fn new(gated: AgentCapability) -> Self {
        Self {
            gated,
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl AgentGateway for GatedGateway {
    async fn invoke(&self, request: &AgentRequest) -> Result<AgentEnvelope, GatewayError> {
        if request.capability == self.gated {
            self.entered.notify_one();
            self.release.notified().await;
        }
        let result = match request.capability {
            AgentCapability::OutlayDocument => outlay_document(),
            _ => ready_evaluation(),
        };
        Ok(AgentEnvelope::success(result))
    }
}

#[tokio::test]
async fn test_duplicate_processing_is_rejected_while_pending() {
    let gateway = Arc::new(GatedGateway::new(AgentCapability::SubrogationCoordinator));
    let runner = runner(gateway.clone());
    let session = runner.open_session().await.unwrap();
    runner.select_case(&session.id, "CLM-2024-78432").await.unwrap();

    let background = {
        let runner = runner.clone();
        let id = session.id.clone();
        tokio::spawn(async move { runner.process(&id).await })
    };
    gateway.entered.notified().await;

    let ScreenView::Processing { pending, .. } =
        runner.view(&session.id, "", ALL_STATUSES).await.unwrap()
    else {
        panic!("expected processing view");
    };
    assert!(pending);
    assert!(matches!(
        runner.process(&session.id).await,
        Err(FlowError::AlreadyPending(Operation::ProcessCase))
    ));

    gateway.release.notify_one();
    assert_eq!(background.await.unwrap().unwrap(), Completion::Applied);
}

#[tokio::test]
async fn test_late_result_for_abandoned_case_is_discarded() {
    let gateway = Arc::new(GatedGateway::new(AgentCapability::SubrogationCoordinator));
    let runner = runner(gateway.clone());
    let session = runner.open_session().await.unwrap();
    runner.select_case(&session.id, "CLM-2024-78432").await.unwrap();

    let background = {
        let runner = runner.clone();
        let id = session.id.clone();
        tokio::spawn(async move { runner.process(&id).await })
    };
    gateway.entered.notified().await;

    // the user moves on to another case before the agent answers
    runner.go_dashboard(&session.id).await.unwrap();
    runner.select_case(&session.id, "CLM-2024-78419").await.unwrap();

    gateway.release.notify_one();
    assert_eq!(background.await.unwrap().unwrap(), Completion::Discarded);

    let ScreenView::Processing {
        case,
        pending,
        evaluation,
        can_open_outlay,
        ..
    } = runner.view(&session.id, "", ALL_STATUSES).await.unwrap()
    else {
        panic!("expected processing view");
    };
    assert_eq!(case.claim_number, "CLM-2024-78419");
    assert!(!pending);
    assert!(evaluation.is_none());
    assert!(!can_open_outlay);
}

#[tokio::test]
async fn test_back_from_outlay_keeps_evaluation() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway
        .push_success(AgentCapability::SubrogationCoordinator, ready_evaluation())
        .await;
    let runner = runner(gateway);
    let session = runner.open_session().await.unwrap();

    runner.select_case(&session.id, "CLM-2024-78432").await.unwrap();
    runner.process(&session.id).await.unwrap();
    runner.open_outlay(&session.id).await.unwrap();
    runner.back(&session.id).await.unwrap();

    let ScreenView::Processing {
        evaluation,
        can_open_outlay,
        ..
    } = runner.view(&session.id, "", ALL_STATUSES).await.unwrap()
    else {
        panic!("expected processing view");
    };
    assert!(evaluation.is_some());
    assert!(can_open_outlay);

    runner.back(&session.id).await.unwrap();
    assert!(matches!(
        runner.back(&session.id).await,
        Err(FlowError::InvalidTransition {
            from: ScreenKind::Dashboard,
            ..
        })
    ));
}

async fn on_outlay_screen(runner: &DeskRunner, session_id: &str) {
    runner.select_case(session_id, "CLM-2024-78432").await.unwrap();
    runner.process(session_id).await.unwrap();
    runner.open_outlay(session_id).await.unwrap();
}

#[tokio::test]
async fn test_late_document_is_discarded_after_leaving_outlay() {
    let gateway = Arc::new(GatedGateway::new(AgentCapability::OutlayDocument));
    let runner = runner(gateway.clone());
    let session = runner.open_session().await.unwrap();
    on_outlay_screen(&runner, &session.id).await;

    let background = {
        let runner = runner.clone();
        let id = session.id.clone();
        tokio::spawn(async move { runner.generate_document(&id).await })
    };
    gateway.entered.notified().await;

    // leave and come back while the draft is still outstanding
    runner.back(&session.id).await.unwrap();
    runner.open_outlay(&session.id).await.unwrap();

    gateway.release.notify_one();
    assert_eq!(background.await.unwrap().unwrap(), Completion::Discarded);

    let ScreenView::Outlay {
        document,
        pending,
        can_generate,
        can_approve,
        ..
    } = runner.view(&session.id, "", ALL_STATUSES).await.unwrap()
    else {
        panic!("expected outlay view");
    };
    assert!(document.is_none());
    assert!(!pending);
    assert!(can_generate);
    assert!(!can_approve);
}

#[tokio::test]
async fn test_approval_is_discarded_after_leaving_outlay() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway
        .push_success(AgentCapability::SubrogationCoordinator, ready_evaluation())
        .await;
    gateway
        .push_success(AgentCapability::OutlayDocument, outlay_document())
        .await;
    let runner = DeskRunner::new(
        Arc::new(CaseRegistry::sample()),
        Arc::new(InMemorySessionStorage::new()),
        gateway,
        Arc::new(AgentDirectory::default()),
        DeskSettings {
            approval_delay: Duration::from_millis(300),
            ..DeskSettings::default()
        },
    );
    let session = runner.open_session().await.unwrap();
    on_outlay_screen(&runner, &session.id).await;
    runner.generate_document(&session.id).await.unwrap();

    let background = {
        let runner = runner.clone();
        let id = session.id.clone();
        tokio::spawn(async move { runner.approve(&id).await })
    };

    let mut approving = false;
    for _ in 0..200 {
        if let ScreenView::Outlay { approving: true, .. } =
            runner.view(&session.id, "", ALL_STATUSES).await.unwrap()
        {
            approving = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert!(approving);

    runner.back(&session.id).await.unwrap();
    assert_eq!(background.await.unwrap().unwrap(), Completion::Discarded);

    // the user stays where they navigated to
    assert_eq!(runner.screen_kind(&session.id).await.unwrap(), ScreenKind::Processing);
}
