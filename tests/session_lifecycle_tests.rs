// End-to-end tests: client components wired to the HTTP transport

mod common;

#[cfg(test)]
mod session_lifecycle_integration_tests {
    use super::common::{self, FakeService, KNOWN_USER, PASSWORD};
    use model_advisor_lib::chat::{HistoryOutcome, SendOutcome, UploadOutcome};
    use model_advisor_lib::client::HttpBackend;
    use model_advisor_lib::error::{SessionError, TransportError, ValidationError};
    use model_advisor_lib::events::{SessionEndedPayload, EVENT_SESSION_ENDED};
    use model_advisor_lib::session::{EndReason, IdentityStore};
    use model_advisor_lib::{AdvisorClient, ExchangeState, Sender};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn client_for(base_url: &str, state_dir: &TempDir) -> AdvisorClient {
        let backend = HttpBackend::new(base_url, Duration::from_secs(5)).unwrap();
        AdvisorClient::new(Arc::new(backend), IdentityStore::new(state_dir.path()))
    }

    async fn logged_in() -> (AdvisorClient, Arc<FakeService>, TempDir) {
        let service = Arc::new(FakeService::default());
        let base_url = common::spawn_service(service.clone()).await;
        let state_dir = TempDir::new().unwrap();
        let client = client_for(&base_url, &state_dir);

        client.session.login(KNOWN_USER, PASSWORD).await.unwrap();
        (client, service, state_dir)
    }

    #[tokio::test]
    async fn test_login_persists_and_restore_is_offline() {
        let (client, _service, state_dir) = logged_in().await;
        assert_eq!(client.session.current().identity, KNOWN_USER);
        assert!(state_dir.path().join("session.json").exists());

        // A second client pointed at nothing still restores from disk
        let restarted = client_for(&common::closed_port_url(), &state_dir);
        assert_eq!(restarted.session.restore().as_deref(), Some(KNOWN_USER));
        assert!(restarted.session.current().active);
    }

    #[tokio::test]
    async fn test_wrong_password_starts_no_session() {
        let service = Arc::new(FakeService::default());
        let base_url = common::spawn_service(service).await;
        let state_dir = TempDir::new().unwrap();
        let client = client_for(&base_url, &state_dir);

        let err = client.session.login(KNOWN_USER, "wrong").await.unwrap_err();

        assert!(matches!(
            err,
            SessionError::Transport(TransportError::Status { status: 401, .. })
        ));
        assert!(!client.session.current().active);
        assert!(!state_dir.path().join("session.json").exists());
    }

    #[tokio::test]
    async fn test_chat_round_trip_updates_hint() {
        let (client, service, _state_dir) = logged_in().await;

        let outcome = client.pipeline.send("cheap model?", false).await;

        assert!(outcome.is_replied());
        assert_eq!(client.pipeline.state(), ExchangeState::Idle);
        let messages = client.conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert_eq!(client.conversation.hint().model_name.as_deref(), Some("Phi-3"));
        assert!(client.conversation.recommendation().is_none());
        assert_eq!(service.chats()[0].0, KNOWN_USER);
    }

    #[tokio::test]
    async fn test_report_reply_yields_recommendation() {
        let (client, _service, _state_dir) = logged_in().await;

        client.pipeline.send("report", false).await;

        let rec = client.conversation.recommendation().unwrap();
        assert_eq!(rec.model_name, "Mistral-7B");
        assert_eq!(rec.accuracy, 91.5);
        assert_eq!(rec.cloud, "AWS");
        assert!(rec.region.is_empty());
    }

    #[tokio::test]
    async fn test_failed_send_keeps_user_message() {
        let (client, _service, _state_dir) = logged_in().await;

        let outcome = client.pipeline.send("boom", false).await;

        assert!(matches!(outcome, SendOutcome::Failed(_)));
        let messages = client.conversation.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "boom");
        assert!(!client.pipeline.is_loading());
    }

    #[tokio::test]
    async fn test_alternative_request_goes_through_pipeline() {
        let (client, service, _state_dir) = logged_in().await;

        client.pipeline.request_alternative().await;

        assert_eq!(
            service.chats()[0].1,
            "I don't like this model. Suggest another one."
        );
        assert_eq!(client.conversation.len(), 2);
    }

    #[tokio::test]
    async fn test_reset_then_reload_history() {
        let (client, _service, _state_dir) = logged_in().await;
        client.pipeline.send("cheap model?", false).await;

        client.history.reset();
        assert!(client.conversation.is_empty());
        assert!(client.conversation.hint().model_name.is_none());

        assert_eq!(client.history.load_history().await, HistoryOutcome::Loaded(3));
        assert_eq!(client.conversation.len(), 3);
    }

    #[tokio::test]
    async fn test_upload_clears_slot() {
        let (client, service, _state_dir) = logged_in().await;
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("workload.csv");
        std::fs::write(&file, "requests_per_day,50000").unwrap();

        client.uploads.select(&file).unwrap();
        let outcome = client.uploads.upload().await;

        assert_eq!(outcome, UploadOutcome::Uploaded(file));
        assert!(client.uploads.pending().is_none());
        assert_eq!(service.uploads().len(), 1);
    }

    #[tokio::test]
    async fn test_logout_notifies_once_and_blocks_sends() {
        let (client, service, state_dir) = logged_in().await;
        let mut events = client.events.subscribe();

        assert!(client.session.end(EndReason::UserInitiated).await);
        assert!(!client.session.end(EndReason::UserInitiated).await);

        assert_eq!(service.logouts(), vec![KNOWN_USER.to_string()]);
        assert!(!state_dir.path().join("session.json").exists());

        let ended = events.recv().await.unwrap();
        assert_eq!(ended.event, EVENT_SESSION_ENDED);
        let payload: SessionEndedPayload = ended.payload_as().unwrap();
        assert_eq!(payload.reason, "user_initiated");

        let outcome = client.pipeline.send("still there?", false).await;
        assert_eq!(
            outcome,
            SendOutcome::Rejected(ValidationError::NoActiveSession)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_terminate_sends_detached_notice() {
        let (client, service, state_dir) = logged_in().await;

        assert!(client.session.terminate());
        assert!(!client.session.current().active);
        assert!(!state_dir.path().join("session.json").exists());

        let logouts = service
            .wait_for_logouts(1, Duration::from_secs(5))
            .await;
        assert_eq!(logouts, vec![KNOWN_USER.to_string()]);
    }

    #[tokio::test]
    async fn test_terminate_with_service_down_still_clears_locally() {
        let state_dir = TempDir::new().unwrap();
        let client = client_for(&common::closed_port_url(), &state_dir);
        client.session.start(KNOWN_USER).unwrap();

        assert!(client.session.terminate());

        assert!(!client.session.current().active);
        assert!(!state_dir.path().join("session.json").exists());
        assert!(!client.session.terminate());
    }
}
