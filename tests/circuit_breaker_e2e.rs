//! Circuit breaker behavior observed through the orchestrator and the HTTP API

mod mocks;

use std::time::Duration;

use crate::mocks::{ProviderFixtures, TestConfigs, TestServer};
use llmo_orchestrator::{CircuitState, OrchestratorTrait, ProviderError, Strategy};
use reqwest::Client;

const WINDOW: u32 = 5;

#[tokio::test]
async fn test_failing_provider_is_skipped_once_circuit_opens() {
	let primary = ProviderFixtures::unavailable("primary");
	let secondary = ProviderFixtures::invoice("secondary", "Acme Corp", 0.9);
	let orchestrator = ProviderFixtures::builder(
		TestConfigs::no_retry(),
		&[primary.clone(), secondary.clone()],
	)
	.build()
	.await
	.unwrap();

	for _ in 0..WINDOW {
		let result = orchestrator
			.execute(ProviderFixtures::extract_request(Strategy::Failover))
			.await
			.unwrap();
		assert_eq!(result.chosen_provider.as_deref(), Some("secondary"));
	}
	assert_eq!(primary.calls(), WINDOW);

	let result = orchestrator
		.execute(ProviderFixtures::extract_request(Strategy::Failover))
		.await
		.unwrap();
	assert_eq!(result.chosen_provider.as_deref(), Some("secondary"));
	assert_eq!(result.results.len(), 1);
	assert_eq!(primary.calls(), WINDOW);

	let health = orchestrator.provider_health().await;
	let primary_health = health
		.iter()
		.find(|h| h.identity.name == "primary")
		.unwrap();
	assert_eq!(primary_health.circuit_state, CircuitState::Open);
	assert!(primary_health.cooldown_deadline.is_some());
	assert_eq!(primary_health.recent_success_rate, Some(0.0));
}

#[tokio::test]
async fn test_successful_trial_closes_circuit_after_cooldown() {
	let primary = ProviderFixtures::invoice("primary", "Acme Corp", 0.9)
		.fail_times(WINDOW, ProviderError::from_http_status(502, "bad gateway"));
	let secondary = ProviderFixtures::invoice("secondary", "Acme Corp", 0.9);
	let orchestrator = ProviderFixtures::builder(
		TestConfigs::short_cooldown(100),
		&[primary.clone(), secondary.clone()],
	)
	.build()
	.await
	.unwrap();

	for _ in 0..WINDOW {
		orchestrator
			.execute(ProviderFixtures::extract_request(Strategy::Failover))
			.await
			.unwrap();
	}
	assert_eq!(
		orchestrator.breaker().state("primary").unwrap().state,
		CircuitState::Open
	);

	tokio::time::sleep(Duration::from_millis(150)).await;

	let result = orchestrator
		.execute(ProviderFixtures::extract_request(Strategy::Failover))
		.await
		.unwrap();
	assert_eq!(result.chosen_provider.as_deref(), Some("primary"));
	assert_eq!(primary.calls(), WINDOW + 1);
	assert_eq!(
		orchestrator.breaker().state("primary").unwrap().state,
		CircuitState::Closed
	);
}

#[tokio::test]
async fn test_failed_trial_reopens_with_longer_cooldown() {
	let primary = ProviderFixtures::unavailable("primary");
	let secondary = ProviderFixtures::invoice("secondary", "Acme Corp", 0.9);
	let mut settings = TestConfigs::short_cooldown(100);
	settings.circuit_breaker.max_cooldown_ms = Some(1_000);
	let orchestrator =
		ProviderFixtures::builder(settings, &[primary.clone(), secondary.clone()])
			.build()
			.await
			.unwrap();

	for _ in 0..WINDOW {
		orchestrator
			.execute(ProviderFixtures::extract_request(Strategy::Failover))
			.await
			.unwrap();
	}

	tokio::time::sleep(Duration::from_millis(150)).await;
	orchestrator
		.execute(ProviderFixtures::extract_request(Strategy::Failover))
		.await
		.unwrap();
	assert_eq!(primary.calls(), WINDOW + 1);

	let state = orchestrator.breaker().state("primary").unwrap();
	assert_eq!(state.state, CircuitState::Open);
	assert_eq!(state.recovery_attempt_count, 1);

	let health = orchestrator.provider_health().await;
	let primary_health = health
		.iter()
		.find(|h| h.identity.name == "primary")
		.unwrap();
	let cooldown = primary_health.cooldown_deadline.unwrap() - primary_health.opened_at.unwrap();
	assert!(cooldown.num_milliseconds() >= 200);

	// Still cooling down: the next request does not touch the provider
	orchestrator
		.execute(ProviderFixtures::extract_request(Strategy::Failover))
		.await
		.unwrap();
	assert_eq!(primary.calls(), WINDOW + 1);
}

#[tokio::test]
async fn test_disabled_breaker_never_blocks_calls() {
	let primary = ProviderFixtures::unavailable("primary");
	let secondary = ProviderFixtures::invoice("secondary", "Acme Corp", 0.9);
	let mut settings = TestConfigs::no_retry();
	settings.circuit_breaker.enabled = false;
	let orchestrator =
		ProviderFixtures::builder(settings, &[primary.clone(), secondary.clone()])
			.build()
			.await
			.unwrap();

	for _ in 0..WINDOW * 2 {
		orchestrator
			.execute(ProviderFixtures::extract_request(Strategy::Failover))
			.await
			.unwrap();
	}
	assert_eq!(primary.calls(), WINDOW * 2);
}

#[tokio::test]
async fn test_open_circuit_is_reported_over_http() {
	let primary = ProviderFixtures::unavailable("primary");
	let secondary = ProviderFixtures::invoice("secondary", "Acme Corp", 0.9);
	let server = TestServer::spawn_with(ProviderFixtures::builder(
		TestConfigs::no_retry(),
		&[primary, secondary],
	))
	.await
	.expect("Failed to start test server");
	let client = Client::new();

	for _ in 0..WINDOW {
		let resp = client
			.post(server.url("/api/v1/orchestrate"))
			.json(&ProviderFixtures::extract_request_json(Strategy::Failover))
			.send()
			.await
			.unwrap();
		assert!(resp.status().is_success());
	}

	let body: serde_json::Value = client
		.get(server.url("/api/v1/providers"))
		.send()
		.await
		.unwrap()
		.json()
		.await
		.unwrap();
	let providers = body["providers"].as_array().unwrap();
	let primary = providers
		.iter()
		.find(|p| p["identity"]["name"] == "primary")
		.unwrap();
	assert_eq!(primary["circuit_state"], "Open");

	// One provider is still closed, so the service stays ready
	let resp = client.get(server.url("/ready")).send().await.unwrap();
	assert_eq!(resp.status(), 200);

	server.abort();
}
