//! Multi-provider request orchestration
//!
//! The [`Orchestrator`] filters registered providers down to the eligible
//! ones, runs the requested strategy against them and reduces the provider
//! results into one [`OrchestrationResult`]. Individual provider failures are
//! absorbed here; only request-level errors reach the caller.

use crate::circuit_breaker::{CallPermit, CircuitBreakerTrait};
use crate::consensus;
use crate::health::collect_provider_health;
use crate::providers::{ProviderEntry, ProviderTable};
use crate::quality::{QualityScorer, SchemaValidator};
use crate::retry::RetryPolicy;
use crate::selection;
use async_trait::async_trait;
use futures::future::join_all;
use llmo_config::Settings;
use llmo_types::constants::limits::{
	CONSENSUS_MIN_RESULTS, DEFAULT_HEALTH_WINDOW_MINUTES, DEFAULT_REQUEST_TIMEOUT_MS,
};
use llmo_types::{
	Capability, Degradation, FieldResolution, MetricsDataPoint, MetricsStore, OrchestrationError,
	OrchestrationOutcome, OrchestrationRequest, OrchestrationResult, ProviderCallResult,
	ProviderError, ProviderHealth, ProviderInput, ProviderPayload, ProviderResponse,
	ProviderResult, ResultSchema, Strategy, TransientError,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

/// Request-independent orchestrator settings
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
	pub default_strategy: Strategy,
	/// Deadline applied when a request does not carry its own
	pub request_timeout: Duration,
	/// Window for health snapshots and history-weighted scoring
	pub health_window: chrono::Duration,
}

impl Default for OrchestratorConfig {
	fn default() -> Self {
		Self {
			default_strategy: Strategy::default(),
			request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
			health_window: chrono::Duration::minutes(DEFAULT_HEALTH_WINDOW_MINUTES as i64),
		}
	}
}

impl From<&Settings> for OrchestratorConfig {
	fn from(settings: &Settings) -> Self {
		Self {
			default_strategy: settings.orchestration.default_strategy,
			request_timeout: settings.orchestration.request_timeout(),
			health_window: chrono::Duration::minutes(settings.metrics.health_window_minutes as i64),
		}
	}
}

/// Operations exposed to callers of the orchestration layer
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrchestratorTrait: Send + Sync {
	/// Run one request to completion or to a request-level error
	async fn execute(
		&self,
		request: OrchestrationRequest,
	) -> OrchestrationOutcome<OrchestrationResult>;

	/// Point-in-time health of every registered provider
	async fn provider_health(&self) -> Vec<ProviderHealth>;

	/// Operator kill-switch
	fn set_enabled(&self, provider: &str, enabled: bool) -> OrchestrationOutcome<()>;

	fn default_strategy(&self) -> Strategy;
}

/// Orchestrator with injected provider table, breaker and metrics store
#[derive(Clone)]
pub struct Orchestrator {
	providers: Arc<ProviderTable>,
	breaker: Arc<dyn CircuitBreakerTrait>,
	metrics: Arc<dyn MetricsStore>,
	retry: RetryPolicy,
	scorer: QualityScorer,
	config: OrchestratorConfig,
}

impl std::fmt::Debug for Orchestrator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Orchestrator")
			.field("providers", &self.providers.len())
			.field("retry", &self.retry)
			.field("config", &self.config)
			.finish()
	}
}

impl Orchestrator {
	/// Create an orchestrator; every provider gets a closed circuit up front
	pub fn new(
		providers: Arc<ProviderTable>,
		breaker: Arc<dyn CircuitBreakerTrait>,
		metrics: Arc<dyn MetricsStore>,
	) -> Self {
		for entry in providers.iter() {
			breaker.register(entry.name());
		}
		Self {
			providers,
			breaker,
			metrics,
			retry: RetryPolicy::default(),
			scorer: QualityScorer::default(),
			config: OrchestratorConfig::default(),
		}
	}

	pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;
		self
	}

	pub fn with_scorer(mut self, scorer: QualityScorer) -> Self {
		self.scorer = scorer;
		self
	}

	pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
		self.config = config;
		self
	}

	pub fn providers(&self) -> &Arc<ProviderTable> {
		&self.providers
	}

	pub fn breaker(&self) -> &Arc<dyn CircuitBreakerTrait> {
		&self.breaker
	}

	pub fn metrics(&self) -> &Arc<dyn MetricsStore> {
		&self.metrics
	}

	/// Enabled providers supporting the capability whose circuit admits calls
	fn eligible_providers(
		&self,
		capability: Capability,
	) -> OrchestrationOutcome<Vec<Arc<ProviderEntry>>> {
		if !self.providers.supports_any(capability) {
			return Err(OrchestrationError::UnsupportedCapability { capability });
		}

		let eligible: Vec<_> = self
			.providers
			.candidates(capability)
			.into_iter()
			.filter(|entry| self.breaker.is_eligible(entry.name()))
			.collect();

		if eligible.is_empty() {
			warn!("No eligible providers for {}", capability);
			return Err(OrchestrationError::NoProvidersAvailable { capability });
		}
		Ok(eligible)
	}

	/// Sequential, priority-ordered; stops at the first success
	async fn run_failover(
		&self,
		ctx: &CallContext,
		candidates: Vec<Arc<ProviderEntry>>,
	) -> OrchestrationOutcome<Vec<CallOutcome>> {
		let mut outcomes = Vec::new();

		for entry in candidates {
			if Instant::now() >= ctx.deadline {
				debug!(
					"Deadline reached before trying provider '{}'",
					entry.name()
				);
				outcomes.push(CallOutcome::skipped_by_deadline(&entry));
				break;
			}
			let Some(permit) = self.breaker.try_acquire(entry.name()) else {
				debug!("Circuit rejected provider '{}', trying next", entry.name());
				continue;
			};

			let outcome = ctx.call(&entry, permit).await;
			let succeeded = outcome.result.is_success();
			outcomes.push(outcome);
			if succeeded {
				break;
			}
		}

		if outcomes.is_empty() {
			return Err(OrchestrationError::NoProvidersAvailable {
				capability: ctx.capability,
			});
		}
		Ok(outcomes)
	}

	/// One task per provider, joined when every task settles
	///
	/// Each worker bounds itself to the request deadline, so the join never
	/// outlives it.
	async fn run_parallel(
		&self,
		ctx: &CallContext,
		candidates: Vec<Arc<ProviderEntry>>,
	) -> OrchestrationOutcome<Vec<CallOutcome>> {
		let admitted: Vec<_> = candidates
			.into_iter()
			.filter_map(|entry| match self.breaker.try_acquire(entry.name()) {
				Some(permit) => Some((entry, permit)),
				None => {
					debug!("Circuit rejected provider '{}'", entry.name());
					None
				},
			})
			.collect();

		if admitted.is_empty() {
			return Err(OrchestrationError::NoProvidersAvailable {
				capability: ctx.capability,
			});
		}

		let (entries, tasks): (Vec<_>, Vec<_>) = admitted
			.into_iter()
			.map(|(entry, permit)| {
				let ctx = ctx.clone();
				let worker_entry = Arc::clone(&entry);
				let task = tokio::spawn(async move { ctx.call(&worker_entry, permit).await });
				(entry, task)
			})
			.unzip();

		let outcomes = join_all(tasks)
			.await
			.into_iter()
			.zip(entries)
			.map(|(joined, entry)| match joined {
				Ok(outcome) => outcome,
				Err(e) => {
					warn!("Worker for provider '{}' did not complete: {}", entry.name(), e);
					CallOutcome {
						result: ProviderCallResult::failure(
							entry.name(),
							entry.priority(),
							TransientError::Cancelled {
								reason: format!("worker aborted: {}", e),
							}
							.into(),
							0,
						),
						cut_by_deadline: false,
					}
				},
			})
			.collect();

		Ok(outcomes)
	}

	/// Attach a quality score to every successful result
	async fn score_results(&self, results: &mut [ProviderCallResult], schema: &ResultSchema) {
		for result in results.iter_mut() {
			let Some(payload) = result.payload.as_ref() else {
				continue;
			};
			let history = if self.scorer.uses_history() {
				self.recent_success_rate(&result.provider).await
			} else {
				None
			};
			result.quality = Some(self.scorer.score_with_history(payload, schema, history));
		}
	}

	async fn recent_success_rate(&self, provider: &str) -> Option<f64> {
		match self
			.metrics
			.recent_aggregate(provider, self.config.health_window)
			.await
		{
			Ok(aggregate) if !aggregate.is_empty() => Some(aggregate.success_rate),
			Ok(_) => None,
			Err(e) => {
				warn!("Failed to read history for provider '{}': {}", provider, e);
				None
			},
		}
	}

	/// Reduce scored results according to the strategy
	fn decide(
		&self,
		strategy: Strategy,
		results: &[ProviderCallResult],
		schema: &ResultSchema,
	) -> Option<Decision> {
		match strategy {
			Strategy::Failover => results
				.iter()
				.find(|r| r.is_success())
				.map(|r| Decision::chosen(r, Strategy::Failover)),
			Strategy::BestMatch => {
				selection::best_match(results).map(|r| Decision::chosen(r, Strategy::BestMatch))
			},
			Strategy::Consensus => match consensus::reduce(results) {
				Some(outcome) => {
					let mut payload = outcome.payload;
					payload.schema_valid = SchemaValidator::validate(&payload, schema).is_empty();
					Some(Decision {
						payload: Some(payload),
						strategy_used: Strategy::Consensus,
						degradation: None,
						field_resolutions: outcome.resolutions,
						confidence: outcome.confidence,
						chosen_provider: None,
					})
				},
				None => {
					let succeeded = results.iter().filter(|r| r.is_success()).count();
					let mut decision = selection::best_match(results)
						.map(|r| Decision::chosen(r, Strategy::BestMatch))?;
					let reason = format!(
						"only {} provider(s) succeeded, consensus needs {}",
						succeeded, CONSENSUS_MIN_RESULTS
					);
					info!("Consensus degraded to best_match: {}", reason);
					decision.degradation = Some(Degradation {
						requested: Strategy::Consensus,
						used: Strategy::BestMatch,
						reason,
					});
					Some(decision)
				},
			},
			Strategy::AllProviders => {
				let scores: Vec<f64> = results
					.iter()
					.filter(|r| r.is_success())
					.map(ProviderCallResult::score)
					.collect();
				let confidence = if scores.is_empty() {
					0.0
				} else {
					scores.iter().sum::<f64>() / scores.len() as f64
				};
				Some(Decision {
					payload: None,
					strategy_used: Strategy::AllProviders,
					degradation: None,
					field_resolutions: BTreeMap::new(),
					confidence,
					chosen_provider: None,
				})
			},
		}
	}
}

#[async_trait]
impl OrchestratorTrait for Orchestrator {
	async fn execute(
		&self,
		request: OrchestrationRequest,
	) -> OrchestrationOutcome<OrchestrationResult> {
		request.validate()?;

		let started = Instant::now();
		let strategy = request.strategy.unwrap_or(self.config.default_strategy);
		let request_timeout = request
			.timeout_ms
			.map(Duration::from_millis)
			.unwrap_or(self.config.request_timeout);
		let capability = request.capability;

		let candidates = self.eligible_providers(capability)?;
		if let Some(required) = request.min_providers {
			if candidates.len() < required {
				warn!(
					"Request {} needs {} providers, only {} eligible",
					request.request_id,
					required,
					candidates.len()
				);
				return Err(OrchestrationError::InsufficientProviders {
					required,
					available: candidates.len(),
				});
			}
		}

		info!(
			"Orchestrating request {} ({} via {}) across {} eligible providers",
			request.request_id,
			capability,
			strategy,
			candidates.len()
		);

		let ctx = CallContext {
			capability,
			input: Arc::new(request.input.clone()),
			deadline: started + request_timeout,
			retry: self.retry.clone(),
			metrics: Arc::clone(&self.metrics),
			breaker: Arc::clone(&self.breaker),
		};

		let outcomes = match strategy {
			Strategy::Failover => self.run_failover(&ctx, candidates).await?,
			Strategy::BestMatch | Strategy::Consensus | Strategy::AllProviders => {
				self.run_parallel(&ctx, candidates).await?
			},
		};

		let cut_by_deadline = outcomes.iter().any(|o| o.cut_by_deadline);
		let mut results: Vec<ProviderCallResult> =
			outcomes.into_iter().map(|o| o.result).collect();
		self.score_results(&mut results, &request.input.schema).await;

		let Some(decision) = self.decide(strategy, &results, &request.input.schema) else {
			let error = if cut_by_deadline {
				OrchestrationError::DeadlineExceeded {
					timeout_ms: request_timeout.as_millis() as u64,
				}
			} else {
				OrchestrationError::AllProvidersFailed {
					attempted: results.len(),
					last_error: results
						.iter()
						.rev()
						.find_map(|r| r.error.as_ref())
						.map(ToString::to_string)
						.unwrap_or_default(),
				}
			};
			warn!("Request {} failed: {}", request.request_id, error);
			return Err(error);
		};

		let elapsed_ms = started.elapsed().as_millis() as u64;
		info!(
			"Request {} completed via {} ({} of {} providers succeeded, confidence {:.2}, {}ms)",
			request.request_id,
			decision.strategy_used,
			results.iter().filter(|r| r.is_success()).count(),
			results.len(),
			decision.confidence,
			elapsed_ms
		);

		Ok(OrchestrationResult {
			request_id: request.request_id,
			capability,
			payload: decision.payload,
			strategy_requested: strategy,
			strategy_used: decision.strategy_used,
			degradation: decision.degradation,
			field_resolutions: decision.field_resolutions,
			results,
			confidence: decision.confidence,
			chosen_provider: decision.chosen_provider,
			elapsed_ms,
		})
	}

	async fn provider_health(&self) -> Vec<ProviderHealth> {
		collect_provider_health(
			&self.providers,
			self.breaker.as_ref(),
			self.metrics.as_ref(),
			self.config.health_window,
		)
		.await
	}

	fn set_enabled(&self, provider: &str, enabled: bool) -> OrchestrationOutcome<()> {
		if self.providers.set_enabled(provider, enabled) {
			Ok(())
		} else {
			Err(OrchestrationError::UnknownProvider {
				provider: provider.to_string(),
			})
		}
	}

	fn default_strategy(&self) -> Strategy {
		self.config.default_strategy
	}
}

/// Reduced outcome of a strategy
struct Decision {
	payload: Option<ProviderPayload>,
	strategy_used: Strategy,
	degradation: Option<Degradation>,
	field_resolutions: BTreeMap<String, FieldResolution>,
	confidence: f64,
	chosen_provider: Option<String>,
}

impl Decision {
	fn chosen(result: &ProviderCallResult, strategy_used: Strategy) -> Self {
		Self {
			payload: result.payload.clone(),
			strategy_used,
			degradation: None,
			field_resolutions: BTreeMap::new(),
			confidence: result.score(),
			chosen_provider: Some(result.provider.clone()),
		}
	}
}

/// Result of one logical call plus whether the deadline cut it short
struct CallOutcome {
	result: ProviderCallResult,
	cut_by_deadline: bool,
}

impl CallOutcome {
	fn skipped_by_deadline(entry: &ProviderEntry) -> Self {
		Self {
			result: ProviderCallResult::failure(
				entry.name(),
				entry.priority(),
				deadline_error(),
				0,
			),
			cut_by_deadline: true,
		}
	}
}

fn deadline_error() -> ProviderError {
	TransientError::Cancelled {
		reason: "request deadline exceeded".to_string(),
	}
	.into()
}

/// Everything a worker needs to run one logical call on its own task
#[derive(Clone)]
struct CallContext {
	capability: Capability,
	input: Arc<ProviderInput>,
	deadline: Instant,
	retry: RetryPolicy,
	metrics: Arc<dyn MetricsStore>,
	breaker: Arc<dyn CircuitBreakerTrait>,
}

impl CallContext {
	/// Attempts with retries, then exactly one breaker outcome
	async fn call(&self, entry: &ProviderEntry, permit: CallPermit) -> CallOutcome {
		let started = Instant::now();
		let mut attempt = 0;
		let mut cut_by_deadline = false;

		let outcome: ProviderResult<ProviderResponse> = loop {
			let remaining = self.deadline.saturating_duration_since(Instant::now());
			if remaining.is_zero() {
				cut_by_deadline = true;
				break Err(deadline_error());
			}

			attempt += 1;
			let attempt_timeout = entry.timeout().min(remaining);
			let attempt_started = Instant::now();
			let result = match timeout(
				attempt_timeout,
				entry
					.adapter()
					.call(self.capability, &self.input, attempt_timeout),
			)
			.await
			{
				Ok(result) => result,
				Err(_) => Err(ProviderError::timeout(attempt_timeout.as_millis() as u64)),
			};
			self.record_attempt(
				entry.name(),
				attempt,
				attempt_started.elapsed().as_millis() as u64,
				&result,
			)
			.await;

			let error = match result {
				Ok(response) => break Ok(response),
				Err(error) => error,
			};

			// Only a timeout that ran into the request deadline is a cut; a
			// provider-reported timeout (HTTP 408) is retried like any transient
			if error.is_timeout() && Instant::now() >= self.deadline {
				cut_by_deadline = true;
				break Err(error);
			}

			let plan = self.retry.plan(attempt, &error);
			if !plan.should_retry() {
				break Err(error);
			}
			if Instant::now() + plan.delay >= self.deadline {
				debug!(
					"Not retrying provider '{}': backoff of {}ms would pass the deadline",
					entry.name(),
					plan.delay.as_millis()
				);
				cut_by_deadline = true;
				break Err(error);
			}

			debug!(
				"Retrying provider '{}' in {}ms (attempt {} failed: {})",
				entry.name(),
				plan.delay.as_millis(),
				attempt,
				error
			);
			sleep(plan.delay).await;
		};

		self.breaker.record_outcome(permit, outcome.is_ok());

		let latency_ms = started.elapsed().as_millis() as u64;
		let result = match outcome {
			Ok(response) => {
				debug!(
					"Provider '{}' succeeded after {} attempt(s) in {}ms",
					entry.name(),
					attempt,
					latency_ms
				);
				ProviderCallResult::success(entry.name(), entry.priority(), response.payload, attempt)
					.with_usage(response.usage)
			},
			Err(error) => {
				warn!(
					"Provider '{}' failed after {} attempt(s): {}",
					entry.name(),
					attempt,
					error
				);
				ProviderCallResult::failure(entry.name(), entry.priority(), error, attempt)
			},
		};

		CallOutcome {
			result: result.with_latency_ms(latency_ms),
			cut_by_deadline,
		}
	}

	async fn record_attempt(
		&self,
		provider: &str,
		attempt: u32,
		response_time_ms: u64,
		result: &ProviderResult<ProviderResponse>,
	) {
		let point = match result {
			Ok(response) => {
				MetricsDataPoint::success(provider, self.capability, attempt, response_time_ms)
					.with_usage(&response.usage)
			},
			Err(error) => MetricsDataPoint::failure(
				provider,
				self.capability,
				attempt,
				response_time_ms,
				error,
			),
		};
		if let Err(e) = self.metrics.append(point).await {
			warn!("Failed to record metrics for provider '{}': {}", provider, e);
		}
	}
}
