//! Deterministic ranking of successful provider results

use llmo_types::ProviderCallResult;
use std::cmp::Ordering;

/// Higher score first, then lower priority, then provider name
pub fn compare(a: &ProviderCallResult, b: &ProviderCallResult) -> Ordering {
	b.score()
		.total_cmp(&a.score())
		.then_with(|| a.priority.cmp(&b.priority))
		.then_with(|| a.provider.cmp(&b.provider))
}

/// Successful results in rank order
pub fn rank(results: &[ProviderCallResult]) -> Vec<&ProviderCallResult> {
	let mut ranked: Vec<_> = results.iter().filter(|r| r.is_success()).collect();
	ranked.sort_by(|a, b| compare(a, b));
	ranked
}

/// Highest-ranked successful result
pub fn best_match(results: &[ProviderCallResult]) -> Option<&ProviderCallResult> {
	results
		.iter()
		.filter(|r| r.is_success())
		.min_by(|a, b| compare(a, b))
}

#[cfg(test)]
mod tests {
	use super::*;
	use llmo_types::{ProviderError, ProviderPayload, QualityScore};

	fn scored(provider: &str, priority: u32, value: f64) -> ProviderCallResult {
		let mut result =
			ProviderCallResult::success(provider, priority, ProviderPayload::new(), 1);
		result.quality = Some(QualityScore {
			value,
			..QualityScore::zero()
		});
		result
	}

	#[test]
	fn test_best_match_prefers_score() {
		let results = vec![scored("a", 0, 0.6), scored("b", 1, 0.9)];
		assert_eq!(best_match(&results).unwrap().provider, "b");
	}

	#[test]
	fn test_ties_break_on_priority_then_name() {
		let results = vec![
			scored("zeta", 1, 0.8),
			scored("beta", 1, 0.8),
			scored("alpha", 2, 0.8),
		];
		let order: Vec<_> = rank(&results).iter().map(|r| r.provider.as_str()).collect();
		assert_eq!(order, vec!["beta", "zeta", "alpha"]);

		// Input order never matters
		let mut reversed = results.clone();
		reversed.reverse();
		assert_eq!(best_match(&reversed).unwrap().provider, "beta");
	}

	#[test]
	fn test_failures_are_never_ranked() {
		let results = vec![
			ProviderCallResult::failure("down", 0, ProviderError::timeout(10), 3),
			scored("up", 5, 0.1),
		];
		assert_eq!(rank(&results).len(), 1);
		assert_eq!(best_match(&results).unwrap().provider, "up");
		assert!(best_match(&results[..1]).is_none());
	}
}
