//! Health scoring. Pure: no clock, no I/O.

use super::models::{CheckResult, CheckStatus, OverallStatus};

pub const MAX_SCORE: i32 = 100;
pub const DEFAULT_CRITICAL_FLOOR: u8 = 50;

const CRITICAL_DOWN_PENALTY: i32 = 30;
const DOWN_PENALTY: i32 = 10;
const WARNING_PENALTY: i32 = 10;
const DEGRADED_PENALTY: i32 = 5;
const RATE_LIMITED_PENALTY: i32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthScore {
    pub score: u8,
    pub status: OverallStatus,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct HealthScorer {
    critical_floor: u8,
}

impl Default for HealthScorer {
    fn default() -> Self {
        Self::new(DEFAULT_CRITICAL_FLOOR)
    }
}

impl HealthScorer {
    pub fn new(critical_floor: u8) -> Self {
        Self { critical_floor }
    }

    pub fn penalty(result: &CheckResult) -> i32 {
        match result.status {
            CheckStatus::Down if result.critical => CRITICAL_DOWN_PENALTY,
            CheckStatus::Down => DOWN_PENALTY,
            CheckStatus::Warning => WARNING_PENALTY,
            CheckStatus::Degraded => DEGRADED_PENALTY,
            CheckStatus::RateLimited => RATE_LIMITED_PENALTY,
            CheckStatus::Healthy | CheckStatus::Skipped => 0,
        }
    }

    pub fn score(&self, results: &[CheckResult]) -> HealthScore {
        let total = results
            .iter()
            .fold(MAX_SCORE, |acc, r| acc.saturating_sub(Self::penalty(r)));
        let score = total.clamp(0, MAX_SCORE) as u8;

        let critical_down = results
            .iter()
            .any(|r| r.critical && r.status == CheckStatus::Down);
        let any_degraded = results
            .iter()
            .any(|r| matches!(r.status, CheckStatus::Down | CheckStatus::Degraded));
        let any_warning = results
            .iter()
            .any(|r| matches!(r.status, CheckStatus::Warning | CheckStatus::RateLimited));

        let status = if critical_down || score < self.critical_floor {
            OverallStatus::Critical
        } else if any_degraded {
            OverallStatus::Degraded
        } else if any_warning {
            OverallStatus::Warning
        } else {
            OverallStatus::Healthy
        };

        let issues = results.iter().filter_map(describe_issue).collect();

        HealthScore {
            score,
            status,
            issues,
        }
    }
}

fn describe_issue(result: &CheckResult) -> Option<String> {
    let name = &result.name;
    let issue = match result.status {
        CheckStatus::Healthy => return None,
        CheckStatus::Down => format!("{} is down", name),
        CheckStatus::Degraded => format!("{} is degraded", name),
        CheckStatus::RateLimited => format!("{} rate limited", name),
        CheckStatus::Warning => match &result.error {
            Some(msg) => format!("{}: {}", name, msg),
            None => format!("{} reported a warning", name),
        },
        CheckStatus::Skipped => match &result.error {
            Some(reason) => format!("{} skipped: {}", name, reason),
            None => format!("{} skipped", name),
        },
    };
    Some(issue)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, status: CheckStatus, critical: bool) -> CheckResult {
        CheckResult {
            name: name.to_string(),
            status,
            critical,
            response_time_ms: 10,
            error: None,
            data: None,
        }
    }

    const ALL: [CheckStatus; 6] = [
        CheckStatus::Healthy,
        CheckStatus::Degraded,
        CheckStatus::Down,
        CheckStatus::Warning,
        CheckStatus::RateLimited,
        CheckStatus::Skipped,
    ];

    #[test]
    fn all_healthy_scores_full() {
        let results = vec![
            result("a", CheckStatus::Healthy, true),
            result("b", CheckStatus::Healthy, false),
        ];
        let score = HealthScorer::default().score(&results);
        assert_eq!(score.score, 100);
        assert_eq!(score.status, OverallStatus::Healthy);
        assert!(score.issues.is_empty());
    }

    #[test]
    fn one_critical_down_one_degraded() {
        let results = vec![
            result("Discord Bot", CheckStatus::Down, true),
            result("Telegram Bot", CheckStatus::Degraded, true),
            result("Twitter Bot", CheckStatus::Healthy, true),
            result("Analytics", CheckStatus::Healthy, false),
            result("Website", CheckStatus::Healthy, true),
        ];
        let score = HealthScorer::default().score(&results);
        assert_eq!(score.score, 65);
        assert_eq!(score.status, OverallStatus::Critical);
        assert_eq!(
            score.issues,
            vec![
                "Discord Bot is down".to_string(),
                "Telegram Bot is degraded".to_string()
            ]
        );
    }

    #[test]
    fn score_clamps_at_zero() {
        let results: Vec<_> = (0..10)
            .map(|i| result(&format!("svc{}", i), CheckStatus::Down, true))
            .collect();
        let score = HealthScorer::default().score(&results);
        assert_eq!(score.score, 0);
        assert_eq!(score.status, OverallStatus::Critical);
        assert_eq!(score.issues.len(), 10);
    }

    #[test]
    fn score_below_floor_is_critical_without_critical_probe() {
        // 6 non-critical downs: 100 - 60 = 40 < 50
        let results: Vec<_> = (0..6)
            .map(|i| result(&format!("svc{}", i), CheckStatus::Down, false))
            .collect();
        let score = HealthScorer::default().score(&results);
        assert_eq!(score.score, 40);
        assert_eq!(score.status, OverallStatus::Critical);
    }

    #[test]
    fn degraded_outranks_warning() {
        let results = vec![
            result("api", CheckStatus::RateLimited, false),
            result("web", CheckStatus::Degraded, false),
        ];
        let score = HealthScorer::default().score(&results);
        assert_eq!(score.score, 92);
        assert_eq!(score.status, OverallStatus::Degraded);
        assert_eq!(score.issues[0], "api rate limited");
    }

    #[test]
    fn warning_only() {
        let results = vec![CheckResult::warning("chain", "Low gas balance".into(), 5)];
        let score = HealthScorer::default().score(&results);
        assert_eq!(score.score, 90);
        assert_eq!(score.status, OverallStatus::Warning);
        assert_eq!(score.issues, vec!["chain: Low gas balance".to_string()]);
    }

    #[test]
    fn skipped_costs_nothing_but_is_listed() {
        let results = vec![CheckResult::skipped("chain", "RPC URL not configured".into())];
        let score = HealthScorer::default().score(&results);
        assert_eq!(score.score, 100);
        assert_eq!(score.status, OverallStatus::Healthy);
        assert_eq!(score.issues, vec!["chain skipped: RPC URL not configured"]);
    }

    #[test]
    fn score_always_in_range_and_critical_down_dominates() {
        let scorer = HealthScorer::default();
        // every combination of status x criticality for three probes
        let variants: Vec<(CheckStatus, bool)> = ALL
            .iter()
            .flat_map(|s| [(*s, true), (*s, false)])
            .collect();
        for a in &variants {
            for b in &variants {
                for c in &variants {
                    let results = vec![
                        result("a", a.0, a.1),
                        result("b", b.0, b.1),
                        result("c", c.0, c.1),
                    ];
                    let score = scorer.score(&results);
                    assert!(score.score <= 100);
                    if results
                        .iter()
                        .any(|r| r.critical && r.status == CheckStatus::Down)
                    {
                        assert_eq!(score.status, OverallStatus::Critical);
                    }
                }
            }
        }
    }

    #[test]
    fn worse_results_never_raise_the_score() {
        let scorer = HealthScorer::default();
        let mut results: Vec<_> = (0..8)
            .map(|i| result(&format!("svc{}", i), CheckStatus::Healthy, i % 2 == 0))
            .collect();
        let mut previous = scorer.score(&results).score;
        let worsening = [
            CheckStatus::RateLimited,
            CheckStatus::Degraded,
            CheckStatus::Warning,
            CheckStatus::Down,
        ];
        for i in 0..results.len() {
            for status in worsening {
                results[i].status = status;
                let current = scorer.score(&results).score;
                assert!(current <= previous, "{} > {}", current, previous);
                previous = current;
            }
        }
        assert_eq!(previous, 0);
    }
}
