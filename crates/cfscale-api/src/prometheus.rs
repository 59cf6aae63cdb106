//! Prometheus text exposition format.
//!
//! Renders the autoscaler counters for scraping by a Prometheus server
//! or compatible agent.

use cfscale_autoscale::StatsSnapshot;

/// Render the loop counters and rule count into Prometheus text format.
pub fn render_prometheus(stats: &StatsSnapshot, rules: usize) -> String {
    let mut out = String::new();

    out.push_str("# HELP cfscale_rules Number of loaded scaling rules.\n");
    out.push_str("# TYPE cfscale_rules gauge\n");
    out.push_str(&format!("cfscale_rules {rules}\n"));

    out.push_str("# HELP cfscale_ticks_total Autoscaler iterations by result.\n");
    out.push_str("# TYPE cfscale_ticks_total counter\n");
    out.push_str(&format!(
        "cfscale_ticks_total{{result=\"completed\"}} {}\n",
        stats.ticks_completed
    ));
    out.push_str(&format!(
        "cfscale_ticks_total{{result=\"skipped\"}} {}\n",
        stats.ticks_skipped
    ));

    out.push_str("# HELP cfscale_apps_evaluated_total Applications evaluated.\n");
    out.push_str("# TYPE cfscale_apps_evaluated_total counter\n");
    out.push_str(&format!("cfscale_apps_evaluated_total {}\n", stats.apps_evaluated));

    out.push_str("# HELP cfscale_scale_actions_total Accepted scale requests by direction.\n");
    out.push_str("# TYPE cfscale_scale_actions_total counter\n");
    out.push_str(&format!(
        "cfscale_scale_actions_total{{direction=\"up\"}} {}\n",
        stats.scale_ups
    ));
    out.push_str(&format!(
        "cfscale_scale_actions_total{{direction=\"down\"}} {}\n",
        stats.scale_downs
    ));

    out.push_str("# HELP cfscale_app_errors_total Applications skipped by reason.\n");
    out.push_str("# TYPE cfscale_app_errors_total counter\n");
    out.push_str(&format!(
        "cfscale_app_errors_total{{reason=\"decision\"}} {}\n",
        stats.decision_errors
    ));
    out.push_str(&format!(
        "cfscale_app_errors_total{{reason=\"scale\"}} {}\n",
        stats.scale_failures
    ));
    out.push_str(&format!(
        "cfscale_app_errors_total{{reason=\"invariant\"}} {}\n",
        stats.invariant_violations
    ));

    out.push_str("# HELP cfscale_last_tick_timestamp_seconds Unix time of the last completed iteration.\n");
    out.push_str("# TYPE cfscale_last_tick_timestamp_seconds gauge\n");
    out.push_str(&format!(
        "cfscale_last_tick_timestamp_seconds {}\n",
        stats.last_tick_epoch
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_counters_with_labels() {
        let stats = StatsSnapshot {
            ticks_completed: 12,
            ticks_skipped: 1,
            apps_evaluated: 36,
            scale_ups: 3,
            scale_downs: 2,
            decision_errors: 4,
            scale_failures: 1,
            invariant_violations: 0,
            last_tick_epoch: 1_700_000_000,
        };
        let output = render_prometheus(&stats, 3);

        assert!(output.contains("cfscale_rules 3"));
        assert!(output.contains("cfscale_ticks_total{result=\"completed\"} 12"));
        assert!(output.contains("cfscale_ticks_total{result=\"skipped\"} 1"));
        assert!(output.contains("cfscale_scale_actions_total{direction=\"up\"} 3"));
        assert!(output.contains("cfscale_scale_actions_total{direction=\"down\"} 2"));
        assert!(output.contains("cfscale_app_errors_total{reason=\"decision\"} 4"));
        assert!(output.contains("cfscale_last_tick_timestamp_seconds 1700000000"));
    }

    #[test]
    fn every_metric_has_help_and_type() {
        let output = render_prometheus(&StatsSnapshot::default(), 0);
        let helps = output.lines().filter(|l| l.starts_with("# HELP")).count();
        let types = output.lines().filter(|l| l.starts_with("# TYPE")).count();
        assert_eq!(helps, 6);
        assert_eq!(types, 6);
    }
}
