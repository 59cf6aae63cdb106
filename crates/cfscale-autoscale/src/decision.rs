//! Decision engine — the next instance count for one application.

use thiserror::Error;

use cfscale_core::{AppSnapshot, Rule, RuleKey, RuleSet};

/// Why an application was left alone this tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error("no applicable rule for {0}")]
    NoRule(RuleKey),

    #[error("number of instances {desired} outside of min/max bounds [{min}, {max}]")]
    OutOfBounds { desired: u32, min: u32, max: u32 },

    #[error("number of running instances differs from desired: {running}/{desired}")]
    Converging { running: u32, desired: u32 },
}

/// Look up the rule for `app` and compute its desired instance count.
pub fn decide(app: &AppSnapshot, rules: &RuleSet) -> Result<u32, DecisionError> {
    let key = app.key();
    match rules.get(&key) {
        Some(rule) => evaluate(app, rule),
        None => Err(DecisionError::NoRule(key)),
    }
}

/// Compute the desired instance count of `app` under `rule`.
///
/// The result is never more than one instance away from the current
/// count and always stays within the rule's bounds.
pub fn evaluate(app: &AppSnapshot, rule: &Rule) -> Result<u32, DecisionError> {
    let current = app.desired_instances;
    let bounds = rule.instances;

    if current < bounds.min || current > bounds.max {
        return Err(DecisionError::OutOfBounds {
            desired: current,
            min: bounds.min,
            max: bounds.max,
        });
    }

    // A partially scaled app's averages are not representative.
    if current != app.running_instances {
        return Err(DecisionError::Converging {
            running: app.running_instances,
            desired: current,
        });
    }

    let scale_out = rule.cpu.wants_scale_out(app.cpu_pct) || rule.mem.wants_scale_out(app.mem_pct);
    if current < bounds.max && scale_out {
        return Ok(current + 1);
    }

    let scale_in = rule.cpu.allows_scale_in(app.cpu_pct) && rule.mem.allows_scale_in(app.mem_pct);
    if current > bounds.min && scale_in {
        return Ok(current - 1);
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfscale_core::RuleConfig;

    fn rules(configs: &[RuleConfig]) -> RuleSet {
        RuleSet::validate(configs).unwrap()
    }

    fn rule(scale_in_cpu: i64, scale_out_cpu: i64, scale_in_mem: i64, scale_out_mem: i64) -> RuleConfig {
        RuleConfig {
            app: "a".to_string(),
            space: "s".to_string(),
            org: "o".to_string(),
            min_instances: 5,
            max_instances: 10,
            scale_in_cpu,
            scale_out_cpu,
            scale_in_mem,
            scale_out_mem,
        }
    }

    fn app(instances: u32, cpu_pct: u32, mem_pct: u32) -> AppSnapshot {
        AppSnapshot {
            id: "01234567-89ab-cdef-0123-456789abcdef".to_string(),
            name: "a".to_string(),
            space: "s".to_string(),
            org: "o".to_string(),
            desired_instances: instances,
            running_instances: instances,
            cpu_pct,
            mem_pct,
        }
    }

    /// Expected outcome per (instances, cpu, mem) row; `None` means no change
    /// or an error, i.e. no scale request.
    fn check(set: &RuleSet, cases: &[(u32, u32, u32, Option<u32>)]) {
        for &(instances, cpu, mem, expected) in cases {
            let snap = app(instances, cpu, mem);
            let scaled = match decide(&snap, set) {
                Ok(desired) if desired != instances => Some(desired),
                _ => None,
            };
            assert_eq!(scaled, expected, "instances={instances} cpu={cpu} mem={mem}");
        }
    }

    #[test]
    fn no_rule_for_app() {
        let set = rules(&[rule(40, 60, 50, 70)]);
        let mut snap = app(7, 0, 0);
        snap.name = "x".to_string();
        assert_eq!(
            decide(&snap, &set),
            Err(DecisionError::NoRule(RuleKey::new("x", "s", "o")))
        );
    }

    #[test]
    fn out_of_bounds_is_rejected_regardless_of_load() {
        let set = rules(&[rule(40, 60, 50, 70)]);
        for (instances, cpu) in [(4, 100), (11, 0), (4, 0), (11, 100)] {
            assert_eq!(
                decide(&app(instances, cpu, cpu), &set),
                Err(DecisionError::OutOfBounds { desired: instances, min: 5, max: 10 })
            );
        }
    }

    #[test]
    fn converging_app_is_rejected_regardless_of_load() {
        let set = rules(&[rule(40, 60, 50, 70)]);
        for (cpu, mem) in [(0, 0), (100, 100), (50, 60)] {
            let mut snap = app(7, cpu, mem);
            snap.running_instances = 6;
            assert_eq!(
                decide(&snap, &set),
                Err(DecisionError::Converging { running: 6, desired: 7 })
            );
        }

        // No valid samples at all.
        let mut snap = app(7, 0, 0);
        snap.running_instances = 0;
        assert!(matches!(decide(&snap, &set), Err(DecisionError::Converging { .. })));
    }

    #[test]
    fn cpu_and_mem_rule() {
        let set = rules(&[rule(40, 60, 50, 70)]);
        check(
            &set,
            &[
                // low load
                (11, 0, 0, None),
                (10, 0, 0, Some(9)),
                (9, 0, 0, Some(8)),
                (6, 0, 0, Some(5)),
                (5, 0, 0, None),
                (4, 0, 0, None),
                // high load
                (11, 100, 100, None),
                (10, 100, 100, None),
                (9, 100, 100, Some(10)),
                (6, 100, 100, Some(7)),
                (5, 100, 100, Some(6)),
                // cpu high, mem low
                (10, 100, 0, None),
                (9, 100, 0, Some(10)),
                (5, 100, 0, Some(6)),
                // cpu low, mem high
                (10, 0, 100, None),
                (9, 0, 100, Some(10)),
                (5, 0, 100, Some(6)),
                // cpu ok, mem low: scale-in needs both low
                (10, 50, 0, None),
                (6, 50, 0, None),
                // cpu low, mem ok
                (10, 0, 60, None),
                (6, 0, 60, None),
                // both ok
                (9, 50, 60, None),
                (6, 50, 60, None),
                // cpu ok, mem high
                (9, 50, 100, Some(10)),
                (5, 50, 100, Some(6)),
                // cpu high, mem ok
                (9, 100, 60, Some(10)),
                (5, 100, 60, Some(6)),
            ],
        );
    }

    #[test]
    fn cpu_only_rule_ignores_memory() {
        let set = rules(&[rule(40, 60, 0, 0)]);
        check(
            &set,
            &[
                (10, 0, 0, Some(9)),
                (9, 100, 0, Some(10)),
                // memory is not monitored: high memory neither scales out
                // nor blocks scale-in
                (10, 0, 100, Some(9)),
                (6, 0, 100, Some(5)),
                (5, 0, 100, None),
                (10, 0, 60, Some(9)),
                (9, 50, 100, None),
                (9, 100, 60, Some(10)),
            ],
        );
    }

    #[test]
    fn mem_only_rule_ignores_cpu() {
        let set = rules(&[rule(0, 0, 50, 70)]);
        check(
            &set,
            &[
                (10, 0, 0, Some(9)),
                (10, 100, 0, Some(9)),
                (6, 100, 0, Some(5)),
                (5, 100, 0, None),
                (9, 0, 100, Some(10)),
                (10, 50, 0, Some(9)),
                (9, 0, 60, None),
                (9, 100, 60, None),
            ],
        );
    }

    #[test]
    fn rules_for_different_apps() {
        let mut b = rule(30, 50, 0, 0);
        b.app = "b".to_string();
        b.min_instances = 15;
        b.max_instances = 20;
        let set = rules(&[rule(50, 70, 0, 0), b]);

        assert_eq!(decide(&app(7, 0, 0), &set), Ok(6));
        assert!(decide(&app(17, 0, 0), &set).is_err());
        assert_eq!(decide(&app(7, 60, 0), &set), Ok(7));

        let mut snap = app(17, 0, 0);
        snap.name = "b".to_string();
        assert_eq!(decide(&snap, &set), Ok(16));
        snap.cpu_pct = 40;
        assert_eq!(decide(&snap, &set), Ok(17));
    }

    #[test]
    fn scale_out_on_cpu_alone() {
        let set = rules(&[rule(0, 60, 0, 70)]);
        assert_eq!(decide(&app(9, 70, 0), &set), Ok(10));
    }

    #[test]
    fn scale_in_when_both_low() {
        let set = rules(&[rule(0, 60, 0, 70)]);
        assert_eq!(decide(&app(6, 0, 0), &set), Ok(5));
    }

    #[test]
    fn no_scale_out_beyond_max() {
        let set = rules(&[rule(0, 60, 0, 70)]);
        assert_eq!(decide(&app(10, 70, 80), &set), Ok(10));
    }

    #[test]
    fn memory_disabled_rule_scales_in_on_cpu() {
        let set = rules(&[rule(0, 60, 0, 0)]);
        assert_eq!(decide(&app(6, 0, 100), &set), Ok(5));
    }

    #[test]
    fn never_moves_more_than_one_instance() {
        let set = rules(&[rule(40, 60, 50, 70)]);
        for instances in 5..=10 {
            for cpu in (0..=100).step_by(10) {
                for mem in (0..=100).step_by(10) {
                    let desired = decide(&app(instances, cpu, mem), &set).unwrap();
                    assert!(desired.abs_diff(instances) <= 1);
                    assert!((5..=10).contains(&desired));
                }
            }
        }
    }
}
