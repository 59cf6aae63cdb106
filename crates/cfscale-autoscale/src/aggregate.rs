//! Utilization aggregation — raw instance samples to app percentages.
//!
//! Samples that violate basic physical bounds are skipped rather than
//! treated as errors. The application is then reported with fewer
//! running instances than desired, which the decision engine refuses to
//! act on until the telemetry recovers.

use std::collections::HashMap;

use tracing::debug;

use cfscale_core::{AppMeta, AppSnapshot, InstanceId, InstanceSample, InstanceState};

/// Aggregated utilization of one application's trustworthy instances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Utilization {
    /// Instances that contributed to the averages.
    pub running: u32,
    /// Average CPU utilization, 0–100.
    pub cpu_pct: u32,
    /// Average memory utilization, 0–100.
    pub mem_pct: u32,
}

/// Whether a sample can be used for averaging.
fn is_trustworthy(sample: &InstanceSample) -> bool {
    sample.state == InstanceState::Running
        && (0.0..=1.0).contains(&sample.cpu)
        && sample.mem_quota_bytes > 0
        && sample.mem_bytes >= 0
        && sample.mem_bytes <= sample.mem_quota_bytes
}

/// Average the trustworthy samples into whole percentages.
///
/// Rounds half up; all inputs are non-negative after filtering, so
/// adding 0.5 and truncating is exact enough.
pub fn aggregate<'a, I>(samples: I) -> Utilization
where
    I: IntoIterator<Item = (&'a InstanceId, &'a InstanceSample)>,
{
    let mut running = 0u32;
    let mut cpu = 0.0f64;
    let mut mem = 0.0f64;

    for (id, sample) in samples {
        if !is_trustworthy(sample) {
            debug!(instance = %id, ?sample, "skipping untrustworthy instance sample");
            continue;
        }
        running += 1;
        cpu += sample.cpu;
        mem += sample.mem_bytes as f64 / sample.mem_quota_bytes as f64;
    }

    if running == 0 {
        return Utilization::default();
    }

    let n = f64::from(running);
    Utilization {
        running,
        cpu_pct: (cpu / n * 100.0 + 0.5) as u32,
        mem_pct: (mem / n * 100.0 + 0.5) as u32,
    }
}

/// Build the per-tick snapshot of an application.
///
/// `samples` is `None` for applications that are not started; those are
/// reported with no running instances and zero utilization. The desired
/// instance count is always the platform's configured count.
pub fn build_snapshot(
    meta: AppMeta,
    samples: Option<&HashMap<InstanceId, InstanceSample>>,
) -> AppSnapshot {
    let util = samples.map(|s| aggregate(s)).unwrap_or_default();

    AppSnapshot {
        id: meta.id,
        name: meta.name,
        space: meta.space,
        org: meta.org,
        desired_instances: meta.instances,
        running_instances: util.running,
        cpu_pct: util.cpu_pct,
        mem_pct: util.mem_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTA: i64 = 1000;

    fn running(cpu: f64, mem_fraction: f64) -> InstanceSample {
        InstanceSample {
            state: InstanceState::Running,
            cpu,
            mem_bytes: (mem_fraction * QUOTA as f64) as i64,
            mem_quota_bytes: QUOTA,
        }
    }

    fn samples(list: &[InstanceSample]) -> HashMap<InstanceId, InstanceSample> {
        list.iter()
            .enumerate()
            .map(|(i, s)| (i.to_string(), *s))
            .collect()
    }

    fn meta(instances: u32) -> AppMeta {
        AppMeta {
            id: "guid-1".to_string(),
            name: "a".to_string(),
            space: "s".to_string(),
            org: "o".to_string(),
            instances,
        }
    }

    #[test]
    fn single_instance() {
        let s = samples(&[running(0.5, 0.75)]);
        let util = aggregate(&s);
        assert_eq!(util, Utilization { running: 1, cpu_pct: 50, mem_pct: 75 });
    }

    #[test]
    fn averages_across_instances() {
        let s = samples(&[running(0.5, 0.8), running(0.3, 0.6)]);
        let util = aggregate(&s);
        assert_eq!(util, Utilization { running: 2, cpu_pct: 40, mem_pct: 70 });
    }

    #[test]
    fn rounds_half_up() {
        // Average CPU 0.495 → 49.5% → 50.
        let s = samples(&[running(0.49, 0.495), running(0.5, 0.495)]);
        let util = aggregate(&s);
        assert_eq!(util.cpu_pct, 50);
        assert_eq!(util.mem_pct, 50);

        let s = samples(&[running(0.494, 0.0)]);
        assert_eq!(aggregate(&s).cpu_pct, 49);
    }

    #[test]
    fn skips_instances_not_running() {
        let mut down = running(0.9, 0.9);
        down.state = InstanceState::Down;
        let mut crashed = running(0.9, 0.9);
        crashed.state = InstanceState::Crashed;

        let s = samples(&[running(0.5, 0.8), down, crashed]);
        let util = aggregate(&s);
        assert_eq!(util, Utilization { running: 1, cpu_pct: 50, mem_pct: 80 });
    }

    #[test]
    fn skips_cpu_outside_unit_range() {
        let s = samples(&[running(-0.1, 0.5), running(1.5, 0.5), running(1.0, 0.5)]);
        let util = aggregate(&s);
        assert_eq!(util.running, 1);
        assert_eq!(util.cpu_pct, 100);
    }

    #[test]
    fn skips_nan_cpu() {
        let s = samples(&[running(f64::NAN, 0.5), running(0.2, 0.5)]);
        let util = aggregate(&s);
        assert_eq!(util.running, 1);
        assert_eq!(util.cpu_pct, 20);
    }

    #[test]
    fn skips_memory_outside_quota() {
        let negative = InstanceSample {
            mem_bytes: -1,
            ..running(0.5, 0.0)
        };
        let over = InstanceSample {
            mem_bytes: QUOTA + 1,
            ..running(0.5, 0.0)
        };
        let at_quota = InstanceSample {
            mem_bytes: QUOTA,
            ..running(0.5, 0.0)
        };
        let s = samples(&[negative, over, at_quota]);
        let util = aggregate(&s);
        assert_eq!(util, Utilization { running: 1, cpu_pct: 50, mem_pct: 100 });
    }

    #[test]
    fn skips_zero_quota() {
        let no_stats = InstanceSample {
            state: InstanceState::Running,
            cpu: 0.0,
            mem_bytes: 0,
            mem_quota_bytes: 0,
        };
        let s = samples(&[no_stats, running(0.5, 0.8)]);
        let util = aggregate(&s);
        assert_eq!(util, Utilization { running: 1, cpu_pct: 50, mem_pct: 80 });
    }

    #[test]
    fn no_trustworthy_samples_reports_zero() {
        let s = samples(&[running(2.0, 0.5)]);
        assert_eq!(aggregate(&s), Utilization::default());
        assert_eq!(
            aggregate(&HashMap::<InstanceId, InstanceSample>::new()),
            Utilization::default()
        );
    }

    #[test]
    fn snapshot_keeps_desired_count_when_samples_missing() {
        let s = samples(&[running(0.5, 0.8), InstanceSample { state: InstanceState::Down, ..running(0.0, 0.0) }]);
        let snap = build_snapshot(meta(2), Some(&s));
        assert_eq!(snap.desired_instances, 2);
        assert_eq!(snap.running_instances, 1);
        assert_eq!(snap.cpu_pct, 50);
        assert_eq!(snap.mem_pct, 80);
    }

    #[test]
    fn stopped_app_has_no_running_instances() {
        let snap = build_snapshot(meta(4), None);
        assert_eq!(snap.id, "guid-1");
        assert_eq!(snap.desired_instances, 4);
        assert_eq!(snap.running_instances, 0);
        assert_eq!(snap.cpu_pct, 0);
        assert_eq!(snap.mem_pct, 0);
    }
}
