// Deterministic engine behaviour: the sampler and scheduler steps are driven
// by hand on a stand-alone handle, no threads involved.

mod common;

use common::ScriptedSource;
use simtemp::{
    AlertKind, Attribute, Config, ControlState, EngineError, EngineHandle, Mode, Readiness,
    SAMPLE_RECORD_LEN, Sample, Sampler, Scheduler, SimulatedSource, Stored,
};

fn rig(readings: impl IntoIterator<Item = i32>) -> (EngineHandle, Sampler, Scheduler) {
    let handle = EngineHandle::new(Config::default());
    let sampler = Sampler::new(&handle, Box::new(ScriptedSource::new(readings)));
    let scheduler = Scheduler::new(&handle);
    (handle, sampler, scheduler)
}

fn flags(s: &Sample) -> (bool, bool) {
    (s.low_alert, s.high_alert)
}

#[test]
fn threshold_crossings_flag_and_record() {
    let (handle, mut sampler, _) = rig([20_000, 49_000, 50_000, 4_000]);

    let s1 = sampler.tick().unwrap();
    let s2 = sampler.tick().unwrap();
    assert_eq!(flags(&s1), (false, false));
    assert_eq!(flags(&s2), (false, false));
    assert_eq!(handle.stats().alert_kind, AlertKind::None);

    let s3 = sampler.tick().unwrap();
    assert_eq!(flags(&s3), (false, true));
    assert_eq!(handle.stats().alert_kind, AlertKind::High);

    let s4 = sampler.tick().unwrap();
    assert_eq!(flags(&s4), (true, false));
    let stats = handle.stats();
    assert_eq!(stats.alert_kind, AlertKind::Low);
    assert_eq!(stats.last_error_ns, s4.timestamp_ns);

    assert!(s1.new_sample && s4.new_sample);
    assert_eq!(s4.sampling_ms, 1000);
}

#[test]
fn zero_reading_is_already_a_low_alert() {
    let (handle, mut sampler, _) = rig([0, 49_000, 50_000, 4_000]);
    let samples: Vec<_> = (0..4).map(|_| sampler.tick().unwrap()).collect();
    let got: Vec<_> = samples.iter().map(flags).collect();
    assert_eq!(
        got,
        vec![(true, false), (false, false), (false, true), (true, false)]
    );
    let stats = handle.stats();
    assert_eq!(stats.alert_kind, AlertKind::Low);
    assert_eq!(stats.last_error_ns, samples[3].timestamp_ns);
}

#[test]
fn comparisons_are_inclusive() {
    let (_, mut sampler, _) = rig([0, 5_000, 5_001, 49_999, 50_000]);
    let got: Vec<_> = (0..5).map(|_| flags(&sampler.tick().unwrap())).collect();
    assert_eq!(
        got,
        vec![
            (true, false),
            (true, false),
            (false, false),
            (false, false),
            (false, true)
        ]
    );
}

#[test]
fn one_alert_per_excursion_until_an_alert_free_expiry() {
    let (handle, mut sampler, mut scheduler) =
        rig([49_000, 50_000, 51_000, 52_000, 30_000, 55_000]);

    sampler.tick().unwrap();
    assert!(handle.poll_ready().unwrap().is_empty());

    sampler.tick().unwrap();
    assert_eq!(
        handle.poll_ready().unwrap(),
        Readiness {
            data_ready: false,
            alert: true
        }
    );

    // Still above the threshold: statistics move, no new wake.
    sampler.tick().unwrap();
    let s = sampler.tick().unwrap();
    assert!(handle.poll_ready().unwrap().is_empty());
    assert_eq!(handle.stats().last_error_ns, s.timestamp_ns);

    // Expiry while in alert raises data-ready but keeps the edge armed.
    assert_eq!(scheduler.expire(), ControlState::Idle);
    assert_eq!(
        handle.poll_ready().unwrap(),
        Readiness {
            data_ready: true,
            alert: false
        }
    );

    sampler.tick().unwrap();
    scheduler.expire();
    assert!(handle.poll_ready().unwrap().data_ready);

    sampler.tick().unwrap();
    assert!(handle.poll_ready().unwrap().alert);
}

#[test]
fn alert_free_sample_alone_does_not_rearm() {
    let (handle, mut sampler, mut scheduler) = rig([50_000, 20_000, 50_000, 20_000, 60_000]);

    sampler.tick().unwrap();
    assert!(handle.poll_ready().unwrap().alert);

    sampler.tick().unwrap();
    sampler.tick().unwrap();
    assert!(!handle.poll_ready().unwrap().alert);

    // Expiry observes an alerting latest sample: still armed.
    scheduler.expire();
    sampler.tick().unwrap();
    sampler.tick().unwrap();
    let r = handle.poll_ready().unwrap();
    assert!(r.data_ready);
    assert!(!r.alert);
}

#[test]
fn both_sources_coalesce_into_one_wake() {
    let (handle, mut sampler, mut scheduler) = rig([60_000]);
    sampler.tick().unwrap();
    scheduler.expire();
    assert_eq!(
        handle.wait_ready().unwrap(),
        Readiness {
            data_ready: true,
            alert: true
        }
    );
    assert!(handle.poll_ready().unwrap().is_empty());
}

#[test]
fn direct_reads_are_repeatable_without_side_effects() {
    let (handle, mut sampler, _) = rig([60_000]);
    sampler.tick().unwrap();
    handle.poll_ready().unwrap();
    let stats = handle.stats();

    let mut a = [0u8; SAMPLE_RECORD_LEN];
    let mut b = [0u8; SAMPLE_RECORD_LEN];
    assert_eq!(handle.read_into(&mut a).unwrap(), SAMPLE_RECORD_LEN);
    assert_eq!(handle.read_into(&mut b).unwrap(), SAMPLE_RECORD_LEN);
    assert_eq!(a, b);
    assert_eq!(Sample::from_bytes(&a).unwrap(), handle.last_sample().unwrap());

    assert_eq!(sampler.cycles(), 1);
    assert_eq!(handle.stats(), stats);
    assert!(handle.poll_ready().unwrap().is_empty());

    let mut short = [0u8; 8];
    assert!(matches!(
        handle.read_into(&mut short),
        Err(EngineError::Wire { .. })
    ));
}

#[test]
fn read_before_any_acquisition_is_empty() {
    let handle = EngineHandle::new(Config::default());
    let s = handle.last_sample().unwrap();
    assert_eq!(s.timestamp_ns, 0);
    assert!(!s.new_sample);
    assert_eq!(s.sampling_ms, 1000);
}

#[test]
fn direct_read_uses_live_thresholds() {
    let (handle, mut sampler, _) = rig([20_000]);
    sampler.tick().unwrap();
    assert!(!handle.last_sample().unwrap().high_alert);

    handle.set_high_threshold_mc(10_000).unwrap();
    assert!(handle.last_sample().unwrap().high_alert);
    assert_eq!(handle.stats().alert_kind, AlertKind::None);
}

#[test]
fn attribute_writes_round_trip() {
    let handle = EngineHandle::new(Config::default());
    assert_eq!(handle.show(Attribute::SamplingMs), "1000\n");
    assert_eq!(handle.show(Attribute::HighThresholdMc), "50000\n");
    assert_eq!(handle.show(Attribute::LowThresholdMc), "5000\n");
    assert_eq!(handle.show(Attribute::Mode), "normal\n");

    assert_eq!(
        handle.store(Attribute::SamplingMs, "250\n").unwrap(),
        Stored::Applied
    );
    assert_eq!(handle.show(Attribute::SamplingMs), "250\n");
    assert_eq!(handle.control_state(), ControlState::ReconfigureRequested);

    assert!(handle.store(Attribute::SamplingMs, "fast").is_err());
    assert!(handle.store(Attribute::SamplingMs, "0").is_err());
    assert!(handle.store(Attribute::HighThresholdMc, "-").is_err());
    assert_eq!(handle.config().sampling_ms, 250);
    assert_eq!(handle.config().high_threshold_mc, 50_000);

    assert!(handle.store(Attribute::Stats, "x").is_err());

    let stored = handle
        .store(Attribute::Mode, "a_very_long_mode_name")
        .unwrap();
    assert_eq!(stored, Stored::Truncated { dropped_bytes: 6 });
    assert_eq!(handle.show(Attribute::Mode), "a_very_long_mod\n");
}

#[test]
fn rejected_write_still_interrupts_the_scheduler() {
    let (handle, _, mut scheduler) = rig([20_000]);
    assert!(handle.store(Attribute::LowThresholdMc, "cold").is_err());
    assert_eq!(handle.control_state(), ControlState::ReconfigureRequested);

    // A pending reconfiguration suppresses the expiry step.
    assert_eq!(scheduler.expire(), ControlState::ReconfigureRequested);
    assert!(handle.poll_ready().unwrap().is_empty());
}

#[test]
fn inverted_thresholds_flag_both_sides() {
    let (handle, mut sampler, _) = rig([20_000]);
    handle.set_low_threshold_mc(30_000).unwrap();
    handle.set_high_threshold_mc(10_000).unwrap();
    let config = handle.config();
    assert_eq!(
        (config.low_threshold_mc, config.high_threshold_mc),
        (30_000, 10_000)
    );

    let s = sampler.tick().unwrap();
    assert_eq!(flags(&s), (true, true));
    assert_eq!(handle.stats().alert_kind, AlertKind::High);
}

#[test]
fn failed_hardware_read_republishes_stale_value() {
    let handle = EngineHandle::new(Config::default());
    let source = ScriptedSource::with_failures([Some(21_000), None]).holding();
    let mut sampler = Sampler::new(&handle, Box::new(source));

    let first = sampler.tick().unwrap();
    assert!(matches!(sampler.tick(), Err(EngineError::HardwareRead(_))));

    let stale = handle.last_sample().unwrap();
    assert_eq!(stale.temp_mc, 21_000);
    assert!(!stale.new_sample);
    assert!(stale.timestamp_ns >= first.timestamp_ns);
}

#[test]
fn failed_read_without_hold_skips_the_cycle() {
    let handle = EngineHandle::new(Config::default());
    let mut sampler = Sampler::new(
        &handle,
        Box::new(ScriptedSource::with_failures([Some(21_000), None])),
    );
    let first = sampler.tick().unwrap();
    assert!(sampler.tick().is_err());
    assert_eq!(handle.last_sample().unwrap(), first);
    assert_eq!(sampler.cycles(), 1);
}

#[test]
fn failure_before_first_value_publishes_nothing() {
    let handle = EngineHandle::new(Config::default());
    let source = ScriptedSource::with_failures([None]).holding();
    let mut sampler = Sampler::new(&handle, Box::new(source));
    assert!(sampler.tick().is_err());
    assert_eq!(handle.last_sample().unwrap().timestamp_ns, 0);
}

#[test]
fn seeded_runs_produce_the_same_alert_edges() {
    fn trace(seed: u64) -> Vec<(i32, bool)> {
        let handle = EngineHandle::new(Config::default());
        let mut sampler = Sampler::new(&handle, Box::new(SimulatedSource::with_seed(seed)));
        let mut scheduler = Scheduler::new(&handle);
        (0..3000)
            .map(|i| {
                let s = sampler.tick().unwrap();
                if i % 10 == 9 {
                    scheduler.expire();
                }
                (s.temp_mc, handle.poll_ready().unwrap().alert)
            })
            .collect()
    }
    let a = trace(9);
    assert_eq!(a, trace(9));
    assert!(a.iter().any(|&(_, alert)| alert));
}

#[test]
fn ramp_cycle_alert_edges_follow_expiries() {
    let handle = EngineHandle::new(Config {
        low_threshold_mc: 1_000,
        mode: Mode::Ramp,
        ..Config::default()
    });
    let mut sampler = Sampler::new(&handle, Box::new(SimulatedSource::with_seed(1)));
    let mut scheduler = Scheduler::new(&handle);

    let mut temps = Vec::new();
    let mut edges = Vec::new();
    for i in 0..200 {
        temps.push(sampler.tick().unwrap().temp_mc);
        if handle.poll_ready().unwrap().alert {
            edges.push(i);
        }
        if i % 10 == 9 {
            scheduler.expire();
        }
    }

    assert_eq!(&temps[..3], &[0, 100, 200]);
    assert_eq!(temps[49], 4_900);
    assert_eq!(temps[50], 4_900);
    assert_eq!(temps[99], 4_900 - 150 * 49);
    assert_eq!(&temps[100..200], &temps[..100]);

    // Tick 0 trips low. Expiry after tick 9 still sees an alert, after tick
    // 19 it does not, so the next edge is the descent reaching 1000 mC.
    assert_eq!(edges, vec![0, 76, 176]);
}

#[test]
fn stats_report_format() {
    let handle = EngineHandle::new(Config::default());
    assert_eq!(
        handle.stats_report(),
        "Last error: 1970-01-01 00:00:00 GMT - Type of error: None\n"
    );
    assert_eq!(handle.show(Attribute::Stats), handle.stats_report());

    let mut sampler = Sampler::new(&handle, Box::new(ScriptedSource::new([1_000])));
    sampler.tick().unwrap();
    assert!(handle.stats_report().ends_with("GMT - Type of error: Low temperature\n"));
}
