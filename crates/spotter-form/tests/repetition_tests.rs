use spotter_form::repetition::{transition, Effect, Signal};
use spotter_form::{FaultKind, RepMachine, RepOutcome, RepSample, RepState, Topology};
use std::collections::BTreeSet;

fn bicep() -> Topology {
    Topology::TwoPhase {
        start: RepState::Down,
        up_below: 80.0,
        down_above: 140.0,
        min_rep_interval_ms: 500,
    }
}

fn squat() -> Topology {
    Topology::FourPhase {
        top: 150.0,
        bottom: 140.0,
        min_dwell_ms: 300,
        min_excursion: 30.0,
    }
}

fn step(machine: &mut RepMachine, angle: f32, now_ms: u64) -> Option<RepOutcome> {
    let none = BTreeSet::new();
    machine.step(
        RepSample {
            angle,
            instability: 0.0,
            faults: &none,
        },
        now_ms,
    )
}

fn step_with(
    machine: &mut RepMachine,
    angle: f32,
    fault: FaultKind,
    now_ms: u64,
) -> Option<RepOutcome> {
    let faults = BTreeSet::from([fault]);
    machine.step(
        RepSample {
            angle,
            instability: 50.0,
            faults: &faults,
        },
        now_ms,
    )
}

fn count(outcomes: &[Option<RepOutcome>]) -> usize {
    outcomes
        .iter()
        .filter(|o| matches!(o, Some(RepOutcome::Counted(_))))
        .count()
}

#[test]
fn test_curl_sequence_counts_one() {
    let mut machine = RepMachine::new(bicep());
    let angles = [170.0, 170.0, 170.0, 60.0, 60.0, 60.0, 170.0, 170.0, 170.0];
    let outcomes: Vec<_> = angles
        .iter()
        .enumerate()
        .map(|(i, a)| step(&mut machine, *a, i as u64 * 100))
        .collect();
    assert_eq!(count(&outcomes), 1);
    assert!(matches!(outcomes[6], Some(RepOutcome::Counted(_))));
    assert_eq!(machine.state(), RepState::Down);

    // the same tail again adds nothing
    for i in 0..3 {
        assert_eq!(step(&mut machine, 170.0, 1000 + i * 100), None);
    }
}

#[test]
fn test_two_phase_counts_on_return_only() {
    let mut machine = RepMachine::new(bicep());
    assert_eq!(step(&mut machine, 60.0, 0), None);
    assert_eq!(machine.state(), RepState::Up);
    assert_eq!(step(&mut machine, 60.0, 100), None);
    assert!(matches!(step(&mut machine, 150.0, 200), Some(RepOutcome::Counted(_))));
}

#[test]
fn test_two_phase_rep_too_soon() {
    let mut machine = RepMachine::new(bicep());
    step(&mut machine, 60.0, 0);
    assert!(matches!(step(&mut machine, 170.0, 100), Some(RepOutcome::Counted(_))));
    step(&mut machine, 60.0, 200);
    assert_eq!(step(&mut machine, 170.0, 300), Some(RepOutcome::TooSoon));
    assert_eq!(machine.state(), RepState::Down);

    step(&mut machine, 60.0, 500);
    assert!(matches!(step(&mut machine, 170.0, 700), Some(RepOutcome::Counted(_))));
}

#[test]
fn test_two_phase_starting_up() {
    let topology = Topology::TwoPhase {
        start: RepState::Up,
        up_below: 100.0,
        down_above: 130.0,
        min_rep_interval_ms: 500,
    };
    let mut machine = RepMachine::new(topology);
    assert_eq!(machine.state(), RepState::Up);
    assert_eq!(step(&mut machine, 90.0, 0), None);
    assert!(matches!(step(&mut machine, 160.0, 100), Some(RepOutcome::Counted(_))));
    assert_eq!(step(&mut machine, 90.0, 700), None);
    assert_eq!(machine.state(), RepState::Up);
}

#[test]
fn test_four_phase_full_cycle() {
    let mut machine = RepMachine::new(squat());
    assert_eq!(step(&mut machine, 170.0, 0), None);
    assert_eq!(step(&mut machine, 120.0, 300), None);
    assert_eq!(machine.state(), RepState::GoingDown);
    assert_eq!(step(&mut machine, 90.0, 600), None);
    assert_eq!(machine.state(), RepState::Down);
    assert_eq!(step(&mut machine, 145.0, 900), None);
    assert_eq!(machine.state(), RepState::GoingUp);
    match step(&mut machine, 170.0, 1200) {
        Some(RepOutcome::Counted(rep)) => {
            assert_eq!(rep.min_angle, 90.0);
            assert_eq!(rep.max_angle, 170.0);
            assert_eq!(rep.started_ms, 300);
            assert_eq!(rep.finished_ms, 1200);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(machine.state(), RepState::Up);
    assert!(machine.accumulator().is_none());
}

#[test]
fn test_four_phase_shallow_cycle_rejected() {
    let mut machine = RepMachine::new(squat());
    step(&mut machine, 160.0, 0);
    step(&mut machine, 145.0, 300);
    step(&mut machine, 135.0, 600);
    step(&mut machine, 145.0, 900);
    match step(&mut machine, 155.0, 1200) {
        Some(RepOutcome::TooShallow(rep)) => assert_eq!(rep.excursion(), 20.0),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(machine.state(), RepState::Up);
}

#[test]
fn test_dwell_blocks_fast_oscillation() {
    let mut machine = RepMachine::new(squat());
    step(&mut machine, 170.0, 0);
    step(&mut machine, 120.0, 300);
    assert_eq!(machine.state(), RepState::GoingDown);

    // crosses the bottom threshold every 50 ms, faster than the 300 ms dwell
    for i in 0..5 {
        let angle = if i % 2 == 0 { 90.0 } else { 160.0 };
        assert_eq!(step(&mut machine, angle, 350 + i * 50), None);
        assert_eq!(machine.state(), RepState::GoingDown);
    }
}

#[test]
fn test_dwell_applies_from_first_frame() {
    let mut machine = RepMachine::new(squat());
    assert_eq!(step(&mut machine, 120.0, 1000), None);
    assert_eq!(machine.state(), RepState::Up);
    step(&mut machine, 120.0, 1300);
    assert_eq!(machine.state(), RepState::GoingDown);
}

#[test]
fn test_faults_gathered_over_cycle() {
    let mut machine = RepMachine::new(squat());
    // before the descent: not part of the rep
    step_with(&mut machine, 170.0, FaultKind::TooDeep, 0);
    step(&mut machine, 120.0, 300);
    step_with(&mut machine, 90.0, FaultKind::KneeCaving, 600);
    step(&mut machine, 145.0, 900);
    match step(&mut machine, 170.0, 1200) {
        Some(RepOutcome::Counted(rep)) => {
            assert_eq!(rep.faults, BTreeSet::from([FaultKind::KneeCaving]));
            assert_eq!(rep.peak_instability, 50.0);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_reset_discards_rep_in_progress() {
    let mut machine = RepMachine::new(squat());
    step(&mut machine, 170.0, 0);
    step(&mut machine, 120.0, 300);
    step(&mut machine, 90.0, 600);
    assert!(machine.accumulator().is_some());

    machine.reset();
    assert_eq!(machine.state(), RepState::Up);
    assert!(machine.accumulator().is_none());

    // climbing back up after a reset is not a rep
    assert_eq!(step(&mut machine, 145.0, 900), None);
    assert_eq!(step(&mut machine, 170.0, 1200), None);
}

#[test]
fn test_sequence_survives_reset() {
    let mut machine = RepMachine::new(bicep());
    step(&mut machine, 60.0, 0);
    let first = match step(&mut machine, 170.0, 100) {
        Some(RepOutcome::Counted(rep)) => rep.sequence,
        other => panic!("unexpected outcome: {other:?}"),
    };
    machine.reset();
    step(&mut machine, 60.0, 200);
    let second = match step(&mut machine, 170.0, 300) {
        Some(RepOutcome::Counted(rep)) => rep.sequence,
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert!(second > first);
}

#[test]
fn test_transition_function() {
    let idle = Signal {
        angle: 120.0,
        in_state_ms: 1000,
        since_last_rep_ms: None,
    };
    assert_eq!(
        transition(&squat(), RepState::Up, &idle),
        Some((RepState::GoingDown, Effect::BeginCycle))
    );
    assert_eq!(transition(&squat(), RepState::GoingUp, &idle), None);

    let early = Signal {
        angle: 170.0,
        in_state_ms: 0,
        since_last_rep_ms: Some(100),
    };
    assert_eq!(
        transition(&bicep(), RepState::Up, &early),
        Some((RepState::Down, Effect::Bounce))
    );
    assert_eq!(
        transition(&squat(), RepState::GoingUp, &early),
        None
    );
}
