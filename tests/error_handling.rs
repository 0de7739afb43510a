use tomasulo_rust::errors::SimulatorError;
use tomasulo_rust::simulator::config::SimulatorConfig;
use tomasulo_rust::simulator::simulator::{Simulator, SimulatorState};

fn simulator_with(program: &str) -> Simulator {
    let mut simulator = Simulator::new(SimulatorConfig::new());
    simulator.load_program(program).expect("program parses");
    simulator
}

#[test]
fn test_parse_error_reports_line_number() {
    let mut simulator = Simulator::new(SimulatorConfig::new());
    let result = simulator.load_program("ADD R1, R0, R0\nFOO R1, R2, R3");
    match result {
        Err(SimulatorError::ParseError { line, reason }) => {
            assert_eq!(line, 2);
            assert!(reason.contains("FOO"), "reason was: {}", reason);
        },
        other => panic!("expected a parse error, got {:?}", other.err()),
    }
}

#[test]
fn test_parse_error_on_invalid_register() {
    let mut simulator = Simulator::new(SimulatorConfig::new());
    let result = simulator.load_program("ADD R32, R0, R0");
    let error = result.expect_err("R32 is out of range");
    assert!(error.to_string().contains("Invalid register"));
}

#[test]
fn test_parse_error_on_wrong_operand_count() {
    let mut simulator = Simulator::new(SimulatorConfig::new());
    assert!(simulator.load_program("ADD R1, R0").is_err());
    assert!(simulator.load_program("BEQ R1, R2").is_err());
    assert!(simulator.load_program("LW R1").is_err());
}

#[test]
fn test_parse_error_on_negative_branch_target() {
    let mut simulator = Simulator::new(SimulatorConfig::new());
    let error = simulator
        .load_program("BEQ R0, R0, -4")
        .expect_err("negative target");
    assert!(error.to_string().contains("branch target"));
}

#[test]
fn test_parse_error_on_malformed_memory_operand() {
    let mut simulator = Simulator::new(SimulatorConfig::new());
    assert!(simulator.load_program("LW R1, 0R2").is_err());
    assert!(simulator.load_program("LW R1, (R2)").is_err());
    assert!(simulator.load_program("SW R1, 4(R2").is_err());
}

#[test]
fn test_failed_load_leaves_previous_program_intact() {
    let mut simulator = simulator_with("ADD R1, R0, R0");
    assert!(simulator.load_program("BOGUS").is_err());

    // The original program is still loaded and still runs
    assert_eq!(simulator.program.len(), 1);
    let state = simulator.run_to_halt();
    assert_eq!(state, SimulatorState::Halted);
    assert_eq!(simulator.committed, 1);
}

#[test]
fn test_out_of_bounds_load_is_fatal() {
    // 1024 words of memory end at byte address 4092
    let mut simulator = simulator_with("LW R1, 8192(R0)");
    let state = simulator.run_to_halt();

    assert_eq!(state, SimulatorState::Halted);
    let error = simulator.error.as_ref().expect("fatal error recorded");
    assert!(error.to_string().contains("out of bounds"));

    let snapshot = simulator.snapshot();
    assert!(snapshot.error.is_some());

    // Terminal state: further ticks change nothing
    let cycle = simulator.cycle;
    assert_eq!(simulator.tick(), SimulatorState::Halted);
    assert_eq!(simulator.cycle, cycle);
    assert_eq!(simulator.committed, 0);
}

#[test]
fn test_out_of_bounds_store_is_fatal() {
    let mut simulator = simulator_with("SW R1, -4(R0)");
    let state = simulator.run_to_halt();
    assert_eq!(state, SimulatorState::Halted);
    assert!(simulator.error.is_some());
}

#[test]
fn test_misaligned_access_is_fatal() {
    let mut simulator = simulator_with("LW R1, 2(R0)");
    simulator.run_to_halt();
    let error = simulator.error.as_ref().expect("fatal error recorded");
    assert!(error.to_string().contains("Misaligned"));
}

#[test]
fn test_error_state_survives_until_reset() {
    let mut simulator = simulator_with("LW R1, 8192(R0)");
    simulator.run_to_halt();
    assert!(simulator.error.is_some());

    simulator.reset();
    assert!(simulator.error.is_none());
    assert_eq!(simulator.cycle, 0);
}
