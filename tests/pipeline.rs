use tomasulo_rust::simulator::config::SimulatorConfig;
use tomasulo_rust::simulator::instruction::PipelineStage;
use tomasulo_rust::simulator::reservation_station::Operand;
use tomasulo_rust::simulator::simulator::{Simulator, SimulatorState};

fn simulator_with(program: &str) -> Simulator {
    let mut simulator = Simulator::new(SimulatorConfig::new());
    simulator.load_program(program).expect("program parses");
    simulator
}

#[test]
fn test_single_add_commits_in_four_cycles() {
    // Issue in cycle 1, execute in 2-3, CDB in 3, commit in 4
    let mut simulator = simulator_with("ADD R1, R0, R0");
    let state = simulator.run_to_halt();

    assert_eq!(state, SimulatorState::Halted);
    assert_eq!(simulator.cycle, 4);
    assert_eq!(simulator.committed, 1);
    assert_eq!(simulator.stalls, 0);
    assert_eq!(simulator.mispredictions, 0);
    assert_eq!(simulator.registers.read(1), 0);
}

#[test]
fn test_raw_hazard_stalls_dependent_add_on_tag() {
    let mut simulator = simulator_with("ADD R1, R0, R0\nADD R2, R1, R1");

    // After two cycles both are issued; the second waits on the first's
    // ROB entry through both source tags
    simulator.tick();
    simulator.tick();
    let station = simulator
        .stations
        .stations
        .iter()
        .find(|s| s.busy && s.instruction.map(|i| i.index) == Some(1))
        .expect("second ADD in a station");
    assert_eq!(station.j, Operand::Waiting(0));
    assert_eq!(station.k, Operand::Waiting(0));
    assert_eq!(station.exec_remaining, None);

    let state = simulator.run_to_halt();
    assert_eq!(state, SimulatorState::Halted);
    assert_eq!(simulator.cycle, 7);
    assert_eq!(simulator.committed, 2);
    assert_eq!(simulator.registers.read(2), 0);
}

#[test]
fn test_load_then_store_moves_data_through_memory() {
    let mut simulator = simulator_with("LW R1, 0(R0)\nSW R1, 4(R0)");
    simulator.memory.write_word(0, 42).expect("preload");

    let state = simulator.run_to_halt();
    assert_eq!(state, SimulatorState::Halted);
    assert_eq!(simulator.cycle, 8);
    assert_eq!(simulator.committed, 2);
    assert_eq!(simulator.registers.read(1), 42);
    assert_eq!(simulator.memory.read_word(4).expect("in bounds"), 42);
}

#[test]
fn test_store_commits_before_same_word_load_proceeds() {
    // The load must observe the older store's value via memory, not a
    // stale word: it may not access memory until the store has committed
    let mut simulator = simulator_with("SW R1, 0(R0)\nLW R2, 0(R0)");
    simulator.registers.write(1, 5);

    let state = simulator.run_to_halt();
    assert_eq!(state, SimulatorState::Halted);
    assert_eq!(simulator.cycle, 8);
    assert_eq!(simulator.registers.read(2), 5);
    assert_eq!(simulator.memory.read_word(0).expect("in bounds"), 5);
}

#[test]
fn test_taken_branch_mispredicts_and_flushes_wrong_path() {
    // Target 12 is a multiple of 4: instruction index 3, one past the end
    let mut simulator = simulator_with("BEQ R0, R0, 12\nADD R1, R0, R0\nADD R2, R0, R0");
    let state = simulator.run_to_halt();

    assert_eq!(state, SimulatorState::Halted);
    assert_eq!(simulator.cycle, 3);
    assert_eq!(simulator.mispredictions, 1);
    // Only the branch commits; the wrong-path ADD was flushed and the
    // second ADD was never fetched
    assert_eq!(simulator.committed, 1);
    assert_eq!(simulator.instr_stages[0], Some(PipelineStage::Commit));
    assert_eq!(simulator.instr_stages[1], Some(PipelineStage::Flushed));
    assert_eq!(simulator.registers.read(1), 0);
    assert_eq!(simulator.registers.read(2), 0);
}

#[test]
fn test_predictor_learns_across_reset() {
    let mut simulator = simulator_with("BEQ R0, R0, 12\nADD R1, R0, R0\nADD R2, R0, R0");

    simulator.run_to_halt();
    assert_eq!(simulator.mispredictions, 1);

    // reset() keeps the predictor's direction table; the second run
    // predicts taken and never mispredicts
    simulator.reset();
    let state = simulator.run_to_halt();
    assert_eq!(state, SimulatorState::Halted);
    assert_eq!(simulator.mispredictions, 0);
    assert_eq!(simulator.cycle, 3);
    assert_eq!(simulator.committed, 1);
}

#[test]
fn test_load_program_clears_predictor_history() {
    let mut simulator = simulator_with("BEQ R0, R0, 12\nADD R1, R0, R0\nADD R2, R0, R0");
    simulator.run_to_halt();
    assert_eq!(simulator.mispredictions, 1);

    // Reloading the program forgets the learned direction
    simulator
        .load_program("BEQ R0, R0, 12\nADD R1, R0, R0\nADD R2, R0, R0")
        .expect("program parses");
    simulator.run_to_halt();
    assert_eq!(simulator.mispredictions, 1);
}

#[test]
fn test_demo_program_two_pass_loop() {
    let program = include_str!("../demos/default.asm");
    let mut simulator = simulator_with(program);
    simulator.memory.write_word(0, 2).expect("loop bound");
    simulator.memory.write_word(4, 1).expect("loop step");

    let state = simulator.run_to_halt();
    assert_eq!(state, SimulatorState::Halted);
    assert!(simulator.error.is_none());

    // Two passes over the loop body: 10 + 7 committed instructions. The
    // backward BEQ is taken once; a one-bit predictor mispredicts both the
    // first (predicted not-taken) and the last (predicted taken) encounter.
    assert_eq!(simulator.committed, 17);
    assert_eq!(simulator.mispredictions, 2);

    assert_eq!(simulator.registers.read(1), 2); // bound
    assert_eq!(simulator.registers.read(2), 1); // step
    assert_eq!(simulator.registers.read(3), 2); // accumulator
    assert_eq!(simulator.registers.read(4), 0); // bound - accumulator
    assert_eq!(simulator.registers.read(5), 2); // accumulator * step
    assert_eq!(simulator.registers.read(6), 1); // (acc * step) / bound
    assert_eq!(simulator.memory.read_word(8).expect("in bounds"), 2);
    assert_eq!(simulator.memory.read_word(12).expect("in bounds"), 1);

    // The second misprediction flushed the speculative third pass
    assert!(simulator
        .instr_stages
        .iter()
        .any(|stage| *stage == Some(PipelineStage::Flushed)));

    let metrics = simulator.metrics();
    assert!(metrics.stalls + metrics.committed <= metrics.cycle);
    assert!((metrics.ipc - 17.0 / simulator.cycle as f64).abs() < 1e-9);
}

#[test]
fn test_tick_is_a_no_op_after_halt() {
    let mut simulator = simulator_with("ADD R1, R0, R0");
    simulator.run_to_halt();
    let cycle = simulator.cycle;
    assert_eq!(simulator.tick(), SimulatorState::Halted);
    assert_eq!(simulator.tick(), SimulatorState::Halted);
    assert_eq!(simulator.cycle, cycle);
}

#[test]
fn test_empty_program_halts_immediately() {
    let mut simulator = Simulator::new(SimulatorConfig::new());
    simulator.load_program("").expect("empty program is valid");
    assert_eq!(simulator.tick(), SimulatorState::Halted);
    assert_eq!(simulator.cycle, 0);
}

#[test]
fn test_snapshot_reflects_machine_state() {
    let mut simulator = simulator_with("ADD R1, R0, R0\nADD R2, R1, R1");
    simulator.tick();
    simulator.tick();

    let snapshot = simulator.snapshot();
    assert_eq!(snapshot.state, SimulatorState::Running);
    assert_eq!(snapshot.cycle, 2);
    assert_eq!(snapshot.program.len(), 2);
    assert_eq!(snapshot.rob.iter().filter(|e| e.busy).count(), 2);
    assert_eq!(snapshot.stations.iter().filter(|s| s.busy).count(), 2);
    assert!(snapshot.error.is_none());
    assert_eq!(snapshot.registers[0], 0);
    assert_eq!(snapshot.metrics.total_instructions, 2);
}
