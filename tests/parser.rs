use tomasulo_rust::parse_program;
use tomasulo_rust::simulator::instruction::Operation;

#[test]
fn test_parses_arithmetic_forms() {
    let program = parse_program("ADD R1, R2, R3\nSUB R4, R5, R6\nMUL R7, R8, R9\nDIV R10, R11, R12")
        .expect("valid program");
    assert_eq!(program.len(), 4);
    assert_eq!(
        program[0].op,
        Operation::Add {
            rd: 1,
            rs: 2,
            rt: 3
        }
    );
    assert_eq!(
        program[3].op,
        Operation::Div {
            rd: 10,
            rs: 11,
            rt: 12
        }
    );
    assert_eq!(program[2].index, 2);
}

#[test]
fn test_parses_memory_forms_with_signed_offsets() {
    let program = parse_program("LW R4, -8(R5)\nSW R6, 12(R7)").expect("valid program");
    assert_eq!(
        program[0].op,
        Operation::Lw {
            rt: 4,
            base: 5,
            offset: -8
        }
    );
    assert_eq!(
        program[1].op,
        Operation::Sw {
            rt: 6,
            base: 7,
            offset: 12
        }
    );
}

#[test]
fn test_parses_branch_form() {
    let program = parse_program("BEQ R1, R2, 12").expect("valid program");
    assert_eq!(
        program[0].op,
        Operation::Beq {
            rs: 1,
            rt: 2,
            target: 12
        }
    );
}

#[test]
fn test_f_registers_share_the_namespace() {
    let program = parse_program("ADD F1, F2, R3").expect("valid program");
    assert_eq!(
        program[0].op,
        Operation::Add {
            rd: 1,
            rs: 2,
            rt: 3
        }
    );
}

#[test]
fn test_lowercase_and_spacing_are_accepted() {
    let program = parse_program("  add r1 , r0,r0  \nlw r2, 0( r0 )");
    // Spaces inside the memory operand split the token; only the first
    // line parses
    assert!(program.is_err());

    let program = parse_program("  add r1 , r0,r0  \nlw r2, 0(r0)").expect("valid program");
    assert_eq!(program.len(), 2);
}

#[test]
fn test_semicolons_separate_statements_on_one_line() {
    let program = parse_program("ADD R1, R0, R0 ; ADD R2, R1, R1").expect("valid program");
    assert_eq!(program.len(), 2);
    assert_eq!(program[0].index, 0);
    assert_eq!(program[1].index, 1);
}

#[test]
fn test_blank_lines_are_ignored() {
    let program = parse_program("\nADD R1, R0, R0\n\n\nADD R2, R0, R0\n").expect("valid program");
    assert_eq!(program.len(), 2);
}
