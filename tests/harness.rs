mod common;

use std::time::Duration;

use asm_harness::{
    AsmSyntax, AsmTest, ExecutionConfig, OutputMismatch, expect_failure, expect_success,
    make_input,
};

use common::{CALC, Scratch, UPPERCASE};

fn calc(scratch: &Scratch) -> AsmTest {
    let path = scratch.script("calc", CALC);
    let config = ExecutionConfig::default().with_timeout(Duration::from_millis(3000));
    AsmTest::create(path, AsmSyntax::Intel, config).expect("Failed to create fixture")
}

#[test]
fn test_calc_operations() {
    let scratch = Scratch::new();
    let test = calc(&scratch);
    let cases = [
        (10, 5, "add", 15),
        (10, 5, "sub", 5),
        (10, 5, "mul", 50),
        (10, 5, "div", 2),
        (-5, 3, "add", -2),
        (0, 100, "mul", 0),
        (15, 3, "div", 5),
        (-10, 5, "add", -5),
    ];

    for (a, b, op, expected) in cases {
        let input = make_input().arg(a).arg(b).arg(op);
        test.assert_output(&input, &expect_success().stdout_equals(format!("{}\n", expected)));
    }
}

#[test]
fn test_calc_with_container_inputs() {
    let scratch = Scratch::new();
    let test = calc(&scratch);
    let numbers = [1, 2, 3, 4, 5];

    for op in ["add", "sub", "mul"] {
        for pair in numbers.windows(2) {
            let input = make_input().args(pair).arg(op);
            let result = test.run(&input).unwrap();
            assert!(
                result.succeeded() || result.exit_code == 1,
                "{} {} {} should either succeed or fail gracefully",
                pair[0],
                op,
                pair[1]
            );
        }
    }
}

#[test]
fn test_calc_division_by_zero() {
    let scratch = Scratch::new();
    let test = calc(&scratch);
    let input = make_input().arg(10).arg(0).arg("div");

    test.assert_output(&input, &expect_failure(1).stderr_contains("division by zero"));
}

#[test]
fn test_calc_missing_operation() {
    let scratch = Scratch::new();
    let test = calc(&scratch);
    let input = make_input().arg(10).arg(5);

    test.assert_output(&input, &expect_failure(1).stderr_contains("Usage:"));
}

#[test]
fn test_uppercase_conversion() {
    let scratch = Scratch::new();
    let path = scratch.script("string_processor", UPPERCASE);
    let test = AsmTest::create(path, AsmSyntax::Intel, ExecutionConfig::default()).unwrap();

    test.assert_output(
        &make_input().stdin("hello world\n"),
        &expect_success().stdout_contains("HELLO WORLD"),
    );
    test.assert_output(
        &make_input().stdin("test"),
        &expect_success().stdout_contains("TEST"),
    );
}

#[test]
fn test_mismatch_report_lists_all_failures() {
    let scratch = Scratch::new();
    let test = calc(&scratch);
    let input = make_input().arg(10).arg(5).arg("add");

    let err = test
        .check_output(
            &input,
            &expect_failure(3).stdout_equals("16\n").stdout_contains("sixteen"),
        )
        .unwrap_err();

    let OutputMismatch::Mismatch { report, result } = err else {
        panic!("Expected a mismatch");
    };
    assert_eq!(result.stdout, b"15\n");
    assert!(report.contains("executable: "));
    assert!(report.contains("Arguments: 10 5 add\n"));
    assert!(report.contains("Exit code mismatch: expected 3, got 0"));
    assert!(report.contains("Stdout mismatch:\nExpected: '16\n'\nActual: '15\n'"));
    assert!(report.contains("Stdout missing pattern: 'sixteen'"));
}

#[test]
#[should_panic(expected = "Stdout mismatch")]
fn test_assert_output_fails_the_test() {
    let scratch = Scratch::new();
    let test = calc(&scratch);

    test.assert_output(
        &make_input().arg(2).arg(2).arg("add"),
        &expect_success().stdout_equals("5\n"),
    );
}

#[test]
fn test_timeout_surfaces_as_exit_code_mismatch() {
    let scratch = Scratch::new();
    let path = scratch.script("hang", "exec sleep 10");
    let config = ExecutionConfig::default().with_timeout(Duration::from_millis(50));
    let test = AsmTest::create(path, AsmSyntax::Att, config).unwrap();

    let err = test.check_output(&make_input(), &expect_success()).unwrap_err();

    let OutputMismatch::Mismatch { report, result } = err else {
        panic!("Expected a mismatch");
    };
    assert!(result.timed_out);
    assert!(report.contains("Syntax: AT&T\n"));
    assert!(report.contains("got 137 (killed by the runner after timeout)"));
}

#[test]
fn test_skip_when_executable_disappears() {
    let scratch = Scratch::new();
    let path = scratch.script("calc", CALC);
    let test = AsmTest::create(&path, AsmSyntax::Intel, ExecutionConfig::default()).unwrap();
    assert!(test.skip_unless_present());

    std::fs::remove_file(&path).unwrap();

    assert!(!test.skip_unless_present());
}
