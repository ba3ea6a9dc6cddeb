/// Runs `source` and returns everything it printed.
pub fn run_program(source: &str) -> String {
    let mut output: Vec<u8> = Vec::new();
    choco::run(source, &mut output).expect("program should run");
    String::from_utf8(output).expect("output should be utf-8")
}

/// Like `run_program`, but also returns the error the run ended with.
pub fn run_program_err(source: &str) -> (String, choco::Error) {
    let mut output: Vec<u8> = Vec::new();
    let err = choco::run(source, &mut output).expect_err("program should fail");
    (String::from_utf8(output).expect("output should be utf-8"), err)
}
