use crate::prelude::cli;

#[test]
fn help_flag_describes_the_pipeline_grammar() {
    cli().args(&["--help"]).passes().stdout_has("fingertip");
}

#[test]
fn no_arguments_is_a_user_error_with_exit_code_one() {
    cli().fails().code_eq(1).stderr_has("no step specified");
}
