// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz command synthesis with arbitrary terminal, starter, file and params.
#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::path::Path;
use tl_command::{CommandSynthesizer, Platform, SynthesisInput, WaitPolicy, command_string};

#[derive(Debug, Arbitrary)]
struct Input {
    windows: bool,
    terminal: String,
    starter: String,
    file: String,
    params: String,
    always: bool,
    on_errors: bool,
}

fuzz_target!(|input: Input| {
    let platform = if input.windows {
        Platform::Windows
    } else {
        Platform::Unix
    };
    let synth_input = SynthesisInput {
        terminal_command: &input.terminal,
        starter_command: &input.starter,
        file: Path::new(&input.file),
        params: &input.params,
        wait: WaitPolicy::new(input.always, input.on_errors),
    };
    let synth = CommandSynthesizer::new(platform);
    let argv = synth.synthesize(&synth_input);

    // Deterministic, and never empty.
    assert!(!argv.is_empty());
    assert_eq!(argv, synth.synthesize(&synth_input));
    let _ = command_string(&argv);
});
