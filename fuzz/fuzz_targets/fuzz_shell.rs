#![no_main]
use libfuzzer_sys::fuzz_target;
use sectorfs::shell::{Command, Shell};
use sectorfs::FileSystem;

// Arbitrary input lines must parse or fail cleanly
fuzz_target!(|input: &[u8]| {
    let text = String::from_utf8_lossy(input);

    let mut shell = match FileSystem::with_capacity(16) {
        Ok(fs) => Shell::new(fs),
        Err(_) => return,
    };
    let mut sink = Vec::new();
    let mut errors = Vec::new();

    for line in text.lines().take(32) {
        // get/put touch the real filesystem
        if let Ok(Some(Command::Get(_) | Command::Put { .. })) = Command::parse(line) {
            continue;
        }
        let _ = shell.run_line(line, &mut sink, &mut errors);
    }
});
