#![no_main]
use libfuzzer_sys::{fuzz_target, arbitrary::{Arbitrary, Unstructured}};
use sectorfs::FileSystem;

const NAMES: [&str; 4] = ["a", "b", "c", "d"];
const PATHS: [&str; 6] = [".", "..", "/", "a", "a/b", "/c/d"];

#[derive(Debug, Arbitrary)]
enum Op {
    Mkdir(u8),
    Touch(u8),
    Put(u8, Vec<u8>),
    Write(u8, Vec<u8>),
    Rm(u8, bool),
    Cp(u8, u8),
    Mv(u8, u8),
    Cd(u8),
    Defrag,
}

fn name(idx: u8) -> &'static str {
    NAMES[idx as usize % NAMES.len()]
}

fn path(idx: u8) -> &'static str {
    PATHS[idx as usize % PATHS.len()]
}

// Random operation sequences must never break sector bookkeeping
fuzz_target!(|input: &[u8]| {
    let mut u = Unstructured::new(input);

    let ops: Vec<Op> = match u.arbitrary() {
        Ok(ops) => ops,
        Err(_) => return,
    };

    let mut fs = match FileSystem::with_capacity(32) {
        Ok(fs) => fs,
        Err(_) => return,
    };
    let mut session = fs.session();

    for op in ops.iter().take(64) {
        let _ = match op {
            Op::Mkdir(p) => fs.mkdir(&session, path(*p)).map(|_| ()),
            Op::Touch(n) => fs.touch(&session, name(*n)).map(|_| ()),
            Op::Put(n, data) => fs.put(&session, name(*n), data.clone()).map(|_| ()),
            Op::Write(p, data) => fs.write(&session, path(*p), data.clone()),
            Op::Rm(n, recursive) => fs.rm(&session, name(*n), *recursive).map(|_| ()),
            Op::Cp(src, dst) => fs.cp(&session, path(*src), path(*dst)).map(|_| ()),
            Op::Mv(src, dst) => fs.mv(&session, path(*src), path(*dst)).map(|_| ()),
            Op::Cd(p) => fs.cd(&mut session, path(*p)),
            Op::Defrag => fs.defrag().map(|_| ()),
        };

        let report = fs.check().expect("check never fails on a live tree");
        assert!(report.is_consistent(), "inconsistent after {:?}: {:?}", op, report);
    }
});
