//! Program builders shared by the property tests.

#![allow(dead_code)]

use std::sync::Arc;

use progscope::{Arg, BufferKind, Call, ChoiceTable, Dir, Syscall, Type, TargetConsts};

pub struct AllEnabled;

impl ChoiceTable for AllEnabled {
    fn is_enabled(&self, _call_name: &str) -> bool {
        true
    }
}

pub fn syscall(name: &str, ret: Option<Arc<Type>>) -> Arc<Syscall> {
    Syscall::new(0, name, vec![], ret)
}

/// Call outside of any program, used to analyze a whole program.
pub fn end_marker() -> Call {
    Call::new(syscall("getpid", None), vec![])
}

pub fn open(path: &[u8]) -> Call {
    let file = Arg::data(Type::buffer("file", BufferKind::Filename, Dir::In), path);
    Call::new(
        syscall("open", Some(Type::resource("ret", "fd", Dir::Out))),
        vec![
            Arg::pointer(Type::ptr("file"), 0, 0, Some(file)),
            Arg::constant(Type::flags("flags", 8), 0),
            Arg::constant(Type::flags("mode", 8), 0),
        ],
    )
}

pub fn pipe() -> Call {
    let fds = Arg::group(
        Type::structure("pipefd", Dir::Out),
        vec![
            Arg::constant(Type::resource("rfd", "fd", Dir::Out), 0),
            Arg::constant(Type::resource("wfd", "fd", Dir::Out), 0),
        ],
    );
    Call::new(
        syscall("pipe", None),
        vec![Arg::pointer(Type::ptr("pipefd"), 1, 0, Some(fds))],
    )
}

pub fn close() -> Call {
    Call::new(
        syscall("close", None),
        vec![Arg::constant(Type::resource("fd", "fd", Dir::In), 0)],
    )
}

pub fn dup() -> Call {
    Call::new(
        syscall("dup", Some(Type::resource("ret", "fd", Dir::Out))),
        vec![Arg::constant(Type::resource("oldfd", "fd", Dir::In), 0)],
    )
}

// an inout descriptor slot behind a pointer
pub fn ioctl_fd_swap() -> Call {
    Call::new(
        syscall("ioctl$swapfd", None),
        vec![
            Arg::constant(Type::resource("fd", "fd", Dir::In), 0),
            Arg::constant(Type::constant("cmd", 4), 0x4004),
            Arg::pointer(
                Type::ptr("arg"),
                2,
                0,
                Some(Arg::constant(Type::resource("swapped", "fd", Dir::InOut), 0)),
            ),
        ],
    )
}

pub fn getpid() -> Call {
    Call::new(
        syscall("getpid", Some(Type::resource("ret", "pid", Dir::Out))),
        vec![],
    )
}

pub fn write_string(dir: Dir, kind: BufferKind, value: &[u8]) -> Call {
    let buf = Arg::data(Type::buffer("buf", kind, dir), value);
    Call::new(
        syscall("write", None),
        vec![
            Arg::constant(Type::resource("fd", "fd", Dir::In), 0),
            Arg::pointer(Type::ptr("buf"), 3, 0, Some(buf)),
            Arg::constant(Type::len("count", "buf", 0, 8), value.len() as u64),
        ],
    )
}

pub fn mmap(page: u64, pages: u64, offset: i64, consts: &TargetConsts) -> Call {
    Call::new(
        syscall("mmap", None),
        vec![
            Arg::vma(Type::vma("addr"), page, pages),
            Arg::page_size(Type::len("len", "addr", 0, 8), pages, offset),
            Arg::constant(Type::flags("prot", 8), 3),
            Arg::constant(Type::flags("flags", 8), consts.map_anonymous | consts.map_fixed),
            Arg::constant(Type::resource("fd", "fd", Dir::In), consts.invalid_fd),
            Arg::constant(Type::int("offset", 8), 0),
        ],
    )
}

pub fn munmap(page: u64, pages: u64, offset: i64) -> Call {
    Call::new(
        syscall("munmap", None),
        vec![
            Arg::vma(Type::vma("addr"), page, pages),
            Arg::page_size(Type::len("len", "addr", 0, 8), pages, offset),
        ],
    )
}

pub fn mremap(old_page: u64, old_pages: u64, new_page: u64, new_pages: u64) -> Call {
    Call::new(
        syscall("mremap", None),
        vec![
            Arg::vma(Type::vma("addr"), old_page, old_pages),
            Arg::page_size(Type::len("len", "addr", 0, 8), old_pages, 0),
            Arg::page_size(Type::len("newlen", "newaddr", 0, 8), new_pages, 0),
            Arg::constant(Type::flags("flags", 8), 3),
            Arg::vma(Type::vma("newaddr"), new_page, new_pages),
        ],
    )
}

/// Nodes of `call` that make a descriptor available, in traversal order.
pub fn fd_producers(call: &Call) -> Vec<&Arg> {
    match call.meta.name.as_str() {
        "open" | "dup" => call.ret.iter().collect(),
        "pipe" => call.args[0].res().unwrap().inner().iter().collect(),
        "ioctl$swapfd" => call.args[2].res().into_iter().collect(),
        _ => vec![],
    }
}
