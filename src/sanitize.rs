//! Per-syscall value rewrites applied to every finished call, keeping
//! generated programs reproducible and the executing host alive. Rules only
//! touch argument values, never the shape of a call.

use std::{
    collections::HashMap,
    sync::{Arc, LazyLock},
};

use log::debug;

use crate::{
    auxiliary::{
        constants::executor::{RESERVED_EXIT_CODES, SUBSTITUTE_EXIT_CODE},
        TargetConsts, HOST_CONSTS,
    },
    fault::Fault,
    prog::{ArgKind, Call},
    types::Syscall,
};

type Rule = fn(&mut Call, &TargetConsts) -> Result<(), Fault>;

// keyed by the target's base call name, never by the host syscall table
pub static SANITIZERS_MAP: LazyLock<HashMap<&'static str, Rule>> =
    LazyLock::new(initialize_sanitizers_map);

pub fn initialize_sanitizers_map() -> HashMap<&'static str, Rule> {
    let mut map: HashMap<&'static str, Rule> = HashMap::new();
    map.insert("mmap", sanitize_mmap);
    map.insert("mremap", sanitize_mremap);
    map.insert("mknod", sanitize_mknod);
    map.insert("mknodat", sanitize_mknodat);
    map.insert("syslog", sanitize_syslog);
    map.insert("ioctl", sanitize_ioctl);
    map.insert("ptrace", sanitize_ptrace);
    map.insert("exit", sanitize_exit);
    map.insert("exit_group", sanitize_exit);
    map
}

pub fn sanitize_call(call: &mut Call) -> Result<(), Fault> {
    sanitize_call_with(call, &HOST_CONSTS)
}

pub fn sanitize_call_with(call: &mut Call, consts: &TargetConsts) -> Result<(), Fault> {
    match SANITIZERS_MAP.get(call.meta.call_name.as_str()) {
        Some(rule) => rule(call, consts),
        None => Ok(()),
    }
}

fn const_arg<'c>(call: &'c mut Call, index: usize, what: &'static str) -> Result<&'c mut u64, Fault> {
    let meta = Arc::clone(&call.meta);
    match &mut call.arg_mut(index)?.kind {
        ArgKind::Const { val } => Ok(val),
        other => Err(Fault::ArgKind {
            call: meta.name.clone(),
            index,
            what,
            expected: "const",
            found: other.name(),
        }),
    }
}

fn expect_kind(
    call: &Call,
    index: usize,
    what: &'static str,
    expected: &'static str,
    matches: fn(&ArgKind) -> bool,
) -> Result<(), Fault> {
    let arg = call.arg(index)?;
    if matches(&arg.kind) {
        return Ok(());
    }
    Err(Fault::ArgKind {
        call: call.meta.name.clone(),
        index,
        what,
        expected,
        found: arg.kind.name(),
    })
}

fn rewrite(meta: &Syscall, what: &str, slot: &mut u64, new: u64) {
    if *slot != new {
        debug!("{meta}: {what} {:#x} -> {new:#x}", *slot);
        *slot = new;
    }
}

// without MAP_FIXED the kernel picks the address, which is not reproducible
fn sanitize_mmap(call: &mut Call, consts: &TargetConsts) -> Result<(), Fault> {
    expect_kind(call, 0, "addr", "pointer", |kind| {
        matches!(kind, ArgKind::Pointer { .. })
    })?;
    expect_kind(call, 1, "length", "page size", |kind| {
        matches!(kind, ArgKind::PageSize { .. })
    })?;
    let meta = Arc::clone(&call.meta);
    let flags = const_arg(call, 3, "flags")?;
    let fixed = *flags | consts.map_fixed;
    rewrite(&meta, "flags", flags, fixed);
    Ok(())
}

fn sanitize_mremap(call: &mut Call, consts: &TargetConsts) -> Result<(), Fault> {
    let meta = Arc::clone(&call.meta);
    let flags = const_arg(call, 3, "flags")?;
    if *flags & consts.mremap_maymove != 0 {
        let fixed = *flags | consts.mremap_fixed;
        rewrite(&meta, "flags", flags, fixed);
    }
    Ok(())
}

fn sanitize_mknod(call: &mut Call, consts: &TargetConsts) -> Result<(), Fault> {
    sanitize_mknod_mode(call, 1, consts)
}

fn sanitize_mknodat(call: &mut Call, consts: &TargetConsts) -> Result<(), Fault> {
    sanitize_mknod_mode(call, 2, consts)
}

// char and block devices reach io ports and kernel memory
fn sanitize_mknod_mode(call: &mut Call, index: usize, consts: &TargetConsts) -> Result<(), Fault> {
    let meta = Arc::clone(&call.meta);
    let mode = const_arg(call, index, "mode")?;
    if *mode != consts.s_ifreg && *mode != consts.s_ififo && *mode != consts.s_ifsock {
        rewrite(&meta, "mode", mode, consts.s_ififo);
    }
    Ok(())
}

// turning the console off blinds the harness
fn sanitize_syslog(call: &mut Call, consts: &TargetConsts) -> Result<(), Fault> {
    let meta = Arc::clone(&call.meta);
    let cmd = const_arg(call, 0, "cmd")?;
    if *cmd == consts.syslog_console_off || *cmd == consts.syslog_console_on {
        rewrite(&meta, "cmd", cmd, consts.syslog_size_unread);
    }
    Ok(())
}

// a frozen filesystem hangs the machine
fn sanitize_ioctl(call: &mut Call, consts: &TargetConsts) -> Result<(), Fault> {
    let meta = Arc::clone(&call.meta);
    let cmd = const_arg(call, 1, "cmd")?;
    if *cmd as u32 == consts.fifreeze {
        rewrite(&meta, "cmd", cmd, u64::from(consts.fithaw));
    }
    Ok(())
}

// PTRACE_TRACEME leaves behind unkillable processes
fn sanitize_ptrace(call: &mut Call, consts: &TargetConsts) -> Result<(), Fault> {
    let meta = Arc::clone(&call.meta);
    let req = const_arg(call, 0, "request")?;
    if *req == consts.ptrace_traceme {
        rewrite(&meta, "request", req, u64::MAX);
    }
    Ok(())
}

fn sanitize_exit(call: &mut Call, _consts: &TargetConsts) -> Result<(), Fault> {
    let meta = Arc::clone(&call.meta);
    let code = const_arg(call, 0, "code")?;
    if RESERVED_EXIT_CODES.contains(&(*code % 128)) {
        rewrite(&meta, "code", code, SUBSTITUTE_EXIT_CODE);
    }
    Ok(())
}
