use std::sync::LazyLock;

use nix::sys::{
    mman::{MRemapFlags, MapFlags},
    ptrace::Request,
    stat::SFlag,
};

use constants::{general::INVALID_FD, ioctl, syslog};

pub mod constants {
    pub mod general {
        // bound of the simulated address space, in pages
        pub const MAX_PAGES: usize = 4 << 10;
        pub const PTR_SIZE: u64 = 8;
        // a descriptor no kernel will ever hand out
        pub const INVALID_FD: u64 = u64::MAX;
        // length target meaning "the whole enclosing struct"
        pub const PARENT_LEN_TARGET: &str = "parent";
    }
    pub mod resources {
        // io_submit control blocks are not a declared resource, they are
        // tracked under this engine-internal kind so io_cancel/io_getevents
        // can point back at a submitted block
        pub const IOCB_PTR_RESOURCE: &str = "iocbptr";
        pub const IOCB_TYPE_NAME: &str = "iocb";
    }
    pub mod syslog {
        pub const SYSLOG_ACTION_CONSOLE_OFF: u64 = 6;
        pub const SYSLOG_ACTION_CONSOLE_ON: u64 = 7;
        pub const SYSLOG_ACTION_SIZE_UNREAD: u64 = 9;
    }
    pub mod ioctl {
        // _IOWR('X', 119, int) and _IOWR('X', 120, int)
        pub const FIFREEZE: u32 = 0xC004_5877;
        pub const FITHAW: u32 = 0xC004_5878;
    }
    pub mod executor {
        // exit statuses (mod 128) the executor uses to report its own failures
        pub const RESERVED_EXIT_CODES: [u64; 2] = [67, 68];
        pub const SUBSTITUTE_EXIT_CODE: u64 = 1;
    }
}

/// Numeric constants of the target kernel that the analysis and the
/// sanitizer consult. The descriptor database is expected to provide these
/// per target; `Default` takes them from the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetConsts {
    pub map_fixed: u64,
    pub map_anonymous: u64,
    pub mremap_fixed: u64,
    pub mremap_maymove: u64,
    pub s_ifreg: u64,
    pub s_ififo: u64,
    pub s_ifsock: u64,
    pub syslog_console_off: u64,
    pub syslog_console_on: u64,
    pub syslog_size_unread: u64,
    pub fifreeze: u32,
    pub fithaw: u32,
    pub ptrace_traceme: u64,
    pub invalid_fd: u64,
}

impl Default for TargetConsts {
    fn default() -> Self {
        TargetConsts {
            map_fixed: MapFlags::MAP_FIXED.bits() as u64,
            map_anonymous: MapFlags::MAP_ANONYMOUS.bits() as u64,
            mremap_fixed: MRemapFlags::MREMAP_FIXED.bits() as u64,
            mremap_maymove: MRemapFlags::MREMAP_MAYMOVE.bits() as u64,
            s_ifreg: SFlag::S_IFREG.bits() as u64,
            s_ififo: SFlag::S_IFIFO.bits() as u64,
            s_ifsock: SFlag::S_IFSOCK.bits() as u64,
            syslog_console_off: syslog::SYSLOG_ACTION_CONSOLE_OFF,
            syslog_console_on: syslog::SYSLOG_ACTION_CONSOLE_ON,
            syslog_size_unread: syslog::SYSLOG_ACTION_SIZE_UNREAD,
            fifreeze: ioctl::FIFREEZE,
            fithaw: ioctl::FITHAW,
            ptrace_traceme: Request::PTRACE_TRACEME as u64,
            invalid_fd: INVALID_FD,
        }
    }
}

pub static HOST_CONSTS: LazyLock<TargetConsts> = LazyLock::new(TargetConsts::default);
