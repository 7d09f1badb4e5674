//! Conservative resource-related analysis of programs.
//!
//! Figures out which resources are [potentially] available at a point in a
//! program, which pages are [potentially] mapped and which strings and file
//! names were already passed to the kernel. Whenever something is unknown
//! before execution the state errs on the side that keeps generated programs
//! safe: output buffers are not recorded, and a range remapped elsewhere is
//! still considered mapped.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use crate::{
    auxiliary::{
        constants::{
            general::MAX_PAGES,
            resources::{IOCB_PTR_RESOURCE, IOCB_TYPE_NAME},
        },
        TargetConsts, HOST_CONSTS,
    },
    fault::Fault,
    prog::{Arg, ArgKind, Call, Prog},
    traverse::foreach_arg_array,
    types::{BufferKind, Dir, TypeKind},
};

/// The generator's call-selection weights. Built elsewhere; the analysis
/// only carries it so the generator can keep one handle per request.
pub trait ChoiceTable {
    fn is_enabled(&self, call_name: &str) -> bool;
}

pub struct State<'a> {
    ct: &'a dyn ChoiceTable,
    consts: &'a TargetConsts,
    resources: HashMap<String, Vec<&'a Arg>>,
    files: HashSet<Vec<u8>>,
    strings: HashSet<Vec<u8>>,
    pages: Box<[bool; MAX_PAGES]>,
}

/// Analyzes `prog` up to but not including `target`. A `target` that is not
/// part of `prog` yields the state after the whole program.
pub fn analyze<'a>(ct: &'a dyn ChoiceTable, prog: &'a Prog, target: &Call) -> Result<State<'a>, Fault> {
    analyze_with(ct, &HOST_CONSTS, prog, target)
}

pub fn analyze_with<'a>(
    ct: &'a dyn ChoiceTable,
    consts: &'a TargetConsts,
    prog: &'a Prog,
    target: &Call,
) -> Result<State<'a>, Fault> {
    let mut state = State::new(ct, consts);
    for call in &prog.calls {
        if std::ptr::eq(call, target) {
            break;
        }
        state.observe(call)?;
    }
    Ok(state)
}

impl<'a> State<'a> {
    pub fn new(ct: &'a dyn ChoiceTable, consts: &'a TargetConsts) -> Self {
        State {
            ct,
            consts,
            resources: HashMap::new(),
            files: HashSet::new(),
            strings: HashSet::new(),
            pages: Box::new([false; MAX_PAGES]),
        }
    }

    pub fn observe(&mut self, call: &'a Call) -> Result<(), Fault> {
        trace!("observe {}", call.meta);
        foreach_arg_array(&call.args, call.ret.as_ref(), |arg, _, _| match &arg.typ.kind {
            TypeKind::Resource { desc } => {
                // pure inputs only consume
                if arg.typ.dir != Dir::In {
                    self.resources.entry(desc.clone()).or_default().push(arg);
                }
            }
            TypeKind::Buffer { kind } => {
                if arg.typ.dir == Dir::Out {
                    return;
                }
                if let ArgKind::Data { data } = &arg.kind {
                    if data.is_empty() {
                        return;
                    }
                    match kind {
                        BufferKind::String => {
                            self.strings.insert(data.clone());
                        }
                        BufferKind::Filename => {
                            self.files.insert(data.clone());
                        }
                        BufferKind::Blob => {}
                    }
                }
            }
            _ => {}
        });
        match call.meta.call_name.as_str() {
            "mmap" => self.observe_mmap(call),
            "munmap" => self.addressable(call, call.arg(0)?, call.arg(1)?, false),
            // the old range is left as is
            "mremap" => self.addressable(call, call.arg(4)?, call.arg(2)?, true),
            "io_submit" => self.observe_io_submit(call),
            _ => Ok(()),
        }
    }

    fn observe_mmap(&mut self, call: &'a Call) -> Result<(), Fault> {
        // filter out only very wrong arguments
        let length = call.arg(1)?;
        if let ArgKind::PageSize { pages: 0, offset: 0 } = length.kind {
            debug!("{}: zero length, nothing mapped", call.meta);
            return Ok(());
        }
        let (flags, fd) = (call.arg(3)?, call.arg(4)?);
        let anonymous = flags.val().unwrap_or(0) & self.consts.map_anonymous != 0;
        if !anonymous && fd.val() == Some(self.consts.invalid_fd) {
            debug!("{}: file mapping of an invalid fd, nothing mapped", call.meta);
            return Ok(());
        }
        self.addressable(call, call.arg(0)?, length, true)
    }

    fn observe_io_submit(&mut self, call: &'a Call) -> Result<(), Fault> {
        let Some(arr) = call.arg(2)?.res() else {
            return Ok(());
        };
        for ptr in arr.inner().iter().filter(|ptr| ptr.is_pointer()) {
            if ptr.res().is_some_and(|res| res.typ.name == IOCB_TYPE_NAME) {
                self.resources
                    .entry(IOCB_PTR_RESOURCE.to_owned())
                    .or_default()
                    .push(ptr);
            }
        }
        Ok(())
    }

    fn addressable(&mut self, call: &Call, addr: &Arg, size: &Arg, ok: bool) -> Result<(), Fault> {
        let (page, (pages, offset)) = match (&addr.kind, &size.kind) {
            (ArgKind::Pointer { page, .. }, ArgKind::PageSize { pages, offset }) => {
                (*page, (*pages, *offset))
            }
            _ => {
                return Err(Fault::NotPages {
                    call: call.meta.name.clone(),
                    addr: addr.kind.name(),
                    size: size.kind.name(),
                })
            }
        };
        // a partial trailing page still occupies that page
        let count = pages.saturating_add(u64::from(offset != 0));
        if page.saturating_add(count) > MAX_PAGES as u64 {
            return Err(Fault::PageOutOfBounds {
                page,
                count,
                pages,
                offset,
                bound: MAX_PAGES,
            });
        }
        let start = page as usize;
        self.pages[start..start + count as usize].fill(ok);
        Ok(())
    }

    pub fn choice_table(&self) -> &'a dyn ChoiceTable {
        self.ct
    }

    /// Arguments that produced a resource of `kind`, in program order.
    pub fn resources(&self, kind: &str) -> &[&'a Arg] {
        self.resources.get(kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// Resource kinds with at least one producer, sorted by name.
    pub fn resource_kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.resources.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn strings(&self) -> &HashSet<Vec<u8>> {
        &self.strings
    }

    pub fn files(&self) -> &HashSet<Vec<u8>> {
        &self.files
    }

    pub fn has_string(&self, value: &[u8]) -> bool {
        self.strings.contains(value)
    }

    pub fn has_file(&self, value: &[u8]) -> bool {
        self.files.contains(value)
    }

    pub fn is_mapped(&self, page: usize) -> bool {
        self.pages.get(page).copied().unwrap_or(false)
    }

    pub fn mapped_pages(&self) -> Vec<usize> {
        (0..MAX_PAGES).filter(|page| self.pages[*page]).collect()
    }
}
