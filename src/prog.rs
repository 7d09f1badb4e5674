use std::sync::Arc;

use crate::{
    fault::Fault,
    types::{Syscall, Type, TypeKind},
};

#[derive(Clone, Debug, PartialEq)]
pub enum ArgKind {
    Const {
        val: u64,
    },
    // the pointer owns its pointee; `pages_num` is only meaningful for vma pointers
    Pointer {
        page: u64,
        offset: i64,
        pages_num: u64,
        res: Option<Box<Arg>>,
    },
    PageSize {
        pages: u64,
        offset: i64,
    },
    Data {
        data: Vec<u8>,
    },
    // arrays and structs
    Group {
        inner: Vec<Arg>,
    },
    Union {
        option: Box<Arg>,
    },
}

impl ArgKind {
    pub fn name(&self) -> &'static str {
        match self {
            ArgKind::Const { .. } => "const",
            ArgKind::Pointer { .. } => "pointer",
            ArgKind::PageSize { .. } => "page size",
            ArgKind::Data { .. } => "data",
            ArgKind::Group { .. } => "group",
            ArgKind::Union { .. } => "union",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Arg {
    pub typ: Arc<Type>,
    pub kind: ArgKind,
}

impl Arg {
    pub fn constant(typ: Arc<Type>, val: u64) -> Arg {
        Arg {
            typ,
            kind: ArgKind::Const { val },
        }
    }

    pub fn pointer(typ: Arc<Type>, page: u64, offset: i64, res: Option<Arg>) -> Arg {
        Arg {
            typ,
            kind: ArgKind::Pointer {
                page,
                offset,
                pages_num: 0,
                res: res.map(Box::new),
            },
        }
    }

    pub fn vma(typ: Arc<Type>, page: u64, pages_num: u64) -> Arg {
        Arg {
            typ,
            kind: ArgKind::Pointer {
                page,
                offset: 0,
                pages_num,
                res: None,
            },
        }
    }

    pub fn page_size(typ: Arc<Type>, pages: u64, offset: i64) -> Arg {
        Arg {
            typ,
            kind: ArgKind::PageSize { pages, offset },
        }
    }

    pub fn data(typ: Arc<Type>, data: impl Into<Vec<u8>>) -> Arg {
        Arg {
            typ,
            kind: ArgKind::Data { data: data.into() },
        }
    }

    pub fn group(typ: Arc<Type>, inner: Vec<Arg>) -> Arg {
        Arg {
            typ,
            kind: ArgKind::Group { inner },
        }
    }

    pub fn union(typ: Arc<Type>, option: Arg) -> Arg {
        Arg {
            typ,
            kind: ArgKind::Union {
                option: Box::new(option),
            },
        }
    }

    /// Byte footprint of the argument in its parent.
    pub fn size(&self) -> u64 {
        match &self.kind {
            ArgKind::Const { .. } | ArgKind::Pointer { .. } | ArgKind::PageSize { .. } => {
                self.typ.size
            }
            ArgKind::Data { data } => data.len() as u64,
            ArgKind::Group { inner } => inner.iter().map(Arg::size).sum(),
            ArgKind::Union { option } => {
                if self.typ.size != 0 {
                    self.typ.size
                } else {
                    option.size()
                }
            }
        }
    }

    pub fn val(&self) -> Option<u64> {
        match self.kind {
            ArgKind::Const { val } => Some(val),
            _ => None,
        }
    }

    pub fn inner(&self) -> &[Arg] {
        match &self.kind {
            ArgKind::Group { inner } => inner,
            _ => &[],
        }
    }

    pub fn res(&self) -> Option<&Arg> {
        match &self.kind {
            ArgKind::Pointer { res, .. } => res.as_deref(),
            _ => None,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.kind, ArgKind::Pointer { .. })
    }

    /// Strips pointer indirection. `None` means an optional pointer that
    /// currently points nowhere.
    pub fn inner_arg(&self) -> Result<Option<&Arg>, Fault> {
        if !matches!(self.typ.kind, TypeKind::Ptr) {
            return Ok(Some(self));
        }
        match self.res() {
            Some(res) => res.inner_arg(),
            None if self.typ.optional => Ok(None),
            None => Err(Fault::MissingPointee {
                field: self.typ.name.clone(),
            }),
        }
    }

    pub fn inner_arg_mut(&mut self) -> Result<Option<&mut Arg>, Fault> {
        if !matches!(self.typ.kind, TypeKind::Ptr) {
            return Ok(Some(self));
        }
        let typ = Arc::clone(&self.typ);
        match &mut self.kind {
            ArgKind::Pointer { res: Some(res), .. } => res.inner_arg_mut(),
            _ if typ.optional => Ok(None),
            _ => Err(Fault::MissingPointee {
                field: typ.name.clone(),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Call {
    pub meta: Arc<Syscall>,
    pub args: Vec<Arg>,
    pub ret: Option<Arg>,
}

impl Call {
    pub fn new(meta: Arc<Syscall>, args: Vec<Arg>) -> Call {
        let ret = meta
            .ret
            .as_ref()
            .map(|typ| Arg::constant(Arc::clone(typ), 0));
        Call { meta, args, ret }
    }

    pub fn arg(&self, index: usize) -> Result<&Arg, Fault> {
        self.args.get(index).ok_or_else(|| Fault::MissingArg {
            call: self.meta.name.clone(),
            index,
            len: self.args.len(),
        })
    }

    pub fn arg_mut(&mut self, index: usize) -> Result<&mut Arg, Fault> {
        let len = self.args.len();
        let call = &self.meta.name;
        match self.args.get_mut(index) {
            Some(arg) => Ok(arg),
            None => Err(Fault::MissingArg {
                call: call.clone(),
                index,
                len,
            }),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Prog {
    pub calls: Vec<Call>,
}

impl Prog {
    /// Index of `call` by identity, not by value.
    pub fn position(&self, call: &Call) -> Option<usize> {
        self.calls.iter().position(|c| std::ptr::eq(c, call))
    }
}
