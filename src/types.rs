use std::{fmt::Display, sync::Arc};

use crate::auxiliary::constants::general::PTR_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dir {
    In,
    Out,
    InOut,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Blob,
    String,
    Filename,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Int,
    Flags,
    Const,
    // alignment filler, never addressed by name
    Pad,
    Resource {
        desc: String,
    },
    Buffer {
        kind: BufferKind,
    },
    // `buf` names a sibling field, or `PARENT_LEN_TARGET` for the enclosing struct
    Len {
        buf: String,
        byte_size: u64,
    },
    Vma,
    Ptr,
    Array,
    Struct,
    Union,
}

/// Semantic description of one argument slot, owned by the descriptor
/// database and shared between every argument node built from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Type {
    pub name: String,
    pub dir: Dir,
    /// static byte size, 0 when the type is variable-length
    pub size: u64,
    pub optional: bool,
    pub kind: TypeKind,
}

impl Type {
    pub fn new(name: &str, dir: Dir, size: u64, kind: TypeKind) -> Arc<Type> {
        Arc::new(Type {
            name: name.to_owned(),
            dir,
            size,
            optional: false,
            kind,
        })
    }

    pub fn int(name: &str, size: u64) -> Arc<Type> {
        Type::new(name, Dir::In, size, TypeKind::Int)
    }

    pub fn flags(name: &str, size: u64) -> Arc<Type> {
        Type::new(name, Dir::In, size, TypeKind::Flags)
    }

    pub fn constant(name: &str, size: u64) -> Arc<Type> {
        Type::new(name, Dir::In, size, TypeKind::Const)
    }

    pub fn pad(size: u64) -> Arc<Type> {
        Type::new("pad", Dir::In, size, TypeKind::Pad)
    }

    pub fn resource(name: &str, desc: &str, dir: Dir) -> Arc<Type> {
        Type::new(
            name,
            dir,
            4,
            TypeKind::Resource {
                desc: desc.to_owned(),
            },
        )
    }

    pub fn buffer(name: &str, kind: BufferKind, dir: Dir) -> Arc<Type> {
        Type::new(name, dir, 0, TypeKind::Buffer { kind })
    }

    pub fn len(name: &str, buf: &str, byte_size: u64, size: u64) -> Arc<Type> {
        Type::new(
            name,
            Dir::In,
            size,
            TypeKind::Len {
                buf: buf.to_owned(),
                byte_size,
            },
        )
    }

    pub fn vma(name: &str) -> Arc<Type> {
        Type::new(name, Dir::In, PTR_SIZE, TypeKind::Vma)
    }

    pub fn ptr(name: &str) -> Arc<Type> {
        Type::new(name, Dir::In, PTR_SIZE, TypeKind::Ptr)
    }

    pub fn array(name: &str, dir: Dir) -> Arc<Type> {
        Type::new(name, dir, 0, TypeKind::Array)
    }

    pub fn structure(name: &str, dir: Dir) -> Arc<Type> {
        Type::new(name, dir, 0, TypeKind::Struct)
    }

    pub fn union(name: &str, dir: Dir, size: u64) -> Arc<Type> {
        Type::new(name, dir, size, TypeKind::Union)
    }

    pub fn into_optional(self: Arc<Type>) -> Arc<Type> {
        let mut typ = Arc::unwrap_or_clone(self);
        typ.optional = true;
        Arc::new(typ)
    }

    pub fn is_pad(&self) -> bool {
        matches!(self.kind, TypeKind::Pad)
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct)
    }
}

/// One syscall descriptor. `name` is the full variant name (`ioctl$FIFREEZE`),
/// `call_name` the kernel entry point it lowers to (`ioctl`).
#[derive(Clone, Debug)]
pub struct Syscall {
    pub id: usize,
    pub name: String,
    pub call_name: String,
    pub args: Vec<Arc<Type>>,
    pub ret: Option<Arc<Type>>,
}

impl Syscall {
    pub fn new(id: usize, name: &str, args: Vec<Arc<Type>>, ret: Option<Arc<Type>>) -> Arc<Syscall> {
        let call_name = name.split('$').next().unwrap_or(name);
        Arc::new(Syscall {
            id,
            name: name.to_owned(),
            call_name: call_name.to_owned(),
            args,
            ret,
        })
    }
}

impl Display for Syscall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
