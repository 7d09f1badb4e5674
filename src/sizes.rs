use std::collections::HashMap;

use crate::{
    auxiliary::constants::general::PARENT_LEN_TARGET,
    fault::Fault,
    prog::{Arg, ArgKind, Call},
    traverse::foreach_arg_mut,
    types::TypeKind,
};

/// Value a length field takes when it describes `buf`. `byte_size` is the
/// declared stride of the length type; 0 counts array elements instead.
pub fn generate_size(buf: Option<&Arg>, byte_size: u64) -> ArgKind {
    let Some(buf) = buf else {
        // optional pointer that points nowhere
        return ArgKind::Const { val: 0 };
    };
    match (&buf.typ.kind, &buf.kind) {
        (TypeKind::Vma, ArgKind::Pointer { pages_num, .. }) => ArgKind::PageSize {
            pages: *pages_num,
            offset: 0,
        },
        (TypeKind::Array, _) => {
            let val = if byte_size != 0 {
                buf.size() / byte_size
            } else {
                buf.inner().len() as u64
            };
            ArgKind::Const { val }
        }
        _ => ArgKind::Const { val: buf.size() },
    }
}

/// Recomputes every length field among `args` from its siblings. Names are
/// resolved against `args` only; the parent total counts every field,
/// padding and the length fields themselves included.
pub fn assign_sizes(args: &mut [Arg]) -> Result<(), Fault> {
    let parent_size: u64 = args.iter().map(Arg::size).sum();
    let fields: HashMap<&str, &Arg> = args
        .iter()
        .filter(|arg| !arg.typ.is_pad())
        .map(|arg| (arg.typ.name.as_str(), arg))
        .collect();

    let mut resolved = Vec::new();
    for (index, arg) in args.iter().enumerate() {
        let Some(arg) = arg.inner_arg()? else {
            // pointer to an optional len field, nothing to fill in
            continue;
        };
        let TypeKind::Len { buf, byte_size } = &arg.typ.kind else {
            continue;
        };
        if buf == PARENT_LEN_TARGET {
            resolved.push((index, ArgKind::Const { val: parent_size }));
            continue;
        }
        let Some(target) = fields.get(buf.as_str()) else {
            let mut known: Vec<String> = fields.keys().map(|name| name.to_string()).collect();
            known.sort();
            return Err(Fault::UnresolvedLen {
                field: arg.typ.name.clone(),
                target: buf.clone(),
                known,
            });
        };
        resolved.push((index, generate_size(target.inner_arg()?, *byte_size)));
    }

    for (index, kind) in resolved {
        if let Some(len) = args[index].inner_arg_mut()? {
            len.kind = kind;
        }
    }
    Ok(())
}

/// Repairs every length field of `call`: the top-level arguments first,
/// then each struct against its own fields.
pub fn assign_sizes_call(call: &mut Call) -> Result<(), Fault> {
    assign_sizes(&mut call.args)?;
    foreach_arg_mut(call, |arg| {
        if !arg.typ.is_struct() {
            return Ok(());
        }
        match &mut arg.kind {
            ArgKind::Group { inner } => assign_sizes(inner),
            _ => Ok(()),
        }
    })
}
