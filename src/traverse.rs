//! Depth-first walks over a call's argument forest.
//!
//! Every node is reached through exactly one slot, so a walk never visits a
//! node twice. Visitors receive the node, its base (the pointer whose
//! dereference reached it, if any) and the field scope that owns it. Only
//! struct nodes open a new scope: length fields resolve names against the
//! immediately enclosing struct and nothing else.

use crate::{
    fault::Fault,
    prog::{Arg, ArgKind, Call},
};

fn foreach_subarg_impl<'a, F>(arg: &'a Arg, base: Option<&'a Arg>, parent: Option<&'a [Arg]>, f: &mut F)
where
    F: FnMut(&'a Arg, Option<&'a Arg>, Option<&'a [Arg]>),
{
    f(arg, base, parent);
    match &arg.kind {
        ArgKind::Group { inner } => {
            let scope = if arg.typ.is_struct() {
                Some(inner.as_slice())
            } else {
                parent
            };
            for arg1 in inner {
                foreach_subarg_impl(arg1, base, scope, f);
            }
        }
        ArgKind::Pointer { res: Some(res), .. } => foreach_subarg_impl(res, Some(arg), parent, f),
        ArgKind::Union { option } => foreach_subarg_impl(option, base, parent, f),
        _ => {}
    }
}

pub fn foreach_subarg<'a, F>(arg: &'a Arg, mut f: F)
where
    F: FnMut(&'a Arg, Option<&'a Arg>, Option<&'a [Arg]>),
{
    foreach_subarg_impl(arg, None, None, &mut f);
}

pub fn foreach_arg_array<'a, F>(args: &'a [Arg], ret: Option<&'a Arg>, mut f: F)
where
    F: FnMut(&'a Arg, Option<&'a Arg>, Option<&'a [Arg]>),
{
    for arg in args {
        foreach_subarg_impl(arg, None, Some(args), &mut f);
    }
    if let Some(ret) = ret {
        foreach_subarg_impl(ret, None, None, &mut f);
    }
}

/// Walks the call's arguments; the return value is not visited.
pub fn foreach_arg<'a, F>(call: &'a Call, f: F)
where
    F: FnMut(&'a Arg, Option<&'a Arg>, Option<&'a [Arg]>),
{
    foreach_arg_array(&call.args, None, f);
}

/// Pre-order mutable walk along the same edges as `foreach_subarg`. The
/// visitor may rewrite values; children are read after it returns.
pub fn foreach_subarg_mut<F>(arg: &mut Arg, f: &mut F) -> Result<(), Fault>
where
    F: FnMut(&mut Arg) -> Result<(), Fault>,
{
    f(arg)?;
    match &mut arg.kind {
        ArgKind::Group { inner } => {
            for arg1 in inner {
                foreach_subarg_mut(arg1, f)?;
            }
        }
        ArgKind::Pointer { res: Some(res), .. } => foreach_subarg_mut(res, f)?,
        ArgKind::Union { option } => foreach_subarg_mut(option, f)?,
        _ => {}
    }
    Ok(())
}

pub fn foreach_arg_mut<F>(call: &mut Call, mut f: F) -> Result<(), Fault>
where
    F: FnMut(&mut Arg) -> Result<(), Fault>,
{
    for arg in &mut call.args {
        foreach_subarg_mut(arg, &mut f)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dir, Syscall, Type};

    fn leaf(name: &str) -> Arg {
        Arg::constant(Type::int(name, 4), 0)
    }

    // ptr -> struct { a, arr [ b, c ], u(d) }
    fn sample() -> Arg {
        let arr = Arg::group(Type::array("arr", Dir::In), vec![leaf("b"), leaf("c")]);
        let un = Arg::union(Type::union("u", Dir::In, 0), leaf("d"));
        let st = Arg::group(Type::structure("st", Dir::In), vec![leaf("a"), arr, un]);
        Arg::pointer(Type::ptr("p"), 0, 0, Some(st))
    }

    #[test]
    fn visits_every_node_in_order() {
        let root = sample();
        let mut names = vec![];
        foreach_subarg(&root, |arg, _, _| names.push(arg.typ.name.clone()));
        assert_eq!(names, ["p", "st", "a", "arr", "b", "c", "u", "d"]);
    }

    #[test]
    fn scope_only_changes_at_structs() {
        let root = sample();
        let mut scopes = vec![];
        foreach_subarg(&root, |arg, _, parent| {
            let names: Vec<String> = parent
                .unwrap_or_default()
                .iter()
                .map(|a| a.typ.name.clone())
                .collect();
            scopes.push((arg.typ.name.clone(), names));
        });
        let st_fields = vec!["a".to_owned(), "arr".to_owned(), "u".to_owned()];
        for (name, scope) in &scopes {
            match name.as_str() {
                "p" | "st" => assert!(scope.is_empty(), "{name}"),
                // array elements and union options keep the struct's scope
                _ => assert_eq!(scope, &st_fields, "{name}"),
            }
        }
    }

    #[test]
    fn base_is_the_dereferenced_pointer() {
        let root = sample();
        foreach_subarg(&root, |arg, base, _| {
            if arg.typ.name == "p" {
                assert!(base.is_none());
            } else {
                assert!(std::ptr::eq(base.unwrap(), &root));
            }
        });
    }

    #[test]
    fn call_walk_uses_top_level_scope_and_skips_ret() {
        let meta = Syscall::new(0, "open", vec![], Some(Type::int("ret", 4)));
        let call = Call::new(meta, vec![leaf("x"), leaf("y")]);
        let mut seen = vec![];
        foreach_arg(&call, |arg, _, parent| {
            assert_eq!(parent.map(<[Arg]>::len), Some(2));
            seen.push(arg.typ.name.clone());
        });
        assert_eq!(seen, ["x", "y"]);

        let mut with_ret = vec![];
        foreach_arg_array(&call.args, call.ret.as_ref(), |arg, _, parent| {
            with_ret.push((arg.typ.name.clone(), parent.is_some()));
        });
        assert_eq!(with_ret.last(), Some(&("ret".to_owned(), false)));
    }

    #[test]
    fn mutable_walk_reaches_pointees() {
        let mut root = sample();
        foreach_subarg_mut(&mut root, &mut |arg| {
            if let ArgKind::Const { val } = &mut arg.kind {
                *val += 1;
            }
            Ok(())
        })
        .unwrap();
        let mut vals = vec![];
        foreach_subarg(&root, |arg, _, _| vals.extend(arg.val()));
        assert_eq!(vals, [1, 1, 1, 1]);
    }
}
