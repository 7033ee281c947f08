//! Bare-name error identities.
//!
//! An identity is the type's name with its module path, generic arguments
//! and any pointer indirection (`&`, `&mut`, raw pointers, `Box`, `Arc`,
//! `Rc`) removed. A trait object is named by its principal trait, without
//! `dyn` and the auto-trait bounds. Two unrelated types with the same bare name share an
//! identity; use explicit identities where that matters.

use std::any::type_name;

const DEFAULT_ALLOCATOR: &str = ", alloc::alloc::Global";
const POINTER_WRAPPERS: &[&str] = &["alloc::boxed::Box<", "alloc::sync::Arc<", "alloc::rc::Rc<"];

/// Identity of `E` as carried in `errorType`.
///
/// ```
/// use funcwire::remote::error_identity;
///
/// assert_eq!(error_identity::<std::io::Error>(), "Error");
/// assert_eq!(error_identity::<&std::fmt::Error>(), "Error");
/// ```
pub fn error_identity<E: ?Sized>() -> &'static str {
    bare_type_name(type_name::<E>())
}

/// Strip indirection, generics and module path from a type name.
pub fn bare_type_name(full: &str) -> &str {
    let mut name = full.trim();
    loop {
        if let Some(rest) = name.strip_prefix('&') {
            name = rest.trim_start().trim_start_matches("mut ").trim_start();
            continue;
        }
        if let Some(rest) = name
            .strip_prefix("*const ")
            .or_else(|| name.strip_prefix("*mut "))
            .or_else(|| name.strip_prefix("dyn "))
        {
            name = rest.trim_start();
            continue;
        }
        let unwrapped = POINTER_WRAPPERS
            .iter()
            .find_map(|wrapper| name.strip_prefix(wrapper))
            .and_then(|inner| inner.strip_suffix('>'))
            .map(|inner| inner.strip_suffix(DEFAULT_ALLOCATOR).unwrap_or(inner));
        match unwrapped {
            Some(inner) => name = inner.trim(),
            None => break,
        }
    }

    let base = name.split('<').next().unwrap_or(name);
    let base = base.split(" + ").next().unwrap_or(base);
    base.rsplit("::").next().unwrap_or(base)
}
