//! Category-gated logging.
//!
//! Each subsystem logs under a named category which can be toggled at runtime,
//! optionally by wildcard. Output goes to a raw fd (stderr by default) so the
//! host can redirect it without touching the core.

use libc::c_int;
use std::sync::atomic::{AtomicI32, Ordering};

pub mod categories {
    use std::sync::atomic::AtomicBool;

    pub struct Category {
        pub name: &'static str,
        pub description: &'static str,
        pub enabled: AtomicBool,
    }

    /// Macro to declare a static variable identified by $var,
    /// with the given name and description, and optionally enabled by default.
    macro_rules! declare_category {
        (
            ($var:ident, $name:literal, $description:literal, $enabled:expr)
        ) => {
            pub static $var: Category = Category {
                name: $name,
                description: $description,
                enabled: AtomicBool::new($enabled),
            };
        };
        (
            ($var:ident, $name:expr, $description:expr)
        ) => {
            declare_category!(($var, $name, $description, false));
        };
    }

    macro_rules! category_name {
        (($var:ident, $name:literal, $description:literal, $enabled:expr)) => {
            $var
        };
        (($var:ident, $name:literal, $description:literal)) => {
            $var
        };
    }

    macro_rules! categories {
        (
            // A repetition of categories, separated by semicolons.
            $($cats:tt);*

            // Allow trailing semicolon.
            $(;)?
        ) => {
            // Declare each category.
            $(
                declare_category!($cats);
            )*

            // Define a function which gives you a Vector of all categories.
            pub fn all_categories() -> Vec<&'static Category> {
                vec![
                    $(
                        & category_name!($cats),
                    )*
                ]
            }
        };
    }

    categories!(
        (error, "error", "Serious unexpected errors (on by default)", true);

        (warning, "warning", "Warnings (on by default)", true);

        (input, "input", "Input event queue reads and writes");

        (cooked_read, "cooked-read", "The line-edit read state machine");

        (raw_read, "raw-read", "Character-mode stream reads");

        (wait, "wait", "Suspended reads and their revival");

        (dbcs, "dbcs", "OEM codepage translation and the lead-byte carry");

        (screen, "screen", "Echo output and cursor bookkeeping");
    );
}

/// FLOG formats values. By default we would like to use Display, and fall back to Debug.
/// However that would require specialization. So instead we make two "separate" traits, bring
/// them both in scope, and let Rust figure it out.
/// Clients can opt a Debug type into Floggable by implementing FloggableDebug:
///    impl FloggableDebug for MyType {}
pub trait FloggableDisplay {
    /// Return a string representation of this thing.
    fn to_flog_str(&self) -> String;
}

impl<T: std::fmt::Display> FloggableDisplay for T {
    fn to_flog_str(&self) -> String {
        self.to_string()
    }
}

pub trait FloggableDebug: std::fmt::Debug {
    fn to_flog_str(&self) -> String {
        format!("{:?}", self)
    }
}

/// Write to our FLOG file.
pub fn flog_impl(s: &str) {
    let fd = get_flog_file_fd();
    if fd < 0 {
        return;
    }
    let _ = write_to_fd(s.as_bytes(), fd);
}

/// The entry point for flogging.
#[macro_export]
macro_rules! FLOG {
    ($category:ident, $($elem:expr),+ $(,)*) => {
        if $crate::flog::categories::$category.enabled.load(std::sync::atomic::Ordering::Relaxed) {
            #[allow(unused_imports)]
            use $crate::flog::{FloggableDisplay, FloggableDebug};
            let mut vs = vec![format!("{}:", $crate::flog::categories::$category.name)];
            $(
                {
                   vs.push($elem.to_flog_str())
                }
            )+
            // We don't use locking here so we have to append our own newline to avoid multiple writes.
            let mut v = vs.join(" ");
            v.push('\n');
            $crate::flog::flog_impl(&v);
        }
    };
}

#[macro_export]
macro_rules! should_flog {
    ($category:ident) => {
        $crate::flog::categories::$category
            .enabled
            .load(std::sync::atomic::Ordering::Relaxed)
    };
}

pub use {should_flog, FLOG};

/// For each category, if its name matches the wildcard, set its enabled to the given sense.
/// Only a trailing `*` is supported; the host's debug strings have never needed more.
fn apply_one_wildcard(wc: &str, sense: bool) {
    let mut match_found = false;
    let matches = |name: &str| match wc.strip_suffix('*') {
        Some(prefix) => name.starts_with(prefix),
        None => name == wc,
    };
    for cat in categories::all_categories() {
        if matches(cat.name) {
            cat.enabled.store(sense, Ordering::Relaxed);
            match_found = true;
        }
    }
    if !match_found {
        eprintln!("Failed to match debug category: {wc}");
    }
}

/// Set the active flog categories according to the given wildcard `wc`.
pub fn activate_flog_categories_by_pattern(wc: &str) {
    // Normalize underscores to dashes, allowing the user to be sloppy.
    let wc = wc.replace('_', "-");
    for s in wc.split(',') {
        if let Some(rest) = s.strip_prefix('-') {
            apply_one_wildcard(rest, false);
        } else {
            apply_one_wildcard(s, true);
        }
    }
}

/// The flog output fd. Defaults to stderr. A value < 0 disables flog.
static FLOG_FD: AtomicI32 = AtomicI32::new(libc::STDERR_FILENO);

pub fn set_flog_file_fd(fd: c_int) {
    FLOG_FD.store(fd, Ordering::Relaxed);
}

#[inline]
pub fn get_flog_file_fd() -> c_int {
    FLOG_FD.load(Ordering::Relaxed)
}

/// Write the given data to the fd, retrying on EINTR.
fn write_to_fd(data: &[u8], fd: c_int) -> std::io::Result<usize> {
    let mut written = 0;
    while written < data.len() {
        let amt = unsafe {
            libc::write(
                fd,
                data[written..].as_ptr() as *const libc::c_void,
                data.len() - written,
            )
        };
        if amt < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() != std::io::ErrorKind::Interrupted {
                return Err(err);
            }
        } else {
            written += amt as usize;
        }
    }
    Ok(written)
}
