//! Assertion macros.
//!
//! Every failed assertion fails the running test through the same fail-now
//! signal, with file, line and the condition text in the reason. A plain std
//! `assert!` also fails the test, but as a fault.

/// Fail the running test with a located assertion message.
#[doc(hidden)]
#[cold]
pub fn __assertion_failure(file: &str, line: u32, detail: std::fmt::Arguments<'_>) -> ! {
    crate::signal::fail(format!("Assertion failed at {file}:{line}: {detail}"))
}

/// Fail the running test unless `cond` holds.
#[macro_export]
macro_rules! kassert {
    ($cond:expr $(,)?) => {
        if !$cond {
            $crate::assert::__assertion_failure(
                file!(),
                line!(),
                format_args!("{}", stringify!($cond)),
            );
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::assert::__assertion_failure(
                file!(),
                line!(),
                format_args!("{}: {}", stringify!($cond), format_args!($($arg)+)),
            );
        }
    };
}

/// Fail the running test unless `left == right`.
#[macro_export]
macro_rules! kassert_eq {
    ($left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left, right) => {
                if !(*left == *right) {
                    $crate::assert::__assertion_failure(
                        file!(),
                        line!(),
                        format_args!(
                            "{} == {} (left: {:?}, right: {:?})",
                            stringify!($left),
                            stringify!($right),
                            left,
                            right
                        ),
                    );
                }
            }
        }
    };
}

/// Fail the running test if `left == right`.
#[macro_export]
macro_rules! kassert_ne {
    ($left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left, right) => {
                if *left == *right {
                    $crate::assert::__assertion_failure(
                        file!(),
                        line!(),
                        format_args!(
                            "{} != {} (both: {:?})",
                            stringify!($left),
                            stringify!($right),
                            left
                        ),
                    );
                }
            }
        }
    };
}

/// Fail the running test unconditionally.
#[macro_export]
macro_rules! kfail {
    () => {
        $crate::assert::__assertion_failure(file!(), line!(), format_args!("explicit failure"))
    };
    ($($arg:tt)+) => {
        $crate::assert::__assertion_failure(file!(), line!(), format_args!($($arg)+))
    };
}

/// Register a test case in [`REGISTERED_TESTS`](crate::registry::REGISTERED_TESTS).
///
/// The calling crate needs `linkme` as a dependency, like any crate that adds
/// elements to a distributed slice.
///
/// ```text
/// fn adds() { kassert_eq!(1 + 1, 2); }
/// ktest::register_test!(math, add, adds);
/// ktest::register_test!(math, add_fixture, adds, setup = make_table, teardown = drop_table);
/// ```
#[macro_export]
macro_rules! register_test {
    ($suite:ident, $name:ident, $body:path $(,)?) => {
        $crate::register_test!(
            $suite,
            $name,
            $body,
            setup = $crate::registry::noop,
            teardown = $crate::registry::noop
        );
    };
    ($suite:ident, $name:ident, $body:path, setup = $setup:path, teardown = $teardown:path $(,)?) => {
        const _: () = {
            #[$crate::__linkme::distributed_slice($crate::registry::REGISTERED_TESTS)]
            #[allow(unsafe_code, reason = "linkme places elements with #[link_section]")]
            static DESCRIPTOR: $crate::registry::TestDescriptor = $crate::registry::TestDescriptor {
                suite: stringify!($suite),
                name: stringify!($name),
                setup: $setup,
                body: $body,
                teardown: $teardown,
                file: file!(),
                line: line!(),
            };
        };
    };
}
