/// Logs a formatted message at debug level: `debugf!(logger, "x = {x}")`.
#[macro_export]
macro_rules! debugf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.debugf(::std::format_args!($($arg)+))
    };
}

/// Logs a formatted message at info level.
#[macro_export]
macro_rules! infof {
    ($logger:expr, $($arg:tt)+) => {
        $logger.infof(::std::format_args!($($arg)+))
    };
}

/// Logs a formatted message at warn level.
#[macro_export]
macro_rules! warnf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.warnf(::std::format_args!($($arg)+))
    };
}

/// Logs a formatted message at error level. An error value given with
/// `error = <expr>;` attaches its message and a stack trace:
///
/// ```ignore
/// errorf!(logger, error = err; "unable to load {}", path.display());
/// errorf!(logger, "{} retries left", retries);
/// ```
///
/// The value must implement [`std::error::Error`]. For a boxed error,
/// dereference it: `errorf!(logger, error = *boxed; "...")`.
#[macro_export]
macro_rules! errorf {
    ($logger:expr, error = $err:expr; $($arg:tt)+) => {
        $logger.errorf(
            ::std::option::Option::Some(&$err as &dyn ::std::error::Error),
            ::std::format_args!($($arg)+),
        )
    };
    ($logger:expr, $($arg:tt)+) => {
        $logger.errorf(::std::option::Option::None, ::std::format_args!($($arg)+))
    };
}

/// Logs a formatted message at fatal level, then exits the process.
#[macro_export]
macro_rules! fatalf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.fatalf(::std::format_args!($($arg)+))
    };
}
