use env_logger::{Builder, Env, Target};
use log::info;
use std::io::Write;

/// Set up `env_logger` and panic logging for a binary
///
/// `RUST_LOG` overrides the default level, which is `debug` for debug builds
/// and `info` otherwise. Errors go to stderr, everything else to stdout.
pub fn init() {
    log_panics::init();

    let mut builder = if cfg!(debug_assertions) {
        Builder::from_env(Env::default().default_filter_or("debug"))
    } else {
        Builder::from_env(Env::default().default_filter_or("info"))
    };

    builder.format(|f, record| match record.level() {
        log::Level::Error => {
            eprintln!("{}", record.args());
            Ok(())
        }
        _ => {
            writeln!(f, "{}", record.args())
        }
    });

    builder.target(Target::Stdout).init();

    info!("module version: {}", env!("CARGO_PKG_VERSION"));
}
