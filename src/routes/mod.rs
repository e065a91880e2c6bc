mod backend;
mod health_check;
mod home;
mod waitlist;
pub use backend::*;
pub use health_check::*;
pub use home::*;
pub use waitlist::*;

/// Write the error, then every `source` below it, one per line. Used as the
/// `Debug` impl of our error enums, so that `{:?}` in logs shows the whole
/// chain instead of just the outermost wrapper.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
