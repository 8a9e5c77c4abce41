mod contact;
mod health_check;
mod payload;
mod webhook;

pub use contact::*;
pub use health_check::*;
pub use payload::*;
pub use webhook::*;

/// Writes the error and every source in its chain, one per line.
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
