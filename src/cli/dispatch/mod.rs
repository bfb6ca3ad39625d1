//! Map parsed arguments to the action the binary executes.

use crate::cli::{
    actions::{server::Args, Action},
    commands::{logging, provider, ARG_SESSION_TTL_SECONDS},
};
use crate::logger::Environment;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let provider = provider::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        provider_url: provider.url,
        provider_anon_key: provider.anon_key,
        provider_service_role_key: provider.service_role_key,
        environment: matches
            .get_one::<Environment>(logging::ARG_ENVIRONMENT)
            .copied()
            .unwrap_or_default(),
        session_ttl_seconds: matches
            .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(43_200),
    }))
}
