use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_PROVIDER_URL: &str = "provider-url";
pub const ARG_PROVIDER_ANON_KEY: &str = "provider-anon-key";
pub const ARG_PROVIDER_SERVICE_ROLE_KEY: &str = "provider-service-role-key";

#[derive(Debug)]
pub struct Options {
    pub url: String,
    pub anon_key: SecretString,
    pub service_role_key: SecretString,
}

impl Options {
    /// # Errors
    /// Returns an error if a required provider argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let get = |name: &str| {
            matches
                .get_one::<String>(name)
                .cloned()
                .with_context(|| format!("missing required argument: --{name}"))
        };

        Ok(Self {
            url: get(ARG_PROVIDER_URL)?,
            anon_key: SecretString::from(get(ARG_PROVIDER_ANON_KEY)?),
            service_role_key: SecretString::from(get(ARG_PROVIDER_SERVICE_ROLE_KEY)?),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PROVIDER_URL)
                .long(ARG_PROVIDER_URL)
                .help("Auth provider base URL, example: https://project.supabase.co")
                .env("AUTHSTACK_PROVIDER_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PROVIDER_ANON_KEY)
                .long(ARG_PROVIDER_ANON_KEY)
                .help("Public (anon) API key used for sign in and sign out")
                .env("AUTHSTACK_PROVIDER_ANON_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_PROVIDER_SERVICE_ROLE_KEY)
                .long(ARG_PROVIDER_SERVICE_ROLE_KEY)
                .help("Service role API key used to create and delete accounts")
                .env("AUTHSTACK_PROVIDER_SERVICE_ROLE_KEY")
                .hide_env_values(true)
                .required(true),
        )
}
