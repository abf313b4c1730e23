// Copyright 2024 Vincent Chan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Command line entry point of the quickstart walkthrough.
//!
//! Run it against a local server with `cargo run --bin quickstart`, or
//! against an embedded database with `cargo run --bin quickstart -- --path /tmp/quickstart-db`.
//!
//! The server is expected on `mongodb://localhost:27017` by default.
//! Pass `--uri` to point somewhere else and `--timeout` to change the
//! ten-second budget shared by all operations.

use std::time::Duration;
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command as App};
use log::{error, info};
use quickstart::config::{DEFAULT_DATABASE, DEFAULT_URI};
use quickstart::{Backend, Config};

const DEFAULT_TIMEOUT_SECS: &str = "10";

fn build_app() -> App {
    App::new("quickstart")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Insert, read, update and delete documents, then clean up")
        .author("Vincent Chan <okcdz@diverse.space>")
        .arg(
            Arg::new("uri")
                .long("uri")
                .help("the connection string of the server")
                .default_value(DEFAULT_URI)
                .num_args(1)
        )
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .value_name("PATH")
                .help("use an embedded database at PATH instead of a server")
                .num_args(1)
        )
        .arg(
            Arg::new("database")
                .long("database")
                .help("the database to create and drop")
                .default_value(DEFAULT_DATABASE)
                .num_args(1)
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("seconds allowed for the whole run")
                .value_parser(clap::value_parser!(u64))
                .default_value(DEFAULT_TIMEOUT_SECS)
                .num_args(1)
        )
        .arg(
            Arg::new("log")
                .help("print debug log")
                .long("log")
                .short('l')
                .action(ArgAction::SetTrue)
        )
}

fn config_from_matches(matches: &ArgMatches) -> Result<Config> {
    let backend = match matches.get_one::<String>("path") {
        Some(path) => Backend::Embedded { path: path.into() },
        None => {
            let uri = matches.get_one::<String>("uri").context("missing --uri")?;
            Backend::Mongo { uri: uri.clone() }
        }
    };
    let database = matches.get_one::<String>("database").context("missing --database")?;
    let timeout = *matches.get_one::<u64>("timeout").context("missing --timeout")?;

    let config = Config {
        backend,
        database: database.clone(),
        timeout: Duration::from_secs(timeout),
    };
    config.validate()?;
    Ok(config)
}

async fn start(matches: &ArgMatches) -> Result<()> {
    let config = config_from_matches(matches).context("invalid arguments")?;
    let report = quickstart::run(&config).await.context("quickstart failed")?;
    info!(
        "finished: {} episode(s) inserted, {} podcast(s) and {} episode(s) deleted",
        report.insert.episode_ids.len(),
        report.delete.deleted_podcasts,
        report.delete.deleted_episodes,
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let matches = build_app().get_matches();

    let level = if matches.get_flag("log") { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = start(&matches).await {
        error!("error: {:?}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use quickstart::Backend;
    use super::{build_app, config_from_matches};

    #[test]
    fn test_defaults() {
        let matches = build_app().try_get_matches_from(["quickstart"]).unwrap();
        let config = config_from_matches(&matches).unwrap();
        assert_eq!(config.backend, Backend::Mongo { uri: "mongodb://localhost:27017".into() });
        assert_eq!(config.database, "quickstart");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_embedded_path() {
        let matches = build_app()
            .try_get_matches_from(["quickstart", "--path", "/tmp/qs", "--timeout", "3"])
            .unwrap();
        let config = config_from_matches(&matches).unwrap();
        assert_eq!(config.backend, Backend::Embedded { path: "/tmp/qs".into() });
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let matches = build_app()
            .try_get_matches_from(["quickstart", "--timeout", "0"])
            .unwrap();
        assert!(config_from_matches(&matches).is_err());
    }
}
