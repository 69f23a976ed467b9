//! Service bootstrap probe.
//!
//! # Responsibility
//! - Load config, start logging and open the database like the service does.
//! - Print a deterministic summary for quick local sanity checks.
//!
//! Usage: `dmail_cli [config.toml]`

use dmail_core::db::journal_mode;
use dmail_core::db::migrations::current_user_version;
use dmail_core::{
    init_from_config, open_pool, Mall, MallService, PaginationFilter, ServiceConfig, User,
    UserService, MAX_PAGE_SIZE,
};
use log::error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_exit module=cli status=error error={message}");
            eprintln!("dmail_cli: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = match std::env::args().nth(1) {
        Some(path) => ServiceConfig::from_file(&path).map_err(|err| err.to_string())?,
        None => ServiceConfig::default(),
    };
    init_from_config(&config.logging)?;

    let pool = open_pool(&config.database).map_err(|err| err.to_string())?;
    {
        let conn = pool.get().map_err(|err| err.to_string())?;
        let mode = journal_mode(&conn).map_err(|err| err.to_string())?;
        let version = current_user_version(&conn).map_err(|err| err.to_string())?;
        println!("dmail_core version={}", dmail_core::core_version());
        println!("database path={}", config.database.path.display());
        println!("database journal_mode={mode} schema_version={version}");
    }

    let users = UserService::open(pool.clone()).map_err(|err| err.to_string())?;
    let malls = MallService::open(pool).map_err(|err| err.to_string())?;
    let first_users = users
        .list(&PaginationFilter::new(User::default()).with_page(0, MAX_PAGE_SIZE))
        .map_err(|err| err.to_string())?;
    let first_malls = malls
        .list(&PaginationFilter::new(Mall::default()).with_page(0, MAX_PAGE_SIZE))
        .map_err(|err| err.to_string())?;
    println!(
        "live users (first page)={} live malls (first page)={}",
        first_users.len(),
        first_malls.len()
    );
    Ok(())
}
