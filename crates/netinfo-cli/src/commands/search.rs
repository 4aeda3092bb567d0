//! `netinfo search` command implementation

use super::connect;
use crate::error::Result;
use crate::render;
use crate::SearchCommand;
use netinfo_core::lookup::validation::{exact_term, sanitize_country, sanitize_term};
use netinfo_core::LookupService;

/// Run a netname, description or country search
pub async fn run(command: &SearchCommand, connection_string: Option<&str>, json: bool) -> Result<()> {
    validate(command)?;

    let service = LookupService::new(connect(connection_string).await?);
    let rows = match command {
        SearchCommand::Netname { name, exact, limit } => {
            service.search_by_netname(name, *limit, *exact).await?
        },
        SearchCommand::Description { text, limit } => {
            service.search_by_description(&text.join(" "), *limit).await?
        },
        SearchCommand::Country {
            code,
            netname,
            limit,
        } => {
            service
                .search_by_country(code, *limit, netname.as_deref())
                .await?
        },
    };

    if json {
        println!("{}", render::json(&rows)?);
    } else {
        print!("{}", render::records(&rows));
    }
    Ok(())
}

/// Same checks the service applies, run before a pool exists
fn validate(command: &SearchCommand) -> Result<()> {
    match command {
        SearchCommand::Netname { name, exact: true, .. } => {
            exact_term(name)?;
        },
        SearchCommand::Netname { name, .. } => {
            sanitize_term(name)?;
        },
        SearchCommand::Description { text, .. } => {
            sanitize_term(&text.join(" "))?;
        },
        SearchCommand::Country { code, netname, .. } => {
            sanitize_country(code)?;
            if let Some(name) = netname {
                sanitize_term(name)?;
            }
        },
    }
    Ok(())
}
