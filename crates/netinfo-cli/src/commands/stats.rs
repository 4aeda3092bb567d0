//! `netinfo stats` command implementation

use super::connect;
use crate::error::Result;
use crate::render;
use netinfo_core::LookupService;

pub async fn run(connection_string: Option<&str>, json: bool) -> Result<()> {
    let stats = LookupService::new(connect(connection_string).await?)
        .stats()
        .await?;

    if json {
        println!("{}", render::json(&stats)?);
    } else {
        print!("{}", render::stats(&stats));
    }
    Ok(())
}
