//! `netinfo lookup` command implementation

use super::connect;
use crate::error::Result;
use crate::render;
use netinfo_core::lookup::validation::parse_ip_or_cidr;
use netinfo_core::LookupService;
use tracing::debug;

/// Print every block containing `address`, most specific first
pub async fn run(address: &str, connection_string: Option<&str>, json: bool) -> Result<()> {
    // Reject bad input before touching the database
    let network = parse_ip_or_cidr(address)?;
    debug!(network = %network, "Looking up");

    let pool = connect(connection_string).await?;
    let rows = LookupService::new(pool).lookup(address).await?;

    if json {
        println!("{}", render::json(&rows)?);
    } else {
        print!("{}", render::records(&rows));
    }
    Ok(())
}
