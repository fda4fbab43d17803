// ==========================================================
//  rosident — MikroTik identity resolution tool
// ==========================================================

use rosident::{Credential, IdentityResolver, Outcome, ResolveError, ResolverConfig};
use std::net::IpAddr;

#[tokio::main]
async fn main() -> Result<(), ResolveError> {
    tracing_subscriber::fmt::init();

    let raw_args: Vec<String> = std::env::args().collect();
    let mut args = raw_args.iter().skip(1);

    let mut user = None;
    let mut pass = None;
    let mut port = None;
    let mut budget = None;
    let mut positional = None;

    // Parse command line arguments
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--user" | "-u" => user = args.next().cloned(),
            "--pass" | "-p" => pass = args.next().cloned(),
            "--port" => port = args.next().and_then(|s| s.parse().ok()),
            "--budget" => budget = args.next().and_then(|s| s.parse().ok()),
            "--help" | "-h" => {
                println!("Usage: rosident [OPTIONS] <DEVICE_IP>");
                println!("Options:");
                println!("  -u, --user <NAME>   RouterOS username");
                println!("  -p, --pass <PASS>   RouterOS password");
                println!("      --port <N>      API port (default: 8728)");
                println!("      --budget <MS>   total time budget in milliseconds (default: 45000)");
                println!("  -h, --help          show this help message");
                return Ok(());
            }
            _ => positional = Some(arg.clone()),
        }
    }

    let target = positional.ok_or_else(|| ResolveError::Other("no device address specified".to_string()))?;
    let addr: IpAddr = target
        .parse()
        .map_err(|_| ResolveError::Other(format!("invalid device address: {target}")))?;
    let (user, pass) = match (user, pass) {
        (Some(user), Some(pass)) => (user, pass),
        _ => {
            return Err(ResolveError::Other(
                "both --user and --pass are required".to_string(),
            ))
        }
    };

    let mut config = ResolverConfig::default();
    if let Some(port) = port {
        config.api_ports = vec![port];
    }
    if let Some(budget) = budget {
        config.budget_ms = budget;
    }

    let credentials = vec![Credential::new(user, pass, "cli")];
    let resolver = IdentityResolver::new(config);
    let result = resolver.resolve(addr, &credentials).await;

    match result.outcome {
        Outcome::Resolved => {
            println!(
                "{} -> \"{}\" via {} in {:.1}s",
                addr,
                result.identity.unwrap_or_default(),
                result.method.unwrap_or_default(),
                result.elapsed.as_secs_f64()
            );
        }
        Outcome::Unresolved => {
            println!(
                "{}: no identity ({} attempts in {:.1}s)",
                addr,
                result.attempts.len(),
                result.elapsed.as_secs_f64()
            );
        }
        Outcome::BudgetExhausted => {
            println!(
                "{}: gave up after {:.1}s, budget exhausted ({} attempts)",
                addr,
                result.elapsed.as_secs_f64(),
                result.attempts.len()
            );
        }
        Outcome::NoCredentials => {
            println!("no credentials supplied");
        }
    }
    Ok(())
}
