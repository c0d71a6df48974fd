//! Sends one SOAP action with a body read from a file and prints the response.
//!
//! ```text
//! cargo run -p pmosoapclient --example soap_call -- soap.yaml urn:example#DoThing body.xml
//! ```
//!
//! The endpoint comes from the YAML config (or `PMOSOAP_CONFIG__URL`).

use std::{env, fs, process};

use anyhow::{Context, Result};
use pmosoap::decode_fault;
use pmosoapclient::{SoapClient, SoapClientConfig, SoapError};

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        eprintln!("usage: {} <config.yaml> <soap-action> <body.xml>", args[0]);
        process::exit(2);
    }

    let config = SoapClientConfig::load(&args[1])?;
    let body = fs::read_to_string(&args[3])
        .with_context(|| format!("Cannot read request body from {}", args[3]))?;

    println!("POST {} (SOAPAction: {})", config.url, args[2]);
    let client = SoapClient::from_config(config, None::<()>);

    match client.call_raw(&args[2], &body) {
        Ok(response) if response.is_empty() => println!("(empty response)"),
        Ok(response) => println!("{}", String::from_utf8_lossy(&response)),
        Err(SoapError::HttpStatus { status, body }) => {
            match decode_fault(body.as_bytes()) {
                Ok(Some(fault)) => println!(
                    "HTTP {status}: fault code={} string={} actor={} detail={}",
                    fault.fault_code.as_deref().unwrap_or("-"),
                    fault.fault_string.as_deref().unwrap_or("-"),
                    fault.fault_actor.as_deref().unwrap_or("-"),
                    fault.detail.as_deref().unwrap_or("-"),
                ),
                _ => println!("HTTP {status}:\n{body}"),
            }
            process::exit(1);
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
