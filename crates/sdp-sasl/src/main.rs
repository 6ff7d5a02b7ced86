// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SDP SASL CLI
//!
//! Diagnostic tool for building, decoding and verifying SDP tokens.
//!
//! # Usage
//!
//! ```bash
//! # Build a client token
//! sdp-sasl token --username "app-1 1700000000 1 sig" --password ""
//!
//! # Decode a token
//! sdp-sasl decode AGFwcC0xIDE3MDAwMDAwMDAgMSBzaWcA
//!
//! # Verify a token against the static principals of a config file
//! sdp-sasl verify AGFwcC0xIDE3MDAwMDAwMDAgMSBzaWcA --config sdp-sasl.toml
//!
//! # Generate / validate configuration
//! sdp-sasl gen-config --output sdp-sasl.toml
//! sdp-sasl validate --config sdp-sasl.toml
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{Parser, Subcommand};
use sdp_sasl::{
    build_initial_token, decode, IdentityVerifier, SaslConfig, SaslServer, SdpSaslServer,
    StaticIdentityService,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// SDP SASL mechanism tool
#[derive(Parser, Debug)]
#[command(name = "sdp-sasl")]
#[command(about = "SDP SASL mechanism - token diagnostics and configuration")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the client token and print it as base64
    Token {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, default_value = "")]
        password: String,
    },

    /// Decode a base64 token and print its fields
    Decode {
        /// Base64-encoded token
        token: String,
    },

    /// Run the server mechanism on a base64 token
    Verify {
        /// Base64-encoded token
        token: String,

        /// Configuration file with static principals
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "sdp-sasl.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Commands::Token { username, password } => cmd_token(&username, &password),
        Commands::Decode { token } => cmd_decode(&token),
        Commands::Verify { token, config } => cmd_verify(&token, config),
        Commands::GenConfig { output } => cmd_gen_config(output),
        Commands::Validate { config } => cmd_validate(config),
    }
}

fn cmd_token(username: &str, password: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", STANDARD.encode(build_initial_token(username, password)));
    Ok(())
}

fn cmd_decode(token: &str) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = STANDARD.decode(token.trim())?;
    let decoded = decode(&bytes)?;
    let info = decoded.authentication_info();

    println!(
        "Authorization id: {}",
        decoded.authorization_id().unwrap_or("(none)")
    );
    println!("Client id:        {}", info.client_id());
    println!("Timestamp:        {}", info.timestamp());
    println!("Sequence:         {}", info.sequence());
    println!("Signature:        <{} bytes>", info.signature().len());
    Ok(())
}

fn cmd_verify(token: &str, config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = SaslConfig::from_file(&config_path)?;
    let bytes = STANDARD.decode(token.trim())?;

    let service = StaticIdentityService::new(config.identity.principals);
    let mut server = SdpSaslServer::new(IdentityVerifier::new(Arc::new(service)));

    match server.process_token(&bytes) {
        Ok(_) => {
            println!("Authenticated as: {}", server.authorization_id()?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Authentication failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_gen_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = SaslConfig::example();
    let toml_str = toml::to_string_pretty(&config)?;

    // Add comments
    let content = format!(
        r#"# SDP SASL Configuration
# Generated by sdp-sasl gen-config

{}
"#,
        toml_str
    );

    std::fs::write(&output, content)?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    match SaslConfig::from_file(&config_path) {
        Ok(config) => {
            println!("Configuration valid!");
            println!();
            println!("Server:     {}/{}", config.protocol, config.server_name);
            println!("Max frame:  {} bytes", config.max_frame_size);
            println!("Connection: {}", config.connection_impl);
            println!("Principals: {}", config.identity.principals.len());
            for (i, principal) in config.identity.principals.iter().enumerate() {
                println!(
                    "  [{}] {} ({})",
                    i,
                    principal.client_id,
                    principal.name.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            std::process::exit(1);
        }
    }
}
