//! LicenseForge operator CLI
//!
//! Usage:
//!   licenseforge keygen --algorithm ecdsa --symmetric
//!   licenseforge issue --customer C-1 --module log=true --not-after 2026-01-01 --encrypt
//!   licenseforge validate license.lic
//!   licenseforge fingerprint
//!
//! Key locations come from LICENSEFORGE_* environment variables unless
//! overridden by flags.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use licenseforge_cli::{
    ValidationReport, parse_limit, parse_module, parse_timestamp, resolve_key_config,
    write_key_files,
};
use licenseforge_crypto::Algorithm;
use licenseforge_engine::{
    KeyConfig, KeyMaterial, LicenseArtifact, LicenseClaims, LicenseEngine, MachineFingerprint,
    MachineInfo,
};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "licenseforge")]
#[command(about = "Issue and validate signed software licenses")]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a key pair and optionally a symmetric key
    Keygen {
        /// Signature algorithm (rsa or ecdsa)
        #[arg(short, long, default_value = "rsa")]
        algorithm: Algorithm,

        /// Directory to write the key files into
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Also write a 32-byte symmetric key for license encryption
        #[arg(long)]
        symmetric: bool,

        /// Overwrite existing key files
        #[arg(long)]
        force: bool,
    },

    /// Sign (and optionally encrypt) a new license
    Issue {
        #[command(flatten)]
        keys: KeyArgs,

        /// Customer identifier
        #[arg(long)]
        customer: String,

        /// Module flag as name=true|false (repeatable)
        #[arg(long = "module", value_parser = parse_module)]
        modules: Vec<(String, bool)>,

        /// Feature name (repeatable)
        #[arg(long = "feature")]
        features: Vec<String>,

        /// Numeric limit as name=value (repeatable)
        #[arg(long = "limit", value_parser = parse_limit)]
        limits: Vec<(String, u64)>,

        /// Start of validity, RFC 3339 or YYYY-MM-DD (default: now)
        #[arg(long, value_parser = parse_timestamp)]
        not_before: Option<DateTime<Utc>>,

        /// End of validity, RFC 3339 or YYYY-MM-DD (default: 12 months later)
        #[arg(long, value_parser = parse_timestamp)]
        not_after: Option<DateTime<Utc>>,

        /// Bind the license to this machine id
        #[arg(long, conflicts_with = "this_machine")]
        machine_id: Option<String>,

        /// Bind the license to the machine running this command
        #[arg(long)]
        this_machine: bool,

        /// Days the license stays usable after expiry
        #[arg(long, default_value = "0")]
        grace_days: u32,

        /// Encrypt the signed package with the symmetric key
        #[arg(long)]
        encrypt: bool,

        /// Write the artifact here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Validate a license artifact
    Validate {
        #[command(flatten)]
        keys: KeyArgs,

        /// Artifact file, or - for stdin
        artifact: PathBuf,

        /// Require the license to be bound to this machine
        #[arg(long)]
        this_machine: bool,
    },

    /// Print this machine's fingerprint
    Fingerprint,
}

#[derive(Args, Debug)]
struct KeyArgs {
    /// Signature algorithm (overrides LICENSEFORGE_ALGORITHM)
    #[arg(long)]
    algorithm: Option<Algorithm>,

    /// Private key PEM (overrides LICENSEFORGE_PRIVATE_KEY)
    #[arg(long)]
    private_key: Option<PathBuf>,

    /// Public key PEM (overrides LICENSEFORGE_PUBLIC_KEY)
    #[arg(long)]
    public_key: Option<PathBuf>,

    /// Raw 32-byte symmetric key (overrides LICENSEFORGE_SYMMETRIC_KEY)
    #[arg(long)]
    symmetric_key: Option<PathBuf>,
}

impl KeyArgs {
    fn resolve(self) -> Result<KeyConfig> {
        let base = KeyConfig::from_env().context("Invalid key configuration in environment")?;
        Ok(resolve_key_config(
            base,
            self.algorithm,
            self.private_key,
            self.public_key,
            self.symmetric_key,
        ))
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match cli.command {
        Command::Keygen {
            algorithm,
            out_dir,
            symmetric,
            force,
        } => {
            let files = write_key_files(&out_dir, algorithm, symmetric, force)?;
            info!("Wrote {} key pair to {}", algorithm, out_dir.display());
            println!("private key:   {}", files.private_key.display());
            println!("public key:    {}", files.public_key.display());
            if let Some(path) = files.symmetric_key {
                println!("symmetric key: {}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Issue {
            keys,
            customer,
            modules,
            features,
            limits,
            not_before,
            not_after,
            machine_id,
            this_machine,
            grace_days,
            encrypt,
            out,
        } => {
            let config = keys.resolve()?;
            let engine = LicenseEngine::new(
                KeyMaterial::load_from_config(&config).context("Failed to load key material")?,
            );

            let mut builder = LicenseClaims::builder(customer)
                .features(features)
                .grace_period_days(grace_days);
            for (name, enabled) in modules {
                builder = builder.module(name, enabled);
            }
            for (name, value) in limits {
                builder = builder.limit(name, value);
            }
            if let Some(at) = not_before {
                builder = builder.not_before(at);
            }
            if let Some(at) = not_after {
                builder = builder.not_after(at);
            }
            if this_machine {
                builder = builder.machine_id(MachineFingerprint::current().id());
            } else if let Some(id) = machine_id {
                builder = builder.machine_id(id);
            }

            let issued = engine.issue(builder.build()?, encrypt)?;
            let wire = issued.artifact.to_wire()?;
            match out {
                Some(path) => {
                    fs::write(&path, format!("{wire}\n"))
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Wrote license to {}", path.display());
                }
                None => println!("{wire}"),
            }
            eprintln!("license key: {}", issued.key);
            Ok(ExitCode::SUCCESS)
        }

        Command::Validate {
            keys,
            artifact,
            this_machine,
        } => {
            let config = keys.resolve()?;
            let engine = LicenseEngine::new(
                KeyMaterial::load_public_from_config(&config)
                    .context("Failed to load key material")?,
            );

            let wire = read_artifact(&artifact)?;
            let (verdict, claims) = match LicenseArtifact::from_wire(&wire) {
                Ok(parsed) => {
                    let machine = this_machine.then(MachineFingerprint::current);
                    engine.inspect(&parsed, machine.as_ref())
                }
                Err(_) => (engine.validate_wire(&wire), None),
            };

            let report = ValidationReport::new(verdict, claims);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(if verdict.is_usable() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Command::Fingerprint => {
            println!("{}", MachineFingerprint::current());
            println!("{}", serde_json::to_string_pretty(&MachineInfo::collect())?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_artifact(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read artifact from stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
