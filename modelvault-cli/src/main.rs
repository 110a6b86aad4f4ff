use anyhow::{bail, Context, Result};
use clap::Parser;
use modelvault_core::codec::{inspect_bytes, ArchiveCodec, EncryptedCodec};
use modelvault_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use modelvault_core::store::files::write_atomic;
use modelvault_core::{ArchiveFormat, Config, CryptoArchive, SchemeVersion};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zeroize::Zeroizing;

#[derive(Parser, Debug)]
#[command(name = "modelvault")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// Configuration file (defaults to MODELVAULT_* environment variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Encrypt a plain archive file
    Seal {
        input: PathBuf,
        output: PathBuf,

        /// Archive format (json, binary); defaults to the configured one
        #[arg(short, long)]
        format: Option<ArchiveFormat>,

        /// Crypto scheme version to seal with
        #[arg(long)]
        scheme: Option<f64>,
    },

    /// Decrypt a sealed archive file
    Open {
        input: PathBuf,
        output: PathBuf,

        #[arg(short, long)]
        format: Option<ArchiveFormat>,
    },

    /// Describe an archive file without decrypting it
    Inspect {
        input: PathBuf,

        #[arg(short, long)]
        format: Option<ArchiveFormat>,
    },
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Ok(match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::from_env().context("reading MODELVAULT_* environment")?,
    })
}

fn password_from_env(config: &Config) -> Result<Zeroizing<String>> {
    let name = &config.crypto.password_env;
    std::env::var(name)
        .map(Zeroizing::new)
        .with_context(|| format!("set {} to the archive password", name))
}

fn seal_file(
    input: &Path,
    output: &Path,
    format: ArchiveFormat,
    password: &str,
    scheme: SchemeVersion,
) -> Result<()> {
    let bytes = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let plain = format.codec();
    let value = plain
        .decode(&bytes)
        .with_context(|| format!("{} is not a {} archive", input.display(), format))?;
    if CryptoArchive::is_crypto_archive(&value) {
        bail!("{} is already sealed", input.display());
    }

    let sealed = EncryptedCodec::new(plain, password).with_scheme(scheme);
    write_atomic(output, &sealed.encode(&value)?)
        .with_context(|| format!("writing {}", output.display()))?;
    info!(input = %input.display(), output = %output.display(), scheme = %scheme, "sealed archive");
    Ok(())
}

fn open_file(input: &Path, output: &Path, format: ArchiveFormat, password: &str) -> Result<()> {
    let bytes = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let sealed = EncryptedCodec::new(format.codec(), password);
    let value = sealed
        .decode(&bytes)
        .with_context(|| format!("opening {}", input.display()))?;

    write_atomic(output, &format.codec().encode(&value)?)
        .with_context(|| format!("writing {}", output.display()))?;
    info!(input = %input.display(), output = %output.display(), "opened archive");
    Ok(())
}

fn describe_file(input: &Path, format: ArchiveFormat) -> Result<String> {
    let bytes = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let codec = format.codec();
    let summary = inspect_bytes(&bytes, codec.as_ref())
        .with_context(|| format!("{} is not a {} archive", input.display(), format))?;

    let mut lines = vec![
        format!("file:       {}", input.display()),
        format!("size:       {} bytes", bytes.len()),
        format!("format:     {}", format),
        format!("encrypted:  {}", summary.encrypted),
        format!("root class: {}", summary.root_class.as_deref().unwrap_or("-")),
    ];
    if summary.encrypted {
        let sealed = CryptoArchive::from_value(&codec.decode(&bytes)?)?;
        lines.push(format!("scheme:     {}", sealed.version()));
        lines.push(format!("salt:       {}", hex::encode(sealed.salt())));
        lines.push(format!("iv:         {}", hex::encode(sealed.iv())));
    }
    Ok(lines.join("\n"))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = args.log_level.parse::<LogLevel>().unwrap_or_else(|_| {
        eprintln!("Invalid log level '{}', using 'info'", args.log_level);
        LogLevel::Info
    });
    init_logging_with_config(LogConfig::new(log_level).json_format(args.json_logs))?;

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Seal {
            input,
            output,
            format,
            scheme,
        } => {
            let scheme = match scheme {
                Some(version) => SchemeVersion::from_f64(version)?,
                None => config.crypto.scheme_version,
            };
            if scheme < SchemeVersion::CURRENT {
                warn!(scheme = %scheme, "sealing with an outdated scheme");
            }
            let password = password_from_env(&config)?;
            seal_file(
                &input,
                &output,
                format.unwrap_or(config.store.format),
                &password,
                scheme,
            )?;
        }
        Command::Open {
            input,
            output,
            format,
        } => {
            let password = password_from_env(&config)?;
            open_file(&input, &output, format.unwrap_or(config.store.format), &password)?;
        }
        Command::Inspect { input, format } => {
            println!("{}", describe_file(&input, format.unwrap_or(config.store.format))?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelvault_core::PrimitiveValue;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn plain_archive(dir: &TempDir) -> PathBuf {
        let mut payload = BTreeMap::new();
        payload.insert("label".to_string(), PrimitiveValue::from("Buy milk"));
        let mut root = BTreeMap::new();
        root.insert("$class".to_string(), PrimitiveValue::from("TodoItem"));
        root.insert("$payload".to_string(), PrimitiveValue::Mapping(payload));

        let path = dir.path().join("item.json");
        let bytes = ArchiveFormat::Json
            .codec()
            .encode(&PrimitiveValue::Mapping(root))
            .unwrap();
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_seal_inspect_open() {
        let dir = TempDir::new().unwrap();
        let input = plain_archive(&dir);
        let sealed = dir.path().join("item.sealed.json");
        let opened = dir.path().join("item.opened.json");

        seal_file(&input, &sealed, ArchiveFormat::Json, "secret", SchemeVersion::V1).unwrap();
        let description = describe_file(&sealed, ArchiveFormat::Json).unwrap();
        assert!(description.contains("encrypted:  true"));
        assert!(description.contains("root class: TodoItem"));
        assert!(description.contains("scheme:     1.0"));

        open_file(&sealed, &opened, ArchiveFormat::Json, "secret").unwrap();
        assert_eq!(std::fs::read(&opened).unwrap(), std::fs::read(&input).unwrap());
    }

    #[test]
    fn test_open_with_wrong_password() {
        let dir = TempDir::new().unwrap();
        let input = plain_archive(&dir);
        let sealed = dir.path().join("item.sealed.json");

        seal_file(&input, &sealed, ArchiveFormat::Json, "secret", SchemeVersion::V1).unwrap();
        assert!(open_file(&sealed, &dir.path().join("out.json"), ArchiveFormat::Json, "nope").is_err());
    }

    #[test]
    fn test_seal_twice_is_refused() {
        let dir = TempDir::new().unwrap();
        let input = plain_archive(&dir);
        let sealed = dir.path().join("once.json");

        seal_file(&input, &sealed, ArchiveFormat::Json, "pw", SchemeVersion::V1).unwrap();
        let err = seal_file(&sealed, &dir.path().join("twice.json"), ArchiveFormat::Json, "pw", SchemeVersion::V1)
            .unwrap_err();
        assert!(err.to_string().contains("already sealed"));
    }
}
