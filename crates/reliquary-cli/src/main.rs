use anyhow::Result;
use clap::ArgMatches;
use reliquary_cli::{
    build_cli, candidates, digest_file, load_config, pack, unpack, verify, with_verify_flags,
};
use reliquary_core::{ReliquaryConfig, ReliquaryError, VerifyFailure};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn path_arg(args: &ArgMatches, name: &str) -> Result<PathBuf> {
    args.get_one::<PathBuf>(name)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("missing argument <{name}>"))
}

fn strings(args: &ArgMatches, name: &str) -> Vec<String> {
    args.get_many::<String>(name)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

async fn run_verify(config: ReliquaryConfig, args: &ArgMatches) -> Result<ExitCode> {
    let config = with_verify_flags(
        config,
        args.get_one::<u64>("timeout-ms").copied(),
        args.get_one::<usize>("in-flight").copied(),
    );
    config.validate()?;
    let digest = args
        .get_one::<String>("digest")
        .ok_or_else(|| anyhow::anyhow!("missing --digest"))?;
    let candidates = candidates(&strings(args, "uri"), &strings(args, "collector"))?;

    match verify(&config, digest, &candidates).await {
        Ok(verified) => {
            println!("verified: {} ({})", verified.source.uri, verified.source.role);
            println!("  index:    {}", verified.index);
            println!("  size:     {}", verified.content.len());
            println!("  rejected: {}", verified.rejected.len());
            Ok(ExitCode::SUCCESS)
        }
        Err(ReliquaryError::NoVerifiedSourceAvailable(failure)) => {
            println!("no verified source available: {failure}");
            if let VerifyFailure::NoneVerified { attempts } = &failure {
                for attempt in attempts {
                    println!("  [{}] {}: {}", attempt.index, attempt.source.uri, attempt.outcome);
                }
            }
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let matches = build_cli().get_matches();
    init_tracing(matches.get_flag("log-json"));
    let config = load_config(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    match matches.subcommand() {
        Some(("digest", args)) => {
            let file = path_arg(args, "file")?;
            println!("{}", digest_file(&file)?);
        }
        Some(("pack", args)) => {
            let chunk_size = args
                .get_one::<usize>("chunk-size")
                .copied()
                .unwrap_or(config.store.max_chunk_size);
            let report = pack(&path_arg(args, "file")?, &path_arg(args, "out")?, chunk_size)?;
            println!("chunks:     {}", report.chunks);
            println!("original:   {} bytes", report.original_len);
            println!("compressed: {} bytes", report.compressed_len);
            println!("digest:     {}", report.digest);
        }
        Some(("unpack", args)) => {
            let len = unpack(
                &path_arg(args, "dir")?,
                &path_arg(args, "out")?,
                config.codec.max_decompressed_len,
            )?;
            println!("restored {len} bytes");
        }
        Some(("verify", args)) => return run_verify(config, args).await,
        _ => {}
    }
    Ok(ExitCode::SUCCESS)
}
