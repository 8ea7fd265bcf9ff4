use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chunkwise_core::{
    ChunkFetcher, ChunkStatus, DEFAULT_CHUNK_SIZE, FetchRequest, Manifest, ManifestSource,
    ReassembleOptions, Reassembly, SplitOptions,
};
use chunkwise_fetch::ReqwestClient;
use tracing::{info, warn};

use crate::cli::{DigestArg, FetchArg, ReassembleArg, SplitArg, VerifyArg};
use crate::config::Config;
use crate::progress;

const DEFAULT_OUTPUT_DIR: &str = "output_chunks";
const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

pub fn split(arg: SplitArg, config: &Config) -> Result<()> {
    let chunk_size = match arg.chunk_size {
        Some(size) => size,
        None => config.chunk_size()?.unwrap_or(DEFAULT_CHUNK_SIZE),
    };
    let output_dir = arg
        .output_dir
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let mut options = SplitOptions::new(output_dir)
        .chunk_size(chunk_size)
        .sync(config.sync.unwrap_or(true));
    if let Some(version) = arg.tag.or_else(|| config.version.clone()) {
        options = options.version(version);
    }
    if let Some(width) = arg.width.or(config.index_width) {
        options = options.index_width(width);
    }

    let outcome = chunkwise_core::split(&arg.file, &options)
        .with_context(|| format!("failed to split {}", arg.file.display()))?;
    println!(
        "{} chunks, {} bytes -> {}",
        outcome.manifest.len(),
        outcome.manifest.total_size(),
        outcome.manifest_path.display()
    );
    Ok(())
}

/// Directory part of a URL, used as the chunk base when none is given.
fn url_dir(url: &str) -> Option<&str> {
    let (dir, _) = url.rsplit_once('/')?;
    (!dir.ends_with('/')).then_some(dir)
}

fn resolve_base_url(arg: &FetchArg, source: &ManifestSource, config: &Config) -> Result<String> {
    if let Some(base) = arg.base_url.as_ref().or(config.base_url.as_ref()) {
        return Ok(base.clone());
    }
    match source {
        ManifestSource::Url(url) => url_dir(url)
            .map(str::to_string)
            .with_context(|| format!("cannot derive a base URL from {url}; pass --base-url")),
        _ => bail!("a local manifest needs --base-url (or base_url in the config)"),
    }
}

pub fn fetch(arg: FetchArg, config: &Config, quiet: bool) -> Result<()> {
    let source = ManifestSource::parse(&arg.manifest);
    let base_url = resolve_base_url(&arg, &source, config)?;
    let local_dir = arg
        .dir
        .or_else(|| config.download_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR));
    let reassembly = match arg.reassemble {
        None => Reassembly::Skip,
        Some(None) => Reassembly::Default,
        Some(Some(out)) => Reassembly::To(out),
    };

    let client = ReqwestClient::with_connect_timeout(config.connect_timeout())
        .context("failed to build HTTP client")?;
    let pb = progress::fetch_bar(quiet);
    let sync = config.sync.unwrap_or(true);
    let fetcher = ChunkFetcher::new(client)
        .sync(sync)
        .with_reassemble_options(ReassembleOptions::new().sync(sync))
        .on_progress(progress::track(pb.clone()));
    let request = FetchRequest::new(source, base_url, local_dir).reassemble(reassembly);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let result = runtime.block_on(fetcher.fetch(&request));
    pb.finish_and_clear();
    let outcome = result.with_context(|| format!("failed to fetch {}", arg.manifest))?;

    println!(
        "{} downloaded, {} already present in {}",
        outcome.downloaded,
        outcome.skipped,
        request.local_dir.display()
    );
    if let Some(done) = outcome.reassembled {
        println!("{}  {}", done.checksum, done.path.display());
    }
    Ok(())
}

fn manifest_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn load_manifest(path: &Path) -> Result<Manifest> {
    Manifest::load(path).with_context(|| format!("failed to load manifest {}", path.display()))
}

pub fn reassemble(arg: ReassembleArg, config: &Config) -> Result<()> {
    let manifest = load_manifest(&arg.manifest)?;
    let chunk_dir = arg.chunks.unwrap_or_else(|| manifest_dir(&arg.manifest));
    let output = match arg.output {
        Some(output) => output,
        None => match manifest.original_name() {
            Some(name) => chunk_dir.join(name),
            None => bail!("cannot infer the output name from the manifest; pass --output"),
        },
    };
    if arg.no_verify {
        warn!("chunk verification disabled");
    }

    let options = ReassembleOptions::new()
        .verify(!arg.no_verify)
        .sync(config.sync.unwrap_or(true));
    let outcome = chunkwise_core::reassemble(&manifest, &chunk_dir, &output, options)
        .with_context(|| format!("failed to reassemble {}", output.display()))?;

    if let Some(expected) = arg.expect {
        if outcome.checksum != expected {
            bail!(
                "{} has checksum {}, expected {expected}",
                outcome.path.display(),
                outcome.checksum
            );
        }
        info!("whole-file checksum matches");
    }
    println!("{}  {}", outcome.checksum, outcome.path.display());
    Ok(())
}

fn describe(status: &ChunkStatus) -> String {
    match status {
        ChunkStatus::Valid => "ok".to_string(),
        ChunkStatus::Missing => "missing".to_string(),
        ChunkStatus::WrongSize { actual } => format!("wrong size ({actual} bytes)"),
        ChunkStatus::Corrupt { actual } => format!("corrupt ({actual})"),
    }
}

pub fn verify(arg: VerifyArg) -> Result<()> {
    let manifest = load_manifest(&arg.manifest)?;
    let chunk_dir = arg.chunks.unwrap_or_else(|| manifest_dir(&arg.manifest));
    let reports = chunkwise_core::verify_chunks(&manifest, &chunk_dir)
        .with_context(|| format!("failed to check chunks in {}", chunk_dir.display()))?;

    let mut bad = 0;
    for report in &reports {
        if !report.status.is_valid() {
            bad += 1;
        }
        println!("{:>6}  {:<8}  {}", report.sequence_index, describe(&report.status), report.name);
    }
    if bad > 0 {
        bail!("{bad} of {} chunks failed verification", reports.len());
    }
    Ok(())
}

pub fn digest(arg: DigestArg) -> Result<()> {
    for file in &arg.files {
        let checksum = chunkwise_verify::digest_file(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        println!("{checksum}  {}", file.display());
    }
    Ok(())
}
