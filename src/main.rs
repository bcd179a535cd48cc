mod cli;

use clipgif::config::{self, Config};
use clipgif::conversion::{
    self, human_bytes, ComplianceChecker, ConversionJob, ConversionReport, PolicyTable,
    RawParameters, RequestBuilder, SourceInfo, TranscodeInvoker,
};
use clipgif_av::{probe, ToolRegistry, FFPROBE};
use clipgif_common::ComplianceLimits;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, ConversionArgs};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "clipgif=debug,clipgif_av=debug,clipgif_common=debug".to_string()
        } else {
            "clipgif=info,clipgif_av=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            params,
            timeout,
            ignore_limits,
            json,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert(
                &params,
                cli.config.as_deref(),
                timeout,
                ignore_limits,
                json,
            ))
        }
        Commands::Estimate { params, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(estimate(&params, cli.config.as_deref(), json))
        }
        Commands::Check {
            file,
            max_bytes,
            max_frames,
            json,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(check_file(
                &file,
                cli.config.as_deref(),
                max_bytes,
                max_frames,
                json,
            ))
        }
        Commands::Probe { file, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&file, cli.config.as_deref(), json))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("clipgif {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Probe the source if ffprobe is around. Failure just leaves it unknown.
async fn source_info(tools: &ToolRegistry, input: &Path) -> SourceInfo {
    let Some(ffprobe) = tools.get(FFPROBE) else {
        tracing::debug!("ffprobe not available, source length unknown");
        return SourceInfo::default();
    };
    match probe::probe_with_ffprobe(&ffprobe.path, input).await {
        Ok(info) => SourceInfo::from_media(&info),
        Err(e) => {
            tracing::warn!("Could not probe {:?}: {}", input, e);
            SourceInfo::default()
        }
    }
}

/// Merge command-line parameters over the config defaults and validate them.
async fn build_job(
    params: &ConversionArgs,
    config: &Config,
    tools: &ToolRegistry,
) -> Result<ConversionJob> {
    let defaults = &config.defaults;
    let raw = RawParameters {
        source_path: params.input.clone(),
        start_time: params.start.unwrap_or(defaults.start_time),
        duration: params.duration.unwrap_or(defaults.duration),
        frame_rate: params.fps.unwrap_or(defaults.frame_rate),
        quality: params.quality.unwrap_or(defaults.quality),
        output_width: params.width.unwrap_or(defaults.width),
        dither_mode: params
            .dither
            .clone()
            .unwrap_or_else(|| defaults.dither.clone()),
        palette_size: params.colors.unwrap_or(defaults.colors),
        output_path: params.output.clone(),
        output_dir: params.output_dir.clone().or_else(|| config.output.dir.clone()),
    };

    let source = if params.input.is_file() {
        source_info(tools, &params.input).await
    } else {
        SourceInfo::default()
    };

    let policy = if params.strict {
        PolicyTable::STRICT
    } else {
        PolicyTable::default()
    };
    let builder = RequestBuilder::new(config.quality.bayer_scale.clone(), policy);
    Ok(builder.build(&raw, &source)?)
}

fn print_estimate(estimate: &conversion::Estimate) {
    println!("Estimated output:");
    println!("  Frames: {}", estimate.frames);
    println!("  Resolution: {}x{}", estimate.width, estimate.height);
    println!("  Size: {}", human_bytes(estimate.bytes));
    if estimate.warnings.is_empty() {
        println!("  ✓ Within limits");
    } else {
        for warning in &estimate.warnings {
            println!("  ⚠ {}", warning);
        }
    }
}

fn print_report(report: &ConversionReport) {
    println!("Output: {}", report.output_path.display());
    println!("  Size: {}", human_bytes(report.file_size_bytes));
    println!("  Frames: {}", report.frame_count);
    if report.within_limits {
        println!("✓ Within limits");
    } else {
        println!("✗ Exceeds limits");
        for advice in report.advice() {
            println!("  - {}", advice);
        }
    }
}

async fn convert(
    params: &ConversionArgs,
    config_path: Option<&Path>,
    timeout: Option<u64>,
    ignore_limits: bool,
    json: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let tools = Arc::new(ToolRegistry::discover(&config.tools));

    let job = build_job(params, &config, &tools).await?;
    let estimate = conversion::estimate(&job, &config.limits);
    if !json {
        print_estimate(&estimate);
    }
    if estimate.exceeds_frames(&config.limits) && !ignore_limits {
        anyhow::bail!(
            "{} frames exceeds the {}-frame limit; lower --fps or --duration, or pass --ignore-limits",
            estimate.frames,
            config.limits.max_frames
        );
    }

    let timeout = timeout
        .map(std::time::Duration::from_secs)
        .or_else(|| config.invoke.timeout());
    let mut invoker = TranscodeInvoker::new(tools.clone()).with_timeout(timeout);
    if let Some(dir) = &config.invoke.temp_dir {
        invoker = invoker.with_temp_root(dir);
    }

    let mut invocation = invoker.invoke(job).await?;

    let cancel = invocation.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling conversion");
            cancel.cancel();
        }
    });

    let log_task = invocation.take_logs().map(|mut logs| {
        tokio::spawn(async move {
            while let Some(line) = logs.next().await {
                if !json {
                    eprintln!("{}", line);
                }
            }
        })
    });

    let output = invocation.wait().await?;
    if let Some(task) = log_task {
        let _ = task.await;
    }

    let checker =
        ComplianceChecker::with_backend(config.limits, config.check.frame_counter, &tools)?;
    let report = checker
        .check(&output)
        .await
        .with_context(|| format!("Failed to check {:?}", output))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        print_report(&report);
    }

    Ok(())
}

async fn estimate(params: &ConversionArgs, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools);

    let job = build_job(params, &config, &tools).await?;
    let estimate = conversion::estimate(&job, &config.limits);

    if json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
    } else {
        println!("Source: {}", job.source_path().display());
        println!("Output: {}", job.output_path().display());
        print_estimate(&estimate);
    }

    Ok(())
}

async fn check_file(
    file: &Path,
    config_path: Option<&Path>,
    max_bytes: Option<u64>,
    max_frames: Option<u64>,
    json: bool,
) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools);
    let limits = ComplianceLimits::new(
        max_bytes.unwrap_or(config.limits.max_bytes),
        max_frames.unwrap_or(config.limits.max_frames),
    );

    let checker = ComplianceChecker::with_backend(limits, config.check.frame_counter, &tools)?;
    let report = checker.check(file).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

async fn probe_file(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools);
    let ffprobe = tools.require(FFPROBE)?;
    let media_info = probe::probe_with_ffprobe(&ffprobe.path, file).await?;

    if json {
        let json_str = serde_json::to_string_pretty(&media_info)?;
        println!("{}", json_str);
    } else {
        println!("File: {}", media_info.file_path.display());
        println!("Container: {}", media_info.container);
        println!("Size: {} bytes", media_info.file_size);
        if let Some(ref duration) = media_info.duration {
            println!("Duration: {:.3}s", duration.as_secs_f64());
        }
        if let Some(ref video) = media_info.video {
            print!("Video: {} {}x{}", video.codec, video.width, video.height);
            if let Some(fps) = video.frame_rate {
                print!(", {:.3} fps", fps);
            }
            println!();
        }
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. ffmpeg is required for conversion; ffprobe enables source probing.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("✓ Configuration is valid");
    println!(
        "  Limits: {} / {} frames",
        human_bytes(config.limits.max_bytes),
        config.limits.max_frames
    );
    println!(
        "  Quality levels: {}",
        config.quality.bayer_scale.levels()
    );
    println!(
        "  Defaults: {} fps, width {}, {} colours, {} dither",
        config.defaults.frame_rate, config.defaults.width, config.defaults.colors, config.defaults.dither
    );
    match config.invoke.timeout() {
        Some(t) => println!("  Timeout: {}s", t.as_secs()),
        None => println!("  Timeout: none"),
    }

    Ok(())
}
