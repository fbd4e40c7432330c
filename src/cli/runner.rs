use tracing::info;
use tracing_subscriber::EnvFilter;

use auto3d_batch::{
    CommandEngine, DmLogEvents, EngineOptions, EventSink, RecordIoOptions, RunConfig, SplitMode,
    TracingEvents, process_file_to_path,
};

use super::args::{CliArgs, EventFormat};
use super::errors::AppError;

fn parse_delimiter(value: &str) -> Result<char, AppError> {
    match value {
        "tab" | "\\t" => Ok('\t'),
        "space" => Ok(' '),
        "comma" => Ok(','),
        "semicolon" => Ok(';'),
        "pipe" => Ok('|'),
        _ => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c),
                _ => Err(AppError::InvalidDelimiter {
                    value: value.to_string(),
                }),
            }
        }
    }
}

fn engine_options(args: &CliArgs) -> Result<EngineOptions, AppError> {
    let k = match (args.k, args.window) {
        (Some(_), Some(_)) => {
            return Err(AppError::ConflictingArguments {
                first: "--k",
                second: "--window",
            });
        }
        (Some(k), None) => Some(k),
        (None, Some(_)) => None,
        (None, None) => Some(1),
    };

    Ok(EngineOptions {
        k,
        window: args.window,
        verbose: args.verbose,
        job_name: args.job_name.clone(),
        enumerate_tautomer: args.enumerate_tautomer,
        tauto_engine: args.tauto_engine,
        pka_norm: !args.no_pka_norm,
        isomer_engine: args.isomer_engine,
        enumerate_isomer: !args.no_enumerate_isomer,
        mode_oe: args.mode_oe,
        mpi_np: args.mpi_np,
        max_confs: args.max_confs,
        use_gpu: args.use_gpu,
        gpu_idx: args.gpu_idx.clone(),
        capacity: args.capacity,
        optimizing_engine: args.optimizing_engine,
        patience: args.patience,
        opt_steps: args.opt_steps,
        convergence_threshold: args.convergence_threshold,
        threshold: args.threshold,
        memory: args.memory,
        batchsize_atoms: args.batchsize_atoms,
        ..EngineOptions::default()
    })
}

fn build_config(args: &CliArgs) -> Result<RunConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_json_file(path)?,
        None => RunConfig {
            engine: engine_options(args)?,
            split_mode: SplitMode::Basic,
            record_io: RecordIoOptions {
                delimiter: parse_delimiter(&args.delimiter)?,
                read_header: args.read_header,
                write_header: args.write_header,
                id_column: args.id_column.clone(),
                sniff_records: args.sniff_records,
            },
            ..RunConfig::default()
        },
    };

    if args.structured {
        config.split_mode = SplitMode::Structured;
    }
    if args.work_dir.is_some() {
        config.work_dir = args.work_dir.clone();
    }
    config.keep_workspace |= args.keep_workspace;
    Ok(config)
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = build_config(&args)?;
    let mut engine = CommandEngine::new(args.engine_cmd.clone()).with_args(args.engine_args.clone());
    let events: Box<dyn EventSink> = match args.events {
        EventFormat::Tracing => Box::new(TracingEvents),
        EventFormat::Dmlog => Box::new(DmLogEvents::new()),
    };

    info!("Input: {:?}", args.path);
    info!("Output: {:?}", args.output);

    let report = process_file_to_path(
        &args.path,
        &args.output,
        &config,
        &mut engine,
        events.as_ref(),
    )
    .map_err(AppError::from)?;

    info!("Batch processing complete!");
    info!("Input records: {}", report.input_records);
    info!("Succeeded: {}", report.succeeded);
    info!("Failed: {}", report.failed);
    info!("Output records: {}", report.output_records);
    Ok(())
}
