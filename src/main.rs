use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use julia_compute::controllers::bench::{
    BenchmarkPlan, DEFAULT_RANKS, DEFAULT_SIZES, DEFAULT_THREADS, run_benchmarks,
};
use julia_compute::core::data::complex::Complex;
use julia_compute::core::data::complex_rect::ComplexRect;
use julia_compute::core::fractals::julia::colour_mapping::kinds::JuliaColourMapKinds;
use julia_compute::storage::write_ppm::write_ppm;
use julia_compute::{
    ClusterConfig, DispatchConfig, ExecutionMode, FractalEngine, FractalParams, ImageDims,
    ReplicaServer, ReplicaServerConfig, RetryPolicy, ScheduleConfig,
};

#[derive(Parser, Debug)]
#[command(name = "julia_compute")]
#[command(about = "Julia set compute engine: local, distributed and replica rendering")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one frame and write it as a PPM file
    Render(RenderArgs),
    /// Run a replica compute server
    Serve(ServeArgs),
    /// Run the shared-memory and distributed benchmark sweeps
    Bench(BenchArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Sequential,
    Shared,
    Distributed,
    Replica,
}

#[derive(Args, Debug)]
struct FractalArgs {
    #[arg(long, default_value_t = -0.8, allow_hyphen_values = true)]
    c_real: f64,
    #[arg(long, default_value_t = 0.156, allow_hyphen_values = true)]
    c_imag: f64,
    #[arg(long, default_value_t = 2)]
    degree: u32,
    #[arg(long, default_value_t = 100)]
    max_iterations: u32,
    #[arg(long, default_value_t = -2.0, allow_hyphen_values = true)]
    x_min: f64,
    #[arg(long, default_value_t = 2.0, allow_hyphen_values = true)]
    x_max: f64,
    #[arg(long, default_value_t = -2.0, allow_hyphen_values = true)]
    y_min: f64,
    #[arg(long, default_value_t = 2.0, allow_hyphen_values = true)]
    y_max: f64,
    /// Colour theme: 1 RGB, 2 blue-purple, 3 orange, 4 grayscale
    #[arg(long, default_value_t = 1)]
    theme: u32,
}

impl FractalArgs {
    fn to_params(&self) -> Result<FractalParams> {
        let viewport = ComplexRect::from_bounds(self.x_min, self.x_max, self.y_min, self.y_max)?;
        let params = FractalParams::new(
            Complex::new(self.c_real, self.c_imag),
            self.degree,
            self.max_iterations,
            viewport,
            JuliaColourMapKinds::from_id(self.theme),
        )?;

        Ok(params)
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[arg(long, value_enum, default_value_t = Mode::Shared)]
    mode: Mode,
    #[arg(long, default_value_t = 800)]
    width: u32,
    #[arg(long, default_value_t = 800)]
    height: u32,
    #[command(flatten)]
    fractal: FractalArgs,
    /// Schedule policy for shared-memory mode (static, dynamic, guided)
    #[arg(long, default_value = "static")]
    schedule: String,
    /// Worker threads; 0 uses every available core
    #[arg(long, default_value_t = 0)]
    threads: usize,
    #[arg(long)]
    chunk_size: Option<usize>,
    /// Ranks for distributed mode
    #[arg(long, default_value_t = 4)]
    ranks: usize,
    /// Replica endpoints for replica mode
    #[arg(
        long,
        env = "JULIA_REPLICAS",
        value_delimiter = ',',
        default_value = "127.0.0.1:50051,127.0.0.1:50052"
    )]
    replicas: Vec<String>,
    /// Retry policy as gRPC service-config JSON
    #[arg(long)]
    retry_config: Option<PathBuf>,
    /// Append one CSV row per replica attempt
    #[arg(long)]
    metrics_log: Option<PathBuf>,
    #[arg(short, long, default_value = "output/julia.ppm")]
    output: PathBuf,
}

impl RenderArgs {
    fn execution_mode(&self) -> Result<ExecutionMode> {
        let mode = match self.mode {
            Mode::Sequential => ExecutionMode::Sequential,
            Mode::Shared => {
                let mut config = ScheduleConfig::from_names(&self.schedule, self.threads);
                if let Some(chunk_size) = self.chunk_size {
                    config = config.with_chunk_size(chunk_size);
                }
                ExecutionMode::SharedMemory(config)
            }
            Mode::Distributed => ExecutionMode::Distributed(ClusterConfig::with_ranks(self.ranks)),
            Mode::Replica => {
                let retry = match &self.retry_config {
                    Some(path) => {
                        let json = std::fs::read_to_string(path)
                            .with_context(|| format!("reading retry config {}", path.display()))?;
                        RetryPolicy::from_service_config(&json)?
                    }
                    None => RetryPolicy::default(),
                };
                ExecutionMode::Replica(DispatchConfig {
                    endpoints: self.replicas.clone(),
                    retry,
                    metrics_path: self.metrics_log.clone(),
                    ..DispatchConfig::default()
                })
            }
        };

        Ok(mode)
    }
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,
    #[arg(short, long, env = "JULIA_PORT", default_value_t = 50051)]
    port: u16,
    /// Defaults to server-<port>
    #[arg(long, env = "JULIA_SERVER_ID")]
    server_id: Option<String>,
    #[arg(long, default_value = "static")]
    schedule: String,
    #[arg(long, default_value_t = 0)]
    threads: usize,
    /// Fail the first CalculateJulia call with 503, for retry testing
    #[arg(long)]
    fail_first: bool,
}

#[derive(Args, Debug)]
struct BenchArgs {
    #[arg(short, long, default_value = "results.csv")]
    output: PathBuf,
    #[arg(long, value_delimiter = ',')]
    sizes: Option<Vec<u32>>,
    #[arg(long, value_delimiter = ',')]
    threads: Option<Vec<usize>>,
    #[arg(long, value_delimiter = ',')]
    ranks: Option<Vec<usize>>,
    #[command(flatten)]
    fractal: FractalArgs,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn render(args: RenderArgs) -> Result<()> {
    let params = args.fractal.to_params()?;
    let dims = ImageDims::new(args.width, args.height)?;
    let engine = FractalEngine::new(args.execution_mode()?)?;

    let computation = engine.compute(&params, dims).await?;

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_ppm(&computation.buffer, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    info!(
        mode = %engine.mode(),
        elapsed_ms = computation.elapsed.as_secs_f64() * 1_000.0,
        output = %args.output.display(),
        "frame written"
    );
    Ok(())
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = ReplicaServerConfig {
        server_id: args.server_id.unwrap_or_else(|| format!("server-{}", args.port)),
        bind: SocketAddr::new(args.host, args.port),
        schedule: ScheduleConfig::from_names(&args.schedule, args.threads),
        ..ReplicaServerConfig::default()
    };

    let server = ReplicaServer::bind(config).await?;
    if args.fail_first {
        server.fault_injector().fail_next_call();
    }

    let running = server.spawn();
    info!(endpoint = %running.endpoint(), "replica listening");

    let trigger = running.shutdown_trigger();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping replica");
            trigger.fire();
        }
    });

    running.stopped().await?;
    Ok(())
}

fn bench(args: BenchArgs) -> Result<()> {
    let plan = BenchmarkPlan {
        params: args.fractal.to_params()?,
        sizes: args.sizes.unwrap_or_else(|| DEFAULT_SIZES.to_vec()),
        threads: args.threads.unwrap_or_else(|| DEFAULT_THREADS.to_vec()),
        ranks: args.ranks.unwrap_or_else(|| DEFAULT_RANKS.to_vec()),
        ..BenchmarkPlan::default()
    };

    let rows = run_benchmarks(&plan, &args.output)?;
    info!(rows, output = %args.output.display(), "benchmark results appended");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Render(args) => render(args).await,
        Command::Serve(args) => serve(args).await,
        Command::Bench(args) => tokio::task::spawn_blocking(move || bench(args)).await?,
    }
}
