use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::{info, LevelFilter};

use fast5kit::config::{DEFAULT_QUALITY_THRESHOLD, DEFAULT_WORKERS};
use fast5kit::{
    copy_selected, embed_basecalls, embed_basecalls_parallel, filter_reads, pipeline,
    split_directory, split_directory_parallel, split_file, EmbedConfig, FilterConfig,
    SplitConfig, ToolConfig,
};

#[derive(Parser, Debug)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split multi-read containers into one container per read
    Split {
        #[clap(flatten)]
        common: CommonArgs,
        #[clap(flatten)]
        args: SplitArgs,
    },
    /// Embed basecall text into single-read containers
    Embed {
        #[clap(flatten)]
        common: CommonArgs,
        #[clap(flatten)]
        args: EmbedArgs,
    },
    /// Select indexed reads with a passing primary alignment
    Filter {
        #[clap(flatten)]
        common: CommonArgs,
        #[clap(flatten)]
        args: FilterArgs,
    },
    /// Split one multi-read container, then run the external index and embed tools
    Pipeline {
        #[clap(flatten)]
        common: CommonArgs,
        #[clap(flatten)]
        args: PipelineArgs,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Number of worker threads (0 = one per CPU)
    #[arg(short = 'j', long, default_value_t = DEFAULT_WORKERS)]
    threads: usize,

    /// Process everything in the calling thread
    #[arg(long)]
    debug: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}
impl CommonArgs {
    fn setup(&self) -> Result<()> {
        let level = match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        pretty_env_logger::formatted_builder()
            .filter_level(level)
            .parse_default_env()
            .try_init()?;
        Ok(())
    }

    fn workers(&self) -> usize {
        if self.debug {
            1
        } else {
            self.threads
        }
    }
}

#[derive(Args, Debug)]
struct SplitArgs {
    /// A multi-read container or a directory of them
    input: PathBuf,

    /// Directory receiving the single-read containers
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Place the reads of each container in `<output_dir>/<container stem>`
    #[arg(long)]
    subdir: bool,

    /// Delete each multi-read container once it has been split
    #[arg(long)]
    delete: bool,

    /// Also write the basecalls of each container to a fastq file
    #[arg(long)]
    fastq: bool,
}
impl SplitArgs {
    fn run(&self, common: &CommonArgs) -> Result<()> {
        let config = SplitConfig::new(&self.output_dir)
            .subdir_per_source(self.subdir)
            .delete_source(self.delete)
            .write_fastq(self.fastq);

        let stats = if self.input.is_dir() {
            match common.workers() {
                1 => split_directory(&self.input, &config)?,
                workers => split_directory_parallel(&self.input, &config, workers)?,
            }
        } else {
            split_file(&self.input, &config)?
        };
        info!("Processed {} reads with {} errors", stats.processed, stats.errors);
        Ok(())
    }
}

#[derive(Args, Debug)]
struct EmbedArgs {
    /// Basecall text source (4-line records, optionally compressed)
    #[arg(short, long)]
    fastq: PathBuf,

    /// Directories searched for the indexed containers
    #[arg(short = 'd', long = "dir", required = true)]
    dirs: Vec<PathBuf>,

    /// Index file (readdb, or tsv/txt sequencing summary) [default: <fastq>.index.readdb]
    #[arg(short, long)]
    index: Option<PathBuf>,

    /// Also search every subdirectory of the given directories
    #[arg(short, long)]
    recursive: bool,
}
impl EmbedArgs {
    fn run(&self, common: &CommonArgs) -> Result<()> {
        let mut config = EmbedConfig::new(&self.fastq)
            .dirs(&self.dirs)
            .recursive(self.recursive);
        if let Some(index) = &self.index {
            config = config.index(index);
        }

        let embedded = match common.workers() {
            1 => embed_basecalls(&config)?,
            workers => embed_basecalls_parallel(&config, workers)?,
        };
        info!("Embedded {embedded} basecalls");
        Ok(())
    }
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Alignment file (BAM)
    #[arg(short, long)]
    alignment: PathBuf,

    /// Index file (readdb, or tsv/txt sequencing summary)
    #[arg(short, long)]
    index: PathBuf,

    /// Directories searched for the indexed containers
    #[arg(short = 'd', long = "dir", required = true)]
    dirs: Vec<PathBuf>,

    /// Minimum mean base quality of a kept read
    #[arg(short, long, default_value_t = DEFAULT_QUALITY_THRESHOLD)]
    quality: f64,

    /// Also search every subdirectory of the given directories
    #[arg(short, long)]
    recursive: bool,

    /// Stop once the kept reads cover this many bases
    #[arg(short, long)]
    trim: Option<u64>,

    /// Write the kept reads as a readdb here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Copy the kept containers into mirrors of the search directories here
    #[arg(long)]
    copy_to: Option<PathBuf>,
}
impl FilterArgs {
    fn run(&self) -> Result<()> {
        let config = FilterConfig::new(&self.alignment, &self.index)
            .dirs(&self.dirs)
            .quality_threshold(self.quality)
            .recursive(self.recursive)
            .trim(self.trim);
        let reads = filter_reads(&config)?;

        let mut writer: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(BufWriter::new(std::io::stdout().lock())),
        };
        for read in &reads {
            writeln!(
                writer,
                "{}\t{}",
                read.location.read_id,
                read.location.path.display()
            )?;
        }
        writer.flush()?;

        if let Some(copy_to) = &self.copy_to {
            for dir in &self.dirs {
                copy_selected(&reads, dir, copy_to)?;
            }
        }
        info!("Kept {} reads", reads.len());
        Ok(())
    }
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// Multi-read container
    #[arg(short, long)]
    fast5: PathBuf,

    /// Directory receiving the single-read containers and the basecall text
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Executable building the readdb index
    #[arg(long)]
    index_tool: PathBuf,

    /// Executable embedding event data into the containers
    #[arg(long)]
    embed_tool: PathBuf,
}
impl PipelineArgs {
    fn run(&self) -> Result<()> {
        let tools = ToolConfig {
            index_tool: self.index_tool.clone(),
            embed_tool: self.embed_tool.clone(),
        };
        let (stats, fastq) = pipeline::run(&self.fast5, &self.output_dir, &tools)?;
        info!(
            "Processed {} reads with {} errors; basecalls in {}",
            stats.processed,
            stats.errors,
            fastq.display()
        );
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Split { common, args } => {
            common.setup()?;
            args.run(&common)?;
        }
        Command::Embed { common, args } => {
            common.setup()?;
            args.run(&common)?;
        }
        Command::Filter { common, args } => {
            common.setup()?;
            args.run()?;
        }
        Command::Pipeline { common, args } => {
            common.setup()?;
            args.run()?;
        }
    }
    Ok(())
}
