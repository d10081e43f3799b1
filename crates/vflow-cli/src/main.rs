use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

// Exit contract: 0 success, 1 malformed input, 2 I/O failure.
const EXIT_MALFORMED: u8 = 1;
const EXIT_IO: u8 = 2;

#[derive(Parser)]
#[command(name = "vflow")]
#[command(about = "vflow - sparse value-flow graphs from SSA text IR")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the value-flow graph of a text IR module
    Build {
        input: PathBuf,

        output: PathBuf,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Parse-check a text IR module
    Validate {
        input: PathBuf,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Extract the subgraph around starting nodes from a graph dump
    Slice {
        input: PathBuf,

        output: PathBuf,

        #[arg(long, value_delimiter = ',', required = true)]
        nodes: Vec<u32>,

        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            verbose,
        } => cmd_build(input, output, verbose),
        Commands::Validate { input, verbose } => cmd_validate(input, verbose),
        Commands::Slice {
            input,
            output,
            nodes,
            verbose,
        } => cmd_slice(input, output, nodes, verbose),
    }
}

fn cmd_build(input: PathBuf, output: PathBuf, verbose: bool) -> ExitCode {
    use colored::*;
    use std::fs;
    use std::time::Instant;
    use vflow_core::analysis::{AndersenPointsTo, VfgBuilder};
    use vflow_emit::{Emitter, VfgEmitter};

    if verbose {
        println!("{}", " vflow build".bright_blue().bold());
        println!("{}", "=".repeat(50).bright_blue());
        println!(" Input: {}", input.display());
        println!(" Output: {}", output.display());
        println!();
    }

    let start = Instant::now();

    let text = match fs::read_to_string(&input) {
        Ok(text) => text,
        Err(e) => {
            eprintln!(
                "{} cannot read {}: {}",
                "ERROR:".bright_red().bold(),
                input.display(),
                e
            );
            return ExitCode::from(EXIT_IO);
        }
    };

    if verbose {
        println!(" Parsing IR...");
    }
    let module = match vflow_parser::parse_module(&text) {
        Ok(module) => module,
        Err(e) => {
            eprintln!("{} {}", "INVALID:".bright_red().bold(), e);
            return ExitCode::from(EXIT_MALFORMED);
        }
    };

    if verbose {
        println!(" Functions: {}", module.functions.len());
        println!(" Running points-to fixpoint...");
    }
    let oracle = AndersenPointsTo::analyze(&module);

    if verbose {
        println!(" Building value-flow graph...");
    }
    let build = match VfgBuilder::build(&module, &oracle) {
        Ok(build) => build,
        Err(e) => {
            eprintln!("{} {}", "ERROR:".bright_red().bold(), e);
            return ExitCode::from(EXIT_MALFORMED);
        }
    };

    if verbose {
        println!(
            " VFG scale: ({} nodes, {} edges)",
            build.graph.node_count(),
            build.graph.edge_count()
        );
    }

    let dump = match VfgEmitter::new().emit_to_string(&build.graph) {
        Ok(dump) => dump,
        Err(e) => {
            eprintln!("{} {}", "ERROR:".bright_red().bold(), e);
            return ExitCode::from(EXIT_IO);
        }
    };
    if let Err(e) = fs::write(&output, dump) {
        eprintln!(
            "{} cannot write {}: {}",
            "ERROR:".bright_red().bold(),
            output.display(),
            e
        );
        return ExitCode::from(EXIT_IO);
    }

    if !build.is_complete() {
        for skip in &build.skipped {
            eprintln!(
                "{} skipped function `{}`: {}",
                "WARNING:".yellow().bold(),
                skip.name,
                skip.reason
            );
        }
        return ExitCode::from(EXIT_MALFORMED);
    }

    if verbose {
        let elapsed = start.elapsed();
        println!(
            "\n {} Graph written to {}",
            "SUCCESS:".bright_green().bold(),
            output.display()
        );
        println!("   Time: {:.3}s", elapsed.as_secs_f64());
    }

    ExitCode::SUCCESS
}

fn cmd_validate(input: PathBuf, verbose: bool) -> ExitCode {
    use colored::*;
    use std::fs;

    if verbose {
        println!("{}", " Validating IR".bright_cyan().bold());
        println!(" Input: {}", input.display());
        println!();
    }

    let text = match fs::read_to_string(&input) {
        Ok(text) => text,
        Err(e) => {
            eprintln!(
                "{} cannot read {}: {}",
                "ERROR:".bright_red().bold(),
                input.display(),
                e
            );
            return ExitCode::from(EXIT_IO);
        }
    };

    match vflow_parser::parse_module(&text) {
        Ok(module) => {
            println!("{}", " VALID".bright_green().bold());
            if verbose {
                println!("   Parsed {} function(s)", module.functions.len());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", " INVALID".bright_red().bold());
            eprintln!("{}", e);
            ExitCode::from(EXIT_MALFORMED)
        }
    }
}

fn cmd_slice(input: PathBuf, output: PathBuf, nodes: Vec<u32>, verbose: bool) -> ExitCode {
    use colored::*;
    use std::fs;
    use vflow_core::analysis::NodeId;
    use vflow_emit::{Emitter, VfgEmitter};

    if verbose {
        println!("{}", " vflow slice".bright_blue().bold());
        println!(" Input: {}", input.display());
        println!(" Starting nodes: {:?}", nodes);
        println!();
    }

    let text = match fs::read_to_string(&input) {
        Ok(text) => text,
        Err(e) => {
            eprintln!(
                "{} cannot read {}: {}",
                "ERROR:".bright_red().bold(),
                input.display(),
                e
            );
            return ExitCode::from(EXIT_IO);
        }
    };

    let graph = match vflow_parser::parse_vfg(&text) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("{} {}", "INVALID:".bright_red().bold(), e);
            return ExitCode::from(EXIT_MALFORMED);
        }
    };

    if verbose {
        println!(
            " VFG scale: ({} nodes, {} edges)",
            graph.node_count(),
            graph.edge_count()
        );
    }

    let starts: Vec<NodeId> = nodes.into_iter().map(NodeId).collect();
    let slice = match graph.slice(&starts) {
        Ok(slice) => slice,
        Err(e) => {
            eprintln!("{} {}", "ERROR:".bright_red().bold(), e);
            return ExitCode::from(EXIT_MALFORMED);
        }
    };

    if verbose {
        println!(
            " Slice scale: ({} nodes, {} edges)",
            slice.node_count(),
            slice.edge_count()
        );
    }

    let dump = match VfgEmitter::new().emit_to_string(&slice) {
        Ok(dump) => dump,
        Err(e) => {
            eprintln!("{} {}", "ERROR:".bright_red().bold(), e);
            return ExitCode::from(EXIT_IO);
        }
    };
    if let Err(e) = fs::write(&output, dump) {
        eprintln!(
            "{} cannot write {}: {}",
            "ERROR:".bright_red().bold(),
            output.display(),
            e
        );
        return ExitCode::from(EXIT_IO);
    }

    if verbose {
        println!(
            "\n {} Slice written to {}",
            "SUCCESS:".bright_green().bold(),
            output.display()
        );
    }

    ExitCode::SUCCESS
}
