use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use commands::RuntimeOptions;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

/// Run Lua scripts through the LuaBridge runtime.
///
/// Scripts run in an embedded Lua 5.4 state. Results are converted to host
/// values and printed: strings as-is, everything else as JSON.
///
/// EXAMPLES:
///     luabridge run script.lua                 Run a script
///     luabridge eval "return 1 + 2"            Evaluate a chunk
///     luabridge call double 21 -s lib.lua      Call a Lua function
///     luabridge run script.lua --lib io,os     Open extra libraries
///
/// ENVIRONMENT VARIABLES:
///     LUABRIDGE_LIBRARIES     Comma-separated library list (overrides luabridge.toml)
///     LUABRIDGE_ARITY_CHECK   'off' or 'warn'
///     LUABRIDGE_JSON          Set to '1' for JSON output by default
///     RUST_LOG                Diagnostic filter (e.g. 'luabridge_runtime=debug')
#[derive(Parser)]
#[command(name = "luabridge")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (default: luabridge.toml in this or a parent directory)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Extra libraries to open (base, debug, io, math, os, package, string, table, coroutine, utf8)
    #[arg(long = "lib", global = true, value_delimiter = ',')]
    libraries: Vec<String>,

    /// Print results as pretty JSON, including null
    #[arg(long, global = true, env = "LUABRIDGE_JSON")]
    json: bool,

    /// More diagnostics on stderr (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Lua script file
    ///
    /// Executes the file and prints its first return value.
    ///
    /// EXAMPLES:
    ///     luabridge run script.lua
    ///     luabridge run script.lua --json
    #[command(visible_alias = "r")]
    Run {
        /// Path to the Lua script
        file: PathBuf,
    },

    /// Evaluate an inline Lua chunk
    ///
    /// EXAMPLES:
    ///     luabridge eval "return _VERSION"
    ///     luabridge eval "return {1, 2, 3}"
    #[command(visible_alias = "e")]
    Eval {
        /// Lua source
        source: String,
    },

    /// Call a global Lua function
    ///
    /// Arguments are parsed as JSON where possible and passed positionally;
    /// anything else is passed as a string.
    ///
    /// EXAMPLES:
    ///     luabridge call double 21 --script lib.lua
    ///     luabridge call greet '"world"' -s lib.lua
    Call {
        /// Global function name
        function: String,
        /// Arguments (JSON or plain strings)
        args: Vec<String>,
        /// Script to run before the call, usually defining the function
        #[arg(long, short = 's')]
        script: Option<PathBuf>,
    },

    /// Print the bridge and Lua versions
    Version,

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     luabridge completions bash > /etc/bash_completion.d/luabridge
    ///     luabridge completions zsh > ~/.zfunc/_luabridge
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "luabridge_runtime=debug,luabridge_cli=debug,warn",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = RuntimeOptions {
        config: cli.config,
        libraries: cli.libraries,
        json: cli.json,
    };

    match cli.command {
        Commands::Run { file } => commands::run::run(&file, &options)?,
        Commands::Eval { source } => commands::run::eval(&source, &options)?,
        Commands::Call {
            function,
            args,
            script,
        } => commands::call::call(&function, &args, script.as_deref(), &options)?,
        Commands::Version => {
            let runtime = options.open()?;
            println!("luabridge {}", luabridge_runtime::VERSION);
            println!("{}", runtime.script_version()?);
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "luabridge", &mut io::stdout());
        }
    }

    Ok(())
}
