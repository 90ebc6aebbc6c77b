use argh::FromArgs;
use repl_shell::{Interpreter, Scheduling, ShellConfig};

#[derive(FromArgs)]
/// Demonstrates the basics of embedding the shell.
struct Args {
    #[argh(option, default = "String::from(\"dummyprompt? \")")]
    /// prompt shown before every line.
    prompt: String,

    #[argh(switch)]
    /// run the loop on the calling thread instead of a dedicated one.
    same_context: bool,

    #[argh(switch)]
    /// do not record matched commands in the history.
    no_history: bool,

    #[argh(option, default = "0")]
    /// minimum word length before completion falls back to substring matches.
    min_match: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Args = argh::from_env();
    let scheduling = if args.same_context {
        Scheduling::SameContext
    } else {
        Scheduling::SplitContext
    };
    let config = ShellConfig::default()
        .scheduling(scheduling)
        .record_history(!args.no_history)
        .min_substring_len(args.min_match);

    let mut cli = Interpreter::new(
        "Welcome to this dummy CLI. Type 'help' to get a list of all available commands",
    )
    .with_config(config);
    cli.add_builtins();

    let exit = cli.exit_handle();
    cli.add_command(
        "kapitänsmützenabzeichen",
        "just an example of a long command name not breaking the help formatting",
        move |args| exit.exit(args),
    )?;
    cli.set_default(|args| args.join(" "));

    let message = cli.run(&args.prompt)?;
    tracing::debug!(message = %message, "loop returned");
    println!("this part of the code is only reached when the cli loop returns");
    Ok(())
}
