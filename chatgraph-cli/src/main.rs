//! `chatgraph` binary: parses arguments, loads config and dispatches to the library.

use chatgraph::generate_thread_id;
use chatgraph_cli::{
    init_tracing, load_history, message_text, open_catalog, open_graph, print_history,
    print_threads, run_repl, send_message, Cli, Command, Error, RunConfig,
};
use clap::Parser;
use tracing::debug;

async fn run(cli: Cli) -> Result<(), Error> {
    dotenv::dotenv().ok();
    let mut config = RunConfig::from_env();
    config.apply_options(&cli.run_options());
    init_tracing(config.verbose);
    debug!(config = %config.summary(), "starting");

    let mut stdout = std::io::stdout();
    match cli.command {
        Command::Threads => {
            let catalog = open_catalog(&config)?;
            print_threads(&catalog, &mut stdout).await?;
        }
        Command::History { thread } => {
            let messages = load_history(&config, &thread).await?;
            print_history(&messages, &mut stdout)?;
        }
        Command::Chat {
            thread, message, ..
        } => {
            let graph = open_graph(&config)?;
            let thread_id = thread.unwrap_or_else(generate_thread_id);
            match message_text(&message) {
                Some(text) => {
                    println!("User: {}", text);
                    println!("---");
                    send_message(&graph, &thread_id, &text, config.stream, &mut stdout).await?;
                    eprintln!("(thread {})", thread_id);
                }
                None => {
                    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
                    let last = run_repl(&graph, thread_id, config.stream, stdin, &mut stdout).await?;
                    eprintln!("(thread {})", last);
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
