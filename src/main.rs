use opentelemetry::global;
use structopt::StructOpt;
use wsrelay::services::{consumer, SharedOptions};

#[derive(Debug, StructOpt)]
#[structopt(about = "Websocket event distribution relay")]
struct MainOptions {
    #[structopt(flatten)]
    shared_options: SharedOptions,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Consumes the gateway event streams and dispatches the events
    Consumer(consumer::Options),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = MainOptions::from_args();

    pretty_env_logger::formatted_timed_builder()
        .parse_filters(&options.shared_options.log)
        .init();

    match options.command {
        Command::Consumer(consumer_options) => {
            consumer::run(options.shared_options, consumer_options).await?
        }
    }

    global::shutdown_tracer_provider();

    Ok(())
}
