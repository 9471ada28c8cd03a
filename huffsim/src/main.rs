mod pipeline;
mod result;
mod settings;

use clap::Parser;

use settings::{Conf, Mode};

fn main() {
    env_logger::init();
    let conf = Conf::parse();

    let outcome = match &conf.mode {
        Mode::ContextFree(args) => pipeline::run_context_free(args),
        Mode::ContextAware(args) => pipeline::run_context_aware(args),
    };

    match outcome {
        Ok(result) => {
            let json = serde_json::to_string_pretty(&result).expect("result is always serializable");
            println!("{json}");
        }
        Err(error) => {
            log::error!("huffsim: {error}");
            std::process::exit(1);
        }
    }
}
