use smartgen_bridge::prelude::*;

use std::io::Write;

fn init_logging(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .write_style(env_logger::WriteStyle::Never)
        .init();
}

#[tokio::main]
async fn main() {
    let options = Options::new();

    let config = match ConfigWrapper::new(options.config_file.clone()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load config {}: {:?}", options.config_file, err);
            std::process::exit(255);
        }
    };

    init_logging(&config.loglevel());
    info!("using config file {}", options.config_file);

    if let Err(err) = smartgen_bridge::app(options, config).await {
        error!("{:?}", err);
        std::process::exit(1);
    }
}
