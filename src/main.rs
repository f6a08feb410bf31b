use chrono::Local;
use clap::Parser;
use variant_tracker::args::Args;
use variant_tracker::config::Settings;
use variant_tracker::notify::NotificationSink;
use variant_tracker::runner::{Runner, report_setup_failure};

fn main() {
    let args = Args::parse();
    Runner::setup_logger(&args);
    std::panic::set_hook(Box::new(|info| log::error!("{info}")));

    let reference_time = Local::now().naive_local();
    let settings = match Runner::load_settings(&args) {
        Ok(settings) => settings,
        Err(err) => {
            let mut fallback = Settings::default();
            if let Some(outdir) = &args.outdir {
                fallback.output_dir = outdir.clone();
            }
            let sink = NotificationSink::from_settings(&fallback);
            report_setup_failure(&sink, err, reference_time);
            std::process::exit(1);
        }
    };
    if args.dump_settings {
        if let Err(err) = settings.write(&mut std::io::stdout()) {
            eprintln!("{err}");
            std::process::exit(1);
        }
        return;
    }

    let outcome = match Runner::from_settings(&settings) {
        Ok(runner) => runner.start(reference_time),
        Err(err) => {
            let sink = NotificationSink::from_settings(&settings);
            report_setup_failure(&sink, err, reference_time)
        }
    };

    if args.fail_on_error && outcome.is_error() {
        std::process::exit(1);
    }
}
