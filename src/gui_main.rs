use eframe::egui;

use gym_turnos::config::Config;
use gym_turnos::gui::app::TurnosApp;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gym_turnos=info".parse().unwrap()),
        )
        .init();

    let config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config.toml: {}", e);
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Turnos del gimnasio")
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Turnos del gimnasio",
        options,
        Box::new(|cc| Ok(Box::new(TurnosApp::new(cc, config)))),
    )
}
