mod app;
mod config;
mod dashboard;
mod plugins;
mod stream;
mod utils;

use eframe::egui;

fn setup_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();
    // tab 与状态栏图标
    egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
    ctx.set_fonts(fonts);
}

fn main() -> eframe::Result<()> {
    env_logger::init();

    let logger = utils::logger::init_logger();
    utils::logger::clear_log_file();
    if let Ok(mut log_instance) = logger.lock() {
        if cfg!(debug_assertions) {
            log_instance.set_min_level(utils::logger::LogLevel::Debug);
        }
        log_instance.info("App", "proxy dashboard starting");
        if let Some(log_path) = &log_instance.log_file_path {
            log::info!("log file: {}", log_path.display());
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([720.0, 480.0])
            .with_title("proxy.py dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "Proxy Dashboard",
        options,
        Box::new(|cc| {
            setup_fonts(&cc.egui_ctx);
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(app::DashboardApp::new(cc)?))
        }),
    )
}
