mod app;

use app::App;
use std::ffi::OsString;
use std::path::PathBuf;

/// First CLI argument, taken as a volume to open on startup.
fn initial_volume_arg<I: Iterator<Item = OsString>>(mut args: I) -> Option<PathBuf> {
    args.next();
    args.next().map(PathBuf::from)
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let initial_volume = initial_volume_arg(std::env::args_os());
    if let Some(path) = &initial_volume {
        log::info!("opening {} on startup", path.display());
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1440.0, 900.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("voxview"),
        ..Default::default()
    };

    eframe::run_native(
        "voxview",
        native_options,
        Box::new(move |cc| Ok(Box::new(App::new(cc, initial_volume)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_argument_becomes_the_startup_volume() {
        let args = ["voxview", "/data/scan"].map(OsString::from).into_iter();
        assert_eq!(initial_volume_arg(args), Some(PathBuf::from("/data/scan")));
    }

    #[test]
    fn no_argument_means_no_startup_volume() {
        let args = ["voxview"].map(OsString::from).into_iter();
        assert_eq!(initial_volume_arg(args), None);
    }
}
