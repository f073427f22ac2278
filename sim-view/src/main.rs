//! Application entry point for the 2D fluid / ecology field viewer.
//!
//! This binary sets up eframe/egui and delegates all interactive
//! logic and rendering to [`Viewer`] from the `viewer` module.

mod viewer;

use viewer::Viewer;

/// Starts the native eframe application.
///
/// Installs a `tracing` subscriber honoring `RUST_LOG`, then launches
/// the main window titled `"2D Fluid Ecology"`. All UI state and
/// rendering are handled by [`Viewer`].
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    tracing::info!("starting 2D fluid ecology viewer");

    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "2D Fluid Ecology",
        options,
        Box::new(|_cc| {
            // Construct the root app state for the viewer.
            Ok(Box::new(Viewer::new()?))
        }),
    )
}
