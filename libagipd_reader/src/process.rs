use std::sync::mpsc::Sender;

use super::config::Config;
use super::error::ProcessorError;
use super::projection::{max_projection, MaxProjection};
use super::reader::{AgipdReader, FrameSummary};
use super::worker_status::ScanStatus;

/// Log what was found when opening a run
fn log_reader_summary(reader: &AgipdReader) {
    log::info!(
        "{} modules, {} usable, {} frames in module 0",
        reader.n_modules(),
        reader.usable().count_ones(),
        reader.n_frames()
    );
    log::info!(
        "Composite image is {}x{} pixels",
        reader.composite_dims().0,
        reader.composite_dims().1
    );
    if let Some(index) = reader.frame_index() {
        if index.duplicates() > 0 {
            log::warn!(
                "{} train/pulse pairs were recorded more than once by the same module",
                index.duplicates()
            );
        }
    }
}

/// The main loop of agipd_reader.
///
/// Opens every module of the run in the config, scans all events into a max projection and
/// logs the pixel statistics. Progress is sent on `tx`, so this is typically run on its own thread.
pub fn process(config: Config, tx: Sender<ScanStatus>) -> Result<MaxProjection, ProcessorError> {
    let mut reader = AgipdReader::open(&config)?;
    log_reader_summary(&reader);

    log::info!("Computing max of all frames...");
    let projection = max_projection(&mut reader, Some(&tx))?;
    log::info!("Read {} events", projection.frames_read);
    log::info!("Mean pixel value: {}", projection.stats.mean);
    log::info!("Pixel stdev: {}", projection.stats.stdev);
    log::info!(
        "Contrast window: [{}, {}]",
        projection.stats.min_black,
        projection.stats.max_black
    );

    reader.close();
    Ok(projection)
}

/// Assemble a single event and log the state of each module
pub fn inspect_event(
    config: &Config,
    train: u64,
    pulse: u64,
) -> Result<FrameSummary, ProcessorError> {
    let mut reader = AgipdReader::open(config)?;
    log_reader_summary(&reader);

    let summary = reader.read_frame(train, pulse)?;
    let composite = reader.composite();
    for module in 0..composite.n_modules() {
        log::info!(
            "Module {:0>2}: status {} cell {}{}{}",
            module,
            composite.status_ids()[module],
            composite.cell_ids()[module],
            if composite.is_module_present(module) { "" } else { " (absent)" },
            if reader.usable()[module] { "" } else { " (unusable)" }
        );
    }
    log::info!(
        "Read train {}, pulse {} with {} modules.",
        summary.train_id,
        summary.pulse_id,
        summary.modules_present
    );

    reader.close();
    Ok(summary)
}
