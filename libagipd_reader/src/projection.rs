use ndarray::{Array3, Zip};
use std::sync::mpsc::Sender;

use super::constants::CONTRAST_WINDOW_SIGMA;
use super::error::ProcessorError;
use super::module::ModuleSource;
use super::reader::AgipdReader;
use super::worker_status::ScanStatus;

/// Summary statistics of an image, with the contrast window used for display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelStats {
    pub mean: f64,
    pub stdev: f64,
    /// Values at or below this are shown black
    pub min_black: f64,
    /// Values at or above this are shown white
    pub max_black: f64,
}

impl PixelStats {
    /// Returns None for an empty image
    pub fn from_values<'a, I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a f32>,
    {
        let (n, sum, sum_sq) = values
            .into_iter()
            .fold((0usize, 0.0f64, 0.0f64), |(n, sum, sum_sq), v| {
                let v = *v as f64;
                (n + 1, sum + v, sum_sq + v * v)
            });
        if n == 0 {
            return None;
        }
        let mean = sum / n as f64;
        let stdev = (sum_sq / n as f64 - mean * mean).max(0.0).sqrt();
        Some(Self {
            mean,
            stdev,
            min_black: mean - stdev * CONTRAST_WINDOW_SIGMA,
            max_black: mean + stdev * CONTRAST_WINDOW_SIGMA,
        })
    }
}

/// The per-pixel maximum over every event of a run
#[derive(Debug, Clone, PartialEq)]
pub struct MaxProjection {
    /// Shape (modules, rows, cols), same layout as the composite frame
    pub data: Array3<f32>,
    pub frames_read: u64,
    pub stats: PixelStats,
}

/// Fraction of the rectangle between progress messages
const PROGRESS_STEP: f32 = 0.01;

/// Visit every event of the train/pulse rectangle, starting from its first position, and keep
/// the maximum of each pixel.
///
/// The cursor is reset before and after the scan. Progress is sent on `tx` if given.
pub fn max_projection<M: ModuleSource>(
    reader: &mut AgipdReader<M>,
    tx: Option<&Sender<ScanStatus>>,
) -> Result<MaxProjection, ProcessorError> {
    let n_positions = reader
        .bounds()
        .and_then(|b| b.n_positions())
        .unwrap_or(u128::MAX);
    let flush_val = ((n_positions as f64 * PROGRESS_STEP as f64) as u64).max(1);

    reader.reset_cursor();
    reader.read_current()?;
    let mut max = reader.composite().data_array().clone();
    let mut frames_read: u64 = 1;
    if let Some(tx) = tx {
        tx.send(ScanStatus::new(0.0, frames_read))?;
    }

    while reader.next_frame()?.is_some() {
        Zip::from(&mut max)
            .and(reader.composite().data_array())
            .for_each(|m, v| {
                if *v > *m {
                    *m = *v
                }
            });
        frames_read += 1;
        if frames_read % flush_val == 0 {
            if let Some(tx) = tx {
                tx.send(ScanStatus::new(
                    frames_read as f32 / n_positions as f32,
                    frames_read,
                ))?;
            }
        }
    }
    reader.reset_cursor();

    if let Some(tx) = tx {
        tx.send(ScanStatus::new(1.0, frames_read))?;
    }

    // A composite always holds at least one module of at least one pixel
    let stats = PixelStats::from_values(max.iter()).unwrap_or(PixelStats {
        mean: 0.0,
        stdev: 0.0,
        min_black: 0.0,
        max_black: 0.0,
    });
    Ok(MaxProjection {
        data: max,
        frames_read,
        stats,
    })
}
