/// Progress message sent by a scan running on a worker thread
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanStatus {
    /// Fraction of the train/pulse rectangle visited, in [0, 1]
    pub progress: f32,
    pub frames_read: u64,
}

impl ScanStatus {
    pub fn new(progress: f32, frames_read: u64) -> Self {
        Self {
            progress,
            frames_read,
        }
    }
}
