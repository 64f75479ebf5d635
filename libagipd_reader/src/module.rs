use ndarray::Array2;

use super::error::ModuleFileError;

/// Header information of one module's data stream. Immutable once the stream is opened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleHeader {
    pub module: usize,
    pub n_frames: usize,
    /// (rows, cols) of a single frame
    pub dims: (usize, usize),
    /// True for raw detector data (analog and digital gain interleaved), false for processed data
    pub raw_data: bool,
    pub train_ids: Vec<u64>,
    pub pulse_ids: Vec<u64>,
    pub cell_ids: Vec<u16>,
}

impl ModuleHeader {
    /// Iterate over (local frame, train ID, pulse ID)
    pub fn frame_ids(&self) -> impl Iterator<Item = (usize, u64, u64)> + '_ {
        self.train_ids
            .iter()
            .zip(self.pulse_ids.iter())
            .enumerate()
            .map(|(frame, (train, pulse))| (frame, *train, *pulse))
    }
}

/// The payload of a single module frame
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleFrame {
    pub data: Array2<f32>,
    pub gain: Array2<u16>,
    pub status: u16,
    pub cell_id: u16,
}

/// A source of frames for one detector module.
///
/// The reader only needs random access by local frame number plus the header. Dropping the
/// source releases whatever it holds open.
pub trait ModuleSource {
    fn header(&self) -> &ModuleHeader;

    /// Read a frame by its module-local frame number
    fn read_frame(&mut self, frame: usize) -> Result<ModuleFrame, ModuleFileError>;

    /// Cell ID of the most recently read frame (0 before any read)
    fn last_cell_id(&self) -> u16;
}
