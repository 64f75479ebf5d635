use hdf5::{Dataset, File, Group, H5Type};
use ndarray::{s, Array2};
use std::path::Path;

use super::constants::{
    CELL_ID_NAME, DATA_NAME, GAIN_NAME, PULSE_ID_NAME, STATUS_NAME, TRAIN_ID_NAME,
};
use super::error::ModuleFileError;
use super::module::{ModuleFrame, ModuleHeader, ModuleSource};

// Layout of one module file (European XFEL)
// <image group> (e.g. INSTRUMENT/SPB_DET_AGIPD1M-1/DET/7CH0:xtdf/image)
// |---- data    raw: u16 (frames, 2, rows, cols), plane 0 analog, plane 1 digital gain
// |             processed: f32 (frames, rows, cols)
// |---- gain    processed only: (frames, rows, cols)
// |---- trainId (frames)
// |---- pulseId (frames)
// |---- cellId  (frames)
// |---- status  (frames), optional

/// One AGIPD module file opened for random frame access.
#[derive(Debug)]
pub struct ModuleFile {
    #[allow(dead_code)]
    file_handle: File,
    header: ModuleHeader,
    data: Dataset,
    gain: Option<Dataset>,
    statuses: Vec<u16>,
    last_cell_id: u16,
    size_bytes: u64,
}

/// Read a per-frame identifier list, checking it has one entry per frame
fn read_id_list<T: H5Type>(
    group: &Group,
    name: &str,
    n_frames: usize,
) -> Result<Vec<T>, ModuleFileError> {
    let list = group.dataset(name)?.read_raw::<T>()?;
    if list.len() != n_frames {
        return Err(ModuleFileError::BadIdListLength {
            name: String::from(name),
            found: list.len(),
            expected: n_frames,
        });
    }
    Ok(list)
}

impl ModuleFile {
    /// Open the file of a module and read its headers
    pub fn open(path: &Path, module: usize, image_group: &str) -> Result<Self, ModuleFileError> {
        if !path.exists() {
            return Err(ModuleFileError::BadFilePath(path.to_path_buf()));
        }
        let size_bytes = path.metadata()?.len();
        let file_handle = File::open(path)?;
        let group = file_handle.group(image_group)?;
        let data = group.dataset(DATA_NAME)?;

        let shape = data.shape();
        let (raw_data, n_frames, dims) = match shape.as_slice() {
            [n, 2, rows, cols] => (true, *n, (*rows, *cols)),
            [n, rows, cols] => (false, *n, (*rows, *cols)),
            _ => {
                return Err(ModuleFileError::BadDataShape(
                    String::from(DATA_NAME),
                    shape.clone(),
                ))
            }
        };

        let train_ids = read_id_list::<u64>(&group, TRAIN_ID_NAME, n_frames)?;
        let pulse_ids = read_id_list::<u64>(&group, PULSE_ID_NAME, n_frames)?;
        let cell_ids = read_id_list::<u16>(&group, CELL_ID_NAME, n_frames)?;
        let statuses = if group.link_exists(STATUS_NAME) {
            read_id_list::<u16>(&group, STATUS_NAME, n_frames)?
        } else {
            vec![0; n_frames]
        };

        let gain = if raw_data {
            None
        } else if group.link_exists(GAIN_NAME) {
            let gain = group.dataset(GAIN_NAME)?;
            if gain.shape() != shape {
                return Err(ModuleFileError::BadDataShape(
                    String::from(GAIN_NAME),
                    gain.shape(),
                ));
            }
            Some(gain)
        } else {
            log::warn!(
                "Processed module {} has no gain dataset, gain will read as zero",
                module
            );
            None
        };

        log::debug!(
            "Module {:0>2}: {} frames of {}x{} ({}) in {} ({})",
            module,
            n_frames,
            dims.0,
            dims.1,
            if raw_data { "raw" } else { "processed" },
            path.to_string_lossy(),
            human_bytes::human_bytes(size_bytes as f64)
        );

        Ok(Self {
            file_handle,
            header: ModuleHeader {
                module,
                n_frames,
                dims,
                raw_data,
                train_ids,
                pulse_ids,
                cell_ids,
            },
            data,
            gain,
            statuses,
            last_cell_id: 0,
            size_bytes,
        })
    }

    pub fn get_size_bytes(&self) -> u64 {
        self.size_bytes
    }

    fn read_raw_frame(&self, frame: usize) -> Result<(Array2<f32>, Array2<u16>), ModuleFileError> {
        let analog: Array2<u16> = self.data.read_slice_2d(s![frame, 0, .., ..])?;
        let gain: Array2<u16> = self.data.read_slice_2d(s![frame, 1, .., ..])?;
        Ok((analog.mapv(f32::from), gain))
    }

    fn read_processed_frame(
        &self,
        frame: usize,
    ) -> Result<(Array2<f32>, Array2<u16>), ModuleFileError> {
        let data: Array2<f32> = self.data.read_slice_2d(s![frame, .., ..])?;
        let gain = match &self.gain {
            Some(gain) => gain.read_slice_2d(s![frame, .., ..])?,
            None => Array2::zeros(self.header.dims),
        };
        Ok((data, gain))
    }
}

impl ModuleSource for ModuleFile {
    fn header(&self) -> &ModuleHeader {
        &self.header
    }

    fn read_frame(&mut self, frame: usize) -> Result<ModuleFrame, ModuleFileError> {
        if frame >= self.header.n_frames {
            return Err(ModuleFileError::FrameOutOfRange(frame, self.header.n_frames));
        }
        let (data, gain) = if self.header.raw_data {
            self.read_raw_frame(frame)?
        } else {
            self.read_processed_frame(frame)?
        };
        self.last_cell_id = self.header.cell_ids[frame];
        Ok(ModuleFrame {
            data,
            gain,
            status: self.statuses[frame],
            cell_id: self.last_cell_id,
        })
    }

    fn last_cell_id(&self) -> u16 {
        self.last_cell_id
    }
}
