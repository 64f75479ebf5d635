/// Number of modules in an AGIPD 1M detector
pub const NUMBER_OF_MODULES: usize = 16;

/// Status written to a module's mask when it has no frame for the requested event
pub const ABSENT_STATUS: u16 = 1;

/// Default token marking the module number in a module file name, e.g. `RAW-R0001-AGIPD00-S00000.h5`
pub const DEFAULT_MODULE_TOKEN: &str = "AGIPD";

/// Number of digits following the module token
pub const MODULE_NUMBER_WIDTH: usize = 2;

/// Placeholder substituted with the module number in an image group path
pub const MODULE_PLACEHOLDER: &str = "{module}";

/// European XFEL location of the per-frame image datasets of one module
pub const DEFAULT_IMAGE_GROUP: &str = "INSTRUMENT/SPB_DET_AGIPD1M-1/DET/{module}CH0:xtdf/image";

pub const DATA_NAME: &str = "data";
pub const GAIN_NAME: &str = "gain";
pub const TRAIN_ID_NAME: &str = "trainId";
pub const PULSE_ID_NAME: &str = "pulseId";
pub const CELL_ID_NAME: &str = "cellId";
pub const STATUS_NAME: &str = "status";

/// Above this many (train, pulse, module) slots the frame index switches to sparse storage
pub const DEFAULT_MAX_DENSE_INDEX_ENTRIES: usize = 50_000_000;

/// Half-width of the display contrast window around the mean, in standard deviations
pub const CONTRAST_WINDOW_SIGMA: f64 = 1.5;
