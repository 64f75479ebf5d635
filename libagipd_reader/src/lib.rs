//! # agipd_reader
//!
//! agipd_reader assembles detector images from the Adaptive Gain Integrating Pixel Detector
//! (AGIPD) at the European XFEL, written in Rust. Each of the sixteen AGIPD modules writes its
//! own HDF5 file with its own local frame numbering. agipd_reader opens the files of all
//! modules, works out which local frame of each module belongs to a given train and pulse, and
//! stacks them into one composite frame (pixel data, mask and gain) per event, even when some
//! modules did not record that event.
//!
//! ## Installation
//!
//! Currently the only method of install is from source.
//!
//! ### HDF5
//!
//! Before building agipd_reader, HDF5 must be installed. Typically this will be installed
//! using a package manager (homebrew, apt, etc), and the Rust libraries will auto detect the
//! location of the HDF install. If HDF5 is installed to a custom location, write the following
//! snippet into the file `.cargo/config.toml` in the agipd_reader repository:
//!
//! ```toml
//! [env]
//! HDF5_DIR="/path/to/my/hdf5/install/"
//!
//! [build]
//! rustflags="-C link-args=-Wl,-rpath,/path/to/my/hdf5/install/lib"
//! ```
//!
//! ### Building & Install
//!
//! To build and install the CLI use `cargo install --path ./agipd_reader_cli` from the top
//! level agipd_reader repository.
//!
//! ## Configuration
//!
//! The YAML format of a configuration file is as follows:
//!
//! ```yml
//! base_path: /gpfs/exfel/raw/r0031/RAW-R0031-AGIPD00-S00000.h5
//! module_token: AGIPD
//! n_modules: 16
//! image_group: INSTRUMENT/SPB_DET_AGIPD1M-1/DET/{module}CH0:xtdf/image
//! assemble_unusable_modules: false
//! max_dense_index_entries: 50000000
//! ```
//!
//! - `base_path`: the file of any one module. The files of the other modules are found by
//! replacing the two digits after `module_token` in the file name with the module number.
//! - `image_group`: the group holding the `data`, `trainId`, `pulseId`, `cellId` and
//! (optional) `status` datasets of a module; `{module}` is replaced by the module number.
//! - `assemble_unusable_modules`: modules whose frame count or frame size disagree with
//! module 0 are flagged unusable when opening. By default they are always assembled as absent;
//! set this to read them anyway (only possible when their frame size matches).
//! - `max_dense_index_entries`: the train/pulse to frame index is a dense table unless it would
//! have more entries than this, in which case a hash map is used.
//!
//! ## Composite frame
//!
//! The composite frame stacks the modules one on top of another:
//!
//! ```text
//! data  f32 (modules, rows, cols)  module pixel data, zero if the module is absent
//! mask  u16 (modules, rows, cols)  module status over the whole module, 1 if absent
//! gain  u16 (modules, rows, cols)  digital gain stage, zero if the module is absent
//! ```
//!
//! Module `i` occupies the flat range `i * rows * cols..(i + 1) * rows * cols` of each array.
pub mod composite;
pub mod config;
pub mod constants;
pub mod cursor;
pub mod error;
pub mod filenames;
pub mod frame_index;
pub mod module;
pub mod module_file;
pub mod process;
pub mod projection;
pub mod reader;
pub mod validator;
pub mod worker_status;
