use std::path::PathBuf;

use super::composite::CompositeFrame;
use super::config::{AssemblyOptions, Config};
use super::cursor::Cursor;
use super::error::{ReadFrameError, ReaderError, ValidationError};
use super::filenames::ModuleNaming;
use super::frame_index::{FrameIndex, IdBounds, Slot};
use super::module::{ModuleHeader, ModuleSource};
use super::module_file::ModuleFile;
use super::validator::{validate, UsableModules};

/// What a successful read assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSummary {
    pub train_id: u64,
    pub pulse_id: u64,
    /// Number of modules which had a frame for this event
    pub modules_present: usize,
}

/// A reading session over every module of the detector.
///
/// At open the modules are checked against module 0, the train/pulse bounds are computed from
/// the usable modules and the frame index is built. After that each `read_frame` assembles one
/// event into the composite buffers owned by the reader.
#[derive(Debug)]
pub struct AgipdReader<M: ModuleSource = ModuleFile> {
    modules: Vec<M>,
    paths: Vec<PathBuf>,
    usable: UsableModules,
    raw_data: bool,
    n_frames: usize,
    module_dims: (usize, usize),
    index: Option<FrameIndex>,
    cursor: Option<Cursor>,
    composite: CompositeFrame,
    options: AssemblyOptions,
}

impl AgipdReader<ModuleFile> {
    /// Open every module file belonging to the base path in the configuration
    pub fn open(config: &Config) -> Result<Self, ReaderError> {
        Self::open_with_naming(config, &config.module_naming())
    }

    /// Open every module file, deriving the module file names with a custom convention
    pub fn open_with_naming(
        config: &Config,
        naming: &dyn ModuleNaming,
    ) -> Result<Self, ReaderError> {
        config.validate()?;
        log::info!(
            "Opening all modules for {}",
            config.base_path.to_string_lossy()
        );
        let paths = naming.module_paths(&config.base_path, config.n_modules)?;
        if paths.len() != config.n_modules {
            return Err(ReaderError::WrongModuleCount(paths.len(), config.n_modules));
        }

        let mut modules = Vec::with_capacity(paths.len());
        for (idx, path) in paths.iter().enumerate() {
            log::debug!("Module {:0>2} = {}", idx, path.to_string_lossy());
            let module = ModuleFile::open(path, idx, &config.image_group_for(idx))
                .map_err(|e| ReaderError::ModuleError(idx, e))?;
            modules.push(module);
        }
        let total_size: u64 = modules.iter().map(|m| m.get_size_bytes()).sum();
        log::info!(
            "Opened {} module files with total size: {}",
            modules.len(),
            human_bytes::human_bytes(total_size as f64)
        );

        let mut reader = Self::from_modules(modules, config.assembly_options())?;
        reader.paths = paths;
        Ok(reader)
    }
}

impl<M: ModuleSource> AgipdReader<M> {
    /// Create a session from already opened modules. Module `i` of the detector is `modules[i]`.
    pub fn from_modules(modules: Vec<M>, options: AssemblyOptions) -> Result<Self, ReaderError> {
        let headers: Vec<&ModuleHeader> = modules.iter().map(|m| m.header()).collect();
        let usable = validate(&headers)?;
        let reference = *headers.first().ok_or(ValidationError::NoModules)?;
        let raw_data = reference.raw_data;
        let n_frames = reference.n_frames;
        let module_dims = reference.dims;

        let index = match FrameIndex::build(&headers, &usable, &options) {
            Ok(index) => Some(index),
            Err(e) => {
                log::warn!("{e}");
                None
            }
        };
        let cursor = index.as_ref().map(|i| Cursor::new(*i.bounds()));
        if let Some(bounds) = index.as_ref().map(|i| i.bounds()) {
            log::info!(
                "Trains extend from IDs {} to {}",
                bounds.min_train,
                bounds.max_train
            );
            log::info!(
                "Pulses extend from IDs {} to {}",
                bounds.min_pulse,
                bounds.max_pulse
            );
        }
        if usable.count_zeros() > 0 {
            log::warn!(
                "{} of {} modules are unusable and will be {}",
                usable.count_zeros(),
                usable.len(),
                if options.assemble_unusable_modules {
                    "read where their frame size allows"
                } else {
                    "assembled as absent"
                }
            );
        }

        let composite = CompositeFrame::new(modules.len(), module_dims);
        log::info!(
            "All {} modules successfully opened ({} data, {}x{} pixels per module)",
            modules.len(),
            if raw_data { "raw" } else { "processed" },
            module_dims.0,
            module_dims.1
        );

        Ok(Self {
            modules,
            paths: Vec::new(),
            usable,
            raw_data,
            n_frames,
            module_dims,
            index,
            cursor,
            composite,
            options,
        })
    }

    /// Whether a module takes part in assembly. Usable modules always do; unusable ones only if
    /// enabled and their frames fit the module sub-region.
    fn is_assembled(&self, module: usize) -> bool {
        self.usable[module]
            || (self.options.assemble_unusable_modules
                && self.modules[module].header().dims == self.module_dims)
    }

    /// Assemble the event (train, pulse) into the composite buffers.
    ///
    /// Coordinates outside the bounds fail without touching the buffers, so another event may
    /// be requested. Modules without a frame for the event are zero filled and their mask is set
    /// to `ABSENT_STATUS`. If a module read fails the buffers may hold a partial event, and the
    /// composite then reports no event.
    pub fn read_frame(&mut self, train: u64, pulse: u64) -> Result<FrameSummary, ReadFrameError> {
        let index = self.index.as_ref().ok_or(ReadFrameError::NoBounds)?;
        let bounds = index.bounds();
        if !bounds.contains_train(train) {
            log::warn!("read_frame: train ID out of bounds {}", train);
            return Err(ReadFrameError::TrainOutOfBounds(
                train,
                bounds.min_train,
                bounds.max_train,
            ));
        }
        if !bounds.contains_pulse(pulse) {
            log::warn!("read_frame: pulse ID out of bounds {}", pulse);
            return Err(ReadFrameError::PulseOutOfBounds(
                pulse,
                bounds.min_pulse,
                bounds.max_pulse,
            ));
        }

        let assembled: Vec<bool> = (0..self.modules.len())
            .map(|module| self.is_assembled(module))
            .collect();
        self.composite.begin_event();
        for (module, source) in self.modules.iter_mut().enumerate() {
            let slot = if assembled[module] {
                index.lookup(train, pulse, module)?
            } else {
                Slot::Unassigned
            };

            match slot {
                Slot::Unassigned => self.composite.fill_absent(module, source.last_cell_id()),
                Slot::Frame(frame) => {
                    let payload = source
                        .read_frame(frame)
                        .map_err(|source| ReadFrameError::Module {
                            module,
                            frame,
                            source,
                        })?;
                    self.composite
                        .fill_module(module, &payload)
                        .map_err(|found| ReadFrameError::BadFrameShape {
                            module,
                            found,
                            expected: self.module_dims,
                        })?;
                }
            }
        }

        let modules_present = self.composite.finish_event(train, pulse);
        log::debug!(
            "Read train {}, pulse {} with {} modules.",
            train,
            pulse,
            modules_present
        );
        Ok(FrameSummary {
            train_id: train,
            pulse_id: pulse,
            modules_present,
        })
    }

    /// Advance the cursor one pulse (wrapping to the next train) and read that event.
    ///
    /// Returns `Ok(None)` once the cursor has passed the last train.
    pub fn next_frame(&mut self) -> Result<Option<FrameSummary>, ReadFrameError> {
        let cursor = self.cursor.as_mut().ok_or(ReadFrameError::NoBounds)?;
        match cursor.advance() {
            Some((train, pulse)) => self.read_frame(train, pulse).map(Some),
            None => Ok(None),
        }
    }

    /// Read the event at the cursor without moving it.
    ///
    /// Once the cursor has moved past the last train this fails the train bounds check.
    pub fn read_current(&mut self) -> Result<FrameSummary, ReadFrameError> {
        let cursor = self.cursor.as_ref().ok_or(ReadFrameError::NoBounds)?;
        let (train, pulse) = cursor.position();
        if cursor.is_exhausted() && cursor.bounds().contains_train(train) {
            // The train ID could not be advanced past u64::MAX
            let bounds = cursor.bounds();
            return Err(ReadFrameError::TrainOutOfBounds(
                train,
                bounds.min_train,
                bounds.max_train,
            ));
        }
        self.read_frame(train, pulse)
    }

    /// Move the cursor back to (min train, min pulse)
    pub fn reset_cursor(&mut self) {
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.reset();
        }
    }

    /// Release every module, consuming the reader
    pub fn close(self) {
        log::info!("Closing AGIPD files");
        for path in self.paths.iter() {
            log::debug!("Closing {}", path.to_string_lossy());
        }
        drop(self.modules);
        log::info!("Closed {} modules", self.usable.len());
    }

    /// Train/pulse bounds, None if no usable module recorded a frame
    pub fn bounds(&self) -> Option<&IdBounds> {
        self.index.as_ref().map(|i| i.bounds())
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn frame_index(&self) -> Option<&FrameIndex> {
        self.index.as_ref()
    }

    pub fn composite(&self) -> &CompositeFrame {
        &self.composite
    }

    pub fn n_modules(&self) -> usize {
        self.modules.len()
    }

    /// (rows, cols) of a single module, taken from module 0
    pub fn module_dims(&self) -> (usize, usize) {
        self.module_dims
    }

    /// (rows, cols) of the stacked composite image
    pub fn composite_dims(&self) -> (usize, usize) {
        (self.module_dims.0 * self.modules.len(), self.module_dims.1)
    }

    /// Frame count of module 0
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    pub fn is_raw_data(&self) -> bool {
        self.raw_data
    }

    pub fn usable(&self) -> &UsableModules {
        &self.usable
    }

    pub fn modules(&self) -> &[M] {
        &self.modules
    }

    pub fn module_paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ABSENT_STATUS;
    use crate::error::ModuleFileError;
    use crate::module::mock::{pattern, MemoryModule};
    use crate::module::ModuleFrame;

    /// The two module scenario: module 1 is missing (100, 1)
    fn scenario() -> AgipdReader<MemoryModule> {
        let m0 = MemoryModule::new(0, (2, 2), &[(100, 0), (100, 1), (101, 0)]);
        let m1 = MemoryModule::new(1, (2, 2), &[(100, 0), (101, 0), (101, 1)]);
        AgipdReader::from_modules(vec![m0, m1], AssemblyOptions::default()).unwrap()
    }

    fn assert_module_is_frame(reader: &AgipdReader<MemoryModule>, module: usize, frame: usize) {
        let composite = reader.composite();
        let range = composite.module_range(module);
        for (pixel, value) in composite.data()[range.clone()].iter().enumerate() {
            assert_eq!(*value, pattern(module, frame, pixel));
        }
        let gain = (frame % 3) as u16 + 1;
        assert!(composite.gain()[range].iter().all(|g| *g == gain));
    }

    fn assert_module_is_absent(reader: &AgipdReader<MemoryModule>, module: usize) {
        let composite = reader.composite();
        let range = composite.module_range(module);
        assert!(composite.data()[range.clone()].iter().all(|v| *v == 0.0));
        assert!(composite.gain()[range.clone()].iter().all(|g| *g == 0));
        assert!(composite.mask()[range].iter().all(|m| *m == ABSENT_STATUS));
        assert_eq!(composite.status_ids()[module], ABSENT_STATUS);
    }

    #[test]
    fn test_scenario_bounds_and_missing_module() {
        let mut reader = scenario();
        assert_eq!(
            reader.bounds(),
            Some(&IdBounds {
                min_train: 100,
                max_train: 101,
                min_pulse: 0,
                max_pulse: 1
            })
        );

        let summary = reader.read_frame(100, 1).unwrap();
        assert_eq!(summary.modules_present, 1);
        assert_module_is_frame(&reader, 0, 1);
        assert_module_is_absent(&reader, 1);
        assert_eq!(reader.composite().event(), Some((100, 1)));
    }

    #[test]
    fn test_composite_size_is_unconditional() {
        let mut reader = scenario();
        for (train, pulse) in [(100, 0), (100, 1), (101, 0), (101, 1)] {
            reader.read_frame(train, pulse).unwrap();
            let composite = reader.composite();
            assert_eq!(composite.data().len(), 2 * 2 * 2);
            assert_eq!(composite.mask().len(), 2 * 2 * 2);
            assert_eq!(composite.gain().len(), 2 * 2 * 2);
        }
    }

    #[test]
    fn test_out_of_bounds_leaves_buffers_unchanged() {
        let mut reader = scenario();
        reader.read_frame(101, 0).unwrap();
        let before = reader.composite().clone();

        for (train, pulse) in [(99, 0), (102, 0), (100, 2), (u64::MAX, u64::MAX)] {
            let err = reader.read_frame(train, pulse).unwrap_err();
            assert!(err.is_out_of_bounds());
            assert_eq!(reader.composite(), &before);
        }
        assert!(matches!(
            reader.read_frame(102, 0),
            Err(ReadFrameError::TrainOutOfBounds(102, 100, 101))
        ));
        assert!(matches!(
            reader.read_frame(100, 5),
            Err(ReadFrameError::PulseOutOfBounds(5, 0, 1))
        ));
        // A failed read does not stop later reads
        assert!(reader.read_frame(100, 0).is_ok());
    }

    #[test]
    fn test_read_is_idempotent() {
        let mut reader = scenario();
        reader.read_frame(101, 0).unwrap();
        let first = reader.composite().clone();
        reader.read_frame(100, 0).unwrap();
        reader.read_frame(101, 0).unwrap();
        assert_eq!(reader.composite(), &first);
    }

    #[test]
    fn test_read_with_absent_module_is_idempotent() {
        let mut reader = scenario();
        reader.read_frame(100, 1).unwrap();
        let first = reader.composite().clone();
        // Module 0 is absent at (101, 1), module 1 at (100, 1)
        assert_eq!(reader.read_frame(101, 1).unwrap().modules_present, 1);
        reader.read_frame(100, 1).unwrap();

        // Cell IDs of absent modules follow the read history, so only the buffers are compared
        let again = reader.composite();
        assert_eq!(again.data(), first.data());
        assert_eq!(again.mask(), first.mask());
        assert_eq!(again.gain(), first.gain());
        assert_eq!(again.status_ids(), first.status_ids());
        assert_eq!(again.event(), first.event());
    }

    #[test]
    fn test_present_frames_are_copied_exactly() {
        let mut reader = scenario();
        reader.read_frame(101, 0).unwrap();
        assert_module_is_frame(&reader, 0, 2);
        assert_module_is_frame(&reader, 1, 1);
        assert_eq!(reader.composite().modules_present(), 2);
    }

    #[test]
    fn test_status_covers_module_mask() {
        let m0 = MemoryModule::new(0, (3, 2), &[(7, 0), (7, 1)]).with_status(1, 12);
        let m1 = MemoryModule::new(1, (3, 2), &[(7, 0), (7, 1)]);
        let mut reader = AgipdReader::from_modules(vec![m0, m1], AssemblyOptions::default()).unwrap();
        reader.read_frame(7, 1).unwrap();
        let composite = reader.composite();
        assert!(composite.module_mask(0).iter().all(|m| *m == 12));
        assert!(composite.module_mask(1).iter().all(|m| *m == 0));
        assert_eq!(composite.status_ids(), &[12, 0]);
    }

    #[test]
    fn test_absent_module_keeps_last_cell_id() {
        let mut reader = scenario();
        reader.read_frame(101, 1).unwrap();
        // Module 1 frame 2 has cell ID 12
        assert_eq!(reader.composite().cell_ids()[1], 12);
        reader.read_frame(100, 1).unwrap();
        assert_eq!(reader.composite().cell_ids()[1], 12);
        assert_eq!(reader.composite().cell_ids()[0], 11);
    }

    #[test]
    fn test_cursor_iteration() {
        let mut reader = scenario();
        assert_eq!(reader.cursor().unwrap().position(), (100, 0));

        let first = reader.read_current().unwrap();
        assert_eq!((first.train_id, first.pulse_id), (100, 0));

        let mut visited = Vec::new();
        while let Some(summary) = reader.next_frame().unwrap() {
            visited.push((summary.train_id, summary.pulse_id));
        }
        assert_eq!(visited, vec![(100, 1), (101, 0), (101, 1)]);
        assert!(reader.next_frame().unwrap().is_none());
        assert!(reader.read_current().unwrap_err().is_out_of_bounds());

        reader.reset_cursor();
        assert_eq!(reader.cursor().unwrap().position(), (100, 0));
        assert_eq!(reader.next_frame().unwrap().unwrap().pulse_id, 1);
    }

    #[test]
    fn test_cursor_wraps_after_full_pulse_range() {
        let ids: Vec<(u64, u64)> = (0..4).flat_map(|t| (3..6).map(move |p| (50 + t, p))).collect();
        let m0 = MemoryModule::new(0, (1, 1), &ids);
        let mut reader = AgipdReader::from_modules(vec![m0], AssemblyOptions::default()).unwrap();
        for _ in 0..3 {
            reader.next_frame().unwrap().unwrap();
        }
        let cursor = reader.cursor().unwrap();
        assert_eq!(cursor.current_train(), 51);
        assert_eq!(cursor.current_pulse(), 3);
    }

    #[test]
    fn test_single_train_iteration_ends_past_last_train() {
        let m0 = MemoryModule::new(0, (1, 1), &[(100, 0), (100, 1)]);
        let mut reader = AgipdReader::from_modules(vec![m0], AssemblyOptions::default()).unwrap();
        reader.read_current().unwrap();
        assert_eq!(reader.next_frame().unwrap().unwrap().pulse_id, 1);
        assert!(reader.next_frame().unwrap().is_none());
        assert_eq!(reader.cursor().unwrap().position(), (101, 0));
        assert!(matches!(
            reader.read_current(),
            Err(ReadFrameError::TrainOutOfBounds(101, 100, 100))
        ));
    }

    #[test]
    fn test_unusable_module_is_assembled_as_absent() {
        // Module 1 has one frame fewer than module 0
        let m0 = MemoryModule::new(0, (2, 2), &[(1, 0), (1, 1), (2, 0)]);
        let m1 = MemoryModule::new(1, (2, 2), &[(1, 0), (1, 1)]);
        let mut reader =
            AgipdReader::from_modules(vec![m0.clone(), m1.clone()], AssemblyOptions::default())
                .unwrap();
        assert!(!reader.usable()[1]);
        let summary = reader.read_frame(1, 0).unwrap();
        assert_eq!(summary.modules_present, 1);
        assert_module_is_absent(&reader, 1);
        assert_eq!(reader.modules()[1].reads, 0);

        let options = AssemblyOptions {
            assemble_unusable_modules: true,
            ..Default::default()
        };
        let mut reader = AgipdReader::from_modules(vec![m0, m1], options).unwrap();
        let summary = reader.read_frame(1, 0).unwrap();
        assert_eq!(summary.modules_present, 2);
        assert_module_is_frame(&reader, 1, 0);
    }

    #[test]
    fn test_unusable_module_with_other_size_is_never_read() {
        let m0 = MemoryModule::new(0, (2, 2), &[(1, 0)]);
        let m1 = MemoryModule::new(1, (2, 3), &[(1, 0)]);
        let options = AssemblyOptions {
            assemble_unusable_modules: true,
            ..Default::default()
        };
        let mut reader = AgipdReader::from_modules(vec![m0, m1], options).unwrap();
        assert!(!reader.usable()[1]);
        assert_eq!(reader.read_frame(1, 0).unwrap().modules_present, 1);
        assert_module_is_absent(&reader, 1);
    }

    #[test]
    fn test_unusable_modules_do_not_widen_bounds() {
        let m0 = MemoryModule::new(0, (2, 2), &[(10, 0), (11, 0)]);
        let m1 = MemoryModule::new(1, (2, 2), &[(5, 0), (30, 4), (11, 0)]);
        let reader = AgipdReader::from_modules(vec![m0, m1], AssemblyOptions::default()).unwrap();
        let bounds = reader.bounds().unwrap();
        assert_eq!((bounds.min_train, bounds.max_train), (10, 11));
        assert_eq!((bounds.min_pulse, bounds.max_pulse), (0, 0));
    }

    #[test]
    fn test_mixed_data_modes_fail_to_open() {
        let m0 = MemoryModule::new(0, (2, 2), &[(1, 0)]);
        let m1 = MemoryModule::new(1, (2, 2), &[(1, 0)]).processed();
        let result = AgipdReader::from_modules(vec![m0, m1], AssemblyOptions::default());
        assert!(matches!(
            result,
            Err(ReaderError::ValidationError(ValidationError::DataModeMismatch(1)))
        ));
    }

    #[test]
    fn test_no_frames_means_no_bounds() {
        let m0 = MemoryModule::new(0, (2, 2), &[]);
        let mut reader = AgipdReader::from_modules(vec![m0], AssemblyOptions::default()).unwrap();
        assert!(reader.bounds().is_none());
        assert!(matches!(reader.read_frame(0, 0), Err(ReadFrameError::NoBounds)));
        assert!(matches!(reader.next_frame(), Err(ReadFrameError::NoBounds)));
    }

    #[test]
    fn test_duplicate_key_reads_last_frame() {
        let m0 = MemoryModule::new(0, (1, 2), &[(3, 0), (3, 1), (3, 0)]);
        let mut reader = AgipdReader::from_modules(vec![m0], AssemblyOptions::default()).unwrap();
        assert_eq!(reader.frame_index().unwrap().duplicates(), 1);
        reader.read_frame(3, 0).unwrap();
        assert_module_is_frame(&reader, 0, 2);
    }

    #[test]
    fn test_sparse_index_reads_like_dense() {
        let options = AssemblyOptions {
            max_dense_index_entries: 0,
            ..Default::default()
        };
        let m0 = MemoryModule::new(0, (2, 2), &[(100, 0), (100, 1), (101, 0)]);
        let m1 = MemoryModule::new(1, (2, 2), &[(100, 0), (101, 0), (101, 1)]);
        let mut reader = AgipdReader::from_modules(vec![m0, m1], options).unwrap();
        assert!(!reader.frame_index().unwrap().is_dense());
        reader.read_frame(100, 1).unwrap();
        assert_module_is_frame(&reader, 0, 1);
        assert_module_is_absent(&reader, 1);
    }

    /// A module whose reads fail when broken
    struct BrokenModule {
        inner: MemoryModule,
        broken: bool,
    }

    impl ModuleSource for BrokenModule {
        fn header(&self) -> &ModuleHeader {
            self.inner.header()
        }

        fn read_frame(&mut self, frame: usize) -> Result<ModuleFrame, ModuleFileError> {
            if self.broken {
                return Err(ModuleFileError::FrameOutOfRange(frame, 0));
            }
            self.inner.read_frame(frame)
        }

        fn last_cell_id(&self) -> u16 {
            self.inner.last_cell_id()
        }
    }

    #[test]
    fn test_module_read_failure_is_reported() {
        let modules = vec![
            BrokenModule {
                inner: MemoryModule::new(0, (2, 2), &[(1, 0), (1, 1)]),
                broken: true,
            },
            BrokenModule {
                inner: MemoryModule::new(1, (2, 2), &[(1, 1)]),
                broken: true,
            },
        ];
        let mut reader = AgipdReader::from_modules(modules, AssemblyOptions::default()).unwrap();
        assert!(matches!(
            reader.read_frame(1, 1),
            Err(ReadFrameError::Module {
                module: 0,
                frame: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_partial_read_clears_event() {
        let modules = vec![
            BrokenModule {
                inner: MemoryModule::new(0, (2, 2), &[(1, 0), (1, 1)]),
                broken: false,
            },
            BrokenModule {
                inner: MemoryModule::new(1, (2, 2), &[(1, 1), (2, 0)]),
                broken: true,
            },
        ];
        let mut reader = AgipdReader::from_modules(modules, AssemblyOptions::default()).unwrap();
        assert_eq!(reader.read_frame(1, 0).unwrap().modules_present, 1);
        assert_eq!(reader.composite().event(), Some((1, 0)));

        assert!(matches!(
            reader.read_frame(1, 1),
            Err(ReadFrameError::Module { module: 1, .. })
        ));
        // Module 0 already holds its frame for (1, 1)
        let composite = reader.composite();
        assert_eq!(composite.module_data(0)[[0, 1]], pattern(0, 1, 1));
        assert_eq!(composite.event(), None);
        assert_eq!(composite.modules_present(), 0);
    }

    /// Always names a single module file
    struct SingleFileNaming;

    impl ModuleNaming for SingleFileNaming {
        fn module_path(
            &self,
            base_path: &std::path::Path,
            _module: usize,
        ) -> Result<PathBuf, crate::error::FilenameError> {
            Ok(base_path.to_path_buf())
        }

        fn module_paths(
            &self,
            base_path: &std::path::Path,
            _n_modules: usize,
        ) -> Result<Vec<PathBuf>, crate::error::FilenameError> {
            Ok(vec![base_path.to_path_buf()])
        }
    }

    #[test]
    fn test_naming_must_cover_every_module() {
        let config = Config {
            base_path: PathBuf::from("/data/RAW-R0001-AGIPD00-S00000.h5"),
            ..Default::default()
        };
        assert!(matches!(
            AgipdReader::open_with_naming(&config, &SingleFileNaming),
            Err(ReaderError::WrongModuleCount(1, 16))
        ));
    }

    #[test]
    fn test_open_from_module_files() {
        use crate::module_file::test_files::{raw_value, write_raw_module};

        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            base_path: dir.path().join("RAW-R0042-AGIPD00-S00000.h5"),
            n_modules: 3,
            image_group: String::from("DET/{module}CH0:xtdf/image"),
            ..Default::default()
        };
        let naming = config.module_naming();
        let paths = naming
            .module_paths(&config.base_path, config.n_modules)
            .unwrap();
        let ids = [(200, 0), (200, 1), (201, 0), (201, 1)];
        for (module, path) in paths.iter().enumerate() {
            let module_ids: Vec<(u64, u64)> = if module == 2 {
                // Module 2 dropped (200, 1)
                vec![(200, 0), (201, 0), (201, 1)]
            } else {
                ids.to_vec()
            };
            write_raw_module(path, &config.image_group_for(module), module, (2, 3), &module_ids)
                .unwrap();
        }

        let mut reader = AgipdReader::open(&config).unwrap();
        assert_eq!(reader.n_modules(), 3);
        assert_eq!(reader.module_dims(), (2, 3));
        assert_eq!(reader.composite_dims(), (6, 3));
        assert!(reader.is_raw_data());
        assert_eq!(reader.module_paths(), paths.as_slice());
        // Module 2 has fewer frames and is left out by default
        assert!(!reader.usable()[2]);

        let summary = reader.read_frame(200, 1).unwrap();
        assert_eq!(summary.modules_present, 2);
        let composite = reader.composite();
        assert_eq!(composite.module_data(1)[[1, 2]], raw_value(1, 1, 1, 2) as f32);
        assert!(composite.module_mask(1).iter().all(|m| *m == 4));
        assert!(composite.module_mask(2).iter().all(|m| *m == ABSENT_STATUS));
        reader.close();
    }

    #[test]
    fn test_open_missing_module_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            base_path: dir.path().join("RAW-R0042-AGIPD00-S00000.h5"),
            n_modules: 2,
            ..Default::default()
        };
        assert!(matches!(
            AgipdReader::open(&config),
            Err(ReaderError::ModuleError(0, ModuleFileError::BadFilePath(_)))
        ));
    }
}
