use fxhash::FxHashMap;

use super::config::AssemblyOptions;
use super::error::FrameIndexError;
use super::module::ModuleHeader;
use super::validator::UsableModules;

/// The rectangle of train and pulse IDs observed across the usable modules (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdBounds {
    pub min_train: u64,
    pub max_train: u64,
    pub min_pulse: u64,
    pub max_pulse: u64,
}

impl IdBounds {
    /// Compute the bounds over every frame of every usable module.
    ///
    /// Returns None if the usable modules recorded no frames at all.
    pub fn from_modules(headers: &[&ModuleHeader], usable: &UsableModules) -> Option<Self> {
        headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| usable[*idx])
            .flat_map(|(_, header)| header.frame_ids())
            .fold(None, |bounds: Option<Self>, (_, train, pulse)| match bounds {
                None => Some(Self {
                    min_train: train,
                    max_train: train,
                    min_pulse: pulse,
                    max_pulse: pulse,
                }),
                Some(b) => Some(Self {
                    min_train: b.min_train.min(train),
                    max_train: b.max_train.max(train),
                    min_pulse: b.min_pulse.min(pulse),
                    max_pulse: b.max_pulse.max(pulse),
                }),
            })
    }

    pub fn contains_train(&self, train: u64) -> bool {
        (self.min_train..=self.max_train).contains(&train)
    }

    pub fn contains_pulse(&self, pulse: u64) -> bool {
        (self.min_pulse..=self.max_pulse).contains(&pulse)
    }

    pub fn contains(&self, train: u64, pulse: u64) -> bool {
        self.contains_train(train) && self.contains_pulse(pulse)
    }

    // Counts are u128 so a range over every u64 ID still fits

    pub fn n_trains(&self) -> u128 {
        u128::from(self.max_train - self.min_train) + 1
    }

    pub fn n_pulses(&self) -> u128 {
        u128::from(self.max_pulse - self.min_pulse) + 1
    }

    /// Number of (train, pulse) positions, None if it does not fit in a u128
    pub fn n_positions(&self) -> Option<u128> {
        self.n_trains().checked_mul(self.n_pulses())
    }
}

/// The result of looking up a key inside the observed rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The module recorded this event at the given local frame
    Frame(usize),
    /// The module produced no frame for this event
    Unassigned,
}

#[derive(Debug, Clone)]
enum Storage {
    /// One entry per (train, pulse, module) in the rectangle, train-major
    Dense(Vec<Option<u32>>),
    /// Only assigned keys are stored; anything else inside the rectangle is unassigned
    Sparse(FxHashMap<(u64, u64, usize), usize>),
}

/// Position of an in-bounds key in the dense storage
fn flat_position(
    bounds: &IdBounds,
    n_modules: usize,
    train: u64,
    pulse: u64,
    module: usize,
) -> usize {
    let train_offset = (train - bounds.min_train) as usize;
    let pulse_offset = (pulse - bounds.min_pulse) as usize;
    (train_offset * bounds.n_pulses() as usize + pulse_offset) * n_modules + module
}

/// Maps (train ID, pulse ID, module) to the module-local frame number.
#[derive(Debug, Clone)]
pub struct FrameIndex {
    bounds: IdBounds,
    n_modules: usize,
    storage: Storage,
    duplicates: usize,
    dropped: usize,
}

impl FrameIndex {
    /// Build the index over the bounds of the usable modules, then record the frames of every module.
    ///
    /// A key seen twice within one module keeps the later frame. Frames outside the bounds
    /// (only possible for unusable modules) are dropped.
    pub fn build(
        headers: &[&ModuleHeader],
        usable: &UsableModules,
        options: &AssemblyOptions,
    ) -> Result<Self, FrameIndexError> {
        let bounds = IdBounds::from_modules(headers, usable).ok_or(FrameIndexError::NoBounds)?;
        let n_modules = headers.len();

        let n_slots = bounds
            .n_positions()
            .and_then(|n| n.checked_mul(n_modules as u128));
        let storage = match n_slots {
            Some(n) if n <= options.max_dense_index_entries as u128 => {
                Storage::Dense(vec![None; n as usize])
            }
            _ => {
                log::info!(
                    "Frame index rectangle has {} slots, using sparse storage",
                    n_slots.map_or(String::from("more than u128::MAX"), |n| n.to_string())
                );
                Storage::Sparse(FxHashMap::default())
            }
        };

        let mut index = Self {
            bounds,
            n_modules,
            storage,
            duplicates: 0,
            dropped: 0,
        };

        for (module, header) in headers.iter().enumerate() {
            for (frame, train, pulse) in header.frame_ids() {
                if !bounds.contains(train, pulse) {
                    index.dropped += 1;
                    continue;
                }
                if index.insert(train, pulse, module, frame) {
                    index.duplicates += 1;
                    log::warn!(
                        "Module {} recorded train {} pulse {} more than once, using frame {}",
                        module,
                        train,
                        pulse,
                        frame
                    );
                }
            }
        }

        if index.dropped > 0 {
            log::warn!(
                "{} frames of unusable modules lie outside the train/pulse bounds and were not indexed",
                index.dropped
            );
        }

        Ok(index)
    }

    /// Record a frame; returns true if the key was already assigned
    fn insert(&mut self, train: u64, pulse: u64, module: usize, frame: usize) -> bool {
        let (bounds, n_modules) = (self.bounds, self.n_modules);
        if let Storage::Dense(slots) = &mut self.storage {
            match u32::try_from(frame) {
                Ok(local) => {
                    return slots[flat_position(&bounds, n_modules, train, pulse, module)]
                        .replace(local)
                        .is_some()
                }
                Err(_) => self.make_sparse(),
            }
        }
        match &mut self.storage {
            Storage::Sparse(map) => map.insert((train, pulse, module), frame).is_some(),
            Storage::Dense(_) => false,
        }
    }

    /// Move every assigned key of the dense table into sparse storage
    fn make_sparse(&mut self) {
        let Storage::Dense(slots) = &self.storage else {
            return;
        };
        log::info!("Local frame numbers exceed the dense index, using sparse storage");
        let n_pulses = self.bounds.n_pulses() as usize;
        let n_modules = self.n_modules;
        let map: FxHashMap<(u64, u64, usize), usize> = slots
            .iter()
            .enumerate()
            .filter_map(|(position, slot)| {
                let frame = (*slot)?;
                let module = position % n_modules;
                let event = position / n_modules;
                let train = self.bounds.min_train + (event / n_pulses) as u64;
                let pulse = self.bounds.min_pulse + (event % n_pulses) as u64;
                Some(((train, pulse, module), frame as usize))
            })
            .collect();
        self.storage = Storage::Sparse(map);
    }

    /// Look up the frame a module recorded for an event.
    ///
    /// Keys outside the observed rectangle are an error; keys inside it which the module never
    /// recorded are `Slot::Unassigned`.
    pub fn lookup(&self, train: u64, pulse: u64, module: usize) -> Result<Slot, FrameIndexError> {
        if !self.bounds.contains(train, pulse) || module >= self.n_modules {
            return Err(FrameIndexError::OutOfRange(train, pulse, module));
        }
        let frame = match &self.storage {
            Storage::Dense(slots) => {
                slots[flat_position(&self.bounds, self.n_modules, train, pulse, module)]
                    .map(|f| f as usize)
            }
            Storage::Sparse(map) => map.get(&(train, pulse, module)).copied(),
        };
        Ok(frame.map_or(Slot::Unassigned, Slot::Frame))
    }

    pub fn bounds(&self) -> &IdBounds {
        &self.bounds
    }

    pub fn n_modules(&self) -> usize {
        self.n_modules
    }

    pub fn is_dense(&self) -> bool {
        matches!(self.storage, Storage::Dense(_))
    }

    /// Number of keys which were recorded more than once within a module
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Number of frames which could not be indexed because they lie outside the bounds
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}
