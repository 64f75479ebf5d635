use ndarray::{Array3, ArrayView2, Axis};
use std::ops::Range;

use super::constants::ABSENT_STATUS;
use super::module::ModuleFrame;

/// The assembled detector image for one (train, pulse) event.
///
/// Modules are stacked along the first axis, so each array is one contiguous allocation of
/// shape (modules, rows, cols) and module `i` owns the flat range
/// `i * rows * cols..(i + 1) * rows * cols`. The buffers are allocated once and overwritten
/// by every read; copy them out to keep an event.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeFrame {
    data: Array3<f32>,
    mask: Array3<u16>,
    gain: Array3<u16>,
    cell_ids: Vec<u16>,
    status_ids: Vec<u16>,
    present: Vec<bool>,
    modules_present: usize,
    event: Option<(u64, u64)>,
}

impl CompositeFrame {
    pub fn new(n_modules: usize, module_dims: (usize, usize)) -> Self {
        let shape = (n_modules, module_dims.0, module_dims.1);
        Self {
            data: Array3::zeros(shape),
            mask: Array3::zeros(shape),
            gain: Array3::zeros(shape),
            cell_ids: vec![0; n_modules],
            status_ids: vec![0; n_modules],
            present: vec![false; n_modules],
            modules_present: 0,
            event: None,
        }
    }

    pub fn n_modules(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// (rows, cols) of a single module
    pub fn module_dims(&self) -> (usize, usize) {
        let (_, rows, cols) = self.data.dim();
        (rows, cols)
    }

    /// Number of pixels in one module
    pub fn module_len(&self) -> usize {
        let (rows, cols) = self.module_dims();
        rows * cols
    }

    /// Number of pixels in the whole composite
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat offset of a module's first pixel
    pub fn module_offset(&self, module: usize) -> usize {
        module * self.module_len()
    }

    pub fn module_range(&self, module: usize) -> Range<usize> {
        let offset = self.module_offset(module);
        offset..offset + self.module_len()
    }

    // The arrays are built by Array3::zeros and never reshaped, so they are always contiguous
    // in standard order and as_slice can not fail.

    /// Flat pixel data, module-major
    pub fn data(&self) -> &[f32] {
        self.data.as_slice().unwrap_or_default()
    }

    pub fn mask(&self) -> &[u16] {
        self.mask.as_slice().unwrap_or_default()
    }

    pub fn gain(&self) -> &[u16] {
        self.gain.as_slice().unwrap_or_default()
    }

    pub fn data_array(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn mask_array(&self) -> &Array3<u16> {
        &self.mask
    }

    pub fn gain_array(&self) -> &Array3<u16> {
        &self.gain
    }

    pub fn module_data(&self, module: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(0), module)
    }

    pub fn module_mask(&self, module: usize) -> ArrayView2<'_, u16> {
        self.mask.index_axis(Axis(0), module)
    }

    pub fn module_gain(&self, module: usize) -> ArrayView2<'_, u16> {
        self.gain.index_axis(Axis(0), module)
    }

    /// Cell ID of each module in the current event
    pub fn cell_ids(&self) -> &[u16] {
        &self.cell_ids
    }

    /// Status of each module in the current event
    pub fn status_ids(&self) -> &[u16] {
        &self.status_ids
    }

    /// Whether a module contributed a frame to the current event
    pub fn is_module_present(&self, module: usize) -> bool {
        self.present[module]
    }

    /// Number of modules which contributed a frame to the current event
    pub fn modules_present(&self) -> usize {
        self.modules_present
    }

    /// The (train, pulse) currently held, None before the first successful read
    pub fn event(&self) -> Option<(u64, u64)> {
        self.event
    }

    /// Drop the label of the event held, before the buffers are overwritten
    pub(crate) fn begin_event(&mut self) {
        self.event = None;
        self.modules_present = 0;
    }

    /// Mark a module as having no frame for this event
    pub(crate) fn fill_absent(&mut self, module: usize, cell_id: u16) {
        self.data.index_axis_mut(Axis(0), module).fill(0.0);
        self.gain.index_axis_mut(Axis(0), module).fill(0);
        self.mask.index_axis_mut(Axis(0), module).fill(ABSENT_STATUS);
        self.cell_ids[module] = cell_id;
        self.status_ids[module] = ABSENT_STATUS;
        self.present[module] = false;
    }

    /// Copy a module frame into its sub-region. The module status covers the whole mask
    /// sub-region.
    ///
    /// Returns the frame's shape as the error if it does not match the module dimensions; in
    /// that case nothing is written.
    pub(crate) fn fill_module(
        &mut self,
        module: usize,
        frame: &ModuleFrame,
    ) -> Result<(), (usize, usize)> {
        let dims = self.module_dims();
        if frame.data.dim() != dims {
            return Err(frame.data.dim());
        }
        if frame.gain.dim() != dims {
            return Err(frame.gain.dim());
        }
        self.data.index_axis_mut(Axis(0), module).assign(&frame.data);
        self.gain.index_axis_mut(Axis(0), module).assign(&frame.gain);
        self.mask.index_axis_mut(Axis(0), module).fill(frame.status);
        self.cell_ids[module] = frame.cell_id;
        self.status_ids[module] = frame.status;
        self.present[module] = true;
        Ok(())
    }

    /// Record the event held once every module has been filled; returns the number of
    /// modules present
    pub(crate) fn finish_event(&mut self, train: u64, pulse: u64) -> usize {
        self.event = Some((train, pulse));
        self.modules_present = self.present.iter().filter(|p| **p).count();
        self.modules_present
    }
}
