use bitvec::vec::BitVec;

use super::error::ValidationError;
use super::module::ModuleHeader;

/// One flag per module, set if the module agrees with the reference module (module 0)
pub type UsableModules = BitVec;

/// Check a set of modules against module 0.
///
/// A module whose frame count or frame dimensions differ from module 0 is flagged as unusable;
/// this is reported but processing continues. Mixing raw and processed data can not be
/// reconciled and is an error.
pub fn validate(headers: &[&ModuleHeader]) -> Result<UsableModules, ValidationError> {
    let reference = headers.first().ok_or(ValidationError::NoModules)?;
    let mut usable = BitVec::repeat(true, headers.len());

    log::info!("Checking number of frames in each module");
    for (idx, header) in headers.iter().enumerate().skip(1) {
        if header.n_frames != reference.n_frames {
            log::warn!(
                "Inconsistent number of frames between modules 0 and {}: {} != {}",
                idx,
                header.n_frames,
                reference.n_frames
            );
            usable.set(idx, false);
        }
    }

    log::info!("Checking all data is of the same type");
    if let Some(idx) = headers
        .iter()
        .position(|header| header.raw_data != reference.raw_data)
    {
        log::error!(
            "Inconsistent data, module {} is {} while module 0 is {}",
            idx,
            mode_name(headers[idx].raw_data),
            mode_name(reference.raw_data)
        );
        return Err(ValidationError::DataModeMismatch(idx));
    }

    log::info!("Checking image size in each module");
    for (idx, header) in headers.iter().enumerate().skip(1) {
        if header.dims != reference.dims {
            log::warn!(
                "Inconsistent image sizes between modules 0 and {}: {:?} != {:?}",
                idx,
                header.dims,
                reference.dims
            );
            usable.set(idx, false);
        }
    }

    Ok(usable)
}

fn mode_name(raw_data: bool) -> &'static str {
    if raw_data {
        "raw"
    } else {
        "processed"
    }
}
