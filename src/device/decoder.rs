//! Decoder for the `/RAWSTATUS` payload.
//!
//! The device reports one `system` section plus a numbered section per
//! output, all at the top level of one object:
//!
//! ```json
//! {
//!   "system":  { "nickname": "Tank1", "numberofoutputs": 2, ... },
//!   "output1": { "outputnickname": "Light", ... },
//!   "output2": { "outputnickname": "Heater", ... }
//! }
//! ```
//!
//! Decoding runs in two passes: the `system` section is decoded first to
//! learn the declared output count, then every remaining key is validated
//! against that count and placed at its position.

use crate::device::data::{OutputInfo, Snapshot, SystemInfo};
use crate::error::DecodeError;
use tracing::debug;

/// Upper bound on `numberofoutputs`.
///
/// Real controllers have a handful of outputs. The cap only keeps a corrupt
/// count from sizing a huge allocation, so it sits far above any shipping
/// device.
pub const MAX_OUTPUTS: usize = 1024;

const SYSTEM_KEY: &str = "system";
const OUTPUT_PREFIX: &str = "output";

/// Decode a raw status body into a [`Snapshot`].
///
/// Declared outputs missing from the body are left zero-valued (with an
/// empty id) rather than rejected; devices may report fewer active outputs
/// than they are configured for. An output section that is `null` is kept
/// as a zero-valued output carrying its id.
pub fn decode(bytes: &[u8]) -> Result<Snapshot, DecodeError> {
    let serde_json::Value::Object(mut sections) = serde_json::from_slice::<serde_json::Value>(bytes)?
    else {
        return Err(DecodeError::NotAnObject);
    };

    let system_doc = sections.remove(SYSTEM_KEY).ok_or(DecodeError::MissingSystem)?;
    let system: SystemInfo = serde_json::from_value(system_doc).map_err(DecodeError::System)?;
    debug!(?system, "decoded system section");

    let count = output_count(system.output_count)?;
    let mut outputs = vec![OutputInfo::default(); count];

    for (key, doc) in sections {
        let id = parse_output_key(&key).ok_or_else(|| DecodeError::InvalidOutputKey(key.clone()))?;
        if id > count {
            return Err(DecodeError::OutputOutOfRange { id, count });
        }

        let mut output: OutputInfo = match doc {
            serde_json::Value::Null => OutputInfo::default(),
            doc => serde_json::from_value(doc)
                .map_err(|source| DecodeError::Output { key, source })?,
        };
        output.id = id.to_string();
        debug!(?output, "decoded output section");

        outputs[id - 1] = output;
    }

    Ok(Snapshot {
        fetched_at: None,
        system,
        outputs,
    })
}

/// Parse `output<N>` into `N`. Returns `None` for anything else, including
/// `output0`.
pub fn parse_output_key(key: &str) -> Option<usize> {
    let digits = key.strip_prefix(OUTPUT_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse::<usize>().ok().filter(|id| *id > 0)
}

fn output_count(declared: f64) -> Result<usize, DecodeError> {
    if !declared.is_finite()
        || declared < 0.0
        || declared.fract() != 0.0
        || declared > MAX_OUTPUTS as f64
    {
        return Err(DecodeError::InvalidOutputCount(declared));
    }

    Ok(declared as usize)
}
