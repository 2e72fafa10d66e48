use serde::{Deserialize, Serialize};

use super::constants::{MAX_REJECTED_ACTIVE_TUBES, NCRATE, NTUBE};

/// The kinds of packet found in a detector DST stream. Only `Event` packets carry flashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketType {
    #[default]
    Event,
    Notice,
    Time,
    Threshold,
    Volts,
}

/// A single record read from the detector stream for one crate.
///
/// `tube_num` and `qdc` are parallel: entry `i` says that tube `tube_num[i]` read out
/// amplitude `qdc[i]`. Ids are kept signed and unchecked exactly as they arrive; use
/// [`crate_index`] and [`tube_index`] before indexing anything with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "crate")]
    pub crate_id: i32,
    #[serde(default)]
    pub packet_type: PacketType,
    pub ntubes: u32,
    pub tube_num: Vec<i32>,
    pub qdc: Vec<u32>,
}

impl EventRecord {
    /// Create an `Event` packet; `ntubes` is taken from the number of entries
    pub fn new(crate_id: i32, tube_num: Vec<i32>, qdc: Vec<u32>) -> Self {
        Self {
            crate_id,
            packet_type: PacketType::Event,
            ntubes: tube_num.len().min(qdc.len()) as u32,
            tube_num,
            qdc,
        }
    }

    /// Change the packet type of the record
    pub fn with_packet_type(mut self, packet_type: PacketType) -> Self {
        self.packet_type = packet_type;
        self
    }

    /// The validity filter: a record is a usable calibration flash only if it is an `Event`
    /// packet with more than `MAX_REJECTED_ACTIVE_TUBES` active tubes. The crate id plays no part.
    pub fn is_calibration_flash(&self) -> bool {
        self.ntubes > MAX_REJECTED_ACTIVE_TUBES && self.packet_type == PacketType::Event
    }

    /// Iterate over the (tube, qdc) entries of the record, in record order.
    ///
    /// Never yields more than `ntubes` entries.
    pub fn entries(&self) -> impl Iterator<Item = (i32, u32)> + '_ {
        self.tube_num
            .iter()
            .copied()
            .zip(self.qdc.iter().copied())
            .take(self.ntubes as usize)
    }
}

/// Convert a raw crate id into an index, if it is in range
pub fn crate_index(crate_id: i32) -> Option<usize> {
    usize::try_from(crate_id).ok().filter(|c| *c < NCRATE)
}

/// Convert a raw tube id into an index, if it is in range
pub fn tube_index(tube_id: i32) -> Option<usize> {
    usize::try_from(tube_id).ok().filter(|t| *t < NTUBE)
}
