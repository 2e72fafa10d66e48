//! # md_calib
//!
//! md_calib is the LED flash calibration accumulator for the Middle Drum fluorescence
//! detector, written in Rust. It takes the per-event QDC readings of the detector crates and
//! builds, for every crate, the time ordered list of flashes that the gain calibration is
//! computed from.
//!
//! ## Installation
//!
//! Currently the only method of install is from source.
//!
//! ### Rust
//!
//! If you have not used Rust before, you will most likely need to install the Rust tool
//! chain. See the [Rust docs](https://www.rust-lang.org/tools/install) for installation
//! instructions.
//!
//! ### Building & Install
//!
//! To build and install the CLI use `cargo install --path ./md_calib_cli` from the top level
//! md_calib repository. The binary will be installed to your cargo install location
//! (typically something like `~/.cargo/bin/`).
//!
//! ## Processing
//!
//! Each event record holds the crate it came from, the packet type, the number of active
//! tubes and the (tube, QDC) pairs of those tubes. For every record:
//!
//! - Records that are not `event` packets, or that have 240 or fewer active tubes, are bad
//! flashes. They are counted per crate and otherwise ignored.
//! - Every reading of a good flash above 3900 marks its tube as saturated for the rest of the
//! run. The saturation matrix holds 0 for healthy tubes and -1 for saturated ones.
//! - Every reading is dequantized: the QDC truncates the charge to an integer, so a uniform
//! random value in [0, 1) is added back. Tubes that were not hit hold -1.0.
//! - The finished flash (256 tubes wide) is appended to its crate's accumulator.
//!
//! Records with a crate id outside 0..15 are dropped and counted separately. Entries with a
//! tube id outside 0..256 are dropped from their flash; the rest of the flash is kept.
//!
//! ## Configuration
//!
//! The YAML format of a configuration file is as follows:
//!
//! ```yml
//! event_path: None
//! report_path: None
//! seed: null
//! n_threads: 1
//! ```
//!
//! - `event_path`: a YAML file holding a list of event records
//! - `report_path`: where the run report is written
//! - `seed`: seed of the dequantization random source. `null` seeds from the OS.
//! - `n_threads`: number of crate workers. Crates are divided among the workers, so at most
//! 15 are used.
//!
//! ### Event Record Format
//!
//! ```yml
//! - crate: 3
//!   packet_type: event
//!   ntubes: 2
//!   tube_num: [0, 1]
//!   qdc: [812, 790]
//! ```
//!
//! `packet_type` is one of `event`, `notice`, `time`, `threshold` or `volts` and defaults
//! to `event`.
//!
//! ## Output
//!
//! The run report is a YAML file with the number of flashes, bad flashes, dropped entries and
//! saturated tubes of every crate, along with the entries, mean and RMS of every tube.
pub mod accumulator;
pub mod config;
pub mod constants;
pub mod dequantizer;
pub mod error;
pub mod event;
pub mod event_source;
pub mod flash;
pub mod flash_stats;
pub mod pipeline;
pub mod process;
pub mod rejection;
pub mod report;
pub mod saturation;
pub mod worker_status;
