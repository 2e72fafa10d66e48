//Detector geometry
pub const NCRATE: usize = 15;
pub const NTUBE: usize = 256;

//Flash acceptance
pub const MAX_REJECTED_ACTIVE_TUBES: u32 = 240; // a calibration flash needs strictly more than this
pub const SATURATION_THRESHOLD: u32 = 3900;

//Sentinels
pub const FLASH_SENTINEL: f64 = -1.0;
pub const TUBE_HEALTHY: i8 = 0;
pub const TUBE_FAULTY: i8 = -1;
