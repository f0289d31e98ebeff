use wasm_bindgen::prelude::*;

mod azimuth;
mod find_path;
mod geotiff;
mod log_bridge;
mod raster;

pub use azimuth::{compute_azimuths, AzimuthResult};
pub use find_path::find_path_rs;
pub use geotiff::serialize_band_to_geotiff;

/// Install the panic hook and bridge `log` records to the browser console.
/// Call once from the host page before any other export.
#[wasm_bindgen]
pub fn init() {
    console_error_panic_hook::set_once();
    log_bridge::install();
}
